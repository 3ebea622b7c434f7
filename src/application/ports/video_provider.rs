//! Video Provider Port - 视频生成服务抽象
//!
//! 定义 talking-avatar 视频生成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::domain::VideoStatus;

/// 视频服务错误
#[derive(Debug, Error)]
pub enum VideoProviderError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Talk not found: {0}")]
    NotFound(String),

    #[error("Provider rejected request with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 头像来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarSource {
    /// 视频服务预置的 presenter
    Presenter(String),
    /// 用户上传的图片（原始字节）
    Image(Vec<u8>),
}

/// 创建视频请求
#[derive(Debug, Clone)]
pub struct TalkRequest {
    /// 旁白文本
    pub text: String,
    /// 旁白音色
    pub voice_id: String,
    pub avatar: AvatarSource,
}

/// 视频服务中的视频信息
#[derive(Debug, Clone)]
pub struct Talk {
    pub id: String,
    pub status: VideoStatus,
    /// 生成完成后的下载地址
    pub result_url: Option<String>,
}

/// 预置 presenter
#[derive(Debug, Clone)]
pub struct Presenter {
    pub presenter_id: String,
    pub name: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// 视频字节流
pub type VideoByteStream = BoxStream<'static, Result<Bytes, VideoProviderError>>;

/// Video Provider Port
#[async_trait]
pub trait VideoProviderPort: Send + Sync {
    /// 提交视频生成
    async fn create_talk(&self, request: TalkRequest) -> Result<Talk, VideoProviderError>;

    /// 查询视频状态
    async fn get_talk(&self, talk_id: &str) -> Result<Talk, VideoProviderError>;

    /// 列出预置 presenter
    async fn list_presenters(&self) -> Result<Vec<Presenter>, VideoProviderError>;

    /// 打开生成结果的下载流
    async fn open_stream(&self, result_url: &str) -> Result<VideoByteStream, VideoProviderError>;

    /// 检查视频服务是否可用
    async fn health_check(&self) -> bool {
        true
    }
}
