//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（SQLite）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::VideoStatus;

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 视频生成记录
#[derive(Debug, Clone)]
pub struct VideoRecord {
    /// 视频服务的 talk id
    pub id: String,
    pub text: String,
    /// 旁白语言
    pub language: String,
    /// presenter id，上传自定义头像时为 None
    pub avatar: Option<String>,
    pub status: VideoStatus,
    pub result_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Video Repository Port
#[async_trait]
pub trait VideoRepositoryPort: Send + Sync {
    /// 保存记录
    async fn save(&self, video: &VideoRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找
    async fn find_by_id(&self, id: &str) -> Result<Option<VideoRecord>, RepositoryError>;

    /// 分页查询，按创建时间倒序
    async fn find_page(&self, limit: u32, offset: u32) -> Result<Vec<VideoRecord>, RepositoryError>;

    /// 更新状态
    async fn update_status(
        &self,
        id: &str,
        status: &VideoStatus,
        result_url: Option<&str>,
    ) -> Result<(), RepositoryError>;
}
