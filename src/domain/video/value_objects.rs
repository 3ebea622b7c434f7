//! Video 值对象

use std::fmt;

use super::errors::VideoDomainError;

/// 视频 ID 最大长度
const MAX_VIDEO_ID_LEN: usize = 128;

/// 视频 ID（即视频服务返回的 talk id）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// 解析并校验视频 ID：1..=128 个 `[A-Za-z0-9_-]` 字符
    pub fn parse(raw: &str) -> Result<Self, VideoDomainError> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_VIDEO_ID_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(VideoDomainError::InvalidVideoId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 视频生成状态（视频服务原始状态）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoStatus {
    /// 已创建，等待处理
    Created,
    /// 生成中
    Started,
    /// 已完成
    Done,
    /// 生成失败
    Error,
    /// 被视频服务拒绝（内容审核等）
    Rejected,
    /// 未知状态，原样透传
    Other(String),
}

impl VideoStatus {
    pub fn as_str(&self) -> &str {
        match self {
            VideoStatus::Created => "created",
            VideoStatus::Started => "started",
            VideoStatus::Done => "done",
            VideoStatus::Error => "error",
            VideoStatus::Rejected => "rejected",
            VideoStatus::Other(s) => s,
        }
    }

    pub fn from_provider(s: &str) -> Self {
        match s {
            "created" => VideoStatus::Created,
            "started" => VideoStatus::Started,
            "done" => VideoStatus::Done,
            "error" => VideoStatus::Error,
            "rejected" => VideoStatus::Rejected,
            other => VideoStatus::Other(other.to_string()),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, VideoStatus::Done)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, VideoStatus::Error | VideoStatus::Rejected)
    }
}

impl Default for VideoStatus {
    fn default() -> Self {
        VideoStatus::Created
    }
}
