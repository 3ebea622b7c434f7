//! 应用层错误定义
//!
//! 所有服务操作的失败都归类到封闭的 [`ErrorKind`] 集合中

use std::fmt;

use thiserror::Error;

use crate::application::ports::{RepositoryError, VideoProviderError};

/// 错误类别（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 请求校验失败
    ValidationError,
    /// 资源不存在
    NotFound,
    /// 资源状态不满足前置条件
    Conflict,
    /// 缺少或无效的凭证
    Unauthorized,
    /// 凭证有效但权限不足
    Forbidden,
    /// 未分类的内部错误
    InternalError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::ValidationError,
        ErrorKind::NotFound,
        ErrorKind::Conflict,
        ErrorKind::Unauthorized,
        ErrorKind::Forbidden,
        ErrorKind::InternalError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::InternalError => "internal_error",
        }
    }

    /// 该类别的默认消息 key
    pub fn message_key(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "error.validation",
            ErrorKind::NotFound => "error.not_found",
            ErrorKind::Conflict => "error.conflict",
            ErrorKind::Unauthorized => "error.unauthorized",
            ErrorKind::Forbidden => "error.forbidden",
            ErrorKind::InternalError => "error.internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 错误消息中引用的资源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Video,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Video => "Video",
        }
    }

    /// 资源名称的消息 key
    pub fn message_key(&self) -> &'static str {
        match self {
            Resource::Video => "resource.video",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 消息占位符参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageArg {
    /// 原样插入
    Text(String),
    /// 按请求语言翻译后插入
    Key(&'static str),
}

/// 应用层错误
///
/// 校验错误不在这里：请求在到达服务之前已被拒绝
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource} not found: {id}")]
    NotFound { resource: Resource, id: String },

    /// 状态冲突
    #[error("Conflict: {reason}")]
    Conflict {
        message_key: &'static str,
        reason: String,
    },

    /// 未认证
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 无权限
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 内部错误（详情只写日志）
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource: Resource, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// 创建状态冲突错误
    pub fn conflict(message_key: &'static str, reason: impl Into<String>) -> Self {
        Self::Conflict {
            message_key,
            reason: reason.into(),
        }
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplicationError::NotFound { .. } => ErrorKind::NotFound,
            ApplicationError::Conflict { .. } => ErrorKind::Conflict,
            ApplicationError::Unauthorized(_) => ErrorKind::Unauthorized,
            ApplicationError::Forbidden(_) => ErrorKind::Forbidden,
            ApplicationError::InternalError(_) => ErrorKind::InternalError,
        }
    }

    /// 面向客户端的消息 key
    pub fn message_key(&self) -> &'static str {
        match self {
            ApplicationError::Conflict { message_key, .. } => *message_key,
            other => other.kind().message_key(),
        }
    }

    /// 消息占位符参数
    pub fn message_args(&self) -> Vec<(&'static str, MessageArg)> {
        match self {
            ApplicationError::NotFound { resource, id } => vec![
                ("resource", MessageArg::Key(resource.message_key())),
                ("id", MessageArg::Text(id.clone())),
            ],
            _ => Vec::new(),
        }
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        Self::InternalError(format!("Repository error: {}", err))
    }
}

impl From<VideoProviderError> for ApplicationError {
    fn from(err: VideoProviderError) -> Self {
        match err {
            VideoProviderError::NotFound(id) => Self::not_found(Resource::Video, id),
            VideoProviderError::Rejected { status: 409, body } => {
                Self::conflict("error.conflict", body)
            }
            other => Self::InternalError(format!("Video provider error: {}", other)),
        }
    }
}
