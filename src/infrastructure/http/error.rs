//! HTTP Error Handling
//!
//! 所有错误响应使用统一格式：
//! `{"error_kind": "...", "message": "...", "details": {field: [..]} | null}`

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ErrorKind;

/// 字段 -> 违反的规则（已本地化），按字段名排序
pub type ValidationDetails = BTreeMap<String, Vec<String>>;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error_kind: &'static str,
    pub message: String,
    pub details: Option<ValidationDetails>,
}

/// 错误类别到 HTTP 状态码的固定映射
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// API 错误
///
/// message 在构造时已完成本地化；diagnostic 只写日志，不返回给客户端
#[derive(Debug)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    details: Option<ValidationDetails>,
    diagnostic: Option<String>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            diagnostic: None,
        }
    }

    /// 校验失败，附带字段详情
    pub fn validation(message: impl Into<String>, details: ValidationDetails) -> Self {
        Self {
            kind: ErrorKind::ValidationError,
            message: message.into(),
            details: Some(details),
            diagnostic: None,
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&ValidationDetails> {
        self.details.as_ref()
    }

    pub fn status(&self) -> StatusCode {
        status_for(self.kind)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Some(diagnostic) = &self.diagnostic {
            if self.kind == ErrorKind::InternalError {
                tracing::error!(error_kind = %self.kind, error = %diagnostic, "Request failed");
            } else {
                tracing::debug!(error_kind = %self.kind, error = %diagnostic, "Request rejected");
            }
        }

        let status = self.status();
        let body = ErrorBody {
            error_kind: self.kind.as_str(),
            message: self.message,
            details: self.details,
        };

        let mut response = (status, Json(body)).into_response();
        // 标记为已规范化的错误响应，中间件据此跳过重写
        response.extensions_mut().insert(self.kind);
        response
    }
}
