//! HTTP Middleware
//!
//! 错误响应规范化 + 状态码错误日志

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::error::ApiError;
use super::locale::LocaleContext;
use super::state::AppState;
use crate::application::ErrorKind;

/// 错误响应规范化中间件
///
/// 当状态码为 4xx 或 5xx 时记录日志；不是由 ApiError 生成的错误响应
/// （未匹配的路由、不支持的方法、框架拒绝、panic）被改写为统一的错误格式：
/// - 404 / 405 -> not_found
/// - 其它 4xx -> validation_error
/// - 5xx -> internal_error
pub async fn normalize_error_response(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let ctx = LocaleContext::from_request_head(&state.localizer, &uri, request.headers());

    let response = next.run(request).await;
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            "HTTP client error"
        );
    } else {
        return response;
    }

    if response.extensions().get::<ErrorKind>().is_some() {
        return response;
    }

    let (kind, message_key) = match status {
        StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => {
            (ErrorKind::NotFound, "error.route_not_found")
        }
        s if s.is_client_error() => (ErrorKind::ValidationError, ErrorKind::ValidationError.message_key()),
        _ => (ErrorKind::InternalError, ErrorKind::InternalError.message_key()),
    };

    ApiError::new(kind, ctx.t(message_key))
        .with_diagnostic(format!("{} {} responded {}", method, uri, status))
        .into_response()
}
