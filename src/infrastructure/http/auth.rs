//! API Key 访问控制中间件
//!
//! 凭证来源：`Authorization: Bearer <key>` 或 `X-API-Key: <key>`。
//! GET/HEAD 需要 `read` 权限，其它方法需要 `generate` 权限

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::locale::LocaleContext;
use super::state::AppState;
use crate::config::Scope;

pub const API_KEY_HEADER: &str = "x-api-key";

/// 从请求头取出 API Key
fn api_key(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim);

    bearer.or_else(|| {
        headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
    })
}

fn required_scope(method: &Method) -> Scope {
    if method == Method::GET || method == Method::HEAD {
        Scope::Read
    } else {
        Scope::Generate
    }
}

/// API Key 校验中间件
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let required = required_scope(request.method());
    let authorized = state.access.authorize(api_key(request.headers()), required);

    if let Err(err) = authorized {
        let ctx = LocaleContext::from_request_head(&state.localizer, request.uri(), request.headers());
        tracing::warn!(
            method = %request.method(),
            uri = %request.uri(),
            error = %err,
            "API key rejected"
        );
        return ctx.error(err).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_preferred() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer key-1"));
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("key-2"));
        assert_eq!(api_key(&headers), Some("key-1"));
    }

    #[test]
    fn test_x_api_key_header() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static(" key-2 "));
        assert_eq!(api_key(&headers), Some("key-2"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(api_key(&headers), Some("key-2"));
    }

    #[test]
    fn test_missing_key() {
        assert_eq!(api_key(&HeaderMap::new()), None);
    }

    #[test]
    fn test_scope_by_method() {
        assert_eq!(required_scope(&Method::GET), Scope::Read);
        assert_eq!(required_scope(&Method::HEAD), Scope::Read);
        assert_eq!(required_scope(&Method::POST), Scope::Generate);
    }
}
