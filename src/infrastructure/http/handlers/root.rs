//! Root Handlers

use axum::{http::StatusCode, response::Response};

use crate::application::ErrorKind;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::locale::LocaleContext;
use crate::infrastructure::http::schema::WelcomeResponse;

/// GET / - 本地化欢迎语
pub async fn welcome(ctx: LocaleContext) -> Result<Response, ApiError> {
    ctx.respond(
        StatusCode::OK,
        WelcomeResponse {
            message: ctx.t("welcome"),
        },
    )
}

/// 未绑定的路由
pub async fn route_not_found(ctx: LocaleContext) -> ApiError {
    ApiError::new(ErrorKind::NotFound, ctx.t("error.route_not_found"))
}
