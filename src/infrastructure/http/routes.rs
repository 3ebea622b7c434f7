//! HTTP Routes
//!
//! API Endpoints:
//! - /                         GET   欢迎语（本地化）
//! - /api/ping                 GET   健康检查
//! - /video                    GET   视频生成历史（分页）
//! - /video/generate           POST  提交视频生成
//! - /video/status/:video_id   GET   查询视频状态
//! - /video/avatars            GET   列出可用头像
//! - /video/stream/:video_id   GET   下载视频（video/mp4）
//!
//! 未绑定的路由返回统一格式的 not_found

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::auth::require_api_key;
use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::welcome))
        .route("/api/ping", get(handlers::ping))
        .nest("/video", video_routes(state))
        .fallback(handlers::route_not_found)
}

/// Video 路由，配置了 API Key 时需要认证
fn video_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::list_videos))
        .route("/generate", post(handlers::generate_video))
        .route("/status/:video_id", get(handlers::get_video_status))
        .route("/avatars", get(handlers::list_avatars))
        .route("/stream/:video_id", get(handlers::stream_video))
        .route_layer(middleware::from_fn_with_state(state, require_api_key))
}
