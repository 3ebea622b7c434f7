//! Video HTTP Handlers

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;

use crate::application::{ErrorKind, GetVideoStatus, ListAvatars, ListVideos, StreamVideo};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::extract::{PathVideoId, Validated, ValidatedQuery};
use crate::infrastructure::http::locale::LocaleContext;
use crate::infrastructure::http::schema::{
    AvatarSchema, GenerateVideoPayload, ListVideosQuery, VideoGenerationResponse,
    VideoStatusResponse, VideoSummary,
};
use crate::infrastructure::http::state::AppState;

/// 提交视频生成
pub async fn generate_video(
    State(state): State<Arc<AppState>>,
    ctx: LocaleContext,
    Validated(payload): Validated<GenerateVideoPayload>,
) -> Result<Response, ApiError> {
    let result = state
        .generate_video_handler
        .handle(payload.into_command(), ctx.locale())
        .await
        .map_err(|e| ctx.error(e))?;

    ctx.respond(
        StatusCode::OK,
        VideoGenerationResponse {
            id: result.id,
            status: result.status.to_string(),
            message: result.message,
        },
    )
}

/// 查询视频状态
pub async fn get_video_status(
    State(state): State<Arc<AppState>>,
    ctx: LocaleContext,
    PathVideoId(video_id): PathVideoId,
) -> Result<Response, ApiError> {
    let view = state
        .get_video_status_handler
        .handle(GetVideoStatus { video_id }, ctx.locale())
        .await
        .map_err(|e| ctx.error(e))?;

    ctx.respond(StatusCode::OK, VideoStatusResponse::from(view))
}

/// 列出可用头像
pub async fn list_avatars(
    State(state): State<Arc<AppState>>,
    ctx: LocaleContext,
) -> Result<Response, ApiError> {
    let avatars = state
        .list_avatars_handler
        .handle(ListAvatars)
        .await
        .map_err(|e| ctx.error(e))?;

    ctx.respond_list(
        StatusCode::OK,
        avatars.into_iter().map(AvatarSchema::from).collect(),
    )
}

/// 下载生成完成的视频
pub async fn stream_video(
    State(state): State<Arc<AppState>>,
    ctx: LocaleContext,
    PathVideoId(video_id): PathVideoId,
) -> Result<Response, ApiError> {
    let video = state
        .stream_video_handler
        .handle(StreamVideo { video_id })
        .await
        .map_err(|e| ctx.error(e))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "video/mp4")
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}.mp4\"", video.video_id),
        )
        .body(Body::from_stream(video.stream))
        .map_err(|e| {
            ctx.error_kind(ErrorKind::InternalError)
                .with_diagnostic(format!("Failed to build stream response: {}", e))
        })
}

/// 视频生成历史
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    ctx: LocaleContext,
    ValidatedQuery(query): ValidatedQuery<ListVideosQuery>,
) -> Result<Response, ApiError> {
    let videos = state
        .list_videos_handler
        .handle(ListVideos {
            limit: query.limit(),
            offset: query.offset(),
        })
        .await
        .map_err(|e| ctx.error(e))?;

    ctx.respond_list(
        StatusCode::OK,
        videos.into_iter().map(VideoSummary::from).collect(),
    )
}
