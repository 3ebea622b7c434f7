//! Application State
//!
//! 包含所有 Command/Query Handlers 以及请求级共享的只读资源

use std::sync::Arc;

use super::schema::RequestLimits;
use crate::application::{
    AccessPolicy,
    // Command handlers
    GenerateVideoHandler,
    // Query handlers
    GetVideoStatusHandler, ListAvatarsHandler, ListVideosHandler, StreamVideoHandler,
    // Ports
    VideoProviderPort, VideoRepositoryPort,
};
use crate::domain::NarrationVoices;
use crate::i18n::Localizer;

/// 应用状态
pub struct AppState {
    // ========== Shared ==========
    pub localizer: Arc<Localizer>,
    pub access: AccessPolicy,
    pub limits: RequestLimits,
    pub provider: Arc<dyn VideoProviderPort>,

    // ========== Command Handlers ==========
    pub generate_video_handler: GenerateVideoHandler,

    // ========== Query Handlers ==========
    pub get_video_status_handler: GetVideoStatusHandler,
    pub stream_video_handler: StreamVideoHandler,
    pub list_avatars_handler: ListAvatarsHandler,
    pub list_videos_handler: ListVideosHandler,
}

/// 视频生成相关设置
#[derive(Debug, Clone)]
pub struct VideoSettings {
    pub voices: NarrationVoices,
    pub default_presenter: String,
    pub max_upload_size: usize,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        provider: Arc<dyn VideoProviderPort>,
        video_repo: Arc<dyn VideoRepositoryPort>,
        localizer: Arc<Localizer>,
        access: AccessPolicy,
        settings: VideoSettings,
    ) -> Self {
        Self {
            localizer: localizer.clone(),
            access,
            limits: RequestLimits {
                max_upload_size: settings.max_upload_size,
            },
            provider: provider.clone(),

            // Command handlers
            generate_video_handler: GenerateVideoHandler::new(
                provider.clone(),
                video_repo.clone(),
                localizer.clone(),
                settings.voices,
                settings.default_presenter,
            ),

            // Query handlers
            get_video_status_handler: GetVideoStatusHandler::new(
                provider.clone(),
                video_repo.clone(),
                localizer,
            ),
            stream_video_handler: StreamVideoHandler::new(provider.clone(), video_repo.clone()),
            list_avatars_handler: ListAvatarsHandler::new(provider),
            list_videos_handler: ListVideosHandler::new(video_repo),
        }
    }
}
