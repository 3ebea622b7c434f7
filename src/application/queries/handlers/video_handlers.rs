//! Video Query Handlers

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::application::error::{ApplicationError, Resource};
use crate::application::ports::{VideoByteStream, VideoProviderPort, VideoRecord, VideoRepositoryPort};
use crate::application::queries::{GetVideoStatus, ListVideos, StreamVideo};
use crate::domain::VideoId;
use crate::i18n::{Locale, Localizer};

// ============================================================================
// Response DTOs
// ============================================================================

/// 视频状态
#[derive(Debug, Clone)]
pub struct VideoStatusView {
    /// 完成时为 `completed`，否则为视频服务的原始状态
    pub status: String,
    pub message: Option<String>,
    pub video_url: Option<String>,
}

/// 视频记录摘要
#[derive(Debug, Clone)]
pub struct VideoSummaryView {
    pub id: String,
    pub language: String,
    pub avatar: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<VideoRecord> for VideoSummaryView {
    fn from(record: VideoRecord) -> Self {
        Self {
            id: record.id,
            language: record.language,
            avatar: record.avatar,
            status: record.status.as_str().to_string(),
            created_at: record.created_at,
        }
    }
}

/// 视频下载流
pub struct VideoStream {
    pub video_id: VideoId,
    pub stream: VideoByteStream,
}

/// 先查本地记录，不存在时直接返回 NotFound
async fn require_record(
    video_repo: &dyn VideoRepositoryPort,
    video_id: &VideoId,
) -> Result<VideoRecord, ApplicationError> {
    video_repo
        .find_by_id(video_id.as_str())
        .await?
        .ok_or_else(|| ApplicationError::not_found(Resource::Video, video_id.as_str()))
}

// ============================================================================
// Handlers
// ============================================================================

/// GetVideoStatus Handler
pub struct GetVideoStatusHandler {
    provider: Arc<dyn VideoProviderPort>,
    video_repo: Arc<dyn VideoRepositoryPort>,
    localizer: Arc<Localizer>,
}

impl GetVideoStatusHandler {
    pub fn new(
        provider: Arc<dyn VideoProviderPort>,
        video_repo: Arc<dyn VideoRepositoryPort>,
        localizer: Arc<Localizer>,
    ) -> Self {
        Self {
            provider,
            video_repo,
            localizer,
        }
    }

    pub async fn handle(
        &self,
        query: GetVideoStatus,
        locale: &Locale,
    ) -> Result<VideoStatusView, ApplicationError> {
        let record = require_record(self.video_repo.as_ref(), &query.video_id).await?;

        let talk = self.provider.get_talk(&record.id).await?;
        if talk.status != record.status || talk.result_url != record.result_url {
            self.video_repo
                .update_status(&record.id, &talk.status, talk.result_url.as_deref())
                .await?;
            tracing::debug!(
                video_id = %record.id,
                status = %talk.status.as_str(),
                "Video status updated"
            );
        }

        let view = if talk.status.is_done() {
            VideoStatusView {
                status: "completed".to_string(),
                message: Some(self.localizer.translate(locale, "video.ready").to_string()),
                video_url: talk.result_url,
            }
        } else if talk.status.is_failed() {
            VideoStatusView {
                status: talk.status.as_str().to_string(),
                message: Some(self.localizer.translate(locale, "video.failed").to_string()),
                video_url: None,
            }
        } else {
            VideoStatusView {
                status: talk.status.as_str().to_string(),
                message: Some(self.localizer.translate(locale, "video.processing").to_string()),
                video_url: None,
            }
        };

        Ok(view)
    }
}

/// StreamVideo Handler
pub struct StreamVideoHandler {
    provider: Arc<dyn VideoProviderPort>,
    video_repo: Arc<dyn VideoRepositoryPort>,
}

impl StreamVideoHandler {
    pub fn new(provider: Arc<dyn VideoProviderPort>, video_repo: Arc<dyn VideoRepositoryPort>) -> Self {
        Self {
            provider,
            video_repo,
        }
    }

    pub async fn handle(&self, query: StreamVideo) -> Result<VideoStream, ApplicationError> {
        let record = require_record(self.video_repo.as_ref(), &query.video_id).await?;

        let talk = self.provider.get_talk(&record.id).await?;
        let result_url = match (talk.status.is_done(), talk.result_url) {
            (true, Some(url)) => url,
            _ => {
                return Err(ApplicationError::conflict(
                    "video.not_ready",
                    format!("video {} has status {}", record.id, talk.status.as_str()),
                ))
            }
        };

        let stream = self.provider.open_stream(&result_url).await?;
        tracing::info!(video_id = %record.id, "Streaming video");

        Ok(VideoStream {
            video_id: query.video_id,
            stream,
        })
    }
}

/// ListVideos Handler
pub struct ListVideosHandler {
    video_repo: Arc<dyn VideoRepositoryPort>,
}

impl ListVideosHandler {
    pub fn new(video_repo: Arc<dyn VideoRepositoryPort>) -> Self {
        Self { video_repo }
    }

    pub async fn handle(&self, query: ListVideos) -> Result<Vec<VideoSummaryView>, ApplicationError> {
        let records = self.video_repo.find_page(query.limit, query.offset).await?;
        Ok(records.into_iter().map(VideoSummaryView::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::ErrorKind;
    use crate::domain::VideoStatus;
    use crate::i18n::builtin_catalogs;
    use crate::infrastructure::adapters::FakeVideoProvider;
    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig, SqliteVideoRepository,
    };
    use futures_util::StreamExt;

    struct Fixture {
        provider: Arc<FakeVideoProvider>,
        repo: Arc<SqliteVideoRepository>,
        localizer: Arc<Localizer>,
    }

    async fn fixture() -> Fixture {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        Fixture {
            provider: Arc::new(FakeVideoProvider::new()),
            repo: Arc::new(SqliteVideoRepository::new(pool)),
            localizer: Arc::new(
                Localizer::new(builtin_catalogs().unwrap(), Locale::parse("en").unwrap(), &[])
                    .unwrap(),
            ),
        }
    }

    /// 在视频服务和本地同时登记一个视频
    async fn seed(fx: &Fixture) -> VideoId {
        let id = fx.provider.insert_talk(VideoStatus::Started);
        let now = Utc::now();
        fx.repo
            .save(&VideoRecord {
                id: id.clone(),
                text: "hello".to_string(),
                language: "en".to_string(),
                avatar: Some("rian".to_string()),
                status: VideoStatus::Created,
                result_url: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        VideoId::parse(&id).unwrap()
    }

    fn en() -> Locale {
        Locale::parse("en").unwrap()
    }

    #[tokio::test]
    async fn test_status_unknown_id_is_not_found() {
        let fx = fixture().await;
        let handler = GetVideoStatusHandler::new(fx.provider.clone(), fx.repo.clone(), fx.localizer.clone());

        let err = handler
            .handle(GetVideoStatus { video_id: VideoId::parse("tlk_missing").unwrap() }, &en())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_status_processing_updates_record() {
        let fx = fixture().await;
        let video_id = seed(&fx).await;
        let handler = GetVideoStatusHandler::new(fx.provider.clone(), fx.repo.clone(), fx.localizer.clone());

        let view = handler
            .handle(GetVideoStatus { video_id: video_id.clone() }, &en())
            .await
            .unwrap();
        assert_eq!(view.status, "started");
        assert_eq!(view.message.as_deref(), Some("Your video is still processing"));
        assert!(view.video_url.is_none());

        let record = fx.repo.find_by_id(video_id.as_str()).await.unwrap().unwrap();
        assert_eq!(record.status, VideoStatus::Started);
    }

    #[tokio::test]
    async fn test_status_done_reports_completed() {
        let fx = fixture().await;
        let video_id = seed(&fx).await;
        fx.provider.complete(video_id.as_str(), "https://cdn.example.com/v.mp4");
        let handler = GetVideoStatusHandler::new(fx.provider.clone(), fx.repo.clone(), fx.localizer.clone());

        let view = handler
            .handle(GetVideoStatus { video_id: video_id.clone() }, &Locale::parse("fr").unwrap())
            .await
            .unwrap();
        assert_eq!(view.status, "completed");
        assert_eq!(view.video_url.as_deref(), Some("https://cdn.example.com/v.mp4"));
        assert_eq!(view.message.as_deref(), Some("Votre vidéo est prête"));

        let record = fx.repo.find_by_id(video_id.as_str()).await.unwrap().unwrap();
        assert_eq!(record.result_url.as_deref(), Some("https://cdn.example.com/v.mp4"));
    }

    #[tokio::test]
    async fn test_status_failed() {
        let fx = fixture().await;
        let video_id = seed(&fx).await;
        fx.provider.set_status(video_id.as_str(), VideoStatus::Rejected);
        let handler = GetVideoStatusHandler::new(fx.provider.clone(), fx.repo.clone(), fx.localizer.clone());

        let view = handler.handle(GetVideoStatus { video_id }, &en()).await.unwrap();
        assert_eq!(view.status, "rejected");
        assert_eq!(view.message.as_deref(), Some("Video generation failed"));
    }

    #[tokio::test]
    async fn test_stream_not_ready_is_conflict() {
        let fx = fixture().await;
        let video_id = seed(&fx).await;
        let handler = StreamVideoHandler::new(fx.provider.clone(), fx.repo.clone());

        let err = handler.handle(StreamVideo { video_id }).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.message_key(), "video.not_ready");
    }

    #[tokio::test]
    async fn test_stream_done_yields_bytes() {
        let fx = fixture().await;
        let video_id = seed(&fx).await;
        fx.provider.complete(video_id.as_str(), "https://cdn.example.com/v.mp4");
        let handler = StreamVideoHandler::new(fx.provider.clone(), fx.repo.clone());

        let mut video = handler.handle(StreamVideo { video_id }).await.ok().unwrap();
        let mut body = Vec::new();
        while let Some(chunk) = video.stream.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(body, FakeVideoProvider::VIDEO_BYTES);
    }

    #[tokio::test]
    async fn test_list_videos_pages_newest_first() {
        let fx = fixture().await;
        let first = seed(&fx).await;
        let second = seed(&fx).await;
        let handler = ListVideosHandler::new(fx.repo.clone());

        let page = handler.handle(ListVideos { limit: 1, offset: 0 }).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, second.as_str());

        let page = handler.handle(ListVideos { limit: 10, offset: 1 }).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, first.as_str());
    }
}
