//! Video Command Handlers

use chrono::Utc;
use std::sync::Arc;

use crate::application::commands::GenerateVideo;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AvatarSource, TalkRequest, VideoProviderPort, VideoRecord, VideoRepositoryPort,
};
use crate::domain::NarrationVoices;
use crate::i18n::{Locale, Localizer};

/// 请求中表示"使用默认 presenter"的 avatar 值
pub const DEFAULT_AVATAR: &str = "default";

// ============================================================================
// GenerateVideo
// ============================================================================

/// 生成视频响应
#[derive(Debug, Clone)]
pub struct GenerateVideoResponse {
    pub id: String,
    /// 对外状态，提交后固定为 `pending`
    pub status: &'static str,
    pub message: String,
}

/// GenerateVideo Handler
pub struct GenerateVideoHandler {
    provider: Arc<dyn VideoProviderPort>,
    video_repo: Arc<dyn VideoRepositoryPort>,
    localizer: Arc<Localizer>,
    voices: NarrationVoices,
    default_presenter: String,
}

impl GenerateVideoHandler {
    pub fn new(
        provider: Arc<dyn VideoProviderPort>,
        video_repo: Arc<dyn VideoRepositoryPort>,
        localizer: Arc<Localizer>,
        voices: NarrationVoices,
        default_presenter: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            video_repo,
            localizer,
            voices,
            default_presenter: default_presenter.into(),
        }
    }

    pub async fn handle(
        &self,
        command: GenerateVideo,
        locale: &Locale,
    ) -> Result<GenerateVideoResponse, ApplicationError> {
        let voice_id = self
            .voices
            .select(&command.language)
            .ok_or_else(|| {
                ApplicationError::internal(format!(
                    "No narration voice configured for language {}",
                    command.language
                ))
            })?
            .to_string();

        let avatar = match command.custom_avatar {
            Some(image) => AvatarSource::Image(image),
            None if command.avatar == DEFAULT_AVATAR => {
                AvatarSource::Presenter(self.default_presenter.clone())
            }
            None => AvatarSource::Presenter(command.avatar.clone()),
        };
        let presenter = match &avatar {
            AvatarSource::Presenter(id) => Some(id.clone()),
            AvatarSource::Image(_) => None,
        };

        let talk = self
            .provider
            .create_talk(TalkRequest {
                text: command.text.clone(),
                voice_id: voice_id.clone(),
                avatar,
            })
            .await?;

        let now = Utc::now();
        let record = VideoRecord {
            id: talk.id.clone(),
            text: command.text,
            language: command.language,
            avatar: presenter,
            status: talk.status,
            result_url: talk.result_url,
            created_at: now,
            updated_at: now,
        };
        self.video_repo.save(&record).await?;

        tracing::info!(
            video_id = %record.id,
            language = %record.language,
            voice_id = %voice_id,
            custom_avatar = record.avatar.is_none(),
            "Video generation started"
        );

        Ok(GenerateVideoResponse {
            id: record.id,
            status: "pending",
            message: self.localizer.translate(locale, "video.pending").to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::ErrorKind;
    use crate::i18n::builtin_catalogs;
    use crate::infrastructure::adapters::FakeVideoProvider;
    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig, SqliteVideoRepository,
    };
    use std::collections::HashMap;

    async fn setup() -> (GenerateVideoHandler, Arc<FakeVideoProvider>, Arc<SqliteVideoRepository>) {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = Arc::new(SqliteVideoRepository::new(pool));
        let provider = Arc::new(FakeVideoProvider::new());
        let localizer = Arc::new(
            Localizer::new(builtin_catalogs().unwrap(), Locale::parse("en").unwrap(), &[]).unwrap(),
        );
        let voices = NarrationVoices::new(
            HashMap::from([
                ("en".to_string(), "en-US-JennyNeural".to_string()),
                ("es".to_string(), "es-ES-ElviraNeural".to_string()),
            ]),
            "en",
        );

        let handler = GenerateVideoHandler::new(
            provider.clone(),
            repo.clone(),
            localizer,
            voices,
            "rian",
        );
        (handler, provider, repo)
    }

    fn command(avatar: &str) -> GenerateVideo {
        GenerateVideo {
            text: "Photosynthesis turns light into chemical energy.".to_string(),
            language: "es".to_string(),
            avatar: avatar.to_string(),
            custom_avatar: None,
        }
    }

    #[tokio::test]
    async fn test_generate_persists_record_and_localizes_message() {
        let (handler, provider, repo) = setup().await;
        let es = Locale::parse("es").unwrap();

        let response = handler.handle(command("default"), &es).await.unwrap();
        assert_eq!(response.status, "pending");
        assert_eq!(response.message, "Tu video se está generando");

        let record = repo.find_by_id(&response.id).await.unwrap().unwrap();
        assert_eq!(record.language, "es");
        assert_eq!(record.avatar.as_deref(), Some("rian"));

        let sent = provider.last_request().unwrap();
        assert_eq!(sent.voice_id, "es-ES-ElviraNeural");
        assert_eq!(sent.avatar, AvatarSource::Presenter("rian".to_string()));
    }

    #[tokio::test]
    async fn test_custom_avatar_takes_precedence() {
        let (handler, provider, repo) = setup().await;
        let mut cmd = command("amy");
        cmd.custom_avatar = Some(vec![0x89, b'P', b'N', b'G']);

        let response = handler.handle(cmd, &Locale::parse("en").unwrap()).await.unwrap();

        let record = repo.find_by_id(&response.id).await.unwrap().unwrap();
        assert!(record.avatar.is_none());
        assert!(matches!(provider.last_request().unwrap().avatar, AvatarSource::Image(_)));
    }

    #[tokio::test]
    async fn test_provider_failure_is_internal_error() {
        let (handler, provider, _repo) = setup().await;
        provider.fail_next_with_status(503);

        let err = handler
            .handle(command("amy"), &Locale::parse("en").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalError);
    }
}
