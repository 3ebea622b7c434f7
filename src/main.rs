//! Viducate - 文本生成 AI 讲解视频
//!
//! 架构:
//! - Domain: video/ (视频 ID、状态、旁白音色)
//! - Application: commands, queries, ports, access
//! - Infrastructure: http, persistence, adapters
//! - i18n: 语言解析与消息目录

use std::sync::Arc;

use viducate::application::{AccessPolicy, VideoProviderPort};
use viducate::config::{load_config, print_config, AppConfig, ProviderKind};
use viducate::domain::NarrationVoices;
use viducate::i18n::Localizer;
use viducate::infrastructure::adapters::{DidClient, DidClientConfig, FakeVideoProvider};
use viducate::infrastructure::http::{AppState, HttpServer, VideoSettings};
use viducate::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteVideoRepository,
};

/// 初始化日志，`RUST_LOG` 优先于配置
fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},viducate={},tower_http=debug",
        config.log.level, config.log.level
    );
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

/// 按配置创建视频服务适配器
fn create_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn VideoProviderPort>> {
    let provider: Arc<dyn VideoProviderPort> = match config.provider.kind {
        ProviderKind::Did => {
            let api_key = config
                .provider
                .api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("provider.api_key is required for the D-ID provider"))?;
            let client_config = DidClientConfig {
                api_url: config.provider.api_url.clone(),
                api_key,
                timeout_secs: config.provider.timeout_secs,
                driver_id: config.provider.driver_id.clone(),
            };
            Arc::new(DidClient::new(client_config)?)
        }
        ProviderKind::Fake => {
            tracing::warn!("Using in-memory fake video provider, no videos will be generated");
            Arc::new(FakeVideoProvider::new())
        }
    };
    Ok(provider)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Viducate - AI narrated video backend");
    print_config(&config);

    // 确保数据目录存在
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    // 创建 Repository 适配器
    let video_repo = Arc::new(SqliteVideoRepository::new(pool));

    // 加载消息目录
    let localizer = Arc::new(Localizer::from_config(&config.i18n)?);

    // 创建视频服务适配器
    let provider = create_provider(&config)?;

    let access = AccessPolicy::from_config(&config.auth);
    if !access.is_enforced() {
        tracing::warn!("No API keys configured, /video endpoints are open");
    }

    let settings = VideoSettings {
        voices: NarrationVoices::new(
            config.provider.voices.clone(),
            config.provider.fallback_voice_language.clone(),
        ),
        default_presenter: config.provider.default_presenter.clone(),
        max_upload_size: config.server.max_upload_size,
    };

    // 创建 HTTP 服务器
    let state = AppState::new(provider, video_repo, localizer, access, settings);
    let server = HttpServer::new(config.server.clone(), state);

    tracing::info!(
        public_url = %config.server.public_base_url(),
        "Starting HTTP server..."
    );

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                return;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
