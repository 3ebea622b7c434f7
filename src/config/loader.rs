//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, ProviderKind};
use crate::i18n::Locale;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 旧版部署使用的 API Key 环境变量
const LEGACY_API_KEY_VAR: &str = "D_ID_API_KEY";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VIDUCATE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VIDUCATE_SERVER__PORT=8080`
/// - `VIDUCATE_SERVER__CORS_ORIGINS=http://localhost:3000,https://viducate.app`
/// - `VIDUCATE_PROVIDER__API_KEY=...`（也兼容 `D_ID_API_KEY`）
/// - `VIDUCATE_I18N__DEFAULT_LOCALE=es`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("provider.kind", "did")?
        .set_default("provider.api_url", "https://api.d-id.com")?
        .set_default("provider.timeout_secs", 60)?
        .set_default("database.path", "data/viducate.db")?
        .set_default("database.max_connections", 5)?
        .set_default("i18n.default_locale", "en")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 旧变量优先级低于配置文件和 VIDUCATE_ 变量
    if let Ok(api_key) = std::env::var(LEGACY_API_KEY_VAR) {
        builder = builder.set_default("provider.api_key", api_key)?;
    }

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: VIDUCATE_PROVIDER__API_URL=https://api.d-id.com
    builder = builder.add_source(
        Environment::with_prefix("VIDUCATE")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("server.cors_origins")
            .with_list_parse_key("i18n.supported")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.provider.api_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Provider API URL cannot be empty".to_string(),
        ));
    }

    if config.provider.kind == ProviderKind::Did
        && config.provider.api_key.as_deref().map_or(true, str::is_empty)
    {
        return Err(ConfigError::ValidationError(
            "Provider API key is required (VIDUCATE_PROVIDER__API_KEY or D_ID_API_KEY)".to_string(),
        ));
    }

    if config.provider.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Provider timeout cannot be 0".to_string(),
        ));
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    if Locale::parse(&config.i18n.default_locale).is_none() {
        return Err(ConfigError::ValidationError(format!(
            "Invalid default locale: {}",
            config.i18n.default_locale
        )));
    }

    if !config.i18n.supported.is_empty()
        && !config
            .i18n
            .supported
            .iter()
            .filter_map(|tag| Locale::parse(tag))
            .any(|tag| Locale::parse(&config.i18n.default_locale) == Some(tag))
    {
        return Err(ConfigError::ValidationError(format!(
            "Default locale {} is not in the supported list",
            config.i18n.default_locale
        )));
    }

    if config.auth.api_keys.iter().any(|k| k.key.is_empty()) {
        return Err(ConfigError::ValidationError(
            "API keys cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志，不输出密钥）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Public Base URL: {}", config.server.public_base_url());
    tracing::info!("CORS Origins: {:?}", config.server.cors_origins);
    tracing::info!("Provider: {:?} ({})", config.provider.kind, config.provider.api_url);
    tracing::info!("Provider Timeout: {}s", config.provider.timeout_secs);
    tracing::info!(
        "Provider API Key: {}",
        if config.provider.api_key.is_some() { "set" } else { "unset" }
    );
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Default Locale: {}", config.i18n.default_locale);
    tracing::info!("API Keys: {}", config.auth.api_keys.len());
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
