//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 视频生成服务配置
    #[serde(default)]
    pub provider: ProviderConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 本地化配置
    #[serde(default)]
    pub i18n: I18nConfig,

    /// API Key 访问控制
    #[serde(default)]
    pub auth: AuthConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 公开访问的 Base URL
    /// 如果未设置，则使用 http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,

    /// 允许跨域的前端地址
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// 上传文件最大大小（字节），默认 10MB
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_max_upload_size() -> usize {
    10 * 1024 * 1024 // 10 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
            cors_origins: default_cors_origins(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 获取公开的 Base URL
    pub fn public_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            let host = if self.host == "0.0.0.0" {
                "localhost"
            } else {
                &self.host
            };
            format!("http://{}:{}", host, self.port)
        })
    }
}

/// 视频服务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// D-ID talks API
    #[default]
    Did,
    /// 内存假实现，本地开发用
    Fake,
}

/// 视频生成服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,

    /// API 基础 URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API Key（Basic 认证）
    #[serde(default)]
    pub api_key: Option<String>,

    /// 请求超时时间（秒）
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_driver_id")]
    pub driver_id: String,

    /// 请求 avatar 为 `default` 时使用的 presenter
    #[serde(default = "default_presenter")]
    pub default_presenter: String,

    /// 语言 -> 旁白音色
    #[serde(default = "default_voices")]
    pub voices: HashMap<String, String>,

    /// 找不到对应音色时使用的语言
    #[serde(default = "default_voice_language")]
    pub fallback_voice_language: String,
}

fn default_api_url() -> String {
    "https://api.d-id.com".to_string()
}

fn default_provider_timeout() -> u64 {
    60
}

fn default_driver_id() -> String {
    "uM00QMwJ9x".to_string()
}

fn default_presenter() -> String {
    "rian".to_string()
}

fn default_voices() -> HashMap<String, String> {
    [
        ("en", "en-US-JennyNeural"),
        ("es", "es-ES-ElviraNeural"),
        ("fr", "fr-FR-DeniseNeural"),
        ("hi", "hi-IN-SwaraNeural"),
    ]
    .into_iter()
    .map(|(lang, voice)| (lang.to_string(), voice.to_string()))
    .collect()
}

fn default_voice_language() -> String {
    "en".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_url: default_api_url(),
            api_key: None,
            timeout_secs: default_provider_timeout(),
            driver_id: default_driver_id(),
            default_presenter: default_presenter(),
            voices: default_voices(),
            fallback_voice_language: default_voice_language(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/viducate.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 本地化配置
#[derive(Debug, Clone, Deserialize)]
pub struct I18nConfig {
    /// 默认语言
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// 支持的语言，为空表示所有已加载的目录
    #[serde(default)]
    pub supported: Vec<String>,

    /// 额外的目录文件夹（`<locale>.toml`）
    #[serde(default)]
    pub catalog_dir: Option<PathBuf>,
}

fn default_locale() -> String {
    "en".to_string()
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
            supported: Vec::new(),
            catalog_dir: None,
        }
    }
}

/// API Key 权限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// 查询类接口
    Read,
    /// 生成视频
    Generate,
}

/// 单个 API Key
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyConfig {
    pub key: String,

    #[serde(default = "default_scopes")]
    pub scopes: Vec<Scope>,
}

fn default_scopes() -> Vec<Scope> {
    vec![Scope::Read, Scope::Generate]
}

/// 访问控制配置，未配置任何 key 时不做校验
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub api_keys: Vec<ApiKeyConfig>,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
