//! Viducate - 文本生成 AI 讲解视频的后端服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Video Context: 视频 ID、生成状态、旁白音色选择
//!
//! 应用层 (application/):
//! - Ports: 端口定义（VideoProvider, VideoRepository）
//! - Commands: CQRS 命令处理器（生成视频）
//! - Queries: CQRS 查询处理器（状态、下载、头像、历史）
//! - Access: API Key 访问策略
//!
//! 本地化 (i18n/):
//! - 语言标签解析、TOML 消息目录、回退链翻译
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: 请求校验、语言解析、分发与统一错误响应
//! - Persistence: SQLite 存储
//! - Adapters: D-ID 客户端、内存 Fake

pub mod application;
pub mod config;
pub mod domain;
pub mod i18n;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
