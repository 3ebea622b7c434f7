//! HTTP Layer - 请求校验、分发与响应
//!
//! 请求处理流程：解析并校验请求结构 -> 解析语言 -> 调用处理器 -> 校验响应契约 -> 输出

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod locale;
pub mod middleware;
pub mod routes;
pub mod schema;
pub mod server;
pub mod state;

pub use error::{status_for, ApiError, ErrorBody, ValidationDetails};
pub use locale::LocaleContext;
pub use routes::create_routes;
pub use server::{build_router, HttpServer};
pub use state::{AppState, VideoSettings};
