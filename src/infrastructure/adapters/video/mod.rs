//! Video Adapters
//!
//! talking-avatar 视频服务的客户端实现

mod did_client;
mod fake_video_provider;

pub use did_client::{DidClient, DidClientConfig};
pub use fake_video_provider::FakeVideoProvider;
