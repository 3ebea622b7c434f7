//! Domain Layer - 领域层
//!
//! Video Context: 视频生成相关的值对象与规则

pub mod video;

pub use video::{NarrationVoices, VideoDomainError, VideoId, VideoStatus};
