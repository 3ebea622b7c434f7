//! Video Context - 视频生成上下文

mod errors;
mod value_objects;
mod voices;

pub use errors::VideoDomainError;
pub use value_objects::{VideoId, VideoStatus};
pub use voices::NarrationVoices;
