//! Command Handlers

mod video_handlers;

pub use video_handlers::{GenerateVideoHandler, GenerateVideoResponse, DEFAULT_AVATAR};
