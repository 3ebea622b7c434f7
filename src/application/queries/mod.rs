//! Queries - 读操作

mod video_queries;

pub mod handlers;

pub use video_queries::{GetVideoStatus, ListAvatars, ListVideos, StreamVideo};
