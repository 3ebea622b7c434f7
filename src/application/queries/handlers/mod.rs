//! Query Handlers

mod avatar_handlers;
mod video_handlers;

pub use avatar_handlers::{AvatarView, ListAvatarsHandler};
pub use video_handlers::{
    GetVideoStatusHandler, ListVideosHandler, StreamVideoHandler, VideoStatusView, VideoStream,
    VideoSummaryView,
};
