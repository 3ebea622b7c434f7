//! Commands - 写操作

mod video_commands;

pub mod handlers;

pub use video_commands::GenerateVideo;
