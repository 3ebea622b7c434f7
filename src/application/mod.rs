//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（VideoProvider、VideoRepository）
//! - commands: 命令及处理器（生成视频）
//! - queries: 查询及处理器（状态、下载、头像、历史）
//! - access: API Key 访问策略
//! - error: 应用层错误定义（封闭的错误类别）

pub mod access;
pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use access::AccessPolicy;

pub use commands::{
    handlers::{GenerateVideoHandler, GenerateVideoResponse, DEFAULT_AVATAR},
    GenerateVideo,
};

pub use error::{ApplicationError, ErrorKind, MessageArg, Resource};

pub use ports::{
    AvatarSource, Presenter, RepositoryError, Talk, TalkRequest, VideoByteStream,
    VideoProviderError, VideoProviderPort, VideoRecord, VideoRepositoryPort,
};

pub use queries::{
    handlers::{
        AvatarView, GetVideoStatusHandler, ListAvatarsHandler, ListVideosHandler,
        StreamVideoHandler, VideoStatusView, VideoStream, VideoSummaryView,
    },
    GetVideoStatus, ListAvatars, ListVideos, StreamVideo,
};
