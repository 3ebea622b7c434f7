//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod repositories;
mod video_provider;

pub use repositories::{RepositoryError, VideoRecord, VideoRepositoryPort};
pub use video_provider::{
    AvatarSource, Presenter, Talk, TalkRequest, VideoByteStream, VideoProviderError,
    VideoProviderPort,
};
