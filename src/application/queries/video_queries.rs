//! Video Queries

use crate::domain::VideoId;

/// 查询视频生成状态
#[derive(Debug, Clone)]
pub struct GetVideoStatus {
    pub video_id: VideoId,
}

/// 获取视频下载流
#[derive(Debug, Clone)]
pub struct StreamVideo {
    pub video_id: VideoId,
}

/// 分页列出视频生成记录
#[derive(Debug, Clone)]
pub struct ListVideos {
    pub limit: u32,
    pub offset: u32,
}

/// 列出可用头像
#[derive(Debug, Clone)]
pub struct ListAvatars;
