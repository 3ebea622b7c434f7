//! Fake Video Provider - 用于测试和本地开发的视频服务
//!
//! 视频保存在内存中，不实际调用视频服务，状态由调用方推进

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use futures_util::stream::{self, StreamExt};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Mutex;

use crate::application::ports::{
    Presenter, Talk, TalkRequest, VideoByteStream, VideoProviderError, VideoProviderPort,
};
use crate::domain::VideoStatus;

/// Fake Video Provider
pub struct FakeVideoProvider {
    talks: DashMap<String, Talk>,
    last_request: Mutex<Option<TalkRequest>>,
    /// 非 0 时下一次 create_talk 以该状态码失败
    fail_next: AtomicU16,
}

impl FakeVideoProvider {
    /// 下载流固定返回的内容
    pub const VIDEO_BYTES: &'static [u8] = b"\x00\x00\x00\x18ftypmp42fake-video-payload";

    pub fn new() -> Self {
        tracing::info!("FakeVideoProvider initialized");
        Self {
            talks: DashMap::new(),
            last_request: Mutex::new(None),
            fail_next: AtomicU16::new(0),
        }
    }

    fn next_id() -> String {
        format!("tlk_{}", uuid::Uuid::new_v4().simple())
    }

    /// 直接登记一个视频，返回其 ID
    pub fn insert_talk(&self, status: VideoStatus) -> String {
        let id = Self::next_id();
        self.talks.insert(
            id.clone(),
            Talk {
                id: id.clone(),
                status,
                result_url: None,
            },
        );
        id
    }

    /// 将视频标记为完成
    pub fn complete(&self, id: &str, result_url: &str) {
        if let Some(mut talk) = self.talks.get_mut(id) {
            talk.status = VideoStatus::Done;
            talk.result_url = Some(result_url.to_string());
        }
    }

    /// 从视频服务中删除视频（例如已过期）
    pub fn forget(&self, id: &str) {
        self.talks.remove(id);
    }

    pub fn set_status(&self, id: &str, status: VideoStatus) {
        if let Some(mut talk) = self.talks.get_mut(id) {
            talk.status = status;
        }
    }

    /// 最近一次 create_talk 收到的请求
    pub fn last_request(&self) -> Option<TalkRequest> {
        self.last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    pub fn fail_next_with_status(&self, status: u16) {
        self.fail_next.store(status, Ordering::SeqCst);
    }
}

impl Default for FakeVideoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoProviderPort for FakeVideoProvider {
    async fn create_talk(&self, request: TalkRequest) -> Result<Talk, VideoProviderError> {
        tracing::debug!(
            text_len = request.text.len(),
            voice_id = %request.voice_id,
            "FakeVideoProvider: creating talk"
        );

        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request);
        }

        let status = self.fail_next.swap(0, Ordering::SeqCst);
        if status != 0 {
            return Err(VideoProviderError::Rejected {
                status,
                body: "simulated failure".to_string(),
            });
        }

        let id = self.insert_talk(VideoStatus::Created);
        Ok(Talk {
            id,
            status: VideoStatus::Created,
            result_url: None,
        })
    }

    async fn get_talk(&self, talk_id: &str) -> Result<Talk, VideoProviderError> {
        self.talks
            .get(talk_id)
            .map(|talk| talk.clone())
            .ok_or_else(|| VideoProviderError::NotFound(talk_id.to_string()))
    }

    async fn list_presenters(&self) -> Result<Vec<Presenter>, VideoProviderError> {
        Ok(vec![
            Presenter {
                presenter_id: "rian".to_string(),
                name: Some("Rian".to_string()),
                thumbnail_url: None,
            },
            Presenter {
                presenter_id: "amy".to_string(),
                name: Some("Amy".to_string()),
                thumbnail_url: None,
            },
        ])
    }

    async fn open_stream(&self, result_url: &str) -> Result<VideoByteStream, VideoProviderError> {
        tracing::debug!(result_url = %result_url, "FakeVideoProvider: streaming fixed video");

        let chunks = Self::VIDEO_BYTES
            .chunks(8)
            .map(|chunk| Ok(Bytes::from_static(chunk)))
            .collect::<Vec<_>>();
        Ok(stream::iter(chunks).boxed())
    }
}
