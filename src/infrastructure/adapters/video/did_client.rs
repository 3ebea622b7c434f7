//! D-ID Client - 调用 D-ID talks API
//!
//! 实现 VideoProviderPort trait
//!
//! D-ID API:
//! POST {api_url}/talks            创建视频，成功返回 201 {"id": "...", "status": "created"}
//! GET  {api_url}/talks/{id}       查询状态，完成时带 result_url
//! GET  {api_url}/presenters       预置 presenter 列表
//! 认证: `Authorization: Basic {api_key}`

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    AvatarSource, Presenter, Talk, TalkRequest, VideoByteStream, VideoProviderError,
    VideoProviderPort,
};
use crate::domain::VideoStatus;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct CreateTalkBody<'a> {
    script: Script<'a>,
    driver_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    presenter_id: Option<&'a str>,
    /// base64 编码的头像图片
    #[serde(skip_serializing_if = "Option::is_none")]
    source_image: Option<String>,
}

#[derive(Debug, Serialize)]
struct Script<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    input: &'a str,
    provider: VoiceProvider<'a>,
}

#[derive(Debug, Serialize)]
struct VoiceProvider<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    voice_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct TalkBody {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    result_url: Option<String>,
}

impl From<TalkBody> for Talk {
    fn from(body: TalkBody) -> Self {
        Talk {
            id: body.id,
            status: body
                .status
                .as_deref()
                .map(VideoStatus::from_provider)
                .unwrap_or_default(),
            result_url: body.result_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PresentersBody {
    #[serde(default)]
    presenters: Vec<PresenterBody>,
}

#[derive(Debug, Deserialize)]
struct PresenterBody {
    presenter_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// D-ID 客户端配置
#[derive(Debug, Clone)]
pub struct DidClientConfig {
    /// API 基础 URL
    pub api_url: String,
    /// API Key
    pub api_key: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    pub driver_id: String,
}

impl Default for DidClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.d-id.com".to_string(),
            api_key: String::new(),
            timeout_secs: 60,
            driver_id: "uM00QMwJ9x".to_string(),
        }
    }
}

impl DidClientConfig {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// D-ID 客户端
pub struct DidClient {
    /// API 调用，整个请求受 `timeout_secs` 限制
    client: Client,
    /// 视频下载，只限制连接和两次读取之间的间隔
    download_client: Client,
    config: DidClientConfig,
}

impl DidClient {
    /// 创建新的 D-ID 客户端
    pub fn new(config: DidClientConfig) -> Result<Self, VideoProviderError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VideoProviderError::NetworkError(e.to_string()))?;
        let download_client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| VideoProviderError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            download_client,
            config,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn auth_header(&self) -> String {
        format!("Basic {}", self.config.api_key)
    }

    fn build_body<'a>(&'a self, request: &'a TalkRequest) -> CreateTalkBody<'a> {
        let (presenter_id, source_image) = match &request.avatar {
            AvatarSource::Presenter(id) => (Some(id.as_str()), None),
            AvatarSource::Image(bytes) => (None, Some(BASE64.encode(bytes))),
        };

        CreateTalkBody {
            script: Script {
                kind: "text",
                input: &request.text,
                provider: VoiceProvider {
                    kind: "microsoft",
                    voice_id: &request.voice_id,
                },
            },
            driver_id: &self.config.driver_id,
            presenter_id,
            source_image,
        }
    }
}

fn map_send_error(e: reqwest::Error) -> VideoProviderError {
    if e.is_timeout() {
        VideoProviderError::Timeout
    } else if e.is_connect() {
        VideoProviderError::NetworkError(format!("Cannot connect to video provider: {}", e))
    } else {
        VideoProviderError::NetworkError(e.to_string())
    }
}

/// 非预期状态码转换为 Rejected
async fn rejected(response: reqwest::Response) -> VideoProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    VideoProviderError::Rejected { status, body }
}

#[async_trait]
impl VideoProviderPort for DidClient {
    async fn create_talk(&self, request: TalkRequest) -> Result<Talk, VideoProviderError> {
        let body = self.build_body(&request);

        tracing::debug!(
            url = %self.url("talks"),
            text_len = request.text.len(),
            voice_id = %request.voice_id,
            presenter_id = ?body.presenter_id,
            custom_avatar = body.source_image.is_some(),
            "Sending create talk request"
        );

        let response = self
            .client
            .post(self.url("talks"))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        tracing::info!(status = %response.status(), "Video provider responded to create talk");

        if response.status() != StatusCode::CREATED {
            return Err(rejected(response).await);
        }

        let talk: TalkBody = response
            .json()
            .await
            .map_err(|e| VideoProviderError::InvalidResponse(e.to_string()))?;

        Ok(talk.into())
    }

    async fn get_talk(&self, talk_id: &str) -> Result<Talk, VideoProviderError> {
        let response = self
            .client
            .get(self.url(&format!("talks/{}", talk_id)))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(map_send_error)?;

        match response.status() {
            StatusCode::OK => response
                .json::<TalkBody>()
                .await
                .map(Talk::from)
                .map_err(|e| VideoProviderError::InvalidResponse(e.to_string())),
            StatusCode::NOT_FOUND => Err(VideoProviderError::NotFound(talk_id.to_string())),
            _ => Err(rejected(response).await),
        }
    }

    async fn list_presenters(&self) -> Result<Vec<Presenter>, VideoProviderError> {
        let response = self
            .client
            .get(self.url("presenters"))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(map_send_error)?;

        if response.status() != StatusCode::OK {
            return Err(rejected(response).await);
        }

        let body: PresentersBody = response
            .json()
            .await
            .map_err(|e| VideoProviderError::InvalidResponse(e.to_string()))?;

        Ok(body
            .presenters
            .into_iter()
            .map(|p| Presenter {
                presenter_id: p.presenter_id,
                name: p.name,
                thumbnail_url: p.thumbnail_url,
            })
            .collect())
    }

    async fn open_stream(&self, result_url: &str) -> Result<VideoByteStream, VideoProviderError> {
        // result_url 是预签名地址，不带认证头
        let response = self
            .download_client
            .get(result_url)
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| VideoProviderError::NetworkError(e.to_string())));

        Ok(stream.boxed())
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.url("credits"))
            .header(reqwest::header::AUTHORIZATION, self.auth_header())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
