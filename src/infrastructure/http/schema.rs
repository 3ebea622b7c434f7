//! Request / Response Schemas
//!
//! 每个接口一个具名的请求结构和响应结构。
//! 必填字段用 `Option` + `required` 表示，这样所有缺失字段会和其它违规一起报告

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::application::{AvatarView, GenerateVideo, VideoStatusView, VideoSummaryView, DEFAULT_AVATAR};
use crate::i18n::Locale;

/// 请求级限制，来自配置
#[derive(Debug, Clone, Copy)]
pub struct RequestLimits {
    /// 上传图片解码后的最大字节数
    pub max_upload_size: usize,
}

/// 字段值来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// JSON 请求体，值保留原始类型
    Json,
    /// 表单、multipart 和查询串，值都是字符串
    Text,
}

/// 请求解析失败
#[derive(Debug)]
pub enum SchemaError {
    /// 输入不是字段表，没有逐字段的结构可报告
    Unreadable(String),
    /// 字段类型错误或违反规则
    Invalid(ValidationErrors),
}

/// 请求结构
///
/// 在派生的字段规则之外，允许依赖配置的额外检查；额外检查的违规会与字段规则的违规合并。
/// 所有字段必须是 `Option`，缺失的字段由 `required` 规则报告
pub trait RequestSchema: DeserializeOwned + Validate + Send {
    fn check_limits(&self, _limits: &RequestLimits, _errors: &mut ValidationErrors) {}

    /// 从字段表构造并校验
    ///
    /// 每个字段单独反序列化：类型不对的字段只报告 `type`，其余字段照常检查规则
    fn from_fields(
        fields: Map<String, Value>,
        source: FieldSource,
        limits: &RequestLimits,
    ) -> Result<Self, SchemaError> {
        let mut accepted = Map::new();
        let mut mistyped = Vec::new();
        for (name, value) in fields {
            match accept_field::<Self>(&name, value, source) {
                Some(value) => {
                    accepted.insert(name, value);
                }
                None => mistyped.push(name),
            }
        }

        let request =
            Self::deserialize(accepted).map_err(|e| SchemaError::Unreadable(e.to_string()))?;

        let mut errors = match request.validate_request(limits) {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        for name in mistyped {
            errors.errors_mut().insert(
                Cow::Owned(name),
                ValidationErrorsKind::Field(vec![ValidationError::new("type")]),
            );
        }

        if errors.is_empty() {
            Ok(request)
        } else {
            Err(SchemaError::Invalid(errors))
        }
    }

    fn validate_request(&self, limits: &RequestLimits) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        self.check_limits(limits, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// 单个字段能否反序列化为 `T` 中对应的类型；文本来源的值会再尝试按数字或布尔值解析（`limit=20`）
fn accept_field<T: DeserializeOwned>(name: &str, value: Value, source: FieldSource) -> Option<Value> {
    let value = match fits::<T>(name, value) {
        Ok(value) => return Some(value),
        Err(value) => value,
    };

    match (source, value) {
        (FieldSource::Text, Value::String(text)) => {
            let scalar = serde_json::from_str::<Value>(text.trim())
                .ok()
                .filter(|v| v.is_number() || v.is_boolean())?;
            fits::<T>(name, scalar).ok()
        }
        _ => None,
    }
}

fn fits<T: DeserializeOwned>(name: &str, value: Value) -> Result<Value, Value> {
    let mut single = Map::new();
    single.insert(name.to_string(), value);
    let fits = T::deserialize(&single).is_ok();
    let value = single.remove(name).unwrap_or(Value::Null);
    if fits {
        Ok(value)
    } else {
        Err(value)
    }
}

// ============================================================================
// Field rules
// ============================================================================

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF";

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn language_tag(value: &str) -> Result<(), ValidationError> {
    match Locale::parse(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("language_tag")),
    }
}

fn avatar_id(value: &str) -> Result<(), ValidationError> {
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        Ok(())
    } else {
        Err(ValidationError::new("avatar_id"))
    }
}

fn base64_image(value: &str) -> Result<(), ValidationError> {
    match decode_image(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("base64_image")),
    }
}

/// 解码 base64 图片（可带 `data:image/...;base64,` 前缀），只接受 PNG / JPEG
pub fn decode_image(value: &str) -> Option<Vec<u8>> {
    let encoded = match value.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => value,
    };
    let bytes = BASE64.decode(encoded.trim()).ok()?;

    if bytes.starts_with(PNG_MAGIC) || bytes.starts_with(JPEG_MAGIC) {
        Some(bytes)
    } else {
        None
    }
}

fn completed_has_url(response: &VideoStatusResponse) -> Result<(), ValidationError> {
    if response.status == "completed" && response.video_url.is_none() {
        return Err(ValidationError::new("completed_without_url"));
    }
    Ok(())
}

// ============================================================================
// Requests
// ============================================================================

/// POST /video/generate
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateVideoPayload {
    #[validate(required, length(min = 1, max = 5000), custom(function = "not_blank"))]
    pub text: Option<String>,

    /// 默认 `en`
    #[validate(custom(function = "language_tag"))]
    pub language: Option<String>,

    /// 默认 `default`，即配置的默认 presenter
    #[validate(length(min = 1, max = 100), custom(function = "avatar_id"))]
    pub avatar: Option<String>,

    /// base64 编码的头像图片
    #[validate(custom(function = "base64_image"))]
    pub custom_avatar: Option<String>,
}

impl RequestSchema for GenerateVideoPayload {
    fn check_limits(&self, limits: &RequestLimits, errors: &mut ValidationErrors) {
        let Some(image) = self.custom_avatar.as_deref().and_then(decode_image) else {
            return;
        };
        if image.len() > limits.max_upload_size {
            let mut error = ValidationError::new("image_too_large");
            error.add_param("max".into(), &limits.max_upload_size);
            errors.add("custom_avatar", error);
        }
    }
}

impl GenerateVideoPayload {
    /// 只在校验通过后调用
    pub fn into_command(self) -> GenerateVideo {
        GenerateVideo {
            text: self.text.unwrap_or_default(),
            language: self.language.unwrap_or_else(|| "en".to_string()),
            avatar: self.avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
            custom_avatar: self.custom_avatar.as_deref().and_then(decode_image),
        }
    }
}

/// GET /video
#[derive(Debug, Deserialize, Validate)]
pub struct ListVideosQuery {
    /// 默认 20
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,

    /// 默认 0
    pub offset: Option<u32>,
}

impl RequestSchema for ListVideosQuery {}

impl ListVideosQuery {
    pub const DEFAULT_LIMIT: u32 = 20;

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

// ============================================================================
// Responses
// ============================================================================

/// GET /
#[derive(Debug, Serialize, Validate)]
pub struct WelcomeResponse {
    #[validate(length(min = 1))]
    pub message: String,
}

/// POST /video/generate
#[derive(Debug, Serialize, Validate)]
pub struct VideoGenerationResponse {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub status: String,
    #[validate(length(min = 1))]
    pub message: String,
}

/// GET /video/status/:video_id
#[derive(Debug, Serialize, Validate)]
#[validate(schema(function = "completed_has_url"))]
pub struct VideoStatusResponse {
    #[validate(length(min = 1))]
    pub status: String,
    pub message: Option<String>,
    #[validate(length(min = 1))]
    pub video_url: Option<String>,
}

impl From<VideoStatusView> for VideoStatusResponse {
    fn from(view: VideoStatusView) -> Self {
        Self {
            status: view.status,
            message: view.message,
            video_url: view.video_url,
        }
    }
}

/// GET /video/avatars
#[derive(Debug, Serialize, Validate)]
pub struct AvatarSchema {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub thumbnail: Option<String>,
}

impl From<AvatarView> for AvatarSchema {
    fn from(view: AvatarView) -> Self {
        Self {
            id: view.id,
            name: view.name,
            thumbnail: view.thumbnail,
        }
    }
}

/// GET /video
#[derive(Debug, Serialize, Validate)]
pub struct VideoSummary {
    #[validate(length(min = 1))]
    pub id: String,
    pub language: String,
    pub avatar: Option<String>,
    #[validate(length(min = 1))]
    pub status: String,
    pub created_at: String,
}

impl From<VideoSummaryView> for VideoSummary {
    fn from(view: VideoSummaryView) -> Self {
        Self {
            id: view.id,
            language: view.language,
            avatar: view.avatar,
            status: view.status,
            created_at: view.created_at.to_rfc3339(),
        }
    }
}
