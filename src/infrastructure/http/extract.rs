//! 校验型提取器
//!
//! 请求在这里被解析并校验为具名的请求结构，校验失败的请求不会进入处理器

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{multipart::MultipartError, FromRequest, FromRequestParts, Multipart, Path, Query, Request},
    http::{header::CONTENT_TYPE, request::Parts},
    Form, Json,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Map, Value};
use validator::{ValidationError, ValidationErrors};

use super::error::ApiError;
use super::locale::LocaleContext;
use super::schema::{FieldSource, RequestSchema, SchemaError};
use super::state::AppState;
use crate::domain::VideoId;

/// 已校验的请求体
///
/// 支持 JSON、`application/x-www-form-urlencoded` 和 `multipart/form-data`；
/// multipart 中的文件字段以 base64 字符串形式放入同名字段。
/// 请求体必须是字段表（JSON 对象），字段逐个校验
#[derive(Debug)]
pub struct Validated<T>(pub T);

#[async_trait]
impl<T> FromRequest<Arc<AppState>> for Validated<T>
where
    T: RequestSchema + 'static,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let ctx = LocaleContext::from_request_head(&state.localizer, req.uri(), req.headers());
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let (fields, source) = if content_type.starts_with("application/json") {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| ctx.unreadable("body", e.body_text()))?;
            match value {
                Value::Object(fields) => (fields, FieldSource::Json),
                other => {
                    return Err(ctx.unreadable(
                        "body",
                        format!("Expected a JSON object, found {}", json_type(&other)),
                    ))
                }
            }
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| ctx.unreadable("body", e.body_text()))?;
            (text_fields(pairs), FieldSource::Text)
        } else if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ctx.unreadable("body", e.body_text()))?;
            let fields = read_multipart(multipart)
                .await
                .map_err(|e| ctx.unreadable("body", e.body_text()))?;
            (fields, FieldSource::Text)
        } else {
            return Err(ctx.unreadable(
                "body",
                format!("Unsupported content type: {:?}", content_type),
            ));
        };

        T::from_fields(fields, source, &state.limits)
            .map(Self)
            .map_err(|e| schema_error(&ctx, "body", e))
    }
}

fn schema_error(ctx: &LocaleContext, source: &'static str, err: SchemaError) -> ApiError {
    match err {
        SchemaError::Unreadable(diagnostic) => ctx.unreadable(source, diagnostic),
        SchemaError::Invalid(errors) => ctx.validation_error(&errors),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 表单和查询串的键值对，重复的键保留最后一个
fn text_fields(pairs: Vec<(String, String)>) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect()
}

/// 读取 multipart 字段，文本字段原样保留，文件字段转为 base64
async fn read_multipart(mut multipart: Multipart) -> Result<Map<String, Value>, MultipartError> {
    let mut fields = Map::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        let value = if field.file_name().is_some() {
            let bytes = field.bytes().await?;
            // 表单中未选择文件时浏览器仍会发送空的文件字段
            if bytes.is_empty() {
                continue;
            }
            BASE64.encode(&bytes)
        } else {
            field.text().await?
        };

        fields.insert(name, Value::String(value));
    }

    Ok(fields)
}

/// 已校验的查询参数
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T> FromRequestParts<Arc<AppState>> for ValidatedQuery<T>
where
    T: RequestSchema + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let ctx = LocaleContext::from_request_head(&state.localizer, &parts.uri, &parts.headers);

        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|e| ctx.unreadable("query", e.body_text()))?;

        T::from_fields(text_fields(pairs), FieldSource::Text, &state.limits)
            .map(Self)
            .map_err(|e| schema_error(&ctx, "query", e))
    }
}

/// 路径中的视频 ID
#[derive(Debug)]
pub struct PathVideoId(pub VideoId);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for PathVideoId {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let ctx = LocaleContext::from_request_head(&state.localizer, &parts.uri, &parts.headers);

        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ctx.unreadable("video_id", e.body_text()))?;

        VideoId::parse(&raw).map(Self).map_err(|e| {
            let mut errors = ValidationErrors::new();
            errors.add("video_id", ValidationError::new("video_id"));
            ctx.validation_error(&errors).with_diagnostic(e.to_string())
        })
    }
}
