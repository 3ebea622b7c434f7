//! 请求语言上下文
//!
//! 每个请求解析一次语言（`lang` 查询参数优先，其次 `Accept-Language`），
//! 之后所有面向客户端的消息都通过它本地化

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header::ACCEPT_LANGUAGE, request::Parts, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use super::error::{ApiError, ValidationDetails};
use super::state::AppState;
use crate::application::{ApplicationError, ErrorKind, MessageArg};
use crate::i18n::{Locale, Localizer};

#[derive(Debug, Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

/// 请求语言上下文
#[derive(Debug, Clone)]
pub struct LocaleContext {
    locale: Locale,
    localizer: Arc<Localizer>,
}

impl LocaleContext {
    pub fn new(localizer: Arc<Localizer>, locale: Locale) -> Self {
        Self { locale, localizer }
    }

    /// 从请求行和请求头解析语言
    pub fn from_request_head(localizer: &Arc<Localizer>, uri: &Uri, headers: &HeaderMap) -> Self {
        let lang = Query::<LangQuery>::try_from_uri(uri)
            .ok()
            .and_then(|Query(query)| query.lang);
        let accept_language = headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok());

        let locale = localizer.resolve_request(lang.as_deref(), accept_language);
        Self::new(localizer.clone(), locale)
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn t(&self, key: &str) -> String {
        self.localizer.translate(&self.locale, key).to_string()
    }

    pub fn t_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        self.localizer.translate_with(&self.locale, key, args)
    }

    /// 应用层错误 -> 本地化的 API 错误
    pub fn error(&self, err: ApplicationError) -> ApiError {
        let args: Vec<(&str, String)> = err
            .message_args()
            .into_iter()
            .map(|(name, arg)| match arg {
                MessageArg::Text(text) => (name, text),
                MessageArg::Key(key) => (name, self.t(key)),
            })
            .collect();
        let args: Vec<(&str, &str)> = args.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let message = self.t_with(err.message_key(), &args);
        ApiError::new(err.kind(), message).with_diagnostic(err.to_string())
    }

    /// 使用错误类别的默认消息
    pub fn error_kind(&self, kind: ErrorKind) -> ApiError {
        ApiError::new(kind, self.t(kind.message_key()))
    }

    /// 校验失败：列出每个字段违反的所有规则
    pub fn validation_error(&self, errors: &ValidationErrors) -> ApiError {
        let mut details = ValidationDetails::new();
        for (field, field_errors) in errors.field_errors() {
            let messages = field_errors
                .iter()
                .map(|error| {
                    let params: Vec<(String, String)> = error
                        .params
                        .iter()
                        .filter(|(name, _)| name.as_ref() != "value")
                        .map(|(name, value)| {
                            let value = match value {
                                serde_json::Value::String(s) => s.clone(),
                                other => other.to_string(),
                            };
                            (name.to_string(), value)
                        })
                        .collect();
                    let params: Vec<(&str, &str)> = params
                        .iter()
                        .map(|(name, value)| (name.as_str(), value.as_str()))
                        .collect();
                    self.t_with(&format!("validation.{}", error.code), &params)
                })
                .collect();
            details.insert(field.to_string(), messages);
        }

        ApiError::validation(self.t("error.validation"), details)
            .with_diagnostic(errors.to_string())
    }

    /// 请求体或查询串无法解析，没有逐字段的结构可报告
    pub fn unreadable(&self, source: &'static str, diagnostic: impl Into<String>) -> ApiError {
        let details = ValidationDetails::from([(
            source.to_string(),
            vec![self.t(&format!("validation.{}", source))],
        )]);
        ApiError::validation(self.t("error.validation"), details).with_diagnostic(diagnostic)
    }

    /// 输出响应前校验响应契约，不满足时按内部错误处理
    pub fn respond<T>(&self, status: StatusCode, body: T) -> Result<Response, ApiError>
    where
        T: Serialize + Validate,
    {
        self.check_contract(&body)?;
        Ok((status, Json(body)).into_response())
    }

    /// 列表响应，逐项校验
    pub fn respond_list<T>(&self, status: StatusCode, items: Vec<T>) -> Result<Response, ApiError>
    where
        T: Serialize + Validate,
    {
        for item in &items {
            self.check_contract(item)?;
        }
        Ok((status, Json(items)).into_response())
    }

    fn check_contract<T: Validate>(&self, body: &T) -> Result<(), ApiError> {
        body.validate().map_err(|errors| {
            tracing::error!(
                schema = std::any::type_name::<T>(),
                violations = %errors,
                "Response violates its contract"
            );
            self.error_kind(ErrorKind::InternalError)
        })
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for LocaleContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_request_head(&state.localizer, &parts.uri, &parts.headers))
    }
}
