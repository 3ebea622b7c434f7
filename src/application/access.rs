//! API Key 访问控制

use std::collections::{HashMap, HashSet};

use subtle::ConstantTimeEq;

use crate::application::error::ApplicationError;
use crate::config::{AuthConfig, Scope};

/// API Key 访问策略
///
/// 未配置任何 key 时所有请求放行
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    keys: HashMap<String, HashSet<Scope>>,
}

impl AccessPolicy {
    /// 不做任何校验的策略
    pub fn open() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let mut keys: HashMap<String, HashSet<Scope>> = HashMap::new();
        for api_key in &config.api_keys {
            keys.entry(api_key.key.clone())
                .or_default()
                .extend(api_key.scopes.iter().copied());
        }
        Self { keys }
    }

    pub fn is_enforced(&self) -> bool {
        !self.keys.is_empty()
    }

    /// 校验凭证
    ///
    /// - 缺少或未知的 key -> Unauthorized
    /// - key 缺少所需 scope -> Forbidden
    pub fn authorize(&self, credential: Option<&str>, required: Scope) -> Result<(), ApplicationError> {
        if !self.is_enforced() {
            return Ok(());
        }

        let credential = credential
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ApplicationError::Unauthorized("missing API key".to_string()))?;

        let scopes = self
            .find_scopes(credential)
            .ok_or_else(|| ApplicationError::Unauthorized("unknown API key".to_string()))?;

        if scopes.contains(&required) {
            Ok(())
        } else {
            Err(ApplicationError::Forbidden(format!(
                "API key lacks {:?} scope",
                required
            )))
        }
    }

    /// 逐个比较所有已配置的 key，耗时与匹配位置无关
    fn find_scopes(&self, credential: &str) -> Option<&HashSet<Scope>> {
        let mut found = None;
        for (key, scopes) in &self.keys {
            if keys_match(key, credential) && found.is_none() {
                found = Some(scopes);
            }
        }
        found
    }
}

/// 常量时间比较；长度不同时仍做一次等长比较
fn keys_match(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();
    if expected.len() != provided.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    expected.ct_eq(provided).into()
}
