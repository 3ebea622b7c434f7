//! Localizer - 语言解析与消息翻译
//!
//! 进程启动时加载一次，之后只读共享（`Arc<Localizer>`），无需加锁

use std::collections::{BTreeMap, HashMap};

use super::catalog::{builtin_catalogs, load_catalog_dir, Catalog, CatalogError};
use super::locale::{parse_accept_language, Locale};
use crate::config::I18nConfig;

/// 本地化解析器
#[derive(Debug)]
pub struct Localizer {
    catalogs: HashMap<Locale, Catalog>,
    default_locale: Locale,
}

impl Localizer {
    /// 创建解析器
    ///
    /// `supported` 为空时服务全部已加载的目录，否则只保留列出的语言
    pub fn new(
        catalogs: BTreeMap<Locale, Catalog>,
        default_locale: Locale,
        supported: &[Locale],
    ) -> Result<Self, CatalogError> {
        let catalogs: HashMap<Locale, Catalog> = catalogs
            .into_iter()
            .filter(|(locale, _)| supported.is_empty() || supported.contains(locale))
            .collect();

        if !catalogs.contains_key(&default_locale) {
            return Err(CatalogError::DefaultLocaleMissing(default_locale.to_string()));
        }

        Ok(Self {
            catalogs,
            default_locale,
        })
    }

    /// 根据配置加载：内置目录 + `catalog_dir` 中的覆盖/新增目录
    pub fn from_config(config: &I18nConfig) -> Result<Self, CatalogError> {
        let mut catalogs = builtin_catalogs()?;

        if let Some(dir) = &config.catalog_dir {
            for (locale, overrides) in load_catalog_dir(dir)? {
                catalogs.entry(locale).or_default().extend(overrides);
            }
        }

        let default_locale = Locale::parse(&config.default_locale)
            .ok_or_else(|| CatalogError::InvalidLocale(config.default_locale.clone()))?;
        let supported = config
            .supported
            .iter()
            .map(|tag| Locale::parse(tag).ok_or_else(|| CatalogError::InvalidLocale(tag.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        let localizer = Self::new(catalogs, default_locale, &supported)?;
        tracing::info!(
            default_locale = %localizer.default_locale,
            locales = ?localizer.supported_locales(),
            "Message catalogs loaded"
        );
        Ok(localizer)
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    pub fn is_supported(&self, locale: &Locale) -> bool {
        self.catalogs.contains_key(locale)
    }

    /// 已支持的语言（排序后）
    pub fn supported_locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.catalogs.keys().map(Locale::as_str).collect();
        locales.sort_unstable();
        locales
    }

    /// 按偏好列表解析语言
    ///
    /// 每个候选依次尝试：完整标签 -> 基础语言；全部失败时返回默认语言
    pub fn resolve<I>(&self, preferences: I) -> Locale
    where
        I: IntoIterator<Item = Locale>,
    {
        for requested in preferences {
            if self.is_supported(&requested) {
                return requested;
            }
            if let Some(base) = requested.base() {
                if self.is_supported(&base) {
                    return base;
                }
            }
        }
        self.default_locale.clone()
    }

    /// 从请求参数解析语言：先 `lang` 查询参数，再 `Accept-Language`
    pub fn resolve_request(&self, lang_param: Option<&str>, accept_language: Option<&str>) -> Locale {
        let preferences = lang_param
            .and_then(Locale::parse)
            .into_iter()
            .chain(accept_language.map(parse_accept_language).unwrap_or_default());
        self.resolve(preferences)
    }

    /// 查找消息，不做任何回退
    pub fn lookup(&self, locale: &Locale, key: &str) -> Option<&str> {
        self.catalogs
            .get(locale)
            .and_then(|catalog| catalog.get(key))
            .map(String::as_str)
    }

    /// 翻译消息
    ///
    /// 回退顺序：目标语言 -> 默认语言 -> key 本身
    pub fn translate<'a>(&'a self, locale: &Locale, key: &'a str) -> &'a str {
        self.lookup(locale, key)
            .or_else(|| self.lookup(&self.default_locale, key))
            .unwrap_or(key)
    }

    /// 翻译消息并替换 `{name}` 占位符
    pub fn translate_with(&self, locale: &Locale, key: &str, args: &[(&str, &str)]) -> String {
        interpolate(self.translate(locale, key), args)
    }
}

fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{}}}", name), value)
    })
}
