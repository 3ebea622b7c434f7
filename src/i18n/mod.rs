//! Localization - 语言解析与消息目录
//!
//! - locale: 语言标签、Accept-Language 解析
//! - catalog: TOML 消息目录加载
//! - localizer: 回退链解析与翻译

mod catalog;
mod locale;
mod localizer;

pub use catalog::{builtin_catalogs, load_catalog_dir, parse_catalog, Catalog, CatalogError};
pub use locale::{parse_accept_language, Locale};
pub use localizer::Localizer;
