//! Message Catalog - 消息目录加载
//!
//! 目录为 TOML 文件，嵌套表展开为以 `.` 连接的 key：
//!
//! ```toml
//! welcome = "Welcome"
//!
//! [video]
//! ready = "Your video is ready"   # key: video.ready
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::locale::Locale;

/// 单个语言的消息目录
pub type Catalog = HashMap<String, String>;

/// 目录加载错误
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("Invalid locale tag: {0}")]
    InvalidLocale(String),

    #[error("Default locale {0} has no catalog or is not supported")]
    DefaultLocaleMissing(String),
}

/// 内置目录（编译期嵌入）
const BUILTIN_CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.toml")),
    ("es", include_str!("../../locales/es.toml")),
    ("fr", include_str!("../../locales/fr.toml")),
    ("hi", include_str!("../../locales/hi.toml")),
];

/// 加载内置目录
pub fn builtin_catalogs() -> Result<BTreeMap<Locale, Catalog>, CatalogError> {
    BUILTIN_CATALOGS
        .iter()
        .map(|(tag, source)| {
            let locale =
                Locale::parse(tag).ok_or_else(|| CatalogError::InvalidLocale(tag.to_string()))?;
            Ok((locale, parse_catalog(source, tag)?))
        })
        .collect()
}

/// 从目录加载 `<locale>.toml` 文件
pub fn load_catalog_dir(dir: &Path) -> Result<BTreeMap<Locale, Catalog>, CatalogError> {
    let io_err = |source| CatalogError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut catalogs = BTreeMap::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let locale = Locale::parse(&stem).ok_or_else(|| CatalogError::InvalidLocale(stem.clone()))?;

        let source = std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            path: path.clone(),
            source,
        })?;
        let catalog = parse_catalog(&source, &path.display().to_string())?;

        tracing::debug!(locale = %locale, keys = catalog.len(), path = %path.display(), "Catalog loaded");
        catalogs.insert(locale, catalog);
    }

    Ok(catalogs)
}

/// 解析并展开 TOML 目录
pub fn parse_catalog(source: &str, origin: &str) -> Result<Catalog, CatalogError> {
    let table: toml::Table = source.parse().map_err(|e: toml::de::Error| CatalogError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    })?;

    let mut catalog = Catalog::new();
    flatten_into(&mut catalog, None, &table, origin)?;
    Ok(catalog)
}

fn flatten_into(
    catalog: &mut Catalog,
    prefix: Option<&str>,
    table: &toml::Table,
    origin: &str,
) -> Result<(), CatalogError> {
    for (key, value) in table {
        let full_key = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.clone(),
        };

        match value {
            toml::Value::String(text) => {
                catalog.insert(full_key, text.clone());
            }
            toml::Value::Table(nested) => flatten_into(catalog, Some(&full_key), nested, origin)?,
            other => {
                return Err(CatalogError::Parse {
                    origin: origin.to_string(),
                    message: format!("key {} must be a string, found {}", full_key, other.type_str()),
                })
            }
        }
    }
    Ok(())
}
