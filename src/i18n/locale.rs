//! Locale - 语言标签与 Accept-Language 解析

use std::cmp::Ordering;
use std::fmt;

/// 语言标签
///
/// 统一为小写、以 `-` 分隔（`pt_BR` / `pt-BR` 都规范为 `pt-br`）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locale(String);

impl Locale {
    /// 解析语言标签，格式非法时返回 None
    pub fn parse(tag: &str) -> Option<Self> {
        let normalized = tag.trim().replace('_', "-").to_ascii_lowercase();
        if normalized.is_empty() {
            return None;
        }

        let valid = normalized.split('-').enumerate().all(|(i, subtag)| {
            let len_ok = (1..=8).contains(&subtag.len());
            let chars_ok = if i == 0 {
                subtag.chars().all(|c| c.is_ascii_alphabetic())
            } else {
                subtag.chars().all(|c| c.is_ascii_alphanumeric())
            };
            len_ok && chars_ok
        });

        valid.then_some(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 基础语言（`fr-fr` -> `fr`），本身已是基础语言时返回 None
    pub fn base(&self) -> Option<Locale> {
        self.0
            .split_once('-')
            .map(|(base, _)| Locale(base.to_string()))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 解析 `Accept-Language` 头
///
/// 按 q 值降序返回（q 相同保持原顺序），忽略 `*`、`q=0` 和非法条目（q 不在 0..=1 内也算非法）
pub fn parse_accept_language(header: &str) -> Vec<Locale> {
    let mut weighted: Vec<(Locale, f32)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            if tag == "*" {
                return None;
            }

            let mut quality = 1.0_f32;
            for param in parts {
                if let Some((name, value)) = param.split_once('=') {
                    if name.trim().eq_ignore_ascii_case("q") {
                        quality = value
                            .trim()
                            .parse::<f32>()
                            .ok()
                            .filter(|q| q.is_finite() && (0.0..=1.0).contains(q))?;
                    }
                }
            }

            if quality <= 0.0 {
                return None;
            }

            Locale::parse(tag).map(|locale| (locale, quality))
        })
        .collect();

    // sort_by 是稳定排序
    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    weighted.into_iter().map(|(locale, _)| locale).collect()
}
