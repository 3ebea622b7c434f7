//! Narration voices - 语言到旁白音色的映射

use std::collections::HashMap;

/// 旁白音色表
#[derive(Debug, Clone)]
pub struct NarrationVoices {
    voices: HashMap<String, String>,
    fallback_language: String,
}

impl NarrationVoices {
    /// 创建音色表，key 统一为小写
    pub fn new(voices: HashMap<String, String>, fallback_language: impl Into<String>) -> Self {
        Self {
            voices: voices
                .into_iter()
                .map(|(lang, voice)| (lang.to_ascii_lowercase(), voice))
                .collect(),
            fallback_language: fallback_language.into().to_ascii_lowercase(),
        }
    }

    /// 选择音色
    ///
    /// 顺序：完整语言标签 -> 基础语言 -> 回退语言；都没有时返回 None
    pub fn select(&self, language: &str) -> Option<&str> {
        let language = language.to_ascii_lowercase().replace('_', "-");
        let base = language.split('-').next().unwrap_or_default();

        self.voices
            .get(&language)
            .or_else(|| self.voices.get(base))
            .or_else(|| self.voices.get(&self.fallback_language))
            .map(String::as_str)
    }
}
