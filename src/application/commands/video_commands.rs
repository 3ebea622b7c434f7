//! Video Commands

/// 生成视频命令
#[derive(Debug, Clone)]
pub struct GenerateVideo {
    /// 旁白文本
    pub text: String,
    /// 旁白语言
    pub language: String,
    /// 预置 presenter，`default` 表示使用配置中的默认 presenter
    pub avatar: String,
    /// 用户上传的头像图片，优先于 `avatar`
    pub custom_avatar: Option<Vec<u8>>,
}
