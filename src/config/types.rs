use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// 最近使用路徑的保留數量
pub const MAX_RECENT_PATHS: usize = 10;

/// 設定檔名稱（位於目前工作目錄）
pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "zh-TW")]
    ZhTw,
}

impl Language {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::ZhTw => "zh-TW",
        }
    }

    #[must_use]
    pub const fn all() -> [Self; 2] {
        [Self::EnUs, Self::ZhTw]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnUs => write!(f, "English"),
            Self::ZhTw => write!(f, "繁體中文"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub language: Language,
    /// exiftool 執行檔路徑或名稱
    pub exiftool_path: PathBuf,
    /// CSV 紀錄檔輸出資料夾
    pub log_directory: PathBuf,
    pub recent_paths: Vec<String>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            language: Language::default(),
            exiftool_path: PathBuf::from("exiftool"),
            log_directory: PathBuf::from("."),
            recent_paths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: UserSettings,
}
