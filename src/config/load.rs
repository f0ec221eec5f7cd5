use crate::config::types::{Config, SETTINGS_FILE, UserSettings};
use anyhow::{Context, Result};
use log::warn;
use std::fs;
use std::path::Path;

impl Config {
    /// 從目前工作目錄的 settings.json 載入；讀取失敗時使用預設值
    #[must_use]
    pub fn new() -> Self {
        Self::from_path(Path::new(SETTINGS_FILE))
    }

    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let settings = Self::load_settings(path).unwrap_or_else(|e| {
            warn!("設定檔無法使用，改用預設值: {e:#}");
            UserSettings::default()
        });
        Self { settings }
    }

    fn load_settings(path: &Path) -> Result<UserSettings> {
        if !path.exists() {
            return Ok(UserSettings::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        if content.trim().is_empty() {
            return Ok(UserSettings::default());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))
    }
}
