use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

/// 從照片中解析出的中繼資料
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoMetadata {
    pub capture_date: Option<NaiveDate>,
    pub lens_model: Option<String>,
}

/// 中繼資料讀取器
pub trait MetadataReader {
    fn read_metadata(&self, path: &Path) -> Result<PhotoMetadata>;
}

/// 透過外部 exiftool 讀取中繼資料
#[derive(Debug, Clone)]
pub struct ExifTool {
    program: PathBuf,
}

impl Default for ExifTool {
    fn default() -> Self {
        Self::new("exiftool")
    }
}

impl ExifTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// 確認 exiftool 可以執行，回傳版本字串
    pub fn check_available(&self) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("-ver")
            .output()
            .with_context(|| format!("找不到 exiftool: {}", self.program.display()))?;

        if !output.status.success() {
            bail!(
                "exiftool 無法執行 ({}): {}",
                self.program.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl MetadataReader for ExifTool {
    fn read_metadata(&self, path: &Path) -> Result<PhotoMetadata> {
        let output = Command::new(&self.program)
            .arg("-j")
            .arg(path)
            .output()
            .with_context(|| format!("無法執行 exiftool: {}", path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("exiftool 執行失敗: {}", stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_exiftool_output(&stdout)
            .with_context(|| format!("無法解析 exiftool 輸出: {}", path.display()))
    }
}

// exiftool -j 輸出的欄位，數值型欄位也可能出現，因此保留原始 Value
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExifToolEntry {
    date_time_original: Option<Value>,
    create_date: Option<Value>,
    media_create_date: Option<Value>,
    lens_model: Option<Value>,
    #[serde(rename = "LensID")]
    lens_id: Option<Value>,
    lens_make: Option<Value>,
}

static REGEX_EXIF_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{4}):(\d{2}):(\d{2})").expect("Invalid regex"));

/// 解析 `exiftool -j` 的 JSON 輸出（取陣列第一筆）
pub fn parse_exiftool_output(json: &str) -> Result<PhotoMetadata> {
    let entries: Vec<ExifToolEntry> = serde_json::from_str(json)?;
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("exiftool 輸出為空"))?;

    let capture_date = [
        &entry.date_time_original,
        &entry.create_date,
        &entry.media_create_date,
    ]
    .into_iter()
    .filter_map(|v| v.as_ref().and_then(value_as_text))
    .find_map(|s| parse_exif_date(&s));

    let lens_model = [&entry.lens_model, &entry.lens_id, &entry.lens_make]
        .into_iter()
        .find_map(|v| v.as_ref().and_then(value_as_text));

    Ok(PhotoMetadata {
        capture_date,
        lens_model,
    })
}

/// 解析 EXIF 日期（`YYYY:MM:DD HH:MM:SS`，可能帶時區或小數秒）
///
/// 全零日期等無效日期回傳 `None`。
#[must_use]
pub fn parse_exif_date(value: &str) -> Option<NaiveDate> {
    let caps = REGEX_EXIF_DATE.captures(value)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn value_as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
