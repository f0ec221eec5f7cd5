//! CSV 處理紀錄
//!
//! 每個處理過的檔案寫入一列，寫入後立即 flush，中斷時已寫入的紀錄不會遺失。

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static REGEX_LOG_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^photo_organizer_log_\d{8}_\d{6}(_\d+)?\.csv$").expect("Invalid regex")
});

/// 紀錄檔欄位
pub const LOG_HEADER: [&str; 7] = [
    "action",
    "source_path",
    "destination_path",
    "capture_date",
    "lens",
    "hash",
    "detail",
];

/// 單一檔案的處理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Moved,
    Reorganized,
    Renamed,
    Unchanged,
    SkippedDuplicate,
    Failed,
}

impl Action {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Moved => "Moved",
            Self::Reorganized => "Reorganized",
            Self::Renamed => "Renamed",
            Self::Unchanged => "Unchanged",
            Self::SkippedDuplicate => "Skipped Duplicate",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一個檔案的處理紀錄（對應 CSV 一列）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub action: Action,
    pub source_path: PathBuf,
    pub destination_path: Option<PathBuf>,
    pub capture_date: Option<NaiveDate>,
    pub lens: Option<String>,
    pub hash: Option<String>,
    pub detail: String,
}

impl ActionRecord {
    #[must_use]
    pub fn new(source_path: &Path) -> Self {
        Self {
            action: Action::Failed,
            source_path: source_path.to_path_buf(),
            destination_path: None,
            capture_date: None,
            lens: None,
            hash: None,
            detail: String::new(),
        }
    }

    /// 標記為失敗並保留完整錯誤鏈
    pub fn fail(&mut self, error: &anyhow::Error) {
        self.action = Action::Failed;
        self.destination_path = None;
        self.detail = format!("{error:#}");
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    action: &'a str,
    source_path: String,
    destination_path: String,
    capture_date: String,
    lens: &'a str,
    hash: &'a str,
    detail: &'a str,
}

impl<'a> From<&'a ActionRecord> for CsvRow<'a> {
    fn from(record: &'a ActionRecord) -> Self {
        Self {
            action: record.action.as_str(),
            source_path: record.source_path.to_string_lossy().into_owned(),
            destination_path: record
                .destination_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
            capture_date: record
                .capture_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            lens: record.lens.as_deref().unwrap_or_default(),
            hash: record.hash.as_deref().unwrap_or_default(),
            detail: &record.detail,
        }
    }
}

/// 附加式 CSV 紀錄
pub struct ActionLog<W: Write> {
    writer: csv::Writer<W>,
    path: Option<PathBuf>,
    rows: usize,
}

/// 依時間產生紀錄檔名稱
#[must_use]
pub fn log_file_name(now: NaiveDateTime) -> String {
    format!("photo_organizer_log_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// 是否為本程式產生的紀錄檔名稱（含同秒重複時的 `_N` 編號）
#[must_use]
pub fn is_log_file_name(name: &str) -> bool {
    REGEX_LOG_FILE.is_match(name)
}

impl ActionLog<File> {
    /// 在指定資料夾建立帶時間戳記的紀錄檔，同一秒內重複建立時加上編號
    pub fn create_in(directory: &Path) -> Result<Self> {
        let base_name = log_file_name(Local::now().naive_local());
        let mut path = directory.join(&base_name);
        let mut counter = 1;

        let file = loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => break file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let stem = base_name.trim_end_matches(".csv");
                    path = directory.join(format!("{stem}_{counter}.csv"));
                    counter += 1;
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("無法建立紀錄檔: {}", path.display()));
                }
            }
        };

        let mut log = Self::from_writer(file)?;
        log.path = Some(path);
        Ok(log)
    }
}

impl<W: Write> ActionLog<W> {
    pub fn from_writer(writer: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        writer
            .write_record(LOG_HEADER)
            .context("無法寫入紀錄檔標題")?;
        writer.flush().context("無法寫入紀錄檔")?;

        Ok(Self {
            writer,
            path: None,
            rows: 0,
        })
    }

    pub fn write(&mut self, record: &ActionRecord) -> Result<()> {
        self.writer
            .serialize(CsvRow::from(record))
            .with_context(|| format!("無法寫入紀錄: {}", record.source_path.display()))?;
        self.writer.flush().context("無法寫入紀錄檔")?;
        self.rows += 1;
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 已寫入的資料列數（不含標題）
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// 寫入剩餘緩衝並取回底層 writer
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow!("無法完成紀錄檔寫入: {}", e.error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_record() -> ActionRecord {
        let mut record = ActionRecord::new(Path::new("/card/IMG_0001.CR2"));
        record.action = Action::Moved;
        record.destination_path = Some(PathBuf::from(
            "/photos/2024-01-02/EF50mm f_1_8 STM/IMG_0001.CR2",
        ));
        record.capture_date = NaiveDate::from_ymd_opt(2024, 1, 2);
        record.lens = Some("EF50mm f_1_8 STM".to_string());
        record.hash = Some("ab12".to_string());
        record
    }

    #[test]
    fn test_log_file_name() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 1)
            .unwrap();
        assert_eq!(log_file_name(now), "photo_organizer_log_20240309_070501.csv");
    }

    #[test]
    fn test_is_log_file_name() {
        assert!(is_log_file_name("photo_organizer_log_20240309_070501.csv"));
        assert!(is_log_file_name("photo_organizer_log_20240309_070501_2.csv"));
        assert!(!is_log_file_name("photo_organizer_log_2024.csv"));
        assert!(!is_log_file_name("IMG_0001.CR2"));
        assert!(!is_log_file_name("notes_photo_organizer_log_20240309_070501.csv"));
    }

    #[test]
    fn test_writes_header_and_rows() {
        let mut log = ActionLog::from_writer(Vec::new()).unwrap();
        log.write(&sample_record()).unwrap();

        let mut failed = ActionRecord::new(Path::new("/card/bad, name.jpg"));
        failed.fail(&anyhow!("permission denied"));
        log.write(&failed).unwrap();
        assert_eq!(log.rows(), 2);

        let output = String::from_utf8(log.finish().unwrap()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines[0],
            "action,source_path,destination_path,capture_date,lens,hash,detail"
        );
        assert_eq!(
            lines[1],
            "Moved,/card/IMG_0001.CR2,/photos/2024-01-02/EF50mm f_1_8 STM/IMG_0001.CR2,2024-01-02,EF50mm f_1_8 STM,ab12,"
        );
        assert_eq!(lines[2], "Failed,\"/card/bad, name.jpg\",,,,,permission denied");
    }

    #[test]
    fn test_empty_log_still_has_header() {
        let log = ActionLog::from_writer(Vec::new()).unwrap();
        let output = String::from_utf8(log.finish().unwrap()).unwrap();
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_create_in_never_reuses_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let first = ActionLog::create_in(temp_dir.path()).unwrap();
        let second = ActionLog::create_in(temp_dir.path()).unwrap();

        let first_path = first.path().unwrap().to_path_buf();
        let second_path = second.path().unwrap().to_path_buf();
        assert_ne!(first_path, second_path);
        assert!(first_path.exists());
        assert!(second_path.exists());
    }
}
