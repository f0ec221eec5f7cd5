use anyhow::Result;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub size: u64,
}

/// 掃描結果
#[derive(Debug, Default)]
pub struct ScanResult {
    /// 待處理的一般檔案，依路徑排序
    pub files: Vec<FileInfo>,
    /// 因隱藏或系統檔案而略過的項目數（隱藏資料夾算一個）
    pub hidden_skipped: usize,
    /// 本程式自己的設定檔與紀錄檔，不列入整理
    pub reserved_skipped: usize,
}

/// 檔名以 `.` 開頭視為隱藏或系統檔案（包含 macOS 的 `._` resource fork）
fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

fn is_hidden(entry: &DirEntry) -> bool {
    // 根目錄本身不過濾（例如 /tmp/.tmpXXXX）
    entry.depth() > 0 && is_hidden_name(&entry.file_name().to_string_lossy())
}

/// 遞迴掃描來源資料夾的所有一般檔案
///
/// 在移動任何檔案之前先收集完整清單，就地整理時不會再次掃到已放好的檔案。
pub fn scan_photo_files(directory: &Path) -> Result<ScanResult> {
    let mut result = ScanResult::default();
    let mut hidden_skipped = 0;

    let walker = WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            if is_hidden(entry) {
                debug!("略過隱藏/系統檔案: {}", entry.path().display());
                hidden_skipped += 1;
                false
            } else {
                true
            }
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("無法讀取目錄項目: {e}");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            if !entry.file_type().is_dir() {
                debug!("略過非一般檔案: {}", entry.path().display());
            }
            continue;
        }

        match entry.metadata() {
            Ok(metadata) => result.files.push(FileInfo {
                path: entry.into_path(),
                size: metadata.len(),
            }),
            Err(e) => warn!("無法讀取檔案資訊 {}: {e}", entry.path().display()),
        }
    }

    result.hidden_skipped = hidden_skipped;
    result.files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(result)
}
