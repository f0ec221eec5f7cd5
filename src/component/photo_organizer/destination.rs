//! 目的地路徑規劃
//!
//! 目的地格式為 `base/YYYY-MM-DD/鏡頭/檔名`，檔名衝突時依序嘗試 `檔名_1`、`檔名_2`…

use crate::tools::has_same_content;
use chrono::NaiveDate;
use log::warn;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

/// 沒有鏡頭資訊時使用的資料夾名稱
pub const UNKNOWN_LENS: &str = "Unknown_Lens";

/// 清理後為空字串時使用的名稱
pub const UNKNOWN_NAME: &str = "Unknown";

/// 目的地判定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// 目的地可直接使用
    Free(PathBuf),
    /// 發生檔名衝突，改用新名稱
    Renamed(PathBuf),
    /// 檔案已位於目的地
    InPlace,
    /// 目的地已有相同內容的檔案
    Duplicate(PathBuf),
}

/// 將名稱轉成安全的資料夾名稱：英數字與空白、`_`、`-` 以外都換成 `_`
#[must_use]
pub fn safe_folder_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// 鏡頭資料夾名稱
#[must_use]
pub fn lens_folder(lens_model: Option<&str>) -> String {
    lens_model.map_or_else(|| UNKNOWN_LENS.to_string(), safe_folder_name)
}

#[must_use]
pub fn date_folder(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[must_use]
pub fn destination_for(base: &Path, date: NaiveDate, lens: &str, file_name: &OsStr) -> PathBuf {
    base.join(date_folder(date)).join(lens).join(file_name)
}

/// 在 `dest` 同資料夾下產生第 `counter` 個候選名稱
#[must_use]
pub fn numbered_candidate(dest: &Path, counter: u32) -> PathBuf {
    let stem = dest.file_stem().unwrap_or_default();
    let mut name = OsString::from(stem);
    name.push(format!("_{counter}"));
    if let Some(ext) = dest.extension() {
        name.push(".");
        name.push(ext);
    }
    dest.with_file_name(name)
}

/// 決定來源檔案的實際目的地
///
/// 相同內容的既有檔案回傳 `Duplicate`；比對時讀取失敗視為不同內容，不會因此略過。
#[must_use]
pub fn resolve_destination(
    dest: &Path,
    source: &Path,
    source_size: u64,
    source_hash: &str,
) -> Resolution {
    match check_candidate(dest, source, source_size, source_hash) {
        Candidate::Vacant => return Resolution::Free(dest.to_path_buf()),
        Candidate::Settled(resolution) => return resolution,
        Candidate::Taken => {}
    }

    let mut counter = 1;
    loop {
        let candidate = numbered_candidate(dest, counter);
        match check_candidate(&candidate, source, source_size, source_hash) {
            Candidate::Vacant => return Resolution::Renamed(candidate),
            Candidate::Settled(resolution) => return resolution,
            Candidate::Taken => counter += 1,
        }
    }
}

enum Candidate {
    Vacant,
    /// 被其他內容的檔案占用
    Taken,
    Settled(Resolution),
}

fn check_candidate(
    candidate: &Path,
    source: &Path,
    source_size: u64,
    source_hash: &str,
) -> Candidate {
    if fs::symlink_metadata(candidate).is_err() {
        return Candidate::Vacant;
    }

    if is_same_file(candidate, source) {
        return Candidate::Settled(Resolution::InPlace);
    }

    match has_same_content(candidate, source_size, source_hash) {
        Ok(true) => Candidate::Settled(Resolution::Duplicate(candidate.to_path_buf())),
        Ok(false) => Candidate::Taken,
        Err(e) => {
            warn!("無法比對檔案內容 {}: {e:#}", candidate.display());
            Candidate::Taken
        }
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::calculate_file_hash;
    use tempfile::TempDir;

    #[test]
    fn test_safe_folder_name() {
        assert_eq!(
            safe_folder_name("EF24-70mm f/2.8L II USM"),
            "EF24-70mm f_2_8L II USM"
        );
        assert_eq!(safe_folder_name("  FE 35mm F1.8 "), "FE 35mm F1_8");
        assert_eq!(safe_folder_name("   "), UNKNOWN_NAME);
        assert_eq!(safe_folder_name(""), UNKNOWN_NAME);
        assert_eq!(safe_folder_name("広角レンズ"), "広角レンズ");
    }

    #[test]
    fn test_lens_folder_defaults_to_unknown() {
        assert_eq!(lens_folder(None), UNKNOWN_LENS);
        assert_eq!(lens_folder(Some("XF23mmF2 R WR")), "XF23mmF2 R WR");
    }

    #[test]
    fn test_destination_layout() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        let dest = destination_for(
            Path::new("/photos"),
            date,
            "RF50mm F1_8 STM",
            OsStr::new("IMG_0042.CR3"),
        );
        assert_eq!(
            dest,
            PathBuf::from("/photos/2024-07-04/RF50mm F1_8 STM/IMG_0042.CR3")
        );
    }

    #[test]
    fn test_numbered_candidate() {
        assert_eq!(
            numbered_candidate(Path::new("/a/IMG_1.JPG"), 2),
            PathBuf::from("/a/IMG_1_2.JPG")
        );
        assert_eq!(
            numbered_candidate(Path::new("/a/README"), 1),
            PathBuf::from("/a/README_1")
        );
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_resolve_free_and_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src/IMG_1.JPG");
        write(&source, "photo");
        let hash = calculate_file_hash(&source).unwrap();

        let dest = temp_dir.path().join("out/IMG_1.JPG");
        assert_eq!(
            resolve_destination(&dest, &source, 5, &hash),
            Resolution::Free(dest.clone())
        );
        assert_eq!(
            resolve_destination(&source, &source, 5, &hash),
            Resolution::InPlace
        );
    }

    #[test]
    fn test_resolve_collision_renames_and_detects_duplicates() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src/IMG_1.JPG");
        write(&source, "photo");
        let hash = calculate_file_hash(&source).unwrap();

        let dest = temp_dir.path().join("out/IMG_1.JPG");
        write(&dest, "other");
        assert_eq!(
            resolve_destination(&dest, &source, 5, &hash),
            Resolution::Renamed(temp_dir.path().join("out/IMG_1_1.JPG"))
        );

        write(&temp_dir.path().join("out/IMG_1_1.JPG"), "thing");
        write(&temp_dir.path().join("out/IMG_1_2.JPG"), "photo");
        assert_eq!(
            resolve_destination(&dest, &source, 5, &hash),
            Resolution::Duplicate(temp_dir.path().join("out/IMG_1_2.JPG"))
        );
    }

    #[test]
    fn test_resolve_identical_destination_is_duplicate() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src/IMG_1.JPG");
        let dest = temp_dir.path().join("out/IMG_1.JPG");
        write(&source, "photo");
        write(&dest, "photo");
        let hash = calculate_file_hash(&source).unwrap();

        assert_eq!(
            resolve_destination(&dest, &source, 5, &hash),
            Resolution::Duplicate(dest.clone())
        );
    }
}
