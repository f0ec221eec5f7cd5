use crate::tools::ensure_directory_exists;
use anyhow::{Context, Result, bail};
use log::{debug, warn};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// 移動檔案到目標路徑，不覆寫既有檔案
///
/// 先以 `create_new` 佔住目標名稱，之後的 `rename` 只會取代自己建立的空檔。
/// 跨檔案系統時改為複製到目標資料夾內的暫存檔，完成後再改名並刪除來源。
/// 失敗時移除目標（佔位檔或尚未刪除來源的副本），來源保持不變。
pub fn move_file(source: &Path, target: &Path) -> Result<()> {
    fs::symlink_metadata(source)
        .with_context(|| format!("來源檔案不存在: {}", source.display()))?;

    if let Some(parent) = target.parent() {
        ensure_directory_exists(parent)?;
    }

    reserve_target(target)?;

    let moved = match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            debug!(
                "rename 失敗，改用複製: {} ({rename_err})",
                source.display()
            );
            copy_and_delete(source, target)
        }
    };

    if moved.is_err() {
        if let Err(e) = fs::remove_file(target) {
            warn!("無法移除佔位檔 {}: {e}", target.display());
        }
    }
    moved
}

fn reserve_target(target: &Path) -> Result<()> {
    match OpenOptions::new().write(true).create_new(true).open(target) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            bail!("目標檔案已存在: {}", target.display())
        }
        Err(e) => Err(e).with_context(|| format!("無法建立目標檔案: {}", target.display())),
    }
}

fn copy_and_delete(source: &Path, target: &Path) -> Result<()> {
    let partial = partial_path(target);

    let copied = fs::copy(source, &partial)
        .with_context(|| {
            format!("複製檔案失敗: {} -> {}", source.display(), partial.display())
        })
        .and_then(|_| {
            fs::rename(&partial, target).with_context(|| {
                format!("暫存檔改名失敗: {} -> {}", partial.display(), target.display())
            })
        });

    if let Err(e) = copied {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    match fs::remove_file(source) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("刪除原檔案失敗: {}", source.display())),
    }
}

fn partial_path(target: &Path) -> PathBuf {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!(".{}.partial", Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_move_creates_parent_and_removes_source() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("IMG_0001.CR2");
        let target = temp_dir.path().join("2024-03-01/Unknown_Lens/IMG_0001.CR2");
        fs::write(&source, "raw").unwrap();

        move_file(&source, &target).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "raw");
    }

    #[test]
    fn test_move_never_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.jpg");
        let target = temp_dir.path().join("b.jpg");
        fs::write(&source, "new").unwrap();
        fs::write(&target, "old").unwrap();

        assert!(move_file(&source, &target).is_err());
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
        assert!(source.exists());
    }

    #[test]
    fn test_copy_and_delete_leaves_no_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.jpg");
        let out_dir = temp_dir.path().join("out");
        fs::create_dir(&out_dir).unwrap();
        let target = out_dir.join("a.jpg");
        fs::write(&source, "jpeg").unwrap();

        reserve_target(&target).unwrap();
        copy_and_delete(&source, &target).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "jpeg");
        assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 1);
    }

    #[test]
    fn test_move_missing_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = move_file(
            &temp_dir.path().join("gone.jpg"),
            &temp_dir.path().join("x/gone.jpg"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_reserved_target_blocks_second_writer() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("IMG_0001.JPG");

        reserve_target(&target).unwrap();
        assert!(reserve_target(&target).is_err());

        let source = temp_dir.path().join("other.JPG");
        fs::write(&source, "late").unwrap();
        assert!(move_file(&source, &target).is_err());
        assert!(source.exists());
    }

    #[test]
    fn test_failed_move_removes_placeholder() {
        let temp_dir = TempDir::new().unwrap();
        // 資料夾無法 rename 成檔案，也無法複製
        let source = temp_dir.path().join("album");
        fs::create_dir(&source).unwrap();
        let target = temp_dir.path().join("out/album");

        assert!(move_file(&source, &target).is_err());
        assert!(source.is_dir());
        assert!(!target.exists());
    }

    #[test]
    fn test_missing_source_leaves_no_placeholder() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("out/gone.jpg");

        assert!(move_file(&temp_dir.path().join("gone.jpg"), &target).is_err());
        assert!(!target.exists());
    }
}
