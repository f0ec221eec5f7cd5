use super::action_log::{Action, ActionLog, ActionRecord, is_log_file_name};
use super::destination::{Resolution, destination_for, lens_folder, resolve_destination};
use crate::tools::{
    FileInfo, HashTable, MetadataReader, PhotoMetadata, ScanResult, calculate_file_hash,
    ensure_directory_exists, move_file, scan_photo_files, validate_directory_exists,
};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local, NaiveDate};
use indicatif::ProgressBar;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// 整理模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizeMode {
    /// 從來源移動到另一個目的地資料夾
    Move,
    /// 在來源資料夾內就地整理
    Reorganize,
}

impl OrganizeMode {
    /// 成功放置（未改名）時記錄的動作
    #[must_use]
    pub const fn placed_action(&self) -> Action {
        match self {
            Self::Move => Action::Moved,
            Self::Reorganize => Action::Reorganized,
        }
    }
}

/// 一次整理作業的來源與目的地
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizeRequest {
    pub source: PathBuf,
    /// 目的地根目錄；就地整理時與來源相同
    pub base_folder: PathBuf,
    pub mode: OrganizeMode,
}

impl OrganizeRequest {
    pub fn move_to(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            base_folder: destination.into(),
            mode: OrganizeMode::Move,
        }
    }

    pub fn reorganize(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        Self {
            base_folder: source.clone(),
            source,
            mode: OrganizeMode::Reorganize,
        }
    }

    /// 檢查來源、建立目的地並收集待處理檔案（排除本程式自己的檔案）
    pub fn prepare(&self, reserved: &ReservedFiles) -> Result<ScanResult> {
        validate_directory_exists(&self.source)?;
        if self.mode == OrganizeMode::Move {
            ensure_directory_exists(&self.base_folder)?;
        }

        let mut scan = scan_photo_files(&self.source)?;
        let before = scan.files.len();
        scan.files.retain(|file| {
            let skip = reserved.contains(&file.path);
            if skip {
                debug!("略過本程式的檔案: {}", file.path.display());
            }
            !skip
        });
        scan.reserved_skipped = before - scan.files.len();
        Ok(scan)
    }
}

/// 本程式自己寫入的檔案：設定檔，以及紀錄資料夾內的 CSV 紀錄
#[derive(Debug, Clone, Default)]
pub struct ReservedFiles {
    settings_file: Option<PathBuf>,
    log_directory: Option<PathBuf>,
}

impl ReservedFiles {
    /// 路徑不存在時對應的項目不會排除任何檔案
    pub fn new(settings_file: &Path, log_directory: &Path) -> Self {
        Self {
            settings_file: fs::canonicalize(settings_file).ok(),
            log_directory: fs::canonicalize(log_directory).ok(),
        }
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(OsStr::to_str) else {
            return false;
        };

        if is_log_file_name(name) {
            let parent = path.parent().and_then(|p| fs::canonicalize(p).ok());
            if parent.is_some() && parent == self.log_directory {
                return true;
            }
        }

        match &self.settings_file {
            Some(settings) if settings.file_name() == Some(OsStr::new(name)) => {
                fs::canonicalize(path).is_ok_and(|p| &p == settings)
            }
            _ => false,
        }
    }
}

/// 整理統計
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrganizeResult {
    pub action_counts: HashMap<Action, usize>,
    /// 因中斷而未處理的檔案數
    pub not_processed: usize,
}

impl OrganizeResult {
    pub fn record(&mut self, action: Action) {
        *self.action_counts.entry(action).or_insert(0) += 1;
    }

    #[must_use]
    pub fn count(&self, action: Action) -> usize {
        self.action_counts.get(&action).copied().unwrap_or(0)
    }

    /// 已處理的檔案總數
    #[must_use]
    pub fn total_processed(&self) -> usize {
        self.action_counts.values().sum()
    }

    #[must_use]
    pub const fn interrupted(&self) -> bool {
        self.not_processed > 0
    }
}

/// 逐一處理檔案：讀取中繼資料、計算 hash、決定目的地、移動並回報結果
pub struct Organizer<'a> {
    reader: &'a dyn MetadataReader,
    base_folder: PathBuf,
    mode: OrganizeMode,
    placed: HashTable,
}

impl<'a> Organizer<'a> {
    pub fn new(reader: &'a dyn MetadataReader, request: &OrganizeRequest) -> Self {
        Self {
            reader,
            base_folder: request.base_folder.clone(),
            mode: request.mode,
            placed: HashTable::new(),
        }
    }

    /// 依序處理所有檔案，每個檔案寫入一列紀錄；收到中斷訊號時在檔案之間停止
    pub fn organize<W: Write>(
        &mut self,
        files: &[FileInfo],
        log: &mut ActionLog<W>,
        shutdown_signal: &AtomicBool,
        progress_bar: &ProgressBar,
    ) -> Result<OrganizeResult> {
        let mut result = OrganizeResult::default();

        for (index, file) in files.iter().enumerate() {
            if shutdown_signal.load(Ordering::SeqCst) {
                warn!("收到中斷訊號，停止處理");
                result.not_processed = files.len() - index;
                break;
            }

            progress_bar.set_message(
                file.path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .into_owned(),
            );

            let record = self.process_file(file);
            log.write(&record)?;
            result.record(record.action);
            progress_bar.inc(1);
        }

        info!(
            "整理完成 - 處理: {}, 重複: {}, 失敗: {}, 未處理: {}",
            result.total_processed(),
            result.count(Action::SkippedDuplicate),
            result.count(Action::Failed),
            result.not_processed
        );

        Ok(result)
    }

    /// 處理單一檔案，任何錯誤都轉為 `Failed` 紀錄
    pub fn process_file(&mut self, file: &FileInfo) -> ActionRecord {
        let mut record = ActionRecord::new(&file.path);

        match self.place_file(file, &mut record) {
            Ok(()) => debug!(
                "{}: {} -> {}",
                record.action,
                file.path.display(),
                record
                    .destination_path
                    .as_deref()
                    .unwrap_or_else(|| Path::new(""))
                    .display()
            ),
            Err(e) => {
                warn!("處理檔案失敗 {}: {e:#}", file.path.display());
                record.fail(&e);
            }
        }

        record
    }

    fn place_file(&mut self, file: &FileInfo, record: &mut ActionRecord) -> Result<()> {
        let source = &file.path;
        let size = fs::metadata(source)
            .with_context(|| format!("來源檔案已不存在: {}", source.display()))?
            .len();

        let metadata = self.reader.read_metadata(source).unwrap_or_else(|e| {
            warn!("無法讀取中繼資料，改用檔案時間 {}: {e:#}", source.display());
            PhotoMetadata::default()
        });

        let capture_date = match metadata.capture_date {
            Some(date) => date,
            None => modified_date(source)?,
        };
        let lens = lens_folder(metadata.lens_model.as_deref());
        record.capture_date = Some(capture_date);
        record.lens = Some(lens.clone());

        let hash = calculate_file_hash(source)?;
        record.hash = Some(hash.clone());

        if let Some(existing) = self.placed.find(size, &hash) {
            record.action = Action::SkippedDuplicate;
            record.detail = format!("duplicate of {}", existing.display());
            return Ok(());
        }

        let file_name = source
            .file_name()
            .ok_or_else(|| anyhow!("無法取得檔案名稱: {}", source.display()))?;
        let destination = destination_for(&self.base_folder, capture_date, &lens, file_name);

        let (action, target) = match resolve_destination(&destination, source, size, &hash) {
            Resolution::Duplicate(existing) => {
                record.action = Action::SkippedDuplicate;
                record.detail = format!("duplicate of {}", existing.display());
                return Ok(());
            }
            Resolution::InPlace => {
                record.action = Action::Unchanged;
                record.destination_path = Some(source.clone());
                self.placed.insert(size, hash, source.clone());
                return Ok(());
            }
            Resolution::Free(target) => (self.mode.placed_action(), target),
            Resolution::Renamed(target) => {
                record.detail = format!(
                    "name taken: {}",
                    destination.file_name().unwrap_or_default().to_string_lossy()
                );
                (Action::Renamed, target)
            }
        };

        move_file(source, &target).with_context(|| {
            format!("無法移動 {} -> {}", source.display(), target.display())
        })?;

        record.action = action;
        record.destination_path = Some(target.clone());
        self.placed.insert(size, hash, target);
        Ok(())
    }
}

/// 以檔案修改時間（本地時區）作為拍攝日期的備援
pub fn modified_date(path: &Path) -> Result<NaiveDate> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("無法取得檔案修改時間: {}", path.display()))?;
    Ok(DateTime::<Local>::from(modified).date_naive())
}
