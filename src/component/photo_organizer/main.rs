//! 照片整理元件
//!
//! 互動式流程：選擇路徑、確認後執行，並顯示結果摘要

use super::action_log::{Action, ActionLog};
use super::organizer::{OrganizeMode, OrganizeRequest, OrganizeResult, Organizer, ReservedFiles};
use crate::config::{SETTINGS_FILE, UserSettings};
use crate::config::save::{add_recent_path, save_settings};
use crate::tools::{ExifTool, MetadataReader, ScanResult, ensure_directory_exists};
use anyhow::Result;
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rust_i18n::t;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 單次執行的選項（由設定檔與命令列參數合併而來）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub exiftool_path: PathBuf,
    pub log_directory: PathBuf,
    /// 設定檔位置，整理時不會被移動
    pub settings_file: PathBuf,
    /// 略過執行前確認
    pub assume_yes: bool,
}

impl RunOptions {
    #[must_use]
    pub fn from_settings(settings: &UserSettings) -> Self {
        Self {
            exiftool_path: settings.exiftool_path.clone(),
            log_directory: settings.log_directory.clone(),
            settings_file: PathBuf::from(SETTINGS_FILE),
            assume_yes: false,
        }
    }
}

/// 執行結果
#[derive(Debug, Clone)]
pub struct RunReport {
    pub result: OrganizeResult,
    pub log_path: Option<PathBuf>,
    pub log_rows: usize,
}

/// 照片依日期與鏡頭整理元件
pub struct PhotoOrganizer {
    options: RunOptions,
    shutdown_signal: Arc<AtomicBool>,
}

impl PhotoOrganizer {
    pub const fn new(options: RunOptions, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            options,
            shutdown_signal,
        }
    }

    /// 互動模式：詢問路徑後執行
    pub fn run_interactive(&self, mode: OrganizeMode, settings: &mut UserSettings) -> Result<()> {
        let title = match mode {
            OrganizeMode::Move => t!("organizer.title_move"),
            OrganizeMode::Reorganize => t!("organizer.title_reorganize"),
        };
        println!("{}", style(title).cyan().bold());

        let Some(source) = self.prompt_source(&settings.recent_paths)? else {
            return Ok(()); // ESC pressed
        };

        let request = match mode {
            OrganizeMode::Move => {
                let destination = self.prompt_destination()?;
                OrganizeRequest::move_to(&source, destination)
            }
            OrganizeMode::Reorganize => OrganizeRequest::reorganize(&source),
        };

        // 更新路徑歷史並儲存
        add_recent_path(settings, &source);
        if let Err(e) = save_settings(settings) {
            warn!("無法儲存路徑歷史: {e}");
        }

        self.execute(&request)?;
        Ok(())
    }

    /// 確認 exiftool 可用後執行整理
    pub fn execute(&self, request: &OrganizeRequest) -> Result<Option<RunReport>> {
        let exiftool = ExifTool::new(&self.options.exiftool_path);
        let version = exiftool.check_available()?;
        info!(
            "使用 exiftool {version} ({})",
            exiftool.program().display()
        );

        self.execute_with(request, &exiftool)
    }

    /// 以指定的中繼資料讀取器執行整理；取消或沒有檔案時回傳 `None`
    pub fn execute_with(
        &self,
        request: &OrganizeRequest,
        reader: &dyn MetadataReader,
    ) -> Result<Option<RunReport>> {
        println!("{}", style(t!("organizer.scanning")).dim());
        let reserved =
            ReservedFiles::new(&self.options.settings_file, &self.options.log_directory);
        let scan = request.prepare(&reserved)?;

        if scan.files.is_empty() {
            println!("{}", style(t!("organizer.no_files")).yellow());
            return Ok(None);
        }

        self.print_scan_summary(request, &scan);

        if !self.options.assume_yes && !self.confirm_start()? {
            println!("{}", style(t!("common.cancelled")).yellow());
            return Ok(None);
        }

        if self.shutdown_signal.load(Ordering::SeqCst) {
            warn!("收到中斷訊號，停止處理");
            return Ok(None);
        }

        ensure_directory_exists(&self.options.log_directory)?;
        let mut log = ActionLog::create_in(&self.options.log_directory)?;
        info!("紀錄檔: {}", log.path().unwrap_or_else(|| Path::new("")).display());

        let progress_bar = ProgressBar::new(scan.files.len() as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );

        let mut organizer = Organizer::new(reader, request);
        let result =
            organizer.organize(&scan.files, &mut log, &self.shutdown_signal, &progress_bar)?;

        if result.interrupted() {
            progress_bar.abandon_with_message(t!("organizer.interrupted").to_string());
        } else {
            progress_bar.finish_with_message(t!("common.done").to_string());
        }

        let log_path = log.path().map(Path::to_path_buf);
        let log_rows = log.rows();
        log.finish()?;

        let report = RunReport {
            result,
            log_path,
            log_rows,
        };
        self.print_result(&report);

        Ok(Some(report))
    }

    fn prompt_source(&self, recent_paths: &[String]) -> Result<Option<String>> {
        if recent_paths.is_empty() {
            return Ok(Some(Self::input_path(&t!("organizer.prompt_source"))?));
        }

        let mut options: Vec<String> = recent_paths
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let indicator = if Path::new(p).is_dir() { "✓" } else { "✗" };
                format!("{} [{}] {}", i + 1, indicator, p)
            })
            .collect();
        options.push(t!("organizer.new_path").to_string());

        println!("{}", style(t!("common.esc_hint")).dim());

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("organizer.select_source"))
            .items(&options)
            .default(0)
            .interact_opt()?;

        match selection {
            None => Ok(None),
            Some(idx) if idx < recent_paths.len() => Ok(Some(recent_paths[idx].clone())),
            Some(_) => Ok(Some(Self::input_path(&t!("organizer.prompt_source"))?)),
        }
    }

    fn prompt_destination(&self) -> Result<String> {
        Self::input_path(&t!("organizer.prompt_destination"))
    }

    fn input_path(prompt: &str) -> Result<String> {
        let path: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .interact_text()?;
        Ok(path.trim().to_string())
    }

    fn confirm_start(&self) -> Result<bool> {
        let confirm = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("organizer.confirm"))
            .default(true)
            .interact()?;
        Ok(confirm)
    }

    fn print_scan_summary(&self, request: &OrganizeRequest, scan: &ScanResult) {
        let total_size: u64 = scan.files.iter().map(|f| f.size).sum();
        let size_mb = total_size as f64 / 1024.0 / 1024.0;

        println!();
        println!(
            "{}",
            style(t!(
                "organizer.found_files",
                count = scan.files.len(),
                size = format!("{size_mb:.2}")
            ))
            .green()
        );
        if scan.hidden_skipped > 0 {
            println!(
                "  {} {}",
                style("→").dim(),
                t!("organizer.hidden_skipped", count = scan.hidden_skipped)
            );
        }
        if scan.reserved_skipped > 0 {
            println!(
                "  {} {}",
                style("→").dim(),
                t!("organizer.reserved_skipped", count = scan.reserved_skipped)
            );
        }
        println!(
            "  {} {}",
            style("→").dim(),
            t!(
                "organizer.target",
                path = request.base_folder.display().to_string()
            )
        );
        println!();
    }

    fn print_result(&self, report: &RunReport) {
        let result = &report.result;
        let placed = result.count(Action::Moved) + result.count(Action::Reorganized);

        println!();
        println!("{}", style(t!("organizer.result_title")).cyan().bold());
        println!(
            "  {}: {}",
            t!("organizer.result_placed"),
            style(placed).green()
        );

        let optional = [
            (Action::Renamed, t!("organizer.result_renamed")),
            (Action::Unchanged, t!("organizer.result_unchanged")),
            (
                Action::SkippedDuplicate,
                t!("organizer.result_duplicates"),
            ),
        ];
        for (action, label) in optional {
            let count = result.count(action);
            if count > 0 {
                println!("  {}: {}", label, style(count).yellow());
            }
        }

        let failed = result.count(Action::Failed);
        if failed > 0 {
            println!("  {}: {}", t!("organizer.result_failed"), style(failed).red());
        }
        if result.interrupted() {
            println!(
                "  {}: {}",
                t!("organizer.result_not_processed"),
                style(result.not_processed).red()
            );
        }

        if let Some(path) = &report.log_path {
            println!();
            println!(
                "{}",
                style(t!(
                    "organizer.log_saved",
                    path = path.display().to_string()
                ))
                .dim()
            );
        }

        info!(
            "照片整理完成 - 放置: {}, 改名: {}, 重複: {}, 失敗: {}, 紀錄列數: {}",
            placed,
            result.count(Action::Renamed),
            result.count(Action::SkippedDuplicate),
            failed,
            report.log_rows
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserSettings;

    #[test]
    fn test_run_options_from_settings() {
        let settings = UserSettings {
            exiftool_path: PathBuf::from("/usr/local/bin/exiftool"),
            log_directory: PathBuf::from("/var/log/photos"),
            ..UserSettings::default()
        };

        let options = RunOptions::from_settings(&settings);
        assert_eq!(options.exiftool_path, settings.exiftool_path);
        assert_eq!(options.log_directory, settings.log_directory);
        assert_eq!(options.settings_file, PathBuf::from(SETTINGS_FILE));
        assert!(!options.assume_yes);
    }

    #[test]
    fn test_execute_requires_exiftool() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let options = RunOptions {
            exiftool_path: PathBuf::from("/nonexistent/exiftool"),
            log_directory: temp_dir.path().to_path_buf(),
            settings_file: temp_dir.path().join("settings.json"),
            assume_yes: true,
        };
        let organizer = PhotoOrganizer::new(options, Arc::new(AtomicBool::new(false)));

        let request = OrganizeRequest::reorganize(temp_dir.path());
        assert!(organizer.execute(&request).is_err());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }
}
