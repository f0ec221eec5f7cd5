use crate::component::photo_organizer::{OrganizeRequest, RunOptions};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Move files from SOURCE into DESTINATION/<date>/<lens>/
    Move {
        source: PathBuf,
        destination: PathBuf,
    },
    /// Reorganize SOURCE in place into SOURCE/<date>/<lens>/
    Reorganize { source: PathBuf },
}

/// 不帶子命令時進入互動選單
#[derive(Parser, Debug)]
#[command(version, about = "Organize photos and RAW files into date/lens folders", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// exiftool executable (overrides settings.json)
    #[arg(long, global = true)]
    pub exiftool: Option<PathBuf>,

    /// Directory for the CSV action log (overrides settings.json)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Skip the confirmation prompt
    #[arg(short, long, global = true, default_value_t = false)]
    pub yes: bool,
}

impl Cli {
    /// 以命令列參數覆寫設定值
    #[must_use]
    pub fn apply_to(&self, mut options: RunOptions) -> RunOptions {
        if let Some(exiftool) = &self.exiftool {
            options.exiftool_path = exiftool.clone();
        }
        if let Some(log_dir) = &self.log_dir {
            options.log_directory = log_dir.clone();
        }
        options.assume_yes |= self.yes;
        options
    }

    #[must_use]
    pub fn request(&self) -> Option<OrganizeRequest> {
        match &self.command {
            Some(Command::Move {
                source,
                destination,
            }) => Some(OrganizeRequest::move_to(source, destination)),
            Some(Command::Reorganize { source }) => Some(OrganizeRequest::reorganize(source)),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::photo_organizer::OrganizeMode;

    fn base_options() -> RunOptions {
        RunOptions {
            exiftool_path: PathBuf::from("exiftool"),
            log_directory: PathBuf::from("."),
            settings_file: PathBuf::from("settings.json"),
            assume_yes: false,
        }
    }

    #[test]
    fn test_parse_move() {
        let cli = Cli::try_parse_from(["photo_organize", "move", "/card", "/photos"]).unwrap();
        let request = cli.request().unwrap();
        assert_eq!(request.mode, OrganizeMode::Move);
        assert_eq!(request.source, PathBuf::from("/card"));
        assert_eq!(request.base_folder, PathBuf::from("/photos"));
    }

    #[test]
    fn test_parse_reorganize_uses_source_as_base() {
        let cli = Cli::try_parse_from(["photo_organize", "reorganize", "/photos"]).unwrap();
        let request = cli.request().unwrap();
        assert_eq!(request.mode, OrganizeMode::Reorganize);
        assert_eq!(request.base_folder, request.source);
    }

    #[test]
    fn test_no_subcommand_is_interactive() {
        let cli = Cli::try_parse_from(["photo_organize"]).unwrap();
        assert!(cli.request().is_none());
    }

    #[test]
    fn test_move_requires_destination() {
        assert!(Cli::try_parse_from(["photo_organize", "move", "/card"]).is_err());
    }

    #[test]
    fn test_global_options_override_settings() {
        let cli = Cli::try_parse_from([
            "photo_organize",
            "reorganize",
            "/photos",
            "--exiftool",
            "/opt/exiftool/exiftool",
            "--log-dir",
            "/tmp/logs",
            "-y",
        ])
        .unwrap();

        let options = cli.apply_to(base_options());
        assert_eq!(options.exiftool_path, PathBuf::from("/opt/exiftool/exiftool"));
        assert_eq!(options.log_directory, PathBuf::from("/tmp/logs"));
        assert!(options.assume_yes);
    }

    #[test]
    fn test_missing_options_keep_settings() {
        let cli = Cli::try_parse_from(["photo_organize"]).unwrap();
        assert_eq!(cli.apply_to(base_options()), base_options());
    }
}
