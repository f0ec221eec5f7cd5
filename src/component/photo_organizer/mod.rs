//! 照片依日期與鏡頭整理元件
//!
//! 以 exiftool 讀取拍攝日期與鏡頭，依內容 hash 去重，移動到 `日期/鏡頭` 資料夾並寫入 CSV 紀錄

mod action_log;
mod destination;
mod main;
mod organizer;

pub use action_log::{Action, ActionLog, ActionRecord, LOG_HEADER, is_log_file_name, log_file_name};
pub use destination::{
    Resolution, UNKNOWN_LENS, UNKNOWN_NAME, date_folder, destination_for, lens_folder,
    numbered_candidate, resolve_destination, safe_folder_name,
};
pub use main::{PhotoOrganizer, RunOptions, RunReport};
pub use organizer::{
    OrganizeMode, OrganizeRequest, OrganizeResult, Organizer, ReservedFiles, modified_date,
};
