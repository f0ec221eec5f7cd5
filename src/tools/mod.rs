mod exiftool_info;
mod file_hasher;
mod file_mover;
mod file_scanner;
mod hash_table;
mod path_validator;

pub use exiftool_info::{
    ExifTool, MetadataReader, PhotoMetadata, parse_exif_date, parse_exiftool_output,
};
pub use file_hasher::{calculate_file_hash, has_same_content};
pub use file_mover::move_file;
pub use file_scanner::{FileInfo, ScanResult, scan_photo_files};
pub use hash_table::HashTable;
pub use path_validator::{ensure_directory_exists, validate_directory_exists};
