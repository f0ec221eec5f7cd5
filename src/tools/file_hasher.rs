use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

const BUFFER_SIZE: usize = 1024 * 1024; // RAW 檔通常 20~80MB，1MB 緩衝足夠

/// 以 BLAKE3 計算檔案內容 hash（64 個小寫十六進位字元）
pub fn calculate_file_hash(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("無法開啟檔案: {}", path.display()))?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .with_context(|| format!("讀取檔案失敗: {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// 判斷既有檔案是否與來源內容相同
///
/// 先比對大小，大小相同才計算 hash。`source_hash` 為來源檔已算好的 hash。
pub fn has_same_content(existing: &Path, source_size: u64, source_hash: &str) -> Result<bool> {
    let metadata = fs::metadata(existing)
        .with_context(|| format!("無法讀取檔案資訊: {}", existing.display()))?;
    if metadata.len() != source_size {
        return Ok(false);
    }
    Ok(calculate_file_hash(existing)? == source_hash)
}
