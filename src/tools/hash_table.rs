use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 本次執行已放置檔案的 hash 紀錄：Key 是檔案大小，Value 是該大小下 hash 與其所在路徑
///
/// 只存在記憶體中，不跨執行保存。
#[derive(Debug, Clone, Default)]
pub struct HashTable {
    entries: HashMap<u64, HashMap<String, PathBuf>>,
}

impl HashTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// 取得相同內容檔案的放置位置
    #[must_use]
    pub fn find(&self, size: u64, hash: &str) -> Option<&Path> {
        self.entries
            .get(&size)
            .and_then(|hashes| hashes.get(hash))
            .map(PathBuf::as_path)
    }

    /// 登記一個 hash，已存在時保留最早的路徑，回傳是否為新加入
    pub fn insert(&mut self, size: u64, hash: String, path: PathBuf) -> bool {
        let hashes = self.entries.entry(size).or_default();
        if hashes.contains_key(&hash) {
            return false;
        }
        hashes.insert(hash, path);
        true
    }
}
