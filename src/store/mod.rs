//! オブジェクトストア

mod fs;

pub use fs::DirObjectStore;

use crate::error::Result;
use std::collections::BTreeMap;

/// 一覧の1件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    /// RFC 3339
    pub last_modified: String,
}

impl ObjectSummary {
    /// キー末尾のファイル名
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// オブジェクトのメタデータ
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectHead {
    pub content_type: String,
    pub size: u64,
    pub metadata: BTreeMap<String, String>,
}

pub trait ObjectStore {
    fn put(
        &self,
        key: &str,
        bytes: &[u8],
        metadata: &BTreeMap<String, String>,
        content_type: &str,
    ) -> Result<()>;

    fn exists(&self, key: &str) -> Result<bool>;

    /// 接頭辞に一致するオブジェクト（キー順）
    fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>>;

    /// 存在しなければ None
    fn head(&self, key: &str) -> Result<Option<ObjectHead>>;

    /// 起動時の疎通確認
    fn check(&self) -> Result<()>;
}
