//! 処理済み画像のカタログ

mod sqlite;

pub use sqlite::SqliteCatalog;

use crate::error::Result;
use photo_ingest_common::ProcessingRecord;

/// 検索条件（None は条件なし）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub category: Option<String>,
    pub file_name: Option<String>,
    pub limit: Option<usize>,
}

impl RecordFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn category(category: &str) -> Self {
        Self {
            category: Some(category.to_string()),
            ..Self::default()
        }
    }

    pub fn file_name(file_name: &str) -> Self {
        Self {
            file_name: Some(file_name.to_string()),
            ..Self::default()
        }
    }
}

pub trait Catalog {
    /// 記録を追加して採番IDを返す
    fn insert(&self, record: &ProcessingRecord) -> Result<i64>;

    /// 条件に一致する記録（ID順）
    fn select(&self, filter: &RecordFilter) -> Result<Vec<ProcessingRecord>>;
}
