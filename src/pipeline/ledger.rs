//! 処理台帳
//!
//! 1回の実行で成功した記録を取り込み元フォルダにJSON配列で書き出す。
//! 監査用で、正はカタログ/ストア側。

use crate::error::Result;
use photo_ingest_common::ProcessingRecord;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// 台帳の種類（公開先ごとにファイルを分ける）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerKind {
    Catalog,
    Store,
}

impl LedgerKind {
    pub fn file_name(self) -> &'static str {
        match self {
            LedgerKind::Catalog => "processed_images.json",
            LedgerKind::Store => "store_processed_images.json",
        }
    }
}

pub struct Ledger;

impl Ledger {
    pub fn path(folder: &Path, kind: LedgerKind) -> PathBuf {
        folder.join(kind.file_name())
    }

    /// 記録を書き出す（既存ファイルは上書き）
    pub fn save(folder: &Path, kind: LedgerKind, records: &[ProcessingRecord]) -> Result<PathBuf> {
        let path = Self::path(folder, kind);
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, records)?;
        Ok(path)
    }

    /// 読み込み（なければ空）
    pub fn load(folder: &Path, kind: LedgerKind) -> Result<Vec<ProcessingRecord>> {
        let path = Self::path(folder, kind);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_ledger_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Ledger::load(dir.path(), LedgerKind::Catalog).unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![ProcessingRecord {
            key: "images/tolleson_az/unis/unis_tolleson_az.jpg".into(),
            file_name: "unis_tolleson_az.jpg".into(),
            category: "unis".into(),
            timestamp: "2025-01-18T10:00:00+00:00".into(),
            original_filename: "IMG_0001.jpg".into(),
            ..Default::default()
        }];

        let path = Ledger::save(dir.path(), LedgerKind::Store, &records).unwrap();
        assert!(path.ends_with("store_processed_images.json"));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.trim_start().starts_with('['));

        let loaded = Ledger::load(dir.path(), LedgerKind::Store).unwrap();
        assert_eq!(loaded, records);
        assert!(Ledger::load(dir.path(), LedgerKind::Catalog).unwrap().is_empty());
    }

    #[test]
    fn test_corrupted_ledger_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(Ledger::path(dir.path(), LedgerKind::Catalog), "{ invalid json }").unwrap();
        assert!(Ledger::load(dir.path(), LedgerKind::Catalog).is_err());
    }
}
