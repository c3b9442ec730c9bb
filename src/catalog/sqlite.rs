//! SQLite カタログ
//!
//! テーブル `images` に1画像1行で保存する。スコアと根拠はJSON文字列で持つ。

use super::{Catalog, RecordFilter};
use crate::error::Result;
use photo_ingest_common::{LocationTag, ProcessingRecord};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS images (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    key               TEXT NOT NULL,
    file_name         TEXT NOT NULL,
    file_path         TEXT NOT NULL DEFAULT '',
    description       TEXT NOT NULL DEFAULT '',
    category          TEXT NOT NULL,
    street            TEXT,
    city              TEXT,
    state             TEXT,
    postal_code       TEXT,
    location_folder   TEXT,
    timestamp         TEXT NOT NULL,
    match_scores      TEXT NOT NULL DEFAULT '{}',
    evidence          TEXT NOT NULL DEFAULT '[]',
    original_filename TEXT NOT NULL,
    content_hash      TEXT NOT NULL DEFAULT '',
    captured_at       TEXT
);
CREATE INDEX IF NOT EXISTS idx_images_file_name ON images(file_name);
CREATE INDEX IF NOT EXISTS idx_images_category ON images(category);
";

const SELECT_COLUMNS: &str = "id, key, file_name, file_path, description, category, street, city, \
     state, postal_code, location_folder, timestamp, match_scores, evidence, original_filename, \
     content_hash, captured_at";

pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    /// ファイルを開く（なければ作成）
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Self::init(conn)
    }

    /// メモリ上のカタログ
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// 登録件数
    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))?;
        Ok(count)
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ProcessingRecord> {
        let match_scores: String = row.get(12)?;
        let evidence: String = row.get(13)?;

        Ok(ProcessingRecord {
            id: Some(row.get(0)?),
            key: row.get(1)?,
            file_name: row.get(2)?,
            file_path: row.get(3)?,
            description: row.get(4)?,
            category: row.get(5)?,
            location: LocationTag {
                street: row.get(6)?,
                city: row.get(7)?,
                state: row.get(8)?,
                postal_code: row.get(9)?,
            },
            location_folder: row.get(10)?,
            timestamp: row.get(11)?,
            // 壊れたJSONは空として読む
            match_scores: serde_json::from_str(&match_scores).unwrap_or_default(),
            evidence: serde_json::from_str(&evidence).unwrap_or_default(),
            original_filename: row.get(14)?,
            content_hash: row.get(15)?,
            captured_at: row.get(16)?,
        })
    }
}

impl Catalog for SqliteCatalog {
    fn insert(&self, record: &ProcessingRecord) -> Result<i64> {
        let match_scores = serde_json::to_string(&record.match_scores)?;
        let evidence = serde_json::to_string(&record.evidence)?;

        let id = self
            .conn
            .prepare_cached(
                "INSERT INTO images (key, file_name, file_path, description, category, street, city,
                    state, postal_code, location_folder, timestamp, match_scores, evidence,
                    original_filename, content_hash, captured_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            )?
            .insert(params![
                record.key,
                record.file_name,
                record.file_path,
                record.description,
                record.category,
                record.location.street,
                record.location.city,
                record.location.state,
                record.location.postal_code,
                record.location_folder,
                record.timestamp,
                match_scores,
                evidence,
                record.original_filename,
                record.content_hash,
                record.captured_at,
            ])?;

        log::debug!("カタログ登録: id={} {}", id, record.file_name);
        Ok(id)
    }

    fn select(&self, filter: &RecordFilter) -> Result<Vec<ProcessingRecord>> {
        let mut sql = format!("SELECT {} FROM images", SELECT_COLUMNS);
        let mut conditions = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();

        if let Some(category) = &filter.category {
            values.push(SqlValue::Text(category.clone()));
            conditions.push(format!("category = ?{}", values.len()));
        }
        if let Some(file_name) = &filter.file_name {
            values.push(SqlValue::Text(file_name.clone()));
            conditions.push(format!("file_name = ?{}", values.len()));
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY id");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(values), Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}
