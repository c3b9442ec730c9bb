//! 取り込みパイプライン
//!
//! フォルダ内の画像を1枚ずつ順に処理する:
//! キャプション → 分類 → 所在地タグ → 命名 → 公開（ストア/カタログ）→ リネーム
//!
//! 1枚の失敗はバッチを止めない。結果は件数と記録で返す。

pub mod ledger;

pub use ledger::{Ledger, LedgerKind};

use crate::captioner::{describe_with_retry, Captioner, RetryPolicy};
use crate::catalog::{Catalog, RecordFilter};
use crate::error::{IngestError, Result};
use crate::logging::log_file_error;
use crate::scanner::{self, ImageInfo};
use crate::store::ObjectStore;
use crate::tags::TagReader;
use indicatif::{ProgressBar, ProgressStyle};
use photo_ingest_common::naming::key_prefix;
use photo_ingest_common::{
    categorize, content_type_for, is_already_processed, location_folder, object_key, object_metadata,
    resolve_unique, CanonicalName, LocationTag, ProcessingRecord, RuleTable,
};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub retry: RetryPolicy,
    /// 進捗バーを表示
    pub show_progress: bool,
}

/// 件数集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub stats: RunStats,
    pub records: Vec<ProcessingRecord>,
    /// 台帳を書いた場合のパス
    pub ledger_path: Option<PathBuf>,
}

/// スキップ理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Raw,
    AlreadyProcessed,
}

enum Outcome {
    Processed(Box<ProcessingRecord>),
    Skipped(SkipReason),
}

pub struct Orchestrator<'a> {
    captioner: &'a dyn Captioner,
    tags: &'a dyn TagReader,
    rules: &'a RuleTable,
    catalog: Option<&'a dyn Catalog>,
    store: Option<&'a dyn ObjectStore>,
    options: RunOptions,
}

impl<'a> Orchestrator<'a> {
    pub fn new(captioner: &'a dyn Captioner, tags: &'a dyn TagReader, rules: &'a RuleTable) -> Self {
        Self {
            captioner,
            tags,
            rules,
            catalog: None,
            store: None,
            options: RunOptions::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: &'a dyn Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_store(mut self, store: &'a dyn ObjectStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    fn ledger_kind(&self) -> LedgerKind {
        if self.store.is_some() {
            LedgerKind::Store
        } else {
            LedgerKind::Catalog
        }
    }

    /// フォルダを処理
    pub async fn run(&self, root: &Path) -> Result<RunSummary> {
        if self.catalog.is_none() && self.store.is_none() {
            return Err(IngestError::Config("公開先（カタログまたはストア）がありません".into()));
        }

        let images = scanner::scan_folder(root)?;
        log::info!("{}枚の画像を検出: {}", images.len(), root.display());

        let mut known = self.seed_known_names()?;
        let mut summary = RunSummary::default();

        let progress = self.progress_bar(images.len());

        for image in &images {
            summary.stats.total += 1;
            progress.set_message(image.file_name.clone());

            match self.process_file(image, &mut known).await {
                Ok(Outcome::Processed(record)) => {
                    summary.stats.succeeded += 1;
                    log::info!("✔ {} → {} [{}]", record.original_filename, record.file_name, record.category);
                    summary.records.push(*record);
                }
                Ok(Outcome::Skipped(reason)) => {
                    summary.stats.skipped += 1;
                    log::info!("スキップ ({:?}): {}", reason, image.file_name);
                }
                Err(e) => {
                    summary.stats.failed += 1;
                    log_file_error(&image.path, "ingest", &e);
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        if !summary.records.is_empty() {
            match Ledger::save(root, self.ledger_kind(), &summary.records) {
                Ok(path) => summary.ledger_path = Some(path),
                Err(e) => log::error!("台帳の保存に失敗: {}", e),
            }
        }

        Ok(summary)
    }

    /// カタログ登録済みのファイル名
    fn seed_known_names(&self) -> Result<HashSet<String>> {
        let Some(catalog) = self.catalog else {
            return Ok(HashSet::new());
        };
        let names: HashSet<String> = catalog
            .select(&RecordFilter::all())?
            .into_iter()
            .map(|r| r.file_name)
            .collect();
        log::debug!("カタログ既存ファイル名: {}件", names.len());
        Ok(names)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({msg})")
        {
            progress.set_style(style.progress_chars("#>-"));
        }
        progress
    }

    async fn process_file(&self, image: &ImageInfo, known: &mut HashSet<String>) -> Result<Outcome> {
        if image.is_raw {
            return Ok(Outcome::Skipped(SkipReason::Raw));
        }
        if is_already_processed(&image.file_name, self.rules) {
            return Ok(Outcome::Skipped(SkipReason::AlreadyProcessed));
        }

        let bytes = tokio::fs::read(&image.path).await?;

        let description = describe_with_retry(self.captioner, &bytes, self.options.retry).await?;
        let classification = categorize(&description, self.rules);
        log::debug!(
            "分類: {} → {} {:?}",
            image.file_name,
            classification.category,
            classification.score_map()
        );

        let location = self.read_location(image).await;
        let folder = self.store.map(|_| location_folder(&location));

        let name = CanonicalName::new(&classification.category, &location, &image.extension());
        let store_names = self.store_names(folder.as_deref(), &classification.category)?;
        let directory = image.path.parent().unwrap_or_else(|| Path::new("."));
        let resolved = resolve_unique(&name, |candidate| {
            known.contains(candidate)
                || store_names.contains(candidate)
                || (candidate != image.file_name && directory.join(candidate).exists())
        })?;
        let file_name = resolved.render();
        let new_path = directory.join(&file_name);

        let key = match &folder {
            Some(folder) => object_key(folder, &classification.category, &file_name),
            None => file_name.clone(),
        };

        let mut record = ProcessingRecord {
            id: None,
            key,
            file_name: file_name.clone(),
            file_path: new_path.display().to_string(),
            description,
            category: classification.category.clone(),
            location,
            location_folder: folder,
            timestamp: chrono::Local::now().to_rfc3339(),
            match_scores: classification.score_map(),
            evidence: classification.scores,
            original_filename: image.file_name.clone(),
            content_hash: hex::encode(Sha256::digest(&bytes)),
            captured_at: scanner::exif::extract_date(&image.path).ok(),
        };

        self.publish(&mut record, &bytes)?;

        if file_name != image.file_name {
            if let Err(e) = std::fs::rename(&image.path, &new_path) {
                log::warn!("リネーム失敗 {} → {}: {}", image.path.display(), file_name, e);
            }
        }
        known.insert(file_name);

        Ok(Outcome::Processed(Box::new(record)))
    }

    /// タグ → （ストア使用時のみ）フォルダ名の順に所在地を決める
    async fn read_location(&self, image: &ImageInfo) -> LocationTag {
        let tag = match self.tags.read_location(&image.path).await {
            Ok(tag) => tag,
            Err(e) => {
                log::warn!("タグを読めません {}: {}", image.file_name, e);
                LocationTag::default()
            }
        };

        if tag.is_empty() && self.store.is_some() {
            if let Some(folder) = image.parent_folder_name() {
                let guessed = LocationTag::from_folder_name(&folder);
                if !guessed.is_empty() {
                    log::info!("フォルダ名から所在地を推定: {} → {}", folder, guessed.combined());
                }
                return guessed;
            }
        }
        tag
    }

    /// ストア上の同じ接頭辞にあるファイル名
    fn store_names(&self, folder: Option<&str>, category: &str) -> Result<HashSet<String>> {
        let (Some(store), Some(folder)) = (self.store, folder) else {
            return Ok(HashSet::new());
        };
        let names = store
            .list(&key_prefix(folder, category))?
            .iter()
            .map(|o| o.file_name().to_string())
            .collect();
        Ok(names)
    }

    fn publish(&self, record: &mut ProcessingRecord, bytes: &[u8]) -> Result<()> {
        if let Some(store) = self.store {
            store
                .put(
                    &record.key,
                    bytes,
                    &object_metadata(record),
                    content_type_for(&record.file_name),
                )
                .map_err(|e| IngestError::Persistence(format!("ストア保存失敗 {}: {}", record.key, e)))?;
        }

        if let Some(catalog) = self.catalog {
            let id = catalog
                .insert(record)
                .map_err(|e| IngestError::Persistence(format!("カタログ登録失敗 {}: {}", record.file_name, e)))?;
            record.id = Some(id);
        }

        Ok(())
    }
}
