//! 実行設定
//!
//! すべて環境変数から読む（カレントディレクトリの `.env` も読み込む）。
//! 必須値は使う時点で取り出し、なければ `IngestError::Config` を返す。

use crate::error::{IngestError, Result};
use photo_ingest_common::RuleTable;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CAPTIONER_URL: &str = "http://localhost:11434";
pub const DEFAULT_CAPTIONER_MODEL: &str = "llava";
pub const DEFAULT_CAPTION_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_CAPTION_RETRIES: u32 = 3;
pub const DEFAULT_EXIFTOOL_PATH: &str = "exiftool";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// 取り込み元フォルダ
    pub network_path: Option<PathBuf>,
    /// SQLiteカタログのファイルパス
    pub catalog_path: Option<PathBuf>,
    /// オブジェクトストアのルートディレクトリ
    pub store_root: Option<PathBuf>,
    pub store_bucket: Option<String>,
    pub captioner_url: String,
    pub captioner_model: String,
    pub caption_timeout: Duration,
    pub caption_retries: u32,
    pub exiftool_path: String,
    /// カテゴリルールの上書きJSON
    pub rules_path: Option<PathBuf>,
}

impl Config {
    /// 環境変数から読み込み
    pub fn from_env() -> Result<Self> {
        // .env がなくてもよい
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から読み込み
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let caption_timeout_secs = match get("CAPTION_TIMEOUT_SECS") {
            Some(v) => parse_number::<u64>("CAPTION_TIMEOUT_SECS", &v)?,
            None => DEFAULT_CAPTION_TIMEOUT_SECS,
        };
        let caption_retries = match get("CAPTION_RETRIES") {
            Some(v) => parse_number::<u32>("CAPTION_RETRIES", &v)?,
            None => DEFAULT_CAPTION_RETRIES,
        };
        if caption_retries == 0 {
            return Err(IngestError::Config("CAPTION_RETRIES は1以上を指定してください".into()));
        }

        Ok(Self {
            network_path: get("NETWORK_PATH").map(PathBuf::from),
            catalog_path: get("CATALOG_PATH").map(PathBuf::from),
            store_root: get("STORE_ROOT").map(PathBuf::from),
            store_bucket: get("STORE_BUCKET"),
            captioner_url: get("CAPTIONER_URL")
                .unwrap_or_else(|| DEFAULT_CAPTIONER_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            captioner_model: get("CAPTIONER_MODEL").unwrap_or_else(|| DEFAULT_CAPTIONER_MODEL.to_string()),
            caption_timeout: Duration::from_secs(caption_timeout_secs),
            caption_retries,
            exiftool_path: get("EXIFTOOL_PATH").unwrap_or_else(|| DEFAULT_EXIFTOOL_PATH.to_string()),
            rules_path: get("RULES_PATH").map(PathBuf::from),
        })
    }

    pub fn require_network_path(&self) -> Result<&PathBuf> {
        self.network_path
            .as_ref()
            .ok_or_else(|| missing("NETWORK_PATH"))
    }

    pub fn require_catalog_path(&self) -> Result<&PathBuf> {
        self.catalog_path
            .as_ref()
            .ok_or_else(|| missing("CATALOG_PATH"))
    }

    /// (ルート, バケット名)
    pub fn require_store(&self) -> Result<(&PathBuf, &str)> {
        let root = self.store_root.as_ref().ok_or_else(|| missing("STORE_ROOT"))?;
        let bucket = self.store_bucket.as_deref().ok_or_else(|| missing("STORE_BUCKET"))?;
        Ok((root, bucket))
    }

    /// ルールテーブル（RULES_PATH があればそれを、なければ組み込み）
    pub fn load_rules(&self) -> Result<RuleTable> {
        match &self.rules_path {
            Some(path) => RuleTable::from_file(path).map_err(|e| {
                IngestError::Config(format!("ルールファイルを読めません ({}): {}", path.display(), e))
            }),
            None => Ok(RuleTable::builtin()),
        }
    }
}

fn missing(key: &str) -> IngestError {
    IngestError::Config(format!("環境変数 {} が設定されていません", key))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| IngestError::Config(format!("{} の値が不正です: {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_with(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load_with(&[]).unwrap();
        assert_eq!(config.captioner_url, "http://localhost:11434");
        assert_eq!(config.captioner_model, "llava");
        assert_eq!(config.caption_timeout, Duration::from_secs(300));
        assert_eq!(config.caption_retries, 3);
        assert_eq!(config.exiftool_path, "exiftool");
        assert!(config.network_path.is_none());
    }

    #[test]
    fn test_missing_required_values() {
        let config = load_with(&[("NETWORK_PATH", "  ")]).unwrap();
        assert!(matches!(config.require_network_path(), Err(IngestError::Config(_))));
        assert!(matches!(config.require_catalog_path(), Err(IngestError::Config(_))));
        assert!(matches!(config.require_store(), Err(IngestError::Config(_))));
    }

    #[test]
    fn test_store_requires_root_and_bucket() {
        let config = load_with(&[("STORE_ROOT", "/srv/objects")]).unwrap();
        let err = config.require_store().unwrap_err();
        assert!(err.to_string().contains("STORE_BUCKET"));

        let config = load_with(&[("STORE_ROOT", "/srv/objects"), ("STORE_BUCKET", "photos")]).unwrap();
        let (root, bucket) = config.require_store().unwrap();
        assert_eq!(root, &PathBuf::from("/srv/objects"));
        assert_eq!(bucket, "photos");
    }

    #[test]
    fn test_overrides() {
        let config = load_with(&[
            ("CAPTIONER_URL", "http://gpu-box:11434/"),
            ("CAPTION_TIMEOUT_SECS", "60"),
            ("CAPTION_RETRIES", "5"),
        ])
        .unwrap();
        assert_eq!(config.captioner_url, "http://gpu-box:11434");
        assert_eq!(config.caption_timeout, Duration::from_secs(60));
        assert_eq!(config.caption_retries, 5);
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(matches!(load_with(&[("CAPTION_TIMEOUT_SECS", "soon")]), Err(IngestError::Config(_))));
        assert!(matches!(load_with(&[("CAPTION_RETRIES", "0")]), Err(IngestError::Config(_))));
    }

    #[test]
    fn test_load_rules_builtin_and_missing_file() {
        let config = load_with(&[]).unwrap();
        assert_eq!(config.load_rules().unwrap().categories().len(), 17);

        let config = load_with(&[("RULES_PATH", "/nonexistent/rules.json")]).unwrap();
        assert!(matches!(config.load_rules(), Err(IngestError::Config(_))));
    }
}
