//! ディレクトリ上のバケット
//!
//! `{root}/{bucket}/{key}` に本体、`{root}/{bucket}/.meta/{key}.json` にメタデータを置く。

use super::{ObjectHead, ObjectStore, ObjectSummary};
use crate::error::{IngestError, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const META_DIR: &str = ".meta";

pub struct DirObjectStore {
    bucket_dir: PathBuf,
    bucket: String,
}

impl DirObjectStore {
    pub fn new(root: &Path, bucket: &str) -> Self {
        Self {
            bucket_dir: root.join(bucket),
            bucket: bucket.to_string(),
        }
    }

    /// バケットを作成して開く
    pub fn create(root: &Path, bucket: &str) -> Result<Self> {
        let store = Self::new(root, bucket);
        fs::create_dir_all(&store.bucket_dir)?;
        Ok(store)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.bucket_dir.join(key))
    }

    fn meta_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.bucket_dir.join(META_DIR).join(format!("{}.json", key)))
    }
}

/// 空、絶対パス、`..` を含むキーは拒否
fn validate_key(key: &str) -> Result<()> {
    let path = Path::new(key);
    let valid = !key.is_empty()
        && !key.ends_with('/')
        && !key.starts_with(META_DIR)
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if valid {
        Ok(())
    } else {
        Err(IngestError::Persistence(format!("不正なキー: {}", key)))
    }
}

fn write_creating_parents(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

impl ObjectStore for DirObjectStore {
    fn put(
        &self,
        key: &str,
        bytes: &[u8],
        metadata: &BTreeMap<String, String>,
        content_type: &str,
    ) -> Result<()> {
        let object_path = self.object_path(key)?;
        let meta_path = self.meta_path(key)?;

        if let Some((name, _)) = metadata.iter().find(|(k, v)| !k.is_ascii() || !v.is_ascii()) {
            return Err(IngestError::Persistence(format!("メタデータにASCII以外の文字: {}", name)));
        }

        write_creating_parents(&object_path, bytes)?;

        let head = ObjectHead {
            content_type: content_type.to_string(),
            size: bytes.len() as u64,
            metadata: metadata.clone(),
        };
        if let Some(parent) = meta_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(&meta_path)?);
        serde_json::to_writer_pretty(writer, &head)?;

        log::debug!("ストア保存: {}/{} ({} bytes)", self.bucket, key, bytes.len());
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.object_path(key)?.is_file())
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        if !self.bucket_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut objects = Vec::new();
        for entry in WalkDir::new(&self.bucket_dir)
            .into_iter()
            .filter_entry(|e| e.depth() != 1 || e.file_name() != META_DIR)
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.bucket_dir) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if !key.starts_with(prefix) {
                continue;
            }

            let meta = entry.metadata().map_err(|e| IngestError::Persistence(e.to_string()))?;
            let last_modified = meta
                .modified()
                .map(|t| DateTime::<Utc>::from(t).to_rfc3339())
                .unwrap_or_default();
            objects.push(ObjectSummary {
                key,
                size: meta.len(),
                last_modified,
            });
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    fn head(&self, key: &str) -> Result<Option<ObjectHead>> {
        if !self.exists(key)? {
            return Ok(None);
        }
        let meta_path = self.meta_path(key)?;
        if !meta_path.is_file() {
            // メタデータなしで置かれたオブジェクト
            let size = fs::metadata(self.object_path(key)?)?.len();
            return Ok(Some(ObjectHead {
                size,
                ..Default::default()
            }));
        }
        let reader = BufReader::new(File::open(meta_path)?);
        Ok(Some(serde_json::from_reader(reader)?))
    }

    fn check(&self) -> Result<()> {
        if self.bucket_dir.is_dir() {
            Ok(())
        } else {
            Err(IngestError::DependencyUnavailable(format!(
                "バケット '{}' にアクセスできません: {}",
                self.bucket,
                self.bucket_dir.display()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("category".to_string(), "unis".to_string()),
            ("xmp-city".to_string(), "Tolleson".to_string()),
        ])
    }

    #[test]
    fn test_put_head_exists() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirObjectStore::create(dir.path(), "photos").unwrap();
        let key = "images/tolleson_az/unis/unis_tolleson_az.jpg";

        assert!(!store.exists(key).unwrap());
        assert_eq!(store.head(key).unwrap(), None);

        store.put(key, b"jpeg bytes", &metadata(), "image/jpeg").unwrap();
        assert!(store.exists(key).unwrap());

        let head = store.head(key).unwrap().unwrap();
        assert_eq!(head.content_type, "image/jpeg");
        assert_eq!(head.size, 10);
        assert_eq!(head.metadata["xmp-city"], "Tolleson");
    }

    #[test]
    fn test_list_by_prefix_skips_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirObjectStore::create(dir.path(), "photos").unwrap();
        store.put("images/a/unis/x.jpg", b"1", &metadata(), "image/jpeg").unwrap();
        store.put("images/a/unis/y.jpg", b"22", &metadata(), "image/jpeg").unwrap();
        store.put("images/b/bathroom/z.png", b"333", &metadata(), "image/png").unwrap();

        let listed = store.list("images/a/unis/").unwrap();
        let keys: Vec<&str> = listed.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["images/a/unis/x.jpg", "images/a/unis/y.jpg"]);
        assert_eq!(listed[1].size, 2);
        assert_eq!(listed[1].file_name(), "y.jpg");
        assert!(!listed[0].last_modified.is_empty());

        assert_eq!(store.list("").unwrap().len(), 3);
    }

    #[test]
    fn test_rejects_bad_keys_and_non_ascii_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirObjectStore::create(dir.path(), "photos").unwrap();
        for key in ["", "../escape.jpg", "/abs.jpg", "images/", ".meta/x.jpg"] {
            assert!(
                matches!(store.put(key, b"x", &metadata(), "image/jpeg"), Err(IngestError::Persistence(_))),
                "{}",
                key
            );
        }

        let bad = BTreeMap::from([("description".to_string(), "café".to_string())]);
        assert!(matches!(
            store.put("images/a.jpg", b"x", &bad, "image/jpeg"),
            Err(IngestError::Persistence(_))
        ));
    }

    #[test]
    fn test_check_missing_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirObjectStore::new(dir.path(), "missing");
        assert!(matches!(store.check(), Err(IngestError::DependencyUnavailable(_))));
        assert!(store.list("").unwrap().is_empty());

        let store = DirObjectStore::create(dir.path(), "present").unwrap();
        assert!(store.check().is_ok());
        assert_eq!(store.bucket(), "present");
    }
}
