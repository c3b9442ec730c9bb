//! 画像メタデータタグの読み書き

mod exiftool;

pub use exiftool::{parse_exiftool_json, ExifTool, READ_FIELDS};

use crate::error::Result;
use async_trait::async_trait;
use photo_ingest_common::LocationTag;
use std::collections::BTreeMap;
use std::path::Path;

#[async_trait]
pub trait TagReader: Send + Sync {
    /// 所在地関連タグ（タグ名 → 値）
    async fn read_tags(&self, path: &Path) -> Result<BTreeMap<String, String>>;

    async fn read_location(&self, path: &Path) -> Result<LocationTag> {
        Ok(LocationTag::from_tag_fields(&self.read_tags(path).await?))
    }
}

#[async_trait]
pub trait TagWriter: Send + Sync {
    /// 所在地タグを書き込む
    async fn write_location(&self, path: &Path, tag: &LocationTag) -> Result<()>;
}
