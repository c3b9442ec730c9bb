//! 正規ファイル名・オブジェクトキーの生成
//!
//! 形式: `category[_street][_city][_state][_postal][_counter].ext`
//!
//! 部品の順序は固定。既処理判定（generation.rs）はこの順序を前提にしている。

use crate::error::{Error, Result};
use crate::types::LocationTag;
use std::fmt;

/// 衝突回避で試す連番の上限
pub const MAX_NAME_ATTEMPTS: u32 = 1000;

/// 所在地が空のときのフォルダ名
pub const UNKNOWN_LOCATION_FOLDER: &str = "unknown_location";

/// ストアのキー接頭辞
pub const KEY_ROOT: &str = "images";

/// 英数字のみ残して小文字化（通り名・郵便番号用）
pub fn sanitize_compact(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// 英数字と空白を残し、空白を `_` に置換（市・州用）
pub fn sanitize_words(value: &str) -> String {
    let kept: String = value
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("_")
}

/// 所在地タグを名前部品に変換（空の項目は除く）
pub fn location_parts(tag: &LocationTag) -> Vec<String> {
    [
        tag.street.as_deref().map(sanitize_compact),
        tag.city.as_deref().map(sanitize_words),
        tag.state.as_deref().map(sanitize_words),
        tag.postal_code.as_deref().map(sanitize_compact),
    ]
    .into_iter()
    .flatten()
    .filter(|p| !p.is_empty())
    .collect()
}

/// 正規ファイル名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalName {
    pub category: String,
    pub location_parts: Vec<String>,
    /// ドット付きの拡張子（例: ".jpg"）。なければ空
    pub extension: String,
    pub counter: Option<u32>,
}

impl CanonicalName {
    pub fn new(category: &str, tag: &LocationTag, extension: &str) -> Self {
        Self {
            category: category.to_string(),
            location_parts: location_parts(tag),
            extension: normalize_extension(extension),
            counter: None,
        }
    }

    /// 連番を除いた基底名
    pub fn base(&self) -> String {
        std::iter::once(self.category.as_str())
            .chain(self.location_parts.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("_")
    }

    pub fn with_counter(&self, counter: Option<u32>) -> Self {
        Self {
            counter,
            ..self.clone()
        }
    }

    pub fn render(&self) -> String {
        match self.counter {
            Some(n) => format!("{}_{}{}", self.base(), n, self.extension),
            None => format!("{}{}", self.base(), self.extension),
        }
    }
}

impl fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(".{}", trimmed.to_lowercase())
    }
}

/// 未使用の名前を探す
///
/// 連番なし、`_1`、`_2`… の順に `is_taken` で確認する。
/// 呼び出し側は返された名前をすぐに既知集合へ登録すること。
pub fn resolve_unique<F>(name: &CanonicalName, mut is_taken: F) -> Result<CanonicalName>
where
    F: FnMut(&str) -> bool,
{
    let first = name.with_counter(None);
    if !is_taken(&first.render()) {
        return Ok(first);
    }

    for counter in 1..=MAX_NAME_ATTEMPTS {
        let candidate = name.with_counter(Some(counter));
        if !is_taken(&candidate.render()) {
            return Ok(candidate);
        }
    }

    Err(Error::NamingExhausted {
        base: name.base(),
        attempts: MAX_NAME_ATTEMPTS,
    })
}

/// ストア上の所在地フォルダ名（`street_city_state`）
pub fn location_folder(tag: &LocationTag) -> String {
    let parts: Vec<String> = [
        tag.street.as_deref().map(sanitize_compact),
        tag.city.as_deref().map(sanitize_words),
        tag.state.as_deref().map(sanitize_words),
    ]
    .into_iter()
    .flatten()
    .filter(|p| !p.is_empty())
    .collect();

    if parts.is_empty() {
        UNKNOWN_LOCATION_FOLDER.to_string()
    } else {
        parts.join("_")
    }
}

/// `images/{folder}/{category}/`
pub fn key_prefix(folder: &str, category: &str) -> String {
    format!("{}/{}/{}/", KEY_ROOT, folder, category)
}

/// `images/{folder}/{category}/{file}`
pub fn object_key(folder: &str, category: &str, file_name: &str) -> String {
    format!("{}{}", key_prefix(folder, category), file_name)
}
