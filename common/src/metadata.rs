//! オブジェクトストア用メタデータ
//!
//! 値はASCIIのみ。説明文は定型の書き出しと番号付きリストの記号を除いてから
//! 150文字に切り詰める。

use crate::types::{LocationTag, ProcessingRecord};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

/// 説明文の最大文字数（超えた場合は "..." を付ける）
pub const DESCRIPTION_BUDGET: usize = 150;

/// 先頭から取り除く定型句（上から順に1回ずつ判定）
const LEAD_INS: &[&str] = &[
    "The image depicts ",
    "The image shows ",
    "Keywords: ",
    "The image ",
    "This image ",
];

lazy_static! {
    static ref LIST_MARKER: Regex = Regex::new(r"\d+\.\s*").unwrap();
}

/// メタデータ用に説明文を整形
pub fn clean_description(description: &str) -> String {
    let collapsed = description.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut cleaned = LIST_MARKER.replace_all(&collapsed, "").into_owned();

    for lead_in in LEAD_INS {
        if let Some(rest) = cleaned.strip_prefix(lead_in) {
            cleaned = rest.to_string();
        }
    }

    let ascii = ascii_safe(&cleaned);
    if ascii.chars().count() > DESCRIPTION_BUDGET {
        let truncated: String = ascii.chars().take(DESCRIPTION_BUDGET).collect();
        format!("{}...", truncated)
    } else {
        ascii
    }
}

/// 非ASCII文字と制御文字を除く
pub fn ascii_safe(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// ストアに付けるメタデータ
pub fn object_metadata(record: &ProcessingRecord) -> BTreeMap<String, String> {
    let LocationTag {
        street,
        city,
        state,
        postal_code,
    } = &record.location;
    let text = |value: &Option<String>| ascii_safe(value.as_deref().unwrap_or(""));

    let mut metadata = BTreeMap::new();
    metadata.insert("description".to_string(), clean_description(&record.description));
    metadata.insert("category".to_string(), ascii_safe(&record.category));
    metadata.insert("xmp-city".to_string(), text(city));
    metadata.insert("xmp-state".to_string(), text(state));
    metadata.insert("xmp-postal-code".to_string(), text(postal_code));
    metadata.insert("xmp-street".to_string(), text(street));
    metadata.insert("processing-timestamp".to_string(), ascii_safe(&record.timestamp));
    metadata.insert("original-filename".to_string(), ascii_safe(&record.original_filename));
    if !record.content_hash.is_empty() {
        metadata.insert("content-sha256".to_string(), record.content_hash.clone());
    }
    metadata
}

/// 拡張子からContent-Type
pub fn content_type_for(file_name: &str) -> &'static str {
    let lowered = file_name.to_lowercase();
    if lowered.ends_with(".png") {
        "image/png"
    } else {
        "image/jpeg"
    }
}
