//! キーワード抽出
//!
//! キャプショナの生出力（カンマ区切りキーワード列、または文章）を
//! 正規化済みトークン集合に変換する。

use std::collections::BTreeSet;

/// この文字数以下の単語はトークンにしない
const MIN_WORD_CHARS: usize = 2;

/// 説明文からトークン集合を抽出
///
/// - 全体を小文字化
/// - カンマを含む場合: 各セグメント（trim後、空でないもの）をそのまま追加し、
///   さらにセグメント内の3文字以上の単語も追加
/// - カンマを含まない場合: 空白区切りの3文字以上の単語のみ
///
/// # Examples
/// ```
/// use photo_ingest_common::extract_keywords;
///
/// let tokens = extract_keywords("Warehouse Interior, boxes");
/// assert!(tokens.contains("warehouse interior"));
/// assert!(tokens.contains("warehouse"));
/// assert!(tokens.contains("boxes"));
/// ```
pub fn extract_keywords(raw: &str) -> BTreeSet<String> {
    let lowered = raw.to_lowercase();
    let mut tokens = BTreeSet::new();

    if lowered.contains(',') {
        for segment in lowered.split(',') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            tokens.insert(segment.to_string());
            tokens.extend(long_words(segment));
        }
    } else {
        tokens.extend(long_words(&lowered));
    }

    tokens
}

fn long_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .filter(|w| w.chars().count() > MIN_WORD_CHARS)
        .map(str::to_string)
}

/// キャプショナ出力を整形
///
/// カンマで分割してtrim、空要素を除いて先頭 `limit` 件を `", "` で再結合する。
pub fn normalize_caption(raw: &str, limit: usize) -> String {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .take(limit)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("   ").is_empty());
    }

    #[test]
    fn test_comma_segments_and_words() {
        let tokens = extract_keywords("Parking Lot, clear sky, a car");
        let expected: BTreeSet<String> = [
            "parking lot", "parking", "lot", "clear sky", "clear", "sky", "a car", "car",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_short_segment_kept_as_phrase() {
        // カンマ区切りのフレーズは長さに関係なく残る
        let tokens = extract_keywords("tv, wc");
        assert!(tokens.contains("tv"));
        assert!(tokens.contains("wc"));
    }

    #[test]
    fn test_no_comma_splits_words_only() {
        let tokens = extract_keywords("A forklift in the aisle");
        let expected: BTreeSet<String> = ["forklift", "the", "aisle"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_empty_segments_skipped() {
        let tokens = extract_keywords("boxes,, ,pallets,");
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_word_length_counts_chars() {
        // "café" は4文字（5バイト）
        let tokens = extract_keywords("café öl");
        assert!(tokens.contains("café"));
        assert!(!tokens.contains("öl"));
    }

    #[test]
    fn test_normalize_caption_limits_keywords() {
        let raw = (1..=40).map(|i| format!(" kw{} ", i)).collect::<Vec<_>>().join(",");
        let normalized = normalize_caption(&raw, 35);
        assert_eq!(normalized.split(", ").count(), 35);
        assert!(normalized.starts_with("kw1, kw2"));
        assert!(normalized.ends_with("kw35"));
    }

    #[test]
    fn test_normalize_caption_without_commas() {
        assert_eq!(normalize_caption("  a warehouse  ", 35), "a warehouse");
        assert_eq!(normalize_caption("", 35), "");
    }
}
