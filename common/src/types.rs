//! 共有型定義
//!
//! CLIとストア/カタログ実装で共有される型:
//! - MatchScore / Classification: カテゴリ判定の結果
//! - LocationTag: 画像ごとの所在地タグ
//! - ProcessingRecord: 処理済み画像1件の記録（カタログ・ストア・台帳に保存）

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 空の説明文に対するマーカーキー
pub const EMPTY_DESCRIPTION_MARKER: &str = "empty_description";

/// どのカテゴリにも一致しなかった場合のマーカーキー
pub const NO_MATCHES_MARKER: &str = "no_matches";

/// カテゴリ1件分のスコア
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScore {
    pub category: String,
    pub score: u32,
    /// 加点の根拠（一致フレーズ・ボーナス）
    pub evidence: Vec<String>,
}

/// フォールバックカテゴリを使った理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    EmptyDescription,
    NoMatches,
}

impl FallbackReason {
    /// スコアマップに載せるマーカー (キー, 値)
    pub fn marker(&self) -> (&'static str, u32) {
        match self {
            FallbackReason::EmptyDescription => (EMPTY_DESCRIPTION_MARKER, 1),
            FallbackReason::NoMatches => (NO_MATCHES_MARKER, 0),
        }
    }
}

/// カテゴリ判定結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    /// スコア > 0 のカテゴリ（ルールテーブル順）
    pub scores: Vec<MatchScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackReason>,
}

impl Classification {
    /// 監査用のスコアマップ（カテゴリ → スコア）
    ///
    /// フォールバック時はマーカーキーのみを含む。
    pub fn score_map(&self) -> BTreeMap<String, u32> {
        let mut map: BTreeMap<String, u32> = self
            .scores
            .iter()
            .map(|s| (s.category.clone(), s.score))
            .collect();
        if let Some(reason) = self.fallback {
            let (key, value) = reason.marker();
            map.insert(key.to_string(), value);
        }
        map
    }

    /// 勝者カテゴリのスコア（フォールバック時は0）
    pub fn winning_score(&self) -> u32 {
        self.scores
            .iter()
            .find(|s| s.category == self.category)
            .map(|s| s.score)
            .unwrap_or(0)
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// 所在地タグ
///
/// 各フィールドは独立して省略可能。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationTag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl LocationTag {
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.postal_code.is_none()
    }

    /// "street, city, state, postal" 形式の結合文字列（存在する項目のみ）
    pub fn combined(&self) -> String {
        [&self.street, &self.city, &self.state, &self.postal_code]
            .iter()
            .filter_map(|f| f.as_deref())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// 処理済み画像の記録
///
/// 作成後は変更しない。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingRecord {
    /// カタログ採番ID（挿入後のみ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// 保存キー（ストア使用時はオブジェクトキー、それ以外はファイル名）
    pub key: String,

    /// リネーム後のファイル名
    pub file_name: String,

    /// リネーム後のローカルパス
    #[serde(default)]
    pub file_path: String,

    #[serde(default)]
    pub description: String,

    pub category: String,

    #[serde(default)]
    pub location: LocationTag,

    /// ストアの所在地フォルダ名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_folder: Option<String>,

    /// 処理日時（RFC 3339）
    pub timestamp: String,

    #[serde(default)]
    pub match_scores: BTreeMap<String, u32>,

    #[serde(default)]
    pub evidence: Vec<MatchScore>,

    pub original_filename: String,

    /// 画像内容のSHA-256（hex）
    #[serde(default)]
    pub content_hash: String,

    /// 撮影日時（EXIF DateTimeOriginal）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,
}
