//! カテゴリルールテーブル
//!
//! カテゴリ名 → キーワードフレーズ列の静的設定と、
//! カテゴリ単位のボーナス語彙を管理する。
//!
//! テーブルの並び順がそのまま同点時の優先順位になる。
//! 組み込みテーブルは狭いカテゴリ（parking_lot, breakroom など）を先に、
//! 汎用カテゴリ（interior_office, *_warehouse）を後ろに置いている。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// カテゴリ1件のルール
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(name: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// キーワードを小文字・trim化し、重複を除く（先勝ち）
    fn normalize(&mut self) {
        let mut seen = HashSet::new();
        self.keywords = self
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .filter(|k| seen.insert(k.clone()))
            .collect();
    }
}

/// カテゴリ単位のボーナス
///
/// `triggers` のうちトークン集合に完全一致したもの1語ごとに `points` 加点。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusRule {
    pub category: String,
    /// 根拠表示用ラベル（例: "toy_miniature_bonus"）
    pub label: String,
    pub triggers: Vec<String>,
    pub points: u32,
}

impl BonusRule {
    pub fn new(category: &str, label: &str, triggers: &[&str], points: u32) -> Self {
        Self {
            category: category.to_string(),
            label: label.to_string(),
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
            points,
        }
    }
}

/// 2カテゴリ間の共有キーワード
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordOverlap {
    pub first: String,
    pub second: String,
    pub shared: Vec<String>,
}

impl std::fmt::Display for KeywordOverlap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Categories '{}' and '{}' share keywords: {}",
            self.first,
            self.second,
            self.shared.join(", ")
        )
    }
}

/// ルールテーブル全体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleTable {
    categories: Vec<CategoryRule>,
    #[serde(default)]
    bonuses: Vec<BonusRule>,
    fallback_category: String,
}

impl RuleTable {
    /// ルールを正規化・検証して構築
    pub fn new(
        categories: Vec<CategoryRule>,
        bonuses: Vec<BonusRule>,
        fallback_category: impl Into<String>,
    ) -> Result<Self> {
        let mut table = Self {
            categories,
            bonuses,
            fallback_category: fallback_category.into(),
        };
        table.normalize();
        table.validate()?;
        Ok(table)
    }

    /// JSON文字列から読み込み
    pub fn from_json(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json)?;
        Self::new(table.categories, table.bonuses, table.fallback_category)
    }

    /// JSONファイルから読み込み
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn categories(&self) -> &[CategoryRule] {
        &self.categories
    }

    pub fn bonuses(&self) -> &[BonusRule] {
        &self.bonuses
    }

    /// 指定カテゴリのボーナスルール
    pub fn bonuses_for<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a BonusRule> + 'a {
        self.bonuses.iter().filter(move |b| b.category == category)
    }

    pub fn fallback_category(&self) -> &str {
        &self.fallback_category
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// カテゴリ名として有効か（フォールバックを含む）
    pub fn is_known_category(&self, name: &str) -> bool {
        name == self.fallback_category || self.categories.iter().any(|c| c.name == name)
    }

    fn normalize(&mut self) {
        for category in &mut self.categories {
            category.name = category.name.trim().to_string();
            category.normalize();
        }
        for bonus in &mut self.bonuses {
            bonus.triggers = bonus
                .triggers
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
        }
    }

    /// 構造の検証
    ///
    /// - カテゴリが1件以上
    /// - カテゴリ名の重複なし、空名なし
    /// - ボーナスの対象カテゴリが存在する
    /// - フォールバックカテゴリ名が空でない
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(Error::Config("rule table has no categories".into()));
        }

        let mut names = HashSet::new();
        for category in &self.categories {
            if category.name.is_empty() {
                return Err(Error::Config("category with empty name".into()));
            }
            if !names.insert(category.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate category '{}'",
                    category.name
                )));
            }
        }

        for bonus in &self.bonuses {
            if !names.contains(bonus.category.as_str()) {
                return Err(Error::Config(format!(
                    "bonus '{}' targets unknown category '{}'",
                    bonus.label, bonus.category
                )));
            }
        }

        if self.fallback_category.trim().is_empty() {
            return Err(Error::Config("fallback category is empty".into()));
        }

        Ok(())
    }

    /// 全カテゴリ間のキーワード重複を列挙（各ペア1回、テーブル順）
    pub fn overlaps(&self) -> Vec<KeywordOverlap> {
        let mut overlaps = Vec::new();
        for (i, first) in self.categories.iter().enumerate() {
            let first_set: HashSet<&str> = first.keywords.iter().map(String::as_str).collect();
            for second in &self.categories[i + 1..] {
                let shared: Vec<String> = second
                    .keywords
                    .iter()
                    .filter(|k| first_set.contains(k.as_str()))
                    .cloned()
                    .collect();
                if !shared.is_empty() {
                    overlaps.push(KeywordOverlap {
                        first: first.name.clone(),
                        second: second.name.clone(),
                        shared,
                    });
                }
            }
        }
        overlaps
    }

    /// 組み込みルールテーブル
    pub fn builtin() -> Self {
        let categories = BUILTIN_CATEGORIES
            .iter()
            .map(|(name, keywords)| CategoryRule::new(*name, keywords))
            .collect();
        let bonuses = vec![
            BonusRule::new("unis", "unis_priority_bonus", &["unis"], 5),
            BonusRule::new(
                "marketing",
                "toy_miniature_bonus",
                &[
                    "toy",
                    "miniature",
                    "model",
                    "scale model",
                    "toy model",
                    "miniature model",
                    "toy car",
                    "toy truck",
                    "toy forklift",
                    "remote control",
                    "lego",
                ],
                4,
            ),
            BonusRule::new(
                "breakroom",
                "fridge_bonus",
                &["refrigerator", "fridge", "freezer", "cooler", "refrigerated"],
                3,
            ),
        ];

        let mut table = Self {
            categories,
            bonuses,
            fallback_category: DEFAULT_FALLBACK_CATEGORY.to_string(),
        };
        table.normalize();
        table
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// どのカテゴリにも当てはまらない場合のカテゴリ
pub const DEFAULT_FALLBACK_CATEGORY: &str = "interior_warehouse";

const BUILTIN_CATEGORIES: &[(&str, &[&str])] = &[
    ("parking_lot", &[
        "parking lot", "parking", "parking area", "parking space", "cars", "vehicles",
        "parking lines", "outdoor parking", "parking facility", "car park", "parking garage",
        "vehicle parking", "parking spots", "parking structure", "pavement",
    ]),
    ("breakroom", &[
        "breakroom", "break room", "kitchen", "commercial kitchen", "office break room", "break",
        "refrigerator", "sink", "coffee area", "lunch room", "employee kitchen", "cafeteria",
        "dining area", "microwave", "coffee machine", "kitchen appliances", "eating area",
        "staff kitchen", "break area",
    ]),
    ("office_gym", &[
        "office gym", "gym", "workout room", "fitness facility", "gym equipment", "treadmill",
        "elliptical", "weight room", "strength training", "cardio equipment", "exercise machines",
        "fitness studio", "workout area", "gymnasium", "athletic facility",
    ]),
    ("bathroom", &[
        "bathroom", "restroom", "washroom", "toilet", "lavatory", "public restroom",
        "employee restroom", "facilities", "wc", "powder room", "men's room", "women's room",
        "unisex bathroom",
    ]),
    ("conference_room", &[
        "conference room", "meeting room", "boardroom", "video conference", "conference table",
        "office meeting", "presentation room", "projector", "screen", "tv", "whiteboard",
        "seating", "chairs", "desk", "long table", "glass walls", "interior office",
        "office meeting space", "corporate meeting", "roundtable", "monitor", "remote meeting",
        "speakerphone", "teleconference", "zoom meeting", "business meeting", "formal seating",
        "presentation screen", "conference setup", "office chairs", "team meeting",
    ]),
    ("unis", &[
        "unis", "logistics solutions", "supply chain optimization", "global logistics",
        "transportation", "shipping", "truck", "trailer", "container", "cargo",
        "transport logistics", "logistics company", "freight", "delivery", "logistics services",
    ]),
    ("item_com", &[
        "item.com", "e-commerce solutions", "supply chain automation", "digital commerce",
    ]),
    ("marketing", &[
        "advertising", "two women", "fashionable attire", "logo", "signage", "work", "blazer",
        "blonde", "blonde hair", "white jacket", "woman", "black pants", "attire", "dress",
        "streetwear", "high heels", "red dress", "sunglasses", "cube work", "sign", "sticker",
        "toy fork lift", "toy", "model", "toy forklift", "toy model", "remote control toy car",
        "lego truck", "miniature", "scale model", "polo shirt", "branded apparel",
        "promotional item", "branded", "shirt", "black polo shirt", "black shirt", "embroidered",
        "embroidered text", "logo on shirt", "polo", "cube work shirt", "t-shirt", "promotion",
        "branding", "social media", "marketing campaign", "seo", "content marketing",
        "email marketing",
    ]),
    ("e-commerce", &[
        "online shopping", "e-commerce", "retail", "dropshipping", "marketplace",
        "digital store", "checkout", "cart", "customer orders",
    ]),
    ("support", &[
        "customer service", "helpdesk", "technical support", "assistance", "troubleshooting",
        "service center",
    ]),
    ("resources", &[
        "training", "learning materials", "guides", "knowledge base", "industry insights",
        "best practices",
    ]),
    ("tracking_technology_platform", &[
        "tracking", "gps", "rfid", "iot sensors", "analytics", "real-time monitoring",
        "asset tracking",
    ]),
    ("warehousing", &["logistics hub", "inventory management"]),
    ("company", &[
        "corporate", "business", "startup", "enterprise", "organization", "firm", "management",
        "industry experts",
    ]),
    ("interior_office", &[
        "office interior", "cafe", "tables", "green wall", "white ceiling", "office space",
        "blinds", "room", "office", "workspace", "modern office", "basketball", "hoop",
        "stylish office", "elegant office", "sophisticated office", "chairs", "desk", "chair",
        "table", "office furniture", "office supplies", "office equipment", "cabinet",
        "recreation room", "game room", "pool table", "billiard table", "recreation area",
        "storage", "shelving", "blind shade", "floor lamp", "glass window", "windows", "lobby",
        "reception", "reception area", "waiting area", "dining table", "entrance", "brand",
        "interior", "carpet", "modern", "computer", "tv", "stylish", "elegant", "white walls",
        "sophisticated", "staircase", "wood", "wood flooring", "stairs", "furniture",
    ]),
    ("exterior_warehouse", &[
        "warehouse exterior", "trucks", "car", "parking", "tree", "building", "warehouse",
        "parking lot", "clear sky", "sidewalk", "space", "glass door", "entrance", "outdoor",
        "clear", "warehouse building", "solar panel", "sky", "roof", "exterior", "flat roof",
        "open space", "birds eye view", "outside", "commercial building", "eye", "open", "view",
        "large", "storage facility", "flat", "concrete surface", "loading dock", "shipping area",
        "receiving area", "concrete floors", "metal beams", "industrial exterior",
        "warehouse facade", "vehicles", "distribution center exterior",
        "logistics facility exterior", "truck loading", "delivery bay", "warehouse compound",
    ]),
    ("interior_warehouse", &[
        "warehouse interior", "empty space", "empty", "pallet racking", "yellow equipment",
        "industrial area", "metal", "sheets", "high ceiling", "metal sheets", "aisle",
        "concrete floor", "unit", "units", "shelving", "lights", "shelving units", "metal walls",
        "warehouse", "industrial interior", "pallet jack", "interior", "logistics",
        "distribution", "supply chain", "shelves", "storage unit", "warehouse shelves", "storage",
        "forklift", "forklifts", "cardboard boxes", "inventory", "pallets", "boxes", "stockroom",
        "fulfillment", "distribution center", "high-bay racking", "ceiling", "conveyor system",
        "bulk storage", "cross-docking", "material handling", "pallet racks", "staging area",
        "warehouse aisles", "storage shelves", "warehouse floor", "fork lift",
    ]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_valid() {
        let table = RuleTable::builtin();
        assert!(table.validate().is_ok());
        assert_eq!(table.categories().len(), 17);
        assert_eq!(table.fallback_category(), "interior_warehouse");
    }

    #[test]
    fn test_builtin_keywords_are_normalized() {
        let table = RuleTable::builtin();
        for category in table.categories() {
            for keyword in &category.keywords {
                assert_eq!(keyword, &keyword.trim().to_lowercase());
            }
        }
    }

    #[test]
    fn test_duplicate_keywords_dropped_first_wins() {
        let table = RuleTable::new(
            vec![CategoryRule::new("a", &["tree", "Building", "tree ", "building"])],
            vec![],
            "a",
        )
        .unwrap();
        assert_eq!(table.categories()[0].keywords, vec!["tree", "building"]);
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let result = RuleTable::new(
            vec![CategoryRule::new("a", &["x"]), CategoryRule::new("a", &["y"])],
            vec![],
            "a",
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_bonus_for_unknown_category_rejected() {
        let result = RuleTable::new(
            vec![CategoryRule::new("a", &["x"])],
            vec![BonusRule::new("b", "b_bonus", &["y"], 3)],
            "a",
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_overlaps_reported_once_per_pair() {
        let table = RuleTable::new(
            vec![
                CategoryRule::new("a", &["tree", "sky"]),
                CategoryRule::new("b", &["sky", "desk"]),
                CategoryRule::new("c", &["lamp"]),
            ],
            vec![],
            "a",
        )
        .unwrap();
        let overlaps = table.overlaps();
        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].first, "a");
        assert_eq!(overlaps[0].second, "b");
        assert_eq!(overlaps[0].shared, vec!["sky"]);
        assert!(overlaps[0].to_string().contains("share keywords: sky"));
    }

    #[test]
    fn test_builtin_has_overlaps() {
        // parking / parking lot は exterior_warehouse と parking_lot の両方に含まれる
        let overlaps = RuleTable::builtin().overlaps();
        assert!(overlaps.iter().any(|o| {
            o.first == "parking_lot"
                && o.second == "exterior_warehouse"
                && o.shared.contains(&"parking lot".to_string())
        }));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "categories": [
                {"name": "dock", "keywords": ["Loading Dock", "dock"]},
                {"name": "yard", "keywords": ["yard"]}
            ],
            "bonuses": [
                {"category": "dock", "label": "dock_bonus", "triggers": ["Ramp"], "points": 2}
            ],
            "fallbackCategory": "yard"
        }"#;
        let table = RuleTable::from_json(json).unwrap();
        assert_eq!(table.categories()[0].keywords, vec!["loading dock", "dock"]);
        assert_eq!(table.bonuses_for("dock").count(), 1);
        assert_eq!(table.bonuses()[0].triggers, vec!["ramp"]);
        assert!(table.is_known_category("yard"));
        assert!(!table.is_known_category("roof"));
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(RuleTable::from_json("{"), Err(Error::Json(_))));
    }
}
