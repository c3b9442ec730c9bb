//! 既処理ファイル名の判定
//!
//! 過去の命名規則（世代）ごとに認識関数を持ち、古い順に試す。
//! 新しい世代を足すときは認識関数を1つ追加して `RECOGNIZERS` に並べる。
//!
//! | 世代 | 形式 |
//! |------|------|
//! | 1 | `category[_city][_state]_postal[_n].ext` |
//! | 2 | `category_street[_city][_state]_postal[_n].ext`（通り名に数字を含む） |

use crate::rules::RuleTable;

/// 命名規則の世代
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NamingGeneration {
    /// 通り名なし
    StreetLess = 1,
    /// 通り名あり（現行）
    StreetAware = 2,
}

impl NamingGeneration {
    /// 現在の命名規則
    pub const CURRENT: NamingGeneration = NamingGeneration::StreetAware;

    pub fn number(self) -> u8 {
        self as u8
    }
}

/// カテゴリ接頭辞を外したファイル名の分解結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameShape<'a> {
    pub category: &'a str,
    /// 郵便番号・連番より前の部品
    pub leading: Vec<&'a str>,
    pub postal_code: &'a str,
    pub counter: Option<&'a str>,
}

type Recognizer = fn(&NameShape<'_>) -> Option<NamingGeneration>;

/// 古い順
const RECOGNIZERS: &[Recognizer] = &[try_parse_generation_1, try_parse_generation_2];

/// 第1世代: 通り名なし（数字を含む部品がない）
pub fn try_parse_generation_1(shape: &NameShape<'_>) -> Option<NamingGeneration> {
    if shape.leading.iter().any(|p| has_digit(p)) {
        None
    } else {
        Some(NamingGeneration::StreetLess)
    }
}

/// 第2世代: 数字を含む通り名部品がある
pub fn try_parse_generation_2(shape: &NameShape<'_>) -> Option<NamingGeneration> {
    if shape.leading.iter().any(|p| has_digit(p)) {
        Some(NamingGeneration::StreetAware)
    } else {
        None
    }
}

fn has_digit(part: &str) -> bool {
    part.chars().any(|c| c.is_ascii_digit())
}

fn is_all_digits(part: &str) -> bool {
    !part.is_empty() && part.chars().all(|c| c.is_ascii_digit())
}

fn is_postal_code(part: &str) -> bool {
    part.len() == 5 && is_all_digits(part)
}

fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    }
}

/// ファイル名をカテゴリ・部品・郵便番号・連番に分解
///
/// 既知カテゴリ（フォールバックを含む）で始まらない、または郵便番号が5桁数字でない場合は `None`。
pub fn parse_shape<'a>(file_name: &'a str, rules: &'a RuleTable) -> Option<NameShape<'a>> {
    let stem = strip_extension(file_name);

    // フォールバックカテゴリがテーブル外でも、その名前で付けたファイルを認識する
    let category = rules
        .category_names()
        .chain(std::iter::once(rules.fallback_category()))
        .filter(|name| {
            stem.strip_prefix(name)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('_'))
        })
        .max_by_key(|name| name.len())?;

    let remainder = stem[category.len()..].trim_start_matches('_');
    if remainder.is_empty() {
        return None;
    }
    let parts: Vec<&str> = remainder.split('_').collect();

    let (postal_code, counter, leading) = match parts.as_slice() {
        [leading @ .., postal, counter] if is_all_digits(counter) && is_postal_code(postal) => {
            (*postal, Some(*counter), leading.to_vec())
        }
        [leading @ .., postal] => (*postal, None, leading.to_vec()),
        [] => return None,
    };

    if !is_postal_code(postal_code) {
        return None;
    }

    Some(NameShape {
        category,
        leading,
        postal_code,
        counter,
    })
}

/// ファイル名の命名世代を判定
pub fn detect_generation(file_name: &str, rules: &RuleTable) -> Option<NamingGeneration> {
    let shape = parse_shape(file_name, rules)?;
    RECOGNIZERS.iter().find_map(|recognize| recognize(&shape))
}

/// 現行世代の名前なら処理済み
pub fn is_already_processed(file_name: &str, rules: &RuleTable) -> bool {
    detect_generation(file_name, rules) == Some(NamingGeneration::CURRENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::CanonicalName;
    use crate::types::LocationTag;

    #[test]
    fn test_current_generation_is_processed() {
        let rules = RuleTable::builtin();
        assert!(is_already_processed("parking_lot_120n83rdave_tolleson_az_85353.jpg", &rules));
        assert!(is_already_processed("parking_lot_120n83rdave_tolleson_az_85353_2.jpg", &rules));
        assert_eq!(
            detect_generation("unis_street123_city_12345.jpg", &rules),
            Some(NamingGeneration::StreetAware)
        );
    }

    #[test]
    fn test_fallback_outside_table_is_recognized() {
        let rules = RuleTable::new(
            vec![crate::rules::CategoryRule::new("office", &["desk"])],
            vec![],
            "misc",
        )
        .unwrap();
        assert!(is_already_processed("misc_120main_tolleson_az_85353.jpg", &rules));
        assert!(is_already_processed("office_120main_tolleson_az_85353_1.jpg", &rules));
        assert!(!is_already_processed("miscellaneous_120main_85353.jpg", &rules));
    }

    #[test]
    fn test_street_less_generation_is_reprocessed() {
        let rules = RuleTable::builtin();
        assert_eq!(
            detect_generation("interior_warehouse_tolleson_az_85353.jpg", &rules),
            Some(NamingGeneration::StreetLess)
        );
        assert!(!is_already_processed("interior_warehouse_tolleson_az_85353.jpg", &rules));
        assert!(!is_already_processed("interior_warehouse_12345_1.jpg", &rules));
    }

    #[test]
    fn test_missing_postal_is_unprocessed() {
        let rules = RuleTable::builtin();
        assert_eq!(detect_generation("office_gym_city_state.jpg", &rules), None);
        assert_eq!(detect_generation("bathroom.jpg", &rules), None);
        assert_eq!(detect_generation("bathroom_1234.jpg", &rules), None);
    }

    #[test]
    fn test_unknown_category_is_unprocessed() {
        let rules = RuleTable::builtin();
        assert!(!is_already_processed("IMG_0001.jpg", &rules));
        assert!(!is_already_processed("warehouse_120n83rdave_tolleson_az_85353.jpg", &rules));
        // 接頭辞の直後が `_` でなければカテゴリとみなさない
        assert!(!is_already_processed("unisx_120main_tolleson_az_85353.jpg", &rules));
    }

    #[test]
    fn test_longest_category_prefix_wins() {
        let rules = RuleTable::builtin();
        let shape = parse_shape("interior_warehouse_1main_tolleson_az_85353.jpg", &rules).unwrap();
        assert_eq!(shape.category, "interior_warehouse");
        assert_eq!(shape.leading, vec!["1main", "tolleson", "az"]);
        assert_eq!(shape.postal_code, "85353");
        assert_eq!(shape.counter, None);
    }

    #[test]
    fn test_counter_requires_postal_before_it() {
        let rules = RuleTable::builtin();
        let shape = parse_shape("company_100main_walnut_ca_91789_7.png", &rules).unwrap();
        assert_eq!(shape.counter, Some("7"));
        assert_eq!(shape.postal_code, "91789");

        // 末尾の数字の前が郵便番号でなければ、末尾自体を郵便番号として扱う
        let shape = parse_shape("company_street123_city_12345.jpg", &rules).unwrap();
        assert_eq!(shape.counter, None);
        assert_eq!(shape.leading, vec!["street123", "city"]);
    }

    #[test]
    fn test_synthesized_names_round_trip() {
        let rules = RuleTable::builtin();
        let tag = LocationTag {
            street: Some("street 123".into()),
            city: Some("city".into()),
            state: None,
            postal_code: Some("12345".into()),
        };
        for category in rules.category_names() {
            let name = CanonicalName::new(category, &tag, ".jpg");
            assert!(is_already_processed(&name.render(), &rules), "{}", name);
            let numbered = name.with_counter(Some(4));
            assert!(is_already_processed(&numbered.render(), &rules), "{}", numbered);
        }
    }
}
