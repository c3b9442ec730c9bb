//! 所在地タグの抽出
//!
//! 2つの入力源を扱う:
//! - タグフィールド（exiftool が返す XMP 値）
//! - 所在地フォルダ名（`n83rd_tolleson_az` のようなアンダースコア区切り）
//!
//! フォルダ名の解析はベストエフォート。解釈できない部分は空のまま返す。

use crate::types::LocationTag;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

/// 郵便番号として読むタグ名（先に見つかったものを採用）
pub const POSTAL_CODE_ALIASES: &[&str] = &["PostalCode", "ZipCode", "Zipcode", "xmp:ZipCode"];

const US_STATE_ABBREVIATIONS: &[&str] = &[
    "al", "ak", "az", "ar", "ca", "co", "ct", "de", "fl", "ga", "hi", "id", "il", "in", "ia",
    "ks", "ky", "la", "me", "md", "ma", "mi", "mn", "ms", "mo", "mt", "ne", "nv", "nh", "nj",
    "nm", "ny", "nc", "nd", "oh", "ok", "or", "pa", "ri", "sc", "sd", "tn", "tx", "ut", "vt",
    "va", "wa", "wv", "wi", "wy", "dc",
];

lazy_static! {
    /// 末尾（最後のカンマ以降）の郵便番号
    static ref TRAILING_POSTAL: Regex = Regex::new(r",\s*(\d{5})(?:-\d{4})?\s*$").unwrap();
    /// 値全体が郵便番号（ZIP / ZIP+4 / 区切りなし9桁）
    static ref BARE_POSTAL: Regex = Regex::new(r"^(\d{5})(?:-?\d{4})?$").unwrap();
    /// 単独の5桁数字
    static ref STANDALONE_POSTAL: Regex = Regex::new(r"\b(\d{5})(?:-\d{4})?\b").unwrap();
    /// 方角付きの通り名（n83rd → North 83rd Ave）
    static ref DIRECTIONAL_STREET: Regex = Regex::new(r"^(?i)([nsew])(\d+(?:st|nd|rd|th)?)$").unwrap();
}

pub fn is_state_abbreviation(segment: &str) -> bool {
    let lowered = segment.to_lowercase();
    US_STATE_ABBREVIATIONS.contains(&lowered.as_str())
}

/// 自由記述の所在地から郵便番号を取り出す
///
/// 値全体が郵便番号ならその先頭5桁。次に最後のカンマ以降の末尾にある5桁、
/// なければ文字列先頭以外にある最後の単独5桁を使う。
/// 先頭の番地番号は郵便番号として扱わない。結果は常に5桁。
pub fn extract_postal_code(location: &str) -> Option<String> {
    if let Some(caps) = BARE_POSTAL.captures(location.trim()) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = TRAILING_POSTAL.captures(location) {
        return Some(caps[1].to_string());
    }

    STANDALONE_POSTAL
        .captures_iter(location)
        .filter_map(|caps| caps.get(1))
        .filter(|m| !location[..m.start()].trim().is_empty())
        .last()
        .map(|m| m.as_str().to_string())
}

fn field<'a>(fields: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

impl LocationTag {
    /// タグフィールドから構築
    pub fn from_tag_fields(fields: &BTreeMap<String, String>) -> Self {
        let location = field(fields, "Location");

        let street = field(fields, "Street").map(str::to_string).or_else(|| {
            location
                .and_then(|loc| loc.split(',').next())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        });

        let postal_code = POSTAL_CODE_ALIASES
            .iter()
            .find_map(|alias| field(fields, alias).and_then(extract_postal_code))
            .or_else(|| location.and_then(extract_postal_code));

        Self {
            street,
            city: field(fields, "City").map(str::to_string),
            state: field(fields, "State").map(str::to_string),
            postal_code,
        }
    }

    /// 所在地フォルダ名から推定
    pub fn from_folder_name(name: &str) -> Self {
        let segments: Vec<&str> = name
            .split('_')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        let Some((last, rest)) = segments.split_last() else {
            return Self::default();
        };

        if is_state_abbreviation(last) {
            let state = Some(last.to_uppercase());
            return match rest {
                [] => Self { state, ..Default::default() },
                [city] => Self {
                    city: Some(title_case(city)),
                    state,
                    ..Default::default()
                },
                [street, city @ ..] => Self {
                    street: Some(expand_street(street)),
                    city: Some(title_case(&city.join(" "))),
                    state,
                    postal_code: None,
                },
            };
        }

        if segments.len() >= 3 {
            return Self {
                street: Some(expand_street(segments[0])),
                city: Some(title_case(segments[1])),
                state: Some(segments[2].to_uppercase()),
                postal_code: None,
            };
        }

        Self::default()
    }
}

/// `n83rd` → `North 83rd Ave`。方角で始まらなければそのまま
fn expand_street(segment: &str) -> String {
    let Some(caps) = DIRECTIONAL_STREET.captures(segment) else {
        return segment.to_string();
    };
    let direction = match caps[1].to_ascii_lowercase().as_str() {
        "n" => "North",
        "s" => "South",
        "e" => "East",
        _ => "West",
    };
    format!("{} {} Ave", direction, &caps[2])
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
