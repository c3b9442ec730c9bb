//! カテゴリスコアリング
//!
//! トークン集合をルールテーブルの各カテゴリと照合し、勝者を選ぶ。
//!
//! ## 採点
//! 1. カテゴリのキーワードを文字数の降順に並べる（同長は定義順）
//! 2. 一致済みフレーズの部分文字列になっているキーワードはスキップ
//! 3. トークンと完全一致: +2 / いずれかのトークンに部分一致: +1
//! 4. カテゴリのボーナス語彙: 完全一致したトリガー1語ごとに加点
//!
//! 同点の場合はルールテーブルで先に現れるカテゴリが勝つ。

use crate::keywords::extract_keywords;
use crate::rules::{CategoryRule, RuleTable};
use crate::types::{Classification, FallbackReason, MatchScore};
use std::collections::BTreeSet;

const EXACT_MATCH_POINTS: u32 = 2;
const PARTIAL_MATCH_POINTS: u32 = 1;

/// 説明文を分類
pub fn categorize(description: &str, rules: &RuleTable) -> Classification {
    let tokens = extract_keywords(description);
    score_tokens(&tokens, rules)
}

/// 抽出済みトークン集合を分類
pub fn score_tokens(tokens: &BTreeSet<String>, rules: &RuleTable) -> Classification {
    if tokens.is_empty() {
        return fallback(rules, FallbackReason::EmptyDescription);
    }

    let scores: Vec<MatchScore> = rules
        .categories()
        .iter()
        .map(|category| score_category(category, tokens, rules))
        .filter(|s| s.score > 0)
        .collect();

    // 最初に現れた最高点を採用（max_by_key は同点で後勝ちになるため使わない）
    let mut winner: Option<&MatchScore> = None;
    for score in &scores {
        if winner.map_or(true, |w| score.score > w.score) {
            winner = Some(score);
        }
    }

    match winner {
        Some(best) => Classification {
            category: best.category.clone(),
            scores: scores.clone(),
            fallback: None,
        },
        None => fallback(rules, FallbackReason::NoMatches),
    }
}

/// 1カテゴリ分の採点
fn score_category(category: &CategoryRule, tokens: &BTreeSet<String>, rules: &RuleTable) -> MatchScore {
    let mut sorted: Vec<&str> = category.keywords.iter().map(String::as_str).collect();
    sorted.sort_by_key(|k| std::cmp::Reverse(k.chars().count()));

    let mut score = 0;
    let mut evidence = Vec::new();
    let mut matched: Vec<&str> = Vec::new();

    for keyword in sorted {
        if matched.iter().any(|m| m.contains(keyword)) {
            continue;
        }

        if tokens.contains(keyword) {
            score += EXACT_MATCH_POINTS;
            evidence.push(keyword.to_string());
            matched.push(keyword);
        } else if let Some(token) = tokens.iter().find(|t| t.contains(keyword)) {
            score += PARTIAL_MATCH_POINTS;
            evidence.push(format!("{}(in {})", keyword, token));
            matched.push(keyword);
        }
    }

    for bonus in rules.bonuses_for(&category.name) {
        for trigger in &bonus.triggers {
            if tokens.contains(trigger.as_str()) {
                score += bonus.points;
                evidence.push(format!("{}({})", bonus.label, trigger));
            }
        }
    }

    MatchScore {
        category: category.name.clone(),
        score,
        evidence,
    }
}

fn fallback(rules: &RuleTable, reason: FallbackReason) -> Classification {
    Classification {
        category: rules.fallback_category().to_string(),
        scores: Vec::new(),
        fallback: Some(reason),
    }
}
