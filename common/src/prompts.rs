//! プロンプト定義モジュール
//!
//! キャプショナ（ビジョンモデル）へ渡す指示文と、
//! レスポンスのキーワード数上限を定義する。

/// キャプション取得用の固定プロンプト
///
/// カンマ区切りのキーワード列のみを返させる。
/// 屋内外・実物/模型の区別は interior_* / exterior_* / marketing の判定に使う。
pub const CAPTION_PROMPT: &str = "Provide a list of keywords from the image, formatted as: keyword1, keyword2, keyword3, etc.
Focus on the most prominent elements, limiting to 35 words. No introductory text, bullet points, or narrative.
Be specific about location type: specify if it's interior or exterior for warehouses and offices.
Be specific about object size: if the forklift is miniature/toy or full-size.
Include any visible text, logos, or branding.";

/// キャプションから保持するキーワード数の上限
pub const MAX_CAPTION_KEYWORDS: usize = 35;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_prompt_mentions_interior_exterior() {
        assert!(CAPTION_PROMPT.contains("interior or exterior"));
        assert!(CAPTION_PROMPT.contains("miniature/toy"));
    }

    #[test]
    fn test_caption_prompt_keyword_limit_matches_constant() {
        assert!(CAPTION_PROMPT.contains(&MAX_CAPTION_KEYWORDS.to_string()));
    }
}
