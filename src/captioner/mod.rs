//! 画像キャプション生成
//!
//! 画像バイト列から「キーワード, キーワード, ...」形式の説明文を得る。

mod ollama;

pub use ollama::OllamaCaptioner;

use crate::error::{IngestError, Result};
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Captioner: Send + Sync {
    /// 画像の説明文を生成
    async fn describe(&self, image: &[u8]) -> Result<String>;

    /// 起動時の疎通確認
    async fn health_check(&self) -> Result<()>;
}

/// 試行回数と1回あたりのタイムアウト
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            timeout: Duration::from_secs(300),
        }
    }
}

/// リトライ付きで説明文を生成
///
/// すべての試行が失敗した場合は最後のエラーを返す。
pub async fn describe_with_retry(
    captioner: &dyn Captioner,
    image: &[u8],
    policy: RetryPolicy,
) -> Result<String> {
    let attempts = policy.attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match tokio::time::timeout(policy.timeout, captioner.describe(image)).await {
            Ok(Ok(description)) => return Ok(description),
            Ok(Err(e)) => {
                log::warn!("キャプション失敗 ({}/{}): {}", attempt, attempts, e);
                last_error = Some(e);
            }
            Err(_) => {
                log::warn!(
                    "キャプションがタイムアウト ({}/{}): {}秒",
                    attempt,
                    attempts,
                    policy.timeout.as_secs()
                );
                last_error = Some(IngestError::Caption(format!(
                    "{}秒以内に応答がありません",
                    policy.timeout.as_secs()
                )));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| IngestError::Caption("試行なし".into())))
}
