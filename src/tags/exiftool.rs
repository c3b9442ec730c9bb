//! exiftool 連携
//!
//! `exiftool -j -XMP:City ... <path>` の JSON 配列出力を読む。
//! 書き込みは `-XMP:City=... -overwrite_original`。

use super::{TagReader, TagWriter};
use crate::error::{IngestError, Result};
use photo_ingest_common::LocationTag;
use serde_json::Value;
use std::collections::BTreeMap;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// 1回の呼び出しの上限
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// 読み取るXMPフィールド
pub const READ_FIELDS: &[&str] = &[
    "XMP:City",
    "XMP:State",
    "XMP:Location",
    "XMP:Street",
    "XMP:PostalCode",
    "XMP:Zipcode",
    "XMP-xmp:ZipCode",
];

pub struct ExifTool {
    program: String,
    timeout: Duration,
}

impl ExifTool {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 起動確認（`exiftool -ver`）
    pub async fn version(&self) -> Result<String> {
        let stdout = self.run(&["-ver".to_string()]).await?;
        Ok(stdout.trim().to_string())
    }

    /// 時間切れの子プロセスは drop 時に kill される
    async fn run(&self, args: &[String]) -> Result<String> {
        let mut command = Command::new(&self.program);
        command.args(args).kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                IngestError::Extraction(format!(
                    "{} が{}秒以内に終了しません",
                    self.program,
                    self.timeout.as_secs_f32()
                ))
            })?
            .map_err(|e| IngestError::Extraction(format!("{} を実行できません: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IngestError::Extraction(format!(
                "{} failed (code {:?}): {}",
                self.program,
                output.status.code(),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl TagReader for ExifTool {
    async fn read_tags(&self, path: &Path) -> Result<BTreeMap<String, String>> {
        let mut args: Vec<String> = vec!["-j".into()];
        args.extend(READ_FIELDS.iter().map(|f| format!("-{}", f)));
        args.push(path.display().to_string());

        let stdout = self.run(&args).await?;
        parse_exiftool_json(&stdout)
    }
}

#[async_trait]
impl TagWriter for ExifTool {
    async fn write_location(&self, path: &Path, tag: &LocationTag) -> Result<()> {
        let mut args = vec!["-overwrite_original".to_string()];
        let fields = [
            ("Street", &tag.street),
            ("City", &tag.city),
            ("State", &tag.state),
            ("PostalCode", &tag.postal_code),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                args.push(format!("-XMP:{}={}", name, value));
            }
        }
        let combined = tag.combined();
        if !combined.is_empty() {
            args.push(format!("-XMP:Location={}", combined));
        }
        args.push(path.display().to_string());

        self.run(&args).await.map(|_| ())
    }
}

/// exiftool の `-j` 出力を（タグ名 → 文字列）に変換
///
/// 先頭要素のみ使う。数値は文字列化し、`SourceFile` と null は除く。
pub fn parse_exiftool_json(stdout: &str) -> Result<BTreeMap<String, String>> {
    let value: Value = serde_json::from_str(stdout)?;
    let Some(Value::Object(first)) = value.as_array().and_then(|items| items.first()) else {
        return Ok(BTreeMap::new());
    };

    let tags = first
        .iter()
        .filter(|(key, _)| key.as_str() != "SourceFile")
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.clone(), text))
        })
        .collect();

    Ok(tags)
}
