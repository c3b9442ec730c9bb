//! 所在地タグの一括書き込み
//!
//! 所在地を1回だけ対話入力し、フォルダ内の全画像（RAW以外）に書き込む。

use crate::error::{IngestError, Result};
use crate::scanner::ImageInfo;
use crate::tags::TagWriter;
use dialoguer::Input;
use photo_ingest_common::LocationTag;
use std::path::PathBuf;

/// 書き込み結果
#[derive(Debug, Default)]
pub struct LocateReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub skipped_raw: usize,
}

/// 所在地を対話入力
pub fn prompt_location() -> Result<LocationTag> {
    let street = ask("番地・通り名 (例: 120 N 83rd Ave)")?;
    let city = ask("市 (例: Tolleson)")?;
    let state = ask("州 (例: AZ)")?.map(|s| s.to_uppercase());
    let postal_code = ask("郵便番号 (例: 85353)")?;

    let tag = LocationTag {
        street,
        city,
        state,
        postal_code,
    };
    validate_location(&tag)?;
    Ok(tag)
}

fn ask(prompt: &str) -> Result<Option<String>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(|e| IngestError::Config(e.to_string()))?;

    let trimmed = input.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// 空の所在地と不正な郵便番号を拒否
pub fn validate_location(tag: &LocationTag) -> Result<()> {
    if tag.is_empty() {
        return Err(IngestError::Config("所在地が入力されていません".into()));
    }
    if let Some(postal) = &tag.postal_code {
        if postal.len() != 5 || !postal.chars().all(|c| c.is_ascii_digit()) {
            return Err(IngestError::Config(format!("郵便番号は5桁の数字です: {}", postal)));
        }
    }
    Ok(())
}

/// 画像に所在地を書き込む（1枚の失敗で止めない）
pub async fn apply_location(images: &[ImageInfo], writer: &dyn TagWriter, tag: &LocationTag) -> LocateReport {
    let mut report = LocateReport::default();

    for image in images {
        if image.is_raw {
            report.skipped_raw += 1;
            continue;
        }
        match writer.write_location(&image.path, tag).await {
            Ok(()) => {
                log::info!("✔ {}: {}", image.file_name, tag.combined());
                report.written.push(image.path.clone());
            }
            Err(e) => {
                log::error!("書き込み失敗 {}: {}", image.file_name, e);
                report.failed.push((image.path.clone(), e.to_string()));
            }
        }
    }

    report
}
