use crate::error::{IngestError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// 撮影日時を取得（DateTimeOriginal → DateTime の順）
pub fn extract_date(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut bufreader = BufReader::new(file);
    let exif = exif::Reader::new()
        .read_from_container(&mut bufreader)
        .map_err(|e| IngestError::Extraction(format!("EXIF読み取り失敗 {}: {}", path.display(), e)))?;

    [exif::Tag::DateTimeOriginal, exif::Tag::DateTime]
        .into_iter()
        .find_map(|tag| exif.get_field(tag, exif::In::PRIMARY))
        .map(|field| field.display_value().to_string())
        .ok_or_else(|| IngestError::Extraction(format!("EXIFに日時がありません: {}", path.display())))
}
