pub mod exif;

use crate::error::{IngestError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
    /// RAW形式（処理対象外）
    pub is_raw: bool,
}

impl ImageInfo {
    /// 親ディレクトリ名（所在地フォルダとして使う）
    pub fn parent_folder_name(&self) -> Option<String> {
        self.path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
    }

    /// ドット付き拡張子（小文字）
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default()
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
const RAW_EXTENSIONS: &[&str] = &["cr2", "dng"];

fn classify_extension(ext: &str) -> Option<bool> {
    let lowered = ext.to_lowercase();
    if IMAGE_EXTENSIONS.contains(&lowered.as_str()) {
        Some(false)
    } else if RAW_EXTENSIONS.contains(&lowered.as_str()) {
        Some(true)
    } else {
        None
    }
}

/// フォルダ以下を再帰的にスキャン（パス順）
pub fn scan_folder(folder: &Path) -> Result<Vec<ImageInfo>> {
    if !folder.is_dir() {
        return Err(IngestError::FolderNotFound(folder.display().to_string()));
    }

    let mut images = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(is_raw) = path
            .extension()
            .and_then(|ext| classify_extension(&ext.to_string_lossy()))
        else {
            continue;
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        images.push(ImageInfo {
            path: path.to_path_buf(),
            file_name,
            is_raw,
        });
    }

    images.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;

    #[test]
    fn test_classify_extension() {
        assert_eq!(classify_extension("jpg"), Some(false));
        assert_eq!(classify_extension("JPG"), Some(false));
        assert_eq!(classify_extension("jpeg"), Some(false));
        assert_eq!(classify_extension("png"), Some(false));
        assert_eq!(classify_extension("CR2"), Some(true));
        assert_eq!(classify_extension("dng"), Some(true));
        assert_eq!(classify_extension("txt"), None);
        assert_eq!(classify_extension("gif"), None);
    }

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"));
        assert!(matches!(result, Err(IngestError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_recursive_with_raw() {
        let temp_dir = tempfile::tempdir().unwrap();
        let site = temp_dir.path().join("n83rd_tolleson_az");
        fs::create_dir_all(&site).unwrap();

        File::create(temp_dir.path().join("b.jpg")).unwrap().write_all(b"dummy").unwrap();
        File::create(site.join("a.PNG")).unwrap().write_all(b"dummy").unwrap();
        File::create(site.join("c.CR2")).unwrap().write_all(b"raw").unwrap();
        File::create(site.join("notes.txt")).unwrap().write_all(b"text").unwrap();

        let result = scan_folder(temp_dir.path()).unwrap();
        let names: Vec<&str> = result.iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, vec!["b.jpg", "a.PNG", "c.CR2"]);
        assert!(result[2].is_raw);
        assert!(!result[1].is_raw);
        assert_eq!(result[1].parent_folder_name().as_deref(), Some("n83rd_tolleson_az"));
        assert_eq!(result[1].extension(), ".png");
    }

    #[test]
    fn test_images_sorted_by_path() {
        let temp_dir = tempfile::tempdir().unwrap();

        File::create(temp_dir.path().join("c.jpg")).unwrap();
        File::create(temp_dir.path().join("a.jpg")).unwrap();
        File::create(temp_dir.path().join("b.jpg")).unwrap();

        let result = scan_folder(temp_dir.path()).unwrap();
        assert_eq!(result[0].file_name, "a.jpg");
        assert_eq!(result[1].file_name, "b.jpg");
        assert_eq!(result[2].file_name, "c.jpg");
    }
}
