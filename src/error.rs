use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("依存サービスに接続できません: {0}")]
    DependencyUnavailable(String),

    #[error("キャプション生成エラー: {0}")]
    Caption(String),

    #[error("タグ読み取りエラー: {0}")]
    Extraction(String),

    #[error("保存エラー: {0}")]
    Persistence(String),

    #[error("ファイル名を決定できません: {base} ({attempts}回試行)")]
    NamingExhausted { base: String, attempts: u32 },

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("データベースエラー: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Core(photo_ingest_common::Error),
}

impl IngestError {
    /// 起動時に発生したら処理を始めずに終了すべきエラー
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IngestError::Config(_) | IngestError::DependencyUnavailable(_) | IngestError::FolderNotFound(_)
        )
    }
}

impl From<photo_ingest_common::Error> for IngestError {
    fn from(err: photo_ingest_common::Error) -> Self {
        match err {
            photo_ingest_common::Error::NamingExhausted { base, attempts } => {
                IngestError::NamingExhausted { base, attempts }
            }
            photo_ingest_common::Error::Config(msg) => IngestError::Config(msg),
            other => IngestError::Core(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
