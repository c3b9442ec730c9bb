//! photo-ingest-rust
//!
//! 現場写真をキャプション → 分類 → 正規名へのリネーム → カタログ/ストア登録する。
//! 純粋ロジックは `photo_ingest_common` にあり、このクレートはI/O側を受け持つ。

pub mod captioner;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod locate;
pub mod logging;
pub mod pipeline;
pub mod scanner;
pub mod store;
pub mod tags;
