//! ログ初期化
//!
//! 進捗表示は stdout（println! / indicatif）、詳細は log マクロ経由で stderr に出す。

use log::LevelFilter;
use std::path::Path;

/// ロガーを初期化（`RUST_LOG` があればそちらを優先）
pub fn init_logger(verbose: bool) {
    let default_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(default_level)
        .format_timestamp_secs()
        .format_target(verbose);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    // テストなどで二重初期化されても無視
    builder.try_init().ok();
}

/// ファイル単位の失敗を記録
pub fn log_file_error(path: &Path, operation: &str, error: &dyn std::error::Error) {
    log::error!(
        "処理失敗 - 操作: {}, パス: {}, エラー: {}",
        operation,
        path.display(),
        error
    );
}
