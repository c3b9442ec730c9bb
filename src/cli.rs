use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "photo-ingest")]
#[command(about = "現場写真の自動分類・リネーム・カタログ登録ツール", long_about = None)]
#[command(after_help = "設定は環境変数（または .env）から読み込みます: \
NETWORK_PATH, CATALOG_PATH, STORE_ROOT, STORE_BUCKET, CAPTIONER_URL, CAPTIONER_MODEL, \
CAPTION_TIMEOUT_SECS, CAPTION_RETRIES, EXIFTOOL_PATH, RULES_PATH")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// NETWORK_PATH の写真を分類・リネームしてカタログ（SQLite）に登録
    Catalog,

    /// NETWORK_PATH の写真を分類・リネームしてオブジェクトストアに保存
    Store,

    /// 所在地を入力して NETWORK_PATH の全写真にタグを書き込む
    Locate,

    /// カテゴリルールとキーワード重複を表示
    Rules,

    /// 説明文を分類してスコアを表示
    Classify {
        /// 説明文（例: "warehouse interior, pallets, forklift"）
        #[arg(required = true)]
        description: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["photo-ingest", "catalog"]).unwrap();
        assert!(matches!(cli.command, Commands::Catalog));
        assert!(!cli.verbose);

        let cli = Cli::try_parse_from(["photo-ingest", "store", "--verbose"]).unwrap();
        assert!(matches!(cli.command, Commands::Store));
        assert!(cli.verbose);

        let cli = Cli::try_parse_from(["photo-ingest", "classify", "parking lot"]).unwrap();
        match cli.command {
            Commands::Classify { description } => assert_eq!(description, "parking lot"),
            _ => panic!("classify expected"),
        }
    }

    #[test]
    fn test_classify_requires_description() {
        assert!(Cli::try_parse_from(["photo-ingest", "classify"]).is_err());
        assert!(Cli::try_parse_from(["photo-ingest"]).is_err());
    }
}
