use clap::Parser;
use photo_ingest_common::{categorize, RuleTable};
use photo_ingest_rust::{captioner, catalog, cli, config, error, locate, logging, pipeline, scanner, store, tags};
use captioner::{Captioner, OllamaCaptioner, RetryPolicy};
use catalog::{Catalog, SqliteCatalog};
use cli::{Cli, Commands};
use config::Config;
use error::{IngestError, Result};
use pipeline::{Orchestrator, RunOptions, RunSummary};
use store::{DirObjectStore, ObjectStore};
use tags::ExifTool;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("\n❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;
    let rules = config.load_rules()?;
    if !matches!(cli.command, Commands::Rules) {
        warn_overlaps(&rules);
    }

    match cli.command {
        Commands::Catalog => {
            println!("📸 photo-ingest - カタログ取り込み\n");
            let folder = config.require_network_path()?;
            let catalog_path = config.require_catalog_path()?;

            println!("[1/3] 依存サービスを確認中...");
            let captioner = startup_captioner(&config).await?;
            let exiftool = startup_exiftool(&config).await;
            let catalog = SqliteCatalog::open(catalog_path)?;
            println!("✔ カタログ: {} ({}件登録済み)\n", catalog_path.display(), catalog.count()?);

            println!("[2/3] 写真を処理中: {}", folder.display());
            let summary = Orchestrator::new(&captioner, &exiftool, &rules)
                .with_catalog(&catalog)
                .with_options(run_options(&config))
                .run(folder)
                .await?;

            println!("[3/3] 結果");
            print_summary(&summary);
        }

        Commands::Store => {
            println!("☁️  photo-ingest - ストア取り込み\n");
            let folder = config.require_network_path()?;
            let (root, bucket) = config.require_store()?;

            println!("[1/3] 依存サービスを確認中...");
            let captioner = startup_captioner(&config).await?;
            let exiftool = startup_exiftool(&config).await;
            let store = DirObjectStore::new(root, bucket);
            store.check()?;
            println!("✔ バケット: {}", store.bucket());

            // CATALOG_PATH があればカタログにも登録
            let catalog = match &config.catalog_path {
                Some(path) => {
                    let catalog = SqliteCatalog::open(path)?;
                    println!("✔ カタログ: {}", path.display());
                    Some(catalog)
                }
                None => None,
            };
            println!();

            println!("[2/3] 写真を処理中: {}", folder.display());
            let mut orchestrator = Orchestrator::new(&captioner, &exiftool, &rules)
                .with_store(&store)
                .with_options(run_options(&config));
            if let Some(catalog) = &catalog {
                orchestrator = orchestrator.with_catalog(catalog as &dyn Catalog);
            }
            let summary = orchestrator.run(folder).await?;

            println!("[3/3] 結果");
            print_summary(&summary);
        }

        Commands::Locate => {
            println!("📍 photo-ingest - 所在地タグ書き込み\n");
            let folder = config.require_network_path()?;

            println!("[1/3] 写真をスキャン中...");
            let images = scanner::scan_folder(folder)?;
            println!("✔ {}枚の写真を検出\n", images.len());
            if images.is_empty() {
                println!("対象の写真がありません");
                return Ok(());
            }

            let exiftool = ExifTool::new(&config.exiftool_path);
            exiftool.version().await.map_err(|e| {
                IngestError::DependencyUnavailable(format!("exiftool を実行できません: {}", e))
            })?;

            println!("[2/3] 所在地を入力してください");
            let tag = locate::prompt_location()?;
            println!("✔ {}\n", tag.combined());

            println!("[3/3] タグを書き込み中...");
            let report = locate::apply_location(&images, &exiftool, &tag).await;
            println!("\n✅ 書き込み完了");
            println!("   成功: {}枚", report.written.len());
            println!("   失敗: {}枚", report.failed.len());
            println!("   RAWスキップ: {}枚", report.skipped_raw);
            for (path, reason) in &report.failed {
                println!("   ✗ {}: {}", path.display(), reason);
            }
        }

        Commands::Rules => {
            println!("📋 photo-ingest - カテゴリルール\n");
            print_rules(&rules);
        }

        Commands::Classify { description } => {
            let classification = categorize(&description, &rules);

            println!("カテゴリ: {}", classification.category);
            if let Some(reason) = classification.fallback {
                println!("  (フォールバック: {:?})", reason);
            }
            for score in &classification.scores {
                let mark = if score.category == classification.category { "▶" } else { " " };
                println!("{} {:<24} {:>3}  {}", mark, score.category, score.score, score.evidence.join(", "));
            }
        }
    }

    Ok(())
}

async fn startup_captioner(config: &Config) -> Result<OllamaCaptioner> {
    let captioner = OllamaCaptioner::new(&config.captioner_url, &config.captioner_model);
    captioner.health_check().await?;
    println!("✔ キャプション: {} ({})", captioner.base_url(), captioner.model());
    Ok(captioner)
}

/// exiftool が使えなくても続行（所在地なしで命名）
async fn startup_exiftool(config: &Config) -> ExifTool {
    let exiftool = ExifTool::new(&config.exiftool_path);
    match exiftool.version().await {
        Ok(version) => println!("✔ exiftool: {}", version),
        Err(e) => log::warn!("exiftool を実行できません。所在地タグなしで続行します: {}", e),
    }
    exiftool
}

fn run_options(config: &Config) -> RunOptions {
    RunOptions {
        retry: RetryPolicy {
            attempts: config.caption_retries,
            timeout: config.caption_timeout,
        },
        show_progress: true,
    }
}

fn warn_overlaps(rules: &RuleTable) {
    for overlap in rules.overlaps() {
        log::warn!("{}", overlap);
    }
}

fn print_rules(rules: &RuleTable) {
    for (index, category) in rules.categories().iter().enumerate() {
        println!("{:>2}. {} ({}語)", index + 1, category.name, category.keywords.len());
        println!("    {}", category.keywords.join(", "));
    }
    println!("\nフォールバック: {}", rules.fallback_category());

    if !rules.bonuses().is_empty() {
        println!("\nボーナス:");
        for bonus in rules.bonuses() {
            println!(
                "  {} → {} (+{}/語): {}",
                bonus.label,
                bonus.category,
                bonus.points,
                bonus.triggers.join(", ")
            );
        }
    }

    let overlaps = rules.overlaps();
    if !overlaps.is_empty() {
        println!("\nキーワード重複:");
        for overlap in &overlaps {
            println!("  {}", overlap);
        }
    }
}

fn print_summary(summary: &RunSummary) {
    let stats = summary.stats;
    println!("\n✅ 処理完了");
    println!("   対象: {}枚", stats.total);
    println!("   成功: {}枚", stats.succeeded);
    println!("   スキップ: {}枚", stats.skipped);
    println!("   失敗: {}枚", stats.failed);
    if let Some(path) = &summary.ledger_path {
        println!("   台帳: {}", path.display());
    }
}
