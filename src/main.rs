use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gallery_scraper::config::Config;
use gallery_scraper::extractor::{ExhibitionExtractor, OpenAiExtractor};
use gallery_scraper::fetcher::{FixtureFetcher, Fetchers, HttpFetcher, PageFetcher};
use gallery_scraper::observability::{init_logging, init_metrics};
use gallery_scraper::pipeline::{Pipeline, RunSummary};
use gallery_scraper::registry::{FetchMode, GalleryConfig, GalleryRegistry};
use gallery_scraper::storage::{ExhibitionStore, SqliteStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "gallery_scraper")]
#[command(about = "Collects current exhibitions from Seoul gallery websites")]
#[command(version)]
struct Cli {
    /// Configuration file; defaults apply when it does not exist
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, extract and store exhibitions
    Run {
        /// Galleries to run (comma-separated ids); defaults to every enabled gallery
        #[arg(long, value_delimiter = ',')]
        galleries: Option<Vec<String>>,
        /// Skip language-model extraction and store raw text only
        #[arg(long)]
        no_ai: bool,
        /// Do not write JSON snapshots
        #[arg(long)]
        no_json: bool,
        /// Replay saved HTML from a fixture directory instead of the network
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
    /// List configured galleries
    List,
    /// Fetch and parse one gallery, printing entries as JSON
    Fetch {
        #[arg(long)]
        gallery: String,
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
    /// Show stored exhibition counts per gallery
    Stats,
}

async fn build_fetchers(config: &Config, fixtures: Option<&Path>) -> Result<Fetchers> {
    if let Some(dir) = fixtures {
        let fixture = FixtureFetcher::from_dir(dir)
            .with_context(|| format!("loading fixtures from {}", dir.display()))?;
        info!("Replaying {} fixture pages from {}", fixture.len(), dir.display());
        return Ok(Fetchers::single(Arc::new(fixture)));
    }

    let http: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&config.fetcher)?);
    let fetchers = Fetchers::new(http);

    #[cfg(feature = "browser")]
    {
        match gallery_scraper::fetcher::browser::BrowserFetcher::launch().await {
            Ok(browser) => return Ok(fetchers.with_dynamic(Arc::new(browser))),
            Err(e) => warn!("Browser unavailable, dynamic galleries use plain HTTP: {}", e),
        }
    }

    Ok(fetchers)
}

#[cfg(feature = "db")]
async fn open_store(config: &Config) -> Result<Arc<dyn ExhibitionStore>> {
    if std::env::var("LIBSQL_URL").is_ok() {
        let store = gallery_scraper::storage::TursoStore::from_env().await?;
        return Ok(Arc::new(store));
    }
    Ok(Arc::new(SqliteStore::open(&config.database.path)?))
}

#[cfg(not(feature = "db"))]
async fn open_store(config: &Config) -> Result<Arc<dyn ExhibitionStore>> {
    Ok(Arc::new(SqliteStore::open(&config.database.path)?))
}

fn build_extractor(config: &Config, no_ai: bool) -> Result<Option<Arc<dyn ExhibitionExtractor>>> {
    if no_ai {
        info!("AI extraction disabled by --no-ai");
        return Ok(None);
    }
    match OpenAiExtractor::from_config(&config.extractor)? {
        Some(extractor) => {
            info!("AI extraction enabled with model {}", extractor.model());
            Ok(Some(Arc::new(extractor)))
        }
        None => {
            warn!("OPENAI_API_KEY not set or extraction disabled; storing raw text only");
            Ok(None)
        }
    }
}

fn select_galleries<'a>(
    registry: &'a GalleryRegistry,
    ids: Option<&[String]>,
) -> Result<Vec<&'a GalleryConfig>> {
    let Some(ids) = ids else {
        return Ok(registry.enabled());
    };
    let (selected, unknown) = registry.select(ids);
    for id in &unknown {
        warn!("Unknown gallery specified");
        println!("⚠️  Unknown gallery: {}", id);
    }
    if selected.is_empty() {
        bail!("no known galleries selected");
    }
    Ok(selected)
}

fn print_summary(summary: &RunSummary) {
    for result in &summary.galleries {
        println!("\n📊 Results for {} ({}):", result.gallery_name, result.gallery_id);
        if let Some(failure) = &result.failure {
            println!("   ❌ Failed: {}", failure);
            continue;
        }
        println!("   Found: {}", result.entries_found);
        println!("   Inserted: {}", result.inserted);
        println!("   Duplicates: {}", result.duplicates);
        println!("   Skipped: {}", result.skipped);
        if result.extracted + result.fallbacks > 0 {
            println!("   Extracted: {} (fallback: {})", result.extracted, result.fallbacks);
        }
        if let Some(file) = &result.output_file {
            println!("   Output file: {}", file);
        }
        if !result.errors.is_empty() {
            println!("   ⚠️  Errors:");
            for error in &result.errors {
                println!("   - {}", error);
            }
        }
    }

    println!(
        "\n✅ Done: {} inserted, {} duplicates, {} skipped, {} errors",
        summary.total_inserted(),
        summary.total_duplicates(),
        summary.total_skipped(),
        summary.total_errors()
    );
    let failed = summary.failed_galleries();
    if !failed.is_empty() {
        println!("❌ Failed galleries: {}", failed.join(", "));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let registry = GalleryRegistry::load_from_directory(&config.fetcher.registry_dir)?;

    match cli.command {
        Commands::Run {
            galleries,
            no_ai,
            no_json,
            fixtures,
        } => {
            println!("🔄 Collecting exhibitions...");
            init_metrics();

            let selected = select_galleries(&registry, galleries.as_deref())?;
            let fetchers = build_fetchers(&config, fixtures.as_deref()).await?;
            let store = open_store(&config).await?;

            let mut pipeline = Pipeline::new(fetchers, store)
                .with_require_end_date(config.database.require_end_date);
            if fixtures.is_none() {
                pipeline = pipeline.with_delay(Duration::from_millis(config.fetcher.delay_ms));
            }
            if let Some(extractor) = build_extractor(&config, no_ai)? {
                pipeline = pipeline.with_extractor(extractor);
            }
            if config.output.save_json && !no_json {
                pipeline = pipeline.with_json_output(&config.output.json_dir);
            }

            let summary = pipeline.run(&selected).await;
            print_summary(&summary);
        }
        Commands::List => {
            println!("🖼️  Configured galleries:");
            for gallery in registry.all() {
                let mode = match gallery.fetch_mode {
                    FetchMode::Static => "static",
                    FetchMode::Dynamic => "dynamic",
                };
                println!(
                    "   {:<14} {:<28} {:<8} {}{}",
                    gallery.gallery_id,
                    gallery.name,
                    mode,
                    gallery.list_url,
                    if gallery.enabled { "" } else { " (disabled)" }
                );
            }
        }
        Commands::Fetch { gallery, fixtures } => {
            let config_entry = registry
                .get(&gallery)
                .with_context(|| format!("unknown gallery '{}'", gallery))?;
            let fetchers = build_fetchers(&config, fixtures.as_deref()).await?;
            let store = Arc::new(gallery_scraper::storage::InMemoryStore::new());
            let pipeline = Pipeline::new(fetchers, store);

            let collected = pipeline.collect_entries(config_entry).await?;
            println!("{}", serde_json::to_string_pretty(&collected.entries)?);
            for error in &collected.detail_errors {
                eprintln!("⚠️  {}", error);
            }
        }
        Commands::Stats => {
            let store = open_store(&config).await?;
            let counts = store.count_by_gallery().await?;
            println!("📚 Stored exhibitions ({}):", store.name());
            for (gallery, count) in &counts {
                println!("   {:<28} {}", gallery, count);
            }
            println!("   Total: {}", store.count().await?);
        }
    }

    Ok(())
}
