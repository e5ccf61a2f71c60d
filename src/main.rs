use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use retreat_carpool::config::{Config, DEFAULT_CONFIG_PATH};
use retreat_carpool::hash_ids::HashIds;
use retreat_carpool::infra::{FileCache, ReqwestHttp};
use retreat_carpool::logging;
use retreat_carpool::metrics::init_metrics;
use retreat_carpool::pipeline::{EventImporter, ImportRunSummary};
use retreat_carpool::server::{start_server, AppState};
use retreat_carpool::storage::{SqliteStorage, Storage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "retreat_carpool")]
#[command(about = "Imports retreat events from the main site into the carpool database")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file (optional)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import events from the main site calendar
    Import {
        /// Only update these already imported events (numeric ids or hash ids)
        ids: Vec<String>,
        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the HTTP import trigger
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// List imported events
    Events {
        /// Only events still open for carpool offers
        #[arg(long)]
        upcoming: bool,
    },
}

fn open_storage(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    let storage = SqliteStorage::open(
        &config.storage.database_path,
        HashIds::new(config.hash_ids.salt.clone()),
    )
    .with_context(|| {
        format!(
            "opening database {}",
            config.storage.database_path.display()
        )
    })?;
    Ok(Arc::new(storage))
}

fn build_importer(config: &Config, storage: Arc<dyn Storage>) -> anyhow::Result<EventImporter> {
    let http = ReqwestHttp::new().map_err(anyhow::Error::msg)?;
    let cache = FileCache::new(&config.storage.cache_dir);
    Ok(EventImporter::from_config(
        config,
        Arc::new(http),
        Arc::new(cache),
        storage,
    ))
}

fn print_summary(summary: &ImportRunSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!("{}", summary);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let log_guard = logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    if let Some(port) = config.server.metrics_port {
        init_metrics(port);
    }

    match cli.command {
        Commands::Import { ids, json } => {
            let storage = open_storage(&config)?;
            let importer = build_importer(&config, storage)?;
            let filter = (!ids.is_empty()).then_some(ids.as_slice());

            let result = importer
                .import_with_progress(filter, |progress| {
                    if !json {
                        println!("{}", progress);
                    }
                })
                .await;

            match result {
                Ok(summary) => {
                    print_summary(&summary, json)?;
                    if summary.has_errors() {
                        info!("{} records failed to import", summary.errors().len());
                    }
                }
                Err(e) => {
                    error!("Import failed: {}", e);
                    eprintln!("Import failed: {}", e);
                    drop(log_guard);
                    std::process::exit(1);
                }
            }
        }
        Commands::Serve { port } => {
            let storage = open_storage(&config)?;
            let importer = build_importer(&config, storage)?;
            let port = port.unwrap_or(config.server.port);
            start_server(Arc::new(AppState::new(importer)), port).await?;
        }
        Commands::Events { upcoming } => {
            let storage = open_storage(&config)?;
            let today = Local::now().date_naive();
            let events: Vec<_> = storage
                .list_events()
                .await?
                .into_iter()
                .filter(|event| !upcoming || event.is_upcoming(today))
                .collect();
            if events.is_empty() {
                println!("No events to list");
            }
            for event in events {
                println!(
                    "{} #{} ({}) {} [{}] {}{}",
                    event.hash_id,
                    event.id,
                    event.original_event_id,
                    event.date_range(),
                    event.category,
                    event.name,
                    if event.private { " (private)" } else { "" }
                );
            }
        }
    }

    Ok(())
}
