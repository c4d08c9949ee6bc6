use clap::{Parser, Subcommand};
use nc_cluster::ClusterPipeline;
use nc_core::config::{DEFAULT_K_MAX, DEFAULT_K_MIN};
use nc_core::{ArticleStorage, InferenceModel, KRange, PipelineConfig, Result};
use nc_feeds::{init_logging, IngestManager, NewsApiConfig, NewsApiSource};
use nc_inference::embeddings::EmbeddingGenerator;
use nc_inference::{create_model, Config, ModelProvider};
use nc_storage::{create_storage, StorageConfig, StorageKind};
use nc_web::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A duration written as `1h15m30s`, `30m`, `1d` or a bare number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total = 0u64;
        let mut digits = String::new();
        let mut seen_number = false;

        for c in s.chars().filter(|c| !c.is_whitespace()) {
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            let value: u64 = digits
                .parse()
                .map_err(|_| format!("Expected a number before '{}' in {:?}", c, s))?;
            let unit = match c {
                's' => 1,
                'm' => 60,
                'h' => 3600,
                'd' => 86400,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            total += value * unit;
            digits.clear();
            seen_number = true;
        }

        // Trailing digits without a unit are seconds.
        if !digits.is_empty() {
            total += digits
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            seen_number = true;
        }

        if !seen_number {
            return Err("Duration must include a number".to_string());
        }
        if total == 0 {
            return Err("Duration must be longer than zero".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total)))
    }
}

#[derive(Parser, Debug)]
#[command(name = "newsclust", author, version, about = "Cluster and summarize news articles", long_about = None)]
struct Cli {
    /// Article store: memory or sqlite
    #[arg(long, global = true, default_value = "memory")]
    storage: StorageKind,
    /// SQLite database file (sqlite storage only)
    #[arg(long, global = true)]
    database: Option<PathBuf>,
    /// Model used for summaries and embeddings: openai (default), deepseek or dummy
    #[arg(long, global = true, default_value = "openai")]
    model: String,
    /// Override the model provider's API base URL
    #[arg(long, global = true)]
    model_url: Option<String>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value = "0.0.0.0:3000")]
        addr: SocketAddr,
        /// Also ingest the news feed in the background every interval (e.g. 1h, 30m)
        #[arg(long)]
        ingest_interval: Option<HumanDuration>,
    },
    /// Fetch, summarize, embed and store the latest headlines
    Ingest {
        /// Keep running, ingesting every interval (e.g. 1h, 30m, 1d, 1h15m30s)
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    /// Cluster stored articles and print the result as JSON
    Cluster {
        /// Cluster the articles nearest to this text instead of the most recent
        #[arg(long)]
        query: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
        #[arg(long)]
        k_min: Option<usize>,
        #[arg(long)]
        k_max: Option<usize>,
    },
    /// List stored articles, newest first
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
}

fn k_range(k_min: Option<usize>, k_max: Option<usize>) -> Result<Option<KRange>> {
    if k_min.is_none() && k_max.is_none() {
        return Ok(None);
    }
    KRange::new(k_min.unwrap_or(DEFAULT_K_MIN), k_max.unwrap_or(DEFAULT_K_MAX)).map(Some)
}

fn ingest_manager(storage: Arc<dyn ArticleStorage>, inference: Arc<dyn InferenceModel>) -> Result<IngestManager> {
    let source = NewsApiSource::new(NewsApiConfig::from_env())?;
    let mut manager = IngestManager::new(storage, inference);
    manager.add_source(Arc::new(source));
    info!("🦗 Feeds initialized: {}", manager.sources().collect::<Vec<_>>().join(", "));
    Ok(manager)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut storage_config = StorageConfig::new(cli.storage);
    if let Some(path) = &cli.database {
        storage_config = storage_config.with_path(path);
    }
    let storage = create_storage(&storage_config).await?;

    let provider: ModelProvider = cli.model.parse()?;
    let mut model_config = Config::from_env(provider);
    if let Some(url) = &cli.model_url {
        model_config = model_config.with_base_url(url);
    }
    let inference = create_model(&cli.model, model_config)?;
    info!("🧠 Inference model initialized (using {})", inference.name());

    match cli.command {
        Commands::Serve { addr, ingest_interval } => {
            if let Some(HumanDuration(interval)) = ingest_interval {
                match ingest_manager(storage.clone(), inference.clone()) {
                    Ok(manager) => {
                        tokio::spawn(async move { manager.run_periodic(interval, None).await });
                    }
                    Err(e) => warn!("⚠️ Background ingestion disabled: {}", e),
                }
            }
            let state = AppState::new(storage, inference, PipelineConfig::default());
            nc_web::serve(addr, state).await?;
        }
        Commands::Ingest { interval } => {
            let manager = ingest_manager(storage, inference)?;
            match interval {
                Some(HumanDuration(interval)) => {
                    info!("🔄 Ingesting every {:?}", interval);
                    manager.run_periodic(interval, None).await;
                }
                None => {
                    let report = manager.ingest_all().await;
                    info!("✨ Ingestion finished: {}", report);
                }
            }
        }
        Commands::Cluster { query, limit, k_min, k_max } => {
            let k_range = k_range(k_min, k_max)?;
            let articles = match query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
                Some(query) => {
                    let embedding = EmbeddingGenerator::new(inference.clone())
                        .generate_text_embedding(query)
                        .await?;
                    storage.search_by_embedding(&embedding, limit).await?
                }
                None => storage.list_recent(limit, 0).await?,
            };
            info!("🔍 Clustering {} articles", articles.len());

            let pipeline = ClusterPipeline::new(inference, PipelineConfig::default());
            let result = pipeline.cluster_news(articles, k_range).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::List { limit, offset } => {
            let articles = storage.list_recent(limit, offset).await?;
            if articles.is_empty() {
                info!("📭 No articles stored");
            }
            for article in articles {
                println!(
                    "{}  {}\n    {}",
                    article.published_at.format("%Y-%m-%d %H:%M"),
                    article.title,
                    article.url
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_human_duration() {
        let parse = |s: &str| s.parse::<HumanDuration>().map(|d| d.0.as_secs());
        assert_eq!(parse("1h15m30s"), Ok(4530));
        assert_eq!(parse("30m"), Ok(1800));
        assert_eq!(parse("1d"), Ok(86400));
        assert_eq!(parse("90"), Ok(90));
        assert_eq!(parse("1h 30m"), Ok(5400));
        assert!(parse("").is_err());
        assert!(parse("h").is_err());
        assert!(parse("5w").is_err());
        assert!(parse("0s").is_err());
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cluster_command() {
        let cli = Cli::try_parse_from([
            "newsclust", "--storage", "sqlite", "--database", "news.db", "--model", "dummy",
            "cluster", "--query", "elections", "--k-min", "3",
        ])
        .unwrap();
        assert_eq!(cli.storage, StorageKind::Sqlite);
        assert_eq!(cli.database, Some(PathBuf::from("news.db")));
        assert_eq!(cli.model, "dummy");
        match cli.command {
            Commands::Cluster { query, limit, k_min, k_max } => {
                assert_eq!(query.as_deref(), Some("elections"));
                assert_eq!(limit, 50);
                assert_eq!(k_range(k_min, k_max).unwrap(), Some(KRange::new(3, DEFAULT_K_MAX).unwrap()));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_defaults_and_globals_after_subcommand() {
        let cli = Cli::try_parse_from(["newsclust", "serve", "--ingest-interval", "30m", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.storage, StorageKind::Memory);
        match cli.command {
            Commands::Serve { addr, ingest_interval } => {
                assert_eq!(addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
                assert_eq!(ingest_interval, Some(HumanDuration(Duration::from_secs(1800))));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Cli::try_parse_from(["newsclust", "--storage", "qdrant", "list"]).is_err());
        assert!(Cli::try_parse_from(["newsclust", "ingest", "--interval", "soon"]).is_err());
        assert!(k_range(Some(5), Some(2)).is_err());
        assert_eq!(k_range(None, None).unwrap(), None);
    }
}
