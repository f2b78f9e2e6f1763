//! Analytics Dashboard CLI
//!
//! Command-line interface for dashboard operations:
//! - Seed a database with synthetic events
//! - Query aggregates, chart series and records through the API
//! - Print the default configuration

use analytics_dashboard::api::dto::ListResponse;
use analytics_dashboard::config::{generate_default_config, DEFAULT_DB_PATH};
use analytics_dashboard::storage::{seed_store, EventStore, DEFAULT_SEED_COUNT};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dashboard-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Seed and query the analytics dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:5000", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

/// Filter flags shared by the query commands
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Inclusive lower bound (RFC 3339)
    #[arg(long)]
    pub start: Option<String>,
    /// Inclusive upper bound (RFC 3339)
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub region: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub source: Option<String>,
}

impl FilterArgs {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        [
            ("startDate", &self.start),
            ("endDate", &self.end),
            ("region", &self.region),
            ("category", &self.category),
            ("source", &self.source),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
        .collect()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fill a database file with synthetic events
    Seed {
        /// Database file (created if missing)
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,
        /// Number of events to generate
        #[arg(long, default_value_t = DEFAULT_SEED_COUNT)]
        count: usize,
        /// RNG seed for reproducible data
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Show totals and averages
    Aggregates {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show a time-bucketed series
    Chart {
        #[command(flatten)]
        filter: FilterArgs,
        /// Bucket size (timestamp, hour, day)
        #[arg(short, long, default_value = "day")]
        interval: String,
    },

    /// List records, newest first
    List {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// Show a single record
    Get {
        /// Record UUID
        id: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "analytics_dashboard=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Seed { db, count, seed } => {
            let inserted = tokio::task::spawn_blocking(move || {
                let store = EventStore::open(&db)?;
                let inserted = seed_store(&store, count, seed)?;
                Ok::<_, anyhow::Error>((inserted, store.len()?))
            })
            .await??;

            println!("Inserted {} events ({} total)", inserted.0, inserted.1);
        }

        Commands::Aggregates { filter } => {
            let data = fetch(&client, &cli.api_url, "/api/v1/analytics/aggregates", filter.to_query())
                .await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                let d = &data["data"];
                println!("{:<20} {}", "Total revenue", d["totalRevenue"]);
                println!("{:<20} {}", "Total users", d["totalUsers"]);
                println!("{:<20} {}", "Total sessions", d["totalSessions"]);
                println!("{:<20} {}", "Avg bounce rate", d["avgBounceRate"]);
                println!("{:<20} {}", "Avg conversion", d["avgConversion"]);
                println!("{:<20} {}", "Regions", d["uniqueRegions"]);
                println!("{:<20} {}", "Categories", d["uniqueCategories"]);
                println!("{:<20} {}", "Sources", d["uniqueSources"]);
            }
        }

        Commands::Chart { filter, interval } => {
            let mut query = filter.to_query();
            query.push(("interval", interval));
            let data = fetch(&client, &cli.api_url, "/api/v1/analytics/chart", query).await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                println!(
                    "{:<26} {:>12} {:>8} {:>9}",
                    "Bucket", "Revenue", "Users", "Sessions"
                );
                println!("{}", "-".repeat(58));
                for bucket in data["data"].as_array().into_iter().flatten() {
                    println!(
                        "{:<26} {:>12} {:>8} {:>9}",
                        bucket["bucketStart"].as_str().unwrap_or("-"),
                        bucket["revenue"],
                        bucket["users"],
                        bucket["sessions"]
                    );
                }
            }
        }

        Commands::List {
            filter,
            page,
            limit,
        } => {
            let mut query = filter.to_query();
            query.push(("page", page.to_string()));
            query.push(("limit", limit.to_string()));
            let data = fetch(&client, &cli.api_url, "/api/v1/analytics", query).await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                let list: ListResponse = serde_json::from_value(data)?;
                println!(
                    "{:<36} {:<20} {:>10} {:<14} {:<14}",
                    "ID", "Timestamp", "Revenue", "Region", "Source"
                );
                println!("{}", "-".repeat(98));
                for e in &list.data {
                    println!(
                        "{:<36} {:<20} {:>10.2} {:<14} {:<14}",
                        e.id,
                        e.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        e.revenue(),
                        e.region,
                        e.source
                    );
                }
                let p = list.pagination;
                println!();
                println!("Page {} of {} ({} records)", p.page, p.pages, p.total);
            }
        }

        Commands::Get { id } => {
            let path = format!("/api/v1/analytics/{}", id);
            let data = fetch(&client, &cli.api_url, &path, Vec::new()).await?;
            println!("{}", serde_json::to_string_pretty(&data["data"])?);
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

/// GET an API path and return the JSON body, failing on non-2xx
async fn fetch(
    client: &reqwest::Client,
    base: &str,
    path: &str,
    query: Vec<(&'static str, String)>,
) -> anyhow::Result<serde_json::Value> {
    let response = client
        .get(format!("{}{}", base.trim_end_matches('/'), path))
        .query(&query)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Cannot connect to API at {}: {}", base, e))?;

    let status = response.status();
    let body: serde_json::Value = response.json().await?;

    if !status.is_success() {
        let message = body["error"]["message"].as_str().unwrap_or("unknown error");
        anyhow::bail!("Request failed ({}): {}", status, message);
    }

    Ok(body)
}
