//! Command line front end for a catalog database.
//!
//! Usage:
//!     lingua-search seed-demo
//!     lingua-search search "bonjour" --filter level=beginner
//!     lingua-search search "français" --anonymous --json-body

use anyhow::Context;
use clap::{Parser, Subcommand};
use lingua_search::api::handle_search;
use lingua_search::config::Config;
use lingua_search::demo_data::seed_demo_catalog;
use lingua_search::logging::init_tracing;
use lingua_search::{CatalogStore, Identity, SearchApi};
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "lingua-search", version, about = "Federated search over a language-learning catalog")]
struct Cli {
    /// Catalog database (overrides configuration)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search courses, lessons, exercises and users
    Search {
        query: String,

        /// Filter as key=value (language, level, course_id, exercise_type, user_type)
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,

        /// Search as an anonymous visitor (user accounts are not searched)
        #[arg(long)]
        anonymous: bool,

        /// Go through the JSON endpoint envelope instead of the typed API
        #[arg(long)]
        json_body: bool,
    },
    /// Fill the database with the demo catalog
    SeedDemo,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected key=value, got {:?}", raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let settings = config.settings()?;
    init_tracing(&settings.log_filter);

    let database = cli.database.unwrap_or(settings.database_path);
    let store = CatalogStore::open_with_pool_size(&database, settings.pool_size)
        .with_context(|| format!("opening catalog {}", database.display()))?;

    match cli.command {
        Commands::SeedDemo => {
            let catalog = seed_demo_catalog(&store)?;
            let counts = store.catalog_counts()?;
            println!("{}", serde_json::to_string_pretty(&counts)?);
            tracing::info!(courses = catalog.courses.len(), users = catalog.users.len(), "demo catalog seeded");
        }
        Commands::Search { query, filters, anonymous, json_body } => {
            let identity = if anonymous { None } else { Some(Identity::new(Uuid::new_v4())) };
            let filters: HashMap<String, String> = filters.into_iter().collect();

            let output = if json_body {
                let body = serde_json::json!({ "query": query, "filters": filters });
                handle_search(&store, &body, identity).await
            } else {
                let response = store.search_raw(query, filters, identity).await?;
                serde_json::to_value(response)?
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
