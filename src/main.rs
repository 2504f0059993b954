use std::path::Path;

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vecdoc::cli::{load_batch, parse_filter, parse_vector, Commands, ConfigOverrides};
use vecdoc::connector::http_store;

#[derive(Parser)]
#[command(name = "vecdoc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    config: ConfigOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.resolve_from_env()?;
    info!(
        "Using index {} ({} dimensions) at {}",
        config.index_name(),
        config.num_dimensions(),
        config.connection().server_url
    );
    let store = http_store(config)?;

    match cli.command {
        Commands::EnsureIndex => {
            store.ensure_index().await?;
            info!("Index {} is ready", store.config().index_name());
        }

        Commands::DeleteIndex => {
            store.delete_index().await?;
        }

        Commands::Add { file } => {
            let batch = load_batch(Path::new(&file))?;
            store
                .add_documents_with_vectors(&batch.ids, &batch.embeddings, &batch.documents)
                .await?;
            info!("Added {} documents", batch.len());
            println!("{}", serde_json::to_string_pretty(&batch.ids)?);
        }

        Commands::Delete { ids } => {
            store.delete_documents(&ids).await?;
            info!("Deleted {} documents", ids.len());
        }

        Commands::DeleteWhere { filter } => {
            store
                .delete_documents_by_filter(&parse_filter(&filter)?)
                .await?;
        }

        Commands::Get { ids } => {
            let records = store.get_documents(&ids).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }

        Commands::Search {
            vector,
            k,
            filter,
            scores,
        } => {
            let query = parse_vector(&vector)?;
            let filter = filter.as_deref().map(parse_filter).transpose()?;

            if scores {
                let results = store
                    .similarity_search_vector_with_score(&query, k, filter)
                    .await?;
                let rows: Vec<_> = results
                    .into_iter()
                    .map(|(document, score)| json!({"document": document, "score": score}))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                let documents = store.similarity_search_vector(&query, k, filter).await?;
                println!("{}", serde_json::to_string_pretty(&documents)?);
            }
        }
    }

    Ok(())
}
