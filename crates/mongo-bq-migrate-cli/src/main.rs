//! mongo-bq-migrate CLI - MongoDB to BigQuery collection migration.

mod server;

use clap::{Parser, Subcommand};
use mongo_bq_migrate::{Config, MigrateError, MigrationRequest, Orchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "mongo-bq-migrate")]
#[command(about = "Migrate a MongoDB collection into a BigQuery table")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file. When omitted, configuration is
    /// read from the environment (MONGODB_URI, MONGODB_DATABASE_NAME,
    /// BIGQUERY_PROJECT_ID, BIGQUERY_DATASET_ID, BATCH_INSERT_SIZE)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one migration
    Run {
        /// Source collection name
        #[arg(long)]
        collection: String,

        /// Destination table name
        #[arg(long)]
        table: String,

        /// Override the configured batch size
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Test source and destination connections
    HealthCheck,

    /// Serve migrations over HTTP (POST /migrate)
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(MigrateError::Config)?;

    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::from_env()?,
    };

    match cli.command {
        Commands::Run {
            collection,
            table,
            batch_size,
        } => {
            if let Some(size) = batch_size {
                config.migration.batch_size = size;
                config.validate()?;
            }

            let orchestrator = Orchestrator::new(config).await?;
            let result = orchestrator
                .run(MigrationRequest { collection, table })
                .await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                println!("\nMigration completed successfully.");
                println!("  Run ID: {}", result.run_id);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!("  Documents: {}", result.documents_read);
                println!("  Columns: {}", result.columns);
                println!("  Rows: {} in {} batches", result.rows_loaded, result.batches);
            }
        }

        Commands::HealthCheck => {
            let orchestrator = Orchestrator::new(config).await?;
            let result = orchestrator.health_check().await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (MongoDB): {}",
                    if result.source_connected { "OK" } else { "FAILED" }
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target (BigQuery): {}",
                    if result.target_connected { "OK" } else { "FAILED" }
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
            }

            if !result.is_healthy() {
                return Err(MigrateError::Config(
                    "one or more connections failed".to_string(),
                ));
            }
        }

        Commands::Serve { port } => {
            server::serve(config, port).await?;
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
