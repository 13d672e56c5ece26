//! mysql-pg-migrate CLI - one-shot MySQL to PostgreSQL data migration.

use clap::{Parser, Subcommand};
use mysql_pg_migrate::{health_check, Config, MigrateError, Orchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "mysql-pg-migrate")]
#[command(about = "One-shot MySQL to PostgreSQL data migration")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

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
    /// Clear the destination, copy every table and advance sequences
    Run {
        /// Override target schema
        #[arg(long)]
        target_schema: Option<String>,

        /// Override rows per insert batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Keep existing destination rows instead of clearing tables first
        #[arg(long)]
        no_truncate: bool,

        /// Dry run: resolve and print the table order without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Compare row counts and sizes between source and target
    Verify {
        /// Override target schema
        #[arg(long)]
        target_schema: Option<String>,
    },

    /// Test database connections
    HealthCheck,
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
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Run {
            target_schema,
            batch_size,
            no_truncate,
            dry_run,
        } => {
            if let Some(schema) = target_schema {
                config.target.schema = schema;
            }
            if let Some(size) = batch_size {
                config.migration.batch_size = size;
            }
            if no_truncate {
                config.migration.truncate_before_insert = false;
            }
            config.validate()?;

            let orchestrator = Orchestrator::new(config).await?;
            let result = orchestrator.run(dry_run).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                let status_msg = if dry_run { "Dry run completed!" } else { "Migration completed!" };
                println!("\n{}", status_msg);
                println!("  Run ID: {}", result.run_id);
                println!("  Duration: {:.2}s", result.duration_seconds);
                if dry_run {
                    for (i, table) in result.table_order.iter().enumerate() {
                        println!("  {:3}. {}", i + 1, table);
                    }
                } else {
                    println!("  Tables cleared: {}", result.tables_truncated);
                    println!(
                        "  Tables: {}/{} ({} partial, {} empty, {} failed)",
                        result.tables_success,
                        result.tables_total,
                        result.tables_partial,
                        result.tables_skipped,
                        result.tables_failed
                    );
                    println!("  Rows: {}", result.rows_transferred);
                    println!("  Throughput: {} rows/sec", result.rows_per_second);
                    println!("  Sequences updated: {}", result.sequences_updated);
                    if !result.failed_tables.is_empty() {
                        println!("  Failed tables: {:?}", result.failed_tables);
                    }
                }
            }
        }

        Commands::Verify { target_schema } => {
            if let Some(schema) = target_schema {
                config.target.schema = schema;
            }
            config.validate()?;

            let orchestrator = Orchestrator::new(config).await?;
            let report = orchestrator.verify().await;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                print!("{}", report.render());
            }

            let failures = report.failures().len();
            if failures > 0 {
                return Err(MigrateError::Verification(format!(
                    "found mismatches in {} tables",
                    failures
                )));
            }
        }

        Commands::HealthCheck => {
            let result = health_check(&config).await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (MySQL): {} ({}ms)",
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target (PostgreSQL): {} ({}ms)",
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(MigrateError::connection(
                    "Health check failed",
                    "testing database connections",
                ));
            }
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

    // stdout carries the report and JSON results
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("Invalid log format '{}'. Valid values: text, json", other)),
    }

    Ok(())
}
