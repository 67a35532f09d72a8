// ABOUTME: CLI entry point for table-sync
// ABOUTME: Parses commands and routes to exec/ping handlers

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use table_sync::{Config, ExecJobResult, PingOutcome, SyncError};

#[derive(Parser)]
#[command(name = "table-sync")]
#[command(about = "Sync SQL tables between databases", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the sync config file
    #[arg(
        short,
        long,
        global = true,
        env = "TABLE_SYNC_CONFIG",
        default_value = "./sync-config.toml"
    )]
    config: PathBuf,
    /// Set the log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the given sync jobs. With no job names, executes all jobs.
    Exec {
        /// Names of the jobs to execute
        jobs: Vec<String>,
    },
    /// Ping the given sync jobs to see which tables are reachable. With no
    /// job names, pings all jobs.
    Ping {
        /// Names of the jobs to ping
        jobs: Vec<String>,
        /// Timeout in seconds for pinging each table
        #[arg(short, long, default_value_t = 10)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // 1. RUST_LOG environment variable has highest precedence
    // 2. --log flag is used if RUST_LOG is not set
    // 3. Default to "info" if neither are provided
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log.clone()));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    let clean = match cli.command {
        Commands::Exec { jobs } => run_exec(&config, &jobs).await,
        Commands::Ping { jobs, timeout } => {
            run_ping(&config, &jobs, Duration::from_secs(timeout)).await
        }
    };

    if !clean {
        std::process::exit(1);
    }

    Ok(())
}

/// Execute the named jobs (or all jobs) and print a per-job summary.
/// Returns false if any job or target errored.
async fn run_exec(config: &Config, jobs: &[String]) -> bool {
    let (results, errors) = if jobs.is_empty() {
        config.exec_all_jobs().await
    } else {
        let mut results = BTreeMap::new();
        let mut errors = BTreeMap::new();

        for name in jobs {
            match config.exec_job(name).await {
                Ok(result) => {
                    results.insert(name.clone(), result);
                }
                Err(err) => {
                    errors.insert(name.clone(), err);
                }
            }
        }

        (results, errors)
    };

    let mut clean = errors.is_empty();
    let mut first = true;

    for (job_name, result) in &results {
        if !first {
            println!();
        }
        first = false;

        if !print_exec_output(job_name, result) {
            clean = false;
        }
    }

    for (job_name, err) in &errors {
        if !first {
            println!();
        }
        first = false;

        println!("{}: {}", job_name, err);
    }

    clean
}

fn print_exec_output(job_name: &str, result: &ExecJobResult) -> bool {
    println!("{}:", job_name);
    println!("  - source checksum: {}", result.checksum);

    let mut num_ok = 0;
    let mut num_changed = 0;
    let mut target_errs = Vec::new();

    for outcome in &result.outcomes {
        match &outcome.error {
            Some(err) => {
                let label = if outcome.target.label.is_empty() {
                    outcome.target.table.as_str()
                } else {
                    outcome.target.label.as_str()
                };
                target_errs.push(format!("{}: {}", label, err));
            }
            None => {
                num_ok += 1;
                if outcome.synced {
                    num_changed += 1;
                }
            }
        }
    }

    let mut summary = format!("{} ok, {} changed", num_ok, num_changed);
    if !target_errs.is_empty() {
        summary.push_str(&format!(", {} errored", target_errs.len()));
    }

    println!("  - targets: {}", summary);

    for err in &target_errs {
        println!("    - {}", err);
    }

    target_errs.is_empty()
}

/// Ping the named jobs (or all jobs) and print a per-job summary.
/// Returns false if any table errored.
async fn run_ping(config: &Config, jobs: &[String], timeout: Duration) -> bool {
    let mut clean = true;
    let mut printed: Vec<(String, Vec<PingOutcome>)> = Vec::new();
    let mut job_errors: Vec<(String, SyncError)> = Vec::new();

    if jobs.is_empty() {
        match config.ping_all_jobs(timeout).await {
            Ok(all) => printed.extend(all),
            Err(err) => {
                println!("{}", err);
                return false;
            }
        }
    } else {
        for name in jobs {
            match config.ping_job(name, timeout).await {
                Ok(outcomes) => printed.push((name.clone(), outcomes)),
                Err(err) => job_errors.push((name.clone(), err)),
            }
        }
    }

    let mut first = true;

    for (job_name, outcomes) in &printed {
        if !first {
            println!();
        }
        first = false;

        if !print_ping_output(job_name, outcomes) {
            clean = false;
        }
    }

    for (job_name, err) in &job_errors {
        if !first {
            println!();
        }
        first = false;

        println!("{}: {}", job_name, err);
        clean = false;
    }

    clean
}

fn print_ping_output(job_name: &str, outcomes: &[PingOutcome]) -> bool {
    println!("{}:", job_name);

    let mut num_ok = 0;
    let mut table_errs = Vec::new();

    for outcome in outcomes {
        match &outcome.error {
            Some(err) => table_errs.push(format!("{}: {}", outcome.label, err)),
            None => num_ok += 1,
        }
    }

    let mut summary = if num_ok == outcomes.len() {
        "all ok".to_string()
    } else {
        format!("{} ok", num_ok)
    };

    if !table_errs.is_empty() {
        summary.push_str(&format!(", {} errored", table_errs.len()));
    }

    println!("  - tables: {}", summary);

    for err in &table_errs {
        println!("    - {}", err);
    }

    table_errs.is_empty()
}
