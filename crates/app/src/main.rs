//! recondash - trade reconciliation dashboard in your terminal

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recondash_client::{ApiClient, EmailNotification, TicketPriority, UploadKind};
use recondash_state::{AppStore, StoreSnapshot};
use tokio::sync::{watch, Mutex};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod output;

use commands::{analysis, process, remote, table};
use config::AppConfig;

pub struct AppState {
    pub config: AppConfig,
    pub client: ApiClient,
    pub store: AppStore,
}

pub type SharedState = Arc<Mutex<AppState>>;

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = ApiClient::new(&config.api_base_url, config.request_timeout())
            .context("Failed to build HTTP client")?
            .with_openai_key(config.openai_key.clone());
        Ok(Self {
            config,
            client,
            store: AppStore::new(),
        })
    }
}

/// recondash - upload, browse and analyse reconciliation data
#[derive(Parser)]
#[command(name = "recondash", version, about, long_about = None)]
struct Cli {
    /// Path to recondash.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, parse and optionally upload files one after another
    Process {
        /// Files to process, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Upload endpoint (realtime, historical, reconciliation)
        #[arg(long, default_value = "realtime")]
        kind: UploadKind,
        /// Send each file to the backend after local validation
        #[arg(long)]
        upload: bool,
    },

    /// Browse a CSV file: search, filter, sort, paginate and export
    Table(table::TableArgs),

    /// Run anomaly detection on the backend
    Detect {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch insight buckets for the detected anomalies
    Insights {
        /// Request counter forwarded to the backend
        #[arg(long, default_value_t = 1)]
        req: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show rule suggestions for an uploaded file
    Rules {
        filename: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update fields of one row on the backend
    UpdateRow {
        /// Data set holding the row (e.g. historical)
        #[arg(long)]
        source: String,
        #[arg(long)]
        trade_id: String,
        /// Field assignment, repeatable
        #[arg(long = "set", value_name = "KEY=VALUE", required = true)]
        fields: Vec<String>,
    },

    /// Raise a ticket for an anomaly
    Ticket {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "medium")]
        priority: TicketPriority,
        #[arg(long)]
        anomaly_id: Option<String>,
    },

    /// Send an email notification through the backend
    Notify {
        #[arg(long)]
        to: String,
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "")]
        body: String,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Logs every published store snapshot.
fn spawn_store_logger(mut rx: watch::Receiver<StoreSnapshot>) {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snap = rx.borrow_and_update();
            tracing::debug!(
                version = snap.version,
                anomalies = snap.stats.total_anomalies,
                impact = %snap.stats.total_impact,
                resolved = snap.stats.resolved_count,
                total = snap.stats.total_count,
                "Store updated"
            );
        }
    });
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let per_page = config.items_per_page;
    tracing::debug!(api = %config.api_base_url, demo = config.demo_mode, "Configuration loaded");

    let state = AppState::new(config)?;
    spawn_store_logger(state.store.subscribe());
    let state: SharedState = Arc::new(Mutex::new(state));

    match cli.command {
        Commands::Process { files, kind, upload } => process::run(&state, files, kind, upload).await,
        Commands::Table(args) => table::run(args, per_page),
        Commands::Detect { json } => analysis::run_detect(&state, json).await,
        Commands::Insights { req, json } => analysis::run_insights(&state, req, json).await,
        Commands::Rules { filename, json } => remote::run_rules(&state, &filename, json).await,
        Commands::UpdateRow { source, trade_id, fields } => {
            remote::run_update_row(&state, &source, &trade_id, &fields).await
        }
        Commands::Ticket { title, description, priority, anomaly_id } => {
            remote::run_ticket(&state, title, description, priority, anomaly_id).await
        }
        Commands::Notify { to, subject, body } => {
            let email = EmailNotification {
                recipient: to,
                subject,
                body,
            };
            remote::run_notify(&state, email).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn process_parses_kind_and_files() {
        let cli = Cli::try_parse_from(["recondash", "process", "a.csv", "b.xlsx", "--kind", "historical", "--upload"]).unwrap();
        match cli.command {
            Commands::Process { files, kind, upload } => {
                assert_eq!(files.len(), 2);
                assert_eq!(kind, UploadKind::Historical);
                assert!(upload);
            }
            _ => panic!("expected process"),
        }
    }

    #[test]
    fn update_row_requires_a_field() {
        assert!(Cli::try_parse_from(["recondash", "update-row", "--source", "s", "--trade-id", "T1"]).is_err());
    }

    #[test]
    fn ticket_priority_is_parsed() {
        let cli = Cli::try_parse_from(["recondash", "ticket", "--title", "t", "--priority", "HIGH"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Ticket { priority: TicketPriority::High, .. }
        ));
    }

    #[test]
    fn app_state_builds_client_from_config() {
        let config = AppConfig {
            api_base_url: "http://recon.local:9000/".to_string(),
            ..AppConfig::default()
        };
        let state = AppState::new(config).unwrap();
        assert_eq!(state.client.base_url(), "http://recon.local:9000");
        assert_eq!(state.store.snapshot().version, 0);
    }
}
