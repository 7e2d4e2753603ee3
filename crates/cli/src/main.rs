//! Workbench CLI - the repair-shop desk on the command line.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! wb migrate
//!
//! # Create the first operator (prints a temporary password)
//! wb operator create -u balcao -n "Balcão" -e balcao@gfinformatica.com.br
//!
//! # Register a customer and open a work order
//! wb customer create --given-name Maria --family-name Souza --cpf 52998224725 --phone 11987654321
//! WORKBENCH_PASSWORD=... wb order create -u balcao --customer 1 --fault "Não liga"
//!
//! # Move it along and print it
//! wb order status OS0001 in-progress --note "Fonte queimada"
//! wb order print OS0001
//! ```
//!
//! # Commands
//!
//! - `migrate` - Apply database migrations
//! - `check` - Verify database connectivity
//! - `operator` - Manage operator accounts
//! - `customer` - Customer directory
//! - `order` - Work orders and printable documents

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

use workbench_desk::{DeskConfig, DeskError, LogFormat, LoggingConfig};

mod commands;
mod output;

use commands::{customer::CustomerAction, operator::OperatorAction, order::OrderAction};

#[derive(Parser)]
#[command(name = "wb")]
#[command(author, version, about = "Workbench repair-shop desk")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// Verify database connectivity
    Check,
    /// Manage operator accounts
    Operator {
        #[command(subcommand)]
        action: OperatorAction,
    },
    /// Customer directory
    Customer {
        #[command(subcommand)]
        action: CustomerAction,
    },
    /// Work orders and printable documents
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

/// Initialize Sentry error tracking.
fn init_sentry(config: &DeskConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Filter used when `RUST_LOG` is unset. Binary events carry the `wb` target.
const DEFAULT_LOG_FILTER: &str = concat!(env!("CARGO_CRATE_NAME"), "=info,workbench_desk=info");

/// Daily-rolling JSON log file under `dir`. Buffered lines are written when
/// the guard drops.
fn file_layer<S>(dir: &Path) -> (impl Layer<S>, WorkerGuard)
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
{
    let appender = tracing_appender::rolling::daily(dir, "wb.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(writer);
    (layer, guard)
}

/// Install the tracing subscriber. The returned guard flushes the log file
/// on drop and must outlive every command.
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let is_json = logging.format == LogFormat::Json;
    let json_layer = is_json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_json).then(tracing_subscriber::fmt::layer);

    let (file, guard) = logging.directory.as_deref().map(file_layer).unzip();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(file)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match DeskConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    let _log_guard = init_tracing(&config.logging);

    // Guards drop on return and flush the log file and Sentry
    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = %e.kind(), "Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &DeskConfig) -> Result<(), DeskError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run(config).await,
        Commands::Check => commands::check::run(config).await,
        Commands::Operator { action } => commands::operator::run(config, action).await,
        Commands::Customer { action } => commands::customer::run(config, action).await,
        Commands::Order { action } => commands::order::run(config, action).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use rand::{Rng, distr::Alphanumeric};
    use tracing_subscriber::EnvFilter;

    use super::*;

    #[test]
    fn test_default_filter_covers_binary_target() {
        assert_eq!(env!("CARGO_CRATE_NAME"), "wb");
        assert!(DEFAULT_LOG_FILTER.split(',').any(|d| d == "wb=info"));
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn test_file_layer_flushes_when_guard_drops() {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        let dir = std::env::temp_dir().join(format!("wb-logs-{suffix}"));

        let (layer, guard) = file_layer(&dir);
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(kind = "not_found", "Command failed: customer 987654 not found");
        });
        drop(guard);

        let logged: String = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
            .collect();
        assert!(logged.contains("Command failed: customer 987654 not found"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
