//! LedgerHub Server: multi-tenant ERP authentication and session core.
//!
//! Main entry point that wires all crates together and starts the server.

use tracing_subscriber::{EnvFilter, fmt};

use ledgerhub_core::config::{AppConfig, LogFormat};
use ledgerhub_core::error::AppError;
use ledgerhub_database::Database;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load `config/default.toml`, the `LEDGERHUB_ENV` overlay and
/// `LEDGERHUB__*` environment variables.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("LEDGERHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Install the global tracing subscriber. `RUST_LOG` overrides
/// `logging.level`.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .with_target(true)
            .init(),
        LogFormat::Pretty => fmt().pretty().with_env_filter(filter).with_target(true).init(),
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %config.server.bind_address(),
        "Starting LedgerHub"
    );

    let db = Database::connect(&config.database).await?;
    db.migrate().await?;

    ledgerhub_api::run_server(config, db).await
}
