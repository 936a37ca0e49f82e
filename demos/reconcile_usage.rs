//! Embedding example for rrsync-core
//!
//! Loads a reconcile plan from JSON, connects to the configured server and
//! brings every declared record set in line with it.
//!
//! Environment:
//! - `RRSYNC_CONFIG`: path to the JSON plan (required)
//! - `RRSYNC_LOG_LEVEL`: trace, debug, info, warn or error (default: info)
//! - `RRSYNC_DRY_RUN`: when set to `1`, print planned transactions instead
//!   of sending them
//!
//! ```json
//! {
//!   "client": { "server": "127.0.0.1", "port": 53 },
//!   "record_sets": [
//!     { "zone": "example.com.", "name": "www", "type": "A",
//!       "ttl": 300, "values": ["192.0.2.1", "192.0.2.2"] }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use rrsync_client_net::NetworkClient;
use rrsync_core::{ApplyOutcome, ReconcileConfig, RecordSet, RecordSetEngine, RecordSetState};
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Process exit codes
#[repr(u8)]
enum ReconcileExitCode {
    /// Every record set is in sync
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// At least one record set failed to reconcile
    ReconcileError = 2,
}

impl From<ReconcileExitCode> for ExitCode {
    fn from(code: ReconcileExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn log_level() -> Level {
    match env::var("RRSYNC_LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn load_config() -> Result<ReconcileConfig> {
    let path = env::var("RRSYNC_CONFIG").context("RRSYNC_CONFIG is not set")?;
    let json = std::fs::read_to_string(&path).with_context(|| format!("cannot read {path}"))?;
    let config = ReconcileConfig::from_json(&json).with_context(|| format!("invalid plan in {path}"))?;
    Ok(config)
}

fn main() -> ExitCode {
    let subscriber = FmtSubscriber::builder().with_max_level(log_level()).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ReconcileExitCode::ConfigError.into();
    }

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return ReconcileExitCode::ConfigError.into();
        }
    };
    let dry_run = env::var("RRSYNC_DRY_RUN").is_ok_and(|v| v == "1");

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ReconcileExitCode::ConfigError.into();
        }
    };

    match rt.block_on(run(config, dry_run)) {
        Ok(0) => ReconcileExitCode::Success.into(),
        Ok(failures) => {
            warn!("{} record set(s) failed to reconcile", failures);
            ReconcileExitCode::ReconcileError.into()
        }
        Err(e) => {
            error!("Startup failed: {:#}", e);
            ReconcileExitCode::ConfigError.into()
        }
    }
}

/// Reconcile every declared record set; returns the number of failures
async fn run(config: ReconcileConfig, dry_run: bool) -> Result<usize> {
    let client = NetworkClient::new(&config.client).context("cannot build DNS client")?;
    info!(server = %client.endpoint(), record_sets = config.record_sets.len(), "starting reconcile");
    let engine = RecordSetEngine::new(Box::new(client));

    let mut failures = 0;
    for declared in &config.record_sets {
        let desired = declared.desired()?;
        match reconcile(&engine, &desired, dry_run).await {
            Ok(outcome) => info!(fqdn = %desired.key.fqdn(), kind = %desired.kind, ?outcome, "reconciled"),
            Err(e) => {
                // Rendering (including the rejected transaction) happens here
                error!(fqdn = %desired.key.fqdn(), kind = %desired.kind, "{}", e);
                failures += 1;
            }
        }
    }
    Ok(failures)
}

async fn reconcile(
    engine: &RecordSetEngine,
    desired: &RecordSet,
    dry_run: bool,
) -> rrsync_core::Result<ApplyOutcome> {
    let mut state = RecordSetState::new();
    let observed = engine.refresh(&mut state, &desired.key, desired.kind).await?;

    if dry_run {
        let transaction = engine.plan(desired, observed.as_ref())?;
        if !transaction.is_empty() {
            println!("{transaction}\n");
        }
        return Ok(ApplyOutcome::Unchanged);
    }

    match observed {
        None if desired.is_empty() => Ok(ApplyOutcome::Unchanged),
        None => engine.create(&mut state, desired).await,
        Some(_) => {
            state.id = Some(desired.key.identity());
            engine.update(&mut state, desired).await
        }
    }
}
