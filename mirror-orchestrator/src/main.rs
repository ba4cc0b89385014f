use crate::config::load_orchestrator_config;
use crate::core::start_orchestrator;
use mirror_config::Environment;
use mirror_config::shared::OrchestratorConfig;
use mirror_telemetry::init_tracing;
use std::sync::Arc;
use tracing::{error, info};

mod config;
mod core;

fn main() -> anyhow::Result<()> {
    // Load orchestrator config; a missing required parameter fails here,
    // before anything touches a database.
    let orchestrator_config = load_orchestrator_config()?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;

    // Initialize Sentry before the async runtime starts
    let _sentry_guard = init_sentry(&orchestrator_config)?;

    // We start the runtime.
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(orchestrator_config))?;

    Ok(())
}

async fn async_main(orchestrator_config: OrchestratorConfig) -> anyhow::Result<()> {
    // We run the orchestrator and catch any errors.
    if let Err(err) = start_orchestrator(orchestrator_config).await {
        let error_ref: &(dyn std::error::Error + Send + Sync + 'static) = err.as_ref();
        sentry::capture_error(error_ref);
        error!("an error occurred in the orchestrator: {err}");

        return Err(err);
    }

    Ok(())
}

/// Initializes Sentry with orchestrator-specific configuration.
///
/// Initializes Sentry if a DSN is provided. Tags all errors with the
/// "orchestrator" service identifier and configures panic handling to
/// automatically capture panics.
fn init_sentry(config: &OrchestratorConfig) -> anyhow::Result<Option<sentry::ClientInitGuard>> {
    if let Some(sentry_config) = &config.sentry {
        info!("initializing sentry with supplied dsn");

        let environment = Environment::load()?;
        let guard = sentry::init(sentry::ClientOptions {
            dsn: Some(sentry_config.dsn.parse()?),
            environment: Some(environment.to_string().into()),
            integrations: vec![Arc::new(
                sentry::integrations::panic::PanicIntegration::new(),
            )],
            ..Default::default()
        });

        // Set service tag to differentiate the orchestrator from other services
        sentry::configure_scope(|scope| {
            scope.set_tag("service", "orchestrator");
        });

        return Ok(Some(guard));
    }

    info!("sentry not configured for orchestrator, skipping initialization");

    Ok(None)
}
