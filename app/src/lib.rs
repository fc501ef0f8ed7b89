//! Tasklink application shell
//!
//! Thin binary layer: parses the command line, loads configuration, installs
//! logging and drives one [`RunController`] pass. Business logic lives in the
//! `crates/` directory.

pub mod cli;
pub mod controller;
pub mod error;
pub mod logging;
pub mod output;

pub use cli::Cli;
pub use controller::{RunController, RunReport};
pub use error::{ExitStatus, RunError};

use tasklink_core::AppConfig;
use tracing::Instrument;

/// Resolve, load and validate the configuration.
pub fn load_config(cli: &Cli) -> Result<AppConfig, RunError> {
    let path = AppConfig::resolve_path(cli.config.as_deref())?;
    let config = AppConfig::load_with_env(&path)?;
    config.validate()?;
    Ok(config)
}

/// Run once and report the exit status.
pub async fn run(cli: Cli) -> ExitStatus {
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return e.exit_status();
        }
    };

    let _guard = match logging::init_tracing(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Logging setup failed: {e:#}");
            return RunError::Logging(format!("{e:#}")).exit_status();
        }
    };

    tracing::info!("Starting Tasklink v{}", env!("CARGO_PKG_VERSION"));

    let print = config.output.print_to_console && !cli.no_print;
    let controller = RunController::new(config, cli.snapshot);
    let span = controller.context().span().clone();
    let task = tokio::spawn(
        async move { controller.execute_until(interrupted()).await }.instrument(span),
    );

    let outcome = match task.await {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(RunError::Unexpected("run panicked".to_string())),
        Err(e) => Err(RunError::Unexpected(e.to_string())),
    };

    match outcome {
        Ok(report) => {
            tracing::info!(
                scraped = report.scraped,
                saved = report.persist.succeeded(),
                new = report.persist.inserted,
                "Run completed"
            );
            if print {
                output::print_tasks(&report.tasks);
            }
            ExitStatus::Success
        }
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            e.exit_status()
        }
    }
}

/// Completes on Ctrl-C. Never completes if the handler cannot be installed.
async fn interrupted() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::warn!("Interrupt received, shutting down"),
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for interrupts");
            std::future::pending::<()>().await;
        }
    }
}
