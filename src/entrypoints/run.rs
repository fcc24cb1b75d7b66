use crate::app::{self, settings::Settings};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Native entry point
pub fn native_main() -> ExitCode {
    // Setup logging, stdout is reserved for output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_cli();
    tracing::info!(
        "{} {} loading {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        settings.file.display()
    );

    match app::run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
