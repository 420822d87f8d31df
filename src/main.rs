//! News Digest batch entrypoint.
//! One run: load config, fetch all sources, rank, render, e-mail, exit.
//!
//! Exit status: 0 on delivery, 2 on missing/invalid configuration, 1 on delivery failure.

use std::process::ExitCode;

use news_digest::config::{DigestConfig, Settings};
use news_digest::notify::SmtpSender;
use news_digest::pipeline::{providers_from_config, Pipeline, RunClock, RunReport};
use news_digest::RunError;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// RUST_LOG wins; otherwise `news_digest=info,warn`. LOG_FORMAT=json switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("news_digest=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

async fn run() -> Result<RunReport, RunError> {
    // Everything config-related is checked before the first request goes out.
    let settings = Settings::from_env()?;
    info!(smtp = ?settings.smtp, to = %settings.email_to, "environment OK");

    let cfg = DigestConfig::load_default().map_err(RunError::ConfigInvalid)?;
    let providers = providers_from_config(&cfg, &settings).map_err(RunError::ConfigInvalid)?;
    let sender = SmtpSender::from_settings(&settings).map_err(RunError::ConfigInvalid)?;

    let pipeline = Pipeline::new(&cfg).with_contact(settings.email_to.clone());
    pipeline.run(&providers, &sender, RunClock::system()).await
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "news digest starting");

    match run().await {
        Ok(report) => {
            info!(
                items = report.items,
                sources = report.distinct_sources,
                failed_sources = report.sources_failed,
                fallback = ?report.fallback,
                "news digest finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "news digest failed");
            ExitCode::from(e.exit_code())
        }
    }
}
