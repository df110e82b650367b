//! Projects notifier binary.
//! Runs the collector and the control-mailbox listener side by side; either one
//! failing ends the process.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use projects_notifier::config::{self, FileSettings};
use projects_notifier::control::{ControlLoop, ImapCommandSource, PauseFlag};
use projects_notifier::ingest::collector::Collector;
use projects_notifier::notify::{EmailSender, LogSink, NotificationSink};
use projects_notifier::service;

/// The control listener starts a little after the first collection.
const CONTROL_START_DELAY: Duration = Duration::from_secs(5);

/// `RUST_LOG` overrides the default filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("projects_notifier=info,warn"));

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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let path = config::config_path();
    let settings = config::load_from(&path)
        .with_context(|| format!("loading config {}", path.display()))?;
    tracing::info!(config = %path.display(), sources = settings.sources.len(), "starting projects notifier");

    projects_notifier::metrics::init(&settings.metrics)?;

    let sink: Arc<dyn NotificationSink> = if settings.mail.enabled {
        Arc::new(EmailSender::from_settings(&settings.mail).context("configuring smtp")?)
    } else {
        tracing::warn!("mail disabled; notifications go to the log");
        Arc::new(LogSink)
    };

    let pause = PauseFlag::default();
    let collector = Collector::new(Arc::new(FileSettings::new(path)), sink, pause.clone());

    let control = settings.control.enabled.then(|| {
        let source = ImapCommandSource::new(&settings.mail, settings.control.tokens.clone());
        ControlLoop::new(Arc::new(source), pause.clone(), settings.control.interval)
    });

    service::run(collector, control, CONTROL_START_DELAY).await?;
    Ok(())
}
