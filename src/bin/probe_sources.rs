//! Fetch every enabled source once and print what it would report.
//! No dedup, no notifications. Usage: `probe_sources [config path]`.

use std::path::PathBuf;

use anyhow::Context;
use projects_notifier::config;
use projects_notifier::ingest::providers::build_adapter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(config::config_path);
    let settings =
        config::load_from(&path).with_context(|| format!("loading config {}", path.display()))?;

    for cfg in settings.sources.iter().filter(|s| s.enabled) {
        let adapter = build_adapter(cfg, settings.main.fetch_timeout)?;
        println!("== {} ({})", cfg.site, adapter.endpoint());

        let doc = match adapter.fetch().await {
            Ok(doc) => doc,
            Err(e) => {
                println!("   fetch failed: {e}");
                continue;
            }
        };
        match adapter.parse(&doc) {
            Ok(listings) => {
                println!("   {} relevant listings", listings.len());
                for l in listings {
                    println!("\n{}\n{}", l.subject(), l.render_body());
                }
            }
            Err(e) => println!("   parse failed: {e}"),
        }
        println!();
    }

    println!("probe done");
    Ok(())
}
