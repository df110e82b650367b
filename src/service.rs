// src/service.rs
//! The two long-running loops of the process, joined so that the first
//! failure ends both.

use std::time::Duration;

use anyhow::Context;

use crate::control::ControlLoop;
use crate::ingest::collector::Collector;

/// Runs the collector and, when given, the control loop (started after
/// `control_delay`). Returns only with the first error of either loop.
pub async fn run(
    collector: Collector,
    control: Option<ControlLoop>,
    control_delay: Duration,
) -> anyhow::Result<()> {
    let collect = async {
        collector
            .run()
            .await
            .context("collector stopped on a configuration error")
    };

    let listen = async {
        let Some(control) = control else {
            tracing::info!("control channel disabled");
            return std::future::pending::<anyhow::Result<()>>().await;
        };
        tokio::time::sleep(control_delay).await;
        control.run().await.context("control listener failed")
    };

    // Neither loop returns Ok; the first error drops the other one.
    tokio::try_join!(collect, listen)?;
    Ok(())
}
