// src/control/mod.rs
//! Remote pause/resume. A [`CommandSource`] is polled on its own interval and
//! flips the shared [`PauseFlag`] the collector samples at each cycle start.

pub mod imap;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, gauge};
use tracing::{debug, info, warn};

use crate::error::ControlError;

pub use self::imap::ImapCommandSource;

/// The only state shared between the collector and the control loop.
/// Not persisted: every process starts Running.
#[derive(Debug, Clone, Default)]
pub struct PauseFlag(Arc<AtomicBool>);

impl PauseFlag {
    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        let was = self.0.swap(paused, Ordering::SeqCst);
        if was != paused {
            info!(paused, "collection state changed");
        }
        gauge!("collector_paused").set(if paused { 1.0 } else { 0.0 });
    }
}

/// Literal subjects recognised as commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTokens {
    pub stop: String,
    pub start: String,
}

impl Default for CommandTokens {
    fn default() -> Self {
        Self {
            stop: "stop".to_string(),
            start: "start".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Stop,
    Start,
    /// Anything else; ignored.
    Unknown(String),
}

impl Command {
    /// Exact match on the subject (surrounding whitespace ignored).
    pub fn from_subject(subject: &str, tokens: &CommandTokens) -> Self {
        let s = subject.trim();
        if s == tokens.stop {
            Command::Stop
        } else if s == tokens.start {
            Command::Start
        } else {
            Command::Unknown(s.to_string())
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Command::Stop => "stop",
            Command::Start => "start",
            Command::Unknown(_) => "unknown",
        }
    }
}

#[async_trait]
pub trait CommandSource: Send + Sync {
    /// Commands received since the last poll, oldest first.
    async fn poll_new_commands(&self) -> Result<Vec<Command>, ControlError>;
}

/// Apply commands in order; the last recognised one wins.
pub fn apply_commands(flag: &PauseFlag, commands: &[Command]) {
    for cmd in commands {
        counter!("control_commands_total", "command" => cmd.label()).increment(1);
        match cmd {
            Command::Stop => flag.set_paused(true),
            Command::Start => flag.set_paused(false),
            Command::Unknown(subject) => debug!(%subject, "ignoring message"),
        }
    }
}

pub struct ControlLoop {
    source: Arc<dyn CommandSource>,
    pause: PauseFlag,
    interval: Duration,
}

impl ControlLoop {
    pub fn new(source: Arc<dyn CommandSource>, pause: PauseFlag, interval: Duration) -> Self {
        Self {
            source,
            pause,
            interval,
        }
    }

    /// One poll. Transient failures are logged; only a failed poll task is returned.
    pub async fn poll_once(&self) -> Result<(), ControlError> {
        debug!("checking control mailbox");
        match self.source.poll_new_commands().await {
            Ok(commands) => {
                apply_commands(&self.pause, &commands);
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(error = %e, "control poll failed; retrying next interval");
                Ok(())
            }
        }
    }

    /// Polls forever; returns only on a fatal error.
    pub async fn run(self) -> Result<(), ControlError> {
        loop {
            self.poll_once().await?;
            tokio::time::sleep(self.interval).await;
        }
    }
}
