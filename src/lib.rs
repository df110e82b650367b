// src/lib.rs
// Public library surface for integration tests and the probe binary.

pub mod config;
pub mod control;
pub mod error;
pub mod heartbeat;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod service;

// ---- Re-exports for stable public API ----
pub use crate::config::{Settings, SettingsSource, SourceConfig};
pub use crate::control::{Command, CommandSource, ControlLoop, PauseFlag};
pub use crate::ingest::collector::{Collector, CycleReport};
pub use crate::ingest::types::{Listing, RawDocument, SiteId, SourceAdapter};
pub use crate::notify::NotificationSink;
