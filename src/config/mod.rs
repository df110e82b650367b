// src/config/mod.rs
//! Settings loader. The collector reloads these at the start of every cycle,
//! so source enablement can be edited without a restart.

pub mod sources;

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use serde::Deserialize;

use crate::control::CommandTokens;
use crate::error::ConfigError;
pub use sources::{Criteria, SourceConfig};

// --- env defaults & names ---
pub const DEFAULT_CONFIG_PATH: &str = "config/projects_notif.toml";
pub const ENV_CONFIG_PATH: &str = "PROJECTS_NOTIF_CONFIG";
pub const ENV_MAIL_PASS: &str = "PROJECTS_NOTIF_MAIL_PASS";

fn default_fetch_timeout() -> u64 {
    30
}
fn default_pause_check() -> u64 {
    60
}
fn default_smtp_port() -> u16 {
    587
}
fn default_imap_port() -> u16 {
    143
}
fn default_send_delay_ms() -> u64 {
    1000
}
fn default_control_interval() -> u64 {
    300
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub main: MainSettings,
    pub mail: MailSettings,
    pub control: ControlSettings,
    pub metrics: MetricsSettings,
    /// Config file order = collection order.
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MainSettings {
    pub sleep_time: Duration,
    pub hello_time: Option<NaiveTime>,
    pub fetch_timeout: Duration,
    pub pause_check: Duration,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MailSettings {
    pub enabled: bool,
    pub login: String,
    pub pass: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub imap_host: String,
    pub imap_port: u16,
    pub to: String,
    pub send_delay: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlSettings {
    pub enabled: bool,
    pub interval: Duration,
    pub tokens: CommandTokens,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MetricsSettings {
    pub listen: Option<SocketAddr>,
}

/* ----------------------------
Raw TOML schema
---------------------------- */

#[derive(Debug, Deserialize)]
struct RawSettings {
    main: RawMain,
    #[serde(default)]
    mail: Option<RawMail>,
    #[serde(default)]
    control: RawControl,
    #[serde(default)]
    metrics: MetricsSettings,
    #[serde(default)]
    sources: Vec<sources::SourceEntry>,
}

#[derive(Debug, Deserialize)]
struct RawMain {
    sleep_time: u64,
    #[serde(default)]
    hello_time: Option<String>,
    #[serde(default = "default_fetch_timeout")]
    fetch_timeout: u64,
    #[serde(default = "default_pause_check")]
    pause_check: u64,
}

#[derive(Debug, Deserialize)]
struct RawMail {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    login: String,
    #[serde(default)]
    pass: String,
    #[serde(default)]
    smtp_host: String,
    #[serde(default = "default_smtp_port")]
    smtp_port: u16,
    #[serde(default)]
    imap_host: String,
    #[serde(default = "default_imap_port")]
    imap_port: u16,
    #[serde(default)]
    to: Option<String>,
    #[serde(default = "default_send_delay_ms")]
    send_delay_ms: u64,
}

#[derive(Debug, Deserialize)]
struct RawControl {
    enabled: Option<bool>,
    #[serde(default = "default_control_interval")]
    interval: u64,
    stop_command: Option<String>,
    start_command: Option<String>,
}

impl Default for RawControl {
    fn default() -> Self {
        Self {
            enabled: None,
            interval: default_control_interval(),
            stop_command: None,
            start_command: None,
        }
    }
}

pub(crate) fn default_true() -> bool {
    true
}

/* ----------------------------
Loading
---------------------------- */

/// `$PROJECTS_NOTIF_CONFIG`, else `config/projects_notif.toml`.
pub fn config_path() -> PathBuf {
    std::env::var(ENV_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    from_toml_str(&content)
}

pub fn from_toml_str(s: &str) -> Result<Settings, ConfigError> {
    let raw: RawSettings = toml::from_str(s)?;

    let hello_time = raw
        .main
        .hello_time
        .as_deref()
        .map(parse_hello_time)
        .transpose()?;
    let main = MainSettings {
        sleep_time: Duration::from_secs(raw.main.sleep_time.max(1)),
        hello_time,
        fetch_timeout: Duration::from_secs(raw.main.fetch_timeout.max(1)),
        pause_check: Duration::from_secs(raw.main.pause_check.max(1)),
    };

    let mail = match raw.mail {
        Some(m) => resolve_mail(m)?,
        None => MailSettings::default(),
    };

    let defaults = CommandTokens::default();
    let control = ControlSettings {
        enabled: raw.control.enabled.unwrap_or(mail.enabled),
        interval: Duration::from_secs(raw.control.interval.max(1)),
        tokens: CommandTokens {
            stop: raw.control.stop_command.unwrap_or(defaults.stop),
            start: raw.control.start_command.unwrap_or(defaults.start),
        },
    };
    if control.enabled && mail.imap_host.is_empty() {
        return Err(ConfigError::MissingField {
            section: "mail",
            field: "imap_host",
        });
    }

    let sources = raw
        .sources
        .into_iter()
        .map(SourceConfig::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Settings {
        main,
        mail,
        control,
        metrics: raw.metrics,
        sources,
    })
}

fn parse_hello_time(s: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| ConfigError::InvalidHelloTime(s.to_string()))
}

fn resolve_mail(m: RawMail) -> Result<MailSettings, ConfigError> {
    if m.enabled {
        for (field, value) in [("login", &m.login), ("smtp_host", &m.smtp_host)] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    section: "mail",
                    field,
                });
            }
        }
    }

    // "ENV" means: read the password from PROJECTS_NOTIF_MAIL_PASS
    let pass = if m.pass.trim().eq_ignore_ascii_case("env") {
        std::env::var(ENV_MAIL_PASS).map_err(|_| ConfigError::MissingEnv(ENV_MAIL_PASS))?
    } else {
        m.pass
    };

    let to = m.to.unwrap_or_else(|| m.login.clone());
    Ok(MailSettings {
        enabled: m.enabled,
        login: m.login,
        pass,
        smtp_host: m.smtp_host,
        smtp_port: m.smtp_port,
        imap_host: m.imap_host,
        imap_port: m.imap_port,
        to,
        send_delay: Duration::from_millis(m.send_delay_ms),
    })
}

/// Where the collector gets its settings on every reload.
pub trait SettingsSource: Send + Sync {
    fn load(&self) -> Result<Settings, ConfigError>;
}

/// Reads the TOML file from disk on every call.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsSource for FileSettings {
    fn load(&self) -> Result<Settings, ConfigError> {
        tracing::debug!(path = %self.path.display(), "reading config");
        load_from(&self.path)
    }
}

/// A fixed value loads itself.
impl SettingsSource for Settings {
    fn load(&self) -> Result<Settings, ConfigError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[main]
sleep_time = 120
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let s = from_toml_str(MINIMAL).unwrap();
        assert_eq!(s.main.sleep_time, Duration::from_secs(120));
        assert_eq!(s.main.fetch_timeout, Duration::from_secs(30));
        assert_eq!(s.main.hello_time, None);
        assert!(!s.mail.enabled);
        assert!(!s.control.enabled);
        assert_eq!(s.control.interval, Duration::from_secs(300));
        assert_eq!(s.control.tokens, CommandTokens::default());
        assert!(s.sources.is_empty());
    }

    #[test]
    fn zero_intervals_are_clamped() {
        let s = from_toml_str("[main]\nsleep_time = 0\npause_check = 0\n").unwrap();
        assert_eq!(s.main.sleep_time, Duration::from_secs(1));
        assert_eq!(s.main.pause_check, Duration::from_secs(1));
    }

    #[test]
    fn hello_time_must_be_hh_mm() {
        let bad = "[main]\nsleep_time = 1\nhello_time = \"9 o'clock\"\n";
        assert!(matches!(
            from_toml_str(bad),
            Err(ConfigError::InvalidHelloTime(_))
        ));
        let ok = "[main]\nsleep_time = 1\nhello_time = \"09:30\"\n";
        let s = from_toml_str(ok).unwrap();
        assert_eq!(s.main.hello_time, NaiveTime::from_hms_opt(9, 30, 0));
    }

    #[test]
    fn enabled_control_needs_imap_host() {
        let cfg = r#"
[main]
sleep_time = 1

[mail]
login = "me@example.test"
pass = "x"
smtp_host = "smtp.example.test"
"#;
        assert!(matches!(
            from_toml_str(cfg),
            Err(ConfigError::MissingField {
                field: "imap_host",
                ..
            })
        ));
    }
}
