// src/control/imap.rs
//! Mailbox-backed command source: unseen message subjects are commands.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use async_trait::async_trait;

use super::{Command, CommandSource, CommandTokens};
use crate::config::MailSettings;
use crate::error::ControlError;

const POLL_TIMEOUT: Duration = Duration::from_secs(60);
/// Socket bounds. A connect plus one stalled read stays under `POLL_TIMEOUT`.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const IO_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ImapCommandSource {
    host: String,
    port: u16,
    login: String,
    pass: String,
    tokens: CommandTokens,
    io_timeout: Duration,
}

impl ImapCommandSource {
    pub fn new(mail: &MailSettings, tokens: CommandTokens) -> Self {
        Self {
            host: mail.imap_host.clone(),
            port: mail.imap_port,
            login: mail.login.clone(),
            pass: mail.pass.clone(),
            tokens,
            io_timeout: IO_TIMEOUT,
        }
    }

    /// Read/write bound of the mailbox socket (default 30 s).
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Plain TCP connection with connect, read and write bounds set.
    fn connect(&self) -> io::Result<TcpStream> {
        let mut last_err = None;
        for addr in (self.host.as_str(), self.port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.io_timeout))?;
                    stream.set_write_timeout(Some(self.io_timeout))?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no address for {}", self.host))
        }))
    }

    /// STARTTLS, login, read-only EXAMINE of INBOX, subjects of UNSEEN messages by UID.
    fn poll_blocking(&self) -> Result<Vec<Command>, ControlError> {
        let tls = native_tls::TlsConnector::builder().build()?;
        let mut plain = ::imap::Client::new(self.connect()?);
        plain.read_greeting()?;
        // the TLS stream wraps the same socket, so the timeouts carry over
        let client = plain.secure(&self.host, &tls)?;
        let mut session = client
            .login(&self.login, &self.pass)
            .map_err(|(e, _client)| ControlError::Imap(e))?;

        session.examine("INBOX")?;
        let mut uids: Vec<u32> = session.uid_search("UNSEEN")?.into_iter().collect();
        uids.sort_unstable();

        let mut commands = Vec::with_capacity(uids.len());
        if !uids.is_empty() {
            let uid_set = uids
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",");
            let fetches = session.uid_fetch(&uid_set, "ENVELOPE")?;

            let mut subjects: Vec<(u32, String)> = fetches
                .iter()
                .map(|f| {
                    let subject = f
                        .envelope()
                        .and_then(|env| env.subject)
                        .map(|s| String::from_utf8_lossy(s).into_owned())
                        .unwrap_or_default();
                    (f.uid.unwrap_or_default(), subject)
                })
                .collect();
            subjects.sort_by_key(|(uid, _)| *uid);

            commands.extend(
                subjects
                    .iter()
                    .map(|(_, s)| Command::from_subject(s, &self.tokens)),
            );
        }

        if let Err(e) = session.logout() {
            tracing::debug!(error = %e, "imap logout failed");
        }
        Ok(commands)
    }
}

#[async_trait]
impl CommandSource for ImapCommandSource {
    async fn poll_new_commands(&self) -> Result<Vec<Command>, ControlError> {
        let this = self.clone();
        let task = tokio::task::spawn_blocking(move || this.poll_blocking());
        match tokio::time::timeout(POLL_TIMEOUT, task).await {
            Ok(joined) => joined?,
            Err(_) => Err(ControlError::Timeout(POLL_TIMEOUT)),
        }
    }
}
