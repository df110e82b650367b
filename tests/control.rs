// tests/control.rs
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use projects_notifier::config::MailSettings;
use projects_notifier::control::{CommandTokens, ImapCommandSource};
use projects_notifier::error::ControlError;
use projects_notifier::{Command, CommandSource, ControlLoop, PauseFlag};

/// Hands out one scripted batch per poll.
struct ScriptedMailbox {
    batches: Mutex<VecDeque<Result<Vec<Command>, ControlError>>>,
}

impl ScriptedMailbox {
    fn new(batches: Vec<Result<Vec<Command>, ControlError>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
        }
    }
}

#[async_trait]
impl CommandSource for ScriptedMailbox {
    async fn poll_new_commands(&self) -> Result<Vec<Command>, ControlError> {
        self.batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

fn subjects(list: &[&str]) -> Vec<Command> {
    let tokens = CommandTokens::default();
    list.iter()
        .map(|s| Command::from_subject(s, &tokens))
        .collect()
}

fn control(batches: Vec<Result<Vec<Command>, ControlError>>, pause: &PauseFlag) -> ControlLoop {
    ControlLoop::new(
        Arc::new(ScriptedMailbox::new(batches)),
        pause.clone(),
        Duration::from_secs(300),
    )
}

#[tokio::test]
async fn stop_then_start_round_trip() {
    let pause = PauseFlag::default();
    let ctl = control(
        vec![Ok(subjects(&["stop"])), Ok(Vec::new()), Ok(subjects(&["start"]))],
        &pause,
    );

    assert!(!pause.is_paused());
    ctl.poll_once().await.unwrap();
    assert!(pause.is_paused());
    // nothing new keeps the current state
    ctl.poll_once().await.unwrap();
    assert!(pause.is_paused());
    ctl.poll_once().await.unwrap();
    assert!(!pause.is_paused());
}

#[tokio::test]
async fn other_subjects_are_ignored() {
    let pause = PauseFlag::default();
    let ctl = control(vec![Ok(subjects(&["Re: invoice", "STOP", "stop now"]))], &pause);
    ctl.poll_once().await.unwrap();
    assert!(!pause.is_paused());
}

#[tokio::test]
async fn last_command_in_a_batch_wins() {
    let pause = PauseFlag::default();
    let ctl = control(
        vec![
            Ok(subjects(&["start", "stop", "hello"])),
            Ok(subjects(&["stop", "start"])),
        ],
        &pause,
    );
    ctl.poll_once().await.unwrap();
    assert!(pause.is_paused());
    ctl.poll_once().await.unwrap();
    assert!(!pause.is_paused());
}

#[tokio::test]
async fn transient_errors_keep_the_state_and_the_loop() {
    let pause = PauseFlag::default();
    pause.set_paused(true);
    let ctl = control(
        vec![
            Err(ControlError::Timeout(Duration::from_secs(60))),
            Ok(subjects(&["start"])),
        ],
        &pause,
    );
    assert!(ctl.poll_once().await.is_ok());
    assert!(pause.is_paused());
    ctl.poll_once().await.unwrap();
    assert!(!pause.is_paused());
}

#[tokio::test]
async fn crashed_poll_task_is_fatal() {
    let join_err = tokio::spawn(async { panic!("mailbox worker") })
        .await
        .unwrap_err();
    let pause = PauseFlag::default();
    let ctl = control(vec![Err(ControlError::Task(join_err))], &pause);

    let err = ctl.run().await.unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn custom_tokens_are_literal() {
    let tokens = CommandTokens {
        stop: "pmstop".into(),
        start: "pmstart".into(),
    };
    assert_eq!(Command::from_subject("pmstop", &tokens), Command::Stop);
    assert_eq!(Command::from_subject("pmstart", &tokens), Command::Start);
    assert_eq!(
        Command::from_subject("stop", &tokens),
        Command::Unknown("stop".into())
    );
}

#[tokio::test]
async fn silent_mailbox_server_times_out_without_ending_the_loop() {
    // accepts the connection but never sends a greeting
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = std::thread::spawn(move || {
        let (socket, _) = listener.accept().unwrap();
        std::thread::sleep(Duration::from_secs(3));
        drop(socket);
    });

    let mail = MailSettings {
        imap_host: "127.0.0.1".into(),
        imap_port: port,
        ..MailSettings::default()
    };
    let source = ImapCommandSource::new(&mail, CommandTokens::default())
        .with_io_timeout(Duration::from_millis(200));

    let started = std::time::Instant::now();
    let err = source.poll_new_commands().await.unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(!err.is_fatal());

    server.join().unwrap();
}
