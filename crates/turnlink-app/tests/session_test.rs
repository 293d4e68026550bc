//! End-to-end sessions over the simulated link.
//!
//! # Oracle Pattern
//!
//! Each test ends by checking what crossed the wire, what the operator saw
//! and that the transport was closed exactly once.

use std::{fs, future, io, time::Duration};

use tokio::sync::oneshot;

use turnlink_app::{Session, SessionConfig, SessionEnd, SessionEvent};
use turnlink_harness::{RecordingOutput, RemoteDevice, ScriptedOperator, SimTransport, link};

const WINDOW: Duration = Duration::from_millis(10);
const DEADLINE: Duration = Duration::from_secs(5);

fn session() -> (Session<SimTransport, RecordingOutput>, RemoteDevice, RecordingOutput, tempfile::TempDir)
{
    let dir = tempfile::tempdir().unwrap();
    let (transport, remote) = link(WINDOW);
    let output = RecordingOutput::new();
    let config = SessionConfig { config_path: dir.path().join("game_config.json") };
    (Session::new(transport, output.clone(), config), remote, output, dir)
}

fn echo(remote: &RemoteDevice) {
    remote.respond_with(|line| Some(format!("ack {line}")));
}

#[tokio::test]
async fn conversation_alternates_turns() {
    let (session, remote, output, _dir) = session();
    echo(&remote);

    let input = ScriptedOperator::from_lines(["hello", "world"]);
    let end = tokio::time::timeout(DEADLINE, session.run(input, future::pending()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(end, SessionEnd::Exited);
    assert_eq!(remote.written_lines(), ["hello", "world"]);
    assert_eq!(output.received(), ["ack hello", "ack world"]);
    assert_eq!(output.events().last(), Some(&SessionEvent::Closing));
    assert_eq!(remote.close_count(), 1);
}

#[tokio::test]
async fn every_write_happens_while_operator_holds_turn() {
    let (session, remote, _output, dir) = session();
    remote.attach_probe(session.signal());
    echo(&remote);

    let saved = dir.path().join("game_config.json").to_string_lossy().into_owned();
    let input = ScriptedOperator::from_lines(["one", "save 2", "load", saved.as_str(), "two"]);
    tokio::time::timeout(DEADLINE, session.run(input, future::pending()))
        .await
        .unwrap()
        .unwrap();

    let written = remote.written();
    assert_eq!(written.len(), 5);
    assert!(written.iter().all(|w| w.permitted == Some(true)));
    assert_eq!(
        remote.written_lines(),
        [
            "one",
            "save 2",
            r#"{"gameMode": 2, "player1Symbol": "X", "player2Symbol": "O"}"#,
            "load",
            "two",
        ]
    );
}

#[tokio::test]
async fn exit_ends_session_without_transmitting() {
    let (session, remote, output, _dir) = session();
    echo(&remote);

    let input = ScriptedOperator::from_lines(["hi", "exit", "never sent"]);
    let end = tokio::time::timeout(DEADLINE, session.run(input, future::pending()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(end, SessionEnd::Exited);
    assert_eq!(remote.written_lines(), ["hi"]);
    assert!(output.contains(|e| *e == SessionEvent::Exiting));
    assert_eq!(remote.close_count(), 1);
}

#[tokio::test]
async fn silent_remote_holds_operator_back() {
    let (session, remote, output, _dir) = session();

    let input = ScriptedOperator::from_lines(["first", "second"]);
    let shutdown = tokio::time::sleep(Duration::from_millis(100));
    let end = tokio::time::timeout(DEADLINE, session.run(input, shutdown))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(end, SessionEnd::Interrupted);
    assert_eq!(remote.written_lines(), ["first"]);
    assert!(output.contains(|e| *e == SessionEvent::Interrupted));
    assert_eq!(remote.close_count(), 1);
}

#[tokio::test]
async fn interruption_while_waiting_for_input() {
    let (session, remote, output, _dir) = session();

    let (input, _operator) = ScriptedOperator::new();
    let shutdown = tokio::time::sleep(Duration::from_millis(50));
    let end = tokio::time::timeout(DEADLINE, session.run(input, shutdown))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(end, SessionEnd::Interrupted);
    assert!(remote.written().is_empty());
    let events = output.events();
    assert_eq!(events, [SessionEvent::Interrupted, SessionEvent::Closing]);
    assert_eq!(remote.close_count(), 1);
}

#[tokio::test]
async fn unsolicited_lines_are_shown() {
    let (session, remote, output, _dir) = session();

    remote.send_line("boot banner");
    remote.send_line("");
    remote.send_line("ready");

    let (input, operator) = ScriptedOperator::new();
    let run = tokio::spawn(async move {
        session.run(input, future::pending()).await
    });

    tokio::time::timeout(DEADLINE, output.wait_for(|e| *e == SessionEvent::Received("ready".into())))
        .await
        .unwrap();
    assert_eq!(output.received(), ["boot banner", "ready"]);

    operator.type_line("exit");
    let end = tokio::time::timeout(DEADLINE, run).await.unwrap().unwrap().unwrap();
    assert_eq!(end, SessionEnd::Exited);
    assert_eq!(remote.close_count(), 1);
}

#[tokio::test]
async fn link_faults_do_not_end_session() {
    let (session, remote, output, _dir) = session();
    remote.fail_next_writes(1);
    remote.inject_read_fault(io::ErrorKind::Other);
    echo(&remote);

    // The failed write gets no answer, so an unsolicited line hands the turn
    // back for the second message.
    let (input, operator) = ScriptedOperator::new();
    operator.type_line("dropped");
    let run = tokio::spawn(async move { session.run(input, future::pending()).await });

    tokio::time::timeout(DEADLINE, output.wait_for(|e| matches!(e, SessionEvent::SendFailed { .. })))
        .await
        .unwrap();
    remote.send_line("nudge");
    operator.type_line("delivered");
    tokio::time::timeout(
        DEADLINE,
        output.wait_for(|e| *e == SessionEvent::Received("ack delivered".into())),
    )
    .await
    .unwrap();
    drop(operator);

    let end = tokio::time::timeout(DEADLINE, run).await.unwrap().unwrap().unwrap();
    assert_eq!(end, SessionEnd::Exited);
    assert_eq!(remote.written_lines(), ["delivered"]);
    assert!(output.contains(|e| matches!(e, SessionEvent::ReceiveFailed { .. })));
}

#[tokio::test]
async fn device_line_during_load_prompt_does_not_release_turn() {
    let (session, remote, output, dir) = session();
    let path = dir.path().join("cfg.json");
    fs::write(&path, r#"{"gameMode": 1}"#).unwrap();
    let signal = session.signal();

    let (input, operator) = ScriptedOperator::new();
    let (stop, stopped) = oneshot::channel::<()>();
    let run = tokio::spawn(session.run(input, async move {
        let _ = stopped.await;
    }));

    operator.type_line("load");
    tokio::time::timeout(DEADLINE, output.wait_for(|e| *e == SessionEvent::PathPrompt))
        .await
        .unwrap();
    remote.send_line("unsolicited");
    tokio::time::timeout(
        DEADLINE,
        output.wait_for(|e| *e == SessionEvent::Received("unsolicited".into())),
    )
    .await
    .unwrap();

    operator.type_line(path.to_string_lossy());
    operator.type_line("second");
    tokio::time::timeout(DEADLINE, remote.next_line()).await.unwrap();
    let last = tokio::time::timeout(DEADLINE, remote.next_line()).await.unwrap();
    assert_eq!(last.as_deref(), Some("load"));

    // The device never answered, so `second` must stay queued
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!signal.is_permitted());
    assert_eq!(
        remote.written_lines(),
        [r#"{"gameMode": 1, "player1Symbol": "X", "player2Symbol": "O"}"#, "load"]
    );

    stop.send(()).unwrap();
    let end = tokio::time::timeout(DEADLINE, run).await.unwrap().unwrap().unwrap();
    assert_eq!(end, SessionEnd::Interrupted);
}

#[tokio::test]
async fn unreadable_input_does_not_end_session() {
    let (session, remote, output, _dir) = session();
    echo(&remote);

    let (input, operator) = ScriptedOperator::new();
    operator.fail(io::ErrorKind::InvalidData);
    operator.type_line("hello");
    drop(operator);

    let end = tokio::time::timeout(DEADLINE, session.run(input, future::pending()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(end, SessionEnd::Exited);
    assert_eq!(remote.written_lines(), ["hello"]);
    assert!(output.contains(|e| matches!(e, SessionEvent::InputFailed { .. })));
    assert_eq!(output.received(), ["ack hello"]);
}
