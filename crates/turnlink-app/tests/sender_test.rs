//! Sender loop behavior: transmission, turn yielding and the configuration
//! commands.

use std::{fs, io, path::PathBuf, time::Duration};

use tempfile::TempDir;
use turnlink_app::{
    ConfigBridge, SessionEvent, Sender, Step, Transport, TurnSignal,
};
use turnlink_core::GameConfig;
use turnlink_harness::{
    OperatorHandle, RecordingOutput, RemoteDevice, ScriptedOperator, SimWriter, link,
};

type TestSender = Sender<ScriptedOperator, SimWriter, RecordingOutput>;

struct Fixture {
    sender: TestSender,
    operator: OperatorHandle,
    remote: RemoteDevice,
    output: RecordingOutput,
    signal: TurnSignal,
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let (transport, remote) = link(Duration::from_millis(10));
        let (_reader, writer) = transport.split();
        let (input, operator) = ScriptedOperator::new();
        let output = RecordingOutput::new();
        let signal = TurnSignal::new();
        let bridge = ConfigBridge::new(dir.path().join("config/game_config.json"), output.clone());
        let sender = Sender::new(input, writer, bridge, signal.clone(), output.clone());
        Self { sender, operator, remote, output, signal, dir }
    }

    fn saved_path(&self) -> PathBuf {
        self.dir.path().join("config/game_config.json")
    }

    fn write_file(&self, name: &str, contents: &str) -> String {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }
}

#[tokio::test]
async fn text_is_transmitted_and_turn_yielded() {
    let mut fx = Fixture::new();

    assert_eq!(fx.sender.handle_line("Hello").await, Step::Continue);

    assert_eq!(fx.remote.written()[0].bytes, b"Hello\n");
    assert!(!fx.signal.is_permitted());
}

#[tokio::test]
async fn text_is_sent_verbatim() {
    let mut fx = Fixture::new();

    fx.sender.handle_line("  spaced out  ").await;
    fx.sender.handle_line("exit now").await;

    assert_eq!(fx.remote.written()[0].bytes, b"  spaced out  \n");
    assert_eq!(fx.remote.written()[1].bytes, b"exit now\n");
}

#[tokio::test]
async fn exit_is_never_transmitted() {
    let mut fx = Fixture::new();

    assert_eq!(fx.sender.handle_line("ExIt").await, Step::Exit);

    assert!(fx.remote.written().is_empty());
    assert!(fx.signal.is_stopped());
    assert_eq!(fx.output.events(), [SessionEvent::Exiting]);
}

#[tokio::test]
async fn save_writes_file_then_transmits_line() {
    let mut fx = Fixture::new();

    fx.sender.handle_line("save 1").await;

    let saved = fs::read_to_string(fx.saved_path()).unwrap();
    assert_eq!(saved, r#"{"gameMode": 1, "player1Symbol": "X", "player2Symbol": "O"}"#);
    assert_eq!(fx.remote.written_lines(), ["save 1"]);
    assert!(fx.output.contains(|e| *e == SessionEvent::ConfigSaved { path: fx.saved_path() }));
}

#[tokio::test]
async fn save_with_invalid_mode_falls_back_to_default() {
    let mut fx = Fixture::new();

    fx.sender.handle_line("SAVE 7").await;

    let saved = GameConfig::from_json(&fs::read_to_string(fx.saved_path()).unwrap()).unwrap();
    assert_eq!(saved, GameConfig::default());
    assert_eq!(fx.remote.written_lines(), ["SAVE 7"]);
}

#[tokio::test]
async fn save_failure_still_transmits_line() {
    let mut fx = Fixture::new();
    // A directory where the file should go makes the write fail
    fs::create_dir_all(fx.saved_path()).unwrap();

    fx.sender.handle_line("save 2").await;

    assert!(fx.output.contains(|e| matches!(e, SessionEvent::SaveFailed { .. })));
    assert_eq!(fx.remote.written_lines(), ["save 2"]);
}

#[tokio::test]
async fn load_transmits_json_before_line() {
    let mut fx = Fixture::new();
    let path =
        fx.write_file("cfg.json", r#"{"gameMode":2,"player1Symbol":"A","player2Symbol":"B"}"#);
    fx.operator.type_line(path);

    assert_eq!(fx.sender.handle_line("load").await, Step::Continue);

    assert_eq!(
        fx.remote.written_lines(),
        [r#"{"gameMode": 2, "player1Symbol": "A", "player2Symbol": "B"}"#, "load"]
    );
    assert!(!fx.signal.is_permitted());

    let events = fx.output.events();
    assert_eq!(events[0], SessionEvent::PathPrompt);
    assert!(matches!(&events[1], SessionEvent::ConfigLoaded { config, .. } if config.player1_symbol == 'A'));
}

#[tokio::test]
async fn load_normalizes_compact_json() {
    let mut fx = Fixture::new();
    let path =
        fx.write_file("compact.json", r#"{"gameMode":1,"player1Symbol":"X","player2Symbol":"O"}"#);
    fx.operator.type_line(path);

    fx.sender.handle_line("load").await;

    assert_eq!(
        fx.remote.written()[0].bytes,
        b"{\"gameMode\": 1, \"player1Symbol\": \"X\", \"player2Symbol\": \"O\"}\n"
    );
}

#[tokio::test]
async fn load_of_missing_file_transmits_only_line() {
    let mut fx = Fixture::new();
    let missing = fx.dir.path().join("nope.json");
    fx.operator.type_line(missing.to_string_lossy());

    fx.sender.handle_line("Load").await;

    assert_eq!(fx.remote.written_lines(), ["Load"]);
    assert!(fx.output.contains(|e| *e == SessionEvent::ConfigNotFound { path: missing.clone() }));
}

#[tokio::test]
async fn load_of_malformed_file_transmits_only_line() {
    let mut fx = Fixture::new();
    let path = fx.write_file("bad.json", "{not json");
    fx.operator.type_line(path);

    fx.sender.handle_line("load").await;

    assert_eq!(fx.remote.written_lines(), ["load"]);
    assert!(fx.output.contains(|e| matches!(e, SessionEvent::LoadFailed { .. })));
}

#[tokio::test]
async fn load_rejects_out_of_range_mode() {
    let mut fx = Fixture::new();
    let path = fx.write_file("mode.json", r#"{"gameMode": 9}"#);
    fx.operator.type_line(path);

    fx.sender.handle_line("load").await;

    assert_eq!(fx.remote.written_lines(), ["load"]);
    assert!(fx.output.contains(|e| matches!(e, SessionEvent::LoadFailed { .. })));
}

#[tokio::test]
async fn load_fills_missing_fields_with_defaults() {
    let mut fx = Fixture::new();
    let path = fx.write_file("partial.json", r#"{"gameMode": 1}"#);
    fx.operator.type_line(path);

    fx.sender.handle_line("load").await;

    assert_eq!(
        fx.remote.written_lines()[0],
        r#"{"gameMode": 1, "player1Symbol": "X", "player2Symbol": "O"}"#
    );
}

#[tokio::test]
async fn input_closed_at_path_prompt_ends_session() {
    let Fixture { mut sender, operator, remote, signal, .. } = Fixture::new();
    drop(operator);

    assert_eq!(sender.handle_line("load").await, Step::Exit);

    assert!(signal.is_stopped());
    assert!(remote.written().is_empty());
}

#[tokio::test]
async fn write_failure_is_reported_and_loop_continues() {
    let mut fx = Fixture::new();
    fx.remote.fail_next_writes(1);

    assert_eq!(fx.sender.handle_line("lost").await, Step::Continue);
    assert!(fx.output.contains(|e| matches!(e, SessionEvent::SendFailed { .. })));
    assert!(!fx.signal.is_permitted());

    fx.signal.grant();
    fx.sender.handle_line("kept").await;
    assert_eq!(fx.remote.written_lines(), ["kept"]);
}

#[tokio::test]
async fn step_ends_on_input_eof() {
    let Fixture { mut sender, operator, signal, .. } = Fixture::new();
    drop(operator);

    assert_eq!(sender.step().await, Step::Exit);
    assert!(signal.is_stopped());
}

#[tokio::test]
async fn unreadable_input_line_is_reported_and_skipped() {
    let mut fx = Fixture::new();
    fx.operator.fail(io::ErrorKind::InvalidData);
    fx.operator.type_line("hello");

    assert_eq!(fx.sender.step().await, Step::Continue);

    assert!(fx.output.contains(|e| matches!(e, SessionEvent::InputFailed { .. })));
    assert_eq!(fx.remote.written_lines(), ["hello"]);
    assert!(!fx.signal.is_stopped());
}

#[tokio::test]
async fn unreadable_path_line_is_skipped_at_load_prompt() {
    let mut fx = Fixture::new();
    let path =
        fx.write_file("cfg.json", r#"{"gameMode":1,"player1Symbol":"X","player2Symbol":"O"}"#);
    fx.operator.fail(io::ErrorKind::InvalidData);
    fx.operator.type_line(path);

    assert_eq!(fx.sender.handle_line("load").await, Step::Continue);

    assert_eq!(fx.remote.written_lines().len(), 2);
    assert_eq!(fx.remote.written_lines()[1], "load");
}

#[tokio::test]
async fn device_line_during_path_prompt_is_not_a_reply() {
    let mut fx = Fixture::new();
    let path = fx.write_file("cfg.json", r#"{"gameMode": 1}"#);
    let (output, signal, operator) = (fx.output.clone(), fx.signal.clone(), fx.operator.clone());

    let (step, ()) = tokio::join!(fx.sender.handle_line("load"), async move {
        output.wait_for(|e| *e == SessionEvent::PathPrompt).await;
        // What the receiver does for an unsolicited device line
        signal.grant();
        operator.type_line(path);
    });

    assert_eq!(step, Step::Continue);
    assert_eq!(fx.remote.written_lines().len(), 2);
    assert!(!fx.signal.is_permitted());
}

#[tokio::test]
async fn sender_waits_for_grant_before_reading_again() {
    let fx = Fixture::new();
    fx.operator.type_line("first");
    fx.operator.type_line("second");

    let task = tokio::spawn(fx.sender.run());

    assert_eq!(fx.remote.next_line().await.as_deref(), Some("first"));
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(fx.remote.written_lines(), ["first"]);

    fx.signal.grant();
    assert_eq!(fx.remote.next_line().await.as_deref(), Some("second"));

    fx.signal.stop();
    tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
}
