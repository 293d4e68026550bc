//! Terminal operator: stdin lines in, rendered events out.

use std::{
    io::{self, BufRead, Write},
    thread,
};

use tokio::sync::mpsc;
use turnlink_app::{OperatorInput, OperatorOutput, SessionEvent};

/// Lines buffered between the stdin thread and the sender loop.
const INPUT_BUFFER: usize = 16;

/// Operator input read from stdin.
///
/// Stdin is read on a dedicated thread. A blocked read there never holds up
/// runtime shutdown, unlike a read on the blocking pool.
pub struct StdinOperator {
    lines: mpsc::Receiver<io::Result<String>>,
}

impl StdinOperator {
    /// Start reading stdin.
    pub fn spawn() -> io::Result<Self> {
        let (tx, rx) = mpsc::channel(INPUT_BUFFER);
        thread::Builder::new().name("stdin".into()).spawn(move || {
            for line in io::stdin().lock().lines() {
                // Undecodable text only spoils its own line
                let fatal = line.as_ref().is_err_and(|e| e.kind() != io::ErrorKind::InvalidData);
                if tx.blocking_send(line).is_err() || fatal {
                    break;
                }
            }
            tracing::debug!("stdin reader finished");
        })?;
        Ok(Self { lines: rx })
    }
}

impl OperatorInput for StdinOperator {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.lines.recv().await.transpose()
    }
}

/// Operator output written to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOutput;

impl OperatorOutput for ConsoleOutput {
    fn notify(&self, event: SessionEvent) {
        let mut stdout = io::stdout().lock();
        if let Err(e) = stdout.write_all(render(&event).as_bytes()).and_then(|()| stdout.flush()) {
            tracing::warn!("failed to write to console: {e}");
        }
    }
}

/// Text shown to the operator for `event`.
///
/// Everything ends with a newline except the path prompt, which leaves the
/// cursor on the prompt line.
pub fn render(event: &SessionEvent) -> String {
    match event {
        SessionEvent::Received(line) => format!("{line}\n"),
        SessionEvent::PathPrompt => "Enter the path to the configuration file: ".to_string(),
        SessionEvent::ConfigSaved { path } => {
            format!("Configuration saved to {}\n", path.display())
        },
        SessionEvent::SaveFailed { reason } => format!("Error saving configuration: {reason}\n"),
        SessionEvent::ConfigLoaded { config, json } => format!(
            "Game Mode: {}\nPlayer 1 Symbol: {}\nPlayer 2 Symbol: {}\n{json}\n",
            config.game_mode, config.player1_symbol, config.player2_symbol
        ),
        SessionEvent::ConfigNotFound { .. } => {
            "Configuration file not found. Please provide a valid path.\n".to_string()
        },
        SessionEvent::LoadFailed { reason } => format!("Error loading configuration: {reason}\n"),
        SessionEvent::ReceiveFailed { reason } => format!("Error receiving message: {reason}\n"),
        SessionEvent::SendFailed { reason } => format!("Error sending message: {reason}\n"),
        SessionEvent::InputFailed { reason } => format!("Error reading input: {reason}\n"),
        SessionEvent::Exiting => "Exiting...\n".to_string(),
        SessionEvent::Interrupted => "Exit!\n".to_string(),
        SessionEvent::Closing => "Closing serial port...\n".to_string(),
    }
}

/// Show `prompt` and read one line from stdin, without its terminator.
///
/// Returns `None` at end of input.
pub fn prompt_line(prompt: &str) -> io::Result<Option<String>> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(prompt.as_bytes())?;
    stdout.flush()?;
    drop(stdout);

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(Some(line))
}

/// Write one line to stdout.
pub fn say(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}")?;
    stdout.flush()
}
