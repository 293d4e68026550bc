//! In-memory transport with a scriptable far end.
//!
//! [`link`] returns a [`SimTransport`] for the session and a [`RemoteDevice`]
//! that plays the device on the other end of the wire. Bytes travel through
//! unbounded channels and go through the same [`LineFramer`] the serial
//! transport uses, so framing behaves identically.
//!
//! Every write is recorded as a [`WireRecord`]. When a [`TurnSignal`] probe is
//! attached, each record also captures whether the operator held the turn at
//! the moment of the write.

use std::{
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{sync::mpsc, task::JoinHandle};
use turnlink_app::{LineReader, LineWriter, ReadOutcome, Transport, TransportError, TurnSignal};
use turnlink_core::{LineFramer, decode_line, encode_line};

/// One write observed on the simulated wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRecord {
    /// Bytes exactly as written, terminator included.
    pub bytes: Vec<u8>,
    /// Turn state at write time, if a probe was attached.
    pub permitted: Option<bool>,
}

impl WireRecord {
    /// The written line without its terminator.
    pub fn text(&self) -> String {
        decode_line(&self.bytes)
    }
}

/// Something delivered towards the host.
#[derive(Debug)]
enum Inbound {
    Bytes(Vec<u8>),
    Fault(io::ErrorKind),
}

/// State shared between both ends of the link.
#[derive(Default)]
struct LinkState {
    written: Vec<WireRecord>,
    write_faults: usize,
    close_count: usize,
    probe: Option<TurnSignal>,
}

/// Bytes the device has received but not yet consumed as lines.
struct Inbox {
    from_host: mpsc::UnboundedReceiver<Vec<u8>>,
    framer: LineFramer,
}

fn lock(state: &Mutex<LinkState>) -> MutexGuard<'_, LinkState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Create a connected transport and remote device.
///
/// `read_window` bounds each read on the host side, like a serial read
/// timeout.
pub fn link(read_window: Duration) -> (SimTransport, RemoteDevice) {
    let (to_host_tx, to_host_rx) = mpsc::unbounded_channel();
    let (from_host_tx, from_host_rx) = mpsc::unbounded_channel();
    let state = Arc::new(Mutex::new(LinkState::default()));

    let transport = SimTransport {
        reader: SimReader { inbound: to_host_rx, framer: LineFramer::new(), read_window },
        writer: SimWriter { outbound: from_host_tx, state: Arc::clone(&state) },
    };
    let remote = RemoteDevice {
        to_host: to_host_tx,
        inbox: Arc::new(tokio::sync::Mutex::new(Inbox {
            from_host: from_host_rx,
            framer: LineFramer::new(),
        })),
        state,
    };
    (transport, remote)
}

/// Host side of a simulated link.
pub struct SimTransport {
    reader: SimReader,
    writer: SimWriter,
}

impl Transport for SimTransport {
    type Reader = SimReader;
    type Writer = SimWriter;

    fn split(self) -> (SimReader, SimWriter) {
        (self.reader, self.writer)
    }

    fn close(_reader: SimReader, writer: SimWriter) -> Result<(), TransportError> {
        lock(&writer.state).close_count += 1;
        tracing::debug!("simulated link closed");
        Ok(())
    }
}

/// Read half of a [`SimTransport`].
pub struct SimReader {
    inbound: mpsc::UnboundedReceiver<Inbound>,
    framer: LineFramer,
    read_window: Duration,
}

impl LineReader for SimReader {
    async fn read_line(&mut self) -> Result<ReadOutcome, TransportError> {
        if let Some(line) = self.framer.next_line() {
            return Ok(ReadOutcome::Line(line));
        }

        match tokio::time::timeout(self.read_window, self.inbound.recv()).await {
            Ok(Some(Inbound::Bytes(bytes))) => {
                self.framer.push(&bytes);
                Ok(self.framer.next_line().map_or(ReadOutcome::Timeout, ReadOutcome::Line))
            },
            Ok(Some(Inbound::Fault(kind))) => {
                Err(TransportError::Read(io::Error::new(kind, "injected read fault")))
            },
            Ok(None) => {
                // Device gone: behave like a silent line
                tokio::time::sleep(self.read_window).await;
                Ok(ReadOutcome::Timeout)
            },
            Err(_) => Ok(ReadOutcome::Timeout),
        }
    }
}

/// Write half of a [`SimTransport`].
pub struct SimWriter {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    state: Arc<Mutex<LinkState>>,
}

impl LineWriter for SimWriter {
    async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let bytes = encode_line(line);
        {
            let mut state = lock(&self.state);
            if state.write_faults > 0 {
                state.write_faults -= 1;
                return Err(TransportError::Write(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "injected write fault",
                )));
            }
            let permitted = state.probe.as_ref().map(TurnSignal::is_permitted);
            state.written.push(WireRecord { bytes: bytes.clone(), permitted });
        }

        // A departed device just stops listening
        let _ = self.outbound.send(bytes);
        Ok(())
    }
}

/// Device side of a simulated link.
#[derive(Clone)]
pub struct RemoteDevice {
    to_host: mpsc::UnboundedSender<Inbound>,
    inbox: Arc<tokio::sync::Mutex<Inbox>>,
    state: Arc<Mutex<LinkState>>,
}

impl RemoteDevice {
    /// Send one line to the host.
    pub fn send_line(&self, text: &str) {
        self.send_bytes(&encode_line(text));
    }

    /// Send raw bytes to the host.
    pub fn send_bytes(&self, bytes: &[u8]) {
        let _ = self.to_host.send(Inbound::Bytes(bytes.to_vec()));
    }

    /// Make the host's next read fail with `kind`.
    pub fn inject_read_fault(&self, kind: io::ErrorKind) {
        let _ = self.to_host.send(Inbound::Fault(kind));
    }

    /// Make the host's next `count` writes fail.
    pub fn fail_next_writes(&self, count: usize) {
        lock(&self.state).write_faults = count;
    }

    /// Record the turn state alongside every subsequent write.
    pub fn attach_probe(&self, signal: TurnSignal) {
        lock(&self.state).probe = Some(signal);
    }

    /// Wait for the next line written by the host.
    ///
    /// Returns `None` once the host side has been dropped.
    pub async fn next_line(&self) -> Option<String> {
        let mut inbox = self.inbox.lock().await;
        loop {
            if let Some(line) = inbox.framer.next_line() {
                return Some(line);
            }
            let bytes = inbox.from_host.recv().await?;
            inbox.framer.push(&bytes);
        }
    }

    /// Answer every host line for which `reply` returns `Some`.
    pub fn respond_with<F>(&self, mut reply: F) -> JoinHandle<()>
    where
        F: FnMut(&str) -> Option<String> + Send + 'static,
    {
        let remote = self.clone();
        tokio::spawn(async move {
            while let Some(line) = remote.next_line().await {
                if let Some(answer) = reply(&line) {
                    remote.send_line(&answer);
                }
            }
        })
    }

    /// Every write the host has made, oldest first.
    pub fn written(&self) -> Vec<WireRecord> {
        lock(&self.state).written.clone()
    }

    /// Text of every write the host has made, oldest first.
    pub fn written_lines(&self) -> Vec<String> {
        lock(&self.state).written.iter().map(WireRecord::text).collect()
    }

    /// How many times the host closed the transport.
    pub fn close_count(&self) -> usize {
        lock(&self.state).close_count
    }
}
