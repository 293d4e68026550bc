//! Serial port transport.
//!
//! Provides [`SerialTransport`] which carries lines over a `serialport`
//! device. The port handle is cloned so the read and write halves can be owned
//! by different loops. Blocking port calls run on tokio's blocking pool; each
//! call moves the handle in and hands it back when done.

use std::{
    io::{self, Read, Write},
    time::Duration,
};

use serialport::SerialPort;
use turnlink_core::{LineFramer, encode_line};

use crate::{LineReader, LineWriter, ReadOutcome, Transport, TransportError};

/// Bytes requested from the port per read.
const READ_CHUNK: usize = 256;

/// Serial link parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: String,
    /// Line speed.
    pub baud_rate: u32,
    /// Bound on a single read.
    pub timeout: Duration,
}

impl SerialSettings {
    /// Settings for `port` at 9600 baud with a one second read timeout.
    pub fn new(port: impl Into<String>) -> Self {
        Self { port: port.into(), baud_rate: 9600, timeout: Duration::from_secs(1) }
    }
}

/// Names of the serial ports present on this machine.
pub fn available_ports() -> Result<Vec<String>, TransportError> {
    let ports = serialport::available_ports().map_err(|e| TransportError::Open {
        address: "<enumerate>".to_string(),
        reason: e.to_string(),
    })?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// An opened serial link.
pub struct SerialTransport {
    reader: Box<dyn SerialPort>,
    writer: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open and configure the port.
    pub fn open(settings: &SerialSettings) -> Result<Self, TransportError> {
        let open_err = |e: serialport::Error| TransportError::Open {
            address: settings.port.clone(),
            reason: e.to_string(),
        };

        let reader = serialport::new(&settings.port, settings.baud_rate)
            .timeout(settings.timeout)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .open()
            .map_err(open_err)?;
        let writer = reader.try_clone().map_err(open_err)?;

        tracing::info!(
            port = %settings.port,
            baud_rate = settings.baud_rate,
            timeout_ms = settings.timeout.as_millis(),
            "serial port opened"
        );
        Ok(Self { reader, writer })
    }
}

impl Transport for SerialTransport {
    type Reader = SerialReader;
    type Writer = SerialWriter;

    fn split(self) -> (SerialReader, SerialWriter) {
        (
            SerialReader { port: Some(self.reader), framer: LineFramer::new() },
            SerialWriter { port: Some(self.writer) },
        )
    }

    fn close(reader: SerialReader, writer: SerialWriter) -> Result<(), TransportError> {
        drop(reader);
        if let Some(mut port) = writer.port {
            port.flush().map_err(TransportError::Write)?;
        }
        tracing::info!("serial port closed");
        Ok(())
    }
}

/// Read half of a [`SerialTransport`].
pub struct SerialReader {
    port: Option<Box<dyn SerialPort>>,
    framer: LineFramer,
}

impl LineReader for SerialReader {
    async fn read_line(&mut self) -> Result<ReadOutcome, TransportError> {
        if let Some(line) = self.framer.next_line() {
            return Ok(ReadOutcome::Line(line));
        }

        let mut port = self.port.take().ok_or(TransportError::Closed)?;
        let (port, result) = tokio::task::spawn_blocking(move || {
            let mut chunk = [0u8; READ_CHUNK];
            let result = port.read(&mut chunk).map(|n| chunk[..n].to_vec());
            (port, result)
        })
        .await
        .map_err(|e| TransportError::Read(io::Error::other(e)))?;
        self.port = Some(port);

        match result {
            Ok(bytes) => {
                self.framer.push(&bytes);
                Ok(self.framer.next_line().map_or(ReadOutcome::Timeout, ReadOutcome::Line))
            },
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(ReadOutcome::Timeout),
            Err(e) => Err(TransportError::Read(e)),
        }
    }
}

/// Write half of a [`SerialTransport`].
pub struct SerialWriter {
    port: Option<Box<dyn SerialPort>>,
}

impl LineWriter for SerialWriter {
    async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let bytes = encode_line(line);
        let mut port = self.port.take().ok_or(TransportError::Closed)?;
        let (port, result) = tokio::task::spawn_blocking(move || {
            let result = port.write_all(&bytes).and_then(|()| port.flush());
            (port, result)
        })
        .await
        .map_err(|e| TransportError::Write(io::Error::other(e)))?;
        self.port = Some(port);

        result.map_err(TransportError::Write)
    }
}
