//! Serial transport (C3): open/close, write, and terminated-read against a
//! real serial port via `tokio-serial`.
//!
//! Scoped acquisition is enforced by ownership: a `SerialTransport` holds
//! its handle in an `Option` so `close` is idempotent, and `Drop` closes
//! the underlying port on every exit path, including cancellation of a
//! pending read.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::SerialPortBuilderExt;

use crate::error::Error;

pub const DEFAULT_BAUD: u32 = 9600;
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);
pub const PAIRED_READ_DELAY: Duration = Duration::from_millis(100);

pub struct SerialTransport {
    port: Option<tokio_serial::SerialStream>,
    port_name: String,
}

impl SerialTransport {
    /// Open `port_name` at `baud_rate`. Maps the underlying error into the
    /// taxonomy's `PortUnavailable`/`PermissionDenied` kinds.
    pub async fn open(port_name: &str, baud_rate: u32) -> Result<Self, Error> {
        let stream = tokio_serial::new(port_name, baud_rate)
            .open_native_async()
            .map_err(|e| classify_open_error(port_name, &e))?;
        Ok(Self {
            port: Some(stream),
            port_name: port_name.to_string(),
        })
    }

    pub async fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let port = self.require_open()?;
        port.write_all(bytes).await?;
        Ok(())
    }

    /// Read up to and including `terminator`, or fail with `Timeout` after
    /// `timeout` elapses.
    pub async fn read_until(&mut self, terminator: u8, timeout: Duration) -> Result<Vec<u8>, Error> {
        let port_name = self.port_name.clone();
        let port = self.require_open()?;

        let read_fut = async {
            let mut buf = Vec::new();
            let mut byte = [0u8; 1];
            loop {
                let n = port.read(&mut byte).await?;
                if n == 0 {
                    break;
                }
                buf.push(byte[0]);
                if byte[0] == terminator {
                    break;
                }
            }
            Ok::<Vec<u8>, std::io::Error>(buf)
        };

        match tokio::time::timeout(timeout, read_fut).await {
            Ok(Ok(buf)) => Ok(buf),
            Ok(Err(e)) => Err(Error::Io(e)),
            Err(_) => Err(Error::Timeout {
                hint: format!("Could not find prism; check aim (port {port_name})"),
            }),
        }
    }

    /// Idempotent: calling `close` more than once is a no-op.
    pub fn close(&mut self) {
        self.port = None;
    }

    fn require_open(&mut self) -> Result<&mut tokio_serial::SerialStream, Error> {
        self.port.as_mut().ok_or_else(|| Error::PortUnavailable {
            port: self.port_name.clone(),
            reason: "port already closed".to_string(),
        })
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}

fn classify_open_error(port_name: &str, e: &tokio_serial::Error) -> Error {
    use tokio_serial::ErrorKind;
    match e.kind() {
        ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => Error::PermissionDenied {
            port: port_name.to_string(),
        },
        _ => Error::PortUnavailable {
            port: port_name.to_string(),
            reason: e.to_string(),
        },
    }
}
