use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};
use tracing::{info, warn};

use crate::{DeviceError, DeviceResult};

pub const DEFAULT_BAUD: u32 = 115_200;

/// Byte-level access to a peripheral. Implemented by real serial ports and
/// by in-memory fakes.
pub trait SerialLink: Send {
    /// Drops whatever the peripheral sent before now.
    fn discard_input(&mut self) -> io::Result<()>;
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;
    /// Returns every byte currently buffered without waiting for more.
    fn read_available(&mut self) -> io::Result<Vec<u8>>;
}

pub struct PortLink {
    port: Box<dyn SerialPort>,
}

impl PortLink {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl SerialLink for PortLink {
    fn discard_input(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::Input).map_err(io::Error::from)
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        Write::write_all(&mut self.port, bytes)?;
        self.port.flush()
    }

    fn read_available(&mut self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            let pending = self.port.bytes_to_read().map_err(io::Error::from)? as usize;
            if pending == 0 {
                break;
            }
            let start = out.len();
            out.resize(start + pending, 0);
            let n = self.port.read(&mut out[start..])?;
            out.truncate(start + n);
            if n == 0 {
                break;
            }
        }
        Ok(out)
    }
}

#[derive(Clone, Debug)]
pub struct SerialConfig {
    pub port: String,
    pub baud: u32,
    /// Upper bound for a single blocking read or write on the port.
    pub io_timeout: Duration,
    /// Pause after opening; most boards reset when the port opens.
    pub settle: Duration,
}

impl SerialConfig {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud: DEFAULT_BAUD,
            io_timeout: Duration::from_secs(2),
            settle: Duration::from_secs(2),
        }
    }
}

/// Connection to one peripheral. A session that failed to open stays around
/// in the closed state so callers can report the device as unavailable.
pub struct SerialSession {
    port: String,
    link: Option<Box<dyn SerialLink>>,
}

impl SerialSession {
    pub async fn open(config: &SerialConfig) -> Self {
        let opened = serialport::new(&config.port, config.baud)
            .timeout(config.io_timeout)
            .open();

        match opened {
            Ok(port) => {
                info!(port = %config.port, baud = config.baud, "serial device connected");
                tokio::time::sleep(config.settle).await;
                Self::with_link(&config.port, Box::new(PortLink::new(port)))
            }
            Err(err) => {
                warn!(port = %config.port, error = %err, "serial device not connected");
                Self::closed(&config.port)
            }
        }
    }

    pub fn with_link(port: &str, link: Box<dyn SerialLink>) -> Self {
        Self {
            port: port.to_string(),
            link: Some(link),
        }
    }

    pub fn closed(port: &str) -> Self {
        Self {
            port: port.to_string(),
            link: None,
        }
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    pub(crate) fn unavailable(&self) -> DeviceError {
        DeviceError::DeviceUnavailable {
            port: self.port.clone(),
        }
    }

    /// Runs blocking port I/O on the blocking pool. The link is moved into
    /// the closure for the duration of the call and put back afterwards.
    pub(crate) async fn with_link_blocking<T, F>(&mut self, f: F) -> DeviceResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn SerialLink) -> io::Result<T> + Send + 'static,
    {
        let mut link = self.link.take().ok_or_else(|| self.unavailable())?;
        let joined = tokio::task::spawn_blocking(move || {
            let result = f(link.as_mut());
            (link, result)
        })
        .await;

        match joined {
            Ok((link, result)) => {
                self.link = Some(link);
                Ok(result?)
            }
            Err(err) => {
                // The link went down with the panicking closure.
                warn!(port = %self.port, error = %err, "serial I/O task failed, closing session");
                Err(DeviceError::Io(io::Error::other(err)))
            }
        }
    }
}
