//! ## Serial
//!
//! Line based transport to the device.
//!

use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use log::trace;
use serialport::SerialPort;

use crate::constants::serial::{READ_TERMINATION, TIMEOUT_DURATION, WRITE_TERMINATION};
use crate::error::Error;

/// ### Transport
///
/// A line based connection to an instrument.
///
pub trait Transport {
    /// Write one command line, no response expected.
    fn write_line(&mut self, cmd: &str) -> Result<()>;

    /// Write one command line and read back one response line, without its terminator.
    fn query(&mut self, cmd: &str) -> Result<String>;
}

/// Allow a boxed transport
impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_line(&mut self, cmd: &str) -> Result<()> {
        (**self).write_line(cmd)
    }

    fn query(&mut self, cmd: &str) -> Result<String> {
        (**self).query(cmd)
    }
}

/// Allow a borrowed transport
impl<T: Transport + ?Sized> Transport for &mut T {
    fn write_line(&mut self, cmd: &str) -> Result<()> {
        (**self).write_line(cmd)
    }

    fn query(&mut self, cmd: &str) -> Result<String> {
        (**self).query(cmd)
    }
}

/// ### Serial Transport
///
/// Transport over an opened serial port.
///
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    timeout: Duration,
}

impl SerialTransport {
    pub fn new(port: Box<dyn SerialPort>) -> SerialTransport {
        SerialTransport {
            port,
            timeout: TIMEOUT_DURATION,
        }
    }

    /// ### Into Port
    ///
    /// Give back the serial port, e.g. to close it explicitly.
    ///
    pub fn into_port(self) -> Box<dyn SerialPort> {
        self.port
    }
}

impl Transport for SerialTransport {
    fn write_line(&mut self, cmd: &str) -> Result<()> {
        write_line(&mut self.port, cmd)
    }

    fn query(&mut self, cmd: &str) -> Result<String> {
        query_line(&mut self.port, cmd, self.timeout)
    }
}

/// ### Write Line
///
/// Write a command followed by the write terminator and flush it out.
///
pub(crate) fn write_line<W: Write + ?Sized>(writer: &mut W, cmd: &str) -> Result<()> {
    let line = format!("{cmd}{WRITE_TERMINATION}");
    writer.write_all(line.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// ### Query Line
///
/// Write a command line, then read back one response line.
///
pub(crate) fn query_line<P: Read + Write + ?Sized>(
    port: &mut P,
    cmd: &str,
    timeout: Duration,
) -> Result<String> {
    write_line(port, cmd)?;
    read_line(port, cmd, timeout)
}

/// ### Read Line
///
/// Read until the response terminator, failing if it has not arrived within `timeout`.
///
/// #### Arguments
/// - `reader` -> where the response comes from
/// - `cmd` -> the command being answered, for error reporting
/// - `timeout` -> the time allowed for the whole line
///
pub(crate) fn read_line<R: Read + ?Sized>(
    reader: &mut R,
    cmd: &str,
    timeout: Duration,
) -> Result<String> {
    let start = Instant::now();
    let mut line: Vec<u8> = Vec::new();
    let mut byte = [0u8; 1];

    while !line.ends_with(READ_TERMINATION) {
        match reader.read(&mut byte) {
            Ok(0) => return Err(Error::TransportClosed(cmd.to_string()).into()),
            Ok(_) => line.push(byte[0]),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) if e.kind() == ErrorKind::TimedOut => {
                return Err(Error::Timeout(cmd.to_string()).into())
            }
            Err(e) => return Err(e.into()),
        }

        if start.elapsed() > timeout {
            return Err(Error::Timeout(cmd.to_string()).into());
        }
    }

    line.truncate(line.len() - READ_TERMINATION.len());
    trace!("read {} bytes in {:?}", line.len(), start.elapsed());

    Ok(String::from_utf8(line)?)
}
