//! # DLnSec
//!
//! Rust driver for the Swabian Instruments DLnSec laser, connected through its USB serial bridge.
//!
//! The DLnSec speaks a SCPI-like text protocol: one command per line, queries end with `?`
//! and responses end with `"\n\r"`. This library maps each command to a method and
//! turns responses into a [`Response`].
//!
//! ## Usage
//!
//! To use, add the following line to your project's Cargo.toml dependencies:
//! ```toml
//! dlnsec = "0.1"
//! ```
//!
//! ## Example
//!
//! The example below demonstrates how to connect to, send commands to and query the device.
//!
//! ```no_run
//! use dlnsec::{DLnSec, Param, TriggerMode};
//!
//! fn main() -> anyhow::Result<()> {
//!     // connect to the device
//!     let mut laser = DLnSec::open("ASRL/dev/ttyUSB0::INSTR", true)?;
//!
//!     // query the device
//!     println!("{}", laser.identify()?);
//!     println!("{}", laser.power(Param::Query)?);
//!
//!     // pulse from the internal clock at half power
//!     laser.trigger(TriggerMode::Internal)?;
//!     laser.prescaler(64)?;
//!     laser.power(50)?;
//!     laser.output_on()?;
//!
//!     Ok(())
//! }
//! ```
//!
//! On Linux the port usually needs `sudo usermod -a -G dialout <username>` first.
//!

mod constants;
mod error;
mod init;
mod types;
mod communication {
    pub mod serial;
}

pub use communication::serial::{SerialTransport, Transport};
pub use error::Error;
pub use types::{
    Param, ParameterSet, Parameters, PortInfo, QuickStartOptions, ResourceAddr, Response,
    TriggerMode,
};

use constants::{mnemonic, protocol, VERBOSE_TARGET};
use types::{validate_power, validate_prescaler, validate_pulse_width};

use anyhow::Result;
use log::{debug, info, trace, warn};

/// ### DLnSec
///
/// Handle to one DLnSec laser.
///
/// Every method sends at most one command and blocks until it is written, or until the
/// response arrives for queries. Transport errors are returned as is and leave the handle usable.
///
pub struct DLnSec<T: Transport = SerialTransport> {
    transport: T,
    verbose: bool,
}

impl DLnSec<SerialTransport> {
    /// ### Serial Ports
    ///
    /// Get a list of the serial ports a DLnSec could be connected to.
    ///
    pub fn ports() -> Result<Vec<PortInfo>> {
        init::list_ports()
    }

    /// ### Open
    ///
    /// Open the serial port of a DLnSec.
    ///
    /// #### Arguments
    /// - `addr` -> a port name (`/dev/ttyUSB0`, `COM3`) or a VISA resource
    ///   (`ASRL/dev/ttyUSB0::INSTR`)
    /// - `verbose` -> echo every command sent to the `dlnsec::verbose` log target
    ///
    pub fn open(addr: &str, verbose: bool) -> Result<DLnSec<SerialTransport>> {
        let addr: ResourceAddr = addr.parse()?;
        let port = init::open_port(&addr)?;

        Ok(DLnSec::with_transport(SerialTransport::new(port), verbose))
    }
}

impl<T: Transport> DLnSec<T> {
    /// ### With Transport
    ///
    /// Drive a DLnSec over an already established transport.
    ///
    pub fn with_transport(transport: T, verbose: bool) -> DLnSec<T> {
        DLnSec { transport, verbose }
    }

    /// ### Transport
    ///
    /// The transport the commands go through.
    ///
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// ### Into Transport
    ///
    /// Release the transport, e.g. to close it.
    ///
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// ### Verbose
    ///
    /// Whether commands are echoed to the `dlnsec::verbose` log target.
    ///
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// ### Set Verbose
    ///
    /// Turn the command echo on or off.
    ///
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// ### Com
    ///
    /// Send a command to the device.
    ///
    /// Commands ending with `?` are queries: the response line is read back and
    /// returned as a number if it parses as one, as text otherwise. Any other command is
    /// written and acknowledged with `Response::Sent`.
    ///
    /// #### Arguments
    /// - `cmd` -> the command to send, without line terminator
    ///
    pub fn com(&mut self, cmd: &str) -> Result<Response> {
        if cmd.is_empty() {
            return Err(Error::invalid("command", cmd, "a non-empty command").into());
        }

        if self.verbose {
            info!(target: VERBOSE_TARGET, "{cmd}");
        }

        if cmd.ends_with(protocol::QUERY_MARKER) {
            let wire = wire_query(cmd);
            debug!("query `{wire}`");
            let value = self.transport.query(wire)?;
            trace!("`{wire}` answered `{value}`");

            Ok(Response::parse(value))
        } else {
            debug!("write `{cmd}`");
            self.transport.write_line(cmd)?;

            Ok(Response::Sent(cmd.to_string()))
        }
    }

    // BASIC COMMANDS
    // ==========

    pub fn identify(&mut self) -> Result<Response> {
        self.com(mnemonic::IDENTIFY)
    }

    pub fn idn(&mut self) -> Result<Response> {
        self.identify()
    }

    /// ### Save
    ///
    /// Store the current settings so they are restored at power up.
    ///
    pub fn save(&mut self) -> Result<Response> {
        self.com(mnemonic::SAVE)
    }

    pub fn recall(&mut self) -> Result<Response> {
        self.com(mnemonic::RECALL)
    }

    /// Number of saved settings
    pub fn n_saved(&mut self) -> Result<Response> {
        self.com(mnemonic::N_SAVED)
    }

    pub fn howdy(&mut self) -> Result<Response> {
        self.com(mnemonic::HOWDY)
    }

    pub fn restart(&mut self) -> Result<Response> {
        self.com(mnemonic::RESTART)
    }

    /// Last error reported by the device
    pub fn error(&mut self) -> Result<Response> {
        self.com(mnemonic::ERROR)
    }

    pub fn output_on(&mut self) -> Result<Response> {
        self.com(mnemonic::OUTPUT_ON)
    }

    pub fn output_off(&mut self) -> Result<Response> {
        self.com(mnemonic::OUTPUT_OFF)
    }

    /// ### Continuous Wave
    ///
    /// Switch the laser to continuous wave operation.
    ///
    pub fn cw(&mut self) -> Result<Response> {
        self.com(mnemonic::CONTINUOUS_WAVE)
    }

    pub fn continuous_wave(&mut self) -> Result<Response> {
        self.cw()
    }

    pub fn trigger_internal(&mut self) -> Result<Response> {
        self.com(mnemonic::TRIGGER_INTERNAL)
    }

    pub fn trigger_external(&mut self) -> Result<Response> {
        self.com(mnemonic::TRIGGER_EXTERNAL)
    }

    pub fn stop_laser(&mut self) -> Result<Response> {
        self.com(mnemonic::STOP)
    }

    /// ### Power
    ///
    /// Query or set the power level.
    ///
    /// #### Arguments
    /// - `percentage` -> `Param::Query`, or a level between 0 and 100 percent
    ///
    pub fn power(&mut self, percentage: impl Into<Param<u32>>) -> Result<Response> {
        let percentage = percentage.into().try_map(validate_power)?;
        self.com(&percentage.command(mnemonic::POWER))
    }

    pub fn pow(&mut self, percentage: impl Into<Param<u32>>) -> Result<Response> {
        self.power(percentage)
    }

    /// ### Prescaler
    ///
    /// Query or set the divider of the internal trigger. Pulses repeat at 16MHz/256/`prescale`.
    ///
    /// #### Arguments
    /// - `prescale` -> `Param::Query`, or one of 1, 8, 64, 256 and 1024
    ///
    pub fn prescaler(&mut self, prescale: impl Into<Param<u32>>) -> Result<Response> {
        let prescale = prescale.into().try_map(validate_prescaler)?;
        self.com(&prescale.command(mnemonic::PRESCALER))
    }

    /// ### Pulse Width
    ///
    /// Query or set the pulse width multiplier N. Pulses last 1/16MHz * prescale * (N + 1).
    ///
    /// #### Arguments
    /// - `width` -> `Param::Query`, or a multiplier between 0 and 255
    ///
    pub fn pulse_width(&mut self, width: impl Into<Param<u32>>) -> Result<Response> {
        let width = width.into().try_map(validate_pulse_width)?;
        self.com(&width.command(mnemonic::PULSE_WIDTH))
    }

    // USER FRIENDLY COMMANDS
    // ==========

    /// ### Trigger
    ///
    /// Select how pulses are triggered. Names are parsed with `str::parse::<TriggerMode>()`.
    ///
    pub fn trigger(&mut self, mode: TriggerMode) -> Result<Response> {
        debug!("select {mode} trigger");
        match mode {
            TriggerMode::Internal => self.trigger_internal(),
            TriggerMode::External => self.trigger_external(),
            TriggerMode::ContinuousWave => self.continuous_wave(),
        }
    }

    /// ### Trigger By Name
    ///
    /// Like `trigger`, for a mode given by name. Unknown names send nothing.
    ///
    pub fn trigger_by_name(&mut self, name: &str) -> Result<Response> {
        let mode = name.parse::<TriggerMode>().map_err(|e| {
            warn!("{e}");
            e
        })?;
        self.trigger(mode)
    }

    /// ### Quick CW
    ///
    /// Switch to continuous wave, set the power and turn the output on.
    ///
    pub fn quick_cw(&mut self, power: u32) -> Result<()> {
        validate_power(power)?;

        self.continuous_wave()?;
        self.power(power)?;
        self.output_on()?;

        Ok(())
    }

    /// ### Quick Start
    ///
    /// Configure the trigger, set the power and turn the output on.
    ///
    /// Everything is validated before the first command is sent. A transport error stops the
    /// sequence where it happened, nothing already sent is undone.
    ///
    pub fn quick_start(
        &mut self,
        power: u32,
        options: impl Into<QuickStartOptions>,
    ) -> Result<()> {
        let options = options.into();

        validate_power(power)?;
        if options.trigger == Some(TriggerMode::Internal) {
            validate_prescaler(options.prescale)?;
            validate_pulse_width(options.pulse_width)?;
        }

        match options.trigger {
            Some(TriggerMode::Internal) => {
                self.trigger_internal()?;
                self.prescaler(options.prescale)?;
                self.pulse_width(options.pulse_width)?;
            }
            Some(TriggerMode::External) => {
                self.trigger_external()?;
            }
            Some(TriggerMode::ContinuousWave) => {
                self.continuous_wave()?;
            }
            None => {}
        }

        self.power(power)?;
        self.output_on()?;

        Ok(())
    }

    /// ### Get Parameters
    ///
    /// Query the power, prescaler and pulse width, in that order.
    ///
    pub fn get_parameters(&mut self) -> Result<Parameters> {
        let power = self.power(Param::Query)?;
        let prescale = self.prescaler(Param::Query)?;
        let pulse_width = self.pulse_width(Param::Query)?;

        Ok(Parameters {
            power,
            prescale,
            pulse_width,
        })
    }

    /// ### Set Parameters
    ///
    /// Send the power, prescaler and pulse width present in `params`, in that order.
    /// Nothing is sent if any of them is invalid.
    ///
    pub fn set_parameters(&mut self, params: &ParameterSet) -> Result<()> {
        params.validate()?;

        if let Some(power) = params.power {
            self.power(power)?;
        }
        if let Some(prescale) = params.prescale {
            self.prescaler(prescale)?;
        }
        if let Some(width) = params.pulse_width {
            self.pulse_width(width)?;
        }

        Ok(())
    }
}

/// The DLnSec firmware wants `*IDN?` and `HOWDY?` without the query marker.
fn wire_query(cmd: &str) -> &str {
    if protocol::NON_CONFORMING_QUERIES.contains(&cmd) {
        cmd.strip_suffix(protocol::QUERY_MARKER).unwrap_or(cmd)
    } else {
        cmd
    }
}
