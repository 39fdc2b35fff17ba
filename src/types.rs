//! ## Types
//!
//! The different types used across the crate
//!

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::{limits, protocol, quick_start};
use crate::error::Error;

/// ### Response
///
/// The outcome of a command sent through [`DLnSec::com`](crate::DLnSec::com).
///
/// Queries yield a number when the device answers with one, or the raw text otherwise.
/// Writes get no answer from the device and yield a local acknowledgement holding the command.
///
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// A query answered with a number
    Number(f64),
    /// A query answered with anything else, untouched
    Text(String),
    /// A write command, displayed as `Sent: <command>`
    Sent(String),
}

impl Response {
    /// ### Parse
    ///
    /// Coerce a query response to a number when possible.
    ///
    pub fn parse(text: String) -> Response {
        match text.trim().parse::<f64>() {
            Ok(value) => Response::Number(value),
            Err(_) => Response::Text(text),
        }
    }

    /// ### As F64
    ///
    /// The value of a numeric response.
    ///
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Response::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// ### As Text
    ///
    /// The raw text of a non-numeric response.
    ///
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Response::Text(text) => Some(text),
            _ => None,
        }
    }

    /// ### Is Ack
    ///
    /// Whether this is the local acknowledgement of a write command.
    ///
    pub fn is_ack(&self) -> bool {
        matches!(self, Response::Sent(_))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Number(value) => write!(f, "{value}"),
            Response::Text(text) => f.write_str(text),
            Response::Sent(cmd) => write!(f, "{}{cmd}", protocol::SENT_PREFIX),
        }
    }
}

/// ### Param
///
/// Argument of a settable parameter: either read it back or set it to a value.
///
/// Any value converts into `Param::Value`, so `laser.power(50)` and
/// `laser.power(Param::Query)` both work.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Param<T> {
    #[default]
    Query,
    Value(T),
}

impl<T> From<T> for Param<T> {
    fn from(value: T) -> Self {
        Param::Value(value)
    }
}

impl<T> Param<T> {
    /// ### Try Map
    ///
    /// Validate or convert the value, leaving a query untouched.
    ///
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Param<U>, E> {
        match self {
            Param::Query => Ok(Param::Query),
            Param::Value(value) => f(value).map(Param::Value),
        }
    }
}

impl<T: fmt::Display> Param<T> {
    /// ### Command
    ///
    /// Build the command string for a mnemonic, e.g. `PWR?` or `PWR50`.
    ///
    pub fn command(&self, mnemonic: &str) -> String {
        match self {
            Param::Query => format!("{mnemonic}{}", protocol::QUERY_MARKER),
            Param::Value(value) => format!("{mnemonic}{value}"),
        }
    }
}

/// ### Validate Power
///
/// Power levels are percentages between 0 and 100 inclusive.
///
pub fn validate_power(percentage: u32) -> Result<u32, Error> {
    if (limits::POWER_MIN..=limits::POWER_MAX).contains(&percentage) {
        Ok(percentage)
    } else {
        Err(Error::invalid(
            "power",
            percentage,
            format!("{} to {} percent", limits::POWER_MIN, limits::POWER_MAX),
        ))
    }
}

/// ### Validate Prescaler
///
/// The internal repetition rate is 16MHz/256/P where P is one of the prescaler options.
///
pub fn validate_prescaler(prescale: u32) -> Result<u32, Error> {
    if limits::PRESCALER_OPTIONS.contains(&prescale) {
        Ok(prescale)
    } else {
        Err(Error::invalid(
            "prescaler",
            prescale,
            format!("{:?}", limits::PRESCALER_OPTIONS),
        ))
    }
}

/// ### Validate Pulse Width
///
/// Pulse widths are 1/16MHz * P * (N + 1) where N is the multiplier and P the prescaler.
///
pub fn validate_pulse_width(width: u32) -> Result<u32, Error> {
    if (limits::PULSE_WIDTH_MIN..=limits::PULSE_WIDTH_MAX).contains(&width) {
        Ok(width)
    } else {
        Err(Error::invalid(
            "pulse width",
            width,
            format!("{} to {}", limits::PULSE_WIDTH_MIN, limits::PULSE_WIDTH_MAX),
        ))
    }
}

/// ### Trigger Mode
///
/// How laser pulses are triggered.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// Pulses from the internal clock, see the prescaler and pulse width
    Internal,
    /// Pulses on the external trigger input
    External,
    /// No pulsing at all
    ContinuousWave,
}

impl TriggerMode {
    /// Names accepted by `TriggerMode::from_str`
    pub const NAMES: [&'static str; 6] =
        ["internal", "int", "external", "ext", "continuous", "cw"];
}

impl FromStr for TriggerMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            "internal" | "int" => Ok(TriggerMode::Internal),
            "external" | "ext" => Ok(TriggerMode::External),
            "continuous" | "cw" => Ok(TriggerMode::ContinuousWave),
            _ => Err(Error::invalid(
                "trigger mode",
                s,
                TriggerMode::NAMES.join(", "),
            )),
        }
    }
}

impl fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TriggerMode::Internal => "internal",
            TriggerMode::External => "external",
            TriggerMode::ContinuousWave => "continuous",
        })
    }
}

/// ### Parameters
///
/// The pulse parameters as read back from the device.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub power: Response,
    pub prescale: Response,
    pub pulse_width: Response,
}

impl Parameters {
    /// ### To Map
    ///
    /// The parameters keyed by `power`, `prescale` and `pulse_width`.
    ///
    pub fn to_map(&self) -> BTreeMap<&'static str, Response> {
        BTreeMap::from([
            ("power", self.power.clone()),
            ("prescale", self.prescale.clone()),
            ("pulse_width", self.pulse_width.clone()),
        ])
    }
}

/// ### Parameter Set
///
/// The pulse parameters to write to the device. Fields left as `None` are not sent.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterSet {
    /// Power level in percent
    pub power: Option<u32>,
    /// Internal trigger prescaler
    pub prescale: Option<u32>,
    /// Pulse width multiplier
    pub pulse_width: Option<u32>,
}

impl ParameterSet {
    pub fn new() -> ParameterSet {
        ParameterSet::default()
    }

    pub fn power(mut self, percentage: u32) -> ParameterSet {
        self.power = Some(percentage);
        self
    }

    pub fn prescale(mut self, prescale: u32) -> ParameterSet {
        self.prescale = Some(prescale);
        self
    }

    pub fn pulse_width(mut self, width: u32) -> ParameterSet {
        self.pulse_width = Some(width);
        self
    }

    /// ### Validate
    ///
    /// Check every provided field, failing on the first invalid one.
    ///
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(power) = self.power {
            validate_power(power)?;
        }
        if let Some(prescale) = self.prescale {
            validate_prescaler(prescale)?;
        }
        if let Some(width) = self.pulse_width {
            validate_pulse_width(width)?;
        }
        Ok(())
    }
}

/// ### Quick Start Options
///
/// Trigger configuration applied by [`DLnSec::quick_start`](crate::DLnSec::quick_start).
/// The prescaler and pulse width are only sent for the internal trigger.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickStartOptions {
    /// Trigger mode to select, `None` keeps the current one
    pub trigger: Option<TriggerMode>,
    pub prescale: u32,
    pub pulse_width: u32,
}

impl Default for QuickStartOptions {
    fn default() -> Self {
        QuickStartOptions {
            trigger: None,
            prescale: quick_start::DEFAULT_PRESCALER,
            pulse_width: quick_start::DEFAULT_PULSE_WIDTH,
        }
    }
}

impl From<TriggerMode> for QuickStartOptions {
    fn from(trigger: TriggerMode) -> Self {
        QuickStartOptions {
            trigger: Some(trigger),
            ..QuickStartOptions::default()
        }
    }
}

/// ### Resource Address
///
/// The serial port a DLnSec is connected to.
///
/// Parsed from either a bare port name (`/dev/ttyUSB0`, `COM3`) or a VISA serial
/// resource (`ASRL/dev/ttyUSB0::INSTR`, `ASRL3::INSTR`). A numeric board index maps to `COM<n>`.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceAddr {
    port: String,
}

impl ResourceAddr {
    pub fn port(&self) -> &str {
        &self.port
    }
}

const ASRL_PREFIX: &str = "ASRL";
const INSTR_SUFFIX: &str = "::INSTR";
const VISA_SEPARATOR: &str = "::";

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    let tail = s.get(split..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &s[..split])
}

impl FromStr for ResourceAddr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidResource(s.to_string());
        let addr = s.trim();

        let port = match strip_prefix_ignore_case(addr, ASRL_PREFIX) {
            Some(rest) => {
                let rest = strip_suffix_ignore_case(rest, INSTR_SUFFIX).unwrap_or(rest);
                if rest.chars().all(|c| c.is_ascii_digit()) && !rest.is_empty() {
                    format!("COM{rest}")
                } else {
                    rest.to_string()
                }
            }
            None => addr.to_string(),
        };

        if port.is_empty() || port.contains(VISA_SEPARATOR) {
            return Err(invalid());
        }

        Ok(ResourceAddr { port })
    }
}

impl fmt::Display for ResourceAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.port)
    }
}

/// ### Port Info
///
/// A serial port found on the system.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Name to pass to `DLnSec::open`
    pub name: String,
    /// USB vendor id, for USB serial bridges
    pub vendor_id: Option<u16>,
    /// USB product id, for USB serial bridges
    pub product_id: Option<u16>,
    pub serial_number: Option<String>,
}
