//! ## Constants
//!
//! Various constants used throughout the project.
//!

/// Command mnemonics understood by the DLnSec firmware
pub mod mnemonic {
    /// Identification query
    pub const IDENTIFY: &str = "*IDN?";
    /// Save the current settings to non-volatile memory
    pub const SAVE: &str = "*SAV";
    /// Recall the saved settings
    pub const RECALL: &str = "*RCL";
    /// Number of saved settings
    pub const N_SAVED: &str = "NSAV?";
    /// Vendor greeting
    pub const HOWDY: &str = "HOWDY?";
    /// Restart the controller
    pub const RESTART: &str = "*RST";
    /// Last error
    pub const ERROR: &str = "ERR?";
    /// Enable the laser output
    pub const OUTPUT_ON: &str = "*ON";
    /// Disable the laser output
    pub const OUTPUT_OFF: &str = "*OFF";
    /// Continuous wave mode
    pub const CONTINUOUS_WAVE: &str = "LAS";
    /// Internal trigger
    pub const TRIGGER_INTERNAL: &str = "INT";
    /// External trigger
    pub const TRIGGER_EXTERNAL: &str = "EXT";
    /// Stop the laser
    pub const STOP: &str = "STOP";
    /// Power level in percent
    pub const POWER: &str = "PWR";
    /// Internal trigger clock prescaler
    pub const PRESCALER: &str = "PRE";
    /// Pulse width multiplier
    pub const PULSE_WIDTH: &str = "WID";
}

pub mod protocol {
    /// Trailing marker of a query command
    pub const QUERY_MARKER: char = '?';
    /// Queries the firmware expects without the query marker. Compared against the whole command.
    pub const NON_CONFORMING_QUERIES: [&str; 2] =
        [super::mnemonic::IDENTIFY, super::mnemonic::HOWDY];
    /// Prefix of the acknowledgement returned for write commands
    pub const SENT_PREFIX: &str = "Sent: ";
}

pub mod serial {
    use std::time::Duration;

    /// Baud rate of the USB serial bridge
    pub const BAUD_RATE: u32 = 9600;
    pub const DATA_BITS: serialport::DataBits = serialport::DataBits::Eight;
    pub const PARITY: serialport::Parity = serialport::Parity::None;
    pub const STOP_BITS: serialport::StopBits = serialport::StopBits::One;
    pub const FLOW_CONTROL: serialport::FlowControl = serialport::FlowControl::None;
    /// Time to wait for a response line
    pub const TIMEOUT_DURATION: Duration = Duration::from_millis(5000);
    /// Appended to every command sent
    pub const WRITE_TERMINATION: &str = "\r\n";
    /// Ends every response line. The firmware sends LF before CR.
    pub const READ_TERMINATION: &[u8] = b"\n\r";
}

pub mod limits {
    /// Power level range in percent
    pub const POWER_MIN: u32 = 0;
    pub const POWER_MAX: u32 = 100;
    /// Valid divisors of the 16 MHz internal trigger clock
    pub const PRESCALER_OPTIONS: [u32; 5] = [1, 8, 64, 256, 1024];
    /// Pulse width multiplier range
    pub const PULSE_WIDTH_MIN: u32 = 0;
    pub const PULSE_WIDTH_MAX: u32 = 255;
}

pub mod quick_start {
    /// Prescaler used when quick starting with the internal trigger
    pub const DEFAULT_PRESCALER: u32 = 1024;
    /// Pulse width used when quick starting with the internal trigger
    pub const DEFAULT_PULSE_WIDTH: u32 = 255;
}

/// Log target for the verbose command echo
pub const VERBOSE_TARGET: &str = "dlnsec::verbose";
