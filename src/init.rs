//! ## Initialization
//!
//! A set of functions to help initialize a connection to the device.
//!

use crate::constants::serial::*;
use crate::types::{PortInfo, ResourceAddr};

use anyhow::{Context, Result};
use log::debug;
use serialport::{SerialPort, SerialPortInfo, SerialPortType};

/// ### List Ports
///
/// List all serial ports of the system.
///
pub fn list_ports() -> Result<Vec<PortInfo>> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(port_info)
        .collect())
}

fn port_info(info: SerialPortInfo) -> PortInfo {
    match info.port_type {
        SerialPortType::UsbPort(usb) => PortInfo {
            name: info.port_name,
            vendor_id: Some(usb.vid),
            product_id: Some(usb.pid),
            serial_number: usb.serial_number,
        },
        _ => PortInfo {
            name: info.port_name,
            vendor_id: None,
            product_id: None,
            serial_number: None,
        },
    }
}

/// ### Open Port
///
/// Open the serial port of a resource with the DLnSec line settings.
///
pub fn open_port(addr: &ResourceAddr) -> Result<Box<dyn SerialPort>> {
    let port = serialport::new(addr.port(), BAUD_RATE)
        .data_bits(DATA_BITS)
        .parity(PARITY)
        .stop_bits(STOP_BITS)
        .flow_control(FLOW_CONTROL)
        .timeout(TIMEOUT_DURATION)
        .open()
        .with_context(|| format!("failed to open serial port `{addr}` at {BAUD_RATE} baud"))?;

    debug!("opened serial port `{addr}` at {BAUD_RATE} baud");

    Ok(port)
}
