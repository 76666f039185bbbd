use crate::console::SerialConsole;
use crate::ProbeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortSettings {
    pub path: String,
    pub baud_rate: u32,
    /// Keep DTR and RTS low so that opening the port does not reset the board
    pub hold_reset_lines_low: bool,
    /// How long a single read may block
    pub read_timeout: Duration,
}

impl PortSettings {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: 115_200,
            hold_reset_lines_low: false,
            read_timeout: Duration::from_secs(2),
        }
    }
}

/// Open the serial port described by `settings`.
///
/// On failure the error carries the ports that are available instead.
pub fn open_console(settings: &PortSettings) -> Result<SerialConsole, ProbeError> {
    log::debug!(
        "Opening {} at {} baud, reset lines held low: {}",
        settings.path,
        settings.baud_rate,
        settings.hold_reset_lines_low
    );

    let open = || -> serialport::Result<SerialConsole> {
        let mut builder =
            serialport::new(settings.path.as_str(), settings.baud_rate).timeout(settings.read_timeout);
        if settings.hold_reset_lines_low {
            builder = builder.dtr_on_open(false);
        }
        let mut port = builder.open()?;

        if settings.hold_reset_lines_low {
            // Some drivers raise the lines again while opening
            port.write_data_terminal_ready(false)?;
            port.write_request_to_send(false)?;
        }

        Ok(SerialConsole::new(port))
    };

    open().map_err(|source| ProbeError::Open {
        path: settings.path.clone(),
        source,
        available: available_ports(),
    })
}

/// Describe the serial ports on this machine, e.g. `/dev/ttyACM0: USB (Espressif)`
pub fn available_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports
            .into_iter()
            .map(|port| match port.port_type {
                serialport::SerialPortType::UsbPort(usb) => format!(
                    "{}: USB ({})",
                    port.port_name,
                    usb.product
                        .or(usb.manufacturer)
                        .unwrap_or_else(|| format!("{:04x}:{:04x}", usb.vid, usb.pid))
                ),
                serialport::SerialPortType::BluetoothPort => {
                    format!("{}: Bluetooth", port.port_name)
                }
                serialport::SerialPortType::PciPort => format!("{}: PCI", port.port_name),
                serialport::SerialPortType::Unknown => port.port_name,
            })
            .collect(),
        Err(e) => {
            log::warn!("Could not list serial ports: {e}");
            Vec::new()
        }
    }
}
