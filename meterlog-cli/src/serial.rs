//! Serial port adapter for the capture command

use meterlog_core::{
    config::CaptureConfig,
    source::{EofPolicy, ReaderSource},
    CaptureError,
};
use serialport::{ClearBuffer, DataBits, ErrorKind, FlowControl, Parity, SerialPort, StopBits};
use std::io;
use std::time::Duration;
use tracing::{debug, info};

/// Byte source reading straight from the meter port
pub type SerialSource = ReaderSource<Box<dyn SerialPort>>;

/// Open and configure the meter port: 8 data bits, 1 stop bit, no parity
/// and no flow control at the configured baud rate, with a bounded read
/// timeout.
pub fn open(config: &CaptureConfig) -> Result<SerialSource, CaptureError> {
    let device = config.device_path.as_str();
    info!("Opening serial device {} at {} baud", device, config.baud_rate);

    let mut port = serialport::new(device, config.baud_rate)
        .open()
        .map_err(|e| open_error(device, e))?;

    let config_failed = |e: serialport::Error| CaptureError::DeviceConfigFailed {
        device: device.to_string(),
        reason: e.to_string(),
    };
    port.set_baud_rate(config.baud_rate).map_err(config_failed)?;
    port.set_data_bits(DataBits::Eight).map_err(config_failed)?;
    port.set_stop_bits(StopBits::One).map_err(config_failed)?;
    port.set_parity(Parity::None).map_err(config_failed)?;
    port.set_flow_control(FlowControl::None).map_err(config_failed)?;

    port.set_timeout(Duration::from_millis(config.timeout_ms))
        .map_err(|e| CaptureError::TimeoutConfigFailed {
            device: device.to_string(),
            reason: e.to_string(),
        })?;

    // Drop whatever queued up before we started listening
    if let Err(e) = port.clear(ClearBuffer::Input) {
        debug!("Could not clear input buffer on {}: {}", device, e);
    }

    Ok(ReaderSource::new(port, EofPolicy::Timeout))
}

fn open_error(device: &str, err: serialport::Error) -> CaptureError {
    match err.kind {
        ErrorKind::NoDevice | ErrorKind::Io(io::ErrorKind::NotFound) => {
            CaptureError::DeviceNotFound(device.to_string())
        }
        ErrorKind::InvalidInput => CaptureError::DeviceConfigFailed {
            device: device.to_string(),
            reason: err.description,
        },
        _ => CaptureError::DeviceOpenFailed {
            device: device.to_string(),
            reason: err.description,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error_mapping() {
        let err = open_error(
            "COM3",
            serialport::Error::new(ErrorKind::NoDevice, "gone"),
        );
        assert!(matches!(err, CaptureError::DeviceNotFound(d) if d == "COM3"));

        let err = open_error(
            "COM3",
            serialport::Error::new(ErrorKind::Io(io::ErrorKind::PermissionDenied), "busy"),
        );
        assert!(matches!(err, CaptureError::DeviceOpenFailed { .. }));

        let err = open_error(
            "COM3",
            serialport::Error::new(ErrorKind::InvalidInput, "bad baud"),
        );
        assert!(matches!(err, CaptureError::DeviceConfigFailed { .. }));
    }
}
