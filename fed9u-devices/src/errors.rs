//! Errors of the device drivers
//!

use std::error::Error;
use std::fmt;

use crate::bus::ChipSelector;

/// Everything which can go wrong when talking 
/// to one of the on-board devices
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
  /// A parameter is outside of its allowed range.
  /// Raised before any hardware access.
  InvalidArgument {
    operation : &'static str,
    parameter : &'static str,
    value     : String,
    allowed   : String,
  },
  /// The device kept reporting busy and/or error
  /// for the whole retry budget
  DeviceBusyOrError {
    operation : &'static str,
    chip      : ChipSelector,
    address   : u32,
    write     : bool,
    attempts  : u32,
    busy      : bool,
    error     : bool,
  },
  /// The requested operation is not allowed in the 
  /// current state of the hardware
  InvalidState {
    operation : &'static str,
    reason    : String,
  },
  /// Two redundant registers do not agree
  InconsistentState {
    operation : &'static str,
    registers : (u32, u32),
    values    : (u32, u32),
  },
}

impl DeviceError {
  pub fn to_string(&self) -> String {
    match self {
      DeviceError::InvalidArgument {..}   => {return String::from("InvalidArgument");},
      DeviceError::DeviceBusyOrError {..} => {return String::from("DeviceBusyOrError");},
      DeviceError::InvalidState {..}      => {return String::from("InvalidState");},
      DeviceError::InconsistentState {..} => {return String::from("InconsistentState");},
    }
  }
}

impl fmt::Display for DeviceError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let etype = self.to_string();
    match self {
      DeviceError::InvalidArgument { operation, parameter, value, allowed } => {
        write!(f, "<DeviceError: {} - {}: {} = {}, allowed {}>", etype, operation, parameter, value, allowed)
      }
      DeviceError::DeviceBusyOrError { operation, chip, address, write, attempts, busy, error } => {
        let access = if *write {"write"} else {"read"};
        write!(f, "<DeviceError: {} - {}: {} {} register {:#04x} failed after {} attempts (busy {}, error {})>",
               etype, operation, chip, access, address, attempts, busy, error)
      }
      DeviceError::InvalidState { operation, reason } => {
        write!(f, "<DeviceError: {} - {}: {}>", etype, operation, reason)
      }
      DeviceError::InconsistentState { operation, registers, values } => {
        write!(f, "<DeviceError: {} - {}: register {} reads {:#04x}, register {} reads {:#04x}>",
               etype, operation, registers.0, values.0, registers.1, values.1)
      }
    }
  }
}

impl Error for DeviceError {
}

/// Fail with InvalidArgument if value is not within [min, max]
pub fn ensure_in_range<T>(operation : &'static str,
                          parameter : &'static str,
                          value     : T,
                          min       : T,
                          max       : T) -> Result<(), DeviceError> 
  where T : PartialOrd + fmt::Display {
  if value >= min && value <= max {
    return Ok(());
  }
  warn!("[{}] Refusing {} = {}, outside of [{}, {}]", operation, parameter, value, min, max);
  Err(DeviceError::InvalidArgument {
    operation : operation,
    parameter : parameter,
    value     : format!("{}", value),
    allowed   : format!("[{}, {}]", min, max),
  })
}

#[test]
fn range_check() {
  assert!(ensure_in_range("test", "delay", 15u8, 0, 15).is_ok());
  assert!(ensure_in_range("test", "delay", 16u8, 0, 15).is_err());
  // NaN compares false in both directions
  assert!(ensure_in_range("test", "voltage", f32::NAN, 0.0, 3.3).is_err());
}
