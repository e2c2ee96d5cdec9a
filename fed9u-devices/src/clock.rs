//! Which clock drives the FED
//!
//! The TTCrx must not be reset while it provides
//! the clock, so the reset path asks for the 
//! currently selected source first.

use std::fmt;

use crate::bus::{
  ChipSelector,
  RegisterAccessor,
  RegisterBus,
  RetryPolicy,
};
use crate::errors::DeviceError;
use crate::registers::{
  FED_CLOCK_SELECT,
  FED_CLOCK_INTERNAL,
  FED_CLOCK_TTC,
  FED_CLOCK_BACKPLANE,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub enum ClockSource {
  Internal,
  Ttc,
  Backplane,
}

impl fmt::Display for ClockSource {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let repr = match self {
      ClockSource::Internal  => "Internal",
      ClockSource::Ttc       => "TTC",
      ClockSource::Backplane => "Backplane",
    };
    write!(f, "<ClockSource: {}>", repr)
  }
}

pub trait ClockSourceQuery {
  fn clock_source(&mut self) -> Result<ClockSource, DeviceError>;
}

/// Always answers with the same source
#[derive(Debug, Copy, Clone)]
pub struct FixedClockSource(pub ClockSource);

impl ClockSourceQuery for FixedClockSource {
  fn clock_source(&mut self) -> Result<ClockSource, DeviceError> {
    Ok(self.0)
  }
}

/// Read the clock select register of the FED
pub struct FedClockSource<B : RegisterBus> {
  accessor : RegisterAccessor<B>,
}

impl<B : RegisterBus> FedClockSource<B> {
  pub fn new(bus : B) -> Self {
    Self {
      accessor : RegisterAccessor::new(bus, ChipSelector::FedSystem),
    }
  }
  
  pub fn with_policy(bus : B, policy : RetryPolicy) -> Self {
    Self {
      accessor : RegisterAccessor::with_policy(bus, ChipSelector::FedSystem, policy),
    }
  }
}

impl<B : RegisterBus> ClockSourceQuery for FedClockSource<B> {
  fn clock_source(&mut self) -> Result<ClockSource, DeviceError> {
    let value = self.accessor.read("clock_source", FED_CLOCK_SELECT)? & 0x3;
    match value {
      FED_CLOCK_INTERNAL  => Ok(ClockSource::Internal),
      FED_CLOCK_TTC       => Ok(ClockSource::Ttc),
      FED_CLOCK_BACKPLANE => Ok(ClockSource::Backplane),
      _ => {
        Err(DeviceError::InvalidState {
          operation : "clock_source",
          reason    : format!("clock select register holds unknown source {}", value),
        })
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::simulation::SimulatedBus;

  #[test]
  fn read_clock_select() {
    let mut bus = SimulatedBus::new();
    bus.set_register(ChipSelector::FedSystem, FED_CLOCK_SELECT, FED_CLOCK_TTC);
    let mut source = FedClockSource::new(bus);
    assert_eq!(source.clock_source(), Ok(ClockSource::Ttc));
  }

  #[test]
  fn unknown_clock_select() {
    let mut bus = SimulatedBus::new();
    bus.set_register(ChipSelector::FedSystem, FED_CLOCK_SELECT, 3);
    let mut source = FedClockSource::new(bus);
    assert!(matches!(source.clock_source(), Err(DeviceError::InvalidState {..})));
  }
}
