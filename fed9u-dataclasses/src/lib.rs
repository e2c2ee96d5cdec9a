//! Dataclasses for the FED9U on-board devices
//!
//! A "description" is the configuration snapshot of one
//! chip on the readout board. The device drivers keep
//! a description as an in-memory mirror of what has 
//! successfully been written to the hardware.
//!
//! * `TtcrxDescription`          - TTCrx clock/trigger receiver
//! * `VoltageControlDescription` - ADM1025 voltage monitor
//!

pub mod errors;
pub mod serialization;
pub mod ttcrx;
pub mod voltage;

#[macro_use] extern crate log;

pub use crate::errors::SerializationError;
pub use crate::ttcrx::TtcrxDescription;
pub use crate::voltage::{
  VoltageControlDescription,
  VoltageRail,
  TempChannel,
};

/// Create a randomized instance, for testing
#[cfg(feature = "random")]
pub trait FromRandom {
  fn from_random() -> Self;
}
