//! Device drivers for the FED9U on-board chips
//!
//! The FED9U carries a TTCrx (clock and trigger receiver)
//! and an ADM1025 (voltage and temperature monitor), both
//! reached through register transactions on the VME bus.
//!
//! * bus             - the transaction interface and the retry protocol
//! * registers       - register addresses and bit masks
//! * ttcrx           - TTCrx controller
//! * voltage_monitor - ADM1025 controller
//! * clock           - the FED clock source, which gates the TTCrx reset
//! * settings        - device settings on disk
//! * simulation      - an in-memory board for tests and offline use
//!
//! The controllers keep a description of what has been
//! written to the chip. The description is only updated
//! after the hardware write went through.

pub mod errors;
pub mod registers;
pub mod bus;
pub mod clock;
pub mod ttcrx;
pub mod voltage_monitor;
pub mod settings;
pub mod simulation;

#[macro_use] extern crate log;

pub use crate::errors::DeviceError;
pub use crate::bus::{
  ChipSelector,
  RegisterAccessor,
  RegisterBus,
  RetryPolicy,
  Transaction,
  TransactionOutcome,
};
pub use crate::clock::{
  ClockSource,
  ClockSourceQuery,
  FedClockSource,
  FixedClockSource,
};
pub use crate::ttcrx::TtcrxController;
pub use crate::voltage_monitor::VoltageMonitorController;
pub use crate::settings::DeviceSettings;
