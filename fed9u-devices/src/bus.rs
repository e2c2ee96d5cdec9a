//! Register access to the on-board devices
//!
//! The VME transaction layer itself lives elsewhere,
//! here it is only seen through the `RegisterBus`
//! trait: a single read or write of a device register
//! which reports whether the device was busy or 
//! signaled an error.
//!
//! `RegisterAccessor` adds the retry protocol on top.
//! A transaction is repeated while the device reports
//! busy/error, with a short sleep in between, until 
//! the retry budget is exhausted.

use std::fmt;
use std::thread;
use std::time::Duration;
use std::rc::Rc;
use std::cell::RefCell;

use crate::errors::DeviceError;
use crate::registers::{
  TTCRX_MAX_ADDRESS,
  ADM_MAX_ADDRESS,
  FED_MAX_ADDRESS,
};

/// Select the device (and thus the address window)
/// a transaction goes to
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub enum ChipSelector {
  Ttcrx,
  VoltageMonitor,
  /// FPGA registers of the FED itself (clock select,
  /// TTCrx reset line)
  FedSystem,
}

impl ChipSelector {
  /// The highest valid register address of this device
  pub fn max_address(&self) -> u32 {
    match self {
      ChipSelector::Ttcrx          => TTCRX_MAX_ADDRESS,
      ChipSelector::VoltageMonitor => ADM_MAX_ADDRESS,
      ChipSelector::FedSystem      => FED_MAX_ADDRESS,
    }
  }
}

impl fmt::Display for ChipSelector {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let repr = match self {
      ChipSelector::Ttcrx          => "TTCrx",
      ChipSelector::VoltageMonitor => "VoltageMonitor",
      ChipSelector::FedSystem      => "FedSystem",
    };
    write!(f, "<ChipSelector: {}>", repr)
  }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Transaction {
  Read,
  Write(u32),
}

/// The result of a single register transaction.
///
/// `data` is only meaningful for reads.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct TransactionOutcome {
  pub data  : u32,
  pub busy  : bool,
  pub error : bool,
}

impl TransactionOutcome {
  pub fn ok(data : u32) -> Self {
    Self {
      data  : data,
      busy  : false,
      error : false,
    }
  }

  pub fn is_success(&self) -> bool {
    !self.busy && !self.error
  }
}

/// One register transaction against a physical device
pub trait RegisterBus {
  fn transact(&mut self,
              chip        : ChipSelector,
              address     : u32,
              transaction : Transaction) -> TransactionOutcome;
}

impl<B : RegisterBus + ?Sized> RegisterBus for &mut B {
  fn transact(&mut self,
              chip        : ChipSelector,
              address     : u32,
              transaction : Transaction) -> TransactionOutcome {
    (**self).transact(chip, address, transaction)
  }
}

/// Several controllers of the same board can 
/// share one bus handle
impl<B : RegisterBus> RegisterBus for Rc<RefCell<B>> {
  fn transact(&mut self,
              chip        : ChipSelector,
              address     : u32,
              transaction : Transaction) -> TransactionOutcome {
    self.borrow_mut().transact(chip, address, transaction)
  }
}

/// How often and how fast to retry a transaction
#[derive(Debug, Copy, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RetryPolicy {
  /// Maximum number of transactions issued 
  /// before giving up
  pub max_loops : u32,
  /// Sleep between two attempts in microseconds
  pub delay_us  : u64,
}

impl RetryPolicy {
  pub const MAX_LOOPS : u32 = 100;

  pub fn new(max_loops : u32, delay_us : u64) -> Self {
    Self {
      max_loops : max_loops,
      delay_us  : delay_us,
    }
  }

  /// The default policy of each device
  pub fn for_chip(chip : ChipSelector) -> Self {
    match chip {
      ChipSelector::Ttcrx          => Self::new(Self::MAX_LOOPS, 1000),
      ChipSelector::VoltageMonitor => Self::new(Self::MAX_LOOPS, 200),
      ChipSelector::FedSystem      => Self::new(Self::MAX_LOOPS, 100),
    }
  }

  pub fn delay(&self) -> Duration {
    Duration::from_micros(self.delay_us)
  }
}

impl fmt::Display for RetryPolicy {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "<RetryPolicy: {} loops, {} us>", self.max_loops, self.delay_us)
  }
}

/// Register read/write with the retry protocol
///
/// The accessor is bound to one device, however,
/// `read_from`/`write_to` allow to reach into another
/// window of the same bus (e.g. the TTCrx reset line
/// lives in the FED system window).
#[derive(Debug)]
pub struct RegisterAccessor<B : RegisterBus> {
  bus    : B,
  chip   : ChipSelector,
  policy : RetryPolicy,
}

impl<B : RegisterBus> RegisterAccessor<B> {

  pub fn new(bus : B, chip : ChipSelector) -> Self {
    Self::with_policy(bus, chip, RetryPolicy::for_chip(chip))
  }

  pub fn with_policy(bus : B, chip : ChipSelector, policy : RetryPolicy) -> Self {
    Self {
      bus    : bus,
      chip   : chip,
      policy : policy,
    }
  }

  pub fn chip(&self) -> ChipSelector {
    self.chip
  }

  pub fn policy(&self) -> RetryPolicy {
    self.policy
  }

  pub fn bus(&self) -> &B {
    &self.bus
  }
  
  pub fn bus_mut(&mut self) -> &mut B {
    &mut self.bus
  }

  pub fn into_bus(self) -> B {
    self.bus
  }

  /// `operation` names the caller in errors and logs
  pub fn read(&mut self, operation : &'static str, address : u32) -> Result<u32, DeviceError> {
    self.read_from(operation, self.chip, address)
  }

  pub fn write(&mut self, operation : &'static str, address : u32, value : u32) -> Result<(), DeviceError> {
    self.write_to(operation, self.chip, address, value)
  }

  pub fn read_from(&mut self,
                   operation : &'static str,
                   chip      : ChipSelector,
                   address   : u32) -> Result<u32, DeviceError> {
    self.execute(operation, chip, address, Transaction::Read)
  }

  pub fn write_to(&mut self,
                  operation : &'static str,
                  chip      : ChipSelector,
                  address   : u32,
                  value     : u32) -> Result<(), DeviceError> {
    self.execute(operation, chip, address, Transaction::Write(value))?;
    Ok(())
  }

  fn execute(&mut self,
             operation   : &'static str,
             chip        : ChipSelector,
             address     : u32,
             transaction : Transaction) -> Result<u32, DeviceError> {
    let write = transaction != Transaction::Read;
    if address > chip.max_address() {
      error!("[{}] Register address {:#04x} out of range for {}!", operation, address, chip);
      return Err(DeviceError::InvalidArgument {
        operation : operation,
        parameter : "register address",
        value     : format!("{:#04x}", address),
        allowed   : format!("[0x00, {:#04x}]", chip.max_address()),
      });
    }
    let max_loops = self.policy.max_loops.max(1);
    let mut last  = TransactionOutcome::default();
    for attempt in 1..=max_loops {
      last = self.bus.transact(chip, address, transaction);
      if last.is_success() {
        trace!("[{}] {} {:?} at {:#04x} -> {:#04x} (attempt {})", operation, chip, transaction, address, last.data, attempt);
        return Ok(last.data);
      }
      trace!("[{}] {} {:?} at {:#04x} busy {} error {} (attempt {})", operation, chip, transaction, address, last.busy, last.error, attempt);
      if attempt < max_loops {
        thread::sleep(self.policy.delay());
      }
    }
    error!("[{}] {} {:?} at {:#04x} failed after {} attempts! busy {}, error {}",
           operation, chip, transaction, address, max_loops, last.busy, last.error);
    Err(DeviceError::DeviceBusyOrError {
      operation : operation,
      chip      : chip,
      address   : address,
      write     : write,
      attempts  : max_loops,
      busy      : last.busy,
      error     : last.error,
    })
  }
}
