//! An in-memory stand-in for the board
//!
//! Every register of every device window is a 
//! 32bit word in a map. Busy/error outcomes can
//! be injected to exercise the retry protocol.

use std::collections::HashMap;

use crate::bus::{
  ChipSelector,
  RegisterBus,
  Transaction,
  TransactionOutcome,
};
use crate::registers::*;

#[derive(Debug, Clone)]
pub struct SimulatedBus {
  registers       : HashMap<(ChipSelector, u32), u32>,
  /// bits which can not be changed by a write
  readonly_masks  : HashMap<(ChipSelector, u32), u32>,
  /// the next n transactions report busy
  pub pending_busy  : u32,
  /// the next n transactions report error
  pub pending_error : u32,
  /// every transaction reports busy
  pub stuck_busy    : bool,
  /// every transaction reports error
  pub stuck_error   : bool,
  /// report busy for every transaction once this
  /// many have been issued
  pub busy_after    : Option<usize>,
  pub n_reads       : usize,
  pub n_writes      : usize,
  /// successful writes in order, with the value as issued
  pub write_log     : Vec<(ChipSelector, u32, u32)>,
}

impl SimulatedBus {

  /// A board right after power-up
  pub fn new() -> Self {
    let mut bus = Self {
      registers      : HashMap::<(ChipSelector, u32), u32>::new(),
      readonly_masks : HashMap::<(ChipSelector, u32), u32>::new(),
      pending_busy   : 0,
      pending_error  : 0,
      stuck_busy     : false,
      stuck_error    : false,
      busy_after     : None,
      n_reads        : 0,
      n_writes       : 0,
      write_log      : Vec::<(ChipSelector, u32, u32)>::new(),
    };
    bus.readonly_masks.insert((ChipSelector::Ttcrx, TTCRX_ID_MSB), TTCRX_ID_MSB_MODE_MASK);
    bus.readonly_masks.insert((ChipSelector::Ttcrx, TTCRX_STATUS), 0xff);
    bus.readonly_masks.insert((ChipSelector::VoltageMonitor, ADM_MANUFACTURER_ID), 0xff);
    bus.readonly_masks.insert((ChipSelector::VoltageMonitor, ADM_STEPPING_ID), 0xff);
    // mode bits as strapped on the FED9U
    bus.set_register(ChipSelector::Ttcrx, TTCRX_ID_MSB, 0x80);
    bus.set_register(ChipSelector::Ttcrx, TTCRX_STATUS, (STATUS_DLL_READY | STATUS_PLL_READY) as u32);
    bus.set_register(ChipSelector::Ttcrx, TTCRX_CONFIG_2, TTCRX_HAMMING_ENABLE);
    bus.set_register(ChipSelector::Ttcrx, TTCRX_CONFIG_3, TTCRX_HAMMING_ENABLE);
    bus.set_register(ChipSelector::VoltageMonitor, ADM_MANUFACTURER_ID, 0x41);
    bus.set_register(ChipSelector::VoltageMonitor, ADM_STEPPING_ID, 0x20);
    bus.set_register(ChipSelector::VoltageMonitor, ADM_CONFIG, ADM_CONFIG_START);
    // nominal voltages read as 3/4 of the range
    for reading in [ADM_READ_2V5, ADM_READ_CORE, ADM_READ_3V3, ADM_READ_5V, ADM_READ_12V, ADM_READ_SUPPLY] {
      bus.set_register(ChipSelector::VoltageMonitor, reading, 192);
    }
    bus.set_register(ChipSelector::VoltageMonitor, ADM_READ_EXT_TEMP, 35);
    bus.set_register(ChipSelector::VoltageMonitor, ADM_READ_INT_TEMP, 28);
    bus
  }

  /// Current content of a register
  pub fn register(&self, chip : ChipSelector, address : u32) -> u32 {
    *self.registers.get(&(chip, address)).unwrap_or(&0)
  }

  /// Set a register directly, ignoring read-only bits.
  /// Not counted as transaction.
  pub fn set_register(&mut self, chip : ChipSelector, address : u32, value : u32) {
    self.registers.insert((chip, address), value);
  }

  /// Number of successful writes to one register
  pub fn writes_to(&self, chip : ChipSelector, address : u32) -> usize {
    self.write_log.iter().filter(|(c, a, _)| *c == chip && *a == address).count()
  }
}

impl Default for SimulatedBus {
  fn default() -> Self {
    Self::new()
  }
}

impl RegisterBus for SimulatedBus {
  fn transact(&mut self,
              chip        : ChipSelector,
              address     : u32,
              transaction : Transaction) -> TransactionOutcome {
    let issued = self.n_reads + self.n_writes;
    match transaction {
      Transaction::Read     => self.n_reads  += 1,
      Transaction::Write(_) => self.n_writes += 1,
    }
    let expired = self.busy_after.map_or(false, |n| issued >= n);
    let busy    = self.stuck_busy || expired || self.pending_busy > 0;
    let error   = self.stuck_error || self.pending_error > 0;
    if busy || error {
      self.pending_busy  = self.pending_busy.saturating_sub(1);
      self.pending_error = self.pending_error.saturating_sub(1);
      return TransactionOutcome { data : 0, busy : busy, error : error };
    }
    match transaction {
      Transaction::Read => {
        TransactionOutcome::ok(self.register(chip, address))
      }
      Transaction::Write(value) => {
        let readonly = *self.readonly_masks.get(&(chip, address)).unwrap_or(&0);
        let current  = self.register(chip, address);
        self.registers.insert((chip, address), (current & readonly) | (value & !readonly));
        self.write_log.push((chip, address, value));
        TransactionOutcome::ok(0)
      }
    }
  }
}

#[test]
fn readonly_bits_survive_writes() {
  let mut bus = SimulatedBus::new();
  bus.transact(ChipSelector::Ttcrx, TTCRX_ID_MSB, Transaction::Write(0x3f));
  assert_eq!(bus.register(ChipSelector::Ttcrx, TTCRX_ID_MSB), 0xbf);
}

#[test]
fn injected_failures_are_consumed() {
  let mut bus = SimulatedBus::new();
  bus.pending_error = 2;
  assert!(bus.transact(ChipSelector::Ttcrx, 0, Transaction::Read).error);
  assert!(bus.transact(ChipSelector::Ttcrx, 0, Transaction::Read).error);
  assert!(bus.transact(ChipSelector::Ttcrx, 0, Transaction::Read).is_success());
  assert_eq!(bus.n_reads, 3);
}

#[test]
fn busy_after_some_transactions() {
  let mut bus = SimulatedBus::new();
  bus.busy_after = Some(2);
  assert!(bus.transact(ChipSelector::Ttcrx, 0, Transaction::Write(1)).is_success());
  assert!(bus.transact(ChipSelector::Ttcrx, 0, Transaction::Read).is_success());
  assert!(bus.transact(ChipSelector::Ttcrx, 0, Transaction::Read).busy);
  assert_eq!(bus.write_log.len(), 1);
}
