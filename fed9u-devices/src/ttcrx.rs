//! Driver for the TTCrx clock and trigger receiver
//!
//! The chip holds its configuration in byte wide
//! registers, several parameters share one register.
//! Whenever only one of them changes, the others are
//! taken from the in-memory description (the mirror),
//! never from a fresh hardware read.
//!
//! The mirror is only updated after the hardware
//! write went through. Getters read the hardware.
//!
//!  For the mapping of registers/addresses,
//!  see `registers.rs`

use std::fmt;

use fed9u_dataclasses::TtcrxDescription;

use crate::bus::{
  ChipSelector,
  RegisterAccessor,
  RegisterBus,
  RetryPolicy,
};
use crate::clock::{
  ClockSource,
  ClockSourceQuery,
};
use crate::errors::{
  DeviceError,
  ensure_in_range,
};
use crate::registers::*;

/// The two deskewed 40MHz clocks
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeskewClock {
  One,
  Two,
}

impl DeskewClock {
  pub fn register(&self) -> u32 {
    match self {
      DeskewClock::One => TTCRX_FINE_DELAY_1,
      DeskewClock::Two => TTCRX_FINE_DELAY_2,
    }
  }
}

/// Translate a fine delay (0-239, ~104ps steps) into
/// the register content of the given deskewed clock.
///
/// The chip uses two counters, n (0-14) and m (0-15),
/// with the delay being (15m + 16n + 30) mod 240.
pub fn encode_fine_delay(delay : u8, clock : DeskewClock) -> u8 {
  let d = delay as u32;
  let n = d % 15;
  let m = (d / 15 + 14 - n) % 16;
  let value = match clock {
    DeskewClock::One => (n << 4) | m,
    DeskewClock::Two => (m << 4) | n,
  };
  value as u8
}

/// Inverse of `encode_fine_delay`
pub fn decode_fine_delay(value : u8, clock : DeskewClock) -> u8 {
  let (m, n) = match clock {
    DeskewClock::One => ((value & 0xf) as u32, (value >> 4) as u32),
    DeskewClock::Two => ((value >> 4) as u32, (value & 0xf) as u32),
  };
  ((15 * m + 16 * n + 30) % 240) as u8
}

/// Register 2, both coarse delays
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CoarseDelays {
  pub l1accept      : u8,
  pub brcst_str_two : u8,
}

impl CoarseDelays {
  pub fn pack(&self) -> u32 {
    ((self.brcst_str_two as u32 & 0xf) << 4) | (self.l1accept as u32 & 0xf)
  }

  pub fn unpack(value : u32) -> Self {
    Self {
      l1accept      : (value & 0xf) as u8,
      brcst_str_two : ((value >> 4) & 0xf) as u8,
    }
  }

  fn from_description(desc : &TtcrxDescription) -> Self {
    Self {
      l1accept      : desc.l1accept_coarse_delay,
      brcst_str_two : desc.brcst_str_two_coarse_delay,
    }
  }
}

/// Register 19, DLL and PLL charge pump currents
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PumpCurrents {
  pub dll : u8,
  pub pll : u8,
}

impl PumpCurrents {
  pub fn pack(&self) -> u32 {
    ((self.pll as u32 & 0x7) << 3) | (self.dll as u32 & 0x7)
  }

  pub fn unpack(value : u32) -> Self {
    Self {
      dll : (value & 0x7) as u8,
      pll : ((value >> 3) & 0x7) as u8,
    }
  }

  fn from_description(desc : &TtcrxDescription) -> Self {
    Self {
      dll : desc.dll_pump_current,
      pll : desc.pll_pump_current,
    }
  }
}

/// Register 3, the control register
///
/// The chip has enable bits for the outputs, the
/// description keeps "disable" flags.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ControlRegister {
  pub counter_operation          : u8,
  pub deskewed_clock2_selected   : bool,
  pub deskewed_clock2_disable    : bool,
  pub clock_l1accept_disable     : bool,
  pub parallel_output_disable    : bool,
  pub serial_b_disable           : bool,
  pub non_deskewed_clock_disable : bool,
}

impl ControlRegister {
  pub fn pack(&self) -> u32 {
    let mut value = self.counter_operation as u32 & CTRL_COUNTER_OPERATION;
    if self.deskewed_clock2_selected    { value |= CTRL_SELECT_CLOCK_DES2; }
    if !self.deskewed_clock2_disable    { value |= CTRL_ENABLE_CLOCK_DES2; }
    if !self.clock_l1accept_disable     { value |= CTRL_ENABLE_CLOCK_L1A; }
    if !self.parallel_output_disable    { value |= CTRL_ENABLE_PARALLEL_BUS; }
    if !self.serial_b_disable           { value |= CTRL_ENABLE_SERIAL_B; }
    if !self.non_deskewed_clock_disable { value |= CTRL_ENABLE_CLOCK40; }
    value
  }

  pub fn unpack(value : u32) -> Self {
    Self {
      counter_operation          : (value & CTRL_COUNTER_OPERATION) as u8,
      deskewed_clock2_selected   : value & CTRL_SELECT_CLOCK_DES2   != 0,
      deskewed_clock2_disable    : value & CTRL_ENABLE_CLOCK_DES2   == 0,
      clock_l1accept_disable     : value & CTRL_ENABLE_CLOCK_L1A    == 0,
      parallel_output_disable    : value & CTRL_ENABLE_PARALLEL_BUS == 0,
      serial_b_disable           : value & CTRL_ENABLE_SERIAL_B     == 0,
      non_deskewed_clock_disable : value & CTRL_ENABLE_CLOCK40      == 0,
    }
  }

  pub fn from_description(desc : &TtcrxDescription) -> Self {
    Self {
      counter_operation          : desc.counter_operation,
      deskewed_clock2_selected   : desc.deskewed_clock2_selected,
      deskewed_clock2_disable    : desc.deskewed_clock2_disable,
      clock_l1accept_disable     : desc.clock_l1accept_disable,
      parallel_output_disable    : desc.parallel_output_disable,
      serial_b_disable           : desc.serial_b_disable,
      non_deskewed_clock_disable : desc.non_deskewed_clock_disable,
    }
  }

  pub fn apply_to(&self, desc : &mut TtcrxDescription) {
    desc.counter_operation          = self.counter_operation;
    desc.deskewed_clock2_selected   = self.deskewed_clock2_selected;
    desc.deskewed_clock2_disable    = self.deskewed_clock2_disable;
    desc.clock_l1accept_disable     = self.clock_l1accept_disable;
    desc.parallel_output_disable    = self.parallel_output_disable;
    desc.serial_b_disable           = self.serial_b_disable;
    desc.non_deskewed_clock_disable = self.non_deskewed_clock_disable;
  }
}

/// Select the counters to reset with `set_counter_reset`
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct CounterResetFlags {
  /// single bit, double bit and SEU error counters
  pub error_counters  : bool,
  pub bunch_counter   : bool,
  pub event_counter   : bool,
  pub status_register : bool,
}

impl CounterResetFlags {
  pub fn all() -> Self {
    Self {
      error_counters  : true,
      bunch_counter   : true,
      event_counter   : true,
      status_register : true,
    }
  }

  /// The registers to write, in order
  pub fn registers(&self) -> Vec<u32> {
    let mut regs = Vec::<u32>::new();
    if self.error_counters {
      regs.extend_from_slice(&[TTCRX_SINGLE_ERR_CNT_LSB,
                               TTCRX_SINGLE_ERR_CNT_MSB,
                               TTCRX_DOUBLE_ERR_CNT,
                               TTCRX_SEU_ERR_CNT]);
    }
    if self.bunch_counter {
      regs.extend_from_slice(&[TTCRX_BUNCH_CNT_LSB, TTCRX_BUNCH_CNT_MSB]);
    }
    if self.event_counter {
      regs.extend_from_slice(&[TTCRX_EVENT_CNT_LSB,
                               TTCRX_EVENT_CNT_MID,
                               TTCRX_EVENT_CNT_MSB]);
    }
    if self.status_register {
      regs.push(TTCRX_STATUS);
    }
    regs
  }
}

/// Content of the TTCrx status register
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TtcrxStatus(pub u8);

impl TtcrxStatus {
  pub fn auto_reset(&self) -> bool {
    self.0 & STATUS_AUTO_RESET != 0
  }

  pub fn frame_synch(&self) -> bool {
    self.0 & STATUS_FRAME_SYNCH != 0
  }

  pub fn dll_ready(&self) -> bool {
    self.0 & STATUS_DLL_READY != 0
  }

  pub fn pll_ready(&self) -> bool {
    self.0 & STATUS_PLL_READY != 0
  }
}

impl fmt::Display for TtcrxStatus {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "<TtcrxStatus: {:#04x} (auto reset {}, frame synch {}, DLL ready {}, PLL ready {})>",
           self.0, self.auto_reset(), self.frame_synch(), self.dll_ready(), self.pll_ready())
  }
}

fn check_description(operation : &'static str, desc : &TtcrxDescription) -> Result<(), DeviceError> {
  if desc.is_valid() {
    return Ok(());
  }
  error!("[{}] Refusing invalid description {}", operation, desc);
  Err(DeviceError::InvalidArgument {
    operation : operation,
    parameter : "description",
    value     : format!("{:?}", desc),
    allowed   : String::from("all fields within the TTCrx ranges"),
  })
}

/// Get/set every TTCrx parameter in physical units
pub struct TtcrxController<B : RegisterBus> {
  accessor    : RegisterAccessor<B>,
  description : TtcrxDescription,
}

impl<B : RegisterBus> TtcrxController<B> {

  /// The description is taken as the current state
  /// of the hardware, nothing is written. Partial
  /// setters pack its fields into the registers, so
  /// it has to be within the chip ranges.
  pub fn new(bus : B, description : TtcrxDescription) -> Result<Self, DeviceError> {
    let policy = RetryPolicy::for_chip(ChipSelector::Ttcrx);
    Self::with_policy(bus, description, policy)
  }

  pub fn with_policy(bus : B,
                     description : TtcrxDescription,
                     policy      : RetryPolicy) -> Result<Self, DeviceError> {
    check_description("TtcrxController::new", &description)?;
    Ok(Self {
      accessor    : RegisterAccessor::with_policy(bus, ChipSelector::Ttcrx, policy),
      description : description,
    })
  }

  /// What has successfully been written so far
  pub fn description(&self) -> &TtcrxDescription {
    &self.description
  }

  pub fn bus(&self) -> &B {
    self.accessor.bus()
  }

  pub fn bus_mut(&mut self) -> &mut B {
    self.accessor.bus_mut()
  }

  pub fn into_bus(self) -> B {
    self.accessor.into_bus()
  }

  fn read_byte(&mut self, operation : &'static str, address : u32) -> Result<u8, DeviceError> {
    Ok((self.accessor.read(operation, address)? & 0xff) as u8)
  }

  // ----------- coarse delays ---------------

  pub fn set_l1accept_coarse_delay(&mut self, delay : u8) -> Result<(), DeviceError> {
    ensure_in_range("set_l1accept_coarse_delay", "delay", delay, 0, TtcrxDescription::MAX_COARSE_DELAY)?;
    let mut delays = CoarseDelays::from_description(&self.description);
    delays.l1accept = delay;
    self.accessor.write("set_l1accept_coarse_delay", TTCRX_COARSE_DELAY, delays.pack())?;
    self.description.l1accept_coarse_delay = delay;
    debug!("L1Accept coarse delay set to {}", delay);
    Ok(())
  }

  pub fn get_l1accept_coarse_delay(&mut self) -> Result<u8, DeviceError> {
    let value = self.accessor.read("get_l1accept_coarse_delay", TTCRX_COARSE_DELAY)?;
    Ok(CoarseDelays::unpack(value).l1accept)
  }

  pub fn set_brcst_str_two_coarse_delay(&mut self, delay : u8) -> Result<(), DeviceError> {
    ensure_in_range("set_brcst_str_two_coarse_delay", "delay", delay, 0, TtcrxDescription::MAX_COARSE_DELAY)?;
    let mut delays = CoarseDelays::from_description(&self.description);
    delays.brcst_str_two = delay;
    self.accessor.write("set_brcst_str_two_coarse_delay", TTCRX_COARSE_DELAY, delays.pack())?;
    self.description.brcst_str_two_coarse_delay = delay;
    debug!("BrcstStr2 coarse delay set to {}", delay);
    Ok(())
  }

  pub fn get_brcst_str_two_coarse_delay(&mut self) -> Result<u8, DeviceError> {
    let value = self.accessor.read("get_brcst_str_two_coarse_delay", TTCRX_COARSE_DELAY)?;
    Ok(CoarseDelays::unpack(value).brcst_str_two)
  }

  // ----------- fine delays -----------------

  fn set_fine_delay(&mut self,
                    operation : &'static str,
                    clock     : DeskewClock,
                    delay     : u8) -> Result<(), DeviceError> {
    ensure_in_range(operation, "delay", delay, 0, TtcrxDescription::MAX_FINE_DELAY)?;
    let value = encode_fine_delay(delay, clock);
    self.accessor.write(operation, clock.register(), value as u32)?;
    match clock {
      DeskewClock::One => self.description.clock_des_one_fine_delay = delay,
      DeskewClock::Two => self.description.clock_des_two_fine_delay = delay,
    }
    debug!("Fine delay of deskewed clock {:?} set to {} (register {:#04x})", clock, delay, value);
    Ok(())
  }

  pub fn set_clock_des_one_fine_delay(&mut self, delay : u8) -> Result<(), DeviceError> {
    self.set_fine_delay("set_clock_des_one_fine_delay", DeskewClock::One, delay)
  }

  pub fn get_clock_des_one_fine_delay(&mut self) -> Result<u8, DeviceError> {
    let value = self.read_byte("get_clock_des_one_fine_delay", TTCRX_FINE_DELAY_1)?;
    Ok(decode_fine_delay(value, DeskewClock::One))
  }

  pub fn set_clock_des_two_fine_delay(&mut self, delay : u8) -> Result<(), DeviceError> {
    self.set_fine_delay("set_clock_des_two_fine_delay", DeskewClock::Two, delay)
  }

  pub fn get_clock_des_two_fine_delay(&mut self) -> Result<u8, DeviceError> {
    let value = self.read_byte("get_clock_des_two_fine_delay", TTCRX_FINE_DELAY_2)?;
    Ok(decode_fine_delay(value, DeskewClock::Two))
  }

  // ----------- combined delays -------------

  /// Coarse delay of the L1Accept and fine delay of
  /// the deskewed clock 1
  pub fn set_l1accept_delay(&mut self, coarse : u8, fine : u8) -> Result<(), DeviceError> {
    ensure_in_range("set_l1accept_delay", "coarse", coarse, 0, TtcrxDescription::MAX_COARSE_DELAY)?;
    ensure_in_range("set_l1accept_delay", "fine", fine, 0, TtcrxDescription::MAX_FINE_DELAY)?;
    self.set_l1accept_coarse_delay(coarse)?;
    self.set_clock_des_one_fine_delay(fine)
  }

  /// Coarse delay of the broadcast strobe 2. The fine
  /// delay goes to whichever deskewed clock the strobe
  /// is currently synchronized to.
  pub fn set_brcst_str_two_delay(&mut self, coarse : u8, fine : u8) -> Result<(), DeviceError> {
    ensure_in_range("set_brcst_str_two_delay", "coarse", coarse, 0, TtcrxDescription::MAX_COARSE_DELAY)?;
    ensure_in_range("set_brcst_str_two_delay", "fine", fine, 0, TtcrxDescription::MAX_FINE_DELAY)?;
    self.set_brcst_str_two_coarse_delay(coarse)?;
    if self.description.deskewed_clock2_selected {
      self.set_clock_des_two_fine_delay(fine)
    } else {
      self.set_clock_des_one_fine_delay(fine)
    }
  }

  // ----------- pump currents ---------------

  pub fn set_dll_pump_current(&mut self, current : u8) -> Result<(), DeviceError> {
    ensure_in_range("set_dll_pump_current", "current", current,
                    TtcrxDescription::MIN_PUMP_CURRENT, TtcrxDescription::MAX_PUMP_CURRENT)?;
    let mut currents = PumpCurrents::from_description(&self.description);
    currents.dll = current;
    self.accessor.write("set_dll_pump_current", TTCRX_CONFIG_1, currents.pack())?;
    self.description.dll_pump_current = current;
    debug!("DLL pump current set to {}", current);
    Ok(())
  }

  pub fn get_dll_pump_current(&mut self) -> Result<u8, DeviceError> {
    let value = self.accessor.read("get_dll_pump_current", TTCRX_CONFIG_1)?;
    Ok(PumpCurrents::unpack(value).dll)
  }

  pub fn set_pll_pump_current(&mut self, current : u8) -> Result<(), DeviceError> {
    ensure_in_range("set_pll_pump_current", "current", current,
                    TtcrxDescription::MIN_PUMP_CURRENT, TtcrxDescription::MAX_PUMP_CURRENT)?;
    let mut currents = PumpCurrents::from_description(&self.description);
    currents.pll = current;
    self.accessor.write("set_pll_pump_current", TTCRX_CONFIG_1, currents.pack())?;
    self.description.pll_pump_current = current;
    debug!("PLL pump current set to {}", current);
    Ok(())
  }

  pub fn get_pll_pump_current(&mut self) -> Result<u8, DeviceError> {
    let value = self.accessor.read("get_pll_pump_current", TTCRX_CONFIG_1)?;
    Ok(PumpCurrents::unpack(value).pll)
  }

  // ----------- ids -------------------------

  /// The upper two bits of the id MSB register are
  /// mode bits, only the lower six bits are written.
  pub fn set_iac_id(&mut self, id : u16) -> Result<(), DeviceError> {
    ensure_in_range("set_iac_id", "id", id, 0, TtcrxDescription::MAX_IAC_ID)?;
    self.accessor.write("set_iac_id", TTCRX_ID_LSB, (id & 0xff) as u32)?;
    self.accessor.write("set_iac_id", TTCRX_ID_MSB, (id >> 8) as u32 & TTCRX_ID_MSB_MASK)?;
    self.description.iac_id = id;
    debug!("IAC id set to {}", id);
    Ok(())
  }

  pub fn get_iac_id(&mut self) -> Result<u16, DeviceError> {
    let lsb = self.accessor.read("get_iac_id", TTCRX_ID_LSB)? & 0xff;
    let msb = self.accessor.read("get_iac_id", TTCRX_ID_MSB)? & TTCRX_ID_MSB_MASK;
    Ok(((msb << 8) | lsb) as u16)
  }

  pub fn set_i2c_id(&mut self, id : u8) -> Result<(), DeviceError> {
    ensure_in_range("set_i2c_id", "id", id, 0, TtcrxDescription::MAX_I2C_ID)?;
    self.accessor.write("set_i2c_id", TTCRX_I2C_ID, id as u32 & 0x3f)?;
    self.description.i2c_id = id;
    debug!("I2C id set to {}", id);
    Ok(())
  }

  pub fn get_i2c_id(&mut self) -> Result<u8, DeviceError> {
    Ok((self.accessor.read("get_i2c_id", TTCRX_I2C_ID)? & 0x3f) as u8)
  }

  // ----------- control register ------------

  /// Write the complete control register and take
  /// it over into the mirror
  fn write_control_register(&mut self, operation : &'static str, control : ControlRegister) -> Result<(), DeviceError> {
    self.accessor.write(operation, TTCRX_CONTROL, control.pack())?;
    control.apply_to(&mut self.description);
    debug!("Control register set to {:#04x}", control.pack());
    Ok(())
  }

  fn read_control_register(&mut self, operation : &'static str) -> Result<ControlRegister, DeviceError> {
    let value = self.accessor.read(operation, TTCRX_CONTROL)?;
    Ok(ControlRegister::unpack(value))
  }

  /// bit 0 - enable bunch counter, bit 1 - enable event counter
  pub fn set_counter_operation(&mut self, operation : u8) -> Result<(), DeviceError> {
    ensure_in_range("set_counter_operation", "operation", operation, 0, TtcrxDescription::MAX_COUNTER_OP)?;
    let mut control = ControlRegister::from_description(&self.description);
    control.counter_operation = operation;
    self.write_control_register("set_counter_operation", control)
  }

  pub fn get_counter_operation(&mut self) -> Result<u8, DeviceError> {
    Ok(self.read_control_register("get_counter_operation")?.counter_operation)
  }

  /// Synchronize the broadcast strobe 2 to the deskewed clock 2
  /// (instead of clock 1)
  pub fn set_deskewed_clock2_selected(&mut self, selected : bool) -> Result<(), DeviceError> {
    let mut control = ControlRegister::from_description(&self.description);
    control.deskewed_clock2_selected = selected;
    self.write_control_register("set_deskewed_clock2_selected", control)
  }

  pub fn get_deskewed_clock2_selected(&mut self) -> Result<bool, DeviceError> {
    Ok(self.read_control_register("get_deskewed_clock2_selected")?.deskewed_clock2_selected)
  }

  pub fn set_deskewed_clock2_disable(&mut self, disable : bool) -> Result<(), DeviceError> {
    let mut control = ControlRegister::from_description(&self.description);
    control.deskewed_clock2_disable = disable;
    self.write_control_register("set_deskewed_clock2_disable", control)
  }

  pub fn get_deskewed_clock2_disable(&mut self) -> Result<bool, DeviceError> {
    Ok(self.read_control_register("get_deskewed_clock2_disable")?.deskewed_clock2_disable)
  }

  pub fn set_clock_l1accept_disable(&mut self, disable : bool) -> Result<(), DeviceError> {
    let mut control = ControlRegister::from_description(&self.description);
    control.clock_l1accept_disable = disable;
    self.write_control_register("set_clock_l1accept_disable", control)
  }

  pub fn get_clock_l1accept_disable(&mut self) -> Result<bool, DeviceError> {
    Ok(self.read_control_register("get_clock_l1accept_disable")?.clock_l1accept_disable)
  }

  pub fn set_parallel_output_disable(&mut self, disable : bool) -> Result<(), DeviceError> {
    let mut control = ControlRegister::from_description(&self.description);
    control.parallel_output_disable = disable;
    self.write_control_register("set_parallel_output_disable", control)
  }

  pub fn get_parallel_output_disable(&mut self) -> Result<bool, DeviceError> {
    Ok(self.read_control_register("get_parallel_output_disable")?.parallel_output_disable)
  }

  pub fn set_serial_b_disable(&mut self, disable : bool) -> Result<(), DeviceError> {
    let mut control = ControlRegister::from_description(&self.description);
    control.serial_b_disable = disable;
    self.write_control_register("set_serial_b_disable", control)
  }

  pub fn get_serial_b_disable(&mut self) -> Result<bool, DeviceError> {
    Ok(self.read_control_register("get_serial_b_disable")?.serial_b_disable)
  }

  pub fn set_non_deskewed_clock_disable(&mut self, disable : bool) -> Result<(), DeviceError> {
    let mut control = ControlRegister::from_description(&self.description);
    control.non_deskewed_clock_disable = disable;
    self.write_control_register("set_non_deskewed_clock_disable", control)
  }

  pub fn get_non_deskewed_clock_disable(&mut self) -> Result<bool, DeviceError> {
    Ok(self.read_control_register("get_non_deskewed_clock_disable")?.non_deskewed_clock_disable)
  }

  // ----------- hamming checking ------------

  /// The enable bit is kept in two registers, whose
  /// other bits are not part of the description. Both
  /// registers are read first and written back with only
  /// the enable bit changed, which costs two extra
  /// transactions.
  ///
  /// If the second write fails, the registers are left
  /// disagreeing and `get_hamming_checking_disable` reports
  /// `InconsistentState` until the setter succeeds. The
  /// description is only updated after both writes.
  pub fn set_hamming_checking_disable(&mut self, disable : bool) -> Result<(), DeviceError> {
    let operation = "set_hamming_checking_disable";
    let config2   = self.accessor.read(operation, TTCRX_CONFIG_2)? & 0xff;
    let config3   = self.accessor.read(operation, TTCRX_CONFIG_3)? & 0xff;
    for (address, current) in [(TTCRX_CONFIG_2, config2), (TTCRX_CONFIG_3, config3)] {
      let value = if disable {
        current & !TTCRX_HAMMING_ENABLE
      } else {
        current | TTCRX_HAMMING_ENABLE
      };
      self.accessor.write(operation, address, value)?;
    }
    self.description.hamming_checking_disable = disable;
    debug!("Hamming checking disable set to {}", disable);
    Ok(())
  }

  /// Fails if the two copies of the enable bit disagree
  pub fn get_hamming_checking_disable(&mut self) -> Result<bool, DeviceError> {
    let config2 = self.accessor.read("get_hamming_checking_disable", TTCRX_CONFIG_2)? & 0xff;
    let config3 = self.accessor.read("get_hamming_checking_disable", TTCRX_CONFIG_3)? & 0xff;
    let enabled2 = config2 & TTCRX_HAMMING_ENABLE != 0;
    let enabled3 = config3 & TTCRX_HAMMING_ENABLE != 0;
    if enabled2 != enabled3 {
      error!("Hamming checking enable bits disagree! Config 2 {:#04x}, config 3 {:#04x}", config2, config3);
      return Err(DeviceError::InconsistentState {
        operation : "get_hamming_checking_disable",
        registers : (TTCRX_CONFIG_2, TTCRX_CONFIG_3),
        values    : (config2, config3),
      });
    }
    Ok(!enabled2)
  }

  // ----------- reset -----------------------

  /// Pulse the TTCrx reset line.
  ///
  /// Refused while the TTC clock drives the FED,
  /// since the chip itself provides that clock.
  /// The hardware returns to its power-up values,
  /// the description is left as it is. Use
  /// `apply_description` to restore it.
  ///
  /// # Arguments
  ///
  /// * clock    : tells the currently selected clock
  /// * internal : reset issued by the FED (true) or
  ///              armed for the external line (false)
  pub fn send_reset(&mut self,
                    clock    : &mut dyn ClockSourceQuery,
                    internal : bool) -> Result<(), DeviceError> {
    let source = clock.clock_source()?;
    if source == ClockSource::Ttc {
      warn!("Refusing to reset the TTCrx, it is providing the clock! {}", source);
      return Err(DeviceError::InvalidState {
        operation : "send_reset",
        reason    : String::from("the TTC clock is selected"),
      });
    }
    let value = if internal {FED_TTCRX_RESET_INTERNAL} else {FED_TTCRX_RESET_EXTERNAL};
    self.accessor.write_to("send_reset", ChipSelector::FedSystem, FED_TTCRX_RESET, value)?;
    info!("TTCrx reset sent (internal {}), clock source {}", internal, source);
    Ok(())
  }

  // ----------- counters and status ---------

  /// 12 bit bunch counter
  pub fn get_bunch_counter(&mut self) -> Result<u16, DeviceError> {
    let lsb = self.accessor.read("get_bunch_counter", TTCRX_BUNCH_CNT_LSB)? & 0xff;
    let msb = self.accessor.read("get_bunch_counter", TTCRX_BUNCH_CNT_MSB)? & 0xf;
    Ok(((msb << 8) | lsb) as u16)
  }

  /// 24 bit event counter
  pub fn get_event_counter(&mut self) -> Result<u32, DeviceError> {
    let lsb = self.accessor.read("get_event_counter", TTCRX_EVENT_CNT_LSB)? & 0xff;
    let mid = self.accessor.read("get_event_counter", TTCRX_EVENT_CNT_MID)? & 0xff;
    let msb = self.accessor.read("get_event_counter", TTCRX_EVENT_CNT_MSB)? & 0xff;
    Ok((msb << 16) | (mid << 8) | lsb)
  }

  pub fn get_single_bit_error_count(&mut self) -> Result<u16, DeviceError> {
    let lsb = self.accessor.read("get_single_bit_error_count", TTCRX_SINGLE_ERR_CNT_LSB)? & 0xff;
    let msb = self.accessor.read("get_single_bit_error_count", TTCRX_SINGLE_ERR_CNT_MSB)? & 0xff;
    Ok(((msb << 8) | lsb) as u16)
  }

  pub fn get_double_bit_error_count(&mut self) -> Result<u8, DeviceError> {
    self.read_byte("get_double_bit_error_count", TTCRX_DOUBLE_ERR_CNT)
  }

  pub fn get_seu_error_count(&mut self) -> Result<u8, DeviceError> {
    self.read_byte("get_seu_error_count", TTCRX_SEU_ERR_CNT)
  }

  pub fn get_status_register(&mut self) -> Result<TtcrxStatus, DeviceError> {
    Ok(TtcrxStatus(self.read_byte("get_status_register", TTCRX_STATUS)?))
  }

  /// Reset the selected counters. The first failing write
  /// aborts, counters before it have been reset already.
  pub fn set_counter_reset(&mut self, flags : CounterResetFlags) -> Result<(), DeviceError> {
    for address in flags.registers() {
      self.accessor.write("set_counter_reset", address, TTCRX_COUNTER_RESET_VALUE)?;
    }
    debug!("Counters reset {:?}", flags);
    Ok(())
  }

  // ----------- whole description -----------

  /// Write every parameter of the description
  /// to the hardware
  pub fn apply_description(&mut self, desc : &TtcrxDescription) -> Result<(), DeviceError> {
    check_description("apply_description", desc)?;
    self.set_l1accept_coarse_delay(desc.l1accept_coarse_delay)?;
    self.set_brcst_str_two_coarse_delay(desc.brcst_str_two_coarse_delay)?;
    self.set_clock_des_one_fine_delay(desc.clock_des_one_fine_delay)?;
    self.set_clock_des_two_fine_delay(desc.clock_des_two_fine_delay)?;
    self.set_dll_pump_current(desc.dll_pump_current)?;
    self.set_pll_pump_current(desc.pll_pump_current)?;
    self.set_iac_id(desc.iac_id)?;
    self.set_i2c_id(desc.i2c_id)?;
    self.set_hamming_checking_disable(desc.hamming_checking_disable)?;
    self.write_control_register("apply_description", ControlRegister::from_description(desc))?;
    info!("Applied TTCrx description");
    Ok(())
  }

  /// Assemble a description from what the
  /// hardware currently holds
  pub fn read_hardware_description(&mut self) -> Result<TtcrxDescription, DeviceError> {
    let mut desc = TtcrxDescription::new();
    let delays   = CoarseDelays::unpack(self.accessor.read("read_hardware_description", TTCRX_COARSE_DELAY)?);
    desc.l1accept_coarse_delay      = delays.l1accept;
    desc.brcst_str_two_coarse_delay = delays.brcst_str_two;
    desc.clock_des_one_fine_delay   = self.get_clock_des_one_fine_delay()?;
    desc.clock_des_two_fine_delay   = self.get_clock_des_two_fine_delay()?;
    let currents = PumpCurrents::unpack(self.accessor.read("read_hardware_description", TTCRX_CONFIG_1)?);
    desc.dll_pump_current           = currents.dll;
    desc.pll_pump_current           = currents.pll;
    desc.iac_id                     = self.get_iac_id()?;
    desc.i2c_id                     = self.get_i2c_id()?;
    desc.hamming_checking_disable   = self.get_hamming_checking_disable()?;
    self.read_control_register("read_hardware_description")?.apply_to(&mut desc);
    Ok(desc)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fine_delay_round_trip() {
    for delay in 0..=TtcrxDescription::MAX_FINE_DELAY {
      for clock in [DeskewClock::One, DeskewClock::Two] {
        let value = encode_fine_delay(delay, clock);
        assert_eq!(decode_fine_delay(value, clock), delay);
      }
    }
  }

  #[test]
  fn fine_delay_known_values() {
    // d = 0 -> n = 0, m = 14
    assert_eq!(encode_fine_delay(0, DeskewClock::One), 0x0e);
    assert_eq!(encode_fine_delay(0, DeskewClock::Two), 0xe0);
    // d = 16 -> n = 1, m = 14
    assert_eq!(encode_fine_delay(16, DeskewClock::One), 0x1e);
    // d = 239 -> n = 14, m = 15
    assert_eq!(encode_fine_delay(239, DeskewClock::Two), 0xfe);
  }

  #[test]
  fn control_register_bits() {
    let mut desc = TtcrxDescription::new();
    desc.counter_operation = 2;
    desc.serial_b_disable  = true;
    let control = ControlRegister::from_description(&desc);
    assert_eq!(control.pack(), 0x02 | 0x08 | 0x10 | 0x20 | 0x80);
    assert_eq!(ControlRegister::unpack(control.pack()), control);
  }

  #[test]
  fn counter_reset_registers() {
    let flags = CounterResetFlags {
      error_counters  : true,
      bunch_counter   : false,
      event_counter   : true,
      status_register : false,
    };
    assert_eq!(flags.registers(), vec![8, 9, 10, 11, 26, 27, 28]);
    assert_eq!(CounterResetFlags::all().registers().len(), 10);
  }
}
