//! Configuration of the TTCrx (Timing, Trigger and 
//! Control receiver) chip on the FED9U.
//!
//! Values are stored in chip units, that is
//! coarse delays in 25ns steps, fine delays
//! in ~104ps steps.

use std::fmt;

use crate::serialization::{
  to_toml_file,
  from_toml_file,
};
use crate::errors::SerializationError;

cfg_if::cfg_if! {
  if #[cfg(feature = "random")]  {
    use crate::FromRandom;
    extern crate rand;
    use rand::Rng;
  }
}

/// Every user settable parameter of the TTCrx
///
/// The output "disable" flags are stored with the 
/// inverted logic of the chip, which knows "enable"
/// bits only.
#[derive(Debug, Copy, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct TtcrxDescription {
  /// Coarse delay of the L1Accept (0-15, 25ns steps)
  pub l1accept_coarse_delay      : u8,
  /// Coarse delay of the broadcast strobe 2 (0-15, 25ns steps)
  pub brcst_str_two_coarse_delay : u8,
  /// Fine delay of the deskewed clock 1 (0-239, ~104ps steps)
  pub clock_des_one_fine_delay   : u8,
  /// Fine delay of the deskewed clock 2 (0-239, ~104ps steps)
  pub clock_des_two_fine_delay   : u8,
  /// 1-7
  pub dll_pump_current           : u8,
  /// 1-7
  pub pll_pump_current           : u8,
  /// 14 bit id for individually addressed commands
  pub iac_id                     : u16,
  /// 6 bit id on the I2C bus
  pub i2c_id                     : u8,
  pub hamming_checking_disable   : bool,
  /// bit 0 - bunch counter, bit 1 - event counter
  pub counter_operation          : u8,
  pub deskewed_clock2_selected   : bool,
  pub deskewed_clock2_disable    : bool,
  pub clock_l1accept_disable     : bool,
  pub parallel_output_disable    : bool,
  pub serial_b_disable           : bool,
  pub non_deskewed_clock_disable : bool,
}

impl TtcrxDescription {

  pub const MAX_COARSE_DELAY : u8  = 15;
  pub const MAX_FINE_DELAY   : u8  = 239;
  pub const MIN_PUMP_CURRENT : u8  = 1;
  pub const MAX_PUMP_CURRENT : u8  = 7;
  pub const MAX_IAC_ID       : u16 = 16383;
  pub const MAX_I2C_ID       : u8  = 63;
  pub const MAX_COUNTER_OP   : u8  = 3;

  pub fn new() -> Self {
    Self {
      l1accept_coarse_delay      : 0,
      brcst_str_two_coarse_delay : 0,
      clock_des_one_fine_delay   : 0,
      clock_des_two_fine_delay   : 0,
      dll_pump_current           : 3,
      pll_pump_current           : 3,
      iac_id                     : 0,
      i2c_id                     : 0,
      hamming_checking_disable   : false,
      counter_operation          : 3,
      deskewed_clock2_selected   : false,
      deskewed_clock2_disable    : false,
      clock_l1accept_disable     : false,
      parallel_output_disable    : false,
      serial_b_disable           : false,
      non_deskewed_clock_disable : false,
    }
  }

  /// Bunch counter operation enabled (bit 0 of the counter operation)
  pub fn bunch_counter_enabled(&self) -> bool {
    self.counter_operation & 0x1 == 0x1
  }
  
  /// Event counter operation enabled (bit 1 of the counter operation)
  pub fn event_counter_enabled(&self) -> bool {
    self.counter_operation & 0x2 == 0x2
  }

  /// Check that every field is within the range the chip accepts
  pub fn is_valid(&self) -> bool {
       self.l1accept_coarse_delay      <= Self::MAX_COARSE_DELAY
    && self.brcst_str_two_coarse_delay <= Self::MAX_COARSE_DELAY
    && self.clock_des_one_fine_delay   <= Self::MAX_FINE_DELAY
    && self.clock_des_two_fine_delay   <= Self::MAX_FINE_DELAY
    && self.dll_pump_current           >= Self::MIN_PUMP_CURRENT
    && self.dll_pump_current           <= Self::MAX_PUMP_CURRENT
    && self.pll_pump_current           >= Self::MIN_PUMP_CURRENT
    && self.pll_pump_current           <= Self::MAX_PUMP_CURRENT
    && self.iac_id                     <= Self::MAX_IAC_ID
    && self.i2c_id                     <= Self::MAX_I2C_ID
    && self.counter_operation          <= Self::MAX_COUNTER_OP
  }

  pub fn to_toml(&self, filename : &str) -> Result<String, SerializationError> {
    to_toml_file(self, filename)
  }

  pub fn from_toml(filename : &str) -> Result<Self, SerializationError> {
    from_toml_file(filename)
  }
}

impl Default for TtcrxDescription {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Display for TtcrxDescription {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let mut repr = String::from("<TtcrxDescription:");
    repr += &(format!("\n  L1A coarse delay       : {}", self.l1accept_coarse_delay));
    repr += &(format!("\n  BrcstStr2 coarse delay : {}", self.brcst_str_two_coarse_delay));
    repr += &(format!("\n  ClockDes1 fine delay   : {}", self.clock_des_one_fine_delay));
    repr += &(format!("\n  ClockDes2 fine delay   : {}", self.clock_des_two_fine_delay));
    repr += &(format!("\n  DLL/PLL pump current   : {}/{}", self.dll_pump_current, self.pll_pump_current));
    repr += &(format!("\n  IAC id                 : {}", self.iac_id));
    repr += &(format!("\n  I2C id                 : {}", self.i2c_id));
    repr += &(format!("\n  Hamming check disabled : {}", self.hamming_checking_disable));
    repr += &(format!("\n  Counter operation      : {:#04b}", self.counter_operation));
    repr += &(format!("\n  ClockDes2 selected     : {}", self.deskewed_clock2_selected));
    repr += "\n  -- disabled outputs:";
    repr += &(format!("\n    ClockDes2            : {}", self.deskewed_clock2_disable));
    repr += &(format!("\n    Clock L1Accept       : {}", self.clock_l1accept_disable));
    repr += &(format!("\n    Parallel bus         : {}", self.parallel_output_disable));
    repr += &(format!("\n    Serial B             : {}", self.serial_b_disable));
    repr += &(format!("\n    Clock40 (non-deskew) : {}>", self.non_deskewed_clock_disable));
    write!(f, "{}", repr)
  }
}

#[cfg(feature = "random")]
impl FromRandom for TtcrxDescription {
  fn from_random() -> Self {
    let mut desc = Self::new();
    let mut rng  = rand::thread_rng();
    desc.l1accept_coarse_delay      = rng.gen_range(0..=Self::MAX_COARSE_DELAY);
    desc.brcst_str_two_coarse_delay = rng.gen_range(0..=Self::MAX_COARSE_DELAY);
    desc.clock_des_one_fine_delay   = rng.gen_range(0..=Self::MAX_FINE_DELAY);
    desc.clock_des_two_fine_delay   = rng.gen_range(0..=Self::MAX_FINE_DELAY);
    desc.dll_pump_current           = rng.gen_range(Self::MIN_PUMP_CURRENT..=Self::MAX_PUMP_CURRENT);
    desc.pll_pump_current           = rng.gen_range(Self::MIN_PUMP_CURRENT..=Self::MAX_PUMP_CURRENT);
    desc.iac_id                     = rng.gen_range(0..=Self::MAX_IAC_ID);
    desc.i2c_id                     = rng.gen_range(0..=Self::MAX_I2C_ID);
    desc.hamming_checking_disable   = rng.gen::<bool>();
    desc.counter_operation          = rng.gen_range(0..=Self::MAX_COUNTER_OP);
    desc.deskewed_clock2_selected   = rng.gen::<bool>();
    desc.deskewed_clock2_disable    = rng.gen::<bool>();
    desc.clock_l1accept_disable     = rng.gen::<bool>();
    desc.parallel_output_disable    = rng.gen::<bool>();
    desc.serial_b_disable           = rng.gen::<bool>();
    desc.non_deskewed_clock_disable = rng.gen::<bool>();
    desc
  }
}
