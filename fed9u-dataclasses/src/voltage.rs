//! Configuration of the ADM1025 voltage monitor 
//! on the FED9U.
//!
//! The chip watches six supply rails and two 
//! temperatures (its own and an external diode)
//! against programmable limits.

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

/// The supply rails monitored by the ADM1025
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub enum VoltageRail {
  TwoPointFive,
  ThreePointThree,
  Five,
  Twelve,
  /// processor core (Vccp)
  Core,
  /// chip supply (Vcc)
  Supply,
}

impl VoltageRail {
  pub const ALL : [VoltageRail;6] = [
    VoltageRail::TwoPointFive,
    VoltageRail::ThreePointThree,
    VoltageRail::Five,
    VoltageRail::Twelve,
    VoltageRail::Core,
    VoltageRail::Supply,
  ];

  /// The voltage which reads as 3/4 of the ADC 
  /// range (code 192)
  pub fn nominal(&self) -> f32 {
    match self {
      VoltageRail::TwoPointFive    => 2.5,
      VoltageRail::ThreePointThree => 3.3,
      VoltageRail::Five            => 5.0,
      VoltageRail::Twelve          => 12.0,
      VoltageRail::Core            => 2.249,
      VoltageRail::Supply          => 3.3,
    }
  }

  /// The voltage corresponding to the full ADC range (code 255)
  pub fn full_scale(&self) -> f32 {
    self.nominal() * 255.0 / 192.0
  }
}

impl fmt::Display for VoltageRail {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let repr = match self {
      VoltageRail::TwoPointFive    => "2.5V",
      VoltageRail::ThreePointThree => "3.3V",
      VoltageRail::Five            => "5V",
      VoltageRail::Twelve          => "12V",
      VoltageRail::Core            => "Core",
      VoltageRail::Supply          => "Supply",
    };
    write!(f, "{}", repr)
  }
}

/// The two temperature sensors of the ADM1025
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub enum TempChannel {
  /// on-chip sensor
  Internal,
  /// remote diode
  External,
}

impl TempChannel {
  pub const ALL : [TempChannel;2] = [TempChannel::Internal, TempChannel::External];
}

impl fmt::Display for TempChannel {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      TempChannel::Internal => write!(f, "Internal"),
      TempChannel::External => write!(f, "External"),
    }
  }
}

/// Limits and settings of the voltage monitor
///
/// Voltages are in Volt, temperatures in degree Celsius.
#[derive(Debug, Copy, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct VoltageControlDescription {
  pub two_point_five_volt_min   : f32,
  pub two_point_five_volt_max   : f32,
  pub three_point_three_volt_min: f32,
  pub three_point_three_volt_max: f32,
  pub five_volt_min             : f32,
  pub five_volt_max             : f32,
  pub twelve_volt_min           : f32,
  pub twelve_volt_max           : f32,
  pub core_voltage_min          : f32,
  pub core_voltage_max          : f32,
  pub supply_voltage_min        : f32,
  pub supply_voltage_max        : f32,
  pub internal_temp_min         : i16,
  pub internal_temp_max         : i16,
  pub external_temp_min         : i16,
  pub external_temp_max         : i16,
  pub temp_offset               : i16,
  /// true - the offset applies to the internal sensor,
  /// false - to the external one
  pub temp_offset_internal      : bool,
  pub stand_by                  : bool,
}

impl VoltageControlDescription {

  pub const MIN_TEMP : i16 = -128;
  pub const MAX_TEMP : i16 = 127;

  pub fn new() -> Self {
    let mut desc = Self {
      two_point_five_volt_min    : 0.0,
      two_point_five_volt_max    : 0.0,
      three_point_three_volt_min : 0.0,
      three_point_three_volt_max : 0.0,
      five_volt_min              : 0.0,
      five_volt_max              : 0.0,
      twelve_volt_min            : 0.0,
      twelve_volt_max            : 0.0,
      core_voltage_min           : 0.0,
      core_voltage_max           : 0.0,
      supply_voltage_min         : 0.0,
      supply_voltage_max         : 0.0,
      internal_temp_min          : 0,
      internal_temp_max          : 60,
      external_temp_min          : 0,
      external_temp_max          : 70,
      temp_offset                : 0,
      temp_offset_internal       : false,
      stand_by                   : false,
    };
    // +-10% around the nominal value
    for rail in VoltageRail::ALL {
      desc.set_voltage_min(rail, rail.nominal() * 0.9);
      desc.set_voltage_max(rail, rail.nominal() * 1.1);
    }
    desc
  }

  /// (min, max) for the given rail
  pub fn voltage_limits(&self, rail : VoltageRail) -> (f32, f32) {
    match rail {
      VoltageRail::TwoPointFive    => (self.two_point_five_volt_min, self.two_point_five_volt_max),
      VoltageRail::ThreePointThree => (self.three_point_three_volt_min, self.three_point_three_volt_max),
      VoltageRail::Five            => (self.five_volt_min, self.five_volt_max),
      VoltageRail::Twelve          => (self.twelve_volt_min, self.twelve_volt_max),
      VoltageRail::Core            => (self.core_voltage_min, self.core_voltage_max),
      VoltageRail::Supply          => (self.supply_voltage_min, self.supply_voltage_max),
    }
  }

  pub fn voltage_min(&self, rail : VoltageRail) -> f32 {
    self.voltage_limits(rail).0
  }
  
  pub fn voltage_max(&self, rail : VoltageRail) -> f32 {
    self.voltage_limits(rail).1
  }

  pub fn set_voltage_min(&mut self, rail : VoltageRail, value : f32) {
    match rail {
      VoltageRail::TwoPointFive    => self.two_point_five_volt_min    = value,
      VoltageRail::ThreePointThree => self.three_point_three_volt_min = value,
      VoltageRail::Five            => self.five_volt_min              = value,
      VoltageRail::Twelve          => self.twelve_volt_min            = value,
      VoltageRail::Core            => self.core_voltage_min           = value,
      VoltageRail::Supply          => self.supply_voltage_min         = value,
    }
  }
  
  pub fn set_voltage_max(&mut self, rail : VoltageRail, value : f32) {
    match rail {
      VoltageRail::TwoPointFive    => self.two_point_five_volt_max    = value,
      VoltageRail::ThreePointThree => self.three_point_three_volt_max = value,
      VoltageRail::Five            => self.five_volt_max              = value,
      VoltageRail::Twelve          => self.twelve_volt_max            = value,
      VoltageRail::Core            => self.core_voltage_max           = value,
      VoltageRail::Supply          => self.supply_voltage_max         = value,
    }
  }

  /// (min, max) for the given temperature channel
  pub fn temp_limits(&self, channel : TempChannel) -> (i16, i16) {
    match channel {
      TempChannel::Internal => (self.internal_temp_min, self.internal_temp_max),
      TempChannel::External => (self.external_temp_min, self.external_temp_max),
    }
  }

  pub fn set_temp_min(&mut self, channel : TempChannel, value : i16) {
    match channel {
      TempChannel::Internal => self.internal_temp_min = value,
      TempChannel::External => self.external_temp_min = value,
    }
  }
  
  pub fn set_temp_max(&mut self, channel : TempChannel, value : i16) {
    match channel {
      TempChannel::Internal => self.internal_temp_max = value,
      TempChannel::External => self.external_temp_max = value,
    }
  }

  /// Every limit within the chip range and 
  /// every max not below its min
  pub fn is_valid(&self) -> bool {
    for rail in VoltageRail::ALL {
      let (min, max) = self.voltage_limits(rail);
      // written so that NaN fails
      if !(min >= 0.0 && max <= rail.full_scale() && max >= min) {
        return false;
      }
    }
    for channel in TempChannel::ALL {
      let (min, max) = self.temp_limits(channel);
      if min < Self::MIN_TEMP || max > Self::MAX_TEMP || max < min {
        return false;
      }
    }
    self.temp_offset >= Self::MIN_TEMP && self.temp_offset <= Self::MAX_TEMP
  }

  pub fn to_toml(&self, filename : &str) -> Result<String, SerializationError> {
    to_toml_file(self, filename)
  }

  pub fn from_toml(filename : &str) -> Result<Self, SerializationError> {
    from_toml_file(filename)
  }
}

impl Default for VoltageControlDescription {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Display for VoltageControlDescription {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let mut repr = String::from("<VoltageControlDescription:");
    for rail in VoltageRail::ALL {
      let (min, max) = self.voltage_limits(rail);
      repr += &(format!("\n  {:<6} [V] : {:.3} - {:.3}", rail, min, max));
    }
    for channel in TempChannel::ALL {
      let (min, max) = self.temp_limits(channel);
      repr += &(format!("\n  {:<8} [C] : {} - {}", channel, min, max));
    }
    repr += &(format!("\n  Temp offset   : {} (internal {})", self.temp_offset, self.temp_offset_internal));
    repr += &(format!("\n  Stand-by      : {}>", self.stand_by));
    write!(f, "{}", repr)
  }
}

#[cfg(feature = "random")]
impl FromRandom for VoltageControlDescription {
  fn from_random() -> Self {
    let mut desc = Self::new();
    let mut rng  = rand::thread_rng();
    for rail in VoltageRail::ALL {
      let min = rng.gen_range(0.0..rail.nominal());
      let max = rng.gen_range(min..rail.full_scale());
      desc.set_voltage_min(rail, min);
      desc.set_voltage_max(rail, max);
    }
    for channel in TempChannel::ALL {
      let min = rng.gen_range(Self::MIN_TEMP..=0);
      let max = rng.gen_range(min..=Self::MAX_TEMP);
      desc.set_temp_min(channel, min);
      desc.set_temp_max(channel, max);
    }
    desc.temp_offset          = rng.gen_range(Self::MIN_TEMP..=Self::MAX_TEMP);
    desc.temp_offset_internal = rng.gen::<bool>();
    desc.stand_by             = rng.gen::<bool>();
    desc
  }
}
