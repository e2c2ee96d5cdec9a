//! Driver for the ADM1025 voltage monitor
//!
//! Every voltage register holds an 8 bit ADC code,
//! where the nominal voltage of a rail reads as 192
//! (3/4 of the range). Temperatures are two's
//! complement bytes in degree Celsius.

use std::fmt;

use fed9u_dataclasses::{
  VoltageControlDescription,
  VoltageRail,
  TempChannel,
};

use crate::bus::{
  ChipSelector,
  RegisterAccessor,
  RegisterBus,
  RetryPolicy,
};
use crate::errors::{
  DeviceError,
  ensure_in_range,
};
use crate::registers::*;

/// ADC code of the nominal voltage
pub const NOMINAL_CODE : f32 = 192.0;

/// ADC code to Volt
pub fn code_to_voltage(rail : VoltageRail, code : u8) -> f32 {
  code as f32 * rail.nominal() / NOMINAL_CODE
}

/// Volt to ADC code, rounding half up
pub fn voltage_to_code(rail : VoltageRail, voltage : f32) -> u8 {
  let code = (voltage * NOMINAL_CODE / rail.nominal() + 0.5).floor();
  code.clamp(0.0, 255.0) as u8
}

/// The register byte has to be taken as signed
/// 8 bit before it gets widened
pub fn temp_from_register(value : u32) -> i16 {
  (value as u8) as i8 as i16
}

/// Two's complement byte for the register
pub fn temp_to_register(temp : i16) -> u32 {
  (temp as i8) as u8 as u32
}

/// (high limit, low limit) registers of a rail
pub fn voltage_limit_registers(rail : VoltageRail) -> (u32, u32) {
  match rail {
    VoltageRail::TwoPointFive    => (ADM_2V5_HIGH, ADM_2V5_LOW),
    VoltageRail::ThreePointThree => (ADM_3V3_HIGH, ADM_3V3_LOW),
    VoltageRail::Five            => (ADM_5V_HIGH, ADM_5V_LOW),
    VoltageRail::Twelve          => (ADM_12V_HIGH, ADM_12V_LOW),
    VoltageRail::Core            => (ADM_CORE_HIGH, ADM_CORE_LOW),
    VoltageRail::Supply          => (ADM_SUPPLY_HIGH, ADM_SUPPLY_LOW),
  }
}

pub fn voltage_reading_register(rail : VoltageRail) -> u32 {
  match rail {
    VoltageRail::TwoPointFive    => ADM_READ_2V5,
    VoltageRail::ThreePointThree => ADM_READ_3V3,
    VoltageRail::Five            => ADM_READ_5V,
    VoltageRail::Twelve          => ADM_READ_12V,
    VoltageRail::Core            => ADM_READ_CORE,
    VoltageRail::Supply          => ADM_READ_SUPPLY,
  }
}

/// (high limit, low limit) registers of a temperature channel
pub fn temp_limit_registers(channel : TempChannel) -> (u32, u32) {
  match channel {
    TempChannel::Internal => (ADM_INT_TEMP_HIGH, ADM_INT_TEMP_LOW),
    TempChannel::External => (ADM_EXT_TEMP_HIGH, ADM_EXT_TEMP_LOW),
  }
}

pub fn temp_reading_register(channel : TempChannel) -> u32 {
  match channel {
    TempChannel::Internal => ADM_READ_INT_TEMP,
    TempChannel::External => ADM_READ_EXT_TEMP,
  }
}

/// Out-of-limit flags of the voltage monitor, one bit
/// per monitored quantity
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct VoltageMonitorStatus(pub u16);

impl VoltageMonitorStatus {
  pub const TWO_POINT_FIVE     : u16 = 1 << 0;
  pub const THREE_POINT_THREE  : u16 = 1 << 1;
  pub const FIVE               : u16 = 1 << 2;
  pub const TWELVE             : u16 = 1 << 3;
  pub const CORE               : u16 = 1 << 4;
  pub const SUPPLY             : u16 = 1 << 5;
  pub const INTERNAL_TEMP      : u16 = 1 << 6;
  pub const EXTERNAL_TEMP      : u16 = 1 << 7;
  /// external sensor missing or shorted
  pub const REMOTE_DIODE_FAULT : u16 = 1 << 8;

  /// Reorder the two hardware status registers
  pub fn from_registers(status1 : u32, status2 : u32) -> Self {
    let mut flags = 0u16;
    let mapping = [
      (status1, ADM_ST1_2V5,         Self::TWO_POINT_FIVE),
      (status1, ADM_ST1_3V3,         Self::THREE_POINT_THREE),
      (status1, ADM_ST1_5V,          Self::FIVE),
      (status2, ADM_ST2_12V,         Self::TWELVE),
      (status1, ADM_ST1_CORE,        Self::CORE),
      (status2, ADM_ST2_SUPPLY,      Self::SUPPLY),
      (status1, ADM_ST1_INT_TEMP,    Self::INTERNAL_TEMP),
      (status1, ADM_ST1_EXT_TEMP,    Self::EXTERNAL_TEMP),
      (status2, ADM_ST2_DIODE_FAULT, Self::REMOTE_DIODE_FAULT),
    ];
    for (register, source, flag) in mapping {
      if register & source != 0 {
        flags |= flag;
      }
    }
    Self(flags)
  }

  pub fn rail_flag(rail : VoltageRail) -> u16 {
    match rail {
      VoltageRail::TwoPointFive    => Self::TWO_POINT_FIVE,
      VoltageRail::ThreePointThree => Self::THREE_POINT_THREE,
      VoltageRail::Five            => Self::FIVE,
      VoltageRail::Twelve          => Self::TWELVE,
      VoltageRail::Core            => Self::CORE,
      VoltageRail::Supply          => Self::SUPPLY,
    }
  }

  pub fn rail_out_of_limits(&self, rail : VoltageRail) -> bool {
    self.0 & Self::rail_flag(rail) != 0
  }

  pub fn temp_out_of_limits(&self, channel : TempChannel) -> bool {
    let flag = match channel {
      TempChannel::Internal => Self::INTERNAL_TEMP,
      TempChannel::External => Self::EXTERNAL_TEMP,
    };
    self.0 & flag != 0
  }

  pub fn remote_diode_fault(&self) -> bool {
    self.0 & Self::REMOTE_DIODE_FAULT != 0
  }
}

impl fmt::Display for VoltageMonitorStatus {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let mut repr = format!("<VoltageMonitorStatus: {:#05x}", self.0);
    for rail in VoltageRail::ALL {
      if self.rail_out_of_limits(rail) {
        repr += &(format!(" {}!", rail));
      }
    }
    for channel in TempChannel::ALL {
      if self.temp_out_of_limits(channel) {
        repr += &(format!(" {}Temp!", channel));
      }
    }
    if self.remote_diode_fault() {
      repr += " DiodeFault!";
    }
    write!(f, "{}>", repr)
  }
}

fn check_description(operation : &'static str,
                     desc      : &VoltageControlDescription) -> Result<(), DeviceError> {
  if desc.is_valid() {
    return Ok(());
  }
  error!("[{}] Refusing invalid description {}", operation, desc);
  Err(DeviceError::InvalidArgument {
    operation : operation,
    parameter : "description",
    value     : format!("{:?}", desc),
    allowed   : String::from("limits within the chip range and max >= min"),
  })
}

/// Get/set the ADM1025 limits in physical units
pub struct VoltageMonitorController<B : RegisterBus> {
  accessor    : RegisterAccessor<B>,
  description : VoltageControlDescription,
}

impl<B : RegisterBus> VoltageMonitorController<B> {

  /// The description is taken as the current state of
  /// the hardware. The max setters check against its mins.
  pub fn new(bus : B, description : VoltageControlDescription) -> Result<Self, DeviceError> {
    let policy = RetryPolicy::for_chip(ChipSelector::VoltageMonitor);
    Self::with_policy(bus, description, policy)
  }

  pub fn with_policy(bus : B,
                     description : VoltageControlDescription,
                     policy      : RetryPolicy) -> Result<Self, DeviceError> {
    check_description("VoltageMonitorController::new", &description)?;
    Ok(Self {
      accessor    : RegisterAccessor::with_policy(bus, ChipSelector::VoltageMonitor, policy),
      description : description,
    })
  }

  pub fn description(&self) -> &VoltageControlDescription {
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

  // ----------- voltage limits --------------

  /// Setting a min above the current max is not checked.
  pub fn set_voltage_min(&mut self, rail : VoltageRail, voltage : f32) -> Result<(), DeviceError> {
    ensure_in_range("set_voltage_min", "voltage", voltage, 0.0, rail.full_scale())?;
    let (_, low) = voltage_limit_registers(rail);
    self.accessor.write("set_voltage_min", low, voltage_to_code(rail, voltage) as u32)?;
    self.description.set_voltage_min(rail, voltage);
    debug!("{} rail min set to {:.3}V", rail, voltage);
    Ok(())
  }

  /// Fails if the voltage is below the current min
  pub fn set_voltage_max(&mut self, rail : VoltageRail, voltage : f32) -> Result<(), DeviceError> {
    ensure_in_range("set_voltage_max", "voltage", voltage, 0.0, rail.full_scale())?;
    let min = self.description.voltage_min(rail);
    if voltage < min {
      warn!("Refusing {} rail max {:.3}V below min {:.3}V", rail, voltage, min);
      return Err(DeviceError::InvalidArgument {
        operation : "set_voltage_max",
        parameter : "voltage",
        value     : format!("{}", voltage),
        allowed   : format!(">= current min {}", min),
      });
    }
    let (high, _) = voltage_limit_registers(rail);
    self.accessor.write("set_voltage_max", high, voltage_to_code(rail, voltage) as u32)?;
    self.description.set_voltage_max(rail, voltage);
    debug!("{} rail max set to {:.3}V", rail, voltage);
    Ok(())
  }

  pub fn get_voltage_min(&mut self, rail : VoltageRail) -> Result<f32, DeviceError> {
    let (_, low) = voltage_limit_registers(rail);
    Ok(code_to_voltage(rail, self.read_byte("get_voltage_min", low)?))
  }

  pub fn get_voltage_max(&mut self, rail : VoltageRail) -> Result<f32, DeviceError> {
    let (high, _) = voltage_limit_registers(rail);
    Ok(code_to_voltage(rail, self.read_byte("get_voltage_max", high)?))
  }

  /// The live reading of a rail
  pub fn get_voltage(&mut self, rail : VoltageRail) -> Result<f32, DeviceError> {
    let address = voltage_reading_register(rail);
    Ok(code_to_voltage(rail, self.read_byte("get_voltage", address)?))
  }

  // ----------- temperature limits ----------

  pub fn set_temp_min(&mut self, channel : TempChannel, temp : i16) -> Result<(), DeviceError> {
    ensure_in_range("set_temp_min", "temperature", temp,
                    VoltageControlDescription::MIN_TEMP, VoltageControlDescription::MAX_TEMP)?;
    let (_, low) = temp_limit_registers(channel);
    self.accessor.write("set_temp_min", low, temp_to_register(temp))?;
    self.description.set_temp_min(channel, temp);
    debug!("{} temperature min set to {}C", channel, temp);
    Ok(())
  }

  /// Fails if the temperature is below the current min
  pub fn set_temp_max(&mut self, channel : TempChannel, temp : i16) -> Result<(), DeviceError> {
    ensure_in_range("set_temp_max", "temperature", temp,
                    VoltageControlDescription::MIN_TEMP, VoltageControlDescription::MAX_TEMP)?;
    let (min, _) = self.description.temp_limits(channel);
    if temp < min {
      warn!("Refusing {} temperature max {}C below min {}C", channel, temp, min);
      return Err(DeviceError::InvalidArgument {
        operation : "set_temp_max",
        parameter : "temperature",
        value     : format!("{}", temp),
        allowed   : format!(">= current min {}", min),
      });
    }
    let (high, _) = temp_limit_registers(channel);
    self.accessor.write("set_temp_max", high, temp_to_register(temp))?;
    self.description.set_temp_max(channel, temp);
    debug!("{} temperature max set to {}C", channel, temp);
    Ok(())
  }

  pub fn get_temp_min(&mut self, channel : TempChannel) -> Result<i16, DeviceError> {
    let (_, low) = temp_limit_registers(channel);
    Ok(temp_from_register(self.accessor.read("get_temp_min", low)?))
  }

  pub fn get_temp_max(&mut self, channel : TempChannel) -> Result<i16, DeviceError> {
    let (high, _) = temp_limit_registers(channel);
    Ok(temp_from_register(self.accessor.read("get_temp_max", high)?))
  }

  /// The live reading of a temperature channel
  pub fn get_temp(&mut self, channel : TempChannel) -> Result<i16, DeviceError> {
    let address = temp_reading_register(channel);
    Ok(temp_from_register(self.accessor.read("get_temp", address)?))
  }

  // ----------- temperature offset ----------

  /// Set the offset and the channel it applies to.
  ///
  /// The channel select is spread over the test register
  /// (bit 0) and the VID register (bits 6-7), the other
  /// bits of both are preserved.
  pub fn set_temp_offset(&mut self, offset : i16, internal : bool) -> Result<(), DeviceError> {
    ensure_in_range("set_temp_offset", "offset", offset,
                    VoltageControlDescription::MIN_TEMP, VoltageControlDescription::MAX_TEMP)?;
    let mut test = self.accessor.read("set_temp_offset", ADM_TEST)? & 0xff;
    if internal {
      test |= ADM_TEST_OFFSET_SELECT;
    } else {
      test &= !ADM_TEST_OFFSET_SELECT;
    }
    self.accessor.write("set_temp_offset", ADM_TEST, test)?;
    let mut vid = self.accessor.read("set_temp_offset", ADM_VID)? & 0xff;
    if internal {
      vid |= ADM_VID_OFFSET_SELECT;
    } else {
      vid &= !ADM_VID_OFFSET_SELECT;
    }
    self.accessor.write("set_temp_offset", ADM_VID, vid)?;
    self.accessor.write("set_temp_offset", ADM_TEMP_OFFSET, temp_to_register(offset))?;
    self.description.temp_offset          = offset;
    self.description.temp_offset_internal = internal;
    debug!("Temperature offset set to {}C (internal {})", offset, internal);
    Ok(())
  }

  pub fn get_temp_offset(&mut self) -> Result<i16, DeviceError> {
    Ok(temp_from_register(self.accessor.read("get_temp_offset", ADM_TEMP_OFFSET)?))
  }

  /// True if the offset applies to the internal sensor.
  /// Anything but both select locations saying "internal"
  /// reads as external.
  pub fn get_offset_temp_select(&mut self) -> Result<bool, DeviceError> {
    let test = self.accessor.read("get_offset_temp_select", ADM_TEST)?;
    let vid  = self.accessor.read("get_offset_temp_select", ADM_VID)?;
    let internal = (test & ADM_TEST_OFFSET_SELECT) == ADM_TEST_OFFSET_SELECT
                && (vid & ADM_VID_OFFSET_SELECT)   == ADM_VID_OFFSET_SELECT;
    Ok(internal)
  }

  // ----------- stand-by --------------------

  /// In stand-by the chip stops monitoring.
  pub fn set_stand_by(&mut self, stand_by : bool) -> Result<(), DeviceError> {
    let mut config = self.accessor.read("set_stand_by", ADM_CONFIG)? & 0xff;
    if stand_by {
      config &= !ADM_CONFIG_START;
    } else {
      config |= ADM_CONFIG_START;
    }
    self.accessor.write("set_stand_by", ADM_CONFIG, config)?;
    self.description.stand_by = stand_by;
    debug!("Stand-by set to {}", stand_by);
    Ok(())
  }

  pub fn get_stand_by(&mut self) -> Result<bool, DeviceError> {
    Ok(self.accessor.read("get_stand_by", ADM_CONFIG)? & ADM_CONFIG_START == 0)
  }

  // ----------- status and ids --------------

  pub fn get_status_register(&mut self) -> Result<VoltageMonitorStatus, DeviceError> {
    let status1 = self.accessor.read("get_status_register", ADM_STATUS_1)?;
    let status2 = self.accessor.read("get_status_register", ADM_STATUS_2)?;
    Ok(VoltageMonitorStatus::from_registers(status1, status2))
  }

  pub fn get_manufacturer_id(&mut self) -> Result<u8, DeviceError> {
    self.read_byte("get_manufacturer_id", ADM_MANUFACTURER_ID)
  }

  pub fn get_stepping_id(&mut self) -> Result<u8, DeviceError> {
    self.read_byte("get_stepping_id", ADM_STEPPING_ID)
  }

  // ----------- whole description -----------

  /// Write every limit and setting of the description.
  /// Mins go first, so the max checks see the new mins.
  pub fn apply_description(&mut self, desc : &VoltageControlDescription) -> Result<(), DeviceError> {
    check_description("apply_description", desc)?;
    for rail in VoltageRail::ALL {
      let (min, max) = desc.voltage_limits(rail);
      self.set_voltage_min(rail, min)?;
      self.set_voltage_max(rail, max)?;
    }
    for channel in TempChannel::ALL {
      let (min, max) = desc.temp_limits(channel);
      self.set_temp_min(channel, min)?;
      self.set_temp_max(channel, max)?;
    }
    self.set_temp_offset(desc.temp_offset, desc.temp_offset_internal)?;
    self.set_stand_by(desc.stand_by)?;
    info!("Applied voltage monitor description");
    Ok(())
  }

  /// Assemble a description from the hardware. Voltages
  /// come back quantized to the ADC steps.
  pub fn read_hardware_description(&mut self) -> Result<VoltageControlDescription, DeviceError> {
    let mut desc = VoltageControlDescription::new();
    for rail in VoltageRail::ALL {
      desc.set_voltage_min(rail, self.get_voltage_min(rail)?);
      desc.set_voltage_max(rail, self.get_voltage_max(rail)?);
    }
    for channel in TempChannel::ALL {
      desc.set_temp_min(channel, self.get_temp_min(channel)?);
      desc.set_temp_max(channel, self.get_temp_max(channel)?);
    }
    desc.temp_offset          = self.get_temp_offset()?;
    desc.temp_offset_internal = self.get_offset_temp_select()?;
    desc.stand_by             = self.get_stand_by()?;
    Ok(desc)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn adc_round_trip() {
    for rail in VoltageRail::ALL {
      for code in 0..=255u8 {
        let voltage = code_to_voltage(rail, code);
        assert_eq!(voltage_to_code(rail, voltage), code);
      }
    }
  }

  #[test]
  fn adc_rounds_half_up() {
    // 2.5V rail, one step is 2.5/192 V, half steps round up
    let step = 2.5 / 192.0;
    assert_eq!(voltage_to_code(VoltageRail::TwoPointFive, 100.6 * step), 101);
    assert_eq!(voltage_to_code(VoltageRail::TwoPointFive, 100.4 * step), 100);
    assert_eq!(voltage_to_code(VoltageRail::TwoPointFive, 2.5), 192);
  }

  #[test]
  fn temperature_sign_extension() {
    assert_eq!(temp_from_register(0xf6), -10);
    assert_eq!(temp_from_register(0x80), -128);
    assert_eq!(temp_from_register(0x7f), 127);
    assert_eq!(temp_to_register(-10), 0xf6);
    for temp in -128..=127i16 {
      assert_eq!(temp_from_register(temp_to_register(temp)), temp);
    }
  }

  #[test]
  fn status_mapping() {
    // 5V and core from status 1, supply and diode fault from status 2
    let status = VoltageMonitorStatus::from_registers(0x08 | 0x02, 0x02 | 0x40);
    assert_eq!(status.0, VoltageMonitorStatus::FIVE
                       | VoltageMonitorStatus::CORE
                       | VoltageMonitorStatus::SUPPLY
                       | VoltageMonitorStatus::REMOTE_DIODE_FAULT);
    assert!(status.rail_out_of_limits(VoltageRail::Core));
    assert!(!status.rail_out_of_limits(VoltageRail::TwoPointFive));
    assert!(status.remote_diode_fault());
    assert!(!status.temp_out_of_limits(TempChannel::Internal));
  }
}
