//! Aggregate settings for the on-board devices
//!
//! One file holds everything needed to bring up
//! the TTCrx and the voltage monitor of a FED9U,
//! including how hard to retry a busy chip.

use std::fmt;

use fed9u_dataclasses::{
  SerializationError,
  TtcrxDescription,
  VoltageControlDescription,
};
use fed9u_dataclasses::serialization::{
  to_toml_file,
  from_toml_file,
  to_json_file,
  from_json_file,
  toml_repr,
};

use crate::bus::{
  ChipSelector,
  RetryPolicy,
};

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DeviceSettings {
  /// Free-form name of the board these settings are for
  pub board_name            : String,
  pub ttcrx                 : TtcrxDescription,
  pub voltage_monitor       : VoltageControlDescription,
  pub ttcrx_retry           : RetryPolicy,
  pub voltage_monitor_retry : RetryPolicy,
  /// Used for the clock-select query and the TTCrx reset
  pub fed_retry             : RetryPolicy,
}

impl DeviceSettings {
  pub fn new() -> Self {
    Self {
      board_name            : String::from("fed9u"),
      ttcrx                 : TtcrxDescription::new(),
      voltage_monitor       : VoltageControlDescription::new(),
      ttcrx_retry           : RetryPolicy::for_chip(ChipSelector::Ttcrx),
      voltage_monitor_retry : RetryPolicy::for_chip(ChipSelector::VoltageMonitor),
      fed_retry             : RetryPolicy::for_chip(ChipSelector::FedSystem),
    }
  }

  pub fn retry_policy(&self, chip : ChipSelector) -> RetryPolicy {
    match chip {
      ChipSelector::Ttcrx          => self.ttcrx_retry,
      ChipSelector::VoltageMonitor => self.voltage_monitor_retry,
      ChipSelector::FedSystem      => self.fed_retry,
    }
  }

  /// Both descriptions are within the chip ranges
  pub fn is_valid(&self) -> bool {
    self.ttcrx.is_valid() && self.voltage_monitor.is_valid()
  }

  /// Write to a file, ".toml" gets appended if
  /// missing. Returns the name of the file written.
  pub fn to_toml(&self, filename : &str) -> Result<String, SerializationError> {
    to_toml_file(self, filename)
  }

  pub fn from_toml(filename : &str) -> Result<Self, SerializationError> {
    let settings : Self = from_toml_file(filename)?;
    if !settings.is_valid() {
      warn!("Settings in {} contain out of range values, applying them will fail!", filename);
    }
    Ok(settings)
  }

  pub fn to_json(&self, filename : &str) -> Result<String, SerializationError> {
    to_json_file(self, filename)
  }

  pub fn from_json(filename : &str) -> Result<Self, SerializationError> {
    from_json_file(filename)
  }
}

impl Default for DeviceSettings {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Display for DeviceSettings {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "<DeviceSettings :\n{}>", toml_repr(self))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_policies() {
    let settings = DeviceSettings::new();
    assert_eq!(settings.retry_policy(ChipSelector::Ttcrx).max_loops, RetryPolicy::MAX_LOOPS);
    assert_eq!(settings.ttcrx_retry.delay_us, 1000);
    assert_eq!(settings.voltage_monitor_retry.delay_us, 200);
    assert!(settings.is_valid());
  }

  #[test]
  fn toml_text_round_trip() {
    let mut settings = DeviceSettings::new();
    settings.ttcrx.iac_id  = 4242;
    settings.ttcrx_retry   = RetryPolicy::new(10, 5);
    let text = toml::to_string(&settings).unwrap();
    let back : DeviceSettings = toml::from_str(&text).unwrap();
    assert_eq!(back, settings);
  }

  #[test]
  fn display_contains_sections() {
    let repr = format!("{}", DeviceSettings::new());
    assert!(repr.starts_with("<DeviceSettings"));
    assert!(repr.contains("[ttcrx]"));
    assert!(repr.contains("[voltage_monitor_retry]"));
  }
}
