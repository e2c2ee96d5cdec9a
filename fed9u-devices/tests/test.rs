use std::rc::Rc;
use std::cell::RefCell;

use fed9u_dataclasses::{
  FromRandom,
  TtcrxDescription,
  VoltageControlDescription,
  VoltageRail,
  TempChannel,
};
use fed9u_devices::{
  ChipSelector,
  ClockSource,
  DeviceError,
  DeviceSettings,
  FedClockSource,
  FixedClockSource,
  RetryPolicy,
  TtcrxController,
  VoltageMonitorController,
};
use fed9u_devices::registers::*;
use fed9u_devices::simulation::SimulatedBus;
use fed9u_devices::ttcrx::{
  ControlRegister,
  CounterResetFlags,
};
use fed9u_devices::voltage_monitor::{
  voltage_to_code,
  voltage_reading_register,
  voltage_limit_registers,
};

type Ttcrx   = TtcrxController<SimulatedBus>;
type Monitor = VoltageMonitorController<SimulatedBus>;

/// Retry without sleeping
fn fast_policy() -> RetryPolicy {
  RetryPolicy::new(RetryPolicy::MAX_LOOPS, 0)
}

fn ttcrx() -> Ttcrx {
  TtcrxController::with_policy(SimulatedBus::new(), TtcrxDescription::new(), fast_policy()).unwrap()
}

fn monitor() -> Monitor {
  VoltageMonitorController::with_policy(SimulatedBus::new(), VoltageControlDescription::new(), fast_policy()).unwrap()
}

fn temp_file(name : &str) -> String {
  let mut path = std::env::temp_dir();
  path.push(name);
  path.to_string_lossy().to_string()
}

// ------------ TTCrx --------------------------

fn toggle_control_bit(ctrl : &mut Ttcrx, bit : u32) -> Result<(), DeviceError> {
  let desc = *ctrl.description();
  match bit {
    0x01 => ctrl.set_counter_operation(desc.counter_operation ^ 0x1),
    0x02 => ctrl.set_counter_operation(desc.counter_operation ^ 0x2),
    0x04 => ctrl.set_deskewed_clock2_selected(!desc.deskewed_clock2_selected),
    0x08 => ctrl.set_deskewed_clock2_disable(!desc.deskewed_clock2_disable),
    0x10 => ctrl.set_clock_l1accept_disable(!desc.clock_l1accept_disable),
    0x20 => ctrl.set_parallel_output_disable(!desc.parallel_output_disable),
    0x40 => ctrl.set_serial_b_disable(!desc.serial_b_disable),
    0x80 => ctrl.set_non_deskewed_clock_disable(!desc.non_deskewed_clock_disable),
    _    => panic!("No control bit {:#04x}", bit),
  }
}

#[test]
fn control_flags_are_independent() {
  for start in 0..=0xffu32 {
    for bit in [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80] {
      let mut desc = TtcrxDescription::new();
      ControlRegister::unpack(start).apply_to(&mut desc);
      let mut ctrl = TtcrxController::with_policy(SimulatedBus::new(), desc, fast_policy()).unwrap();
      toggle_control_bit(&mut ctrl, bit).unwrap();
      assert_eq!(ctrl.bus().register(ChipSelector::Ttcrx, TTCRX_CONTROL), start ^ bit,
                 "start {:#04x}, bit {:#04x}", start, bit);
      assert_eq!(ctrl.bus().n_writes, 1);
    }
  }
}

#[test]
fn control_getters_read_hardware() {
  let mut ctrl = ttcrx();
  ctrl.bus_mut().set_register(ChipSelector::Ttcrx, TTCRX_CONTROL, 0x06);
  assert_eq!(ctrl.get_counter_operation().unwrap(), 2);
  assert!(ctrl.get_deskewed_clock2_selected().unwrap());
  assert!(ctrl.get_deskewed_clock2_disable().unwrap());
  assert!(ctrl.get_clock_l1accept_disable().unwrap());
  assert!(ctrl.get_parallel_output_disable().unwrap());
  assert!(ctrl.get_serial_b_disable().unwrap());
  assert!(ctrl.get_non_deskewed_clock_disable().unwrap());
  // the mirror still has the defaults
  assert!(!ctrl.description().deskewed_clock2_selected);
}

#[test]
fn coarse_delays_share_a_register() {
  let mut ctrl = ttcrx();
  for first in 0..=TtcrxDescription::MAX_COARSE_DELAY {
    for second in 0..=TtcrxDescription::MAX_COARSE_DELAY {
      ctrl.set_l1accept_coarse_delay(first).unwrap();
      ctrl.set_brcst_str_two_coarse_delay(second).unwrap();
      assert_eq!(ctrl.bus().register(ChipSelector::Ttcrx, TTCRX_COARSE_DELAY),
                 ((second as u32) << 4) | first as u32, "l1a {}, brcst {}", first, second);
      assert_eq!(ctrl.get_l1accept_coarse_delay().unwrap(), first);
      assert_eq!(ctrl.get_brcst_str_two_coarse_delay().unwrap(), second);
      // and the other way round
      ctrl.set_brcst_str_two_coarse_delay(first).unwrap();
      ctrl.set_l1accept_coarse_delay(second).unwrap();
      assert_eq!(ctrl.bus().register(ChipSelector::Ttcrx, TTCRX_COARSE_DELAY),
                 ((first as u32) << 4) | second as u32, "brcst {}, l1a {}", first, second);
      assert_eq!(ctrl.get_l1accept_coarse_delay().unwrap(), second);
      assert_eq!(ctrl.get_brcst_str_two_coarse_delay().unwrap(), first);
    }
  }
  assert!(matches!(ctrl.set_l1accept_coarse_delay(16), Err(DeviceError::InvalidArgument {..})));
  assert!(matches!(ctrl.set_brcst_str_two_coarse_delay(16), Err(DeviceError::InvalidArgument {..})));
  assert_eq!(ctrl.description().l1accept_coarse_delay, TtcrxDescription::MAX_COARSE_DELAY);
}

#[test]
fn fine_delays_through_hardware() {
  let mut ctrl = ttcrx();
  for delay in 0..=TtcrxDescription::MAX_FINE_DELAY {
    ctrl.set_clock_des_one_fine_delay(delay).unwrap();
    ctrl.set_clock_des_two_fine_delay(delay).unwrap();
    assert_eq!(ctrl.get_clock_des_one_fine_delay().unwrap(), delay);
    assert_eq!(ctrl.get_clock_des_two_fine_delay().unwrap(), delay);
  }
  assert!(ctrl.set_clock_des_one_fine_delay(240).is_err());
}

#[test]
fn brcst_fine_delay_follows_clock_selection() {
  let mut ctrl = ttcrx();
  ctrl.set_brcst_str_two_delay(4, 100).unwrap();
  assert_eq!(ctrl.description().clock_des_one_fine_delay, 100);
  assert_eq!(ctrl.bus().writes_to(ChipSelector::Ttcrx, TTCRX_FINE_DELAY_2), 0);
  ctrl.set_deskewed_clock2_selected(true).unwrap();
  ctrl.set_brcst_str_two_delay(5, 42).unwrap();
  assert_eq!(ctrl.get_clock_des_two_fine_delay().unwrap(), 42);
  assert_eq!(ctrl.get_clock_des_one_fine_delay().unwrap(), 100);
  assert_eq!(ctrl.get_brcst_str_two_coarse_delay().unwrap(), 5);
  // nothing is written if one of the two is out of range
  let writes = ctrl.bus().n_writes;
  assert!(ctrl.set_l1accept_delay(2, 240).is_err());
  assert_eq!(ctrl.bus().n_writes, writes);
}

#[test]
fn pump_currents() {
  let mut ctrl = ttcrx();
  ctrl.set_dll_pump_current(5).unwrap();
  ctrl.set_pll_pump_current(3).unwrap();
  assert_eq!(ctrl.bus().register(ChipSelector::Ttcrx, TTCRX_CONFIG_1), 0x1d);
  assert_eq!(ctrl.get_dll_pump_current().unwrap(), 5);
  assert_eq!(ctrl.get_pll_pump_current().unwrap(), 3);
  assert!(ctrl.set_dll_pump_current(0).is_err());
  assert!(ctrl.set_pll_pump_current(8).is_err());
}

#[test]
fn ids_keep_the_mode_bits() {
  let mut ctrl = ttcrx();
  ctrl.set_iac_id(0x3abc).unwrap();
  assert_eq!(ctrl.bus().register(ChipSelector::Ttcrx, TTCRX_ID_LSB), 0xbc);
  assert_eq!(ctrl.bus().register(ChipSelector::Ttcrx, TTCRX_ID_MSB), 0xba);
  assert_eq!(ctrl.get_iac_id().unwrap(), 0x3abc);
  assert!(ctrl.set_iac_id(16384).is_err());
  ctrl.set_i2c_id(63).unwrap();
  assert_eq!(ctrl.get_i2c_id().unwrap(), 63);
  assert!(ctrl.set_i2c_id(64).is_err());
}

#[test]
fn hamming_bits_must_agree() {
  let mut ctrl = ttcrx();
  assert_eq!(ctrl.get_hamming_checking_disable(), Ok(false));
  ctrl.bus_mut().set_register(ChipSelector::Ttcrx, TTCRX_CONFIG_2, 0xf2);
  ctrl.set_hamming_checking_disable(true).unwrap();
  assert_eq!(ctrl.bus().register(ChipSelector::Ttcrx, TTCRX_CONFIG_2), 0xf0);
  assert_eq!(ctrl.get_hamming_checking_disable(), Ok(true));
  ctrl.bus_mut().set_register(ChipSelector::Ttcrx, TTCRX_CONFIG_3, TTCRX_HAMMING_ENABLE);
  match ctrl.get_hamming_checking_disable() {
    Err(DeviceError::InconsistentState { registers, values, .. }) => {
      assert_eq!(registers, (TTCRX_CONFIG_2, TTCRX_CONFIG_3));
      assert_eq!(values, (0xf0, TTCRX_HAMMING_ENABLE));
    }
    other => panic!("Unexpected result {:?}", other)
  }
}

#[test]
fn hamming_second_write_fails() {
  let mut ctrl = ttcrx();
  // reads of 20 and 21 and the write to 20 go through
  let issued = ctrl.bus().n_reads + ctrl.bus().n_writes;
  ctrl.bus_mut().busy_after = Some(issued + 3);
  match ctrl.set_hamming_checking_disable(true) {
    Err(DeviceError::DeviceBusyOrError { operation, address, write, .. }) => {
      assert_eq!(operation, "set_hamming_checking_disable");
      assert_eq!(address, TTCRX_CONFIG_3);
      assert!(write);
    }
    other => panic!("Unexpected result {:?}", other)
  }
  assert!(!ctrl.description().hamming_checking_disable);
  ctrl.bus_mut().busy_after = None;
  assert_eq!(ctrl.bus().register(ChipSelector::Ttcrx, TTCRX_CONFIG_2) & TTCRX_HAMMING_ENABLE, 0);
  assert_eq!(ctrl.bus().register(ChipSelector::Ttcrx, TTCRX_CONFIG_3) & TTCRX_HAMMING_ENABLE, TTCRX_HAMMING_ENABLE);
  assert!(matches!(ctrl.get_hamming_checking_disable(), Err(DeviceError::InconsistentState {..})));
  // setting it again repairs the pair
  ctrl.set_hamming_checking_disable(true).unwrap();
  assert_eq!(ctrl.get_hamming_checking_disable(), Ok(true));
  assert!(ctrl.description().hamming_checking_disable);
}

#[test]
fn reset_refused_on_ttc_clock() {
  let mut ctrl  = ttcrx();
  let mut clock = FixedClockSource(ClockSource::Ttc);
  assert!(matches!(ctrl.send_reset(&mut clock, true), Err(DeviceError::InvalidState {..})));
  assert_eq!(ctrl.bus().writes_to(ChipSelector::FedSystem, FED_TTCRX_RESET), 0);
  assert_eq!(ctrl.bus().n_writes, 0);
}

#[test]
fn reset_through_shared_bus() {
  let bus = Rc::new(RefCell::new(SimulatedBus::new()));
  bus.borrow_mut().set_register(ChipSelector::FedSystem, FED_CLOCK_SELECT, FED_CLOCK_BACKPLANE);
  let mut ctrl  = TtcrxController::with_policy(bus.clone(), TtcrxDescription::new(), fast_policy()).unwrap();
  let mut clock = FedClockSource::with_policy(bus.clone(), fast_policy());
  ctrl.send_reset(&mut clock, false).unwrap();
  assert_eq!(bus.borrow().register(ChipSelector::FedSystem, FED_TTCRX_RESET), FED_TTCRX_RESET_EXTERNAL);
  ctrl.send_reset(&mut clock, true).unwrap();
  assert_eq!(bus.borrow().register(ChipSelector::FedSystem, FED_TTCRX_RESET), FED_TTCRX_RESET_INTERNAL);
  bus.borrow_mut().set_register(ChipSelector::FedSystem, FED_CLOCK_SELECT, FED_CLOCK_TTC);
  assert!(ctrl.send_reset(&mut clock, true).is_err());
  assert_eq!(bus.borrow().writes_to(ChipSelector::FedSystem, FED_TTCRX_RESET), 2);
}

#[test]
fn counters_and_reset() {
  let mut ctrl = ttcrx();
  {
    let bus = ctrl.bus_mut();
    bus.set_register(ChipSelector::Ttcrx, TTCRX_BUNCH_CNT_LSB, 0x34);
    bus.set_register(ChipSelector::Ttcrx, TTCRX_BUNCH_CNT_MSB, 0xf2);
    bus.set_register(ChipSelector::Ttcrx, TTCRX_EVENT_CNT_LSB, 0x01);
    bus.set_register(ChipSelector::Ttcrx, TTCRX_EVENT_CNT_MID, 0x02);
    bus.set_register(ChipSelector::Ttcrx, TTCRX_EVENT_CNT_MSB, 0x03);
    bus.set_register(ChipSelector::Ttcrx, TTCRX_SINGLE_ERR_CNT_LSB, 0xff);
    bus.set_register(ChipSelector::Ttcrx, TTCRX_SINGLE_ERR_CNT_MSB, 0x01);
    bus.set_register(ChipSelector::Ttcrx, TTCRX_DOUBLE_ERR_CNT, 7);
    bus.set_register(ChipSelector::Ttcrx, TTCRX_SEU_ERR_CNT, 9);
  }
  assert_eq!(ctrl.get_bunch_counter().unwrap(), 0x234);
  assert_eq!(ctrl.get_event_counter().unwrap(), 0x030201);
  assert_eq!(ctrl.get_single_bit_error_count().unwrap(), 0x1ff);
  assert_eq!(ctrl.get_double_bit_error_count().unwrap(), 7);
  assert_eq!(ctrl.get_seu_error_count().unwrap(), 9);
  let status = ctrl.get_status_register().unwrap();
  assert!(status.dll_ready());
  assert!(status.pll_ready());
  assert!(!status.frame_synch());

  ctrl.set_counter_reset(CounterResetFlags::all()).unwrap();
  let written : Vec<u32> = ctrl.bus().write_log.iter().map(|(_, a, _)| *a).collect();
  assert_eq!(written, vec![8, 9, 10, 11, 24, 25, 26, 27, 28, 22]);
  assert!(ctrl.bus().write_log.iter().all(|(_, _, v)| *v == TTCRX_COUNTER_RESET_VALUE));
}

#[test]
fn counter_reset_aborts_on_failure() {
  let mut ctrl = ttcrx();
  ctrl.bus_mut().stuck_busy = true;
  let flags = CounterResetFlags { bunch_counter : true, event_counter : true, ..Default::default() };
  assert!(matches!(ctrl.set_counter_reset(flags), Err(DeviceError::DeviceBusyOrError {..})));
  // gave up on the first register
  assert_eq!(ctrl.bus().n_writes, 100);
}

#[test]
fn failed_write_leaves_mirror() {
  let mut ctrl = ttcrx();
  ctrl.bus_mut().stuck_busy = true;
  match ctrl.set_dll_pump_current(5) {
    Err(DeviceError::DeviceBusyOrError { operation, chip, address, attempts, busy, .. }) => {
      assert_eq!(operation, "set_dll_pump_current");
      assert_eq!(chip, ChipSelector::Ttcrx);
      assert_eq!(address, TTCRX_CONFIG_1);
      assert_eq!(attempts, 100);
      assert!(busy);
    }
    other => panic!("Unexpected result {:?}", other)
  }
  assert_eq!(ctrl.bus().n_writes, 100);
  assert_eq!(ctrl.description().dll_pump_current, TtcrxDescription::new().dll_pump_current);
}

#[test]
fn read_gives_up_on_error() {
  let mut ctrl = ttcrx();
  ctrl.bus_mut().stuck_error = true;
  match ctrl.get_iac_id() {
    Err(DeviceError::DeviceBusyOrError { operation, write, attempts, busy, error, .. }) => {
      assert_eq!(operation, "get_iac_id");
      assert!(!write);
      assert_eq!(attempts, 100);
      assert_eq!((busy, error), (false, true));
    }
    other => panic!("Unexpected result {:?}", other)
  }
  // gave up on the first of the two id registers
  assert_eq!(ctrl.bus().n_reads, 100);
  assert_eq!(ctrl.bus().n_writes, 0);
}

#[test]
fn busy_and_error_are_both_reported() {
  let mut ctrl = ttcrx();
  ctrl.bus_mut().stuck_busy  = true;
  ctrl.bus_mut().stuck_error = true;
  match ctrl.set_i2c_id(12) {
    Err(DeviceError::DeviceBusyOrError { address, write, attempts, busy, error, .. }) => {
      assert_eq!(address, TTCRX_I2C_ID);
      assert!(write);
      assert_eq!(attempts, 100);
      assert_eq!((busy, error), (true, true));
    }
    other => panic!("Unexpected result {:?}", other)
  }
  assert_eq!(ctrl.description().i2c_id, TtcrxDescription::new().i2c_id);
}

#[test]
fn transient_errors_are_retried() {
  let mut ctrl = ttcrx();
  ctrl.bus_mut().pending_error = 3;
  ctrl.set_i2c_id(17).unwrap();
  assert_eq!(ctrl.bus().n_writes, 4);
  assert_eq!(ctrl.description().i2c_id, 17);
}

#[test]
fn apply_random_ttcrx_description() {
  for _ in 0..50 {
    let desc     = TtcrxDescription::from_random();
    let mut ctrl = ttcrx();
    ctrl.apply_description(&desc).unwrap();
    assert_eq!(ctrl.description(), &desc);
    assert_eq!(ctrl.read_hardware_description().unwrap(), desc);
  }
}

#[test]
fn invalid_ttcrx_description_is_refused() {
  let mut desc = TtcrxDescription::new();
  desc.dll_pump_current = 0;
  let mut ctrl = ttcrx();
  assert!(ctrl.apply_description(&desc).is_err());
  assert_eq!(ctrl.bus().n_writes, 0);
}

#[test]
fn controller_refuses_invalid_description() {
  let mut desc = TtcrxDescription::new();
  desc.brcst_str_two_coarse_delay = 20;
  desc.dll_pump_current           = 0;
  match TtcrxController::with_policy(SimulatedBus::new(), desc, fast_policy()) {
    Err(DeviceError::InvalidArgument { operation, parameter, .. }) => {
      assert_eq!(operation, "TtcrxController::new");
      assert_eq!(parameter, "description");
    }
    Err(other) => panic!("Unexpected error {}", other),
    Ok(_)      => panic!("Invalid description was accepted"),
  }
  assert!(TtcrxController::new(SimulatedBus::new(), desc).is_err());
  // one field out of range is enough
  let mut desc = TtcrxDescription::new();
  desc.pll_pump_current = 8;
  assert!(TtcrxController::new(SimulatedBus::new(), desc).is_err());
}

// ------------ voltage monitor ----------------

#[test]
fn adc_round_trip_through_hardware() {
  let mut ctrl = monitor();
  for rail in VoltageRail::ALL {
    let (_, low) = voltage_limit_registers(rail);
    for code in 0..=255u32 {
      ctrl.bus_mut().set_register(ChipSelector::VoltageMonitor, voltage_reading_register(rail), code);
      let voltage = ctrl.get_voltage(rail).unwrap();
      ctrl.set_voltage_min(rail, voltage).unwrap();
      assert_eq!(ctrl.bus().register(ChipSelector::VoltageMonitor, low), code, "{} code {}", rail, code);
      assert_eq!(ctrl.get_voltage_min(rail).unwrap(), voltage);
    }
  }
}

#[test]
fn voltage_max_checked_against_min() {
  let mut ctrl = monitor();
  for rail in VoltageRail::ALL {
    let min = rail.nominal() * 0.9;
    ctrl.set_voltage_min(rail, min).unwrap();
    let writes = ctrl.bus().n_writes;
    match ctrl.set_voltage_max(rail, min - 0.001) {
      Err(DeviceError::InvalidArgument { operation, .. }) => assert_eq!(operation, "set_voltage_max"),
      other => panic!("Unexpected result {:?} for {}", other, rail)
    }
    assert_eq!(ctrl.bus().n_writes, writes, "{}", rail);
    ctrl.set_voltage_max(rail, min).unwrap();
    assert_eq!(ctrl.description().voltage_max(rail), min, "{}", rail);
    assert_eq!(ctrl.bus().n_writes, writes + 1, "{}", rail);
  }
  // a min above the max goes through unchecked
  ctrl.set_voltage_min(VoltageRail::Five, 6.0).unwrap();
  assert_eq!(ctrl.description().voltage_min(VoltageRail::Five), 6.0);
}

#[test]
fn voltage_range_is_checked() {
  let mut ctrl = monitor();
  assert!(ctrl.set_voltage_min(VoltageRail::Twelve, -0.1).is_err());
  assert!(ctrl.set_voltage_max(VoltageRail::Twelve, 16.0).is_err());
  assert!(ctrl.set_voltage_max(VoltageRail::Twelve, f32::NAN).is_err());
  assert_eq!(ctrl.bus().n_writes, 0);
  ctrl.set_voltage_max(VoltageRail::Twelve, VoltageRail::Twelve.full_scale()).unwrap();
  let (high, _) = voltage_limit_registers(VoltageRail::Twelve);
  assert_eq!(ctrl.bus().register(ChipSelector::VoltageMonitor, high), 255);
}

#[test]
fn temp_max_checked_against_min() {
  let mut ctrl = monitor();
  ctrl.set_temp_min(TempChannel::Internal, 10).unwrap();
  assert!(ctrl.set_temp_max(TempChannel::Internal, 9).is_err());
  ctrl.set_temp_max(TempChannel::Internal, 10).unwrap();
  ctrl.set_temp_min(TempChannel::External, -40).unwrap();
  ctrl.set_temp_max(TempChannel::External, -20).unwrap();
  assert_eq!(ctrl.bus().register(ChipSelector::VoltageMonitor, ADM_EXT_TEMP_LOW), 0xd8);
  assert_eq!(ctrl.get_temp_min(TempChannel::External).unwrap(), -40);
  assert_eq!(ctrl.get_temp_max(TempChannel::External).unwrap(), -20);
  assert!(ctrl.set_temp_min(TempChannel::External, 128).is_err());
  assert!(ctrl.set_temp_min(TempChannel::External, -129).is_err());
}

#[test]
fn temp_offset_internal() {
  let mut ctrl = monitor();
  ctrl.bus_mut().set_register(ChipSelector::VoltageMonitor, ADM_VID, 0x15);
  ctrl.bus_mut().set_register(ChipSelector::VoltageMonitor, ADM_TEST, 0x80);
  ctrl.set_temp_offset(-10, true).unwrap();
  assert_eq!(ctrl.bus().register(ChipSelector::VoltageMonitor, ADM_TEMP_OFFSET), 0xf6);
  assert_eq!(ctrl.bus().register(ChipSelector::VoltageMonitor, ADM_VID), 0xd5);
  assert_eq!(ctrl.bus().register(ChipSelector::VoltageMonitor, ADM_TEST), 0x81);
  assert_eq!(ctrl.get_temp_offset().unwrap(), -10);
  assert!(ctrl.get_offset_temp_select().unwrap());
  ctrl.set_temp_offset(5, false).unwrap();
  assert_eq!(ctrl.bus().register(ChipSelector::VoltageMonitor, ADM_VID), 0x15);
  assert_eq!(ctrl.bus().register(ChipSelector::VoltageMonitor, ADM_TEST), 0x80);
  assert!(!ctrl.get_offset_temp_select().unwrap());
}

#[test]
fn offset_select_disagreement_reads_external() {
  let mut ctrl = monitor();
  ctrl.bus_mut().set_register(ChipSelector::VoltageMonitor, ADM_TEST, ADM_TEST_OFFSET_SELECT);
  ctrl.bus_mut().set_register(ChipSelector::VoltageMonitor, ADM_VID, 0x40);
  assert_eq!(ctrl.get_offset_temp_select(), Ok(false));
}

#[test]
fn stand_by_bit() {
  let mut ctrl = monitor();
  ctrl.bus_mut().set_register(ChipSelector::VoltageMonitor, ADM_CONFIG, 0x09);
  assert!(!ctrl.get_stand_by().unwrap());
  ctrl.set_stand_by(true).unwrap();
  assert_eq!(ctrl.bus().register(ChipSelector::VoltageMonitor, ADM_CONFIG), 0x08);
  assert!(ctrl.get_stand_by().unwrap());
  assert!(ctrl.description().stand_by);
}

#[test]
fn readings_status_and_ids() {
  let mut ctrl = monitor();
  assert_eq!(ctrl.get_manufacturer_id().unwrap(), 0x41);
  assert_eq!(ctrl.get_stepping_id().unwrap(), 0x20);
  for rail in VoltageRail::ALL {
    assert!((ctrl.get_voltage(rail).unwrap() - rail.nominal()).abs() < 1e-5);
  }
  assert_eq!(ctrl.get_temp(TempChannel::External).unwrap(), 35);
  ctrl.bus_mut().set_register(ChipSelector::VoltageMonitor, ADM_READ_INT_TEMP, 0xfb);
  assert_eq!(ctrl.get_temp(TempChannel::Internal).unwrap(), -5);
  ctrl.bus_mut().set_register(ChipSelector::VoltageMonitor, ADM_STATUS_1, ADM_ST1_3V3 | ADM_ST1_INT_TEMP);
  ctrl.bus_mut().set_register(ChipSelector::VoltageMonitor, ADM_STATUS_2, ADM_ST2_12V);
  let status = ctrl.get_status_register().unwrap();
  assert!(status.rail_out_of_limits(VoltageRail::ThreePointThree));
  assert!(status.rail_out_of_limits(VoltageRail::Twelve));
  assert!(!status.rail_out_of_limits(VoltageRail::Five));
  assert!(status.temp_out_of_limits(TempChannel::Internal));
  assert!(!status.remote_diode_fault());
}

#[test]
fn monitor_retry_exhaustion() {
  let mut ctrl = monitor();
  ctrl.bus_mut().stuck_busy = true;
  let before = *ctrl.description();
  match ctrl.set_voltage_min(VoltageRail::Core, 2.0) {
    Err(DeviceError::DeviceBusyOrError { operation, chip, attempts, .. }) => {
      assert_eq!(operation, "set_voltage_min");
      assert_eq!(chip, ChipSelector::VoltageMonitor);
      assert_eq!(attempts, 100);
    }
    other => panic!("Unexpected result {:?}", other)
  }
  assert_eq!(ctrl.bus().n_writes, 100);
  assert_eq!(ctrl.description(), &before);
}

#[test]
fn monitor_refuses_invalid_description() {
  let mut desc = VoltageControlDescription::new();
  desc.set_voltage_min(VoltageRail::Core, 2.0);
  desc.set_voltage_max(VoltageRail::Core, 1.5);
  match VoltageMonitorController::with_policy(SimulatedBus::new(), desc, fast_policy()) {
    Err(DeviceError::InvalidArgument { operation, parameter, .. }) => {
      assert_eq!(operation, "VoltageMonitorController::new");
      assert_eq!(parameter, "description");
    }
    Err(other) => panic!("Unexpected error {}", other),
    Ok(_)      => panic!("Invalid description was accepted"),
  }
  let mut desc = VoltageControlDescription::new();
  desc.set_voltage_max(VoltageRail::Twelve, f32::NAN);
  assert!(VoltageMonitorController::new(SimulatedBus::new(), desc).is_err());
}

#[test]
fn apply_random_voltage_description() {
  for _ in 0..50 {
    let desc     = VoltageControlDescription::from_random();
    let mut ctrl = monitor();
    ctrl.apply_description(&desc).unwrap();
    assert_eq!(ctrl.description(), &desc);
    let hw = ctrl.read_hardware_description().unwrap();
    for rail in VoltageRail::ALL {
      assert_eq!(voltage_to_code(rail, hw.voltage_min(rail)), voltage_to_code(rail, desc.voltage_min(rail)));
      assert_eq!(voltage_to_code(rail, hw.voltage_max(rail)), voltage_to_code(rail, desc.voltage_max(rail)));
    }
    for channel in TempChannel::ALL {
      assert_eq!(hw.temp_limits(channel), desc.temp_limits(channel));
    }
    assert_eq!(hw.temp_offset, desc.temp_offset);
    assert_eq!(hw.temp_offset_internal, desc.temp_offset_internal);
    assert_eq!(hw.stand_by, desc.stand_by);
  }
}

#[test]
fn shared_bus_for_both_chips() {
  let bus = Rc::new(RefCell::new(SimulatedBus::new()));
  let mut ttcrx   = TtcrxController::with_policy(bus.clone(), TtcrxDescription::new(), fast_policy()).unwrap();
  let mut monitor = VoltageMonitorController::with_policy(bus.clone(), VoltageControlDescription::new(), fast_policy()).unwrap();
  ttcrx.set_i2c_id(5).unwrap();
  monitor.set_temp_offset(3, false).unwrap();
  let board = bus.borrow();
  assert_eq!(board.register(ChipSelector::Ttcrx, TTCRX_I2C_ID), 5);
  assert_eq!(board.register(ChipSelector::VoltageMonitor, ADM_TEMP_OFFSET), 3);
}

// ------------ settings -----------------------

#[test]
fn write_and_read_settings() {
  let mut settings = DeviceSettings::new();
  settings.board_name = String::from("crate-3-slot-12");
  settings.ttcrx.clock_des_one_fine_delay = 117;
  settings.voltage_monitor.temp_offset    = -7;
  settings.voltage_monitor_retry          = RetryPolicy::new(20, 50);
  let fname = settings.to_toml(&temp_file("fed9u-device-settings")).unwrap();
  assert_eq!(DeviceSettings::from_toml(&fname).unwrap(), settings);
  let fname = settings.to_json(&temp_file("fed9u-device-settings.json")).unwrap();
  assert_eq!(DeviceSettings::from_json(&fname).unwrap(), settings);
}
