//! Bring up the TTCrx and the voltage monitor of a
//! simulated FED9U and dump what the chips hold.
//!
//! Handy to check a settings file before it goes
//! to a real board.

#[macro_use] extern crate log;
extern crate env_logger;
extern crate fed9u_devices;

use std::rc::Rc;
use std::cell::RefCell;
use std::process::exit;

use clap::{
  Parser,
  ValueEnum,
};
use colored::Colorize;

use fed9u_dataclasses::{
  VoltageRail,
  TempChannel,
};
use fed9u_devices::{
  ChipSelector,
  ClockSource,
  DeviceError,
  DeviceSettings,
  FedClockSource,
  TtcrxController,
  VoltageMonitorController,
};
use fed9u_devices::registers::*;
use fed9u_devices::simulation::SimulatedBus;
use fed9u_devices::ttcrx::CounterResetFlags;

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum ClockArg {
  Internal,
  Ttc,
  Backplane,
}

impl ClockArg {
  fn select_value(&self) -> u32 {
    match self {
      ClockArg::Internal  => FED_CLOCK_INTERNAL,
      ClockArg::Ttc       => FED_CLOCK_TTC,
      ClockArg::Backplane => FED_CLOCK_BACKPLANE,
    }
  }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// Device settings (.toml or .json). Defaults are
  /// used if not given.
  #[arg(short, long)]
  settings       : Option<String>,
  /// Clock source the simulated FED runs on
  #[arg(short, long, value_enum, default_value_t = ClockArg::Internal)]
  clock          : ClockArg,
  /// Write the settings in use to this file (toml)
  #[arg(long)]
  write_settings : Option<String>,
  /// Send a TTCrx reset after the configuration
  #[arg(long, default_value_t = false)]
  reset          : bool,
  /// Clear the TTCrx counters after the configuration
  #[arg(long, default_value_t = false)]
  reset_counters : bool,
}

fn load_settings(filename : &Option<String>) -> DeviceSettings {
  match filename {
    None => {
      info!("No settings file given, using defaults");
      DeviceSettings::new()
    }
    Some(fname) => {
      let result = if fname.ends_with(".json") {
        DeviceSettings::from_json(fname)
      } else {
        DeviceSettings::from_toml(fname)
      };
      match result {
        Err(err) => {
          error!("Unable to load settings from {}! {}", fname, err);
          exit(1);
        }
        Ok(settings) => settings
      }
    }
  }
}

fn report(what : &str, result : Result<(), DeviceError>) {
  match result {
    Ok(_)    => println!("=> {} {}", what, "OK".green().bold()),
    Err(err) => println!("=> {} {} {}", what, "FAILED".red().bold(), err),
  }
}

fn dump_registers(bus : &Rc<RefCell<SimulatedBus>>, chip : ChipSelector, addresses : &[u32]) {
  println!("{}", format!("-- {} registers --", chip).blue().bold());
  let board = bus.borrow();
  for address in addresses {
    println!("  {:#04x} : {:#04x}", address, board.register(chip, *address));
  }
}

fn main() {
  env_logger::init();
  let args     = Args::parse();
  let settings = load_settings(&args.settings);
  println!("{}", settings);

  if let Some(fname) = &args.write_settings {
    match settings.to_toml(fname) {
      Err(err)    => error!("Unable to write settings! {}", err),
      Ok(written) => info!("Settings written to {}", written),
    }
  }

  let bus = Rc::new(RefCell::new(SimulatedBus::new()));
  bus.borrow_mut().set_register(ChipSelector::FedSystem, FED_CLOCK_SELECT, args.clock.select_value());

  let ttcrx = TtcrxController::with_policy(bus.clone(),
                                           settings.ttcrx,
                                           settings.ttcrx_retry);
  let monitor = VoltageMonitorController::with_policy(bus.clone(),
                                                      settings.voltage_monitor,
                                                      settings.voltage_monitor_retry);
  let (mut ttcrx, mut monitor) = match (ttcrx, monitor) {
    (Ok(ttcrx), Ok(monitor)) => (ttcrx, monitor),
    (Err(err), _) | (_, Err(err)) => {
      error!("Settings can not be used for the devices! {}", err);
      exit(1);
    }
  };
  let mut clock   = FedClockSource::with_policy(bus.clone(), settings.fed_retry);

  report("Applying TTCrx description", ttcrx.apply_description(&settings.ttcrx));
  report("Applying voltage monitor description",
         monitor.apply_description(&settings.voltage_monitor));

  dump_registers(&bus, ChipSelector::Ttcrx, &[
    TTCRX_FINE_DELAY_1, TTCRX_FINE_DELAY_2, TTCRX_COARSE_DELAY, TTCRX_CONTROL,
    TTCRX_ID_LSB, TTCRX_ID_MSB, TTCRX_I2C_ID, TTCRX_CONFIG_1, TTCRX_CONFIG_2,
    TTCRX_CONFIG_3, TTCRX_STATUS]);

  match ttcrx.read_hardware_description() {
    Err(err) => error!("Unable to read back the TTCrx! {}", err),
    Ok(desc) => {
      if &desc == ttcrx.description() {
        println!("=> TTCrx read-back matches the description {}", "OK".green().bold());
      } else {
        println!("=> TTCrx read-back {} the description!", "DIFFERS FROM".red().bold());
        println!("{}", desc);
      }
    }
  }
  match ttcrx.get_status_register() {
    Err(err)   => error!("Unable to read the TTCrx status! {}", err),
    Ok(status) => println!("=> {}", status),
  }

  println!("{}", "-- Voltage monitor --".blue().bold());
  match (monitor.get_manufacturer_id(), monitor.get_stepping_id()) {
    (Ok(man), Ok(step)) => println!("  Manufacturer {:#04x}, stepping {:#04x}", man, step),
    _ => error!("Unable to read the chip ids!"),
  }
  for rail in VoltageRail::ALL {
    let reading = monitor.get_voltage(rail);
    let min     = monitor.get_voltage_min(rail);
    let max     = monitor.get_voltage_max(rail);
    match (reading, min, max) {
      (Ok(v), Ok(lo), Ok(hi)) => {
        let value = format!("{:.3}", v);
        let value = if v < lo || v > hi {value.red()} else {value.green()};
        println!("  {:<6} : {} V  [{:.3} - {:.3}]", rail, value, lo, hi);
      }
      _ => error!("Unable to read rail {}!", rail),
    }
  }
  for channel in TempChannel::ALL {
    match (monitor.get_temp(channel), monitor.get_temp_min(channel), monitor.get_temp_max(channel)) {
      (Ok(t), Ok(lo), Ok(hi)) => println!("  {:<8} : {} C  [{} - {}]", channel, t, lo, hi),
      _ => error!("Unable to read temperature {}!", channel),
    }
  }
  match monitor.get_status_register() {
    Err(err)   => error!("Unable to read the monitor status! {}", err),
    Ok(status) => println!("=> {}", status),
  }

  if args.reset_counters {
    report("Clearing TTCrx counters", ttcrx.set_counter_reset(CounterResetFlags::all()));
  }
  if args.reset {
    if args.clock == ClockArg::Ttc {
      warn!("The TTCrx provides the clock ({}), expect the reset to be refused", ClockSource::Ttc);
    }
    report("Sending TTCrx reset", ttcrx.send_reset(&mut clock, true));
  }
  let board = bus.borrow();
  info!("{} reads, {} writes issued", board.n_reads, board.n_writes);
}
