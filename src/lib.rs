//! Rust driver for the OWIS SMS60 stepper motor controller driving a two-axis
//! stage over RS232.
//!
//! The controller speaks a line based ASCII protocol: every command is
//! `{mnemonic}{axis}` optionally followed by `={parameter}` and terminated by a
//! carriage return, queries are prefixed with `?`. It neither acknowledges
//! commands nor frames its replies, so the driver paces itself with fixed
//! delays and polls the status to learn when a move is done.
//!
//! # Usage
//! A [`Sms60`] owns the serial port. [`Sms60::open`] opens it, resets the
//! controller and switches it to terminal mode. After that the axes can be
//! referenced, moved in steps or in mm, and their counters, positions and
//! speeds read. Moves downwards are always finished from below to compensate
//! for backlash.
//!
//! Nothing after the construction returns an error. The controller doesn't
//! report any, so lost replies turn into empty strings or 0, see
//! [`Sms60::last_fault`] to find out if that happened.
//!
//! # Examples
//! ```no_run
//! use owis_sms60_driver::{Axis, Config, Sms60};
//!
//! let mut sms = Sms60::open("/dev/ttyUSB0", Config::default()).unwrap();
//! println!("{} {}, firmware {}", sms.manufacturer(), sms.instrument_type(), sms.firmware_version());
//!
//! sms.set_speed(Axis::X, 2000);
//! sms.set_speed(Axis::Y, 2000);
//! sms.move_to_reference_all();
//!
//! sms.go_to(25.0, 25.0);
//! println!(
//!     "X: {} steps => {:.5} mm",
//!     sms.get_counter(Axis::X),
//!     sms.get_position(Axis::X)
//! );
//! if let Some(fault) = sms.take_fault() {
//!     eprintln!("{}: {}", fault.at, fault.kind);
//! }
//! ```
//!

mod driver;
pub(crate) mod util;

pub use driver::{
    axis::Axis,
    cmd::{Command, PositioningMode},
    config::{Config, HaltPolicy},
    motion::{millimeters_to_steps, HaltOutcome, MotionStatus},
    DriverError, Fault, FaultKind, Sms60,
};
