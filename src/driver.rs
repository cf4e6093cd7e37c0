#[cfg(test)]
mod tests;

pub mod axis;
pub mod cmd;
pub mod config;
mod map;
pub mod motion;
mod parse;

use self::{axis::Axis, cmd::Command, config::Config, parse::parse_integer};
use crate::util::ensure;
use chrono::{DateTime, Local};
use log::{debug, info, trace, warn};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::{
    fmt::Debug,
    io::{self, Read, Write},
    thread,
};
use thiserror::Error;

// size of a single read, the controller's replies are way shorter
const READ_BUFFER_SIZE: usize = 4096;

// unfortunately, due to rustfmt not having the blank_lines_upper_bound feature
// stable yet, we gotta put comments in between the different sections. otherwise
// its just too much

//

/// Errors returned while setting up a [`Sms60`]
///
/// Once a driver exists its operations don't fail, see [`Fault`] instead.
#[derive(Error, Debug)]
pub enum DriverError {
    /// Thrown by [`Sms60::open`] if the serial port couldn't be opened
    #[error("couldn't open port {port}: {source}")]
    Connection {
        port: String,
        #[source]
        source: serialport::Error,
    },
    /// Thrown during strict initialization if the reset couldn't be sent
    #[error(transparent)]
    IoError(#[from] io::Error),
    /// Thrown during strict initialization if the controller didn't report a
    /// firmware version after the reset
    #[error("controller didn't report a firmware version after reset")]
    NoFirmwareResponse,
}

/// Describes how an operation degraded instead of failing
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum FaultKind {
    #[error("couldn't send {command}: {kind:?}")]
    WriteFailed { command: String, kind: io::ErrorKind },
    #[error("no reply: {0:?}")]
    ReadFailed(io::ErrorKind),
    #[error("reply {reply:?} to {command} isn't an integer, twice")]
    UnparsableInteger { command: String, reply: String },
    /// The command was suppressed since the axis can't be addressed
    #[error("command for {0} suppressed")]
    AxisSuppressed(Axis),
    /// Waiting for standstill was abandoned
    #[error("axes still moving after {polls} status polls")]
    HaltTimeout { polls: u32 },
    /// The target of a move couldn't be converted to steps, the axis wasn't
    /// moved
    #[error("target {target} mm for {axis} isn't reachable")]
    InvalidTarget { axis: Axis, target: String },
}

/// The last thing that went wrong, see [`Sms60::last_fault`]
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Fault {
    pub at: DateTime<Local>,
    pub kind: FaultKind,
}

//

/// Driver for an OWIS SMS60 stepper motor controller
///
/// `I` is the interface used to talk to the controller, usually the serialport
/// opened by [`open`][Sms60::open]. The driver owns it and drops it together
/// with itself, [`into_inner`][Sms60::into_inner] hands it back instead.
///
/// None of the operations return errors. Following the controller, which
/// neither acknowledges commands nor reports failures, everything that goes
/// wrong degrades to an empty reply, a default value or a suppressed command.
/// Every such event is logged and remembered as the [`last_fault`][Sms60::last_fault],
/// so callers who care can check.
///
/// This type is not threadsafe, one driver serves one caller.
pub struct Sms60<I: Read + Write> {
    interface: I,
    port: String,
    config: Config,
    firmware: Option<String>,
    last_fault: Option<Fault>,
}

impl Sms60<Box<dyn SerialPort>> {
    /// Opens the serial port `port_name` and initializes the controller
    /// behind it. This takes at least `config.reset_delay`.
    ///
    /// # Errors
    /// Returns a [`DriverError::Connection`] if the port can't be opened. See
    /// [`new`][Sms60::new] for the errors of the initialization.
    ///
    /// # Examples
    /// ```no_run
    /// use owis_sms60_driver::{Axis, Config, Sms60};
    ///
    /// let mut sms = Sms60::open("/dev/ttyUSB0", Config::default()).unwrap();
    /// sms.move_to_reference_all();
    /// sms.go_to(25.0, 12.5);
    /// println!("X is at {} mm", sms.get_position(Axis::X));
    /// ```
    pub fn open(port_name: &str, config: Config) -> Result<Self, DriverError> {
        let port_name = port_name.trim();
        let interface = serialport::new(port_name, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.io_timeout)
            .open()
            .map_err(|source| DriverError::Connection {
                port: port_name.to_owned(),
                source,
            })?;
        info!("opened {} at {} baud", port_name, config.baud_rate);
        Self::with_port_name(interface, port_name, config)
    }
}

impl<I: Read + Write> Sms60<I> {
    /// Returns a new driver talking over `interface`, which has to be set up
    /// already. The controller gets reset and switched to terminal mode, so
    /// this takes at least `config.reset_delay`.
    ///
    /// # Errors
    /// Only fails if `config.strict_init` is set: [`DriverError::IoError`] if
    /// the reset couldn't be sent, [`DriverError::NoFirmwareResponse`] if the
    /// controller stays silent afterwards.
    pub fn new(interface: I, config: Config) -> Result<Self, DriverError> {
        Self::with_port_name(interface, "", config)
    }

    fn with_port_name(interface: I, port: &str, config: Config) -> Result<Self, DriverError> {
        let mut sms = Sms60 {
            interface,
            port: port.to_owned(),
            config,
            firmware: None,
            last_fault: None,
        };
        sms.initialize()?;
        Ok(sms)
    }

    fn initialize(&mut self) -> Result<(), DriverError> {
        if self.config.strict_init {
            self.try_dispatch(map::RESET, Axis::None, "")?;
        } else {
            self.dispatch(map::RESET, Axis::None, "");
        }
        thread::sleep(self.config.reset_delay);
        self.dispatch(map::TERMINAL_MODE, Axis::None, "1");
        if self.config.strict_init {
            ensure!(
                !self.firmware_version().is_empty(),
                DriverError::NoFirmwareResponse
            );
        }
        info!("controller on '{}' initialized", self.port);
        Ok(())
    }

    /// Returns the interface, dropping the driver
    pub fn into_inner(self) -> I {
        self.interface
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Name of the port given to [`open`][Sms60::open], empty otherwise
    pub fn device_port(&self) -> &str {
        &self.port
    }

    pub fn manufacturer(&self) -> &'static str {
        "OWIS GmbH Staufen"
    }

    pub fn instrument_type(&self) -> &'static str {
        "SMS60"
    }

    pub fn axis_count(&self) -> u8 {
        self.config.axis_count
    }

    /// Returns mm per step of `axis`, NaN for anything that isn't a
    /// configured physical axis
    pub fn scale_factor(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Physical(i) if i >= 1 && i <= self.config.axis_count => self
                .config
                .scale_factors
                .get(i as usize - 1)
                .copied()
                .unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }

    pub fn x_scale_factor(&self) -> f64 {
        self.scale_factor(Axis::X)
    }

    pub fn y_scale_factor(&self) -> f64 {
        self.scale_factor(Axis::Y)
    }

    /// Returns the firmware version reported by the controller, empty if it
    /// didn't report one. Only queried until it's known.
    pub fn firmware_version(&mut self) -> String {
        if let Some(v) = &self.firmware {
            return v.clone();
        }
        let reply = self.send_and_read_plain(&query(map::FIRMWARE_VERSION));
        // the reply starts with a single character we don't need
        let version = reply.get(1..).unwrap_or("").trim_end();
        if version.len() > 1 {
            self.firmware = Some(version.to_owned());
            version.to_owned()
        } else {
            String::new()
        }
    }

    /// Returns the last fault since it was last taken
    pub fn last_fault(&self) -> Option<&Fault> {
        self.last_fault.as_ref()
    }

    /// Returns the last fault and forgets it
    pub fn take_fault(&mut self) -> Option<Fault> {
        self.last_fault.take()
    }

    fn record(&mut self, kind: FaultKind) {
        match &kind {
            FaultKind::AxisSuppressed(_) => debug!("{}", kind),
            _ => warn!("{}", kind),
        }
        self.last_fault = Some(Fault {
            at: Local::now(),
            kind,
        });
    }

    //

    fn write_line(&mut self, command: &Command<'_>) -> io::Result<()> {
        trace!("sending '{}'", command.to_string().escape_default());
        // a single write, so the line either goes out completely or not at all
        self.interface.write_all(format!("{}\r", command).as_bytes())?;
        self.interface.flush()
    }

    // reads whatever the controller has to say. the replies aren't framed,
    // we rely on the dispatch delay for the complete reply to be waiting
    fn read_response(&mut self) -> String {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        match self.interface.read(&mut buf) {
            Ok(n) => {
                let reply: String = buf[..n]
                    .iter()
                    .map(|&b| if b.is_ascii() { b as char } else { '?' })
                    .collect();
                trace!("received '{}'", reply.escape_default());
                reply
            }
            Err(e) => {
                self.record(FaultKind::ReadFailed(e.kind()));
                String::new()
            }
        }
    }

    // sends a command unless the axis can't be addressed, then waits for the
    // controller to settle. Ok(false) if the command was suppressed
    fn try_dispatch(&mut self, verb: &str, axis: Axis, parameter: &str) -> io::Result<bool> {
        let index = match axis.wire_index(self.config.axis_count) {
            Some(i) => i,
            None => {
                self.record(FaultKind::AxisSuppressed(axis));
                return Ok(false);
            }
        };
        let res = self.write_line(&Command::new(verb, index, parameter));
        thread::sleep(self.config.dispatch_delay);
        res.map(|_| true)
    }

    // same as try_dispatch, but a failed write is only recorded
    fn dispatch(&mut self, verb: &str, axis: Axis, parameter: &str) -> bool {
        match self.try_dispatch(verb, axis, parameter) {
            Ok(sent) => sent,
            Err(e) => {
                // a write can only fail for an axis that could be addressed
                let index = axis.wire_index(self.config.axis_count).unwrap_or(0);
                self.record(FaultKind::WriteFailed {
                    command: Command::new(verb, index, parameter).to_string(),
                    kind: e.kind(),
                });
                false
            }
        }
    }

    /// Sends `command` for `axis` with an optional `parameter` and returns the
    /// raw reply of the controller.
    ///
    /// This is the escape hatch for everything the driver has no method for.
    /// The line sent is `{command}{axis}`, followed by `={parameter}` if the
    /// parameter isn't empty. If `axis` can't be addressed nothing is sent or
    /// read and the reply is empty. An empty reply also means the controller
    /// didn't answer in time.
    ///
    /// # Examples
    /// ```no_run
    /// use owis_sms60_driver::{Axis, Config, Sms60};
    ///
    /// let mut sms = Sms60::open("/dev/ttyUSB0", Config::default()).unwrap();
    /// let status = sms.send_and_read("?ST", Axis::None, "");
    /// let speed = sms.send_and_read_axis("?VEL", Axis::X);
    /// ```
    pub fn send_and_read(&mut self, command: &str, axis: Axis, parameter: &str) -> String {
        // a write that failed might still have left something in the buffer,
        // so only a suppressed command skips the read
        let suppressed = axis.wire_index(self.config.axis_count).is_none();
        self.dispatch(command, axis, parameter);
        if suppressed {
            String::new()
        } else {
            self.read_response()
        }
    }

    /// [`send_and_read`][Sms60::send_and_read] for the controller itself
    pub fn send_and_read_plain(&mut self, command: &str) -> String {
        self.send_and_read(command, Axis::None, "")
    }

    /// [`send_and_read`][Sms60::send_and_read] without a parameter
    pub fn send_and_read_axis(&mut self, command: &str, axis: Axis) -> String {
        self.send_and_read(command, axis, "")
    }

    /// [`send_and_read`][Sms60::send_and_read] for the controller itself with
    /// a parameter
    pub fn send_and_read_param(&mut self, command: &str, parameter: &str) -> String {
        self.send_and_read(command, Axis::None, parameter)
    }

    // sends a query expecting an integer. an unparsable reply gets exactly one
    // more try, after that the fault is recorded and 0 returned
    fn get_integer_parameter(&mut self, command: &str, axis: Axis) -> i32 {
        // nothing to retry for an axis that can't be addressed
        if axis.wire_index(self.config.axis_count).is_none() {
            self.record(FaultKind::AxisSuppressed(axis));
            return 0;
        }
        let reply = self.send_and_read_axis(command, axis);
        if let Some(n) = parse_integer(&reply) {
            return n;
        }
        let reply = self.send_and_read_axis(command, axis);
        match parse_integer(&reply) {
            Some(n) => n,
            None => {
                self.record(FaultKind::UnparsableInteger {
                    command: command.to_owned(),
                    reply,
                });
                0
            }
        }
    }
}

impl<I: Read + Write> Debug for Sms60<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sms60 {{ interface: _, port: {:?}, config: {:?}, firmware: {:?}, last_fault: {:?} }}",
            self.port, self.config, self.firmware, self.last_fault,
        )
    }
}

// turns a mnemonic into the matching read command
fn query(verb: &str) -> String {
    format!("{}{}", map::QUERY, verb)
}
