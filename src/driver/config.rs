use std::time::Duration;

/// Decides how long [`Sms60::return_on_halt`][super::Sms60::return_on_halt]
/// keeps polling the status before giving up
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct HaltPolicy {
    /// Upper bound on status queries per wait
    pub max_polls: u32,
    /// Wall-clock bound per wait, `None` waits until `max_polls` is reached
    pub timeout: Option<Duration>,
    /// Pause between two status queries, on top of the dispatch delay every
    /// query already incurs
    pub poll_interval: Duration,
}

impl Default for HaltPolicy {
    fn default() -> Self {
        HaltPolicy {
            max_polls: 10_000,
            timeout: None,
            poll_interval: Duration::ZERO,
        }
    }
}

/// Settings of a [`Sms60`][super::Sms60]
///
/// The defaults match an SMS60 driving a two-axis stage. The port settings
/// (8 data bits, no parity, 1 stop bit, no flow control) are fixed by the
/// controller and not configurable.
#[derive(Debug, PartialEq, Clone)]
pub struct Config {
    pub baud_rate: u32,
    /// Read and write timeout of the serial port
    pub io_timeout: Duration,
    /// Settling time after every dispatched command. The firmware doesn't
    /// acknowledge commands, so this is the only way to pace them.
    pub dispatch_delay: Duration,
    /// Settling time after the reset at construction
    pub reset_delay: Duration,
    /// Number of physical axes, they are addressed as `1..=axis_count`
    pub axis_count: u8,
    /// mm per step, indexed by axis number minus one
    pub scale_factors: Vec<f64>,
    /// Steps overshot when approaching a target from above
    pub backlash: i32,
    /// Ceiling of the firmware for `VEL`
    pub max_speed: i32,
    pub halt: HaltPolicy,
    /// Fail construction if the controller doesn't report a firmware version
    /// after the reset
    pub strict_init: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            baud_rate: 9600,
            io_timeout: Duration::from_millis(500),
            dispatch_delay: Duration::from_millis(500),
            reset_delay: Duration::from_millis(5000),
            axis_count: 2,
            scale_factors: vec![0.00008, 0.00008],
            backlash: 1000,
            max_speed: 8191,
            halt: HaltPolicy::default(),
            strict_init: false,
        }
    }
}

impl Config {
    /// Same as the default but without any delays. Meant for talking to
    /// something that isn't a real controller, like a mock.
    pub fn without_delays() -> Self {
        Config {
            dispatch_delay: Duration::ZERO,
            reset_delay: Duration::ZERO,
            ..Default::default()
        }
    }
}
