//! Moving the axes
//!
//! The controller executes a move on its own once it received `GO`, the link
//! is free again right away. The only way to learn that a move is done is to
//! poll the status, which is what [`Sms60::return_on_halt`] does. Every
//! method here named `*_wait` does that before returning.
//!
//! Mechanical backlash is compensated by approaching every target from below:
//! a move downwards first overshoots by [`Config::backlash`][super::Config::backlash]
//! steps, waits for standstill and then goes the rest of the way up.

use super::{
    axis::Axis,
    cmd::PositioningMode,
    config::HaltPolicy,
    map,
    parse::parse_status_fields,
    query, FaultKind, Sms60,
};
use log::debug;
use std::{
    io::{Read, Write},
    thread,
    time::{Duration, Instant},
};

// closer than this to an integer counts as that integer when converting mm
const STEP_EPSILON: f64 = 1e-6;

/// Converts `mm` to steps with `scale` mm per step, truncating towards zero
///
/// A quotient within a millionth of a step of an integer is taken as that
/// integer, since e.g. `1.0 / 0.00008` comes out as `12499.999999999998`.
/// Returns `None` if the result isn't a number or doesn't fit a step counter.
pub fn millimeters_to_steps(mm: f64, scale: f64) -> Option<i32> {
    let steps = mm / scale;
    let nearest = steps.round();
    let steps = if (steps - nearest).abs() < STEP_EPSILON {
        nearest
    } else {
        steps.trunc()
    };
    if steps.is_finite() && steps >= i32::MIN as f64 && steps <= i32::MAX as f64 {
        Some(steps as i32)
    } else {
        None
    }
}

/// How waiting for standstill ended
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum HaltOutcome {
    /// All axes stopped, `polls` status queries were needed to see that
    Halted { polls: u32 },
    /// Gave up after `polls` status queries, the axes might still move
    TimedOut { polls: u32 },
}

impl HaltOutcome {
    pub fn is_halted(&self) -> bool {
        matches!(self, Self::Halted { .. })
    }

    pub fn polls(&self) -> u32 {
        match *self {
            Self::Halted { polls } | Self::TimedOut { polls } => polls,
        }
    }

    // combines two consecutive waits, timed out if either did
    fn and(self, other: HaltOutcome) -> HaltOutcome {
        let polls = self.polls().saturating_add(other.polls());
        if self.is_halted() && other.is_halted() {
            Self::Halted { polls }
        } else {
            Self::TimedOut { polls }
        }
    }
}

/// Reply to a status query
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MotionStatus {
    /// Value of `MOTION` if the reply had one
    pub motion: Option<i32>,
    /// Value of `REF` if the reply had one
    pub referencing: Option<i32>,
    pub reply: String,
}

impl MotionStatus {
    pub fn from_reply(reply: String) -> Self {
        let mut motion = None;
        let mut referencing = None;
        for (key, value) in parse_status_fields(&reply) {
            match key {
                "MOTION" => motion = Some(value),
                "REF" => referencing = Some(value),
                _ => {}
            }
        }
        MotionStatus {
            motion,
            referencing,
            reply,
        }
    }

    /// True if the reply says that nothing moves and nothing is referencing.
    /// Anything else, an empty reply included, counts as moving.
    pub fn is_halted(&self) -> bool {
        self.reply.contains(map::NO_MOTION) && self.reply.contains(map::NO_REFERENCING)
    }

    pub fn is_moving(&self) -> bool {
        !self.is_halted()
    }
}

impl<I: Read + Write> Sms60<I> {
    /// Queries the status of the controller
    pub fn get_status(&mut self) -> MotionStatus {
        MotionStatus::from_reply(self.send_and_read_plain(&query(map::STATUS)))
    }

    /// Returns true if any axis is moving or referencing
    pub fn is_moving(&mut self) -> bool {
        self.get_status().is_moving()
    }

    /// Blocks until all axes stopped or the configured [`HaltPolicy`] runs out
    ///
    /// Every poll is a status query, which already takes the dispatch delay.
    /// Running out isn't an error, the outcome says what happened and the
    /// timeout is recorded as fault.
    pub fn return_on_halt(&mut self) -> HaltOutcome {
        let policy = self.config.halt;
        self.poll_until_halted(policy)
    }

    /// Blocks until all axes stopped or `timeout` elapsed, pausing
    /// `poll_interval` between two status queries
    pub fn wait_for_halt(&mut self, timeout: Duration, poll_interval: Duration) -> HaltOutcome {
        self.poll_until_halted(HaltPolicy {
            max_polls: u32::MAX,
            timeout: Some(timeout),
            poll_interval,
        })
    }

    fn poll_until_halted(&mut self, policy: HaltPolicy) -> HaltOutcome {
        let start = Instant::now();
        let mut polls = 0;
        loop {
            let expired = policy.timeout.map_or(false, |t| start.elapsed() >= t);
            if polls >= policy.max_polls || expired {
                self.record(FaultKind::HaltTimeout { polls });
                return HaltOutcome::TimedOut { polls };
            }
            polls += 1;
            if !self.is_moving() {
                return HaltOutcome::Halted { polls };
            }
            if !policy.poll_interval.is_zero() {
                thread::sleep(policy.poll_interval);
            }
        }
    }

    // MOD, SET and GO, without looking back
    fn move_raw(&mut self, axis: Axis, mode: PositioningMode, steps: i32) {
        self.dispatch(map::POSITIONING_MODE, axis, &mode.to_string());
        self.dispatch(map::TARGET, axis, &steps.to_string());
        self.dispatch(map::GO, axis, "");
    }

    /// Moves `axis` by `steps`, without waiting for the move to finish
    ///
    /// A move downwards is done in two parts because of backlash, the method
    /// waits for the first part to finish.
    pub fn move_relative(&mut self, axis: Axis, steps: i32) {
        if steps < 0 {
            let backlash = self.config.backlash;
            debug!("moving {} by {} steps with backlash {}", axis, steps, backlash);
            let first = steps.saturating_sub(backlash);
            self.move_raw(axis, PositioningMode::Relative, first);
            self.return_on_halt();
            self.move_raw(axis, PositioningMode::Relative, backlash);
            return;
        }
        self.move_raw(axis, PositioningMode::Relative, steps);
    }

    /// Same as [`move_relative`][Sms60::move_relative] but waits for the move
    /// to finish
    pub fn move_relative_wait(&mut self, axis: Axis, steps: i32) -> HaltOutcome {
        self.move_relative(axis, steps);
        self.return_on_halt()
    }

    /// Moves `axis` to the step count `steps`, without waiting for the move to
    /// finish
    ///
    /// The current counter is queried first. If the target is below it, the
    /// method goes `backlash` steps below the target and waits for that move
    /// to finish before approaching the target.
    pub fn move_absolute(&mut self, axis: Axis, steps: i32) {
        let current = self.get_counter(axis);
        if current > steps {
            let backlash = self.config.backlash;
            debug!(
                "moving {} down from {} to {} with backlash {}",
                axis, current, steps, backlash
            );
            let below = steps.saturating_sub(backlash);
            self.move_raw(axis, PositioningMode::Absolute, below);
            self.return_on_halt();
        }
        self.move_raw(axis, PositioningMode::Absolute, steps);
    }

    /// Same as [`move_absolute`][Sms60::move_absolute] but waits for the move
    /// to finish
    pub fn move_absolute_wait(&mut self, axis: Axis, steps: i32) -> HaltOutcome {
        self.move_absolute(axis, steps);
        self.return_on_halt()
    }

    /// Moves X and then Y to the given step counts, without waiting
    ///
    /// Y gets its command right after X got its own, so both axes usually
    /// move at the same time.
    pub fn move_absolute_xy(&mut self, x_steps: i32, y_steps: i32) {
        self.move_absolute(Axis::X, x_steps);
        self.move_absolute(Axis::Y, y_steps);
    }

    pub fn move_absolute_xy_wait(&mut self, x_steps: i32, y_steps: i32) -> HaltOutcome {
        self.move_absolute_xy(x_steps, y_steps);
        self.return_on_halt()
    }

    /// Moves to the position `x`/`y` in mm and waits until it's reached
    ///
    /// An axis whose target can't be expressed in steps, e.g. NaN or way out
    /// of range, isn't moved at all and the target is recorded as fault.
    ///
    /// # Examples
    /// ```no_run
    /// use owis_sms60_driver::{Config, Sms60};
    ///
    /// let mut sms = Sms60::open("/dev/ttyUSB0", Config::default()).unwrap();
    /// sms.move_to_reference_all();
    /// if !sms.go_to(49.5, 0.5).is_halted() {
    ///     eprintln!("stage didn't stop in time");
    /// }
    /// ```
    pub fn go_to(&mut self, x: f64, y: f64) -> HaltOutcome {
        let x_steps = self.target_steps(Axis::X, x);
        let y_steps = self.target_steps(Axis::Y, y);
        debug!("going to {} mm / {} mm, {:?} / {:?} steps", x, y, x_steps, y_steps);
        if let Some(steps) = x_steps {
            self.move_absolute(Axis::X, steps);
        }
        if let Some(steps) = y_steps {
            self.move_absolute(Axis::Y, steps);
        }
        self.return_on_halt()
    }

    fn target_steps(&mut self, axis: Axis, mm: f64) -> Option<i32> {
        let steps = millimeters_to_steps(mm, self.scale_factor(axis));
        if steps.is_none() {
            self.record(FaultKind::InvalidTarget {
                axis,
                target: mm.to_string(),
            });
        }
        steps
    }

    /// Moves `axis` to its reference switch and waits for it to arrive. The
    /// controller resets the counter of the axis to 0 there.
    ///
    /// [`Axis::All`] references every axis, see
    /// [`move_to_reference_all`][Sms60::move_to_reference_all].
    pub fn move_to_reference(&mut self, axis: Axis) -> HaltOutcome {
        if axis == Axis::All {
            return self.move_to_reference_all();
        }
        debug!("referencing {}", axis);
        self.send_and_read(map::REFERENCE, axis, map::REFERENCE_MODE);
        self.return_on_halt()
    }

    /// References all axes one after another, in the order of their numbers
    pub fn move_to_reference_all(&mut self) -> HaltOutcome {
        Axis::physical(self.config.axis_count).fold(HaltOutcome::Halted { polls: 0 }, |o, a| {
            o.and(self.move_to_reference(a))
        })
    }

    /// Sets the speed of `axis`. Values outside of `1..=max_speed` are clamped,
    /// the value actually sent is returned.
    pub fn set_speed(&mut self, axis: Axis, speed: i32) -> i32 {
        // a max_speed below 1 must not make clamp panic
        let speed = speed.max(1).min(self.config.max_speed.max(1));
        self.send_and_read(map::VELOCITY, axis, &speed.to_string());
        speed
    }

    /// Returns the speed of `axis`, 0 if the controller didn't tell
    pub fn get_speed(&mut self, axis: Axis) -> i32 {
        self.get_integer_parameter(&query(map::VELOCITY), axis)
    }

    /// Returns the step counter of `axis`, 0 if the controller didn't tell
    pub fn get_counter(&mut self, axis: Axis) -> i32 {
        self.get_integer_parameter(&query(map::COUNTER), axis)
    }

    /// Returns the position of `axis` in mm
    ///
    /// NaN for anything but a physical axis, in which case nothing is queried.
    pub fn get_position(&mut self, axis: Axis) -> f64 {
        let scale = self.scale_factor(axis);
        if scale.is_nan() {
            return f64::NAN;
        }
        self.get_counter(axis) as f64 * scale
    }

    pub fn get_positioning_mode(&mut self, axis: Axis) -> Option<PositioningMode> {
        let reply = self.send_and_read_axis(&query(map::POSITIONING_MODE), axis);
        PositioningMode::parse(&reply)
    }
}
