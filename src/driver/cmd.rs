//! Provides bindings for the raw command lines of the SMS60.
//!
//! You usually don't have to build commands yourself, the methods of
//! [`Sms60`][super::Sms60] do that. No checks on values are performed in this
//! module, a value the controller doesn't like is simply ignored by it.


use super::parse::parse_integer;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::fmt::Display;

/// A single command line, `{verb}{axis}` optionally followed by `={parameter}`
///
/// The terminator is not part of the command, it's appended by the transport.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Command<'a> {
    pub verb: &'a str,
    pub axis: u8,
    pub parameter: &'a str,
}

impl<'a> Command<'a> {
    pub fn new(verb: &'a str, axis: u8, parameter: &'a str) -> Self {
        Command {
            verb,
            axis,
            parameter,
        }
    }
}

impl Display for Command<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.verb, self.axis)?;
        if !self.parameter.is_empty() {
            write!(f, "={}", self.parameter)?;
        }
        Ok(())
    }
}

/// Binding for the values of `MOD`, which selects how the target of the next
/// `SET` is interpreted
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, FromPrimitive)]
pub enum PositioningMode {
    Relative = 0,
    Absolute = 1,
}

impl PositioningMode {
    pub(super) fn parse(s: &str) -> Option<Self> {
        parse_integer(s).and_then(PositioningMode::from_i32)
    }
}

impl Display for PositioningMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", *self as u8)
    }
}
