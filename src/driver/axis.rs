use std::fmt::Display;

/// Selects what a command is addressed to
///
/// Used to discern whether a command is meant for the controller as a whole,
/// for every axis or for one physical axis. Physical axes are numbered from 1,
/// the number is sent verbatim on the wire. How many physical axes exist is
/// not a property of this type but of the driver's [`Config`][super::Config].
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum Axis {
    /// The controller itself, sent as axis `0`
    None,
    /// Every physical axis. There is no wire index for it, commands addressed
    /// to it are suppressed by the dispatcher
    All,
    Physical(u8),
}

impl Axis {
    pub const X: Axis = Axis::Physical(1);
    pub const Y: Axis = Axis::Physical(2);

    pub fn is_physical(&self) -> bool {
        matches!(self, Self::Physical(_))
    }

    /// Returns the index used on the wire if the axis may be addressed on a
    /// controller with `axis_count` physical axes
    pub fn wire_index(self, axis_count: u8) -> Option<u8> {
        match self {
            Self::None => Some(0),
            Self::All => None,
            Self::Physical(i) if i >= 1 && i <= axis_count => Some(i),
            Self::Physical(_) => None,
        }
    }

    /// Iterates over the physical axes `1..=axis_count` in index order
    pub fn physical(axis_count: u8) -> impl Iterator<Item = Axis> {
        (1..=axis_count).map(Axis::Physical)
    }
}

impl Default for Axis {
    fn default() -> Self {
        Self::None
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "controller"),
            Self::All => write!(f, "all axes"),
            Self::Physical(1) => write!(f, "X"),
            Self::Physical(2) => write!(f, "Y"),
            Self::Physical(i) => write!(f, "axis {}", i),
        }
    }
}
