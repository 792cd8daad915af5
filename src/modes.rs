use std::{fmt, str::FromStr};

use thiserror::Error;

/// Leap second warning carried in the top two bits of the first packet byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LeapIndicator {
    /// No leap second pending.
    NoWarning,
    /// Last minute of the day has 61 seconds.
    InsertSecond,
    /// Last minute of the day has 59 seconds.
    DeleteSecond,
    /// Clock not synchronized.
    Unsynchronized,
}

impl LeapIndicator {
    /// Maps the low two bits of `value`; higher bits are ignored.
    #[must_use]
    pub fn from_bits(value: u8) -> Self {
        match value & 0b11 {
            0 => LeapIndicator::NoWarning,
            1 => LeapIndicator::InsertSecond,
            2 => LeapIndicator::DeleteSecond,
            _ => LeapIndicator::Unsynchronized,
        }
    }

    #[must_use]
    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for LeapIndicator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LeapIndicator::NoWarning => write!(f, "no warning"),
            LeapIndicator::InsertSecond => write!(f, "insert second"),
            LeapIndicator::DeleteSecond => write!(f, "delete second"),
            LeapIndicator::Unsynchronized => write!(f, "unsynchronized"),
        }
    }
}

/// Association mode from the low three bits of the first packet byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AssociationMode {
    Reserved,
    SymmetricActive,
    SymmetricPassive,
    Client,
    Server,
    Broadcast,
    Control,
    Private,
}

/// Error returned when parsing an association mode name.
#[derive(Error, Debug)]
pub enum ModeError {
    #[error("Invalid association mode: {0}")]
    InvalidMode(String),
}

impl AssociationMode {
    /// Maps the low three bits of `value`; higher bits are ignored.
    #[must_use]
    pub fn from_bits(value: u8) -> Self {
        match value & 0b111 {
            0 => AssociationMode::Reserved,
            1 => AssociationMode::SymmetricActive,
            2 => AssociationMode::SymmetricPassive,
            3 => AssociationMode::Client,
            4 => AssociationMode::Server,
            5 => AssociationMode::Broadcast,
            6 => AssociationMode::Control,
            _ => AssociationMode::Private,
        }
    }

    #[must_use]
    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl FromStr for AssociationMode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserved" => Ok(AssociationMode::Reserved),
            "symmetric-active" => Ok(AssociationMode::SymmetricActive),
            "symmetric-passive" => Ok(AssociationMode::SymmetricPassive),
            "client" => Ok(AssociationMode::Client),
            "server" => Ok(AssociationMode::Server),
            "broadcast" => Ok(AssociationMode::Broadcast),
            "control" => Ok(AssociationMode::Control),
            "private" => Ok(AssociationMode::Private),
            _ => Err(ModeError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for AssociationMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            AssociationMode::Reserved => write!(f, "reserved"),
            AssociationMode::SymmetricActive => write!(f, "symmetric-active"),
            AssociationMode::SymmetricPassive => write!(f, "symmetric-passive"),
            AssociationMode::Client => write!(f, "client"),
            AssociationMode::Server => write!(f, "server"),
            AssociationMode::Broadcast => write!(f, "broadcast"),
            AssociationMode::Control => write!(f, "control"),
            AssociationMode::Private => write!(f, "private"),
        }
    }
}
