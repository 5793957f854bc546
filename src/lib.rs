/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Register-map protocol of the avionics intranet.
//!
//! The flight computer talks to each subsystem board (pressurization
//! controllers, propulsion board, pyro trigger board, cameras) over one
//! shared I2C bus. Every board exposes a small numbered register file of
//! 4-byte words. This crate holds the versioned register maps, the word
//! codec, and a [`Gateway`] that validates every request against the active
//! map before a single byte goes out on the bus.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod directory;
pub mod gateway;
pub mod interface;
pub mod propulsion;
pub mod protocol;
pub mod registers;
pub mod resolver;
pub mod revisions;

pub use directory::{
    AddressDirectory, CameraPosition, DeviceClass, DeviceInstance, DirectoryError, Propellant,
    Provision,
};
pub use gateway::Gateway;
pub use interface::{I2cTransport, SharedBus, SharedBusError, Transport};
pub use propulsion::{current_state, PropulsionState};
pub use protocol::{Channels, CodecError, FieldDescriptor, Sentinels, Value, ValueShape, Word};
pub use registers::{Access, Compatibility, RegisterDef, RegisterMap};
pub use resolver::{MapResolver, SessionConfig};
pub use revisions::{MapError, MapRevision, RevisionId};

/// Errors in this crate
///
/// Only [`Error::Transport`], [`Error::InvalidSentinel`], [`Error::ReservedBits`]
/// and [`Error::UnknownState`] can occur after a transfer; everything else is
/// raised before the bus is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Device instance is not provisioned in the address directory
    #[error("{0} is not provisioned")]
    UnknownInstance(DeviceInstance),
    /// Register name is not part of the class's active map
    #[error("no such register in the active {0} map")]
    UnknownRegister(DeviceClass),
    /// Read of a write-only register, or write of a read-only one
    #[error("{register} is {access}, direction not allowed")]
    DirectionViolation {
        register: &'static str,
        access: Access,
    },
    /// Value kind does not match the register's shape
    #[error("value does not match shape of {register}")]
    ShapeMismatch { register: &'static str },
    /// Channel value does not fit its packed field
    #[error("value {value:#x} out of range for field {field}")]
    OutOfRange { field: &'static str, value: u32 },
    /// Wrong number of channel values for a packed register
    #[error("expected {expected} channel values, found {found}")]
    FieldCountMismatch { expected: usize, found: usize },
    /// Packed field descriptor does not lie within one word
    #[error("field {field} does not fit a register word")]
    FieldOutsideWord { field: &'static str },
    /// Boolean register returned neither sentinel pattern
    #[error("word {0:#010x} is not a boolean sentinel")]
    InvalidSentinel(Word),
    /// Packed register returned bits outside every defined field
    #[error("word {0:#010x} has reserved bits set")]
    ReservedBits(Word),
    /// Propulsion state register returned a value outside the enumeration
    #[error("unknown propulsion state {0}")]
    UnknownState(Word),
    /// Requested map revision is not compiled into this build
    #[error("register map {0} is not supported")]
    UnsupportedRevision(RevisionId),
    /// A map revision failed validation
    #[error("invalid register map: {0}")]
    InvalidMap(MapError),
    /// Communication error, as reported by the transport
    #[error("transport fault: {0:?}")]
    Transport(E),
}

impl<E> From<CodecError> for Error<E> {
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::OutOfRange { field, value } => Error::OutOfRange { field, value },
            CodecError::FieldCountMismatch { expected, found } => {
                Error::FieldCountMismatch { expected, found }
            }
            CodecError::FieldOutsideWord { field } => Error::FieldOutsideWord { field },
            CodecError::InvalidSentinel(word) => Error::InvalidSentinel(word),
            CodecError::ReservedBits(word) => Error::ReservedBits(word),
        }
    }
}

impl<E> From<MapError> for Error<E> {
    fn from(error: MapError) -> Self {
        match error {
            MapError::UnsupportedRevision(id) => Error::UnsupportedRevision(id),
            other => Error::InvalidMap(other),
        }
    }
}
