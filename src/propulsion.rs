/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Propulsion board operational state, as exposed through `FSM_PRB`.
//!
//! The state machine runs in PRB firmware; this side only observes it.
//! A state value outside the published enumeration is an error, never a
//! default: ignition may only be commanded from [`PropulsionState::ClearToIgnite`].

use core::fmt;

use crate::directory::DeviceInstance;
use crate::gateway::Gateway;
use crate::interface::Transport;
use crate::protocol::Word;
use crate::registers::names::FSM_PRB;
use crate::Error;

/// Decoded value of the PRB state register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum PropulsionState {
    Idle = 0,
    ClearToIgnite = 1,
    IgnitionSequence = 2,
    PassivationSequence = 3,
    Abort = 4,
    Error = 5,
}

impl PropulsionState {
    /// Number of published states; raw values run `0..COUNT`
    pub const COUNT: Word = 6;

    pub const fn from_raw(raw: Word) -> Option<Self> {
        match raw {
            0 => Some(PropulsionState::Idle),
            1 => Some(PropulsionState::ClearToIgnite),
            2 => Some(PropulsionState::IgnitionSequence),
            3 => Some(PropulsionState::PassivationSequence),
            4 => Some(PropulsionState::Abort),
            5 => Some(PropulsionState::Error),
            _ => None,
        }
    }

    pub const fn raw(self) -> Word {
        self as Word
    }

    /// Whether an ignition command may be issued in this state
    pub const fn may_ignite(self) -> bool {
        matches!(self, PropulsionState::ClearToIgnite)
    }

    /// Whether the board is running a sequence that must not be interrupted
    /// by anything but an abort
    pub const fn is_sequencing(self) -> bool {
        matches!(
            self,
            PropulsionState::IgnitionSequence | PropulsionState::PassivationSequence
        )
    }
}

impl fmt::Display for PropulsionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PropulsionState::Idle => "IDLE",
            PropulsionState::ClearToIgnite => "CLEAR_TO_IGNITE",
            PropulsionState::IgnitionSequence => "IGNITION_SEQUENCE",
            PropulsionState::PassivationSequence => "PASSIVATION_SEQUENCE",
            PropulsionState::Abort => "ABORT",
            PropulsionState::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Decode a raw `FSM_PRB` word
pub fn decode_state<E>(raw: Word) -> Result<PropulsionState, Error<E>> {
    PropulsionState::from_raw(raw).ok_or_else(|| {
        error!("FSM_PRB reported unknown state {=u32}", raw);
        Error::UnknownState(raw)
    })
}

/// Read the current operational state of a propulsion board
pub fn current_state<T, E>(
    gateway: &mut Gateway<'_, T>,
    instance: DeviceInstance,
) -> Result<PropulsionState, Error<E>>
where
    T: Transport<Error = E>,
{
    let raw = gateway.read_scalar(instance, FSM_PRB)?;
    decode_state(raw)
}
