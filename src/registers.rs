/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Register definitions and per-device-class register maps

use core::fmt;

use crate::directory::DeviceClass;
use crate::protocol::{FieldDescriptor, ValueShape, WORD_LEN};

/// Register names shared by the shipped revisions.
/// A name is only meaningful together with a map revision.
pub mod names {
    /// Flight computer time, pushed to every board
    pub const TIMESTAMP_MAIN: &str = "TIMESTAMP_MAIN";
    /// Leave low-power mode
    pub const WAKE_UP: &str = "WAKE_UP";
    /// Whether the board has left low-power mode
    pub const IS_WOKEN_UP: &str = "IS_WOKEN_UP";

    /// DPR: start tank pressurization
    pub const PRESSURIZE: &str = "PRESSURIZE";
    /// DPR / PRB: abort the running sequence
    pub const ABORT: &str = "ABORT";
    /// DPR: copressurant vessel pressure
    pub const P_NCO: &str = "P_NCO";
    /// DPR: copressurant vessel temperature
    pub const T_NCO: &str = "T_NCO";
    /// DPR: tank pressure, early layout
    pub const PRESSURE: &str = "PRESSURE";
    /// DPR: tank pressure
    pub const P_TANK: &str = "P_TANK";
    /// DPR: tank temperature
    pub const T_TANK: &str = "T_TANK";
    /// DPR / PRB: packed valve states
    pub const VALVES: &str = "VALVES";

    /// PRB / TRB: authorize the ignition or trigger sequence
    pub const CLEAR_TO_IGNITE: &str = "CLEAR_TO_IGNITE";
    /// PRB: operational state machine
    pub const FSM_PRB: &str = "FSM_PRB";
    /// PRB: oxidizer injector pressure
    pub const P_OIN: &str = "P_OIN";
    /// PRB: oxidizer injector temperature
    pub const T_OIN: &str = "T_OIN";
    /// PRB: ethanol injector pressure
    pub const P_EIN: &str = "P_EIN";
    /// PRB: ethanol injector temperature
    pub const T_EIN: &str = "T_EIN";
    /// PRB: combustion chamber pressure
    pub const P_CCC: &str = "P_CCC";
    /// PRB: combustion chamber temperature
    pub const T_CCC: &str = "T_CCC";
    /// PRB: igniter pressure
    pub const P_CIG: &str = "P_CIG";
    /// PRB: igniter temperature
    pub const T_CIG: &str = "T_CIG";
    /// PRB: valve map in the early layout
    pub const STATE_VALVES: &str = "STATE_VALVES";
    /// PRB: whether the igniter reported a successful light
    pub const IGNITION_OK: &str = "IGNITION_OK";

    /// TRB: packed pyro channels
    pub const PYROS: &str = "PYROS";
    /// TRB: pyro channel 1 in the early layout
    pub const PYRO_CH1: &str = "PYRO_CH1";
    /// TRB: pyro channel 2 in the early layout
    pub const PYRO_CH2: &str = "PYRO_CH2";
    /// TRB: pyro channel 3 in the early layout
    pub const PYRO_CH3: &str = "PYRO_CH3";
    /// TRB: whether any pyro channel has fired
    pub const IS_TRIGGERED: &str = "IS_TRIGGERED";

    /// CAM: start or stop recording
    pub const RECORDING: &str = "RECORDING";
    /// CAM: whether the camera is recording
    pub const IS_RECORDING: &str = "IS_RECORDING";
}

/// Transfer direction a register accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl Access {
    pub const fn readable(self) -> bool {
        matches!(self, Access::ReadOnly | Access::ReadWrite)
    }

    pub const fn writable(self) -> bool {
        matches!(self, Access::WriteOnly | Access::ReadWrite)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Access::ReadOnly => "R",
            Access::WriteOnly => "W",
            Access::ReadWrite => "R/W",
        };
        f.write_str(s)
    }
}

/// One register slot in a device's register file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterDef {
    pub name: &'static str,
    /// Register address within the device's file
    pub address: u8,
    pub access: Access,
    pub shape: ValueShape,
}

impl RegisterDef {
    /// Every register transfers one fixed-width word
    pub const WIDTH: usize = WORD_LEN;

    pub const fn new(name: &'static str, address: u8, access: Access, shape: ValueShape) -> Self {
        Self {
            name,
            address,
            access,
            shape,
        }
    }

    /// Write-only scalar
    pub const fn command(name: &'static str, address: u8) -> Self {
        Self::new(name, address, Access::WriteOnly, ValueShape::Scalar)
    }

    /// Read-only scalar
    pub const fn reading(name: &'static str, address: u8) -> Self {
        Self::new(name, address, Access::ReadOnly, ValueShape::Scalar)
    }

    /// Boolean sentinel with the given direction
    pub const fn flag(name: &'static str, address: u8, access: Access) -> Self {
        Self::new(name, address, access, ValueShape::BooleanSentinel)
    }

    /// Packed bitmap with the given direction
    pub const fn packed(
        name: &'static str,
        address: u8,
        access: Access,
        fields: &'static [FieldDescriptor],
    ) -> Self {
        Self::new(name, address, access, ValueShape::PackedBitmap(fields))
    }

    /// Packed channel layout, if this is a bitmap register
    pub fn fields(&self) -> Option<&'static [FieldDescriptor]> {
        match self.shape {
            ValueShape::PackedBitmap(fields) => Some(fields),
            _ => None,
        }
    }
}

/// The register file of one device class, in address order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterMap {
    pub class: DeviceClass,
    pub registers: &'static [RegisterDef],
    /// Trailing count sentinel as published by the firmware header.
    /// Addresses at or above it are invalid in every direction.
    pub count: u8,
}

/// How a register map relates to another revision of the same class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Compatibility {
    /// Same registers at the same addresses
    Identical,
    /// Every register of the old map is unchanged; new ones were added
    Additive,
    /// At least one register moved, changed direction or shape, or was removed
    Breaking {
        /// First offending register of the old map
        register: &'static str,
    },
}

impl RegisterMap {
    pub const fn new(class: DeviceClass, registers: &'static [RegisterDef], count: u8) -> Self {
        Self {
            class,
            registers,
            count,
        }
    }

    /// Look up a register by name
    pub fn lookup(&self, name: &str) -> Option<&'static RegisterDef> {
        self.registers.iter().find(|reg| reg.name == name)
    }

    /// Look up a register by address; `None` at or beyond [`Self::register_count`]
    pub fn at(&self, address: u8) -> Option<&'static RegisterDef> {
        if address >= self.count {
            return None;
        }
        self.registers.iter().find(|reg| reg.address == address)
    }

    /// Size of the register file
    pub fn register_count(&self) -> u8 {
        self.count
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static RegisterDef> {
        self.registers.iter()
    }

    /// Compare `newer` against this map
    pub fn compatibility(&self, newer: &RegisterMap) -> Compatibility {
        for old in self.registers {
            match newer.lookup(old.name) {
                Some(new) if new == old => {}
                _ => {
                    return Compatibility::Breaking {
                        register: old.name,
                    }
                }
            }
        }
        if newer.registers.len() == self.registers.len() {
            Compatibility::Identical
        } else {
            Compatibility::Additive
        }
    }
}
