/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Device classes, device instances and the bus address directory

use core::fmt;

use thiserror::Error;

/// Highest 7-bit I2C address
pub const MAX_BUS_ADDRESS: u8 = 0x7F;

/// Kind of subsystem board on the intranet bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceClass {
    /// DPR: pressurization / fluid controller
    PressurizationController,
    /// PRB: propulsion board, owns the ignition state machine
    PropulsionBoard,
    /// TRB: pyrotechnic trigger board
    TriggerBoard,
    /// CAM: camera module
    CameraModule,
}

impl DeviceClass {
    /// Every class, in map order
    pub const ALL: [DeviceClass; 4] = [
        DeviceClass::PressurizationController,
        DeviceClass::PropulsionBoard,
        DeviceClass::TriggerBoard,
        DeviceClass::CameraModule,
    ];

    pub const fn short_name(self) -> &'static str {
        match self {
            DeviceClass::PressurizationController => "DPR",
            DeviceClass::PropulsionBoard => "PRB",
            DeviceClass::TriggerBoard => "TRB",
            DeviceClass::CameraModule => "CAM",
        }
    }

    /// Position in [`Self::ALL`]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Which propellant a DPR instance pressurizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Propellant {
    /// Ethanol (fuel) side
    Eth,
    /// Liquid oxygen side
    Lox,
}

/// Mounting position of a camera module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CameraPosition {
    /// Stage separation
    Sep,
    Up,
    Down,
}

/// One physical board: a device class plus its instance discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceInstance {
    Dpr(Propellant),
    Prb,
    Trb,
    Cam(CameraPosition),
}

impl DeviceInstance {
    pub const fn class(self) -> DeviceClass {
        match self {
            DeviceInstance::Dpr(_) => DeviceClass::PressurizationController,
            DeviceInstance::Prb => DeviceClass::PropulsionBoard,
            DeviceInstance::Trb => DeviceClass::TriggerBoard,
            DeviceInstance::Cam(_) => DeviceClass::CameraModule,
        }
    }
}

impl fmt::Display for DeviceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceInstance::Dpr(Propellant::Eth) => f.write_str("DPR_ETH"),
            DeviceInstance::Dpr(Propellant::Lox) => f.write_str("DPR_LOX"),
            DeviceInstance::Prb => f.write_str("PRB"),
            DeviceInstance::Trb => f.write_str("TRB"),
            DeviceInstance::Cam(CameraPosition::Sep) => f.write_str("CAM_SEP"),
            DeviceInstance::Cam(CameraPosition::Up) => f.write_str("CAM_UP"),
            DeviceInstance::Cam(CameraPosition::Down) => f.write_str("CAM_DOWN"),
        }
    }
}

/// A provisioned board and the bus address it answers on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Provision {
    pub instance: DeviceInstance,
    pub address: u8,
}

impl Provision {
    pub const fn new(instance: DeviceInstance, address: u8) -> Self {
        Self { instance, address }
    }
}

/// Address table of the flight avionics stack
pub static FLIGHT_PROVISIONS: [Provision; 7] = [
    Provision::new(DeviceInstance::Dpr(Propellant::Eth), 0x20),
    Provision::new(DeviceInstance::Dpr(Propellant::Lox), 0x21),
    Provision::new(DeviceInstance::Prb, 0x30),
    Provision::new(DeviceInstance::Trb, 0x40),
    Provision::new(DeviceInstance::Cam(CameraPosition::Sep), 0x50),
    Provision::new(DeviceInstance::Cam(CameraPosition::Up), 0x51),
    Provision::new(DeviceInstance::Cam(CameraPosition::Down), 0x52),
];

/// Reasons a directory cannot be built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DirectoryError {
    /// Address does not fit the 7-bit address space
    #[error("{instance}: address {address:#04x} is not a 7-bit bus address")]
    AddressOutOfRange {
        instance: DeviceInstance,
        address: u8,
    },
    /// Two instances answer on the same address
    #[error("{first} and {second} both resolve to {address:#04x}")]
    AddressInUse {
        address: u8,
        first: DeviceInstance,
        second: DeviceInstance,
    },
    /// The same instance is provisioned twice
    #[error("{0} is provisioned twice")]
    DuplicateInstance(DeviceInstance),
}

/// Maps each provisioned device instance to its bus address.
/// Addresses are unique; this is checked once, at construction.
#[derive(Debug, Clone, Copy)]
pub struct AddressDirectory<'a> {
    provisions: &'a [Provision],
}

impl<'a> AddressDirectory<'a> {
    /// Validate and wrap a provisioning table
    pub fn new(provisions: &'a [Provision]) -> Result<Self, DirectoryError> {
        for (i, entry) in provisions.iter().enumerate() {
            if entry.address > MAX_BUS_ADDRESS {
                return Err(DirectoryError::AddressOutOfRange {
                    instance: entry.instance,
                    address: entry.address,
                });
            }
            for earlier in &provisions[..i] {
                if earlier.instance == entry.instance {
                    return Err(DirectoryError::DuplicateInstance(entry.instance));
                }
                if earlier.address == entry.address {
                    return Err(DirectoryError::AddressInUse {
                        address: entry.address,
                        first: earlier.instance,
                        second: entry.instance,
                    });
                }
            }
        }
        Ok(Self { provisions })
    }

    /// Bus address of `instance`, `None` if it is not provisioned
    pub fn resolve(&self, instance: DeviceInstance) -> Option<u8> {
        self.provisions
            .iter()
            .find(|entry| entry.instance == instance)
            .map(|entry| entry.address)
    }

    pub fn provisions(&self) -> &'a [Provision] {
        self.provisions
    }
}

impl AddressDirectory<'static> {
    /// The flight address table
    pub fn flight() -> Result<Self, DirectoryError> {
        Self::new(&FLIGHT_PROVISIONS)
    }
}
