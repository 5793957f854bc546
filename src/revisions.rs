/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Map revisions
//!
//! A [`MapRevision`] is one immutable snapshot of the register maps of every
//! device class, as shipped with one firmware generation. Register addresses
//! are renumbered between revisions, so a map is only ever looked up through
//! the revision both sides of the link were built against.

use core::fmt;

use thiserror::Error;

use crate::directory::DeviceClass;
use crate::protocol::{FieldDescriptor, Sentinels, ValueShape, MAX_FIELDS, MAX_FIELD_WIDTH};
use crate::registers::{names::*, Access, Compatibility, RegisterDef, RegisterMap};

/// Identifies one published register map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RevisionId(pub u16);

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Reasons a map revision (or a catalog of them) is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MapError {
    /// Engage/disengage patterns are equal, 0/1, or one bit apart
    #[error(
        "sentinels engage={:#x} disengage={:#x} are not two distinct non-adjacent patterns",
        .0.engage,
        .0.disengage
    )]
    MalformedSentinels(Sentinels),
    /// The revision does not define exactly one map per device class
    #[error("no register map for {0}")]
    MissingClass(DeviceClass),
    /// A map is filed under the wrong class slot
    #[error("{0} map filed under another class")]
    MisplacedMap(DeviceClass),
    /// Two registers share one address
    #[error("{class}: address {address:#04x} defined twice")]
    DuplicateAddress { class: DeviceClass, address: u8 },
    /// Register addresses do not run contiguously from zero
    #[error("{class}: expected address {expected:#04x}, found {found:#04x}")]
    AddressGap {
        class: DeviceClass,
        expected: u8,
        found: u8,
    },
    /// Two registers share one name
    #[error("{class}: {name} defined twice")]
    DuplicateName {
        class: DeviceClass,
        name: &'static str,
    },
    /// The count sentinel disagrees with the number of defined registers
    #[error("{class}: count sentinel {declared} but {defined} registers")]
    CountMismatch {
        class: DeviceClass,
        declared: u8,
        defined: usize,
    },
    /// A packed field is empty, too wide, or sticks out of the word
    #[error("{register}.{field} does not fit a register word")]
    BadField {
        register: &'static str,
        field: &'static str,
    },
    /// Two packed fields of one register share bits
    #[error("{register}.{field} overlaps another field")]
    FieldOverlap {
        register: &'static str,
        field: &'static str,
    },
    /// A packed register has no fields or more than fit a channel set
    #[error("{register} has an unusable number of packed fields")]
    BadFieldCount { register: &'static str },
    /// Two revisions in one catalog share an id
    #[error("revision {0} listed twice")]
    DuplicateRevision(RevisionId),
    /// No revision with this id is compiled into the binary
    #[error("revision {0} is not supported")]
    UnsupportedRevision(RevisionId),
}

/// One published snapshot of every device class's register map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MapRevision {
    id: RevisionId,
    sentinels: Sentinels,
    maps: [RegisterMap; 4],
}

impl MapRevision {
    /// Build a revision, checking every structural invariant.
    /// `maps` must hold one map per class, in [`DeviceClass::ALL`] order.
    pub fn new(
        id: RevisionId,
        sentinels: Sentinels,
        maps: [RegisterMap; 4],
    ) -> Result<Self, MapError> {
        let revision = Self::unchecked(id, sentinels, maps);
        revision.validate()?;
        Ok(revision)
    }

    /// Build without validation, for the static tables; the resolver validates
    /// every revision before it serves one.
    pub const fn unchecked(id: RevisionId, sentinels: Sentinels, maps: [RegisterMap; 4]) -> Self {
        Self {
            id,
            sentinels,
            maps,
        }
    }

    pub fn id(&self) -> RevisionId {
        self.id
    }

    /// Boolean patterns used by every sentinel register of this revision
    pub fn sentinels(&self) -> &Sentinels {
        &self.sentinels
    }

    /// Register map of `class`
    pub fn map(&self, class: DeviceClass) -> &RegisterMap {
        &self.maps[class.index()]
    }

    /// Look up a register of `class` by name
    pub fn lookup(&self, class: DeviceClass, name: &str) -> Option<&'static RegisterDef> {
        self.map(class).lookup(name)
    }

    pub fn register_count(&self, class: DeviceClass) -> u8 {
        self.map(class).register_count()
    }

    /// How the map of `class` in `newer` relates to this revision's.
    /// A change of boolean patterns breaks every sentinel register the class
    /// already has, even when no register moved.
    pub fn compatibility(&self, class: DeviceClass, newer: &MapRevision) -> Compatibility {
        let old = self.map(class);
        let layout = old.compatibility(newer.map(class));
        if let Compatibility::Breaking { .. } = layout {
            return layout;
        }
        if self.sentinels != newer.sentinels {
            let flag = old
                .iter()
                .find(|reg| reg.shape == ValueShape::BooleanSentinel);
            if let Some(reg) = flag {
                return Compatibility::Breaking { register: reg.name };
            }
        }
        layout
    }

    /// Check every structural invariant of the revision
    pub fn validate(&self) -> Result<(), MapError> {
        if !self.sentinels.is_well_formed() {
            return Err(MapError::MalformedSentinels(self.sentinels));
        }
        for class in DeviceClass::ALL.iter().copied() {
            let map = &self.maps[class.index()];
            if map.class != class {
                return Err(MapError::MisplacedMap(map.class));
            }
            if map.registers.is_empty() {
                return Err(MapError::MissingClass(class));
            }
            validate_map(map)?;
        }
        Ok(())
    }
}

fn validate_map(map: &RegisterMap) -> Result<(), MapError> {
    let class = map.class;
    for (i, reg) in map.registers.iter().enumerate() {
        for earlier in &map.registers[..i] {
            if earlier.address == reg.address {
                return Err(MapError::DuplicateAddress {
                    class,
                    address: reg.address,
                });
            }
            if earlier.name == reg.name {
                return Err(MapError::DuplicateName {
                    class,
                    name: reg.name,
                });
            }
        }
        if usize::from(reg.address) != i {
            return Err(MapError::AddressGap {
                class,
                expected: i as u8,
                found: reg.address,
            });
        }
        if let ValueShape::PackedBitmap(fields) = reg.shape {
            validate_fields(reg.name, fields)?;
        }
    }
    if usize::from(map.count) != map.registers.len() {
        return Err(MapError::CountMismatch {
            class,
            declared: map.count,
            defined: map.registers.len(),
        });
    }
    Ok(())
}

fn validate_fields(register: &'static str, fields: &[FieldDescriptor]) -> Result<(), MapError> {
    if fields.is_empty() || fields.len() > MAX_FIELDS {
        return Err(MapError::BadFieldCount { register });
    }
    let mut used = 0u32;
    for field in fields {
        if !field.fits_word() || field.width > MAX_FIELD_WIDTH {
            return Err(MapError::BadField {
                register,
                field: field.name,
            });
        }
        if used & field.word_mask() != 0 {
            return Err(MapError::FieldOverlap {
                register,
                field: field.name,
            });
        }
        used |= field.word_mask();
    }
    Ok(())
}

/// Validate a catalog of revisions: each one valid, ids unique
pub fn validate_catalog(catalog: &[MapRevision]) -> Result<(), MapError> {
    for (i, revision) in catalog.iter().enumerate() {
        revision.validate()?;
        if catalog[..i].iter().any(|earlier| earlier.id == revision.id) {
            return Err(MapError::DuplicateRevision(revision.id));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// r1: early layout. Per-channel pyro registers, PRB valves as one-bit flags.

/// Boolean patterns of the early layout
pub const SENTINELS_R1: Sentinels = Sentinels {
    engage: 0xAC,
    disengage: 0xDE,
};

const PRB_VALVE_FLAGS_R1: [FieldDescriptor; 6] = [
    FieldDescriptor::flag("ME_B", 0),
    FieldDescriptor::flag("MO_BC", 1),
    FieldDescriptor::flag("IE_NC", 2),
    FieldDescriptor::flag("IO_NCC", 3),
    FieldDescriptor::flag("VE_NO", 4),
    FieldDescriptor::flag("VO_NOC", 5),
];

const DPR_R1: [RegisterDef; 7] = [
    RegisterDef::command(TIMESTAMP_MAIN, 0x00),
    RegisterDef::flag(WAKE_UP, 0x01, Access::WriteOnly),
    RegisterDef::flag(IS_WOKEN_UP, 0x02, Access::ReadOnly),
    RegisterDef::flag(PRESSURIZE, 0x03, Access::WriteOnly),
    RegisterDef::flag(ABORT, 0x04, Access::WriteOnly),
    RegisterDef::reading(PRESSURE, 0x05),
    RegisterDef::reading("DN_NC", 0x06),
];

const PRB_R1: [RegisterDef; 14] = [
    RegisterDef::command(TIMESTAMP_MAIN, 0x00),
    RegisterDef::flag(WAKE_UP, 0x01, Access::WriteOnly),
    RegisterDef::flag(IS_WOKEN_UP, 0x02, Access::ReadOnly),
    RegisterDef::flag(CLEAR_TO_IGNITE, 0x03, Access::WriteOnly),
    RegisterDef::reading(FSM_PRB, 0x04),
    RegisterDef::reading(P_OIN, 0x05),
    RegisterDef::reading(T_OIN, 0x06),
    RegisterDef::reading(P_EIN, 0x07),
    RegisterDef::reading(T_EIN, 0x08),
    RegisterDef::reading(P_CCC, 0x09),
    RegisterDef::reading(T_CCC, 0x0A),
    RegisterDef::reading(P_CIG, 0x0B),
    RegisterDef::reading(T_CIG, 0x0C),
    RegisterDef::packed(STATE_VALVES, 0x0D, Access::ReadWrite, &PRB_VALVE_FLAGS_R1),
];

const TRB_R1: [RegisterDef; 7] = [
    RegisterDef::command(TIMESTAMP_MAIN, 0x00),
    RegisterDef::flag(WAKE_UP, 0x01, Access::WriteOnly),
    RegisterDef::flag(IS_WOKEN_UP, 0x02, Access::ReadOnly),
    RegisterDef::flag(CLEAR_TO_IGNITE, 0x03, Access::WriteOnly),
    RegisterDef::flag(PYRO_CH1, 0x04, Access::ReadWrite),
    RegisterDef::flag(PYRO_CH2, 0x05, Access::ReadWrite),
    RegisterDef::flag(PYRO_CH3, 0x06, Access::ReadWrite),
];

const CAM_R1: [RegisterDef; 3] = [
    RegisterDef::command(TIMESTAMP_MAIN, 0x00),
    RegisterDef::flag(WAKE_UP, 0x01, Access::WriteOnly),
    RegisterDef::flag(IS_WOKEN_UP, 0x02, Access::ReadOnly),
];

/// Early register map
pub const REV_1: MapRevision = MapRevision::unchecked(
    RevisionId(1),
    SENTINELS_R1,
    [
        RegisterMap::new(DeviceClass::PressurizationController, &DPR_R1, 7),
        RegisterMap::new(DeviceClass::PropulsionBoard, &PRB_R1, 14),
        RegisterMap::new(DeviceClass::TriggerBoard, &TRB_R1, 7),
        RegisterMap::new(DeviceClass::CameraModule, &CAM_R1, 3),
    ],
);

// ---------------------------------------------------------------------------
// r2: latest layout. Packed valve and pyro registers, camera control.

const DPR_VALVES_R2: [FieldDescriptor; 3] = [
    FieldDescriptor::byte("DN_NC", 16),
    FieldDescriptor::byte("PX_NC", 8),
    FieldDescriptor::byte("VX_NO", 0),
];

const PRB_VALVES_R2: [FieldDescriptor; 2] = [
    FieldDescriptor::byte("MO_BC", 8),
    FieldDescriptor::byte("ME_B", 0),
];

const TRB_PYROS_R2: [FieldDescriptor; 3] = [
    FieldDescriptor::byte("PYRO3", 16),
    FieldDescriptor::byte("PYRO2", 8),
    FieldDescriptor::byte("PYRO1", 0),
];

const DPR_R2: [RegisterDef; 10] = [
    RegisterDef::command(TIMESTAMP_MAIN, 0x00),
    RegisterDef::flag(WAKE_UP, 0x01, Access::WriteOnly),
    RegisterDef::flag(IS_WOKEN_UP, 0x02, Access::ReadOnly),
    RegisterDef::flag(PRESSURIZE, 0x03, Access::WriteOnly),
    RegisterDef::flag(ABORT, 0x04, Access::ReadWrite),
    RegisterDef::reading(P_NCO, 0x05),
    RegisterDef::reading(T_NCO, 0x06),
    RegisterDef::reading(P_TANK, 0x07),
    RegisterDef::reading(T_TANK, 0x08),
    RegisterDef::packed(VALVES, 0x09, Access::ReadWrite, &DPR_VALVES_R2),
];

const PRB_R2: [RegisterDef; 16] = [
    RegisterDef::command(TIMESTAMP_MAIN, 0x00),
    RegisterDef::flag(WAKE_UP, 0x01, Access::WriteOnly),
    RegisterDef::flag(IS_WOKEN_UP, 0x02, Access::ReadOnly),
    RegisterDef::flag(CLEAR_TO_IGNITE, 0x03, Access::WriteOnly),
    RegisterDef::reading(FSM_PRB, 0x04),
    RegisterDef::reading(P_OIN, 0x05),
    RegisterDef::reading(T_OIN, 0x06),
    RegisterDef::reading(P_EIN, 0x07),
    RegisterDef::reading(T_EIN, 0x08),
    RegisterDef::reading(P_CCC, 0x09),
    RegisterDef::reading(T_CCC, 0x0A),
    RegisterDef::reading(P_CIG, 0x0B),
    RegisterDef::reading(T_CIG, 0x0C),
    RegisterDef::packed(VALVES, 0x0D, Access::ReadWrite, &PRB_VALVES_R2),
    RegisterDef::flag(ABORT, 0x0E, Access::WriteOnly),
    RegisterDef::flag(IGNITION_OK, 0x0F, Access::ReadOnly),
];

const TRB_R2: [RegisterDef; 6] = [
    RegisterDef::command(TIMESTAMP_MAIN, 0x00),
    RegisterDef::flag(WAKE_UP, 0x01, Access::WriteOnly),
    RegisterDef::flag(IS_WOKEN_UP, 0x02, Access::ReadOnly),
    RegisterDef::flag(CLEAR_TO_IGNITE, 0x03, Access::WriteOnly),
    RegisterDef::packed(PYROS, 0x04, Access::ReadWrite, &TRB_PYROS_R2),
    RegisterDef::flag(IS_TRIGGERED, 0x05, Access::ReadOnly),
];

const CAM_R2: [RegisterDef; 5] = [
    RegisterDef::command(TIMESTAMP_MAIN, 0x00),
    RegisterDef::flag(WAKE_UP, 0x01, Access::WriteOnly),
    RegisterDef::flag(IS_WOKEN_UP, 0x02, Access::ReadOnly),
    RegisterDef::flag(RECORDING, 0x03, Access::WriteOnly),
    RegisterDef::flag(IS_RECORDING, 0x04, Access::ReadOnly),
];

/// Latest register map
pub const REV_2: MapRevision = MapRevision::unchecked(
    RevisionId(2),
    Sentinels::LATEST,
    [
        RegisterMap::new(DeviceClass::PressurizationController, &DPR_R2, 10),
        RegisterMap::new(DeviceClass::PropulsionBoard, &PRB_R2, 16),
        RegisterMap::new(DeviceClass::TriggerBoard, &TRB_R2, 6),
        RegisterMap::new(DeviceClass::CameraModule, &CAM_R2, 5),
    ],
);

/// Every revision compiled into this build
pub static CATALOG: [MapRevision; 2] = [REV_1, REV_2];

/// Revision new sessions should select
pub const LATEST: RevisionId = RevisionId(2);
