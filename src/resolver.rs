/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Map version resolver
//!
//! Selects, per device class, which compiled-in [`MapRevision`] the session
//! talks. The selection is made once from a [`SessionConfig`]; the only way to
//! change it afterwards is an explicit [`MapResolver::reconfigure`], which is
//! logged. There is no fallback to another revision.

use crate::directory::DeviceClass;
use crate::registers::{Compatibility, RegisterDef, RegisterMap};
use crate::revisions::{validate_catalog, MapError, MapRevision, RevisionId, CATALOG, LATEST};

/// Active revision per device class, decided at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionConfig {
    revisions: [RevisionId; 4],
}

impl SessionConfig {
    /// Every class on the same revision
    pub const fn uniform(id: RevisionId) -> Self {
        Self { revisions: [id; 4] }
    }

    /// Override the revision of one class
    pub fn with_class(mut self, class: DeviceClass, id: RevisionId) -> Self {
        self.revisions[class.index()] = id;
        self
    }

    pub fn revision(&self, class: DeviceClass) -> RevisionId {
        self.revisions[class.index()]
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::uniform(LATEST)
    }
}

/// Serves the active register map of each device class
#[derive(Debug, Clone, Copy)]
pub struct MapResolver {
    catalog: &'static [MapRevision],
    active: [&'static MapRevision; 4],
}

impl MapResolver {
    /// Validate `catalog` and bind every class to the revision `config` selects
    pub fn new(catalog: &'static [MapRevision], config: SessionConfig) -> Result<Self, MapError> {
        validate_catalog(catalog)?;
        let select = |class: DeviceClass| find(catalog, config.revision(class));
        let active = [
            select(DeviceClass::PressurizationController)?,
            select(DeviceClass::PropulsionBoard)?,
            select(DeviceClass::TriggerBoard)?,
            select(DeviceClass::CameraModule)?,
        ];
        info!(
            "register maps: DPR {} PRB {} TRB {} CAM {}",
            active[0].id(),
            active[1].id(),
            active[2].id(),
            active[3].id()
        );
        Ok(Self { catalog, active })
    }

    /// Resolver over the revisions compiled into this build
    pub fn shipped(config: SessionConfig) -> Result<Self, MapError> {
        Self::new(&CATALOG, config)
    }

    /// Revision currently serving `class`
    pub fn active_revision(&self, class: DeviceClass) -> &'static MapRevision {
        self.active[class.index()]
    }

    /// Register map currently serving `class`
    pub fn active_map(&self, class: DeviceClass) -> &'static RegisterMap {
        self.active_revision(class).map(class)
    }

    /// Look up `name` in the active map of `class`
    pub fn lookup(&self, class: DeviceClass, name: &str) -> Option<&'static RegisterDef> {
        self.active_map(class).lookup(name)
    }

    pub fn register_count(&self, class: DeviceClass) -> u8 {
        self.active_map(class).register_count()
    }

    /// Compiled-in revision with `id`
    pub fn revision(&self, id: RevisionId) -> Result<&'static MapRevision, MapError> {
        find(self.catalog, id)
    }

    /// Switch `class` to revision `id`.
    /// Reports how the new map relates to the one it replaces.
    pub fn reconfigure(
        &mut self,
        class: DeviceClass,
        id: RevisionId,
    ) -> Result<Compatibility, MapError> {
        let next = find(self.catalog, id)?;
        let previous = self.active[class.index()];
        let compatibility = previous.compatibility(class, next);
        match compatibility {
            Compatibility::Breaking { register } => warn!(
                "{} reconfigured {} -> {}: {} changed or removed",
                class,
                previous.id(),
                next.id(),
                register
            ),
            _ => info!("{} reconfigured {} -> {}", class, previous.id(), next.id()),
        }
        self.active[class.index()] = next;
        Ok(compatibility)
    }
}

fn find(catalog: &'static [MapRevision], id: RevisionId) -> Result<&'static MapRevision, MapError> {
    catalog
        .iter()
        .find(|revision| revision.id() == id)
        .ok_or(MapError::UnsupportedRevision(id))
}
