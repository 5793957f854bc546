/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Register access gateway
//!
//! The single entry point for register traffic. Every check that can be made
//! without the bus (instance, register, direction, shape, encoding) is made
//! before the transport is touched, so a rejected request never produces a
//! partial transaction.

use crate::directory::{AddressDirectory, DeviceClass, DeviceInstance};
use crate::interface::Transport;
use crate::protocol::{self, Channels, Sentinels, Value, ValueShape, Word};
use crate::registers::{Compatibility, RegisterDef};
use crate::resolver::MapResolver;
use crate::revisions::RevisionId;
use crate::Error;

/// Resolved (address, definition) pairs kept between calls
const CACHE_SLOTS: usize = 16;

#[derive(Debug, Clone, Copy)]
struct Resolved {
    bus_address: u8,
    register: &'static RegisterDef,
    sentinels: &'static Sentinels,
}

impl Resolved {
    fn shape_mismatch<E>(&self) -> Error<E> {
        Error::ShapeMismatch {
            register: self.register.name,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    instance: DeviceInstance,
    resolved: Resolved,
}

/// Round-robin cache keyed by (instance, register name)
#[derive(Debug)]
struct ResolveCache {
    slots: [Option<CacheEntry>; CACHE_SLOTS],
    next: usize,
}

impl ResolveCache {
    const fn new() -> Self {
        Self {
            slots: [None; CACHE_SLOTS],
            next: 0,
        }
    }

    fn get(&self, instance: DeviceInstance, name: &str) -> Option<Resolved> {
        self.slots
            .iter()
            .flatten()
            .find(|entry| entry.instance == instance && entry.resolved.register.name == name)
            .map(|entry| entry.resolved)
    }

    fn insert(&mut self, instance: DeviceInstance, resolved: Resolved) {
        self.slots[self.next] = Some(CacheEntry { instance, resolved });
        self.next = (self.next + 1) % CACHE_SLOTS;
    }

    fn clear(&mut self) {
        self.slots = [None; CACHE_SLOTS];
        self.next = 0;
    }
}

fn is_scalar(shape: &ValueShape) -> bool {
    matches!(shape, ValueShape::Scalar)
}

fn is_flag(shape: &ValueShape) -> bool {
    matches!(shape, ValueShape::BooleanSentinel)
}

fn is_packed(shape: &ValueShape) -> bool {
    matches!(shape, ValueShape::PackedBitmap(_))
}

/// Reads and writes named registers of provisioned boards
pub struct Gateway<'d, T> {
    /// the transport collaborator
    transport: T,
    directory: AddressDirectory<'d>,
    resolver: MapResolver,
    cache: ResolveCache,
}

impl<'d, T, E> Gateway<'d, T>
where
    T: Transport<Error = E>,
{
    pub fn new(transport: T, directory: AddressDirectory<'d>, resolver: MapResolver) -> Self {
        Self {
            transport,
            directory,
            resolver,
            cache: ResolveCache::new(),
        }
    }

    pub fn directory(&self) -> &AddressDirectory<'d> {
        &self.directory
    }

    pub fn resolver(&self) -> &MapResolver {
        &self.resolver
    }

    /// Consume the gateway and return the transport
    pub fn release(self) -> T {
        self.transport
    }

    /// Explicitly switch `class` to another compiled-in revision.
    /// Drops every cached resolution.
    pub fn reconfigure(
        &mut self,
        class: DeviceClass,
        id: RevisionId,
    ) -> Result<Compatibility, Error<E>> {
        let compatibility = self.resolver.reconfigure(class, id)?;
        self.cache.clear();
        debug!("resolve cache cleared after {} reconfiguration", class);
        Ok(compatibility)
    }

    /// Read and decode `name` of `instance`
    pub fn read(&mut self, instance: DeviceInstance, name: &str) -> Result<Value, Error<E>> {
        let resolved = self.resolve(instance, name)?;
        self.read_resolved(instance, resolved)
    }

    /// Encode and write `value` to `name` of `instance`
    pub fn write(
        &mut self,
        instance: DeviceInstance,
        name: &str,
        value: &Value,
    ) -> Result<(), Error<E>> {
        let resolved = self.resolve(instance, name)?;
        check_writable(resolved.register)?;
        let word = protocol::encode(resolved.register.shape, resolved.sentinels, value)
            .ok_or_else(|| resolved.shape_mismatch())??;
        self.store(instance, resolved, word)
    }

    pub fn read_scalar(&mut self, instance: DeviceInstance, name: &str) -> Result<Word, Error<E>> {
        let resolved = self.resolve_shaped(instance, name, is_scalar)?;
        match self.read_resolved(instance, resolved)? {
            Value::Scalar(word) => Ok(word),
            _ => Err(resolved.shape_mismatch()),
        }
    }

    pub fn read_flag(&mut self, instance: DeviceInstance, name: &str) -> Result<bool, Error<E>> {
        let resolved = self.resolve_shaped(instance, name, is_flag)?;
        match self.read_resolved(instance, resolved)? {
            Value::Flag(flag) => Ok(flag),
            _ => Err(resolved.shape_mismatch()),
        }
    }

    pub fn read_channels(
        &mut self,
        instance: DeviceInstance,
        name: &str,
    ) -> Result<Channels, Error<E>> {
        let resolved = self.resolve_shaped(instance, name, is_packed)?;
        match self.read_resolved(instance, resolved)? {
            Value::Channels(channels) => Ok(channels),
            _ => Err(resolved.shape_mismatch()),
        }
    }

    pub fn write_scalar(
        &mut self,
        instance: DeviceInstance,
        name: &str,
        word: Word,
    ) -> Result<(), Error<E>> {
        let resolved = self.resolve_shaped(instance, name, is_scalar)?;
        check_writable(resolved.register)?;
        self.store(instance, resolved, word)
    }

    /// Write the engage (`true`) or disengage (`false`) pattern
    pub fn write_flag(
        &mut self,
        instance: DeviceInstance,
        name: &str,
        flag: bool,
    ) -> Result<(), Error<E>> {
        let resolved = self.resolve_shaped(instance, name, is_flag)?;
        check_writable(resolved.register)?;
        self.store(instance, resolved, resolved.sentinels.encode(flag))
    }

    /// Write channel values, given in the register's field order
    pub fn write_channels(
        &mut self,
        instance: DeviceInstance,
        name: &str,
        values: &[u32],
    ) -> Result<(), Error<E>> {
        let resolved = self.resolve_shaped(instance, name, is_packed)?;
        check_writable(resolved.register)?;
        let fields = resolved
            .register
            .fields()
            .ok_or_else(|| resolved.shape_mismatch())?;
        let word = protocol::encode_packed(fields, values)?;
        self.store(instance, resolved, word)
    }

    /// Read every readable register of `instance` in address order,
    /// handing each outcome to `visit`. A failing register does not stop the scan.
    pub fn scan<F>(&mut self, instance: DeviceInstance, mut visit: F) -> Result<(), Error<E>>
    where
        F: FnMut(&'static RegisterDef, Result<Value, Error<E>>),
    {
        let bus_address = self
            .directory
            .resolve(instance)
            .ok_or(Error::UnknownInstance(instance))?;
        let class = instance.class();
        let revision = self.resolver.active_revision(class);
        let map = revision.map(class);
        for address in 0..map.register_count() {
            let register = match map.at(address) {
                Some(register) if register.access.readable() => register,
                _ => continue,
            };
            let resolved = Resolved {
                bus_address,
                register,
                sentinels: revision.sentinels(),
            };
            visit(register, self.read_resolved(instance, resolved));
        }
        Ok(())
    }

    fn resolve(&mut self, instance: DeviceInstance, name: &str) -> Result<Resolved, Error<E>> {
        if let Some(hit) = self.cache.get(instance, name) {
            return Ok(hit);
        }
        let bus_address = self
            .directory
            .resolve(instance)
            .ok_or(Error::UnknownInstance(instance))?;
        let class = instance.class();
        let revision = self.resolver.active_revision(class);
        let register = revision
            .lookup(class, name)
            .ok_or(Error::UnknownRegister(class))?;
        let resolved = Resolved {
            bus_address,
            register,
            sentinels: revision.sentinels(),
        };
        self.cache.insert(instance, resolved);
        Ok(resolved)
    }

    fn resolve_shaped(
        &mut self,
        instance: DeviceInstance,
        name: &str,
        accepts: fn(&ValueShape) -> bool,
    ) -> Result<Resolved, Error<E>> {
        let resolved = self.resolve(instance, name)?;
        if !accepts(&resolved.register.shape) {
            return Err(resolved.shape_mismatch());
        }
        Ok(resolved)
    }

    fn read_resolved(
        &mut self,
        instance: DeviceInstance,
        resolved: Resolved,
    ) -> Result<Value, Error<E>> {
        check_readable(resolved.register)?;
        let bytes = self
            .transport
            .read_word(resolved.bus_address, resolved.register.address)
            .map_err(|e| {
                error!("{} {}: read failed", instance, resolved.register.name);
                Error::Transport(e)
            })?;
        let word = protocol::word_from_bytes(bytes);
        protocol::decode(resolved.register.shape, resolved.sentinels, word).map_err(|e| {
            error!(
                "{} {}: undecodable word {=u32:#x}",
                instance,
                resolved.register.name,
                word
            );
            Error::from(e)
        })
    }

    fn store(
        &mut self,
        instance: DeviceInstance,
        resolved: Resolved,
        word: Word,
    ) -> Result<(), Error<E>> {
        self.transport
            .write_word(
                resolved.bus_address,
                resolved.register.address,
                protocol::word_to_bytes(word),
            )
            .map_err(|e| {
                error!("{} {}: write failed", instance, resolved.register.name);
                Error::Transport(e)
            })
    }
}

fn check_readable<E>(register: &'static RegisterDef) -> Result<(), Error<E>> {
    if register.access.readable() {
        Ok(())
    } else {
        warn!("refusing to read {} register {}", register.access, register.name);
        Err(Error::DirectionViolation {
            register: register.name,
            access: register.access,
        })
    }
}

fn check_writable<E>(register: &'static RegisterDef) -> Result<(), Error<E>> {
    if register.access.writable() {
        Ok(())
    } else {
        warn!("refusing to write {} register {}", register.access, register.name);
        Err(Error::DirectionViolation {
            register: register.name,
            access: register.access,
        })
    }
}
