/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

pub mod i2c;
pub use i2c::I2cTransport;

use core::cell::RefCell;

use thiserror::Error;

use crate::protocol::WORD_LEN;

/// A method of moving one register word to or from a board.
///
/// Each call is one complete, atomic transaction on the bus. Implementations
/// own timeouts and any retry policy; a failed transaction is reported as
/// `Self::Error` and nothing above this trait retries it.
pub trait Transport {
    /// Interface associated error type
    type Error;

    /// Read the word at `register` of the board at `bus_address`
    fn read_word(&mut self, bus_address: u8, register: u8) -> Result<[u8; WORD_LEN], Self::Error>;

    /// Write `word` to `register` of the board at `bus_address`
    fn write_word(
        &mut self,
        bus_address: u8,
        register: u8,
        word: [u8; WORD_LEN],
    ) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn read_word(&mut self, bus_address: u8, register: u8) -> Result<[u8; WORD_LEN], Self::Error> {
        (**self).read_word(bus_address, register)
    }

    fn write_word(
        &mut self,
        bus_address: u8,
        register: u8,
        word: [u8; WORD_LEN],
    ) -> Result<(), Self::Error> {
        (**self).write_word(bus_address, register, word)
    }
}

/// Errors from a [`SharedBus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SharedBusError<E> {
    /// Another transaction is in flight on this bus
    #[error("bus busy")]
    Busy,
    /// The underlying transport failed
    #[error("bus error: {0:?}")]
    Bus(E),
}

/// One transport shared by several users of a single-threaded control loop.
///
/// The bus is held for exactly one word transfer and released when the
/// transfer returns, whether it succeeded or not.
pub struct SharedBus<'a, T> {
    bus: &'a RefCell<T>,
}

impl<'a, T> SharedBus<'a, T> {
    pub fn new(bus: &'a RefCell<T>) -> Self {
        Self { bus }
    }
}

impl<'a, T> Clone for SharedBus<'a, T> {
    fn clone(&self) -> Self {
        Self { bus: self.bus }
    }
}

impl<'a, T: Transport> Transport for SharedBus<'a, T> {
    type Error = SharedBusError<T::Error>;

    fn read_word(&mut self, bus_address: u8, register: u8) -> Result<[u8; WORD_LEN], Self::Error> {
        let mut bus = self.bus.try_borrow_mut().map_err(|_| SharedBusError::Busy)?;
        bus.read_word(bus_address, register)
            .map_err(SharedBusError::Bus)
    }

    fn write_word(
        &mut self,
        bus_address: u8,
        register: u8,
        word: [u8; WORD_LEN],
    ) -> Result<(), Self::Error> {
        let mut bus = self.bus.try_borrow_mut().map_err(|_| SharedBusError::Busy)?;
        bus.write_word(bus_address, register, word)
            .map_err(SharedBusError::Bus)
    }
}
