/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

use super::Transport;
use crate::protocol::WORD_LEN;
use embedded_hal as hal;

/// This encapsulates the I2C bus master peripheral.
///
/// A read is one combined write-read: the register address byte, a repeated
/// start, then the four word bytes. A write is one frame of the register
/// address byte followed by the four word bytes.
pub struct I2cTransport<I2C> {
    /// the i2c port to use when communicating
    i2c: I2C,
}

impl<I2C> I2cTransport<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Consume the transport and return the I2C peripheral
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, CommE> Transport for I2cTransport<I2C>
where
    I2C: hal::blocking::i2c::WriteRead<Error = CommE>
        + hal::blocking::i2c::Write<Error = CommE>,
{
    type Error = CommE;

    fn read_word(&mut self, bus_address: u8, register: u8) -> Result<[u8; WORD_LEN], CommE> {
        let mut word = [0u8; WORD_LEN];
        self.i2c.write_read(bus_address, &[register], &mut word)?;
        Ok(word)
    }

    fn write_word(
        &mut self,
        bus_address: u8,
        register: u8,
        word: [u8; WORD_LEN],
    ) -> Result<(), CommE> {
        let mut frame = [0u8; 1 + WORD_LEN];
        frame[0] = register;
        frame[1..].copy_from_slice(&word);
        self.i2c.write(bus_address, &frame)
    }
}
