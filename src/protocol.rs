/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Register word codec
//!
//! Every register transaction moves exactly one [`Word`] of [`WORD_LEN`]
//! bytes. What the word means depends on the register's [`ValueShape`]:
//! a plain scalar, a packed bitmap of independent actuator channels, or a
//! boolean sentinel with two fixed, non-adjacent patterns.

use thiserror::Error;

/// Bytes moved by every register transaction, for every device class
pub const WORD_LEN: usize = 4;

/// One register transfer word
pub type Word = u32;

/// Largest number of channels one packed register can carry
pub const MAX_FIELDS: usize = 8;

/// Widest channel a packed field may describe, in bits
pub const MAX_FIELD_WIDTH: u8 = 8;

/// Bits in one transfer word
pub const WORD_BITS: u8 = (WORD_LEN * 8) as u8;

/// Serialize a word for the wire (subsystem MCUs store native little-endian `uint32_t`)
pub fn word_to_bytes(word: Word) -> [u8; WORD_LEN] {
    word.to_le_bytes()
}

/// Deserialize a word received from the wire
pub fn word_from_bytes(bytes: [u8; WORD_LEN]) -> Word {
    Word::from_le_bytes(bytes)
}

/// Codec failures. None of these involve the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// A channel value does not fit its field
    #[error("value {value:#x} out of range for field {field}")]
    OutOfRange {
        /// Channel name
        field: &'static str,
        /// Rejected value
        value: u32,
    },
    /// Number of channel values does not match the register layout
    #[error("expected {expected} channel values, found {found}")]
    FieldCountMismatch {
        /// Channels the register defines
        expected: usize,
        /// Channels supplied
        found: usize,
    },
    /// A field descriptor is empty or sticks out of the word
    #[error("field {field} does not fit a register word")]
    FieldOutsideWord { field: &'static str },
    /// Word matches neither boolean pattern
    #[error("word {0:#010x} is not a boolean sentinel")]
    InvalidSentinel(Word),
    /// Packed word has bits set outside every defined field
    #[error("word {0:#010x} has reserved bits set")]
    ReservedBits(Word),
}

/// One independently addressable channel inside a packed register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldDescriptor {
    /// Channel name, e.g. `PYRO1`
    pub name: &'static str,
    /// Bit position of the channel's least significant bit
    pub shift: u8,
    /// Channel width in bits
    pub width: u8,
}

impl FieldDescriptor {
    /// An 8-bit channel at `shift`
    pub const fn byte(name: &'static str, shift: u8) -> Self {
        Self {
            name,
            shift,
            width: 8,
        }
    }

    /// A single-bit flag at `bit`
    pub const fn flag(name: &'static str, bit: u8) -> Self {
        Self {
            name,
            shift: bit,
            width: 1,
        }
    }

    /// Unshifted mask covering `width` bits
    pub const fn value_mask(&self) -> Word {
        if self.width >= WORD_BITS {
            Word::MAX
        } else {
            ((1 as Word) << self.width as u32) - 1
        }
    }

    /// Mask of the bits this field occupies within the word
    pub const fn word_mask(&self) -> Word {
        self.value_mask() << self.shift as u32
    }

    /// Whether the field lies entirely within one word
    pub const fn fits_word(&self) -> bool {
        self.width > 0 && (self.shift as u16 + self.width as u16) <= WORD_BITS as u16
    }
}

/// The two legal values of a boolean register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sentinels {
    /// Activate
    pub engage: Word,
    /// Deactivate
    pub disengage: Word,
}

impl Sentinels {
    /// Patterns used by the latest register map
    pub const LATEST: Sentinels = Sentinels {
        engage: 0x64,
        disengage: 0x0D,
    };

    /// Patterns are distinct, never 0/1, and at least two bit flips apart
    pub const fn is_well_formed(&self) -> bool {
        self.engage > 1
            && self.disengage > 1
            && (self.engage ^ self.disengage).count_ones() >= 2
    }

    /// Word for `flag`
    pub const fn encode(&self, flag: bool) -> Word {
        if flag {
            self.engage
        } else {
            self.disengage
        }
    }

    /// Decode a word, rejecting anything that is not exactly one of the patterns
    pub fn decode(&self, word: Word) -> Result<bool, CodecError> {
        if word == self.engage {
            Ok(true)
        } else if word == self.disengage {
            Ok(false)
        } else {
            Err(CodecError::InvalidSentinel(word))
        }
    }
}

/// Semantic encoding of a register's word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueShape {
    /// The word is the value
    Scalar,
    /// Independent channels packed at fixed shifts, unused bits zero
    PackedBitmap(&'static [FieldDescriptor]),
    /// Exactly one of the revision's two sentinel patterns
    BooleanSentinel,
}

/// Channel values of a packed register, in the register's field order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channels {
    values: [u32; MAX_FIELDS],
    len: usize,
}

impl Channels {
    /// Collect channel values, `None` if there are more than [`MAX_FIELDS`]
    pub fn from_slice(values: &[u32]) -> Option<Self> {
        if values.len() > MAX_FIELDS {
            return None;
        }
        let mut buf = [0; MAX_FIELDS];
        buf[..values.len()].copy_from_slice(values);
        Some(Self {
            values: buf,
            len: values.len(),
        })
    }

    /// Values in field order
    pub fn as_slice(&self) -> &[u32] {
        &self.values[..self.len]
    }

    /// Value of the channel at `index` in field order
    pub fn get(&self, index: usize) -> Option<u32> {
        self.as_slice().get(index).copied()
    }

    /// Value of the channel called `name` in `fields`
    pub fn named(&self, fields: &[FieldDescriptor], name: &str) -> Option<u32> {
        fields
            .iter()
            .position(|field| field.name == name)
            .and_then(|index| self.get(index))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A decoded register value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value {
    Scalar(Word),
    Channels(Channels),
    Flag(bool),
}

/// Pack channel values into one word.
/// `values` follow the order of `fields`; bits outside every field stay zero.
pub fn encode_packed(fields: &[FieldDescriptor], values: &[u32]) -> Result<Word, CodecError> {
    if fields.len() != values.len() {
        return Err(CodecError::FieldCountMismatch {
            expected: fields.len(),
            found: values.len(),
        });
    }
    let mut word: Word = 0;
    for (field, &value) in fields.iter().zip(values) {
        check_fits(field)?;
        if value > field.value_mask() {
            return Err(CodecError::OutOfRange {
                field: field.name,
                value,
            });
        }
        word |= value << u32::from(field.shift);
    }
    Ok(word)
}

fn check_fits(field: &FieldDescriptor) -> Result<(), CodecError> {
    if field.fits_word() {
        Ok(())
    } else {
        Err(CodecError::FieldOutsideWord { field: field.name })
    }
}

/// Extract every channel of `fields` from `word`.
/// A word with bits set outside every field is rejected, not masked.
pub fn decode_packed(fields: &[FieldDescriptor], word: Word) -> Result<Channels, CodecError> {
    if fields.len() > MAX_FIELDS {
        return Err(CodecError::FieldCountMismatch {
            expected: MAX_FIELDS,
            found: fields.len(),
        });
    }
    let mut channels = Channels {
        values: [0; MAX_FIELDS],
        len: fields.len(),
    };
    let mut used: Word = 0;
    for (slot, field) in channels.values.iter_mut().zip(fields) {
        check_fits(field)?;
        *slot = (word >> u32::from(field.shift)) & field.value_mask();
        used |= field.word_mask();
    }
    if word & !used != 0 {
        return Err(CodecError::ReservedBits(word));
    }
    Ok(channels)
}

/// Encode `value` for a register of `shape`.
/// Returns `None` when the value variant does not belong to the shape.
pub fn encode(
    shape: ValueShape,
    sentinels: &Sentinels,
    value: &Value,
) -> Option<Result<Word, CodecError>> {
    match (shape, value) {
        (ValueShape::Scalar, Value::Scalar(word)) => Some(Ok(*word)),
        (ValueShape::PackedBitmap(fields), Value::Channels(channels)) => {
            Some(encode_packed(fields, channels.as_slice()))
        }
        (ValueShape::BooleanSentinel, Value::Flag(flag)) => Some(Ok(sentinels.encode(*flag))),
        _ => None,
    }
}

/// Decode `word` read from a register of `shape`
pub fn decode(shape: ValueShape, sentinels: &Sentinels, word: Word) -> Result<Value, CodecError> {
    match shape {
        ValueShape::Scalar => Ok(Value::Scalar(word)),
        ValueShape::PackedBitmap(fields) => decode_packed(fields, word).map(Value::Channels),
        ValueShape::BooleanSentinel => sentinels.decode(word).map(Value::Flag),
    }
}
