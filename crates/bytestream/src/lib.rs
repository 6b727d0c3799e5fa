//! # ByteStream - endian-aware binary codec
//!
//! The binary part of every table document is a flat sequence of typed
//! values written with one byte order chosen at serialization time. The
//! byte order is recorded in the document header, so a reader must be told
//! which convention to decode with.
//!
//! ## Primitive layout
//!
//! ```text
//! bool    : u8 (0 = false, anything else = true)
//! i16/i32/i64, f32/f64 : fixed width, configured byte order
//! string  : [len: i32][len bytes of UTF-8]
//! array   : [count: i32][count encoded elements]
//! ```
//!
//! ## Example
//!
//! ```rust
//! use bytestream::{ByteOrder, EndianReader, EndianWriter};
//!
//! let mut w = EndianWriter::new(ByteOrder::BigEndian);
//! w.write_i32(7);
//! w.write_string("DV01");
//! let bytes = w.into_bytes();
//!
//! let mut r = EndianReader::new(&bytes, ByteOrder::BigEndian);
//! assert_eq!(r.read_i32().unwrap(), 7);
//! assert_eq!(r.read_string().unwrap(), "DV01");
//! ```

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Header token for big-endian streams.
pub const BIG_ENDIAN_TOKEN: &str = "Big_Endian";
/// Header token for little-endian streams.
pub const LITTLE_ENDIAN_TOKEN: &str = "Little_Endian";

/// Errors raised while decoding a binary stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Fewer bytes remain than the value being read requires.
    #[error("truncated stream: needed {needed} bytes at offset {offset}, only {remaining} remain")]
    Truncated {
        needed: usize,
        remaining: usize,
        offset: usize,
    },

    /// A byte-order token that is neither `Big_Endian` nor `Little_Endian`.
    #[error("unknown byte order '{0}'")]
    UnknownByteOrder(String),

    /// A string payload that is not valid UTF-8.
    #[error("invalid UTF-8 string at offset {offset}")]
    InvalidString { offset: usize },

    /// A length or element count prefix below zero.
    #[error("negative length {len} at offset {offset}")]
    NegativeLength { len: i32, offset: usize },

    /// A well-formed value outside the domain of the type being decoded.
    #[error("invalid value at offset {offset}: {message}")]
    InvalidValue { offset: usize, message: String },
}

/// Byte order of a binary stream.
///
/// `Machine` stands for the host's native order and is resolved to one of
/// the two concrete variants when a stream is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
    #[default]
    Machine,
}

impl ByteOrder {
    /// Resolves `Machine` to the host's native order.
    #[must_use]
    pub fn resolve(self) -> ByteOrder {
        match self {
            ByteOrder::Machine if cfg!(target_endian = "big") => ByteOrder::BigEndian,
            ByteOrder::Machine => ByteOrder::LittleEndian,
            concrete => concrete,
        }
    }

    /// The token embedded in document headers.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self.resolve() {
            ByteOrder::BigEndian => BIG_ENDIAN_TOKEN,
            _ => LITTLE_ENDIAN_TOKEN,
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ByteOrder {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            BIG_ENDIAN_TOKEN => Ok(ByteOrder::BigEndian),
            LITTLE_ENDIAN_TOKEN => Ok(ByteOrder::LittleEndian),
            other => Err(StreamError::UnknownByteOrder(other.to_string())),
        }
    }
}

/// A value with a fixed binary representation.
///
/// Implemented here for the primitives and for `Vec<T>`; domain crates
/// implement it for their own scalar types.
pub trait BinaryCodec: Sized {
    fn encode(&self, w: &mut EndianWriter);
    fn decode(r: &mut EndianReader<'_>) -> Result<Self, StreamError>;
}

macro_rules! put {
    ($self:ident, $width:expr, $method:ident, $v:expr) => {{
        let mut bytes = [0u8; $width];
        match $self.order {
            ByteOrder::BigEndian => BigEndian::$method(&mut bytes, $v),
            _ => LittleEndian::$method(&mut bytes, $v),
        }
        $self.buf.extend_from_slice(&bytes);
    }};
}

macro_rules! get {
    ($self:ident, $width:expr, $method:ident) => {{
        let bytes = $self.take($width)?;
        Ok(match $self.order {
            ByteOrder::BigEndian => BigEndian::$method(bytes),
            _ => LittleEndian::$method(bytes),
        })
    }};
}

/// Accumulates typed values into a byte buffer.
///
/// Writes into memory never fail, so the write methods return nothing.
#[derive(Debug, Clone)]
pub struct EndianWriter {
    order: ByteOrder,
    buf: Vec<u8>,
}

impl EndianWriter {
    /// Creates an empty writer. `Machine` is resolved here, once.
    pub fn new(order: ByteOrder) -> Self {
        Self::with_capacity(order, 256)
    }

    pub fn with_capacity(order: ByteOrder, capacity: usize) -> Self {
        Self {
            order: order.resolve(),
            buf: Vec::with_capacity(capacity),
        }
    }

    /// The resolved byte order (never `Machine`).
    #[must_use]
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Appends bytes verbatim, with no length prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    pub fn write_i16(&mut self, v: i16) {
        put!(self, 2, write_i16, v)
    }

    pub fn write_i32(&mut self, v: i32) {
        put!(self, 4, write_i32, v)
    }

    pub fn write_i64(&mut self, v: i64) {
        put!(self, 8, write_i64, v)
    }

    pub fn write_f32(&mut self, v: f32) {
        put!(self, 4, write_f32, v)
    }

    pub fn write_f64(&mut self, v: f64) {
        put!(self, 8, write_f64, v)
    }

    /// Writes `[len: i32][bytes]`.
    ///
    /// Strings longer than `i32::MAX` bytes cannot be represented; such a
    /// length would already have exhausted the document size limits.
    pub fn write_string(&mut self, s: &str) {
        self.write_i32(s.len() as i32);
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Writes `[count: i32]` followed by every element.
    pub fn write_array<T: BinaryCodec>(&mut self, items: &[T]) {
        self.write_i32(items.len() as i32);
        for item in items {
            item.encode(self);
        }
    }

    pub fn write<T: BinaryCodec>(&mut self, v: &T) {
        v.encode(self);
    }
}

/// Forward-only cursor over an existing byte buffer.
#[derive(Debug, Clone)]
pub struct EndianReader<'a> {
    buf: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> EndianReader<'a> {
    /// Positions a reader at offset 0. `Machine` is resolved here, once.
    pub fn new(buf: &'a [u8], order: ByteOrder) -> Self {
        Self {
            buf,
            pos: 0,
            order: order.resolve(),
        }
    }

    #[must_use]
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Current read offset from the start of the buffer.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Consumes exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], StreamError> {
        if self.remaining() < n {
            return Err(StreamError::Truncated {
                needed: n,
                remaining: self.remaining(),
                offset: self.pos,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, StreamError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool, StreamError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i16(&mut self) -> Result<i16, StreamError> {
        get!(self, 2, read_i16)
    }

    pub fn read_i32(&mut self) -> Result<i32, StreamError> {
        get!(self, 4, read_i32)
    }

    pub fn read_i64(&mut self) -> Result<i64, StreamError> {
        get!(self, 8, read_i64)
    }

    pub fn read_f32(&mut self) -> Result<f32, StreamError> {
        get!(self, 4, read_f32)
    }

    pub fn read_f64(&mut self) -> Result<f64, StreamError> {
        get!(self, 8, read_f64)
    }

    /// Reads a length prefix, rejecting negative values.
    fn read_len(&mut self) -> Result<usize, StreamError> {
        let offset = self.pos;
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| StreamError::NegativeLength { len, offset })
    }

    pub fn read_string(&mut self) -> Result<String, StreamError> {
        let len = self.read_len()?;
        let offset = self.pos;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| StreamError::InvalidString { offset })
    }

    pub fn read_array<T: BinaryCodec>(&mut self) -> Result<Vec<T>, StreamError> {
        let count = self.read_len()?;
        // A corrupt count must not turn into a huge allocation.
        let mut items = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            items.push(T::decode(self)?);
        }
        Ok(items)
    }

    pub fn read<T: BinaryCodec>(&mut self) -> Result<T, StreamError> {
        T::decode(self)
    }
}

macro_rules! primitive_codec {
    ($($ty:ty => $write:ident, $read:ident;)*) => {
        $(
            impl BinaryCodec for $ty {
                fn encode(&self, w: &mut EndianWriter) {
                    w.$write(*self);
                }

                fn decode(r: &mut EndianReader<'_>) -> Result<Self, StreamError> {
                    r.$read()
                }
            }
        )*
    };
}

primitive_codec! {
    bool => write_bool, read_bool;
    u8 => write_u8, read_u8;
    i16 => write_i16, read_i16;
    i32 => write_i32, read_i32;
    i64 => write_i64, read_i64;
    f32 => write_f32, read_f32;
    f64 => write_f64, read_f64;
}

impl BinaryCodec for String {
    fn encode(&self, w: &mut EndianWriter) {
        w.write_string(self);
    }

    fn decode(r: &mut EndianReader<'_>) -> Result<Self, StreamError> {
        r.read_string()
    }
}

impl<T: BinaryCodec> BinaryCodec for Vec<T> {
    fn encode(&self, w: &mut EndianWriter) {
        w.write_array(self);
    }

    fn decode(r: &mut EndianReader<'_>) -> Result<Self, StreamError> {
        r.read_array()
    }
}

#[cfg(test)]
mod tests;
