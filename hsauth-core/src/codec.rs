//! Wire buffers for handshake messages.
//!
//! [`HandshakeBuffer`] appends big-endian integers and length-prefixed
//! vectors. Length fields whose value is only known later are reserved with
//! [`HandshakeBuffer::reserve_length`] and filled in with
//! [`HandshakeBuffer::patch_length`]. [`Reader`] is the bounds-checked
//! inverse; every short read is a [`Error::Decode`].

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Error, Result};

/// Width of a length or integer field on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthWidth {
    /// uint8
    U8,
    /// uint16
    U16,
    /// uint24
    U24,
    /// uint32
    U32,
}

impl LengthWidth {
    /// Field size in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            LengthWidth::U8 => 1,
            LengthWidth::U16 => 2,
            LengthWidth::U24 => 3,
            LengthWidth::U32 => 4,
        }
    }

    /// Largest value the field holds.
    pub const fn max_value(self) -> usize {
        match self {
            LengthWidth::U8 => 0xff,
            LengthWidth::U16 => 0xffff,
            LengthWidth::U24 => 0xff_ffff,
            LengthWidth::U32 => 0xffff_ffff,
        }
    }
}

/// A reserved, not yet written, length field.
///
/// Only obtainable from [`HandshakeBuffer::reserve_length`]; consumed by
/// [`HandshakeBuffer::patch_length`] or [`HandshakeBuffer::close_length`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a reserved length must be patched"]
pub struct LengthSlot {
    offset: usize,
    width: LengthWidth,
}

impl LengthSlot {
    /// Absolute offset of the field.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Offset of the first byte after the field.
    pub fn body_start(&self) -> usize {
        self.offset + self.width.bytes()
    }
}

/// Append-only handshake message builder with retroactive length patching.
#[derive(Debug, Clone, Default)]
pub struct HandshakeBuffer {
    buf: BytesMut,
}

impl HandshakeBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// View of the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }

    /// Drop everything written after `len`.
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    /// Append one byte.
    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    /// Append a big-endian uint16.
    pub fn put_u16(&mut self, value: u16) {
        self.buf.put_u16(value);
    }

    /// Append a big-endian uint24. The high byte of `value` must be zero.
    pub fn put_u24(&mut self, value: u32) -> Result<()> {
        if value > 0xff_ffff {
            return Err(Error::Internal(format!("{} does not fit a uint24", value)));
        }
        self.buf.put_uint(u64::from(value), 3);
        Ok(())
    }

    /// Append a big-endian uint32.
    pub fn put_u32(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    /// Append a big-endian uint64.
    pub fn put_u64(&mut self, value: u64) {
        self.buf.put_u64(value);
    }

    /// Append raw bytes.
    pub fn put_slice(&mut self, data: &[u8]) {
        self.buf.put_slice(data);
    }

    /// Append `data` behind a length prefix of the given width.
    pub fn put_prefixed(&mut self, width: LengthWidth, data: &[u8]) -> Result<()> {
        if data.len() > width.max_value() {
            return Err(Error::Internal(format!(
                "{} bytes do not fit a {}-byte length prefix",
                data.len(),
                width.bytes()
            )));
        }
        self.put_length(width, data.len());
        self.buf.put_slice(data);
        Ok(())
    }

    /// Append `data` behind a uint8 length.
    pub fn put_prefixed8(&mut self, data: &[u8]) -> Result<()> {
        self.put_prefixed(LengthWidth::U8, data)
    }

    /// Append `data` behind a uint16 length.
    pub fn put_prefixed16(&mut self, data: &[u8]) -> Result<()> {
        self.put_prefixed(LengthWidth::U16, data)
    }

    /// Append `data` behind a uint24 length.
    pub fn put_prefixed24(&mut self, data: &[u8]) -> Result<()> {
        self.put_prefixed(LengthWidth::U24, data)
    }

    /// Append `data` behind a uint32 length.
    pub fn put_prefixed32(&mut self, data: &[u8]) -> Result<()> {
        self.put_prefixed(LengthWidth::U32, data)
    }

    /// Reserve a zeroed length field and remember where it is.
    pub fn reserve_length(&mut self, width: LengthWidth) -> LengthSlot {
        let offset = self.buf.len();
        self.buf.put_bytes(0, width.bytes());
        LengthSlot { offset, width }
    }

    /// Overwrite a reserved field with `value`.
    pub fn patch_length(&mut self, slot: LengthSlot, value: usize) -> Result<()> {
        self.patch_at(slot.offset, slot.width, value)
    }

    /// Overwrite a reserved field with the number of bytes written after it.
    pub fn close_length(&mut self, slot: LengthSlot) -> Result<usize> {
        let value = self.buf.len() - slot.body_start();
        self.patch_length(slot, value)?;
        Ok(value)
    }

    /// Overwrite a uint16 at an offset recorded by another component.
    pub fn patch_u16_at(&mut self, offset: usize, value: usize) -> Result<()> {
        self.patch_at(offset, LengthWidth::U16, value)
    }

    /// Overwrite a uint24 at an offset recorded by another component.
    pub fn patch_u24_at(&mut self, offset: usize, value: usize) -> Result<()> {
        self.patch_at(offset, LengthWidth::U24, value)
    }

    fn put_length(&mut self, width: LengthWidth, value: usize) {
        self.buf.put_uint(value as u64, width.bytes());
    }

    fn patch_at(&mut self, offset: usize, width: LengthWidth, value: usize) -> Result<()> {
        patch_field(&mut self.buf, offset, width, value)
    }
}

/// Write `value` big-endian into `buf[offset..offset + width]`.
///
/// Shared by the builder and by code that patches a scratch copy of a
/// message.
pub fn patch_field(buf: &mut [u8], offset: usize, width: LengthWidth, value: usize) -> Result<()> {
    let n = width.bytes();
    if value > width.max_value() {
        return Err(Error::Internal(format!(
            "{} does not fit a {}-byte field",
            value, n
        )));
    }
    let end = offset
        .checked_add(n)
        .filter(|end| *end <= buf.len())
        .ok_or_else(|| {
            Error::Internal(format!(
                "field at {} overruns a {}-byte buffer",
                offset,
                buf.len()
            ))
        })?;
    let be = (value as u64).to_be_bytes();
    buf[offset..end].copy_from_slice(&be[8 - n..]);
    Ok(())
}

/// Bounds-checked cursor over received bytes.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    consumed: usize,
}

impl<'a> Reader<'a> {
    /// Start reading `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, consumed: 0 }
    }

    /// Bytes left.
    pub fn remaining(&self) -> usize {
        self.data.remaining()
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.consumed
    }

    /// Whether everything has been read.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn need(&self, n: usize, what: &str) -> Result<()> {
        if self.data.remaining() < n {
            return Err(Error::Decode(format!(
                "{}: need {} bytes, {} left",
                what,
                n,
                self.data.remaining()
            )));
        }
        Ok(())
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.need(1, "uint8")?;
        self.consumed += 1;
        Ok(self.data.get_u8())
    }

    /// Read a big-endian uint16.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.need(2, "uint16")?;
        self.consumed += 2;
        Ok(self.data.get_u16())
    }

    /// Read a big-endian uint24.
    pub fn read_u24(&mut self) -> Result<u32> {
        self.need(3, "uint24")?;
        self.consumed += 3;
        Ok(self.data.get_uint(3) as u32)
    }

    /// Read a big-endian uint32.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.need(4, "uint32")?;
        self.consumed += 4;
        Ok(self.data.get_u32())
    }

    /// Read a big-endian uint64.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.need(8, "uint64")?;
        self.consumed += 8;
        Ok(self.data.get_u64())
    }

    /// Borrow the next `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.need(n, "opaque")?;
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        self.consumed += n;
        Ok(head)
    }

    /// Borrow a vector behind a uint8 length.
    pub fn read_prefixed8(&mut self) -> Result<&'a [u8]> {
        let n = self.read_u8()? as usize;
        self.read_bytes(n)
    }

    /// Borrow a vector behind a uint16 length.
    pub fn read_prefixed16(&mut self) -> Result<&'a [u8]> {
        let n = self.read_u16()? as usize;
        self.read_bytes(n)
    }

    /// Borrow a vector behind a uint32 length.
    pub fn read_prefixed32(&mut self) -> Result<&'a [u8]> {
        let n = self.read_u32()? as usize;
        self.read_bytes(n)
    }

    /// Fail unless every byte has been consumed.
    pub fn finish(&self, what: &str) -> Result<()> {
        if !self.data.is_empty() {
            return Err(Error::Decode(format!(
                "{}: {} trailing bytes",
                what,
                self.data.len()
            )));
        }
        Ok(())
    }
}

/// Copy `data` into a fresh vector, reporting allocation failure.
pub fn try_copy(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.try_reserve_exact(data.len()).map_err(|_| Error::Memory)?;
    out.extend_from_slice(data);
    Ok(out)
}
