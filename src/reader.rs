//! Sequential, bounds-checked decoding of a received frame.
//!
//! The caller issues reads in the order the message layout dictates. Every consuming read
//! advances the position by the width it decoded; `peek_*` reads decode at the current
//! position without advancing, for lookahead such as inspecting a type tag.
//!
//! A read that would run past the end of the region fails with
//! [`CodecError::Bounds`] and returns no data.

use crate::codec::{self, CodecError, Result};
use crate::dump;
use crate::fixed::FixedInt24;
use crate::flags::HalfByte;

/// Read cursor over a borrowed byte region.
///
/// The region is never copied; slices returned by [`Reader::read_array`] and friends borrow
/// from it for `'a`. [`Reader::position`] is the number of bytes consumed so far and is
/// always `<= source().len()`.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The whole region, independent of position.
    pub fn source(&self) -> &'a [u8] {
        self.data
    }

    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Consumes `n` bytes.
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let bytes = codec::field(self.data, self.pos, n)?;
        self.pos += n;
        Ok(bytes)
    }

    /// Advances past `width` bytes after a successful peek-style decode.
    fn advanced<T>(&mut self, value: T, width: usize) -> T {
        self.pos += width;
        value
    }

    // --- Markers ---

    /// Frame head marker (2 bytes).
    pub fn read_start(&mut self) -> Result<u16> {
        self.read_u16()
    }

    /// Frame tail marker (2 bytes).
    pub fn read_end(&mut self) -> Result<u16> {
        self.read_u16()
    }

    // --- Integers ---

    pub fn read_u8(&mut self) -> Result<u8> {
        let v = codec::u8_at(self.data, self.pos)?;
        Ok(self.advanced(v, 1))
    }

    /// Same as [`Reader::read_u8`].
    pub fn read_byte(&mut self) -> Result<u8> {
        self.read_u8()
    }

    /// One byte as a character (Latin-1).
    pub fn read_char(&mut self) -> Result<char> {
        Ok(self.read_u8()? as char)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        let v = codec::i8_at(self.data, self.pos)?;
        Ok(self.advanced(v, 1))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let v = codec::u16_at(self.data, self.pos)?;
        Ok(self.advanced(v, 2))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let v = codec::i16_at(self.data, self.pos)?;
        Ok(self.advanced(v, 2))
    }

    /// 3-byte big-endian integer.
    pub fn read_u24(&mut self) -> Result<u32> {
        let v = codec::u24_at(self.data, self.pos)?;
        Ok(self.advanced(v, 3))
    }

    pub fn read_fixed_u24(&mut self) -> Result<FixedInt24> {
        FixedInt24::from_slice(self.take(FixedInt24::WIDTH)?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let v = codec::u32_at(self.data, self.pos)?;
        Ok(self.advanced(v, 4))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let v = codec::i32_at(self.data, self.pos)?;
        Ok(self.advanced(v, 4))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let v = codec::u64_at(self.data, self.pos)?;
        Ok(self.advanced(v, 8))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let v = codec::i64_at(self.data, self.pos)?;
        Ok(self.advanced(v, 8))
    }

    /// One byte split into (high, low) flag nibbles.
    pub fn read_nibbles(&mut self) -> Result<(HalfByte, HalfByte)> {
        Ok(HalfByte::split(self.read_u8()?))
    }

    // --- Peeks (position unchanged) ---

    pub fn peek_u8(&self) -> Result<u8> {
        codec::u8_at(self.data, self.pos)
    }

    pub fn peek_u16(&self) -> Result<u16> {
        codec::u16_at(self.data, self.pos)
    }

    pub fn peek_i16(&self) -> Result<i16> {
        codec::i16_at(self.data, self.pos)
    }

    pub fn peek_u24_raw(&self) -> Result<u32> {
        codec::u24_at(self.data, self.pos)
    }

    pub fn peek_u24(&self) -> Result<FixedInt24> {
        FixedInt24::from_slice(codec::field(self.data, self.pos, FixedInt24::WIDTH)?)
    }

    pub fn peek_u32(&self) -> Result<u32> {
        codec::u32_at(self.data, self.pos)
    }

    pub fn peek_i32(&self) -> Result<i32> {
        codec::i32_at(self.data, self.pos)
    }

    pub fn peek_u64(&self) -> Result<u64> {
        codec::u64_at(self.data, self.pos)
    }

    pub fn peek_i64(&self) -> Result<i64> {
        codec::i64_at(self.data, self.pos)
    }

    pub fn peek_array(&self, len: usize) -> Result<&'a [u8]> {
        codec::field(self.data, self.pos, len)
    }

    // --- Byte ranges ---

    /// Consumes the next `len` bytes and returns them as a view.
    pub fn read_array(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len)
    }

    /// Absolute sub-range `[start, end)` of the region. Does not move the cursor.
    pub fn read_range(&self, start: usize, end: usize) -> Result<&'a [u8]> {
        if start > end {
            return Err(CodecError::Range(format!("start>end: {}>{}", start, end)));
        }
        codec::field(self.data, start, end - start)
    }

    /// All unconsumed bytes. Does not move the cursor.
    pub fn read_content(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Bytes from the current position up to absolute offset `end`. Does not move the cursor.
    ///
    /// Typical use is a body that stops before a trailing checksum and tail marker:
    /// `read_content_to(source().len() - 3)`.
    pub fn read_content_to(&self, end: usize) -> Result<&'a [u8]> {
        if end < self.pos {
            return Err(CodecError::Range(format!("end<position: {}<{}", end, self.pos)));
        }
        codec::field(self.data, self.pos, end - self.pos)
    }

    /// Consumes `count` bytes without decoding them (padding, reserved fields).
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count).map(|_| ())
    }

    /// Consumes one byte without decoding it.
    pub fn skip_byte(&mut self) -> Result<()> {
        self.skip(1)
    }

    // --- Text and numbers ---

    pub fn read_ascii(&mut self, len: usize) -> Result<String> {
        Ok(codec::decode_ascii(self.take(len)?))
    }

    /// Big-endian UTF-16 text of `len` bytes.
    pub fn read_unicode(&mut self, len: usize) -> Result<String> {
        Ok(codec::decode_utf16_be(self.take(len)?))
    }

    /// `len` bytes rendered as uppercase hex, e.g. `"7E0102"`.
    pub fn read_hex(&mut self, len: usize) -> Result<String> {
        Ok(dump::to_hex(self.take(len)?))
    }

    /// BCD field of `len` digits (`len / 2` bytes).
    ///
    /// With `trim`, leading zeros are removed: `[0x00, 0x12, 0x34]` reads as `"1234"`
    /// (trimmed) or `"001234"`.
    pub fn read_bcd(&mut self, len: usize, trim: bool) -> Result<String> {
        Ok(codec::bcd_to_string(self.take(len / 2)?, trim))
    }

    /// Unsigned big-endian integer of `len` bytes, as decimal text.
    ///
    /// Only fields of up to 8 bytes are exact; wider fields keep the low 64 bits.
    pub fn read_big_number(&mut self, len: usize) -> Result<String> {
        Ok(codec::big_number_value(self.take(len)?).to_string())
    }
}
