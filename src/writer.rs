//! Sequential, bounds-checked encoding into a caller-sized buffer.
//!
//! The writer keeps a fixed-capacity region plus a written length, rather than a one-way
//! stream, so fields that are only known once the message is complete (length prefixes,
//! checksums) can be reserved up front and backpatched later:
//!
//! ```
//! use wirecursor::Writer;
//!
//! let mut buf = [0u8; 32];
//! let mut w = Writer::new(&mut buf);
//! w.write_u8(0x7E).unwrap();
//! let len_at = w.skip(2).unwrap();
//! w.write_ascii("PING").unwrap();
//! w.patch_u16(len_at, 4).unwrap();
//! w.write_xor().unwrap();
//! assert_eq!(w.written(), &[0x7E, 0x00, 0x04, b'P', b'I', b'N', b'G', 0x14]);
//! ```
//!
//! ## Overflow
//!
//! By default the text and number encoders keep the wire-compatible behaviour of silently
//! dropping what does not fit the field (high-order BCD pairs, high-order big-number bytes,
//! ASCII past the fixed length) and of parsing big numbers through an `f64`. With
//! [`OverflowPolicy::Strict`] those cases fail with [`CodecError::Overflow`] instead, and big
//! numbers are parsed exactly as `u64` (non-integral text is a [`CodecError::Format`]).

use crate::codec::{self, CodecError, Result};
use crate::dump;
use crate::fixed::FixedInt24;
use crate::flags::HalfByte;
use crate::frame::FrameTransform;
use byteorder::{BigEndian, ByteOrder};
use std::fmt::Display;

/// What the encoders do with a value wider than its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Drop the part that does not fit (wire-compatible default).
    #[default]
    Truncate,
    /// Fail with [`CodecError::Overflow`].
    Strict,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriterOptions {
    pub overflow: OverflowPolicy,
}

impl WriterOptions {
    pub fn strict() -> Self {
        WriterOptions { overflow: OverflowPolicy::Strict }
    }
}

/// Write cursor over a borrowed, pre-sized buffer.
///
/// `position()` only grows. Backpatch (`patch_*`) calls rewrite bytes below the position
/// without moving it, and may only touch bytes that were already written.
#[derive(Debug)]
pub struct Writer<'a> {
    buf: &'a mut [u8],
    written: usize,
    /// Start of the published region; set by [`Writer::encode`].
    encoded_from: usize,
    options: WriterOptions,
}

impl<'a> Writer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self::with_options(buf, WriterOptions::default())
    }

    pub fn with_options(buf: &'a mut [u8], options: WriterOptions) -> Self {
        Writer { buf, written: 0, encoded_from: 0, options }
    }

    /// Bytes written so far; also the offset the next write lands at.
    pub fn position(&self) -> usize {
        self.written
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn free_len(&self) -> usize {
        self.buf.len() - self.written
    }

    pub fn options(&self) -> WriterOptions {
        self.options
    }

    /// Copies `bytes` at the cursor and returns the offset they start at.
    fn put(&mut self, bytes: &[u8]) -> Result<usize> {
        let at = self.written;
        codec::field_mut(self.buf, at, bytes.len())?.copy_from_slice(bytes);
        self.written += bytes.len();
        Ok(at)
    }

    /// Hands the next `n` free bytes to `fill`, then advances.
    fn put_with(&mut self, n: usize, fill: impl FnOnce(&mut [u8])) -> Result<usize> {
        let at = self.written;
        fill(codec::field_mut(self.buf, at, n)?);
        self.written += n;
        Ok(at)
    }

    /// Already-written bytes `[position, position + width)` for a backpatch.
    fn slot(&mut self, position: usize, width: usize) -> Result<&mut [u8]> {
        tracing::trace!(position, width, written = self.written, "backpatch");
        codec::field_mut(&mut self.buf[..self.written], position, width)
    }

    fn check_fit(&self, fits: bool, value: impl Display, width: usize) -> Result<()> {
        if fits {
            return Ok(());
        }
        match self.options.overflow {
            OverflowPolicy::Strict => Err(CodecError::overflow(value, width)),
            OverflowPolicy::Truncate => {
                tracing::warn!(%value, width, "value truncated to field width");
                Ok(())
            }
        }
    }

    // --- Reservations ---

    /// Writes one `0x00` byte and returns its offset.
    pub fn nil(&mut self) -> Result<usize> {
        self.put(&[0x00])
    }

    /// Reserves `count` zero bytes and returns the offset of the first one.
    pub fn skip(&mut self, count: usize) -> Result<usize> {
        self.skip_with(count, 0x00)
    }

    /// Reserves `count` bytes filled with `fill` and returns the offset of the first one.
    pub fn skip_with(&mut self, count: usize, fill: u8) -> Result<usize> {
        self.put_with(count, |slot| slot.fill(fill))
    }

    // --- Integers ---

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.put(&[value]).map(|_| ())
    }

    /// Same as [`Writer::write_u8`].
    pub fn write_byte(&mut self, value: u8) -> Result<()> {
        self.write_u8(value)
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_u8(value as u8)
    }

    /// One byte: the low 8 bits of the character's code point.
    pub fn write_char(&mut self, value: char) -> Result<()> {
        self.check_fit((value as u32) <= 0xFF, value, 1)?;
        self.write_u8(value as u32 as u8)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.put_with(2, |s| BigEndian::write_u16(s, value)).map(|_| ())
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.put_with(2, |s| BigEndian::write_i16(s, value)).map(|_| ())
    }

    /// 3 bytes big-endian; the top byte of `value` is dropped.
    pub fn write_u24(&mut self, value: u32) -> Result<()> {
        self.check_fit(value <= FixedInt24::MAX, value, FixedInt24::WIDTH)?;
        self.put_with(3, |s| BigEndian::write_u24(s, value & FixedInt24::MAX)).map(|_| ())
    }

    pub fn write_fixed_u24(&mut self, value: FixedInt24) -> Result<()> {
        self.put(&value.to_be_bytes()).map(|_| ())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.put_with(4, |s| BigEndian::write_u32(s, value)).map(|_| ())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.put_with(4, |s| BigEndian::write_i32(s, value)).map(|_| ())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.put_with(8, |s| BigEndian::write_u64(s, value)).map(|_| ())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.put_with(8, |s| BigEndian::write_i64(s, value)).map(|_| ())
    }

    pub fn write_nibbles(&mut self, high: HalfByte, low: HalfByte) -> Result<()> {
        self.write_u8(HalfByte::join(high, low))
    }

    pub fn write_array(&mut self, src: &[u8]) -> Result<()> {
        self.put(src).map(|_| ())
    }

    // --- Text and numbers ---

    /// BCD text into `len` digits (`len / 2` bytes), left-padded with `'0'`.
    pub fn write_bcd(&mut self, value: &str, len: usize) -> Result<()> {
        codec::field(self.buf, self.written, len / 2)?;
        self.check_fit(value.len() <= len, value, len / 2)?;
        let bytes = codec::bcd_text_bytes(value, len)?;
        self.put(&bytes).map(|_| ())
    }

    /// `value` as BCD in `byte_count` bytes, least-significant digit pair last.
    ///
    /// Digit pairs that do not fit are dropped (`20230915` in 3 bytes is `23 09 15`).
    pub fn write_bcd_number(&mut self, value: u64, byte_count: usize) -> Result<()> {
        let at = self.written;
        let fits = codec::pack_bcd_number(value, codec::field_mut(self.buf, at, byte_count)?);
        self.check_fit(fits, value, byte_count)?;
        self.written += byte_count;
        Ok(())
    }

    /// Hex text into `len` bytes, or as many bytes as the text holds when `len` is `None`.
    ///
    /// Spaces and a `0x` prefix are ignored; short input is left-padded with zeros.
    pub fn write_hex(&mut self, value: &str, len: Option<usize>) -> Result<()> {
        if let Some(n) = len {
            codec::field(self.buf, self.written, n)?;
            let digits = codec::hex_digits(value).len();
            self.check_fit(digits / 2 + digits % 2 <= n, value, n)?;
        }
        let bytes = codec::hex_text_bytes(value, len)?;
        self.put(&bytes).map(|_| ())
    }

    pub fn write_ascii(&mut self, value: &str) -> Result<()> {
        let bytes = codec::encode_ascii(value);
        self.put(&bytes).map(|_| ())
    }

    /// ASCII text in exactly `length` bytes: zero-padded on the right, or cut.
    pub fn write_ascii_fixed(&mut self, value: &str, length: usize) -> Result<()> {
        let bytes = codec::encode_ascii(value);
        self.check_fit(bytes.len() <= length, value, length)?;
        let n = bytes.len().min(length);
        self.put_with(length, |slot| {
            slot.fill(0);
            slot[..n].copy_from_slice(&bytes[..n]);
        })
        .map(|_| ())
    }

    /// Big-endian UTF-16 text.
    pub fn write_unicode(&mut self, value: &str) -> Result<()> {
        let bytes = codec::encode_utf16_be(value);
        self.put(&bytes).map(|_| ())
    }

    /// Decimal text as an unsigned big-endian integer of `len` bytes.
    pub fn write_big_number(&mut self, value: &str, len: usize) -> Result<()> {
        let number = match self.options.overflow {
            OverflowPolicy::Truncate => codec::parse_decimal_lossy(value)?,
            OverflowPolicy::Strict => codec::parse_decimal_exact(value)?,
        };
        let at = self.written;
        let fits = codec::put_big_number(number, codec::field_mut(self.buf, at, len)?);
        self.check_fit(fits, number, len)?;
        self.written += len;
        Ok(())
    }

    // --- Backpatch ---

    pub fn patch_u8(&mut self, position: usize, value: u8) -> Result<()> {
        self.slot(position, 1)?[0] = value;
        Ok(())
    }

    /// Same as [`Writer::patch_u8`].
    pub fn patch_byte(&mut self, position: usize, value: u8) -> Result<()> {
        self.patch_u8(position, value)
    }

    pub fn patch_u16(&mut self, position: usize, value: u16) -> Result<()> {
        BigEndian::write_u16(self.slot(position, 2)?, value);
        Ok(())
    }

    pub fn patch_i16(&mut self, position: usize, value: i16) -> Result<()> {
        BigEndian::write_i16(self.slot(position, 2)?, value);
        Ok(())
    }

    pub fn patch_u32(&mut self, position: usize, value: u32) -> Result<()> {
        BigEndian::write_u32(self.slot(position, 4)?, value);
        Ok(())
    }

    pub fn patch_i32(&mut self, position: usize, value: i32) -> Result<()> {
        BigEndian::write_i32(self.slot(position, 4)?, value);
        Ok(())
    }

    pub fn patch_u64(&mut self, position: usize, value: u64) -> Result<()> {
        BigEndian::write_u64(self.slot(position, 8)?, value);
        Ok(())
    }

    pub fn patch_i64(&mut self, position: usize, value: i64) -> Result<()> {
        BigEndian::write_i64(self.slot(position, 8)?, value);
        Ok(())
    }

    pub fn patch_array(&mut self, position: usize, src: &[u8]) -> Result<()> {
        self.slot(position, src.len())?.copy_from_slice(src);
        Ok(())
    }

    /// BCD text into `len` digits at `position`, same packing as [`Writer::write_bcd`].
    pub fn patch_bcd(&mut self, position: usize, value: &str, len: usize) -> Result<()> {
        self.slot(position, len / 2)?;
        self.check_fit(value.len() <= len, value, len / 2)?;
        let bytes = codec::bcd_text_bytes(value, len)?;
        self.patch_array(position, &bytes)
    }

    // --- Checksums ---

    /// XOR of written bytes `[start, end)`, appended as one byte. Returns the checksum.
    pub fn write_xor_range(&mut self, start: usize, end: usize) -> Result<u8> {
        if start > end {
            return Err(CodecError::Range(format!("start>end: {}>{}", start, end)));
        }
        let sum = codec::xor_fold(codec::field(&self.buf[..self.written], start, end - start)?);
        tracing::trace!(start, end, checksum = sum, "xor checksum");
        self.write_u8(sum)?;
        Ok(sum)
    }

    /// XOR of written bytes from `start` to the current position, appended as one byte.
    pub fn write_xor_from(&mut self, start: usize) -> Result<u8> {
        if start > self.written {
            return Err(CodecError::bounds(start, 0, self.written));
        }
        self.write_xor_range(start, self.written)
    }

    /// XOR of everything written after the first byte (the head marker), appended as one
    /// byte. Fails if nothing has been written yet.
    pub fn write_xor(&mut self) -> Result<u8> {
        if self.written < 1 {
            return Err(CodecError::Range("checksum before any byte was written".to_string()));
        }
        self.write_xor_from(1)
    }

    // --- Finalize ---

    /// Runs `transform` over the written frame, appending its output right after it.
    ///
    /// The current position becomes the start of the published region returned by
    /// [`Writer::encoded`]; the frame as built stays available through
    /// [`Writer::written`]. Returns the number of bytes the transform produced.
    pub fn encode<T: FrameTransform + ?Sized>(&mut self, transform: &T) -> Result<usize> {
        let mark = self.written;
        let (frame, free) = self.buf.split_at_mut(mark);
        let free_len = free.len();
        let n = transform.transform(frame, free)?;
        if n > free_len {
            return Err(CodecError::bounds(mark, n, self.buf.len()));
        }
        self.encoded_from = mark;
        self.written += n;
        tracing::trace!(frame = mark, published = n, "frame encoded");
        Ok(n)
    }

    /// Everything written, as a view.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.written]
    }

    /// Everything written, as an owned copy.
    pub fn to_vec(&self) -> Vec<u8> {
        self.written().to_vec()
    }

    /// The published region: from the mark set by [`Writer::encode`] to the position.
    /// Before any `encode`, this is the whole written region.
    pub fn encoded(&self) -> &[u8] {
        &self.buf[self.encoded_from..self.written]
    }

    pub fn encoded_to_vec(&self) -> Vec<u8> {
        self.encoded().to_vec()
    }

    /// Written bytes as spaced uppercase hex, for logs.
    pub fn hex_dump(&self) -> String {
        dump::to_hex_spaced(self.written())
    }
}
