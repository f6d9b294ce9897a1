//! Shared cursor primitives: the error type and offset-addressed codecs.
//!
//! [`Reader`](crate::reader::Reader) and [`Writer`](crate::writer::Writer) only track a
//! position; the actual decoding and encoding lives here as pure functions over a byte
//! region and an absolute offset. A peek is one of these calls at the current position, a
//! consuming read is the same call followed by an advance.
//!
//! Wire conventions:
//!
//! - Multi-byte integers are big-endian.
//! - BCD packs two digits per byte, high nibble first.
//! - Hex text is two uppercase characters per byte.
//! - Text is ASCII or big-endian UTF-16.

use byteorder::{BigEndian, ByteOrder};

/// Errors raised by the cursors and codecs.
///
/// A cursor that returned an error must be discarded: its position is not guaranteed to be
/// meaningful after a failed call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Bounds: {len} byte(s) requested at offset {offset}, {available} available")]
    Bounds {
        offset: usize,
        len: usize,
        available: usize,
    },
    #[error("Format: {0}")]
    Format(String),
    #[error("Range: {0}")]
    Range(String),
    #[error("Overflow: {value} does not fit in {width} byte(s)")]
    Overflow { value: String, width: usize },
}

pub type Result<T> = std::result::Result<T, CodecError>;

impl CodecError {
    /// Bounds error for `len` bytes at `offset` in a region whose usable end is `limit`.
    pub(crate) fn bounds(offset: usize, len: usize, limit: usize) -> Self {
        let available = limit.saturating_sub(offset);
        tracing::debug!(offset, len, available, "cursor access out of bounds");
        CodecError::Bounds { offset, len, available }
    }

    pub(crate) fn overflow(value: impl ToString, width: usize) -> Self {
        CodecError::Overflow { value: value.to_string(), width }
    }
}

/// Returns `data[offset..offset + len]`, or a bounds error if any of it lies outside `data`.
pub fn field(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    match offset.checked_add(len) {
        Some(end) if end <= data.len() => Ok(&data[offset..end]),
        _ => Err(CodecError::bounds(offset, len, data.len())),
    }
}

/// Mutable counterpart of [`field`].
pub fn field_mut(data: &mut [u8], offset: usize, len: usize) -> Result<&mut [u8]> {
    match offset.checked_add(len) {
        Some(end) if end <= data.len() => Ok(&mut data[offset..end]),
        _ => Err(CodecError::bounds(offset, len, data.len())),
    }
}

pub fn u8_at(data: &[u8], offset: usize) -> Result<u8> {
    Ok(field(data, offset, 1)?[0])
}

pub fn i8_at(data: &[u8], offset: usize) -> Result<i8> {
    Ok(u8_at(data, offset)? as i8)
}

pub fn u16_at(data: &[u8], offset: usize) -> Result<u16> {
    Ok(BigEndian::read_u16(field(data, offset, 2)?))
}

pub fn i16_at(data: &[u8], offset: usize) -> Result<i16> {
    Ok(BigEndian::read_i16(field(data, offset, 2)?))
}

pub fn u24_at(data: &[u8], offset: usize) -> Result<u32> {
    Ok(BigEndian::read_u24(field(data, offset, 3)?))
}

pub fn u32_at(data: &[u8], offset: usize) -> Result<u32> {
    Ok(BigEndian::read_u32(field(data, offset, 4)?))
}

pub fn i32_at(data: &[u8], offset: usize) -> Result<i32> {
    Ok(BigEndian::read_i32(field(data, offset, 4)?))
}

pub fn u64_at(data: &[u8], offset: usize) -> Result<u64> {
    Ok(BigEndian::read_u64(field(data, offset, 8)?))
}

pub fn i64_at(data: &[u8], offset: usize) -> Result<i64> {
    Ok(BigEndian::read_i64(field(data, offset, 8)?))
}

// --- Text ---

/// Decodes ASCII; bytes above 0x7F become `'?'`.
pub fn decode_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}

/// Encodes ASCII; characters outside the ASCII range become `b'?'`.
pub fn encode_ascii(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect()
}

/// Decodes big-endian UTF-16. Unpaired surrogates and a dangling odd byte decode to U+FFFD.
pub fn decode_utf16_be(bytes: &[u8]) -> String {
    let units = bytes.chunks_exact(2).map(BigEndian::read_u16);
    let mut out: String = char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    if bytes.len() % 2 == 1 {
        out.push(char::REPLACEMENT_CHARACTER);
    }
    out
}

pub fn encode_utf16_be(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

// --- BCD ---

/// Renders BCD bytes as digit text, high nibble first.
///
/// Nibbles above 9 render as `A`..`F` rather than failing, so filler nibbles survive a
/// read. With `trim`, leading `'0'`s are stripped and an all-zero field becomes `""`.
pub fn bcd_to_string(bytes: &[u8], trim: bool) -> String {
    let digits = hex::encode_upper(bytes);
    if trim {
        digits.trim_start_matches('0').to_string()
    } else {
        digits
    }
}

/// Packs BCD text into `len / 2` bytes.
///
/// The text is left-padded with `'0'` to `len` characters; when it is longer, only the
/// leading digit pairs that fit are used. Digits `0-9` and the filler nibbles `A-F` are
/// accepted. The result is `len / 2` bytes long, so callers check `len` against the target
/// field first.
pub fn bcd_text_bytes(text: &str, len: usize) -> Result<Vec<u8>> {
    let digits = left_padded(text, len, len / 2 * 2);
    hex::decode(digits).map_err(|e| CodecError::Format(format!("invalid BCD text {:?}: {}", text, e)))
}

/// `text` left-padded with `'0'` to `width` characters, then cut to its first `take`.
fn left_padded(text: &str, width: usize, take: usize) -> Vec<u8> {
    std::iter::repeat(b'0')
        .take(width.saturating_sub(text.len()))
        .chain(text.bytes())
        .take(take)
        .collect()
}

/// Packs `value` into `out` as BCD, least-significant digit pair in the last byte.
///
/// `out` is zero-filled first. Digit pairs that do not fit are dropped; the return value
/// tells whether the whole magnitude was stored.
pub fn pack_bcd_number(value: u64, out: &mut [u8]) -> bool {
    out.fill(0);
    let mut rest = value;
    for slot in out.iter_mut().rev() {
        if rest == 0 {
            break;
        }
        let pair = rest % 100;
        *slot = ((pair / 10) << 4 | pair % 10) as u8;
        rest /= 100;
    }
    rest == 0
}

/// One BCD byte to its value (`10 * high + low`).
pub fn bcd_to_u8(byte: u8) -> u8 {
    10 * (byte >> 4) + (byte & 0x0F)
}

/// A value up to 0xFF to one BCD byte. Larger inputs yield 0; values of 100 and above
/// overflow the high nibble and keep only the low 8 bits.
pub fn u8_to_bcd(value: u32) -> u8 {
    if value > 0xFF {
        return 0;
    }
    ((value / 10) << 4 | value % 10) as u8
}

// --- Hex ---

/// The digits of hex text: spaces and an optional `0x`/`0X` prefix removed.
pub fn hex_digits(text: &str) -> String {
    let cleaned: String = text.chars().filter(|c| *c != ' ').collect();
    match cleaned.get(..2) {
        Some("0x") | Some("0X") => cleaned[2..].to_string(),
        _ => cleaned,
    }
}

/// Parses hex text into bytes.
///
/// Spaces and an optional `0x`/`0X` prefix are removed. With `len = Some(n)` the digits are
/// left-padded with `'0'` to `2n` characters and the first `n` pairs are used; with `None`
/// the size is `digits / 2` (an odd trailing digit is ignored).
pub fn hex_text_bytes(text: &str, len: Option<usize>) -> Result<Vec<u8>> {
    let digits = hex_digits(text);
    let count = len.unwrap_or(digits.len() / 2);
    let width = count
        .checked_mul(2)
        .ok_or_else(|| CodecError::Range(format!("hex field of {} bytes is too wide", count)))?;
    hex::decode(left_padded(&digits, width, width))
        .map_err(|e| CodecError::Format(format!("invalid hex text {:?}: {}", text, e)))
}

// --- Big numbers ---

/// Big-endian unsigned value of `bytes`. Fields wider than 8 bytes keep the low 64 bits.
pub fn big_number_value(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| acc.wrapping_shl(8) | b as u64)
}

/// Parses decimal text through an `f64`, the way the wire format has always been produced.
///
/// Empty text is 0. Precision is lost above 2^53, fractions are truncated and negative
/// values clamp to 0.
pub fn parse_decimal_lossy(text: &str) -> Result<u64> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }
    text.parse::<f64>()
        .map(|v| v as u64)
        .map_err(|e| CodecError::Format(format!("invalid decimal text {:?}: {}", text, e)))
}

/// Parses decimal text exactly as an unsigned 64-bit integer. Empty text is 0.
pub fn parse_decimal_exact(text: &str) -> Result<u64> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }
    text.parse::<u64>().map_err(|e| match e.kind() {
        std::num::IntErrorKind::PosOverflow => CodecError::overflow(text, 8),
        _ => CodecError::Format(format!("invalid decimal text {:?}: {}", text, e)),
    })
}

/// Writes `value` big-endian into all of `out`, dropping high-order bytes that do not fit.
/// Returns whether the whole value was stored.
pub fn put_big_number(value: u64, out: &mut [u8]) -> bool {
    let mut rest = value;
    for slot in out.iter_mut().rev() {
        *slot = rest as u8;
        rest >>= 8;
    }
    rest == 0
}

// --- Checksums ---

/// XOR of every byte; 0 for an empty slice.
pub fn xor_fold(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, b| acc ^ b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_rejects_overrun() {
        let data = [1u8, 2, 3];
        assert_eq!(field(&data, 1, 2).unwrap(), &[2, 3]);
        assert_eq!(
            field(&data, 2, 2),
            Err(CodecError::Bounds { offset: 2, len: 2, available: 1 })
        );
        assert!(field(&data, usize::MAX, 2).is_err());
    }

    #[test]
    fn integers_are_big_endian() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0];
        assert_eq!(u16_at(&data, 0).unwrap(), 0x1234);
        assert_eq!(u24_at(&data, 1).unwrap(), 0x34_5678);
        assert_eq!(u32_at(&data, 4).unwrap(), 0x9ABC_DEF0);
        assert_eq!(u64_at(&data, 0).unwrap(), 0x1234_5678_9ABC_DEF0);
        assert_eq!(i16_at(&[0xFF, 0xFE], 0).unwrap(), -2);
    }

    #[test]
    fn bcd_text_pads_and_truncates() {
        assert_eq!(bcd_text_bytes("1234", 6).unwrap(), vec![0x00, 0x12, 0x34]);
        assert_eq!(bcd_text_bytes("123456", 4).unwrap(), vec![0x12, 0x34]);
        assert_eq!(bcd_text_bytes("", 4).unwrap(), vec![0x00, 0x00]);
        assert_eq!(bcd_text_bytes("138F", 4).unwrap(), vec![0x13, 0x8F]);
        assert!(matches!(bcd_text_bytes("12x4", 4), Err(CodecError::Format(_))));
    }

    #[test]
    fn bcd_render_trims_leading_zeros() {
        assert_eq!(bcd_to_string(&[0x00, 0x12, 0x34], true), "1234");
        assert_eq!(bcd_to_string(&[0x00, 0x12, 0x34], false), "001234");
        assert_eq!(bcd_to_string(&[0x00, 0x00], true), "");
    }

    #[test]
    fn bcd_number_drops_high_pairs() {
        let mut out = [0xAAu8; 3];
        assert!(!pack_bcd_number(20230915, &mut out));
        assert_eq!(out, [0x23, 0x09, 0x15]);

        let mut out = [0xAAu8; 3];
        assert!(pack_bcd_number(5, &mut out));
        assert_eq!(out, [0x00, 0x00, 0x05]);
    }

    #[test]
    fn single_byte_bcd() {
        assert_eq!(bcd_to_u8(0x19), 19);
        assert_eq!(u8_to_bcd(19), 0x19);
        assert_eq!(u8_to_bcd(0x100), 0);
    }

    #[test]
    fn hex_text_variants() {
        assert_eq!(hex_text_bytes("0x1A2B", Some(2)).unwrap(), vec![0x1A, 0x2B]);
        assert_eq!(hex_text_bytes("1a 2b", Some(3)).unwrap(), vec![0x00, 0x1A, 0x2B]);
        assert_eq!(hex_text_bytes("ABCDEF", None).unwrap(), vec![0xAB, 0xCD, 0xEF]);
        assert_eq!(hex_text_bytes("ABCDE", None).unwrap(), vec![0xAB, 0xCD]);
        assert_eq!(hex_text_bytes("ABCDEF", Some(1)).unwrap(), vec![0xAB]);
        assert!(matches!(hex_text_bytes("0xZZ", Some(1)), Err(CodecError::Format(_))));
        assert!(matches!(hex_text_bytes("", Some(usize::MAX / 2 + 1)), Err(CodecError::Range(_))));
    }

    #[test]
    fn big_number_parse_and_put() {
        assert_eq!(parse_decimal_lossy("").unwrap(), 0);
        assert_eq!(parse_decimal_lossy("300").unwrap(), 300);
        assert_eq!(parse_decimal_lossy("12.9").unwrap(), 12);
        assert!(parse_decimal_lossy("twelve").is_err());
        assert_eq!(parse_decimal_exact("9007199254740993").unwrap(), 9_007_199_254_740_993);
        assert!(matches!(
            parse_decimal_exact("99999999999999999999"),
            Err(CodecError::Overflow { .. })
        ));

        let mut out = [0u8; 2];
        assert!(!put_big_number(0x01_0203, &mut out));
        assert_eq!(out, [0x02, 0x03]);
        let mut wide = [0xFFu8; 10];
        assert!(put_big_number(0x0102, &mut wide));
        assert_eq!(wide, [0, 0, 0, 0, 0, 0, 0, 0, 0x01, 0x02]);
        assert_eq!(big_number_value(&[0x01, 0x00]), 256);
    }

    #[test]
    fn text_codecs() {
        assert_eq!(decode_ascii(b"AB\xC3"), "AB?");
        assert_eq!(encode_ascii("héllo"), b"h?llo".to_vec());
        assert_eq!(encode_utf16_be("中A"), vec![0x4E, 0x2D, 0x00, 0x41]);
        assert_eq!(decode_utf16_be(&[0x4E, 0x2D, 0x00, 0x41]), "中A");
        assert_eq!(decode_utf16_be(&[0x00, 0x41, 0x00]), "A\u{FFFD}");
    }

    #[test]
    fn xor_fold_empty_is_zero() {
        assert_eq!(xor_fold(&[]), 0);
        assert_eq!(xor_fold(&[0x01, 0x02, 0x04]), 0x07);
    }
}
