//! 3-byte big-endian unsigned integer.

use crate::codec::{CodecError, Result};
use byteorder::{BigEndian, ByteOrder};
use std::fmt;

/// An unsigned 24-bit integer (0..=16_777_215) carried as 3 big-endian bytes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FixedInt24(u32);

impl FixedInt24 {
    pub const MAX: u32 = 0xFF_FFFF;
    pub const WIDTH: usize = 3;

    /// Validates `value` against the 24-bit range.
    pub fn new(value: u32) -> Result<Self> {
        if value > Self::MAX {
            return Err(CodecError::overflow(value, Self::WIDTH));
        }
        Ok(FixedInt24(value))
    }

    pub fn from_be_bytes(bytes: [u8; 3]) -> Self {
        FixedInt24(BigEndian::read_u24(&bytes))
    }

    /// Decodes exactly 3 big-endian bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        match <[u8; 3]>::try_from(bytes) {
            Ok(raw) => Ok(FixedInt24::from_be_bytes(raw)),
            Err(_) if bytes.len() < Self::WIDTH => {
                Err(CodecError::bounds(0, Self::WIDTH, bytes.len()))
            }
            Err(_) => Err(CodecError::Format(format!(
                "24-bit value needs 3 bytes, got {}",
                bytes.len()
            ))),
        }
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn to_be_bytes(self) -> [u8; 3] {
        let mut out = [0u8; 3];
        BigEndian::write_u24(&mut out, self.0);
        out
    }
}

impl TryFrom<u32> for FixedInt24 {
    type Error = CodecError;

    fn try_from(value: u32) -> Result<Self> {
        FixedInt24::new(value)
    }
}

impl TryFrom<i64> for FixedInt24 {
    type Error = CodecError;

    fn try_from(value: i64) -> Result<Self> {
        u32::try_from(value)
            .map_err(|_| CodecError::overflow(value, Self::WIDTH))
            .and_then(FixedInt24::new)
    }
}

impl From<FixedInt24> for u32 {
    fn from(v: FixedInt24) -> u32 {
        v.0
    }
}

impl fmt::Display for FixedInt24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_and_reencode() {
        let v = FixedInt24::from_slice(&[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(v.value(), 66051);
        assert_eq!(v.to_be_bytes(), [0x01, 0x02, 0x03]);
        assert_eq!(FixedInt24::from_be_bytes([0xFF, 0xFF, 0xFF]).value(), FixedInt24::MAX);
    }

    #[test]
    fn range_is_validated() {
        assert!(FixedInt24::new(FixedInt24::MAX).is_ok());
        assert!(matches!(FixedInt24::new(0x0100_0000), Err(CodecError::Overflow { width: 3, .. })));
        assert!(FixedInt24::try_from(-1i64).is_err());
        assert_eq!(FixedInt24::try_from(42i64).unwrap().value(), 42);
    }

    #[test]
    fn short_slice_is_bounds_error() {
        assert!(matches!(FixedInt24::from_slice(&[1, 2]), Err(CodecError::Bounds { .. })));
        assert!(matches!(FixedInt24::from_slice(&[1, 2, 3, 4]), Err(CodecError::Format(_))));
    }
}
