//! Four boolean flags packed into one nibble.
//!
//! Flag fields in device frames often carry two groups of four switches in one byte;
//! [`Reader::read_nibbles`](crate::reader::Reader::read_nibbles) and
//! [`Writer::write_nibbles`](crate::writer::Writer::write_nibbles) move a pair of these.

/// Bits 0..=3 of a byte, each one a flag. Bit 0 is flag 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HalfByte(u8);

impl HalfByte {
    /// Keeps the low 4 bits of `value`.
    pub fn new(value: u8) -> Self {
        HalfByte(value & 0x0F)
    }

    pub fn from_flags(flags: [bool; 4]) -> Self {
        let bits = flags
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, &on)| if on { acc | 1 << i } else { acc });
        HalfByte(bits)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Flag `index` (0..=3); out-of-range indices read as unset.
    pub fn get(self, index: usize) -> bool {
        index < 4 && self.0 & (1 << index) != 0
    }

    /// Sets flag `index`; out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, on: bool) {
        if index >= 4 {
            return;
        }
        if on {
            self.0 |= 1 << index;
        } else {
            self.0 &= !(1 << index);
        }
    }

    pub fn flags(self) -> [bool; 4] {
        [self.get(0), self.get(1), self.get(2), self.get(3)]
    }

    /// Splits a byte into (high, low) nibbles.
    pub fn split(byte: u8) -> (HalfByte, HalfByte) {
        (HalfByte(byte >> 4), HalfByte(byte & 0x0F))
    }

    pub fn join(high: HalfByte, low: HalfByte) -> u8 {
        high.0 << 4 | low.0
    }
}
