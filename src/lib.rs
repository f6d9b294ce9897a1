//! # wirecursor: cursors for fixed-layout device frames
//!
//! Bounds-checked [`Reader`] and [`Writer`] cursors over caller-owned byte regions, for
//! telecom/IoT frames whose fields are big-endian integers, BCD digits, hex/ASCII/UTF-16
//! text and XOR checksums. The field order of each message lives in a higher layer; this
//! crate provides the typed primitives that layer calls in order.
//!
//! ## Field codecs
//!
//! - Integers: `u8`..`u64`, `i8`..`i64`, 24-bit ([`FixedInt24`]), all big-endian
//! - BCD text (`"20230915"` <-> `20 23 09 15`) and BCD numbers
//! - Hex text (`"0x1A2B"` <-> `1A 2B`), ASCII, big-endian UTF-16
//! - "Big numbers": unsigned big-endian integers of arbitrary width as decimal text
//! - Flag nibbles ([`HalfByte`])
//!
//! ## Building a frame
//!
//! Reserve fields that are only known at the end, backpatch them, append the checksum, then
//! publish through a [`FrameTransform`]:
//!
//! ```
//! use wirecursor::{BufferPool, Identity, Reader, Writer};
//!
//! let mut buf = BufferPool::shared().rent(64);
//! let mut w = Writer::new(&mut buf);
//! w.write_u8(0x7E).unwrap();
//! w.write_u16(0x0200).unwrap();
//! let len_at = w.skip(2).unwrap();
//! let body_start = w.position();
//! w.write_bcd("13800138000", 12).unwrap();
//! let body_len = (w.position() - body_start) as u16;
//! w.patch_u16(len_at, body_len).unwrap();
//! w.write_xor().unwrap();
//! w.write_u8(0x7E).unwrap();
//! w.encode(&Identity).unwrap();
//! let frame = w.encoded_to_vec();
//!
//! let mut r = Reader::new(&frame);
//! assert_eq!(r.read_u8().unwrap(), 0x7E);
//! assert_eq!(r.peek_u16().unwrap(), 0x0200);
//! r.skip(2).unwrap();
//! assert_eq!(r.read_u16().unwrap(), 6);
//! assert_eq!(r.read_bcd(12, true).unwrap(), "13800138000");
//! ```
//!
//! ## Errors
//!
//! Every operation returns [`Result`]. Reads and writes past the region, and backpatches
//! past the written length, fail with [`CodecError::Bounds`] and never yield partial data.
//! A cursor that returned an error should be dropped.

pub mod codec;
pub mod dump;
pub mod fixed;
pub mod flags;
pub mod frame;
pub mod pool;
pub mod reader;
pub mod writer;

pub use codec::{CodecError, Result};
pub use fixed::FixedInt24;
pub use flags::HalfByte;
pub use frame::{ByteStuffing, FrameTransform, Identity};
pub use pool::{BufferPool, PooledBuffer};
pub use reader::Reader;
pub use writer::{OverflowPolicy, Writer, WriterOptions};
