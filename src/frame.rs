//! Frame-level transforms applied when a message is published.
//!
//! [`Writer::encode`](crate::writer::Writer::encode) hands the written frame to a
//! [`FrameTransform`], which produces the bytes that actually go on the wire right after it.
//! [`Identity`] copies the frame unchanged. Protocols that escape reserved bytes inside the
//! frame body supply a [`ByteStuffing`] with their own escape table, or their own
//! implementation.

use crate::codec::{CodecError, Result};

/// Produces the published form of a finished frame.
pub trait FrameTransform {
    /// Writes the published form of `frame` into `out` and returns the number of bytes
    /// produced. Must fail with [`CodecError::Bounds`] rather than write past `out`.
    fn transform(&self, frame: &[u8], out: &mut [u8]) -> Result<usize>;
}

/// Publishes the frame byte for byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl FrameTransform for Identity {
    fn transform(&self, frame: &[u8], out: &mut [u8]) -> Result<usize> {
        if out.len() < frame.len() {
            return Err(CodecError::bounds(0, frame.len(), out.len()));
        }
        out[..frame.len()].copy_from_slice(frame);
        Ok(frame.len())
    }
}

/// Escape-based byte stuffing of the frame body.
///
/// The first and last byte (head and tail markers) pass through untouched. Inside the body,
/// every byte with a rule `raw -> code` is replaced by `escape, code`. The escape byte
/// itself needs a rule too, otherwise it could not be told apart from an escape sequence on
/// the receiving side.
///
/// ```
/// use wirecursor::frame::{ByteStuffing, FrameTransform};
///
/// let stuffing = ByteStuffing::new(0x7D).with_rule(0x7E, 0x02).with_rule(0x7D, 0x01);
/// let mut out = [0u8; 8];
/// let n = stuffing.transform(&[0x7E, 0x30, 0x7E, 0x7D, 0x7E], &mut out).unwrap();
/// assert_eq!(&out[..n], &[0x7E, 0x30, 0x7D, 0x02, 0x7D, 0x01, 0x7E]);
/// ```
#[derive(Debug, Clone)]
pub struct ByteStuffing {
    escape: u8,
    rules: Vec<(u8, u8)>,
}

impl ByteStuffing {
    pub fn new(escape: u8) -> Self {
        ByteStuffing { escape, rules: Vec::new() }
    }

    /// Adds a rule: `raw` in the body is sent as `escape, code`.
    pub fn with_rule(mut self, raw: u8, code: u8) -> Self {
        self.rules.push((raw, code));
        self
    }

    fn code_for(&self, raw: u8) -> Option<u8> {
        self.rules.iter().find(|(r, _)| *r == raw).map(|(_, c)| *c)
    }

    fn raw_for(&self, code: u8) -> Option<u8> {
        self.rules.iter().find(|(_, c)| *c == code).map(|(r, _)| *r)
    }

    /// Reverses [`FrameTransform::transform`] on a received frame.
    pub fn unstuff(&self, frame: &[u8]) -> Result<Vec<u8>> {
        if frame.len() < 2 {
            return Ok(frame.to_vec());
        }
        let last = frame.len() - 1;
        let mut out = Vec::with_capacity(frame.len());
        out.push(frame[0]);
        let mut i = 1;
        while i < last {
            let b = frame[i];
            if b == self.escape {
                if i + 1 >= last {
                    return Err(CodecError::Format(format!("dangling escape byte at offset {}", i)));
                }
                let code = frame[i + 1];
                let raw = self.raw_for(code).ok_or_else(|| {
                    CodecError::Format(format!("unknown escape code {:#04X} at offset {}", code, i + 1))
                })?;
                out.push(raw);
                i += 2;
            } else {
                out.push(b);
                i += 1;
            }
        }
        out.push(frame[last]);
        Ok(out)
    }
}

impl FrameTransform for ByteStuffing {
    fn transform(&self, frame: &[u8], out: &mut [u8]) -> Result<usize> {
        if frame.len() < 2 {
            return Identity.transform(frame, out);
        }
        let last = frame.len() - 1;
        let mut n = 0;
        let mut put = |b: u8, n: &mut usize| -> Result<()> {
            let slot = out
                .get_mut(*n)
                .ok_or_else(|| CodecError::bounds(*n, 1, *n))?;
            *slot = b;
            *n += 1;
            Ok(())
        };
        put(frame[0], &mut n)?;
        for &b in &frame[1..last] {
            match self.code_for(b) {
                Some(code) => {
                    put(self.escape, &mut n)?;
                    put(code, &mut n)?;
                }
                None => put(b, &mut n)?,
            }
        }
        put(frame[last], &mut n)?;
        tracing::trace!(raw = frame.len(), stuffed = n, "byte stuffing applied");
        Ok(n)
    }
}
