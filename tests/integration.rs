//! Integration tests: build a complete device frame with reserved fields, checksum and
//! stuffing, then parse it back in schema order.

use std::thread;
use wirecursor::{BufferPool, ByteStuffing, CodecError, FixedInt24, HalfByte, Identity, Reader, Writer};

const HEAD: u8 = 0x7E;
const TAIL: u8 = 0x7E;
const MSG_LOCATION: u16 = 0x0200;

#[derive(Debug, Clone, PartialEq)]
struct Location {
    terminal: String,
    serial: u16,
    alarm: u32,
    lat: u32,
    lon: u32,
    altitude: FixedInt24,
    time: String,
    plate: String,
    driver: String,
    odometer: String,
}

fn stuffing() -> ByteStuffing {
    ByteStuffing::new(0x7D).with_rule(0x7E, 0x02).with_rule(0x7D, 0x01)
}

/// head | id u16 | body_len u16 | terminal bcd(12) | serial u16 | body | xor | tail
fn encode_location(loc: &Location, buf: &mut [u8]) -> wirecursor::Result<Vec<u8>> {
    let mut w = Writer::new(buf);
    w.write_u8(HEAD)?;
    w.write_u16(MSG_LOCATION)?;
    let len_at = w.skip(2)?;
    w.write_bcd(&loc.terminal, 12)?;
    w.write_u16(loc.serial)?;
    let body_start = w.position();
    w.write_u32(loc.alarm)?;
    w.write_u32(loc.lat)?;
    w.write_u32(loc.lon)?;
    w.write_fixed_u24(loc.altitude)?;
    w.write_bcd(&loc.time, 12)?;
    w.write_ascii_fixed(&loc.plate, 8)?;
    w.write_u8(loc.driver.encode_utf16().count() as u8 * 2)?;
    w.write_unicode(&loc.driver)?;
    w.write_big_number(&loc.odometer, 5)?;
    w.write_nibbles(HalfByte::new(0b0001), HalfByte::new(0b1000))?;
    let body_len = (w.position() - body_start) as u16;
    w.patch_u16(len_at, body_len)?;
    w.write_xor()?;
    w.write_u8(TAIL)?;
    w.encode(&stuffing())?;
    Ok(w.encoded_to_vec())
}

fn decode_location(frame: &[u8]) -> wirecursor::Result<Location> {
    let raw = stuffing().unstuff(frame)?;
    let mut r = Reader::new(&raw);
    assert_eq!(r.read_u8()?, HEAD);
    if r.peek_u16()? != MSG_LOCATION {
        return Err(CodecError::Format("unexpected message id".to_string()));
    }
    r.skip(2)?;
    let body_len = r.read_u16()? as usize;
    let terminal = r.read_bcd(12, true)?;
    let serial = r.read_u16()?;
    let body_start = r.position();
    let body = r.read_range(body_start, body_start + body_len)?;
    let expected = body.iter().fold(0u8, |a, b| a ^ b);
    let alarm = r.read_u32()?;
    let lat = r.read_u32()?;
    let lon = r.read_u32()?;
    let altitude = r.read_fixed_u24()?;
    let time = r.read_bcd(12, false)?;
    let plate = r.read_ascii(8)?.trim_end_matches('\0').to_string();
    let driver_len = r.read_u8()? as usize;
    let driver = r.read_unicode(driver_len)?;
    let odometer = r.read_big_number(5)?;
    let (hi, lo) = r.read_nibbles()?;
    assert!(hi.get(0) && lo.get(3));
    assert_eq!(r.position(), body_start + body_len);
    let header_xor = raw[1..body_start].iter().fold(0u8, |a, b| a ^ b);
    let checksum = r.read_u8()?;
    if checksum != header_xor ^ expected {
        return Err(CodecError::Format("checksum mismatch".to_string()));
    }
    assert_eq!(r.read_u8()?, TAIL);
    assert_eq!(r.remaining_len(), 0);
    Ok(Location { terminal, serial, alarm, lat, lon, altitude, time, plate, driver, odometer })
}

fn sample() -> Location {
    Location {
        terminal: "13800138000".to_string(),
        serial: 0x007E,
        alarm: 0x0000_7D00,
        lat: 31_230_416,
        lon: 121_473_701,
        altitude: FixedInt24::new(4_500).unwrap(),
        time: "231017153000".to_string(),
        plate: "A12345".to_string(),
        driver: "张三".to_string(),
        odometer: "123456789".to_string(),
    }
}

#[test]
fn test_frame_round_trip() {
    let loc = sample();
    let mut buf = BufferPool::shared().rent(256);
    let frame = encode_location(&loc, &mut buf).expect("encode");
    assert_eq!(frame.first(), Some(&HEAD));
    assert_eq!(frame.last(), Some(&TAIL));
    // serial and alarm contain 0x7E/0x7D, so the body must have been escaped
    assert!(!frame[1..frame.len() - 1].contains(&0x7E));
    let decoded = decode_location(&frame).expect("decode");
    assert_eq!(decoded, loc);
}

#[test]
fn test_corrupted_frame_fails_checksum() {
    let mut buf = vec![0u8; 256];
    let mut frame = encode_location(&sample(), &mut buf).expect("encode");
    // second byte of `lat`; 0x7E/0x7D escapes in serial and alarm put it at 20
    frame[20] ^= 0x01;
    match decode_location(&frame) {
        Err(CodecError::Format(_)) => {}
        other => panic!("expected a format error, got {:?}", other),
    }
}

#[test]
fn test_truncated_frame_is_bounds_error() {
    let mut buf = vec![0u8; 256];
    let frame = encode_location(&sample(), &mut buf).expect("encode");
    let raw = stuffing().unstuff(&frame).expect("unstuff");
    let mut r = Reader::new(&raw[..20]);
    r.skip(5).unwrap();
    assert_eq!(r.read_bcd(12, true).unwrap(), "13800138000");
    r.skip(2).unwrap();
    r.read_u32().unwrap();
    assert!(matches!(r.read_u32(), Err(CodecError::Bounds { .. })));
}

#[test]
fn test_small_buffer_is_bounds_error() {
    let mut buf = [0u8; 16];
    assert!(matches!(encode_location(&sample(), &mut buf), Err(CodecError::Bounds { .. })));
}

#[test]
fn test_identity_publish_matches_written_frame() {
    let mut buf = [0u8; 32];
    let mut w = Writer::new(&mut buf);
    w.write_u8(HEAD).unwrap();
    w.write_u16(0x0102).unwrap();
    w.write_xor().unwrap();
    w.write_u8(TAIL).unwrap();
    let built = w.to_vec();
    w.encode(&Identity).unwrap();
    assert_eq!(w.encoded(), built.as_slice());
    assert_eq!(Reader::new(w.encoded()).read_content(), built.as_slice());
}

#[test]
fn test_independent_writers_in_parallel() {
    let handles: Vec<_> = (0..4u16)
        .map(|i| {
            thread::spawn(move || {
                let mut loc = sample();
                loc.serial = i;
                let mut buf = BufferPool::shared().rent(256);
                let frame = encode_location(&loc, &mut buf).expect("encode");
                decode_location(&frame).expect("decode")
            })
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        assert_eq!(h.join().unwrap().serial, i as u16);
    }
}
