//! Reader fuzz target: drive a Reader over arbitrary bytes with an opcode stream taken from
//! the input itself. No read may panic; failures must come back as errors.
//! Build with: cargo fuzz run reader_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let (ops, body) = data.split_at(data.len().min(16));
    let mut r = wirecursor::Reader::new(body);
    for &op in ops {
        let arg = (op >> 4) as usize;
        let _ = match op & 0x0F {
            0 => r.read_u8().map(drop),
            1 => r.read_u16().map(drop),
            2 => r.read_u24().map(drop),
            3 => r.read_u32().map(drop),
            4 => r.read_i64().map(drop),
            5 => r.read_bcd(arg, op & 0x80 != 0).map(drop),
            6 => r.read_ascii(arg).map(drop),
            7 => r.read_unicode(arg).map(drop),
            8 => r.read_hex(arg).map(drop),
            9 => r.read_big_number(arg).map(drop),
            10 => r.skip(arg),
            11 => r.read_range(arg, arg * 2).map(drop),
            12 => r.read_content_to(arg).map(drop),
            13 => r.peek_u64().map(drop),
            14 => r.read_nibbles().map(drop),
            _ => r.read_fixed_u24().map(drop),
        };
    }
    let stuffing = wirecursor::ByteStuffing::new(0x7D).with_rule(0x7E, 0x02).with_rule(0x7D, 0x01);
    let _ = stuffing.unstuff(body);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run reader_fuzz");
}
