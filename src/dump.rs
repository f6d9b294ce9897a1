//! Hex rendering of byte ranges (field text and log/dump output).

/// Uppercase hex, two characters per byte, no separator: `[0x7E, 0x01]` -> `"7E01"`.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

/// Uppercase hex with a space between bytes, for logs and terminal output.
pub fn to_hex_spaced(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{:02X}", b));
    }
    out
}

/// Multi-line dump: 16 bytes per line prefixed with the offset, e.g. `0010: 7E 01 ...`.
pub fn dump_lines(bytes: &[u8]) -> String {
    bytes
        .chunks(16)
        .enumerate()
        .map(|(i, chunk)| format!("{:04X}: {}", i * 16, to_hex_spaced(chunk)))
        .collect::<Vec<_>>()
        .join("\n")
}
