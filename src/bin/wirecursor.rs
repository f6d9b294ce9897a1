//! Frame helper: checksums, BCD conversion, byte stuffing and hex dumps from the terminal.
//!
//! Usage:
//!   wirecursor [--verbose] xor HEX            append the XOR of bytes 1.. (head byte skipped)
//!   wirecursor [--verbose] bcd DIGITS LEN     pack DIGITS into LEN BCD digits
//!   wirecursor [--verbose] unbcd HEX [--keep-zeros]
//!   wirecursor [--verbose] stuff HEX --escape=7D --rule=7E:02 --rule=7D:01
//!   wirecursor [--verbose] unstuff HEX --escape=7D --rule=7E:02 --rule=7D:01
//!   wirecursor dump [HEX]                     16 bytes per line; reads stdin without HEX
//!
//! HEX may contain spaces and a leading `0x`.

use anyhow::{anyhow, bail, Context};
use std::io::{self, Read};
use wirecursor::codec::hex_text_bytes;
use wirecursor::dump::{dump_lines, to_hex_spaced};
use wirecursor::{ByteStuffing, FrameTransform, Reader, Writer};

fn take_flag(args: &mut Vec<String>, names: &[&str]) -> bool {
    match args.iter().position(|a| names.contains(&a.as_str())) {
        Some(pos) => {
            args.remove(pos);
            true
        }
        None => false,
    }
}

fn take_values(args: &mut Vec<String>, prefix: &str) -> Vec<String> {
    let mut out = Vec::new();
    while let Some(pos) = args.iter().position(|a| a.starts_with(prefix)) {
        let arg = args.remove(pos);
        out.push(arg[prefix.len()..].to_string());
    }
    out
}

fn parse_hex_byte(s: &str) -> anyhow::Result<u8> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u8::from_str_radix(s, 16).with_context(|| format!("invalid hex byte {:?}", s))
}

fn stuffing_from_args(args: &mut Vec<String>) -> anyhow::Result<ByteStuffing> {
    let escape = take_values(args, "--escape=")
        .pop()
        .ok_or_else(|| anyhow!("--escape=XX is required"))?;
    let mut stuffing = ByteStuffing::new(parse_hex_byte(&escape)?);
    for rule in take_values(args, "--rule=") {
        let (raw, code) = rule
            .split_once(':')
            .ok_or_else(|| anyhow!("rule {:?} must look like RAW:CODE", rule))?;
        stuffing = stuffing.with_rule(parse_hex_byte(raw)?, parse_hex_byte(code)?);
    }
    Ok(stuffing)
}

fn input_bytes(arg: Option<&String>) -> anyhow::Result<Vec<u8>> {
    let text = match arg {
        Some(s) => s.clone(),
        None => {
            let mut s = String::new();
            io::stdin().read_to_string(&mut s)?;
            s.split_whitespace().collect::<Vec<_>>().join("")
        }
    };
    Ok(hex_text_bytes(&text, None)?)
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let verbose = take_flag(&mut args, &["--verbose", "-v"]);
    let keep_zeros = take_flag(&mut args, &["--keep-zeros"]);
    if args.is_empty() {
        bail!("usage: wirecursor [--verbose] (xor|bcd|unbcd|stuff|unstuff|dump) ...");
    }
    let command = args.remove(0);

    match command.as_str() {
        "xor" => {
            let bytes = input_bytes(args.first())?;
            let mut buf = vec![0u8; bytes.len() + 1];
            let mut w = Writer::new(&mut buf);
            w.write_array(&bytes)?;
            let sum = w.write_xor()?;
            if verbose {
                eprintln!("checksum over {} byte(s): {:02X}", bytes.len().saturating_sub(1), sum);
            }
            println!("{}", w.hex_dump());
        }
        "bcd" => {
            let digits = args.first().ok_or_else(|| anyhow!("bcd: DIGITS missing"))?;
            let len: usize = match args.get(1) {
                Some(s) => s.parse().with_context(|| format!("bcd: invalid LEN {:?}", s))?,
                None => digits.len() + digits.len() % 2,
            };
            let mut buf = vec![0u8; len / 2];
            let mut w = Writer::new(&mut buf);
            w.write_bcd(digits, len)?;
            if verbose {
                eprintln!("{} digit(s) in {} byte(s)", len, w.position());
            }
            println!("{}", w.hex_dump());
        }
        "unbcd" => {
            let bytes = input_bytes(args.first())?;
            let mut r = Reader::new(&bytes);
            println!("{}", r.read_bcd(bytes.len() * 2, !keep_zeros)?);
        }
        "stuff" => {
            let stuffing = stuffing_from_args(&mut args)?;
            let bytes = input_bytes(args.first())?;
            let mut out = vec![0u8; bytes.len() * 2];
            let n = stuffing.transform(&bytes, &mut out)?;
            if verbose {
                eprintln!("{} -> {} byte(s)", bytes.len(), n);
            }
            println!("{}", to_hex_spaced(&out[..n]));
        }
        "unstuff" => {
            let stuffing = stuffing_from_args(&mut args)?;
            let bytes = input_bytes(args.first())?;
            let raw = stuffing.unstuff(&bytes)?;
            if verbose {
                eprintln!("{} -> {} byte(s)", bytes.len(), raw.len());
            }
            println!("{}", to_hex_spaced(&raw));
        }
        "dump" => {
            let bytes = input_bytes(args.first())?;
            println!("{}", dump_lines(&bytes));
        }
        other => bail!("unknown command {:?}", other),
    }
    Ok(())
}
