//! Canonical JSON re-encoding used to size `/process` payloads.
//!
//! Output matches the legacy service's default encoder byte for byte:
//! `", "` and `": "` separators, keys in input order, everything outside
//! printable ASCII escaped as `\uXXXX`, integers kept digit for digit, and
//! floats in shortest round-trip form with a signed, two-digit exponent
//! outside `1e-4 <= |v| < 1e16`.

use std::borrow::Cow;
use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;

/// Formatter producing the canonical text form.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_f32<W>(&mut self, writer: &mut W, value: f32) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.write_f64(writer, f64::from(value))
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(format_float(value).as_bytes())
    }

    fn write_number_str<W>(&mut self, writer: &mut W, value: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(normalize_number(value).as_bytes())
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.bytes().all(is_printable_ascii) {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() && is_printable_ascii(ch as u8) {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Control characters never reach a fragment; DEL does.
fn is_printable_ascii(byte: u8) -> bool {
    byte < 0x7f
}

/// Re-render number text as parsed.
///
/// Integer-shaped text stays exact (`-0` becomes `0`); anything with a
/// fraction or exponent goes through f64.
fn normalize_number(text: &str) -> Cow<'_, str> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        if digits.bytes().all(|b| b == b'0') {
            return Cow::Borrowed("0");
        }
        return Cow::Borrowed(text);
    }

    match text.parse::<f64>() {
        Ok(value) => Cow::Owned(format_float(value)),
        Err(_) => Cow::Borrowed(text),
    }
}

/// Shortest round-trip float text, switching to exponent form outside
/// `1e-4 <= |v| < 1e16`.
fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        // Overflowing literals such as 1e400.
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if value != 0.0 && !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    }

    let plain = value.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{}.0", plain)
    }
}

/// Encode a value in canonical form.
pub fn encode(value: &Value) -> serde_json::Result<String> {
    let mut out = Vec::with_capacity(128);
    value.serialize(&mut Serializer::with_formatter(&mut out, CanonicalFormatter))?;
    // Every byte written is ASCII.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Byte length of the canonical encoding.
pub fn encoded_len(value: &Value) -> serde_json::Result<usize> {
    encode(value).map(|text| text.len())
}

/// Parse JSON text, also accepting unpaired UTF-16 surrogate escapes.
///
/// An unpaired `\uD800`-`\uDFFF` escape is read as U+FFFD, whose canonical
/// form is an escape of the same width.
pub fn from_slice(input: &[u8]) -> serde_json::Result<Value> {
    match serde_json::from_slice(input) {
        Ok(value) => Ok(value),
        Err(e) => match replace_lone_surrogates(input) {
            Some(patched) => serde_json::from_slice(&patched),
            None => Err(e),
        },
    }
}

/// Rewrite unpaired surrogate escapes as `\ufffd`. `None` if there are none.
fn replace_lone_surrogates(input: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len());
    let mut replaced = false;
    let mut i = 0;

    while i < input.len() {
        if input[i] != b'\\' || i + 1 == input.len() {
            out.push(input[i]);
            i += 1;
            continue;
        }

        let Some(unit) = escaped_unit(input, i) else {
            // Some other escape; copy it whole so `\\u` is not misread.
            out.extend_from_slice(&input[i..i + 2]);
            i += 2;
            continue;
        };

        match unit {
            0xD800..=0xDBFF if matches!(escaped_unit(input, i + 6), Some(0xDC00..=0xDFFF)) => {
                out.extend_from_slice(&input[i..i + 12]);
                i += 12;
            }
            0xD800..=0xDFFF => {
                out.extend_from_slice(b"\\ufffd");
                replaced = true;
                i += 6;
            }
            _ => {
                out.extend_from_slice(&input[i..i + 6]);
                i += 6;
            }
        }
    }

    replaced.then_some(out)
}

/// Code unit of a `\uXXXX` escape starting at `at`.
fn escaped_unit(input: &[u8], at: usize) -> Option<u16> {
    let escape = input.get(at..at + 6)?;
    if !escape.starts_with(b"\\u") || !escape[2..].iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let hex = std::str::from_utf8(&escape[2..]).ok()?;
    u16::from_str_radix(hex, 16).ok()
}
