//! Helpers for rendering binary segments in logs and summaries.

use std::fmt::Write as _;

/// Returns `true` for bytes rendered verbatim in previews.
#[inline]
#[must_use]
pub fn is_printable(byte: u8) -> bool {
    byte.is_ascii_graphic() || byte == b' '
}

/// Appends `byte` to `out`, escaping anything that is not printable ASCII.
pub fn escape_byte(byte: u8, out: &mut String) {
    match byte {
        b'\\' => out.push_str("\\\\"),
        b'\n' => out.push_str("\\n"),
        b'\r' => out.push_str("\\r"),
        b'\t' => out.push_str("\\t"),
        b if is_printable(b) => out.push(b as char),
        b => {
            let _ = write!(out, "\\x{b:02x}");
        }
    }
}

/// Escaped, quoted rendering of at most `max` leading bytes of `bytes`.
///
/// Truncated input is suffixed with the number of bytes left out.
#[must_use]
pub fn preview(bytes: &[u8], max: usize) -> String {
    let shown = &bytes[..bytes.len().min(max)];
    let mut out = String::with_capacity(shown.len() + 2);
    out.push('"');
    for &byte in shown {
        escape_byte(byte, &mut out);
    }
    out.push('"');
    if bytes.len() > shown.len() {
        let _ = write!(out, " (+{} bytes)", bytes.len() - shown.len());
    }
    out
}

/// Lowercase hex rendering of at most `max` leading bytes.
#[must_use]
pub fn hex_preview(bytes: &[u8], max: usize) -> String {
    let shown = &bytes[..bytes.len().min(max)];
    let mut out = String::with_capacity(shown.len() * 3);
    for (i, byte) in shown.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02x}");
    }
    if bytes.len() > shown.len() {
        out.push_str(" ..");
    }
    out
}

/// Fraction of printable bytes, used to pick a preview style.
#[must_use]
pub fn printable_ratio(bytes: &[u8]) -> f64 {
    if bytes.is_empty() {
        return 1.0;
    }
    let printable = bytes.iter().filter(|&&b| is_printable(b)).count();
    printable as f64 / bytes.len() as f64
}
