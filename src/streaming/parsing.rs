//! Bounded grammar scans for value classification.
//!
//! These replace pattern matching for the handful of literal forms the
//! pipeline cares about. All scans are single passes over the bytes with
//! no allocation.

use memchr::memchr_iter;

/// Shape of a numeric literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberLiteral {
    /// `[+-]?digits`
    Integer,
    /// `[+-]?digits.digits`
    Decimal,
}

/// Count ASCII digits at the start of `bytes`.
#[inline(always)]
fn digit_run(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Classify `s` as an integer or decimal literal, or neither.
///
/// Exactly `^[+-]?\d+$` or `^[+-]?\d+\.\d+$`: no exponent, no leading or
/// trailing dot, no surrounding whitespace.
#[inline]
pub fn classify_number(s: &str) -> Option<NumberLiteral> {
    let bytes = s.as_bytes();
    let body = match bytes.first()? {
        b'+' | b'-' => &bytes[1..],
        _ => bytes,
    };

    let int_len = digit_run(body);
    if int_len == 0 {
        return None;
    }
    let rest = &body[int_len..];
    if rest.is_empty() {
        return Some(NumberLiteral::Integer);
    }
    if rest[0] != b'.' {
        return None;
    }
    let frac = &rest[1..];
    let frac_len = digit_run(frac);
    if frac_len > 0 && frac_len == frac.len() {
        Some(NumberLiteral::Decimal)
    } else {
        None
    }
}

/// True if `s` is an unsigned integer or decimal literal whose value is zero.
///
/// Matches `0`, `000`, `0.0`, `00.000`; signed forms are not zero literals.
#[inline]
pub fn is_zero_literal(s: &str) -> bool {
    if s.starts_with(['+', '-']) {
        return false;
    }
    classify_number(s).is_some() && s.bytes().all(|b| b == b'0' || b == b'.')
}

/// True if `s` is empty or whitespace only, including runs of line breaks.
#[inline]
pub fn is_blank(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

/// Count occurrences of an ASCII byte.
#[inline]
pub fn count_byte(haystack: &[u8], needle: u8) -> usize {
    memchr_iter(needle, haystack).count()
}
