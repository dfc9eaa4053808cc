//! Fixed-point codec for measurement values.
//!
//! Every value in the input has the textual form `[-]D{1,2}.D`: one or two
//! integer digits, a literal `.` and exactly one fractional digit. Values are
//! carried around as tenths in an `i16`, so `-99.9..=99.9` maps onto
//! `-999..=999` and no floating point is ever involved.

use std::fmt;

use crate::error::DecodeError;

pub const MINUS: u8 = b'-';
pub const PERIOD: u8 = b'.';
pub const ZERO: u8 = b'0';

/// Largest magnitude representable in the input encoding, in tenths.
pub const MAX_TENTHS: i16 = 999;

/// Longest encoded value (`-99.9`).
pub const MAX_ENCODED_LEN: usize = 5;

/// A decimal with exactly one fractional digit, scaled by 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tenths(i16);

/// The four textual layouts a value can take.
///
/// The layout is fully determined by the value length and its first byte,
/// which is the same as measuring the distance from the `;` delimiter to the
/// end of the line (4, 5 or 6 bytes including the delimiter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `D.D`
    OneDigit,
    /// `DD.D`
    TwoDigits,
    /// `-D.D`
    NegOneDigit,
    /// `-DD.D`
    NegTwoDigits,
}

impl Shape {
    /// Decision table:
    ///
    /// | len | first byte | shape          |
    /// |-----|------------|----------------|
    /// | 3   | any        | `D.D`          |
    /// | 4   | `-`        | `-D.D`         |
    /// | 4   | other      | `DD.D`         |
    /// | 5   | `-`        | `-DD.D`        |
    /// | 5   | other      | none           |
    /// | *   | *          | none           |
    #[inline]
    pub fn classify(bytes: &[u8]) -> Option<Shape> {
        match (bytes.len(), bytes.first()) {
            (3, _) => Some(Shape::OneDigit),
            (4, Some(&MINUS)) => Some(Shape::NegOneDigit),
            (4, _) => Some(Shape::TwoDigits),
            (5, Some(&MINUS)) => Some(Shape::NegTwoDigits),
            _ => None,
        }
    }

    #[cfg(test)]
    fn encoded_len(self) -> usize {
        match self {
            Shape::OneDigit => 3,
            Shape::TwoDigits | Shape::NegOneDigit => 4,
            Shape::NegTwoDigits => 5,
        }
    }

    fn is_negative(self) -> bool {
        matches!(self, Shape::NegOneDigit | Shape::NegTwoDigits)
    }

    /// Byte positions of the digits and of the period for this shape.
    fn layout(self) -> (&'static [usize], usize) {
        match self {
            Shape::OneDigit => (&[0, 2], 1),
            Shape::TwoDigits => (&[0, 1, 3], 2),
            Shape::NegOneDigit => (&[1, 3], 2),
            Shape::NegTwoDigits => (&[1, 2, 4], 3),
        }
    }
}

#[inline]
fn digit(b: u8) -> i16 {
    b.wrapping_sub(ZERO) as i16
}

impl Tenths {
    /// Builds a value from raw tenths, rejecting anything outside the
    /// encodable range.
    pub fn new(tenths: i16) -> Option<Tenths> {
        (-MAX_TENTHS..=MAX_TENTHS)
            .contains(&tenths)
            .then_some(Tenths(tenths))
    }

    /// Clamps a wide intermediate (e.g. a mean) into the encodable range.
    pub(crate) fn saturating(tenths: i64) -> Tenths {
        Tenths(tenths.clamp(-MAX_TENTHS as i64, MAX_TENTHS as i64) as i16)
    }

    pub fn get(self) -> i16 {
        self.0
    }

    /// Decodes a value without looking at the digits themselves.
    ///
    /// Only the length and the sign byte are inspected; the digits are
    /// combined by subtracting `b'0'`. Bytes that are not digits produce an
    /// unspecified number, clamped to `-99.9..=99.9`. Returns `None` when the
    /// length does not match any shape.
    #[inline]
    pub fn decode(bytes: &[u8]) -> Option<Tenths> {
        let v = match Shape::classify(bytes)? {
            Shape::OneDigit => digit(bytes[0]) * 10 + digit(bytes[2]),
            Shape::TwoDigits => digit(bytes[0]) * 100 + digit(bytes[1]) * 10 + digit(bytes[3]),
            Shape::NegOneDigit => -(digit(bytes[1]) * 10 + digit(bytes[3])),
            Shape::NegTwoDigits => {
                -(digit(bytes[1]) * 100 + digit(bytes[2]) * 10 + digit(bytes[4]))
            }
        };
        Some(Tenths(v.clamp(-MAX_TENTHS, MAX_TENTHS)))
    }

    /// Decodes a value after checking every byte against its shape.
    pub fn decode_checked(bytes: &[u8]) -> Result<Tenths, DecodeError> {
        let shape = Shape::classify(bytes).ok_or(DecodeError::Shape { len: bytes.len() })?;
        let (digits, period) = shape.layout();
        if bytes[period] != PERIOD {
            return Err(DecodeError::Period { pos: period });
        }
        let mut acc: i16 = 0;
        for &pos in digits {
            let b = bytes[pos];
            if !b.is_ascii_digit() {
                return Err(DecodeError::Digit { pos, byte: b });
            }
            acc = acc * 10 + digit(b);
        }
        Ok(Tenths(if shape.is_negative() { -acc } else { acc }))
    }

    /// Appends the canonical encoding: optional `-`, the tens digit only when
    /// it is non-zero, the ones digit, `.`, the tenths digit.
    pub fn encode_into(self, out: &mut Vec<u8>) {
        let mut buf = [0u8; MAX_ENCODED_LEN + 1];
        let n = self.write_bytes(&mut buf);
        out.extend_from_slice(&buf[..n]);
    }

    fn write_bytes(self, buf: &mut [u8; MAX_ENCODED_LEN + 1]) -> usize {
        let mut cursor = 0;
        let mut n = self.0 as i32;
        if n < 0 {
            buf[cursor] = MINUS;
            cursor += 1;
            n = -n;
        }
        let d = n / 100;
        if d > 0 {
            buf[cursor] = ZERO + (d % 10) as u8;
            cursor += 1;
        }
        buf[cursor] = ZERO + (n / 10 % 10) as u8;
        buf[cursor + 1] = PERIOD;
        buf[cursor + 2] = ZERO + (n % 10) as u8;
        cursor + 3
    }
}

impl From<Tenths> for i64 {
    fn from(t: Tenths) -> i64 {
        t.0 as i64
    }
}

impl fmt::Display for Tenths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0u8; MAX_ENCODED_LEN + 1];
        let n = self.write_bytes(&mut buf);
        // only ASCII digits, '-' and '.' are ever written
        f.write_str(std::str::from_utf8(&buf[..n]).map_err(|_| fmt::Error)?)
    }
}
