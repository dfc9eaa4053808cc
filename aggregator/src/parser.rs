use memchr::memchr;

use crate::error::{DecodeError, ParseError};
use crate::value::Tenths;

pub const SEMICOLON: u8 = b';';

/// One decoded `<key>;<value>` line. The key borrows from the read buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub key: &'a [u8],
    pub value: Tenths,
}

/// Splits a line (without its newline) at the first `;` and decodes the
/// value.
///
/// With `validate` off the value goes through [`Tenths::decode`], which
/// trusts the digits and only rejects impossible lengths.
#[inline]
pub fn parse(line: &[u8], validate: bool) -> Result<Record<'_>, ParseError> {
    let delim = memchr(SEMICOLON, line).ok_or(ParseError::MissingDelimiter)?;
    let (key, value) = (&line[..delim], &line[delim + 1..]);
    if key.is_empty() {
        return Err(ParseError::EmptyKey);
    }
    let value = if validate {
        Tenths::decode_checked(value)?
    } else {
        Tenths::decode(value).ok_or(DecodeError::Shape { len: value.len() })?
    };
    Ok(Record { key, value })
}
