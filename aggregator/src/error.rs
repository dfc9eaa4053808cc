use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a value failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("value of {len} bytes matches no `[-]D{{1,2}}.D` shape")]
    Shape { len: usize },
    #[error("expected a digit at value offset {pos}, found byte {byte:#04x}")]
    Digit { pos: usize, byte: u8 },
    #[error("expected '.' at value offset {pos}")]
    Period { pos: usize },
}

/// Why a line failed to parse into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no ';' delimiter")]
    MissingDelimiter,
    #[error("empty key")]
    EmptyKey,
    #[error(transparent)]
    Value(#[from] DecodeError),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("read failed after {offset} bytes")]
    Read {
        offset: u64,
        #[source]
        source: io::Error,
    },
    #[error("line starting at byte {offset} does not fit in the {capacity}-byte read buffer")]
    LineTooLong { offset: u64, capacity: usize },
    #[error("malformed record on line {line}")]
    Malformed {
        line: u64,
        #[source]
        source: ParseError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
