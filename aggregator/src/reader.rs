//! Block reader that hands out whole lines only.
//!
//! Each round performs one `read` into a fixed buffer, cuts the filled region
//! at its last newline and yields everything before the cut. The bytes after
//! the cut are the start of a line whose end has not been read yet; they are
//! moved to the front of the buffer before the next read.

use std::io::{self, Read};

use memchr::{memchr, memrchr};
use tracing::{debug, warn};

use crate::config::TrailingLine;
use crate::error::{Error, Result};

pub const NEWLINE: u8 = b'\n';

pub struct ChunkReader<R> {
    source: R,
    buf: Box<[u8]>,
    /// Carried-over bytes at the start of `buf`.
    carry: usize,
    /// Valid bytes in `buf`.
    filled: usize,
    /// End of the region handed out by the last batch.
    consumed: usize,
    /// Bytes read from `source` so far.
    offset: u64,
    trailing: TrailingLine,
    done: bool,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(source: R, capacity: usize, trailing: TrailingLine) -> Self {
        Self {
            source,
            buf: vec![0; capacity.max(1)].into_boxed_slice(),
            carry: 0,
            filled: 0,
            consumed: 0,
            offset: 0,
            trailing,
            done: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Total bytes pulled from the source.
    pub fn bytes_read(&self) -> u64 {
        self.offset
    }

    /// Returns the next run of complete lines, or `None` at end of input.
    ///
    /// A batch may be empty when a read returned bytes without a newline;
    /// those bytes stay buffered for the next call.
    pub fn next_batch(&mut self) -> Result<Option<Batch<'_>>> {
        if self.done {
            return Ok(None);
        }
        self.compact();
        if self.carry == self.buf.len() {
            // a full buffer without a newline is only valid as the last line
            let mut next = [0u8; 1];
            if read_some(&mut self.source, &mut next, self.offset)? != 0 {
                return Err(Error::LineTooLong {
                    offset: self.offset - self.carry as u64,
                    capacity: self.buf.len(),
                });
            }
            return Ok(self.finish());
        }

        if self.fill()? == 0 {
            return Ok(self.finish());
        }

        let fresh = self.carry;
        let end = match memrchr(NEWLINE, &self.buf[fresh..self.filled]) {
            Some(pos) => fresh + pos + 1,
            None => 0,
        };
        self.consumed = end;
        debug!(complete = end, carry = self.filled - end, "batch");
        Ok(Some(Batch::new(&self.buf[..end])))
    }

    /// Moves the unconsumed tail of the buffer to offset 0.
    pub fn compact(&mut self) {
        self.buf.copy_within(self.consumed..self.filled, 0);
        self.carry = self.filled - self.consumed;
        self.filled = self.carry;
        self.consumed = 0;
    }

    /// Bytes currently carried over, i.e. the start of an incomplete line.
    #[cfg(test)]
    fn pending(&self) -> &[u8] {
        &self.buf[self.consumed..self.filled]
    }

    fn fill(&mut self) -> Result<usize> {
        let n = read_some(&mut self.source, &mut self.buf[self.filled..], self.offset)?;
        self.filled += n;
        self.offset += n as u64;
        Ok(n)
    }

    /// End of input: hands out or drops the carried-over bytes per policy.
    fn finish(&mut self) -> Option<Batch<'_>> {
        self.done = true;
        if self.carry == 0 {
            return None;
        }
        self.consumed = self.carry;
        match self.trailing {
            TrailingLine::Process => {
                debug!(bytes = self.carry, "processing unterminated last line");
                Some(Batch::new(&self.buf[..self.carry]))
            }
            TrailingLine::Drop => {
                warn!(bytes = self.carry, "dropping unterminated last line");
                None
            }
        }
    }
}

/// One `read`, retried on `Interrupted`.
fn read_some<R: Read>(source: &mut R, dst: &mut [u8], offset: u64) -> Result<usize> {
    loop {
        match source.read(dst) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => return Err(Error::Read { offset, source }),
        }
    }
}

/// A region of the read buffer holding only complete lines.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    region: &'a [u8],
}

impl<'a> Batch<'a> {
    fn new(region: &'a [u8]) -> Self {
        Self { region }
    }

    #[cfg(test)]
    fn as_bytes(&self) -> &'a [u8] {
        self.region
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    pub fn lines(&self) -> Lines<'a> {
        Lines { rest: self.region }
    }
}

/// Lines of a batch, without their terminating newline.
pub struct Lines<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    #[inline]
    fn next(&mut self) -> Option<&'a [u8]> {
        if self.rest.is_empty() {
            return None;
        }
        match memchr(NEWLINE, self.rest) {
            Some(i) => {
                let line = &self.rest[..i];
                self.rest = &self.rest[i + 1..];
                Some(line)
            }
            None => Some(std::mem::take(&mut self.rest)),
        }
    }
}
