/// Default read buffer size. Large enough to amortize read calls, small
/// enough to stay in L2 on most machines.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1 << 20;

/// What to do with bytes left over when the source ends without a final
/// newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingLine {
    /// Treat the leftover bytes as one last complete line.
    #[default]
    Process,
    /// Discard them (logged at warn level).
    Drop,
}

/// What to do with a line the parser rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Stop ingestion with [`crate::Error::Malformed`].
    #[default]
    Abort,
    /// Count the line as skipped and keep going.
    Skip,
}

/// Knobs for one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub buffer_capacity: usize,
    pub trailing_line: TrailingLine,
    pub on_malformed: MalformedPolicy,
    /// Check every digit of every value. When off, only the value length is
    /// checked and non-digit bytes decode to an unspecified number.
    pub validate: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            trailing_line: TrailingLine::default(),
            on_malformed: MalformedPolicy::default(),
            validate: true,
        }
    }
}

impl Options {
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self
    }

    pub fn trailing_line(mut self, policy: TrailingLine) -> Self {
        self.trailing_line = policy;
        self
    }

    pub fn on_malformed(mut self, policy: MalformedPolicy) -> Self {
        self.on_malformed = policy;
        self
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}
