use std::fmt;

/// One mate's record as it is assembled: `[header+tags, sequence, "+\n", quality]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ReadBuffer {
    lines: Vec<String>,
}

impl ReadBuffer {
    pub(crate) fn push(&mut self, line: &str) {
        self.lines.push(line.to_owned());
    }

    /// Extend the header element in place. A no-op if no header was stored yet.
    pub(crate) fn append_to_header(&mut self, suffix: &str) {
        if let Some(header) = self.lines.first_mut() {
            header.push_str(suffix);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }

    pub(crate) fn header(&self) -> &str {
        self.line(0)
    }

    pub(crate) fn sequence(&self) -> &str {
        self.line(1)
    }

    pub(crate) fn quality(&self) -> &str {
        self.line(3)
    }

    fn line(&self, index: usize) -> &str {
        self.lines.get(index).map(String::as_str).unwrap_or("")
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        self.lines.concat().into_bytes()
    }
}

pub(crate) type RecordPair = (ReadBuffer, ReadBuffer);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WhichRead {
    FORWARD,
    REVERSE,
}

impl WhichRead {
    /// Suffix appended to the read identifier.
    pub(crate) fn suffix(&self) -> &'static str {
        match self {
            WhichRead::FORWARD => "/1",
            WhichRead::REVERSE => "/2",
        }
    }
}

impl fmt::Display for WhichRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhichRead::FORWARD => write!(f, "read 1"),
            WhichRead::REVERSE => write!(f, "read 2"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) lines_read: usize,
    pub(crate) pairs_written: usize,
    pub(crate) lines_dropped: usize,
}
