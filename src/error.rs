use std::path::PathBuf;

use crate::cycle::CyclePosition;
use crate::types::WhichRead;

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The identifier line of a cycle had no whitespace-delimited token.
    #[error("line {line}: identifier line is empty")]
    EmptyHeader { line: usize },

    #[error("input ends with an incomplete record ({lines} of {} lines)", CyclePosition::LEN)]
    TruncatedCycle { lines: usize },

    #[error("record {record} ({mate}) failed validation: {reason}")]
    InvalidRecord {
        record: usize,
        mate: WhichRead,
        reason: String,
    },

    #[error("refusing to overwrite nonempty file {}", .path.display())]
    Clobber { path: PathBuf },
}
