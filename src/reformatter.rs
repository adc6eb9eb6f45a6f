use std::io::{BufRead, Write};
use std::mem;

use clap::builder::PossibleValue;
use clap::ValueEnum;
use indicatif::ProgressBar;
use log::{debug, warn};
use strum::VariantArray;

use crate::cycle::CyclePosition;
use crate::error::{Error, Result};
use crate::types::{RecordPair, Summary, WhichRead};
use crate::util::{barcode_tags, check_read, first_token, normalize_line_ending};

const PROGRESS_INTERVAL: usize = 10_000;

/// What to do with lines left over after the last complete 9-line block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, VariantArray)]
pub(crate) enum TrailingPolicy {
    Drop,
    Error,
}

impl ValueEnum for TrailingPolicy {
    fn value_variants<'a>() -> &'a [Self] {
        Self::VARIANTS
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(match self {
            TrailingPolicy::Drop => PossibleValue::new("drop")
                .help("discard an incomplete final record with a warning"),
            TrailingPolicy::Error => PossibleValue::new("error")
                .help("fail if the input ends in the middle of a record"),
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct RunOptions {
    pub(crate) trailing: TrailingPolicy,
    pub(crate) validate: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            trailing: TrailingPolicy::Drop,
            validate: false,
        }
    }
}

/// Line-at-a-time state machine turning 9-line interleaved blocks into a pair of FASTQ records.
pub(crate) struct Reformatter {
    position: CyclePosition,
    buffers: RecordPair,
    lines_read: usize,
}

impl Default for Reformatter {
    fn default() -> Self {
        Reformatter {
            position: CyclePosition::first(),
            buffers: Default::default(),
            lines_read: 0,
        }
    }
}

impl Reformatter {
    /// Consume one raw input line (newline included). Returns the finished pair on the block's last line.
    pub(crate) fn feed_line(&mut self, line: &str) -> Result<Option<RecordPair>> {
        self.lines_read += 1;
        let (read1, read2) = &mut self.buffers;

        match self.position {
            CyclePosition::Header => {
                let id = first_token(line).ok_or(Error::EmptyHeader { line: self.lines_read })?;
                read1.push(&format!("{id}{}", WhichRead::FORWARD.suffix()));
                read2.push(&format!("{id}{}", WhichRead::REVERSE.suffix()));
            }
            CyclePosition::Read1Sequence => {
                read1.push(line);
                read1.push("+\n");
            }
            CyclePosition::Read1Quality => read1.push(line),
            CyclePosition::Read2Sequence => {
                read2.push(line);
                read2.push("+\n");
            }
            CyclePosition::Read2Quality => read2.push(line),
            CyclePosition::Barcode => {
                let tags = barcode_tags(line);
                read1.append_to_header(&tags);
                read2.append_to_header(&tags);
            }
            CyclePosition::Unused7 | CyclePosition::Unused8 => {}
            CyclePosition::Terminator => {
                debug_assert!(read1.len() == 4 && read2.len() == 4);
            }
        }

        let completed = match self.position {
            CyclePosition::Terminator => Some(mem::take(&mut self.buffers)),
            _ => None,
        };
        self.position = self.position.next();
        Ok(completed)
    }

    pub(crate) fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// Lines of an incomplete block still buffered; they are discarded.
    pub(crate) fn finish(self) -> usize {
        self.position.index() - 1
    }
}

fn validate_pair(pair: &RecordPair, record: usize) -> Result<()> {
    for (read, mate) in [(&pair.0, WhichRead::FORWARD), (&pair.1, WhichRead::REVERSE)] {
        check_read(read).map_err(|reason| Error::InvalidRecord {
            record,
            mate,
            reason,
        })?;
    }
    Ok(())
}

/// Split an interleaved stream into read-1 and read-2 outputs.
pub(crate) fn reformat<R: BufRead, W1: Write, W2: Write>(mut input: R, r1: &mut W1, r2: &mut W2,
                                                         options: RunOptions, progress: &ProgressBar)
                                                         -> Result<Summary> {
    let mut reformatter = Reformatter::default();
    let mut summary = Summary::default();
    let mut line = String::new();

    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        normalize_line_ending(&mut line);

        let Some(pair) = reformatter.feed_line(&line)? else { continue };
        summary.pairs_written += 1;
        if options.validate {
            validate_pair(&pair, summary.pairs_written)?;
        }
        debug!("record {}: {}", summary.pairs_written, pair.0.header().trim_end());

        r1.write_all(&pair.0.to_bytes())?;
        r2.write_all(&pair.1.to_bytes())?;

        if summary.pairs_written % PROGRESS_INTERVAL == 0 {
            progress.set_message(format!("{} pairs", summary.pairs_written));
            progress.tick();
        }
    }

    r1.flush()?;
    r2.flush()?;

    summary.lines_read = reformatter.lines_read();
    summary.lines_dropped = reformatter.finish();
    if summary.lines_dropped > 0 {
        match options.trailing {
            TrailingPolicy::Drop => warn!("dropping incomplete final record ({} of {} lines)",
                                          summary.lines_dropped, CyclePosition::LEN),
            TrailingPolicy::Error => return Err(Error::TruncatedCycle { lines: summary.lines_dropped }),
        }
    }

    Ok(summary)
}
