use bio::io::fastq;

use crate::types::ReadBuffer;

/// First whitespace-delimited token of an identifier line.
pub(crate) fn first_token(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

pub(crate) fn barcode_tags(barcode_line: &str) -> String {
    format!("\tVX:i:1\tBX:Z:{barcode_line}")
}

/// Rewrite a trailing `\r\n` (or a bare `\r` at end of input) as `\n`.
pub(crate) fn normalize_line_ending(line: &mut String) {
    let content = line.trim_end_matches('\n').trim_end_matches('\r').len();
    if content < line.len() && line[content..].contains('\r') {
        line.truncate(content);
        line.push('\n');
    }
}

fn strip_newline(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

pub(crate) fn check_read(read: &ReadBuffer) -> Result<(), String> {
    // the header keeps its tags; bio only cares that the id is present
    let record = fastq::Record::with_attrs(
        strip_newline(read.header()),
        None,
        strip_newline(read.sequence()).as_bytes(),
        strip_newline(read.quality()).as_bytes(),
    );
    record.check().map_err(str::to_owned)
}
