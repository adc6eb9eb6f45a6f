use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::bufread::MultiGzDecoder;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub(crate) enum ReaderMaybeGzip {
    GZIP(MultiGzDecoder<BufReader<File>>),
    UNCOMPRESSED(BufReader<File>),
}

impl Read for ReaderMaybeGzip {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ReaderMaybeGzip::GZIP(backer) => backer.read(buf),
            ReaderMaybeGzip::UNCOMPRESSED(backer) => backer.read(buf),
        }
    }
}

/// Open `path`, decompressing if it starts with the gzip magic. The flag reports whether it did.
pub(crate) fn reader_maybe_gzip(path: &Path) -> io::Result<(BufReader<ReaderMaybeGzip>, bool)> {
    let mut reader = BufReader::new(File::open(path)?);
    let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);

    if is_gzip {
        Ok((BufReader::new(ReaderMaybeGzip::GZIP(MultiGzDecoder::new(reader))), true))
    } else {
        Ok((BufReader::new(ReaderMaybeGzip::UNCOMPRESSED(reader)), false))
    }
}
