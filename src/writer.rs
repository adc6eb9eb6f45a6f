use std::fs;
use std::fs::{File, OpenOptions};
use std::io;
use std::io::{BufWriter, Write};
use std::path::Path;

use clap::builder::PossibleValue;
use clap::ValueEnum;
use flate2::write::GzEncoder;
use flate2::Compression;
use strum::VariantArray;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, VariantArray)]
pub(crate) enum OutputCompression {
    Auto,
    Gzip,
    None,
}

impl OutputCompression {
    fn wants_gzip(&self, path: &Path) -> bool {
        match self {
            OutputCompression::Auto => match path.extension() {
                None => false,
                Some(ext) => ext == "gzip" || ext == "gz",
            },
            OutputCompression::Gzip => true,
            OutputCompression::None => false,
        }
    }
}

impl ValueEnum for OutputCompression {
    fn value_variants<'a>() -> &'a [Self] {
        Self::VARIANTS
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(match self {
            OutputCompression::Auto => PossibleValue::new("auto")
                .help("gzip when the output name ends in .gz or .gzip"),
            OutputCompression::Gzip => PossibleValue::new("gzip").help("always gzip"),
            OutputCompression::None => PossibleValue::new("none").help("write plain text"),
        })
    }
}

pub(crate) enum WriterMaybeGzip {
    GZIP(GzEncoder<File>),
    UNCOMPRESSED(File),
}

impl WriterMaybeGzip {
    /// Write the gzip trailer, if any, and flush the file.
    pub(crate) fn finish(self) -> io::Result<()> {
        match self {
            WriterMaybeGzip::GZIP(backer) => backer.finish()?.flush(),
            WriterMaybeGzip::UNCOMPRESSED(mut backer) => backer.flush(),
        }
    }
}

impl Write for WriterMaybeGzip {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            WriterMaybeGzip::GZIP(backer) => backer.write(buf),
            WriterMaybeGzip::UNCOMPRESSED(backer) => backer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            WriterMaybeGzip::GZIP(backer) => backer.flush(),
            WriterMaybeGzip::UNCOMPRESSED(backer) => backer.flush(),
        }
    }
}

/// Fail if `path` exists and is nonempty.
pub(crate) fn check_clobber(path: &Path) -> Result<()> {
    if fs::metadata(path).map(|meta| meta.len() > 0).unwrap_or(false) {
        return Err(Error::Clobber { path: path.to_path_buf() });
    }
    Ok(())
}

/// Open `path` for writing, truncating it. With `no_clobber`, a nonempty existing file is an error.
pub(crate) fn writer_maybe_gzip(path: &Path, compression: OutputCompression, no_clobber: bool)
                                -> Result<(BufWriter<WriterMaybeGzip>, bool)> {
    if no_clobber {
        check_clobber(path)?;
    }

    let file = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;

    // GzEncoder leaves mtime at zero, so reruns are byte-identical
    if compression.wants_gzip(path) {
        Ok((BufWriter::new(WriterMaybeGzip::GZIP(GzEncoder::new(file, Compression::default()))), true))
    } else {
        Ok((BufWriter::new(WriterMaybeGzip::UNCOMPRESSED(file)), false))
    }
}

pub(crate) fn finish_writer(writer: BufWriter<WriterMaybeGzip>) -> io::Result<()> {
    writer.into_inner().map_err(|err| err.into_error())?.finish()
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::MultiGzDecoder;

    use super::*;

    #[test]
    fn gzip_chosen_by_extension() {
        assert!(OutputCompression::Auto.wants_gzip(Path::new("a.R1.fq.gz")));
        assert!(OutputCompression::Auto.wants_gzip(Path::new("a.gzip")));
        assert!(!OutputCompression::Auto.wants_gzip(Path::new("a.fq")));
        assert!(OutputCompression::Gzip.wants_gzip(Path::new("a.fq")));
        assert!(!OutputCompression::None.wants_gzip(Path::new("a.fq.gz")));
    }

    #[test]
    fn writes_gzip_with_trailer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.fq.gz");
        let (mut writer, was_compressed) = writer_maybe_gzip(&path, OutputCompression::Auto, false).unwrap();
        assert!(was_compressed);
        writer.write_all(b"@A/1\nACGT\n+\nIIII\n").unwrap();
        finish_writer(writer).unwrap();

        let mut text = String::new();
        MultiGzDecoder::new(File::open(&path).unwrap()).read_to_string(&mut text).unwrap();
        assert_eq!(text, "@A/1\nACGT\n+\nIIII\n");
    }

    #[test]
    fn overwrites_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.fq");
        fs::write(&path, "a much longer stale content\n").unwrap();

        let (mut writer, _) = writer_maybe_gzip(&path, OutputCompression::Auto, false).unwrap();
        writer.write_all(b"new\n").unwrap();
        finish_writer(writer).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn no_clobber_refuses_nonempty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.fq");
        fs::write(&path, "keep me\n").unwrap();

        let result = writer_maybe_gzip(&path, OutputCompression::Auto, true);
        assert!(matches!(result, Err(Error::Clobber { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep me\n");
    }

    #[test]
    fn empty_or_missing_file_is_not_clobbered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.fq");
        assert!(check_clobber(&path).is_ok());
        fs::write(&path, "").unwrap();
        assert!(check_clobber(&path).is_ok());
    }
}
