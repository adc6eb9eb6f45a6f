use std::path::{Path, PathBuf};
use std::process::exit;

use anyhow::Context;
use clap::{ArgMatches, ValueHint};
use env_logger::Builder;
use indicatif::ProgressBar;
use log::{error, info, LevelFilter};
use pluralizer::pluralize;

use crate::reader::reader_maybe_gzip;
use crate::reformatter::{reformat, RunOptions, TrailingPolicy};
use crate::types::Summary;
use crate::writer::{check_clobber, finish_writer, writer_maybe_gzip, OutputCompression};

mod cycle;
mod error;
mod reader;
mod reformatter;
mod types;
mod util;
mod writer;

fn cli() -> clap::Command {
    clap::command!("bxsplit")
        .about("Split barcoded, interleaved 9-line paired reads into tagged read 1 / read 2 FASTQ files")
        .arg(clap::arg!(-'i' --"input" <"path"> "interleaved input (gzip is detected automatically)")
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath)
            .required(false)
            .default_value("1.fq.gz"))
        .arg(clap::arg!(-'1' --"out-r1" <"path"> "where to place read 1 records")
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath)
            .required(false)
            .default_value("1.R1.fq.gz"))
        .arg(clap::arg!(-'2' --"out-r2" <"path"> "where to place read 2 records")
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath)
            .required(false)
            .default_value("1.R2.fq.gz"))
        .arg(clap::arg!(--"compression" <"mode"> "how to compress the outputs")
            .value_parser(clap::value_parser!(OutputCompression))
            .required(false)
            .default_value("auto"))
        .arg(clap::arg!(--"trailing" <"policy"> "what to do if the input ends mid-record")
            .value_parser(clap::value_parser!(TrailingPolicy))
            .required(false)
            .default_value("drop"))
        .arg(clap::arg!(--"validate" "check that every emitted read has an id and matching sequence/quality lengths"))
        .arg(clap::arg!(--"no-clobber" "refuse to overwrite nonempty output files"))
        .arg(clap::arg!(-'q' --"quiet" "only report warnings and errors")
            .conflicts_with("verbose"))
        .arg(clap::arg!(-'v' --"verbose" "log every record"))
}

struct Config {
    input: PathBuf,
    outputs: (PathBuf, PathBuf),
    compression: OutputCompression,
    no_clobber: bool,
    options: RunOptions,
    log_level: LevelFilter,
}

impl Config {
    fn from_matches(args: &ArgMatches) -> Config {
        // every valued argument has a default, so these are always present
        let path = |id: &str| args.get_one::<PathBuf>(id).cloned().unwrap_or_default();

        let log_level = if args.get_flag("quiet") {
            LevelFilter::Warn
        } else if args.get_flag("verbose") {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };

        Config {
            input: path("input"),
            outputs: (path("out-r1"), path("out-r2")),
            compression: args.get_one::<OutputCompression>("compression").copied()
                .unwrap_or(OutputCompression::Auto),
            no_clobber: args.get_flag("no-clobber"),
            options: RunOptions {
                trailing: args.get_one::<TrailingPolicy>("trailing").copied().unwrap_or(TrailingPolicy::Drop),
                validate: args.get_flag("validate"),
            },
            log_level,
        }
    }
}

fn open_output(path: &Path, config: &Config)
               -> anyhow::Result<std::io::BufWriter<writer::WriterMaybeGzip>> {
    let (writer, was_compressed) = writer_maybe_gzip(path, config.compression, config.no_clobber)
        .with_context(|| format!("couldn't open output {} for writing", path.display()))?;
    if was_compressed { info!("writing {} as a gzip", path.display()) }
    Ok(writer)
}

fn run(config: &Config) -> anyhow::Result<Summary> {
    let (reader, was_compressed) = reader_maybe_gzip(&config.input)
        .with_context(|| format!("couldn't open {} for reading", config.input.display()))?;
    if was_compressed { info!("parsing {} as a gzip", config.input.display()) }

    if config.no_clobber {
        // both outputs are checked before either is truncated
        for path in [&config.outputs.0, &config.outputs.1] {
            check_clobber(path).with_context(|| format!("couldn't open output {} for writing", path.display()))?;
        }
    }
    let mut r1 = open_output(&config.outputs.0, config)?;
    let mut r2 = open_output(&config.outputs.1, config)?;

    let progress = if config.log_level < LevelFilter::Info {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };

    let result = reformat(reader, &mut r1, &mut r2, config.options, &progress);
    progress.finish_and_clear();

    // complete records stay readable even when the split itself fails
    let finished = (finish_writer(r1), finish_writer(r2));
    let summary = result.with_context(|| format!("couldn't split {}", config.input.display()))?;
    finished.0.with_context(|| format!("couldn't finish {}", config.outputs.0.display()))?;
    finished.1.with_context(|| format!("couldn't finish {}", config.outputs.1.display()))?;

    info!("split {} into {} and {}", pluralize("pair", summary.pairs_written as isize, true),
          config.outputs.0.display(), config.outputs.1.display());
    Ok(summary)
}

fn main() {
    let args = cli().get_matches();
    let config = Config::from_matches(&args);

    Builder::new()
        .filter_level(config.log_level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Err(err) = run(&config) {
        error!("{err:#}");
        exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};
    use std::io::{Read, Write};

    use flate2::read::MultiGzDecoder;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::*;

    const BLOCK: &str = "READ1 comment\nACGT\n####\nTTAA\n####\nAACCGGTT\nX\nY\nZ\n";

    fn write_gzip(path: &Path, text: &str) {
        let mut encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    fn read_gzip(path: &Path) -> String {
        let mut text = String::new();
        MultiGzDecoder::new(File::open(path).unwrap()).read_to_string(&mut text).unwrap();
        text
    }

    fn config_in(dir: &Path, extra: &[&str]) -> Config {
        let input = dir.join("1.fq.gz");
        let out_r1 = dir.join("1.R1.fq.gz");
        let out_r2 = dir.join("1.R2.fq.gz");
        let mut argv = vec![
            "bxsplit".to_owned(),
            "--input".to_owned(), input.display().to_string(),
            "--out-r1".to_owned(), out_r1.display().to_string(),
            "--out-r2".to_owned(), out_r2.display().to_string(),
        ];
        argv.extend(extra.iter().map(|arg| arg.to_string()));
        Config::from_matches(&cli().try_get_matches_from(argv).unwrap())
    }

    #[test]
    fn defaults_are_the_fixed_filenames() {
        let config = Config::from_matches(&cli().try_get_matches_from(["bxsplit"]).unwrap());
        assert_eq!(config.input, PathBuf::from("1.fq.gz"));
        assert_eq!(config.outputs, (PathBuf::from("1.R1.fq.gz"), PathBuf::from("1.R2.fq.gz")));
        assert_eq!(config.compression, OutputCompression::Auto);
        assert_eq!(config.options.trailing, TrailingPolicy::Drop);
        assert!(!config.options.validate);
        assert!(!config.no_clobber);
        assert_eq!(config.log_level, LevelFilter::Info);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(cli().try_get_matches_from(["bxsplit", "-q", "-v"]).is_err());
    }

    #[test]
    fn splits_gzip_file_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), &[]);
        write_gzip(&config.input, &BLOCK.repeat(3));

        let summary = run(&config).unwrap();
        assert_eq!(summary.pairs_written, 3);
        assert_eq!(read_gzip(&config.outputs.0),
                   "READ1/1\tVX:i:1\tBX:Z:AACCGGTT\nACGT\n+\n####\n".repeat(3));
        assert_eq!(read_gzip(&config.outputs.1),
                   "READ1/2\tVX:i:1\tBX:Z:AACCGGTT\nTTAA\n+\n####\n".repeat(3));
    }

    #[test]
    fn reruns_are_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), &[]);
        write_gzip(&config.input, &format!("{}READ9\n", BLOCK.repeat(2)));

        run(&config).unwrap();
        let first = (fs::read(&config.outputs.0).unwrap(), fs::read(&config.outputs.1).unwrap());
        run(&config).unwrap();
        let second = (fs::read(&config.outputs.0).unwrap(), fs::read(&config.outputs.1).unwrap());

        assert_eq!(first, second);
    }

    #[test]
    fn plain_input_and_plain_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), &["--compression", "none"]);
        fs::write(&config.input, BLOCK).unwrap();

        run(&config).unwrap();
        assert_eq!(fs::read_to_string(&config.outputs.0).unwrap(),
                   "READ1/1\tVX:i:1\tBX:Z:AACCGGTT\nACGT\n+\n####\n");
    }

    #[test]
    fn truncated_input_fails_with_error_policy() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), &["--trailing", "error"]);
        write_gzip(&config.input, &format!("{}READ2\n", BLOCK.repeat(2)));

        let err = run(&config).unwrap_err();
        assert!(format!("{err:#}").contains("incomplete record (1 of 9 lines)"));
        assert_eq!(read_gzip(&config.outputs.0),
                   "READ1/1\tVX:i:1\tBX:Z:AACCGGTT\nACGT\n+\n####\n".repeat(2));
        assert_eq!(read_gzip(&config.outputs.1),
                   "READ1/2\tVX:i:1\tBX:Z:AACCGGTT\nTTAA\n+\n####\n".repeat(2));
    }

    #[test]
    fn invalid_utf8_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), &[]);
        let mut encoder = GzEncoder::new(File::create(&config.input).unwrap(), Compression::default());
        encoder.write_all(b"READ1\nAC\xffGT\n").unwrap();
        encoder.finish().unwrap();

        let err = run(&config).unwrap_err();
        assert!(format!("{err:#}").contains("couldn't split"));
    }

    #[test]
    fn no_clobber_checks_both_outputs_before_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), &["--no-clobber"]);
        write_gzip(&config.input, BLOCK);
        fs::write(&config.outputs.1, "existing read 2\n").unwrap();

        let err = run(&config).unwrap_err();
        assert!(format!("{err:#}").contains("refusing to overwrite"));
        assert!(!config.outputs.0.exists());
        assert_eq!(fs::read_to_string(&config.outputs.1).unwrap(), "existing read 2\n");
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), &[]);

        let err = run(&config).unwrap_err();
        assert!(err.to_string().contains("couldn't open"));
        assert!(!config.outputs.0.exists());
    }
}
