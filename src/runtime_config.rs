use std::{ffi::OsString, ops::Range};

use anyhow::Result;
use clap::{App, AppSettings, Arg, ArgMatches};

use crate::preimage::DEFAULT_PREFIX;

pub const DEFAULT_RANGE_START: u32 = 0;
pub const DEFAULT_RANGE_END: u32 = 1_000_000;

const INPUT: (&str, &str) = (
    "in_file",
    "the string table dump to resolve: CRLF separated lines of hash<TAB>_<TAB>text",
);
const OUTPUT: (&str, &str) = (
    "out_file",
    "the file the recovered id<TAB>text lines are written to",
);
const RANGE_START: (&str, &str) = (
    "range_start",
    "first id to try (inclusive), falls back to 0 if not a number",
);
const RANGE_END: (&str, &str) = (
    "range_end",
    "last id to try (exclusive), falls back to 1000000 if not a number",
);
const VERBOSE: (&str, &str, &str) = (
    "verbose",
    "v",
    "if set, all logging output is printed. \
        Side-effect: the table is built on a single thread",
);
const LOG_FILE: (&str, &str) = (
    "log-file",
    "if set, the full log is additionally written to this file",
);
const PREFIX: (&str, &str) = (
    "prefix",
    "the text in front of the id in every hashed key",
);
const INITVAL: (&str, &str) = ("initval", "the initial value of the lookup2 hash");
const THREADS: (&str, &str, &str) = (
    "threads",
    "j",
    "number of threads used to build the table, defaults to the number of cpus",
);

/// Holds the runtime configuration for the program.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input_file: String,
    pub output_file: String,
    /// Ids that are tried, `range_start..range_end`.
    pub range: Range<u32>,
    pub prefix: String,
    pub initval: u32,
    pub threads: Option<usize>,
    pub log_file: Option<String>,
    pub verbose: bool,
}

impl Config {
    /// Read command line arguments and flags to generate the runtime configuration.
    /// Prints the usage and exits the process if a required argument is missing.
    pub fn new() -> Result<Self> {
        Ok(Self::from_matches(&app().get_matches()))
    }

    /// Like `new`, but reads the given arguments and returns usage errors instead of exiting.
    /// The first argument is the binary name.
    pub fn from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = app().get_matches_from_safe(args)?;
        Ok(Self::from_matches(&matches))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        let range_start = parse_or(matches.value_of(RANGE_START.0), DEFAULT_RANGE_START);
        let range_end = parse_or(matches.value_of(RANGE_END.0), DEFAULT_RANGE_END);

        Self {
            // both are required, clap rejects the arguments without them
            input_file: matches.value_of(INPUT.0).unwrap_or_default().to_string(),
            output_file: matches.value_of(OUTPUT.0).unwrap_or_default().to_string(),
            range: range_start..range_end,
            prefix: matches
                .value_of(PREFIX.0)
                .unwrap_or(DEFAULT_PREFIX)
                .to_string(),
            initval: parse_or(matches.value_of(INITVAL.0), 0),
            threads: matches
                .value_of(THREADS.0)
                .and_then(|threads| threads.parse::<usize>().ok())
                .filter(|&threads| threads > 0),
            log_file: matches.value_of(LOG_FILE.0).map(str::to_string),
            verbose: matches.is_present(VERBOSE.0),
        }
    }
}

fn app() -> App<'static, 'static> {
    App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        // negative ranges are positional values that fall back to the defaults
        .setting(AppSettings::AllowNegativeNumbers)
        .arg(
            Arg::with_name(INPUT.0)
                .help(INPUT.1)
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name(OUTPUT.0)
                .help(OUTPUT.1)
                .required(true)
                .index(2),
        )
        .arg(Arg::with_name(RANGE_START.0).help(RANGE_START.1).index(3))
        .arg(Arg::with_name(RANGE_END.0).help(RANGE_END.1).index(4))
        .arg(
            Arg::with_name(VERBOSE.0)
                .short(VERBOSE.1)
                .long(VERBOSE.0)
                .help(VERBOSE.2)
                .takes_value(false),
        )
        .arg(
            Arg::with_name(LOG_FILE.0)
                .long(LOG_FILE.0)
                .help(LOG_FILE.1)
                .takes_value(true),
        )
        .arg(
            Arg::with_name(PREFIX.0)
                .long(PREFIX.0)
                .help(PREFIX.1)
                .default_value(DEFAULT_PREFIX)
                .takes_value(true),
        )
        .arg(
            Arg::with_name(INITVAL.0)
                .long(INITVAL.0)
                .help(INITVAL.1)
                .default_value("0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name(THREADS.0)
                .short(THREADS.1)
                .long(THREADS.0)
                .help(THREADS.2)
                .takes_value(true),
        )
}

/// Parses a number, silently falling back to the default for absent or malformed values.
fn parse_or(value: Option<&str>, default: u32) -> u32 {
    value
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(args: &[&str]) -> Result<Config> {
        Config::from_args(std::iter::once("string-id-recover").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let config = parse_args(&["in.dat", "out.txt"]).unwrap();
        assert_eq!(config.input_file, "in.dat");
        assert_eq!(config.output_file, "out.txt");
        assert_eq!(config.range, 0..1_000_000);
        assert_eq!(config.prefix, "Global.Text.");
        assert_eq!(config.initval, 0);
        assert_eq!(config.threads, None);
        assert_eq!(config.log_file, None);
        assert!(!config.verbose);
    }

    #[test]
    fn default_range_equals_explicit_range() {
        let implicit = parse_args(&["in.dat", "out.txt"]).unwrap();
        let explicit = parse_args(&["in.dat", "out.txt", "0", "1000000"]).unwrap();
        assert_eq!(implicit, explicit);
    }

    #[test]
    fn explicit_range() {
        let config = parse_args(&["in.dat", "out.txt", "40", "50"]).unwrap();
        assert_eq!(config.range, 40..50);

        let config = parse_args(&["in.dat", "out.txt", "5"]).unwrap();
        assert_eq!(config.range, 5..1_000_000);
    }

    #[test]
    fn malformed_range_falls_back() {
        let config = parse_args(&["in.dat", "out.txt", "abc", "-3"]).unwrap();
        assert_eq!(config.range, 0..1_000_000);
    }

    #[test]
    fn zero_is_a_number() {
        let config = parse_args(&["in.dat", "out.txt", "0", "0"]).unwrap();
        assert_eq!(config.range, 0..0);
    }

    #[test]
    fn missing_files_are_usage_errors() {
        assert!(parse_args(&[]).is_err());
        assert!(parse_args(&["in.dat"]).is_err());
    }

    #[test]
    fn options() {
        let config = parse_args(&[
            "-v",
            "--log-file",
            "run.log",
            "--prefix",
            "Item.Name.",
            "--initval",
            "7",
            "-j",
            "4",
            "in.dat",
            "out.txt",
        ])
        .unwrap();
        assert!(config.verbose);
        assert_eq!(config.log_file.as_deref(), Some("run.log"));
        assert_eq!(config.prefix, "Item.Name.");
        assert_eq!(config.initval, 7);
        assert_eq!(config.threads, Some(4));
    }

    #[test]
    fn zero_threads_means_default() {
        let config = parse_args(&["-j", "0", "in.dat", "out.txt"]).unwrap();
        assert_eq!(config.threads, None);
    }
}
