use clap::{value_parser, Arg, ArgMatches, Command};

use crate::emptier::{DEFAULT_CONCURRENCY, DEFAULT_MAX_SWEEPS};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Args {
    pub bucket: String,
    pub concurrency: usize,
    pub max_sweeps: usize,
    pub max_attempts: u32,
    pub region: Option<String>,
}

pub fn command() -> Command {
    Command::new("bucket-emptier")
        .about("Deletes every object version and delete marker in a bucket")
        .version(clap::crate_version!())
        .arg(
            Arg::new("BUCKET")
                .help("Bucket name, or an s3:// or gs:// bucket URI")
                .env("BUCKET_NAME")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("concurrency")
                .long("concurrency")
                .env("EMPTIER_CONCURRENCY")
                .help("Pages of versions deleted at once")
                .value_parser(value_parser!(u32).range(1..))
                .default_value("1"),
        )
        .arg(
            Arg::new("max-sweeps")
                .long("max-sweeps")
                .env("EMPTIER_MAX_SWEEPS")
                .help("Listing passes made before giving up on a non-empty bucket")
                .value_parser(value_parser!(u32).range(1..))
                .default_value("3"),
        )
        .arg(
            Arg::new("max-attempts")
                .long("max-attempts")
                .env("EMPTIER_MAX_ATTEMPTS")
                .help("Attempts per S3 request, retries included")
                .value_parser(value_parser!(u32).range(1..))
                .default_value("3"),
        )
        .arg(
            Arg::new("region")
                .long("region")
                .help("S3 region; defaults to the ambient AWS configuration"),
        )
}

impl Args {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            bucket: matches
                .get_one::<String>("BUCKET")
                .cloned()
                .unwrap_or_default(),
            concurrency: matches
                .get_one::<u32>("concurrency")
                .map(|v| *v as usize)
                .unwrap_or(DEFAULT_CONCURRENCY),
            max_sweeps: matches
                .get_one::<u32>("max-sweeps")
                .map(|v| *v as usize)
                .unwrap_or(DEFAULT_MAX_SWEEPS),
            max_attempts: matches
                .get_one::<u32>("max-attempts")
                .copied()
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            region: matches.get_one::<String>("region").cloned(),
        }
    }
}
