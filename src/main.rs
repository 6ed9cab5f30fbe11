use std::process::ExitCode;

use aws_sdk_s3::config::{retry::RetryConfig, BehaviorVersion, Region};
use google_cloud_storage::client::ClientConfig;
use tracing::{error, info, span, Instrument, Level};

use crate::model::error::{EmptyError, ErrorKind};

mod adapters;
mod cli;
mod emptier;
mod model;
mod util;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .json()
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::from_matches(&cli::command().get_matches());

    let span = span!(Level::INFO, "main", context = "main");
    match run(args).instrument(span).await {
        Ok(report) => {
            info!(
                versions_deleted = report.versions_deleted,
                markers_deleted = report.markers_deleted,
                sweeps = report.sweeps,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error_message = %err.message, error_group = %err.kind, "failed");
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: cli::Args) -> Result<emptier::EmptyReport, EmptyError> {
    info!("called");

    let bucket = util::object::parse_bucket_ref(&args.bucket)?;
    info!(bucket = %bucket.name, provider = ?bucket.provider, concurrency = args.concurrency, "args");

    let client: Box<dyn adapters::VersionStore> = if bucket.provider.is_aws() {
        Box::new(s3_client(&args).await)
    } else {
        Box::new(gcs_client().await?)
    };

    let emptier = emptier::BucketEmptier::new(client, &bucket.name)
        .with_concurrency(args.concurrency)
        .with_max_sweeps(args.max_sweeps);

    println!("Emptying bucket {}...", bucket.name);
    let report = emptier.empty().await?;
    println!(
        "Bucket emptied. Deleted {} object versions and {} delete markers.",
        report.versions_deleted, report.markers_deleted
    );

    Ok(report)
}

async fn s3_client(args: &cli::Args) -> aws_sdk_s3::Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(RetryConfig::standard().with_max_attempts(args.max_attempts));

    if let Some(region) = &args.region {
        loader = loader.region(Region::new(region.clone()));
    }

    let config = loader.load().await;
    aws_sdk_s3::Client::new(&config)
}

async fn gcs_client() -> Result<google_cloud_storage::client::Client, EmptyError> {
    let config = ClientConfig::default().with_auth().await.map_err(|err| {
        EmptyError::new(
            ErrorKind::Authorization,
            format!("failed to load gcs credentials: {}", err),
        )
    })?;

    Ok(google_cloud_storage::client::Client::new(config))
}
