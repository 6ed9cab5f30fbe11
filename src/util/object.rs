use crate::model::error::{EmptyError, ErrorKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    AWS,
    GCS,
}

impl Provider {
    pub fn is_aws(&self) -> bool {
        matches!(self, Provider::AWS)
    }
}

/// A bucket name plus the provider hosting it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketRef {
    pub provider: Provider,
    pub name: String,
}

pub fn parse_provider_from_uri(bucket_uri: &str) -> Result<Provider, EmptyError> {
    return match bucket_uri.split_once("://") {
        None => Ok(Provider::AWS),
        Some(("s3", _)) => Ok(Provider::AWS),
        Some(("gs", _)) => Ok(Provider::GCS),
        Some(_) => Err(EmptyError::new(
            ErrorKind::Config,
            format!("failed to parse provider of: {}", bucket_uri),
        )),
    };
}

pub fn parse_bucket_from_uri(bucket_uri: &str) -> &str {
    let name = bucket_uri
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(bucket_uri);

    name.trim_end_matches('/')
}

pub fn parse_bucket_ref(bucket_uri: &str) -> Result<BucketRef, EmptyError> {
    let provider = parse_provider_from_uri(bucket_uri)?;
    let name = parse_bucket_from_uri(bucket_uri);

    if name.is_empty() {
        return Err(EmptyError::new(
            ErrorKind::Config,
            format!("missing bucket name in: {:?}", bucket_uri),
        ));
    }

    if name.contains('/') {
        return Err(EmptyError::new(
            ErrorKind::Config,
            format!("bucket name must not contain a path: {}", bucket_uri),
        ));
    }

    Ok(BucketRef {
        provider,
        name: name.to_string(),
    })
}
