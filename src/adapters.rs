use std::{future::Future, pin::Pin};

use crate::model;

pub mod gcs;
#[cfg(test)]
pub mod mock;
pub mod s3;

pub type StoreFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, model::error::EmptyError>> + Send + 'a>>;

/// The two remote operations needed to empty a versioned bucket.
pub trait VersionStore: Send + Sync {
    /// Lists one page of versions and delete markers, starting at `cursor`.
    fn list_versions<'a>(
        &'a self,
        bucket: &'a str,
        cursor: Option<model::version::Cursor>,
    ) -> StoreFuture<'a, model::version::VersionPage>;

    /// Deletes the given versions. Versions that are already gone are skipped
    /// without error and left out of the outcome.
    fn delete_versions<'a>(
        &'a self,
        bucket: &'a str,
        versions: &'a [model::version::ObjectVersion],
    ) -> StoreFuture<'a, model::version::DeleteOutcome>;
}
