use futures::{stream, Stream, TryStreamExt};
use tracing::{info, span, warn, Instrument, Level};

use crate::{
    adapters,
    model::{
        error::{EmptyError, ErrorKind},
        version::{Cursor, DeleteOutcome, VersionPage},
    },
};

pub const DEFAULT_CONCURRENCY: usize = 1;
pub const DEFAULT_MAX_SWEEPS: usize = 3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmptyReport {
    pub versions_deleted: usize,
    pub markers_deleted: usize,
    pub sweeps: usize,
}

#[derive(Clone, Copy, Debug, Default)]
struct Sweep {
    listed: usize,
    markers_listed: usize,
    deleted: DeleteOutcome,
}

pub struct BucketEmptier {
    pub client: Box<dyn adapters::VersionStore>,
    pub bucket: String,
    pub concurrency: usize,
    pub max_sweeps: usize,
}

impl BucketEmptier {
    pub fn new(client: Box<dyn adapters::VersionStore>, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            max_sweeps: DEFAULT_MAX_SWEEPS,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = max_sweeps.max(1);
        self
    }

    /// Deletes every version and delete marker in the bucket.
    ///
    /// Sweeps repeat until one lists nothing, which confirms the bucket is
    /// empty. If the last permitted sweep still found versions, the bucket is
    /// listed once more and the leftovers are reported as
    /// [`ErrorKind::Incomplete`].
    pub async fn empty(&self) -> Result<EmptyReport, EmptyError> {
        let span = span!(Level::INFO, "empty", context = "empty", bucket = %self.bucket);

        self.run().instrument(span).await
    }

    async fn run(&self) -> Result<EmptyReport, EmptyError> {
        let mut report = EmptyReport::default();

        while report.sweeps < self.max_sweeps {
            let sweep = self.sweep().await?;
            report.sweeps += 1;
            report.versions_deleted += sweep.deleted.versions_deleted;
            report.markers_deleted += sweep.deleted.markers_deleted;

            info!(
                sweep = report.sweeps,
                listed = sweep.listed,
                markers_listed = sweep.markers_listed,
                versions_deleted = sweep.deleted.versions_deleted,
                markers_deleted = sweep.deleted.markers_deleted,
                "sweep finished"
            );

            if sweep.listed == 0 {
                return Ok(report);
            }
        }

        let (versions, markers) = self.count_remaining().await?;
        if versions + markers == 0 {
            return Ok(report);
        }

        warn!(versions = versions, markers = markers, "bucket not empty");

        Err(EmptyError::new(
            ErrorKind::Incomplete,
            format!(
                "bucket {} still holds {} versions and {} delete markers after {} sweeps",
                self.bucket, versions, markers, report.sweeps
            ),
        ))
    }

    /// Lazily lists the bucket one page at a time.
    pub fn pages(&self) -> impl Stream<Item = Result<VersionPage, EmptyError>> + '_ {
        let client = self.client.as_ref();
        let bucket = self.bucket.as_str();

        // `None` once the listing is exhausted; `Some(None)` before the first page.
        stream::try_unfold(Some(None::<Cursor>), move |state| async move {
            let Some(cursor) = state else {
                return Ok(None);
            };

            let page = client.list_versions(bucket, cursor).await?;
            let next = page.next.clone().map(Some);

            Ok::<_, EmptyError>(Some((page, next)))
        })
    }

    async fn sweep(&self) -> Result<Sweep, EmptyError> {
        let client = self.client.as_ref();
        let bucket = self.bucket.as_str();

        self.pages()
            .map_ok(move |page| async move {
                let listed = page.versions.len();
                let markers_listed = page.marker_count();
                let deleted = if listed == 0 {
                    DeleteOutcome::default()
                } else {
                    client.delete_versions(bucket, &page.versions).await?
                };

                Ok::<_, EmptyError>(Sweep {
                    listed,
                    markers_listed,
                    deleted,
                })
            })
            .try_buffer_unordered(self.concurrency)
            .try_fold(Sweep::default(), |mut acc, s| async move {
                acc.listed += s.listed;
                acc.markers_listed += s.markers_listed;
                acc.deleted.add(s.deleted);
                Ok(acc)
            })
            .await
    }

    async fn count_remaining(&self) -> Result<(usize, usize), EmptyError> {
        self.pages()
            .try_fold((0, 0), |(versions, markers), page| async move {
                let m = page.marker_count();
                Ok((versions + page.versions.len() - m, markers + m))
            })
            .await
    }
}
