use std::{
    collections::{BTreeMap, HashSet},
    sync::Mutex,
};

use crate::{
    adapters,
    model::{
        error::{EmptyError, ErrorKind},
        version::{Cursor, DeleteOutcome, ObjectVersion, VersionPage},
    },
};

/// In-memory versioned object store.
///
/// Versions are kept sorted by `(key, version_id)` and listed in pages of
/// `page_size`, resuming with the same key/version-id markers S3 uses.
pub struct MockClient {
    pub page_size: usize,
    pub buckets: Mutex<BTreeMap<String, Vec<ObjectVersion>>>,
    /// Buckets the caller may list but not delete from.
    pub read_only: HashSet<String>,
    /// Buckets the caller may not touch at all.
    pub denied: HashSet<String>,
    /// Number of delete calls that leave delete markers in place.
    pub sticky_marker_calls: Mutex<usize>,
    /// Number of list calls that fail with a transient error.
    pub transient_list_failures: Mutex<usize>,
    pub list_calls: Mutex<usize>,
}

impl MockClient {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            buckets: Mutex::new(BTreeMap::new()),
            read_only: HashSet::new(),
            denied: HashSet::new(),
            sticky_marker_calls: Mutex::new(0),
            transient_list_failures: Mutex::new(0),
            list_calls: Mutex::new(0),
        }
    }

    pub fn with_bucket(self, bucket: &str, versions: Vec<ObjectVersion>) -> Self {
        self.buckets
            .lock()
            .expect("failed to acquire `buckets` guard")
            .insert(bucket.to_string(), versions);
        self
    }

    pub fn versions(&self, bucket: &str) -> Option<Vec<ObjectVersion>> {
        let buckets = self.buckets.lock().expect("failed to acquire `buckets` guard");
        buckets.get(bucket).cloned()
    }

    pub fn list_call_count(&self) -> usize {
        *self.list_calls.lock().expect("failed to acquire `list_calls` guard")
    }

    fn check_access(&self, bucket: &str) -> Result<(), EmptyError> {
        if self.denied.contains(bucket) {
            return Err(EmptyError::new(
                ErrorKind::Authorization,
                format!("access denied: {}", bucket),
            ));
        }

        Ok(())
    }
}

pub fn version(key: &str, version_id: &str) -> ObjectVersion {
    ObjectVersion {
        key: key.to_string(),
        version_id: version_id.to_string(),
        is_delete_marker: false,
    }
}

pub fn marker(key: &str, version_id: &str) -> ObjectVersion {
    ObjectVersion {
        key: key.to_string(),
        version_id: version_id.to_string(),
        is_delete_marker: true,
    }
}

fn sort_key(v: &ObjectVersion) -> (String, String) {
    (v.key.clone(), v.version_id.clone())
}

impl adapters::VersionStore for MockClient {
    fn list_versions<'a>(
        &'a self,
        bucket: &'a str,
        cursor: Option<Cursor>,
    ) -> adapters::StoreFuture<'a, VersionPage> {
        let res = (|| {
            *self.list_calls.lock().expect("failed to acquire `list_calls` guard") += 1;

            let mut failures = self
                .transient_list_failures
                .lock()
                .expect("failed to acquire `transient_list_failures` guard");
            if *failures > 0 {
                *failures -= 1;
                return Err(EmptyError::new(ErrorKind::Transient, "connection reset"));
            }

            self.check_access(bucket)?;

            let buckets = self.buckets.lock().expect("failed to acquire `buckets` guard");
            let all = buckets.get(bucket).ok_or_else(|| {
                EmptyError::new(ErrorKind::NotFound, format!("no such bucket: {}", bucket))
            })?;

            let mut sorted = all.clone();
            sorted.sort_by_key(sort_key);

            let start = match cursor {
                Some(Cursor::Marker {
                    key_marker,
                    version_id_marker,
                }) => {
                    let after = (key_marker, version_id_marker.unwrap_or_default());
                    sorted.iter().position(|v| sort_key(v) > after).unwrap_or(sorted.len())
                }
                Some(Cursor::Token(_)) => {
                    return Err(EmptyError::new(ErrorKind::Unknown, "unexpected page token"))
                }
                None => 0,
            };

            let end = (start + self.page_size).min(sorted.len());
            let versions = sorted[start..end].to_vec();
            let next = if end < sorted.len() {
                versions.last().map(|v| Cursor::Marker {
                    key_marker: v.key.clone(),
                    version_id_marker: Some(v.version_id.clone()),
                })
            } else {
                None
            };

            Ok(VersionPage { versions, next })
        })();

        Box::pin(std::future::ready(res))
    }

    fn delete_versions<'a>(
        &'a self,
        bucket: &'a str,
        versions: &'a [ObjectVersion],
    ) -> adapters::StoreFuture<'a, DeleteOutcome> {
        let res = (|| {
            self.check_access(bucket)?;
            if self.read_only.contains(bucket) {
                return Err(EmptyError::new(
                    ErrorKind::Authorization,
                    format!("access denied for delete: {}", bucket),
                ));
            }

            let mut sticky = self
                .sticky_marker_calls
                .lock()
                .expect("failed to acquire `sticky_marker_calls` guard");
            let keep_markers = *sticky > 0;
            if keep_markers {
                *sticky -= 1;
            }

            let mut buckets = self.buckets.lock().expect("failed to acquire `buckets` guard");
            let stored = buckets.get_mut(bucket).ok_or_else(|| {
                EmptyError::new(ErrorKind::NotFound, format!("no such bucket: {}", bucket))
            })?;

            let mut outcome = DeleteOutcome::default();
            for v in versions {
                if keep_markers && v.is_delete_marker {
                    continue;
                }

                let before = stored.len();
                stored.retain(|s| !(s.key == v.key && s.version_id == v.version_id));
                if stored.len() == before {
                    continue;
                }

                if v.is_delete_marker {
                    outcome.markers_deleted += 1;
                } else {
                    outcome.versions_deleted += 1;
                }
            }

            Ok(outcome)
        })();

        Box::pin(std::future::ready(res))
    }
}
