use google_cloud_storage::http::objects::{delete::DeleteObjectRequest, list::ListObjectsRequest};
use tracing::debug;

use crate::{
    adapters,
    model::{
        error::{EmptyError, ErrorKind},
        version::{Cursor, DeleteOutcome, ObjectVersion, VersionPage},
    },
};

pub fn classify_error(err: &google_cloud_storage::http::Error) -> ErrorKind {
    match err {
        google_cloud_storage::http::Error::Response(resp) => ErrorKind::from_status(resp.code),
        google_cloud_storage::http::Error::TokenSource(_) => ErrorKind::Authorization,
        _ => ErrorKind::Transient,
    }
}

fn is_not_found(err: &google_cloud_storage::http::Error) -> bool {
    matches!(err, google_cloud_storage::http::Error::Response(resp) if resp.code == 404)
}

// GCS has no delete markers: every listed generation is a real version.
impl adapters::VersionStore for google_cloud_storage::client::Client {
    fn list_versions<'a>(
        &'a self,
        bucket: &'a str,
        cursor: Option<Cursor>,
    ) -> adapters::StoreFuture<'a, VersionPage> {
        Box::pin(async move {
            let page_token = match cursor {
                Some(Cursor::Token(tok)) => Some(tok),
                Some(Cursor::Marker { key_marker, .. }) => {
                    return Err(EmptyError::new(
                        ErrorKind::Unknown,
                        format!("unexpected key marker for gcs listing: {}", key_marker),
                    ));
                }
                None => None,
            };

            let req = ListObjectsRequest {
                bucket: bucket.to_string(),
                versions: Some(true),
                page_token,
                ..Default::default()
            };

            let lo = self.list_objects(&req).await.map_err(|err| {
                EmptyError::new(
                    classify_error(&err),
                    format!("failed to list_objects at: {}, {}", bucket, err),
                )
            })?;

            let versions: Vec<ObjectVersion> = lo
                .items
                .unwrap_or_default()
                .into_iter()
                .map(|obj| ObjectVersion {
                    key: obj.name,
                    version_id: obj.generation.to_string(),
                    is_delete_marker: false,
                })
                .collect();

            debug!(bucket = bucket, count = versions.len(), "listed");

            Ok(VersionPage {
                versions,
                next: lo.next_page_token.map(Cursor::Token),
            })
        })
    }

    fn delete_versions<'a>(
        &'a self,
        bucket: &'a str,
        versions: &'a [ObjectVersion],
    ) -> adapters::StoreFuture<'a, DeleteOutcome> {
        Box::pin(async move {
            let mut outcome = DeleteOutcome::default();

            for v in versions {
                let generation = v.version_id.parse::<i64>().map_err(|err| {
                    EmptyError::new(
                        ErrorKind::Unknown,
                        format!("invalid generation for: {}, {}, {}", v.key, v.version_id, err),
                    )
                })?;

                let req = DeleteObjectRequest {
                    bucket: bucket.to_string(),
                    object: v.key.clone(),
                    generation: Some(generation),
                    ..Default::default()
                };

                match self.delete_object(&req).await {
                    Err(err) if is_not_found(&err) => {
                        debug!(key = %v.key, generation = generation, "already deleted");
                    }
                    Err(err) => {
                        return Err(EmptyError::new(
                            classify_error(&err),
                            format!("failed to delete_object: {}#{}, {}", v.key, generation, err),
                        ));
                    }
                    Ok(_) => outcome.versions_deleted += 1,
                }
            }

            Ok(outcome)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_token_source() {
        let err = google_cloud_storage::http::Error::TokenSource("credentials expired".into());
        assert_eq!(classify_error(&err), ErrorKind::Authorization);
        assert!(!is_not_found(&err));
    }
}
