use aws_sdk_s3::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    types::{Delete, ObjectIdentifier},
};
use tracing::debug;

use crate::{
    adapters,
    model::{
        error::{EmptyError, ErrorKind},
        version::{Cursor, DeleteOutcome, ObjectVersion, VersionPage},
    },
};

/// DeleteObjects accepts at most this many keys per request.
pub const MAX_DELETE_BATCH: usize = 1000;

pub fn classify_code(code: Option<&str>) -> Option<ErrorKind> {
    match code? {
        "NoSuchBucket" => Some(ErrorKind::NotFound),
        "AccessDenied"
        | "AllAccessDisabled"
        | "InvalidAccessKeyId"
        | "SignatureDoesNotMatch"
        | "ExpiredToken"
        | "InvalidToken"
        | "AccountProblem" => Some(ErrorKind::Authorization),
        "SlowDown" | "InternalError" | "ServiceUnavailable" | "RequestTimeout" => {
            Some(ErrorKind::Transient)
        }
        _ => None,
    }
}

pub fn classify_sdk_error<E>(err: &SdkError<E>) -> ErrorKind
where
    E: ProvideErrorMetadata,
{
    match err {
        SdkError::ServiceError(ctx) => classify_code(ctx.err().code())
            .unwrap_or_else(|| ErrorKind::from_status(ctx.raw().status().as_u16())),
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            ErrorKind::Transient
        }
        _ => ErrorKind::Unknown,
    }
}

fn sdk_error<E>(op: &str, bucket: &str, err: SdkError<E>) -> EmptyError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    EmptyError::new(
        classify_sdk_error(&err),
        format!("failed to {} at: {}, {}", op, bucket, DisplayErrorContext(&err)),
    )
}

fn is_already_deleted(code: Option<&str>) -> bool {
    matches!(code, Some("NoSuchVersion" | "NoSuchKey"))
}

/// Counts the versions and markers of `chunk` that were actually removed,
/// leaving out the `(key, version_id)` pairs reported as already gone.
pub fn count_deleted(chunk: &[ObjectVersion], skipped: &[(&str, &str)]) -> DeleteOutcome {
    let mut outcome = DeleteOutcome::default();

    for v in chunk {
        if skipped
            .iter()
            .any(|(key, version_id)| *key == v.key && *version_id == v.version_id)
        {
            continue;
        }

        if v.is_delete_marker {
            outcome.markers_deleted += 1;
        } else {
            outcome.versions_deleted += 1;
        }
    }

    outcome
}

impl adapters::VersionStore for aws_sdk_s3::Client {
    fn list_versions<'a>(
        &'a self,
        bucket: &'a str,
        cursor: Option<Cursor>,
    ) -> adapters::StoreFuture<'a, VersionPage> {
        Box::pin(async move {
            let mut req = self.list_object_versions().bucket(bucket);

            match cursor {
                Some(Cursor::Marker {
                    key_marker,
                    version_id_marker,
                }) => {
                    req = req
                        .key_marker(key_marker)
                        .set_version_id_marker(version_id_marker);
                }
                Some(Cursor::Token(tok)) => {
                    return Err(EmptyError::new(
                        ErrorKind::Unknown,
                        format!("unexpected page token for s3 listing: {}", tok),
                    ));
                }
                None => {}
            }

            let lv = req
                .send()
                .await
                .map_err(|err| sdk_error("list_object_versions", bucket, err))?;

            let mut versions = Vec::with_capacity(lv.versions().len() + lv.delete_markers().len());
            for v in lv.versions() {
                versions.push(ObjectVersion {
                    key: v.key().unwrap_or("").to_string(),
                    version_id: v.version_id().unwrap_or("null").to_string(),
                    is_delete_marker: false,
                });
            }
            for m in lv.delete_markers() {
                versions.push(ObjectVersion {
                    key: m.key().unwrap_or("").to_string(),
                    version_id: m.version_id().unwrap_or("null").to_string(),
                    is_delete_marker: true,
                });
            }

            let next = match (lv.is_truncated(), lv.next_key_marker()) {
                (Some(true), Some(key_marker)) => Some(Cursor::Marker {
                    key_marker: key_marker.to_string(),
                    version_id_marker: lv.next_version_id_marker().map(|v| v.to_string()),
                }),
                _ => None,
            };

            debug!(bucket = bucket, count = versions.len(), truncated = next.is_some(), "listed");

            Ok(VersionPage { versions, next })
        })
    }

    fn delete_versions<'a>(
        &'a self,
        bucket: &'a str,
        versions: &'a [ObjectVersion],
    ) -> adapters::StoreFuture<'a, DeleteOutcome> {
        Box::pin(async move {
            let mut outcome = DeleteOutcome::default();

            for chunk in versions.chunks(MAX_DELETE_BATCH) {
                let mut identifiers = Vec::with_capacity(chunk.len());
                for v in chunk {
                    let id = ObjectIdentifier::builder()
                        .key(&v.key)
                        .version_id(&v.version_id)
                        .build()
                        .map_err(|err| {
                            EmptyError::new(
                                ErrorKind::Unknown,
                                format!("failed to build identifier: {}, {}", v.key, err),
                            )
                        })?;
                    identifiers.push(id);
                }

                let delete = Delete::builder()
                    .set_objects(Some(identifiers))
                    .quiet(true)
                    .build()
                    .map_err(|err| {
                        EmptyError::new(
                            ErrorKind::Unknown,
                            format!("failed to build delete request at: {}, {}", bucket, err),
                        )
                    })?;

                let d = self
                    .delete_objects()
                    .bucket(bucket)
                    .delete(delete)
                    .send()
                    .await
                    .map_err(|err| sdk_error("delete_objects", bucket, err))?;

                let mut skipped = Vec::new();
                for e in d.errors() {
                    if is_already_deleted(e.code()) {
                        skipped.push((e.key().unwrap_or(""), e.version_id().unwrap_or("null")));
                        continue;
                    }

                    let kind = classify_code(e.code()).unwrap_or(ErrorKind::Unknown);
                    return Err(EmptyError::new(
                        kind,
                        format!(
                            "failed to delete_objects at: {}, {}?versionId={}: {} {}",
                            bucket,
                            e.key().unwrap_or(""),
                            e.version_id().unwrap_or(""),
                            e.code().unwrap_or(""),
                            e.message().unwrap_or(""),
                        ),
                    ));
                }

                outcome.add(count_deleted(chunk, &skipped));
            }

            Ok(outcome)
        })
    }
}
