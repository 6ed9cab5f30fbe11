/// One entry of a bucket's version listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectVersion {
    pub key: String,
    pub version_id: String,
    pub is_delete_marker: bool,
}

/// Position to resume a version listing from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cursor {
    Marker {
        key_marker: String,
        version_id_marker: Option<String>,
    },
    Token(String),
}

#[derive(Clone, Debug, Default)]
pub struct VersionPage {
    pub versions: Vec<ObjectVersion>,
    /// `None` once the listing is exhausted.
    pub next: Option<Cursor>,
}

impl VersionPage {
    pub fn marker_count(&self) -> usize {
        self.versions.iter().filter(|v| v.is_delete_marker).count()
    }
}

/// Result of one `delete_versions` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub versions_deleted: usize,
    pub markers_deleted: usize,
}

impl DeleteOutcome {
    pub fn add(&mut self, other: DeleteOutcome) {
        self.versions_deleted += other.versions_deleted;
        self.markers_deleted += other.markers_deleted;
    }
}
