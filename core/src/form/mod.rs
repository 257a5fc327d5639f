//! The live, user-editable state of a pack being created or edited.
//!
//! [`PackForm`] is the only write surface for sample rows. Every mutation keeps the row
//! invariants intact:
//!
//! *   a remote sample appears at most once,
//! *   metadata of library and pack rows is never changed,
//! *   every local preview URL is revoked exactly once, either when its row is removed
//!     or when the form is disposed (explicitly or on drop).
//!
//! Removing a row never talks to the server. What has to be unbound is decided at
//! submission time by the [reconciler](crate::reconcile).

pub mod draft;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::api::RemoteSample;
use crate::pack::{CoverImage, PackId, PackMetadata, normalize_labels};
use crate::preview::{PreviewStore, PreviewUrl};
use crate::reconcile::{self, ReconcilePlan};
use crate::sample::{LocalId, SampleEdit, SampleFile, SampleId, SampleMetadata, SampleRecord};
use crate::snapshot::{LoadedPack, PackSnapshot};

/// Whether the form creates a new pack or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    /// Carries the baseline captured when editing began.
    Edit(PackSnapshot),
}

/// Result of [`PackForm::add_library_samples`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryAddReport {
    pub added: Vec<LocalId>,
    /// Samples that were skipped because a row already references them.
    pub duplicates: Vec<SampleId>,
}

/// Result of [`PackForm::update_field`].
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// The row is a library or pack sample; its metadata belongs to the library.
    ReadOnly,
    UnknownRow,
}

pub struct PackForm {
    mode: FormMode,
    metadata: PackMetadata,
    rows: Vec<SampleRecord>,
    // Local previews owned by this form, keyed by the row that owns them.
    owned_previews: HashMap<LocalId, PreviewUrl>,
    previews: Arc<dyn PreviewStore>,
}

impl PackForm {
    /// Empty form for a brand-new pack.
    pub fn new(previews: Arc<dyn PreviewStore>) -> Self {
        Self {
            mode: FormMode::Create,
            metadata: PackMetadata::default(),
            rows: Vec::new(),
            owned_previews: HashMap::new(),
            previews,
        }
    }

    /// Form initialized from a loaded pack.
    pub fn for_pack(loaded: LoadedPack, previews: Arc<dyn PreviewStore>) -> Self {
        let LoadedPack { snapshot, records } = loaded;
        Self {
            metadata: snapshot.metadata().clone(),
            mode: FormMode::Edit(snapshot),
            rows: records,
            owned_previews: HashMap::new(),
            previews,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn snapshot(&self) -> Option<&PackSnapshot> {
        match &self.mode {
            FormMode::Edit(snapshot) => Some(snapshot),
            FormMode::Create => None,
        }
    }

    pub fn pack_id(&self) -> Option<&PackId> {
        self.snapshot().map(PackSnapshot::pack_id)
    }

    pub fn rows(&self) -> &[SampleRecord] {
        &self.rows
    }

    pub fn row(&self, local_id: &LocalId) -> Option<&SampleRecord> {
        self.rows.iter().find(|row| row.local_id() == local_id)
    }

    /// The row referencing a remote sample, if any.
    pub fn row_for_remote(&self, sample_id: &SampleId) -> Option<&SampleRecord> {
        self.rows.iter().find(|row| row.remote_id() == Some(sample_id))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn metadata(&self) -> &PackMetadata {
        &self.metadata
    }

    /// Number of live local previews owned by this form.
    pub fn owned_preview_count(&self) -> usize {
        self.owned_previews.len()
    }

    // ========================================================================
    // Pack metadata
    // ========================================================================

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.metadata.title = title.into().trim().to_string();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.metadata.description = description.into();
    }

    pub fn set_price_cents(&mut self, price_cents: u64) {
        self.metadata.price_cents = price_cents;
    }

    pub fn set_genres<I: IntoIterator<Item = S>, S: AsRef<str>>(&mut self, genres: I) {
        self.metadata.genres = normalize_labels(genres);
    }

    pub fn set_tags<I: IntoIterator<Item = S>, S: AsRef<str>>(&mut self, tags: I) {
        self.metadata.tags = normalize_labels(tags);
    }

    pub fn set_cover(&mut self, cover: CoverImage) {
        self.metadata.cover = cover;
    }

    // ========================================================================
    // Sample rows
    // ========================================================================

    /// Appends one new-upload row per file, each with a fresh local preview.
    pub fn add_uploaded_files<I>(&mut self, files: I) -> Vec<LocalId>
    where
        I: IntoIterator<Item = SampleFile>,
    {
        files
            .into_iter()
            .map(|file| {
                let metadata = SampleMetadata::for_upload(&file);
                self.push_upload(LocalId::fresh_upload(), file, metadata)
            })
            .collect()
    }

    pub(crate) fn push_upload(
        &mut self,
        local_id: LocalId,
        file: SampleFile,
        metadata: SampleMetadata,
    ) -> LocalId {
        let preview = self.previews.create(&file);
        debug!(local_id = %local_id, file = %file.file_name(), "Added upload row");
        self.owned_previews.insert(local_id.clone(), preview.clone());
        self.rows
            .push(SampleRecord::new_upload(local_id.clone(), file, preview, metadata));
        local_id
    }

    /// Appends library samples that are not referenced by any row yet.
    pub fn add_library_samples<I>(&mut self, samples: I) -> LibraryAddReport
    where
        I: IntoIterator<Item = RemoteSample>,
    {
        let mut present: HashSet<SampleId> =
            self.rows.iter().filter_map(|r| r.remote_id().cloned()).collect();
        let mut report = LibraryAddReport::default();

        for sample in samples {
            if !present.insert(sample.id.clone()) {
                debug!(sample_id = %sample.id, "Library sample already in form");
                report.duplicates.push(sample.id);
                continue;
            }
            let record = SampleRecord::library_addition(&sample);
            report.added.push(record.local_id().clone());
            self.rows.push(record);
        }
        report
    }

    /// Edits one metadata field of a new upload. Library and pack rows are left as is.
    pub fn update_field(&mut self, local_id: &LocalId, edit: SampleEdit) -> EditOutcome {
        let Some(row) = self.rows.iter_mut().find(|row| row.local_id() == local_id) else {
            return EditOutcome::UnknownRow;
        };
        match row.editable_metadata() {
            Some(metadata) => {
                edit.apply(metadata);
                EditOutcome::Applied
            }
            None => {
                debug!(local_id = %local_id, "Ignored metadata edit on a remote sample");
                EditOutcome::ReadOnly
            }
        }
    }

    /// Removes a row, releasing its local preview if it owns one. Returns `false` if
    /// no such row exists.
    pub fn remove_row(&mut self, local_id: &LocalId) -> bool {
        let Some(index) = self.rows.iter().position(|row| row.local_id() == local_id) else {
            return false;
        };
        self.rows.remove(index);
        if let Some(preview) = self.owned_previews.remove(local_id) {
            self.previews.revoke(&preview);
        }
        true
    }

    /// Ends the session: drops all rows and revokes every local preview still held.
    /// Safe to call more than once.
    pub fn dispose(&mut self) {
        self.rows.clear();
        self.release_previews();
    }

    fn release_previews(&mut self) {
        for (local_id, preview) in self.owned_previews.drain() {
            debug!(local_id = %local_id, "Releasing preview");
            self.previews.revoke(&preview);
        }
    }

    /// The operations a submission would perform, computed against the baseline
    /// captured at load time. Submission itself re-reads the baseline first.
    pub fn plan(&self) -> ReconcilePlan {
        match &self.mode {
            FormMode::Create => reconcile::partition_for_create(&self.rows),
            FormMode::Edit(snapshot) => reconcile::reconcile(snapshot, &self.rows),
        }
    }

    pub(crate) fn from_parts(
        mode: FormMode,
        metadata: PackMetadata,
        previews: Arc<dyn PreviewStore>,
    ) -> Self {
        Self {
            mode,
            metadata,
            rows: Vec::new(),
            owned_previews: HashMap::new(),
            previews,
        }
    }

    /// Callers guarantee the local id is not taken yet.
    pub(crate) fn push_record(&mut self, record: SampleRecord) {
        self.rows.push(record);
    }
}

impl Drop for PackForm {
    fn drop(&mut self) {
        self.release_previews();
    }
}

impl fmt::Debug for PackForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackForm")
            .field("mode", &self.mode)
            .field("metadata", &self.metadata)
            .field("rows", &self.rows)
            .field("owned_previews", &self.owned_previews.len())
            .finish()
    }
}
