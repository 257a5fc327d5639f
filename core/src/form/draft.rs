//! Saving and restoring an unfinished form.
//!
//! Drafts store rows in the flag encoding (`fromLibrary`, `alreadyInPack`, optional
//! `remoteId` / `sourceFile`) so they stay readable by other clients. Restoring runs
//! every row through [`classify`]:
//!
//! *   rows flagged as pack members without a remote id are dropped with a warning;
//!     they are neither removals nor additions,
//! *   any other invalid combination fails the restore, as do repeated local ids,
//!     repeated remote ids and pack rows in a draft for a new pack.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, instrument, warn};

use super::{FormMode, PackForm};
use crate::pack::PackMetadata;
use crate::preview::{PreviewStore, PreviewUrl};
use crate::sample::{
    InvalidRow, LocalId, Provenance, SampleFile, SampleFlags, SampleId, SampleMetadata,
    SampleRecord, SampleSource, classify,
};
use crate::snapshot::PackSnapshot;

pub const DRAFT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDraft {
    pub version: u32,
    pub mode: DraftMode,
    pub metadata: PackMetadata,
    pub rows: Vec<DraftRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DraftMode {
    Create,
    Edit { snapshot: PackSnapshot },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRow {
    pub local_id: LocalId,
    #[serde(default)]
    pub remote_id: Option<SampleId>,
    #[serde(default)]
    pub source_file: Option<PathBuf>,
    /// Server preview URL. Local previews are not persisted.
    #[serde(default)]
    pub preview_url: Option<PreviewUrl>,
    pub from_library: bool,
    pub already_in_pack: bool,
    pub metadata: SampleMetadata,
}

impl DraftRow {
    pub fn flags(&self) -> SampleFlags {
        SampleFlags {
            from_library: self.from_library,
            already_in_pack: self.already_in_pack,
            has_remote_id: self.remote_id.is_some(),
            has_source_file: self.source_file.is_some(),
        }
    }

    fn from_record(record: &SampleRecord) -> Self {
        let preview_url = match record.source() {
            SampleSource::NewUpload { .. } => None,
            _ => Some(record.preview_url().clone()),
        };
        Self {
            local_id: record.local_id().clone(),
            remote_id: record.remote_id().cloned(),
            source_file: record.source_file().map(|f| f.path().to_path_buf()),
            preview_url,
            from_library: record.from_library(),
            already_in_pack: record.already_in_pack(),
            metadata: record.metadata().clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Unsupported draft version {0} (expected {})", DRAFT_VERSION)]
    UnsupportedVersion(u32),

    #[error("Draft row '{local_id}' is invalid: {reason}")]
    InvalidRow { local_id: LocalId, reason: InvalidRow },

    #[error("Draft references sample '{0}' more than once")]
    DuplicateSample(SampleId),

    #[error("Draft contains row '{0}' more than once")]
    DuplicateRow(LocalId),

    #[error("Draft serialization/deserialization error")]
    Json(#[from] serde_json::Error),

    #[error("IO error")]
    Io(#[from] std::io::Error),
}

impl PackForm {
    pub fn to_draft(&self) -> FormDraft {
        FormDraft {
            version: DRAFT_VERSION,
            mode: match self.mode() {
                FormMode::Create => DraftMode::Create,
                FormMode::Edit(snapshot) => DraftMode::Edit {
                    snapshot: snapshot.clone(),
                },
            },
            metadata: self.metadata().clone(),
            rows: self.rows().iter().map(DraftRow::from_record).collect(),
        }
    }

    /// Rebuilds a form from a draft. New uploads get fresh local previews.
    ///
    /// Every row must have a distinct local id and reference a distinct remote
    /// sample. Create drafts may not contain pack rows.
    pub fn from_draft(
        draft: FormDraft,
        previews: Arc<dyn PreviewStore>,
    ) -> Result<Self, DraftError> {
        if draft.version != DRAFT_VERSION {
            return Err(DraftError::UnsupportedVersion(draft.version));
        }

        let mode = match draft.mode {
            DraftMode::Create => FormMode::Create,
            DraftMode::Edit { snapshot } => FormMode::Edit(snapshot),
        };
        let creating = matches!(mode, FormMode::Create);
        // If a later row fails, dropping `form` releases previews created so far.
        let mut form = PackForm::from_parts(mode, draft.metadata, previews);
        let mut seen_local = HashSet::new();
        let mut seen_remote = HashSet::new();

        for row in draft.rows {
            if !seen_local.insert(row.local_id.clone()) {
                return Err(DraftError::DuplicateRow(row.local_id));
            }

            let provenance = match classify(&row.flags()) {
                Ok(Provenance::PackOriginal) if creating => {
                    return Err(DraftError::InvalidRow {
                        local_id: row.local_id,
                        reason: InvalidRow::PackRowInNewPack,
                    });
                }
                Ok(provenance) => provenance,
                Err(InvalidRow::PackRowWithoutRemoteId) => {
                    warn!(
                        local_id = %row.local_id,
                        "Dropping pack row without a remote id from draft"
                    );
                    continue;
                }
                Err(reason) => {
                    return Err(DraftError::InvalidRow {
                        local_id: row.local_id,
                        reason,
                    });
                }
            };

            if let Some(remote_id) = &row.remote_id {
                if !seen_remote.insert(remote_id.clone()) {
                    return Err(DraftError::DuplicateSample(remote_id.clone()));
                }
            }

            let DraftRow {
                local_id,
                remote_id,
                source_file,
                preview_url,
                metadata,
                ..
            } = row;
            let server_preview = preview_url.unwrap_or_else(|| PreviewUrl::new(""));

            match (provenance, remote_id, source_file) {
                (Provenance::NewUpload, None, Some(path)) => {
                    form.push_upload(local_id, SampleFile::new(path), metadata);
                }
                (Provenance::LibraryAddition, Some(remote_id), None) => {
                    form.push_record(SampleRecord::from_parts(
                        local_id,
                        SampleSource::LibraryAddition { remote_id },
                        server_preview,
                        metadata,
                    ));
                }
                (Provenance::PackOriginal, Some(remote_id), None) => {
                    form.push_record(SampleRecord::from_parts(
                        local_id,
                        SampleSource::PackOriginal { remote_id },
                        server_preview,
                        metadata,
                    ));
                }
                // classify() only accepts the three shapes above.
                (_, _, _) => {
                    return Err(DraftError::InvalidRow {
                        local_id,
                        reason: InvalidRow::AmbiguousSource,
                    });
                }
            }
        }

        debug!(
            rows = form.len(),
            previews = form.owned_preview_count(),
            "Restored draft"
        );
        Ok(form)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn save_draft(&self, path: &Path) -> Result<(), DraftError> {
        let json = serde_json::to_string_pretty(&self.to_draft())?;
        fs::write(path, json).await?;
        Ok(())
    }

    #[instrument(skip(previews), fields(path = %path.display()))]
    pub async fn load_draft(
        path: &Path,
        previews: Arc<dyn PreviewStore>,
    ) -> Result<Self, DraftError> {
        let json = fs::read_to_string(path).await?;
        let draft: FormDraft = serde_json::from_str(&json)?;
        Self::from_draft(draft, previews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RemoteSample;
    use crate::pack::PackId;
    use crate::preview::ObjectUrlTable;
    use crate::snapshot::LoadedPack;

    fn remote(id: &str) -> RemoteSample {
        RemoteSample {
            id: SampleId::from(id),
            preview_url: format!("https://cdn.example/{}.mp3", id),
            metadata: SampleMetadata {
                name: id.into(),
                ..Default::default()
            },
        }
    }

    fn row(
        local: &str,
        remote: Option<&str>,
        file: Option<&str>,
        lib: bool,
        in_pack: bool,
    ) -> DraftRow {
        DraftRow {
            local_id: LocalId::from(local),
            remote_id: remote.map(SampleId::from),
            source_file: file.map(PathBuf::from),
            preview_url: None,
            from_library: lib,
            already_in_pack: in_pack,
            metadata: SampleMetadata::default(),
        }
    }

    fn draft(rows: Vec<DraftRow>) -> FormDraft {
        FormDraft {
            version: DRAFT_VERSION,
            mode: DraftMode::Create,
            metadata: PackMetadata::default(),
            rows,
        }
    }

    #[test]
    fn draft_round_trip_keeps_rows_and_mode() {
        let table: Arc<dyn PreviewStore> = Arc::new(ObjectUrlTable::new());
        let snapshot = PackSnapshot::new(
            PackId::new("p1"),
            vec![SampleId::from("a")],
            PackMetadata::default(),
        );
        let loaded = LoadedPack {
            snapshot,
            records: vec![SampleRecord::pack_original(&remote("a"))],
        };
        let mut form = PackForm::for_pack(loaded, table.clone());
        form.add_library_samples([remote("b")]);
        form.add_uploaded_files([SampleFile::new("/tmp/c.wav")]);

        let json = serde_json::to_string(&form.to_draft()).unwrap();
        let restored =
            PackForm::from_draft(serde_json::from_str(&json).unwrap(), table.clone()).unwrap();

        assert_eq!(restored.pack_id(), Some(&PackId::new("p1")));
        let provenances: Vec<_> = restored.rows().iter().map(|r| r.provenance()).collect();
        assert_eq!(
            provenances,
            vec![Provenance::PackOriginal, Provenance::LibraryAddition, Provenance::NewUpload]
        );
        assert_eq!(restored.owned_preview_count(), 1);
        assert_eq!(restored.plan(), form.plan());
    }

    #[test]
    fn pack_row_without_remote_id_is_dropped() {
        let table: Arc<dyn PreviewStore> = Arc::new(ObjectUrlTable::new());
        let form = PackForm::from_draft(
            draft(vec![
                row("bad", None, None, true, true),
                row("ok", Some("x"), None, true, false),
            ]),
            table,
        )
        .unwrap();
        assert_eq!(form.len(), 1);
        assert_eq!(form.rows()[0].remote_id(), Some(&SampleId::from("x")));
    }

    #[test]
    fn library_row_with_pending_file_fails_restore_and_releases_previews() {
        let table = Arc::new(ObjectUrlTable::new());
        let result = PackForm::from_draft(
            draft(vec![
                row("up", None, Some("/tmp/a.wav"), false, false),
                row("bad", None, Some("/tmp/b.wav"), true, false),
            ]),
            table.clone(),
        );
        assert!(matches!(
            result,
            Err(DraftError::InvalidRow {
                reason: InvalidRow::LibraryRowWithPendingFile,
                ..
            })
        ));
        assert_eq!(table.live_count(), 0);
    }

    #[test]
    fn duplicate_remote_ids_fail_restore() {
        let table: Arc<dyn PreviewStore> = Arc::new(ObjectUrlTable::new());
        let result = PackForm::from_draft(
            draft(vec![
                row("a", Some("x"), None, true, false),
                row("b", Some("x"), None, true, false),
            ]),
            table,
        );
        assert!(matches!(result, Err(DraftError::DuplicateSample(_))));
    }

    #[tokio::test]
    async fn drafts_persist_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.json");
        let table: Arc<dyn PreviewStore> = Arc::new(ObjectUrlTable::new());

        let mut form = PackForm::new(table.clone());
        form.set_title("Night Drive");
        form.add_uploaded_files([SampleFile::new("/tmp/pad.wav")]);
        form.save_draft(&path).await.unwrap();

        let restored = PackForm::load_draft(&path, table).await.unwrap();
        assert_eq!(restored.metadata().title, "Night Drive");
        assert_eq!(
            restored.rows()[0].source_file().unwrap().path(),
            Path::new("/tmp/pad.wav")
        );
    }

    #[test]
    fn unknown_version_is_rejected() {
        let table: Arc<dyn PreviewStore> = Arc::new(ObjectUrlTable::new());
        let mut d = draft(vec![]);
        d.version = 99;
        assert!(matches!(
            PackForm::from_draft(d, table),
            Err(DraftError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn repeated_local_id_fails_restore_instead_of_unbinding() {
        let table: Arc<dyn PreviewStore> = Arc::new(ObjectUrlTable::new());
        let snapshot = PackSnapshot::new(
            PackId::new("p1"),
            vec![SampleId::from("a"), SampleId::from("b")],
            PackMetadata::default(),
        );
        let mut d = draft(vec![
            row("same", Some("a"), None, true, true),
            row("same", Some("b"), None, true, true),
        ]);
        d.mode = DraftMode::Edit { snapshot };

        let err = PackForm::from_draft(d, table).unwrap_err();
        assert!(matches!(err, DraftError::DuplicateRow(ref id) if *id == LocalId::from("same")));
    }

    #[test]
    fn repeated_upload_id_fails_restore_and_releases_previews() {
        let table = Arc::new(ObjectUrlTable::new());
        let result = PackForm::from_draft(
            draft(vec![
                row("u1", None, Some("/tmp/a.wav"), false, false),
                row("u1", None, Some("/tmp/b.wav"), false, false),
            ]),
            table.clone(),
        );
        assert!(matches!(result, Err(DraftError::DuplicateRow(_))));
        assert_eq!(table.live_count(), 0);
    }

    #[test]
    fn create_draft_rejects_pack_rows() {
        let table: Arc<dyn PreviewStore> = Arc::new(ObjectUrlTable::new());
        let result = PackForm::from_draft(
            draft(vec![
                row("up", None, Some("/tmp/a.wav"), false, false),
                row("p", Some("x"), None, true, true),
            ]),
            table,
        );
        assert!(matches!(
            result,
            Err(DraftError::InvalidRow {
                reason: InvalidRow::PackRowInNewPack,
                ..
            })
        ));
    }
}
