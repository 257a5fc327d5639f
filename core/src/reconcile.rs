//! Diffing the current form rows against the server baseline.
//!
//! Identity is the remote sample id; metadata never takes part in the diff. The result
//! is three disjoint sets:
//!
//! *   **removals:** baseline members no row references any more. These go through the
//!     dedicated unbind call and must finish before anything else is sent.
//! *   **library_attach:** library samples that are not in the baseline.
//! *   **new_uploads:** local files.
//!
//! A pack row whose id is still in the baseline produces nothing. Re-submitting it as
//! a library attachment would make the server see a duplicate attach.
//!
//! Rows always carry a well-formed source here. Malformed rows can only come from
//! drafts and are filtered when the draft is restored.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::api::NewUpload;
use crate::sample::{SampleId, SampleRecord, SampleSource};
use crate::snapshot::PackSnapshot;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcilePlan {
    /// In baseline order.
    pub removals: Vec<SampleId>,
    /// In row order.
    pub library_attach: Vec<SampleId>,
    /// In row order.
    pub new_uploads: Vec<NewUpload>,
}

impl ReconcilePlan {
    /// True if no sample membership changes. Metadata may still change.
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.library_attach.is_empty() && self.new_uploads.is_empty()
    }
}

/// Computes the minimal operations that turn `baseline` into `rows`.
pub fn reconcile(baseline: &PackSnapshot, rows: &[SampleRecord]) -> ReconcilePlan {
    plan_against(baseline.sample_ids(), rows)
}

/// Splits rows of a brand-new pack. There is no baseline, so nothing is removed.
pub fn partition_for_create(rows: &[SampleRecord]) -> ReconcilePlan {
    plan_against(&[], rows)
}

fn plan_against(baseline_ids: &[SampleId], rows: &[SampleRecord]) -> ReconcilePlan {
    let original_ids: HashSet<&SampleId> = baseline_ids.iter().collect();
    let current_ids: HashSet<&SampleId> = rows.iter().filter_map(SampleRecord::remote_id).collect();

    let removals = baseline_ids
        .iter()
        .filter(|id| !current_ids.contains(id))
        .cloned()
        .collect();

    let mut plan = ReconcilePlan {
        removals,
        ..ReconcilePlan::default()
    };
    let mut attached = HashSet::new();

    for row in rows {
        match row.source() {
            SampleSource::NewUpload { file } => plan.new_uploads.push(NewUpload {
                local_id: row.local_id().clone(),
                file: file.clone(),
                metadata: row.metadata().clone(),
            }),
            SampleSource::PackOriginal { remote_id } if original_ids.contains(remote_id) => {}
            SampleSource::PackOriginal { remote_id } => {
                // Unbound on the server since the form was loaded; the user still wants it.
                warn!(
                    sample_id = %remote_id,
                    "Pack sample vanished from the server, attaching it again"
                );
                if attached.insert(remote_id) {
                    plan.library_attach.push(remote_id.clone());
                }
            }
            SampleSource::LibraryAddition { remote_id } if original_ids.contains(remote_id) => {
                debug!(sample_id = %remote_id, "Library pick is already in the pack");
            }
            SampleSource::LibraryAddition { remote_id } => {
                if attached.insert(remote_id) {
                    plan.library_attach.push(remote_id.clone());
                }
            }
        }
    }

    debug!(
        removals = plan.removals.len(),
        library_attach = plan.library_attach.len(),
        new_uploads = plan.new_uploads.len(),
        "Reconciled pack rows"
    );
    plan
}
