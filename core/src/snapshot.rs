//! Server-authoritative pack state used as the diff baseline.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::api::{ApiError, PackApi, PackDto};
use crate::pack::{PackId, PackMetadata};
use crate::sample::{SampleId, SampleRecord};

/// Pack membership and metadata as the server reported it at one point in time.
/// Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackSnapshot {
    pack_id: PackId,
    sample_ids: Vec<SampleId>,
    metadata: PackMetadata,
}

impl PackSnapshot {
    pub fn new(pack_id: PackId, sample_ids: Vec<SampleId>, metadata: PackMetadata) -> Self {
        Self {
            pack_id,
            sample_ids: dedup_ids(sample_ids),
            metadata,
        }
    }

    pub fn from_dto(dto: &PackDto) -> Self {
        Self::new(
            dto.id.clone(),
            dto.samples.iter().map(|s| s.id.clone()).collect(),
            dto.metadata(),
        )
    }

    pub fn pack_id(&self) -> &PackId {
        &self.pack_id
    }

    /// Sample ids in server order.
    pub fn sample_ids(&self) -> &[SampleId] {
        &self.sample_ids
    }

    pub fn metadata(&self) -> &PackMetadata {
        &self.metadata
    }

    pub fn id_set(&self) -> HashSet<&SampleId> {
        self.sample_ids.iter().collect()
    }

    pub fn contains(&self, sample_id: &SampleId) -> bool {
        self.sample_ids.contains(sample_id)
    }

    /// Membership changes between this snapshot and a newer one.
    pub fn drift_to(&self, newer: &PackSnapshot) -> SnapshotDrift {
        let old = self.id_set();
        let new = newer.id_set();
        SnapshotDrift {
            added: newer
                .sample_ids
                .iter()
                .filter(|id| !old.contains(id))
                .cloned()
                .collect(),
            removed: self
                .sample_ids
                .iter()
                .filter(|id| !new.contains(id))
                .cloned()
                .collect(),
        }
    }
}

fn dedup_ids(ids: Vec<SampleId>) -> Vec<SampleId> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if seen.contains(&id) {
            warn!(sample_id = %id, "Pack lists the same sample twice, keeping the first");
            continue;
        }
        seen.insert(id.clone());
        out.push(id);
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDrift {
    /// Bound on the server since the older snapshot.
    pub added: Vec<SampleId>,
    /// Unbound on the server since the older snapshot.
    pub removed: Vec<SampleId>,
}

impl SnapshotDrift {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// A freshly loaded pack: the baseline plus the form rows mapped from it.
#[derive(Debug, Clone)]
pub struct LoadedPack {
    pub snapshot: PackSnapshot,
    pub records: Vec<SampleRecord>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Pack '{0}' was not found")]
    NotFound(PackId),

    #[error("Not allowed to access pack '{pack_id}': {message}")]
    PermissionDenied { pack_id: PackId, message: String },

    #[error("Server answered with pack '{actual}' when '{requested}' was requested")]
    Mismatch { requested: PackId, actual: PackId },

    #[error("Failed to load pack '{pack_id}': {source}")]
    Api {
        pack_id: PackId,
        #[source]
        source: ApiError,
    },
}

impl LoadError {
    fn from_api(pack_id: &PackId, error: ApiError) -> Self {
        match error {
            ApiError::NotFound(_) => LoadError::NotFound(pack_id.clone()),
            ApiError::Forbidden(message) => LoadError::PermissionDenied {
                pack_id: pack_id.clone(),
                message,
            },
            source => LoadError::Api {
                pack_id: pack_id.clone(),
                source,
            },
        }
    }

    /// The collaborator failure behind this error, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            LoadError::Api { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Fetches packs and maps them into form rows flagged as already in the pack.
pub struct SnapshotLoader<'a> {
    api: &'a dyn PackApi,
}

impl<'a> SnapshotLoader<'a> {
    pub fn new(api: &'a dyn PackApi) -> Self {
        Self { api }
    }

    /// Loads the pack for editing. Failures are never turned into an empty pack.
    #[instrument(skip(self), fields(pack_id = %pack_id))]
    pub async fn load(&self, pack_id: &PackId) -> Result<LoadedPack, LoadError> {
        let dto = self.fetch(pack_id).await?;
        let snapshot = PackSnapshot::from_dto(&dto);

        let mut seen = HashSet::new();
        let records = dto
            .samples
            .iter()
            .filter(|sample| seen.insert(sample.id.clone()))
            .map(SampleRecord::pack_original)
            .collect::<Vec<_>>();

        debug!(samples = records.len(), "Loaded pack");
        Ok(LoadedPack { snapshot, records })
    }

    /// Re-reads only the baseline, as done right before diffing.
    #[instrument(skip(self), fields(pack_id = %pack_id))]
    pub async fn fetch_snapshot(&self, pack_id: &PackId) -> Result<PackSnapshot, LoadError> {
        let dto = self.fetch(pack_id).await?;
        Ok(PackSnapshot::from_dto(&dto))
    }

    async fn fetch(&self, pack_id: &PackId) -> Result<PackDto, LoadError> {
        let dto = self
            .api
            .fetch_pack(pack_id)
            .await
            .map_err(|e| LoadError::from_api(pack_id, e))?;

        if &dto.id != pack_id {
            return Err(LoadError::Mismatch {
                requested: pack_id.clone(),
                actual: dto.id,
            });
        }
        Ok(dto)
    }
}
