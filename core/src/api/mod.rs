//! Contract of the remote Pack/Sample API.
//!
//! The engine never talks HTTP itself; it drives an implementation of [`PackApi`]
//! (see `packsync_extensions::http` for the reqwest one). Implementations must honor
//! the following:
//!
//! *   [`PackApi::fetch_pack`] returns the *full* current sample membership of the pack.
//! *   [`PackApi::unbind_sample`] detaches one sample from one pack without deleting it.
//!     It is called at most once per sample per submission and never retried.
//! *   [`PackApi::submit_pack_update`] replaces pack metadata and *adds* the given
//!     samples. It has no way to remove samples.
//! *   Both submit calls report monotonically increasing progress through [`Progress`].

mod error;

pub use error::ApiError;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::pack::{CoverImage, PackId, PackMetadata};
use crate::progress::Progress;
use crate::sample::{LocalId, SampleFile, SampleId, SampleMetadata};

#[async_trait]
pub trait PackApi: Send + Sync {
    async fn fetch_pack(&self, pack_id: &PackId) -> Result<PackDto, ApiError>;

    /// Lists the signed-in user's personal sample library.
    async fn fetch_library(&self) -> Result<Vec<RemoteSample>, ApiError>;

    async fn unbind_sample(&self, sample_id: &SampleId, pack_id: &PackId) -> Result<(), ApiError>;

    async fn submit_pack_update(
        &self,
        pack_id: &PackId,
        payload: PackPayload,
        progress: Progress,
    ) -> Result<PackReceipt, ApiError>;

    async fn submit_pack_create(
        &self,
        payload: PackPayload,
        progress: Progress,
    ) -> Result<PackReceipt, ApiError>;
}

/// A sample as the server describes it, either in a pack or in the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSample {
    pub id: SampleId,
    #[serde(default)]
    pub preview_url: String,
    #[serde(flatten)]
    pub metadata: SampleMetadata,
}

/// Server representation of a pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackDto {
    pub id: PackId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price_cents: u64,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub samples: Vec<RemoteSample>,
}

impl PackDto {
    pub fn metadata(&self) -> PackMetadata {
        PackMetadata {
            title: self.title.clone(),
            description: self.description.clone(),
            price_cents: self.price_cents,
            genres: self.genres.clone(),
            tags: self.tags.clone(),
            cover: match &self.cover_url {
                Some(url) => CoverImage::Remote { url: url.clone() },
                None => CoverImage::None,
            },
        }
    }
}

/// A local file to be uploaded as a new sample of the pack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUpload {
    pub local_id: LocalId,
    pub file: SampleFile,
    pub metadata: SampleMetadata,
}

/// Body of the create/update calls: metadata replacement plus two additive sets.
#[derive(Debug, Clone, PartialEq)]
pub struct PackPayload {
    pub metadata: PackMetadata,
    pub new_uploads: Vec<NewUpload>,
    pub library_attach_ids: Vec<SampleId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackReceipt {
    pub id: PackId,
    #[serde(default)]
    pub sample_count: Option<usize>,
}
