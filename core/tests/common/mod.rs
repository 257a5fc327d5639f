#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use packsync_core::api::{ApiError, PackApi, PackDto, PackPayload, PackReceipt, RemoteSample};
use packsync_core::pack::PackId;
use packsync_core::preview::ObjectUrlTable;
use packsync_core::progress::Progress;
use packsync_core::sample::{SampleId, SampleMetadata};
use packsync_core::submit::{SubmitObserver, SubmitReceipt, SubmitState};

/// One remote call as seen by [`FakePackApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchPack(String),
    FetchLibrary,
    Unbind(String),
    Update {
        pack_id: String,
        attach: Vec<String>,
        uploads: Vec<String>,
    },
    Create {
        attach: Vec<String>,
        uploads: Vec<String>,
    },
}

/// In-memory pack server that records every call in order.
///
/// Unbinds and updates change the stored packs, so a second submission sees the
/// effects of the first. Scripted failures fire once and are then cleared.
#[derive(Default)]
pub struct FakePackApi {
    packs: Mutex<HashMap<PackId, PackDto>>,
    library: Vec<RemoteSample>,
    calls: Mutex<Vec<Call>>,
    failing_unbinds: Mutex<HashMap<SampleId, ApiError>>,
    failing_update: Mutex<Option<ApiError>>,
    failing_fetch: Mutex<Option<ApiError>>,
    next_upload: Mutex<usize>,
}

impl FakePackApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pack(self, id: &str, sample_ids: &[&str]) -> Self {
        let dto = PackDto {
            id: PackId::new(id),
            title: format!("Pack {}", id),
            description: String::new(),
            price_cents: 999,
            genres: vec![],
            tags: vec![],
            cover_url: None,
            samples: sample_ids.iter().map(|s| remote(s)).collect(),
        };
        self.packs.lock().unwrap().insert(dto.id.clone(), dto);
        self
    }

    pub fn with_library(mut self, sample_ids: &[&str]) -> Self {
        self.library = sample_ids.iter().map(|s| remote(s)).collect();
        self
    }

    pub fn fail_unbind(&self, sample_id: &str, error: ApiError) {
        self.failing_unbinds
            .lock()
            .unwrap()
            .insert(SampleId::from(sample_id), error);
    }

    pub fn fail_update(&self, error: ApiError) {
        *self.failing_update.lock().unwrap() = Some(error);
    }

    pub fn fail_fetch(&self, error: ApiError) {
        *self.failing_fetch.lock().unwrap() = Some(error);
    }

    /// Changes pack membership behind the client's back.
    pub fn server_unbind(&self, pack_id: &str, sample_id: &str) {
        if let Some(pack) = self.packs.lock().unwrap().get_mut(&PackId::new(pack_id)) {
            pack.samples.retain(|s| s.id.as_str() != sample_id);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn pack_sample_ids(&self, pack_id: &str) -> Vec<String> {
        self.packs.lock().unwrap()[&PackId::new(pack_id)]
            .samples
            .iter()
            .map(|s| s.id.to_string())
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn upload_ids(&self, payload: &PackPayload) -> Vec<RemoteSample> {
        let mut next = self.next_upload.lock().unwrap();
        payload
            .new_uploads
            .iter()
            .map(|upload| {
                *next += 1;
                RemoteSample {
                    id: SampleId::new(format!("up{}", *next)),
                    preview_url: String::new(),
                    metadata: upload.metadata.clone(),
                }
            })
            .collect()
    }
}

#[async_trait]
impl PackApi for FakePackApi {
    async fn fetch_pack(&self, pack_id: &PackId) -> Result<PackDto, ApiError> {
        self.record(Call::FetchPack(pack_id.to_string()));
        if let Some(error) = self.failing_fetch.lock().unwrap().take() {
            return Err(error);
        }
        self.packs
            .lock()
            .unwrap()
            .get(pack_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("pack {}", pack_id)))
    }

    async fn fetch_library(&self) -> Result<Vec<RemoteSample>, ApiError> {
        self.record(Call::FetchLibrary);
        Ok(self.library.clone())
    }

    async fn unbind_sample(&self, sample_id: &SampleId, pack_id: &PackId) -> Result<(), ApiError> {
        self.record(Call::Unbind(sample_id.to_string()));
        if let Some(error) = self.failing_unbinds.lock().unwrap().remove(sample_id) {
            return Err(error);
        }
        let mut packs = self.packs.lock().unwrap();
        let pack = packs
            .get_mut(pack_id)
            .ok_or_else(|| ApiError::NotFound(format!("pack {}", pack_id)))?;
        pack.samples.retain(|s| &s.id != sample_id);
        Ok(())
    }

    async fn submit_pack_update(
        &self,
        pack_id: &PackId,
        payload: PackPayload,
        progress: Progress,
    ) -> Result<PackReceipt, ApiError> {
        self.record(Call::Update {
            pack_id: pack_id.to_string(),
            attach: payload.library_attach_ids.iter().map(ToString::to_string).collect(),
            uploads: payload.new_uploads.iter().map(|u| u.file.file_name().to_string()).collect(),
        });
        if let Some(error) = self.failing_update.lock().unwrap().take() {
            return Err(error);
        }

        progress.report(0);
        progress.report(60);
        progress.report(40);
        progress.report(90);

        let uploaded = self.upload_ids(&payload);
        let mut packs = self.packs.lock().unwrap();
        let pack = packs
            .get_mut(pack_id)
            .ok_or_else(|| ApiError::NotFound(format!("pack {}", pack_id)))?;
        pack.title = payload.metadata.title.clone();
        for id in &payload.library_attach_ids {
            if pack.samples.iter().any(|s| &s.id == id) {
                return Err(ApiError::Api {
                    status: 409,
                    message: format!("sample {} is already in the pack", id),
                });
            }
            pack.samples.push(remote(id.as_str()));
        }
        pack.samples.extend(uploaded);

        Ok(PackReceipt {
            id: pack_id.clone(),
            sample_count: Some(pack.samples.len()),
        })
    }

    async fn submit_pack_create(
        &self,
        payload: PackPayload,
        progress: Progress,
    ) -> Result<PackReceipt, ApiError> {
        self.record(Call::Create {
            attach: payload.library_attach_ids.iter().map(ToString::to_string).collect(),
            uploads: payload.new_uploads.iter().map(|u| u.file.file_name().to_string()).collect(),
        });
        let bytes = progress.bytes(100);
        bytes.advance(50);
        bytes.advance(50);

        let mut samples: Vec<RemoteSample> =
            payload.library_attach_ids.iter().map(|id| remote(id.as_str())).collect();
        samples.extend(self.upload_ids(&payload));
        let id = PackId::new(format!("new-{}", self.packs.lock().unwrap().len() + 1));
        let count = samples.len();
        self.packs.lock().unwrap().insert(
            id.clone(),
            PackDto {
                id: id.clone(),
                title: payload.metadata.title.clone(),
                description: payload.metadata.description.clone(),
                price_cents: payload.metadata.price_cents,
                genres: payload.metadata.genres.clone(),
                tags: payload.metadata.tags.clone(),
                cover_url: None,
                samples,
            },
        );
        Ok(PackReceipt {
            id,
            sample_count: Some(count),
        })
    }
}

pub fn remote(id: &str) -> RemoteSample {
    RemoteSample {
        id: SampleId::from(id),
        preview_url: format!("https://cdn.example/{}.mp3", id),
        metadata: SampleMetadata {
            name: id.to_uppercase(),
            ..Default::default()
        },
    }
}

pub fn previews() -> Arc<ObjectUrlTable> {
    Arc::new(ObjectUrlTable::new())
}

/// Observer that keeps everything it is told.
#[derive(Default)]
pub struct RecordingObserver {
    pub states: Mutex<Vec<SubmitState>>,
    pub progress: Mutex<Vec<u8>>,
    pub completed: Mutex<Vec<SubmitReceipt>>,
    pub auth_expired: Mutex<Vec<std::time::Duration>>,
}

impl SubmitObserver for RecordingObserver {
    fn state_changed(&self, state: &SubmitState) {
        self.states.lock().unwrap().push(*state);
    }

    fn progress(&self, percent: u8) {
        self.progress.lock().unwrap().push(percent);
    }

    fn completed(&self, receipt: &SubmitReceipt) {
        self.completed.lock().unwrap().push(receipt.clone());
    }

    fn auth_expired(&self, delay: std::time::Duration) {
        self.auth_expired.lock().unwrap().push(delay);
    }
}
