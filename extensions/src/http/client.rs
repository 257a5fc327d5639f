use async_trait::async_trait;
use packsync_core::api::{ApiError, PackApi, PackDto, PackPayload, PackReceipt, RemoteSample};
use packsync_core::pack::PackId;
use packsync_core::progress::Progress;
use packsync_core::sample::SampleId;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};

use super::config::HttpConfig;
use super::error::{map_response_error, map_transport_error};
use super::multipart::build_form;

/// [`PackApi`] over the pack server's REST interface.
#[derive(Clone, Debug)]
pub struct PackClient {
    config: HttpConfig,
    http_client: Client,
}

impl PackClient {
    /// Builds a client with its own connection pool.
    #[instrument(name = "pack_client_new", skip(config))]
    pub fn new(config: HttpConfig) -> Result<Self, ApiError> {
        debug!(target: "packsync::api", timeout = ?config.timeout, "Building default HTTP client.");
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ApiError::Configuration(format!("Failed to build default HTTP client: {}", e))
            })?;
        Ok(Self::with_client(config, http_client))
    }

    pub fn with_client(config: HttpConfig, http_client: Client) -> Self {
        debug!(target: "packsync::api", base_url = %config.base_url, "Pack client initialized.");
        Self { config, http_client }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(self.config.bearer())
            .header(ACCEPT, "application/json")
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.authorized(builder).send().await.map_err(|e| {
            error!(target: "packsync::api", error = %e, "Request failed");
            map_transport_error(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(
                target: "packsync::api",
                status = status.as_u16(),
                "Server returned error status"
            );
            return Err(map_response_error(response).await);
        }
        debug!(target: "packsync::api", status = status.as_u16(), "Request succeeded");
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let body = response.bytes().await.map_err(map_transport_error)?;
        serde_json::from_slice(&body).map_err(|e| {
            error!(target: "packsync::api", error = %e, "Failed to deserialize success response");
            ApiError::Parsing(Box::new(e))
        })
    }

    async fn send_pack(
        &self,
        builder: RequestBuilder,
        payload: &PackPayload,
        progress: Progress,
    ) -> Result<PackReceipt, ApiError> {
        let form = build_form(payload, &progress).await?;
        let response = self.send(builder.multipart(form)).await?;
        let receipt: PackReceipt = Self::read_json(response).await?;
        progress.finish();
        Ok(receipt)
    }
}

#[async_trait]
impl PackApi for PackClient {
    #[instrument(skip(self), fields(pack_id = %pack_id))]
    async fn fetch_pack(&self, pack_id: &PackId) -> Result<PackDto, ApiError> {
        let url = self.config.endpoint(&["packs", pack_id.as_str()])?;
        debug!(target: "packsync::api", url = %url, "Fetching pack");
        let response = self.send(self.http_client.get(url)).await?;
        Self::read_json(response).await
    }

    #[instrument(skip(self))]
    async fn fetch_library(&self) -> Result<Vec<RemoteSample>, ApiError> {
        let url = self.config.endpoint(&["library", "samples"])?;
        debug!(target: "packsync::api", url = %url, "Fetching library");
        let response = self.send(self.http_client.get(url)).await?;
        Self::read_json(response).await
    }

    #[instrument(skip(self), fields(sample_id = %sample_id, pack_id = %pack_id))]
    async fn unbind_sample(&self, sample_id: &SampleId, pack_id: &PackId) -> Result<(), ApiError> {
        let url = self
            .config
            .endpoint(&["packs", pack_id.as_str(), "samples", sample_id.as_str()])?;
        debug!(target: "packsync::api", url = %url, "Unbinding sample");
        self.send(self.http_client.delete(url)).await?;
        Ok(())
    }

    #[instrument(
        skip(self, payload, progress),
        fields(
            pack_id = %pack_id,
            uploads = payload.new_uploads.len(),
            attach = payload.library_attach_ids.len()
        )
    )]
    async fn submit_pack_update(
        &self,
        pack_id: &PackId,
        payload: PackPayload,
        progress: Progress,
    ) -> Result<PackReceipt, ApiError> {
        let url = self.config.endpoint(&["packs", pack_id.as_str()])?;
        debug!(target: "packsync::api", url = %url, "Sending pack update");
        self.send_pack(self.http_client.put(url), &payload, progress).await
    }

    #[instrument(
        skip(self, payload, progress),
        fields(uploads = payload.new_uploads.len(), attach = payload.library_attach_ids.len())
    )]
    async fn submit_pack_create(
        &self,
        payload: PackPayload,
        progress: Progress,
    ) -> Result<PackReceipt, ApiError> {
        let url = self.config.endpoint(&["packs"])?;
        debug!(target: "packsync::api", url = %url, "Sending pack create");
        self.send_pack(self.http_client.post(url), &payload, progress).await
    }
}
