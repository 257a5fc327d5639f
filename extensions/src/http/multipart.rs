//! Multipart bodies for the pack create/update calls.
//!
//! File parts are streamed from disk. Every chunk handed to reqwest advances a shared
//! [`ByteProgress`], so progress follows the bytes actually written to the socket.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::{Stream, TryStreamExt};
use mime::Mime;
use packsync_core::api::{ApiError, PackPayload};
use packsync_core::pack::PackMetadata;
use packsync_core::progress::{ByteProgress, Progress};
use packsync_core::sample::{LocalId, SampleMetadata};
use reqwest::Body;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::debug;

pub(crate) const SAMPLE_FIELD: &str = "samples";
pub(crate) const COVER_FIELD: &str = "cover";

/// Per-upload metadata, aligned by position with the `samples` file parts.
#[derive(Serialize)]
struct UploadManifest<'a> {
    local_id: &'a LocalId,
    file_name: &'a str,
    #[serde(flatten)]
    metadata: &'a SampleMetadata,
}

/// A file part whose size is known before the body is assembled.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingFile {
    pub field: &'static str,
    pub path: PathBuf,
    pub file_name: String,
    pub len: u64,
}

pub(crate) fn text_fields(payload: &PackPayload) -> Result<Vec<(&'static str, String)>, ApiError> {
    let PackMetadata {
        title,
        description,
        price_cents,
        genres,
        tags,
        ..
    } = &payload.metadata;

    let manifest: Vec<UploadManifest<'_>> = payload
        .new_uploads
        .iter()
        .map(|upload| UploadManifest {
            local_id: &upload.local_id,
            file_name: upload.file.file_name(),
            metadata: &upload.metadata,
        })
        .collect();

    Ok(vec![
        ("title", title.clone()),
        ("description", description.clone()),
        ("price_cents", price_cents.to_string()),
        ("genres", to_json(genres)?),
        ("tags", to_json(tags)?),
        ("library_sample_ids", to_json(&payload.library_attach_ids)?),
        ("sample_metadata", to_json(&manifest)?),
    ])
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Parsing(Box::new(e)))
}

/// Stats every file the payload will stream: uploads in order, then the cover.
pub(crate) async fn pending_files(payload: &PackPayload) -> Result<Vec<PendingFile>, ApiError> {
    let uploads = payload
        .new_uploads
        .iter()
        .map(|upload| (SAMPLE_FIELD, upload.file.path(), upload.file.file_name()));
    let cover = payload
        .metadata
        .cover
        .pending_file()
        .map(|file| (COVER_FIELD, file.path(), file.file_name()));

    let mut files = Vec::with_capacity(payload.new_uploads.len() + 1);
    for (field, path, file_name) in uploads.chain(cover) {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| local_file_error(path, e))?;
        if !metadata.is_file() {
            return Err(local_file_error(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }
        files.push(PendingFile {
            field,
            path: path.to_path_buf(),
            file_name: file_name.to_string(),
            len: metadata.len(),
        });
    }
    Ok(files)
}

/// Assembles the multipart body. Progress starts at 0 here and reaches 100 once the
/// last file byte has been handed to the transport.
pub(crate) async fn build_form(
    payload: &PackPayload,
    progress: &Progress,
) -> Result<Form, ApiError> {
    let files = pending_files(payload).await?;
    let total: u64 = files.iter().map(|f| f.len).sum();
    let counter = Arc::new(progress.bytes(total));
    debug!(
        target: "packsync::api",
        files = files.len(),
        total_bytes = total,
        "Building multipart body"
    );

    let mut form = Form::new();
    for (name, value) in text_fields(payload)? {
        form = form.text(name, value);
    }

    for file in files {
        let handle = File::open(&file.path)
            .await
            .map_err(|e| local_file_error(&file.path, e))?;
        let body = Body::wrap_stream(count_chunks(ReaderStream::new(handle), counter.clone()));
        let part = Part::stream_with_length(body, file.len)
            .file_name(file.file_name.clone())
            .mime_str(guess_mime(&file.path).as_ref())
            .map_err(|e| ApiError::Configuration(format!("Invalid MIME type: {}", e)))?;
        form = form.part(file.field, part);
    }

    Ok(form)
}

/// Advances `counter` by the size of every chunk the stream yields.
pub(crate) fn count_chunks<S, B, E>(
    stream: S,
    counter: Arc<ByteProgress>,
) -> impl Stream<Item = Result<B, E>> + Send + 'static
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + 'static,
    E: 'static,
{
    stream.inspect_ok(move |chunk: &B| counter.advance(chunk.as_ref().len() as u64))
}

pub(crate) fn guess_mime(path: &Path) -> Mime {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let essence = match extension.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("flac") => "audio/flac",
        Some("aif" | "aiff") => "audio/aiff",
        Some("ogg") => "audio/ogg",
        Some("png") => return mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => return mime::IMAGE_JPEG,
        _ => return mime::APPLICATION_OCTET_STREAM,
    };
    essence.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

fn local_file_error(path: &Path, source: std::io::Error) -> ApiError {
    ApiError::LocalFile {
        path: path.to_path_buf(),
        source,
    }
}
