//! Sample rows as they live inside a pack-editing form.
//!
//! A [`SampleRecord`] is always exactly one of three things, expressed by
//! [`SampleSource`]:
//!
//! *   **New upload:** a local file that has not been sent to the server yet. It owns a
//!     locally created preview URL and its metadata is editable.
//! *   **Library addition:** a sample from the user's personal library that is being
//!     attached to the pack in this session. Metadata is read-only.
//! *   **Pack original:** a sample that was bound to the pack when editing began.
//!     Metadata is read-only.
//!
//! The flag view used by drafts and the wire (`fromLibrary`, `alreadyInPack`, ...) is
//! derived from the variant, see [`SampleRecord::flags`] and [`provenance::classify`].

pub mod provenance;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::RemoteSample;
use crate::preview::PreviewUrl;

pub use provenance::{InvalidRow, Provenance, SampleFlags, classify};

/// Server-side identifier of a sample.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleId(String);

impl SampleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SampleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a row within one editing session. Never sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(String);

impl LocalId {
    /// Deterministic id for a row mapped from the pack's server state, so repeated
    /// loads produce identical ids.
    pub fn for_pack_sample(remote_id: &SampleId) -> Self {
        Self(format!("pack:{}", remote_id))
    }

    pub fn for_library_sample(remote_id: &SampleId) -> Self {
        Self(format!("library:{}", remote_id))
    }

    pub fn fresh_upload() -> Self {
        Self(format!("upload:{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocalId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Handle to a local audio file that is waiting to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleFile {
    path: PathBuf,
    file_name: String,
}

impl SampleFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sample".to_string());
        Self { path, file_name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used for the multipart part.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// File name without extension, used as the default display name.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    #[default]
    OneShot,
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    Major,
    Minor,
}

/// Coarse instrument classification shown in the marketplace filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentGroup {
    Drums,
    Bass,
    Keys,
    Synth,
    Guitar,
    Vocals,
    Fx,
    #[default]
    Other,
}

/// Descriptive fields of a sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleMetadata {
    pub name: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub bpm: Option<u32>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub scale: Option<Scale>,
    #[serde(default)]
    pub kind: SampleKind,
    #[serde(default)]
    pub instrument_group: InstrumentGroup,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SampleMetadata {
    /// Default metadata for a freshly selected file: name from the file stem,
    /// default classification everywhere else.
    pub fn for_upload(file: &SampleFile) -> Self {
        Self {
            name: file.stem(),
            ..Self::default()
        }
    }
}

/// A single-field edit on a new upload's metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleEdit {
    Name(String),
    Artist(String),
    Bpm(Option<u32>),
    Key(Option<String>),
    Scale(Option<Scale>),
    Kind(SampleKind),
    InstrumentGroup(InstrumentGroup),
    Tags(Vec<String>),
}

impl SampleEdit {
    pub(crate) fn apply(self, metadata: &mut SampleMetadata) {
        match self {
            SampleEdit::Name(name) => metadata.name = name,
            SampleEdit::Artist(artist) => metadata.artist = artist,
            SampleEdit::Bpm(bpm) => metadata.bpm = bpm,
            SampleEdit::Key(key) => metadata.key = key,
            SampleEdit::Scale(scale) => metadata.scale = scale,
            SampleEdit::Kind(kind) => metadata.kind = kind,
            SampleEdit::InstrumentGroup(group) => metadata.instrument_group = group,
            SampleEdit::Tags(tags) => metadata.tags = tags,
        }
    }
}

/// Where a row's audio comes from. Each variant carries only what it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleSource {
    NewUpload { file: SampleFile },
    LibraryAddition { remote_id: SampleId },
    PackOriginal { remote_id: SampleId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    local_id: LocalId,
    source: SampleSource,
    preview_url: PreviewUrl,
    metadata: SampleMetadata,
}

impl SampleRecord {
    /// A new upload. `preview_url` must be a locally created resource; the owning form
    /// is responsible for revoking it.
    pub fn new_upload(
        local_id: LocalId,
        file: SampleFile,
        preview_url: PreviewUrl,
        metadata: SampleMetadata,
    ) -> Self {
        Self {
            local_id,
            source: SampleSource::NewUpload { file },
            preview_url,
            metadata,
        }
    }

    pub fn library_addition(sample: &RemoteSample) -> Self {
        Self {
            local_id: LocalId::for_library_sample(&sample.id),
            source: SampleSource::LibraryAddition {
                remote_id: sample.id.clone(),
            },
            preview_url: PreviewUrl::new(sample.preview_url.clone()),
            metadata: sample.metadata.clone(),
        }
    }

    pub fn pack_original(sample: &RemoteSample) -> Self {
        Self {
            local_id: LocalId::for_pack_sample(&sample.id),
            source: SampleSource::PackOriginal {
                remote_id: sample.id.clone(),
            },
            preview_url: PreviewUrl::new(sample.preview_url.clone()),
            metadata: sample.metadata.clone(),
        }
    }

    /// Rebuilds a row whose identity was already established elsewhere (drafts).
    pub(crate) fn from_parts(
        local_id: LocalId,
        source: SampleSource,
        preview_url: PreviewUrl,
        metadata: SampleMetadata,
    ) -> Self {
        Self {
            local_id,
            source,
            preview_url,
            metadata,
        }
    }

    pub fn local_id(&self) -> &LocalId {
        &self.local_id
    }

    pub fn source(&self) -> &SampleSource {
        &self.source
    }

    pub fn preview_url(&self) -> &PreviewUrl {
        &self.preview_url
    }

    pub fn metadata(&self) -> &SampleMetadata {
        &self.metadata
    }

    pub fn remote_id(&self) -> Option<&SampleId> {
        match &self.source {
            SampleSource::NewUpload { .. } => None,
            SampleSource::LibraryAddition { remote_id }
            | SampleSource::PackOriginal { remote_id } => Some(remote_id),
        }
    }

    pub fn source_file(&self) -> Option<&SampleFile> {
        match &self.source {
            SampleSource::NewUpload { file } => Some(file),
            _ => None,
        }
    }

    pub fn from_library(&self) -> bool {
        !matches!(self.source, SampleSource::NewUpload { .. })
    }

    pub fn already_in_pack(&self) -> bool {
        matches!(self.source, SampleSource::PackOriginal { .. })
    }

    pub fn provenance(&self) -> Provenance {
        match self.source {
            SampleSource::NewUpload { .. } => Provenance::NewUpload,
            SampleSource::LibraryAddition { .. } => Provenance::LibraryAddition,
            SampleSource::PackOriginal { .. } => Provenance::PackOriginal,
        }
    }

    pub fn flags(&self) -> SampleFlags {
        SampleFlags {
            from_library: self.from_library(),
            already_in_pack: self.already_in_pack(),
            has_remote_id: self.remote_id().is_some(),
            has_source_file: self.source_file().is_some(),
        }
    }

    /// Metadata is owned by the library for remote rows, so only new uploads hand out
    /// a mutable reference.
    pub(crate) fn editable_metadata(&mut self) -> Option<&mut SampleMetadata> {
        match self.source {
            SampleSource::NewUpload { .. } => Some(&mut self.metadata),
            _ => None,
        }
    }
}
