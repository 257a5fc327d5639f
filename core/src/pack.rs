use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sample::SampleFile;

/// Server-side identifier of a pack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackId(String);

impl PackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PackId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Cover artwork of a pack.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoverImage {
    #[default]
    None,
    /// Cover already stored on the server.
    Remote { url: String },
    /// New local image that replaces whatever the server has.
    Replace { file: SampleFile },
}

impl CoverImage {
    pub fn pending_file(&self) -> Option<&SampleFile> {
        match self {
            CoverImage::Replace { file } => Some(file),
            _ => None,
        }
    }
}

/// Pack-level fields. The update call treats these as a full replacement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackMetadata {
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
    pub cover: CoverImage,
}

/// Trims labels, drops empty ones and removes case-insensitive duplicates while
/// keeping the first spelling.
pub fn normalize_labels<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    labels
        .into_iter()
        .map(|label| label.as_ref().trim().to_string())
        .filter(|label| !label.is_empty())
        .filter(|label| seen.insert(label.to_lowercase()))
        .collect()
}
