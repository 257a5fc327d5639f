use serde::Serialize;
use thiserror::Error;

use crate::api::ApiError;
use crate::sample::SampleId;
use crate::snapshot::LoadError;

/// What the caller should do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Detected locally before any remote call.
    Validation,
    /// Session expired or invalid; the user has to sign in again.
    Authentication,
    /// Transport failure; retrying later may help.
    Network,
    /// An unbind failed after earlier ones were applied.
    PartialUnbind,
    Unexpected,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("A pack needs at least one sample")]
    NoSamples,

    #[error("A pack needs a title")]
    MissingTitle,

    #[error("This form has already been submitted")]
    AlreadySubmitted,

    #[error("Failed to re-read the pack before submitting: {0}")]
    Refetch(#[source] LoadError),

    #[error("Failed to unbind sample '{sample_id}' (step {step} of {total}): {source}")]
    Unbind {
        /// 1-based position in the unbind sequence.
        step: usize,
        total: usize,
        sample_id: SampleId,
        /// Unbinds that were applied before the failure. They are not rolled back.
        completed: Vec<SampleId>,
        #[source]
        source: ApiError,
    },

    #[error("Failed to update the pack: {0}")]
    Update(#[source] ApiError),

    #[error("Failed to create the pack: {0}")]
    Create(#[source] ApiError),
}

impl SubmitError {
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SubmitError::Refetch(e) => e.api_error(),
            SubmitError::Unbind { source, .. } => Some(source),
            SubmitError::Update(e) | SubmitError::Create(e) => Some(e),
            _ => None,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            SubmitError::NoSamples | SubmitError::MissingTitle | SubmitError::AlreadySubmitted => {
                FailureKind::Validation
            }
            _ if self.api_error().is_some_and(ApiError::is_unauthorized) => {
                FailureKind::Authentication
            }
            SubmitError::Unbind { .. } => FailureKind::PartialUnbind,
            _ if self.api_error().is_some_and(ApiError::is_network) => FailureKind::Network,
            _ => FailureKind::Unexpected,
        }
    }

    /// Message suitable for showing to the user as is.
    pub fn user_message(&self) -> String {
        match self.kind() {
            FailureKind::Validation => self.to_string(),
            FailureKind::Authentication => {
                "Your session has expired. Please sign in again.".to_string()
            }
            FailureKind::Network => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            FailureKind::PartialUnbind => match self {
                SubmitError::Unbind {
                    step,
                    total,
                    sample_id,
                    completed,
                    source,
                } => format!(
                    "Removing sample '{}' from the pack failed (step {} of {}): {}. \
                     {} earlier removal(s) were already applied. \
                     Submit again to finish the remaining changes.",
                    sample_id,
                    step,
                    total,
                    source,
                    completed.len()
                ),
                other => other.to_string(),
            },
            FailureKind::Unexpected => format!("Saving the pack failed: {}", self),
        }
    }
}

/// A failure as reported at the submission boundary: classification, user-facing
/// message and the underlying error.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SubmitFailure {
    pub kind: FailureKind,
    pub message: String,
    #[source]
    pub error: SubmitError,
}

impl From<SubmitError> for SubmitFailure {
    fn from(error: SubmitError) -> Self {
        Self {
            kind: error.kind(),
            message: error.user_message(),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::PackId;

    fn network() -> ApiError {
        ApiError::Network("connection reset".into())
    }

    #[test]
    fn validation_errors_are_local() {
        assert_eq!(SubmitError::NoSamples.kind(), FailureKind::Validation);
        assert_eq!(SubmitError::MissingTitle.kind(), FailureKind::Validation);
    }

    #[test]
    fn auth_wins_over_step_attribution() {
        let err = SubmitError::Unbind {
            step: 1,
            total: 2,
            sample_id: SampleId::from("s1"),
            completed: vec![],
            source: ApiError::Unauthorized("token expired".into()),
        };
        assert_eq!(err.kind(), FailureKind::Authentication);
    }

    #[test]
    fn unbind_failure_names_the_sample() {
        let err = SubmitError::Unbind {
            step: 2,
            total: 3,
            sample_id: SampleId::from("s2"),
            completed: vec![SampleId::from("s1")],
            source: network(),
        };
        let failure = SubmitFailure::from(err);
        assert_eq!(failure.kind, FailureKind::PartialUnbind);
        assert!(failure.message.contains("'s2'"));
        assert!(failure.message.contains("step 2 of 3"));
        assert!(failure.message.contains("1 earlier removal"));
    }

    #[test]
    fn transport_and_unknown_failures() {
        assert_eq!(SubmitError::Update(network()).kind(), FailureKind::Network);
        assert_eq!(
            SubmitError::Create(ApiError::Api { status: 500, message: "boom".into() }).kind(),
            FailureKind::Unexpected
        );
        let refetch = SubmitError::Refetch(LoadError::NotFound(PackId::new("p")));
        assert_eq!(refetch.kind(), FailureKind::Unexpected);
        assert!(refetch.user_message().contains("'p' was not found"));
    }
}
