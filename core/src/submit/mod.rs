//! Turning a finished form into remote calls.
//!
//! A [`Submission`] walks one form through
//!
//! ```text
//! Idle -> Validating -> (UploadMode | EditMode) -> Unbinding* -> Submitting
//!      -> (Succeeded | Failed)
//! ```
//!
//! Remote calls never overlap. In edit mode the baseline is fetched again right before
//! diffing, so a retry after a partial failure only sees the work that is still left.
//! All unbinds resolve before the additive update is sent.
//!
//! There is no concurrency token between the re-fetch and the update. A change made by
//! someone else in that window is not detected.

mod error;
mod unbind;

pub use error::{FailureKind, SubmitError, SubmitFailure};
pub use unbind::{StepStatus, UnbindQueue, UnbindStep};

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use crate::api::{PackApi, PackPayload, PackReceipt};
use crate::form::PackForm;
use crate::progress::Progress;
use crate::reconcile::{self, ReconcilePlan};
use crate::snapshot::{PackSnapshot, SnapshotLoader};

/// How long a caller should wait before sending the user to the login screen after an
/// authentication failure.
pub const LOGIN_REDIRECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmitState {
    Idle,
    Validating,
    UploadMode,
    EditMode,
    /// 1-based step out of `total`.
    Unbinding { step: usize, total: usize },
    Submitting,
    Succeeded,
    Failed { kind: FailureKind },
}

/// Receives lifecycle notifications. Every method has a no-op default.
pub trait SubmitObserver: Send + Sync {
    fn state_changed(&self, _state: &SubmitState) {}

    /// Upload progress in `0..=100`, strictly increasing within one attempt.
    fn progress(&self, _percent: u8) {}

    fn completed(&self, _receipt: &SubmitReceipt) {}

    /// The session is no longer valid. The caller should redirect to login after `delay`.
    fn auth_expired(&self, _delay: Duration) {}
}

pub struct NoopObserver;

impl SubmitObserver for NoopObserver {}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    pub pack: PackReceipt,
    /// The plan that was executed.
    pub plan: ReconcilePlan,
}

pub struct Submission<'a> {
    api: &'a dyn PackApi,
    observer: Arc<dyn SubmitObserver>,
    state: SubmitState,
}

impl<'a> Submission<'a> {
    pub fn new(api: &'a dyn PackApi) -> Self {
        Self::with_observer(api, Arc::new(NoopObserver))
    }

    pub fn with_observer(api: &'a dyn PackApi, observer: Arc<dyn SubmitObserver>) -> Self {
        Self {
            api,
            observer,
            state: SubmitState::Idle,
        }
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    /// Submits the form. On success the form is disposed, which releases its local
    /// previews. On failure the form is left untouched and `submit` may be called again.
    #[instrument(skip_all, fields(pack_id = ?form.pack_id().map(|id| id.as_str())))]
    pub async fn submit(&mut self, form: &mut PackForm) -> Result<SubmitReceipt, SubmitFailure> {
        if self.state == SubmitState::Succeeded {
            return Err(SubmitError::AlreadySubmitted.into());
        }

        match self.run(form).await {
            Ok(receipt) => {
                info!(pack_id = %receipt.pack.id, "Pack saved");
                self.transition(SubmitState::Succeeded);
                self.observer.completed(&receipt);
                form.dispose();
                Ok(receipt)
            }
            Err(err) => {
                let failure = SubmitFailure::from(err);
                error!(kind = ?failure.kind, error = %failure.error, "Submission failed");
                if failure.kind == FailureKind::Authentication {
                    self.observer.auth_expired(LOGIN_REDIRECT_DELAY);
                }
                self.transition(SubmitState::Failed { kind: failure.kind });
                Err(failure)
            }
        }
    }

    async fn run(&mut self, form: &PackForm) -> Result<SubmitReceipt, SubmitError> {
        self.transition(SubmitState::Validating);
        validate(form)?;

        let progress = self.progress_sink();
        let api = self.api;

        let Some(loaded) = form.snapshot() else {
            self.transition(SubmitState::UploadMode);
            let plan = reconcile::partition_for_create(form.rows());

            self.transition(SubmitState::Submitting);
            let pack = api
                .submit_pack_create(payload(form, &plan), progress.clone())
                .await
                .map_err(SubmitError::Create)?;
            progress.finish();
            return Ok(SubmitReceipt { pack, plan });
        };

        self.transition(SubmitState::EditMode);
        let fresh = SnapshotLoader::new(api)
            .fetch_snapshot(loaded.pack_id())
            .await
            .map_err(SubmitError::Refetch)?;
        log_drift(loaded, &fresh);

        let plan = reconcile::reconcile(&fresh, form.rows());

        let mut unbinds = UnbindQueue::new(fresh.pack_id().clone(), plan.removals.iter().cloned());
        unbinds
            .run(api, |step, total| {
                self.transition(SubmitState::Unbinding { step, total })
            })
            .await?;

        self.transition(SubmitState::Submitting);
        let pack = api
            .submit_pack_update(fresh.pack_id(), payload(form, &plan), progress.clone())
            .await
            .map_err(SubmitError::Update)?;
        progress.finish();
        Ok(SubmitReceipt { pack, plan })
    }

    fn progress_sink(&self) -> Progress {
        let observer = self.observer.clone();
        Progress::new(move |percent| observer.progress(percent))
    }

    fn transition(&mut self, state: SubmitState) {
        debug!(from = ?self.state, to = ?state, "Submission state");
        self.state = state;
        self.observer.state_changed(&state);
    }
}

fn validate(form: &PackForm) -> Result<(), SubmitError> {
    if form.is_empty() {
        return Err(SubmitError::NoSamples);
    }
    if form.metadata().title.trim().is_empty() {
        return Err(SubmitError::MissingTitle);
    }
    Ok(())
}

fn payload(form: &PackForm, plan: &ReconcilePlan) -> PackPayload {
    PackPayload {
        metadata: form.metadata().clone(),
        new_uploads: plan.new_uploads.clone(),
        library_attach_ids: plan.library_attach.clone(),
    }
}

fn log_drift(loaded: &PackSnapshot, fresh: &PackSnapshot) {
    let drift = loaded.drift_to(fresh);
    if drift.is_empty() {
        return;
    }
    warn!(
        added = ?drift.added.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
        removed = ?drift.removed.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
        "Pack changed on the server since it was loaded"
    );
}
