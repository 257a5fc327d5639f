use serde::Serialize;
use tracing::{debug, warn};

use super::SubmitError;
use crate::api::PackApi;
use crate::pack::PackId;
use crate::sample::SampleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnbindStep {
    pub sample_id: SampleId,
    pub status: StepStatus,
}

/// Ordered unbind calls for one submission.
///
/// Steps run strictly one after another. The first failure stops the queue; later steps
/// stay [`StepStatus::Pending`] and are never attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnbindQueue {
    pack_id: PackId,
    steps: Vec<UnbindStep>,
}

impl UnbindQueue {
    pub fn new(pack_id: PackId, sample_ids: impl IntoIterator<Item = SampleId>) -> Self {
        Self {
            pack_id,
            steps: sample_ids
                .into_iter()
                .map(|sample_id| UnbindStep {
                    sample_id,
                    status: StepStatus::Pending,
                })
                .collect(),
        }
    }

    pub fn steps(&self) -> &[UnbindStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the step that failed, if any.
    pub fn failed_index(&self) -> Option<usize> {
        self.steps.iter().position(|s| s.status == StepStatus::Failed)
    }

    pub fn completed(&self) -> Vec<SampleId> {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Done)
            .map(|s| s.sample_id.clone())
            .collect()
    }

    /// Runs every pending step in order. `on_step` is told the 1-based step number and
    /// the total right before each call.
    pub async fn run<F>(&mut self, api: &dyn PackApi, mut on_step: F) -> Result<(), SubmitError>
    where
        F: FnMut(usize, usize),
    {
        let total = self.steps.len();
        for index in 0..total {
            if self.steps[index].status != StepStatus::Pending {
                continue;
            }
            let step = index + 1;
            on_step(step, total);

            let sample_id = self.steps[index].sample_id.clone();
            match api.unbind_sample(&sample_id, &self.pack_id).await {
                Ok(()) => {
                    debug!(sample_id = %sample_id, step, total, "Unbound sample");
                    self.steps[index].status = StepStatus::Done;
                }
                Err(source) => {
                    warn!(
                        sample_id = %sample_id,
                        step,
                        total,
                        error = %source,
                        "Unbind failed, aborting submission"
                    );
                    self.steps[index].status = StepStatus::Failed;
                    return Err(SubmitError::Unbind {
                        step,
                        total,
                        sample_id,
                        completed: self.completed(),
                        source,
                    });
                }
            }
        }
        Ok(())
    }
}
