
pub mod api;
pub mod form;
pub mod pack;
pub mod preview;
pub mod progress;
pub mod reconcile;
pub mod sample;
pub mod snapshot;
pub mod submit;

pub use api::{ApiError, PackApi};
pub use form::PackForm;
pub use reconcile::ReconcilePlan;
pub use snapshot::{PackSnapshot, SnapshotLoader};
pub use submit::{Submission, SubmitFailure, SubmitObserver};
