//! Combiner core: pure job lifecycle state machine and view-model helpers.
mod effect;
mod job;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, Operation};
pub use job::{Job, JobId, JobStatus, StatusResult, UnrecognizedStatus, UploadForm, UploadedFile};
pub use msg::Msg;
pub use state::{TrackerState, POLL_INTERVAL};
pub use update::update;
pub use view_model::{Affordances, JobView, TrackerViewModel};
