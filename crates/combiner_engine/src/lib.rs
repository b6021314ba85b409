//! Combiner engine: backend IO, polling timers and effect execution.
mod api;
mod controller;
mod persist;
mod poller;
mod present;
mod registry;
mod types;

pub use api::{ApiSettings, Endpoints, JobApi, ReqwestJobApi};
pub use controller::{ControllerHandle, ControllerSettings, JobLifecycleController};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError, StagedFile};
pub use poller::StatusPoller;
pub use present::PresentationAdapter;
pub use registry::{JobRegistry, PollHandle};
pub use types::{ApiError, FailureKind};
