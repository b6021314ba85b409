use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use combiner_core::{
    update, Effect, JobId, Msg, StatusResult, TrackerState, UploadForm, POLL_INTERVAL,
};
use combiner_logging::{combiner_debug, combiner_error, combiner_info, combiner_warn};
use tokio::sync::mpsc;

use crate::{JobApi, JobRegistry, PresentationAdapter, StatusPoller};

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub poll_interval: Duration,
    pub download_dir: PathBuf,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            download_dir: PathBuf::from("."),
        }
    }
}

/// Spawned requests; only actions are awaited by `run_until_idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    StatusCheck,
    Action,
}

#[derive(Debug)]
struct Inbound {
    msg: Msg,
    /// Set on responses to requests this controller spawned.
    completes: Option<Request>,
}

/// Cloneable entry point for user actions; everything lands on the
/// controller's single event queue.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<Inbound>,
}

impl ControllerHandle {
    /// Returns `false` once the controller is gone.
    pub fn send(&self, msg: Msg) -> bool {
        self.tx
            .send(Inbound {
                msg,
                completes: None,
            })
            .is_ok()
    }

    pub fn create(&self, form: UploadForm) -> bool {
        self.send(Msg::CreateRequested(form))
    }

    /// `None` means the user dismissed the prompt.
    pub fn rename(&self, job_id: JobId, name: Option<String>) -> bool {
        self.send(Msg::RenameRequested { job_id, name })
    }

    pub fn delete(&self, job_id: JobId) -> bool {
        self.send(Msg::DeleteRequested { job_id })
    }

    pub fn download(&self, job_id: JobId) -> bool {
        self.send(Msg::DownloadRequested { job_id })
    }
}

/// Drives job lifecycles: applies every queued message to the core state
/// machine, one at a time, and executes the resulting effects.
///
/// Requests run as separate tasks and post their response back to the queue,
/// so a slow request for one job never delays another.
pub struct JobLifecycleController<A, P> {
    state: TrackerState,
    registry: JobRegistry,
    api: Arc<A>,
    poller: StatusPoller<A>,
    presenter: P,
    download_dir: PathBuf,
    in_flight: usize,
    actions_in_flight: usize,
    tx: mpsc::UnboundedSender<Inbound>,
    rx: mpsc::UnboundedReceiver<Inbound>,
}

impl<A, P> JobLifecycleController<A, P>
where
    A: JobApi + 'static,
    P: PresentationAdapter,
{
    pub fn new(api: Arc<A>, presenter: P, settings: ControllerSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: TrackerState::with_poll_interval(settings.poll_interval),
            registry: JobRegistry::new(),
            poller: StatusPoller::new(Arc::clone(&api)),
            api,
            presenter,
            download_dir: settings.download_dir,
            in_flight: 0,
            actions_in_flight: 0,
            tx,
            rx,
        }
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Requests sent and not yet answered.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Create, rename, delete and download requests not yet answered.
    pub fn actions_in_flight(&self) -> usize {
        self.actions_in_flight
    }

    /// No request outstanding and no job being polled.
    pub fn is_settled(&self) -> bool {
        self.in_flight == 0 && self.registry.is_empty()
    }

    /// Apply one message immediately, bypassing the queue.
    pub fn dispatch(&mut self, msg: Msg) {
        log_inbound(&self.state, &msg);
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.run_effect(effect);
        }
    }

    /// Wait for the next queued message and apply it.
    pub async fn step(&mut self) {
        // The controller keeps a sender, so the queue never closes.
        if let Some(inbound) = self.rx.recv().await {
            self.apply(inbound);
        }
    }

    /// Process messages until every job is finished or deleted and no request
    /// is outstanding.
    pub async fn run_until_settled(&mut self) {
        self.run_while(|controller| !controller.is_settled()).await;
    }

    /// Process messages until every user action has been answered. Timers and
    /// status checks of unfinished jobs keep running and are not waited for.
    pub async fn run_until_idle(&mut self) {
        self.run_while(|controller| controller.actions_in_flight > 0).await;
    }

    /// Stop every timer. Responses still in flight are dropped with the queue.
    pub fn shutdown(mut self) -> (TrackerState, P) {
        self.registry.cancel_all();
        (self.state, self.presenter)
    }

    async fn run_while(&mut self, busy: impl Fn(&Self) -> bool) {
        loop {
            // Drain what is already queued, then block only if work remains.
            while let Ok(inbound) = self.rx.try_recv() {
                self.apply(inbound);
            }
            if !busy(self) {
                return;
            }
            self.step().await;
        }
    }

    fn apply(&mut self, inbound: Inbound) {
        if let Some(request) = inbound.completes {
            self.in_flight = self.in_flight.saturating_sub(1);
            if request == Request::Action {
                self.actions_in_flight = self.actions_in_flight.saturating_sub(1);
            }
        }
        self.dispatch(inbound.msg);
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::SubmitCreate(form) => {
                combiner_info!("Creating job name={:?} files={}", form.name, form.files.len());
                let api = Arc::clone(&self.api);
                self.spawn_request(Request::Action, async move {
                    match api.create(&form).await {
                        Ok(job) => Msg::CreateSucceeded(job),
                        Err(err) => Msg::CreateFailed {
                            message: err.message,
                        },
                    }
                });
            }
            Effect::SchedulePolling { job_id, interval } => {
                let tx = self.tx.clone();
                self.registry.schedule(job_id, interval, move |job_id| {
                    tx.send(Inbound {
                        msg: Msg::PollTick {
                            job_id: job_id.clone(),
                        },
                        completes: None,
                    })
                    .is_ok()
                });
            }
            Effect::CancelPolling { job_id } => {
                self.registry.cancel(&job_id);
            }
            Effect::CheckStatus { job_id, current } => {
                let poller = self.poller.clone();
                self.spawn_request(Request::StatusCheck, async move {
                    let result = poller.check(&job_id, current).await;
                    Msg::StatusChecked { job_id, result }
                });
            }
            Effect::SubmitRename { job_id, name } => {
                let api = Arc::clone(&self.api);
                self.spawn_request(Request::Action, async move {
                    match api.rename(&job_id, &name).await {
                        Ok(name) => Msg::RenameSucceeded { job_id, name },
                        Err(err) => Msg::RenameFailed {
                            job_id,
                            message: err.message,
                        },
                    }
                });
            }
            Effect::SubmitDelete { job_id } => {
                let api = Arc::clone(&self.api);
                self.spawn_request(Request::Action, async move {
                    match api.delete(&job_id).await {
                        Ok(()) => Msg::DeleteSucceeded { job_id },
                        Err(err) => Msg::DeleteFailed {
                            job_id,
                            message: err.message,
                        },
                    }
                });
            }
            Effect::StartDownload { job_id } => {
                let api = Arc::clone(&self.api);
                let dir = self.download_dir.clone();
                self.spawn_request(Request::Action, async move {
                    let result = api
                        .download(&job_id, &dir)
                        .await
                        .map_err(|err| err.to_string());
                    Msg::DownloadFinished { job_id, result }
                });
            }
            Effect::NotifyCreated(job) => self.presenter.apply_job_created(&job),
            Effect::NotifyStatus { job_id, status } => {
                combiner_info!("Job {} is {}", job_id, status);
                self.presenter.apply_status(&job_id, status);
            }
            Effect::NotifyRenamed { job_id, name } => self.presenter.apply_renamed(&job_id, &name),
            Effect::NotifyRemoved { job_id } => {
                combiner_info!("Job {} deleted", job_id);
                self.presenter.apply_removed(&job_id);
            }
            Effect::NotifyDownloaded { job_id, path } => {
                self.presenter.apply_downloaded(&job_id, &path)
            }
            Effect::NotifyFailure {
                operation,
                job_id,
                message,
            } => {
                combiner_error!("{:?} failed job_id={:?}: {}", operation, job_id, message);
                self.presenter
                    .report_failure(operation, job_id.as_ref(), &message);
            }
        }
    }

    fn spawn_request<F>(&mut self, kind: Request, request: F)
    where
        F: Future<Output = Msg> + Send + 'static,
    {
        self.in_flight += 1;
        if kind == Request::Action {
            self.actions_in_flight += 1;
        }
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let msg = request.await;
            let _ = tx.send(Inbound {
                msg,
                completes: Some(kind),
            });
        });
    }
}

fn log_inbound(state: &TrackerState, msg: &Msg) {
    let Msg::StatusChecked { job_id, result } = msg else {
        return;
    };
    match state.job(job_id) {
        None => combiner_debug!("Discarding status for untracked job_id={}", job_id),
        Some(job) if job.status.is_terminal() => {
            combiner_debug!("Discarding status for finished job_id={}", job_id)
        }
        Some(_) => {
            if let StatusResult::TransportFailure(reason) = result {
                combiner_warn!("Status check failed job_id={}: {}; retrying next tick", job_id, reason);
            }
        }
    }
}
