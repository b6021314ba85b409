use crate::{Effect, Job, JobId, JobStatus, JobView, Msg, Operation, StatusResult, TrackerState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: TrackerState, msg: Msg) -> (TrackerState, Vec<Effect>) {
    let effects = match msg {
        Msg::CreateRequested(form) => vec![Effect::SubmitCreate(form)],
        Msg::CreateSucceeded(job) => {
            if state.contains(&job.id) {
                return (state, Vec::new());
            }
            let mut effects = vec![Effect::NotifyCreated(JobView::from(&job))];
            if !job.status.is_terminal() {
                effects.push(Effect::SchedulePolling {
                    job_id: job.id.clone(),
                    interval: state.poll_interval(),
                });
            }
            state.insert_front(job);
            effects
        }
        Msg::CreateFailed { message } => vec![failure(Operation::Create, None, message)],
        Msg::PollTick { job_id } => {
            let current = status_of(&state, &job_id);
            match current {
                Some(current) if !current.is_terminal() => {
                    vec![Effect::CheckStatus { job_id, current }]
                }
                // Finished or deleted: the timer is stale.
                _ => vec![Effect::CancelPolling { job_id }],
            }
        }
        Msg::StatusChecked { job_id, result } => apply_status(&mut state, job_id, result),
        Msg::RenameRequested { job_id, name } => {
            let Some(name) = name.filter(|name| !name.is_empty()) else {
                return (state, Vec::new());
            };
            if state.contains(&job_id) {
                vec![Effect::SubmitRename { job_id, name }]
            } else {
                vec![unknown_job(Operation::Rename, job_id)]
            }
        }
        Msg::RenameSucceeded { job_id, name } => {
            if state.contains(&job_id) {
                state.set_name(&job_id, name.clone());
                vec![Effect::NotifyRenamed { job_id, name }]
            } else {
                Vec::new()
            }
        }
        Msg::RenameFailed { job_id, message } => {
            vec![failure(Operation::Rename, Some(job_id), message)]
        }
        Msg::DeleteRequested { job_id } => {
            if state.contains(&job_id) {
                vec![Effect::SubmitDelete { job_id }]
            } else {
                vec![unknown_job(Operation::Delete, job_id)]
            }
        }
        Msg::DeleteSucceeded { job_id } => {
            let removed = state.remove(&job_id).is_some();
            let mut effects = vec![Effect::CancelPolling {
                job_id: job_id.clone(),
            }];
            if removed {
                effects.push(Effect::NotifyRemoved { job_id });
            }
            effects
        }
        Msg::DeleteFailed { job_id, message } => {
            vec![failure(Operation::Delete, Some(job_id), message)]
        }
        Msg::DownloadRequested { job_id } => match status_of(&state, &job_id) {
            Some(JobStatus::Completed) => vec![Effect::StartDownload { job_id }],
            Some(status) => vec![failure(
                Operation::Download,
                Some(job_id),
                format!("job is {status}, the result is not available yet"),
            )],
            None => vec![unknown_job(Operation::Download, job_id)],
        },
        Msg::DownloadFinished { job_id, result } => match result {
            Ok(path) => vec![Effect::NotifyDownloaded { job_id, path }],
            Err(message) => vec![failure(Operation::Download, Some(job_id), message)],
        },
        Msg::RestoreJobs(jobs) => restore(&mut state, jobs),
    };

    (state, effects)
}

fn apply_status(state: &mut TrackerState, job_id: JobId, result: StatusResult) -> Vec<Effect> {
    let Some(current) = status_of(state, &job_id) else {
        // Deleted while the check was in flight.
        return Vec::new();
    };
    if current.is_terminal() {
        return vec![Effect::CancelPolling { job_id }];
    }

    match result {
        StatusResult::Updated(status) if status.rank() > current.rank() => {
            state.set_status(&job_id, status);
            let mut effects = vec![Effect::NotifyStatus {
                job_id: job_id.clone(),
                status,
            }];
            if status.is_terminal() {
                effects.push(Effect::CancelPolling { job_id });
            }
            effects
        }
        // Same or lower rank: an older response overtaken by a newer one.
        StatusResult::Updated(_) | StatusResult::Unchanged | StatusResult::TransportFailure(_) => {
            Vec::new()
        }
    }
}

fn status_of(state: &TrackerState, job_id: &JobId) -> Option<JobStatus> {
    state.job(job_id).map(|job| job.status)
}

fn restore(state: &mut TrackerState, jobs: Vec<Job>) -> Vec<Effect> {
    let mut effects = Vec::new();
    for job in jobs {
        if state.contains(&job.id) {
            continue;
        }
        effects.push(Effect::NotifyCreated(JobView::from(&job)));
        if !job.status.is_terminal() {
            effects.push(Effect::SchedulePolling {
                job_id: job.id.clone(),
                interval: state.poll_interval(),
            });
        }
        state.push_back(job);
    }
    effects
}

fn failure(operation: Operation, job_id: Option<JobId>, message: String) -> Effect {
    Effect::NotifyFailure {
        operation,
        job_id,
        message,
    }
}

fn unknown_job(operation: Operation, job_id: JobId) -> Effect {
    let message = format!("unknown job {job_id}");
    failure(operation, Some(job_id), message)
}
