use std::sync::Once;

use combiner_core::{
    update, Effect, Job, JobId, JobStatus, JobView, Msg, StatusResult, TrackerState,
    UploadedFile, POLL_INTERVAL,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(combiner_logging::initialize_for_tests);
}

fn job(id: &str, status: JobStatus) -> Job {
    Job {
        id: JobId::from(id),
        name: format!("combined {id}"),
        generation_time: "2024-10-01 12:00".to_string(),
        files: vec![
            UploadedFile {
                upload_id: "u-2".to_string(),
                filename: "b.xlsx".to_string(),
            },
            UploadedFile {
                upload_id: "u-1".to_string(),
                filename: "a.xlsx".to_string(),
            },
        ],
        status,
    }
}

fn created(id: &str, status: JobStatus) -> (TrackerState, Vec<Effect>) {
    update(TrackerState::new(), Msg::CreateSucceeded(job(id, status)))
}

fn checked(state: TrackerState, id: &str, result: StatusResult) -> (TrackerState, Vec<Effect>) {
    update(
        state,
        Msg::StatusChecked {
            job_id: JobId::from(id),
            result,
        },
    )
}

fn tick(state: TrackerState, id: &str) -> (TrackerState, Vec<Effect>) {
    update(
        state,
        Msg::PollTick {
            job_id: JobId::from(id),
        },
    )
}

#[test]
fn pending_job_is_rendered_and_scheduled() {
    init_logging();
    let (state, effects) = created("j1", JobStatus::Pending);

    assert_eq!(
        effects,
        vec![
            Effect::NotifyCreated(JobView::from(&job("j1", JobStatus::Pending))),
            Effect::SchedulePolling {
                job_id: JobId::from("j1"),
                interval: POLL_INTERVAL,
            },
        ]
    );
    assert_eq!(state.view().job_count, 1);
    assert_eq!(state.view().active_count, 1);
}

#[test]
fn job_created_in_error_is_never_scheduled() {
    init_logging();
    let (state, effects) = created("j1", JobStatus::Error);

    assert!(effects
        .iter()
        .all(|effect| !matches!(effect, Effect::SchedulePolling { .. })));
    assert_eq!(state.view().active_count, 0);
}

#[test]
fn files_keep_upload_order() {
    init_logging();
    let (state, _) = created("j1", JobStatus::Pending);
    let names: Vec<_> = state.view().jobs[0]
        .files
        .iter()
        .map(|file| file.filename.clone())
        .collect();
    assert_eq!(names, vec!["b.xlsx", "a.xlsx"]);
}

#[test]
fn newest_job_is_listed_first() {
    init_logging();
    let (state, _) = created("old", JobStatus::Pending);
    let (state, _) = update(state, Msg::CreateSucceeded(job("new", JobStatus::Pending)));

    let ids: Vec<_> = state.view().jobs.iter().map(|j| j.job_id.clone()).collect();
    assert_eq!(ids, vec![JobId::from("new"), JobId::from("old")]);
}

#[test]
fn duplicate_creation_is_ignored() {
    init_logging();
    let (state, _) = created("j1", JobStatus::Pending);
    let (state, effects) = update(state, Msg::CreateSucceeded(job("j1", JobStatus::Pending)));

    assert!(effects.is_empty());
    assert_eq!(state.view().job_count, 1);
}

#[test]
fn pending_to_processing_to_completed() {
    init_logging();
    let (state, _) = created("j1", JobStatus::Pending);

    let (state, effects) = tick(state, "j1");
    assert_eq!(
        effects,
        vec![Effect::CheckStatus {
            job_id: JobId::from("j1"),
            current: JobStatus::Pending,
        }]
    );

    let (state, effects) = checked(state, "j1", StatusResult::Updated(JobStatus::Processing));
    assert_eq!(
        effects,
        vec![Effect::NotifyStatus {
            job_id: JobId::from("j1"),
            status: JobStatus::Processing,
        }]
    );
    assert!(!state.view().jobs[0].affordances.can_download);

    let (state, effects) = checked(state, "j1", StatusResult::Updated(JobStatus::Completed));
    assert_eq!(
        effects,
        vec![
            Effect::NotifyStatus {
                job_id: JobId::from("j1"),
                status: JobStatus::Completed,
            },
            Effect::CancelPolling {
                job_id: JobId::from("j1"),
            },
        ]
    );
    let view = state.view();
    assert_eq!(view.jobs[0].status, JobStatus::Completed);
    assert_eq!(view.jobs[0].status_label, "Completed");
    assert!(view.jobs[0].affordances.can_download);
}

#[test]
fn pending_may_jump_straight_to_error() {
    init_logging();
    let (state, _) = created("j1", JobStatus::Pending);
    let (state, effects) = checked(state, "j1", StatusResult::Updated(JobStatus::Error));

    assert!(effects.contains(&Effect::CancelPolling {
        job_id: JobId::from("j1"),
    }));
    assert_eq!(state.view().jobs[0].status, JobStatus::Error);
    assert!(!state.view().jobs[0].affordances.can_download);
}

#[test]
fn terminal_status_is_never_overwritten() {
    init_logging();
    let (state, _) = created("j1", JobStatus::Processing);
    let (state, _) = checked(state, "j1", StatusResult::Updated(JobStatus::Completed));

    let (state, effects) = checked(state, "j1", StatusResult::Updated(JobStatus::Error));
    assert_eq!(
        effects,
        vec![Effect::CancelPolling {
            job_id: JobId::from("j1"),
        }]
    );
    assert_eq!(state.view().jobs[0].status, JobStatus::Completed);
}

#[test]
fn stale_tick_after_terminal_cancels_again() {
    init_logging();
    let (state, _) = created("j1", JobStatus::Pending);
    let (state, _) = checked(state, "j1", StatusResult::Updated(JobStatus::Completed));

    let (_state, effects) = tick(state, "j1");
    assert_eq!(
        effects,
        vec![Effect::CancelPolling {
            job_id: JobId::from("j1"),
        }]
    );
}

#[test]
fn older_response_cannot_regress_status() {
    init_logging();
    let (state, _) = created("j1", JobStatus::Pending);
    let (state, _) = checked(state, "j1", StatusResult::Updated(JobStatus::Processing));
    let processing = state.clone();

    let (state, effects) = checked(state, "j1", StatusResult::Updated(JobStatus::Pending));
    assert!(effects.is_empty());
    assert_eq!(state.view().jobs[0].status, JobStatus::Processing);
    assert_eq!(state, processing);
}

#[test]
fn transport_failure_leaves_status_and_polling_alone() {
    init_logging();
    let (state, _) = created("j1", JobStatus::Pending);
    let before = state.clone();

    let (state, effects) = checked(
        state,
        "j1",
        StatusResult::TransportFailure("connection refused".to_string()),
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().jobs[0].status, JobStatus::Pending);
    assert_eq!(state, before);

    // The next tick still checks.
    let (_state, effects) = tick(state, "j1");
    assert!(matches!(effects.as_slice(), [Effect::CheckStatus { .. }]));
}

#[test]
fn unchanged_result_is_a_noop() {
    init_logging();
    let (state, _) = created("j1", JobStatus::Processing);
    let before = state.view().jobs;
    let (state, effects) = checked(state, "j1", StatusResult::Unchanged);

    assert!(effects.is_empty());
    assert_eq!(state.view().jobs, before);
}

#[test]
fn tick_for_unknown_job_cancels_stale_timer() {
    init_logging();
    let (_state, effects) = tick(TrackerState::new(), "ghost");
    assert_eq!(
        effects,
        vec![Effect::CancelPolling {
            job_id: JobId::from("ghost"),
        }]
    );
}

#[test]
fn restore_resumes_polling_for_unfinished_jobs_only() {
    init_logging();
    let jobs = vec![
        job("a", JobStatus::Processing),
        job("b", JobStatus::Completed),
        job("c", JobStatus::Pending),
    ];
    let (state, effects) = update(TrackerState::new(), Msg::RestoreJobs(jobs));

    let scheduled: Vec<_> = effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::SchedulePolling { job_id, .. } => Some(job_id.as_str().to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(scheduled, vec!["a", "c"]);

    let ids: Vec<_> = state.jobs().iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    // Restoring again does not duplicate anything.
    let (state, effects) = update(state, Msg::RestoreJobs(vec![job("a", JobStatus::Processing)]));
    assert!(effects.is_empty());
    assert_eq!(state.view().job_count, 3);
}

#[test]
fn custom_poll_interval_is_used_for_scheduling() {
    init_logging();
    let state = TrackerState::with_poll_interval(std::time::Duration::from_millis(50));
    let (_state, effects) = update(state, Msg::CreateSucceeded(job("j1", JobStatus::Pending)));

    assert!(effects.contains(&Effect::SchedulePolling {
        job_id: JobId::from("j1"),
        interval: std::time::Duration::from_millis(50),
    }));
}
