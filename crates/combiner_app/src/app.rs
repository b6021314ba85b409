use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use combiner_core::{update, JobId, Msg, TrackerState, UploadForm};
use combiner_engine::{ControllerSettings, Endpoints, JobLifecycleController, ReqwestJobApi};
use combiner_logging::{combiner_info, combiner_warn, LogDestination};
use log::LevelFilter;

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::persistence::{load_jobs, save_jobs};
use crate::presenter::TerminalPresenter;

type Controller = JobLifecycleController<ReqwestJobApi, TerminalPresenter>;

pub fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(&cli);
    config.validate()?;

    let destination = if config.log_to_file {
        LogDestination::both_default()
    } else {
        LogDestination::Terminal
    };
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    combiner_logging::initialize(destination, level);
    combiner_info!("Using backend {}{}", config.base_url, config.api_prefix);

    if let Commands::List = cli.command {
        return list(&config);
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start the async runtime")?;
    runtime.block_on(track(config, cli.command))
}

fn list(config: &AppConfig) -> Result<ExitCode> {
    let endpoints = Endpoints::new(&config.base_url, &config.api_prefix)?;
    let mut presenter = TerminalPresenter::stdout(endpoints);
    let (state, _) = update(
        TrackerState::new(),
        Msg::RestoreJobs(load_jobs(&config.state_file)),
    );
    let view = state.view();
    for job in &view.jobs {
        presenter.show_job(job);
    }
    presenter.show_summary(&view);
    Ok(ExitCode::SUCCESS)
}

async fn track(config: AppConfig, command: Commands) -> Result<ExitCode> {
    let api = ReqwestJobApi::new(config.api_settings())?;
    let presenter = TerminalPresenter::stdout(api.endpoints().clone());

    let download_dir = match &command {
        Commands::Download(args) => args.out.clone(),
        _ => None,
    }
    .unwrap_or_else(|| config.download_dir.clone());
    let settings = ControllerSettings {
        poll_interval: config.poll_interval(),
        download_dir,
    };
    let mut controller = JobLifecycleController::new(Arc::new(api), presenter, settings);

    // Earlier jobs resume polling; only `watch` lists them.
    let restored = load_jobs(&config.state_file);
    let watching = matches!(command, Commands::Watch);
    controller.presenter_mut().set_quiet(!watching);
    controller.dispatch(Msg::RestoreJobs(restored));
    controller.presenter_mut().set_quiet(false);

    match command {
        Commands::Submit(args) => {
            controller.dispatch(Msg::CreateRequested(UploadForm {
                name: args.name,
                files: args.files,
            }));
            if args.no_wait {
                controller.run_until_idle().await;
            } else {
                follow(&mut controller).await;
            }
        }
        Commands::Watch => {
            let view = controller.state().view();
            controller.presenter_mut().show_summary(&view);
            follow(&mut controller).await;
        }
        Commands::Rename(args) => {
            controller.dispatch(Msg::RenameRequested {
                job_id: JobId::new(args.id),
                name: Some(args.name),
            });
            controller.run_until_idle().await;
        }
        Commands::Delete(args) => {
            controller.dispatch(Msg::DeleteRequested {
                job_id: JobId::new(args.id),
            });
            controller.run_until_idle().await;
        }
        Commands::Download(args) => {
            controller.dispatch(Msg::DownloadRequested {
                job_id: JobId::new(args.id),
            });
            controller.run_until_idle().await;
        }
        Commands::List => {}
    }

    let (state, presenter) = controller.shutdown();
    if !save_jobs(&config.state_file, state.jobs()) {
        combiner_warn!("Tracked jobs were not saved to {:?}", config.state_file);
    }

    if presenter.failures() > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Polls until every tracked job is finished; Ctrl-C stops early and keeps
/// unfinished jobs for the next run.
async fn follow(controller: &mut Controller) {
    let interrupted = tokio::select! {
        _ = controller.run_until_settled() => None,
        signal = tokio::signal::ctrl_c() => Some(signal),
    };
    match interrupted {
        None => {}
        Some(Ok(())) => {
            combiner_info!("Interrupted; unfinished jobs resume on the next run");
        }
        Some(Err(err)) => {
            combiner_warn!("Failed to listen for Ctrl-C: {}", err);
            controller.run_until_settled().await;
        }
    }
}
