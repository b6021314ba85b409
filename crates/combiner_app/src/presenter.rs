use std::io::{self, Stdout, Write};
use std::path::Path;

use combiner_core::{JobId, JobStatus, JobView, Operation, TrackerViewModel};
use combiner_engine::{Endpoints, PresentationAdapter};
use combiner_logging::combiner_warn;

fn status_icon(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "◷",
        JobStatus::Processing => "●",
        JobStatus::Completed => "✔",
        JobStatus::Error => "✖",
    }
}

fn operation_label(operation: Operation) -> &'static str {
    match operation {
        Operation::Create => "create",
        Operation::Rename => "rename",
        Operation::Delete => "delete",
        Operation::Download => "download",
    }
}

/// Line-oriented rendering of job changes.
pub struct TerminalPresenter<W: Write = Stdout> {
    endpoints: Endpoints,
    quiet: bool,
    failures: usize,
    out: W,
}

impl TerminalPresenter<Stdout> {
    pub fn stdout(endpoints: Endpoints) -> Self {
        Self::new(endpoints, io::stdout())
    }
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(endpoints: Endpoints, out: W) -> Self {
        Self {
            endpoints,
            quiet: false,
            failures: 0,
            out,
        }
    }

    /// Suppresses job listings while restoring; failures are always shown.
    pub fn set_quiet(&mut self, quiet: bool) {
        self.quiet = quiet;
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn show_job(&mut self, job: &JobView) {
        let mut text = format!(
            "{} {}  {}  [{}]",
            status_icon(job.status),
            job.job_id,
            job.name,
            job.status_label
        );
        if !job.generation_time.is_empty() {
            text.push_str(&format!("  created {}", job.generation_time));
        }
        self.line(&text);
        for file in &job.files {
            let link = self.endpoints.upload_url(file);
            self.line(&format!("    {}  {}", file.filename, link));
        }
        if job.affordances.can_download {
            self.download_hint(&job.job_id);
        }
    }

    pub fn show_summary(&mut self, view: &TrackerViewModel) {
        if view.job_count == 0 {
            self.line("No tracked jobs.");
        } else {
            self.line(&format!(
                "{} tracked, {} unfinished",
                view.job_count, view.active_count
            ));
        }
    }

    fn download_hint(&mut self, job_id: &JobId) {
        let link = self.endpoints.download_url(job_id);
        self.line(&format!("    result: {link}"));
    }

    fn line(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{text}") {
            combiner_warn!("Failed to write to terminal: {}", err);
        }
    }
}

impl<W: Write> PresentationAdapter for TerminalPresenter<W> {
    fn apply_job_created(&mut self, job: &JobView) {
        if !self.quiet {
            self.show_job(job);
        }
    }

    fn apply_status(&mut self, job_id: &JobId, status: JobStatus) {
        self.line(&format!("{} {}  {}", status_icon(status), job_id, status.label()));
        if status == JobStatus::Completed {
            self.download_hint(job_id);
        }
    }

    fn apply_renamed(&mut self, job_id: &JobId, name: &str) {
        self.line(&format!("{job_id} renamed to {name:?}"));
    }

    fn apply_removed(&mut self, job_id: &JobId) {
        self.line(&format!("{job_id} deleted"));
    }

    fn apply_downloaded(&mut self, job_id: &JobId, path: &Path) {
        self.line(&format!("{job_id} saved to {}", path.display()));
    }

    fn report_failure(&mut self, operation: Operation, job_id: Option<&JobId>, message: &str) {
        self.failures += 1;
        let text = match job_id {
            Some(id) => format!("✖ {} {id} failed: {message}", operation_label(operation)),
            None => format!("✖ {} failed: {message}", operation_label(operation)),
        };
        self.line(&text);
    }
}
