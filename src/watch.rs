use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;

use crate::api::{HttpPipelineApi, PipelineApi};
use crate::cli::WatchArgs;
use crate::error::Error;
use crate::model::{Job, JobStatus};
use crate::poller::{JobPoller, PollSnapshot};

pub async fn run(args: WatchArgs) -> anyhow::Result<()> {
    let api: Arc<dyn PipelineApi> = Arc::new(HttpPipelineApi::new(&args.api_url)?);
    watch_job(api, &args.job, Duration::from_millis(args.interval_ms)).await
}

/// Poll a job to its terminal stage, printing progress as it changes.
/// On failure, the exit error carries a recovery hint gated on the
/// job's resume-info.
pub async fn watch_job(
    api: Arc<dyn PipelineApi>,
    job_id: &str,
    interval: Duration,
) -> anyhow::Result<()> {
    let handle = JobPoller::new(api.clone(), job_id)
        .with_interval(interval)
        .spawn();
    let mut updates = handle.updates();

    let outcome: Option<Job> = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                handle.stop();
                anyhow::bail!("interrupted while watching job {job_id}");
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break None;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_snapshot(&snapshot);
                if let Some(job) = &snapshot.job
                    && job.status.is_terminal()
                {
                    break Some(job.clone());
                }
            }
        }
    };
    handle.wait().await;

    match outcome {
        Some(job) if job.status == JobStatus::Completed => {
            let videos = job.result.unwrap_or_default();
            for video in &videos {
                let duration = video
                    .duration_seconds
                    .map(|d| format!(" ({d:.0}s)"))
                    .unwrap_or_default();
                let url = video.url.as_deref().unwrap_or("(no url yet)");
                println!("video {} {}{duration}: {url}", video.video_id, video.title);
            }
            Ok(())
        }
        Some(job) => {
            let hint = match api.fetch_resume_info(job_id).await {
                Ok(info) if info.can_resume => {
                    format!("resume with `docuvid generate --resume-from {job_id} ...`")
                }
                _ => "the job cannot be resumed; start a fresh generation".to_owned(),
            };
            let message = if job.message.is_empty() {
                hint
            } else {
                format!("{} ({hint})", job.message)
            };
            Err(Error::RemoteJobFailed {
                job_id: job_id.to_owned(),
                message,
            })
            .context("generation failed")
        }
        None => anyhow::bail!("poller stopped before job {job_id} reached a terminal stage"),
    }
}

fn print_snapshot(snapshot: &PollSnapshot) {
    if let Some(error) = &snapshot.error {
        eprintln!("poll error (will retry): {error}");
    }
    let Some(job) = &snapshot.job else {
        return;
    };

    let percent = (job.progress * 100.0).round() as u32;
    println!("[{percent:>3}%] {} - {}", job.status.label(), job.message);

    let Some(details) = &snapshot.details else {
        return;
    };
    for section in &details.sections {
        let display = section.status.display();
        let error = section
            .error
            .as_deref()
            .map(|e| format!(" ! {e}"))
            .unwrap_or_default();
        println!(
            "    section {:>2} ({}): {}{error}",
            section.index, section.section_id, display.label
        );
    }
}
