use std::sync::Arc;

use anyhow::Context as _;

use crate::api::{HttpPipelineApi, PipelineApi};
use crate::cli::{SectionsArgs, StatusArgs};
use crate::model::JobStatus;

pub async fn run_status(args: StatusArgs) -> anyhow::Result<()> {
    let api: Arc<dyn PipelineApi> = Arc::new(HttpPipelineApi::new(&args.api_url)?);

    let job = api.fetch_job(&args.job).await.context("fetch job")?;
    let percent = (job.progress * 100.0).round() as u32;
    println!("job {}", job.job_id);
    println!("status: {} ({percent}%)", job.status.label());
    if !job.message.is_empty() {
        println!("message: {}", job.message);
    }

    if let Some(videos) = &job.result {
        for video in videos {
            println!(
                "video {} {}: {}",
                video.video_id,
                video.title,
                video.url.as_deref().unwrap_or("(no url yet)")
            );
        }
    }

    if job.status == JobStatus::Failed {
        let info = api
            .fetch_resume_info(&args.job)
            .await
            .context("fetch resume info")?;
        if info.can_resume {
            println!(
                "resumable: {}/{} sections completed; `docuvid generate --resume-from {} ...`",
                info.completed_sections, info.total_sections, args.job
            );
        } else {
            println!("not resumable; start a fresh generation");
        }
    }
    Ok(())
}

pub async fn run_sections(args: SectionsArgs) -> anyhow::Result<()> {
    let api: Arc<dyn PipelineApi> = Arc::new(HttpPipelineApi::new(&args.api_url)?);

    let sections = api
        .fetch_sections(&args.job)
        .await
        .context("fetch sections")?;
    if sections.is_empty() {
        println!("job {} has no sections yet", args.job);
        return Ok(());
    }

    for section in &sections {
        let display = section.status.display();
        let duration = section
            .duration_seconds
            .map(|d| format!(" {d:.1}s"))
            .unwrap_or_default();
        let readiness = format!(
            "code:{} audio:{} video:{}",
            flag(section.has_code),
            flag(section.has_audio),
            flag(section.has_video)
        );
        println!(
            "{:>2} {} [{}]{duration} {readiness} - {}",
            section.index, section.section_id, display.label, section.title
        );
        if let Some(error) = &section.error {
            println!("   error: {error}");
        }
    }
    Ok(())
}

fn flag(value: bool) -> &'static str {
    if value { "y" } else { "-" }
}
