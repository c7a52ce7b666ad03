use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;

use crate::api::{HttpPipelineApi, PipelineApi};
use crate::cli::GenerateArgs;
use crate::context::GenerationContext;
use crate::model::DocumentAnalysis;

pub async fn run(args: GenerateArgs) -> anyhow::Result<()> {
    let api: Arc<dyn PipelineApi> = Arc::new(HttpPipelineApi::new(&args.api_url)?);

    let analysis = load_analysis(&args.analysis)?;
    let topics = parse_topics(&args.topics)?;

    let mut context = GenerationContext::new();
    context.save(analysis, topics);

    if let Some(failed_job) = &args.resume_from {
        let info = api
            .fetch_resume_info(failed_job)
            .await
            .context("fetch resume info")?;
        if !info.can_resume {
            anyhow::bail!(
                "job {failed_job} cannot be resumed ({}/{} sections completed); start a fresh generation",
                info.completed_sections,
                info.total_sections
            );
        }
        context.mark_resume(failed_job)?;
        tracing::info!(
            failed_job,
            completed_sections = info.completed_sections,
            total_sections = info.total_sections,
            "resuming failed job"
        );
    }

    let request = context.generation_request()?;
    let resumed = request.resume_job_id.is_some();
    let job_id = api
        .start_generation(&request)
        .await
        .context("start generation")?;

    tracing::info!(job_id, resumed, "generation started");
    println!("job {job_id}");

    crate::watch::watch_job(api, &job_id, Duration::from_millis(args.interval_ms)).await
}

fn load_analysis(path: &str) -> anyhow::Result<DocumentAnalysis> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("read analysis file: {path}"))?;
    let analysis: DocumentAnalysis =
        serde_json::from_str(&raw).with_context(|| format!("parse analysis file: {path}"))?;
    if analysis.topics.is_empty() {
        anyhow::bail!("analysis file has no topics: {path}");
    }
    Ok(analysis)
}

fn parse_topics(raw: &str) -> anyhow::Result<Vec<usize>> {
    let mut seen = HashSet::new();
    let mut topics = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let index: usize = part
            .parse()
            .with_context(|| format!("invalid topic index: {part:?}"))?;
        if seen.insert(index) {
            topics.push(index);
        }
    }
    if topics.is_empty() {
        anyhow::bail!("no topic indices given (expected e.g. `--topics 0,2`)");
    }
    Ok(topics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_topics_dedups_and_trims() {
        assert_eq!(parse_topics("0, 2,2, 1").unwrap(), vec![0, 2, 1]);
    }

    #[test]
    fn parse_topics_rejects_garbage() {
        assert!(parse_topics("a,b").is_err());
        assert!(parse_topics("").is_err());
    }

    #[test]
    fn load_analysis_rejects_empty_topics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.json");
        std::fs::write(
            &path,
            r#"{"detected_language": "en", "summary": "", "topics": []}"#,
        )
        .unwrap();
        assert!(load_analysis(path.to_str().unwrap()).is_err());
    }
}
