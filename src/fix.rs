use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;

use crate::api::{HttpPipelineApi, PipelineApi};
use crate::capture::StillImageSurface;
use crate::cli::{CompileArgs, FixArgs, RegenerateArgs, UpdateCodeArgs};
use crate::workflow::SectionWorkbench;

pub async fn run_fix(args: FixArgs) -> anyhow::Result<()> {
    let api: Arc<dyn PipelineApi> = Arc::new(HttpPipelineApi::new(&args.api_url)?);
    let bench = SectionWorkbench::new(api, &args.job, &args.section);

    for spec in &args.frame {
        let (timestamp, path) = parse_frame_spec(spec)?;
        let surface = StillImageSurface::open(Path::new(&path), timestamp)?;
        bench.capture_frame(&surface)?;
    }
    if let Some(prompt) = &args.prompt {
        bench.set_prompt(prompt);
    }

    bench.refresh().await.context("fetch sections")?;
    let section = bench
        .section()
        .ok_or_else(|| anyhow::anyhow!("section {} not found in job {}", args.section, args.job))?;
    if !section.status.actions_permitted() {
        tracing::warn!(
            section_id = %args.section,
            status = ?section.status,
            "section is still being generated; the server may reject this fix"
        );
    }
    let current_code = section.code.unwrap_or_default();

    let ran = bench.fix_with_ai(&current_code).await?;
    if !ran {
        anyhow::bail!("another repair is already running for section {}", args.section);
    }
    println!("fix applied; section {} queued for regeneration", args.section);
    Ok(())
}

pub async fn run_regenerate(args: RegenerateArgs) -> anyhow::Result<()> {
    let api: Arc<dyn PipelineApi> = Arc::new(HttpPipelineApi::new(&args.api_url)?);
    let bench = SectionWorkbench::new(api, &args.job, &args.section);

    let ran = bench.regenerate().await?;
    if !ran {
        anyhow::bail!(
            "another regeneration is already running for section {}",
            args.section
        );
    }
    println!("section {} queued for regeneration", args.section);
    Ok(())
}

pub async fn run_update_code(args: UpdateCodeArgs) -> anyhow::Result<()> {
    let code = std::fs::read_to_string(&args.code_file)
        .with_context(|| format!("read code file: {}", args.code_file))?;
    if code.trim().is_empty() {
        anyhow::bail!("code file is empty: {}", args.code_file);
    }

    let api: Arc<dyn PipelineApi> = Arc::new(HttpPipelineApi::new(&args.api_url)?);
    let bench = SectionWorkbench::new(api, &args.job, &args.section);
    bench.update_code(&code).await?;
    println!("code updated for section {}", args.section);
    Ok(())
}

pub async fn run_compile(args: CompileArgs) -> anyhow::Result<()> {
    let api: Arc<dyn PipelineApi> = Arc::new(HttpPipelineApi::new(&args.api_url)?);

    let hq_job_id = api
        .compile_high_quality(&args.job, &args.quality)
        .await
        .context("start high-quality compile")?;
    tracing::info!(job_id = %args.job, hq_job_id, quality = %args.quality, "compile started");
    println!("compile job {hq_job_id}");

    crate::watch::watch_job(api, &hq_job_id, Duration::from_millis(args.interval_ms)).await
}

fn parse_frame_spec(spec: &str) -> anyhow::Result<(f64, String)> {
    let Some((timestamp, path)) = spec.split_once('=') else {
        anyhow::bail!("invalid --frame {spec:?} (expected TIMESTAMP=IMAGE_PATH)");
    };
    let timestamp: f64 = timestamp
        .trim()
        .parse()
        .with_context(|| format!("invalid frame timestamp in {spec:?}"))?;
    if !timestamp.is_finite() || timestamp < 0.0 {
        anyhow::bail!("frame timestamp must be a non-negative number: {spec:?}");
    }
    let path = path.trim();
    if path.is_empty() {
        anyhow::bail!("missing image path in --frame {spec:?}");
    }
    Ok((timestamp, path.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_spec_parses_timestamp_and_path() {
        let (timestamp, path) = parse_frame_spec("12.5=frames/overlap.png").unwrap();
        assert_eq!(timestamp, 12.5);
        assert_eq!(path, "frames/overlap.png");
    }

    #[test]
    fn frame_spec_rejects_bad_input() {
        assert!(parse_frame_spec("no-equals").is_err());
        assert!(parse_frame_spec("abc=frame.png").is_err());
        assert!(parse_frame_spec("-1=frame.png").is_err());
        assert!(parse_frame_spec("1.0=").is_err());
    }
}
