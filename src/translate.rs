use std::sync::Arc;

use anyhow::Context as _;

use crate::api::{HttpPipelineApi, PipelineApi};
use crate::cli::{TranslateLanguagesArgs, TranslateListArgs, TranslateRequestArgs};
use crate::error::Result;
use crate::model::{JobStatus, LanguageInfo, TranslationJob};

/// Creates and lists translation sub-jobs layered on a completed
/// primary job. Deliberately simpler than the job poller: no timer of
/// its own, callers re-invoke `list` when they want fresh state.
///
/// The manager does not deduplicate either; it issues requests
/// unconditionally. Filtering out the original language and languages
/// already translated is the caller's job, via
/// [`selectable_languages`].
pub struct TranslationManager {
    api: Arc<dyn PipelineApi>,
}

impl TranslationManager {
    pub fn new(api: Arc<dyn PipelineApi>) -> Self {
        Self { api }
    }

    pub async fn list(&self, job_id: &str) -> Result<Vec<TranslationJob>> {
        self.api.list_translations(job_id).await
    }

    pub async fn languages(&self) -> Result<Vec<LanguageInfo>> {
        self.api.list_languages().await
    }

    /// Each requested translation becomes its own asynchronous
    /// server-side job.
    pub async fn request(
        &self,
        job_id: &str,
        target_language: &str,
        voice: Option<&str>,
    ) -> Result<TranslationJob> {
        let translation = self
            .api
            .request_translation(job_id, target_language, voice)
            .await?;
        tracing::info!(
            job_id,
            target_language,
            translation_job = %translation.job_id,
            "translation requested"
        );
        Ok(translation)
    }
}

/// Languages a translation may still be requested for: everything the
/// service supports except the job's original language and languages
/// that already have a translation.
pub fn selectable_languages(
    all: &[LanguageInfo],
    original_language: &str,
    existing: &[TranslationJob],
) -> Vec<LanguageInfo> {
    all.iter()
        .filter(|language| !language.code.eq_ignore_ascii_case(original_language))
        .filter(|language| {
            !existing
                .iter()
                .any(|t| t.target_language.eq_ignore_ascii_case(&language.code))
        })
        .cloned()
        .collect()
}

pub async fn run_languages(args: TranslateLanguagesArgs) -> anyhow::Result<()> {
    let api: Arc<dyn PipelineApi> = Arc::new(HttpPipelineApi::new(&args.api_url)?);
    let manager = TranslationManager::new(api);

    let languages = manager.languages().await.context("list languages")?;
    for language in &languages {
        let voices = if language.voices.is_empty() {
            String::new()
        } else {
            format!(" (voices: {})", language.voices.join(", "))
        };
        println!("{} {}{voices}", language.code, language.name);
    }
    Ok(())
}

pub async fn run_list(args: TranslateListArgs) -> anyhow::Result<()> {
    let api: Arc<dyn PipelineApi> = Arc::new(HttpPipelineApi::new(&args.api_url)?);
    let manager = TranslationManager::new(api);

    let translations = manager.list(&args.job).await.context("list translations")?;
    if translations.is_empty() {
        println!("no translations for job {}", args.job);
        return Ok(());
    }
    for translation in &translations {
        let status = translation
            .status
            .map(|s| s.label())
            .unwrap_or("in progress");
        println!(
            "{} -> {} [{status}] (job {})",
            args.job, translation.target_language, translation.job_id
        );
    }
    Ok(())
}

pub async fn run_request(args: TranslateRequestArgs) -> anyhow::Result<()> {
    let api: Arc<dyn PipelineApi> = Arc::new(HttpPipelineApi::new(&args.api_url)?);
    let manager = TranslationManager::new(api.clone());

    let job = api.fetch_job(&args.job).await.context("fetch job")?;
    // A failed primary job has no finished videos to translate.
    if job.status != JobStatus::Completed {
        anyhow::bail!(
            "job {} is not completed (status: {}); only completed jobs can be translated",
            args.job,
            job.status.label()
        );
    }

    // Caller-side filtering: exclude the original language and languages
    // that already have a translation before asking.
    let original_language = job
        .result
        .as_deref()
        .and_then(|videos| videos.first())
        .and_then(|video| video.language.clone())
        .unwrap_or_default();
    let languages = manager.languages().await.context("list languages")?;
    let existing = manager.list(&args.job).await.context("list translations")?;
    let selectable = selectable_languages(&languages, &original_language, &existing);

    if !selectable
        .iter()
        .any(|l| l.code.eq_ignore_ascii_case(&args.to))
    {
        anyhow::bail!(
            "language {:?} is not selectable for job {} (unsupported, original, or already translated)",
            args.to,
            args.job
        );
    }

    let translation = manager
        .request(&args.job, &args.to, args.voice.as_deref())
        .await
        .context("request translation")?;
    println!("translation job {}", translation.job_id);
    Ok(())
}
