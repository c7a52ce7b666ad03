use crate::error::{Error, Result};
use crate::model::{DocumentAnalysis, GenerationRequest};

/// Session-scoped record of the parameters behind the last generation
/// request. Lets a failed job be re-issued without re-uploading or
/// re-analyzing the source document. A convenience cache, never a
/// source of truth: if it is gone, resume is refused.
#[derive(Debug, Clone, Default)]
pub struct GenerationContext {
    analysis: Option<DocumentAnalysis>,
    selected_topics: Vec<usize>,
    resume_job_id: Option<String>,
}

impl GenerationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of the analysis/topic-selection step. Any
    /// previously marked resume target no longer describes these
    /// parameters and is dropped.
    pub fn save(&mut self, analysis: DocumentAnalysis, selected_topics: Vec<usize>) {
        self.analysis = Some(analysis);
        self.selected_topics = dedup_preserving_order(selected_topics);
        self.resume_job_id = None;
    }

    pub fn analysis(&self) -> Option<&DocumentAnalysis> {
        self.analysis.as_ref()
    }

    pub fn selected_topics(&self) -> &[usize] {
        &self.selected_topics
    }

    /// Tag the context for resuming a failed job. Refused when the
    /// analysis is gone or no topics are retained: an empty topic set is
    /// not a valid prior generation, so it is treated as context loss.
    pub fn mark_resume(&mut self, job_id: &str) -> Result<()> {
        if self.analysis.is_none() {
            return Err(Error::ContextLost(
                "no analysis retained; cannot resume, restart from document analysis".to_owned(),
            ));
        }
        if self.selected_topics.is_empty() {
            return Err(Error::ContextLost(
                "no selected topics retained; cannot resume, restart from document analysis"
                    .to_owned(),
            ));
        }
        self.resume_job_id = Some(job_id.to_owned());
        Ok(())
    }

    /// Take the resume target, clearing it. A second call returns `None`
    /// so a duplicated trigger cannot issue two resumed requests.
    pub fn consume_resume(&mut self) -> Option<String> {
        self.resume_job_id.take()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Build the generation request from the retained parameters,
    /// consuming the resume tag if one is set.
    pub fn generation_request(&mut self) -> Result<GenerationRequest> {
        let analysis = self.analysis.clone().ok_or_else(|| {
            Error::ContextLost("no analysis retained; restart from document analysis".to_owned())
        })?;
        if self.selected_topics.is_empty() {
            return Err(Error::InvalidRequest(
                "at least one topic must be selected".to_owned(),
            ));
        }
        if let Some(&out_of_range) = self
            .selected_topics
            .iter()
            .find(|&&idx| idx >= analysis.topics.len())
        {
            return Err(Error::InvalidRequest(format!(
                "topic index {out_of_range} is out of range (analysis has {} topics)",
                analysis.topics.len()
            )));
        }

        Ok(GenerationRequest {
            analysis,
            selected_topics: self.selected_topics.clone(),
            resume_job_id: self.consume_resume(),
        })
    }
}

fn dedup_preserving_order(topics: Vec<usize>) -> Vec<usize> {
    let mut seen = std::collections::HashSet::new();
    topics.into_iter().filter(|t| seen.insert(*t)).collect()
}
