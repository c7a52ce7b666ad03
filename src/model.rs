use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::section::Section;

/// Coarse pipeline stage reported by `GET job/{id}`.
///
/// `Unknown` absorbs stage tags added server-side after this client was
/// built; it is treated as non-terminal so polling keeps going.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Analyzing,
    Planning,
    GeneratingSections,
    Composing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Analyzing => "analyzing document",
            Self::Planning => "planning sections",
            Self::GeneratingSections => "generating sections",
            Self::Composing => "composing video",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown => "in progress",
        }
    }
}

/// One server-tracked run of the generation pipeline. Replaced wholesale
/// on every poll; the client never mutates it field-wise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    /// Fraction 0..1. Monotonic non-decreasing while not terminal, as
    /// observed from the server; not enforced here.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<GeneratedVideo>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedVideo {
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Fine-grained progress from `GET job/{id}/details`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedProgress {
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub total_sections: usize,
    #[serde(default)]
    pub completed_sections: usize,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeInfo {
    #[serde(default)]
    pub has_script: bool,
    #[serde(default)]
    pub total_sections: usize,
    #[serde(default)]
    pub completed_sections: usize,
    #[serde(default)]
    pub has_final_video: bool,
    #[serde(default)]
    pub can_resume: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

/// The full analysis result needed to regenerate a job without
/// re-uploading or re-analyzing the source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    #[serde(default)]
    pub detected_language: String,
    #[serde(default)]
    pub summary: String,
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub analysis: DocumentAnalysis,
    pub selected_topics: Vec<usize>,
    /// Present only when re-issuing a previously failed job so the
    /// server can reuse its completed sections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_job_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobCreated {
    pub job_id: String,
}

/// Frame attachment as it goes over the wire: a timestamp into the
/// section's preview video plus an embedded still.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramePayload {
    pub timestamp_seconds: f64,
    pub image_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixRequest {
    pub prompt: String,
    pub frames: Vec<FramePayload>,
    pub current_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixResponse {
    pub fixed_code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompileRequest {
    pub quality: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompileStarted {
    pub hq_job_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationJob {
    pub job_id: String,
    pub target_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranslateRequest {
    pub target_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub voices: Vec<String>,
}
