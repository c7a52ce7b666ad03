use serde::{Deserialize, Serialize};

/// Lifecycle of one section of a job.
///
/// Transitions are driven entirely by the server-reported status on each
/// poll; the client only renders them and gates interactive actions.
/// Unrecognized tags deserialize to `Waiting` so a new server-side state
/// degrades to the default presentation instead of failing the poll.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    GeneratingScript,
    ScriptGenerated,
    GeneratingManim,
    FixingManim,
    GeneratingAudio,
    GeneratingVideo,
    FixingError,
    Completed,
    Failed,
    // `other` must stay on the final variant.
    #[serde(other)]
    Waiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Muted,
    Busy,
    Warn,
    Done,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionDisplay {
    pub label: &'static str,
    pub urgency: Urgency,
}

impl SectionStatus {
    pub const ALL: [SectionStatus; 10] = [
        Self::Waiting,
        Self::GeneratingScript,
        Self::ScriptGenerated,
        Self::GeneratingManim,
        Self::FixingManim,
        Self::GeneratingAudio,
        Self::GeneratingVideo,
        Self::FixingError,
        Self::Completed,
        Self::Failed,
    ];

    /// Pure, total mapping from state to presentation.
    pub fn display(self) -> SectionDisplay {
        let (label, urgency) = match self {
            Self::Waiting => ("waiting", Urgency::Muted),
            Self::GeneratingScript => ("generating script", Urgency::Busy),
            Self::ScriptGenerated => ("script ready", Urgency::Muted),
            Self::GeneratingManim => ("rendering animation", Urgency::Busy),
            Self::FixingManim => ("repairing animation", Urgency::Warn),
            Self::GeneratingAudio => ("synthesizing audio", Urgency::Busy),
            Self::GeneratingVideo => ("rendering video", Urgency::Busy),
            Self::FixingError => ("auto-fixing error", Urgency::Warn),
            Self::Completed => ("completed", Urgency::Done),
            Self::Failed => ("failed", Urgency::Error),
        };
        SectionDisplay { label, urgency }
    }

    /// Whether edit and regenerate actions are offered for this state.
    /// Advisory only; the server remains the authority.
    pub fn actions_permitted(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One independently generated sub-unit of a job. Server-owned; the
/// client holds a read-through copy refreshed on each detail poll.
///
/// `has_video => has_audio && has_code` is the expected readiness
/// ordering but is not enforced: the flags are eventually consistent
/// with the server and violations must be tolerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub section_id: String,
    pub index: usize,
    #[serde(default)]
    pub title: String,
    pub status: SectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration_preview: Option<String>,
    #[serde(default)]
    pub has_code: bool,
    #[serde(default)]
    pub has_audio: bool,
    #[serde(default)]
    pub has_video: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub fix_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
