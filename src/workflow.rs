use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;

use crate::api::PipelineApi;
use crate::capture::{CapturedFrame, PreviewSurface};
use crate::error::{Error, Result};
use crate::model::FixRequest;
use crate::section::Section;

/// Upper bound on stills attached to one fix request. Each frame is an
/// embedded base64 image, so an unbounded list is a real payload risk.
pub const MAX_CAPTURED_FRAMES: usize = 8;

/// Past this many server-counted fix attempts a warning is logged. The
/// request is still sent; the server decides whether to accept it.
pub const FIX_ATTEMPT_WARN_THRESHOLD: u32 = 5;

/// Per-section edit/repair controller: accumulates visual context
/// frames and a correction prompt, drives the fix call, persists the
/// returned code, and re-triggers regeneration of that section only.
///
/// Shareable behind an `Arc`; the busy flag suppresses a second
/// regenerate or fix while one is in flight.
pub struct SectionWorkbench {
    api: Arc<dyn PipelineApi>,
    job_id: String,
    section_id: String,
    prompt: Mutex<String>,
    frames: Mutex<Vec<CapturedFrame>>,
    sections: Mutex<Vec<Section>>,
    /// Code persisted by us but not yet seen back from the server.
    /// The next successful fetch supersedes it (server always wins).
    code_override: Mutex<Option<String>>,
    busy: AtomicBool,
}

impl SectionWorkbench {
    pub fn new(
        api: Arc<dyn PipelineApi>,
        job_id: impl Into<String>,
        section_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            job_id: job_id.into(),
            section_id: section_id.into(),
            prompt: Mutex::new(String::new()),
            frames: Mutex::new(Vec::new()),
            sections: Mutex::new(Vec::new()),
            code_override: Mutex::new(None),
            busy: AtomicBool::new(false),
        }
    }

    pub fn section_id(&self) -> &str {
        &self.section_id
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn set_prompt(&self, prompt: &str) {
        *self.prompt.lock().expect("prompt lock") = prompt.to_owned();
    }

    pub fn prompt(&self) -> String {
        self.prompt.lock().expect("prompt lock").clone()
    }

    /// Take a still from the preview surface and append it to the
    /// pending list.
    pub fn capture_frame(&self, surface: &dyn PreviewSurface) -> Result<()> {
        let (width, height) = surface.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::NotReady(
                "preview surface has no decoded frame yet".to_owned(),
            ));
        }

        let mut frames = self.frames.lock().expect("frames lock");
        if frames.len() >= MAX_CAPTURED_FRAMES {
            return Err(Error::InvalidRequest(format!(
                "at most {MAX_CAPTURED_FRAMES} frames may be attached to one fix request"
            )));
        }

        let image = surface.snapshot()?;
        frames.push(CapturedFrame {
            timestamp_seconds: surface.position_seconds(),
            captured_at: Utc::now(),
            image,
        });
        Ok(())
    }

    pub fn remove_frame(&self, index: usize) {
        let mut frames = self.frames.lock().expect("frames lock");
        if index < frames.len() {
            frames.remove(index);
        }
    }

    pub fn clear_frames(&self) {
        self.frames.lock().expect("frames lock").clear();
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().expect("frames lock").len()
    }

    /// Re-fetch the section list. A successful fetch supersedes any
    /// local code override.
    pub async fn refresh(&self) -> Result<Vec<Section>> {
        let fetched = self.api.fetch_sections(&self.job_id).await?;
        *self.code_override.lock().expect("override lock") = None;
        *self.sections.lock().expect("sections lock") = fetched.clone();
        Ok(fetched)
    }

    /// Last fetched view of this workbench's section, with the local
    /// code override merged in while one is pending.
    pub fn section(&self) -> Option<Section> {
        let sections = self.sections.lock().expect("sections lock");
        let mut section = sections
            .iter()
            .find(|s| s.section_id == self.section_id)
            .cloned()?;
        if let Some(code) = self.code_override.lock().expect("override lock").clone() {
            section.code = Some(code);
        }
        Some(section)
    }

    pub fn sections(&self) -> Vec<Section> {
        self.sections.lock().expect("sections lock").clone()
    }

    /// Trigger regeneration of this section, then re-fetch the list so
    /// the caller observes fresh state. Returns `false` when suppressed
    /// because another regenerate or fix is already in flight.
    pub async fn regenerate(&self) -> Result<bool> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            tracing::debug!(
                section_id = %self.section_id,
                "regenerate suppressed; another operation is in flight"
            );
            return Ok(false);
        };
        self.regenerate_inner().await?;
        Ok(true)
    }

    /// Submit the accumulated prompt and frames to the remote fixer,
    /// persist the returned code, and regenerate this section.
    ///
    /// The steps are strictly sequential: regeneration must act on the
    /// already-persisted new code. Any failure aborts the remainder and
    /// leaves the prompt and frames intact for retry; they are cleared
    /// only after the whole sequence succeeds. Returns `false` when
    /// suppressed by the busy guard.
    pub async fn fix_with_ai(&self, current_code: &str) -> Result<bool> {
        let prompt = self.prompt();
        let frames: Vec<_> = {
            let frames = self.frames.lock().expect("frames lock");
            frames.iter().map(CapturedFrame::payload).collect()
        };
        if prompt.trim().is_empty() && frames.is_empty() {
            return Err(Error::InvalidRequest(
                "a correction prompt or at least one captured frame is required".to_owned(),
            ));
        }

        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            tracing::debug!(
                section_id = %self.section_id,
                "fix suppressed; another operation is in flight"
            );
            return Ok(false);
        };

        if let Some(section) = self.section()
            && section.fix_attempts >= FIX_ATTEMPT_WARN_THRESHOLD
        {
            tracing::warn!(
                section_id = %self.section_id,
                fix_attempts = section.fix_attempts,
                "section has already been through many fix attempts"
            );
        }

        let request = FixRequest {
            prompt: prompt.clone(),
            frames,
            current_code: current_code.to_owned(),
        };

        let fixed = self
            .api
            .fix_section(&self.job_id, &self.section_id, &request)
            .await?;
        self.api
            .update_section_code(&self.job_id, &self.section_id, &fixed.fixed_code)
            .await?;
        *self.code_override.lock().expect("override lock") = Some(fixed.fixed_code);
        self.regenerate_inner().await?;

        self.set_prompt("");
        self.clear_frames();
        tracing::info!(section_id = %self.section_id, "fix applied and regeneration requested");
        Ok(true)
    }

    /// Manual edit path: persist code directly, bypassing the fixer,
    /// then re-fetch sections.
    pub async fn update_code(&self, code: &str) -> Result<()> {
        self.api
            .update_section_code(&self.job_id, &self.section_id, code)
            .await?;
        *self.code_override.lock().expect("override lock") = Some(code.to_owned());
        self.refresh().await?;
        Ok(())
    }

    async fn regenerate_inner(&self) -> Result<()> {
        self.api
            .regenerate_section(&self.job_id, &self.section_id)
            .await?;
        self.refresh().await?;
        Ok(())
    }
}

/// Flips the busy flag for the duration of one guarded operation.
/// Acquisition fails (returns `None`) while another holder exists.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
