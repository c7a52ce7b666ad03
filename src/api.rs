use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::model::{
    CompileRequest, CompileStarted, DetailedProgress, FixRequest, FixResponse, GenerationRequest,
    Job, JobCreated, LanguageInfo, ResumeInfo, TranslateRequest, TranslationJob,
};
use crate::section::Section;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote operations of the generation service. Everything the client
/// core does goes through this seam, so tests can substitute a fake.
#[async_trait]
pub trait PipelineApi: Send + Sync {
    async fn fetch_job(&self, job_id: &str) -> Result<Job>;
    async fn fetch_details(&self, job_id: &str) -> Result<DetailedProgress>;
    async fn fetch_resume_info(&self, job_id: &str) -> Result<ResumeInfo>;
    async fn fetch_sections(&self, job_id: &str) -> Result<Vec<Section>>;
    async fn fetch_section(&self, job_id: &str, index: usize) -> Result<Section>;
    async fn update_section_code(&self, job_id: &str, section_id: &str, code: &str) -> Result<()>;
    async fn regenerate_section(&self, job_id: &str, section_id: &str) -> Result<()>;
    async fn fix_section(
        &self,
        job_id: &str,
        section_id: &str,
        request: &FixRequest,
    ) -> Result<FixResponse>;
    async fn start_generation(&self, request: &GenerationRequest) -> Result<String>;
    async fn compile_high_quality(&self, job_id: &str, quality: &str) -> Result<String>;
    async fn list_translations(&self, job_id: &str) -> Result<Vec<TranslationJob>>;
    async fn list_languages(&self) -> Result<Vec<LanguageInfo>>;
    async fn request_translation(
        &self,
        job_id: &str,
        target_language: &str,
        voice: Option<&str>,
    ) -> Result<TranslationJob>;
}

/// HTTP+JSON transport for [`PipelineApi`].
#[derive(Debug, Clone)]
pub struct HttpPipelineApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPipelineApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = url::Url::parse(base_url)
            .map_err(|err| Error::InvalidRequest(format!("invalid api url {base_url:?}: {err}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::InvalidRequest(format!(
                "api url scheme must be http/https: {base_url}"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| Error::network(format!("build http client: {err}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| Error::network(format!("GET {url}: {err}")))?;
        decode_json(&url, response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| Error::network(format!("POST {url}: {err}")))?;
        decode_json(&url, response).await
    }

    async fn post_empty<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.endpoint(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| Error::network(format!("POST {url}: {err}")))?;
        expect_success(&url, response).await
    }

    async fn put_empty<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.endpoint(path);
        let response = self
            .client
            .put(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| Error::network(format!("PUT {url}: {err}")))?;
        expect_success(&url, response).await
    }
}

async fn decode_json<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let raw = response
        .text()
        .await
        .map_err(|err| Error::network(format!("read body of {url}: {err}")))?;
    if !status.is_success() {
        return Err(server_error(url, status, &raw));
    }
    serde_json::from_str(&raw)
        .map_err(|err| Error::network(format!("malformed response from {url}: {err}")))
}

async fn expect_success(url: &str, response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if !status.is_success() {
        let raw = response.text().await.unwrap_or_default();
        return Err(server_error(url, status, &raw));
    }
    Ok(())
}

fn server_error(url: &str, status: reqwest::StatusCode, raw: &str) -> Error {
    let message = parse_error_message(raw).unwrap_or_else(|| raw.trim().to_owned());
    Error::network(format!("{url} returned {status}: {message}"))
}

/// Pull the human-readable message out of a JSON error body. The service
/// uses `detail`; `error` and `message` are accepted for good measure.
fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    for key in ["detail", "error", "message"] {
        if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
            return Some(message.to_owned());
        }
    }
    None
}

#[async_trait]
impl PipelineApi for HttpPipelineApi {
    async fn fetch_job(&self, job_id: &str) -> Result<Job> {
        self.get_json(&format!("job/{job_id}")).await
    }

    async fn fetch_details(&self, job_id: &str) -> Result<DetailedProgress> {
        self.get_json(&format!("job/{job_id}/details")).await
    }

    async fn fetch_resume_info(&self, job_id: &str) -> Result<ResumeInfo> {
        self.get_json(&format!("job/{job_id}/resume-info")).await
    }

    async fn fetch_sections(&self, job_id: &str) -> Result<Vec<Section>> {
        self.get_json(&format!("job/{job_id}/sections")).await
    }

    async fn fetch_section(&self, job_id: &str, index: usize) -> Result<Section> {
        self.get_json(&format!("job/{job_id}/section/{index}")).await
    }

    async fn update_section_code(&self, job_id: &str, section_id: &str, code: &str) -> Result<()> {
        self.put_empty(
            &format!("job/{job_id}/section/{section_id}/code"),
            &serde_json::json!({ "code": code }),
        )
        .await
    }

    async fn regenerate_section(&self, job_id: &str, section_id: &str) -> Result<()> {
        self.post_empty(
            &format!("job/{job_id}/section/{section_id}/regenerate"),
            &serde_json::json!({}),
        )
        .await
    }

    async fn fix_section(
        &self,
        job_id: &str,
        section_id: &str,
        request: &FixRequest,
    ) -> Result<FixResponse> {
        self.post_json(&format!("job/{job_id}/section/{section_id}/fix"), request)
            .await
    }

    async fn start_generation(&self, request: &GenerationRequest) -> Result<String> {
        let created: JobCreated = self.post_json("generate", request).await?;
        Ok(created.job_id)
    }

    async fn compile_high_quality(&self, job_id: &str, quality: &str) -> Result<String> {
        let started: CompileStarted = self
            .post_json(
                &format!("job/{job_id}/compile-high-quality"),
                &CompileRequest {
                    quality: quality.to_owned(),
                },
            )
            .await?;
        Ok(started.hq_job_id)
    }

    async fn list_translations(&self, job_id: &str) -> Result<Vec<TranslationJob>> {
        self.get_json(&format!("job/{job_id}/translations")).await
    }

    async fn list_languages(&self) -> Result<Vec<LanguageInfo>> {
        self.get_json("translation/languages").await
    }

    async fn request_translation(
        &self,
        job_id: &str,
        target_language: &str,
        voice: Option<&str>,
    ) -> Result<TranslationJob> {
        self.post_json(
            &format!("job/{job_id}/translate"),
            &TranslateRequest {
                target_language: target_language.to_owned(),
                voice: voice.map(str::to_owned),
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_detail_field() {
        let raw = r#"{"detail": "job not found"}"#;
        assert_eq!(parse_error_message(raw).as_deref(), Some("job not found"));
    }

    #[test]
    fn error_message_falls_back_through_known_keys() {
        assert_eq!(
            parse_error_message(r#"{"error": "boom"}"#).as_deref(),
            Some("boom")
        );
        assert_eq!(
            parse_error_message(r#"{"message": "nope"}"#).as_deref(),
            Some("nope")
        );
        assert_eq!(parse_error_message("not json"), None);
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let api = HttpPipelineApi::new("http://127.0.0.1:9/api/").unwrap();
        assert_eq!(api.endpoint("job/J1"), "http://127.0.0.1:9/api/job/J1");
    }

    #[test]
    fn rejects_non_http_url() {
        let err = HttpPipelineApi::new("ftp://example.com").unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }
}
