mod pipeline_stub;

use std::sync::Arc;
use std::time::Duration;

use docuvid::api::{HttpPipelineApi, PipelineApi};
use docuvid::error::Error;
use docuvid::model::JobStatus;
use docuvid::poller::JobPoller;
use docuvid::section::SectionStatus;

use pipeline_stub::PipelineStub;

#[tokio::test]
async fn fetch_job_parses_wire_format() {
    let stub = PipelineStub::spawn();
    stub.route(
        "GET",
        "/api/job/J1",
        serde_json::json!({
            "job_id": "J1",
            "status": "generating_sections",
            "progress": 0.4,
            "message": "rendering section 2 of 5"
        }),
    );

    let api = HttpPipelineApi::new(&stub.base_url).unwrap();
    let job = api.fetch_job("J1").await.unwrap();
    assert_eq!(job.status, JobStatus::GeneratingSections);
    assert_eq!(job.progress, 0.4);
    assert_eq!(job.message, "rendering section 2 of 5");
}

#[tokio::test]
async fn server_error_detail_is_surfaced_as_network_failure() {
    let stub = PipelineStub::spawn();
    stub.route_with_status(
        "GET",
        "/api/job/NOPE",
        404,
        serde_json::json!({ "detail": "job not found" }),
    );

    let api = HttpPipelineApi::new(&stub.base_url).unwrap();
    let err = api.fetch_job("NOPE").await.unwrap_err();
    match err {
        Error::Network { message } => {
            assert!(message.contains("job not found"), "message: {message}");
            assert!(message.contains("404"), "message: {message}");
        }
        other => panic!("expected Network error, got {other:?}"),
    }
}

#[tokio::test]
async fn update_code_sends_put_with_code_body() {
    let stub = PipelineStub::spawn();
    stub.route(
        "PUT",
        "/api/job/J1/section/s1/code",
        serde_json::json!({}),
    );

    let api = HttpPipelineApi::new(&stub.base_url).unwrap();
    api.update_section_code("J1", "s1", "class Scene: pass")
        .await
        .unwrap();

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "PUT");
    assert_eq!(requests[0].path, "/api/job/J1/section/s1/code");
    assert_eq!(
        requests[0].body.get("code").and_then(|v| v.as_str()),
        Some("class Scene: pass")
    );
}

#[tokio::test]
async fn unknown_section_status_from_wire_falls_back_to_waiting() {
    let stub = PipelineStub::spawn();
    stub.route(
        "GET",
        "/api/job/J1/sections",
        serde_json::json!([
            { "section_id": "s1", "index": 0, "status": "quantum_rendering" },
            { "section_id": "s2", "index": 1, "status": "completed" }
        ]),
    );

    let api = HttpPipelineApi::new(&stub.base_url).unwrap();
    let sections = api.fetch_sections("J1").await.unwrap();
    assert_eq!(sections[0].status, SectionStatus::Waiting);
    assert_eq!(sections[1].status, SectionStatus::Completed);
}

#[tokio::test]
async fn poller_over_http_stops_at_terminal_status() {
    let stub = PipelineStub::spawn();
    stub.route(
        "GET",
        "/api/job/J1",
        serde_json::json!({
            "job_id": "J1", "status": "generating_sections", "progress": 0.2, "message": "working"
        }),
    );
    stub.route(
        "GET",
        "/api/job/J1",
        serde_json::json!({
            "job_id": "J1", "status": "completed", "progress": 1.0, "message": "done",
            "result": [{ "video_id": "v1", "title": "Main", "url": "http://cdn/v1.mp4" }]
        }),
    );
    stub.route(
        "GET",
        "/api/job/J1/details",
        serde_json::json!({
            "stage": "generating", "total_sections": 1, "completed_sections": 0,
            "sections": [{ "section_id": "s1", "index": 0, "status": "generating_manim" }]
        }),
    );

    let api: Arc<dyn PipelineApi> = Arc::new(HttpPipelineApi::new(&stub.base_url).unwrap());
    let handle = JobPoller::new(api, "J1")
        .with_interval(Duration::from_millis(10))
        .spawn();
    let updates = handle.updates();
    handle.wait().await;

    let snapshot = updates.borrow().clone();
    let job = snapshot.job.expect("job present");
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.result.expect("result")[0].video_id, "v1");
    let details = snapshot.details.expect("details paired with final status");
    assert_eq!(details.sections.len(), 1);

    let calls = stub.requests_to("GET", "/api/job/J1");
    assert_eq!(calls, 2, "poller must stop once terminal");
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(stub.requests_to("GET", "/api/job/J1"), calls);
}
