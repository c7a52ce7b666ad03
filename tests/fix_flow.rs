mod pipeline_stub;

use std::sync::Arc;

use docuvid::api::{HttpPipelineApi, PipelineApi};
use docuvid::error::Error;
use docuvid::workflow::SectionWorkbench;

use pipeline_stub::PipelineStub;

fn stub_with_section_routes() -> PipelineStub {
    let stub = PipelineStub::spawn();
    stub.route(
        "POST",
        "/api/job/J1/section/s1/fix",
        serde_json::json!({ "fixed_code": "class Fixed(Scene): pass" }),
    );
    stub.route(
        "PUT",
        "/api/job/J1/section/s1/code",
        serde_json::json!({}),
    );
    stub.route(
        "POST",
        "/api/job/J1/section/s1/regenerate",
        serde_json::json!({}),
    );
    stub.route(
        "GET",
        "/api/job/J1/sections",
        serde_json::json!([{
            "section_id": "s1", "index": 0, "title": "Intro", "status": "failed",
            "has_code": true, "fix_attempts": 1,
            "code": "class Broken(Scene): pass"
        }]),
    );
    stub
}

#[tokio::test]
async fn fix_round_trip_persists_code_before_regenerating() {
    let stub = stub_with_section_routes();
    let api: Arc<dyn PipelineApi> = Arc::new(HttpPipelineApi::new(&stub.base_url).unwrap());
    let bench = SectionWorkbench::new(api, "J1", "s1");
    bench.set_prompt("the title overlaps the axes");

    let ran = bench.fix_with_ai("class Broken(Scene): pass").await.unwrap();
    assert!(ran);

    let order: Vec<String> = stub
        .requests()
        .iter()
        .map(|r| format!("{} {}", r.method, r.path))
        .collect();
    assert_eq!(
        order,
        vec![
            "POST /api/job/J1/section/s1/fix",
            "PUT /api/job/J1/section/s1/code",
            "POST /api/job/J1/section/s1/regenerate",
            "GET /api/job/J1/sections",
        ]
    );

    // the persisted code is the fixer's output, not the old code
    let put_body = &stub.requests()[1].body;
    assert_eq!(
        put_body.get("code").and_then(|v| v.as_str()),
        Some("class Fixed(Scene): pass")
    );

    // fix request carried the prompt and the pre-fix code
    let fix_body = &stub.requests()[0].body;
    assert_eq!(
        fix_body.get("prompt").and_then(|v| v.as_str()),
        Some("the title overlaps the axes")
    );
    assert_eq!(
        fix_body.get("current_code").and_then(|v| v.as_str()),
        Some("class Broken(Scene): pass")
    );
}

#[tokio::test]
async fn failed_persist_leaves_prompt_for_retry_and_skips_regenerate() {
    let stub = PipelineStub::spawn();
    stub.route(
        "POST",
        "/api/job/J1/section/s1/fix",
        serde_json::json!({ "fixed_code": "class Fixed(Scene): pass" }),
    );
    stub.route_with_status(
        "PUT",
        "/api/job/J1/section/s1/code",
        503,
        serde_json::json!({ "detail": "storage unavailable" }),
    );

    let api: Arc<dyn PipelineApi> = Arc::new(HttpPipelineApi::new(&stub.base_url).unwrap());
    let bench = SectionWorkbench::new(api, "J1", "s1");
    bench.set_prompt("tighten the layout");

    let err = bench.fix_with_ai("old").await.unwrap_err();
    assert!(matches!(err, Error::Network { .. }));
    assert_eq!(bench.prompt(), "tighten the layout");

    assert_eq!(stub.requests_to("POST", "/api/job/J1/section/s1/regenerate"), 0);
    assert_eq!(stub.requests_to("GET", "/api/job/J1/sections"), 0);
}

#[tokio::test]
async fn regenerate_refetches_sections_for_fresh_state() {
    let stub = stub_with_section_routes();
    let api: Arc<dyn PipelineApi> = Arc::new(HttpPipelineApi::new(&stub.base_url).unwrap());
    let bench = SectionWorkbench::new(api, "J1", "s1");

    let ran = bench.regenerate().await.unwrap();
    assert!(ran);

    assert_eq!(stub.requests_to("POST", "/api/job/J1/section/s1/regenerate"), 1);
    assert_eq!(stub.requests_to("GET", "/api/job/J1/sections"), 1);
    let section = bench.section().expect("cached after refetch");
    assert_eq!(section.title, "Intro");
}
