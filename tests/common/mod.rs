#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use llamareview::config::Config;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;

pub const OWNER: &str = "octo";
pub const REPO: &str = "widget";

/// A well-formed review in the labeled format the prompt asks for
pub const REVIEW_TEXT: &str = "SCORE: 78/100
SUMMARY: A small, tidy crate with clear module boundaries.
STRENGTHS:
- Clear structure: Each module has a single responsibility.
- Good naming: Functions say what they do.
IMPROVEMENTS:
1. Error handling - score: 6/10 - issue: Errors are unwrapped in main. - action: Propagate them with ?.
2. Tests - score: 5/10 - issue: No integration tests. - action: Add tests for the public API.
CODE EXAMPLE BEFORE:
let value = parse(input).unwrap();
CODE EXAMPLE AFTER:
let value = parse(input)?;
FINAL THOUGHTS: Nice foundation; tighten error handling next.";

pub fn setup_test_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// Config pointing both GitHub and the model provider at the mock server
pub fn create_test_config(server: &ServerGuard) -> Config {
    let mut config = Config::default();
    config.github.api_base = server.url();
    config.github.timeout_secs = 5;
    config.llm.api_key = Some("sk-ant-test-key".to_string());
    config.llm.base_url = Some(server.url());
    config.llm.timeout_secs = 5;
    config.llm.max_retries = 1;
    config.llm.retry_base_delay_ms = 10;
    config.processing.fetch_timeout_secs = 5;
    config
}

pub fn repo_url() -> String {
    format!("https://github.com/{}/{}", OWNER, REPO)
}

/// Mocks repository metadata, the recursive tree and one contents endpoint per file
pub async fn mock_repository(server: &mut ServerGuard, files: &[(&str, &str)]) -> Vec<Mock> {
    let mut mocks = Vec::new();

    mocks.push(
        server
            .mock("GET", format!("/repos/{}/{}", OWNER, REPO).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "name": REPO, "default_branch": "main" }).to_string())
            .create_async()
            .await,
    );

    let tree: Vec<_> = files
        .iter()
        .map(|(path, content)| json!({ "path": path, "type": "blob", "size": content.len() }))
        .collect();
    mocks.push(
        server
            .mock("GET", format!("/repos/{}/{}/git/trees/main", OWNER, REPO).as_str())
            .match_query(Matcher::UrlEncoded("recursive".into(), "1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "truncated": false, "tree": tree }).to_string())
            .create_async()
            .await,
    );

    for (path, content) in files {
        mocks.push(
            server
                .mock(
                    "GET",
                    format!("/repos/{}/{}/contents/{}", OWNER, REPO, path).as_str(),
                )
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(
                    json!({ "encoding": "base64", "content": STANDARD.encode(content) })
                        .to_string(),
                )
                .create_async()
                .await,
        );
    }

    mocks
}

pub async fn mock_languages(server: &mut ServerGuard, body: serde_json::Value) -> Mock {
    server
        .mock("GET", format!("/repos/{}/{}/languages", OWNER, REPO).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

/// Mocks the Anthropic messages endpoint answering with `text`
pub async fn mock_anthropic(server: &mut ServerGuard, text: &str) -> Mock {
    server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "sk-ant-test-key")
        .match_header("anthropic-version", "2023-06-01")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "msg_test",
                "type": "message",
                "role": "assistant",
                "content": [{ "type": "text", "text": text }],
                "stop_reason": "end_turn"
            })
            .to_string(),
        )
        .create_async()
        .await
}
