//! Integration tests for `gchat exec` against a mocked Gemini API.


use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use fixtures::{GENERATE_PATH, error_response, text_response};
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer};

/// `gchat exec` wired to the mock server with instant timing.
fn exec_cmd(server: &MockServer, home: &TempDir, prompt: &str) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("gchat");
    cmd.env("GCHAT_HOME", home.path())
        .env("GEMINI_API_KEY", "test-api-key")
        .env("GEMINI_BASE_URL", server.uri())
        .args(["exec", "-p", prompt])
        .args(["--settle-delay-ms", "0", "--reveal-interval-ms", "0"]);
    cmd
}

#[tokio::test]
async fn test_exec_prints_revealed_answer() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-api-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Hi" }] }]
        })))
        .respond_with(text_response("Hello there. How are you?"))
        .expect(1)
        .mount(&server)
        .await;

    exec_cmd(&server, &home, "Hi")
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello there.\nHow are you?"));
}

#[tokio::test]
async fn test_exec_strips_emphasis_when_piped() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(text_response("**Bold** move, *friend*"))
        .mount(&server)
        .await;

    exec_cmd(&server, &home, "Hi")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bold move,\nfriend"))
        .stdout(predicate::str::contains("<strong>").not())
        .stdout(predicate::str::contains("**").not());
}

#[tokio::test]
async fn test_exec_model_override_changes_endpoint() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-pro:generateContent"))
        .respond_with(text_response("pro answer"))
        .expect(1)
        .mount(&server)
        .await;

    exec_cmd(&server, &home, "Hi")
        .args(["--model", "gemini-2.5-pro"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pro answer"));
}

#[tokio::test]
async fn test_exec_quota_error_fails() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(error_response(429, "RESOURCE_EXHAUSTED", "Quota exceeded"))
        .mount(&server)
        .await;

    exec_cmd(&server, &home, "Hi")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: API quota exceeded or rate limit reached",
        ));
}

#[tokio::test]
async fn test_exec_error_text_answer_fails() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(text_response("Error: model is overloaded"))
        .mount(&server)
        .await;

    exec_cmd(&server, &home, "Hi")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: model is overloaded"));
}

#[tokio::test]
async fn test_exec_missing_api_key_skips_request() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .respond_with(text_response("unused"))
        .expect(0)
        .mount(&server)
        .await;

    exec_cmd(&server, &home, "Hi")
        .env_remove("GEMINI_API_KEY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key not configured"));
}

#[tokio::test]
async fn test_exec_reads_key_and_base_url_from_config() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "config-key"))
        .respond_with(text_response("from config"))
        .expect(1)
        .mount(&server)
        .await;

    fs::write(
        home.path().join("config.toml"),
        format!(
            "[providers.gemini]\napi_key = \"config-key\"\nbase_url = \"{}\"\n\n[dispatch]\nsettle_delay_ms = 0\nreveal_interval_ms = 0\n",
            server.uri()
        ),
    )
    .unwrap();

    cargo_bin_cmd!("gchat")
        .env("GCHAT_HOME", home.path())
        .env_remove("GEMINI_API_KEY")
        .env_remove("GEMINI_BASE_URL")
        .args(["exec", "-p", "Hi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from config"));
}

#[tokio::test]
async fn test_piped_stdin_runs_exec() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{ "text": "piped prompt" }] }]
        })))
        .respond_with(text_response("piped answer"))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("gchat")
        .env("GCHAT_HOME", home.path())
        .env("GEMINI_API_KEY", "test-api-key")
        .env("GEMINI_BASE_URL", server.uri())
        .args(["--settle-delay-ms", "0", "--reveal-interval-ms", "0"])
        .write_stdin("  piped prompt\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("piped answer"));
}

#[test]
fn test_empty_piped_stdin_fails() {
    let home = TempDir::new().unwrap();

    cargo_bin_cmd!("gchat")
        .env("GCHAT_HOME", home.path())
        .write_stdin("   \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No input provided via pipe"));
}

#[tokio::test]
async fn test_exec_writes_log_file() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(text_response("logged"))
        .mount(&server)
        .await;

    exec_cmd(&server, &home, "Hi").assert().success();

    let log = fs::read_to_string(home.path().join("logs").join("gchat.log")).unwrap();
    assert!(log.contains("session finished"));
}
