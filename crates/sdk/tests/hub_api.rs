//! HTTP-level tests of the SDK against a mock hub.

use evaljobs_sdk::services::uv_job_spec;
use evaljobs_sdk::{Client, CommitFile, HardwareFlavor, JobStage, RepoId, RepoKind, SdkError};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client(server: &MockServer) -> Client {
    Client::builder()
        .base_url(server.uri())
        .token("hf_test")
        .build()
        .unwrap()
}

fn repo() -> RepoId {
    RepoId::new("alice", "gpqa-run").unwrap()
}

#[tokio::test]
async fn whoami_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/whoami-v2"))
        .and(header("authorization", "Bearer hf_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "alice",
            "type": "user",
            "orgs": [{"name": "evals-org"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let me = client(&server).await.whoami().await.unwrap();
    assert_eq!(me.name, "alice");
    assert_eq!(me.orgs[0].name, "evals-org");
}

#[tokio::test]
async fn whoami_invalid_token_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/whoami-v2"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials in Authorization header"})),
        )
        .mount(&server)
        .await;

    let err = client(&server).await.whoami().await.unwrap_err();
    match err {
        SdkError::Unauthorized { message, .. } => {
            assert_eq!(message, "Invalid credentials in Authorization header")
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn repo_info_missing_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/datasets/alice/gpqa-run"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Repository not found"})))
        .mount(&server)
        .await;

    let info = client(&server)
        .await
        .repos()
        .info(RepoKind::Dataset, &repo())
        .await
        .unwrap();
    assert!(info.is_none());
}

#[tokio::test]
async fn create_repo_conflict_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/repos/create"))
        .and(body_json(json!({
            "type": "space",
            "name": "gpqa-run",
            "organization": "alice",
            "private": false,
            "sdk": "docker"
        })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"error": "You already created this space repo"})))
        .mount(&server)
        .await;

    let created = client(&server)
        .await
        .repos()
        .create(RepoKind::Space, &repo(), false)
        .await
        .unwrap();
    assert!(!created);
}

#[tokio::test]
async fn commit_posts_ndjson() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/datasets/alice/gpqa-run/commit/main"))
        .and(header("content-type", "application/x-ndjson"))
        .and(body_string_contains("\"path\":\"logs/.gitkeep\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "commitUrl": "https://huggingface.co/datasets/alice/gpqa-run/commit/abc",
            "commitOid": "abc"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = client(&server)
        .await
        .repos()
        .commit(
            RepoKind::Dataset,
            &repo(),
            &[CommitFile::new("logs/.gitkeep", "keep")],
            "Create logs directory",
        )
        .await
        .unwrap();
    assert_eq!(info.commit_oid.as_deref(), Some("abc"));
}

#[tokio::test]
async fn list_files_is_recursive_and_skips_directories() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/datasets/alice/gpqa-run/tree/main/logs"))
        .and(query_param("recursive", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"type": "file", "path": "logs/.gitkeep", "size": 4},
            {"type": "directory", "path": "logs/old"},
            {"type": "file", "path": "logs/old/2025-01-01_gpqa.json", "size": 2048}
        ])))
        .mount(&server)
        .await;

    let files = client(&server)
        .await
        .repos()
        .list_files(RepoKind::Dataset, &repo(), "logs/")
        .await
        .unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[1].size, 2048);
}

#[tokio::test]
async fn list_files_of_missing_folder_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/datasets/alice/gpqa-run/tree/main/logs"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let files = client(&server)
        .await
        .repos()
        .list_files(RepoKind::Dataset, &repo(), "logs")
        .await
        .unwrap();
    assert!(files.is_empty());
}

#[tokio::test]
async fn download_uses_resolve_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spaces/alice/gpqa-run/resolve/main/eval.py"))
        .respond_with(ResponseTemplate::new(200).set_body_string("from inspect_ai import task"))
        .mount(&server)
        .await;

    let bytes = client(&server)
        .await
        .repos()
        .download(RepoKind::Space, &repo(), "eval.py")
        .await
        .unwrap();
    assert_eq!(bytes, b"from inspect_ai import task");
}

#[tokio::test]
async fn set_variable_replaces_existing_value() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/spaces/alice/gpqa-run/variables"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"error": "Variable already exists"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/spaces/alice/gpqa-run/variables"))
        .and(body_json(json!({"key": "LOG_DIR"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/spaces/alice/gpqa-run/variables"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    client(&server)
        .await
        .spaces()
        .set_variable(&repo(), "LOG_DIR", "hf://datasets/alice/gpqa-run/logs")
        .await
        .unwrap();
}

#[tokio::test]
async fn set_variable_keeps_other_rejections() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/spaces/alice/gpqa-run/variables"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "You don't have the rights"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/spaces/alice/gpqa-run/variables"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .spaces()
        .set_variable(&repo(), "LOG_DIR", "hf://datasets/alice/gpqa-run/logs")
        .await
        .unwrap_err();
    match err {
        SdkError::Forbidden { message } => assert_eq!(message, "You don't have the rights"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn list_files_follows_next_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/datasets/alice/gpqa-run/tree/main/logs"))
        .and(query_param("cursor", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"type": "file", "path": "logs/b.json", "size": 20}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/datasets/alice/gpqa-run/tree/main/logs"))
        .and(query_param("recursive", "true"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "link",
                    format!(
                        "<{}/api/datasets/alice/gpqa-run/tree/main/logs?recursive=true&cursor=page2>; rel=\"next\"",
                        server.uri()
                    )
                    .as_str(),
                )
                .set_body_json(json!([
                    {"type": "file", "path": "logs/a.json", "size": 10}
                ])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let files = client(&server)
        .await
        .repos()
        .list_files(RepoKind::Dataset, &repo(), "logs")
        .await
        .unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["logs/a.json", "logs/b.json"]);
}

#[tokio::test]
async fn not_found_keeps_hub_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/bob/job-42"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"error": "Namespace bob not accessible with this token"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .jobs()
        .get("bob", "job-42")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    match err {
        SdkError::NotFound { message, .. } => {
            assert_eq!(message, "Namespace bob not accessible with this token")
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn timeout_reports_configured_duration() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/whoami-v2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(2))
                .set_body_json(json!({"name": "alice", "type": "user"})),
        )
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(server.uri())
        .token("hf_test")
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    match client.whoami().await.unwrap_err() {
        SdkError::Timeout { duration } => assert_eq!(duration, Duration::from_millis(200)),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn run_job_and_poll_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/alice"))
        .and(body_string_contains("\"flavor\":\"a10g-small\""))
        .and(body_string_contains("\"timeoutSeconds\":3600"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "job-42",
            "status": {"stage": "RUNNING"},
            "owner": {"name": "alice"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/alice/job-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "job-42",
            "status": {"stage": "ERROR", "message": "Job failed with exit code: 1"},
            "owner": {"name": "alice"}
        })))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let spec = uv_job_spec(
        "https://huggingface.co/spaces/alice/gpqa-run/resolve/main/runner.py",
        &["inspect_evals/gpqa_diamond".into(), "openai/gpt-4o".into()],
        HardwareFlavor::A10gSmall,
        Some(3600),
        BTreeMap::from([("HF_TOKEN".to_string(), "hf_test".to_string())]),
    );

    let job = client.jobs().run("alice", &spec).await.unwrap();
    assert_eq!(job.id, "job-42");

    let job = client.jobs().get("alice", "job-42").await.unwrap();
    assert_eq!(job.status.stage, JobStage::Error);
    assert_eq!(job.status.message.as_deref(), Some("Job failed with exit code: 1"));
}

#[tokio::test]
async fn rejected_job_keeps_remote_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jobs/alice"))
        .respond_with(
            ResponseTemplate::new(402).set_body_json(json!({"error": "Pre-paid credit balance is insufficient"})),
        )
        .mount(&server)
        .await;

    let spec = uv_job_spec("runner.py", &[], HardwareFlavor::H100, None, BTreeMap::new());
    let err = client(&server)
        .await
        .jobs()
        .run("alice", &spec)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(402));
    assert!(err.to_string().contains("Pre-paid credit balance is insufficient"));
}

#[tokio::test]
async fn job_logs_parse_event_stream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jobs/alice/job-42/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "data: {\"data\": \"Running evaluation...\", \"timestamp\": \"2025-01-01T00:00:00Z\"}\n\n\
             data: {\"data\": \"done\", \"timestamp\": \"2025-01-01T00:00:05Z\"}\n\n",
        ))
        .mount(&server)
        .await;

    let lines = client(&server)
        .await
        .jobs()
        .logs("alice", "job-42")
        .await
        .unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].data, "Running evaluation...");
}
