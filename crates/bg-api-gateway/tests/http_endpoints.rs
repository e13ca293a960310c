//! HTTP endpoint tests driven through the full router with `oneshot`.

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use bg_api_gateway::{ApiGatewayService, GatewayConfig};
use bg_governance::*;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct TestApp {
    store: Arc<InMemoryDocumentStore>,
    gateway: ApiGatewayService,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(InMemoryDocumentStore::new());
        store.seed_program(BountyProgram::new(ProgramName::parse("Acme").unwrap()).with_quorum(
            QuorumPolicy {
                threshold: QuorumThreshold::Majority,
                require_severity: true,
            },
        ));

        let service = GovernanceService::new(GovernanceDependencies {
            store: store.clone(),
            events: Arc::new(InMemoryEventSink::new()),
            attachments: Arc::new(InMemoryAttachmentDirectory::new()),
            config: GovernanceConfig {
                transaction_timeout: Duration::from_secs(2),
                max_vote_retries: 8,
                retry_backoff: Duration::from_millis(1),
                attachment_timeout: Duration::from_millis(500),
            },
        });
        let metrics = service.metrics();
        let gateway =
            ApiGatewayService::new(GatewayConfig::default(), Arc::new(service), metrics).unwrap();
        Self { store, gateway }
    }

    fn router(&self) -> Router {
        self.gateway.router()
    }

    fn seed_submission(&self) -> SubmissionId {
        let submission = Submission::new(
            SubmissionId::generate(),
            ProgramName::parse("Acme").unwrap(),
            Utc::now(),
        );
        let id = submission.id.clone();
        self.store.seed_submission(submission);
        id
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn add_reviewers(&self, reviewers: &[&str]) {
        for r in reviewers {
            let (status, _) = self
                .send(
                    Method::POST,
                    "/api/addReviewer",
                    Some(json!({"program": "Acme", "reviewerAddress": r})),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    async fn vote(&self, id: &SubmissionId, reviewer: &str, body: Value) -> (StatusCode, Value) {
        let mut body = body;
        body["reviewerAddress"] = json!(reviewer);
        self.send(
            Method::POST,
            &format!("/api/submissions/{}/castReviewerVote", id),
            Some(body),
        )
        .await
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_add_reviewer_returns_bounty() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/api/addReviewer",
            Some(json!({"program": "Acme", "reviewerAddress": "0xABC"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bounty"]["name"], "Acme");
    assert_eq!(body["bounty"]["reviewerAddresses"], json!(["0xabc"]));
}

#[tokio::test]
async fn test_add_reviewer_missing_field_is_400() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Method::POST, "/api/addReviewer", Some(json!({"program": "Acme"})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "invalid_request");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("reviewerAddress"));
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/addReviewer")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_reviewer_is_500_with_conflict_kind() {
    let app = TestApp::new();
    app.add_reviewers(&["0xa"]).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/addReviewer",
            Some(json!({"program": "Acme", "reviewerAddress": "0xA"})),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["kind"], "conflict");
}

#[tokio::test]
async fn test_remove_reviewer_and_list() {
    let app = TestApp::new();
    app.add_reviewers(&["0xa", "0xb"]).await;

    let (status, body) = app
        .send(
            Method::DELETE,
            "/api/removeReviewer",
            Some(json!({"program": "Acme", "address": "0xa"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bounty"]["reviewerAddresses"], json!(["0xb"]));

    let (status, body) = app
        .send(Method::GET, "/api/listReviewers?program=Acme", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let reviewers = body["reviewers"].as_array().unwrap();
    assert_eq!(reviewers.len(), 1);
    assert_eq!(reviewers[0]["address"], "0xb");
    assert_eq!(reviewers[0]["reviewedSubmissions"], 0);
    assert_eq!(reviewers[0]["pendingSubmissions"], 0);
    assert!(reviewers[0]["assignedDate"].is_string());
    assert!(reviewers[0]["lastActive"].is_null());
}

#[tokio::test]
async fn test_list_reviewers_unknown_program_is_404() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Method::GET, "/api/listReviewers?program=Nope", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "not_found");
}

#[tokio::test]
async fn test_manager_lifecycle() {
    let app = TestApp::new();

    let (status, body) = app.send(Method::GET, "/api/getManager?program=Acme", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let (status, body) = app
        .send(
            Method::POST,
            "/api/addManager",
            Some(json!({"program": "Acme", "managerAddress": "0xM1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bounty"]["managerAddress"], "0xm1");

    let (status, body) = app
        .send(
            Method::PUT,
            "/api/changeManager",
            Some(json!({"program": "Acme", "newManagerAddress": "0xm2"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bounty"]["managerAddress"], "0xm2");

    let (_, body) = app.send(Method::GET, "/api/getManager?program=Acme", None).await;
    assert_eq!(body["address"], "0xm2");
    assert_eq!(body["reviewedSubmissions"], 0);

    let (status, body) = app
        .send(Method::DELETE, "/api/removeManager", Some(json!({"program": "Acme"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["bounty"]["managerAddress"].is_null());

    // Slot is empty now.
    let (status, body) = app
        .send(Method::DELETE, "/api/removeManager", Some(json!({"program": "Acme"})))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["kind"], "not_found");
}

#[tokio::test]
async fn test_cast_reviewer_vote_reaches_quorum() {
    let app = TestApp::new();
    app.add_reviewers(&["0xa", "0xb", "0xc"]).await;
    let id = app.seed_submission();

    let (status, body) = app
        .vote(&id, "0xa", json!({"vote": "accepted", "severity": "High", "comment": "ok"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quorumReached"], false);
    assert_eq!(body["submission"]["status"], "reviewing");
    assert_eq!(body["submission"]["votingStatus"], "in_review");

    let (status, body) = app
        .vote(&id, "0xB", json!({"vote": "accepted", "severity": "high"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quorumReached"], true);
    assert_eq!(body["voteSummary"]["accepted"], 2);
    assert_eq!(body["voteSummary"]["eligibleReviewers"], 3);
    assert_eq!(body["voteSummary"]["requiredVotes"], 2);
    assert_eq!(body["attachments"], json!([]));
}

#[tokio::test]
async fn test_vote_error_statuses() {
    let app = TestApp::new();
    app.add_reviewers(&["0xa"]).await;
    let id = app.seed_submission();

    let (status, _) = app.vote(&id, "0xa", json!({"vote": "maybe"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Severity is mandatory on an accepted vote for this program.
    let (status, body) = app.vote(&id, "0xa", json!({"vote": "accepted"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "invalid_state");

    let (status, body) = app
        .vote(&id, "0xoutsider", json!({"vote": "rejected"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["kind"], "unauthorized");

    let missing = SubmissionId::generate();
    let (status, _) = app.vote(&missing, "0xa", json!({"vote": "rejected"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/submissions/{}/castReviewerVote", id),
            Some(json!({"vote": "rejected"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("reviewerAddress"));
}

#[tokio::test]
async fn test_manager_vote_and_finalize() {
    let app = TestApp::new();
    app.add_reviewers(&["0xa"]).await;
    app.send(
        Method::POST,
        "/api/addManager",
        Some(json!({"program": "Acme", "managerAddress": "0xm"})),
    )
    .await;
    let id = app.seed_submission();

    // Not finalizable before quorum.
    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/submissions/{}/finalize", id),
            Some(json!({"managerAddress": "0xm"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .vote(&id, "0xa", json!({"vote": "accepted", "severity": "Medium"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/submissions/{}/castManagerVote", id),
            Some(json!({"managerAddress": "0xa", "vote": "rejected"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/submissions/{}/castManagerVote", id),
            Some(json!({"managerAddress": "0xm", "vote": "rejected", "comment": "duplicate"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["submission"]["managerVote"]["vote"], "rejected");

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/submissionStatus?submissionId={}", id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["canFinalize"], true);
    assert_eq!(body["votingStatus"], "quorum_reached");

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/submissions/{}/finalize", id),
            Some(json!({"managerAddress": "0xm"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["submission"]["status"], "rejected");

    let (status, body) = app
        .vote(&id, "0xa", json!({"vote": "rejected"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "invalid_state");
}

#[tokio::test]
async fn test_submission_status_requires_id() {
    let app = TestApp::new();
    let (status, _) = app.send(Method::GET, "/api/submissionStatus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_endpoint_counts_requests() {
    let app = TestApp::new();
    app.add_reviewers(&["0xa"]).await;
    app.send(Method::POST, "/api/addReviewer", Some(json!({}))).await;

    let (status, body) = app.send(Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gateway"]["requests"]["success"], 1);
    assert_eq!(body["gateway"]["requests"]["error"], 1);
    assert_eq!(body["gateway"]["requests"]["writes"], 2);
    assert_eq!(body["governance"]["operationsCommitted"], 1);
}

#[tokio::test]
async fn test_serve_and_graceful_shutdown() {
    let app = TestApp::new();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        app.gateway
            .serve(listener, async move {
                let _ = rx.await;
            })
            .await
    });

    tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
