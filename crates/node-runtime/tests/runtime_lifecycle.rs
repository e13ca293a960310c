//! Node startup, seeding and shutdown against the file backend.

use bg_governance::{GovernanceApi, ProgramName, SubmissionId, Vote, WalletAddress};
use node_runtime::container::{NodeConfig, StorageBackend};
use node_runtime::NodeRuntime;

fn config_in(dir: &std::path::Path) -> NodeConfig {
    let fixtures = dir.join("fixtures.json");
    std::fs::write(
        &fixtures,
        r#"{
            "programs": [{"name": "Acme", "reviewers": ["0xa"], "manager": "0xm"}],
            "submissions": [{"id": "acme-1", "program": "Acme"}]
        }"#,
    )
    .unwrap();

    let mut config = NodeConfig::default();
    config.storage.backend = StorageBackend::File;
    config.storage.data_path = Some(dir.join("gov.json"));
    config.seed.fixtures_path = Some(fixtures);
    config
}

#[tokio::test]
async fn test_seeded_node_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let acme = ProgramName::parse("Acme").unwrap();
    let id = SubmissionId::parse("acme-1").unwrap();

    let mut runtime = NodeRuntime::new(config_in(dir.path())).unwrap();
    runtime.start().await.unwrap();
    let service = runtime.container().service.clone();

    let receipt = service
        .cast_reviewer_vote(
            &id,
            &WalletAddress::parse("0xA").unwrap(),
            Vote::Rejected { comment: None },
        )
        .await
        .unwrap();
    assert!(receipt.quorum_reached);
    runtime.shutdown().await;
    assert!(dir.path().join("gov.json").exists());

    // Second start re-applies the same fixtures without duplicating anything.
    let mut restarted = NodeRuntime::new(config_in(dir.path())).unwrap();
    restarted.start().await.unwrap();
    let service = restarted.container().service.clone();

    let reviewers = service.list_reviewers(&acme).await.unwrap();
    assert_eq!(reviewers.len(), 1);
    assert_eq!(reviewers[0].reviewed_submissions, 1);

    let status = service.submission_status(&id).await.unwrap();
    assert!(status.can_finalize);
    restarted.shutdown().await;
}

#[tokio::test]
async fn test_missing_fixture_file_fails_start() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = NodeConfig::default();
    config.seed.fixtures_path = Some(dir.path().join("absent.json"));

    let mut runtime = NodeRuntime::new(config).unwrap();
    let err = runtime.start().await.unwrap_err();
    assert!(err.to_string().contains("fixtures"));
}
