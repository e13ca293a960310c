//! # Fixture Seeding
//!
//! Programs and submissions are owned by the content-management side of the
//! platform, which this node does not run. Fixtures stand in for it: a JSON
//! file naming programs (with optional initial roles) and submissions.
//!
//! ```json
//! {
//!   "programs": [
//!     { "name": "Acme", "reviewers": ["0xa", "0xb"], "manager": "0xm" }
//!   ],
//!   "submissions": [{ "id": "acme-1", "program": "Acme" }]
//! }
//! ```
//!
//! Seeding is idempotent: documents that already exist are left alone and
//! roles are assigned through the governance API so the membership index
//! stays in step.

use bg_governance::{
    BountyProgram, Document, DocumentStore, GovernanceApi, GovernanceError, QuorumPolicy,
    Severity, StoreError, Submission, SubmissionId, WriteBatch,
};
use serde::Deserialize;
use shared_types::{ProgramName, Timestamp, WalletAddress};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Fixture file contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fixtures {
    pub programs: Vec<ProgramFixture>,
    pub submissions: Vec<SubmissionFixture>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramFixture {
    pub name: ProgramName,
    #[serde(default)]
    pub quorum: Option<QuorumPolicy>,
    #[serde(default)]
    pub allowed_severities: Option<BTreeSet<Severity>>,
    #[serde(default)]
    pub reviewers: Vec<WalletAddress>,
    #[serde(default)]
    pub manager: Option<WalletAddress>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionFixture {
    #[serde(default)]
    pub id: Option<String>,
    pub program: ProgramName,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

/// What a seeding run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub programs_created: usize,
    pub submissions_created: usize,
    pub roles_assigned: usize,
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("cannot read fixtures {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("cannot parse fixtures {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("submission fixture references unknown program {0}")]
    UnknownProgram(ProgramName),

    #[error("invalid submission id: {0}")]
    InvalidId(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Governance(#[from] GovernanceError),
}

impl Fixtures {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| SeedError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| SeedError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Create missing programs and submissions, then assign fixture roles.
pub async fn apply_fixtures(
    fixtures: &Fixtures,
    store: &dyn DocumentStore,
    api: &dyn GovernanceApi,
    default_quorum: QuorumPolicy,
    now: Timestamp,
) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    for fixture in &fixtures.programs {
        let existing = store.load_program(&fixture.name).await?.map(|p| p.value);
        let program = match existing {
            Some(program) => program,
            None => {
                let mut program = BountyProgram::new(fixture.name.clone())
                    .with_quorum(fixture.quorum.unwrap_or(default_quorum));
                if let Some(severities) = &fixture.allowed_severities {
                    program.allowed_severities = severities.clone();
                }
                let mut batch = WriteBatch::new();
                batch.put(Document::Program(program.clone()), None);
                store.commit(batch).await?;
                report.programs_created += 1;
                debug!(program = %fixture.name, "Seeded program");
                program
            }
        };

        for reviewer in &fixture.reviewers {
            if !program.is_reviewer(reviewer) {
                api.add_reviewer(&fixture.name, reviewer).await?;
                report.roles_assigned += 1;
            }
        }
        if let Some(manager) = &fixture.manager {
            if !program.is_manager(manager) {
                api.add_manager(&fixture.name, manager).await?;
                report.roles_assigned += 1;
            }
        }
    }

    for fixture in &fixtures.submissions {
        if store.load_program(&fixture.program).await?.is_none() {
            return Err(SeedError::UnknownProgram(fixture.program.clone()));
        }
        let id = match &fixture.id {
            Some(raw) => SubmissionId::parse(raw).map_err(|e| SeedError::InvalidId(e.to_string()))?,
            None => SubmissionId::generate(),
        };
        if store.load_submission(&id).await?.is_some() {
            continue;
        }

        let submission = Submission::new(
            id.clone(),
            fixture.program.clone(),
            fixture.created_at.unwrap_or(now),
        );
        let mut batch = WriteBatch::new();
        batch.put(Document::Submission(submission), None);
        store.commit(batch).await?;
        report.submissions_created += 1;
        debug!(submission = %id, program = %fixture.program, "Seeded submission");
    }

    info!(
        programs = report.programs_created,
        submissions = report.submissions_created,
        roles = report.roles_assigned,
        "Fixtures applied"
    );
    Ok(report)
}
