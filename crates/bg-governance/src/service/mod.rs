//! Governance Service - application layer
//!
//! Wires the pure domain rules to the outbound ports and implements
//! [`GovernanceApi`].
//!
//! # Transactions
//! - Governance operations (reviewer/manager changes) read every record
//!   they depend on through a [`UnitOfWork`] and commit a single batch. They
//!   run once under `transaction_timeout`; a conflict, storage failure or
//!   timeout aborts with `TransactionAbort` and nothing is written.
//! - Vote casts are short optimistic transactions retried on version
//!   conflict up to `max_vote_retries` times. The receipt's attachment
//!   lookup runs after the transaction, outside its timeout.

mod coordinator;
mod queries;
mod unit_of_work;
mod voting;


pub use unit_of_work::UnitOfWork;

use crate::domain::{
    BountyProgram, ErrorKind, GovernanceError, GovernanceResult, StoreError, Submission, Vote,
};
use crate::events::GovernanceEvent;
use crate::metrics::GovernanceMetrics;
use crate::ports::{
    AttachmentDirectory, DocumentStore, GovernanceApi, GovernanceEventSink, MemberActivity,
    SubmissionStatusView, VoteCastReceipt,
};
use async_trait::async_trait;
use shared_types::{ProgramName, SubmissionId, SystemTimeSource, TimeSource, Timestamp, WalletAddress};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Runtime knobs of the governance service.
#[derive(Debug, Clone)]
pub struct GovernanceConfig {
    /// Upper bound for one governance operation or vote cast.
    pub transaction_timeout: Duration,
    /// Retries of a vote cast after a version conflict.
    pub max_vote_retries: u32,
    /// Base delay between vote retries; jitter of up to the same amount is
    /// added.
    pub retry_backoff: Duration,
    /// Bound on the attachment lookup that decorates a vote receipt.
    pub attachment_timeout: Duration,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            transaction_timeout: Duration::from_millis(5_000),
            max_vote_retries: 5,
            retry_backoff: Duration::from_millis(10),
            attachment_timeout: Duration::from_millis(1_000),
        }
    }
}

/// Dependencies for GovernanceService
pub struct GovernanceDependencies {
    pub store: Arc<dyn DocumentStore>,
    pub events: Arc<dyn GovernanceEventSink>,
    pub attachments: Arc<dyn AttachmentDirectory>,
    pub config: GovernanceConfig,
}

/// Governance Service
pub struct GovernanceService {
    store: Arc<dyn DocumentStore>,
    events: Arc<dyn GovernanceEventSink>,
    attachments: Arc<dyn AttachmentDirectory>,
    config: GovernanceConfig,
    metrics: Arc<GovernanceMetrics>,
    time_source: Arc<dyn TimeSource>,
}

/// Failure inside one transaction attempt. Keeps store conflicts apart so
/// the vote path can retry them.
#[derive(Debug)]
pub(crate) enum TxError {
    Domain(GovernanceError),
    Store(StoreError),
}

impl From<GovernanceError> for TxError {
    fn from(err: GovernanceError) -> Self {
        TxError::Domain(err)
    }
}

impl From<StoreError> for TxError {
    fn from(err: StoreError) -> Self {
        TxError::Store(err)
    }
}

impl From<TxError> for GovernanceError {
    fn from(err: TxError) -> Self {
        match err {
            TxError::Domain(e) => e,
            TxError::Store(e) => e.into(),
        }
    }
}

impl GovernanceService {
    pub fn new(deps: GovernanceDependencies) -> Self {
        Self {
            store: deps.store,
            events: deps.events,
            attachments: deps.attachments,
            config: deps.config,
            metrics: Arc::new(GovernanceMetrics::new()),
            time_source: Arc::new(SystemTimeSource),
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn metrics(&self) -> Arc<GovernanceMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    fn now(&self) -> Timestamp {
        self.time_source.now()
    }

    /// Best-effort publication after commit.
    fn publish(&self, events: Vec<GovernanceEvent>) {
        for event in events {
            let name = event.name();
            if let Err(err) = self.events.publish(event) {
                warn!(event = name, error = %err, "Failed to publish governance event");
            }
        }
    }

    /// Run one transaction under the configured timeout and account for it.
    async fn run_bounded<T, F>(&self, operation: &'static str, tx: F) -> GovernanceResult<T>
    where
        F: Future<Output = GovernanceResult<T>>,
    {
        let result = match tokio::time::timeout(self.config.transaction_timeout, tx).await {
            Ok(result) => result,
            Err(_) => Err(GovernanceError::abort(format!(
                "{} timed out after {:?}",
                operation, self.config.transaction_timeout
            ))),
        };

        match &result {
            Ok(_) => {
                self.metrics.record_committed();
                debug!(operation, "Transaction committed");
            }
            Err(err) if err.kind() == ErrorKind::TransactionAbort => {
                self.metrics.record_aborted();
                warn!(operation, error = %err, "Transaction aborted");
            }
            Err(err) => {
                self.metrics.record_rejected();
                debug!(operation, kind = ?err.kind(), error = %err, "Operation rejected");
            }
        }
        result
    }
}

#[async_trait]
impl GovernanceApi for GovernanceService {
    async fn add_reviewer(
        &self,
        program: &ProgramName,
        address: &WalletAddress,
    ) -> GovernanceResult<BountyProgram> {
        self.run_bounded("add_reviewer", self.add_reviewer_tx(program, address))
            .await
    }

    async fn remove_reviewer(
        &self,
        program: &ProgramName,
        address: &WalletAddress,
    ) -> GovernanceResult<BountyProgram> {
        self.run_bounded("remove_reviewer", self.remove_reviewer_tx(program, address))
            .await
    }

    async fn list_reviewers(&self, program: &ProgramName) -> GovernanceResult<Vec<MemberActivity>> {
        self.reviewer_activity(program).await
    }

    async fn add_manager(
        &self,
        program: &ProgramName,
        address: &WalletAddress,
    ) -> GovernanceResult<BountyProgram> {
        self.run_bounded(
            "add_manager",
            self.reassign_manager_tx(program, Some(address), false),
        )
        .await
    }

    async fn change_manager(
        &self,
        program: &ProgramName,
        new_address: &WalletAddress,
    ) -> GovernanceResult<BountyProgram> {
        self.run_bounded(
            "change_manager",
            self.reassign_manager_tx(program, Some(new_address), true),
        )
        .await
    }

    async fn remove_manager(&self, program: &ProgramName) -> GovernanceResult<BountyProgram> {
        self.run_bounded("remove_manager", self.reassign_manager_tx(program, None, true))
            .await
    }

    async fn get_manager(&self, program: &ProgramName) -> GovernanceResult<Option<MemberActivity>> {
        self.manager_activity(program).await
    }

    async fn cast_reviewer_vote(
        &self,
        submission: &SubmissionId,
        reviewer: &WalletAddress,
        vote: Vote,
    ) -> GovernanceResult<VoteCastReceipt> {
        let mut receipt = self
            .run_bounded(
                "cast_reviewer_vote",
                self.cast_reviewer_vote_with_retry(submission, reviewer, vote),
            )
            .await?;
        receipt.attachments = self.attachments_or_empty(submission).await;
        Ok(receipt)
    }

    async fn cast_manager_vote(
        &self,
        submission: &SubmissionId,
        manager: &WalletAddress,
        vote: Vote,
    ) -> GovernanceResult<Submission> {
        self.run_bounded(
            "cast_manager_vote",
            self.cast_manager_vote_with_retry(submission, manager, vote),
        )
        .await
    }

    async fn finalize_submission(
        &self,
        submission: &SubmissionId,
        manager: &WalletAddress,
    ) -> GovernanceResult<Submission> {
        self.run_bounded("finalize_submission", self.finalize_tx(submission, manager))
            .await
    }

    async fn submission_status(
        &self,
        submission: &SubmissionId,
    ) -> GovernanceResult<SubmissionStatusView> {
        self.status_view(submission).await
    }
}
