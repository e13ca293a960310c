//! Vote casts, finalization and submission status.

use crate::domain::error::ApiResult;
use crate::domain::types::{
    submission_id, CastManagerVoteRequest, CastReviewerVoteRequest, FinalizeRequest,
    SubmissionParams, SubmissionResponse,
};
use crate::router::AppState;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use bg_governance::{SubmissionStatusView, VoteCastReceipt};
use tracing::debug;

/// `POST /api/submissions/:submission_id/castReviewerVote`
pub async fn cast_reviewer_vote(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<CastReviewerVoteRequest>, JsonRejection>,
) -> ApiResult<Json<VoteCastReceipt>> {
    let Path(raw_id) = path?;
    let id = submission_id(&raw_id)?;
    let Json(req) = body?;
    let (reviewer, vote) = req.parse()?;

    debug!(submission = %id, reviewer = %reviewer, vote = %vote.value(), "castReviewerVote");
    let receipt = state.api.cast_reviewer_vote(&id, &reviewer, vote).await?;
    Ok(Json(receipt))
}

/// `POST /api/submissions/:submission_id/castManagerVote`
pub async fn cast_manager_vote(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<CastManagerVoteRequest>, JsonRejection>,
) -> ApiResult<Json<SubmissionResponse>> {
    let Path(raw_id) = path?;
    let id = submission_id(&raw_id)?;
    let Json(req) = body?;
    let (manager, vote) = req.parse()?;

    let submission = state.api.cast_manager_vote(&id, &manager, vote).await?;
    Ok(Json(SubmissionResponse { submission }))
}

/// `POST /api/submissions/:submission_id/finalize`
pub async fn finalize_submission(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<FinalizeRequest>, JsonRejection>,
) -> ApiResult<Json<SubmissionResponse>> {
    let Path(raw_id) = path?;
    let id = submission_id(&raw_id)?;
    let Json(req) = body?;
    let manager = req.parse()?;

    let submission = state.api.finalize_submission(&id, &manager).await?;
    Ok(Json(SubmissionResponse { submission }))
}

/// `GET /api/submissionStatus?submissionId=`
pub async fn submission_status(
    State(state): State<AppState>,
    params: Result<Query<SubmissionParams>, QueryRejection>,
) -> ApiResult<Json<SubmissionStatusView>> {
    let Query(params) = params?;
    let id = params.parse()?;
    Ok(Json(state.api.submission_status(&id).await?))
}
