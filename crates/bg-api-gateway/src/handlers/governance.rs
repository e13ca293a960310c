//! Reviewer and manager administration.
//!
//! Mutations report any governance failure as 500 with the error kind and
//! message in the body; only a malformed request is a 400. Queries map
//! governance errors by kind.

use crate::domain::error::{ApiError, ApiResult};
use crate::domain::types::{
    AddManagerRequest, AddReviewerRequest, BountyResponse, ChangeManagerRequest, ProgramParams,
    RemoveReviewerRequest, ReviewersResponse,
};
use crate::router::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use bg_governance::MemberActivity;

/// `POST /api/addReviewer {program, reviewerAddress}`
pub async fn add_reviewer(
    State(state): State<AppState>,
    body: Result<Json<AddReviewerRequest>, JsonRejection>,
) -> ApiResult<Json<BountyResponse>> {
    let Json(req) = body?;
    let (program, reviewer) = req.parse()?;
    let bounty = state
        .api
        .add_reviewer(&program, &reviewer)
        .await
        .map_err(ApiError::governance_failure)?;
    Ok(Json(BountyResponse { bounty }))
}

/// `DELETE /api/removeReviewer {program, address}`
pub async fn remove_reviewer(
    State(state): State<AppState>,
    body: Result<Json<RemoveReviewerRequest>, JsonRejection>,
) -> ApiResult<Json<BountyResponse>> {
    let Json(req) = body?;
    let (program, reviewer) = req.parse()?;
    let bounty = state
        .api
        .remove_reviewer(&program, &reviewer)
        .await
        .map_err(ApiError::governance_failure)?;
    Ok(Json(BountyResponse { bounty }))
}

/// `GET /api/listReviewers?program=`
pub async fn list_reviewers(
    State(state): State<AppState>,
    params: Result<Query<ProgramParams>, QueryRejection>,
) -> ApiResult<Json<ReviewersResponse>> {
    let Query(params) = params?;
    let program = params.parse()?;
    let reviewers = state.api.list_reviewers(&program).await?;
    Ok(Json(ReviewersResponse { reviewers }))
}

/// `POST /api/addManager {program, managerAddress}`
pub async fn add_manager(
    State(state): State<AppState>,
    body: Result<Json<AddManagerRequest>, JsonRejection>,
) -> ApiResult<Json<BountyResponse>> {
    let Json(req) = body?;
    let (program, manager) = req.parse()?;
    let bounty = state
        .api
        .add_manager(&program, &manager)
        .await
        .map_err(ApiError::governance_failure)?;
    Ok(Json(BountyResponse { bounty }))
}

/// `PUT /api/changeManager {program, newManagerAddress}`
pub async fn change_manager(
    State(state): State<AppState>,
    body: Result<Json<ChangeManagerRequest>, JsonRejection>,
) -> ApiResult<Json<BountyResponse>> {
    let Json(req) = body?;
    let (program, manager) = req.parse()?;
    let bounty = state
        .api
        .change_manager(&program, &manager)
        .await
        .map_err(ApiError::governance_failure)?;
    Ok(Json(BountyResponse { bounty }))
}

/// `DELETE /api/removeManager {program}`
pub async fn remove_manager(
    State(state): State<AppState>,
    body: Result<Json<ProgramParams>, JsonRejection>,
) -> ApiResult<Json<BountyResponse>> {
    let Json(req) = body?;
    let program = req.parse()?;
    let bounty = state
        .api
        .remove_manager(&program)
        .await
        .map_err(ApiError::governance_failure)?;
    Ok(Json(BountyResponse { bounty }))
}

/// `GET /api/getManager?program=`, `null` when the slot is empty.
pub async fn get_manager(
    State(state): State<AppState>,
    params: Result<Query<ProgramParams>, QueryRejection>,
) -> ApiResult<Json<Option<MemberActivity>>> {
    let Query(params) = params?;
    let program = params.parse()?;
    Ok(Json(state.api.get_manager(&program).await?))
}
