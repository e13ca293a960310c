//! Request and response bodies.
//!
//! Request fields are all optional at the serde level so that a missing
//! field surfaces as a 400 with the field's name instead of a generic
//! deserialization failure.

use super::error::{ApiError, ApiResult};
use bg_governance::{BountyProgram, MemberActivity, Severity, Submission, Vote, VoteValue};
use serde::{Deserialize, Serialize};
use shared_types::{ProgramName, SubmissionId, WalletAddress};

fn required<'a>(field: &str, value: &'a Option<String>) -> ApiResult<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::missing_field(field)),
    }
}

fn program(value: &Option<String>) -> ApiResult<ProgramName> {
    Ok(ProgramName::parse(required("program", value)?)?)
}

fn address(field: &str, value: &Option<String>) -> ApiResult<WalletAddress> {
    Ok(WalletAddress::parse(required(field, value)?)?)
}

pub fn submission_id(raw: &str) -> ApiResult<SubmissionId> {
    Ok(SubmissionId::parse(raw)?)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReviewerRequest {
    pub program: Option<String>,
    pub reviewer_address: Option<String>,
}

impl AddReviewerRequest {
    pub fn parse(&self) -> ApiResult<(ProgramName, WalletAddress)> {
        Ok((
            program(&self.program)?,
            address("reviewerAddress", &self.reviewer_address)?,
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveReviewerRequest {
    pub program: Option<String>,
    pub address: Option<String>,
}

impl RemoveReviewerRequest {
    pub fn parse(&self) -> ApiResult<(ProgramName, WalletAddress)> {
        Ok((program(&self.program)?, address("address", &self.address)?))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddManagerRequest {
    pub program: Option<String>,
    pub manager_address: Option<String>,
}

impl AddManagerRequest {
    pub fn parse(&self) -> ApiResult<(ProgramName, WalletAddress)> {
        Ok((
            program(&self.program)?,
            address("managerAddress", &self.manager_address)?,
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeManagerRequest {
    pub program: Option<String>,
    pub new_manager_address: Option<String>,
}

impl ChangeManagerRequest {
    pub fn parse(&self) -> ApiResult<(ProgramName, WalletAddress)> {
        Ok((
            program(&self.program)?,
            address("newManagerAddress", &self.new_manager_address)?,
        ))
    }
}

/// Body of `removeManager`, also the query of `listReviewers` / `getManager`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramParams {
    pub program: Option<String>,
}

impl ProgramParams {
    pub fn parse(&self) -> ApiResult<ProgramName> {
        program(&self.program)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionParams {
    pub submission_id: Option<String>,
}

impl SubmissionParams {
    pub fn parse(&self) -> ApiResult<SubmissionId> {
        submission_id(required("submissionId", &self.submission_id)?)
    }
}

/// Vote fields shared by reviewer and manager votes.
fn vote(
    value: &Option<String>,
    severity: &Option<String>,
    comment: &Option<String>,
) -> ApiResult<Vote> {
    let value = required("vote", value)?
        .parse::<VoteValue>()
        .map_err(ApiError::bad_request)?;
    let severity = match severity.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Some(s.parse::<Severity>().map_err(ApiError::bad_request)?),
        _ => None,
    };
    let comment = comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    Ok(Vote::from_parts(value, severity, comment))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastReviewerVoteRequest {
    pub reviewer_address: Option<String>,
    pub vote: Option<String>,
    pub severity: Option<String>,
    pub comment: Option<String>,
}

impl CastReviewerVoteRequest {
    pub fn parse(&self) -> ApiResult<(WalletAddress, Vote)> {
        Ok((
            address("reviewerAddress", &self.reviewer_address)?,
            vote(&self.vote, &self.severity, &self.comment)?,
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastManagerVoteRequest {
    pub manager_address: Option<String>,
    pub vote: Option<String>,
    pub severity: Option<String>,
    pub comment: Option<String>,
}

impl CastManagerVoteRequest {
    pub fn parse(&self) -> ApiResult<(WalletAddress, Vote)> {
        Ok((
            address("managerAddress", &self.manager_address)?,
            vote(&self.vote, &self.severity, &self.comment)?,
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    pub manager_address: Option<String>,
}

impl FinalizeRequest {
    pub fn parse(&self) -> ApiResult<WalletAddress> {
        address("managerAddress", &self.manager_address)
    }
}

/// `{bounty}` returned by every governance mutation.
#[derive(Debug, Serialize)]
pub struct BountyResponse {
    pub bounty: BountyProgram,
}

#[derive(Debug, Serialize)]
pub struct ReviewersResponse {
    pub reviewers: Vec<MemberActivity>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub submission: Submission,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_blank_field_is_missing() {
        let req = AddReviewerRequest {
            program: Some("Acme".into()),
            reviewer_address: Some("   ".into()),
        };
        let err = req.parse().unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("reviewerAddress"));
    }

    #[test]
    fn test_address_normalized_on_parse() {
        let req = RemoveReviewerRequest {
            program: Some("Acme".into()),
            address: Some("0xABCdef".into()),
        };
        let (_, addr) = req.parse().unwrap();
        assert_eq!(addr.as_str(), "0xabcdef");
    }

    #[test]
    fn test_vote_parsing() {
        let req = CastReviewerVoteRequest {
            reviewer_address: Some("0xa".into()),
            vote: Some("Accepted".into()),
            severity: Some("high".into()),
            comment: Some("".into()),
        };
        let (_, vote) = req.parse().unwrap();
        assert_eq!(
            vote,
            Vote::Accepted {
                severity: Some(Severity::High),
                comment: None
            }
        );
    }

    #[test]
    fn test_invalid_vote_value_rejected() {
        let req = CastReviewerVoteRequest {
            reviewer_address: Some("0xa".into()),
            vote: Some("maybe".into()),
            ..Default::default()
        };
        let err = req.parse().unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("maybe"));
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let req = CastManagerVoteRequest {
            manager_address: Some("0xm".into()),
            vote: Some("accepted".into()),
            severity: Some("Catastrophic".into()),
            comment: None,
        };
        assert_eq!(req.parse().unwrap_err().status, StatusCode::BAD_REQUEST);
    }
}
