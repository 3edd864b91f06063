//! HTTP request handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use attest_badge::CredentialRecord;
use attest_node::HolderProof;
use attest_types::{BadgeStatus, LedgerAddress, VerificationStatus};
use attest_verification::VerificationRecord;

use crate::error::RpcError;
use crate::server::{AppState, ClientKey};

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, RpcError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| RpcError::InvalidBody(e.body_text()))
}

// ── Verification ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVerificationRequest {
    pub provider_payload: serde_json::Value,
    pub address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVerificationResponse {
    pub verification_id: String,
    pub status: VerificationStatus,
    pub proof_hash: String,
    pub expires_at: u64,
    pub provider: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSnapshot {
    pub verification_id: String,
    pub address: String,
    pub provider: String,
    pub status: VerificationStatus,
    pub proof_hash: String,
    pub created_at: u64,
    pub expires_at: u64,
}

impl From<VerificationRecord> for VerificationSnapshot {
    fn from(r: VerificationRecord) -> Self {
        Self {
            verification_id: r.id.to_string(),
            address: r.address.to_string(),
            provider: r.provider.to_string(),
            status: r.status,
            proof_hash: r.proof_hash.to_hex(),
            created_at: r.created_at.as_secs(),
            expires_at: r.expires_at.as_secs(),
        }
    }
}

pub async fn submit_verification(
    State(state): State<AppState>,
    Extension(client): Extension<ClientKey>,
    Path(provider): Path<String>,
    payload: Result<Json<SubmitVerificationRequest>, JsonRejection>,
) -> Result<Json<SubmitVerificationResponse>, RpcError> {
    let req = body(payload)?;
    let address = LedgerAddress::parse(req.address.as_str()).map_err(|e| state.reject(e))?;
    state
        .pipeline
        .admission()
        .check_verification(&client.0, &address)
        .map_err(|e| state.reject(e))?;

    let outcome = state
        .pipeline
        .submit_verification(&provider, address.as_str(), req.provider_payload)
        .await
        .map_err(|e| state.reject(e))?;

    let record = outcome.record;
    let message = match (outcome.reused, record.status) {
        (true, _) => "address already holds a live verification",
        (false, VerificationStatus::Verified) => "verification successful",
        (false, _) => "profile is not registered with this provider",
    };
    Ok(Json(SubmitVerificationResponse {
        verification_id: record.id.to_string(),
        status: record.status,
        proof_hash: record.proof_hash.to_hex(),
        expires_at: record.expires_at.as_secs(),
        provider: record.provider.to_string(),
        message,
    }))
}

pub async fn verification_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VerificationSnapshot>, RpcError> {
    let record = state
        .pipeline
        .verification_status(&id)
        .map_err(|e| state.reject(e))?;
    Ok(Json(record.into()))
}

// ── Badge ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceRequest {
    pub verification_id: String,
    pub address: String,
    #[serde(flatten)]
    pub proof: HolderProof,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceResponse {
    pub badge_ready: bool,
    pub badge_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Ledger height.
    pub expires_at: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeStatusResponse {
    pub has_badge: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
}

impl From<Option<CredentialRecord>> for BadgeStatusResponse {
    fn from(record: Option<CredentialRecord>) -> Self {
        match record {
            None => Self {
                has_badge: false,
                badge_id: None,
                status: None,
                expires_at: None,
                issuer: None,
                created_at: None,
            },
            Some(r) => Self {
                has_badge: r.status == BadgeStatus::Active,
                badge_id: Some(r.id.to_string()),
                status: Some(r.status.to_string()),
                expires_at: Some(r.expires_at_height),
                issuer: Some(r.issuer),
                created_at: Some(r.created_at.as_secs()),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewRequest {
    pub address: String,
    #[serde(flatten)]
    pub proof: HolderProof,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewResponse {
    pub address: String,
    pub status: String,
    pub expires_at: u64,
}

pub async fn request_issuance(
    State(state): State<AppState>,
    Extension(client): Extension<ClientKey>,
    payload: Result<Json<IssuanceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, RpcError> {
    let req = body(payload)?;
    state
        .pipeline
        .admission()
        .check_issuance(&client.0)
        .map_err(|e| state.reject(e))?;

    let badge = state
        .pipeline
        .request_issuance(&req.verification_id, &req.address, &req.proof)
        .await
        .map_err(|e| state.reject(e))?;

    let response = IssuanceResponse {
        badge_ready: badge.status == BadgeStatus::Active,
        badge_id: badge.id.to_string(),
        status: badge.status.to_string(),
        transaction_id: badge.transaction_id.map(|tx| tx.to_string()),
        expires_at: badge.expires_at_height,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn badge_status(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<BadgeStatusResponse>, RpcError> {
    let record = state
        .pipeline
        .badge_status(&address)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(record.into()))
}

pub async fn renew(
    State(state): State<AppState>,
    payload: Result<Json<RenewRequest>, JsonRejection>,
) -> Result<Json<RenewResponse>, RpcError> {
    let req = body(payload)?;
    let badge = state
        .pipeline
        .renew(&req.address, &req.proof)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(RenewResponse {
        address: badge.address.to_string(),
        status: badge.status.to_string(),
        expires_at: badge.expires_at_height,
    }))
}

// ── Votes ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub address: String,
    pub proposal_id: String,
    pub choice: String,
    #[serde(flatten)]
    pub proof: HolderProof,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteResponse {
    pub proposal_id: String,
    pub transaction_id: String,
    pub nullifier: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResultsResponse {
    pub proposal_id: String,
    pub yes: u64,
    pub no: u64,
    pub abstain: u64,
    pub total: u64,
}

pub async fn cast_vote(
    State(state): State<AppState>,
    payload: Result<Json<CastVoteRequest>, JsonRejection>,
) -> Result<Json<CastVoteResponse>, RpcError> {
    let req = body(payload)?;
    let receipt = state
        .pipeline
        .cast_vote(&req.address, &req.proposal_id, &req.choice, &req.proof)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(CastVoteResponse {
        proposal_id: req.proposal_id,
        transaction_id: receipt.transaction_id.to_string(),
        nullifier: receipt.nullifier.to_hex(),
    }))
}

pub async fn vote_results(
    State(state): State<AppState>,
    Path(proposal_id): Path<String>,
) -> Result<Json<VoteResultsResponse>, RpcError> {
    let tally = state
        .pipeline
        .tally(&proposal_id)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(VoteResultsResponse {
        proposal_id,
        yes: tally.yes,
        no: tally.no,
        abstain: tally.abstain,
        total: tally.total(),
    }))
}

// ── Operations ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_height: Option<u64>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let health = state.pipeline.health().await;
    Json(HealthResponse {
        status: "ok",
        ledger_height: health.ledger_height,
    })
}

pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, RpcError> {
    let text = state
        .pipeline
        .metrics()
        .encode_text()
        .map_err(|e| state.reject(attest_node::PipelineError::internal(e.to_string())))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    ))
}
