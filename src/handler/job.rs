// handler/job.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::jobdb::JobStoreExt,
    error::HttpError,
    middleware::AuthUser,
    models::jobmodel::{JobKind, ProposalStatus},
    AppState,
};

pub fn job_handler() -> Router {
    Router::new()
        .route("/jobs", post(post_job))
        .route("/jobs/:job_id/proposals", post(submit_proposal))
        .route("/proposals/:proposal_id/status", put(update_proposal_status))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PostJobDto {
    pub kind: JobKind,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
}

pub async fn post_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<PostJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state
        .db_client
        .insert_job(body.kind, auth.id, body.title, body.description)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": job
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitProposalDto {
    pub kind: JobKind,
    #[validate(length(max = 5000))]
    pub cover_note: Option<String>,
}

/// Submit a proposal against a job and open its conversation. The proposal is
/// the primary action: it stands even when chat creation fails, and the
/// chat-specific degradation travels back as a warning instead of an error.
pub async fn submit_proposal(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<SubmitProposalDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state
        .db_client
        .get_job(body.kind, job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Job not found"))?;

    let proposal = app_state
        .db_client
        .insert_proposal(body.kind, job.id, auth.id, body.cover_note)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let (chat, warning) = match app_state
        .chat_service
        .open_chat_for_proposal(auth.id, job.id, proposal.id, body.kind)
        .await
    {
        Ok(creation) => (Some(creation.chat), creation.seed_warning),
        Err(e) => {
            tracing::warn!(
                proposal_id = %proposal.id,
                error = %e,
                "proposal submitted but chat creation failed"
            );
            (
                None,
                Some(format!(
                    "proposal submitted, but the conversation could not be opened: {e}"
                )),
            )
        }
    };

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "proposal": proposal,
            "chat": chat,
            "warning": warning,
        }
    })))
}

#[derive(Debug, Deserialize)]
pub struct ProposalStatusDto {
    pub kind: JobKind,
    pub status: ProposalStatus,
}

pub async fn update_proposal_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(proposal_id): Path<Uuid>,
    Json(body): Json<ProposalStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let proposal = app_state
        .db_client
        .get_proposal(body.kind, proposal_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Proposal not found"))?;

    // Only the job owner decides acceptance or rejection.
    let job = app_state
        .db_client
        .get_job(body.kind, proposal.job_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Job not found"))?;

    if job.owner_id != auth.id {
        return Err(HttpError::unauthorized(
            "Only the job owner may respond to a proposal",
        ));
    }

    let updated = app_state
        .db_client
        .update_proposal_status(body.kind, proposal_id, body.status)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Proposal not found"))?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": updated
    })))
}
