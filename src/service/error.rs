// service/error.rs
use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::error::HttpError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Job {0} not found in either job table")]
    JobNotFound(Uuid),

    #[error("Proposal {0} not found in either proposal table")]
    ProposalNotFound(Uuid),

    #[error("Chat {0} not found")]
    ChatNotFound(Uuid),

    #[error("User {0} may not open a chat with themselves on job {1}")]
    SelfProposal(Uuid, Uuid),

    #[error("Chat for job {job_id} and proposal {proposal_id} vanished after a duplicate insert")]
    DuplicateChat { job_id: Uuid, proposal_id: Uuid },

    #[error("User {0} is not a participant of chat {1}")]
    NotParticipant(Uuid, Uuid),

    #[error("User {0} is neither the owner of job {1} nor the submitter of its proposal")]
    NotPairMember(Uuid, Uuid),

    #[error("Message content is required unless a media reference is attached")]
    EmptyMessage,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::JobNotFound(_)
            | ServiceError::ProposalNotFound(_)
            | ServiceError::ChatNotFound(_) => HttpError::not_found(error.to_string()),

            ServiceError::SelfProposal(_, _) | ServiceError::EmptyMessage => {
                HttpError::bad_request(error.to_string())
            }

            ServiceError::NotParticipant(_, _) | ServiceError::NotPairMember(_, _) => {
                HttpError::unauthorized(error.to_string())
            }

            ServiceError::DuplicateChat { .. } => HttpError::conflict(error.to_string()),

            ServiceError::Database(_) => HttpError::server_error(error.to_string()),
        }
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::JobNotFound(_)
            | ServiceError::ProposalNotFound(_)
            | ServiceError::ChatNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::SelfProposal(_, _) | ServiceError::EmptyMessage => {
                StatusCode::BAD_REQUEST
            }

            ServiceError::NotParticipant(_, _) | ServiceError::NotPairMember(_, _) => {
                StatusCode::UNAUTHORIZED
            }

            ServiceError::DuplicateChat { .. } => StatusCode::CONFLICT,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
