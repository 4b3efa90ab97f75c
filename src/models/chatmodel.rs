// models/chatmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jobmodel::JobKind;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "media_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
    Document,
}

/// One conversation bound to exactly one (job, proposal) pair. Which of the
/// two job/proposal column pairs is populated follows `kind`; the other pair
/// stays null.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Chat {
    pub id: Uuid,
    pub job_id: Option<Uuid>,
    pub offline_job_id: Option<Uuid>,
    pub proposal_id: Option<Uuid>,
    pub offline_proposal_id: Option<Uuid>,
    pub job_owner_id: Uuid,
    pub proposal_owner_id: Uuid,
    pub kind: JobKind,
    pub is_active: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Chat {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.job_owner_id == user_id || self.proposal_owner_id == user_id
    }

    /// The populated job reference, whichever column pair holds it.
    pub fn job_ref(&self) -> Option<Uuid> {
        self.job_id.or(self.offline_job_id)
    }

    pub fn proposal_ref(&self) -> Option<Uuid> {
        self.proposal_id.or(self.offline_proposal_id)
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    /// None marks a message authored by no human actor. The seed message of
    /// a new chat is attributed to the proposer, so its sender is set even
    /// though `is_system` is true.
    pub sender_id: Option<Uuid>,
    pub is_system: bool,
    pub content: String,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
    pub is_read: Option<bool>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Whether this message counts against `reader`'s unread total.
    pub fn unread_for(&self, reader: Uuid) -> bool {
        !self.is_read.unwrap_or(false) && self.sender_id != Some(reader)
    }
}
