// db/memory.rs
//
// In-memory implementation of the storage traits, used by the service unit
// tests so the orchestration logic can be exercised without a Postgres
// instance. Insert-if-absent holds the write lock across the existence check
// and the insert, which is the in-process equivalent of the unique pair
// indexes in the real schema.
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::chatdb::ChatStoreExt;
use super::jobdb::JobStoreExt;
use crate::models::chatmodel::*;
use crate::models::jobmodel::*;

#[derive(Default)]
struct MemInner {
    jobs: HashMap<Uuid, Job>,
    offline_jobs: HashMap<Uuid, Job>,
    proposals: HashMap<Uuid, Proposal>,
    offline_proposals: HashMap<Uuid, Proposal>,
    chats: Vec<Chat>,
    messages: Vec<Message>,
}

impl MemInner {
    fn job_table(&self, kind: JobKind) -> &HashMap<Uuid, Job> {
        match kind {
            JobKind::Online => &self.jobs,
            JobKind::Offline => &self.offline_jobs,
        }
    }

    fn job_table_mut(&mut self, kind: JobKind) -> &mut HashMap<Uuid, Job> {
        match kind {
            JobKind::Online => &mut self.jobs,
            JobKind::Offline => &mut self.offline_jobs,
        }
    }

    fn proposal_table(&self, kind: JobKind) -> &HashMap<Uuid, Proposal> {
        match kind {
            JobKind::Online => &self.proposals,
            JobKind::Offline => &self.offline_proposals,
        }
    }

    fn proposal_table_mut(&mut self, kind: JobKind) -> &mut HashMap<Uuid, Proposal> {
        match kind {
            JobKind::Online => &mut self.proposals,
            JobKind::Offline => &mut self.offline_proposals,
        }
    }

    fn matches_pair(chat: &Chat, kind: JobKind, job_id: Uuid, proposal_id: Uuid) -> bool {
        match kind {
            JobKind::Online => {
                chat.job_id == Some(job_id) && chat.proposal_id == Some(proposal_id)
            }
            JobKind::Offline => {
                chat.offline_job_id == Some(job_id)
                    && chat.offline_proposal_id == Some(proposal_id)
            }
        }
    }
}

#[derive(Default)]
pub struct MemStore {
    inner: RwLock<MemInner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStoreExt for MemStore {
    async fn insert_job(
        &self,
        kind: JobKind,
        owner_id: Uuid,
        title: String,
        description: Option<String>,
    ) -> Result<Job, Error> {
        let job = Job {
            id: Uuid::new_v4(),
            owner_id,
            title,
            description,
            status: JobStatus::Open,
            created_at: Some(Utc::now()),
        };

        let mut inner = self.inner.write().await;
        inner.job_table_mut(kind).insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_job(&self, kind: JobKind, job_id: Uuid) -> Result<Option<Job>, Error> {
        let inner = self.inner.read().await;
        Ok(inner.job_table(kind).get(&job_id).cloned())
    }

    async fn insert_proposal(
        &self,
        kind: JobKind,
        job_id: Uuid,
        submitter_id: Uuid,
        cover_note: Option<String>,
    ) -> Result<Proposal, Error> {
        let proposal = Proposal {
            id: Uuid::new_v4(),
            job_id,
            submitter_id,
            cover_note,
            status: ProposalStatus::Pending,
            created_at: Some(Utc::now()),
        };

        let mut inner = self.inner.write().await;
        inner
            .proposal_table_mut(kind)
            .insert(proposal.id, proposal.clone());
        Ok(proposal)
    }

    async fn get_proposal(
        &self,
        kind: JobKind,
        proposal_id: Uuid,
    ) -> Result<Option<Proposal>, Error> {
        let inner = self.inner.read().await;
        Ok(inner.proposal_table(kind).get(&proposal_id).cloned())
    }

    async fn update_proposal_status(
        &self,
        kind: JobKind,
        proposal_id: Uuid,
        status: ProposalStatus,
    ) -> Result<Option<Proposal>, Error> {
        let mut inner = self.inner.write().await;
        Ok(inner.proposal_table_mut(kind).get_mut(&proposal_id).map(|p| {
            p.status = status;
            p.clone()
        }))
    }
}

#[async_trait]
impl ChatStoreExt for MemStore {
    async fn find_chat(
        &self,
        kind: JobKind,
        job_id: Uuid,
        proposal_id: Uuid,
    ) -> Result<Option<Chat>, Error> {
        let inner = self.inner.read().await;
        Ok(inner
            .chats
            .iter()
            .find(|c| MemInner::matches_pair(c, kind, job_id, proposal_id))
            .cloned())
    }

    async fn insert_chat(
        &self,
        kind: JobKind,
        job_id: Uuid,
        proposal_id: Uuid,
        job_owner_id: Uuid,
        proposal_owner_id: Uuid,
    ) -> Result<Option<Chat>, Error> {
        let mut inner = self.inner.write().await;

        if inner
            .chats
            .iter()
            .any(|c| MemInner::matches_pair(c, kind, job_id, proposal_id))
        {
            return Ok(None);
        }

        let chat = Chat {
            id: Uuid::new_v4(),
            job_id: (kind == JobKind::Online).then_some(job_id),
            offline_job_id: (kind == JobKind::Offline).then_some(job_id),
            proposal_id: (kind == JobKind::Online).then_some(proposal_id),
            offline_proposal_id: (kind == JobKind::Offline).then_some(proposal_id),
            job_owner_id,
            proposal_owner_id,
            kind,
            is_active: Some(true),
            created_at: Some(Utc::now()),
        };
        inner.chats.push(chat.clone());
        Ok(Some(chat))
    }

    async fn get_chat_by_id(&self, chat_id: Uuid) -> Result<Option<Chat>, Error> {
        let inner = self.inner.read().await;
        Ok(inner.chats.iter().find(|c| c.id == chat_id).cloned())
    }

    async fn get_user_chats(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Chat>, Error> {
        let inner = self.inner.read().await;
        Ok(inner
            .chats
            .iter()
            .filter(|c| c.involves(user_id) && c.is_active.unwrap_or(true))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn insert_message(
        &self,
        chat_id: Uuid,
        sender_id: Option<Uuid>,
        is_system: bool,
        content: String,
        media_url: Option<String>,
        media_type: Option<MediaType>,
    ) -> Result<Message, Error> {
        let message = Message {
            id: Uuid::new_v4(),
            chat_id,
            sender_id,
            is_system,
            content,
            media_url,
            media_type,
            is_read: Some(false),
            read_at: None,
            created_at: Some(Utc::now()),
        };

        let mut inner = self.inner.write().await;
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn get_chat_messages(
        &self,
        chat_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, Error> {
        let inner = self.inner.read().await;
        let mut messages: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect();
        messages.reverse();
        Ok(messages
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn mark_messages_read(&self, chat_id: Uuid, reader_id: Uuid) -> Result<u64, Error> {
        let mut inner = self.inner.write().await;
        let mut changed = 0;
        for m in inner
            .messages
            .iter_mut()
            .filter(|m| m.chat_id == chat_id && m.unread_for(reader_id))
        {
            m.is_read = Some(true);
            m.read_at = Some(Utc::now());
            changed += 1;
        }
        Ok(changed)
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64, Error> {
        let inner = self.inner.read().await;
        let chat_ids: Vec<Uuid> = inner
            .chats
            .iter()
            .filter(|c| c.involves(user_id))
            .map(|c| c.id)
            .collect();

        Ok(inner
            .messages
            .iter()
            .filter(|m| chat_ids.contains(&m.chat_id) && m.unread_for(user_id))
            .count() as i64)
    }

    async fn chat_unread_count(&self, chat_id: Uuid, user_id: Uuid) -> Result<i64, Error> {
        let inner = self.inner.read().await;
        Ok(inner
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id && m.unread_for(user_id))
            .count() as i64)
    }
}
