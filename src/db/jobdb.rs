// db/jobdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::jobmodel::*;

/// Job and proposal lookups across the online/offline table pair. Every
/// method probes exactly one table; cross-table resolution lives in the
/// locator, not here.
#[async_trait]
pub trait JobStoreExt {
    async fn insert_job(
        &self,
        kind: JobKind,
        owner_id: Uuid,
        title: String,
        description: Option<String>,
    ) -> Result<Job, Error>;

    async fn get_job(&self, kind: JobKind, job_id: Uuid) -> Result<Option<Job>, Error>;

    async fn insert_proposal(
        &self,
        kind: JobKind,
        job_id: Uuid,
        submitter_id: Uuid,
        cover_note: Option<String>,
    ) -> Result<Proposal, Error>;

    async fn get_proposal(
        &self,
        kind: JobKind,
        proposal_id: Uuid,
    ) -> Result<Option<Proposal>, Error>;

    async fn update_proposal_status(
        &self,
        kind: JobKind,
        proposal_id: Uuid,
        status: ProposalStatus,
    ) -> Result<Option<Proposal>, Error>;
}

fn job_table(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Online => "jobs",
        JobKind::Offline => "offline_jobs",
    }
}

fn proposal_table(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Online => "proposals",
        JobKind::Offline => "offline_proposals",
    }
}

#[async_trait]
impl JobStoreExt for DBClient {
    async fn insert_job(
        &self,
        kind: JobKind,
        owner_id: Uuid,
        title: String,
        description: Option<String>,
    ) -> Result<Job, Error> {
        let sql = format!(
            r#"
            INSERT INTO {} (owner_id, title, description)
            VALUES ($1, $2, $3)
            RETURNING id, owner_id, title, description, status, created_at
            "#,
            job_table(kind)
        );

        sqlx::query_as::<_, Job>(&sql)
            .bind(owner_id)
            .bind(title)
            .bind(description)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_job(&self, kind: JobKind, job_id: Uuid) -> Result<Option<Job>, Error> {
        let sql = format!(
            r#"
            SELECT id, owner_id, title, description, status, created_at
            FROM {}
            WHERE id = $1
            "#,
            job_table(kind)
        );

        sqlx::query_as::<_, Job>(&sql)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn insert_proposal(
        &self,
        kind: JobKind,
        job_id: Uuid,
        submitter_id: Uuid,
        cover_note: Option<String>,
    ) -> Result<Proposal, Error> {
        let sql = format!(
            r#"
            INSERT INTO {} (job_id, submitter_id, cover_note)
            VALUES ($1, $2, $3)
            RETURNING id, job_id, submitter_id, cover_note, status, created_at
            "#,
            proposal_table(kind)
        );

        sqlx::query_as::<_, Proposal>(&sql)
            .bind(job_id)
            .bind(submitter_id)
            .bind(cover_note)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_proposal(
        &self,
        kind: JobKind,
        proposal_id: Uuid,
    ) -> Result<Option<Proposal>, Error> {
        let sql = format!(
            r#"
            SELECT id, job_id, submitter_id, cover_note, status, created_at
            FROM {}
            WHERE id = $1
            "#,
            proposal_table(kind)
        );

        sqlx::query_as::<_, Proposal>(&sql)
            .bind(proposal_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_proposal_status(
        &self,
        kind: JobKind,
        proposal_id: Uuid,
        status: ProposalStatus,
    ) -> Result<Option<Proposal>, Error> {
        let sql = format!(
            r#"
            UPDATE {}
            SET status = $2
            WHERE id = $1
            RETURNING id, job_id, submitter_id, cover_note, status, created_at
            "#,
            proposal_table(kind)
        );

        sqlx::query_as::<_, Proposal>(&sql)
            .bind(proposal_id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await
    }
}
