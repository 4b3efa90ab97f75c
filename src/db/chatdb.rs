// db/chatdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::chatmodel::*;
use crate::models::jobmodel::JobKind;

const CHAT_COLUMNS: &str = "id, job_id, offline_job_id, proposal_id, offline_proposal_id, \
                            job_owner_id, proposal_owner_id, kind, is_active, created_at";

const MESSAGE_COLUMNS: &str = "id, chat_id, sender_id, is_system, content, media_url, \
                               media_type, is_read, read_at, created_at";

#[async_trait]
pub trait ChatStoreExt {
    /// Dedup lookup: the chat for a (job, proposal) pair in the resolved
    /// kind's columns, if one exists.
    async fn find_chat(
        &self,
        kind: JobKind,
        job_id: Uuid,
        proposal_id: Uuid,
    ) -> Result<Option<Chat>, Error>;

    /// Insert-if-absent. Returns None when a concurrent insert for the same
    /// pair won the race; the caller re-fetches the winner.
    async fn insert_chat(
        &self,
        kind: JobKind,
        job_id: Uuid,
        proposal_id: Uuid,
        job_owner_id: Uuid,
        proposal_owner_id: Uuid,
    ) -> Result<Option<Chat>, Error>;

    async fn get_chat_by_id(&self, chat_id: Uuid) -> Result<Option<Chat>, Error>;

    async fn get_user_chats(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Chat>, Error>;

    async fn insert_message(
        &self,
        chat_id: Uuid,
        sender_id: Option<Uuid>,
        is_system: bool,
        content: String,
        media_url: Option<String>,
        media_type: Option<MediaType>,
    ) -> Result<Message, Error>;

    async fn get_chat_messages(
        &self,
        chat_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, Error>;

    /// Flip unread inbound messages to read. Returns the number of rows
    /// changed, so a second call in a row reports 0.
    async fn mark_messages_read(&self, chat_id: Uuid, reader_id: Uuid) -> Result<u64, Error>;

    async fn unread_count(&self, user_id: Uuid) -> Result<i64, Error>;

    async fn chat_unread_count(&self, chat_id: Uuid, user_id: Uuid) -> Result<i64, Error>;
}

#[async_trait]
impl ChatStoreExt for DBClient {
    async fn find_chat(
        &self,
        kind: JobKind,
        job_id: Uuid,
        proposal_id: Uuid,
    ) -> Result<Option<Chat>, Error> {
        let sql = match kind {
            JobKind::Online => format!(
                "SELECT {CHAT_COLUMNS} FROM chats WHERE job_id = $1 AND proposal_id = $2"
            ),
            JobKind::Offline => format!(
                "SELECT {CHAT_COLUMNS} FROM chats WHERE offline_job_id = $1 AND offline_proposal_id = $2"
            ),
        };

        sqlx::query_as::<_, Chat>(&sql)
            .bind(job_id)
            .bind(proposal_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn insert_chat(
        &self,
        kind: JobKind,
        job_id: Uuid,
        proposal_id: Uuid,
        job_owner_id: Uuid,
        proposal_owner_id: Uuid,
    ) -> Result<Option<Chat>, Error> {
        // ON CONFLICT rides on the partial unique pair indexes; a lost race
        // yields no row instead of a unique-violation error.
        let sql = match kind {
            JobKind::Online => format!(
                r#"
                INSERT INTO chats (job_id, proposal_id, job_owner_id, proposal_owner_id, kind)
                VALUES ($1, $2, $3, $4, 'online')
                ON CONFLICT DO NOTHING
                RETURNING {CHAT_COLUMNS}
                "#
            ),
            JobKind::Offline => format!(
                r#"
                INSERT INTO chats (offline_job_id, offline_proposal_id, job_owner_id, proposal_owner_id, kind)
                VALUES ($1, $2, $3, $4, 'offline')
                ON CONFLICT DO NOTHING
                RETURNING {CHAT_COLUMNS}
                "#
            ),
        };

        sqlx::query_as::<_, Chat>(&sql)
            .bind(job_id)
            .bind(proposal_id)
            .bind(job_owner_id)
            .bind(proposal_owner_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_chat_by_id(&self, chat_id: Uuid) -> Result<Option<Chat>, Error> {
        let sql = format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = $1");

        sqlx::query_as::<_, Chat>(&sql)
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_user_chats(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Chat>, Error> {
        let sql = format!(
            r#"
            SELECT {CHAT_COLUMNS}
            FROM chats
            WHERE (job_owner_id = $1 OR proposal_owner_id = $1)
              AND is_active = true
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );

        sqlx::query_as::<_, Chat>(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
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
        let sql = format!(
            r#"
            INSERT INTO messages (chat_id, sender_id, is_system, content, media_url, media_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {MESSAGE_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Message>(&sql)
            .bind(chat_id)
            .bind(sender_id)
            .bind(is_system)
            .bind(content)
            .bind(media_url)
            .bind(media_type)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_chat_messages(
        &self,
        chat_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, Error> {
        let sql = format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE chat_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );

        sqlx::query_as::<_, Message>(&sql)
            .bind(chat_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    async fn mark_messages_read(&self, chat_id: Uuid, reader_id: Uuid) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = true, read_at = NOW()
            WHERE chat_id = $1
              AND (sender_id IS NULL OR sender_id != $2)
              AND is_read = false
            "#,
        )
        .bind(chat_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM messages m
            INNER JOIN chats c ON m.chat_id = c.id
            WHERE (c.job_owner_id = $1 OR c.proposal_owner_id = $1)
              AND (m.sender_id IS NULL OR m.sender_id != $1)
              AND m.is_read = false
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn chat_unread_count(&self, chat_id: Uuid, user_id: Uuid) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM messages
            WHERE chat_id = $1
              AND (sender_id IS NULL OR sender_id != $2)
              AND is_read = false
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }
}
