// service/chat_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::db::Store;
use crate::models::chatmodel::Chat;
use crate::models::jobmodel::JobKind;
use crate::service::error::ServiceError;
use crate::service::feed::{MessageEvent, MessageFeed};
use crate::service::locator::locate;

/// First message of every new chat, attributed to the proposer.
pub const SEED_MESSAGE: &str =
    "Your proposal has been received. Use this conversation to discuss the details.";

/// Outcome of the create-if-absent flow. `created` is false when the pair
/// already had a chat (including when a concurrent attempt won the insert).
#[derive(Debug)]
pub struct ChatCreation {
    pub chat: Chat,
    pub created: bool,
    /// Set when the chat was persisted but its seed message was not. The
    /// creation still counts as successful; callers surface this to the user
    /// instead of failing the whole flow.
    pub seed_warning: Option<String>,
}

pub struct ChatService<S> {
    store: Arc<S>,
    feed: Arc<MessageFeed>,
}

impl<S: Store> ChatService<S> {
    pub fn new(store: Arc<S>, feed: Arc<MessageFeed>) -> Self {
        Self { store, feed }
    }

    /// Turn a submitted proposal into a conversation: resolve the pair's
    /// actual tables, return the existing chat if one is already bound to the
    /// pair, otherwise create the chat and seed it. Repeated calls for the
    /// same pair always land on the same chat. Only the job owner or the
    /// proposal submitter may call this; anyone else is rejected before
    /// anything is written.
    pub async fn open_chat_for_proposal(
        &self,
        caller: Uuid,
        job_id: Uuid,
        proposal_id: Uuid,
        declared: JobKind,
    ) -> Result<ChatCreation, ServiceError> {
        let located = locate(&*self.store, job_id, proposal_id, declared).await?;
        let job_id = located.job.id;
        let proposal_id = located.proposal.id;

        if caller != located.job.owner_id && caller != located.proposal.submitter_id {
            return Err(ServiceError::NotPairMember(caller, job_id));
        }

        if let Some(existing) = self
            .store
            .find_chat(located.kind, job_id, proposal_id)
            .await?
        {
            return Ok(ChatCreation {
                chat: existing,
                created: false,
                seed_warning: None,
            });
        }

        if located.job.owner_id == located.proposal.submitter_id {
            return Err(ServiceError::SelfProposal(located.job.owner_id, job_id));
        }

        let inserted = self
            .store
            .insert_chat(
                located.kind,
                job_id,
                proposal_id,
                located.job.owner_id,
                located.proposal.submitter_id,
            )
            .await?;

        let chat = match inserted {
            Some(chat) => chat,
            // A concurrent attempt for the same pair won; hand back its chat.
            None => {
                let winner = self
                    .store
                    .find_chat(located.kind, job_id, proposal_id)
                    .await?
                    .ok_or(ServiceError::DuplicateChat {
                        job_id,
                        proposal_id,
                    })?;
                return Ok(ChatCreation {
                    chat: winner,
                    created: false,
                    seed_warning: None,
                });
            }
        };

        tracing::info!(
            chat_id = %chat.id,
            kind = located.kind.to_str(),
            job_id = ?chat.job_ref(),
            proposal_id = ?chat.proposal_ref(),
            "chat created for proposal"
        );

        let seed_warning = match self
            .store
            .insert_message(
                chat.id,
                Some(located.proposal.submitter_id),
                true,
                SEED_MESSAGE.to_string(),
                None,
                None,
            )
            .await
        {
            Ok(message) => {
                self.feed.publish(MessageEvent::Inserted {
                    chat_id: chat.id,
                    message_id: message.id,
                });
                None
            }
            Err(e) => {
                tracing::warn!(chat_id = %chat.id, error = %e, "seed message write failed");
                Some(format!(
                    "chat was created but its opening message could not be written: {e}"
                ))
            }
        };

        Ok(ChatCreation {
            chat,
            created: true,
            seed_warning,
        })
    }

    pub async fn get_chat(&self, chat_id: Uuid, user_id: Uuid) -> Result<Chat, ServiceError> {
        let chat = self
            .store
            .get_chat_by_id(chat_id)
            .await?
            .ok_or(ServiceError::ChatNotFound(chat_id))?;

        if !chat.involves(user_id) {
            return Err(ServiceError::NotParticipant(user_id, chat_id));
        }

        Ok(chat)
    }

    pub async fn list_chats(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Chat>, ServiceError> {
        Ok(self.store.get_user_chats(user_id, limit, offset).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::chatdb::ChatStoreExt;
    use crate::db::jobdb::JobStoreExt;
    use crate::db::memory::MemStore;
    use crate::models::jobmodel::{Job, Proposal};
    use crate::service::ledger::MessageLedger;

    struct Fixture {
        store: Arc<MemStore>,
        feed: Arc<MessageFeed>,
        service: ChatService<MemStore>,
        job: Job,
        proposal: Proposal,
        owner: Uuid,
        worker: Uuid,
    }

    async fn fixture(kind: JobKind) -> Fixture {
        let store = Arc::new(MemStore::new());
        let feed = Arc::new(MessageFeed::new());
        let owner = Uuid::new_v4();
        let worker = Uuid::new_v4();

        let job = store
            .insert_job(kind, owner, "lay the patio".into(), None)
            .await
            .unwrap();
        let proposal = store
            .insert_proposal(kind, job.id, worker, Some("I can start Monday".into()))
            .await
            .unwrap();

        let service = ChatService::new(store.clone(), feed.clone());
        Fixture {
            store,
            feed,
            service,
            job,
            proposal,
            owner,
            worker,
        }
    }

    #[tokio::test]
    async fn creates_chat_with_seed_message() {
        let fx = fixture(JobKind::Online).await;

        let creation = fx
            .service
            .open_chat_for_proposal(fx.worker, fx.job.id, fx.proposal.id, JobKind::Online)
            .await
            .unwrap();

        assert!(creation.created);
        assert!(creation.seed_warning.is_none());
        let chat = &creation.chat;
        assert_eq!(chat.job_id, Some(fx.job.id));
        assert_eq!(chat.proposal_id, Some(fx.proposal.id));
        assert_eq!(chat.offline_job_id, None);
        assert_eq!(chat.offline_proposal_id, None);
        assert_eq!(chat.job_owner_id, fx.owner);
        assert_eq!(chat.proposal_owner_id, fx.worker);
        assert_eq!(chat.kind, JobKind::Online);

        let messages = fx.store.get_chat_messages(chat.id, 10, 0).await.unwrap();
        assert_eq!(messages.len(), 1);
        let seed = &messages[0];
        assert!(seed.is_system);
        assert_eq!(seed.sender_id, Some(fx.worker));
        assert_eq!(seed.content, SEED_MESSAGE);
        assert_eq!(seed.is_read, Some(false));
    }

    #[tokio::test]
    async fn repeated_creation_returns_the_same_chat() {
        let fx = fixture(JobKind::Online).await;

        let first = fx
            .service
            .open_chat_for_proposal(fx.worker, fx.job.id, fx.proposal.id, JobKind::Online)
            .await
            .unwrap();
        let second = fx
            .service
            .open_chat_for_proposal(fx.owner, fx.job.id, fx.proposal.id, JobKind::Online)
            .await
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.chat.id, second.chat.id);

        // Still exactly one chat, and only the first call seeded it.
        let chats = fx.store.get_user_chats(fx.owner, 10, 0).await.unwrap();
        assert_eq!(chats.len(), 1);
        let messages = fx
            .store
            .get_chat_messages(first.chat.id, 10, 0)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_creation_yields_one_chat() {
        let fx = fixture(JobKind::Online).await;

        let (a, b) = tokio::join!(
            fx.service
                .open_chat_for_proposal(fx.worker, fx.job.id, fx.proposal.id, JobKind::Online),
            fx.service
                .open_chat_for_proposal(fx.worker, fx.job.id, fx.proposal.id, JobKind::Online),
        );
        let a = a.unwrap();
        let b = b.unwrap();

        assert_eq!(a.chat.id, b.chat.id);
        assert!(a.created || b.created);
        assert!(!(a.created && b.created));

        let chats = fx.store.get_user_chats(fx.owner, 10, 0).await.unwrap();
        assert_eq!(chats.len(), 1);
    }

    #[tokio::test]
    async fn wrong_declared_kind_still_builds_offline_chat() {
        let fx = fixture(JobKind::Offline).await;

        let creation = fx
            .service
            .open_chat_for_proposal(fx.worker, fx.job.id, fx.proposal.id, JobKind::Online)
            .await
            .unwrap();

        let chat = &creation.chat;
        assert_eq!(chat.kind, JobKind::Offline);
        assert_eq!(chat.offline_job_id, Some(fx.job.id));
        assert_eq!(chat.offline_proposal_id, Some(fx.proposal.id));
        assert_eq!(chat.job_id, None);
        assert_eq!(chat.proposal_id, None);
    }

    #[tokio::test]
    async fn self_proposal_is_rejected_and_nothing_persists() {
        let store = Arc::new(MemStore::new());
        let feed = Arc::new(MessageFeed::new());
        let owner = Uuid::new_v4();

        let job = store
            .insert_job(JobKind::Online, owner, "clean the gutters".into(), None)
            .await
            .unwrap();
        let proposal = store
            .insert_proposal(JobKind::Online, job.id, owner, None)
            .await
            .unwrap();

        let service = ChatService::new(store.clone(), feed);
        let err = service
            .open_chat_for_proposal(owner, job.id, proposal.id, JobKind::Online)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::SelfProposal(_, _)));
        assert!(store
            .find_chat(JobKind::Online, job.id, proposal.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn outsider_cannot_force_the_pairs_chat_into_existence() {
        let fx = fixture(JobKind::Online).await;
        let outsider = Uuid::new_v4();

        let published = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = published.clone();
        let _sub = fx.feed.subscribe(move |_| {
            seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        let err = fx
            .service
            .open_chat_for_proposal(outsider, fx.job.id, fx.proposal.id, JobKind::Online)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotPairMember(_, _)));
        // Neither the chat nor its seed message exists, and no owner badge moved.
        assert!(fx
            .store
            .find_chat(JobKind::Online, fx.job.id, fx.proposal.id)
            .await
            .unwrap()
            .is_none());
        assert_eq!(fx.store.unread_count(fx.owner).await.unwrap(), 0);
        assert_eq!(published.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn get_chat_enforces_participation() {
        let fx = fixture(JobKind::Online).await;
        let creation = fx
            .service
            .open_chat_for_proposal(fx.worker, fx.job.id, fx.proposal.id, JobKind::Online)
            .await
            .unwrap();

        assert!(fx.service.get_chat(creation.chat.id, fx.owner).await.is_ok());
        let err = fx
            .service
            .get_chat(creation.chat.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotParticipant(_, _)));
    }

    // The end-to-end walkthrough: proposal -> chat -> hello -> badges -> read.
    #[tokio::test]
    async fn proposal_to_read_walkthrough() {
        let fx = fixture(JobKind::Online).await;
        let ledger = MessageLedger::new(fx.store.clone(), fx.feed.clone());

        let creation = fx
            .service
            .open_chat_for_proposal(fx.worker, fx.job.id, fx.proposal.id, JobKind::Online)
            .await
            .unwrap();
        let chat_id = creation.chat.id;

        let again = fx
            .service
            .open_chat_for_proposal(fx.worker, fx.job.id, fx.proposal.id, JobKind::Online)
            .await
            .unwrap();
        assert_eq!(again.chat.id, chat_id);
        assert!(!again.created);

        ledger
            .append(chat_id, Some(fx.worker), "Hello".into(), None)
            .await
            .unwrap();

        assert_eq!(ledger.unread_count_for(fx.owner).await.unwrap(), 2);
        assert_eq!(ledger.unread_count_for(fx.worker).await.unwrap(), 0);

        let marked = ledger.mark_chat_read(chat_id, fx.owner).await.unwrap();
        assert_eq!(marked, 2);
        assert_eq!(ledger.unread_count_for(fx.owner).await.unwrap(), 0);
    }
}
