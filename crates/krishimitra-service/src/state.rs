//! Application state shared across handlers.
//!
//! The price store and responder are immutable after startup and need no
//! locking. Live chat sessions sit in a [`SessionRegistry`] behind an
//! `RwLock`; each [`Conversation`] guards its own session internally, so
//! handlers hold the registry lock only long enough to clone an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use krishimitra_core::{Conversation, ConversationOptions, DiseaseScanner, KeywordResponder};
use krishimitra_store::RecordStore;

use crate::config::Config;

/// Shared application state.
pub struct AppState {
    /// Seeded price records.
    pub store: RecordStore,
    /// Configuration loaded at startup.
    pub config: Config,
    /// Canned reply table shared by every conversation.
    pub responder: Arc<KeywordResponder>,
    /// Upload validation and mock diagnosis.
    pub scanner: DiseaseScanner,
    /// Live chat sessions.
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: RecordStore, config: Config) -> Arc<Self> {
        let scanner = DiseaseScanner::new(config.scanner.max_upload_bytes);
        let sessions = SessionRegistry::new(
            config.chat.max_sessions,
            config.chat.session_idle_timeout(),
        );
        Arc::new(Self {
            store,
            config,
            responder: Arc::new(KeywordResponder::builtin()),
            scanner,
            sessions,
        })
    }
}

/// The registry already holds its maximum number of sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Session limit of {0} reached")]
pub struct SessionLimitReached(pub usize);

#[derive(Debug)]
struct SessionEntry {
    conversation: Arc<Conversation>,
    last_active: Instant,
}

/// Live conversations keyed by id.
///
/// Each lookup refreshes a session's activity time. Sessions left unused for
/// longer than the idle timeout are closed and evicted by [`evict_idle`],
/// and also when a new session would otherwise exceed the cap.
///
/// [`evict_idle`]: SessionRegistry::evict_idle
#[derive(Debug)]
pub struct SessionRegistry {
    conversations: RwLock<HashMap<Uuid, SessionEntry>>,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize, idle_timeout: Duration) -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            max_sessions,
            idle_timeout,
        }
    }

    /// Start a conversation and register it.
    ///
    /// When the registry is full, idle sessions are evicted first.
    pub async fn create(
        &self,
        responder: Arc<KeywordResponder>,
        options: ConversationOptions,
    ) -> Result<Arc<Conversation>, SessionLimitReached> {
        let mut conversations = self.conversations.write().await;
        let evicted = if conversations.len() >= self.max_sessions {
            take_idle(&mut conversations, self.idle_timeout)
        } else {
            Vec::new()
        };

        let result = if conversations.len() >= self.max_sessions {
            Err(SessionLimitReached(self.max_sessions))
        } else {
            let conversation = Arc::new(Conversation::new(responder, options));
            conversations.insert(
                conversation.id(),
                SessionEntry {
                    conversation: Arc::clone(&conversation),
                    last_active: Instant::now(),
                },
            );
            debug!(
                "Registered session {} ({} live)",
                conversation.id(),
                conversations.len()
            );
            Ok(conversation)
        };
        drop(conversations);

        close_evicted(evicted).await;
        result
    }

    /// Look up a session and mark it active.
    pub async fn get(&self, id: Uuid) -> Option<Arc<Conversation>> {
        let mut conversations = self.conversations.write().await;
        let entry = conversations.get_mut(&id)?;
        entry.last_active = Instant::now();
        Some(Arc::clone(&entry.conversation))
    }

    /// Unregister a conversation and cancel its pending reply.
    ///
    /// Returns `false` if no such session exists.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.conversations.write().await.remove(&id);
        match removed {
            Some(entry) => {
                entry.conversation.close().await;
                debug!("Removed session {}", id);
                true
            }
            None => false,
        }
    }

    /// Close and drop every session idle for at least the idle timeout.
    ///
    /// Returns the number of sessions evicted.
    pub async fn evict_idle(&self) -> usize {
        let evicted = take_idle(&mut *self.conversations.write().await, self.idle_timeout);
        close_evicted(evicted).await
    }

    /// Close and drop every conversation.
    pub async fn close_all(&self) {
        let drained: Vec<Arc<Conversation>> = self
            .conversations
            .write()
            .await
            .drain()
            .map(|(_, entry)| entry.conversation)
            .collect();
        for conversation in &drained {
            conversation.close().await;
        }
        info!("Closed {} chat sessions", drained.len());
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }
}

fn take_idle(
    conversations: &mut HashMap<Uuid, SessionEntry>,
    idle_timeout: Duration,
) -> Vec<Arc<Conversation>> {
    let now = Instant::now();
    let idle: Vec<Uuid> = conversations
        .iter()
        .filter(|(_, entry)| now.duration_since(entry.last_active) >= idle_timeout)
        .map(|(id, _)| *id)
        .collect();
    idle.iter()
        .filter_map(|id| conversations.remove(id))
        .map(|entry| entry.conversation)
        .collect()
}

async fn close_evicted(evicted: Vec<Arc<Conversation>>) -> usize {
    for conversation in &evicted {
        conversation.close().await;
    }
    if !evicted.is_empty() {
        info!("Evicted {} idle chat sessions", evicted.len());
    }
    evicted.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn responder() -> Arc<KeywordResponder> {
        Arc::new(KeywordResponder::builtin())
    }

    #[tokio::test]
    async fn test_create_get_remove() {
        let registry = SessionRegistry::new(4, HOUR);
        let conversation = registry
            .create(responder(), ConversationOptions::default())
            .await
            .unwrap();
        let id = conversation.id();

        assert_eq!(registry.len().await, 1);
        assert!(registry.get(id).await.is_some());

        assert!(registry.remove(id).await);
        assert!(registry.get(id).await.is_none());
        assert!(!registry.remove(id).await);
        assert!(conversation.is_closed().await);
    }

    #[tokio::test]
    async fn test_limit_is_enforced() {
        let registry = SessionRegistry::new(2, HOUR);
        for _ in 0..2 {
            registry
                .create(responder(), ConversationOptions::default())
                .await
                .unwrap();
        }
        let err = registry
            .create(responder(), ConversationOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, SessionLimitReached(2));
        assert_eq!(registry.max_sessions(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_cancels_pending_reply() {
        let registry = SessionRegistry::new(2, HOUR);
        let conversation = registry
            .create(responder(), ConversationOptions::default())
            .await
            .unwrap();
        conversation.send("How to treat stem borer?").await.unwrap();

        registry.remove(conversation.id()).await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(conversation.snapshot().await.turns.len(), 2);
    }

    #[tokio::test]
    async fn test_close_all() {
        let registry = SessionRegistry::new(3, HOUR);
        let conversation = registry
            .create(responder(), ConversationOptions::default())
            .await
            .unwrap();
        registry
            .create(responder(), ConversationOptions::default())
            .await
            .unwrap();

        registry.close_all().await;
        assert!(registry.is_empty().await);
        assert!(conversation.is_closed().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_evicted_to_make_room() {
        let registry = SessionRegistry::new(3, HOUR);
        let first = registry
            .create(responder(), ConversationOptions::default())
            .await
            .unwrap();
        for _ in 0..2 {
            registry
                .create(responder(), ConversationOptions::default())
                .await
                .unwrap();
        }

        tokio::time::sleep(Duration::from_secs(7 * 24 * 3600)).await;

        let fresh = registry
            .create(responder(), ConversationOptions::default())
            .await
            .unwrap();
        assert_eq!(registry.len().await, 1);
        assert!(registry.get(fresh.id()).await.is_some());
        assert!(registry.get(first.id()).await.is_none());
        assert!(first.is_closed().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_registry_of_active_sessions_still_refuses() {
        let registry = SessionRegistry::new(1, HOUR);
        registry
            .create(responder(), ConversationOptions::default())
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(600)).await;

        let err = registry
            .create(responder(), ConversationOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, SessionLimitReached(1));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_refreshes_activity() {
        let registry = SessionRegistry::new(4, Duration::from_secs(60));
        let conversation = registry
            .create(responder(), ConversationOptions::default())
            .await
            .unwrap();
        let id = conversation.id();

        tokio::time::sleep(Duration::from_secs(50)).await;
        assert!(registry.get(id).await.is_some());
        tokio::time::sleep(Duration::from_secs(50)).await;
        assert_eq!(registry.evict_idle().await, 0);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(registry.evict_idle().await, 1);
        assert!(registry.get(id).await.is_none());
        assert!(conversation.is_closed().await);
    }

    #[test]
    fn test_app_state_uses_config() {
        let mut config = Config::default();
        config.scanner.max_upload_bytes = 1024;
        config.chat.max_sessions = 7;
        config.chat.session_idle_secs = 120;

        let state = AppState::new(RecordStore::sample(), config);
        assert_eq!(state.scanner.max_upload_bytes(), 1024);
        assert_eq!(state.sessions.max_sessions(), 7);
        assert_eq!(state.sessions.idle_timeout(), Duration::from_secs(120));
        assert_eq!(state.store.len(), 10);
    }
}
