//! Async conversation host.
//!
//! [`Conversation`] owns the single mutable [`ChatSession`] of one user and
//! drives the simulated reply latency: an accepted message schedules a
//! [`PendingReply`] that appends the bot turn after the configured delay.
//! Reset, close and drop cancel the scheduled reply. The delivery task only
//! holds a weak reference to the session, and the session's ticket check
//! discards any delivery that still slips through.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use krishimitra_types::{ChatTurn, Language};

use crate::error::{Error, Result};
use crate::pending::PendingReply;
use crate::responder::KeywordResponder;
use crate::session::{ChatSession, DEFAULT_MAX_MESSAGE_LEN, SessionSnapshot};

/// Default simulated reply latency.
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1000);

/// Settings for a new conversation.
#[derive(Debug, Clone)]
pub struct ConversationOptions {
    /// Starting display language.
    pub language: Language,
    /// Time between accepting a message and appending its reply.
    pub reply_delay: Duration,
    /// Longest accepted message, in characters.
    pub max_message_len: usize,
}

impl Default for ConversationOptions {
    fn default() -> Self {
        Self {
            language: Language::default(),
            reply_delay: DEFAULT_REPLY_DELAY,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

impl ConversationOptions {
    #[must_use]
    pub fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    #[must_use]
    pub fn reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    #[must_use]
    pub fn max_message_len(mut self, max: usize) -> Self {
        self.max_message_len = max;
        self
    }
}

#[derive(Debug)]
struct Inner {
    session: ChatSession,
    pending: Option<PendingReply>,
    closed: bool,
}

/// A chat session shared between request handlers and its reply task.
#[derive(Debug)]
pub struct Conversation {
    id: Uuid,
    inner: Arc<Mutex<Inner>>,
    responder: Arc<KeywordResponder>,
    reply_delay: Duration,
    /// Parent of every scheduled reply's token.
    cancel_token: CancellationToken,
}

impl Conversation {
    pub fn new(responder: Arc<KeywordResponder>, options: ConversationOptions) -> Self {
        let session = ChatSession::new(&responder, options.language)
            .with_max_message_len(options.max_message_len);
        let id = session.id();
        debug!("Created conversation {}", id);

        Self {
            id,
            inner: Arc::new(Mutex::new(Inner {
                session,
                pending: None,
                closed: false,
            })),
            responder,
            reply_delay: options.reply_delay,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Accept a user message and schedule its reply.
    ///
    /// Returns the appended user turn. The bot turn shows up in later
    /// snapshots once the reply delay has elapsed.
    pub async fn send(&self, text: &str) -> Result<ChatTurn> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(Error::Closed);
        }

        let outgoing = inner.session.send(text, &self.responder)?;
        debug!(
            "Conversation {} accepted message, reply {} due in {:?}",
            self.id, outgoing.ticket, self.reply_delay
        );

        let ticket = outgoing.ticket;
        let reply = outgoing.reply;
        let shared = Arc::downgrade(&self.inner);
        let id = self.id;
        let token = self.cancel_token.child_token();
        inner.pending = Some(PendingReply::schedule(self.reply_delay, token, move || async move {
            let Some(shared) = shared.upgrade() else {
                debug!("Conversation {} gone before reply {}", id, ticket);
                return;
            };
            let mut inner = shared.lock().await;
            match inner.session.deliver(ticket, reply) {
                Ok(_) => {
                    debug!("Conversation {} delivered reply {}", id, ticket);
                    inner.pending = None;
                }
                Err(e) => warn!("Conversation {} dropped reply: {}", id, e),
            }
        }));

        Ok(outgoing.turn)
    }

    /// Change the display language, relocalizing the greeting.
    pub async fn set_language(&self, language: Language) -> Result<SessionSnapshot> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(Error::Closed);
        }
        inner.session.set_language(language, &self.responder);
        Ok(inner.session.snapshot())
    }

    /// Cancel any owed reply and start over from the greeting.
    pub async fn reset(&self) -> Result<SessionSnapshot> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(Error::Closed);
        }
        if let Some(pending) = inner.pending.take() {
            pending.cancel();
        }
        inner.session.reset(&self.responder);
        info!("Conversation {} reset", self.id);
        Ok(inner.session.snapshot())
    }

    /// Cancel any owed reply and refuse further operations.
    pub async fn close(&self) {
        self.cancel_token.cancel();
        let mut inner = self.inner.lock().await;
        inner.pending = None;
        inner.session.cancel_pending();
        inner.closed = true;
        debug!("Conversation {} closed", self.id);
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }

    pub async fn is_awaiting_reply(&self) -> bool {
        self.inner.lock().await.session.is_awaiting_reply()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().await.session.snapshot()
    }
}

impl Drop for Conversation {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krishimitra_types::Sender;

    fn conversation(delay_ms: u64) -> Conversation {
        Conversation::new(
            Arc::new(KeywordResponder::builtin()),
            ConversationOptions::default().reply_delay(Duration::from_millis(delay_ms)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_arrives_after_delay() {
        let conversation = conversation(1000);

        let turn = conversation.send("Best fertilizer for wheat?").await.unwrap();
        assert_eq!(turn.sender, Sender::User);

        tokio::time::sleep(Duration::from_millis(999)).await;
        let snapshot = conversation.snapshot().await;
        assert!(snapshot.awaiting_reply);
        assert_eq!(snapshot.turns.len(), 2);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let snapshot = conversation.snapshot().await;
        assert!(!snapshot.awaiting_reply);
        assert_eq!(snapshot.turns.len(), 3);
        assert!(snapshot.turns[2].content.starts_with("For wheat cultivation"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_while_pending_is_rejected() {
        let conversation = conversation(1000);
        conversation.send("first").await.unwrap();
        assert_eq!(conversation.send("second").await, Err(Error::ReplyPending));

        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert!(conversation.send("second").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_before_delay_drops_reply() {
        let conversation = conversation(1000);
        conversation.send("How to treat stem borer?").await.unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        let snapshot = conversation.reset().await.unwrap();
        assert_eq!(snapshot.turns.len(), 1);

        tokio::time::sleep(Duration::from_secs(3)).await;
        let snapshot = conversation.snapshot().await;
        assert_eq!(snapshot.turns.len(), 1);
        assert!(!snapshot.awaiting_reply);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_and_refuses() {
        let conversation = conversation(1000);
        conversation.send("Subsidy for polyhouse?").await.unwrap();
        conversation.close().await;

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(conversation.snapshot().await.turns.len(), 2);
        assert!(conversation.is_closed().await);
        assert_eq!(conversation.send("again").await, Err(Error::Closed));
        assert!(matches!(conversation.reset().await, Err(Error::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_mid_delay_cancels_reply() {
        let conversation = conversation(1000);
        conversation.send("Best fertilizer for wheat?").await.unwrap();
        let shared = Arc::clone(&conversation.inner);
        let token = conversation.cancel_token.clone();

        tokio::time::sleep(Duration::from_millis(500)).await;
        drop(conversation);
        assert!(token.is_cancelled());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        let inner = shared.lock().await;
        assert_eq!(inner.session.turns().len(), 2);
        assert!(inner.session.is_awaiting_reply());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_releases_session() {
        let conversation = conversation(1000);
        conversation.send("How to treat stem borer?").await.unwrap();
        let weak = Arc::downgrade(&conversation.inner);

        drop(conversation);
        assert!(weak.upgrade().is_none());

        // The reply task wakes, finds nothing to deliver to and exits.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_language_switch_while_pending() {
        let conversation = conversation(1000);
        conversation.send("Best fertilizer for wheat?").await.unwrap();

        let snapshot = conversation.set_language(Language::Hindi).await.unwrap();
        assert_eq!(snapshot.language, Language::Hindi);
        assert!(snapshot.turns[0].content.starts_with("नमस्ते"));

        tokio::time::sleep(Duration::from_millis(1001)).await;
        let snapshot = conversation.snapshot().await;
        // Computed when the message was sent, so still English.
        assert!(snapshot.turns[2].content.starts_with("For wheat cultivation"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exactly_one_reply_per_message() {
        let conversation = conversation(10);
        for question in ["a", "b", "c"] {
            conversation.send(question).await.unwrap();
            tokio::time::sleep(Duration::from_millis(11)).await;
        }
        let snapshot = conversation.snapshot().await;
        let bots = snapshot.turns.iter().filter(|t| t.sender == Sender::Bot).count();
        let users = snapshot.turns.iter().filter(|t| t.sender == Sender::User).count();
        assert_eq!(users, 3);
        // Greeting plus one reply each.
        assert_eq!(bots, 4);
    }
}
