//! Chat session state.
//!
//! A [`ChatSession`] is the synchronous state machine behind a conversation:
//!
//! ```text
//! composing --send--> sent (user turn appended, reply computed)
//!                      |
//!                      v
//!                   pending --deliver(ticket)--> delivered (bot turn appended)
//! ```
//!
//! At most one reply is outstanding. Each accepted message is issued a
//! [`Ticket`]; a delivery only lands if its ticket is the one the session is
//! still waiting for, so replies scheduled before a reset are discarded.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use krishimitra_types::{ChatTurn, Language, Sender};

use crate::error::{Error, Result};
use crate::responder::KeywordResponder;

/// Default upper bound on message length, in characters.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 500;

/// Identifies the reply owed for one accepted user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a successful send produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    /// The user turn that was appended.
    pub turn: ChatTurn,
    /// Ticket to present when delivering the reply.
    pub ticket: Ticket,
    /// The reply, already localized for the language at send time.
    pub reply: String,
}

/// Serializable view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub language: Language,
    pub turns: Vec<ChatTurn>,
    pub awaiting_reply: bool,
}

/// Turn history plus reply bookkeeping for one user.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: Uuid,
    language: Language,
    turns: Vec<ChatTurn>,
    greeting: Option<Uuid>,
    pending: Option<Ticket>,
    next_ticket: u64,
    max_message_len: usize,
}

impl ChatSession {
    /// Start a session holding only the greeting in `language`.
    pub fn new(responder: &KeywordResponder, language: Language) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            language,
            turns: Vec::new(),
            greeting: None,
            pending: None,
            next_ticket: 1,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        };
        session.push_greeting(responder);
        session
    }

    /// Set the message length limit.
    #[must_use]
    pub fn with_max_message_len(mut self, max: usize) -> Self {
        self.max_message_len = max;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn max_message_len(&self) -> usize {
        self.max_message_len
    }

    /// Whether a reply is owed.
    pub fn is_awaiting_reply(&self) -> bool {
        self.pending.is_some()
    }

    /// The ticket of the owed reply, if any.
    pub fn pending_ticket(&self) -> Option<Ticket> {
        self.pending
    }

    /// Accept a user message and compute its reply.
    ///
    /// The text is trimmed before it is stored. The reply is not appended;
    /// hand it back through [`deliver`](Self::deliver) with the returned ticket.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyMessage`] if the text is blank
    /// - [`Error::MessageTooLong`] if it exceeds the limit
    /// - [`Error::ReplyPending`] if the previous reply has not been delivered
    pub fn send(&mut self, text: &str, responder: &KeywordResponder) -> Result<Outgoing> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyMessage);
        }
        let len = text.chars().count();
        if len > self.max_message_len {
            return Err(Error::MessageTooLong {
                len,
                max: self.max_message_len,
            });
        }
        if self.pending.is_some() {
            return Err(Error::ReplyPending);
        }

        let turn = ChatTurn::user(text);
        self.turns.push(turn.clone());

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.pending = Some(ticket);

        Ok(Outgoing {
            turn,
            ticket,
            reply: responder.reply(text, self.language).to_string(),
        })
    }

    /// Append the bot reply for `ticket`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaleReply`] if the session is not waiting on `ticket`.
    pub fn deliver(&mut self, ticket: Ticket, reply: impl Into<String>) -> Result<&ChatTurn> {
        if self.pending != Some(ticket) {
            return Err(Error::StaleReply(ticket.0));
        }
        self.pending = None;
        self.turns.push(ChatTurn::bot(reply));
        Ok(&self.turns[self.turns.len() - 1])
    }

    /// Forget the owed reply. Returns the ticket that was pending.
    pub fn cancel_pending(&mut self) -> Option<Ticket> {
        self.pending.take()
    }

    /// Switch language and relocalize the greeting turn in place.
    ///
    /// Other turns keep the text they were created with.
    pub fn set_language(&mut self, language: Language, responder: &KeywordResponder) {
        self.language = language;
        let greeting = responder.greeting(language);
        if let Some(id) = self.greeting
            && let Some(turn) = self.turns.iter_mut().find(|t| t.id == id)
        {
            turn.content = greeting.to_string();
        }
    }

    /// Back to a single greeting. Any owed reply is dropped.
    pub fn reset(&mut self, responder: &KeywordResponder) {
        self.turns.clear();
        self.pending = None;
        self.push_greeting(responder);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            language: self.language,
            turns: self.turns.clone(),
            awaiting_reply: self.is_awaiting_reply(),
        }
    }

    /// Number of turns written by `sender`.
    pub fn count(&self, sender: Sender) -> usize {
        self.turns.iter().filter(|t| t.sender == sender).count()
    }

    fn push_greeting(&mut self, responder: &KeywordResponder) {
        let turn = ChatTurn::bot(responder.greeting(self.language));
        self.greeting = Some(turn.id);
        self.turns.push(turn);
    }
}
