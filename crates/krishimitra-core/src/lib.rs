//! Chat, disease scanner and weather engines for KrishiMitra.
//!
//! # Chat
//!
//! [`KeywordResponder`] maps a question to a canned English or Hindi answer.
//! [`ChatSession`] keeps the turn history and enforces one outstanding reply
//! at a time; [`Conversation`] hosts a session on tokio and appends each reply
//! after a simulated delay through a cancellable [`PendingReply`].
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use krishimitra_core::{Conversation, ConversationOptions, KeywordResponder};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> krishimitra_core::Result<()> {
//! let conversation = Conversation::new(
//!     Arc::new(KeywordResponder::builtin()),
//!     ConversationOptions::default().reply_delay(Duration::from_millis(10)),
//! );
//! conversation.send("How to treat stem borer?").await?;
//! tokio::time::sleep(Duration::from_millis(50)).await;
//! assert_eq!(conversation.snapshot().await.turns.len(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! # Scanner and weather
//!
//! [`DiseaseScanner`] validates an upload's name and size and returns a mock
//! diagnosis; [`weather::generate`] produces a random report with a five-day
//! forecast. Both accept an injected RNG for reproducible output.

pub mod conversation;
pub mod error;
pub mod pending;
pub mod responder;
pub mod scanner;
pub mod session;
pub mod weather;

pub use conversation::{Conversation, ConversationOptions, DEFAULT_REPLY_DELAY};
pub use error::{Error, Result};
pub use pending::PendingReply;
pub use responder::{KeywordResponder, Localized, Rule};
pub use scanner::{DEFAULT_MAX_UPLOAD_BYTES, DiseaseProfile, DiseaseScanner};
pub use session::{
    ChatSession, DEFAULT_MAX_MESSAGE_LEN, Outgoing, SessionSnapshot, Ticket,
};
pub use weather::DEFAULT_LOCATION;
