//! Error types for krishimitra-core.
//!
//! The chat and scanner engines never fail on content: unknown questions get
//! a fallback reply and unknown crops get the default diagnosis. These errors
//! cover the cases where an input must be refused outright.
//!
//! | Error | Raised by | Meaning |
//! |-------|-----------|---------|
//! | [`Error::EmptyMessage`] | chat send | Nothing to send after trimming |
//! | [`Error::MessageTooLong`] | chat send | Message exceeds the configured limit |
//! | [`Error::ReplyPending`] | chat send | The previous message is still awaiting its reply |
//! | [`Error::StaleReply`] | chat delivery | The reply belongs to a message the session no longer waits for |
//! | [`Error::Closed`] | conversation | The conversation was closed |
//! | [`Error::UnsupportedImage`] | scanner | File is not a JPG or PNG |
//! | [`Error::EmptyImage`] | scanner | Upload has no bytes |
//! | [`Error::ImageTooLarge`] | scanner | Upload exceeds the size limit |

use thiserror::Error;

/// Errors raised by the chat session and the disease scanner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// The message was blank.
    #[error("Message is empty")]
    EmptyMessage,

    /// The message was longer than allowed.
    #[error("Message is {len} characters long, the limit is {max}")]
    MessageTooLong {
        /// Length of the rejected message in characters.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// A reply to the previous message has not been delivered yet.
    #[error("A reply is still pending for the previous message")]
    ReplyPending,

    /// A delivery arrived for a ticket the session is not waiting on.
    #[error("Reply ticket {0} is no longer pending")]
    StaleReply(u64),

    /// The conversation has been closed.
    #[error("Conversation is closed")]
    Closed,

    /// The uploaded file is not a supported image type.
    #[error("Invalid file format '{0}'. Please upload a JPG or PNG image.")]
    UnsupportedImage(String),

    /// The uploaded file has no content.
    #[error("Uploaded image is empty")]
    EmptyImage,

    /// The uploaded file is larger than the configured maximum.
    #[error("Image is {size} bytes, the limit is {max} bytes")]
    ImageTooLarge {
        /// Size of the upload in bytes.
        size: u64,
        /// Configured maximum in bytes.
        max: u64,
    },
}

/// Result type alias using krishimitra-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
