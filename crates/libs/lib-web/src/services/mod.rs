//! # Services Layer
//!
//! Business logic between the HTTP handlers and the repositories:
//!
//! ```text
//! Handlers (HTTP) → Services (Business Logic) → Repositories (lib-core)
//! ```
//!
//! - [`conversations`] - assistant conversation, direct conversations, invitations
//! - [`messages`] - conversation history and the send pipeline
//!
//! Services are structs holding a `DbPool` and return `Result<T, AppError>`;
//! repository errors convert through `From<sqlx::Error>`.

pub mod conversations;
pub mod messages;

pub use conversations::ConversationService;
pub use messages::{MessageService, MAX_MESSAGE_BYTES};
