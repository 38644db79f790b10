//! # Memory: conversation buffer and session persistence
//!
//! Two separate concerns live here:
//!
//! 1. **Conversation memory**: the per-run buffer of user/AI turns that the
//!    retriever, synthesizer and explainer share. [`ConversationMemory`] renders
//!    it as prompt history and exports it as the run's memory trace.
//! 2. **Store**: string key-value persistence used by the HTTP layer to poll
//!    run status and results. [`SessionStore`] is the typed view over a
//!    [`Store`].
//!
//! ## Store Implementations
//!
//! | Type              | Persistence | Feature  |
//! |-------------------|-------------|----------|
//! | [`InMemoryStore`] | In-memory   | -        |
//! | [`SqliteStore`]   | SQLite file | `sqlite` |

mod conversation;
mod in_memory_store;
mod session;
#[cfg(feature = "sqlite")]
mod sqlite_store;
mod store;

pub use conversation::ConversationMemory;
pub use in_memory_store::InMemoryStore;
pub use session::{SessionRecord, SessionStatus, SessionStore};
#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteStore;
pub use store::{Store, StoreError};
