//! Runtime orchestrator: coordinates the upload and ask verbs.
//!
//! The orchestrator owns the remote backends and the retrieval settings.
//! A [`Session`] holds one user's active document, conversation and
//! archived chats.

pub mod orchestrator;
pub mod session;
pub mod types;

pub use orchestrator::Orchestrator;
pub use session::{ArchivedChat, Credentials, Session, SignupForm, NO_DOCUMENT_REPLY};
pub use types::*;
