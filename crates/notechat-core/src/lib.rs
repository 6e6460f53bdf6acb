//! NoteChat Core: error taxonomy, configuration, bounded waits.

pub mod config;
pub mod deadline;
pub mod error;

pub use config::{CohereSettings, NoteChatConfig, RetrievalSettings, Timeouts};
pub use deadline::with_deadline;
pub use error::{Error, Result};
