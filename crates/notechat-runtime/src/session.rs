//! Per-user chat session state.
//!
//! A session owns at most one active document, the live conversation, and
//! an ordered archive of earlier conversations. All methods are synchronous;
//! callers hold the session lock only while calling them, never across a
//! remote call.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use notechat_chat::{Conversation, Verbosity};
use notechat_core::{Error, Result};

use crate::types::{DocumentSummary, IndexedDocument};

/// Assistant reply recorded when a question arrives before any upload.
pub const NO_DOCUMENT_REPLY: &str = "Please upload a document first to enable chat.";

/// Login form.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Returns the user label. Any non-empty pair is accepted.
    pub fn validate(&self) -> Result<String> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(Error::InvalidInput("Please fill all fields".into()));
        }
        Ok(email.to_string())
    }
}

/// Signup form.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub confirm: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<String> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() || self.confirm.is_empty() {
            return Err(Error::InvalidInput("All fields required".into()));
        }
        if self.password != self.confirm {
            return Err(Error::InvalidInput("Passwords do not match".into()));
        }
        Ok(email.to_string())
    }
}

/// A conversation moved out of the active slot by "new chat".
#[derive(Debug, Clone, Serialize)]
pub struct ArchivedChat {
    pub label: String,
    pub conversation: Conversation,
}

#[derive(Debug)]
pub struct Session {
    user: String,
    created_at: DateTime<Utc>,
    last_access: Instant,
    document: Option<IndexedDocument>,
    conversation: Conversation,
    archive: Vec<ArchivedChat>,
    current_chat: Option<String>,
    verbosity: Verbosity,
}

impl Session {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            created_at: Utc::now(),
            last_access: Instant::now(),
            document: None,
            conversation: Conversation::new(),
            archive: Vec::new(),
            current_chat: None,
            verbosity: Verbosity::default(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Mark the session as used now.
    pub fn touch(&mut self) {
        self.last_access = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_access.elapsed()
    }

    pub fn document(&self) -> Option<&IndexedDocument> {
        self.document.as_ref()
    }

    pub fn document_summary(&self) -> Option<DocumentSummary> {
        self.document.as_ref().map(IndexedDocument::summary)
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn current_chat(&self) -> Option<&str> {
        self.current_chat.as_deref()
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.verbosity = verbosity;
    }

    pub fn archive(&self) -> &[ArchivedChat] {
        &self.archive
    }

    pub fn archive_labels(&self) -> Vec<String> {
        self.archive.iter().map(|c| c.label.clone()).collect()
    }

    /// True when `fingerprint` names the document already being chatted with.
    pub fn is_active_document(&self, fingerprint: &str) -> bool {
        self.document
            .as_ref()
            .is_some_and(|d| d.fingerprint == fingerprint)
    }

    /// Replace the active document. The live conversation is cleared;
    /// archived chats are left alone.
    pub fn install_document(&mut self, document: IndexedDocument) {
        info!(
            "Session {}: active document is now {} ({} chunks)",
            self.user,
            document.name,
            document.index.len()
        );
        self.document = Some(document);
        self.conversation.clear();
        self.current_chat = None;
    }

    /// Archive the live conversation (if any) as `Chat N` and start over
    /// with no document.
    pub fn new_chat(&mut self) -> Option<String> {
        let label = if self.conversation.is_empty() {
            None
        } else {
            let label = format!("Chat {}", self.archive.len() + 1);
            self.archive.push(ArchivedChat {
                label: label.clone(),
                conversation: std::mem::take(&mut self.conversation),
            });
            debug!("Session {}: archived {}", self.user, label);
            Some(label)
        };
        self.conversation.clear();
        self.document = None;
        self.current_chat = None;
        label
    }

    /// Restore a copy of an archived conversation. Later exchanges are
    /// written back to that archive entry.
    pub fn open_chat(&mut self, label: &str) -> Result<&Conversation> {
        let chat = self
            .archive
            .iter()
            .find(|c| c.label == label)
            .ok_or_else(|| Error::NotFound(format!("chat '{}'", label)))?;
        self.conversation = chat.conversation.clone();
        self.current_chat = Some(label.to_string());
        Ok(&self.conversation)
    }

    /// Append a question and its answer to the live conversation.
    pub fn record_exchange(&mut self, question: &str, answer: &str) {
        self.conversation.push_exchange(question, answer);
        if let Some(label) = &self.current_chat {
            if let Some(chat) = self.archive.iter_mut().find(|c| &c.label == label) {
                chat.conversation = self.conversation.clone();
            }
        }
    }

    /// Like [`Session::record_exchange`], but only while `fingerprint` is
    /// still the active document. Returns whether the exchange was kept.
    pub fn record_answer_for(&mut self, fingerprint: &str, question: &str, answer: &str) -> bool {
        if !self.is_active_document(fingerprint) {
            debug!("Session {}: document changed mid-question, answer not recorded", self.user);
            return false;
        }
        self.record_exchange(question, answer);
        true
    }
}
