//! The boundary to the external reasoning engine.
//!
//! The inbound loop hands a role-tagged transcript to an opaque reasoner and
//! gets one reply text back.  Nothing here assumes a latency class; the
//! reasoner runs inside message handling and must not block other sessions.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Who spoke a transcript turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    /// Instructions framing the conversation.
    System,
    /// The remote human.
    User,
    /// This identity.
    Assistant,
}

/// One turn of an ordered transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who spoke.
    pub role: ChatRole,
    /// What they said.
    pub content: String,
}

impl ChatTurn {
    /// Creates a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// An external reasoning engine: ordered transcript in, single reply out.
#[async_trait::async_trait]
pub trait Reasoner: Send + Sync {
    /// Produces one reply for the transcript, newest turn last.
    async fn run(&self, transcript: &[ChatTurn]) -> Result<String>;
}
