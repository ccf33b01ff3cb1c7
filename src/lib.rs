//! Humanized conversational automation over a pluggable chat transport.
//!
//! The crate authenticates a persistent session against a [`ChatTransport`]
//! implementation, then disguises automated messages as human typing:
//! outgoing text is split into human-plausible chunks, each typed out with
//! variable-speed bursts and pauses, and inbound replies wait a randomized
//! read delay first.  An [`Agent`] ties one identity's session, outbound
//! batch sender, inbound reply loop, and roster tools together.

// Public modules
pub mod agent;
pub mod config;
pub mod error;
pub mod inbound;
pub mod messenger;
pub mod outbound;
pub mod pacing;
pub mod reasoner;
pub mod roster;
pub mod session;
pub mod transport;
pub mod utils;

mod observability;

// Re-exports
pub use agent::Agent;
pub use config::{ProxyConfig, SessionConfig};
pub use error::{Error, Result};
pub use inbound::Inbound;
pub use messenger::Messenger;
pub use observability::register_biometrics;
pub use outbound::{DeliveryReport, DeliveryStatus, Outbound};
pub use pacing::{Burst, Chunker, PacingEngine, PacingPlan, PlannedChunk, SentenceChunker};
pub use reasoner::{ChatRole, ChatTurn, Reasoner};
pub use roster::{DialogSummary, RosterTools, SearchLimits};
pub use session::{HumanInput, Session, SessionState, human_input};
pub use transport::{
    ChatTransport, Dialog, HistoryMessage, IncomingMessage, Member, ParticipantFilter,
    ParticipantPage, Peer, PeerKind, RecipientId, SignIn,
};
