//! The seam between the session layer and the wire library.
//!
//! [`ChatTransport`] distills the handful of operations the crate needs from
//! a chat backend: connection lifecycle, the login challenges, peer
//! resolution, message primitives, and the paginated participant queries the
//! roster tools drive.  The session owns a transport handle by composition
//! and never exposes the rest of the wire library's surface.

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::Result;

/// A caller-supplied recipient identifier, resolved to a [`Peer`] at send
/// time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecipientId {
    /// A handle such as `@username`.
    Handle(String),
    /// A phone number in international format.
    Phone(String),
    /// A numeric peer id.
    Id(i64),
}

impl RecipientId {
    /// Parses an identifier: `@handle`, `+phone`, a bare integer id, or a
    /// bare username.
    pub fn parse(s: &str) -> Self {
        if let Some(handle) = s.strip_prefix('@') {
            RecipientId::Handle(handle.to_string())
        } else if s.starts_with('+') {
            RecipientId::Phone(s.to_string())
        } else if let Ok(id) = s.parse::<i64>() {
            RecipientId::Id(id)
        } else {
            RecipientId::Handle(s.to_string())
        }
    }
}

impl From<&str> for RecipientId {
    fn from(s: &str) -> Self {
        RecipientId::parse(s)
    }
}

impl From<i64> for RecipientId {
    fn from(id: i64) -> Self {
        RecipientId::Id(id)
    }
}

impl std::fmt::Display for RecipientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecipientId::Handle(handle) => write!(f, "@{handle}"),
            RecipientId::Phone(phone) => write!(f, "{phone}"),
            RecipientId::Id(id) => write!(f, "{id}"),
        }
    }
}

/// The kind of endpoint a peer resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerKind {
    /// A regular user account.
    User,
    /// A bot account.
    Bot,
    /// A group chat.
    Group,
    /// A broadcast channel.
    Channel,
}

/// An addressable endpoint resolved from a [`RecipientId`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Peer {
    /// Backend-assigned peer id.
    pub id: i64,
    /// What the identifier resolved to.
    pub kind: PeerKind,
    /// Display name, when the backend reports one.
    pub display_name: Option<String>,
}

impl Peer {
    /// Returns true if this peer is a directly-messageable user.
    pub fn is_user(&self) -> bool {
        self.kind == PeerKind::User
    }
}

/// Outcome of a code sign-in attempt.
///
/// A two-factor challenge is an expected branch of the login flow, so it is
/// a value rather than an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignIn {
    /// The account is fully authorized.
    Authorized,
    /// Two-step verification is enabled; a password is required.
    PasswordRequired,
}

/// A new message delivered by the incoming-message subscription.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Backend-assigned message id.
    pub id: i64,
    /// The peer that sent the message.
    pub sender_id: i64,
    /// Sender's handle, when known.
    pub sender_username: Option<String>,
    /// Message text.
    pub text: String,
    /// When the backend timestamped the message.
    #[serde(with = "crate::utils::time")]
    pub timestamp: OffsetDateTime,
}

/// One message from a peer's history, tagged by direction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// Backend-assigned message id.
    pub id: i64,
    /// True when this identity sent the message.
    pub outgoing: bool,
    /// Message text.
    pub text: String,
    /// When the backend timestamped the message.
    #[serde(with = "crate::utils::time")]
    pub timestamp: OffsetDateTime,
}

/// One conversation in the dialog list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Dialog {
    /// Backend-assigned dialog id.
    pub id: i64,
    /// Display name of the conversation.
    pub name: String,
    /// Text of the newest message, if any.
    pub last_message: Option<String>,
    /// Count of unread messages.
    pub unread_count: u32,
    /// What kind of entity the dialog is with.
    pub kind: PeerKind,
}

/// A member record produced by the roster tools.
///
/// The shape matches the caller-facing sink columns: id, username,
/// first_name, last_name, phone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Backend-assigned user id.
    pub id: i64,
    /// Handle, when set.
    pub username: Option<String>,
    /// First name, when set.
    pub first_name: Option<String>,
    /// Last name, when set.
    pub last_name: Option<String>,
    /// Phone number, when visible.
    pub phone: Option<String>,
}

/// Which slice of a channel's participant list to enumerate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParticipantFilter {
    /// Channel administrators.
    Admins,
    /// Bot accounts.
    Bots,
    /// Members whose name or handle matches the search prefix.
    Search(String),
    /// Kicked members matching the search prefix.
    Kicked(String),
    /// Banned members matching the search prefix.
    Banned(String),
}

/// One page of a participant query.
#[derive(Clone, Debug)]
pub struct ParticipantPage {
    /// The members on this page.
    pub members: Vec<Member>,
    /// The total the backend claims for this filter.  Not reliable beyond
    /// the backend's pagination cap.
    pub total: usize,
}

/// Operations the crate requires from a chat backend.
///
/// Implementations wrap a concrete wire library.  All methods take `&self`;
/// a transport handle is expected to be internally synchronized the way
/// connection handles in async wire libraries are.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Opens the underlying connection.  Does not authenticate.
    async fn connect(&self) -> Result<()>;

    /// Closes the underlying connection.  Must be idempotent.
    async fn disconnect(&self) -> Result<()>;

    /// Returns true while the connection is open.
    fn is_connected(&self) -> bool;

    /// Returns true if the backend already considers this session signed in.
    async fn is_authorized(&self) -> Result<bool>;

    /// Asks the backend to deliver a login code for `phone_number`.
    async fn request_login_code(&self, phone_number: &str) -> Result<()>;

    /// Attempts sign-in with a login code.
    async fn sign_in_with_code(&self, phone_number: &str, code: &str) -> Result<SignIn>;

    /// Completes a two-factor sign-in with the account password.
    async fn sign_in_with_password(&self, password: &str) -> Result<()>;

    /// Resolves a recipient identifier to an addressable peer.
    async fn resolve_peer(&self, identifier: &RecipientId) -> Result<Peer>;

    /// Fetches the full member record for a user peer.
    async fn user_record(&self, peer: &Peer) -> Result<Member>;

    /// Sends a message to a peer.
    async fn send_message(&self, peer: &Peer, text: &str) -> Result<()>;

    /// Sends a message as a threaded reply to an earlier message.
    async fn reply_to(&self, peer: &Peer, message_id: i64, text: &str) -> Result<()>;

    /// Signals the "typing..." indicator to a peer.
    async fn set_typing(&self, peer: &Peer) -> Result<()>;

    /// Returns up to `limit` most recent messages for a peer, newest first.
    async fn recent_messages(&self, peer: &Peer, limit: usize) -> Result<Vec<HistoryMessage>>;

    /// Acknowledges messages up to and including `message_id` as read.
    async fn mark_read(&self, peer: &Peer, message_id: i64) -> Result<()>;

    /// Subscribes to new incoming messages.  The stream ends when the
    /// connection closes.
    async fn incoming_messages(&self) -> Result<BoxStream<'static, IncomingMessage>>;

    /// Fetches one page of a channel's participant list.
    async fn participants(
        &self,
        chat: &Peer,
        filter: &ParticipantFilter,
        offset: usize,
        limit: usize,
    ) -> Result<ParticipantPage>;

    /// Lists up to `limit` dialogs, most recent first.
    async fn dialogs(&self, limit: usize) -> Result<Vec<Dialog>>;
}
