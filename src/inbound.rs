//! The incoming-message loop.
//!
//! Subscribes to new messages and, for each one: sleeps a randomized read
//! delay, acknowledges the read, reconstructs the conversation history for
//! that peer, asks the external reasoner for a reply, and delivers the
//! reply through the pacing engine with the first chunk threaded onto the
//! triggering message.
//!
//! A failure handling one message is logged and swallowed; it never stops
//! the loop.  The loop ends only when the session stops or the transport's
//! event stream closes.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{error, info};

use crate::error::Result;
use crate::messenger::Messenger;
use crate::observability;
use crate::reasoner::{ChatTurn, Reasoner};
use crate::session::Session;
use crate::transport::{IncomingMessage, Peer, PeerKind};

/// Processes incoming messages for the lifetime of the session.
pub struct Inbound {
    messenger: Messenger,
}

impl Inbound {
    /// Creates an inbound processor over `session`.
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            messenger: Messenger::new(session),
        }
    }

    /// Creates an inbound processor over an explicitly constructed
    /// messenger.
    pub fn with_messenger(messenger: Messenger) -> Self {
        Self { messenger }
    }

    /// Runs the incoming-message loop until the session stops or the event
    /// stream ends.
    pub async fn process_messages(&self, reasoner: &dyn Reasoner) -> Result<()> {
        let session = self.messenger.session();
        let mut stream = session.incoming_messages().await?;
        let cancel = session.cancellation_token();
        info!("started processing incoming messages");
        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => break,
                message = stream.next() => match message {
                    Some(message) => message,
                    None => break,
                },
            };
            observability::INBOUND_MESSAGES.click();
            if let Err(err) = self.handle_message(reasoner, &message).await {
                if err.is_session_closed() {
                    break;
                }
                error!(
                    sender = message.sender_id,
                    "error processing message: {err}"
                );
                observability::INBOUND_HANDLER_ERRORS.click();
            }
        }
        info!("stopped processing incoming messages");
        Ok(())
    }

    async fn handle_message(
        &self,
        reasoner: &dyn Reasoner,
        message: &IncomingMessage,
    ) -> Result<()> {
        let session = self.messenger.session();
        info!(
            sender = message.sender_id,
            username = message.sender_username.as_deref().unwrap_or(""),
            "received message"
        );
        let peer = Peer {
            id: message.sender_id,
            kind: PeerKind::User,
            display_name: None,
        };

        let read_delay = self
            .messenger
            .engine()
            .read_delay(message.text.chars().count());
        observability::READ_DELAY_SECONDS.add(read_delay.as_secs_f64());
        session.pace(read_delay).await?;
        session.mark_read(&peer, message.id).await?;

        let transcript = self.chat_history(&peer, message).await?;
        let reply = reasoner.run(&transcript).await?;
        let chunks = self.messenger.deliver(&peer, &reply, Some(message.id)).await?;
        info!(sender = message.sender_id, chunks, "reply sent");
        Ok(())
    }

    /// Rebuilds the conversation with `peer` in chronological order, this
    /// identity's messages tagged assistant and the peer's tagged user, with
    /// the triggering text appended as the newest user turn.
    async fn chat_history(&self, peer: &Peer, message: &IncomingMessage) -> Result<Vec<ChatTurn>> {
        let session = self.messenger.session();
        let limit = session.config().chat_history_limit;
        let history = session.recent_messages(peer, limit).await?;
        let mut transcript: Vec<ChatTurn> = history
            .into_iter()
            .rev()
            .map(|entry| {
                if entry.outgoing {
                    ChatTurn::assistant(entry.text)
                } else {
                    ChatTurn::user(entry.text)
                }
            })
            .collect();
        transcript.push(ChatTurn::user(message.text.clone()));
        Ok(transcript)
    }
}
