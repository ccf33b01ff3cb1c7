//! Runs the inbound loop against a scripted stream of incoming messages,
//! answering each one through a canned reasoner with humanized pacing.
//!
//! The loopback transport feeds two messages and then closes the stream,
//! so the demo terminates on its own.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::stream::{self, BoxStream, StreamExt};
use time::OffsetDateTime;

use banter::{
    Agent, ChatTransport, ChatTurn, Dialog, HistoryMessage, IncomingMessage, Member,
    ParticipantFilter, ParticipantPage, Peer, PeerKind, Reasoner, RecipientId, Result,
    SessionConfig, SignIn,
};

struct ScriptedTransport {
    connected: AtomicBool,
    incoming: Mutex<Option<BoxStream<'static, IncomingMessage>>>,
}

impl ScriptedTransport {
    fn new() -> Self {
        let script = vec![
            IncomingMessage {
                id: 1,
                sender_id: 42,
                sender_username: Some("dana".to_string()),
                text: "hey, are you around?".to_string(),
                timestamp: OffsetDateTime::UNIX_EPOCH,
            },
            IncomingMessage {
                id: 2,
                sender_id: 42,
                sender_username: Some("dana".to_string()),
                text: "wanted to ask about tomorrow".to_string(),
                timestamp: OffsetDateTime::UNIX_EPOCH,
            },
        ];
        Self {
            connected: AtomicBool::new(false),
            incoming: Mutex::new(Some(stream::iter(script).boxed())),
        }
    }
}

#[async_trait::async_trait]
impl ChatTransport for ScriptedTransport {
    async fn connect(&self) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn is_authorized(&self) -> Result<bool> {
        Ok(true)
    }

    async fn request_login_code(&self, _phone_number: &str) -> Result<()> {
        Ok(())
    }

    async fn sign_in_with_code(&self, _phone_number: &str, _code: &str) -> Result<SignIn> {
        Ok(SignIn::Authorized)
    }

    async fn sign_in_with_password(&self, _password: &str) -> Result<()> {
        Ok(())
    }

    async fn resolve_peer(&self, identifier: &RecipientId) -> Result<Peer> {
        Ok(Peer {
            id: 42,
            kind: PeerKind::User,
            display_name: Some(identifier.to_string()),
        })
    }

    async fn user_record(&self, peer: &Peer) -> Result<Member> {
        Ok(Member {
            id: peer.id,
            username: peer.display_name.clone(),
            first_name: None,
            last_name: None,
            phone: None,
        })
    }

    async fn send_message(&self, _peer: &Peer, text: &str) -> Result<()> {
        println!("  -> dana: {text}");
        Ok(())
    }

    async fn reply_to(&self, _peer: &Peer, message_id: i64, text: &str) -> Result<()> {
        println!("  -> dana (reply to #{message_id}): {text}");
        Ok(())
    }

    async fn set_typing(&self, _peer: &Peer) -> Result<()> {
        println!("  .. typing...");
        Ok(())
    }

    async fn recent_messages(&self, _peer: &Peer, _limit: usize) -> Result<Vec<HistoryMessage>> {
        Ok(Vec::new())
    }

    async fn mark_read(&self, _peer: &Peer, message_id: i64) -> Result<()> {
        println!("  .. read #{message_id}");
        Ok(())
    }

    async fn incoming_messages(&self) -> Result<BoxStream<'static, IncomingMessage>> {
        self.incoming
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| banter::Error::unknown("incoming stream already taken"))
    }

    async fn participants(
        &self,
        _chat: &Peer,
        _filter: &ParticipantFilter,
        _offset: usize,
        _limit: usize,
    ) -> Result<ParticipantPage> {
        Ok(ParticipantPage {
            members: Vec::new(),
            total: 0,
        })
    }

    async fn dialogs(&self, _limit: usize) -> Result<Vec<Dialog>> {
        Ok(Vec::new())
    }
}

/// Answers every message the same way, regardless of the transcript.
struct FriendlyReasoner;

#[async_trait::async_trait]
impl Reasoner for FriendlyReasoner {
    async fn run(&self, transcript: &[ChatTurn]) -> Result<String> {
        let latest = transcript
            .last()
            .map(|turn| turn.content.as_str())
            .unwrap_or("");
        Ok(format!(
            "I'm here! You said \"{latest}\". Give me a minute and I'll get back to you properly."
        ))
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = SessionConfig::new("autoresponder_demo", 12345, "demo_hash", "+15551234567")
        .with_typing_speed(250.0, 350.0)
        .with_inter_chunk_delay(0.3, 0.8)
        .with_read_delay(0.02, 0.2, 0.5);

    let agent = Agent::new(
        std::sync::Arc::new(FriendlyReasoner),
        config,
        std::sync::Arc::new(ScriptedTransport::new()),
    )?;

    println!("processing incoming messages...");
    agent.run().await?;
    agent.stop().await?;
    Ok(())
}
