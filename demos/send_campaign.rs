//! Sends one templated message to a list of recipients with humanized
//! pacing and a per-recipient throttle, printing a delivery report.
//!
//! Uses an in-memory loopback transport so the demo runs without real
//! credentials; swap in a transport for your backend to send for real.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::stream::{self, BoxStream};

use banter::{
    Agent, ChatTransport, ChatTurn, Dialog, HistoryMessage, IncomingMessage, Member,
    ParticipantFilter, ParticipantPage, Peer, PeerKind, Reasoner, RecipientId, Result,
    SessionConfig, SignIn,
};

/// Transport that prints what a real backend would transmit.
struct LoopbackTransport {
    connected: AtomicBool,
    directory: Mutex<HashMap<String, i64>>,
}

impl LoopbackTransport {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            directory: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl ChatTransport for LoopbackTransport {
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
        let mut directory = self.directory.lock().unwrap();
        let next_id = directory.len() as i64 + 1;
        let id = *directory.entry(identifier.to_string()).or_insert(next_id);
        Ok(Peer {
            id,
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

    async fn send_message(&self, peer: &Peer, text: &str) -> Result<()> {
        println!(
            "  -> {}: {text}",
            peer.display_name.as_deref().unwrap_or("?")
        );
        Ok(())
    }

    async fn reply_to(&self, peer: &Peer, _message_id: i64, text: &str) -> Result<()> {
        self.send_message(peer, text).await
    }

    async fn set_typing(&self, peer: &Peer) -> Result<()> {
        println!(
            "  .. {} is seeing \"typing...\"",
            peer.display_name.as_deref().unwrap_or("?")
        );
        Ok(())
    }

    async fn recent_messages(&self, _peer: &Peer, _limit: usize) -> Result<Vec<HistoryMessage>> {
        Ok(Vec::new())
    }

    async fn mark_read(&self, _peer: &Peer, _message_id: i64) -> Result<()> {
        Ok(())
    }

    async fn incoming_messages(&self) -> Result<BoxStream<'static, IncomingMessage>> {
        Ok(Box::pin(stream::empty()))
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

/// The campaign sender never consults a reasoner; this one refuses.
struct NoReasoner;

#[async_trait::async_trait]
impl Reasoner for NoReasoner {
    async fn run(&self, _transcript: &[ChatTurn]) -> Result<String> {
        Err(banter::Error::reasoner("outbound-only demo"))
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = SessionConfig::new("campaign_demo", 12345, "demo_hash", "+15551234567")
        .with_message_range(2, 3)
        .with_typing_speed(200.0, 300.0)
        .with_inter_chunk_delay(0.3, 0.8);

    let agent = Agent::new(
        std::sync::Arc::new(NoReasoner),
        config,
        std::sync::Arc::new(LoopbackTransport::new()),
    )?;
    agent.start().await?;

    let recipients = [
        RecipientId::from("@alice"),
        RecipientId::from("@bob"),
        RecipientId::from("@carol"),
    ];
    let message = "Hey! We are getting a group together for the weekend ride. \
                   Are you interested in joining? Let me know by Friday.";

    println!("sending campaign to {} recipients...", recipients.len());
    let reports = agent
        .send_messages(&recipients, message, Duration::from_secs(2))
        .await?;

    for report in &reports {
        println!("{}: {:?}", report.recipient, report.status);
    }
    agent.stop().await?;
    Ok(())
}
