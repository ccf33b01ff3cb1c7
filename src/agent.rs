//! Top-level facade wiring one identity's components together.
//!
//! An [`Agent`] owns the session plus the outbound sender, the inbound
//! processor, and the roster tools that share it, and holds the reasoner the
//! inbound loop consults.  Multiple identities run as independent agents
//! with no shared mutable state.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::inbound::Inbound;
use crate::outbound::{DeliveryReport, Outbound};
use crate::reasoner::Reasoner;
use crate::roster::RosterTools;
use crate::session::{HumanInput, Session};
use crate::transport::{ChatTransport, RecipientId};

/// One identity's conversational agent.
pub struct Agent {
    session: Arc<Session>,
    outbound: Outbound,
    inbound: Inbound,
    roster: RosterTools,
    reasoner: Arc<dyn Reasoner>,
}

impl Agent {
    /// Creates an agent over a fresh session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) if the
    /// configuration fails validation; nothing touches the network here.
    pub fn new(
        reasoner: Arc<dyn Reasoner>,
        config: SessionConfig,
        transport: Arc<dyn ChatTransport>,
    ) -> Result<Self> {
        let session = Arc::new(Session::new(Arc::new(config), transport)?);
        Ok(Self::with_session(reasoner, session))
    }

    /// Creates an agent over an existing session.
    pub fn with_session(reasoner: Arc<dyn Reasoner>, session: Arc<Session>) -> Self {
        Self {
            outbound: Outbound::new(Arc::clone(&session)),
            inbound: Inbound::new(Arc::clone(&session)),
            roster: RosterTools::new(Arc::clone(&session)),
            session,
            reasoner,
        }
    }

    /// Registers the login-code callback.
    pub fn with_code_callback(self, callback: HumanInput) -> Self {
        self.session.set_code_callback(callback);
        self
    }

    /// Registers the two-factor password callback.
    pub fn with_twofa_password_callback(self, callback: HumanInput) -> Self {
        self.session.set_twofa_password_callback(callback);
        self
    }

    /// Returns the session.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Returns the roster tools.
    pub fn roster(&self) -> &RosterTools {
        &self.roster
    }

    /// Starts and authorizes the session.  Idempotent.
    pub async fn start(&self) -> Result<()> {
        if !self.session.is_connected() {
            info!("starting agent");
        }
        self.session.start().await
    }

    /// Stops the session, aborting any in-flight paced operations.
    pub async fn stop(&self) -> Result<()> {
        info!("stopping agent");
        self.session.stop().await
    }

    /// Sends `message` to each recipient with humanized pacing, sleeping
    /// `throttle` between recipients.
    pub async fn send_messages(
        &self,
        recipients: &[RecipientId],
        message: &str,
        throttle: Duration,
    ) -> Result<Vec<DeliveryReport>> {
        self.outbound.send_messages(recipients, message, throttle).await
    }

    /// Processes incoming messages until the session stops.
    pub async fn process_incoming_messages(&self) -> Result<()> {
        self.inbound.process_messages(&*self.reasoner).await
    }

    /// Starts the session and processes incoming messages until it stops.
    pub async fn run(&self) -> Result<()> {
        self.start().await?;
        self.process_incoming_messages().await
    }
}
