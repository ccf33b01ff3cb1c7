//! Session lifecycle and the login state machine.
//!
//! A [`Session`] owns one transport handle by composition and walks it
//! through `Disconnected → Connecting → AwaitingCode → AwaitingTwoFactor →
//! Authorized`.  Human interaction happens only through the injected
//! asynchronous callbacks, awaited with no internal timeout: the caller
//! controls the UX.  The session also provides [`Session::pace`], the
//! cancellable sleep every deliberate pacing delay routes through, so
//! [`Session::stop`] can abort an in-flight send sequence instead of
//! leaving it hanging.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::stream::BoxStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::observability;
use crate::transport::{
    ChatTransport, Dialog, HistoryMessage, IncomingMessage, Member, ParticipantFilter,
    ParticipantPage, Peer, RecipientId, SignIn,
};

/// An injected asynchronous callback producing a login code or password.
///
/// Invoked at most once per login attempt per challenge type.
pub type HumanInput =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Result<String>> + Send>> + Send + Sync>;

/// Wraps an async closure into a [`HumanInput`] callback.
pub fn human_input<F, Fut>(f: F) -> HumanInput
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// Observable session states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No live connection.
    Disconnected,
    /// Transport connect in progress.
    Connecting,
    /// Waiting on the login-code callback.
    AwaitingCode,
    /// Waiting on the two-factor password callback.
    AwaitingTwoFactor,
    /// Signed in; message primitives are available.
    Authorized,
}

/// One authenticated identity's live session.
pub struct Session {
    config: Arc<SessionConfig>,
    transport: Arc<dyn ChatTransport>,
    state: Mutex<SessionState>,
    // Serializes authorization: the transport is not safe for concurrent
    // login flows.
    auth_flow: tokio::sync::Mutex<()>,
    cancel: Mutex<CancellationToken>,
    code_callback: Mutex<Option<HumanInput>>,
    twofa_password_callback: Mutex<Option<HumanInput>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Creates a session over `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] before any network activity if the
    /// configuration fails validation.
    pub fn new(config: Arc<SessionConfig>, transport: Arc<dyn ChatTransport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            state: Mutex::new(SessionState::Disconnected),
            auth_flow: tokio::sync::Mutex::new(()),
            cancel: Mutex::new(CancellationToken::new()),
            code_callback: Mutex::new(None),
            twofa_password_callback: Mutex::new(None),
        })
    }

    /// Registers the login-code callback.
    pub fn set_code_callback(&self, callback: HumanInput) {
        *self.code_callback.lock().unwrap() = Some(callback);
    }

    /// Registers the two-factor password callback.
    pub fn set_twofa_password_callback(&self, callback: HumanInput) {
        *self.twofa_password_callback.lock().unwrap() = Some(callback);
    }

    /// Returns the configuration this session was built from.
    pub fn config(&self) -> &Arc<SessionConfig> {
        &self.config
    }

    /// Returns the current state.  No side effects.
    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    /// Returns true while the underlying transport is connected.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock().unwrap() = state;
    }

    /// Connects and authenticates.  Idempotent: a session that is already
    /// `Authorized` returns immediately.
    ///
    /// The flow: connect with the configured timeout, check authorization,
    /// and if the backend does not recognize the session, request a login
    /// code and answer the challenge (and the optional two-factor challenge)
    /// through the injected callbacks.  A challenge with no registered
    /// callback fails fast with [`Error::Configuration`].
    ///
    /// Hard failures tear the connection down before returning; the state
    /// machine never retries authentication on its own.
    pub async fn start(&self) -> Result<()> {
        let _flow = self.auth_flow.lock().await;
        if self.state() == SessionState::Authorized && self.transport.is_connected() {
            return Ok(());
        }
        // A fresh token per start so a stopped session can be started again.
        *self.cancel.lock().unwrap() = CancellationToken::new();
        self.set_state(SessionState::Connecting);
        info!("connecting to chat servers");
        match self.authorize().await {
            Ok(()) => {
                self.set_state(SessionState::Authorized);
                observability::SESSION_STARTS.click();
                info!(
                    phone = %self.config.phone_number,
                    "successfully authenticated"
                );
                Ok(())
            }
            Err(err) => {
                error!("authentication failed in start(): {err}");
                observability::SESSION_AUTH_FAILURES.click();
                let _ = self.transport.disconnect().await;
                self.set_state(SessionState::Disconnected);
                Err(err)
            }
        }
    }

    async fn authorize(&self) -> Result<()> {
        let timeout = self.config.timeout();
        match tokio::time::timeout(timeout, self.transport.connect()).await {
            Ok(connected) => connected?,
            Err(_) => {
                return Err(Error::connection_timeout(
                    format!("connect exceeded {} seconds", self.config.timeout_secs),
                    Some(timeout.as_secs_f64()),
                ));
            }
        }
        info!("connected, checking authorization");
        if self.transport.is_authorized().await? {
            return Ok(());
        }

        info!("not authorized, sending code request");
        self.transport
            .request_login_code(&self.config.phone_number)
            .await?;
        let code_callback = self.code_callback.lock().unwrap().clone().ok_or_else(|| {
            Error::configuration("no code_callback provided for receiving the login code")
        })?;
        self.set_state(SessionState::AwaitingCode);
        // The sanctioned suspension point: awaited with no internal timeout.
        let code = code_callback().await?;

        info!("signing in with the provided code");
        match self
            .transport
            .sign_in_with_code(&self.config.phone_number, &code)
            .await?
        {
            SignIn::Authorized => Ok(()),
            SignIn::PasswordRequired => {
                info!("two-step verification is enabled");
                let password_callback = self
                    .twofa_password_callback
                    .lock()
                    .unwrap()
                    .clone()
                    .ok_or_else(|| {
                        Error::configuration(
                            "no twofa_password_callback provided for receiving the password",
                        )
                    })?;
                self.set_state(SessionState::AwaitingTwoFactor);
                let password = password_callback().await?;
                self.transport.sign_in_with_password(&password).await
            }
        }
    }

    /// Disconnects if connected; a no-op otherwise.  Cancels every pending
    /// paced operation, which then fails with [`Error::SessionClosed`].
    pub async fn stop(&self) -> Result<()> {
        self.cancel.lock().unwrap().cancel();
        if self.transport.is_connected() {
            self.transport.disconnect().await?;
            info!("session stopped");
        } else {
            debug!("session was not connected");
        }
        self.set_state(SessionState::Disconnected);
        Ok(())
    }

    /// Returns a token cancelled when this session stops.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.lock().unwrap().clone()
    }

    /// Sleeps for `duration`, aborting with [`Error::SessionClosed`] if the
    /// session stops first.  Every deliberate pacing sleep routes through
    /// here.
    pub async fn pace(&self, duration: Duration) -> Result<()> {
        let cancel = self.cancellation_token();
        tokio::select! {
            _ = cancel.cancelled() => Err(Error::session_closed("pacing sleep aborted")),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    fn guard(&self) -> Result<()> {
        if self.cancellation_token().is_cancelled() {
            return Err(Error::session_closed("session has been stopped"));
        }
        if self.state() != SessionState::Authorized {
            return Err(Error::session_closed("session is not authorized"));
        }
        Ok(())
    }

    /// Resolves a recipient identifier to an addressable peer.
    pub async fn resolve_peer(&self, identifier: &RecipientId) -> Result<Peer> {
        self.guard()?;
        self.transport.resolve_peer(identifier).await
    }

    /// Fetches the member record for a user peer.
    pub async fn user_record(&self, peer: &Peer) -> Result<Member> {
        self.guard()?;
        self.transport.user_record(peer).await
    }

    /// Sends a message to a peer.
    pub async fn send_message(&self, peer: &Peer, text: &str) -> Result<()> {
        self.guard()?;
        self.transport.send_message(peer, text).await
    }

    /// Sends a threaded reply to an earlier message.
    pub async fn reply_to(&self, peer: &Peer, message_id: i64, text: &str) -> Result<()> {
        self.guard()?;
        self.transport.reply_to(peer, message_id, text).await
    }

    /// Signals the typing indicator to a peer.
    pub async fn set_typing(&self, peer: &Peer) -> Result<()> {
        self.guard()?;
        self.transport.set_typing(peer).await
    }

    /// Returns up to `limit` most recent messages for a peer, newest first.
    pub async fn recent_messages(&self, peer: &Peer, limit: usize) -> Result<Vec<HistoryMessage>> {
        self.guard()?;
        self.transport.recent_messages(peer, limit).await
    }

    /// Acknowledges messages up to and including `message_id` as read.
    pub async fn mark_read(&self, peer: &Peer, message_id: i64) -> Result<()> {
        self.guard()?;
        self.transport.mark_read(peer, message_id).await
    }

    /// Subscribes to new incoming messages.
    pub async fn incoming_messages(&self) -> Result<BoxStream<'static, IncomingMessage>> {
        self.guard()?;
        self.transport.incoming_messages().await
    }

    /// Fetches one page of a channel's participant list.
    pub async fn participants(
        &self,
        chat: &Peer,
        filter: &ParticipantFilter,
        offset: usize,
        limit: usize,
    ) -> Result<ParticipantPage> {
        self.guard()?;
        self.transport.participants(chat, filter, offset, limit).await
    }

    /// Lists up to `limit` dialogs.
    pub async fn dialogs(&self, limit: usize) -> Result<Vec<Dialog>> {
        self.guard()?;
        self.transport.dialogs(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverTransport;

    #[async_trait::async_trait]
    impl ChatTransport for NeverTransport {
        async fn connect(&self) -> Result<()> {
            unreachable!("construction must fail before any network activity")
        }
        async fn disconnect(&self) -> Result<()> {
            Ok(())
        }
        fn is_connected(&self) -> bool {
            false
        }
        async fn is_authorized(&self) -> Result<bool> {
            unreachable!()
        }
        async fn request_login_code(&self, _: &str) -> Result<()> {
            unreachable!()
        }
        async fn sign_in_with_code(&self, _: &str, _: &str) -> Result<SignIn> {
            unreachable!()
        }
        async fn sign_in_with_password(&self, _: &str) -> Result<()> {
            unreachable!()
        }
        async fn resolve_peer(&self, _: &RecipientId) -> Result<Peer> {
            unreachable!()
        }
        async fn user_record(&self, _: &Peer) -> Result<Member> {
            unreachable!()
        }
        async fn send_message(&self, _: &Peer, _: &str) -> Result<()> {
            unreachable!()
        }
        async fn reply_to(&self, _: &Peer, _: i64, _: &str) -> Result<()> {
            unreachable!()
        }
        async fn set_typing(&self, _: &Peer) -> Result<()> {
            unreachable!()
        }
        async fn recent_messages(&self, _: &Peer, _: usize) -> Result<Vec<HistoryMessage>> {
            unreachable!()
        }
        async fn mark_read(&self, _: &Peer, _: i64) -> Result<()> {
            unreachable!()
        }
        async fn incoming_messages(&self) -> Result<BoxStream<'static, IncomingMessage>> {
            unreachable!()
        }
        async fn participants(
            &self,
            _: &Peer,
            _: &ParticipantFilter,
            _: usize,
            _: usize,
        ) -> Result<ParticipantPage> {
            unreachable!()
        }
        async fn dialogs(&self, _: usize) -> Result<Vec<Dialog>> {
            unreachable!()
        }
    }

    #[test]
    fn construction_validates_config() {
        let config = SessionConfig::new("s", 1, "h", "1234567890");
        let err = Session::new(Arc::new(config), Arc::new(NeverTransport)).unwrap_err();
        assert!(err.is_invalid_config());
    }

    #[test]
    fn new_session_starts_disconnected() {
        let config = SessionConfig::new("s", 1, "h", "+1234567890");
        let session = Session::new(Arc::new(config), Arc::new(NeverTransport)).unwrap();
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn primitives_require_authorization() {
        let config = SessionConfig::new("s", 1, "h", "+1234567890");
        let session = Session::new(Arc::new(config), Arc::new(NeverTransport)).unwrap();
        let err = session
            .resolve_peer(&RecipientId::from("@nobody"))
            .await
            .unwrap_err();
        assert!(err.is_session_closed());
    }

    #[tokio::test]
    async fn stop_cancels_pacing_sleeps() {
        let config = SessionConfig::new("s", 1, "h", "+1234567890");
        let session =
            Arc::new(Session::new(Arc::new(config), Arc::new(NeverTransport)).unwrap());
        let sleeper = Arc::clone(&session);
        let handle =
            tokio::spawn(async move { sleeper.pace(Duration::from_secs(3600)).await });
        tokio::task::yield_now().await;
        session.stop().await.unwrap();
        let err = handle.await.unwrap().unwrap_err();
        assert!(err.is_session_closed());
    }
}
