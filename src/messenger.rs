//! Drives one pacing plan against one peer, in lockstep with the wire.
//!
//! A plan is consumed chunk by chunk: the typing indicator goes out
//! immediately before the burst sleeps it belongs to, the chunk is
//! transmitted, and the think time runs before the next chunk.  All sleeps
//! go through [`Session::pace`] so stopping the session aborts a delivery
//! mid-flight.

use std::sync::Arc;

use tracing::debug;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::observability;
use crate::pacing::{PacingEngine, PlannedChunk};
use crate::session::Session;
use crate::transport::Peer;

/// Sends paced, humanized message sequences to a single peer.
pub struct Messenger {
    session: Arc<Session>,
    engine: PacingEngine,
}

impl Messenger {
    /// Creates a messenger over `session` with the default pacing engine.
    pub fn new(session: Arc<Session>) -> Self {
        let engine = PacingEngine::new(Arc::clone(session.config()));
        Self { session, engine }
    }

    /// Creates a messenger with an explicitly constructed engine.
    pub fn with_engine(session: Arc<Session>, engine: PacingEngine) -> Self {
        Self { session, engine }
    }

    /// Returns the pacing engine.
    pub fn engine(&self) -> &PacingEngine {
        &self.engine
    }

    /// Returns the session.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn config(&self) -> &SessionConfig {
        self.session.config()
    }

    /// Acts out and transmits one planned chunk.
    ///
    /// With `reply_to`, the chunk is sent as a threaded reply.  A failed
    /// transmit leaves the chunk unsent and may be retried with the same
    /// chunk; the caller owns retry policy.
    pub async fn send_chunk(
        &self,
        peer: &Peer,
        chunk: &PlannedChunk,
        reply_to: Option<i64>,
    ) -> Result<()> {
        self.act_out_typing(peer, chunk).await?;
        match reply_to {
            Some(message_id) => self.session.reply_to(peer, message_id, &chunk.text).await?,
            None => self.session.send_message(peer, &chunk.text).await?,
        }
        observability::CHUNKS_SENT.click();
        debug!(peer = peer.id, "chunk transmitted");
        // Think time runs after every chunk, the final one included.
        self.session.pace(chunk.think_time).await
    }

    /// Delivers `text` to `peer` as a humanized message sequence.
    ///
    /// When `reply_to` is given, the first chunk is sent as a threaded reply
    /// to that message and the rest follow as plain messages.  Returns the
    /// number of chunks transmitted.
    pub async fn deliver(&self, peer: &Peer, text: &str, reply_to: Option<i64>) -> Result<usize> {
        let plan = self.engine.plan(text);
        for (index, chunk) in plan.chunks.iter().enumerate() {
            let threaded = if index == 0 { reply_to } else { None };
            self.send_chunk(peer, chunk, threaded).await?;
        }
        Ok(plan.len())
    }

    /// Walks one chunk's burst schedule: indicator (when enabled), per-word
    /// sleeps, inter-burst pauses.  The delays apply even with the indicator
    /// disabled; pacing is about cadence, not the indicator.
    async fn act_out_typing(&self, peer: &Peer, chunk: &PlannedChunk) -> Result<()> {
        for burst in &chunk.bursts {
            if self.config().set_typing {
                self.session.set_typing(peer).await?;
            }
            for delay in &burst.word_delays {
                self.session.pace(*delay).await?;
            }
            if let Some(pause) = burst.pause_after {
                self.session.pace(pause).await?;
            }
        }
        Ok(())
    }
}
