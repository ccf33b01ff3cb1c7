//! Batch outbound messaging.
//!
//! One recipient at a time: resolve, pace, transmit, throttle.  The batch
//! policy is continue-and-record — a recipient's failure is logged and
//! recorded in its [`DeliveryReport`] and the batch moves on.  Only a closed
//! session aborts the batch, since nothing further can succeed on it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::messenger::Messenger;
use crate::observability;
use crate::session::Session;
use crate::transport::RecipientId;

/// Rate-limit retries per recipient before the error is recorded.
const MAX_RATE_LIMIT_RETRIES: usize = 3;

/// Terminal status of one recipient's delivery.
#[derive(Debug)]
pub enum DeliveryStatus {
    /// Every chunk was transmitted.
    Sent {
        /// How many chunks the pacing engine produced.
        chunks: usize,
    },
    /// The recipient was not an addressable user; nothing was sent.
    Skipped {
        /// Why the recipient was skipped.
        reason: String,
    },
    /// The send failed after any retries.
    Failed {
        /// The terminal error.
        error: Error,
    },
}

/// Per-recipient outcome of a batch send.
#[derive(Debug)]
pub struct DeliveryReport {
    /// The recipient as supplied by the caller.
    pub recipient: RecipientId,
    /// What happened.
    pub status: DeliveryStatus,
}

impl DeliveryReport {
    /// Returns true if every chunk reached this recipient.
    pub fn is_sent(&self) -> bool {
        matches!(self.status, DeliveryStatus::Sent { .. })
    }
}

/// Sends one message to many recipients with humanized pacing.
pub struct Outbound {
    messenger: Messenger,
}

impl Outbound {
    /// Creates an outbound sender over `session`.
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            messenger: Messenger::new(session),
        }
    }

    /// Creates an outbound sender over an explicitly constructed messenger.
    pub fn with_messenger(messenger: Messenger) -> Self {
        Self { messenger }
    }

    /// Sends `message` to each recipient in order, sleeping `throttle`
    /// between recipients.
    ///
    /// Returns one [`DeliveryReport`] per recipient, in input order.
    ///
    /// # Errors
    ///
    /// Only [`Error::SessionClosed`] aborts the batch; every other failure
    /// is recorded in the corresponding report.
    pub async fn send_messages(
        &self,
        recipients: &[RecipientId],
        message: &str,
        throttle: Duration,
    ) -> Result<Vec<DeliveryReport>> {
        let mut reports = Vec::with_capacity(recipients.len());
        for (index, recipient) in recipients.iter().enumerate() {
            let status = match self.send_one(recipient, message).await {
                Ok(status) => status,
                Err(err) if err.is_session_closed() => return Err(err),
                Err(err) => {
                    error!(recipient = %recipient, "error sending message: {err}");
                    observability::RECIPIENTS_FAILED.click();
                    DeliveryStatus::Failed { error: err }
                }
            };
            reports.push(DeliveryReport {
                recipient: recipient.clone(),
                status,
            });
            if index + 1 < recipients.len() && throttle > Duration::ZERO {
                self.messenger.session().pace(throttle).await?;
            }
        }
        Ok(reports)
    }

    async fn send_one(&self, recipient: &RecipientId, message: &str) -> Result<DeliveryStatus> {
        let session = self.messenger.session();
        let peer = match session.resolve_peer(recipient).await {
            Ok(peer) => peer,
            Err(err) if err.is_session_closed() => return Err(err),
            Err(err) if err.is_recipient_invalid() || err.is_chat_not_found() => {
                warn!(recipient = %recipient, "skipping unresolvable recipient: {err}");
                observability::RECIPIENTS_SKIPPED.click();
                return Ok(DeliveryStatus::Skipped {
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        };
        if !peer.is_user() {
            warn!(recipient = %recipient, kind = ?peer.kind, "skipping invalid recipient");
            observability::RECIPIENTS_SKIPPED.click();
            return Ok(DeliveryStatus::Skipped {
                reason: format!("peer {} is {:?}, not a user", peer.id, peer.kind),
            });
        }

        // The plan is computed once; a rate-limit retry resumes the same
        // chunk sequence rather than re-chunking.
        let plan = self.messenger.engine().plan(message);
        let mut rate_limit_retries = 0;
        let mut index = 0;
        while index < plan.chunks.len() {
            match self
                .messenger
                .send_chunk(&peer, &plan.chunks[index], None)
                .await
            {
                Ok(()) => index += 1,
                Err(err) if err.is_session_closed() => return Err(err),
                Err(Error::RateLimited {
                    retry_after_secs, ..
                }) if rate_limit_retries < MAX_RATE_LIMIT_RETRIES => {
                    rate_limit_retries += 1;
                    warn!(
                        recipient = %recipient,
                        wait = retry_after_secs,
                        attempt = rate_limit_retries,
                        "rate limited, waiting before retry"
                    );
                    observability::RATE_LIMIT_WAITS.click();
                    observability::RATE_LIMIT_WAIT_SECONDS.add(retry_after_secs as f64);
                    session.pace(Duration::from_secs(retry_after_secs)).await?;
                }
                Err(err) => return Err(err),
            }
        }
        info!(recipient = %recipient, chunks = plan.len(), "message sent");
        observability::RECIPIENTS_REACHED.click();
        Ok(DeliveryStatus::Sent { chunks: plan.len() })
    }
}
