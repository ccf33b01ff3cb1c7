use biometrics::{Collector, Counter, Moments};

pub(crate) static SESSION_STARTS: Counter = Counter::new("banter.session.starts");
pub(crate) static SESSION_AUTH_FAILURES: Counter = Counter::new("banter.session.auth_failures");

pub(crate) static CHUNKS_SENT: Counter = Counter::new("banter.messenger.chunks_sent");
pub(crate) static RECIPIENTS_REACHED: Counter = Counter::new("banter.outbound.recipients_reached");
pub(crate) static RECIPIENTS_SKIPPED: Counter = Counter::new("banter.outbound.recipients_skipped");
pub(crate) static RECIPIENTS_FAILED: Counter = Counter::new("banter.outbound.recipients_failed");
pub(crate) static RATE_LIMIT_WAITS: Counter = Counter::new("banter.outbound.rate_limit_waits");
pub(crate) static RATE_LIMIT_WAIT_SECONDS: Moments =
    Moments::new("banter.outbound.rate_limit_wait_seconds");

pub(crate) static INBOUND_MESSAGES: Counter = Counter::new("banter.inbound.messages");
pub(crate) static INBOUND_HANDLER_ERRORS: Counter = Counter::new("banter.inbound.handler_errors");
pub(crate) static READ_DELAY_SECONDS: Moments = Moments::new("banter.inbound.read_delay_seconds");

pub(crate) static ROSTER_PAGES: Counter = Counter::new("banter.roster.pages");
pub(crate) static ROSTER_SUBDIVISIONS: Counter = Counter::new("banter.roster.subdivisions");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&SESSION_STARTS);
    collector.register_counter(&SESSION_AUTH_FAILURES);

    collector.register_counter(&CHUNKS_SENT);
    collector.register_counter(&RECIPIENTS_REACHED);
    collector.register_counter(&RECIPIENTS_SKIPPED);
    collector.register_counter(&RECIPIENTS_FAILED);
    collector.register_counter(&RATE_LIMIT_WAITS);
    collector.register_moments(&RATE_LIMIT_WAIT_SECONDS);

    collector.register_counter(&INBOUND_MESSAGES);
    collector.register_counter(&INBOUND_HANDLER_ERRORS);
    collector.register_moments(&READ_DELAY_SECONDS);

    collector.register_counter(&ROSTER_PAGES);
    collector.register_counter(&ROSTER_SUBDIVISIONS);
}
