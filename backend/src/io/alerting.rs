//! Operational side channels: internal-failure alerting and post-mutation
//! notification dispatch.
//!
//! Both are fire-and-forget boundaries. The real transports (an ops webhook,
//! a push service) live outside this repository; the default implementations
//! emit structured logs so nothing here can block or fail a response.

use std::sync::Arc;

use tracing::{error, info};

/// Where internal failures are reported.
pub trait AlertSink: Send + Sync {
    fn report(&self, context: &str, detail: &str);
}

/// Default sink: structured error log.
#[derive(Clone, Default)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn report(&self, context: &str, detail: &str) {
        error!(context, detail, "internal failure reported to alert sink");
    }
}

/// Report an infrastructure failure. Never blocks, never alters the response.
pub fn report_failure(route: &str, err: &anyhow::Error) {
    LogAlertSink.report(route, &format!("{:#}", err));
}

/// Receives "something the user cares about happened" events after a
/// successful mutation, off the critical path.
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, user_id: i64, event: &str);
}

/// Default dispatcher: log only.
#[derive(Clone, Default)]
pub struct LogNotifier;

impl NotificationDispatcher for LogNotifier {
    fn dispatch(&self, user_id: i64, event: &str) {
        info!(user_id, event, "notification dispatched");
    }
}

pub type SharedNotifier = Arc<dyn NotificationDispatcher>;
