//! Event dispatcher.
//!
//! The [`Dispatcher`] owns the registered handlers and fans every event out to
//! them:
//!
//! 1. A fresh [`EventContext`] is built for the event
//! 2. Every handler's filter is checked against it, in registration order
//! 3. Each handler whose filter passed gets its own task
//!
//! Handler tasks run concurrently with each other and with later dispatches.
//! Nothing waits for them; there is no ordering between handlers of one event.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{Instrument, Level, debug, span};

use ranni_core::Event;

use crate::context::EventContext;
use crate::gateway::Gateway;
use crate::handler::{BoxedHandler, EventHandler};

/// First line of the help notice.
pub const HELP_HEADER: &str = "使 用 指 南\n";

/// The registry of handlers and the fan-out over them.
///
/// Registration is expected to finish before the first dispatch.
#[derive(Default, Clone)]
pub struct Dispatcher {
    handlers: Vec<BoxedHandler>,
    help_notice: String,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler and appends its help text to the help notice.
    pub fn register<H: EventHandler>(&mut self, handler: H) {
        self.register_boxed(Arc::new(handler));
    }

    /// Registers an already shared handler.
    pub fn register_boxed(&mut self, handler: BoxedHandler) {
        if self.help_notice.is_empty() {
            self.help_notice.push_str(HELP_HEADER);
        }
        self.help_notice.push('\n');
        self.help_notice.push_str(handler.help());
        self.handlers.push(handler);
    }

    /// Registers a handler (builder pattern).
    pub fn with<H: EventHandler>(mut self, handler: H) -> Self {
        self.register(handler);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// The usage notice assembled from every handler's help text.
    ///
    /// Empty until the first registration.
    pub fn help_notice(&self) -> &str {
        &self.help_notice
    }

    /// Dispatches one event.
    ///
    /// Returns the handles of the spawned handler tasks; dropping them does
    /// not cancel the tasks.
    pub fn dispatch(&self, event: Arc<Event>, gateway: Gateway) -> Vec<JoinHandle<()>> {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            event_type = %event.event_type(),
            subject_id = event.subject_id(),
        );
        let _enter = span.enter();

        let ctx = Arc::new(EventContext::new(event, gateway));

        let tasks: Vec<_> = self
            .handlers
            .iter()
            .filter(|handler| handler.filter(&ctx))
            .map(|handler| {
                let handler = Arc::clone(handler);
                let ctx = Arc::clone(&ctx);
                tokio::spawn(async move { handler.handle(ctx).await }.instrument(span.clone()))
            })
            .collect();

        debug!(matched = tasks.len(), registered = self.handlers.len(), "Event dispatched");
        tasks
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handler_count", &self.handlers.len())
            .finish()
    }
}
