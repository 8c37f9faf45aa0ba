//! Event handlers.
//!
//! A handler decides whether it wants an event ([`EventHandler::filter`]),
//! acts on it ([`EventHandler::handle`]) and describes itself for the help
//! notice ([`EventHandler::help`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use ranni_framework::{EventContext, EventHandler};
//!
//! struct Ping;
//!
//! #[async_trait::async_trait]
//! impl EventHandler for Ping {
//!     fn filter(&self, ctx: &EventContext) -> bool {
//!         ctx.plain_text() == "ping"
//!     }
//!
//!     async fn handle(&self, ctx: Arc<EventContext>) {
//!         let _ = ctx.send_text("pong").await;
//!     }
//!
//!     fn help(&self) -> &str {
//!         "ping: replies pong"
//!     }
//! }
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::EventContext;

/// The capability set every registered handler exposes.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Decides whether this handler takes part in the dispatch.
    fn filter(&self, _ctx: &EventContext) -> bool {
        true
    }

    /// The handler body.
    async fn handle(&self, ctx: Arc<EventContext>);

    /// One entry of the help notice.
    fn help(&self) -> &str {
        ""
    }
}

/// A shared, type-erased handler.
pub type BoxedHandler = Arc<dyn EventHandler>;

// ============================================================================
// Closure handlers
// ============================================================================

/// A handler assembled from a filter closure and an async action.
pub struct FnHandler<P, A, Fut> {
    help: String,
    filter: P,
    action: A,
    _marker: PhantomData<fn() -> Fut>,
}

/// Builds a handler from closures.
///
/// ```rust,ignore
/// let echo = handler_fn("echo <text>", |ctx| ctx.plain_text().starts_with("echo "), |ctx| async move {
///     let text = ctx.plain_text()["echo ".len()..].to_string();
///     let _ = ctx.send_text(text).await;
/// });
/// ```
pub fn handler_fn<P, A, Fut>(help: impl Into<String>, filter: P, action: A) -> FnHandler<P, A, Fut>
where
    P: Fn(&EventContext) -> bool + Send + Sync + 'static,
    A: Fn(Arc<EventContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    FnHandler {
        help: help.into(),
        filter,
        action,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<P, A, Fut> EventHandler for FnHandler<P, A, Fut>
where
    P: Fn(&EventContext) -> bool + Send + Sync + 'static,
    A: Fn(Arc<EventContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn filter(&self, ctx: &EventContext) -> bool {
        (self.filter)(ctx)
    }

    async fn handle(&self, ctx: Arc<EventContext>) {
        (self.action)(ctx).await;
    }

    fn help(&self) -> &str {
        &self.help
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Common filter predicates.
pub mod filters {
    use ranni_core::EventType;

    use crate::context::EventContext;

    pub fn group_only(ctx: &EventContext) -> bool {
        ctx.event_type() == EventType::Group
    }

    pub fn private_only(ctx: &EventContext) -> bool {
        ctx.event_type() == EventType::Private
    }

    /// Messages that mention the bot.
    pub fn to_me(ctx: &EventContext) -> bool {
        ctx.is_to_me()
    }

    /// Messages whose plain text starts with `prefix`.
    pub fn starts_with(prefix: &'static str) -> impl Fn(&EventContext) -> bool + Send + Sync {
        move |ctx| ctx.plain_text().starts_with(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{group_event, private_event};
    use crate::gateway::Gateway;
    use crate::gateway::testing::MockCaller;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx(event: Arc<ranni_core::Event>) -> EventContext {
        EventContext::new(event, Gateway::new(MockCaller::new()))
    }

    #[tokio::test]
    async fn fn_handler_delegates() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        let handler = handler_fn("count", filters::group_only, move |_ctx| {
            let c = Arc::clone(&counter_clone);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        assert_eq!(handler.help(), "count");
        let group = ctx(group_event(1, 2, "x".into()));
        assert!(handler.filter(&group));
        assert!(!handler.filter(&ctx(private_event(2, "x".into()))));

        handler.handle(Arc::new(group)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn starts_with_uses_plain_text() {
        let filter = filters::starts_with("/help");
        assert!(filter(&ctx(private_event(1, "  /help me".into()))));
        assert!(!filter(&ctx(private_event(1, "help".into()))));
    }
}
