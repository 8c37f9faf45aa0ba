//! The robot engine.
//!
//! Owns the connection lifecycle: it opens the gateway event stream, hands
//! every frame to its own decode-and-dispatch task, and runs the cron jobs and
//! the optional REST front-end next to the read loop until shutdown.
//!
//! # Example
//!
//! ```rust,ignore
//! use ranni_runtime::{RobotEngine, config::load_config};
//!
//! let mut engine = RobotEngine::new(load_config()?)?;
//! engine.register(Ping);
//! engine.register_cron("0 0 8 * * *", |gateway| async move {
//!     let _ = gateway.send_to_group(123456, &"早上好".into()).await;
//! })?;
//! engine.run().await?;
//! ```
//!
//! ```text
//!  gateway ──ws──▶ WsConnection::run ──frame──▶ spawn(decode_frame ─▶ Dispatcher::dispatch)
//!     ▲                                                                    │
//!     └──────────────────────── http ◀── Gateway ◀── handlers ◀────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use ranni_core::decode_frame;
use ranni_framework::{Dispatcher, EventHandler, Gateway};
use ranni_transport::{ConnectionState, FrameHandler, HttpClient, WsClient};

use crate::config::{RanniConfig, validate_config};
use crate::error::RuntimeResult;
use crate::scheduler::{CronTask, Scheduler};

/// Cancels a running engine from outside.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    /// Closes the event stream gracefully. In-flight handler tasks keep running.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Connection, registry and background jobs of one bot.
pub struct RobotEngine {
    config: RanniConfig,
    dispatcher: Dispatcher,
    scheduler: Scheduler,
    ws: WsClient,
    gateway: Gateway,
    shutdown: CancellationToken,
}

impl RobotEngine {
    /// Validates `config` and prepares the clients. Nothing connects yet.
    pub fn new(config: RanniConfig) -> RuntimeResult<Self> {
        validate_config(&config)?;

        let token = config.gateway.access_token.as_deref();
        let ws = WsClient::new(&config.gateway.ws_url, token)?;
        let http = HttpClient::new(
            &config.gateway.callback_url,
            config.gateway.access_token.clone(),
            config.gateway.timeout(),
        )?;

        Ok(Self {
            config,
            dispatcher: Dispatcher::new(),
            scheduler: Scheduler::new(),
            ws,
            gateway: Gateway::new(Arc::new(http)),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &RanniConfig {
        &self.config
    }

    /// Registers a handler. Must happen before [`run`](Self::run).
    pub fn register<H: EventHandler>(&mut self, handler: H) -> &mut Self {
        self.dispatcher.register(handler);
        self
    }

    /// Registers a cron job; fails if `expr` does not parse.
    pub fn register_cron<F, Fut>(&mut self, expr: &str, job: F) -> RuntimeResult<&mut Self>
    where
        F: Fn(Gateway) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.scheduler.add(CronTask::new(expr, job)?);
        Ok(self)
    }

    /// The help notice built from every registered handler.
    pub fn help_notice(&self) -> &str {
        self.dispatcher.help_notice()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The outbound API, for sends that do not come from a handler.
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.ws.subscribe_state()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            token: self.shutdown.clone(),
        }
    }

    /// Connects and runs until Ctrl-C, a [`ShutdownHandle`], or the stream
    /// ending.
    ///
    /// A failed initial connection is returned as an error. Once connected,
    /// a read error or peer close ends the run with `Ok(())`; there is no
    /// reconnect.
    pub async fn run(self) -> RuntimeResult<()> {
        let Self {
            config,
            dispatcher,
            scheduler,
            ws,
            gateway,
            shutdown,
        } = self;

        info!(
            handlers = dispatcher.handler_count(),
            cron_jobs = scheduler.len(),
            "Starting robot engine"
        );

        let connection = ws.connect().await?;

        let signal = spawn_signal_listener(shutdown.clone());
        let cron = scheduler.start(&gateway, &shutdown);

        #[cfg(feature = "api-server")]
        let api = match config.api.listen_addr.as_deref() {
            Some(addr) => {
                match crate::api_server::start(addr, gateway.clone(), shutdown.clone()).await {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        error!(addr, error = %e, "Failed to start REST front-end");
                        None
                    }
                }
            }
            None => None,
        };
        #[cfg(not(feature = "api-server"))]
        {
            if config.api.listen_addr.is_some() {
                warn!("api.listen_addr is set but the api-server feature is disabled");
            }
        }

        let pump = Arc::new(EventPump {
            dispatcher: Arc::new(dispatcher),
            gateway,
        });
        connection.run(pump, shutdown.clone()).await;

        // The stream is gone; stop everything that hangs off the same token.
        shutdown.cancel();
        for task in cron {
            if let Err(e) = task.await {
                warn!(error = %e, "Cron task ended abnormally");
            }
        }
        #[cfg(feature = "api-server")]
        {
            if let Some(api) = api {
                api.join().await;
            }
        }
        signal.abort();

        info!("Robot engine stopped");
        Ok(())
    }
}

impl std::fmt::Debug for RobotEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotEngine")
            .field("ws_url", &self.config.gateway.ws_url)
            .field("dispatcher", &self.dispatcher)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

fn spawn_signal_listener(shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => {
                    info!("Interrupt received, shutting down");
                    shutdown.cancel();
                }
                Err(e) => error!(error = %e, "Failed to listen for Ctrl-C"),
            },
            _ = shutdown.cancelled() => {}
        }
    })
}

/// Bridges the read loop to the dispatcher. Each frame gets its own task, so
/// a slow decode never holds up the next frame.
struct EventPump {
    dispatcher: Arc<Dispatcher>,
    gateway: Gateway,
}

impl FrameHandler for EventPump {
    fn on_frame(&self, frame: Vec<u8>) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let gateway = self.gateway.clone();
        tokio::spawn(async move {
            match decode_frame(&frame) {
                Ok(Some(event)) => {
                    dispatcher.dispatch(Arc::new(event), gateway);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Dropped undecodable frame"),
            }
        });
    }

    fn on_disconnect(&self, reason: &str) {
        debug!(reason, "Event stream closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use futures::{SinkExt, StreamExt};
    use ranni_core::{EventType, TransportError};
    use ranni_framework::handler_fn;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    fn config_for(ws_url: String) -> RanniConfig {
        let mut config = RanniConfig::default();
        config.gateway.ws_url = ws_url;
        config
    }

    fn private_frame(text: &str) -> String {
        json!({
            "post_type": "message",
            "message_type": "private",
            "time": 1700000000,
            "self_id": 10000,
            "message_id": 1,
            "user_id": 7,
            "sender": {"user_id": 7, "nickname": "tester"},
            "message": [{"type": "text", "data": {"text": text}}]
        })
        .to_string()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = RanniConfig::default();
        config.gateway.callback_url = "not a url".into();
        assert!(matches!(
            RobotEngine::new(config),
            Err(RuntimeError::Config(_))
        ));
    }

    #[test]
    fn registration_builds_help_notice() {
        let mut engine = RobotEngine::new(RanniConfig::default()).unwrap();
        engine
            .register(handler_fn("/ping - pong", |_| true, |_ctx| async {}))
            .register(handler_fn("/echo - echo", |_| true, |_ctx| async {}));
        assert_eq!(engine.dispatcher().handler_count(), 2);
        assert_eq!(engine.help_notice(), "使 用 指 南\n\n/ping - pong\n/echo - echo");
    }

    #[test]
    fn bad_cron_expression_fails_registration() {
        let mut engine = RobotEngine::new(RanniConfig::default()).unwrap();
        let err = engine
            .register_cron("not cron", |_gateway| async {})
            .err()
            .unwrap();
        assert!(matches!(err, RuntimeError::InvalidCron { .. }));
    }

    #[tokio::test]
    async fn failed_connection_is_fatal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let engine = RobotEngine::new(config_for(addr.to_string())).unwrap();
        let err = engine.run().await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Transport(TransportError::ConnectionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn frames_reach_handlers_until_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let gateway_side = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(WsMessage::text(r#"{"post_type":"meta_event"}"#))
                .await
                .unwrap();
            ws.send(WsMessage::text("not json")).await.unwrap();
            ws.send(WsMessage::text(private_frame("ping"))).await.unwrap();
            // Reading past the engine's close frame sends the reply.
            while let Some(Ok(_)) = ws.next().await {}
        });

        let (tx, mut rx) = mpsc::unbounded_channel();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let mut engine = RobotEngine::new(config_for(addr.to_string())).unwrap();
        engine.register(handler_fn(
            "",
            |_| true,
            move |_ctx| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            },
        ));
        engine.register(handler_fn(
            "",
            |ctx| ctx.plain_text() == "ping",
            move |ctx| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send((ctx.event_type(), ctx.subject_id()));
                }
            },
        ));

        let mut state = engine.subscribe_state();
        let handle = engine.shutdown_handle();
        let run = tokio::spawn(engine.run());

        let seen = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seen, (EventType::Private, 7));
        assert_eq!(*state.borrow_and_update(), ConnectionState::Connected);

        handle.shutdown();
        assert!(handle.is_shutdown());
        tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(*state.borrow(), ConnectionState::Disconnected);
        gateway_side.await.unwrap();
        // Only the message frame is dispatched; meta events and garbage are not.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
