//! WebSocket client for the gateway event stream.
//!
//! The client is receive-only: the gateway pushes one frame per event, and
//! every outbound call goes through the HTTP API instead.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};
use url::Url;

use ranni_core::{TransportError, TransportResult};

use crate::query::with_access_token;
use crate::state::ConnectionState;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// How long to wait for the peer to acknowledge a close frame.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Receives frames from a [`WsConnection`].
///
/// `on_frame` is called from the read loop and must not block; implementations
/// hand the frame off to their own task.
pub trait FrameHandler: Send + Sync + 'static {
    /// Called for every text or binary frame, in arrival order.
    fn on_frame(&self, frame: Vec<u8>);

    /// Called once when the read loop ends.
    fn on_disconnect(&self, _reason: &str) {}
}

/// Connects to the gateway event stream.
pub struct WsClient {
    url: Url,
    state: watch::Sender<ConnectionState>,
}

impl WsClient {
    /// Creates a client for `address`.
    ///
    /// A bare `host:port` address gets the `ws://` scheme. The access token,
    /// when present, is appended as the `access_token` query parameter.
    pub fn new(address: &str, access_token: Option<&str>) -> TransportResult<Self> {
        let url = parse_ws_url(address)?;
        let url = with_access_token(url, access_token);
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Ok(Self { url, state })
    }

    /// Returns a receiver that observes connection state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Opens the stream.
    pub async fn connect(&self) -> TransportResult<WsConnection> {
        let display_url = redacted(&self.url);
        self.state.send_replace(ConnectionState::Connecting);
        info!(url = %display_url, "Connecting to gateway");

        let (ws_stream, _response) = match connect_async(self.url.as_str()).await {
            Ok(conn) => conn,
            Err(e) => {
                self.state.send_replace(ConnectionState::Disconnected);
                return Err(TransportError::ConnectionFailed {
                    url: display_url,
                    reason: format!("WebSocket connection failed: {e}"),
                });
            }
        };

        self.state.send_replace(ConnectionState::Connected);
        info!(url = %display_url, "Gateway connected");

        let (sink, source) = ws_stream.split();
        Ok(WsConnection {
            sink,
            source,
            url: display_url,
            state: self.state.clone(),
        })
    }
}

/// An open event stream.
pub struct WsConnection {
    sink: WsSink,
    source: WsSource,
    url: String,
    state: watch::Sender<ConnectionState>,
}

impl WsConnection {
    /// Runs the read loop until the peer closes, a read fails, or `shutdown`
    /// is cancelled.
    ///
    /// On shutdown a normal-closure frame is sent and the loop waits up to
    /// [`CLOSE_TIMEOUT`] for the peer to finish the handshake. There is no
    /// reconnect: once this returns the stream is gone.
    pub async fn run(mut self, handler: Arc<dyn FrameHandler>, shutdown: CancellationToken) {
        let reason = loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(url = %self.url, "Closing gateway connection");
                    self.state.send_replace(ConnectionState::Draining);
                    self.close_gracefully().await;
                    break "shutdown".to_string();
                }

                msg = self.source.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            trace!(len = text.len(), "Received text frame");
                            handler.on_frame(text.as_bytes().to_vec());
                        }
                        Some(Ok(Message::Binary(data))) => {
                            trace!(len = data.len(), "Received binary frame");
                            handler.on_frame(data.to_vec());
                        }
                        // tungstenite answers pings itself.
                        Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                        Some(Ok(Message::Close(frame))) => {
                            let reason = frame
                                .map(|f| f.reason.as_str().to_string())
                                .unwrap_or_else(|| "peer closed".to_string());
                            info!(url = %self.url, reason = %reason, "Gateway closed connection");
                            break reason;
                        }
                        Some(Err(e)) => {
                            warn!(url = %self.url, error = %e, "Gateway read failed");
                            break e.to_string();
                        }
                        None => {
                            info!(url = %self.url, "Gateway stream ended");
                            break "stream ended".to_string();
                        }
                    }
                }
            }
        };

        self.state.send_replace(ConnectionState::Disconnected);
        handler.on_disconnect(&reason);
    }

    async fn close_gracefully(&mut self) {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        };
        if let Err(e) = self.sink.send(Message::Close(Some(frame))).await {
            warn!(error = %e, "Failed to send close frame");
            return;
        }

        // Drain until the peer echoes the close or the stream ends.
        let drained = tokio::time::timeout(CLOSE_TIMEOUT, async {
            while let Some(msg) = self.source.next().await {
                if matches!(msg, Ok(Message::Close(_)) | Err(_)) {
                    break;
                }
            }
        })
        .await;

        if drained.is_err() {
            trace!("Peer did not acknowledge close in time");
        }
    }
}

/// Parses a stream address, defaulting to `ws://` for bare `host:port`.
pub fn parse_ws_url(address: &str) -> TransportResult<Url> {
    let candidate = if address.contains("://") {
        address.to_string()
    } else {
        format!("ws://{address}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| TransportError::InvalidConfig(format!("invalid stream address {address:?}: {e}")))?;

    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(TransportError::InvalidConfig(format!(
            "stream address must use ws or wss, got {other}"
        ))),
    }
}

fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}
