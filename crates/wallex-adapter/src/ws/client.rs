/*
[INPUT]:  Base URL, market symbol, stream event and message callback
[OUTPUT]: Callback dispatch of broadcast payloads; one-shot snapshots
[POS]:    WebSocket layer - socket.io subscription channel
[UPDATE]: When changing the connect/subscribe/disconnect lifecycle
*/

use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::http::client::truncate_for_log;
use crate::http::error::require_non_empty;
use crate::http::{DEFAULT_BASE_URL, Result, WallexError};
use crate::ws::message::{ChannelEvent, ChannelName, ChannelState, DisconnectReason, StreamEvent};
use crate::ws::packet::{CONNECT_FRAME, DISCONNECT_FRAME, EnginePacket, SocketPacket, event_frame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SOCKET_IO_PATH: &str = "socket.io/";
const SOCKET_IO_QUERY: &str = "EIO=4&transport=websocket";
const SUBSCRIBE_EVENT: &str = "subscribe";
const BROADCAST_EVENT: &str = "Broadcaster";
const CLOSE_GRACE: Duration = Duration::from_secs(5);
const RAW_LOG_MAX_BYTES: usize = 512;

/// Error a callback may return; it is logged and reported, never propagated
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;
pub type CallbackResult = std::result::Result<(), CallbackError>;
pub type MessageCallback = Box<dyn FnMut(Value) -> CallbackResult + Send + 'static>;

/// Subscription channel configuration
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub base_url: String,
    /// Disconnect right after the first delivered message
    pub once: bool,
    /// Bound on socket open + socket.io handshake; `None` waits forever
    pub connect_timeout: Option<Duration>,
    /// Bound on the accessors' wait for a first message; `None` waits forever
    pub message_timeout: Option<Duration>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            once: true,
            connect_timeout: Some(Duration::from_secs(10)),
            message_timeout: Some(Duration::from_secs(60)),
        }
    }
}

/// State shared between the channel handle and its dispatch task
struct Shared {
    state: watch::Sender<ChannelState>,
    latest_data: Mutex<Option<Value>>,
    observer: Option<mpsc::UnboundedSender<ChannelEvent>>,
}

impl Shared {
    fn set_state(&self, state: ChannelState) {
        self.state.send_replace(state);
    }

    fn emit(&self, event: ChannelEvent) {
        if let Some(observer) = &self.observer {
            let _ = observer.send(event);
        }
    }

    fn store_latest(&self, payload: &Value) {
        let mut guard = self.latest_data.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(payload.clone());
    }

    /// Transition to Disconnected; only the first call per connection reports it.
    fn mark_disconnected(&self, reason: DisconnectReason) {
        let previous = self.state.send_replace(ChannelState::Disconnected);
        if previous == ChannelState::Disconnected {
            return;
        }
        info!(reason = ?reason, "ws channel disconnected");
        self.emit(ChannelEvent::Disconnected { reason });
    }
}

struct Connection {
    close_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

/// Socket.io subscription channel for one Wallex broadcast topic.
///
/// Holds at most one subscription. In one-shot mode (the default) the
/// connection is closed right after the first matching message is delivered.
pub struct SubscriptionChannel {
    config: ChannelConfig,
    shared: Arc<Shared>,
    channel: Option<ChannelName>,
    connection: Option<Connection>,
    cancel: CancellationToken,
}

impl SubscriptionChannel {
    pub fn new(config: ChannelConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a channel that reports lifecycle and callback failures
    pub fn with_observer(config: ChannelConfig) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::build(config, Some(tx)), rx)
    }

    fn build(config: ChannelConfig, observer: Option<mpsc::UnboundedSender<ChannelEvent>>) -> Self {
        let (state, _) = watch::channel(ChannelState::Idle);
        Self {
            config,
            shared: Arc::new(Shared {
                state,
                latest_data: Mutex::new(None),
                observer,
            }),
            channel: None,
            connection: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the token that aborts connect and first-message waits
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn state(&self) -> ChannelState {
        *self.shared.state.borrow()
    }

    /// Receiver that observes every state transition
    pub fn state_changes(&self) -> watch::Receiver<ChannelState> {
        self.shared.state.subscribe()
    }

    /// Channel name of the current (or last) subscription
    pub fn channel(&self) -> Option<&ChannelName> {
        self.channel.as_ref()
    }

    /// Most recent payload delivered on this instance
    pub fn latest_data(&self) -> Option<Value> {
        self.shared
            .latest_data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bind `callback` to `{symbol}{event}` and connect.
    ///
    /// Returns once the subscribe message has been sent. Any previous
    /// subscription is dropped with its connection; no unsubscribe is sent.
    pub async fn subscribe<F>(
        &mut self,
        symbol: &str,
        event: StreamEvent,
        callback: F,
    ) -> Result<()>
    where
        F: FnMut(Value) -> CallbackResult + Send + 'static,
    {
        require_non_empty("symbol", symbol)?;
        let channel = ChannelName::new(symbol, event);
        self.subscribe_channel(channel, Box::new(callback)).await
    }

    async fn subscribe_channel(
        &mut self,
        channel: ChannelName,
        callback: MessageCallback,
    ) -> Result<()> {
        let url = socket_url(&self.config.base_url)?;

        if self.connection.is_some() {
            debug!(previous = ?self.channel, next = %channel, "replacing ws subscription");
            self.disconnect().await;
        }

        self.channel = Some(channel.clone());
        self.shared.set_state(ChannelState::Connecting);
        info!(url = %url, channel = %channel, "ws channel connecting");

        let mut stream = match bounded(
            &self.cancel,
            self.config.connect_timeout,
            "connect handshake",
            open_socket(url.clone()),
        )
        .await
        {
            Ok(stream) => stream,
            Err(err) => {
                self.report_connect_failure(&err);
                return Err(err);
            }
        };
        self.shared.emit(ChannelEvent::Connected {
            url: url.to_string(),
        });

        let frame = event_frame(SUBSCRIBE_EVENT, &[json!({ "channel": channel.as_str() })]);
        if let Err(err) = stream.send(text_frame(frame)).await {
            let err = WallexError::from(err);
            self.report_connect_failure(&err);
            return Err(err);
        }

        self.shared.set_state(ChannelState::Subscribed);
        self.shared.emit(ChannelEvent::Subscribed {
            channel: channel.clone(),
        });
        info!(channel = %channel, "ws subscription sent");

        let (close_tx, close_rx) = oneshot::channel();
        let task = tokio::spawn(run_dispatch(
            stream,
            channel,
            callback,
            self.config.once,
            self.shared.clone(),
            close_rx,
        ));
        self.connection = Some(Connection {
            close_tx: Some(close_tx),
            task,
        });

        Ok(())
    }

    fn report_connect_failure(&self, err: &WallexError) {
        warn!(error = %err, url = %self.config.base_url, "ws connect failed");
        self.shared.emit(ChannelEvent::ConnectFailed {
            message: err.to_string(),
        });
        self.shared.mark_disconnected(DisconnectReason::ConnectFailed);
    }

    /// Close the connection, if any, and wait for the dispatch task to end
    pub async fn disconnect(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };
        if let Some(close_tx) = connection.close_tx.take() {
            let _ = close_tx.send(());
        }
        if tokio::time::timeout(CLOSE_GRACE, &mut connection.task)
            .await
            .is_err()
        {
            warn!("ws dispatch task did not stop in time; aborting");
            connection.task.abort();
        }
        self.shared.mark_disconnected(DisconnectReason::Requested);
    }

    /// Wait until the current connection reaches Disconnected.
    ///
    /// Only the cancellation token bounds this wait.
    pub async fn wait_disconnected(&self) -> Result<()> {
        if self.connection.is_none() {
            return Ok(());
        }
        let mut changes = self.shared.state.subscribe();
        let cancel = self.cancel.clone();
        tokio::select! {
            _ = cancel.cancelled() => Err(WallexError::Cancelled),
            _ = changes.wait_for(|state| *state == ChannelState::Disconnected) => Ok(()),
        }
    }

    /// Snapshot of the `{symbol}@marketCap` feed
    pub async fn get_market_cap(&mut self, symbol: &str) -> Result<Value> {
        self.fetch_first(symbol, StreamEvent::MarketCap).await
    }

    /// Snapshot of the `{symbol}@buyDepth` feed
    pub async fn get_buy_depth(&mut self, symbol: &str) -> Result<Value> {
        self.fetch_first(symbol, StreamEvent::BuyDepth).await
    }

    /// Snapshot of the `{symbol}@sellDepth` feed
    pub async fn get_sell_depth(&mut self, symbol: &str) -> Result<Value> {
        self.fetch_first(symbol, StreamEvent::SellDepth).await
    }

    /// Snapshot of the `{symbol}@trade` feed
    pub async fn get_trade(&mut self, symbol: &str) -> Result<Value> {
        self.fetch_first(symbol, StreamEvent::Trade).await
    }

    /// Subscribe, wait for the first payload and return it.
    ///
    /// In one-shot mode this returns only after the connection is closed;
    /// otherwise the subscription keeps running and updating `latest_data`.
    async fn fetch_first(&mut self, symbol: &str, event: StreamEvent) -> Result<Value> {
        let (first_tx, first_rx) = oneshot::channel();
        let mut first_tx = Some(first_tx);
        self.subscribe(symbol, event, move |payload| {
            if let Some(tx) = first_tx.take() {
                let _ = tx.send(payload);
            }
            Ok(())
        })
        .await?;

        let waited = bounded(
            &self.cancel,
            self.config.message_timeout,
            "first message",
            async {
                first_rx.await.map_err(|_| {
                    WallexError::WebSocket("connection closed before first message".to_string())
                })
            },
        )
        .await;

        let payload = match waited {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, channel = ?self.channel, "ws first message not received");
                self.disconnect().await;
                return Err(err);
            }
        };

        if self.config.once {
            self.disconnect().await;
        }
        Ok(payload)
    }
}

impl std::fmt::Debug for SubscriptionChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionChannel")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("channel", &self.channel)
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

/// `https://host/` -> `wss://host/socket.io/?EIO=4&transport=websocket`
pub fn socket_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(WallexError::Config(format!(
                "unsupported scheme {other:?} for socket url"
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| WallexError::Config(format!("cannot use scheme {scheme} for {base_url}")))?;

    let path = format!("{}/{SOCKET_IO_PATH}", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_query(Some(SOCKET_IO_QUERY));
    Ok(url)
}

async fn bounded<T>(
    cancel: &CancellationToken,
    limit: Option<Duration>,
    waiting_for: &'static str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    let timed = async {
        match limit {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| WallexError::Timeout {
                    duration_ms: duration_ms(limit),
                    waiting_for,
                })?,
            None => fut.await,
        }
    };
    tokio::select! {
        _ = cancel.cancelled() => Err(WallexError::Cancelled),
        result = timed => result,
    }
}

fn duration_ms(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}

/// Open the websocket and complete the engine.io open + namespace connect.
async fn open_socket(url: Url) -> Result<WsStream> {
    let (mut stream, _response) = connect_async(url.as_str()).await?;
    let mut connect_sent = false;

    loop {
        let frame = stream.next().await.ok_or_else(|| {
            WallexError::WebSocket("connection closed during handshake".to_string())
        })??;
        let text = match frame {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => {
                return Err(WallexError::WebSocket(
                    "server closed connection during handshake".to_string(),
                ));
            }
            _ => continue,
        };

        match EnginePacket::parse(text.as_str())? {
            EnginePacket::Open(handshake) => {
                debug!(handshake = %handshake, "engine.io open");
                if !connect_sent {
                    stream.send(text_frame(CONNECT_FRAME)).await?;
                    connect_sent = true;
                }
            }
            EnginePacket::Ping(data) => {
                stream.send(text_frame(EnginePacket::pong_frame(&data))).await?;
            }
            EnginePacket::Message(SocketPacket::Connect(data)) => {
                debug!(data = %data, "socket.io namespace connected");
                return Ok(stream);
            }
            EnginePacket::Message(SocketPacket::ConnectError(data)) => {
                return Err(WallexError::Protocol(format!(
                    "socket.io connect refused: {data}"
                )));
            }
            EnginePacket::Close => {
                return Err(WallexError::WebSocket(
                    "engine.io closed during handshake".to_string(),
                ));
            }
            other => debug!(packet = ?other, "ignoring packet during handshake"),
        }
    }
}

fn text_frame(frame: impl Into<String>) -> WsMessage {
    WsMessage::Text(frame.into().into())
}

enum Flow {
    Continue,
    Delivered,
    ServerClosed,
}

async fn run_dispatch(
    mut stream: WsStream,
    channel: ChannelName,
    mut callback: MessageCallback,
    once: bool,
    shared: Arc<Shared>,
    mut close_rx: oneshot::Receiver<()>,
) {
    let reason = loop {
        tokio::select! {
            _ = &mut close_rx => {
                let _ = stream.send(text_frame(DISCONNECT_FRAME)).await;
                let _ = stream.close(None).await;
                break DisconnectReason::Requested;
            }
            incoming = stream.next() => {
                let text = match incoming {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Close(_))) | None => break DisconnectReason::ServerClosed,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => break DisconnectReason::Error(err.to_string()),
                };

                let flow = match EnginePacket::parse(text.as_str()) {
                    Ok(EnginePacket::Ping(data)) => {
                        let pong = EnginePacket::pong_frame(&data);
                        if let Err(err) = stream.send(text_frame(pong)).await {
                            break DisconnectReason::Error(err.to_string());
                        }
                        Flow::Continue
                    }
                    Ok(EnginePacket::Close)
                    | Ok(EnginePacket::Message(SocketPacket::Disconnect)) => Flow::ServerClosed,
                    Ok(EnginePacket::Message(SocketPacket::Event { name, args })) => {
                        dispatch_event(&name, args, &channel, &mut callback, &shared)
                    }
                    Ok(other) => {
                        debug!(packet = ?other, "ignoring ws packet");
                        Flow::Continue
                    }
                    Err(err) => {
                        debug!(
                            error = %err,
                            frame = %truncate_for_log(text.as_str(), RAW_LOG_MAX_BYTES),
                            "ws frame parse failed"
                        );
                        Flow::Continue
                    }
                };

                match flow {
                    Flow::Continue => {}
                    Flow::ServerClosed => break DisconnectReason::ServerClosed,
                    Flow::Delivered if once => {
                        let _ = stream.send(text_frame(DISCONNECT_FRAME)).await;
                        let _ = stream.close(None).await;
                        break DisconnectReason::OneShotComplete;
                    }
                    Flow::Delivered => {}
                }
            }
        }
    };

    shared.mark_disconnected(reason);
}

fn dispatch_event(
    name: &str,
    mut args: Vec<Value>,
    channel: &ChannelName,
    callback: &mut MessageCallback,
    shared: &Shared,
) -> Flow {
    if name != BROADCAST_EVENT {
        debug!(event = name, "ignoring socket.io event");
        return Flow::Continue;
    }

    // Broadcaster(channel, payload); a lone argument is an untagged payload.
    let payload = match args.len() {
        0 => return Flow::Continue,
        1 => args.remove(0),
        _ => {
            let tag = args.remove(0);
            if tag.as_str() != Some(channel.as_str()) {
                debug!(
                    expected = %channel,
                    received = %tag,
                    "ignoring broadcast for other channel"
                );
                return Flow::Continue;
            }
            args.remove(0)
        }
    };

    shared.store_latest(&payload);
    if *shared.state.borrow() != ChannelState::Delivering {
        shared.set_state(ChannelState::Delivering);
    }

    let outcome = catch_unwind(AssertUnwindSafe(|| callback(payload)));
    let failure = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err.to_string()),
        Err(panic) => Some(panic_message(panic.as_ref())),
    };
    if let Some(message) = failure {
        warn!(channel = %channel, error = %message, "ws callback failed");
        shared.emit(ChannelEvent::CallbackFailed {
            channel: channel.clone(),
            message,
        });
    }

    Flow::Delivered
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("callback panicked: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("callback panicked: {message}")
    } else {
        "callback panicked".to_string()
    }
}
