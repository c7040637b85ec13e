//! Realtime order feed client
//!
//! One underlying connection per handle; `connect()` is idempotent.
//! Consumers attach through reference-counted subscriptions and detaching
//! one never tears down the shared connection. A dropped connection is
//! retried a bounded number of times with an increasing, capped delay;
//! once attempts are exhausted the client stays disconnected until an
//! explicit `retry()`.

pub mod transport;

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use shared::message::{
    FeedEventKind, FeedMessage, HandshakePayload, PROTOCOL_VERSION, ROOM_DASHBOARD,
    StatusChangedPayload,
};
use shared::order::{Order, OrderStatus};
use transport::{MemoryTransport, TcpTransport, Transport};

/// Bounded reconnection budget after a drop.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(2);
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("feed disconnected")]
    Disconnected,
}

/// Connection lifecycle of the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Typed events delivered to subscribers, in transport arrival order.
#[derive(Debug, Clone)]
pub enum OrderFeedEvent {
    OrderCreated(Order),
    OrderStatusChanged {
        order_id: String,
        status: OrderStatus,
    },
}

impl OrderFeedEvent {
    /// Decode a wire message into a subscriber event. `None` for message
    /// kinds that are not pushes (handshake, room control).
    fn from_message(msg: &FeedMessage) -> Option<Result<Self, serde_json::Error>> {
        match msg.kind {
            FeedEventKind::OrderCreated => {
                Some(msg.decode_payload::<Order>().map(Self::OrderCreated))
            }
            FeedEventKind::OrderStatusChanged => Some(
                msg.decode_payload::<StatusChangedPayload>()
                    .map(|p| Self::OrderStatusChanged {
                        order_id: p.order_id,
                        status: p.status,
                    }),
            ),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct LinkState {
    state: ConnectionState,
    transport: Option<Arc<dyn Transport>>,
    /// Bumped on every attach so a stale read loop cannot tear down a
    /// newer connection.
    epoch: u64,
}

#[derive(Debug)]
struct FeedInner {
    addr: String,
    client_name: String,
    link: Mutex<LinkState>,
    event_tx: broadcast::Sender<OrderFeedEvent>,
    status_tx: watch::Sender<ConnectionState>,
    /// Rooms the consumer wants; re-joined after every successful
    /// (re)connect since the server forgets membership on drop.
    rooms: Mutex<HashSet<String>>,
    subscribers: AtomicUsize,
    /// Replaced with a fresh token when a closed client reconnects, so
    /// `close()` does not brick the handle.
    shutdown: Mutex<CancellationToken>,
}

impl FeedInner {
    fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.lock().unwrap().clone()
    }
}

/// Handle to the realtime order feed. Cheap to clone; clones share the
/// same underlying connection.
#[derive(Debug, Clone)]
pub struct FeedClient {
    inner: Arc<FeedInner>,
}

impl FeedClient {
    pub fn new(addr: impl Into<String>, client_name: impl Into<String>) -> Self {
        let (event_tx, _) = broadcast::channel(1024);
        let (status_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(FeedInner {
                addr: addr.into(),
                client_name: client_name.into(),
                link: Mutex::new(LinkState {
                    state: ConnectionState::Disconnected,
                    transport: None,
                    epoch: 0,
                }),
                event_tx,
                status_tx,
                rooms: Mutex::new(HashSet::new()),
                subscribers: AtomicUsize::new(0),
                shutdown: Mutex::new(CancellationToken::new()),
            }),
        }
    }

    /// Process-wide shared handle, lazily initialized on first use. The
    /// address of the first caller wins.
    pub fn shared(addr: &str) -> FeedClient {
        static SHARED: OnceLock<FeedClient> = OnceLock::new();
        SHARED
            .get_or_init(|| FeedClient::new(addr, "guava-client"))
            .clone()
    }

    /// Connect over TCP. Idempotent: a live or in-progress connection is
    /// reused.
    pub async fn connect(&self) -> Result<(), FeedError> {
        {
            let mut link = self.inner.link.lock().unwrap();
            match link.state {
                ConnectionState::Connected | ConnectionState::Connecting => return Ok(()),
                ConnectionState::Disconnected => link.state = ConnectionState::Connecting,
            }
        }
        {
            // A prior close() cancelled the token; new loops need a live one.
            let mut shutdown = self.inner.shutdown.lock().unwrap();
            if shutdown.is_cancelled() {
                *shutdown = CancellationToken::new();
            }
        }
        let _ = self.inner.status_tx.send(ConnectionState::Connecting);

        match Self::establish(&self.inner).await {
            Ok(()) => Ok(()),
            Err(e) => {
                {
                    let mut link = self.inner.link.lock().unwrap();
                    if link.transport.is_none() {
                        link.state = ConnectionState::Disconnected;
                    }
                }
                let _ = self.inner.status_tx.send(ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    /// Connect over an in-memory transport (in-process server or tests).
    pub async fn connect_memory(
        server_tx: &broadcast::Sender<FeedMessage>,
        client_tx: &broadcast::Sender<FeedMessage>,
        client_name: impl Into<String>,
    ) -> Result<Self, FeedError> {
        let client = Self::new(String::new(), client_name);
        let transport: Arc<dyn Transport> = Arc::new(MemoryTransport::new(server_tx, client_tx));
        transport
            .write_message(&FeedMessage::handshake(&Self::handshake_payload(
                &client.inner,
            )))
            .await?;
        Self::attach(&client.inner, transport).await;
        Ok(client)
    }

    /// Explicit retry after reconnect attempts were exhausted.
    pub async fn retry(&self) -> Result<(), FeedError> {
        self.connect().await
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.link.lock().unwrap().state
    }

    /// Watch connection state changes (for a UI indicator).
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.inner.status_tx.subscribe()
    }

    /// Join a logical room. Fire-and-forget; membership is tracked so the
    /// room is re-joined after a reconnect.
    pub async fn join(&self, room: &str) {
        self.inner.rooms.lock().unwrap().insert(room.to_string());
        if let Some(transport) = self.current_transport()
            && let Err(e) = transport.write_message(&FeedMessage::join_room(room)).await
        {
            tracing::warn!(room, error = %e, "Failed to send room join");
        }
    }

    /// Leave a logical room. Fire-and-forget.
    pub async fn leave(&self, room: &str) {
        self.inner.rooms.lock().unwrap().remove(room);
        if let Some(transport) = self.current_transport()
            && let Err(e) = transport.write_message(&FeedMessage::leave_room(room)).await
        {
            tracing::warn!(room, error = %e, "Failed to send room leave");
        }
    }

    pub async fn join_dashboard(&self) {
        self.join(ROOM_DASHBOARD).await;
    }

    pub async fn leave_dashboard(&self) {
        self.leave(ROOM_DASHBOARD).await;
    }

    /// Attach a consumer. Dropping the returned subscription detaches its
    /// handlers without touching the shared connection.
    pub fn subscribe(&self) -> FeedSubscription {
        self.inner.subscribers.fetch_add(1, Ordering::SeqCst);
        FeedSubscription {
            rx: self.inner.event_tx.subscribe(),
            inner: self.inner.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.load(Ordering::SeqCst)
    }

    /// Tear the connection down. Refused while consumers are still
    /// attached - no consumer may unilaterally disconnect the others.
    pub async fn close(&self) -> Result<(), FeedError> {
        let attached = self.subscriber_count();
        if attached > 0 {
            return Err(FeedError::Connection(format!(
                "{attached} subscribers still attached"
            )));
        }
        self.inner.shutdown.lock().unwrap().cancel();
        let transport = {
            let mut link = self.inner.link.lock().unwrap();
            link.state = ConnectionState::Disconnected;
            link.transport.take()
        };
        if let Some(transport) = transport {
            transport.close().await?;
        }
        let _ = self.inner.status_tx.send(ConnectionState::Disconnected);
        Ok(())
    }

    fn current_transport(&self) -> Option<Arc<dyn Transport>> {
        self.inner.link.lock().unwrap().transport.clone()
    }

    fn handshake_payload(inner: &FeedInner) -> HandshakePayload {
        HandshakePayload {
            version: PROTOCOL_VERSION,
            client_name: Some(inner.client_name.clone()),
            client_version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    async fn establish(inner: &Arc<FeedInner>) -> Result<(), FeedError> {
        let transport: Arc<dyn Transport> = Arc::new(TcpTransport::connect(&inner.addr).await?);
        transport
            .write_message(&FeedMessage::handshake(&Self::handshake_payload(inner)))
            .await?;
        Self::attach(inner, transport).await;
        Ok(())
    }

    async fn attach(inner: &Arc<FeedInner>, transport: Arc<dyn Transport>) {
        let epoch = {
            let mut link = inner.link.lock().unwrap();
            link.epoch += 1;
            link.transport = Some(transport.clone());
            link.state = ConnectionState::Connected;
            link.epoch
        };
        let _ = inner.status_tx.send(ConnectionState::Connected);

        let rooms: Vec<String> = inner.rooms.lock().unwrap().iter().cloned().collect();
        for room in rooms {
            if let Err(e) = transport.write_message(&FeedMessage::join_room(&room)).await {
                tracing::warn!(room, error = %e, "Failed to re-join room");
            }
        }

        Self::spawn_read_loop(inner.clone(), transport, epoch, inner.shutdown_token());
    }

    fn spawn_read_loop(
        inner: Arc<FeedInner>,
        transport: Arc<dyn Transport>,
        epoch: u64,
        cancel: CancellationToken,
    ) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    result = transport.read_message() => match result {
                        Ok(msg) => match OrderFeedEvent::from_message(&msg) {
                            Some(Ok(event)) => {
                                if inner.event_tx.send(event).is_err() {
                                    tracing::debug!("No feed subscribers for event");
                                }
                            }
                            Some(Err(e)) => {
                                tracing::warn!(kind = %msg.kind, error = %e, "Dropping undecodable feed payload");
                            }
                            None => {
                                tracing::debug!(kind = %msg.kind, "Ignoring non-push feed message");
                            }
                        },
                        Err(e) => {
                            tracing::warn!(error = %e, "Feed transport read failed");
                            Self::handle_drop(&inner, epoch, &cancel).await;
                            break;
                        }
                    }
                }
            }
        });
    }

    async fn handle_drop(inner: &Arc<FeedInner>, epoch: u64, cancel: &CancellationToken) {
        {
            let mut link = inner.link.lock().unwrap();
            // A newer connection is already live; this loop is stale.
            if link.epoch != epoch {
                return;
            }
            link.transport = None;
            link.state = ConnectionState::Connecting;
        }
        let _ = inner.status_tx.send(ConnectionState::Connecting);
        if cancel.is_cancelled() {
            inner.link.lock().unwrap().state = ConnectionState::Disconnected;
            let _ = inner.status_tx.send(ConnectionState::Disconnected);
            return;
        }
        Self::reconnect(inner.clone(), cancel.clone()).await;
    }

    async fn reconnect(inner: Arc<FeedInner>, cancel: CancellationToken) {
        for attempt in 1..=MAX_RECONNECT_ATTEMPTS {
            let delay = std::cmp::min(RECONNECT_BASE_DELAY * attempt, RECONNECT_MAX_DELAY);
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            tracing::info!(attempt, max = MAX_RECONNECT_ATTEMPTS, "Reconnecting order feed");
            match Self::establish(&inner).await {
                Ok(()) => {
                    tracing::info!("Order feed reconnected");
                    return;
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Reconnect attempt failed");
                }
            }
        }
        inner.link.lock().unwrap().state = ConnectionState::Disconnected;
        let _ = inner.status_tx.send(ConnectionState::Disconnected);
        tracing::error!("Reconnect attempts exhausted; awaiting explicit retry");
    }
}

/// A consumer's attachment to the feed. Dropping it detaches the consumer
/// and decrements the shared reference count.
#[derive(Debug)]
pub struct FeedSubscription {
    rx: broadcast::Receiver<OrderFeedEvent>,
    inner: Arc<FeedInner>,
}

impl FeedSubscription {
    /// Next event in arrival order. Lagged gaps are skipped with a
    /// warning; the next full REST fetch covers anything missed.
    pub async fn recv(&mut self) -> Result<OrderFeedEvent, FeedError> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Ok(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Feed subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(FeedError::Disconnected),
            }
        }
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.inner.subscribers.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::{DeliveryType, OrderItem, PaymentInfo, PaymentStatus};

    fn order(id: &str) -> Order {
        Order {
            order_id: id.to_string(),
            customer_name: "Ana".to_string(),
            customer_phone: "5551234567".to_string(),
            items: vec![OrderItem {
                dish_name: "Mango Lassi".to_string(),
                price: 18.5,
                quantity: 1,
                special_instructions: None,
            }],
            total_amount: 18.5,
            status: OrderStatus::Pending,
            delivery_type: DeliveryType::DineIn,
            payment: PaymentInfo {
                method: "CASH".to_string(),
                status: PaymentStatus::Pending,
                transaction_id: None,
            },
            created_at: shared::util::now_millis(),
        }
    }

    #[tokio::test]
    async fn memory_client_delivers_typed_events_in_order() {
        let (server_tx, _keep) = broadcast::channel(16);
        let (client_tx, _server_rx) = broadcast::channel(16);
        let client = FeedClient::connect_memory(&server_tx, &client_tx, "test")
            .await
            .unwrap();
        assert_eq!(client.state(), ConnectionState::Connected);

        let mut sub = client.subscribe();
        server_tx.send(FeedMessage::order_created(&order("ord-1"))).unwrap();
        server_tx
            .send(FeedMessage::order_status_changed("ord-1", OrderStatus::Confirmed))
            .unwrap();

        match sub.recv().await.unwrap() {
            OrderFeedEvent::OrderCreated(o) => assert_eq!(o.order_id, "ord-1"),
            other => panic!("unexpected event: {other:?}"),
        }
        match sub.recv().await.unwrap() {
            OrderFeedEvent::OrderStatusChanged { order_id, status } => {
                assert_eq!(order_id, "ord-1");
                assert_eq!(status, OrderStatus::Confirmed);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn subscription_drop_detaches_without_disconnecting() {
        let (server_tx, _keep) = broadcast::channel(16);
        let (client_tx, _server_rx) = broadcast::channel(16);
        let client = FeedClient::connect_memory(&server_tx, &client_tx, "test")
            .await
            .unwrap();

        let a = client.subscribe();
        let b = client.subscribe();
        assert_eq!(client.subscriber_count(), 2);

        drop(a);
        assert_eq!(client.subscriber_count(), 1);
        assert_eq!(client.state(), ConnectionState::Connected);

        // Close is refused while a consumer remains attached.
        assert!(client.close().await.is_err());

        drop(b);
        client.close().await.unwrap();
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn join_is_tracked_and_sent() {
        let (server_tx, _keep) = broadcast::channel(16);
        let (client_tx, mut server_rx) = broadcast::channel(16);
        let client = FeedClient::connect_memory(&server_tx, &client_tx, "test")
            .await
            .unwrap();

        // Handshake arrives first.
        let handshake = server_rx.recv().await.unwrap();
        assert_eq!(handshake.kind, FeedEventKind::Handshake);

        client.join_dashboard().await;
        let join = server_rx.recv().await.unwrap();
        assert_eq!(join.kind, FeedEventKind::JoinRoom);
        let payload: shared::message::RoomPayload = join.decode_payload().unwrap();
        assert_eq!(payload.room, ROOM_DASHBOARD);

        client.leave_dashboard().await;
        let leave = server_rx.recv().await.unwrap();
        assert_eq!(leave.kind, FeedEventKind::LeaveRoom);
    }

    #[tokio::test]
    async fn ignored_message_kinds_do_not_reach_subscribers() {
        let (server_tx, _keep) = broadcast::channel(16);
        let (client_tx, _server_rx) = broadcast::channel(16);
        let client = FeedClient::connect_memory(&server_tx, &client_tx, "test")
            .await
            .unwrap();
        let mut sub = client.subscribe();

        server_tx.send(FeedMessage::join_room("noise")).unwrap();
        server_tx.send(FeedMessage::order_created(&order("ord-2"))).unwrap();

        // The room-control frame is skipped; the order push arrives.
        match sub.recv().await.unwrap() {
            OrderFeedEvent::OrderCreated(o) => assert_eq!(o.order_id, "ord-2"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn close_then_connect_reopens_the_feed() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        // Each accepted connection gets one order push.
        tokio::spawn(async move {
            loop {
                let (mut stream, _) = listener.accept().await.unwrap();
                let msg = FeedMessage::order_created(&order("ord-reopen"));
                let mut frame = Vec::new();
                frame.push(msg.kind as u8);
                frame.extend_from_slice(msg.request_id.as_bytes());
                frame.extend_from_slice(&(msg.payload.len() as u32).to_le_bytes());
                frame.extend_from_slice(&msg.payload);
                stream.write_all(&frame).await.unwrap();
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    while matches!(stream.read(&mut buf).await, Ok(n) if n > 0) {}
                });
            }
        });

        let client = FeedClient::new(addr, "test");
        client.connect().await.unwrap();
        client.close().await.unwrap();
        assert_eq!(client.state(), ConnectionState::Disconnected);

        // Reopening after close must deliver events again.
        let mut sub = client.subscribe();
        client.connect().await.unwrap();
        assert_eq!(client.state(), ConnectionState::Connected);
        match sub.recv().await.unwrap() {
            OrderFeedEvent::OrderCreated(o) => assert_eq!(o.order_id, "ord-reopen"),
            other => panic!("unexpected event: {other:?}"),
        }

        drop(sub);
        client.close().await.unwrap();
    }

    #[test]
    fn connect_is_idempotent_while_connecting() {
        let client = FeedClient::new("127.0.0.1:9", "test");
        assert_eq!(client.state(), ConnectionState::Disconnected);
        // Not connected yet; state stays observable without a runtime.
        assert_eq!(client.subscriber_count(), 0);
    }
}
