//! Feed transport abstraction.
//!
//! Frame layout on the wire: 1-byte event kind, 16-byte request id,
//! 4-byte little-endian payload length, then the JSON payload.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

use super::FeedError;
use shared::message::{FeedEventKind, FeedMessage};

/// Maximum accepted payload size (1 MiB) - a corrupt length prefix must
/// not allocate unbounded memory.
const MAX_PAYLOAD_LEN: usize = 1024 * 1024;

/// Transport abstraction for the order feed.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn read_message(&self) -> Result<FeedMessage, FeedError>;
    async fn write_message(&self, msg: &FeedMessage) -> Result<(), FeedError>;
    async fn close(&self) -> Result<(), FeedError>;
}

/// TCP transport.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl TcpTransport {
    pub async fn connect(addr: &str) -> Result<Self, FeedError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| FeedError::Connection(e.to_string()))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn read_message(&self) -> Result<FeedMessage, FeedError> {
        let mut reader = self.reader.lock().await;

        // Event kind (1 byte)
        let mut kind_buf = [0u8; 1];
        reader.read_exact(&mut kind_buf).await.map_err(FeedError::Io)?;
        let kind = FeedEventKind::try_from(kind_buf[0])
            .map_err(|_| FeedError::InvalidMessage(format!("unknown event kind {}", kind_buf[0])))?;

        // Request ID (16 bytes)
        let mut uuid_buf = [0u8; 16];
        reader.read_exact(&mut uuid_buf).await.map_err(FeedError::Io)?;
        let request_id = Uuid::from_bytes(uuid_buf);

        // Payload length (4 bytes LE)
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf).await.map_err(FeedError::Io)?;
        let len = u32::from_le_bytes(len_buf) as usize;
        if len > MAX_PAYLOAD_LEN {
            return Err(FeedError::InvalidMessage(format!(
                "payload length {} exceeds limit",
                len
            )));
        }

        let mut payload = vec![0u8; len];
        reader.read_exact(&mut payload).await.map_err(FeedError::Io)?;

        Ok(FeedMessage {
            request_id,
            kind,
            payload,
        })
    }

    async fn write_message(&self, msg: &FeedMessage) -> Result<(), FeedError> {
        let mut writer = self.writer.lock().await;
        let mut data = Vec::with_capacity(21 + msg.payload.len());
        data.push(msg.kind as u8);
        data.extend_from_slice(msg.request_id.as_bytes());
        data.extend_from_slice(&(msg.payload.len() as u32).to_le_bytes());
        data.extend_from_slice(&msg.payload);

        writer.write_all(&data).await.map_err(FeedError::Io)?;
        Ok(())
    }

    async fn close(&self) -> Result<(), FeedError> {
        // Dropping the halves closes the stream.
        Ok(())
    }
}

/// In-memory transport for in-process servers and tests.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    /// Messages FROM the server (broadcasts).
    rx: Arc<Mutex<broadcast::Receiver<FeedMessage>>>,
    /// Messages TO the server.
    tx: broadcast::Sender<FeedMessage>,
}

impl MemoryTransport {
    /// * `server_tx` - the server's broadcast sender (subscribed for pushes)
    /// * `client_tx` - the channel carrying client messages to the server
    pub fn new(
        server_tx: &broadcast::Sender<FeedMessage>,
        client_tx: &broadcast::Sender<FeedMessage>,
    ) -> Self {
        Self {
            rx: Arc::new(Mutex::new(server_tx.subscribe())),
            tx: client_tx.clone(),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_message(&self) -> Result<FeedMessage, FeedError> {
        let mut rx = self.rx.lock().await;
        loop {
            match rx.recv().await {
                Ok(msg) => return Ok(msg),
                // A slow test consumer missed messages; skip the gap.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Memory transport lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(FeedError::Connection("memory channel closed".to_string()));
                }
            }
        }
    }

    async fn write_message(&self, msg: &FeedMessage) -> Result<(), FeedError> {
        self.tx
            .send(msg.clone())
            .map_err(|e| FeedError::Connection(format!("failed to send to server: {e}")))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), FeedError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_transport_delivers_in_order() {
        let (server_tx, _) = broadcast::channel(16);
        let (client_tx, mut server_rx) = broadcast::channel(16);
        let transport = MemoryTransport::new(&server_tx, &client_tx);

        let first = FeedMessage::join_room("dashboard");
        let second = FeedMessage::leave_room("dashboard");
        transport.write_message(&first).await.unwrap();
        transport.write_message(&second).await.unwrap();
        assert_eq!(server_rx.recv().await.unwrap(), first);
        assert_eq!(server_rx.recv().await.unwrap(), second);

        let push = FeedMessage::order_status_changed("ord-1", shared::OrderStatus::Ready);
        server_tx.send(push.clone()).unwrap();
        assert_eq!(transport.read_message().await.unwrap(), push);
    }

    #[tokio::test]
    async fn tcp_transport_roundtrips_frames() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, writer) = stream.into_split();
            let transport = TcpTransport {
                reader: Arc::new(Mutex::new(reader)),
                writer: Arc::new(Mutex::new(writer)),
            };
            let msg = transport.read_message().await.unwrap();
            transport.write_message(&msg).await.unwrap();
        });

        let client = TcpTransport::connect(&addr.to_string()).await.unwrap();
        let msg = FeedMessage::join_room("dashboard");
        client.write_message(&msg).await.unwrap();
        let echoed = client.read_message().await.unwrap();
        assert_eq!(echoed, msg);

        server.await.unwrap();
    }
}
