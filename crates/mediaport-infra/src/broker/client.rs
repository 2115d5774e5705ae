use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use mediaport_core::config::BrokerConfig;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;

use super::{BrokerError, Frame};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// STOMP 1.2 client over a single TCP connection.
///
/// The connection is opened on first use. When a send fails the connection
/// is dropped, re-established once and the send retried; a second failure is
/// returned to the caller. Every `SEND` asks for a receipt so a broken
/// connection is noticed on the send that hit it.
pub struct BrokerClient {
    host: String,
    port: u16,
    login: Option<(String, String)>,
    timeout: Duration,
    connection: Mutex<Option<Connection>>,
    receipts: AtomicU64,
}

impl BrokerClient {
    pub fn new(config: &BrokerConfig) -> Result<Self, BrokerError> {
        let (host, port) = config
            .address()
            .map_err(|e| BrokerError::InvalidConfig(e.to_string()))?;
        let login = config
            .user
            .clone()
            .map(|user| (user, config.password.clone().unwrap_or_default()));

        Ok(BrokerClient {
            host,
            port,
            login,
            timeout: DEFAULT_TIMEOUT,
            connection: Mutex::new(None),
            receipts: AtomicU64::new(0),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    /// Publish `body` to `destination`.
    #[tracing::instrument(skip(self, body), fields(broker = %self.address(), bytes = body.len()))]
    pub async fn send(
        &self,
        destination: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<(), BrokerError> {
        let mut slot = self.connection.lock().await;

        match self.send_on(&mut slot, destination, content_type, body).await {
            Ok(()) => Ok(()),
            Err(first) => {
                tracing::warn!(error = %first, "Broker send failed, reconnecting");
                *slot = None;
                let retried = self.send_on(&mut slot, destination, content_type, body).await;
                if retried.is_err() {
                    *slot = None;
                }
                retried
            }
        }
    }

    /// Send `DISCONNECT` and drop the connection. Errors are ignored.
    pub async fn disconnect(&self) {
        let mut slot = self.connection.lock().await;
        if let Some(mut connection) = slot.take() {
            let frame = Frame::new("DISCONNECT").encode();
            let _ = connection.writer.write_all(&frame).await;
            let _ = connection.writer.shutdown().await;
            tracing::debug!(broker = %self.address(), "Disconnected from broker");
        }
    }

    async fn send_on(
        &self,
        slot: &mut Option<Connection>,
        destination: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<(), BrokerError> {
        if slot.is_none() {
            *slot = Some(self.connect().await?);
        }
        let Some(connection) = slot.as_mut() else {
            return Err(BrokerError::ConnectionClosed);
        };

        let receipt = format!("send-{}", self.receipts.fetch_add(1, Ordering::Relaxed) + 1);
        let frame = Frame::new("SEND")
            .header("destination", destination)
            .header("content-type", content_type)
            .header("content-length", body.len().to_string())
            .header("persistent", "true")
            .header("receipt", receipt.as_str())
            .body(body);

        connection.writer.write_all(&frame.encode()).await?;
        connection.writer.flush().await?;

        timeout(self.timeout, await_receipt(&mut connection.reader, &receipt))
            .await
            .map_err(|_| BrokerError::Timeout(self.timeout))??;

        tracing::debug!(destination = %destination, receipt = %receipt, "Broker accepted message");
        Ok(())
    }

    async fn connect(&self) -> Result<Connection, BrokerError> {
        let address = self.address();

        let stream = timeout(self.timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| BrokerError::Timeout(self.timeout))?
            .map_err(|source| BrokerError::Connect {
                address: address.clone(),
                source,
            })?;
        let (read_half, write_half) = stream.into_split();
        let mut connection = Connection {
            reader: BufReader::new(read_half),
            writer: write_half,
        };

        let mut frame = Frame::new("CONNECT")
            .header("accept-version", "1.2")
            .header("host", self.host.as_str())
            .header("heart-beat", "0,0");
        if let Some((login, passcode)) = &self.login {
            frame = frame
                .header("login", login.as_str())
                .header("passcode", passcode.as_str());
        }
        connection.writer.write_all(&frame.encode()).await?;
        connection.writer.flush().await?;

        let reply = timeout(self.timeout, Frame::read(&mut connection.reader))
            .await
            .map_err(|_| BrokerError::Timeout(self.timeout))??;
        match reply.command.as_str() {
            "CONNECTED" => {
                tracing::info!(
                    broker = %address,
                    version = reply.get("version").unwrap_or("1.2"),
                    "Connected to message broker"
                );
                Ok(connection)
            }
            "ERROR" => Err(rejection(&reply)),
            other => Err(BrokerError::Protocol(format!(
                "Expected CONNECTED, broker sent {}",
                other
            ))),
        }
    }
}

async fn await_receipt(
    reader: &mut BufReader<OwnedReadHalf>,
    receipt: &str,
) -> Result<(), BrokerError> {
    loop {
        let reply = Frame::read(reader).await?;
        match reply.command.as_str() {
            "RECEIPT" if reply.get("receipt-id") == Some(receipt) => return Ok(()),
            "ERROR" => return Err(rejection(&reply)),
            _ => continue,
        }
    }
}

fn rejection(frame: &Frame) -> BrokerError {
    let message = frame
        .get("message")
        .map(str::to_string)
        .unwrap_or_else(|| String::from_utf8_lossy(&frame.body).into_owned());
    BrokerError::Rejected(message)
}
