use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mediaport_core::config::BrokerConfig;
use mediaport_core::models::{File, Media};
use mediaport_core::{Actor, AppError, MediaEvent, MediaEventListener, UrlBuilder};
use mediaport_infra::{BrokerClient, BrokerError, BrokerEventListener, Frame};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use uuid::Uuid;

/// What the fake broker does with each accepted connection, by index.
#[derive(Clone, Copy)]
enum Behaviour {
    /// CONNECTED, then a RECEIPT for every SEND.
    Accept,
    /// CONNECTED, read one SEND, then hang up without a receipt.
    DropAfterSend,
    /// Hang up before answering CONNECT.
    HangUp,
    /// Answer CONNECT with an ERROR frame.
    RejectLogin,
}

struct FakeBroker {
    url: String,
    connections: Arc<AtomicUsize>,
    frames: mpsc::UnboundedReceiver<Frame>,
}

async fn fake_broker(script: Vec<Behaviour>) -> FakeBroker {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("tcp://{}", listener.local_addr().unwrap());
    let connections = Arc::new(AtomicUsize::new(0));
    let (tx, frames) = mpsc::unbounded_channel();

    let counter = connections.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let index = counter.fetch_add(1, Ordering::SeqCst);
            let behaviour = script.get(index).copied().unwrap_or(Behaviour::Accept);
            tokio::spawn(serve(stream, behaviour, tx.clone()));
        }
    });

    FakeBroker {
        url,
        connections,
        frames,
    }
}

async fn serve(stream: TcpStream, behaviour: Behaviour, frames: mpsc::UnboundedSender<Frame>) {
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let Ok(connect) = Frame::read(&mut reader).await else {
        return;
    };
    let _ = frames.send(connect);

    match behaviour {
        Behaviour::HangUp => return,
        Behaviour::RejectLogin => {
            let error = Frame::new("ERROR").header("message", "Bad credentials");
            let _ = writer.write_all(&error.encode()).await;
            return;
        }
        Behaviour::Accept | Behaviour::DropAfterSend => {
            let connected = Frame::new("CONNECTED").header("version", "1.2");
            if writer.write_all(&connected.encode()).await.is_err() {
                return;
            }
        }
    }

    while let Ok(frame) = Frame::read(&mut reader).await {
        let receipt = frame.get("receipt").map(str::to_string);
        let _ = frames.send(frame);
        if matches!(behaviour, Behaviour::DropAfterSend) {
            return;
        }
        if let Some(id) = receipt {
            let reply = Frame::new("RECEIPT").header("receipt-id", id);
            if writer.write_all(&reply.encode()).await.is_err() {
                return;
            }
        }
    }
}

fn client(url: &str, user: Option<&str>) -> BrokerClient {
    BrokerClient::new(&BrokerConfig {
        enabled: true,
        url: url.to_string(),
        user: user.map(str::to_string),
        password: user.map(|_| "secret".to_string()),
        queue: "/queue/media".to_string(),
    })
    .unwrap()
    .with_timeout(Duration::from_secs(2))
}

#[tokio::test]
async fn test_send_connects_lazily_and_publishes() {
    let mut broker = fake_broker(vec![Behaviour::Accept]).await;
    let client = client(&broker.url, Some("media"));
    assert!(!client.is_connected().await);

    client
        .send("/queue/media", "application/json", br#"{"a":1}"#)
        .await
        .unwrap();

    let connect = broker.frames.recv().await.unwrap();
    assert_eq!(connect.command, "CONNECT");
    assert_eq!(connect.get("accept-version"), Some("1.2"));
    assert_eq!(connect.get("login"), Some("media"));
    assert_eq!(connect.get("passcode"), Some("secret"));

    let send = broker.frames.recv().await.unwrap();
    assert_eq!(send.command, "SEND");
    assert_eq!(send.get("destination"), Some("/queue/media"));
    assert_eq!(send.get("content-type"), Some("application/json"));
    assert_eq!(send.body, br#"{"a":1}"#.to_vec());
    assert!(client.is_connected().await);
}

#[tokio::test]
async fn test_connection_is_reused() {
    let broker = fake_broker(vec![Behaviour::Accept]).await;
    let client = client(&broker.url, None);

    client.send("/queue/media", "text/plain", b"one").await.unwrap();
    client.send("/queue/media", "text/plain", b"two").await.unwrap();

    assert_eq!(broker.connections.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_send_reconnects_once_after_failure() {
    let broker = fake_broker(vec![Behaviour::DropAfterSend, Behaviour::Accept]).await;
    let client = client(&broker.url, None);

    client.send("/queue/media", "text/plain", b"hello").await.unwrap();

    assert_eq!(broker.connections.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_send_fails_after_second_failure() {
    let broker = fake_broker(vec![Behaviour::HangUp, Behaviour::HangUp, Behaviour::Accept]).await;
    let client = client(&broker.url, None);

    let result = client.send("/queue/media", "text/plain", b"hello").await;

    assert!(result.is_err());
    assert_eq!(broker.connections.load(Ordering::SeqCst), 2);
    assert!(!client.is_connected().await);

    // The next send starts over with a fresh connection.
    client.send("/queue/media", "text/plain", b"again").await.unwrap();
    assert_eq!(broker.connections.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_rejected_login_is_reported() {
    let broker = fake_broker(vec![Behaviour::RejectLogin, Behaviour::RejectLogin]).await;
    let client = client(&broker.url, Some("intruder"));

    let result = client.send("/queue/media", "text/plain", b"hello").await;

    assert!(matches!(result, Err(BrokerError::Rejected(ref m)) if m == "Bad credentials"));
}

#[tokio::test]
async fn test_unreachable_broker_is_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("tcp://{}", listener.local_addr().unwrap());
    drop(listener);
    let client = client(&url, None);

    let result = client.send("/queue/media", "text/plain", b"hello").await;

    assert!(matches!(result, Err(BrokerError::Connect { .. })));
}

#[tokio::test]
async fn test_listener_publishes_update_activity() {
    let mut broker = fake_broker(vec![Behaviour::Accept]).await;
    let listener = BrokerEventListener::new(
        Arc::new(client(&broker.url, None)),
        UrlBuilder::new("http://localhost:4000", "http://localhost:4000/files"),
        "/queue/media",
    );
    let owner = Uuid::new_v4();
    let event = MediaEvent {
        media: Media::new("image", owner),
        file: File::new_permanent("public://a.png", owner, "image/png", "a.png"),
        actor: Actor::new(owner),
    };

    listener.media_saved(event).await.unwrap();

    let _connect = broker.frames.recv().await.unwrap();
    let send = broker.frames.recv().await.unwrap();
    let activity: serde_json::Value = serde_json::from_slice(&send.body).unwrap();
    assert_eq!(activity["type"], "Update");
    assert_eq!(activity["attachment"]["mediaType"], "image/png");
}

#[tokio::test]
async fn test_listener_failure_maps_to_internal_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("tcp://{}", listener.local_addr().unwrap());
    drop(listener);
    let events = BrokerEventListener::new(
        Arc::new(client(&url, None)),
        UrlBuilder::new("http://localhost:4000", "http://localhost:4000/files"),
        "/queue/media",
    );
    let owner = Uuid::new_v4();
    let event = MediaEvent {
        media: Media::new("image", owner),
        file: File::new_permanent("public://a.png", owner, "image/png", "a.png"),
        actor: Actor::new(owner),
    };

    let err = events.media_saved(event).await.unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));
}
