//! Relay fan-out over real loopback sockets.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use stepcast_config::RelayConfig;
use stepcast_relay::RelayServer;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_relay() -> (RelayServer, SocketAddr) {
    let relay = RelayServer::new(RelayConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    });
    let addr = relay.start().await.unwrap();
    (relay, addr)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/", addr))
        .await
        .unwrap();
    ws
}

async fn wait_for_clients(relay: &RelayServer, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while relay.client_count() != n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("clients never registered");
}

async fn next_text(client: &mut Client) -> Option<String> {
    match tokio::time::timeout(Duration::from_millis(300), client.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => Some(text.as_str().to_owned()),
        _ => None,
    }
}

#[tokio::test]
async fn test_message_reaches_others_but_not_sender() {
    let (relay, addr) = start_relay().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    let mut c = connect(addr).await;
    wait_for_clients(&relay, 3).await;

    let payload = r#"{"type":"click","label":"Save","timestamp":1}"#;
    a.send(Message::Text(payload.into())).await.unwrap();

    assert_eq!(next_text(&mut b).await.as_deref(), Some(payload));
    assert_eq!(next_text(&mut c).await.as_deref(), Some(payload));
    assert_eq!(next_text(&mut a).await, None);

    relay.stop().await;
}

#[tokio::test]
async fn test_non_json_is_forwarded_verbatim() {
    let (relay, addr) = start_relay().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    wait_for_clients(&relay, 2).await;

    a.send(Message::Text("  not json {".into())).await.unwrap();
    assert_eq!(next_text(&mut b).await.as_deref(), Some("  not json {"));

    relay.stop().await;
}

#[tokio::test]
async fn test_sender_order_is_preserved() {
    let (relay, addr) = start_relay().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    wait_for_clients(&relay, 2).await;

    for i in 0..20 {
        a.send(Message::Text(i.to_string().into())).await.unwrap();
    }
    for i in 0..20 {
        assert_eq!(next_text(&mut b).await, Some(i.to_string()));
    }

    relay.stop().await;
}

#[tokio::test]
async fn test_disconnected_client_is_removed() {
    let (relay, addr) = start_relay().await;
    let mut a = connect(addr).await;
    let b = connect(addr).await;
    wait_for_clients(&relay, 2).await;

    drop(b);
    wait_for_clients(&relay, 1).await;

    // Sending with nobody else connected is fine.
    a.send(Message::Text("lonely".into())).await.unwrap();
    assert_eq!(next_text(&mut a).await, None);

    relay.stop().await;
}

#[tokio::test]
async fn test_health_endpoint_counts_clients() {
    let (relay, addr) = start_relay().await;
    let _a = connect(addr).await;
    wait_for_clients(&relay, 1).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    tokio::io::AsyncWriteExt::write_all(
        &mut stream,
        b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await
    .unwrap();
    let mut response = String::new();
    tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut response)
        .await
        .unwrap();

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains(r#""clients":1"#));
    assert!(response.contains(r#""status":"ok""#));

    relay.stop().await;
}

#[tokio::test]
async fn test_stop_closes_clients() {
    let (relay, addr) = start_relay().await;
    let mut a = connect(addr).await;
    wait_for_clients(&relay, 1).await;

    relay.stop().await;

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match a.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(closed.is_ok());
}
