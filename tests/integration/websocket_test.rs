// tests/integration/websocket_test.rs

//! End-to-end tests of the shared command channel.

use super::test_helpers::*;
use bytes::Bytes;
use futures::SinkExt;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

#[cfg(unix)]
#[tokio::test]
async fn test_output_is_shared_and_close_unregisters() {
    let server = TestServer::start().await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;
    assert_eq!(server.state.registry.len(), 2);

    send_text(&mut a, "echo hi").await;
    assert_eq!(recv_text(&mut a).await, "hi\n");
    assert_eq!(recv_text(&mut b).await, "hi\n");

    b.close(None).await.unwrap();
    drop(b);
    server.wait_for_connections(1).await;

    send_text(&mut a, "echo bye").await;
    assert_eq!(recv_text(&mut a).await, "bye\n");
    assert_eq!(server.state.registry.len(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_binary_frame_is_never_broadcast() {
    let server = TestServer::start().await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;

    a.send(Message::Binary(Bytes::from_static(b"echo binary")))
        .await
        .unwrap();
    assert_silent(&mut b, Duration::from_millis(300)).await;

    // The connection is still usable, and the next broadcast is the text command.
    send_text(&mut a, "echo marker").await;
    assert_eq!(recv_text(&mut a).await, "marker\n");
    assert_eq!(recv_text(&mut b).await, "marker\n");
}

#[cfg(unix)]
#[tokio::test]
async fn test_slow_command_does_not_block_other_sessions() {
    let server = TestServer::start().await;
    let mut slow = server.connect().await;
    let mut fast = server.connect().await;

    send_text(&mut slow, "sleep 2; echo slow").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    send_text(&mut fast, "echo fast").await;

    // The fast result overtakes the slow one on both sockets.
    assert_eq!(recv_text(&mut fast).await, "fast\n");
    assert_eq!(recv_text(&mut slow).await, "fast\n");
    assert_eq!(recv_text(&mut fast).await, "slow\n");
    assert_eq!(recv_text(&mut slow).await, "slow\n");
}

#[cfg(unix)]
#[tokio::test]
async fn test_abrupt_disconnect_is_cleaned_up() {
    let server = TestServer::start().await;
    let mut a = server.connect().await;
    let b = server.connect().await;

    // Drop without a close handshake.
    drop(b);
    server.wait_for_connections(1).await;

    send_text(&mut a, "echo still-here").await;
    assert_eq!(recv_text(&mut a).await, "still-here\n");
}

#[tokio::test]
async fn test_shutdown_signal_disconnects_clients() {
    let server = TestServer::start().await;
    let _a = server.connect().await;
    let _b = server.connect().await;

    server.state.shutdown_tx.send(()).unwrap();
    server.wait_for_connections(0).await;
}
