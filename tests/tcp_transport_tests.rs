use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Duration;
use torpedo::transport::tcp::TcpTransport;
use torpedo::transport::{Transport, TransportError};

async fn connected() -> anyhow::Result<(TcpTransport, TcpStream)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let client = TcpTransport::connect(addr).await?;
    let (server, _) = listener.accept().await?;
    Ok((client, server))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_frames_are_newline_terminated() -> anyhow::Result<()> {
    let (mut client, mut server) = connected().await?;
    client.send("SHOT:3,4").await?;
    client.send("READY").await?;
    drop(client);

    let mut raw = String::new();
    server.read_to_string(&mut raw).await?;
    assert_eq!(raw, "SHOT:3,4\nREADY\n");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_split_and_coalesced_frames() -> anyhow::Result<()> {
    let (mut client, mut server) = connected().await?;
    server.write_all(b"TURN:1\nSHOT:").await?;
    server.flush().await?;
    assert_eq!(client.recv().await?, "TURN:1");

    tokio::time::sleep(Duration::from_millis(20)).await;
    server.write_all(b"0,9\r\nREADY\n").await?;
    assert_eq!(client.recv().await?, "SHOT:0,9");
    assert_eq!(client.recv().await?, "READY");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_partial_frame_at_eof_is_discarded() -> anyhow::Result<()> {
    let (mut client, mut server) = connected().await?;
    server.write_all(b"GAME_OVER:2\nSHOT:1").await?;
    drop(server);

    assert_eq!(client.recv().await?, "GAME_OVER:2");
    assert!(matches!(client.recv().await, Err(TransportError::Closed)));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oversized_frame_is_rejected() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let stream = TcpStream::connect(addr).await?;
    let (mut server, _) = listener.accept().await?;
    let mut client = TcpTransport::with_config(stream, Duration::from_secs(1), None, 16);

    server.write_all(&[b'E'; 64]).await?;
    assert!(matches!(
        client.recv().await,
        Err(TransportError::FrameTooLarge { max: 16, .. })
    ));
    assert!(matches!(
        client.send(&"E".repeat(32)).await,
        Err(TransportError::FrameTooLarge { len: 32, max: 16 })
    ));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_receive_timeout() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let stream = TcpStream::connect(addr).await?;
    let (_server, _) = listener.accept().await?;
    let mut client = TcpTransport::with_config(
        stream,
        Duration::from_secs(1),
        Some(Duration::from_millis(50)),
        1024,
    );
    assert!(matches!(client.recv().await, Err(TransportError::Timeout(_))));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancelled_recv_loses_nothing() -> anyhow::Result<()> {
    let (mut client, mut server) = connected().await?;
    server.write_all(b"SHOT:5,").await?;
    server.flush().await?;
    // Give up on the first read mid-frame.
    let cancelled = tokio::time::timeout(Duration::from_millis(50), client.recv()).await;
    assert!(cancelled.is_err());

    server.write_all(b"5\n").await?;
    assert_eq!(client.recv().await?, "SHOT:5,5");
    Ok(())
}
