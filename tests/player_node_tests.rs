use std::sync::{Arc, Mutex};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};
use torpedo::transport::in_memory::InMemoryTransport;
use torpedo::transport::Transport;
use torpedo::{
    Command, Coord, GameSession, LogSink, Message, Phase, PlayerId, PlayerNode, RunOutcome,
    SessionEvent, ValidationError,
};

fn rng() -> SmallRng {
    SmallRng::seed_from_u64(42)
}

#[tokio::test]
async fn test_join_waits_for_seat_assignment() -> anyhow::Result<()> {
    let (node_end, mut relay_end) = InMemoryTransport::pair();
    relay_end.send("TURN:1").await?;
    relay_end.send("garbage").await?;
    relay_end.send("PLAYER:2").await?;

    let node = PlayerNode::join(Box::new(node_end), &[2], Box::new(LogSink), rng()).await?;
    assert_eq!(node.session().player(), PlayerId::TWO);
    assert_eq!(node.session().phase(), Phase::Placement);
    Ok(())
}

#[tokio::test]
async fn test_join_fails_when_relay_closes() {
    let (node_end, relay_end) = InMemoryTransport::pair();
    drop(relay_end);
    assert!(PlayerNode::join(Box::new(node_end), &[2], Box::new(LogSink), rng())
        .await
        .is_err());
}

#[tokio::test]
async fn test_auto_place_command_submits_fleet() -> anyhow::Result<()> {
    let (node_end, mut relay_end) = InMemoryTransport::pair();
    let session = GameSession::new(PlayerId::ONE, &[3, 2], Box::new(LogSink));
    let mut node = PlayerNode::new(session, Box::new(node_end), rng());

    let (tx, mut rx) = mpsc::channel(4);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    tx.send(Command::AutoPlace).await?;
    let task = tokio::spawn(async move {
        let outcome = node.run(&mut rx, async {
            let _ = stop_rx.await;
        });
        let outcome = outcome.await;
        (outcome, node)
    });

    let map = relay_end.recv().await?;
    assert!(matches!(Message::decode(&map)?, Message::Map(_)));
    assert_eq!(relay_end.recv().await?, "READY");

    stop_tx.send(()).ok();
    let (outcome, node) = task.await?;
    assert_eq!(outcome?, RunOutcome::Shutdown);
    assert_eq!(node.session().phase(), Phase::Ready);
    assert!(node.session().fleet().is_complete());
    Ok(())
}

#[tokio::test]
async fn test_rejected_command_reaches_sink_and_sends_nothing() -> anyhow::Result<()> {
    let (node_end, mut relay_end) = InMemoryTransport::pair();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let events = events.clone();
        move |event: &SessionEvent| events.lock().unwrap().push(event.clone())
    };
    let session = GameSession::new(PlayerId::ONE, &[2], Box::new(sink));
    let mut node = PlayerNode::new(session, Box::new(node_end), rng());

    let (tx, mut rx) = mpsc::channel(4);
    tx.send(Command::Fire(Coord::new(1, 1)?)).await?;
    drop(tx);
    // Local input is gone; the node keeps serving the connection until it closes.
    let (outcome, sent) = tokio::join!(node.run(&mut rx, std::future::pending()), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let sent = timeout(Duration::from_millis(10), relay_end.recv()).await;
        drop(relay_end);
        sent
    });

    assert!(sent.is_err(), "nothing should have been sent");
    assert_eq!(outcome?, RunOutcome::Abandoned);
    assert_eq!(
        *events.lock().unwrap(),
        vec![SessionEvent::Rejected(ValidationError::NotStarted)]
    );
    Ok(())
}

#[tokio::test]
async fn test_protocol_errors_do_not_end_the_session() -> anyhow::Result<()> {
    let (node_end, mut relay_end) = InMemoryTransport::pair();
    let session = GameSession::new(PlayerId::TWO, &[2], Box::new(LogSink));
    let mut node = PlayerNode::new(session, Box::new(node_end), rng());
    let (tx, mut rx) = mpsc::channel(4);
    tx.send(Command::PlaceShip {
        origin: Coord::new(0, 0)?,
        length: 2,
        orientation: torpedo::Orientation::Vertical,
    })
    .await?;

    let (outcome, ()) = tokio::join!(node.run(&mut rx, std::future::pending()), async {
        assert!(relay_end.recv().await.unwrap().starts_with("MAP:"));
        assert_eq!(relay_end.recv().await.unwrap(), "READY");
        relay_end.send("SHOT:0,0").await.unwrap(); // before any turn
        relay_end.send("TURN:9").await.unwrap();
        relay_end.send("TURN:1").await.unwrap();
        relay_end.send("SHOT:0,0").await.unwrap();
        assert_eq!(relay_end.recv().await.unwrap(), "SHOT_RESULT:0,0,HIT");
        relay_end.send("SHOT:1,0").await.unwrap();
        assert_eq!(relay_end.recv().await.unwrap(), "SHOT_RESULT:1,0,HIT");
        assert_eq!(relay_end.recv().await.unwrap(), "GAME_OVER:1");
        drop(relay_end);
    });

    assert_eq!(outcome?, RunOutcome::Finished(PlayerId::ONE));
    assert_eq!(node.session().winner(), Some(PlayerId::ONE));
    Ok(())
}
