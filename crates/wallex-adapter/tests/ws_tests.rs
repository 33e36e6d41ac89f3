/*
[INPUT]:  Scripted socket.io server sessions
[OUTPUT]: Test results for the subscription channel
[POS]:    Integration tests - WebSocket
[UPDATE]: When the channel lifecycle or wire format changes
*/

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{FakeSocketIo, OPEN_FRAME, Step, broadcast, unused_base_url};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;
use wallex_adapter::ws::DisconnectReason;
use wallex_adapter::{
    ChannelConfig, ChannelEvent, ChannelName, ChannelState, StreamEvent, SubscriptionChannel,
    WallexError,
};

fn config(base_url: &str, once: bool) -> ChannelConfig {
    ChannelConfig {
        base_url: base_url.to_string(),
        once,
        connect_timeout: Some(Duration::from_secs(2)),
        message_timeout: Some(Duration::from_secs(2)),
    }
}

fn drain(events: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> Vec<ChannelEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn disconnects(events: &[ChannelEvent]) -> Vec<DisconnectReason> {
    events
        .iter()
        .filter_map(|event| match event {
            ChannelEvent::Disconnected { reason } => Some(reason.clone()),
            _ => None,
        })
        .collect()
}

async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_one_shot_trade_snapshot() {
    let server = FakeSocketIo::start(vec![vec![
        Step::Handshake,
        Step::Record,
        broadcast("USDTTMN@trade", json!({"price": "50000", "qty": "1"})),
        Step::AwaitClose,
    ]])
    .await;

    let (mut channel, mut events) =
        SubscriptionChannel::with_observer(config(&server.base_url, true));
    let payload = assert_ok!(channel.get_trade("USDTTMN").await);

    assert_eq!(payload, json!({"price": "50000", "qty": "1"}));
    assert_eq!(channel.latest_data(), Some(payload));
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert_eq!(
        channel.channel(),
        Some(&ChannelName::new("USDTTMN", StreamEvent::Trade))
    );

    let frames = server.wait_for_frames(0, 3).await;
    assert_eq!(frames[0], "40");
    assert_eq!(frames[1], r#"42["subscribe",{"channel":"USDTTMN@trade"}]"#);
    assert_eq!(frames[2], "41");

    let events = drain(&mut events);
    assert!(matches!(events[0], ChannelEvent::Connected { .. }));
    assert!(matches!(events[1], ChannelEvent::Subscribed { .. }));
    assert_eq!(disconnects(&events), vec![DisconnectReason::OneShotComplete]);
}

#[tokio::test]
async fn test_one_shot_invokes_callback_once() {
    let server = FakeSocketIo::start(vec![vec![
        Step::Handshake,
        Step::Record,
        broadcast("BTCTMN@buyDepth", json!([{"price": "1", "quantity": "2"}])),
        broadcast("BTCTMN@buyDepth", json!([{"price": "3", "quantity": "4"}])),
        broadcast("BTCTMN@buyDepth", json!([{"price": "5", "quantity": "6"}])),
        Step::AwaitClose,
    ]])
    .await;

    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    let mut channel = SubscriptionChannel::new(config(&server.base_url, true));
    assert_ok!(
        channel
            .subscribe("BTCTMN", StreamEvent::BuyDepth, move |_payload| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
    );

    assert_ok!(channel.wait_disconnected().await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(
        channel.latest_data(),
        Some(json!([{"price": "1", "quantity": "2"}]))
    );
}

#[tokio::test]
async fn test_resubscribe_replaces_callback() {
    let server = FakeSocketIo::start(vec![
        vec![
            Step::Handshake,
            Step::Record,
            Step::AwaitClose,
        ],
        vec![
            Step::Handshake,
            Step::Record,
            broadcast("BTCTMN@trade", json!({"from": "second"})),
            Step::AwaitClose,
        ],
    ])
    .await;

    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));
    let (mut channel, mut events) =
        SubscriptionChannel::with_observer(config(&server.base_url, false));

    let first = first_calls.clone();
    assert_ok!(
        channel
            .subscribe("USDTTMN", StreamEvent::Trade, move |_| {
                first.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
    );
    let second = second_calls.clone();
    assert_ok!(
        channel
            .subscribe("BTCTMN", StreamEvent::Trade, move |_| {
                second.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
    );

    assert!(wait_until(|| second_calls.load(Ordering::SeqCst) == 1).await);
    assert_eq!(first_calls.load(Ordering::SeqCst), 0);
    assert_eq!(channel.latest_data(), Some(json!({"from": "second"})));

    channel.disconnect().await;
    assert_eq!(channel.state(), ChannelState::Disconnected);

    let first_frames = server.wait_for_frames(0, 3).await;
    assert_eq!(first_frames[2], "41");
    let second_frames = server.wait_for_frames(1, 2).await;
    assert_eq!(second_frames[1], r#"42["subscribe",{"channel":"BTCTMN@trade"}]"#);

    assert_eq!(
        disconnects(&drain(&mut events)),
        vec![DisconnectReason::Requested, DisconnectReason::Requested]
    );
}

#[tokio::test]
async fn test_callback_failures_are_isolated() {
    let server = FakeSocketIo::start(vec![vec![
        Step::Handshake,
        Step::Record,
        broadcast("USDTTMN@marketCap", json!({"n": 1})),
        broadcast("USDTTMN@marketCap", json!({"n": 2})),
        broadcast("USDTTMN@marketCap", json!({"n": 3})),
        Step::AwaitClose,
    ]])
    .await;

    let (delivered_tx, mut delivered_rx) = mpsc::unbounded_channel::<Value>();
    let (mut channel, mut events) =
        SubscriptionChannel::with_observer(config(&server.base_url, false));
    assert_ok!(
        channel
            .subscribe("USDTTMN", StreamEvent::MarketCap, move |payload| {
                match payload["n"].as_i64() {
                    Some(1) => Err("malformed snapshot".into()),
                    Some(2) => panic!("callback exploded"),
                    _ => {
                        let _ = delivered_tx.send(payload);
                        Ok(())
                    }
                }
            })
            .await
    );

    let delivered = tokio::time::timeout(Duration::from_secs(2), delivered_rx.recv())
        .await
        .expect("third message delivered");
    assert_eq!(delivered, Some(json!({"n": 3})));
    assert_eq!(channel.state(), ChannelState::Delivering);
    assert_eq!(channel.latest_data(), Some(json!({"n": 3})));

    channel.disconnect().await;

    let failures: Vec<String> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            ChannelEvent::CallbackFailed { message, .. } => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0], "malformed snapshot");
    assert_eq!(failures[1], "callback panicked: callback exploded");
}

#[tokio::test]
async fn test_connect_failure_is_reported() {
    let base_url = unused_base_url().await;
    let (mut channel, mut events) = SubscriptionChannel::with_observer(config(&base_url, true));

    let err = channel.get_sell_depth("USDTTMN").await.unwrap_err();
    assert!(err.is_network_error(), "unexpected error: {err:?}");
    assert!(channel.latest_data().is_none());
    assert_eq!(channel.state(), ChannelState::Disconnected);

    let seen = drain(&mut events);
    assert!(matches!(seen[0], ChannelEvent::ConnectFailed { .. }));
    assert_eq!(disconnects(&seen), vec![DisconnectReason::ConnectFailed]);

    channel.disconnect().await;
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_first_message_timeout() {
    let server =
        FakeSocketIo::start(vec![vec![Step::Handshake, Step::Record, Step::AwaitClose]]).await;

    let mut cfg = config(&server.base_url, true);
    cfg.message_timeout = Some(Duration::from_millis(200));
    let mut channel = SubscriptionChannel::new(cfg);

    let err = channel.get_market_cap("USDTTMN").await.unwrap_err();
    match err {
        WallexError::Timeout {
            duration_ms,
            waiting_for,
        } => {
            assert_eq!(duration_ms, 200);
            assert_eq!(waiting_for, "first message");
        }
        other => panic!("Expected Timeout, got {other:?}"),
    }
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert!(channel.latest_data().is_none());

    let frames = server.wait_for_frames(0, 3).await;
    assert_eq!(frames[2], "41");
}

#[tokio::test]
async fn test_cancellation_aborts_wait() {
    let server =
        FakeSocketIo::start(vec![vec![Step::Handshake, Step::Record, Step::AwaitClose]]).await;

    let mut cfg = config(&server.base_url, true);
    cfg.message_timeout = None;
    let token = CancellationToken::new();
    let mut channel = SubscriptionChannel::new(cfg).with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let err = channel.get_buy_depth("USDTTMN").await.unwrap_err();
    assert!(matches!(err, WallexError::Cancelled));
    assert_eq!(channel.state(), ChannelState::Disconnected);
    assert_ok!(canceller.await);
}

#[tokio::test]
async fn test_ping_is_answered() {
    let server = FakeSocketIo::start(vec![vec![
        Step::Handshake,
        Step::Record,
        Step::Ping,
        broadcast("USDTTMN@trade", json!({"price": "50100"})),
        Step::AwaitClose,
    ]])
    .await;

    let mut channel = SubscriptionChannel::new(config(&server.base_url, true));
    let payload = assert_ok!(channel.get_trade("USDTTMN").await);
    assert_eq!(payload["price"], "50100");

    let frames = server.wait_for_frames(0, 4).await;
    assert_eq!(frames[2], "3");
    assert_eq!(frames[3], "41");
}

#[tokio::test]
async fn test_other_channel_broadcasts_are_ignored() {
    let server = FakeSocketIo::start(vec![vec![
        Step::Handshake,
        Step::Record,
        broadcast("BTCTMN@trade", json!({"x": 1})),
        Step::Raw(r#"42["announcement",{"text":"maintenance"}]"#.to_string()),
        broadcast("USDTTMN@trade", json!({"x": 2})),
        Step::AwaitClose,
    ]])
    .await;

    let mut channel = SubscriptionChannel::new(config(&server.base_url, true));
    let payload = assert_ok!(channel.get_trade("USDTTMN").await);
    assert_eq!(payload, json!({"x": 2}));
}

#[tokio::test]
async fn test_connect_refused_by_namespace() {
    let server = FakeSocketIo::start(vec![vec![
        Step::Raw(OPEN_FRAME.to_string()),
        Step::Record,
        Step::Raw(r#"44{"message":"Not authorized"}"#.to_string()),
        Step::AwaitClose,
    ]])
    .await;

    let (mut channel, mut events) =
        SubscriptionChannel::with_observer(config(&server.base_url, true));
    let err = channel.get_trade("USDTTMN").await.unwrap_err();
    match err {
        WallexError::Protocol(message) => assert!(message.contains("Not authorized")),
        other => panic!("Expected Protocol error, got {other:?}"),
    }
    assert_eq!(
        disconnects(&drain(&mut events)),
        vec![DisconnectReason::ConnectFailed]
    );
}

#[tokio::test]
async fn test_streaming_accessor_keeps_subscription() {
    let server = FakeSocketIo::start(vec![vec![
        Step::Handshake,
        Step::Record,
        broadcast("USDTTMN@sellDepth", json!({"p": 1})),
        Step::Sleep(Duration::from_millis(100)),
        broadcast("USDTTMN@sellDepth", json!({"p": 2})),
        Step::AwaitClose,
    ]])
    .await;

    let mut channel = SubscriptionChannel::new(config(&server.base_url, false));
    let first = assert_ok!(channel.get_sell_depth("USDTTMN").await);
    assert_eq!(first, json!({"p": 1}));
    assert_ne!(channel.state(), ChannelState::Disconnected);

    assert!(wait_until(|| channel.latest_data() == Some(json!({"p": 2}))).await);

    channel.disconnect().await;
    assert_eq!(channel.state(), ChannelState::Disconnected);
}

#[tokio::test]
async fn test_server_disconnect_before_first_message() {
    let server = FakeSocketIo::start(vec![vec![
        Step::Handshake,
        Step::Record,
        Step::Raw("41".to_string()),
        Step::Drop,
    ]])
    .await;

    let (mut channel, mut events) =
        SubscriptionChannel::with_observer(config(&server.base_url, true));
    let err = channel.get_trade("USDTTMN").await.unwrap_err();
    assert!(matches!(err, WallexError::WebSocket(_)), "unexpected error: {err:?}");
    assert!(channel.latest_data().is_none());
    assert_eq!(
        disconnects(&drain(&mut events)),
        vec![DisconnectReason::ServerClosed]
    );
}
