/*
[INPUT]:  Market symbol and stream event
[OUTPUT]: One-shot trade snapshot, then a short live depth stream
[POS]:    Examples - socket.io subscription channel
[UPDATE]: When the channel API changes
*/

use std::time::Duration;

use wallex_adapter::*;

#[tokio::main]
async fn main() {
    println!("=== Wallex WebSocket Example ===\n");

    // One-shot: connect, read the first trade, disconnect
    let mut channel = SubscriptionChannel::new(ChannelConfig::default());
    match channel.get_trade("USDTTMN").await {
        Ok(trade) => println!("✓ Trade snapshot: {}", trade),
        Err(e) => println!("✗ Error: {}", e),
    }

    // Streaming: keep the subscription open for a few seconds
    let config = ChannelConfig {
        once: false,
        ..ChannelConfig::default()
    };
    let (mut channel, mut events) = SubscriptionChannel::with_observer(config);
    let subscribed = channel
        .subscribe("USDTTMN", StreamEvent::BuyDepth, |payload| {
            println!("  buy depth: {}", payload);
            Ok(())
        })
        .await;
    if let Err(e) = subscribed {
        println!("✗ Subscribe failed: {}", e);
        return;
    }

    tokio::time::sleep(Duration::from_secs(5)).await;
    channel.disconnect().await;

    while let Ok(event) = events.try_recv() {
        println!("  event: {:?}", event);
    }
    println!("\n✓ WebSocket example complete");
}
