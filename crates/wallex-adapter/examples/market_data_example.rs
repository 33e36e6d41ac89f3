/*
[INPUT]:  Market symbol (e.g., "USDTTMN")
[OUTPUT]: Market list, order book and recent trades
[POS]:    Examples - public market data queries
[UPDATE]: When adding new market data endpoints
*/

use wallex_adapter::*;

/// Example: Query market data (no API key required)
#[tokio::main]
async fn main() {
    println!("=== Wallex Market Data Example ===\n");

    let client = match WallexClient::new() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    let market = MarketInfo::new(client);
    let symbol = "USDTTMN";

    println!("Querying markets...");
    match market.get_markets().await {
        Ok(resp) => println!("✓ status {} success {:?}", resp.status, resp.success()),
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\nQuerying order book for {}...", symbol);
    match market.get_order_book_symbol(symbol).await {
        Ok(resp) => println!("✓ Depth: {}", resp.body),
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\nQuerying latest trades for {}...", symbol);
    match market.get_latest_trades(symbol).await {
        Ok(resp) => println!("✓ Trades: {}", resp.body),
        Err(e) => println!("✗ Error: {}", e),
    }

    println!("\n✓ Market data example complete");
}
