/*
[INPUT]:  Parsed subcommand, CLI configuration, shutdown token
[OUTPUT]: JSON value per command; streamed payloads on stdout
[POS]:    Command layer - maps subcommands onto adapter facades
[UPDATE]: When adding commands or adapter operations
*/

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use wallex_adapter::{
    AccountManage, ApiResponse, ChannelEvent, CryptoWithdrawalRequest, MarketInfo, MarketsOtc,
    OrderType, OrdersManage, PlaceOrderRequest, Side, StreamEvent, SubscriptionChannel,
    WallexClient,
};

use crate::config::CliConfig;

const DEFAULT_HISTORY_SECS: i64 = 24 * 60 * 60;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Public market data
    #[command(subcommand)]
    Market(MarketCommand),
    /// Account data and withdrawals (requires api key)
    #[command(subcommand)]
    Account(AccountCommand),
    /// Order placement and lookup (requires api key)
    #[command(subcommand)]
    Orders(OrdersCommand),
    /// OTC quotes and orders (requires api key)
    #[command(subcommand)]
    Otc(OtcCommand),
    /// Real-time socket.io feeds
    #[command(subcommand)]
    Stream(StreamCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum MarketCommand {
    Markets,
    Currencies,
    OrderBook {
        symbol: String,
        /// Aggregated depth across all levels
        #[arg(long)]
        all: bool,
    },
    Trades {
        symbol: String,
    },
    History {
        symbol: String,
        #[arg(long, default_value = "60")]
        resolution: String,
        /// Range start, unix seconds (default: 24h before --to)
        #[arg(long)]
        from: Option<i64>,
        /// Range end, unix seconds (default: now)
        #[arg(long)]
        to: Option<i64>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AccountCommand {
    Profile,
    Fee,
    CardNumbers,
    Ibans,
    Balances,
    MoneyDeposits,
    MoneyWithdrawals,
    CryptoDeposits,
    CryptoWithdrawals,
    Transfers,
    /// Withdraw fiat to a registered IBAN id
    WithdrawMoney {
        #[arg(long)]
        iban: u64,
        #[arg(long)]
        value: Decimal,
    },
    WithdrawCrypto {
        #[arg(long)]
        coin: String,
        #[arg(long)]
        network: String,
        #[arg(long)]
        value: Decimal,
        #[arg(long)]
        address: String,
        #[arg(long)]
        memo: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum OrdersCommand {
    Place {
        symbol: String,
        /// BUY or SELL
        #[arg(long)]
        side: Side,
        /// LIMIT or MARKET
        #[arg(long = "type", default_value = "LIMIT")]
        order_type: OrderType,
        #[arg(long)]
        price: Decimal,
        #[arg(long)]
        quantity: Decimal,
        #[arg(long)]
        client_id: Option<String>,
    },
    Get {
        client_id: String,
    },
    Cancel {
        client_id: String,
    },
    Open {
        #[arg(long)]
        symbol: Option<String>,
    },
    Trades {
        #[arg(long)]
        symbol: Option<String>,
        /// BUY or SELL; sent to the API as buy/sell
        #[arg(long)]
        side: Option<Side>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum OtcCommand {
    Markets,
    Price {
        symbol: String,
        /// BUY or SELL
        side: String,
    },
    Order {
        symbol: String,
        side: String,
        amount: Decimal,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum StreamCommand {
    MarketCap(StreamArgs),
    BuyDepth(StreamArgs),
    SellDepth(StreamArgs),
    Trade(StreamArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StreamArgs {
    pub symbol: String,
    /// Keep printing payloads until interrupted
    #[arg(long)]
    pub follow: bool,
}

impl StreamCommand {
    fn parts(&self) -> (StreamEvent, &StreamArgs) {
        match self {
            StreamCommand::MarketCap(args) => (StreamEvent::MarketCap, args),
            StreamCommand::BuyDepth(args) => (StreamEvent::BuyDepth, args),
            StreamCommand::SellDepth(args) => (StreamEvent::SellDepth, args),
            StreamCommand::Trade(args) => (StreamEvent::Trade, args),
        }
    }
}

/// Run one command; `None` means output was already streamed
pub async fn run(
    command: Command,
    config: &CliConfig,
    shutdown: CancellationToken,
) -> Result<Option<Value>> {
    let response = match command {
        Command::Stream(stream) => return run_stream(stream, config, shutdown).await,
        Command::Market(cmd) => run_market(cmd, rest_client(config)?).await?,
        Command::Account(cmd) => {
            let account = AccountManage::new(rest_client(config)?, config.credentials()?);
            run_account(cmd, &account).await?
        }
        Command::Orders(cmd) => {
            let orders = OrdersManage::new(rest_client(config)?, config.credentials()?);
            run_orders(cmd, &orders).await?
        }
        Command::Otc(cmd) => {
            let otc = MarketsOtc::new(rest_client(config)?, config.credentials()?);
            run_otc(cmd, &otc).await?
        }
    };

    if !response.is_http_success() {
        warn!(
            status = response.status,
            message = ?response.message(),
            "wallex returned error status"
        );
    }
    Ok(Some(serde_json::to_value(&response)?))
}

fn rest_client(config: &CliConfig) -> Result<WallexClient> {
    WallexClient::with_config(config.client_config()).context("build http client")
}

async fn run_market(cmd: MarketCommand, client: WallexClient) -> Result<ApiResponse> {
    let market = MarketInfo::new(client);
    let response = match cmd {
        MarketCommand::Markets => market.get_markets().await?,
        MarketCommand::Currencies => market.get_currencies().await?,
        MarketCommand::OrderBook { symbol, all: false } => {
            market.get_order_book_symbol(&symbol).await?
        }
        MarketCommand::OrderBook { symbol, all: true } => market.get_order_book_all(&symbol).await?,
        MarketCommand::Trades { symbol } => market.get_latest_trades(&symbol).await?,
        MarketCommand::History {
            symbol,
            resolution,
            from,
            to,
        } => {
            let (from, to) = history_range(from, to, chrono::Utc::now().timestamp());
            market
                .get_market_history(&symbol, &resolution, from, to)
                .await?
        }
    };
    Ok(response)
}

async fn run_account(cmd: AccountCommand, account: &AccountManage) -> Result<ApiResponse> {
    let response = match cmd {
        AccountCommand::Profile => account.get_profile().await?,
        AccountCommand::Fee => account.get_fee().await?,
        AccountCommand::CardNumbers => account.get_card_numbers().await?,
        AccountCommand::Ibans => account.get_ibans().await?,
        AccountCommand::Balances => account.get_balances().await?,
        AccountCommand::MoneyDeposits => account.get_money_deposit().await?,
        AccountCommand::MoneyWithdrawals => account.get_money_withdrawal().await?,
        AccountCommand::CryptoDeposits => account.get_crypto_deposit().await?,
        AccountCommand::CryptoWithdrawals => account.get_crypto_withdrawal().await?,
        AccountCommand::Transfers => account.get_transfers().await?,
        AccountCommand::WithdrawMoney { iban, value } => {
            account.set_money_withdrawal(iban, value).await?
        }
        AccountCommand::WithdrawCrypto {
            coin,
            network,
            value,
            address,
            memo,
        } => {
            account
                .set_crypto_withdrawal(CryptoWithdrawalRequest {
                    coin,
                    network,
                    value,
                    wallet_address: address,
                    memo,
                })
                .await?
        }
    };
    Ok(response)
}

async fn run_orders(cmd: OrdersCommand, orders: &OrdersManage) -> Result<ApiResponse> {
    let response = match cmd {
        OrdersCommand::Place {
            symbol,
            side,
            order_type,
            price,
            quantity,
            client_id,
        } => {
            let mut req = PlaceOrderRequest::new(symbol, order_type, side, price, quantity);
            req.client_id = client_id;
            orders.set_order(req).await?
        }
        OrdersCommand::Get { client_id } => orders.get_order(&client_id).await?,
        OrdersCommand::Cancel { client_id } => orders.del_order(&client_id).await?,
        OrdersCommand::Open { symbol } => orders.get_open_orders(symbol.as_deref()).await?,
        OrdersCommand::Trades { symbol, side } => {
            orders.get_last_trades(symbol.as_deref(), side).await?
        }
    };
    Ok(response)
}

async fn run_otc(cmd: OtcCommand, otc: &MarketsOtc) -> Result<ApiResponse> {
    let response = match cmd {
        OtcCommand::Markets => otc.get_otc_markets().await?,
        OtcCommand::Price { symbol, side } => otc.get_otc_price(&symbol, &side).await?,
        OtcCommand::Order {
            symbol,
            side,
            amount,
        } => otc.get_otc_orders(&symbol, &side, amount).await?,
    };
    Ok(response)
}

/// Fill missing history bounds relative to `now` (unix seconds)
pub fn history_range(from: Option<i64>, to: Option<i64>, now: i64) -> (i64, i64) {
    let to = to.unwrap_or(now);
    let from = from.unwrap_or(to - DEFAULT_HISTORY_SECS);
    (from, to)
}

async fn run_stream(
    command: StreamCommand,
    config: &CliConfig,
    shutdown: CancellationToken,
) -> Result<Option<Value>> {
    let (event, args) = command.parts();
    let (channel, events) = SubscriptionChannel::with_observer(config.channel_config(!args.follow));
    let mut channel = channel.with_cancellation(shutdown.child_token());
    let observer = tokio::spawn(log_channel_events(events));

    if !args.follow {
        let payload = match event {
            StreamEvent::MarketCap => channel.get_market_cap(&args.symbol).await,
            StreamEvent::BuyDepth => channel.get_buy_depth(&args.symbol).await,
            StreamEvent::SellDepth => channel.get_sell_depth(&args.symbol).await,
            StreamEvent::Trade => channel.get_trade(&args.symbol).await,
        }
        .with_context(|| format!("read {}{}", args.symbol, event))?;
        drop(channel);
        observer.abort();
        return Ok(Some(payload));
    }

    channel
        .subscribe(&args.symbol, event, |payload| {
            println!("{}", serde_json::to_string(&payload)?);
            Ok(())
        })
        .await
        .with_context(|| format!("subscribe {}{}", args.symbol, event))?;
    info!(symbol = %args.symbol, event = %event, "streaming; press Ctrl-C to stop");

    match channel.wait_disconnected().await {
        Ok(()) => warn!("stream ended by server"),
        Err(_) => info!("stream interrupted"),
    }
    channel.disconnect().await;
    drop(channel);
    observer.abort();
    Ok(None)
}

async fn log_channel_events(mut events: tokio::sync::mpsc::UnboundedReceiver<ChannelEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ChannelEvent::CallbackFailed { channel, message } => {
                warn!(channel = %channel, error = %message, "payload handler failed");
            }
            ChannelEvent::ConnectFailed { message } => {
                warn!(error = %message, "stream connect failed");
            }
            other => info!(event = ?other, "stream event"),
        }
    }
}
