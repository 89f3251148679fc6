use std::process::ExitCode;

use auth::ApiCredentials;
use binance_rest::BinanceRestClient;
use common::BinanceEnvironment;
use execution_core::{
    Coin, InMemoryTradeLog, JsonlTradeLog, TradeIntent, TradeLogStore, TradeSide,
};
use metrics::create_metrics;
use tracing::{error, info, warn};
use trade_executor::{cancellation, ExecutorConfig, TradeExecutor};

const USAGE: &str = "usage: runner <buy|sell> <ORIGIN> <TARGET>";

/// Environment variable naming the JSON-lines trade log file.
const TRADE_LOG_VAR: &str = "TRADE_LOG_PATH";

fn parse_intent(args: &[String]) -> Option<TradeIntent> {
    match args {
        [side, origin, target] => {
            let side = TradeSide::parse(side)?;
            Some(TradeIntent::new(Coin::new(origin), Coin::new(target), side))
        }
        _ => None,
    }
}

fn open_trade_log() -> Box<dyn TradeLogStore> {
    match std::env::var(TRADE_LOG_VAR) {
        Ok(path) if !path.trim().is_empty() => {
            info!(path = %path, "Writing trade log");
            Box::new(JsonlTradeLog::new(path))
        }
        _ => {
            info!("{TRADE_LOG_VAR} not set, keeping trade log in memory");
            Box::new(InMemoryTradeLog::new())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    common::init_logging();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let Some(intent) = parse_intent(&args) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    let credentials = match ApiCredentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            error!(error = %e, "Failed to load API credentials");
            return ExitCode::FAILURE;
        }
    };

    let environment = BinanceEnvironment::from_env();
    info!(environment = %environment, trade = %intent, "Starting trade");

    let client = match BinanceRestClient::with_environment(credentials, environment) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create REST client");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = client.sync_time().await {
        warn!(error = %e, "Server time sync failed, using local clock");
    }

    let symbol = intent.pair_symbol();
    match client.get_symbol_ticker(&symbol).await {
        Ok(ticker) => info!(symbol = %symbol, price = %ticker.price, "Current price"),
        Err(e) => warn!(symbol = %symbol, error = %e, "Failed to fetch current price"),
    }

    let metrics = create_metrics();

    // Ctrl+C ends the trade at its next wait
    let (cancel_tx, cancel) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, cancelling trade");
            let _ = cancel_tx.send(true);
        }
    });

    let executor = TradeExecutor::new(client, open_trade_log())
        .with_config(ExecutorConfig::default())
        .with_metrics(metrics.clone())
        .with_cancellation(cancel);

    let outcome = executor.run(&intent).await;

    let code = match &outcome {
        Ok(order) => {
            println!(
                "{} | order {} | {:?} {} | qty: {} | quote: {}",
                order.symbol,
                order.order_id,
                order.side,
                order.status,
                order.executed_qty,
                order.cumulative_quote_qty
            );
            ExitCode::SUCCESS
        }
        Err(exhausted) => {
            println!("{intent} failed: {exhausted}");
            if let Some(order_id) = exhausted.live_order_id() {
                println!("order {order_id} on {symbol} may still be open, check it on the exchange");
            }
            ExitCode::FAILURE
        }
    };

    println!("\n{}", metrics.snapshot());
    info!("Shutdown complete");
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_intent() {
        let intent = parse_intent(&args(&["buy", "eth", "BTC"])).unwrap();
        assert_eq!(intent.side, TradeSide::Buy);
        assert_eq!(intent.pair_symbol(), "ETHBTC");

        let intent = parse_intent(&args(&["SELL", "ADA", "BTC"])).unwrap();
        assert_eq!(intent.side, TradeSide::Sell);
    }

    #[test]
    fn test_parse_intent_rejects_bad_args() {
        assert!(parse_intent(&args(&[])).is_none());
        assert!(parse_intent(&args(&["hold", "ETH", "BTC"])).is_none());
        assert!(parse_intent(&args(&["buy", "ETH"])).is_none());
    }
}
