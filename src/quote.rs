// src/quote.rs
use crate::config::tokens::{parse_amount, TokenRegistry};
use serde::{Deserialize, Serialize};

/// Flat network fee shown for every simulated swap
pub const NETWORK_FEE: &str = "~$5.23";

/// Fallback rate for pairs without a dedicated quote
const DEFAULT_RATE: f64 = 1.2;

/// Amounts above this size are quoted with the higher price impact
const LARGE_TRADE_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapDetails {
    pub network_fee: String,
    pub price_impact: String,
    pub exchange_rate: String,
}

impl Default for SwapDetails {
    fn default() -> Self {
        Self {
            network_fee: NETWORK_FEE.to_string(),
            price_impact: "0.05%".to_string(),
            exchange_rate: "1 ETH = 1913 USDC".to_string(),
        }
    }
}

/// Derived values for the current form input; amounts are empty when there is nothing to quote
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Quote {
    pub to_amount: String,
    pub from_amount_usd: String,
    pub to_amount_usd: String,
    pub details: SwapDetails,
}

impl Quote {
    pub fn is_empty(&self) -> bool {
        self.to_amount.is_empty()
    }
}

/// Simulated exchange rate between two symbols
pub fn exchange_rate(from: &str, to: &str) -> f64 {
    match (from, to) {
        ("ETH", "USDC") => 1913.0,
        ("BTC", "USDC") => 83451.0,
        ("ETH", "BTC") => 0.023,
        ("BTC", "ETH") => 43.36,
        _ => DEFAULT_RATE,
    }
}

/// Quote `from_amount` of `from` into `to`.
///
/// Details keep their last meaningful value when the amount is cleared, so callers
/// pass the previous details back in.
pub fn calculate(
    from_amount: &str,
    from: &str,
    to: &str,
    registry: &TokenRegistry,
    previous_details: &SwapDetails,
) -> Quote {
    let empty = Quote {
        details: previous_details.clone(),
        ..Quote::default()
    };

    if from_amount.is_empty() || from_amount == "0" {
        return empty;
    }
    let Some(amount) = parse_amount(from_amount) else {
        return empty;
    };

    let rate = exchange_rate(from, to);
    let calculated = amount * rate;

    let from_amount_usd = registry
        .find(from)
        .and_then(|t| t.usd_per_unit())
        .map(|per_unit| format!("{:.2}", amount * per_unit))
        .unwrap_or_default();

    let to_amount_usd = if calculated != 0.0 {
        registry
            .find(to)
            .and_then(|t| t.usd_per_unit())
            .map(|per_unit| format!("{:.2}", calculated * per_unit))
            .unwrap_or_default()
    } else {
        String::new()
    };

    Quote {
        to_amount: format!("{:.4}", calculated),
        from_amount_usd,
        to_amount_usd,
        details: SwapDetails {
            network_fee: NETWORK_FEE.to_string(),
            price_impact: if amount > LARGE_TRADE_THRESHOLD {
                "0.32%".to_string()
            } else {
                "0.05%".to_string()
            },
            exchange_rate: format!("1 {} = {} {}", from, rate, to),
        },
    }
}

/// Decimal places used when filling an amount for `symbol`
pub fn display_decimals(symbol: &str) -> usize {
    match symbol {
        "ETH" | "BTC" => 4,
        _ => 2,
    }
}

/// Amount representing `percentage` of the token's balance
pub fn amount_for_percentage(registry: &TokenRegistry, symbol: &str, percentage: u8) -> Option<String> {
    let balance = registry.find(symbol)?.balance_amount()?;
    let amount = balance * f64::from(percentage) / 100.0;
    Some(format!("{:.*}", display_decimals(symbol), amount))
}

/// Whether `amount` is more than the wallet holds of `symbol`
pub fn exceeds_balance(registry: &TokenRegistry, symbol: &str, amount: &str) -> bool {
    if amount.is_empty() {
        return false;
    }
    match (registry.find(symbol).and_then(|t| t.balance_amount()), parse_amount(amount)) {
        (Some(balance), Some(amount)) => amount > balance,
        _ => false,
    }
}
