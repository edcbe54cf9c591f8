use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// A token the widget can swap, as listed in the registry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub name: String,
    /// Display balance, may contain thousands separators ("1,234.56")
    pub balance: String,
    #[serde(rename = "usdValue", default, skip_serializing_if = "Option::is_none")]
    pub usd_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(rename = "contractAddress", default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

impl Token {
    /// Numeric balance, ignoring separators
    pub fn balance_amount(&self) -> Option<f64> {
        parse_amount(&self.balance)
    }

    /// USD price of one unit, derived from the holding's value and balance
    pub fn usd_per_unit(&self) -> Option<f64> {
        let usd = parse_amount(self.usd_value.as_deref()?)?;
        let balance = self.balance_amount()?;
        if balance > 0.0 {
            Some(usd / balance)
        } else {
            None
        }
    }
}

/// Parse a display amount such as "3,702.00"
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// Embed the local JSON file at compile time
static TOKENS_JSON: &str = include_str!("../../assets/tokens.json");

// Parse JSON only once when first accessed
static DEFAULT_REGISTRY: LazyLock<TokenRegistry> =
    LazyLock::new(|| TokenRegistry::from_json(TOKENS_JSON));

/// Read-only list of tokens offered by the widget
#[derive(Clone, Debug, PartialEq)]
pub struct TokenRegistry {
    tokens: Vec<Token>,
}

impl TokenRegistry {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Parse a registry from JSON, falling back to ETH/USDC when the payload is unusable
    pub fn from_json(json_str: &str) -> Self {
        match serde_json::from_str::<Vec<Token>>(json_str) {
            Ok(tokens) if !tokens.is_empty() => {
                log::info!("Loaded {} tokens from registry JSON", tokens.len());
                Self { tokens }
            }
            Ok(_) => {
                log::warn!("Token registry JSON is empty, using fallback tokens");
                Self::fallback()
            }
            Err(e) => {
                log::error!("Failed to parse token registry JSON: {}", e);
                Self::fallback()
            }
        }
    }

    fn fallback() -> Self {
        Self {
            tokens: vec![
                Token {
                    symbol: "ETH".to_string(),
                    name: "ETHEREUM".to_string(),
                    balance: "1.234".to_string(),
                    usd_value: Some("3,702.00".to_string()),
                    icon: None,
                    contract_address: Some("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".to_string()),
                },
                Token {
                    symbol: "USDC".to_string(),
                    name: "USD COIN".to_string(),
                    balance: "1,234.56".to_string(),
                    usd_value: Some("1,234.56".to_string()),
                    icon: None,
                    contract_address: Some("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string()),
                },
            ],
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn find(&self, symbol: &str) -> Option<&Token> {
        self.tokens.iter().find(|t| t.symbol == symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.find(symbol).is_some()
    }

    /// Full token name, or the symbol itself when unknown
    pub fn full_name(&self, symbol: &str) -> String {
        self.find(symbol)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| symbol.to_string())
    }

    /// Case-insensitive match on name or symbol; an empty query returns everything
    pub fn search(&self, query: &str) -> Vec<&Token> {
        let query = query.trim().to_lowercase();
        self.tokens
            .iter()
            .filter(|t| {
                query.is_empty()
                    || t.name.to_lowercase().contains(&query)
                    || t.symbol.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Registry entries for the given symbols, in registry order
    pub fn recent<'a>(&'a self, symbols: &[String]) -> Vec<&'a Token> {
        self.tokens
            .iter()
            .filter(|t| symbols.contains(&t.symbol))
            .collect()
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        DEFAULT_REGISTRY.clone()
    }
}

/// Shared reference to the embedded registry
pub fn default_registry() -> &'static TokenRegistry {
    &DEFAULT_REGISTRY
}
