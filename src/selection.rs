use crate::config::tokens::TokenRegistry;
use crate::errors::{Result, SwapError};
use serde::{Deserialize, Serialize};

const MAX_RECENT_TOKENS: usize = 3;

/// Which side of the pair the token picker is filling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenSide {
    From,
    To,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenSelection {
    from_token: String,
    to_token: String,
    active_side: Option<TokenSide>,
    show_picker: bool,
    recent_tokens: Vec<String>,
}

impl Default for TokenSelection {
    fn default() -> Self {
        Self {
            from_token: "ETH".to_string(),
            to_token: "USDC".to_string(),
            active_side: None,
            show_picker: false,
            recent_tokens: vec!["ETH".to_string(), "USDC".to_string()],
        }
    }
}

impl TokenSelection {
    pub fn from_token(&self) -> &str {
        &self.from_token
    }

    pub fn to_token(&self) -> &str {
        &self.to_token
    }

    pub fn active_side(&self) -> Option<TokenSide> {
        self.active_side
    }

    pub fn show_picker(&self) -> bool {
        self.show_picker
    }

    pub fn recent_tokens(&self) -> &[String] {
        &self.recent_tokens
    }

    /// Open the search modal for one side of the pair
    pub fn open_picker(&mut self, side: TokenSide) {
        self.active_side = Some(side);
        self.show_picker = true;
    }

    pub fn close_picker(&mut self) {
        self.show_picker = false;
        self.active_side = None;
    }

    /// Assign `symbol` to the side the picker was opened for and remember it as recent
    pub fn select(&mut self, registry: &TokenRegistry, symbol: &str) -> Result<()> {
        if !registry.contains(symbol) {
            return Err(SwapError::UnknownToken(symbol.to_string()));
        }

        match self.active_side {
            Some(TokenSide::From) => self.from_token = symbol.to_string(),
            Some(TokenSide::To) => self.to_token = symbol.to_string(),
            None => log::debug!("Token {} picked with no active side", symbol),
        }

        if !self.recent_tokens.iter().any(|s| s == symbol) {
            self.recent_tokens.insert(0, symbol.to_string());
            self.recent_tokens.truncate(MAX_RECENT_TOKENS);
        }

        self.close_picker();
        Ok(())
    }

    /// Swap the from and to tokens
    pub fn flip(&mut self) {
        std::mem::swap(&mut self.from_token, &mut self.to_token);
    }
}
