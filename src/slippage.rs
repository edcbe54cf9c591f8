use crate::config::tokens::parse_amount;
use crate::errors::{Result, SwapError};

/// Preset slippage tolerances offered in the menu, in percent
pub const SLIPPAGE_PRESETS: [&str; 3] = ["0.1", "0.5", "1.0"];

pub const DEFAULT_SLIPPAGE: &str = "0.5";

#[derive(Debug, Clone, PartialEq)]
pub struct SlippageSettings {
    slippage: String,
    show_menu: bool,
}

impl Default for SlippageSettings {
    fn default() -> Self {
        Self {
            slippage: DEFAULT_SLIPPAGE.to_string(),
            show_menu: false,
        }
    }
}

impl SlippageSettings {
    pub fn value(&self) -> &str {
        &self.slippage
    }

    pub fn percent(&self) -> f64 {
        parse_amount(&self.slippage).unwrap_or(0.0)
    }

    /// Menu label, e.g. "0.5%"
    pub fn label(&self) -> String {
        format!("{}%", self.slippage)
    }

    pub fn show_menu(&self) -> bool {
        self.show_menu
    }

    pub fn toggle_menu(&mut self) {
        self.show_menu = !self.show_menu;
    }

    pub fn close_menu(&mut self) {
        self.show_menu = false;
    }

    pub fn is_custom(&self) -> bool {
        !SLIPPAGE_PRESETS.contains(&self.slippage.as_str())
    }

    /// Pick one of the presets (or any value the menu hands back) and close the menu
    pub fn select(&mut self, value: &str) {
        self.slippage = value.to_string();
        self.show_menu = false;
    }

    /// Apply a typed custom value; the menu closes only when it is accepted
    pub fn apply_custom(&mut self, input: &str) -> Result<()> {
        if !is_partial_decimal(input) || parse_amount(input).is_none() {
            return Err(SwapError::InvalidSlippage(input.to_string()));
        }
        self.select(input);
        Ok(())
    }

    /// Least amount received once the tolerance is applied
    pub fn minimum_received(&self, to_amount: &str) -> Option<f64> {
        parse_amount(to_amount).map(|amount| amount * (1.0 - self.percent() / 100.0))
    }
}

/// Whether `input` is an acceptable keystroke state for the custom field: digits with at most one dot
pub fn is_partial_decimal(input: &str) -> bool {
    let mut seen_dot = false;
    input.chars().all(|c| match c {
        '0'..='9' => true,
        '.' if !seen_dot => {
            seen_dot = true;
            true
        }
        _ => false,
    })
}
