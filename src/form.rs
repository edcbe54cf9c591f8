use crate::config::tokens::TokenRegistry;
use crate::errors::Result;
use crate::quote::{self, Quote, SwapDetails};
use crate::selection::{TokenSelection, TokenSide};
use crate::slippage::SlippageSettings;
use crate::transaction::{is_valid_amount, SwapIntent};
use parking_lot::Mutex;
use std::sync::Arc;

/// Percentage shortcuts under the amount input; 100 is labelled MAX
pub const PERCENTAGE_SHORTCUTS: [u8; 4] = [25, 50, 75, 100];

/// Hook the transaction controller uses to reset the surrounding form after a successful swap
pub trait AmountFields: Send + Sync {
    fn clear_amounts(&self);
}

/// Everything the swap card renders, captured at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub selection: TokenSelection,
    pub from_amount: String,
    pub quote: Quote,
    pub selected_percentage: Option<u8>,
    pub slippage: SlippageSettings,
}

impl FormState {
    pub fn to_amount(&self) -> &str {
        &self.quote.to_amount
    }
}

/// The swap card: token pair, amounts, percentage shortcut and slippage
pub struct SwapForm {
    registry: Arc<TokenRegistry>,
    state: Mutex<FormState>,
}

impl std::fmt::Debug for SwapForm {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("SwapForm")
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl SwapForm {
    pub fn new(registry: Arc<TokenRegistry>) -> Self {
        Self {
            registry,
            state: Mutex::new(FormState {
                selection: TokenSelection::default(),
                from_amount: String::new(),
                quote: Quote::default(),
                selected_percentage: None,
                slippage: SlippageSettings::default(),
            }),
        }
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub fn snapshot(&self) -> FormState {
        self.state.lock().clone()
    }

    /// Typed input; drops any percentage shortcut that produced the previous value
    pub fn set_from_amount(&self, amount: &str) {
        let mut state = self.state.lock();
        state.from_amount = amount.trim().to_string();
        state.selected_percentage = None;
        self.requote(&mut state);
    }

    /// Fill the amount with a share of the from-token balance
    pub fn select_percentage(&self, percentage: u8) {
        let mut state = self.state.lock();
        state.selected_percentage = Some(percentage);
        let symbol = state.selection.from_token().to_string();
        if let Some(amount) = quote::amount_for_percentage(&self.registry, &symbol, percentage) {
            state.from_amount = amount;
            self.requote(&mut state);
        }
    }

    pub fn open_token_picker(&self, side: TokenSide) {
        self.state.lock().selection.open_picker(side);
    }

    pub fn close_token_picker(&self) {
        self.state.lock().selection.close_picker();
    }

    pub fn select_token(&self, symbol: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.selection.select(&self.registry, symbol)?;
        self.requote(&mut state);
        Ok(())
    }

    /// Swap the pair; the previous output becomes the new input
    pub fn flip(&self) {
        let mut state = self.state.lock();
        state.selection.flip();
        state.from_amount = state.quote.to_amount.clone();
        state.selected_percentage = None;
        self.requote(&mut state);
    }

    pub fn toggle_slippage_menu(&self) {
        self.state.lock().slippage.toggle_menu();
    }

    pub fn select_slippage(&self, value: &str) {
        self.state.lock().slippage.select(value);
    }

    pub fn apply_custom_slippage(&self, input: &str) -> Result<()> {
        self.state.lock().slippage.apply_custom(input)
    }

    /// True when the typed amount is more than the wallet holds
    pub fn insufficient_balance(&self) -> bool {
        let state = self.state.lock();
        quote::exceeds_balance(&self.registry, state.selection.from_token(), &state.from_amount)
    }

    /// Swap button state: a positive amount the wallet can cover
    pub fn can_swap(&self) -> bool {
        let from_amount = self.state.lock().from_amount.clone();
        is_valid_amount(&from_amount) && !self.insufficient_balance()
    }

    /// Freeze the current inputs for a swap attempt
    pub fn intent(&self) -> SwapIntent {
        let state = self.state.lock();
        SwapIntent {
            from_token: state.selection.from_token().to_string(),
            to_token: state.selection.to_token().to_string(),
            from_amount: state.from_amount.clone(),
            to_amount: state.quote.to_amount.clone(),
        }
    }

    fn requote(&self, state: &mut FormState) {
        let previous: SwapDetails = state.quote.details.clone();
        state.quote = quote::calculate(
            &state.from_amount,
            state.selection.from_token(),
            state.selection.to_token(),
            &self.registry,
            &previous,
        );
    }
}

impl AmountFields for SwapForm {
    fn clear_amounts(&self) {
        let mut state = self.state.lock();
        state.from_amount.clear();
        state.selected_percentage = None;
        self.requote(&mut state);
        log::debug!("Swap form amounts cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tokens::default_registry;

    fn form() -> SwapForm {
        SwapForm::new(Arc::new(default_registry().clone()))
    }

    #[test]
    fn test_amount_entry_requotes() {
        let form = form();
        form.set_from_amount("1");
        let state = form.snapshot();
        assert_eq!(state.to_amount(), "1913.0000");
        assert_eq!(state.quote.details.exchange_rate, "1 ETH = 1913 USDC");
    }

    #[test]
    fn test_percentage_fills_amount() {
        let form = form();
        form.select_percentage(100);
        let state = form.snapshot();
        assert_eq!(state.from_amount, "1.2340");
        assert_eq!(state.selected_percentage, Some(100));
        assert!(!form.insufficient_balance());

        form.set_from_amount("2");
        assert_eq!(form.snapshot().selected_percentage, None);
        assert!(form.insufficient_balance());
    }

    #[test]
    fn test_flip_moves_output_to_input() {
        let form = form();
        form.set_from_amount("1");
        form.flip();
        let state = form.snapshot();
        assert_eq!(state.selection.from_token(), "USDC");
        assert_eq!(state.from_amount, "1913.0000");
        // USDC -> ETH has no dedicated rate
        assert_eq!(state.to_amount(), format!("{:.4}", 1913.0 * 1.2));
    }

    #[test]
    fn test_clear_amounts() {
        let form = form();
        form.select_percentage(50);
        form.clear_amounts();
        let state = form.snapshot();
        assert!(state.from_amount.is_empty());
        assert!(state.to_amount().is_empty());
        assert_eq!(state.selected_percentage, None);
        assert_eq!(state.selection.from_token(), "ETH");
    }

    #[test]
    fn test_percentage_shortcuts_cover_balance() {
        let form = form();
        let amounts: Vec<String> = PERCENTAGE_SHORTCUTS
            .iter()
            .map(|pct| {
                form.select_percentage(*pct);
                form.snapshot().from_amount
            })
            .collect();
        assert_eq!(amounts, vec!["0.3085", "0.6170", "0.9255", "1.2340"]);
        assert!(form.can_swap());
    }

    #[test]
    fn test_can_swap_needs_amount_within_balance() {
        let form = form();
        assert!(!form.can_swap());
        for amount in ["0", "abc", "2"] {
            form.set_from_amount(amount);
            assert!(!form.can_swap(), "{}", amount);
        }
        form.set_from_amount("0.5");
        assert!(form.can_swap());
    }

    #[test]
    fn test_close_token_picker_keeps_pair() {
        let form = form();
        form.open_token_picker(TokenSide::To);
        assert!(form.snapshot().selection.show_picker());
        form.close_token_picker();
        let selection = form.snapshot().selection;
        assert!(!selection.show_picker());
        assert_eq!(selection.active_side(), None);
        assert_eq!(selection.to_token(), "USDC");
    }

    #[test]
    fn test_slippage_menu_toggle_and_select() {
        let form = form();
        form.toggle_slippage_menu();
        assert!(form.snapshot().slippage.show_menu());
        form.select_slippage("1.0");
        let slippage = form.snapshot().slippage;
        assert!(!slippage.show_menu());
        assert_eq!(slippage.value(), "1.0");
    }

    #[test]
    fn test_intent_captures_inputs() {
        let form = form();
        form.open_token_picker(TokenSide::From);
        form.select_token("BTC").unwrap();
        form.set_from_amount("0.01");
        let intent = form.intent();
        assert_eq!(intent.from_token, "BTC");
        assert_eq!(intent.to_token, "USDC");
        assert_eq!(intent.from_amount, "0.01");
        assert_eq!(intent.to_amount, "834.5100");
    }
}
