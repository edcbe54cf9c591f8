pub mod tokens;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Message shown when the simulated settlement rejects a swap
pub const DEFAULT_FAILURE_MESSAGE: &str = "Transaction rejected by the network. Please try again.";

/// Timing and outcome configuration for the swap lifecycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwapConfig {
    /// Delay between closing the confirmation and showing the pending dialog
    pub stage_delay_ms: u64,
    /// Simulated network latency before the swap settles
    pub settlement_delay_ms: u64,
    /// How long a confirmed swap stays on screen before closing itself
    pub auto_close_delay_ms: u64,
    /// Grace period after the status dialog hides before state resets
    pub exit_animation_ms: u64,
    /// Chance that a simulated settlement succeeds, in [0, 1]
    pub success_probability: f64,
    pub failure_message: String,
    /// Base URL of the block explorer used for "View Details" links
    pub explorer_url: String,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            stage_delay_ms: 100,
            settlement_delay_ms: 3000,
            auto_close_delay_ms: 3000,
            exit_animation_ms: 150,
            success_probability: 0.8,
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
            explorer_url: "https://solscan.io".to_string(),
        }
    }
}

impl SwapConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            stage_delay_ms: env_u64("SWAP_STAGE_DELAY_MS").unwrap_or(defaults.stage_delay_ms),
            settlement_delay_ms: env_u64("SWAP_SETTLEMENT_DELAY_MS")
                .unwrap_or(defaults.settlement_delay_ms),
            auto_close_delay_ms: env_u64("SWAP_AUTO_CLOSE_MS")
                .unwrap_or(defaults.auto_close_delay_ms),
            exit_animation_ms: env_u64("SWAP_EXIT_ANIMATION_MS")
                .unwrap_or(defaults.exit_animation_ms),
            success_probability: std::env::var("SWAP_SUCCESS_PROBABILITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.success_probability),
            failure_message: defaults.failure_message,
            explorer_url: std::env::var("SWAP_EXPLORER_URL")
                .unwrap_or(defaults.explorer_url),
        }
    }

    /// Check if the configuration describes a usable lifecycle
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.success_probability)
            && self.settlement_delay_ms > 0
            && !self.explorer_url.is_empty()
    }

    pub fn stage_delay(&self) -> Duration {
        Duration::from_millis(self.stage_delay_ms)
    }

    pub fn settlement_delay(&self) -> Duration {
        Duration::from_millis(self.settlement_delay_ms)
    }

    pub fn auto_close_delay(&self) -> Duration {
        Duration::from_millis(self.auto_close_delay_ms)
    }

    pub fn exit_animation(&self) -> Duration {
        Duration::from_millis(self.exit_animation_ms)
    }

    pub fn transaction_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), hash)
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
