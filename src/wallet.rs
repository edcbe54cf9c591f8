// src/wallet.rs
use crate::errors::Result;
use crate::notify::{Notice, NoticeLevel, Notifier};
use crate::random::{random_hex, RandomSource};
use crate::storage::KeyValueStore;
use std::sync::Arc;

/// Key under which the connected address survives restarts
pub const WALLET_ADDRESS_KEY: &str = "walletAddress";

/// Mock wallet connection; no keys are involved, only a display address
pub struct WalletSession {
    store: Arc<dyn KeyValueStore>,
    random: Arc<dyn RandomSource>,
    notifier: Arc<dyn Notifier>,
    connecting: bool,
    address: Option<String>,
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("connecting", &self.connecting)
            .field("address", &self.address)
            .finish()
    }
}

impl WalletSession {
    /// Restore a previously connected address from the store
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        random: Arc<dyn RandomSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let address = store.get(WALLET_ADDRESS_KEY)?.filter(|a| !a.is_empty());
        if let Some(address) = &address {
            log::info!("Restored wallet connection for {}", address);
        }
        Ok(Self {
            store,
            random,
            notifier,
            connecting: false,
            address,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Connect with a freshly generated mock address. No-op when already connected.
    pub fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        self.connecting = true;
        let address = generate_mock_address(self.random.as_ref());
        let persisted = self.store.set(WALLET_ADDRESS_KEY, &address);
        self.connecting = false;

        if let Err(e) = persisted {
            log::error!("Error connecting wallet: {}", e);
            self.notifier.notify(Notice::new(
                NoticeLevel::Destructive,
                "Wallet error",
                "Failed to connect wallet. Please try again.",
            ));
            return Err(e.into());
        }

        log::info!("Wallet connected: {}", address);
        self.address = Some(address);
        self.notifier.notify(Notice::new(
            NoticeLevel::Success,
            "Wallet connected successfully!",
            "",
        ));
        Ok(())
    }

    /// Forget the address locally and in the store
    pub fn disconnect(&mut self) -> Result<()> {
        self.address = None;
        self.connecting = false;

        if let Err(e) = self.store.clear(WALLET_ADDRESS_KEY) {
            log::error!("Error disconnecting wallet: {}", e);
            self.notifier.notify(Notice::new(
                NoticeLevel::Destructive,
                "Wallet error",
                "Failed to disconnect wallet",
            ));
            return Err(e.into());
        }

        self.notifier
            .notify(Notice::new(NoticeLevel::Info, "Wallet disconnected", ""));
        Ok(())
    }

    /// Connected address shortened for display
    pub fn display_address(&self, keep: usize) -> Option<String> {
        self.address.as_deref().map(|a| truncate_address(a, keep))
    }
}

/// Fake address shaped like "1a2b3c4d...5e6f7a8b"
pub fn generate_mock_address(random: &dyn RandomSource) -> String {
    format!("{}...{}", random_hex(random, 4), random_hex(random, 4))
}

/// Keep the first and last `keep` characters, e.g. "1a2b...7a8b"
pub fn truncate_address(address: &str, keep: usize) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= keep * 2 {
        return address.to_string();
    }
    let head: String = chars[..keep].iter().collect();
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("{head}...{tail}")
}
