//! Simulated token swap widget: form state, quotes, a mocked wallet and the
//! transaction lifecycle controller behind the confirmation and status dialogs.

pub mod config;
pub mod errors;
pub mod form;
pub mod notify;
pub mod prices;
pub mod quote;
pub mod random;
pub mod selection;
pub mod slippage;
pub mod storage;
pub mod transaction;
pub mod wallet;

pub use config::tokens::{default_registry, Token, TokenRegistry};
pub use config::SwapConfig;
pub use errors::{Result, StorageError, SwapError};
pub use form::{AmountFields, SwapForm};
pub use notify::{Notice, NoticeLevel, Notifier};
pub use random::{RandomSource, ThreadRandom};
pub use storage::KeyValueStore;
pub use transaction::{ControllerState, SwapIntent, TransactionController, TransactionStatus};
pub use wallet::WalletSession;
