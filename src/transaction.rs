// src/transaction.rs
//! Lifecycle of a simulated swap: confirmation, pending settlement, outcome and
//! dialog dismissal.
//!
//! The controller owns every deferred task it schedules. Each task carries the
//! attempt generation it was spawned for and re-checks it (together with the
//! mounted flag) inside the same state update that would apply its effect, so a
//! task that outlives its attempt or the controller never mutates anything.

use crate::config::SwapConfig;
use crate::config::tokens::parse_amount;
use crate::errors::{Result, SwapError};
use crate::form::AmountFields;
use crate::notify::{Notice, NoticeLevel, Notifier};
use crate::random::{random_hex, RandomSource};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Idle,
    Confirming,
    Loading,
    Confirmed,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionStatus::Confirmed | TransactionStatus::Failed)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            TransactionStatus::Idle => "idle",
            TransactionStatus::Confirming => "confirming",
            TransactionStatus::Loading => "loading",
            TransactionStatus::Confirmed => "confirmed",
            TransactionStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// What the user asked to swap, frozen when the swap is requested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapIntent {
    pub from_token: String,
    pub to_token: String,
    pub from_amount: String,
    pub to_amount: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerState {
    pub show_confirmation: bool,
    pub show_transaction_status: bool,
    pub status: TransactionStatus,
    pub transaction_hash: String,
    pub error_message: String,
    /// Re-entrancy guard, held from confirm until the attempt has fully settled
    pub is_swapping: bool,
    pub intent: Option<SwapIntent>,
}

impl ControllerState {
    // Everything but the confirmation flag returns to its initial value
    fn reset_after_close(&mut self) {
        self.show_transaction_status = false;
        self.status = TransactionStatus::Idle;
        self.is_swapping = false;
        self.transaction_hash.clear();
        self.error_message.clear();
        self.intent = None;
    }

    /// A confirm has been accepted and the outcome is not known yet
    fn settlement_pending(&self) -> bool {
        self.is_swapping
            && matches!(
                self.status,
                TransactionStatus::Confirming | TransactionStatus::Loading
            )
    }
}

/// An amount can be swapped when it parses to a finite number above zero
pub fn is_valid_amount(amount: &str) -> bool {
    matches!(parse_amount(amount), Some(v) if v > 0.0)
}

#[derive(Debug, Default)]
struct PendingTasks {
    settlement: Option<JoinHandle<()>>,
    auto_close: Option<JoinHandle<()>>,
    reset: Option<JoinHandle<()>>,
    auto_close_armed_at: Option<Instant>,
}

impl PendingTasks {
    fn replace(slot: &mut Option<JoinHandle<()>>, task: JoinHandle<()>) {
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
    }

    fn cancel(slot: &mut Option<JoinHandle<()>>) {
        if let Some(task) = slot.take() {
            task.abort();
        }
    }

    fn cancel_auto_close(&mut self) {
        Self::cancel(&mut self.auto_close);
        self.auto_close_armed_at = None;
    }

    fn cancel_all(&mut self) {
        Self::cancel(&mut self.settlement);
        Self::cancel(&mut self.reset);
        self.cancel_auto_close();
    }
}

struct Inner {
    config: SwapConfig,
    state: watch::Sender<ControllerState>,
    tasks: Mutex<PendingTasks>,
    mounted: AtomicBool,
    generation: AtomicU64,
    random: Arc<dyn RandomSource>,
    notifier: Arc<dyn Notifier>,
    form: Arc<dyn AmountFields>,
    runtime: Handle,
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        self.mounted.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }

    /// Apply `f` only if the attempt `generation` is still the live one
    fn update_if_current(
        &self,
        generation: u64,
        f: impl FnOnce(&mut ControllerState) -> bool,
    ) -> bool {
        self.state
            .send_if_modified(|state| self.is_current(generation) && f(state))
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

async fn run_settlement(inner: Arc<Inner>, generation: u64) {
    tokio::time::sleep(inner.config.stage_delay()).await;

    let staged = inner.update_if_current(generation, |state| {
        state.show_transaction_status = true;
        state.status = TransactionStatus::Loading;
        true
    });
    if !staged {
        return;
    }
    log::info!("Starting swap process, transaction status is loading");

    tokio::time::sleep(inner.config.settlement_delay()).await;
    if !inner.is_current(generation) {
        return;
    }

    let draw = inner.random.next_f64();
    if draw < inner.config.success_probability {
        settle_success(&inner, generation);
    } else {
        settle_failure(&inner, generation);
    }
}

fn settle_success(inner: &Arc<Inner>, generation: u64) {
    let hash = format!("0x{}", random_hex(inner.random.as_ref(), 32));
    let mut intent = None;
    let applied = inner.update_if_current(generation, |state| {
        state.status = TransactionStatus::Confirmed;
        state.transaction_hash = hash.clone();
        state.error_message.clear();
        intent = state.intent.clone();
        true
    });
    if !applied {
        return;
    }
    log::info!("Swap confirmed with transaction {}", hash);
    announce_success(inner, generation, &hash, intent.as_ref());
}

// Side effects of a confirmed swap; skipped when the attempt was torn down after
// the state update landed
fn announce_success(inner: &Arc<Inner>, generation: u64, hash: &str, intent: Option<&SwapIntent>) {
    if !inner.is_current(generation) {
        return;
    }
    inner.form.clear_amounts();

    let description = match intent {
        Some(i) => format!(
            "Successfully swapped {} {} to {} {}",
            i.from_amount, i.from_token, i.to_amount, i.to_token
        ),
        None => "Swap completed".to_string(),
    };
    inner.notifier.notify(
        Notice::new(NoticeLevel::Success, "Swap Successful", description)
            .with_link(inner.config.transaction_url(hash)),
    );

    let task = inner
        .runtime
        .spawn(run_auto_close(Arc::clone(inner), generation));
    let mut tasks = inner.tasks.lock();
    if !inner.is_current(generation) {
        task.abort();
        return;
    }
    tasks.settlement = None;
    PendingTasks::replace(&mut tasks.auto_close, task);
    tasks.auto_close_armed_at = Some(Instant::now());
}

fn settle_failure(inner: &Arc<Inner>, generation: u64) {
    let message = inner.config.failure_message.clone();
    let applied = inner.update_if_current(generation, |state| {
        state.status = TransactionStatus::Failed;
        state.error_message = message.clone();
        state.is_swapping = false;
        true
    });
    if !applied {
        return;
    }

    log::warn!("Simulated swap settlement failed");
    announce_failure(inner, generation, message);
}

fn announce_failure(inner: &Arc<Inner>, generation: u64, message: String) {
    if !inner.is_current(generation) {
        return;
    }
    inner.tasks.lock().settlement = None;
    inner
        .notifier
        .notify(Notice::new(NoticeLevel::Destructive, "Swap Failed", message));
}

async fn run_auto_close(inner: Arc<Inner>, generation: u64) {
    tokio::time::sleep(inner.config.auto_close_delay()).await;

    let closed = inner.update_if_current(generation, |state| {
        if state.show_transaction_status && state.status == TransactionStatus::Confirmed {
            state.reset_after_close();
            true
        } else {
            false
        }
    });
    if closed {
        log::debug!("Auto-closed confirmed transaction dialog");
    }

    let mut tasks = inner.tasks.lock();
    tasks.auto_close = None;
    tasks.auto_close_armed_at = None;
}

async fn run_exit_reset(inner: Arc<Inner>, generation: u64) {
    tokio::time::sleep(inner.config.exit_animation()).await;

    inner.update_if_current(generation, |state| {
        if !state.show_transaction_status && state.status.is_terminal() {
            state.reset_after_close();
            true
        } else {
            false
        }
    });
    inner.tasks.lock().reset = None;
}

/// Drives one swap attempt at a time through confirmation, settlement and dismissal.
///
/// Deferred work runs on the Tokio runtime the controller was created on. Dropping
/// the controller disposes it.
pub struct TransactionController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for TransactionController {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("TransactionController")
            .field("state", &*self.inner.state.borrow())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

impl TransactionController {
    /// Create a controller bound to the current Tokio runtime
    pub fn new(
        config: SwapConfig,
        form: Arc<dyn AmountFields>,
        random: Arc<dyn RandomSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| SwapError::NoRuntime)?;
        Ok(Self::with_runtime(runtime, config, form, random, notifier))
    }

    pub fn with_runtime(
        runtime: Handle,
        config: SwapConfig,
        form: Arc<dyn AmountFields>,
        random: Arc<dyn RandomSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        if !config.is_valid() {
            log::warn!("Swap configuration looks invalid: {:?}", config);
        }
        let (state, _) = watch::channel(ControllerState::default());
        Self {
            inner: Arc::new(Inner {
                config,
                state,
                tasks: Mutex::new(PendingTasks::default()),
                mounted: AtomicBool::new(true),
                generation: AtomicU64::new(0),
                random,
                notifier,
                form,
                runtime,
            }),
        }
    }

    pub fn config(&self) -> &SwapConfig {
        &self.inner.config
    }

    pub fn snapshot(&self) -> ControllerState {
        self.inner.state.borrow().clone()
    }

    pub fn status(&self) -> TransactionStatus {
        self.inner.state.borrow().status
    }

    /// Receiver notified after every state change
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.inner.state.subscribe()
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    /// Explorer page for the confirmed transaction, if any
    pub fn explorer_link(&self) -> Option<String> {
        let state = self.inner.state.borrow();
        if state.transaction_hash.is_empty() {
            None
        } else {
            Some(self.inner.config.transaction_url(&state.transaction_hash))
        }
    }

    /// Fraction of the auto-close countdown that has elapsed, while one is running
    pub fn auto_close_progress(&self) -> Option<f64> {
        let armed_at = self.inner.tasks.lock().auto_close_armed_at?;
        let state = self.inner.state.borrow();
        if state.status != TransactionStatus::Confirmed || !state.show_transaction_status {
            return None;
        }
        let total = self.inner.config.auto_close_delay().as_secs_f64();
        if total <= 0.0 {
            return Some(1.0);
        }
        Some((armed_at.elapsed().as_secs_f64() / total).min(1.0))
    }

    /// User clicked "Swap": validate the amount and open the confirmation step
    pub fn request_swap(&self, intent: SwapIntent) -> Result<()> {
        if !is_valid_amount(&intent.from_amount) {
            log::warn!("Rejected swap request with amount {:?}", intent.from_amount);
            self.inner.notifier.notify(Notice::new(
                NoticeLevel::Destructive,
                "Invalid amount",
                "Please enter a valid amount to swap",
            ));
            return Err(SwapError::InvalidAmount(intent.from_amount));
        }

        let inner = &self.inner;
        if !self.is_mounted() {
            return Err(SwapError::Disposed);
        }
        let mut in_flight = false;
        inner.state.send_if_modified(|state| {
            if state.settlement_pending() {
                in_flight = true;
                return false;
            }
            // Stale deferred work from the previous attempt must not touch the new one
            inner.next_generation();
            *state = ControllerState {
                show_confirmation: true,
                status: TransactionStatus::Confirming,
                intent: Some(intent),
                ..ControllerState::default()
            };
            true
        });

        if in_flight {
            log::debug!("Swap requested while another is settling, ignoring");
            return Err(SwapError::SwapInFlight);
        }

        inner.tasks.lock().cancel_all();
        log::info!("Opening confirmation dialog");
        Ok(())
    }

    /// User confirmed the swap. Returns `false` when the call was ignored.
    pub fn confirm_swap(&self) -> bool {
        let inner = &self.inner;
        if !self.is_mounted() {
            return false;
        }
        let mut generation = 0;
        let started = inner.state.send_if_modified(|state| {
            if state.is_swapping {
                log::debug!("Already processing swap, ignoring duplicate call");
                return false;
            }
            if state.status != TransactionStatus::Confirming || state.intent.is_none() {
                log::warn!("Confirm requested with no swap awaiting confirmation");
                return false;
            }
            state.is_swapping = true;
            state.show_confirmation = false;
            generation = inner.next_generation();
            true
        });
        if !started {
            return false;
        }

        let task = inner
            .runtime
            .spawn(run_settlement(Arc::clone(inner), generation));
        let mut tasks = inner.tasks.lock();
        if inner.mounted.load(Ordering::SeqCst) {
            PendingTasks::replace(&mut tasks.settlement, task);
        } else {
            task.abort();
        }
        true
    }

    /// Open or close the confirmation dialog. Returns `false` when the request was refused.
    pub fn request_close_confirmation(&self, want_open: bool) -> bool {
        if !self.is_mounted() {
            return false;
        }
        let mut applied = true;
        self.inner.state.send_if_modified(|state| {
            if want_open {
                let changed = !state.show_confirmation || state.status == TransactionStatus::Idle;
                state.show_confirmation = true;
                if state.status == TransactionStatus::Idle {
                    state.status = TransactionStatus::Confirming;
                }
                return changed;
            }
            if state.is_swapping {
                log::debug!("Preventing confirmation dialog close during swap");
                applied = false;
                return false;
            }
            let changed = state.show_confirmation || state.status == TransactionStatus::Confirming;
            state.show_confirmation = false;
            if state.status == TransactionStatus::Confirming {
                state.status = TransactionStatus::Idle;
                state.intent = None;
            }
            changed
        });
        applied
    }

    /// Open or close the transaction status dialog. Returns `false` when the request was refused.
    pub fn request_close_transaction_status(&self, want_open: bool) -> bool {
        let inner = &self.inner;
        if !self.is_mounted() {
            return false;
        }
        let mut refused = false;
        let mut closed_terminal = None;
        inner.state.send_if_modified(|state| {
            match (want_open, state.status) {
                (false, TransactionStatus::Loading) => {
                    log::debug!("Preventing transaction status close during loading state");
                    refused = true;
                    false
                }
                (true, TransactionStatus::Idle) => {
                    refused = true;
                    false
                }
                (false, status) if status.is_terminal() => {
                    state.show_transaction_status = false;
                    closed_terminal = Some(inner.generation.load(Ordering::SeqCst));
                    true
                }
                _ => {
                    let changed = state.show_transaction_status != want_open;
                    state.show_transaction_status = want_open;
                    changed
                }
            }
        });
        if refused {
            return false;
        }

        let mut tasks = inner.tasks.lock();
        tasks.cancel_auto_close();
        if let Some(generation) = closed_terminal {
            let task = inner
                .runtime
                .spawn(run_exit_reset(Arc::clone(inner), generation));
            PendingTasks::replace(&mut tasks.reset, task);
        }
        true
    }

    /// Tear down: cancel every pending task and force dialogs closed.
    ///
    /// Safe to call more than once.
    pub fn dispose(&self) {
        let inner = &self.inner;
        if !inner.mounted.swap(false, Ordering::SeqCst) {
            return;
        }
        inner.generation.fetch_add(1, Ordering::SeqCst);
        inner.tasks.lock().cancel_all();
        inner.state.send_replace(ControllerState::default());
        log::debug!("Transaction controller disposed");
    }
}

impl Drop for TransactionController {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FAILURE_MESSAGE;
    use crate::config::tokens::default_registry;
    use crate::form::SwapForm;
    use crate::notify::RecordingNotifier;
    use crate::random::ScriptedRandom;
    use std::time::Duration;

    struct Harness {
        controller: TransactionController,
        form: Arc<SwapForm>,
        random: Arc<ScriptedRandom>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(draw: f64) -> Harness {
        let form = Arc::new(SwapForm::new(Arc::new(default_registry().clone())));
        let random = Arc::new(ScriptedRandom::always(draw));
        let notifier = Arc::new(RecordingNotifier::new());
        let controller = TransactionController::new(
            SwapConfig::default(),
            form.clone(),
            random.clone(),
            notifier.clone(),
        )
        .unwrap();
        form.set_from_amount("0.5");
        Harness {
            controller,
            form,
            random,
            notifier,
        }
    }

    fn intent(amount: &str) -> SwapIntent {
        SwapIntent {
            from_token: "ETH".to_string(),
            to_token: "USDC".to_string(),
            from_amount: amount.to_string(),
            to_amount: "956.5000".to_string(),
        }
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_valid_amount_opens_confirmation() {
        let h = harness(0.1);
        for amount in ["0.5", "1", "1,000", "0.0001"] {
            h.controller.request_swap(intent(amount)).unwrap();
            let state = h.controller.snapshot();
            assert_eq!(state.status, TransactionStatus::Confirming);
            assert!(state.show_confirmation);
            assert_eq!(state.intent.unwrap().from_amount, amount);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_amount_is_rejected_without_transition() {
        let h = harness(0.1);
        for amount in ["", "0", "0.00", "abc", "-1"] {
            let result = h.controller.request_swap(intent(amount));
            assert!(matches!(result, Err(SwapError::InvalidAmount(_))));
            assert_eq!(h.controller.snapshot(), ControllerState::default());
        }
        let notices = h.notifier.notices();
        assert_eq!(notices.len(), 5);
        assert!(notices.iter().all(|n| n.title == "Invalid amount"
            && n.level == NoticeLevel::Destructive));
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_confirm_schedules_one_settlement() {
        let h = harness(0.1);
        h.controller.request_swap(intent("0.5")).unwrap();
        assert!(h.controller.confirm_swap());
        assert!(!h.controller.confirm_swap());

        sleep_ms(3150).await;
        assert_eq!(h.random.draw_count(), 1);
        assert_eq!(h.controller.status(), TransactionStatus::Confirmed);
        assert_eq!(h.notifier.titles(), vec!["Swap Successful"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_dialog_cannot_be_dismissed() {
        let h = harness(0.1);
        h.controller.request_swap(intent("0.5")).unwrap();
        h.controller.confirm_swap();

        // Confirmation closes immediately, the status dialog follows after the staging delay
        let state = h.controller.snapshot();
        assert!(!state.show_confirmation);
        assert!(!state.show_transaction_status);
        assert!(state.is_swapping);

        sleep_ms(150).await;
        assert_eq!(h.controller.status(), TransactionStatus::Loading);
        assert!(!h.controller.request_close_transaction_status(false));
        let state = h.controller.snapshot();
        assert!(state.show_transaction_status);
        assert_eq!(state.status, TransactionStatus::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_clears_form_and_auto_closes() {
        let h = harness(0.1);
        h.controller.request_swap(h.form.intent()).unwrap();
        h.controller.confirm_swap();

        sleep_ms(3150).await;
        let state = h.controller.snapshot();
        assert_eq!(state.status, TransactionStatus::Confirmed);
        assert!(state.show_transaction_status);
        assert!(state.transaction_hash.starts_with("0x"));
        assert_eq!(state.transaction_hash.len(), 66);
        assert!(state.is_swapping);

        let form = h.form.snapshot();
        assert!(form.from_amount.is_empty());
        assert!(form.to_amount().is_empty());

        let notice = &h.notifier.notices()[0];
        assert_eq!(
            notice.description,
            "Successfully swapped 0.5 ETH to 956.5000 USDC"
        );
        assert_eq!(
            notice.link.as_deref(),
            Some(format!("https://solscan.io/tx/{}", state.transaction_hash).as_str())
        );
        assert_eq!(h.controller.explorer_link(), notice.link);

        sleep_ms(1500).await;
        let progress = h.controller.auto_close_progress().unwrap();
        assert!((0.45..=0.55).contains(&progress), "progress {progress}");

        sleep_ms(1550).await;
        let state = h.controller.snapshot();
        assert!(!state.show_transaction_status);
        assert_eq!(state.status, TransactionStatus::Idle);
        assert!(!state.is_swapping);
        assert_eq!(h.controller.auto_close_progress(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_waits_for_user_close() {
        let h = harness(0.95);
        h.controller.request_swap(h.form.intent()).unwrap();
        h.controller.confirm_swap();

        sleep_ms(3150).await;
        let state = h.controller.snapshot();
        assert_eq!(state.status, TransactionStatus::Failed);
        assert_eq!(state.error_message, crate::config::DEFAULT_FAILURE_MESSAGE);
        assert!(state.transaction_hash.is_empty());
        assert!(!state.is_swapping);
        assert_eq!(h.form.snapshot().from_amount, "0.5");
        assert_eq!(h.notifier.titles(), vec!["Swap Failed"]);

        sleep_ms(10_000).await;
        assert!(h.controller.snapshot().show_transaction_status);

        assert!(h.controller.request_close_transaction_status(false));
        let state = h.controller.snapshot();
        assert!(!state.show_transaction_status);
        assert_eq!(state.status, TransactionStatus::Failed);

        sleep_ms(200).await;
        let state = h.controller.snapshot();
        assert_eq!(state.status, TransactionStatus::Idle);
        assert!(state.error_message.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_close_of_confirmed_cancels_auto_close() {
        let h = harness(0.1);
        h.controller.request_swap(intent("0.5")).unwrap();
        h.controller.confirm_swap();
        sleep_ms(3150).await;

        assert!(h.controller.request_close_transaction_status(false));
        assert_eq!(h.controller.auto_close_progress(), None);
        sleep_ms(200).await;
        let state = h.controller.snapshot();
        assert_eq!(state.status, TransactionStatus::Idle);
        assert!(!state.is_swapping);

        // A fresh attempt started before the old auto-close deadline is left alone
        h.controller.request_swap(intent("0.25")).unwrap();
        sleep_ms(5000).await;
        let state = h.controller.snapshot();
        assert_eq!(state.status, TransactionStatus::Confirming);
        assert!(state.show_confirmation);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_cancels_pending_settlement() {
        let h = harness(0.1);
        let mut updates = h.controller.subscribe();
        h.controller.request_swap(intent("0.5")).unwrap();
        h.controller.confirm_swap();
        sleep_ms(1000).await;
        assert_eq!(h.controller.status(), TransactionStatus::Loading);

        h.controller.dispose();
        let disposed = h.controller.snapshot();
        assert_eq!(disposed, ControllerState::default());
        updates.borrow_and_update();

        sleep_ms(10_000).await;
        assert_eq!(h.controller.snapshot(), disposed);
        assert!(!updates.has_changed().unwrap());
        assert_eq!(h.random.draw_count(), 0);
        assert_eq!(h.form.snapshot().from_amount, "0.5");
        assert!(h.notifier.notices().is_empty());

        // Every operation is inert once disposed
        assert!(!h.controller.confirm_swap());
        assert!(matches!(
            h.controller.request_swap(intent("1")),
            Err(SwapError::Disposed)
        ));
        assert!(!h.controller.request_close_confirmation(true));
        assert_eq!(h.controller.snapshot(), disposed);
        h.controller.dispose();
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_between_update_and_side_effects() {
        let h = harness(0.1);
        h.controller.request_swap(intent("0.5")).unwrap();
        assert!(h.controller.confirm_swap());
        let generation = h.controller.inner.generation.load(Ordering::SeqCst);
        let attempt = intent("0.5");

        // The outcome update already applied, then the widget went away
        h.controller.dispose();
        announce_success(&h.controller.inner, generation, "0xabc", Some(&attempt));
        announce_failure(
            &h.controller.inner,
            generation,
            DEFAULT_FAILURE_MESSAGE.to_string(),
        );

        assert_eq!(h.form.snapshot().from_amount, "0.5");
        assert!(h.notifier.notices().is_empty());
        assert!(h.controller.inner.tasks.lock().auto_close.is_none());
        assert_eq!(h.controller.auto_close_progress(), None);

        sleep_ms(10_000).await;
        assert_eq!(h.controller.snapshot(), ControllerState::default());
        assert_eq!(h.random.draw_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_disposes_controller() {
        let h = harness(0.1);
        h.controller.request_swap(intent("0.5")).unwrap();
        h.controller.confirm_swap();
        sleep_ms(50).await;

        let Harness {
            controller,
            form,
            random,
            notifier,
        } = h;
        drop(controller);

        sleep_ms(10_000).await;
        assert_eq!(random.draw_count(), 0);
        assert_eq!(form.snapshot().from_amount, "0.5");
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_close_refused_while_swapping() {
        let h = harness(0.1);
        h.controller.request_swap(intent("0.5")).unwrap();
        h.controller.confirm_swap();

        assert!(h.controller.request_close_confirmation(true));
        assert!(h.controller.snapshot().show_confirmation);
        assert!(!h.controller.request_close_confirmation(false));
        assert!(h.controller.snapshot().show_confirmation);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_confirmation_returns_to_idle() {
        let h = harness(0.1);
        h.controller.request_swap(intent("0.5")).unwrap();
        assert!(h.controller.request_close_confirmation(false));
        let state = h.controller.snapshot();
        assert_eq!(state.status, TransactionStatus::Idle);
        assert!(!state.show_confirmation);
        assert!(state.intent.is_none());

        // Nothing left to confirm
        assert!(!h.controller.confirm_swap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_swap_refused_while_settling() {
        let h = harness(0.1);
        h.controller.request_swap(intent("0.5")).unwrap();
        h.controller.confirm_swap();
        sleep_ms(150).await;

        let result = h.controller.request_swap(intent("2"));
        assert!(matches!(result, Err(SwapError::SwapInFlight)));
        assert_eq!(h.controller.status(), TransactionStatus::Loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_request_after_failure_resets_baseline() {
        let h = harness(0.95);
        h.controller.request_swap(intent("0.5")).unwrap();
        h.controller.confirm_swap();
        sleep_ms(3150).await;
        assert_eq!(h.controller.status(), TransactionStatus::Failed);

        h.random.push(0.1);
        h.controller.request_swap(intent("0.5")).unwrap();
        let state = h.controller.snapshot();
        assert_eq!(state.status, TransactionStatus::Confirming);
        assert!(!state.show_transaction_status);
        assert!(state.error_message.is_empty());

        assert!(h.controller.confirm_swap());
        sleep_ms(3150).await;
        assert_eq!(h.controller.status(), TransactionStatus::Confirmed);
        assert_eq!(h.random.draw_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_dialog_never_shown_while_idle() {
        let h = harness(0.1);
        assert!(!h.controller.request_close_transaction_status(true));
        assert!(!h.controller.snapshot().show_transaction_status);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configurable_success_probability() {
        let form = Arc::new(SwapForm::new(Arc::new(default_registry().clone())));
        let random = Arc::new(ScriptedRandom::always(0.0));
        let controller = TransactionController::new(
            SwapConfig {
                success_probability: 0.0,
                ..SwapConfig::default()
            },
            form,
            random,
            Arc::new(RecordingNotifier::new()),
        )
        .unwrap();
        controller.request_swap(intent("1")).unwrap();
        controller.confirm_swap();
        sleep_ms(3150).await;
        assert_eq!(controller.status(), TransactionStatus::Failed);
    }

    #[test]
    fn test_new_requires_runtime() {
        let form = Arc::new(SwapForm::new(Arc::new(default_registry().clone())));
        let result = TransactionController::new(
            SwapConfig::default(),
            form,
            Arc::new(ScriptedRandom::always(0.1)),
            Arc::new(RecordingNotifier::new()),
        );
        assert!(matches!(result, Err(SwapError::NoRuntime)));
    }

    #[test]
    fn test_amount_validation() {
        assert!(is_valid_amount("0.1"));
        assert!(is_valid_amount(" 2 "));
        assert!(!is_valid_amount("0"));
        assert!(!is_valid_amount(""));
        assert!(!is_valid_amount("NaN"));
        assert!(!is_valid_amount("inf"));
    }
}
