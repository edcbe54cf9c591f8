use std::sync::Arc;
use swapdeck::config::tokens::default_registry;
use swapdeck::form::PERCENTAGE_SHORTCUTS;
use swapdeck::notify::{Notice, NoticeLevel, RecordingNotifier};
use swapdeck::prices::{PriceChart, Timeframe};
use swapdeck::quote::NETWORK_FEE;
use swapdeck::selection::TokenSide;
use swapdeck::slippage::SLIPPAGE_PRESETS;
use swapdeck::storage::{default_storage_dir, FileStore};
use swapdeck::transaction::{ControllerState, TransactionController, TransactionStatus};
use swapdeck::{SwapConfig, SwapForm, ThreadRandom, WalletSession};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

const HELP: &str = "\
commands:
  amount <value>        type an amount to sell
  pct <25|50|75|100>    use a share of the balance
  from | to             open the token picker for that side
  search <query>        list tokens matching the query
  pick [symbol]         choose a token, or close the open picker
  flip                  swap the two sides
  slippage [value]      toggle the menu, or pick 0.1, 0.5, 1.0 or a custom value
  swap                  review the swap
  confirm | cancel      answer the confirmation dialog
  close                 dismiss the status dialog
  connect | disconnect  mock wallet session
  copy                  copy the wallet address
  chart [1H|1D|1W|1M|1Y]
  status | help | quit";

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn print_notice(notice: &Notice) {
    let marker = match notice.level {
        NoticeLevel::Success => "✅",
        NoticeLevel::Destructive => "❌",
        NoticeLevel::Info => "ℹ️ ",
    };
    if notice.description.is_empty() {
        println!("{} {}", marker, notice.title);
    } else {
        println!("{} {} - {}", marker, notice.title, notice.description);
    }
    if let Some(link) = &notice.link {
        println!("   View Details: {}", link);
    }
}

fn flush_notices(notifier: &RecordingNotifier) {
    for notice in notifier.drain() {
        print_notice(&notice);
    }
}

fn print_dialogs(state: &ControllerState, config: &SwapConfig) {
    if state.show_confirmation {
        if let Some(intent) = &state.intent {
            println!(
                "[confirm] {} {} -> {} {} (fee {}) - confirm or cancel",
                intent.from_amount, intent.from_token, intent.to_amount, intent.to_token, NETWORK_FEE
            );
        }
    }
    if state.show_transaction_status {
        match state.status {
            TransactionStatus::Loading | TransactionStatus::Confirming => {
                println!("[status] Transaction pending... waiting for confirmation")
            }
            TransactionStatus::Confirmed => println!(
                "[status] Transaction confirmed: {}",
                config.transaction_url(&state.transaction_hash)
            ),
            TransactionStatus::Failed => {
                println!("[status] Transaction failed: {}", state.error_message)
            }
            TransactionStatus::Idle => {}
        }
    }
}

fn print_form(form: &SwapForm, wallet: &WalletSession) {
    let state = form.snapshot();
    let from = state.selection.from_token();
    let to = state.selection.to_token();
    let registry = form.registry();

    match wallet.display_address(4) {
        Some(address) => println!("wallet: {}", address),
        None => println!("wallet: not connected"),
    }
    println!(
        "sell {} {} (balance {})  {}",
        if state.from_amount.is_empty() { "0" } else { state.from_amount.as_str() },
        from,
        registry.find(from).map(|t| t.balance.as_str()).unwrap_or("0"),
        state.quote.from_amount_usd
    );
    println!(
        "buy  {} {}  {}",
        if state.to_amount().is_empty() { "0" } else { state.to_amount() },
        to,
        state.quote.to_amount_usd
    );
    if !state.quote.is_empty() {
        println!(
            "rate {} | impact {} | fee {} | slippage {}",
            state.quote.details.exchange_rate,
            state.quote.details.price_impact,
            state.quote.details.network_fee,
            state.slippage.label()
        );
        if let Some(min) = state.slippage.minimum_received(state.to_amount()) {
            println!("minimum received {:.4} {}", min, to);
        }
    }
    if form.insufficient_balance() {
        println!("Insufficient {} balance", from);
    } else if form.can_swap() {
        println!("ready: type `swap` to review");
    }
}

fn print_chart(chart: &PriceChart) {
    println!("{} [{}]", chart.pair_label(), chart.timeframe());
    for (label, point) in chart.axis_labels().iter().zip(chart.series()) {
        println!("  {:>8}  {}", label, point.price);
    }
    if let (Some(latest), Some(change)) = (chart.latest_price(), chart.change_percentage()) {
        println!("  last {}  change {:+.2}%", latest, change);
    }
}

#[cfg(not(target_os = "android"))]
fn copy_to_clipboard(text: &str) -> bool {
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => clipboard.set_text(text.to_string()).is_ok(),
        Err(e) => {
            log::warn!("Clipboard unavailable: {}", e);
            false
        }
    }
}

#[cfg(target_os = "android")]
fn copy_to_clipboard(_text: &str) -> bool {
    false
}

/// Prints every state transition, including the ones driven by timers
async fn render_updates(
    mut updates: watch::Receiver<ControllerState>,
    notifier: Arc<RecordingNotifier>,
    config: SwapConfig,
) {
    let mut last_status = updates.borrow().status;
    while updates.changed().await.is_ok() {
        let state = updates.borrow_and_update().clone();
        if state.status != last_status {
            log::debug!("Transaction status {} -> {}", last_status, state.status);
            last_status = state.status;
        }
        print_dialogs(&state, &config);
        flush_notices(&notifier);
    }
}

#[tokio::main]
async fn main() {
    init_logging();

    let config = SwapConfig::from_env();
    let storage_dir = default_storage_dir();
    log::info!("Using storage at {}", storage_dir.display());

    let random = Arc::new(ThreadRandom);
    let notifier = Arc::new(RecordingNotifier::new());
    let store = Arc::new(FileStore::new(&storage_dir));
    let form = Arc::new(SwapForm::new(Arc::new(default_registry().clone())));

    let controller = match TransactionController::new(
        config.clone(),
        form.clone(),
        random.clone(),
        notifier.clone(),
    ) {
        Ok(controller) => controller,
        Err(e) => {
            log::error!("Failed to start transaction controller: {}", e);
            return;
        }
    };

    let mut wallet = match WalletSession::load(store, random, notifier.clone()) {
        Ok(wallet) => wallet,
        Err(e) => {
            log::error!("Failed to load wallet session: {}", e);
            return;
        }
    };

    let mut chart = {
        let selection = form.snapshot().selection;
        PriceChart::new(selection.from_token(), selection.to_token(), &mut rand::thread_rng())
    };

    tokio::spawn(render_updates(
        controller.subscribe(),
        notifier.clone(),
        config.clone(),
    ));

    println!("{}", HELP);
    print_form(&form, &wallet);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read input: {}", e);
                break;
            }
        };

        let mut parts = line.trim().splitn(2, ' ');
        let command = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).unwrap_or_default();

        match command {
            "" => continue,
            "amount" => {
                form.set_from_amount(arg);
                print_form(&form, &wallet);
            }
            "pct" => match arg.trim_end_matches('%').parse::<u8>() {
                Ok(pct) if PERCENTAGE_SHORTCUTS.contains(&pct) => {
                    form.select_percentage(pct);
                    print_form(&form, &wallet);
                }
                _ => println!("usage: pct <25|50|75|100>"),
            },
            "from" | "to" => {
                let side = if command == "from" { TokenSide::From } else { TokenSide::To };
                form.open_token_picker(side);
                let state = form.snapshot();
                let recent = form.registry().recent(state.selection.recent_tokens());
                println!(
                    "recent: {}",
                    recent.iter().map(|t| t.symbol.as_str()).collect::<Vec<_>>().join(", ")
                );
                for token in form.registry().tokens() {
                    println!("  {:<6} {:<24} {}", token.symbol, token.name, token.balance);
                }
            }
            "search" => {
                for token in form.registry().search(arg) {
                    println!("  {:<6} {}", token.symbol, token.name);
                }
            }
            "pick" => {
                if !form.snapshot().selection.show_picker() {
                    println!("open a picker first with `from` or `to`");
                    continue;
                }
                if arg.is_empty() {
                    form.close_token_picker();
                    println!("picker closed");
                    continue;
                }
                match form.select_token(arg) {
                    Ok(()) => {
                        let selection = form.snapshot().selection;
                        chart.set_pair(
                            selection.from_token(),
                            selection.to_token(),
                            &mut rand::thread_rng(),
                        );
                        print_form(&form, &wallet);
                    }
                    Err(e) => println!("{}", e),
                }
            }
            "flip" => {
                form.flip();
                let selection = form.snapshot().selection;
                chart.set_pair(selection.from_token(), selection.to_token(), &mut rand::thread_rng());
                print_form(&form, &wallet);
            }
            "slippage" if arg.is_empty() => {
                form.toggle_slippage_menu();
                let slippage = form.snapshot().slippage;
                if slippage.show_menu() {
                    for preset in SLIPPAGE_PRESETS {
                        let marker = if preset == slippage.value() { "*" } else { " " };
                        println!("  {} {}%", marker, preset);
                    }
                    if slippage.is_custom() {
                        println!("  * {} (custom)", slippage.label());
                    }
                }
            }
            "slippage" => {
                let result = if SLIPPAGE_PRESETS.contains(&arg) {
                    form.select_slippage(arg);
                    Ok(())
                } else {
                    form.apply_custom_slippage(arg)
                };
                match result {
                    Ok(()) => println!("slippage {}", form.snapshot().slippage.label()),
                    Err(e) => println!("{}", e),
                }
            }
            "swap" => {
                if form.insufficient_balance() {
                    println!("Insufficient balance");
                    continue;
                }
                if let Err(e) = controller.request_swap(form.intent()) {
                    log::debug!("Swap request refused: {}", e);
                    if matches!(e, swapdeck::SwapError::SwapInFlight) {
                        println!("{}", e);
                    }
                }
                flush_notices(&notifier);
            }
            "confirm" => {
                if !controller.confirm_swap() {
                    println!("Nothing to confirm");
                }
            }
            "cancel" => {
                if !controller.request_close_confirmation(false) {
                    println!("The confirmation dialog cannot be closed right now");
                }
            }
            "close" => {
                if !controller.request_close_transaction_status(false) {
                    println!("The status dialog cannot be closed right now");
                }
            }
            "connect" => {
                if let Err(e) = wallet.connect() {
                    log::error!("Wallet connect failed: {}", e);
                }
                flush_notices(&notifier);
            }
            "disconnect" => {
                if let Err(e) = wallet.disconnect() {
                    log::error!("Wallet disconnect failed: {}", e);
                }
                flush_notices(&notifier);
            }
            "copy" => match wallet.address() {
                Some(address) if copy_to_clipboard(address) => println!("Address copied"),
                Some(address) => println!("{}", address),
                None => println!("Connect a wallet first"),
            },
            "chart" => {
                if !arg.is_empty() {
                    match arg.parse::<Timeframe>() {
                        Ok(timeframe) => chart.set_timeframe(timeframe, &mut rand::thread_rng()),
                        Err(e) => {
                            println!("{}", e);
                            continue;
                        }
                    }
                }
                print_chart(&chart);
            }
            "status" => {
                print_form(&form, &wallet);
                let state = controller.snapshot();
                println!("transaction: {}", state.status);
                print_dialogs(&state, controller.config());
                if let Some(progress) = controller.auto_close_progress() {
                    println!("closing in {:.0}%", (1.0 - progress) * 100.0);
                }
            }
            "help" => println!("{}", HELP),
            "quit" | "exit" => break,
            other => println!("unknown command: {} (try `help`)", other),
        }
    }

    controller.dispose();
    log::info!("Goodbye");
}
