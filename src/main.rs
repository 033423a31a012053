mod app;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use alloy::primitives::{Address, B256};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use enigma_duel::config::{self, Overrides, Settings};
use enigma_duel::domain::duel::{format_edt, parse_address, parse_amount, GameRoomKey};
use enigma_duel::infrastructure::ethereum::ConnectionContext;
use enigma_duel::infrastructure::open_gateway;
use enigma_duel::infrastructure::runtime::{RuntimeBridge, RuntimeCommand, RuntimeEvent};
use enigma_duel::DuelGateway;

use crate::app::{App, StatusLevel};

#[derive(Debug, Parser)]
#[command(
    name = "enigma-duel",
    version,
    about = "EnigmaDuel client: deposit, withdraw and inspect duel contract state"
)]
struct Args {
    /// Config file (defaults to $ENIGMA_DUEL_CONFIG or ~/.config/enigma-duel/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// HTTP JSON-RPC endpoint (e.g. http://localhost:8545)
    #[arg(long, global = true)]
    rpc: Option<String>,

    /// WebSocket endpoint (e.g. ws://localhost:8546)
    #[arg(long, global = true)]
    ws: Option<String>,

    /// IPC path (e.g. ~/.ethereum/geth.ipc). Unix only.
    #[arg(long, global = true)]
    ipc: Option<PathBuf>,

    /// Deployment address book (addresses.json)
    #[arg(long = "addresses", global = true)]
    address_book: Option<PathBuf>,

    /// Contract ABI JSON (EnigmaDuelABI.json) to read the withdrawal event from
    #[arg(long, global = true)]
    abi: Option<PathBuf>,

    /// EnigmaDuel contract (proxy) address
    #[arg(long, global = true)]
    duel: Option<String>,

    /// EDT token address
    #[arg(long, global = true)]
    token: Option<String>,

    /// Node-managed account to send from
    #[arg(long, global = true)]
    from: Option<String>,

    /// Environment variable holding a private key to sign with
    #[arg(long, global = true)]
    private_key_env: Option<String>,

    /// Confirmations to wait for on each transaction
    #[arg(long, global = true)]
    confirmations: Option<u64>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Approve and deposit EDT; prints the new available balance
    Deposit { amount: String },
    /// Withdraw EDT; prints the new balance reported by the contract
    Withdraw { amount: String },
    /// Deposited balance of an address (defaults to the signer)
    Balance { address: Option<String> },
    /// EDT held in the wallet of an address (defaults to the signer)
    Wallet { address: Option<String> },
    /// Read a game room by key or by duelist pair
    GameRoom {
        #[arg(required_unless_present = "duelists")]
        key: Option<String>,
        #[arg(long, num_args = 2, value_names = ["DUELIST1", "DUELIST2"], conflicts_with = "key")]
        duelists: Option<Vec<String>>,
    },
    /// Derive a game room key from two duelists (offline)
    RoomKey { duelist1: String, duelist2: String },
    /// Victory fee
    Fee,
    /// Draw fee
    DrawFee,
    /// EDT token address
    Edt,
    /// Connection, fees, token and signer balances
    Info,
    /// Decode the settlement of a finished game from its transaction
    Settlement { tx: String },
    /// Interactive terminal form (default)
    Ui,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_command = Command::Ui;
    let command = args.command.as_ref().unwrap_or(&default_command);

    // Offline commands need neither config nor a node
    if let Command::RoomKey { duelist1, duelist2 } = command {
        init_stderr_logging();
        let key = GameRoomKey::for_duelists(parse_address(duelist1)?, parse_address(duelist2)?);
        return print_value(args.json, &key.to_string(), &key.to_string());
    }

    let is_ui = matches!(command, Command::Ui);
    if is_ui {
        setup_file_logging()?;
    } else {
        init_stderr_logging();
    }

    let settings = load_settings(&args)?;
    tracing::debug!(?settings, "resolved settings");

    if is_ui {
        return run_ui(settings);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let gateway = open_gateway(&settings).await?;
        run_command(&gateway, command, args.json).await
    })
}

fn load_settings(args: &Args) -> Result<Settings> {
    let config = match &args.config {
        Some(path) => config::load_from(path),
        None => config::load(),
    };
    let overrides = Overrides {
        rpc: args.rpc.clone(),
        ws: args.ws.clone(),
        ipc: args.ipc.clone(),
        address_book: args.address_book.clone(),
        abi: args.abi.clone(),
        duel: args.duel.clone(),
        token: args.token.clone(),
        from: args.from.clone(),
        private_key_env: args.private_key_env.clone(),
        confirmations: args.confirmations,
    };
    config.resolve(&overrides)
}

async fn run_command(
    gateway: &DuelGateway<ConnectionContext>,
    command: &Command,
    json: bool,
) -> Result<()> {
    match command {
        Command::Deposit { amount } => {
            let amount = parse_amount(amount).context("deposit amount")?;
            let available = gateway.deposit_edt(amount).await?;
            print_value(
                json,
                &AmountReport { amount: available },
                &format!(
                    "New Balance after Deposit: {available} ({} EDT)",
                    format_edt(available)
                ),
            )
        }
        Command::Withdraw { amount } => {
            let amount = parse_amount(amount).context("withdraw amount")?;
            let new_balance = gateway.withdraw_edt(amount).await?;
            print_value(
                json,
                &AmountReport { amount: new_balance },
                &format!(
                    "New Balance after Withdrawal: {new_balance} ({} EDT)",
                    format_edt(new_balance)
                ),
            )
        }
        Command::Balance { address } => {
            let user = address_or_caller(gateway, address.as_deref())?;
            let balance = gateway.user_balance(user).await?;
            print_value(
                json,
                &balance,
                &format!(
                    "User Balance ({user}):\n  total     {} ({} EDT)\n  locked    {} ({} EDT)\n  available {} ({} EDT)",
                    balance.total,
                    format_edt(balance.total),
                    balance.locked,
                    format_edt(balance.locked),
                    balance.available,
                    format_edt(balance.available),
                ),
            )
        }
        Command::Wallet { address } => {
            let owner = address_or_caller(gateway, address.as_deref())?;
            let amount = gateway.token_balance(owner).await?;
            print_value(
                json,
                &AmountReport { amount },
                &format!("EDT in wallet of {owner}: {amount} ({} EDT)", format_edt(amount)),
            )
        }
        Command::GameRoom { key, duelists } => {
            let key = match (key, duelists) {
                (Some(key), _) => key.parse::<GameRoomKey>()?,
                (None, Some(pair)) => match pair.as_slice() {
                    [first, second] => {
                        GameRoomKey::for_duelists(parse_address(first)?, parse_address(second)?)
                    }
                    _ => return Err(anyhow!("--duelists takes exactly two addresses")),
                },
                (None, None) => return Err(anyhow!("a game room key or --duelists is required")),
            };
            let room = gateway.game_room(key).await?;
            let mut text = format!(
                "Game Room {key}:\n  duelist1   {}\n  duelist2   {}\n  prizePool  {}\n  status     {}",
                room.duelist1, room.duelist2, room.prize_pool, room.status
            );
            if room.is_vacant() {
                text.push_str("\n  (no game room has been started under this key)");
            }
            print_value(json, &room, &text)
        }
        Command::Fee => {
            let fee = gateway.fee().await?;
            print_value(json, &AmountReport { amount: fee }, &format!("Victory Fee: {fee}"))
        }
        Command::DrawFee => {
            let fee = gateway.draw_fee().await?;
            print_value(json, &AmountReport { amount: fee }, &format!("Draw Fee: {fee}"))
        }
        Command::Edt => {
            let token = gateway.edt().await?;
            print_value(json, &token, &format!("EDT Token Address: {token}"))
        }
        Command::Info => {
            let overview = gateway.overview().await?;
            let caller = gateway.caller();
            let (balance, wallet) = futures::try_join!(
                gateway.caller_balance(),
                gateway.token_balance(caller)
            )?;
            let deployment = gateway.deployment();
            let info = Info {
                endpoint: gateway.endpoint(),
                caller,
                duel: deployment.duel,
                token: deployment.token,
                fee: overview.fee.to_string(),
                draw_fee: overview.draw_fee.to_string(),
                edt: overview.token,
                wallet: wallet.to_string(),
                balance,
                withdrawal_event: gateway.withdrawal_event().signature(),
            };
            let mut text = format!(
                "Endpoint   {}\nAccount    {}\nEnigmaDuel {}\nEDT        {}\nVictory fee {}\nDraw fee   {}\nWallet     {} EDT\nDeposited  {} EDT available ({} locked)\nWithdrawal event {}",
                info.endpoint,
                info.caller,
                info.duel,
                info.token,
                info.fee,
                info.draw_fee,
                format_edt(wallet),
                format_edt(balance.available),
                format_edt(balance.locked),
                info.withdrawal_event,
            );
            if overview.token != deployment.token {
                text.push_str(&format!(
                    "\nwarning: contract reports EDT at {}, configured {}",
                    overview.token, deployment.token
                ));
            }
            print_value(json, &info, &text)
        }
        Command::Settlement { tx } => {
            let tx_hash: B256 = tx
                .trim()
                .parse()
                .with_context(|| format!("invalid transaction hash: {tx}"))?;
            let settlement = gateway.settlement(tx_hash).await?;
            let text = format!(
                "{} (fee {})\n  {} received {}\n  {} received {}",
                settlement.result,
                settlement.fee,
                settlement.duelist1.duelist,
                settlement.duelist1.received,
                settlement.duelist2.duelist,
                settlement.duelist2.received,
            );
            print_value(json, &settlement, &text)
        }
        Command::RoomKey { .. } | Command::Ui => Ok(()),
    }
}

#[derive(Serialize)]
struct AmountReport {
    #[serde(serialize_with = "as_decimal")]
    amount: alloy::primitives::U256,
}

#[derive(Serialize)]
struct Info {
    endpoint: String,
    caller: Address,
    duel: Address,
    token: Address,
    fee: String,
    draw_fee: String,
    edt: Address,
    wallet: String,
    balance: enigma_duel::Balance,
    withdrawal_event: String,
}

fn as_decimal<S: serde::Serializer>(
    value: &alloy::primitives::U256,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

fn address_or_caller(
    gateway: &DuelGateway<ConnectionContext>,
    raw: Option<&str>,
) -> Result<Address> {
    match raw {
        Some(raw) => Ok(parse_address(raw)?),
        None => Ok(gateway.caller()),
    }
}

fn print_value<T: Serialize + ?Sized>(json: bool, value: &T, text: &str) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{text}");
    }
    Ok(())
}

fn init_stderr_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

/// The terminal owns stdout/stderr while the form is up, so logs go to a file
fn setup_file_logging() -> Result<()> {
    let log_dir = config::log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "enigma-duel.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!("Failed to initialise logging: {err}"))?;

    // Keep the writer alive for the rest of the process
    std::mem::forget(guard);
    tracing::info!(dir = %log_dir.display(), "logging initialised");
    Ok(())
}

fn run_ui(settings: Settings) -> Result<()> {
    let endpoint = settings.endpoint.display();

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runtime = RuntimeBridge::new(settings)?;

    let mut app = App::new();
    app.set_status(format!("Connecting to {endpoint}…"), StatusLevel::Info);

    let res = run_app(&mut terminal, app, runtime);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runtime: RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_background(&mut app, &runtime);
        terminal.draw(|f| ui::draw(f, &app))?;
        if app.should_quit {
            runtime.shutdown();
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut app, key);
            }
        }

        if let Some(request) = app.take_request() {
            tracing::info!(?request, "submitting");
            if let Err(err) = runtime.send(RuntimeCommand::Run(request)) {
                app.apply_worker_error(err.to_string());
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for event in runtime.poll_events() {
        match event {
            RuntimeEvent::Connected { endpoint, caller } => app.apply_connected(endpoint, caller),
            RuntimeEvent::Completed { operation, outcome } => {
                app.apply_completed(operation, outcome)
            }
            RuntimeEvent::Failed { operation, message } => app.apply_failed(operation, message),
            RuntimeEvent::Error { message } => app.apply_worker_error(message),
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => app.request_quit(),
        KeyCode::Char('y') if ctrl => copy_result(app),
        KeyCode::Char('u') if ctrl => app.clear_input(),
        KeyCode::Char('r') if ctrl => app.refresh_overview(),
        KeyCode::Esc => app.request_quit(),
        KeyCode::Up | KeyCode::BackTab => app.move_up(),
        KeyCode::Down | KeyCode::Tab => app.move_down(),
        KeyCode::Enter => app.submit(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Char(c) if !ctrl => app.push_char(c),
        _ => {}
    }
}

fn copy_result(app: &mut App) {
    use arboard::Clipboard;

    let Some(text) = app.copy_text().map(str::to_string) else {
        app.set_status("Nothing to copy", StatusLevel::Warn);
        return;
    };

    match Clipboard::new() {
        Ok(mut clipboard) => {
            if clipboard.set_text(text).is_ok() {
                app.set_status("Copied result to clipboard", StatusLevel::Info);
            } else {
                app.set_status("Failed to copy", StatusLevel::Error);
            }
        }
        Err(_) => app.set_status("Clipboard not available", StatusLevel::Error),
    }
}
