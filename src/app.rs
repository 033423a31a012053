use std::time::{Duration, Instant};

use alloy::primitives::Address;

use enigma_duel::domain::duel::{format_edt, parse_address, parse_amount, GameRoomKey, Overview};
use enigma_duel::infrastructure::runtime::{Operation, Outcome, Request};

const STATUS_TTL: Duration = Duration::from_secs(6);
const HISTORY_LIMIT: usize = 50;

/// Rows of the form, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormRow {
    Deposit,
    Withdraw,
    Balance,
    GameRoom,
    VictoryFee,
    DrawFee,
    TokenAddress,
}

impl FormRow {
    pub const ALL: [FormRow; 7] = [
        FormRow::Deposit,
        FormRow::Withdraw,
        FormRow::Balance,
        FormRow::GameRoom,
        FormRow::VictoryFee,
        FormRow::DrawFee,
        FormRow::TokenAddress,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            FormRow::Deposit => "Deposit EDT Tokens",
            FormRow::Withdraw => "Withdraw EDT Tokens",
            FormRow::Balance => "Get User Balance",
            FormRow::GameRoom => "Get Game Room",
            FormRow::VictoryFee => "Get Victory Fee",
            FormRow::DrawFee => "Get Draw Fee",
            FormRow::TokenAddress => "Get EDT Token Address",
        }
    }

    pub fn button(&self) -> &'static str {
        match self {
            FormRow::Deposit => "Deposit",
            FormRow::Withdraw => "Withdraw",
            FormRow::Balance => "Get Balance",
            FormRow::GameRoom => "Get Game Room",
            FormRow::VictoryFee => "Get Victory Fee",
            FormRow::DrawFee => "Get Draw Fee",
            FormRow::TokenAddress => "Get EDT Address",
        }
    }

    /// Placeholder for rows that take input
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            FormRow::Deposit => Some("Deposit Amount (e.g. 1000 or 1.5 edt)"),
            FormRow::Withdraw => Some("Withdraw Amount (e.g. 1000 or 1.5 edt)"),
            FormRow::Balance => Some("User Address (empty = your account)"),
            FormRow::GameRoom => Some("Game Room Key, or two duelist addresses"),
            _ => None,
        }
    }

    pub fn has_input(&self) -> bool {
        self.placeholder().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    Connecting,
    Ready { endpoint: String, caller: Address },
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub at: String,
    pub operation: Operation,
    pub ok: bool,
    pub summary: String,
}

pub struct App {
    pub selected: usize,
    pub inputs: Vec<String>,
    pub result: String,
    pub history: Vec<HistoryEntry>,
    pub overview: Option<Overview>,
    pub connection: Connection,
    pub in_flight: Option<Operation>,
    pub should_quit: bool,
    pub spinner: usize,
    /// Quit once the in-flight transaction settles
    quit_pending: bool,
    queued: Option<Request>,
    status: Option<(String, StatusLevel, Instant)>,
}

impl App {
    pub fn new() -> Self {
        Self {
            selected: 0,
            inputs: vec![String::new(); FormRow::ALL.len()],
            result: String::new(),
            history: Vec::new(),
            overview: None,
            connection: Connection::Connecting,
            in_flight: None,
            should_quit: false,
            spinner: 0,
            quit_pending: false,
            queued: None,
            status: None,
        }
    }

    pub fn selected_row(&self) -> FormRow {
        FormRow::ALL[self.selected.min(FormRow::ALL.len() - 1)]
    }

    pub fn input(&self, row: FormRow) -> &str {
        &self.inputs[row_index(row)]
    }

    pub fn move_up(&mut self) {
        self.selected = if self.selected == 0 {
            FormRow::ALL.len() - 1
        } else {
            self.selected - 1
        };
    }

    pub fn move_down(&mut self) {
        self.selected = (self.selected + 1) % FormRow::ALL.len();
    }

    pub fn push_char(&mut self, c: char) {
        if self.selected_row().has_input() && !c.is_control() {
            self.inputs[self.selected].push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.inputs[self.selected].pop();
    }

    pub fn clear_input(&mut self) {
        self.inputs[self.selected].clear();
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some((text.into(), level, Instant::now()));
    }

    pub fn status_text(&self) -> Option<(&str, StatusLevel)> {
        self.status
            .as_ref()
            .map(|(text, level, _)| (text.as_str(), *level))
    }

    pub fn on_tick(&mut self) {
        if let Some((_, _, at)) = &self.status {
            if at.elapsed() >= STATUS_TTL {
                self.status = None;
            }
        }
        if self.in_flight.is_some() {
            self.spinner = self.spinner.wrapping_add(1);
        }
    }

    /// Validate the selected row and queue its request
    pub fn submit(&mut self) {
        if self.in_flight.is_some() {
            self.set_status("Waiting for the previous request", StatusLevel::Warn);
            return;
        }
        if !matches!(self.connection, Connection::Ready { .. }) {
            self.set_status("Not connected", StatusLevel::Warn);
            return;
        }

        let row = self.selected_row();
        match build_request(row, self.input(row)) {
            Ok(request) => {
                if request.changes_state() {
                    self.set_status("Submitting transaction…", StatusLevel::Info);
                }
                self.in_flight = Some(request.operation());
                self.queued = Some(request);
            }
            Err(message) => self.set_status(message, StatusLevel::Error),
        }
    }

    /// Quit now, or after a deposit or withdrawal in flight has settled
    pub fn request_quit(&mut self) {
        if matches!(
            self.in_flight,
            Some(Operation::Deposit | Operation::Withdraw)
        ) {
            self.quit_pending = true;
            self.set_status(
                "Waiting for the transaction to confirm before quitting",
                StatusLevel::Warn,
            );
            return;
        }
        self.should_quit = true;
    }

    pub fn quit_pending(&self) -> bool {
        self.quit_pending
    }

    /// Ask the worker to re-read fees and token address
    pub fn refresh_overview(&mut self) {
        if self.in_flight.is_none() && matches!(self.connection, Connection::Ready { .. }) {
            self.in_flight = Some(Operation::Overview);
            self.queued = Some(Request::Overview);
        }
    }

    pub fn take_request(&mut self) -> Option<Request> {
        self.queued.take()
    }

    pub fn apply_connected(&mut self, endpoint: String, caller: Address) {
        self.set_status(format!("Connected to {endpoint}"), StatusLevel::Info);
        self.connection = Connection::Ready { endpoint, caller };
        // The worker reads the overview right after connecting
        self.in_flight = Some(Operation::Overview);
    }

    pub fn apply_completed(&mut self, operation: Operation, outcome: Outcome) {
        self.settle();
        if let Outcome::Overview(overview) = &outcome {
            self.overview = Some(*overview);
        }
        let text = render_outcome(&outcome);
        self.record(operation, true, first_line(&text));
        if operation != Operation::Overview {
            self.result = text;
        }
    }

    pub fn apply_failed(&mut self, operation: Operation, message: String) {
        self.settle();
        self.result = operation.failure_message().to_string();
        self.record(operation, false, message.clone());
        self.set_status(message, StatusLevel::Error);
    }

    pub fn apply_worker_error(&mut self, message: String) {
        self.settle();
        self.connection = Connection::Failed(message.clone());
        self.set_status(message, StatusLevel::Error);
    }

    fn settle(&mut self) {
        self.in_flight = None;
        if self.quit_pending {
            self.should_quit = true;
        }
    }

    /// Text for the clipboard
    pub fn copy_text(&self) -> Option<&str> {
        Some(self.result.as_str()).filter(|text| !text.is_empty())
    }

    fn record(&mut self, operation: Operation, ok: bool, summary: String) {
        self.history.push(HistoryEntry {
            at: chrono::Local::now().format("%H:%M:%S").to_string(),
            operation,
            ok,
            summary,
        });
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }
}

fn row_index(row: FormRow) -> usize {
    FormRow::ALL
        .iter()
        .position(|candidate| *candidate == row)
        .unwrap_or(0)
}

/// Turn form input into a request; `Err` holds a user-facing message
pub fn build_request(row: FormRow, input: &str) -> Result<Request, String> {
    let input = input.trim();
    match row {
        FormRow::Deposit => parse_amount(input)
            .map(|amount| Request::Deposit { amount })
            .map_err(|err| format!("Invalid deposit amount: {err}")),
        FormRow::Withdraw => parse_amount(input)
            .map(|amount| Request::Withdraw { amount })
            .map_err(|err| format!("Invalid withdraw amount: {err}")),
        FormRow::Balance => {
            if input.is_empty() {
                return Ok(Request::Balance { user: None });
            }
            parse_address(input)
                .map(|user| Request::Balance { user: Some(user) })
                .map_err(|err| err.to_string())
        }
        FormRow::GameRoom => parse_room_input(input).map(|key| Request::GameRoom { key }),
        FormRow::VictoryFee => Ok(Request::VictoryFee),
        FormRow::DrawFee => Ok(Request::DrawFee),
        FormRow::TokenAddress => Ok(Request::TokenAddress),
    }
}

/// A `bytes32` key, or two duelist addresses the key is derived from
fn parse_room_input(input: &str) -> Result<GameRoomKey, String> {
    let parts: Vec<&str> = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    match parts.as_slice() {
        [key] => key.parse::<GameRoomKey>().map_err(|err| err.to_string()),
        [first, second] => {
            let duelist1 = parse_address(first).map_err(|err| err.to_string())?;
            let duelist2 = parse_address(second).map_err(|err| err.to_string())?;
            Ok(GameRoomKey::for_duelists(duelist1, duelist2))
        }
        [] => Err("Game room key is empty".to_string()),
        _ => Err("Expected a game room key or two duelist addresses".to_string()),
    }
}

/// Render a result the way the form displays it
pub fn render_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Deposited { available } => format!(
            "New Balance after Deposit: {available} ({} EDT)",
            format_edt(*available)
        ),
        Outcome::Withdrawn { new_balance } => format!(
            "New Balance after Withdrawal: {new_balance} ({} EDT)",
            format_edt(*new_balance)
        ),
        Outcome::Balance { user, balance } => {
            let mut text = format!("User Balance ({user}): {}", to_json(balance));
            if !balance.is_consistent() {
                text.push_str("\n(warning: total != locked + available)");
            }
            text
        }
        Outcome::GameRoom { key, room } => {
            let mut text = format!("Game Room {key}: {}", to_json(room));
            if room.is_vacant() {
                text.push_str("\n(no game room has been started under this key)");
            }
            text
        }
        Outcome::VictoryFee(fee) => format!("Victory Fee: {fee}"),
        Outcome::DrawFee(fee) => format!("Draw Fee: {fee}"),
        Outcome::TokenAddress(address) => format!("EDT Token Address: {address}"),
        Outcome::Overview(overview) => format!(
            "Victory Fee: {} · Draw Fee: {} · EDT: {}",
            overview.fee, overview.draw_fee, overview.token
        ),
    }
}

fn to_json<T: serde::Serialize + std::fmt::Debug>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or_default().to_string()
}
