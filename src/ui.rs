// 🖥️ Terminal UI - group list, dashboard, history panel, add-expense form
//
// Every action goes through ExpenseTracker and then re-reads the open group,
// so balances and history are always recomputed from stored state.

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use split_ledger::{
    compute_splits, format_amount, parse_amount, parse_split_inputs, BalanceSummary, ExpenseDraft,
    ExpenseId, ExpenseTracker, Group, History, HistorySide, HistoryView, LedgerResult,
    LedgerStore, Session, SettleOutcome, SplitInputs, SplitMode,
};
use std::collections::BTreeMap;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Groups,
    Dashboard,
    History,
    AddExpense,
}

impl Page {
    pub fn title(&self) -> &str {
        match self {
            Page::Groups => "Groups",
            Page::Dashboard => "Dashboard",
            Page::History => "History",
            Page::AddExpense => "Add Expense",
        }
    }
}

/// One-line text prompt shown in the status bar
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    NewGroup(String),
    AddMember(String),
}

impl Prompt {
    fn label(&self) -> &str {
        match self {
            Prompt::NewGroup(_) => "New group name",
            Prompt::AddMember(_) => "New member name",
        }
    }

    fn buffer(&self) -> &str {
        match self {
            Prompt::NewGroup(text) | Prompt::AddMember(text) => text,
        }
    }

    fn buffer_mut(&mut self) -> &mut String {
        match self {
            Prompt::NewGroup(text) | Prompt::AddMember(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

// ============================================================================
// HISTORY ROWS
// ============================================================================

/// Flattened history panel: a header per counterparty, followed by its
/// line items when expanded
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryRow {
    Counterparty {
        side: HistorySide,
        name: String,
        total: f64,
        items: usize,
        expanded: bool,
    },
    Item {
        side: HistorySide,
        counterparty: String,
        expense_id: ExpenseId,
        amount: f64,
        date: DateTime<Utc>,
    },
}

pub fn history_rows(history: &History, view: &HistoryView) -> Vec<HistoryRow> {
    let mut rows = Vec::new();

    for side in [HistorySide::YouOwe, HistorySide::OwesYou] {
        for entry in history.side(side) {
            let expanded = view.is_expanded(side, &entry.counterparty);
            rows.push(HistoryRow::Counterparty {
                side,
                name: entry.counterparty.clone(),
                total: entry.total,
                items: entry.items.len(),
                expanded,
            });

            if expanded {
                rows.extend(entry.items.iter().map(|item| HistoryRow::Item {
                    side,
                    counterparty: entry.counterparty.clone(),
                    expense_id: item.expense_id,
                    amount: item.amount,
                    date: item.date,
                }));
            }
        }
    }

    rows
}

// ============================================================================
// ADD-EXPENSE FORM
// ============================================================================

/// Raw text of the add-expense form. Field 0 is the total; fields 1.. are
/// the inputs of every member except the payer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseForm {
    pub total: String,
    pub payer: usize,
    pub inputs: BTreeMap<String, String>,
    pub focus: usize,
}

impl ExpenseForm {
    fn reset(&mut self, members: &[String], viewer: &str) {
        self.total.clear();
        self.inputs.clear();
        self.focus = 0;
        self.payer = members.iter().position(|m| m == viewer).unwrap_or(0);
    }

    fn payer_name<'a>(&self, members: &'a [String]) -> &'a str {
        members.get(self.payer).map(String::as_str).unwrap_or_default()
    }

    fn input_members<'a>(&self, members: &'a [String]) -> Vec<&'a str> {
        let payer = self.payer_name(members);
        members
            .iter()
            .map(String::as_str)
            .filter(|m| *m != payer)
            .collect()
    }

    fn field_count(&self, members: &[String], mode: SplitMode) -> usize {
        if mode.takes_inputs() {
            1 + self.input_members(members).len()
        } else {
            1
        }
    }

    fn focused_member<'a>(&self, members: &'a [String], mode: SplitMode) -> Option<&'a str> {
        if self.focus == 0 || !mode.takes_inputs() {
            return None;
        }
        self.input_members(members).get(self.focus - 1).copied()
    }

    fn focused_mut(&mut self, members: &[String], mode: SplitMode) -> Option<&mut String> {
        if self.focus == 0 {
            return Some(&mut self.total);
        }
        let member = self.focused_member(members, mode)?.to_string();
        Some(self.inputs.entry(member).or_default())
    }

    fn cycle_payer(&mut self, members: &[String], forward: bool) {
        let len = members.len();
        if len == 0 {
            return;
        }
        self.payer = if forward {
            (self.payer + 1) % len
        } else {
            (self.payer + len - 1) % len
        };
    }

    fn move_focus(&mut self, members: &[String], mode: SplitMode, forward: bool) {
        let count = self.field_count(members, mode);
        self.focus = if forward {
            (self.focus + 1) % count
        } else {
            (self.focus + count - 1) % count
        };
    }

    fn clamp_focus(&mut self, members: &[String], mode: SplitMode) {
        let last = self.field_count(members, mode) - 1;
        self.focus = self.focus.min(last);
    }

    /// Strict conversion used on submit
    fn draft(&self, members: &[String], mode: SplitMode) -> LedgerResult<ExpenseDraft> {
        let total = parse_amount(&self.total)?;
        let inputs = if mode.takes_inputs() {
            parse_split_inputs(self.input_members(members).into_iter().map(|member| {
                let text = self.inputs.get(member).map(String::as_str).unwrap_or("");
                (member, text)
            }))?
        } else {
            SplitInputs::new()
        };

        Ok(ExpenseDraft {
            total,
            paid_by: self.payer_name(members).to_string(),
            mode,
            inputs,
        })
    }

    /// Lenient conversion for the live preview; unreadable fields count as empty
    fn preview_draft(&self, members: &[String], mode: SplitMode) -> ExpenseDraft {
        let total = read_number(&self.total).unwrap_or(0.0);
        let inputs = if mode.takes_inputs() {
            self.input_members(members)
                .into_iter()
                .filter_map(|member| {
                    let value = read_number(self.inputs.get(member)?)?;
                    Some((member.to_string(), value))
                })
                .collect()
        } else {
            SplitInputs::new()
        };

        ExpenseDraft {
            total,
            paid_by: self.payer_name(members).to_string(),
            mode,
            inputs,
        }
    }
}

fn read_number(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

// ============================================================================
// APP
// ============================================================================

pub struct App<S: LedgerStore> {
    tracker: ExpenseTracker<S>,
    currency: String,
    pub session: Session,
    pub current_page: Page,
    pub groups: Vec<Group>,
    pub groups_state: TableState,
    pub group: Option<Group>,
    pub balances: Option<BalanceSummary>,
    pub history: Option<History>,
    pub history_state: TableState,
    pub form: ExpenseForm,
    pub prompt: Option<Prompt>,
    pub status: Option<Status>,
}

impl<S: LedgerStore> App<S> {
    pub fn new(tracker: ExpenseTracker<S>, currency: String) -> Result<Self> {
        let session = Session::new(tracker.viewer());
        let mut app = Self {
            tracker,
            currency,
            session,
            current_page: Page::Groups,
            groups: Vec::new(),
            groups_state: TableState::default(),
            group: None,
            balances: None,
            history: None,
            history_state: TableState::default(),
            form: ExpenseForm::default(),
            prompt: None,
            status: None,
        };
        app.refresh_groups()?;
        Ok(app)
    }

    fn money(&self, value: f64) -> String {
        format_amount(&self.currency, value)
    }

    fn members(&self) -> Vec<String> {
        self.group
            .as_ref()
            .map(|g| g.members().to_vec())
            .unwrap_or_default()
    }

    fn report<T>(&mut self, result: LedgerResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.status = Some(Status::Error(err.to_string()));
                None
            }
        }
    }

    pub fn refresh_groups(&mut self) -> LedgerResult<()> {
        self.groups = self.tracker.state()?.groups().to_vec();
        clamp_selection(&mut self.groups_state, self.groups.len());
        Ok(())
    }

    /// Re-read the open group and recompute its derived views
    pub fn refresh_group(&mut self) -> LedgerResult<()> {
        let Some(name) = self.session.current_group().map(str::to_string) else {
            self.group = None;
            self.balances = None;
            self.history = None;
            return Ok(());
        };

        self.group = Some(self.tracker.group(&name)?);
        self.balances = Some(self.tracker.balances(&name)?);
        self.history = Some(self.tracker.history(&name)?);

        let rows = self.history_rows().len();
        clamp_selection(&mut self.history_state, rows);
        Ok(())
    }

    pub fn history_rows(&self) -> Vec<HistoryRow> {
        match &self.history {
            Some(history) => history_rows(history, self.session.history()),
            None => Vec::new(),
        }
    }

    pub fn open_selected_group(&mut self) {
        let Some(name) = self
            .groups_state
            .selected()
            .and_then(|i| self.groups.get(i))
            .map(|g| g.name().to_string())
        else {
            return;
        };

        self.session.open_group(name);
        let result = self.refresh_group();
        if self.report(result).is_some() {
            self.current_page = Page::Dashboard;
        }
    }

    fn close_group(&mut self) {
        self.session.close_group();
        let result = self.refresh_group().and_then(|_| self.refresh_groups());
        self.report(result);
        self.current_page = Page::Groups;
    }

    pub fn open_history(&mut self) {
        self.session.open_history();
        let result = self.refresh_group();
        self.report(result);

        let rows = self.history_rows().len();
        self.history_state.select(if rows == 0 { None } else { Some(0) });
        self.current_page = Page::History;
    }

    fn close_history(&mut self) {
        self.session.close_history();
        self.current_page = Page::Dashboard;
    }

    pub fn toggle_selected(&mut self) {
        let rows = self.history_rows();
        if let Some(HistoryRow::Counterparty { side, name, .. }) =
            self.history_state.selected().and_then(|i| rows.get(i))
        {
            self.session.history_mut().toggle(*side, name);
        }
    }

    /// Settle the selected line item. On "you owe" rows the viewer pays;
    /// on "owes you" rows the counterparty does.
    pub fn mark_selected_paid(&mut self) {
        let rows = self.history_rows();
        let Some(HistoryRow::Item {
            side,
            counterparty,
            expense_id,
            ..
        }) = self.history_state.selected().and_then(|i| rows.get(i))
        else {
            return;
        };
        let Some(group) = self.session.current_group().map(str::to_string) else {
            return;
        };

        let person = match side {
            HistorySide::YouOwe => self.session.viewer().to_string(),
            HistorySide::OwesYou => counterparty.clone(),
        };

        let result = self.tracker.mark_paid(&group, *expense_id, &person);
        if let Some(outcome) = self.report(result) {
            self.status = Some(match outcome {
                SettleOutcome::Settled => Status::Info(format!("{} marked paid on #{}", person, expense_id)),
                SettleOutcome::AlreadySettled => Status::Info(format!("{} already paid on #{}", person, expense_id)),
                SettleOutcome::ExpenseNotFound => Status::Error(format!("Expense #{} no longer exists", expense_id)),
                SettleOutcome::NotOwed => Status::Error(format!("{} owes nothing on #{}", person, expense_id)),
            });
            let result = self.refresh_group();
            self.report(result);
        }
    }

    pub fn open_form(&mut self) {
        let members = self.members();
        self.form.reset(&members, self.session.viewer());
        self.current_page = Page::AddExpense;
    }

    pub fn submit_form(&mut self) {
        let Some(group) = self.session.current_group().map(str::to_string) else {
            return;
        };
        let members = self.members();

        let result = self
            .form
            .draft(&members, self.session.split_mode())
            .and_then(|draft| self.tracker.add_expense(&group, &draft));

        if let Some(expense) = self.report(result) {
            self.status = Some(Status::Info(format!(
                "Expense #{} added: {} paid {}",
                expense.id(),
                expense.paid_by(),
                self.money(expense.total())
            )));
            let result = self.refresh_group();
            self.report(result);
            self.current_page = Page::Dashboard;
        }
    }

    fn submit_prompt(&mut self, prompt: Prompt) {
        match prompt {
            Prompt::NewGroup(name) => {
                let result = self.tracker.create_group(&name);
                let Some(group) = self.report(result) else {
                    return;
                };
                self.status = Some(Status::Info(format!("Created group '{}'", group.name())));

                let result = self.refresh_groups();
                self.report(result);
                let index = self.groups.iter().position(|g| g.name() == group.name());
                self.groups_state.select(index);
            }
            Prompt::AddMember(name) => {
                let Some(group) = self.session.current_group().map(str::to_string) else {
                    return;
                };
                let result = self.tracker.add_member(&group, &name);
                let Some(member) = self.report(result) else {
                    return;
                };
                self.status = Some(Status::Info(format!("Added {} to {}", member, group)));

                let result = self.refresh_group();
                self.report(result);
            }
        }
    }

    /// Handle one key press. Returns false when the user quits.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }

        if self.prompt.is_some() {
            self.handle_prompt_key(key.code);
            return true;
        }

        self.status = None;

        match self.current_page {
            Page::Groups => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return false,
                KeyCode::Down | KeyCode::Char('j') => step(&mut self.groups_state, self.groups.len(), true),
                KeyCode::Up | KeyCode::Char('k') => step(&mut self.groups_state, self.groups.len(), false),
                KeyCode::Enter => self.open_selected_group(),
                KeyCode::Char('n') => self.prompt = Some(Prompt::NewGroup(String::new())),
                _ => {}
            },
            Page::Dashboard => match key.code {
                KeyCode::Char('q') => return false,
                KeyCode::Esc | KeyCode::Backspace => self.close_group(),
                KeyCode::Char('a') => self.open_form(),
                KeyCode::Char('m') => self.prompt = Some(Prompt::AddMember(String::new())),
                KeyCode::Char('h') => self.open_history(),
                _ => {}
            },
            Page::History => {
                let rows = self.history_rows().len();
                match key.code {
                    KeyCode::Char('q') => return false,
                    KeyCode::Esc | KeyCode::Char('h') => self.close_history(),
                    KeyCode::Down | KeyCode::Char('j') => step(&mut self.history_state, rows, true),
                    KeyCode::Up | KeyCode::Char('k') => step(&mut self.history_state, rows, false),
                    KeyCode::Enter => self.toggle_selected(),
                    KeyCode::Char('p') => self.mark_selected_paid(),
                    _ => {}
                }
            }
            Page::AddExpense => self.handle_form_key(key.code),
        }

        true
    }

    fn handle_prompt_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    self.submit_prompt(prompt);
                }
            }
            KeyCode::Backspace => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.buffer_mut().pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(prompt) = self.prompt.as_mut() {
                    prompt.buffer_mut().push(c);
                }
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, code: KeyCode) {
        let members = self.members();
        let mode = self.session.split_mode();

        match code {
            KeyCode::Esc => self.current_page = Page::Dashboard,
            KeyCode::Enter => self.submit_form(),
            KeyCode::Tab => {
                let mode = self.session.cycle_split_mode();
                self.form.clamp_focus(&members, mode);
            }
            KeyCode::Left | KeyCode::Right => {
                self.form.cycle_payer(&members, code == KeyCode::Right);
                self.form.clamp_focus(&members, mode);
            }
            KeyCode::Down => self.form.move_focus(&members, mode, true),
            KeyCode::Up => self.form.move_focus(&members, mode, false),
            KeyCode::Backspace => {
                if let Some(text) = self.form.focused_mut(&members, mode) {
                    text.pop();
                }
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => {
                if let Some(text) = self.form.focused_mut(&members, mode) {
                    text.push(c);
                }
            }
            _ => {}
        }
    }
}

fn step(state: &mut TableState, len: usize, forward: bool) {
    if len == 0 {
        return;
    }
    let i = match state.selected() {
        Some(i) if forward => {
            if i >= len - 1 {
                0
            } else {
                i + 1
            }
        }
        Some(i) => {
            if i == 0 {
                len - 1
            } else {
                i - 1
            }
        }
        None => 0,
    };
    state.select(Some(i));
}

fn clamp_selection(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else {
        state.select(Some(state.selected().unwrap_or(0).min(len - 1)));
    }
}

// ============================================================================
// TERMINAL LOOP
// ============================================================================

pub fn run_ui<S: LedgerStore>(app: &mut App<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend, S: LedgerStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui<S: LedgerStore>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Groups => render_groups(f, chunks[1], app),
        Page::Dashboard => render_dashboard(f, chunks[1], app),
        Page::History => render_history(f, chunks[1], app),
        Page::AddExpense => render_form(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header<S: LedgerStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let mut spans = vec![
        Span::styled(
            "Split Ledger",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ "),
    ];

    if let Some(group) = app.session.current_group() {
        spans.push(Span::styled(group.to_string(), Style::default().fg(Color::White)));
        spans.push(Span::raw(" │ "));
    }

    spans.push(Span::styled(
        app.current_page.title().to_string(),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    ));

    if let Some(summary) = &app.balances {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            format!("↓ {}", app.money(summary.you_owe)),
            Style::default().fg(Color::Red),
        ));
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("↑ {}", app.money(summary.you_are_owed)),
            Style::default().fg(Color::Green),
        ));
    }

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn render_groups<S: LedgerStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let rows = app.groups.iter().map(|group| {
        let open: usize = group
            .expenses()
            .iter()
            .map(|e| e.outstanding().count())
            .sum();

        Row::new(vec![
            Cell::from(truncate(group.name(), 30)),
            Cell::from(format!("{}", group.members().len())),
            Cell::from(format!("{}", group.expenses().len())),
            Cell::from(format!("{}", open)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(12),
        ],
    )
    .header(header_row(&["Group", "Members", "Expenses", "Unsettled"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Groups "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.groups_state);
}

fn render_dashboard<S: LedgerStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let Some(group) = &app.group else {
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(columns[0]);

    // Member chips
    let mut chips = Vec::new();
    for member in group.members() {
        let (label, style) = if member == app.session.viewer() {
            (format!(" {} (You) ", member), Style::default().fg(Color::Black).bg(Color::Cyan))
        } else {
            (format!(" {} ", member), Style::default().fg(Color::Black).bg(Color::Gray))
        };
        chips.push(Span::styled(label, style));
        chips.push(Span::raw(" "));
    }
    let members = Paragraph::new(Line::from(chips)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Members "),
    );
    f.render_widget(members, left[0]);

    // Balances
    let mut lines = vec![Line::from("")];
    if let Some(summary) = &app.balances {
        lines.push(Line::from(vec![
            Span::styled("  You owe:       ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::styled(app.money(summary.you_owe), Style::default().fg(Color::Red)),
        ]));
        for (creditor, amount) in &summary.you_owe_to {
            lines.push(Line::from(format!("      to {}: {}", creditor, app.money(*amount))));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("  You are owed:  ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::styled(app.money(summary.you_are_owed), Style::default().fg(Color::Green)),
        ]));
        for (debtor, amount) in &summary.owed_to_you {
            lines.push(Line::from(format!("      from {}: {}", debtor, app.money(*amount))));
        }
        if summary.is_settled_up() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  All settled up",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }
    }
    let balances = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Balances "),
    );
    f.render_widget(balances, left[1]);

    // Expense log, newest first
    let rows = group.expenses().iter().rev().map(|expense| {
        let splits: Vec<String> = expense
            .splits()
            .iter()
            .map(|(person, amount)| {
                let mark = if expense.is_settled(person) { " ✓" } else { "" };
                format!("{} {}{}", person, app.money(*amount), mark)
            })
            .collect();

        Row::new(vec![
            Cell::from(expense.date().with_timezone(&Local).format("%d/%m %H:%M").to_string()),
            Cell::from(truncate(expense.paid_by(), 14)),
            Cell::from(app.money(expense.total())),
            Cell::from(splits.join(", ")),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(15),
            Constraint::Length(12),
            Constraint::Min(20),
        ],
    )
    .header(header_row(&["Date", "Paid by", "Total", "Split"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Expenses "),
    );

    f.render_widget(table, columns[1]);
}

fn render_history<S: LedgerStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let rows = app.history_rows();

    if rows.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  Nothing outstanding. All settled up.",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" History "),
        );
        f.render_widget(empty, area);
        return;
    }

    let table_rows = rows.iter().map(|row| match row {
        HistoryRow::Counterparty {
            side,
            name,
            total,
            items,
            expanded,
        } => {
            let color = match side {
                HistorySide::YouOwe => Color::Red,
                HistorySide::OwesYou => Color::Green,
            };
            let arrow = if *expanded { "▾" } else { "▸" };
            let who = match side {
                HistorySide::YouOwe => format!("{} You owe {}", arrow, name),
                HistorySide::OwesYou => format!("{} {} owes you", arrow, name),
            };

            Row::new(vec![
                Cell::from(who).style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(format!("{} item(s)", items)),
                Cell::from(app.money(*total)).style(Style::default().fg(color)),
            ])
            .height(1)
        }
        HistoryRow::Item {
            expense_id,
            amount,
            date,
            ..
        } => Row::new(vec![
            Cell::from(format!("    #{}", expense_id)),
            Cell::from(date.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string()),
            Cell::from(app.money(*amount)),
        ])
        .style(Style::default().fg(Color::Gray))
        .height(1),
    });

    let table = Table::new(
        table_rows,
        [Constraint::Length(36), Constraint::Length(18), Constraint::Length(14)],
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" History "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.history_state);
}

fn render_form<S: LedgerStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let members = app.members();
    let mode = app.session.split_mode();
    let form = &app.form;
    let input_members = form.input_members(&members);
    let field_rows = if mode.takes_inputs() { input_members.len() } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(field_rows as u16 + 7), Constraint::Min(0)])
        .split(area);

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let cursor = |focused: bool| if focused { "→ " } else { "  " };

    let mut lines = vec![
        Line::from(vec![
            Span::raw(cursor(form.focus == 0)),
            Span::styled("Total:    ", label),
            Span::raw(format!("{}{}", app.currency, form.total)),
        ]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("Paid by:  ", label),
            Span::styled(
                format!("◀ {} ▶", form.payer_name(&members)),
                Style::default().fg(Color::Yellow),
            ),
        ]),
    ];

    let mut mode_spans = vec![Span::raw("  "), Span::styled("Split:    ", label)];
    for candidate in SplitMode::ALL {
        let style = if candidate == mode {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        mode_spans.push(Span::styled(candidate.as_str(), style));
        mode_spans.push(Span::raw("  "));
    }
    lines.push(Line::from(mode_spans));

    if mode.takes_inputs() {
        lines.push(Line::from(""));
        for (i, member) in input_members.iter().enumerate() {
            let text = form.inputs.get(*member).map(String::as_str).unwrap_or("");
            let value = match mode {
                SplitMode::Percent => format!("{}%", text),
                _ => format!("{}{}", app.currency, text),
            };
            lines.push(Line::from(vec![
                Span::raw(cursor(form.focus == i + 1)),
                Span::styled(format!("{:<10}", truncate(member, 10)), label),
                Span::raw(value),
            ]));
        }
    }

    let fields = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" New Expense "),
    );
    f.render_widget(fields, chunks[0]);

    // Live preview
    let draft = form.preview_draft(&members, mode);
    let preview = split_ledger::preview(&members, &draft);
    let problem = if draft.total > 0.0 {
        compute_splits(&members, &draft).err()
    } else {
        None
    };

    let rows = preview.rows.iter().map(|row| {
        let who = if row.is_payer {
            format!("{} (paid, keeps)", row.member)
        } else {
            row.member.clone()
        };
        let percent = row.percent.map(|p| format!("{:.2}%", p)).unwrap_or_default();
        let style = if row.is_payer {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };

        Row::new(vec![
            Cell::from(who),
            Cell::from(app.money(row.amount)),
            Cell::from(percent),
        ])
        .style(style)
        .height(1)
    });

    let title = match &problem {
        Some(err) => format!(" Preview - {} ", err),
        None => " Preview ".to_string(),
    };
    let border = if problem.is_some() { Color::Red } else { Color::White };

    let table = Table::new(
        rows,
        [Constraint::Length(28), Constraint::Length(14), Constraint::Length(10)],
    )
    .header(header_row(&["Member", "Share", "%"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(title),
    );

    f.render_widget(table, chunks[1]);
}

fn render_status_bar<S: LedgerStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let spans = if let Some(prompt) = &app.prompt {
        vec![
            Span::styled(format!(" {}: ", prompt.label()), Style::default().fg(Color::Cyan)),
            Span::raw(format!("{}█", prompt.buffer())),
            Span::raw("  | "),
            key("Enter"),
            Span::raw(" Save | "),
            key("Esc"),
            Span::raw(" Cancel"),
        ]
    } else if let Some(status) = &app.status {
        match status {
            Status::Info(text) => vec![Span::styled(format!(" ✓ {}", text), Style::default().fg(Color::Green))],
            Status::Error(text) => vec![Span::styled(format!(" ✗ {}", text), Style::default().fg(Color::Red))],
        }
    } else {
        let mut spans = vec![Span::raw(" ")];
        let hints: &[(&'static str, &'static str)] = match app.current_page {
            Page::Groups => &[("Enter", " Open | "), ("n", " New group | "), ("↑/↓", " Nav | ")],
            Page::Dashboard => &[
                ("a", " Add expense | "),
                ("m", " Add member | "),
                ("h", " History | "),
                ("Esc", " Groups | "),
            ],
            Page::History => &[
                ("Enter", " Expand | "),
                ("p", " Mark paid | "),
                ("↑/↓", " Nav | "),
                ("Esc", " Back | "),
            ],
            Page::AddExpense => &[
                ("↑/↓", " Field | "),
                ("←/→", " Payer | "),
                ("Tab", " Mode | "),
                ("Enter", " Save | "),
                ("Esc", " Cancel"),
            ],
        };
        for (k, text) in hints {
            spans.push(key(*k));
            spans.push(Span::raw(*text));
        }
        if app.current_page != Page::AddExpense {
            spans.push(Span::styled("q", Style::default().fg(Color::Red)));
            spans.push(Span::raw(" Quit"));
        }
        spans
    };

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use split_ledger::{LedgerError, MemoryStore, DEFAULT_GROUP_NAME};

    fn app() -> App<MemoryStore> {
        let tracker = ExpenseTracker::new(MemoryStore::new(), "User");
        App::new(tracker, "₹".to_string()).unwrap()
    }

    fn press(app: &mut App<MemoryStore>, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn open_goa(app: &mut App<MemoryStore>) {
        press(app, KeyCode::Enter);
        assert_eq!(app.current_page, Page::Dashboard);
        assert_eq!(app.session.current_group(), Some(DEFAULT_GROUP_NAME));
    }

    #[test]
    fn test_starts_on_seeded_group_list() {
        let app = app();
        assert_eq!(app.current_page, Page::Groups);
        assert_eq!(app.groups.len(), 1);
        assert_eq!(app.groups_state.selected(), Some(0));
    }

    #[test]
    fn test_add_equal_expense_through_form() {
        let mut app = app();
        open_goa(&mut app);

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.current_page, Page::AddExpense);
        type_text(&mut app, "300");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.current_page, Page::Dashboard);
        assert!(matches!(app.status, Some(Status::Info(_))));
        let balances = app.balances.as_ref().unwrap();
        assert_eq!(balances.you_are_owed, 200.0);
        assert_eq!(app.group.as_ref().unwrap().expenses().len(), 1);
    }

    #[test]
    fn test_exact_over_total_stays_on_form() {
        let mut app = app();
        open_goa(&mut app);
        press(&mut app, KeyCode::Char('a'));

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.session.split_mode(), SplitMode::Exact);

        type_text(&mut app, "100");
        press(&mut app, KeyCode::Down);
        type_text(&mut app, "80");
        press(&mut app, KeyCode::Down);
        type_text(&mut app, "30");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.current_page, Page::AddExpense);
        assert_eq!(
            app.status,
            Some(Status::Error(
                LedgerError::ExactSplitExceedsTotal { total: 100.0, entered: 110.0 }.to_string()
            ))
        );
        assert!(app.group.as_ref().unwrap().expenses().is_empty());
    }

    #[test]
    fn test_form_payer_cycles_and_skips_payer_input() {
        let mut app = app();
        open_goa(&mut app);
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Right);

        let members = app.members();
        assert_eq!(app.form.payer_name(&members), "Alice");
        assert_eq!(app.form.input_members(&members), vec!["User", "Bob"]);

        press(&mut app, KeyCode::Left);
        assert_eq!(app.form.payer_name(&members), "User");
    }

    #[test]
    fn test_history_expand_and_mark_paid() {
        let mut app = app();
        open_goa(&mut app);
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "300");
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Char('h'));
        assert_eq!(app.current_page, Page::History);
        let rows = app.history_rows();
        assert_eq!(rows.len(), 2);
        assert!(matches!(&rows[0], HistoryRow::Counterparty { name, expanded: false, .. } if name == "Alice"));

        press(&mut app, KeyCode::Enter);
        let rows = app.history_rows();
        assert_eq!(rows.len(), 3);
        assert!(matches!(&rows[1], HistoryRow::Item { counterparty, amount, .. } if counterparty == "Alice" && *amount == 100.0));

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('p'));

        assert_eq!(app.balances.as_ref().unwrap().you_are_owed, 100.0);
        let rows = app.history_rows();
        assert_eq!(rows.len(), 1);
        assert!(matches!(&rows[0], HistoryRow::Counterparty { name, .. } if name == "Bob"));
        assert_eq!(app.history_state.selected(), Some(0));
    }

    #[test]
    fn test_reopening_history_collapses() {
        let mut app = app();
        open_goa(&mut app);
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "90");
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Char('h'));
        press(&mut app, KeyCode::Enter);
        assert!(app.session.history().is_expanded(HistorySide::OwesYou, "Alice"));

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('h'));
        assert!(!app.session.history().is_expanded(HistorySide::OwesYou, "Alice"));
        assert_eq!(app.history_rows().len(), 2);
    }

    #[test]
    fn test_add_member_prompt() {
        let mut app = app();
        open_goa(&mut app);

        press(&mut app, KeyCode::Char('m'));
        type_text(&mut app, "Carol");
        press(&mut app, KeyCode::Enter);
        assert!(app.prompt.is_none());
        assert_eq!(app.members(), vec!["User", "Alice", "Bob", "Carol"]);

        press(&mut app, KeyCode::Char('m'));
        type_text(&mut app, "Carol");
        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.status,
            Some(Status::Error(LedgerError::DuplicateMember("Carol".to_string()).to_string()))
        );
    }

    #[test]
    fn test_new_group_prompt_selects_group() {
        let mut app = app();
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Flatmates");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.groups.len(), 2);
        assert_eq!(app.groups_state.selected(), Some(1));

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.session.current_group(), Some("Flatmates"));
        assert_eq!(app.members(), vec!["User"]);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert!(!app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("Goa", 10), "Goa");
        assert_eq!(truncate("Trip to Goa with friends", 10), "Trip to...");
        assert_eq!(truncate("₹₹₹₹₹₹₹₹₹₹₹₹", 5), "₹₹...");
    }
}
