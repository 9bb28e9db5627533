use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};
use std::collections::HashMap;
use std::io::stdout;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::ai::Assistant;
use crate::export;
use crate::models::{ApplicationStatus, Interview, JobApplication, Platform, UserProfile};
use crate::session::{DashboardStats, Session, SessionHandle};
use crate::simulator::{AutoApplySimulator, SimulatorState};

const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Home,
    Apply,
    Resume,
    Interviews,
    Profile,
}

impl View {
    const ALL: [View; 5] = [View::Home, View::Apply, View::Resume, View::Interviews, View::Profile];

    fn label(&self) -> &'static str {
        match self {
            View::Home => "Home",
            View::Apply => "Apply",
            View::Resume => "Resume",
            View::Interviews => "Interviews",
            View::Profile => "Profile",
        }
    }

    fn index(&self) -> usize {
        View::ALL.iter().position(|v| v == self).unwrap_or(0)
    }

    fn next(&self) -> View {
        View::ALL[(self.index() + 1) % View::ALL.len()]
    }

    fn prev(&self) -> View {
        View::ALL[(self.index() + View::ALL.len() - 1) % View::ALL.len()]
    }

    fn title(&self) -> &'static str {
        match self {
            View::Home => "HireBot AI",
            other => other.label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AiStatus {
    Pending,
    Ready(String),
}

#[derive(Debug, PartialEq, Eq)]
enum Action {
    None,
    Quit,
    Reset,
    ToggleAutoApply,
    Export,
    AnalyzeResume,
    GenerateTips(usize),
}

enum AiOutcome {
    Resume(String),
    Tips { interview_id: String, text: String },
}

// What a frame needs, copied out so the session lock is not held during terminal I/O.
struct Snapshot {
    profile: Option<UserProfile>,
    stats: DashboardStats,
    recent: Vec<JobApplication>,
    interviews: Vec<Interview>,
    target_role: Option<String>,
}

impl Snapshot {
    fn capture(session: &Session) -> Self {
        Self {
            profile: session.profile().cloned(),
            stats: session.stats(),
            recent: session.recent(RECENT_LIMIT).to_vec(),
            interviews: session.interviews().to_vec(),
            target_role: session.target_role().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardExit {
    Quit,
    Reset,
}

struct UiState {
    view: View,
    interview_selected: usize,
    resume_analysis: Option<AiStatus>,
    tips: HashMap<String, AiStatus>,
    info: String,
    scroll_offset: u16,
}

impl UiState {
    fn new() -> Self {
        Self {
            view: View::Home,
            interview_selected: 0,
            resume_analysis: None,
            tips: HashMap::new(),
            info: String::new(),
            scroll_offset: 0,
        }
    }

    fn show(&mut self, view: View) {
        if self.view != view {
            self.view = view;
            self.scroll_offset = 0;
        }
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers, interview_count: usize) -> Action {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
            KeyCode::Tab | KeyCode::Right => {
                self.show(self.view.next());
                Action::None
            }
            KeyCode::BackTab | KeyCode::Left => {
                self.show(self.view.prev());
                Action::None
            }
            KeyCode::Char(c @ '1'..='5') => {
                let idx = c as usize - '1' as usize;
                self.show(View::ALL[idx]);
                Action::None
            }
            KeyCode::Char(' ') => Action::ToggleAutoApply,
            KeyCode::Char('e') => Action::Export,
            KeyCode::Char('R') => Action::Reset,
            KeyCode::Char('a') if self.view == View::Resume => Action::AnalyzeResume,
            KeyCode::Char('t') if self.view == View::Interviews && interview_count > 0 => {
                Action::GenerateTips(self.interview_selected.min(interview_count - 1))
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.view == View::Interviews && self.interview_selected + 1 < interview_count {
                    self.interview_selected += 1;
                } else {
                    self.scroll_offset = self.scroll_offset.saturating_add(3);
                }
                Action::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if self.view == View::Interviews && self.interview_selected > 0 {
                    self.interview_selected -= 1;
                } else {
                    self.scroll_offset = self.scroll_offset.saturating_sub(3);
                }
                Action::None
            }
            _ => Action::None,
        }
    }

    fn apply_outcome(&mut self, outcome: AiOutcome) {
        match outcome {
            AiOutcome::Resume(text) => self.resume_analysis = Some(AiStatus::Ready(text)),
            AiOutcome::Tips { interview_id, text } => {
                self.tips.insert(interview_id, AiStatus::Ready(text));
            }
        }
    }
}

pub fn run_dashboard(
    session: SessionHandle,
    assistant: Arc<Assistant>,
    runtime: Handle,
    tick_interval: Duration,
) -> Result<DashboardExit> {
    let mut simulator = AutoApplySimulator::new(runtime, session.clone(), tick_interval);
    simulator.sync();

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &session, &mut simulator, assistant);

    simulator.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    session: &SessionHandle,
    simulator: &mut AutoApplySimulator,
    assistant: Arc<Assistant>,
) -> Result<DashboardExit> {
    let mut state = UiState::new();
    let (ai_tx, ai_rx): (Sender<AiOutcome>, Receiver<AiOutcome>) = mpsc::channel();

    loop {
        while let Ok(outcome) = ai_rx.try_recv() {
            state.apply_outcome(outcome);
        }

        let sim_state = simulator.state();
        let snapshot = session.read(Snapshot::capture);
        terminal.draw(|frame| draw(frame, &state, &snapshot, sim_state))?;

        // Short poll so simulator output shows up without a keypress.
        if !event::poll(Duration::from_millis(200))? {
            continue;
        }
        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let interview_count = session.read(|s| s.interviews().len());
        match state.handle_key(key.code, key.modifiers, interview_count) {
            Action::None => {}
            Action::Quit => return Ok(DashboardExit::Quit),
            Action::Reset => {
                if let Err(e) = session.update(|s| s.reset_session()) {
                    warn!("{e}");
                }
                simulator.sync();
                return Ok(DashboardExit::Reset);
            }
            Action::ToggleAutoApply => {
                let now = simulator.toggle();
                state.info = match now {
                    SimulatorState::Running => "Auto-apply started".to_string(),
                    SimulatorState::Idle => "Auto-apply stopped".to_string(),
                };
            }
            Action::Export => {
                let applications = session.read(|s| s.applications().to_vec());
                state.info = match export::write_csv(&applications, None) {
                    Ok(path) => format!("Exported {} application(s) to {}", applications.len(), path.display()),
                    Err(e) => e.to_string(),
                };
            }
            Action::AnalyzeResume => {
                if state.resume_analysis == Some(AiStatus::Pending) {
                    continue;
                }
                let Some((resume, role)) = session.read(|s| {
                    s.profile().map(|p| (p.resume_text.clone(), p.role.clone()))
                }) else {
                    continue;
                };
                state.resume_analysis = Some(AiStatus::Pending);
                let assistant = Arc::clone(&assistant);
                let tx = ai_tx.clone();
                std::thread::spawn(move || {
                    let text = assistant.analyze_resume(&resume, &role);
                    let _ = tx.send(AiOutcome::Resume(text));
                });
            }
            Action::GenerateTips(idx) => {
                let Some(interview) = session.read(|s| s.interviews().get(idx).cloned()) else {
                    continue;
                };
                if state.tips.get(&interview.id) == Some(&AiStatus::Pending) {
                    continue;
                }
                debug!(company = %interview.company_name, "requesting interview tips");
                state.tips.insert(interview.id.clone(), AiStatus::Pending);
                let assistant = Arc::clone(&assistant);
                let tx = ai_tx.clone();
                std::thread::spawn(move || {
                    let text = assistant.interview_tips(
                        &interview.company_name,
                        &interview.role,
                        interview.interview_type.as_str(),
                    );
                    let _ = tx.send(AiOutcome::Tips {
                        interview_id: interview.id,
                        text,
                    });
                });
            }
        }
    }
}

fn draw(frame: &mut Frame, state: &UiState, snapshot: &Snapshot, sim_state: SimulatorState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, v)| Line::from(format!("{} {}", i + 1, v.label())))
        .collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", state.view.title())))
        .select(state.view.index())
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, chunks[0]);

    match state.view {
        View::Interviews => draw_interviews(frame, chunks[1], state, snapshot),
        view => {
            let lines = match view {
                View::Home => home_lines(snapshot),
                View::Apply => apply_lines(snapshot, sim_state),
                View::Resume => resume_lines(state, snapshot),
                _ => profile_lines(snapshot),
            };
            let body = Paragraph::new(Text::from(lines))
                .block(Block::default().borders(Borders::ALL))
                .wrap(Wrap { trim: false })
                .scroll((state.scroll_offset, 0));
            frame.render_widget(body, chunks[1]);
        }
    }

    let footer = if state.info.is_empty() {
        " tab/1-5:view  space:auto-apply  a:analyze  t:tips  e:export  R:reset  q:quit".to_string()
    } else {
        format!(" {}", state.info)
    };
    frame.render_widget(
        Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}

fn status_style(status: ApplicationStatus) -> Style {
    match status {
        ApplicationStatus::Applied => Style::default().fg(Color::Blue),
        ApplicationStatus::Shortlisted => Style::default().fg(Color::Green),
        ApplicationStatus::InReview => Style::default().fg(Color::Yellow),
        ApplicationStatus::Rejected => Style::default().fg(Color::Red),
        ApplicationStatus::InterviewScheduled => Style::default().fg(Color::Magenta),
    }
}

fn platform_icon(platform: Platform) -> &'static str {
    match platform {
        Platform::LinkedIn => "in",
        Platform::Indeed => "id",
        Platform::Naukri => "nk",
        Platform::Foundit => "fi",
        Platform::CareerPage => "www",
    }
}

fn bold(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(text.into(), Style::default().add_modifier(Modifier::BOLD)))
}

fn dim(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(text.into(), Style::default().fg(Color::DarkGray)))
}

fn home_lines(snapshot: &Snapshot) -> Vec<Line<'static>> {
    let stats = snapshot.stats;
    let mut lines = vec![
        bold(format!("Total Applied: {}", stats.total)),
        Line::from(format!(
            "Shortlisted: {}   In Review: {}   Rejected: {}   Interviews: {}",
            stats.shortlisted, stats.in_review, stats.rejected, stats.interviews
        )),
        Line::from(""),
        bold("Recent Applications"),
    ];

    let recent = &snapshot.recent;
    if recent.is_empty() {
        lines.push(dim("No applications yet. Start the bot from the Apply tab."));
    }
    for app in recent {
        lines.push(Line::from(vec![
            Span::raw(format!("[{:<3}] ", platform_icon(app.platform))),
            Span::styled(app.company_name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!(" - {} ", app.role)),
            Span::styled(app.status.as_str(), status_style(app.status)),
            Span::raw(format!("  {}% match, {}", app.match_score, app.applied_date)),
        ]));
    }
    lines
}

fn apply_lines(snapshot: &Snapshot, sim_state: SimulatorState) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    match sim_state {
        SimulatorState::Running => {
            lines.push(Line::from(Span::styled(
                "Applying in Bulk...",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from("Bot is scanning LinkedIn, Indeed, and more to match your profile."));
            lines.push(Line::from(""));
            lines.push(Line::from("[space] Stop Bot"));
        }
        SimulatorState::Idle => {
            lines.push(bold("Ready to Start?"));
            lines.push(Line::from("Start the automation bot to apply to jobs matching your profile."));
            lines.push(Line::from(""));
            lines.push(Line::from("[space] Start Auto-Apply"));
        }
    }
    lines.push(Line::from(""));
    lines.push(dim(format!("Applications this session: {}", snapshot.stats.total)));
    if let Some(role) = &snapshot.target_role {
        lines.push(dim(format!("Targeting role: {}", role)));
    }
    lines
}

fn resume_lines(state: &UiState, snapshot: &Snapshot) -> Vec<Line<'static>> {
    let Some(profile) = &snapshot.profile else {
        return vec![dim("No profile loaded.")];
    };
    let name = if profile.name.is_empty() { "User" } else { profile.name.as_str() };
    let role = if profile.role.is_empty() { "target" } else { profile.role.as_str() };

    let mut lines = vec![
        bold(format!("{}'s Resume", name)),
        dim(format!("{} characters of resume text", profile.resume_text.chars().count())),
        Line::from(""),
        bold("AI Optimization"),
        Line::from("  - Include \"Cloud Architecture\" in professional summary."),
        Line::from(format!("  - Quantify previous achievements at {}.", profile.field)),
        Line::from(format!("  - Update skills to match the {} role.", role)),
        Line::from(""),
    ];

    match &state.resume_analysis {
        None => lines.push(dim("[a] Improve Match Rate (AI analysis)")),
        Some(AiStatus::Pending) => lines.push(Line::from(Span::styled(
            "Analyzing resume...",
            Style::default().fg(Color::Yellow),
        ))),
        Some(AiStatus::Ready(text)) => {
            lines.push(bold("Analysis"));
            for line in textwrap::fill(text, 90).lines() {
                lines.push(Line::from(format!("  {}", line)));
            }
        }
    }
    lines
}

fn draw_interviews(frame: &mut Frame, area: Rect, state: &UiState, snapshot: &Snapshot) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let items: Vec<ListItem> = snapshot
        .interviews
        .iter()
        .map(|i| ListItem::new(format!("{} - {} ({})", i.company_name, i.role, i.interview_type)))
        .collect();
    let mut list_state = ListState::default();
    if !items.is_empty() {
        list_state.select(Some(state.interview_selected.min(items.len() - 1)));
    }
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Interviews "))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, chunks[0], &mut list_state);

    let detail = Paragraph::new(Text::from(interview_lines(state, snapshot)))
        .block(Block::default().borders(Borders::ALL).title(" Preparation "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));
    frame.render_widget(detail, chunks[1]);
}

fn interview_lines(state: &UiState, snapshot: &Snapshot) -> Vec<Line<'static>> {
    let interviews = &snapshot.interviews;
    let Some(interview) = interviews.get(state.interview_selected.min(interviews.len().saturating_sub(1))) else {
        return vec![dim("No interviews scheduled.")];
    };

    let mut lines = vec![
        bold(interview.company_name.clone()),
        Line::from(interview.role.clone()),
        Line::from(Span::styled(
            interview.interview_type.as_str().to_uppercase(),
            Style::default().fg(Color::Magenta),
        )),
        Line::from(format!("{}  {}", interview.date, interview.time)),
        Line::from(""),
        dim("AI PREPARATION"),
    ];
    for tip in interview.tips.iter().flatten() {
        lines.push(Line::from(format!("  * {}", tip)));
    }

    lines.push(Line::from(""));
    match state.tips.get(&interview.id) {
        None => lines.push(dim("[t] Generate more tips")),
        Some(AiStatus::Pending) => lines.push(Line::from(Span::styled(
            "Generating tips...",
            Style::default().fg(Color::Yellow),
        ))),
        Some(AiStatus::Ready(text)) => {
            for line in textwrap::fill(text, 70).lines() {
                lines.push(Line::from(format!("  {}", line)));
            }
        }
    }
    lines
}

fn profile_lines(snapshot: &Snapshot) -> Vec<Line<'static>> {
    let Some(profile) = &snapshot.profile else {
        return vec![dim("No profile loaded.")];
    };

    let mut lines = vec![
        bold(format!("({})  {}", profile.initials(), profile.name)),
        dim(profile.role.clone()),
        Line::from(""),
    ];
    let rows = [
        ("FIELD", profile.field_label().to_string()),
        ("EXPERIENCE", format!("{} Years", profile.experience)),
        ("MODE", profile.location.to_string()),
        ("EMAIL", profile.email.clone()),
    ];
    for (label, value) in rows {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<12}", label), Style::default().fg(Color::DarkGray)),
            Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(dim("SETTINGS"));
    lines.push(Line::from("[e] Export History (CSV Spreadsheet)"));
    lines.push(Line::from(Span::styled("[R] Reset Profile", Style::default().fg(Color::Red))));
    lines
}
