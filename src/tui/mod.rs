//! TUI module - Terminal workout screen with ratatui

use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table},
};
use std::io::{stdout, Stdout};

use crate::db::WorkoutSession;
use crate::exercises::display_name;
use crate::session::progress::{logged_for, set_counts};
use crate::session::{self, EngineError, WorkoutEngine};
use crate::store::WorkoutStore;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Number of recent sets shown under the exercise table
const RECENT_SETS: usize = 6;

enum Mode {
    Normal,
    LogSet(String),
    AddExercise(String),
    Confirm(Pending),
}

#[derive(Clone, Copy)]
enum Pending {
    Finish,
    Cancel,
}

/// App state for the workout screen
pub struct App<S> {
    engine: WorkoutEngine<S>,
    mode: Mode,
    message: Option<String>,
    closed: Option<WorkoutSession>,
    should_quit: bool,
}

impl<S: WorkoutStore> App<S> {
    pub fn new(engine: WorkoutEngine<S>) -> Self {
        Self {
            engine,
            mode: Mode::Normal,
            message: None,
            closed: None,
            should_quit: false,
        }
    }

    /// Run the workout screen. Returns the session if it was finished or
    /// cancelled; quitting early leaves it active for a later resume.
    pub async fn run(mut self) -> Result<Option<WorkoutSession>> {
        let mut terminal = init_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        restore_terminal()?;
        result.map(|_| self.closed)
    }

    async fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events().await?;
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);

        let state = self.engine.state();
        let session = self.engine.session();

        // Header
        let elapsed = (Utc::now() - state.session_start_time).num_seconds().max(0);
        let header = Paragraph::new(format!(
            "{} | {} | {:02}:{:02}:{:02}",
            session.name,
            session.date.format("%Y-%m-%d"),
            elapsed / 3600,
            (elapsed % 3600) / 60,
            elapsed % 60
        ))
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::ALL).title("ironlog"));
        frame.render_widget(header, chunks[0]);

        // Current exercise
        let current = match self.engine.current_exercise() {
            Some(ex) => {
                let mut targets = Vec::new();
                if let Some(reps) = ex.target_reps {
                    targets.push(format!("{reps} reps"));
                }
                if let Some(weight) = ex.target_weight {
                    targets.push(format!("{weight} kg"));
                }
                if let Some(rest) = ex.rest_seconds {
                    targets.push(format!("{rest}s rest"));
                }
                vec![
                    Line::from(display_name(&ex.exercise_id).to_string()).bold(),
                    Line::from(format!(
                        "Set {} of {}",
                        state.current_set_number, ex.target_sets
                    )),
                    Line::from(targets.join(" · ")).fg(Color::DarkGray),
                ]
            }
            None if state.all_targets_met => vec![
                Line::from("All targets met").fg(Color::Green).bold(),
                Line::from("Press f to finish the workout"),
            ],
            None => vec![Line::from("No exercises yet - press a to add one")],
        };
        let current = Paragraph::new(current)
            .block(Block::default().borders(Borders::ALL).title("Now"));
        frame.render_widget(current, chunks[1]);

        // Rest countdown
        let rest_total = self
            .engine
            .sets()
            .last()
            .and_then(|last| {
                self.engine
                    .exercises()
                    .iter()
                    .find(|e| e.exercise_id == last.exercise_id)
            })
            .and_then(|e| e.rest_seconds)
            .unwrap_or(0);
        let ratio = if state.is_resting && rest_total > 0 {
            (state.rest_seconds_remaining as f64 / rest_total as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let rest = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Rest"))
            .gauge_style(Style::default().fg(Color::Yellow))
            .ratio(ratio)
            .label(if state.is_resting {
                format!("{}s (s: skip)", state.rest_seconds_remaining)
            } else {
                "ready".to_string()
            });
        frame.render_widget(rest, chunks[2]);

        // Exercise table and recent sets
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[3]);

        let counts = set_counts(self.engine.sets());
        let rows: Vec<Row> = self
            .engine
            .exercises()
            .iter()
            .enumerate()
            .map(|(i, ex)| {
                let logged = logged_for(&counts, &ex.exercise_id);
                let marker = if i == state.current_exercise_index { "▶" } else { " " };
                let style = if logged >= ex.target_sets {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(marker),
                    Cell::from(display_name(&ex.exercise_id).to_string()),
                    Cell::from(format!("{}/{}", logged, ex.target_sets)),
                ])
                .style(style)
            })
            .collect();

        let table = Table::new(
            rows,
            [Constraint::Length(2), Constraint::Min(16), Constraint::Length(7)],
        )
        .header(Row::new(vec!["", "Exercise", "Sets"]).style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("Exercises"));
        frame.render_widget(table, body[0]);

        let recent: Vec<Row> = self
            .engine
            .sets()
            .iter()
            .rev()
            .take(RECENT_SETS)
            .map(|s| {
                Row::new(vec![
                    Cell::from(display_name(&s.exercise_id).to_string()),
                    Cell::from(format!("#{}", s.set_number)),
                    Cell::from(format_load(s.weight, s.reps)),
                ])
            })
            .collect();
        let recent = Table::new(
            recent,
            [Constraint::Min(12), Constraint::Length(4), Constraint::Length(14)],
        )
        .block(Block::default().borders(Borders::ALL).title("Logged"));
        frame.render_widget(recent, body[1]);

        // Footer
        let footer = match &self.mode {
            Mode::Normal => Paragraph::new(self.message.clone().unwrap_or_else(|| {
                "l: log set | s: skip rest | n/p: next/prev | a: add | f: finish | c: cancel | q: quit"
                    .to_string()
            }))
            .style(Style::default().fg(Color::DarkGray)),
            Mode::LogSet(input) => Paragraph::new(format!("weight reps (- to skip): {input}_"))
                .style(Style::default().fg(Color::Yellow)),
            Mode::AddExercise(input) => {
                Paragraph::new(format!("exercise_id sets [rest]: {input}_"))
                    .style(Style::default().fg(Color::Yellow))
            }
            Mode::Confirm(pending) => {
                let prompt = match pending {
                    Pending::Finish => {
                        "Some exercises are under target. Finish anyway? (y/n)"
                    }
                    Pending::Cancel => "Cancel this workout? (y/n)",
                };
                Paragraph::new(prompt).style(Style::default().fg(Color::Red))
            }
        };
        frame.render_widget(
            footer.block(Block::default().borders(Borders::ALL)),
            chunks[4],
        );
    }

    async fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let mode = std::mem::replace(&mut self.mode, Mode::Normal);
            self.mode = match mode {
                Mode::Normal => self.on_normal_key(key.code).await,
                Mode::LogSet(input) => match edit_input(input, key.code) {
                    Input::Editing(input) => Mode::LogSet(input),
                    Input::Submitted(input) => {
                        self.submit_set(&input).await;
                        Mode::Normal
                    }
                    Input::Aborted => Mode::Normal,
                },
                Mode::AddExercise(input) => match edit_input(input, key.code) {
                    Input::Editing(input) => Mode::AddExercise(input),
                    Input::Submitted(input) => {
                        self.submit_exercise(&input);
                        Mode::Normal
                    }
                    Input::Aborted => Mode::Normal,
                },
                Mode::Confirm(pending) => {
                    if key.code == KeyCode::Char('y') {
                        self.close(pending).await;
                    }
                    Mode::Normal
                }
            };
        }
        Ok(())
    }

    async fn on_normal_key(&mut self, code: KeyCode) -> Mode {
        self.message = None;
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('l') | KeyCode::Enter => {
                if let Some(ex) = self.engine.current_exercise() {
                    let prefill = match (ex.target_weight, ex.target_reps) {
                        (Some(w), Some(r)) => format!("{w} {r}"),
                        (None, Some(r)) => format!("- {r}"),
                        (Some(w), None) => format!("{w} "),
                        (None, None) => String::new(),
                    };
                    return Mode::LogSet(prefill);
                }
                self.message = Some("No current exercise".to_string());
            }
            KeyCode::Char('s') => self.engine.skip_rest(),
            KeyCode::Char('n') | KeyCode::Right => {
                let result = self.engine.advance_exercise(session::Direction::Forward);
                self.report(result);
            }
            KeyCode::Char('p') | KeyCode::Left => {
                let result = self.engine.advance_exercise(session::Direction::Backward);
                self.report(result);
            }
            KeyCode::Char('a') => return Mode::AddExercise(String::new()),
            KeyCode::Char('f') => {
                if self.engine.state().all_targets_met {
                    self.close(Pending::Finish).await;
                } else {
                    return Mode::Confirm(Pending::Finish);
                }
            }
            KeyCode::Char('c') => return Mode::Confirm(Pending::Cancel),
            _ => {}
        }
        Mode::Normal
    }

    async fn submit_set(&mut self, input: &str) {
        match parse_set_input(input) {
            Ok((weight, reps)) => {
                let result = self.engine.log_set(weight, reps).await;
                if let Ok(set) = &result {
                    self.message = Some(format!(
                        "Logged {} #{}: {}",
                        display_name(&set.exercise_id),
                        set.set_number,
                        format_load(set.weight, set.reps)
                    ));
                }
                self.report(result.map(|_| ()));
            }
            Err(err) => self.message = Some(err),
        }
    }

    fn submit_exercise(&mut self, input: &str) {
        match parse_exercise_input(input) {
            Ok((exercise_id, sets, rest)) => {
                let result = self.engine.add_exercise(&exercise_id, sets, rest);
                self.report(result);
            }
            Err(err) => self.message = Some(err),
        }
    }

    async fn close(&mut self, pending: Pending) {
        let result = match pending {
            Pending::Finish => self.engine.finish().await,
            Pending::Cancel => self.engine.cancel().await,
        };
        match result {
            Ok(session) => {
                self.closed = Some(session);
                self.should_quit = true;
            }
            Err(err) => self.message = Some(err.to_string()),
        }
    }

    fn report(&mut self, result: Result<(), EngineError>) {
        if let Err(err) = result {
            self.message = Some(err.to_string());
        }
    }
}

enum Input {
    Editing(String),
    Submitted(String),
    Aborted,
}

fn edit_input(mut input: String, code: KeyCode) -> Input {
    match code {
        KeyCode::Enter => Input::Submitted(input),
        KeyCode::Esc => Input::Aborted,
        KeyCode::Backspace => {
            input.pop();
            Input::Editing(input)
        }
        KeyCode::Char(c) => {
            input.push(c);
            Input::Editing(input)
        }
        _ => Input::Editing(input),
    }
}

/// Parse `weight reps`; `-` leaves a field empty
fn parse_set_input(input: &str) -> Result<(Option<f64>, Option<u32>), String> {
    let mut parts = input.split_whitespace();
    let weight = match parts.next() {
        None | Some("-") => None,
        Some(w) => Some(
            w.parse::<f64>()
                .ok()
                .filter(|w| w.is_finite() && *w >= 0.0)
                .ok_or_else(|| format!("invalid weight '{w}'"))?,
        ),
    };
    let reps = match parts.next() {
        None | Some("-") => None,
        Some(r) => Some(r.parse::<u32>().map_err(|_| format!("invalid reps '{r}'"))?),
    };
    if parts.next().is_some() {
        return Err("expected: weight reps".to_string());
    }
    Ok((weight, reps))
}

/// Parse `exercise_id sets [rest]`
fn parse_exercise_input(input: &str) -> Result<(String, u32, Option<u32>), String> {
    let mut parts = input.split_whitespace();
    let exercise_id = parts
        .next()
        .ok_or_else(|| "expected: exercise_id sets [rest]".to_string())?;
    let sets = match parts.next() {
        None => 1,
        Some(s) => s.parse::<u32>().map_err(|_| format!("invalid sets '{s}'"))?,
    };
    let rest = parts
        .next()
        .map(|r| r.parse::<u32>().map_err(|_| format!("invalid rest '{r}'")))
        .transpose()?;
    Ok((exercise_id.to_string(), sets, rest))
}

pub fn format_load(weight: Option<f64>, reps: Option<u32>) -> String {
    match (weight, reps) {
        (Some(w), Some(r)) => format!("{w} kg x {r}"),
        (Some(w), None) => format!("{w} kg"),
        (None, Some(r)) => format!("{r} reps"),
        (None, None) => "-".to_string(),
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_input() {
        assert_eq!(parse_set_input("100 10"), Ok((Some(100.0), Some(10))));
        assert_eq!(parse_set_input("- 12"), Ok((None, Some(12))));
        assert_eq!(parse_set_input("62.5"), Ok((Some(62.5), None)));
        assert_eq!(parse_set_input(""), Ok((None, None)));
        assert!(parse_set_input("heavy 5").is_err());
        assert!(parse_set_input("-20 5").is_err());
        assert!(parse_set_input("100 10 3").is_err());
    }

    #[test]
    fn test_parse_exercise_input() {
        assert_eq!(
            parse_exercise_input("pullups 3 90"),
            Ok(("pullups".to_string(), 3, Some(90)))
        );
        assert_eq!(parse_exercise_input("plank"), Ok(("plank".to_string(), 1, None)));
        assert!(parse_exercise_input("").is_err());
        assert!(parse_exercise_input("dips x").is_err());
    }

    #[test]
    fn test_format_load() {
        assert_eq!(format_load(Some(100.0), Some(5)), "100 kg x 5");
        assert_eq!(format_load(None, Some(12)), "12 reps");
        assert_eq!(format_load(None, None), "-");
    }
}
