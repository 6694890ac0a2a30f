use anyhow::{Context, Result};
use clap::Parser;
use pacmaze_core::{
    CellKind, Difficulty, Direction, Game, GameConfig, GameState, GhostKind, Position,
};
use rand::{SeedableRng, rngs::StdRng};
use ratatui::{
    crossterm::{
        self,
        event::{self, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    layout::Direction as LayoutDirection,
    prelude::*,
    widgets::*,
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Maze width in cells (odd, at least 3)
    #[arg(long, default_value_t = 25)]
    width: usize,

    /// Maze height in cells (odd, at least 3)
    #[arg(long, default_value_t = 15)]
    height: usize,

    /// Seed for maze generation and ghost wandering; random when omitted
    #[arg(short, long)]
    seed: Option<u64>,

    /// Starting difficulty: easy, medium, hard, expert or expert-plus
    #[arg(short, long, value_parser = parse_difficulty, default_value = "expert-plus")]
    difficulty: Difficulty,

    /// Simulation ticks per second
    #[arg(long, default_value_t = 60.0)]
    tick_rate: f32,

    /// Write logs to this file (the terminal is taken by the UI)
    #[arg(long, value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Log filter, e.g. `info` or `pacmaze_core=debug`
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_difficulty(value: &str) -> Result<Difficulty, String> {
    match value.to_ascii_lowercase().as_str() {
        "easy" => Ok(Difficulty::Easy),
        "medium" => Ok(Difficulty::Medium),
        "hard" => Ok(Difficulty::Hard),
        "expert" => Ok(Difficulty::Expert),
        "expert-plus" | "expertplus" => Ok(Difficulty::ExpertPlus),
        other => Err(format!("unknown difficulty '{other}'")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Splash,
    Playing,
    GameOver,
}

struct App {
    /// Settings used for every new session; the difficulty changes on the splash screen.
    config: GameConfig,
    rng: StdRng,
    game: Game,
    screen: Screen,
    /// Best final score of this process; not saved between launches.
    best_score: u32,
    should_quit: bool,
}

impl App {
    fn new(config: GameConfig, seed: Option<u64>) -> Result<Self> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let game = Game::new(config.clone(), &mut rng).context("Failed to build the first level")?;
        Ok(App {
            config,
            rng,
            game,
            screen: Screen::Splash,
            best_score: 0,
            should_quit: false,
        })
    }

    /// Throws away the current session and generates a new maze.
    fn new_level(&mut self) -> Result<()> {
        self.game =
            Game::new(self.config.clone(), &mut self.rng).context("Failed to build a new level")?;
        Ok(())
    }

    fn on_key(&mut self, code: KeyCode) -> Result<()> {
        if matches!(code, KeyCode::Char('q') | KeyCode::Esc) {
            self.should_quit = true;
            return Ok(());
        }

        match self.screen {
            Screen::Splash => match code {
                KeyCode::Char(' ') => {
                    self.new_level()?;
                    info!(difficulty = ?self.config.difficulty, "starting run");
                    self.screen = Screen::Playing;
                }
                KeyCode::Right | KeyCode::Char('d') => {
                    self.config.difficulty = self.config.difficulty.next();
                }
                KeyCode::Left | KeyCode::Char('a') => {
                    self.config.difficulty = self.config.difficulty.previous();
                }
                _ => {}
            },
            Screen::Playing => {
                if let Some(direction) = direction_for(code) {
                    self.game.set_player_direction(direction);
                }
            }
            Screen::GameOver => {
                if code == KeyCode::Char(' ') {
                    self.screen = Screen::Splash;
                }
            }
        }
        Ok(())
    }

    /// Handles one step of the simulation.
    fn tick(&mut self) {
        if self.screen != Screen::Playing {
            return;
        }
        if self.game.tick(&mut self.rng) == GameState::Caught {
            self.finish_run();
        }
    }

    /// Records the finished run and moves to the end screen.
    fn finish_run(&mut self) {
        let score = self.game.final_score();
        if score > self.best_score {
            info!(score, previous = self.best_score, "new high score");
            self.best_score = score;
        }
        self.screen = Screen::GameOver;
    }
}

fn direction_for(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up | KeyCode::Char('w') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') => Some(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') => Some(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') => Some(Direction::Right),
        _ => None,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref(), &args.log_level)?;

    let config = GameConfig {
        width: args.width,
        height: args.height,
        tick_rate: args.tick_rate,
        difficulty: args.difficulty,
        ..GameConfig::default()
    };
    config.validate()?;

    // Build the first level before touching the terminal so errors print normally.
    let mut app = App::new(config, args.seed)?;

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;

    result
}

/// Sends `tracing` output to `path`, or discards it when no path is given.
fn init_logging(path: Option<&Path>, level: &str) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(level)?)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_secs_f32(app.config.tick_duration());
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key.code)?;
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    match app.screen {
        Screen::Splash => render_splash(frame, app.config.difficulty),
        Screen::Playing => render_game(frame, &app.game),
        Screen::GameOver => render_game_over(frame, &app.game, app.best_score),
    }
}

fn render_splash(frame: &mut Frame, difficulty: Difficulty) {
    let lines = vec![
        Line::from(Span::styled("PACMAN", Style::default().fg(Color::Yellow).bold())),
        Line::from(""),
        Line::from(format!("Difficulty: < {difficulty:?} >")),
        Line::from(""),
        Line::from("Left/Right to change difficulty, Space to start, q to quit"),
    ];
    let splash = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(splash, frame.area());
}

fn render_game_over(frame: &mut Frame, game: &Game, best_score: u32) {
    let lines = vec![
        Line::from(Span::styled("YOU LOSE", Style::default().fg(Color::Red).bold())),
        Line::from(""),
        Line::from(format!("Points: {:03}", game.final_score())),
        Line::from(format!("High score: {best_score:03}")),
        Line::from(format!("Difficulty: {:?}", game.difficulty())),
        Line::from(""),
        Line::from("Space to return to the title screen, q to quit"),
    ];
    let summary = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(summary, frame.area());
}

fn render_game(frame: &mut Frame, game: &Game) {
    let layout = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(frame.area());

    render_map(frame, layout[0], game);

    let status = Paragraph::new(format!(
        "Score: {}  Pickups left: {}  Difficulty: {:?}  (WASD/arrows to move, q to quit)",
        game.player().score(),
        game.pickups_remaining(),
        game.difficulty()
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, layout[1]);
}

fn ghost_color(kind: GhostKind) -> Color {
    match kind {
        GhostKind::Red => Color::Red,
        GhostKind::Yellow => Color::LightYellow,
        GhostKind::Pink => Color::Magenta,
        GhostKind::Blue => Color::Cyan,
    }
}

/// Renders the maze with the player and ghosts on top, two columns per cell.
fn render_map(frame: &mut Frame, area: Rect, game: &Game) {
    let maze = game.maze();
    let player_cell = game.cell_of(game.player());
    let ghost_cells: Vec<(GhostKind, Position)> = game
        .ghosts()
        .map(|(kind, ghost)| (kind, game.cell_of(ghost)))
        .collect();

    let mut lines: Vec<Line> = Vec::with_capacity(maze.height());
    for y in 0..maze.height() {
        let mut spans: Vec<Span> = Vec::with_capacity(maze.width());
        for x in 0..maze.width() {
            let here = Position::new(x, y);
            if let Some((kind, _)) = ghost_cells.iter().find(|(_, cell)| *cell == here) {
                spans.push(Span::styled("ᗣ ", Style::default().fg(ghost_color(*kind)).bold()));
            } else if here == player_cell {
                spans.push(Span::styled("ᗧ ", Style::default().fg(Color::Yellow).bold()));
            } else {
                let span = match maze.cell_kind_at(x, y) {
                    CellKind::Wall => Span::styled("██", Style::default().fg(Color::Blue)),
                    CellKind::Pickup => Span::styled("• ", Style::default().fg(Color::White)),
                    CellKind::Open => Span::raw("  "),
                };
                spans.push(span);
            }
        }
        lines.push(Line::from(spans));
    }

    let map = Paragraph::new(lines)
        .block(Block::default().title("Pacmaze").borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(map, area);
}
