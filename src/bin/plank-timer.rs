//! Terminal client: run the plank timer and browse attempts and rankings.

use std::{
    env,
    io::{self, Write},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, error::ErrorKind};
use crossterm::{
    cursor::MoveToColumn,
    event::{
        Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::Print,
    terminal::{
        Clear, ClearType, disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement,
    },
    tty::IsTty,
};
use futures::StreamExt;
use plank_back::client::{
    StatusMessage,
    http::PlankClient,
    manual,
    session::{SaveStatus, TimerSession},
    timer::{Key, KeyPress, TimerPhase},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const REDRAW_EVERY: Duration = Duration::from_millis(50);

/// Plank timer terminal client
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Base URL of the plank service
    #[arg(long, env = "PLANK_BASE_URL", default_value = "http://localhost:8080")]
    base_url: String,

    /// Account email
    #[arg(long, env = "PLANK_EMAIL")]
    email: String,

    /// Account password
    #[arg(long, env = "PLANK_PASSWORD", hide_env_values = true)]
    password: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the account, then exit
    Register {
        #[arg(long)]
        display_name: String,
    },
    /// Interactive timer: space starts and stops, s saves, r resets, q quits
    Timer,
    /// Log an attempt typed as mm:ss
    Log { duration: String },
    /// Your attempts, newest first
    History,
    /// Ranking by personal best, or by yearly total time with --total
    Leaderboard {
        #[arg(long)]
        total: bool,
        #[arg(long, requires = "total")]
        year: Option<i32>,
    },
    /// Personal best, rank, recent attempts and yearly total
    Dashboard,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let client = PlankClient::new(&cli.base_url).context("failed to build HTTP client")?;

    if let Command::Register { display_name } = &cli.command {
        let registered = client
            .register(&cli.email, &cli.password, display_name)
            .await
            .map_err(|err| anyhow::anyhow!(err.user_message("Registration failed")))?;
        println!("{} ({})", registered.message, registered.user.email);
        return Ok(());
    }

    let login = client
        .login(&cli.email, &cli.password)
        .await
        .map_err(|err| anyhow::anyhow!(err.user_message("Login failed")))?;
    debug!(expires_at = %login.expires_at, "signed in");
    let client = client.with_token(login.token);

    match cli.command {
        Command::Register { .. } => Ok(()),
        Command::Timer => {
            if !io::stdin().is_tty() {
                Cli::command()
                    .error(ErrorKind::Io, "the timer needs an interactive terminal")
                    .exit();
            }
            run_timer(client).await
        }
        Command::Log { duration } => {
            let message = manual::submit_entry(&client, &duration).await;
            print_message(&message);
            Ok(())
        }
        Command::History => show_history(&client).await,
        Command::Leaderboard { total: false, .. } => show_leaderboard(&client).await,
        Command::Leaderboard { total: true, year } => show_totals(&client, year).await,
        Command::Dashboard => show_dashboard(&client).await,
    }
}

/// Logs go to stderr, and only when `RUST_LOG` asks for them.
fn init_tracing() {
    if env::var_os("RUST_LOG").is_none() {
        return;
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
}

fn print_message(message: &StatusMessage) {
    if message.is_error() {
        eprintln!("{}", message.text());
    } else {
        println!("{}", message.text());
    }
}

async fn run_timer(client: PlankClient) -> Result<()> {
    let session = TimerSession::new(Arc::new(client.clone()));
    let mut best = personal_best_line(&client).await;

    println!("space: start/stop  s: save  r: reset  q: quit");
    let terminal = RawTerminal::enter()?;
    let result = timer_loop(&session, &client, &mut best).await;
    drop(terminal);
    println!();
    result
}

/// Raw mode for the lifetime of the value.
///
/// Where the terminal supports it, key event kinds are turned on as well so a
/// held space bar arrives as repeats instead of fresh presses.
struct RawTerminal {
    enhanced: bool,
}

impl RawTerminal {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut terminal = Self { enhanced: false };
        if supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .context("failed to enable key event types")?;
            terminal.enhanced = true;
        } else {
            debug!("terminal cannot report key repeats; a held space bar toggles the timer");
        }
        Ok(terminal)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        if self.enhanced {
            if let Err(err) = execute!(io::stdout(), PopKeyboardEnhancementFlags) {
                debug!(error = %err, "failed to pop keyboard enhancement flags");
            }
        }
        if let Err(err) = disable_raw_mode() {
            debug!(error = %err, "failed to restore terminal");
        }
    }
}

async fn timer_loop(session: &TimerSession, client: &PlankClient, best: &mut String) -> Result<()> {
    let mut events = EventStream::new();
    let mut redraw = tokio::time::interval(REDRAW_EVERY);
    let mut refresh = session.subscribe_refresh();
    let mut stdout = io::stdout();

    loop {
        tokio::select! {
            _ = redraw.tick() => draw(&mut stdout, session, best.as_str()).await?,
            changed = refresh.changed() => {
                if changed.is_err() {
                    break;
                }
                *best = personal_best_line(client).await;
            }
            next = events.next() => {
                let Some(event) = next else { break };
                let Event::Key(key) = event.context("failed to read terminal event")? else {
                    continue;
                };
                if !handle_key(session, key).await {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Returns false when the user asked to quit.
async fn handle_key(session: &TimerSession, key: KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return true;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return false,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
        KeyCode::Char(' ') => {
            session.handle_key(key_press(&key)).await;
        }
        KeyCode::Char('s') | KeyCode::Enter => {
            let session = session.clone();
            tokio::spawn(async move {
                if let Err(err) = session.save().await {
                    debug!(error = %err, "save ignored");
                }
            });
        }
        KeyCode::Char('r') => {
            if let Err(err) = session.reset().await {
                debug!(error = %err, "reset ignored");
            }
        }
        _ => {}
    }
    true
}

/// Timer key press for a terminal event; repeats only show up on enhanced terminals.
fn key_press(event: &KeyEvent) -> KeyPress {
    KeyPress {
        key: match event.code {
            KeyCode::Char(' ') => Key::Space,
            _ => Key::Other,
        },
        repeat: event.kind == KeyEventKind::Repeat,
    }
}

async fn draw(stdout: &mut io::Stdout, session: &TimerSession, best: &str) -> Result<()> {
    let phase = match (session.phase().await, session.status().await) {
        (_, SaveStatus::Saving) => "saving",
        (TimerPhase::Idle, _) => "ready",
        (TimerPhase::Running, _) => "running",
        (TimerPhase::Stopped, _) => "stopped",
    };
    let message = session
        .message()
        .await
        .map(|message| message.text().to_owned())
        .unwrap_or_default();
    let line = format!("{}  [{phase}]  {best}  {message}", session.display().await);

    queue!(
        stdout,
        MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        Print(line)
    )
    .context("failed to draw timer")?;
    stdout.flush().context("failed to draw timer")
}

async fn personal_best_line(client: &PlankClient) -> String {
    match client.dashboard().await {
        Ok(dashboard) => match dashboard.rank {
            Some(rank) => format!(
                "best {} (#{rank} of {})",
                dashboard.personal_best_display, dashboard.total_users
            ),
            None => format!("best {}", dashboard.personal_best_display),
        },
        Err(err) => {
            debug!(error = %err, "failed to load dashboard");
            String::new()
        }
    }
}

async fn show_history(client: &PlankClient) -> Result<()> {
    let attempts = client
        .list_attempts()
        .await
        .context("failed to load attempts")?;
    if attempts.is_empty() {
        println!("No attempts yet");
    }
    for attempt in attempts {
        let marker = if attempt.is_personal_best { "  PB" } else { "" };
        println!("{:>8}  {}{marker}", attempt.display, attempt.attempted_at);
    }
    Ok(())
}

async fn show_leaderboard(client: &PlankClient) -> Result<()> {
    let entries = client
        .leaderboard()
        .await
        .context("failed to load leaderboard")?;
    for entry in entries {
        let you = if entry.is_current_user { "  (you)" } else { "" };
        println!(
            "{:>3}. {:<30} {:>8}{you}",
            entry.rank, entry.display_name, entry.best_time_display
        );
    }
    Ok(())
}

async fn show_totals(client: &PlankClient, year: Option<i32>) -> Result<()> {
    let entries = client
        .total_leaderboard(year)
        .await
        .context("failed to load total-time leaderboard")?;
    for entry in entries {
        let you = if entry.is_current_user { "  (you)" } else { "" };
        println!(
            "{:>3}. {:<30} {:>9}{you}",
            entry.rank, entry.display_name, entry.total_time_display
        );
    }
    Ok(())
}

async fn show_dashboard(client: &PlankClient) -> Result<()> {
    let dashboard = client
        .dashboard()
        .await
        .context("failed to load dashboard")?;
    println!("{}", dashboard.display_name);
    println!("  personal best  {}", dashboard.personal_best_display);
    match dashboard.rank {
        Some(rank) => println!("  rank           #{rank} of {}", dashboard.total_users),
        None => println!("  rank           unranked ({} ranked)", dashboard.total_users),
    }
    println!(
        "  total {}     {}",
        dashboard.year, dashboard.total_time_display
    );
    if !dashboard.recent_attempts.is_empty() {
        println!("  recent");
        for attempt in dashboard.recent_attempts {
            println!("    {:>8}  {}", attempt.display, attempt.attempted_at);
        }
    }
    Ok(())
}
