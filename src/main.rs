use anyhow::Result;
use clap::{Arg, Command};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io,
    path::PathBuf,
    time::{Duration, Instant},
};

mod app;
mod backend;
mod cache;
mod call;
mod config;
mod logging;
mod ui;

use app::App;
use backend::SessionManager;

const AMITY_LOGO: &str = r#"
   █████████   ██████   ██████ █████ ███████████ █████ █████
  ███▒▒▒▒▒███ ▒▒██████ ██████ ▒▒███ ▒▒███▒▒▒▒▒▒▒▒▒███ ▒▒███
 ▒███    ▒███  ▒███▒█████▒███  ▒███  ▒███      ▒▒███ ███
 ▒███████████  ▒███▒▒███ ▒███  ▒███  ▒███       ▒▒█████
 ▒███▒▒▒▒▒███  ▒███ ▒▒▒  ▒███  ▒███  ▒███        ▒▒███
 ▒███    ▒███  ▒███      ▒███  ▒███  ▒███         ▒███
 █████   █████ █████     █████ █████ █████        █████
▒▒▒▒▒   ▒▒▒▒▒ ▒▒▒▒▒     ▒▒▒▒▒ ▒▒▒▒▒ ▒▒▒▒▒        ▒▒▒▒▒
"#;

fn show_startup_logo() {
    // Clear screen
    print!("\x1B[2J\x1B[1;1H");

    // Teal gradient, top to bottom
    let lines: Vec<&str> = AMITY_LOGO.lines().collect();
    let colors = [
        "\x1B[38;5;23m",
        "\x1B[38;5;29m",
        "\x1B[38;5;30m",
        "\x1B[38;5;36m",
        "\x1B[38;5;37m",
        "\x1B[38;5;43m",
        "\x1B[38;5;44m",
        "\x1B[38;5;50m",
    ];

    for (i, line) in lines.iter().enumerate() {
        if i < colors.len() && !line.trim().is_empty() {
            println!("{}{}\x1B[0m", colors[i], line);
        } else {
            println!("{}", line);
        }
    }

    println!(
        "\n\x1B[38;5;36m=== Amity v{} - Terminal Friends Client ===\x1B[0m",
        env!("CARGO_PKG_VERSION")
    );
    println!("\x1B[38;5;43mChat, call, and manage your friends from the terminal\x1B[0m");
    println!("\x1B[38;5;50mPress any key to continue...\x1B[0m\n");

    // Wait for keypress
    let _ = std::io::Read::read(&mut std::io::stdin(), &mut [0u8; 1]);
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("amity")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Amity Team")
        .about("Terminal client for the Amity friends service")
        .arg(
            Arg::new("server")
                .long("server")
                .value_name("URL")
                .help("Backend server URL (overrides the config file)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to the config file"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .help("Append debug logs to this file"),
        )
        .arg(
            Arg::new("no-logo")
                .long("no-logo")
                .action(clap::ArgAction::SetTrue)
                .help("Skip startup logo"),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .unwrap_or_else(config::default_config_path);
    let cfg = config::Config::load(&config_path)?;

    let log_file = matches
        .get_one::<String>("log-file")
        .map(PathBuf::from)
        .or_else(|| std::env::var("AMITY_LOG").ok().map(PathBuf::from))
        .or_else(|| cfg.log_file.clone());
    logging::init(log_file.as_deref())?;

    let server = cfg.server_url(matches.get_one::<String>("server").map(String::as_str));

    // Remember a server passed on the command line for next time.
    if matches.get_one::<String>("server").is_some() && cfg.server.as_deref() != Some(server.as_str())
    {
        let mut updated = cfg.clone();
        updated.server = Some(server.clone());
        if let Err(e) = updated.save(&config_path) {
            tracing::warn!("could not persist config: {}", e);
        }
    }

    if !matches.get_flag("no-logo") {
        show_startup_logo();
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let session_mgr = SessionManager::new(&server, config::session_store_path());
    let mut app = App::new(server, session_mgr);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(250);

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout_duration = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout_duration)? {
            let event = event::read()?;
            app.handle_input(event)?;
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
