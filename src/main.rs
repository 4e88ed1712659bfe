mod app;
mod cli;
mod domain;
mod infra;
mod ui;

use crate::app::{AppCommand, AppEvent, AppModel, RemoteCommand};
use crate::cli::{CliInvocation, CliStatus};
use crate::infra::{
    CommandTransport, Config, ConfigOverrides, ExecuteResponse, HttpCommandClient, TransportError,
    init_file_logging, init_stderr_logging,
};
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::size as terminal_size;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{ExecutableCommand, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::sync::mpsc::{Sender, channel};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    App(#[from] crate::app::AppError),

    #[error(transparent)]
    Cli(#[from] crate::cli::CliRunError),
}

#[derive(Debug)]
enum RemoteSignal {
    Resolved {
        remote: RemoteCommand,
        outcome: Result<ExecuteResponse, TransportError>,
    },
}

fn main() {
    match run_main() {
        Ok(CliStatus::Ok) => {}
        Ok(CliStatus::Failed) => std::process::exit(1),
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            std::process::exit(1);
        }
    }
}

fn run_main() -> Result<CliStatus, MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(CliStatus::Ok)
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(CliStatus::Ok)
        }
        CliInvocation::Tui { overrides } => {
            run_tui(&overrides)?;
            Ok(CliStatus::Ok)
        }
        CliInvocation::Command(command) => {
            init_stderr_logging();
            let config = Config::load(command.overrides()).map_err(crate::cli::CliRunError::from)?;
            Ok(crate::cli::run(command, &config)?)
        }
    }
}

fn print_help() {
    let text = format!(
        "{name} - terminal console for the NEO-BBS board network\n\nUSAGE:\n  {name} [--api-url URL] [--token TOKEN]            Start the console TUI\n  {name} [FLAGS] exec <command> [args...]           Run one command and print its result\n  {name} [FLAGS] ping                               Check that the server is reachable\n  {name} --help | --version\n\nFLAGS:\n  --api-url URL   Server base URL (default: http://localhost:8000)\n  --token TOKEN   Bearer token sent with every command\n\nKEYS:\n  Enter run  Tab complete  Up/Down history  Esc close completions\n  PgUp/PgDn scroll  Ctrl+C quit\n\nCONFIG:\n  ~/.neobbs/config.json  {{\"api_url\", \"auth_token\", \"timeout_secs\", \"log_path\"}}\n\nENV:\n  NEOBBS_HOME           Override the state dir (default: ~/.neobbs)\n  NEOBBS_API_URL        Server base URL\n  NEOBBS_AUTH_TOKEN     Bearer token\n  NEOBBS_TIMEOUT_SECS   Request timeout in seconds (default: 10)\n  RUST_LOG              Log filter (TUI logs go to ~/.neobbs/neobbs.log)\n",
        name = env!("CARGO_PKG_NAME")
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}

fn run_tui(overrides: &ConfigOverrides) -> Result<(), crate::app::AppError> {
    let config = Config::load(overrides)?;
    let _log_guard = init_file_logging(&config.log_path)?;
    tracing::info!(api_url = %config.api_url, "console starting");

    let transport = Arc::new(HttpCommandClient::new(
        &config.api_url,
        config.auth_token.clone(),
        config.request_timeout,
    ));

    let mut model = AppModel::new(config.api_url.clone());
    let mut terminal = setup_terminal()?;
    if let Ok((width, height)) = terminal_size() {
        model = model.with_terminal_size(width, height);
    }
    let result = run(&mut terminal, &mut model, transport);
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, app::AppError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let _ = stdout.execute(EnableBracketedPaste);
    let keyboard_flags = KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
    let _ = stdout.execute(PushKeyboardEnhancementFlags(keyboard_flags));
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<(), app::AppError> {
    disable_raw_mode()?;
    let _ = execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        PopKeyboardEnhancementFlags
    );
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    model: &mut AppModel,
    transport: Arc<dyn CommandTransport>,
) -> Result<(), app::AppError> {
    let (remote_tx, remote_rx) = channel::<RemoteSignal>();

    loop {
        while let Ok(signal) = remote_rx.try_recv() {
            match signal {
                RemoteSignal::Resolved { remote, outcome } => {
                    let event = AppEvent::CommandResolved { remote, outcome };
                    let _ = app::update_in_place(model, event);
                }
            }
        }

        terminal.draw(|frame| ui::render(frame, model))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }

        let app_event = match event::read()? {
            Event::Key(key) => {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                AppEvent::Key(key)
            }
            Event::Paste(text) => AppEvent::Paste(text),
            Event::Resize(width, height) => AppEvent::Resize(width, height),
            _ => continue,
        };

        match app::update_in_place(model, app_event) {
            AppCommand::None => {}
            AppCommand::Quit => return Ok(()),
            AppCommand::ExecuteRemote(remote) => {
                spawn_remote_command(remote, Arc::clone(&transport), remote_tx.clone());
            }
        }
    }
}

/// One worker per submission; outcomes are applied in the order they arrive.
fn spawn_remote_command(
    remote: RemoteCommand,
    transport: Arc<dyn CommandTransport>,
    tx: Sender<RemoteSignal>,
) {
    tracing::debug!(command = %remote.command.name, context = %remote.context, "sending command");
    std::thread::spawn(move || {
        let outcome = transport.execute(&remote.request());
        if let Err(error) = &outcome {
            tracing::warn!(command = %remote.command.name, %error, "command transport failed");
        }
        let _ = tx.send(RemoteSignal::Resolved { remote, outcome });
    });
}
