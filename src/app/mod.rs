mod dispatch;
mod input;
mod line_editor;

use crate::domain::{ContextKey, Destination, ScrollbackStore};
use crate::infra::{ExecuteResponse, TransportError};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::cell::RefCell;
use thiserror::Error;

pub use dispatch::*;
pub use input::*;
pub use line_editor::LineEditor;

pub const NEWS_BOARD_ID: &str = "news";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] crate::infra::ConfigError),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum View {
    Home,
    Board {
        board_id: String,
    },
    Thread {
        board_id: Option<String>,
        thread_id: String,
    },
    NewThread {
        board_id: Option<String>,
    },
}

impl View {
    pub fn context_key(&self) -> ContextKey {
        match self {
            Self::Home => ContextKey::home(),
            Self::Board { board_id } => ContextKey::board(board_id),
            Self::Thread { thread_id, .. } => ContextKey::thread(thread_id),
            Self::NewThread { .. } => ContextKey::new_thread(),
        }
    }

    pub fn board_id(&self) -> Option<&str> {
        match self {
            Self::Home => None,
            Self::Board { board_id } => Some(board_id),
            Self::Thread { board_id, .. } | Self::NewThread { board_id } => board_id.as_deref(),
        }
    }

    /// The screen `/back` returns to; `None` on the home screen.
    pub fn parent(&self) -> Option<View> {
        match self {
            Self::Home => None,
            Self::Board { .. } => Some(Self::Home),
            Self::Thread { board_id, .. } | Self::NewThread { board_id } => {
                Some(match board_id {
                    Some(board_id) => Self::Board {
                        board_id: board_id.clone(),
                    },
                    None => Self::Home,
                })
            }
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::Home => "Home".to_string(),
            Self::Board { board_id } => format!("Board /{board_id}/"),
            Self::Thread { thread_id, .. } => format!("Thread #{thread_id}"),
            Self::NewThread { board_id: Some(board_id) } => format!("New thread in /{board_id}/"),
            Self::NewThread { board_id: None } => "New thread".to_string(),
        }
    }

    fn navigate_to(&self, destination: Destination) -> View {
        match destination {
            Destination::Home => Self::Home,
            Destination::CreateThread(data) => Self::NewThread {
                board_id: data.board_id.or_else(|| self.board_id().map(str::to_string)),
            },
            Destination::Thread { id } => Self::Thread {
                board_id: self.board_id().map(str::to_string),
                thread_id: id,
            },
            Destination::News(data) => Self::Board {
                board_id: data.board_id.unwrap_or_else(|| NEWS_BOARD_ID.to_string()),
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppModel {
    pub view: View,
    pub scrollback: ScrollbackStore,
    pub input: InputReader,
    pub in_flight: usize,
    /// Lines scrolled up from the newest scrollback entry.
    pub scroll_from_bottom: u16,
    pub api_url: String,
    pub terminal_size: (u16, u16),
}

impl AppModel {
    pub fn new(api_url: String) -> Self {
        let view = View::Home;
        Self {
            scrollback: ScrollbackStore::new(view.context_key()),
            view,
            input: InputReader::new(),
            in_flight: 0,
            scroll_from_bottom: 0,
            api_url,
            terminal_size: (0, 0),
        }
    }

    pub fn with_terminal_size(mut self, width: u16, height: u16) -> Self {
        self.terminal_size = (width, height);
        self
    }
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Paste(String),
    Resize(u16, u16),
    CommandResolved {
        remote: RemoteCommand,
        outcome: Result<ExecuteResponse, TransportError>,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AppCommand {
    None,
    Quit,
    ExecuteRemote(RemoteCommand),
}

/// Runs [`update`] on a model owned by the event loop, moving it instead of cloning the logs.
pub fn update_in_place(model: &mut AppModel, event: AppEvent) -> AppCommand {
    let current = std::mem::replace(model, AppModel::new(String::new()));
    let (next, command) = update(current, event);
    *model = next;
    command
}

pub fn update(model: AppModel, event: AppEvent) -> (AppModel, AppCommand) {
    match event {
        AppEvent::Key(key) => update_on_key(model, key),
        AppEvent::Paste(text) => {
            let mut model = model;
            model.input.insert_str(&text);
            (model, AppCommand::None)
        }
        AppEvent::Resize(width, height) => (model.with_terminal_size(width, height), AppCommand::None),
        AppEvent::CommandResolved { remote, outcome } => update_on_resolved(model, remote, outcome),
    }
}

fn update_on_key(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
    {
        return (model, AppCommand::Quit);
    }

    match key.code {
        KeyCode::PageUp => {
            let step = page_step(model.terminal_size);
            model.scroll_from_bottom = model
                .scroll_from_bottom
                .saturating_add(step)
                .min(max_scroll(&model));
            return (model, AppCommand::None);
        }
        KeyCode::PageDown => {
            let step = page_step(model.terminal_size);
            model.scroll_from_bottom = model.scroll_from_bottom.saturating_sub(step);
            return (model, AppCommand::None);
        }
        _ => {}
    }

    match model.input.on_key(key) {
        InputOutcome::Submitted(command) => {
            let context = model.view.context_key();
            let (dispatch, requests) =
                run_with_host(&model.view, |host| begin(command, context.clone(), host));
            apply_host_requests(&mut model, requests);

            match dispatch {
                Dispatch::Resolved(record) => {
                    model.scrollback.append(&context, record);
                    model.scroll_from_bottom = 0;
                    (model, AppCommand::None)
                }
                Dispatch::Remote(remote) => {
                    model.in_flight += 1;
                    (model, AppCommand::ExecuteRemote(remote))
                }
            }
        }
        InputOutcome::Updated | InputOutcome::Unhandled => (model, AppCommand::None),
    }
}

fn update_on_resolved(
    mut model: AppModel,
    remote: RemoteCommand,
    outcome: Result<ExecuteResponse, TransportError>,
) -> (AppModel, AppCommand) {
    model.in_flight = model.in_flight.saturating_sub(1);

    let (record, requests) =
        run_with_host(&model.view, |host| complete(&remote.command, outcome, host));
    apply_host_requests(&mut model, requests);

    tracing::info!(
        command = %remote.command.name,
        kind = record.kind.label(),
        context = %remote.context,
        "remote command resolved"
    );
    model.scrollback.append(&remote.context, record);
    if &remote.context == model.scrollback.active_key() {
        model.scroll_from_bottom = 0;
    }
    (model, AppCommand::None)
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum HostRequest {
    Navigate(Destination),
    Back,
}

/// Lends the dispatcher this view's capabilities and records what it asked for.
///
/// `go_back` is only offered when the view has a parent screen.
fn run_with_host<R>(
    view: &View,
    run: impl FnOnce(&mut HostCapabilities<'_>) -> R,
) -> (R, Vec<HostRequest>) {
    let requests = RefCell::new(Vec::new());
    let mut navigate = |destination: Destination| {
        requests
            .borrow_mut()
            .push(HostRequest::Navigate(destination));
    };
    let mut go_back = || requests.borrow_mut().push(HostRequest::Back);

    let mut host = HostCapabilities {
        navigate: Some(&mut navigate as &mut dyn FnMut(Destination)),
        go_back: if view.parent().is_some() {
            Some(&mut go_back as &mut dyn FnMut())
        } else {
            None
        },
    };

    let result = run(&mut host);
    (result, requests.take())
}

fn apply_host_requests(model: &mut AppModel, requests: Vec<HostRequest>) {
    for request in requests {
        let next = match request {
            HostRequest::Navigate(destination) => model.view.navigate_to(destination),
            HostRequest::Back => match model.view.parent() {
                Some(parent) => parent,
                None => continue,
            },
        };
        set_view(model, next);
    }
}

fn set_view(model: &mut AppModel, next: View) {
    let old = model.view.context_key();
    model.scrollback.switch_context(&old, next.context_key());
    model.view = next;
    model.scroll_from_bottom = 0;
}

/// Rows above the viewport; scrolling further would only show blank space.
fn max_scroll(model: &AppModel) -> u16 {
    let (width, _height) = model.terminal_size;
    // side borders 2 + padding 2
    let rows = crate::ui::scrollback_rows(model.scrollback.visible(), width.saturating_sub(4));
    let hidden = rows.saturating_sub(usize::from(page_step(model.terminal_size)));
    u16::try_from(hidden).unwrap_or(u16::MAX)
}

fn page_step(terminal_size: (u16, u16)) -> u16 {
    let (_width, height) = terminal_size;
    // header 1 + view panel 5 + input 3 + footer 1
    height.saturating_sub(10).max(1)
}
