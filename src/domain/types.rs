use serde::Deserialize;
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

/// One submitted console line, split into a command name and its arguments.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandRecord {
    pub raw: String,
    pub name: String,
    pub args: Vec<String>,
}

impl CommandRecord {
    /// Lowercased name, used for every local and post-response branch.
    pub fn normalized_name(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn is_slash_command(&self) -> bool {
        self.name.starts_with('/')
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResultKind {
    Success,
    Error,
    Info,
}

impl ResultKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ResultId(Uuid);

impl ResultId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scrollback entry. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultRecord {
    pub id: ResultId,
    pub command: String,
    pub output: String,
    pub kind: ResultKind,
    pub created_at: OffsetDateTime,
}

impl ResultRecord {
    pub fn new(command: impl Into<String>, output: impl Into<String>, kind: ResultKind) -> Self {
        Self {
            id: ResultId::new(),
            command: command.into(),
            output: output.into(),
            kind,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn success(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(command, output, ResultKind::Success)
    }

    pub fn error(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(command, output, ResultKind::Error)
    }

    pub fn info(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(command, output, ResultKind::Info)
    }
}

/// Identifies the view whose scrollback is visible.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ContextKey(String);

impl ContextKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn home() -> Self {
        Self::new("home")
    }

    pub fn board(board_id: &str) -> Self {
        Self(format!("board-{board_id}"))
    }

    pub fn thread(thread_id: &str) -> Self {
        Self(format!("thread-{thread_id}"))
    }

    pub fn new_thread() -> Self {
        Self::new("newThread")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Navigation hints the server may attach to `/post` and `/news` responses.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
pub struct NavigationData {
    #[serde(default, alias = "boardId")]
    pub board_id: Option<String>,
    #[serde(default, alias = "threadId")]
    pub thread_id: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Destination {
    Home,
    CreateThread(NavigationData),
    Thread { id: String },
    News(NavigationData),
}

impl Destination {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::CreateThread(_) => "create-thread",
            Self::Thread { .. } => "thread",
            Self::News(_) => "news",
        }
    }
}
