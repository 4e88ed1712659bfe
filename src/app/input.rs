use crate::app::LineEditor;
use crate::domain::{CommandRecord, complete_command, parse_command_line};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What the reader is doing with Up/Down/Tab/Esc right now.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InputMode {
    Idle,
    /// `cursor` counts back from the newest history entry (0 = newest).
    BrowsingHistory {
        cursor: usize,
    },
    ShowingAutocomplete {
        candidates: Vec<&'static str>,
        selected: usize,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InputOutcome {
    Unhandled,
    Updated,
    Submitted(CommandRecord),
}

/// Draft line, submitted-line history and completion state for the console prompt.
#[derive(Clone, Debug)]
pub struct InputReader {
    editor: LineEditor,
    history: Vec<String>,
    mode: InputMode,
}

impl Default for InputReader {
    fn default() -> Self {
        Self::new()
    }
}

impl InputReader {
    pub fn new() -> Self {
        Self {
            editor: LineEditor::new(),
            history: Vec::new(),
            mode: InputMode::Idle,
        }
    }

    pub fn draft(&self) -> &str {
        self.editor.text()
    }

    pub fn cursor(&self) -> usize {
        self.editor.cursor()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn mode(&self) -> &InputMode {
        &self.mode
    }

    pub fn history_cursor(&self) -> Option<usize> {
        match self.mode {
            InputMode::BrowsingHistory { cursor } => Some(cursor),
            _ => None,
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) -> InputOutcome {
        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);

        match key.code {
            KeyCode::Enter => match self.submit() {
                Some(command) => InputOutcome::Submitted(command),
                None => InputOutcome::Updated,
            },
            KeyCode::Up => {
                self.on_up();
                InputOutcome::Updated
            }
            KeyCode::Down => {
                self.on_down();
                InputOutcome::Updated
            }
            KeyCode::Tab => {
                self.accept_candidate();
                InputOutcome::Updated
            }
            KeyCode::Esc => {
                if matches!(self.mode, InputMode::ShowingAutocomplete { .. }) {
                    self.mode = InputMode::Idle;
                }
                InputOutcome::Updated
            }
            KeyCode::Backspace => {
                if self.editor.backspace() {
                    self.after_edit();
                }
                InputOutcome::Updated
            }
            KeyCode::Delete => {
                if self.editor.delete_forward() {
                    self.after_edit();
                }
                InputOutcome::Updated
            }
            KeyCode::Left => {
                self.editor.move_left();
                InputOutcome::Updated
            }
            KeyCode::Right => {
                self.editor.move_right();
                InputOutcome::Updated
            }
            KeyCode::Home => {
                self.editor.move_home();
                InputOutcome::Updated
            }
            KeyCode::End => {
                self.editor.move_end();
                InputOutcome::Updated
            }
            KeyCode::Char(ch) if plain && !ch.is_control() => {
                self.editor.insert_char(ch);
                self.after_edit();
                InputOutcome::Updated
            }
            _ => InputOutcome::Unhandled,
        }
    }

    pub fn insert_str(&mut self, text: &str) {
        self.editor.insert_str(text);
        self.after_edit();
    }

    /// Takes the draft as a command. Blank drafts are ignored and leave no history.
    pub fn submit(&mut self) -> Option<CommandRecord> {
        if self.editor.is_blank() {
            return None;
        }

        let raw = self.editor.text().to_string();
        let command = parse_command_line(&raw)?;
        self.history.push(raw);
        self.editor.clear();
        self.mode = InputMode::Idle;
        Some(command)
    }

    fn on_up(&mut self) {
        if let InputMode::ShowingAutocomplete {
            candidates,
            selected,
        } = &mut self.mode
        {
            *selected = if *selected > 0 {
                *selected - 1
            } else {
                candidates.len().saturating_sub(1)
            };
            return;
        }

        match self.history_cursor() {
            None if !self.history.is_empty() => self.recall(0),
            Some(cursor) if cursor + 1 < self.history.len() => self.recall(cursor + 1),
            _ => {}
        }
    }

    fn on_down(&mut self) {
        if let InputMode::ShowingAutocomplete {
            candidates,
            selected,
        } = &mut self.mode
        {
            *selected = if *selected + 1 < candidates.len() {
                *selected + 1
            } else {
                0
            };
            return;
        }

        match self.history_cursor() {
            Some(0) => {
                self.editor.clear();
                self.mode = InputMode::Idle;
            }
            Some(cursor) => self.recall(cursor - 1),
            None => {}
        }
    }

    fn recall(&mut self, cursor: usize) {
        let Some(index) = self.history.len().checked_sub(cursor + 1) else {
            return;
        };
        if let Some(entry) = self.history.get(index) {
            self.editor.replace(entry);
            self.mode = InputMode::BrowsingHistory { cursor };
        }
    }

    fn accept_candidate(&mut self) {
        let InputMode::ShowingAutocomplete {
            candidates,
            selected,
        } = &self.mode
        else {
            return;
        };

        if let Some(candidate) = candidates.get(*selected).copied() {
            self.editor.replace(candidate);
            self.mode = InputMode::Idle;
        }
    }

    fn after_edit(&mut self) {
        let candidates = complete_command(self.editor.text());
        if candidates.is_empty() {
            self.mode = InputMode::Idle;
            return;
        }

        let selected = match &self.mode {
            InputMode::ShowingAutocomplete {
                candidates: previous,
                selected,
            } if *previous == candidates => *selected,
            _ => 0,
        };
        self.mode = InputMode::ShowingAutocomplete {
            candidates,
            selected,
        };
    }
}
