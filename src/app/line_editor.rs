/// Single-line draft buffer with a character-indexed cursor.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LineEditor {
    text: String,
    cursor: usize,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor.min(self.char_len())
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Replaces the whole draft and parks the cursor at the end.
    pub fn replace(&mut self, text: &str) {
        self.text = flatten_line_breaks(text);
        self.cursor = self.char_len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, ch: char) {
        let mut buffer = [0u8; 4];
        self.insert_str(ch.encode_utf8(&mut buffer));
    }

    pub fn insert_str(&mut self, text: &str) {
        let flattened = flatten_line_breaks(text);
        if flattened.is_empty() {
            return;
        }

        let at = byte_offset(&self.text, self.cursor());
        self.text.insert_str(at, &flattened);
        self.cursor = self.cursor() + flattened.chars().count();
    }

    /// Returns `true` when a character was removed.
    pub fn backspace(&mut self) -> bool {
        let cursor = self.cursor();
        if cursor == 0 {
            return false;
        }

        let at = byte_offset(&self.text, cursor - 1);
        self.text.remove(at);
        self.cursor = cursor - 1;
        true
    }

    /// Returns `true` when a character was removed.
    pub fn delete_forward(&mut self) -> bool {
        let cursor = self.cursor();
        if cursor >= self.char_len() {
            return false;
        }

        let at = byte_offset(&self.text, cursor);
        self.text.remove(at);
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor().saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor() + 1).min(self.char_len());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

fn flatten_line_breaks(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\n' | '\r' | '\t' => ' ',
            other => other,
        })
        .collect()
}

fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_at_cursor_with_multibyte_text() {
        let mut editor = LineEditor::new();
        editor.insert_str("/rd");
        editor.move_left();
        editor.insert_char('é');
        assert_eq!(editor.text(), "/réd");
        assert_eq!(editor.cursor(), 3);

        assert!(editor.backspace());
        assert_eq!(editor.text(), "/rd");
        editor.move_home();
        assert!(!editor.backspace());
        assert!(editor.delete_forward());
        assert_eq!(editor.text(), "rd");
    }

    #[test]
    fn pasted_line_breaks_become_spaces() {
        let mut editor = LineEditor::new();
        editor.insert_str("/read\n42\t7");
        assert_eq!(editor.text(), "/read 42 7");
    }

    #[test]
    fn replace_moves_cursor_to_end() {
        let mut editor = LineEditor::new();
        editor.replace("/help");
        assert_eq!(editor.cursor(), 5);
        editor.clear();
        assert!(editor.is_blank());
        assert_eq!(editor.cursor(), 0);
    }
}
