/// Tracks keys still owed to a mapping expansion.
///
/// While `Expanding`, keys come from a resolved mapping and must not start
/// another mapping lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputState {
    #[default]
    Idle,
    Expanding { remaining: usize },
}

impl InputState {
    pub fn begin(&mut self, keys: usize) {
        *self = match *self {
            _ if keys == 0 => InputState::Idle,
            InputState::Idle => InputState::Expanding { remaining: keys },
            InputState::Expanding { remaining } => InputState::Expanding {
                remaining: remaining + keys,
            },
        };
    }

    /// Accounts for one consumed key. Returns true if it came from a mapping.
    pub fn consume(&mut self) -> bool {
        match *self {
            InputState::Idle => false,
            InputState::Expanding { remaining } => {
                *self = if remaining > 1 {
                    InputState::Expanding {
                        remaining: remaining - 1,
                    }
                } else {
                    InputState::Idle
                };
                true
            }
        }
    }

    pub fn reset(&mut self) {
        *self = InputState::Idle;
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommandLine {
    text: String,
    /// Cursor position in chars.
    cursor: usize,
    suggestions: Vec<String>,
    selected: Option<usize>,
}

impl CommandLine {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.dismiss();
    }

    fn byte_index(&self) -> usize {
        self.text
            .char_indices()
            .nth(self.cursor)
            .map_or(self.text.len(), |(i, _)| i)
    }

    pub fn insert(&mut self, ch: char) {
        let at = self.byte_index();
        self.text.insert(at, ch);
        self.cursor += 1;
    }

    /// Deletes the char before the cursor. Returns false if there was none.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_index();
        self.text.remove(at);
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn set_suggestions(&mut self, suggestions: Vec<String>) {
        self.suggestions = suggestions;
        self.selected = None;
    }

    pub fn dismiss(&mut self) {
        self.suggestions.clear();
        self.selected = None;
    }

    pub fn accept_next(&mut self) -> bool {
        if self.suggestions.is_empty() {
            return false;
        }
        let next = self
            .selected
            .map_or(0, |i| (i + 1) % self.suggestions.len());
        self.selected = Some(next);
        let text = self.suggestions[next].clone();
        self.set_text(&text);
        if is_filter_template(&text) {
            // leave the cursor inside the pattern
            self.cursor -= 2;
        }
        true
    }
}

fn is_filter_template(text: &str) -> bool {
    let Some(body) = text
        .strip_prefix(":global/")
        .or_else(|| text.strip_prefix(":vglobal/"))
    else {
        return false;
    };
    body.ends_with("/d") || body.ends_with("/p")
}

#[cfg(test)]
mod tests {
    use super::{CommandLine, InputState};

    #[test]
    fn expansion_counts_down_to_idle() {
        let mut state = InputState::default();
        assert!(!state.consume());
        state.begin(2);
        assert_eq!(state, InputState::Expanding { remaining: 2 });
        assert!(state.consume());
        assert!(state.consume());
        assert_eq!(state, InputState::Idle);
        state.begin(0);
        assert_eq!(state, InputState::Idle);
        state.begin(3);
        state.reset();
        assert_eq!(state, InputState::Idle);
    }

    #[test]
    fn editing_is_char_based() {
        let mut line = CommandLine::default();
        line.set_text(":éa");
        line.move_left();
        line.insert('x');
        assert_eq!(line.text(), ":éxa");
        assert!(line.backspace());
        assert!(line.backspace());
        assert_eq!(line.text(), ":a");
        assert_eq!(line.cursor(), 1);
        line.move_left();
        line.move_left();
        assert!(!line.backspace());
        line.move_right();
        line.move_right();
        line.move_right();
        assert_eq!(line.cursor(), 2);
    }

    #[test]
    fn accepting_cycles_suggestions() {
        let mut line = CommandLine::default();
        assert!(!line.accept_next());
        line.set_suggestions(vec![":open".to_string(), ":openurl".to_string()]);
        assert!(line.accept_next());
        assert_eq!(line.text(), ":open");
        assert!(line.accept_next());
        assert_eq!(line.text(), ":openurl");
        assert!(line.accept_next());
        assert_eq!(line.selected(), Some(0));
    }

    #[test]
    fn filter_template_puts_cursor_in_pattern() {
        let mut line = CommandLine::default();
        line.set_suggestions(vec![":global//d".to_string()]);
        line.accept_next();
        assert_eq!(line.cursor(), ":global/".len());
        line.insert('x');
        assert_eq!(line.text(), ":global/x/d");
    }
}
