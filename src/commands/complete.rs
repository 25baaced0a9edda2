use super::parse::{has_chain_separator, parse_parts};
use crate::app::App;

/// Suggestions for the partial line `text`.
///
/// A lone word completes to command names; `name arg` (split on a space or
/// slash) asks that command's provider once the name is unambiguous.
pub fn complete(app: &App, text: &str) -> Vec<String> {
    if text.is_empty() || has_chain_separator(text) {
        return Vec::new();
    }
    let fields: Vec<&str> = text.split([' ', '/']).collect();
    match fields.as_slice() {
        [word] => {
            let prefix = word.trim_start_matches(':');
            app.commands
                .lookup(prefix)
                .into_iter()
                .map(|c| format!(":{}", c.name))
                .collect()
        }
        [head, partial] => {
            let parsed = parse_parts(head);
            if parsed.name.is_empty() {
                return Vec::new();
            }
            let matches = app.commands.lookup(&parsed.name);
            match matches.as_slice() {
                [command] => command
                    .complete
                    .map(|provider| provider(app, partial, parsed.bang))
                    .unwrap_or_default(),
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

/// Previously executed lines, walked with a cursor that rests past the end.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<String>,
    index: usize,
}

impl History {
    pub fn push(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        self.entries.push(line.to_string());
        self.reset_cursor();
    }

    /// Moves the cursor back past the newest entry.
    pub fn reset_cursor(&mut self) {
        self.index = self.entries.len();
    }

    pub fn up(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        self.index = self.index.saturating_sub(1);
        self.entries.get(self.index).map(String::as_str)
    }

    pub fn down(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        self.index = (self.index + 1).min(self.entries.len() - 1);
        self.entries.get(self.index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::{complete, History};
    use crate::app::tests::test_app;
    use crate::commands::execute_line;

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_word_completes_command_names() {
        let (app, _) = test_app();
        assert_eq!(complete(&app, ":s"), strings(&[":scrollinfo", ":set", ":sync"]));
        assert_eq!(complete(&app, "un"), strings(&[":undo", ":unmap"]));
        assert!(complete(&app, ":x").is_empty());
    }

    #[test]
    fn second_field_uses_command_provider() {
        let (app, _) = test_app();
        assert_eq!(complete(&app, ":o m"), strings(&[":open mpv"]));
        assert_eq!(
            complete(&app, ":set! "),
            strings(&[":set! strims", ":set! winopen"])
        );
        assert_eq!(complete(&app, ":f t"), strings(&[":focus toggle", ":focus twitch"]));
    }

    #[test]
    fn ambiguous_or_chained_lines_get_nothing() {
        let (app, _) = test_app();
        assert!(complete(&app, ":s d").is_empty());
        assert!(complete(&app, ":sync | o").is_empty());
        assert!(complete(&app, "").is_empty());
        assert!(complete(&app, ":open embed now").is_empty());
        assert!(complete(&app, "/foo").is_empty());
    }

    #[test]
    fn global_offers_current_filter_template() {
        let (mut app, _) = test_app();
        assert_eq!(complete(&app, ":global "), strings(&[":global//d"]));
        execute_line(&mut app, ":g/any/p").expect("filter");
        assert_eq!(
            complete(&app, ":global "),
            strings(&[":global/any/d", ":global//d"])
        );
        assert_eq!(complete(&app, ":v/"), strings(&[":vglobal/any/d", ":vglobal//d"]));
    }

    #[test]
    fn history_clamps_at_both_ends() {
        let mut history = History::default();
        assert_eq!(history.up(), None);
        history.push(":sync");
        history.push(":undo");
        assert_eq!(history.up(), Some(":undo"));
        assert_eq!(history.up(), Some(":sync"));
        assert_eq!(history.up(), Some(":sync"));
        assert_eq!(history.down(), Some(":undo"));
        assert_eq!(history.down(), Some(":undo"));

        history.push(":quit");
        assert_eq!(history.up(), Some(":quit"));
        assert_eq!(history.up(), Some(":undo"));
    }

    #[test]
    fn reset_cursor_returns_past_the_end() {
        let mut history = History::default();
        history.reset_cursor();
        assert_eq!(history.up(), None);
        history.push(":sync");
        history.push(":undo");
        history.up();
        history.up();
        history.reset_cursor();
        assert_eq!(history.up(), Some(":undo"));
    }
}
