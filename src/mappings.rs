//! Key mappings (`:map lhs rhs`) and their expansion.
//!
//! A mapping replaces one key with a string of key notation. Resolution walks
//! the expansion in NORMAL mode, where every key may itself be mapped, and
//! switches to COMMAND mode after a bare `:` so that typed command text is
//! passed through untouched until `<CR>` or `<Esc>`.

use crate::error::{Error, Result};
use crate::keys::{canonical, Key};
use std::collections::BTreeMap;
use tracing::debug;

/// Upper bound on nested expansions performed by a single `resolve` call.
pub const MAX_EXPANSIONS: usize = 1000;

const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    ("<C-b>", ":scrollinfo up<CR>"),
    ("<C-f>", ":scrollinfo down<CR>"),
    ("<C-l>", ":nohlsearch<CR>"),
    ("<C-w>", ":focus toggle<CR>"),
    ("<CR>", "lq"),
    ("<F1>", ":echo Please see `:help` or `:map`!<CR>"),
    ("<Right>", "lq"),
    ("<Space>", ":open<Space>"),
    ("R", ":update<CR>r"),
    ("U", ":windo undo<CR>"),
    ("W", ":set! winopen<CR>"),
    ("b", "lc"),
    ("c", ":set winopen | open chat<CR>q"),
    ("f", ":global <C-z><Tab>"),
    ("h", "<F1>"),
    ("l", ":open embed<CR>"),
    ("m", ":open mpv<CR>q"),
    ("o", "<C-w>"),
    ("q", ":quit<CR>"),
    ("r", ":sync<CR>"),
    ("s", ":open strims<CR>q"),
    ("t", ":set! strims | focus twitch<CR>"),
    ("u", ":undo<CR>"),
    ("v", ":vglobal <C-z><Tab>"),
    ("w", ":open homepage<CR>q"),
    ("y", ":copyurl<Space>"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Command,
}

struct Frame<'a> {
    text: &'a str,
    pos: usize,
    mode: Mode,
}

impl<'a> Frame<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            mode: Mode::Normal,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MappingRegistry {
    mappings: BTreeMap<String, String>,
}

impl Default for MappingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingRegistry {
    pub fn new() -> Self {
        let mappings = DEFAULT_MAPPINGS
            .iter()
            .map(|(lhs, rhs)| (lhs.to_string(), rhs.to_string()))
            .collect();
        Self { mappings }
    }

    #[cfg(test)]
    pub fn empty() -> Self {
        Self {
            mappings: BTreeMap::new(),
        }
    }

    /// Adds or replaces a mapping. `<Bar>` in the rhs stands for `|`.
    pub fn insert(&mut self, lhs: &str, rhs: &str) -> Result<()> {
        let lhs = canonical(lhs)?;
        let rhs = rhs.replace("<Bar>", "|");
        debug!(%lhs, %rhs, "mapping defined");
        self.mappings.insert(lhs, rhs);
        Ok(())
    }

    pub fn remove(&mut self, lhs: &str) -> Result<String> {
        let key = canonical(lhs)?;
        self.mappings
            .remove(&key)
            .ok_or_else(|| Error::InvalidArgument(format!("no mapping found for {lhs}")))
    }

    pub fn get(&self, lhs: &str) -> Option<&str> {
        self.mappings.get(lhs).map(String::as_str)
    }

    pub fn get_key(&self, key: Key) -> Option<&str> {
        self.get(&key.encode())
    }

    /// Mappings ordered by lhs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mappings
            .iter()
            .map(|(lhs, rhs)| (lhs.as_str(), rhs.as_str()))
    }

    /// Expands `rhs` into a flat list of primitive key tokens.
    pub fn resolve(&self, rhs: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut stack = vec![Frame::new(rhs)];
        let mut expansions = 0usize;

        while let Some(frame) = stack.last_mut() {
            let Some(ch) = frame.text[frame.pos..].chars().next() else {
                stack.pop();
                continue;
            };
            let start = frame.pos;

            if ch == ':' {
                frame.mode = Mode::Command;
                frame.pos += 1;
                keys.push(":".to_string());
                continue;
            }

            let token = if ch == '<' {
                let Some(end) = frame.text[start..].find('>') else {
                    return Err(Error::UnmatchedBracket(start));
                };
                let raw = &frame.text[start..=start + end];
                frame.pos = start + end + 1;
                canonical(raw)?
            } else {
                frame.pos = start + ch.len_utf8();
                ch.to_string()
            };

            let mode = frame.mode;
            match mode {
                Mode::Command => {
                    if token == "<CR>" || token == "<Esc>" {
                        frame.mode = Mode::Normal;
                    }
                    keys.push(token);
                }
                Mode::Normal => match self.mappings.get(&token) {
                    Some(expansion) => {
                        expansions += 1;
                        if expansions > MAX_EXPANSIONS {
                            return Err(Error::RecursiveMapping(token));
                        }
                        stack.push(Frame::new(expansion));
                    }
                    None => keys.push(token),
                },
            }
        }

        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::MappingRegistry;
    use crate::error::Error;

    fn registry(pairs: &[(&str, &str)]) -> MappingRegistry {
        let mut registry = MappingRegistry::empty();
        for (lhs, rhs) in pairs {
            registry.insert(lhs, rhs).expect("valid mapping");
        }
        registry
    }

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolve_expands_nested_mappings() {
        let registry = registry(&[("a", "bc"), ("b", "x")]);
        assert_eq!(registry.resolve("a").expect("resolve"), tokens(&["x", "c"]));
    }

    #[test]
    fn resolve_passes_command_text_through_literally() {
        let registry = registry(&[("q", ":quit<CR>"), ("u", "nope")]);
        let keys = registry.resolve(":undo<CR>q").expect("resolve");
        assert_eq!(
            keys,
            tokens(&[":", "u", "n", "d", "o", "<CR>", ":", "q", "u", "i", "t", "<CR>"])
        );
    }

    #[test]
    fn resolve_leaves_command_mode_on_escape() {
        let registry = registry(&[("x", "y")]);
        let keys = registry.resolve(":x<Esc>x").expect("resolve");
        assert_eq!(keys, tokens(&[":", "x", "<Esc>", "y"]));
    }

    #[test]
    fn resolve_expands_bracketed_tokens() {
        let registry = registry(&[("<C-w>", ":focus toggle<CR>"), ("o", "<c-w>")]);
        let keys = registry.resolve("o").expect("resolve");
        assert_eq!(keys.first().map(String::as_str), Some(":"));
        assert_eq!(keys.last().map(String::as_str), Some("<CR>"));
        assert_eq!(keys.len(), 14);
    }

    #[test]
    fn resolve_keeps_space_token_in_command_mode() {
        let registry = MappingRegistry::new();
        let keys = registry.resolve("<Space>").expect("resolve");
        assert_eq!(keys, tokens(&[":", "o", "p", "e", "n", "<Space>"]));
    }

    #[test]
    fn resolve_rejects_unmatched_bracket() {
        let registry = MappingRegistry::empty();
        assert_eq!(registry.resolve("ab<CR"), Err(Error::UnmatchedBracket(2)));
    }

    #[test]
    fn resolve_rejects_unknown_key_names() {
        let registry = MappingRegistry::empty();
        assert!(matches!(
            registry.resolve(":echo <Nope>"),
            Err(Error::UnknownKeyNotation(_))
        ));
    }

    #[test]
    fn resolve_terminates_on_self_reference() {
        let registry = registry(&[("a", "a")]);
        assert_eq!(
            registry.resolve("a"),
            Err(Error::RecursiveMapping("a".to_string()))
        );
    }

    #[test]
    fn resolve_terminates_on_indirect_cycles() {
        let registry = registry(&[("a", "xb"), ("b", "ya")]);
        assert!(matches!(registry.resolve("a"), Err(Error::RecursiveMapping(_))));
    }

    #[test]
    fn insert_canonicalises_lhs_and_bar() {
        let mut registry = MappingRegistry::empty();
        registry.insert("<cr>", ":sync <Bar> undo<CR>").expect("insert");
        assert_eq!(registry.get("<CR>"), Some(":sync | undo<CR>"));
        assert!(registry.insert("abc", "x").is_err());
    }

    #[test]
    fn remove_reports_missing_mappings() {
        let mut registry = MappingRegistry::new();
        assert_eq!(registry.remove("q").expect("remove"), ":quit<CR>");
        assert!(matches!(registry.remove("q"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn default_mappings_all_resolve() {
        let registry = MappingRegistry::new();
        for (lhs, _) in registry.iter() {
            assert!(registry.resolve(lhs).is_ok(), "mapping {lhs} failed");
        }
    }
}
