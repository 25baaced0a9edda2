//! Key notation codec.
//!
//! Translates between terminal key events and the vim-style textual notation
//! used by mappings (`<CR>`, `<C-a>`, `<Space>`, `<F5>`, or a literal rune).

use crate::error::{Error, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    /// Control plus a lowercase ASCII letter.
    Ctrl(char),
    /// Function keys 1 through 12.
    F(u8),
    Enter,
    Esc,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    pub fn from_event(event: KeyEvent) -> Option<Key> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        if event.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SUPER | KeyModifiers::META)
        {
            return None;
        }
        match event.code {
            KeyCode::Char(c) if ctrl => {
                let lower = c.to_ascii_lowercase();
                lower.is_ascii_lowercase().then_some(Key::Ctrl(lower))
            }
            KeyCode::Char(c) if !c.is_control() => Some(Key::Char(c)),
            KeyCode::Enter => Some(Key::Enter),
            KeyCode::Esc => Some(Key::Esc),
            KeyCode::Backspace => Some(Key::Backspace),
            KeyCode::Tab => Some(Key::Tab),
            KeyCode::Up => Some(Key::Up),
            KeyCode::Down => Some(Key::Down),
            KeyCode::Left => Some(Key::Left),
            KeyCode::Right => Some(Key::Right),
            KeyCode::F(n) if (1..=12).contains(&n) => Some(Key::F(n)),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn to_event(self) -> KeyEvent {
        let (code, modifiers) = match self {
            Key::Char(c) => (KeyCode::Char(c), KeyModifiers::NONE),
            Key::Ctrl(c) => (KeyCode::Char(c), KeyModifiers::CONTROL),
            Key::F(n) => (KeyCode::F(n), KeyModifiers::NONE),
            Key::Enter => (KeyCode::Enter, KeyModifiers::NONE),
            Key::Esc => (KeyCode::Esc, KeyModifiers::NONE),
            Key::Backspace => (KeyCode::Backspace, KeyModifiers::NONE),
            Key::Tab => (KeyCode::Tab, KeyModifiers::NONE),
            Key::Up => (KeyCode::Up, KeyModifiers::NONE),
            Key::Down => (KeyCode::Down, KeyModifiers::NONE),
            Key::Left => (KeyCode::Left, KeyModifiers::NONE),
            Key::Right => (KeyCode::Right, KeyModifiers::NONE),
        };
        KeyEvent::new(code, modifiers)
    }

    pub fn encode(self) -> String {
        match self {
            Key::Char(' ') => "<Space>".to_string(),
            Key::Char(c) => c.to_string(),
            Key::Ctrl(c) => format!("<C-{c}>"),
            Key::F(n) => format!("<F{n}>"),
            Key::Enter => "<CR>".to_string(),
            Key::Esc => "<Esc>".to_string(),
            Key::Backspace => "<BS>".to_string(),
            Key::Tab => "<Tab>".to_string(),
            Key::Up => "<Up>".to_string(),
            Key::Down => "<Down>".to_string(),
            Key::Left => "<Left>".to_string(),
            Key::Right => "<Right>".to_string(),
        }
    }

    pub fn decode(notation: &str) -> Result<Key> {
        // a single char is a literal key, even when it is whitespace
        let notation = if notation.chars().count() == 1 {
            notation
        } else {
            notation.trim()
        };
        if let Some(inner) = notation
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return decode_name(inner).ok_or_else(|| Error::UnknownKeyNotation(notation.to_string()));
        }
        let mut chars = notation.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_control() => Ok(Key::Char(c)),
            _ => Err(Error::InvalidKeyFormat(notation.to_string())),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Normalises a notation so that `<cr>` and `<CR>` compare equal.
pub fn canonical(notation: &str) -> Result<String> {
    Key::decode(notation).map(Key::encode)
}

fn decode_name(name: &str) -> Option<Key> {
    let lower = name.to_ascii_lowercase();
    let key = match lower.as_str() {
        "cr" | "enter" | "return" => Key::Enter,
        "esc" => Key::Esc,
        "bs" | "backspace" => Key::Backspace,
        "tab" => Key::Tab,
        "up" => Key::Up,
        "down" => Key::Down,
        "left" => Key::Left,
        "right" => Key::Right,
        "space" => Key::Char(' '),
        _ => {
            if let Some(letter) = lower.strip_prefix("c-") {
                let mut chars = letter.chars();
                return match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_lowercase() => Some(Key::Ctrl(c)),
                    _ => None,
                };
            }
            let digits = lower.strip_prefix('f')?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let n: u8 = digits.parse().ok()?;
            if !(1..=12).contains(&n) {
                return None;
            }
            Key::F(n)
        }
    };
    Some(key)
}
