//! Command-line tokenizing.
//!
//! A line is a chain of segments separated by `|`. Each segment is either an
//! ex command (`:name[!] args`), a search (`/pattern`, `?pattern`) or bare
//! text, which is ignored.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Leading alphabetic run, possibly an abbreviation.
    pub name: String,
    pub args: Vec<String>,
    pub bang: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Command(ParsedCommand),
    SearchForward(String),
    SearchBackward(String),
    Other,
}

/// Splits `line` on unescaped bars.
///
/// Every segment after the first is treated as a command even without a
/// leading `:`. `\|` yields a literal bar. Blank segments are dropped.
pub fn split_chain(line: &str) -> Vec<String> {
    let mut raw = vec![String::new()];
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'|') => {
                chars.next();
                push_char(&mut raw, '|');
            }
            '|' => raw.push(String::new()),
            _ => push_char(&mut raw, ch),
        }
    }

    raw.iter()
        .enumerate()
        .filter_map(|(i, segment)| {
            let segment = segment.trim();
            if segment.is_empty() {
                None
            } else if i > 0 {
                Some(format!(":{segment}"))
            } else {
                Some(segment.to_string())
            }
        })
        .collect()
}

fn push_char(raw: &mut [String], ch: char) {
    if let Some(last) = raw.last_mut() {
        last.push(ch);
    }
}

/// True if `line` contains a bar that `split_chain` would split on.
pub fn has_chain_separator(line: &str) -> bool {
    let mut prev = None;
    for ch in line.chars() {
        if ch == '|' && prev != Some('\\') {
            return true;
        }
        prev = Some(ch);
    }
    false
}

pub fn classify(segment: &str) -> Segment {
    let segment = segment.trim();
    if let Some(body) = segment.strip_prefix(':') {
        Segment::Command(parse_parts(body))
    } else if let Some(pattern) = segment.strip_prefix('/') {
        Segment::SearchForward(pattern.to_string())
    } else if let Some(pattern) = segment.strip_prefix('?') {
        Segment::SearchBackward(pattern.to_string())
    } else {
        Segment::Other
    }
}

/// Splits a command body into name, arguments and bang.
///
/// Any `!` marks the command as banged and separates arguments, even inside
/// a pattern: `:g/re!gex/p` reads as `g` with args `/re` and `gex/p`.
pub fn parse_parts(input: &str) -> ParsedCommand {
    let input = input.trim();
    let body = input.strip_prefix(':').unwrap_or(input).trim();
    let split = body
        .char_indices()
        .find(|(_, c)| !c.is_alphabetic())
        .map_or(body.len(), |(i, _)| i);
    let (name, rest) = body.split_at(split);

    let mut args = Vec::new();
    let mut bang = false;
    for token in rest.split_whitespace() {
        if token.contains('!') {
            bang = true;
            args.extend(token.split('!').filter(|s| !s.is_empty()).map(str::to_string));
        } else {
            args.push(token.to_string());
        }
    }

    ParsedCommand {
        name: name.to_string(),
        args,
        bang,
    }
}
