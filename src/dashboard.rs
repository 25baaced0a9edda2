use crate::error::{Error, Result};
use crate::streams::{Snapshot, Stream};
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListId {
    Twitch,
    Strims,
}

impl ListId {
    pub const ALL: [ListId; 2] = [ListId::Twitch, ListId::Strims];

    pub fn other(self) -> ListId {
        match self {
            ListId::Twitch => ListId::Strims,
            ListId::Strims => ListId::Twitch,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ListId::Twitch => "twitch",
            ListId::Strims => "strims",
        }
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-list filter. `inverted` keeps the entries that do NOT match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub pattern: String,
    pub inverted: bool,
}

impl FilterState {
    pub fn new(pattern: impl Into<String>, inverted: bool) -> Self {
        Self {
            pattern: pattern.into(),
            inverted,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.pattern.is_empty()
    }
}

pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|err| Error::PatternSyntaxInvalid(err.to_string()))
}

#[derive(Debug, Clone)]
pub struct StreamList {
    pub id: ListId,
    streams: Vec<Stream>,
    filter: FilterState,
    matcher: Option<Regex>,
    visible: Vec<usize>,
    selected: usize,
    offset: usize,
    /// Rows available to the list, updated by the renderer.
    pub height: usize,
    /// Relative share of the list column, changed by `:resize`.
    pub weight: u16,
}

impl StreamList {
    pub fn new(id: ListId) -> Self {
        Self {
            id,
            streams: Vec::new(),
            filter: FilterState::default(),
            matcher: None,
            visible: Vec::new(),
            selected: 0,
            offset: 0,
            height: 0,
            weight: 1,
        }
    }

    pub fn set_streams(&mut self, streams: Vec<Stream>) {
        let previous = self.selected_stream().map(|s| s.name.clone());
        self.streams = streams;
        self.refilter();
        let found = previous.and_then(|name| self.visible().position(|s| s.name == name));
        if let Some(pos) = found {
            self.select(pos);
        }
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: FilterState) -> Result<()> {
        let matcher = if filter.is_active() {
            Some(compile_pattern(&filter.pattern)?)
        } else {
            None
        };
        self.filter = filter;
        self.matcher = matcher;
        self.refilter();
        Ok(())
    }

    pub fn clear_filter(&mut self) {
        self.filter = FilterState::default();
        self.matcher = None;
        self.refilter();
    }

    fn refilter(&mut self) {
        self.visible = match &self.matcher {
            Some(re) => self
                .streams
                .iter()
                .enumerate()
                .filter(|(_, s)| s.haystacks().iter().any(|h| re.is_match(h)) != self.filter.inverted)
                .map(|(i, _)| i)
                .collect(),
            None => (0..self.streams.len()).collect(),
        };
        self.select(self.selected);
    }

    pub fn total(&self) -> usize {
        self.streams.len()
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn visible(&self) -> impl Iterator<Item = &Stream> + '_ {
        self.visible.iter().map(|&i| &self.streams[i])
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn selected_stream(&self) -> Option<&Stream> {
        self.visible
            .get(self.selected)
            .map(|&i| &self.streams[i])
    }

    fn rows(&self) -> usize {
        self.height.max(1)
    }

    pub fn select(&mut self, index: usize) {
        self.selected = index.min(self.len().saturating_sub(1));
        self.ensure_visible();
    }

    fn ensure_visible(&mut self) {
        let rows = self.rows();
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + rows {
            self.offset = self.selected + 1 - rows;
        }
        self.offset = self.offset.min(self.len().saturating_sub(1));
    }

    pub fn move_by(&mut self, delta: isize) {
        let target = self.selected.saturating_add_signed(delta);
        self.select(target);
    }

    pub fn top(&mut self) {
        self.select(0);
    }

    pub fn bottom(&mut self) {
        self.select(self.len().saturating_sub(1));
    }

    pub fn middle(&mut self) {
        let shown = self.len().saturating_sub(self.offset).min(self.rows());
        self.select(self.offset + shown.saturating_sub(1) / 2);
    }

    pub fn half_page(&mut self, forward: bool) {
        let jump = (self.rows() / 2).max(1) as isize;
        self.move_by(if forward { jump } else { -jump });
    }

    /// Scrolls the viewport one line, dragging the selection along at the edge.
    pub fn scroll_lines(&mut self, delta: isize) {
        let max_offset = self.len().saturating_sub(1);
        self.offset = self.offset.saturating_add_signed(delta).min(max_offset);
        let rows = self.rows();
        if self.selected < self.offset {
            self.selected = self.offset;
        } else if self.selected >= self.offset + rows {
            self.selected = self.offset + rows - 1;
        }
    }

    pub fn center(&mut self) {
        self.offset = self.selected.saturating_sub(self.rows() / 2);
    }

    /// Moves to the next entry containing `pattern`, wrapping around.
    pub fn search(&mut self, pattern: &str, forward: bool) -> bool {
        let count = self.len();
        if count == 0 || pattern.is_empty() {
            return false;
        }
        let needle = pattern.to_lowercase();
        for step in 1..=count {
            let index = if forward {
                (self.selected + step) % count
            } else {
                (self.selected + count - step % count) % count
            };
            let stream = &self.streams[self.visible[index]];
            let hit = [&stream.name, &stream.title, &stream.game]
                .iter()
                .any(|text| text.to_lowercase().contains(&needle));
            if hit {
                self.select(index);
                return true;
            }
        }
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct InfoPane {
    pub title: String,
    pub text: String,
    pub scroll: u16,
}

impl InfoPane {
    pub fn scroll_by(&mut self, delta: i32) {
        let max = self.text.lines().count().saturating_sub(1) as i32;
        self.scroll = (self.scroll as i32 + delta).clamp(0, max.max(0)) as u16;
    }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub twitch: StreamList,
    pub strims: StreamList,
    pub focused: ListId,
    pub strims_visible: bool,
    pub winopen: bool,
    pub last_search: String,
    pub info: InfoPane,
    pub status: Option<Status>,
    pub last_fetched: Option<SystemTime>,
}

impl Dashboard {
    pub fn new(strims_visible: bool, winopen: bool) -> Self {
        Self {
            twitch: StreamList::new(ListId::Twitch),
            strims: StreamList::new(ListId::Strims),
            focused: ListId::Twitch,
            strims_visible,
            winopen,
            last_search: String::new(),
            info: InfoPane::default(),
            status: None,
            last_fetched: None,
        }
    }

    pub fn list(&self, id: ListId) -> &StreamList {
        match id {
            ListId::Twitch => &self.twitch,
            ListId::Strims => &self.strims,
        }
    }

    pub fn list_mut(&mut self, id: ListId) -> &mut StreamList {
        match id {
            ListId::Twitch => &mut self.twitch,
            ListId::Strims => &mut self.strims,
        }
    }

    pub fn focused_list(&self) -> &StreamList {
        self.list(self.focused)
    }

    pub fn focused_list_mut(&mut self) -> &mut StreamList {
        self.list_mut(self.focused)
    }

    /// Lists affected by a command: every list with bang, else the focused one.
    pub fn targets(&self, all: bool) -> Vec<ListId> {
        if all {
            ListId::ALL.to_vec()
        } else {
            vec![self.focused]
        }
    }

    pub fn focus(&mut self, id: ListId) {
        if id == ListId::Strims {
            self.strims_visible = true;
        }
        self.focused = id;
        self.show_selection();
    }

    pub fn set_strims_visible(&mut self, visible: bool) {
        self.strims_visible = visible;
        if !visible && self.focused == ListId::Strims {
            self.focused = ListId::Twitch;
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let has_strims = !snapshot.strims.is_empty();
        self.twitch.set_streams(snapshot.twitch);
        self.strims.set_streams(snapshot.strims);
        self.set_strims_visible(has_strims);
        self.last_fetched = Some(SystemTime::now());
        self.show_selection();
    }

    pub fn set_status(&mut self, level: StatusLevel, text: impl Into<String>) {
        self.status = Some(Status {
            level,
            text: text.into(),
        });
    }

    pub fn show_info(&mut self, title: impl Into<String>, text: impl Into<String>) {
        self.info = InfoPane {
            title: title.into(),
            text: text.into(),
            scroll: 0,
        };
    }

    pub fn show_selection(&mut self) {
        let Some(stream) = self.focused_list().selected_stream() else {
            self.show_info(self.focused.name().to_uppercase(), "No streams");
            return;
        };
        let mut text = format!("Name: {}\nService: {}\n", stream.name, stream.service);
        if !stream.title.is_empty() {
            text.push_str(&format!("Title: {}\n", stream.title));
        }
        if !stream.game.is_empty() {
            text.push_str(&format!("Game: {}\n", stream.game));
        }
        text.push_str(&format!("Viewers: {}\n", stream.viewers));
        if let Some(started) = &stream.started {
            text.push_str(&format!("Started: {started}\n"));
        }
        if !stream.language.is_empty() {
            text.push_str(&format!("Language: {}\n", stream.language));
        }
        let title = stream.name.clone();
        self.show_info(title, text);
    }

    pub fn search(&mut self, forward: bool) {
        if self.last_search.is_empty() {
            return;
        }
        let pattern = self.last_search.clone();
        if self.focused_list_mut().search(&pattern, forward) {
            self.show_selection();
        } else {
            self.set_status(StatusLevel::Warning, format!("No match for {pattern:?}"));
        }
    }
}
