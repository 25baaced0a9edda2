use crate::commands::{self, CommandRegistry, History};
use crate::config::Config;
use crate::dashboard::{Dashboard, StatusLevel};
use crate::error::Result as CmdResult;
use crate::input::{CommandLine, InputState};
use crate::keys::Key;
use crate::link::{Launcher, ProcessLauncher};
use crate::mappings::MappingRegistry;
use crate::refresh::{self, AppEvent, RefreshHandle, SnapshotFile};
use crate::ui;
use anyhow::Result;
use crossterm::event::{self, Event};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub fn run_app(snapshot: PathBuf, config: Config) -> Result<()> {
    let (refresh, requests) = RefreshHandle::channel();
    let (events_tx, events) = mpsc::channel();
    let source = SnapshotFile::new(snapshot.clone(), config.update_command.clone());
    let interval = Duration::from_secs(config.refresh_interval_secs.max(1));
    let _poller = refresh::spawn_poller(Box::new(source), requests, events_tx, interval);
    let _watcher = match refresh::watch_snapshot(&snapshot, refresh.clone()) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            warn!(path = %snapshot.display(), "not watching snapshot: {err}");
            None
        }
    };

    let launcher = ProcessLauncher::new(config.browser.clone());
    let mut app = App::new(&config, Box::new(launcher), refresh);

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    let tick_rate = Duration::from_millis(50);

    loop {
        terminal.draw(|f| ui::draw(f, &mut app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(event) = event::read()? {
                if let Some(key) = Key::from_event(event) {
                    app.handle_key(key);
                }
            }
        }

        while let Ok(event) = events.try_recv() {
            app.on_event(event);
        }

        if app.should_quit {
            break;
        }
    }

    info!("quitting");
    Ok(())
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = stdout.execute(LeaveAlternateScreen);
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    List,
    CommandLine,
}

pub struct App {
    pub(crate) dashboard: Dashboard,
    pub(crate) commands: CommandRegistry,
    pub(crate) mappings: MappingRegistry,
    pub(crate) history: History,
    pub(crate) cmdline: CommandLine,
    pub(crate) mode: Mode,
    pub(crate) launcher: Box<dyn Launcher>,
    pub(crate) refresh: RefreshHandle,
    pub(crate) should_quit: bool,
    input: InputState,
    /// Keys produced by a mapping, waiting to be processed.
    pending: VecDeque<Key>,
}

impl App {
    pub fn new(config: &Config, launcher: Box<dyn Launcher>, refresh: RefreshHandle) -> Self {
        let mut mappings = MappingRegistry::new();
        for (lhs, rhs) in &config.mappings {
            if let Err(err) = mappings.insert(lhs, rhs) {
                warn!(%lhs, "ignoring configured mapping: {err}");
            }
        }
        Self {
            dashboard: Dashboard::new(config.strims, config.winopen),
            commands: CommandRegistry::new(),
            mappings,
            history: History::default(),
            cmdline: CommandLine::default(),
            mode: Mode::List,
            launcher,
            refresh,
            should_quit: false,
            input: InputState::default(),
            pending: VecDeque::new(),
        }
    }

    /// Feeds one key from the terminal, then every key its mappings produce.
    pub fn handle_key(&mut self, key: Key) {
        self.pending.push_back(key);
        while let Some(key) = self.pending.pop_front() {
            let mapped = self.input.consume();
            self.process_key(key, mapped);
            if self.should_quit {
                self.pending.clear();
                self.input.reset();
                break;
            }
        }
    }

    pub fn on_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Status(level, text) => self.dashboard.set_status(level, text),
            AppEvent::Snapshot(snapshot) => self.dashboard.apply_snapshot(snapshot),
        }
    }

    fn report(&mut self, err: crate::error::Error) {
        debug!("{err}");
        self.dashboard.set_status(StatusLevel::Error, err.to_string());
    }

    fn process_key(&mut self, key: Key, mapped: bool) {
        match self.mode {
            Mode::List => {
                if !mapped {
                    if let Some(rhs) = self.mappings.get_key(key).map(str::to_string) {
                        self.expand(key, &rhs);
                        return;
                    }
                }
                if self.list_action(key) {
                    return;
                }
                if let Key::Char(c @ (':' | '/' | '?')) = key {
                    self.open_cmdline(c, mapped);
                }
            }
            Mode::CommandLine => self.cmdline_key(key, mapped),
        }
    }

    fn expand(&mut self, lhs: Key, rhs: &str) {
        let keys = self.mappings.resolve(rhs).and_then(|tokens| {
            tokens
                .iter()
                .map(|token| Key::decode(token))
                .collect::<CmdResult<Vec<_>>>()
        });
        match keys {
            Ok(keys) => {
                debug!(%lhs, keys = keys.len(), "mapping expanded");
                self.input.begin(keys.len());
                for key in keys.into_iter().rev() {
                    self.pending.push_front(key);
                }
            }
            Err(err) => {
                warn!(%lhs, "mapping failed: {err}");
                self.input.reset();
                self.pending.clear();
                self.report(err);
            }
        }
    }

    /// Runs the built-in list action bound to `key`, if any.
    pub(crate) fn list_action(&mut self, key: Key) -> bool {
        match key {
            Key::Char('n') => {
                self.dashboard.search(true);
                return true;
            }
            Key::Char('N') => {
                self.dashboard.search(false);
                return true;
            }
            _ => {}
        }
        let list = self.dashboard.focused_list_mut();
        match key {
            Key::Char('j') | Key::Down | Key::Ctrl('n') => list.move_by(1),
            Key::Char('k') | Key::Up | Key::Ctrl('p') => list.move_by(-1),
            Key::Char('g') => list.top(),
            Key::Char('G') => list.bottom(),
            Key::Char('M') => list.middle(),
            Key::Char('z') => list.center(),
            Key::Ctrl('d') => list.half_page(true),
            Key::Ctrl('u') => list.half_page(false),
            Key::Ctrl('e') => list.scroll_lines(1),
            Key::Ctrl('y') => list.scroll_lines(-1),
            _ => return false,
        }
        self.dashboard.show_selection();
        true
    }

    fn open_cmdline(&mut self, prefix: char, mapped: bool) {
        self.mode = Mode::CommandLine;
        self.cmdline.clear();
        self.cmdline.insert(prefix);
        self.edited(mapped);
    }

    fn close_cmdline(&mut self) {
        self.mode = Mode::List;
        self.cmdline.clear();
    }

    fn cmdline_key(&mut self, key: Key, mapped: bool) {
        match key {
            Key::Enter => self.confirm(mapped),
            Key::Esc => self.close_cmdline(),
            Key::Backspace => {
                if self.cmdline.backspace() {
                    if self.cmdline.text().is_empty() {
                        self.close_cmdline();
                    } else {
                        self.edited(mapped);
                    }
                }
            }
            Key::Left => self.cmdline.move_left(),
            Key::Right => self.cmdline.move_right(),
            Key::Up | Key::Ctrl('p') => {
                if let Some(line) = self.history.up().map(str::to_string) {
                    self.cmdline.set_text(&line);
                    self.edited(mapped);
                }
            }
            Key::Down | Key::Ctrl('n') => {
                if let Some(line) = self.history.down().map(str::to_string) {
                    self.cmdline.set_text(&line);
                    self.edited(mapped);
                }
            }
            Key::Tab | Key::Ctrl('y') => {
                if self.cmdline.suggestions().is_empty() {
                    self.suggest();
                }
                if self.cmdline.accept_next() {
                    self.type_current();
                }
            }
            Key::Ctrl('e') => self.cmdline.dismiss(),
            Key::Ctrl('z') => self.suggest(),
            Key::Char(c) => {
                self.cmdline.insert(c);
                self.edited(mapped);
            }
            _ => {}
        }
    }

    /// Re-runs live typing after an edit. Suggestions follow hand typing only.
    fn edited(&mut self, mapped: bool) {
        self.type_current();
        if mapped {
            self.cmdline.dismiss();
        } else {
            self.suggest();
        }
    }

    fn type_current(&mut self) {
        let line = self.cmdline.text().to_string();
        if let Err(err) = commands::type_line(self, &line) {
            self.report(err);
        }
    }

    fn suggest(&mut self) {
        let suggestions = commands::complete(self, self.cmdline.text());
        self.cmdline.set_suggestions(suggestions);
    }

    fn confirm(&mut self, mapped: bool) {
        let line = self.cmdline.text().to_string();
        self.close_cmdline();
        self.history.reset_cursor();
        if !mapped {
            self.history.push(&line);
        }
        debug!(%line, mapped, "execute line");
        if let Err(err) = commands::execute_line(self, &line) {
            self.report(err);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{App, Mode};
    use crate::config::Config;
    use crate::dashboard::tests::sample_snapshot;
    use crate::error::Result;
    use crate::input::InputState;
    use crate::keys::Key;
    use crate::link::{Launcher, OpenMethod};
    use crate::refresh::{RefreshHandle, RefreshKind};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::mpsc::Receiver;

    #[derive(Clone, Default)]
    pub(crate) struct FakeLauncher {
        opened: Rc<RefCell<Vec<(String, bool)>>>,
        copied: Rc<RefCell<Vec<String>>>,
    }

    impl FakeLauncher {
        pub(crate) fn opened(&self) -> Vec<(String, bool)> {
            self.opened.borrow().clone()
        }

        pub(crate) fn copied(&self) -> Vec<String> {
            self.copied.borrow().clone()
        }
    }

    impl Launcher for FakeLauncher {
        fn open(&self, url: &str, _method: OpenMethod, winopen: bool) -> Result<()> {
            self.opened.borrow_mut().push((url.to_string(), winopen));
            Ok(())
        }

        fn copy(&self, url: &str) -> Result<()> {
            self.copied.borrow_mut().push(url.to_string());
            Ok(())
        }
    }

    /// App over the sample snapshot; the refresh channel is never polled.
    pub(crate) fn test_app() -> (App, Receiver<RefreshKind>) {
        let (refresh, requests) = RefreshHandle::channel();
        let mut app = App::new(&Config::default(), Box::new(FakeLauncher::default()), refresh);
        app.dashboard.apply_snapshot(sample_snapshot());
        (app, requests)
    }

    fn type_keys(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(Key::Char(c));
        }
    }

    fn status(app: &App) -> Option<&str> {
        app.dashboard.status.as_ref().map(|s| s.text.as_str())
    }

    #[test]
    fn typed_command_runs_and_enters_history() {
        let (mut app, requests) = test_app();
        type_keys(&mut app, ":sy");
        assert_eq!(app.mode, Mode::CommandLine);
        app.handle_key(Key::Enter);
        assert_eq!(app.mode, Mode::List);
        assert_eq!(requests.try_recv(), Ok(RefreshKind::Fetch));
        assert_eq!(app.history.up(), Some(":sy"));
    }

    #[test]
    fn mapped_lines_skip_history() {
        let (mut app, requests) = test_app();
        app.handle_key(Key::Char('r'));
        assert_eq!(requests.try_recv(), Ok(RefreshKind::Fetch));
        assert_eq!(app.history.up(), None);
        assert_eq!(app.input, InputState::Idle);
    }

    #[test]
    fn mapped_confirm_resets_history_cursor() {
        let (mut app, _) = test_app();
        type_keys(&mut app, ":echo one");
        app.handle_key(Key::Enter);
        type_keys(&mut app, ":echo two");
        app.handle_key(Key::Enter);
        type_keys(&mut app, ":");
        app.handle_key(Key::Up);
        app.handle_key(Key::Up);
        assert_eq!(app.cmdline.text(), ":echo one");
        app.handle_key(Key::Esc);

        app.handle_key(Key::Char('r'));
        type_keys(&mut app, ":");
        app.handle_key(Key::Up);
        assert_eq!(app.cmdline.text(), ":echo two");
    }

    #[test]
    fn enter_opens_embed_and_quits() {
        let launcher = FakeLauncher::default();
        let (mut app, _) = test_app();
        app.launcher = Box::new(launcher.clone());
        app.handle_key(Key::Char('j'));
        app.handle_key(Key::Enter);
        assert_eq!(
            launcher.opened(),
            vec![(
                "https://player.twitch.tv/?channel=bravo&parent=strims.gg".to_string(),
                false
            )]
        );
        assert!(app.should_quit);
    }

    #[test]
    fn partial_mapping_leaves_command_line_open() {
        let launcher = FakeLauncher::default();
        let (mut app, _) = test_app();
        app.launcher = Box::new(launcher.clone());
        app.handle_key(Key::Char(' '));
        assert_eq!(app.mode, Mode::CommandLine);
        assert_eq!(app.cmdline.text(), ":open ");
        assert_eq!(app.input, InputState::Idle);

        app.handle_key(Key::Char('e'));
        assert_eq!(app.cmdline.suggestions(), &[":open embed".to_string()]);
        app.handle_key(Key::Tab);
        assert_eq!(app.cmdline.text(), ":open embed");
        app.handle_key(Key::Enter);
        assert_eq!(launcher.opened().len(), 1);
        assert_eq!(app.history.up(), Some(":open embed"));
    }

    #[test]
    fn filter_mapping_completes_template_and_filters_live() {
        let (mut app, _) = test_app();
        app.handle_key(Key::Char('f'));
        assert_eq!(app.cmdline.text(), ":global//d");
        type_keys(&mut app, "any");
        assert_eq!(app.cmdline.text(), ":global/any/d");
        assert_eq!(app.dashboard.twitch.len(), 3);
        app.handle_key(Key::Enter);
        assert_eq!(app.mode, Mode::List);
        assert_eq!(app.dashboard.twitch.len(), 3);
    }

    #[test]
    fn recursive_mapping_is_reported_and_resets() {
        let (mut app, _) = test_app();
        app.mappings.insert("a", "a").expect("map");
        app.handle_key(Key::Char('a'));
        assert_eq!(status(&app), Some("recursive mapping: a"));
        assert_eq!(app.input, InputState::Idle);
        app.handle_key(Key::Char('j'));
        assert_eq!(app.dashboard.twitch.selected(), 1);
    }

    #[test]
    fn mapping_with_unicode_whitespace_expands() {
        let (mut app, _) = test_app();
        app.mappings
            .insert("x", ":echo a\u{3000}b<CR>")
            .expect("map");
        app.handle_key(Key::Char('x'));
        assert_eq!(app.mode, Mode::List);
        assert_eq!(status(&app), Some("a b"));
    }

    #[test]
    fn no_new_mapping_while_expanding() {
        let (mut app, _) = test_app();
        app.input.begin(1);
        app.handle_key(Key::Char('q'));
        assert!(!app.should_quit);
        assert_eq!(app.input, InputState::Idle);
        app.handle_key(Key::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn command_errors_become_status() {
        let (mut app, _) = test_app();
        type_keys(&mut app, ":bogus");
        app.handle_key(Key::Enter);
        assert_eq!(status(&app), Some("Unknown command: bogus"));
        type_keys(&mut app, ":s");
        app.handle_key(Key::Enter);
        assert_eq!(
            status(&app),
            Some("Ambiguous: s (could be scrollinfo, set, sync)")
        );
    }

    #[test]
    fn backspace_and_escape_close_the_line() {
        let (mut app, _) = test_app();
        type_keys(&mut app, ":");
        app.handle_key(Key::Backspace);
        assert_eq!(app.mode, Mode::List);
        type_keys(&mut app, ":quit");
        app.handle_key(Key::Esc);
        assert_eq!(app.mode, Mode::List);
        assert!(!app.should_quit);
    }

    #[test]
    fn history_recall_with_arrows() {
        let (mut app, _) = test_app();
        type_keys(&mut app, ":echo one");
        app.handle_key(Key::Enter);
        type_keys(&mut app, ":echo two");
        app.handle_key(Key::Enter);
        type_keys(&mut app, ":");
        app.handle_key(Key::Up);
        assert_eq!(app.cmdline.text(), ":echo two");
        app.handle_key(Key::Ctrl('p'));
        assert_eq!(app.cmdline.text(), ":echo one");
        app.handle_key(Key::Down);
        assert_eq!(app.cmdline.text(), ":echo two");
    }

    #[test]
    fn search_keys() {
        let (mut app, _) = test_app();
        type_keys(&mut app, "/practice");
        app.handle_key(Key::Enter);
        assert_eq!(app.dashboard.twitch.selected(), 2);
        app.handle_key(Key::Char('g'));
        app.handle_key(Key::Char('n'));
        assert_eq!(app.dashboard.twitch.selected(), 2);
    }

    #[test]
    fn configured_mappings_override_defaults() {
        let (refresh, _requests) = RefreshHandle::channel();
        let mut config = Config::default();
        config.mappings.insert("q".to_string(), ":echo nope<CR>".to_string());
        config.mappings.insert("bad key".to_string(), ":quit<CR>".to_string());
        let mut app = App::new(&config, Box::new(FakeLauncher::default()), refresh);
        app.handle_key(Key::Char('q'));
        assert!(!app.should_quit);
        assert_eq!(status(&app), Some("nope"));
    }
}
