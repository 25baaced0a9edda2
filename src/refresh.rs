use crate::dashboard::StatusLevel;
use crate::error::{Error, Result};
use crate::streams::Snapshot;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum AppEvent {
    Status(StatusLevel, String),
    Snapshot(Snapshot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    Fetch,
    RemoteUpdate,
}

impl RefreshKind {
    fn label(self) -> &'static str {
        match self {
            RefreshKind::Fetch => "fetching streams",
            RefreshKind::RemoteUpdate => "remote update",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RefreshHandle {
    tx: SyncSender<RefreshKind>,
}

impl RefreshHandle {
    pub fn channel() -> (Self, Receiver<RefreshKind>) {
        let (tx, rx) = mpsc::sync_channel(1);
        (Self { tx }, rx)
    }

    /// Queues a request unless one is already pending.
    pub fn try_request(&self, kind: RefreshKind) -> bool {
        match self.tx.try_send(kind) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn request(&self, kind: RefreshKind) -> Result<()> {
        if self.try_request(kind) {
            debug!(?kind, "refresh requested");
            Ok(())
        } else {
            warn!(?kind, "refresh request skipped");
            Err(Error::RefreshSkipped(kind.label()))
        }
    }
}

pub trait StreamSource: Send {
    fn fetch(&mut self) -> anyhow::Result<Snapshot>;
    fn request_update(&mut self) -> anyhow::Result<()>;
}

/// Reads streams from a TOML snapshot written by some other process.
pub struct SnapshotFile {
    path: PathBuf,
    update_command: Option<String>,
}

impl SnapshotFile {
    pub fn new(path: PathBuf, update_command: Option<String>) -> Self {
        Self {
            path,
            update_command,
        }
    }
}

impl StreamSource for SnapshotFile {
    fn fetch(&mut self) -> anyhow::Result<Snapshot> {
        Snapshot::load(&self.path)
    }

    fn request_update(&mut self) -> anyhow::Result<()> {
        let Some(raw) = self.update_command.as_deref() else {
            anyhow::bail!("No update_command configured");
        };
        let mut parts = shell_words::split(raw)?;
        if parts.is_empty() {
            anyhow::bail!("Empty update_command");
        }
        let program = parts.remove(0);
        let status = Command::new(&program)
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|err| anyhow::anyhow!("Failed to run {program}: {err}"))?;
        if !status.success() {
            anyhow::bail!("{program} exited with status {status}");
        }
        Ok(())
    }
}

pub fn spawn_poller(
    source: Box<dyn StreamSource>,
    requests: Receiver<RefreshKind>,
    events: Sender<AppEvent>,
    interval: Duration,
) -> JoinHandle<()> {
    thread::spawn(move || run_poller(source, requests, events, interval))
}

fn run_poller(
    mut source: Box<dyn StreamSource>,
    requests: Receiver<RefreshKind>,
    events: Sender<AppEvent>,
    interval: Duration,
) {
    let mut next = RefreshKind::Fetch;
    loop {
        let delivered = match next {
            RefreshKind::Fetch => fetch_once(source.as_mut(), &events),
            RefreshKind::RemoteUpdate => update_once(source.as_mut(), &events),
        };
        if !delivered {
            break;
        }
        next = match requests.recv_timeout(interval) {
            Ok(kind) => kind,
            Err(RecvTimeoutError::Timeout) => RefreshKind::Fetch,
            Err(RecvTimeoutError::Disconnected) => break,
        };
    }
    debug!("poller stopped");
}

fn fetch_once(source: &mut dyn StreamSource, events: &Sender<AppEvent>) -> bool {
    let status = |level, text: String| events.send(AppEvent::Status(level, text)).is_ok();
    if !status(StatusLevel::Warning, "Fetching streams...".to_string()) {
        return false;
    }
    match source.fetch() {
        Ok(snapshot) => {
            let message = format!(
                "Fetched {} Twitch streams and {} Strims streams",
                snapshot.twitch.len(),
                snapshot.strims.len()
            );
            info!("{message}");
            events.send(AppEvent::Snapshot(snapshot)).is_ok()
                && status(StatusLevel::Success, message)
        }
        Err(err) => {
            warn!("fetch failed: {err:#}");
            status(StatusLevel::Error, format!("Error fetching: {err:#}"))
        }
    }
}

fn update_once(source: &mut dyn StreamSource, events: &Sender<AppEvent>) -> bool {
    let status = |level, text: String| events.send(AppEvent::Status(level, text)).is_ok();
    if !status(StatusLevel::Warning, "Sending update...".to_string()) {
        return false;
    }
    match source.request_update() {
        Ok(()) => status(StatusLevel::Success, "Remote update requested".to_string()),
        Err(err) => {
            warn!("remote update failed: {err:#}");
            status(StatusLevel::Error, format!("Error updating: {err:#}"))
        }
    }
}

/// Requests a fetch whenever the snapshot file changes.
pub fn watch_snapshot(path: &Path, handle: RefreshHandle) -> notify::Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            if event.kind.is_modify() || event.kind.is_create() {
                handle.try_request(RefreshKind::Fetch);
            }
        }
    })?;
    watcher.watch(path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
