use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stream {
    pub service: String,
    pub name: String,
    pub title: String,
    pub game: String,
    pub viewers: u64,
    pub language: String,
    pub started: Option<String>,
}

impl Stream {
    /// Fields searched by list filters.
    pub fn haystacks(&self) -> [&str; 4] {
        [&self.service, &self.name, &self.title, &self.game]
    }
}

/// Stream lists as delivered by the refresh collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub twitch: Vec<Stream>,
    pub strims: Vec<Stream>,
}

impl Snapshot {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut snapshot: Snapshot = toml::from_str(raw).context("Failed to parse snapshot")?;
        snapshot.sort();
        Ok(snapshot)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid snapshot {}", path.display()))
    }

    /// Most watched first.
    fn sort(&mut self) {
        self.twitch.sort_by(|a, b| b.viewers.cmp(&a.viewers));
        self.strims.sort_by(|a, b| b.viewers.cmp(&a.viewers));
    }
}

#[cfg(test)]
mod tests {
    use super::Snapshot;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[[twitch]]
service = "twitch"
name = "Quiet"
title = "chill"
viewers = 10

[[twitch]]
service = "twitch"
name = "Loud"
title = "speedrun"
game = "Celeste"
viewers = 900

[[strims]]
service = "angelthump"
name = "somebody"
viewers = 3
"#;

    #[test]
    fn parse_sorts_by_viewers() {
        let snapshot = Snapshot::parse(SAMPLE).expect("parse");
        let names: Vec<&str> = snapshot.twitch.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Loud", "Quiet"]);
        assert_eq!(snapshot.strims.len(), 1);
        assert_eq!(snapshot.strims[0].title, "");
    }

    #[test]
    fn load_reports_path_on_failure() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("snapshot.toml");
        fs::write(&path, "[[twitch]]\nviewers = \"many\"\n").expect("write");
        let err = Snapshot::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("snapshot.toml"));
    }

    #[test]
    fn empty_snapshot_is_valid() {
        let snapshot = Snapshot::parse("").expect("parse");
        assert!(snapshot.twitch.is_empty());
        assert!(snapshot.strims.is_empty());
    }
}
