//! Parsed directory + schedule, and where they come from.
//!
//! A [`DirectorySnapshot`] is immutable once built. The [`SnapshotStore`]
//! either rebuilds it from disk on every request, so data edits show up
//! without a restart, or parses once and hands out the cached copy until
//! [`SnapshotStore::invalidate`] is called.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domains::providers::{parse_providers, Provider};
use crate::domains::schedules::{parse_schedule, ScheduleIndex, Slot};

#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    pub providers: Vec<Provider>,
    pub slots: Vec<Slot>,
    pub schedule: ScheduleIndex,
    pub files: DataFiles,
}

/// Which data files were present when the snapshot was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DataFiles {
    pub providers_txt: bool,
    pub provider_schedule_txt: bool,
}

impl DirectorySnapshot {
    /// Build from raw file contents. A missing file is an empty one.
    pub fn from_text(providers_raw: Option<&str>, schedule_raw: Option<&str>) -> Self {
        let providers = providers_raw.map(parse_providers).unwrap_or_default();
        let slots = schedule_raw.map(parse_schedule).unwrap_or_default();
        let schedule = ScheduleIndex::build(&slots);

        Self {
            providers,
            slots,
            schedule,
            files: DataFiles {
                providers_txt: providers_raw.is_some_and(|s| !s.trim().is_empty()),
                provider_schedule_txt: schedule_raw.is_some_and(|s| !s.trim().is_empty()),
            },
        }
    }

    /// First provider with this id (ids are compared lowercase).
    pub fn provider(&self, id: &str) -> Option<&Provider> {
        let id = id.trim().to_lowercase();
        self.providers.iter().find(|p| p.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadMode {
    /// Re-read and re-parse both files on every request
    PerRequest,
    /// Parse once, reuse until invalidated
    Cached,
}

impl FromStr for ReloadMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "per_request" | "request" | "always" => Ok(ReloadMode::PerRequest),
            "cached" | "cache" | "once" => Ok(ReloadMode::Cached),
            other => anyhow::bail!("Unknown reload mode '{}' (expected per_request or cached)", other),
        }
    }
}

enum Source {
    Files { providers: PathBuf, schedule: PathBuf },
    Fixed(Arc<DirectorySnapshot>),
}

pub struct SnapshotStore {
    source: Source,
    mode: ReloadMode,
    cached: RwLock<Option<Arc<DirectorySnapshot>>>,
}

impl SnapshotStore {
    pub fn new(providers: impl Into<PathBuf>, schedule: impl Into<PathBuf>, mode: ReloadMode) -> Self {
        Self {
            source: Source::Files {
                providers: providers.into(),
                schedule: schedule.into(),
            },
            mode,
            cached: RwLock::new(None),
        }
    }

    /// A store that always returns `snapshot`.
    pub fn fixed(snapshot: DirectorySnapshot) -> Self {
        Self {
            source: Source::Fixed(Arc::new(snapshot)),
            mode: ReloadMode::Cached,
            cached: RwLock::new(None),
        }
    }

    pub fn mode(&self) -> ReloadMode {
        self.mode
    }

    pub async fn load(&self) -> Result<Arc<DirectorySnapshot>> {
        let (providers_path, schedule_path) = match &self.source {
            Source::Fixed(snapshot) => return Ok(snapshot.clone()),
            Source::Files { providers, schedule } => (providers, schedule),
        };

        if self.mode == ReloadMode::Cached {
            if let Some(snapshot) = self.cached.read().await.as_ref() {
                return Ok(snapshot.clone());
            }
        }

        let snapshot = Arc::new(read_snapshot(providers_path, schedule_path).await?);

        debug!(
            providers = snapshot.providers.len(),
            slots = snapshot.slots.len(),
            mode = ?self.mode,
            "Loaded directory snapshot"
        );

        if self.mode == ReloadMode::Cached {
            *self.cached.write().await = Some(snapshot.clone());
        }

        Ok(snapshot)
    }

    /// Drop the cached snapshot; the next load re-reads the files.
    pub async fn invalidate(&self) {
        self.cached.write().await.take();
    }
}

async fn read_snapshot(providers: &Path, schedule: &Path) -> Result<DirectorySnapshot> {
    let providers_raw = read_if_exists(providers).await?;
    let schedule_raw = read_if_exists(schedule).await?;
    Ok(DirectorySnapshot::from_text(
        providers_raw.as_deref(),
        schedule_raw.as_deref(),
    ))
}

async fn read_if_exists(path: &Path) -> Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(raw)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}
