//! Session state persistence
//!
//! Each dashboard session owns one bearer token and the list of repositories
//! the user last selected. The controller only talks to the
//! [`SessionPersistence`] trait; [`SessionStore`] writes a TOML file under the
//! config directory and [`MemorySessionStore`] keeps everything in memory.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

const SESSION_VERSION: u32 = 1;

/// Durable per-session state read at startup and written on change
pub trait SessionPersistence: Send {
    /// Stored bearer token for the session, if any
    fn token(&self, session: &str) -> Option<String>;

    /// Persist the bearer token for the session
    fn store_token(&mut self, session: &str, token: &str) -> Result<()>;

    /// Forget the bearer token (after an auth failure or sign-out)
    fn clear_token(&mut self, session: &str) -> Result<()>;

    /// Repositories (full names) the session last had selected
    fn selected_repositories(&self, session: &str) -> Vec<String>;

    /// Persist the current repository selection
    fn store_selected_repositories(&mut self, session: &str, repos: &[String]) -> Result<()>;
}

/// Persisted data for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub selected_repositories: Vec<String>,
}

/// Session file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    pub last_modified: DateTime<Utc>,
    pub version: u32,
}

/// On-disk layout of the session store
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    meta: SessionMeta,
    #[serde(default)]
    sessions: BTreeMap<String, SessionRecord>,
}

impl Default for SessionFile {
    fn default() -> Self {
        Self {
            meta: SessionMeta {
                last_modified: Utc::now(),
                version: SESSION_VERSION,
            },
            sessions: BTreeMap::new(),
        }
    }
}

/// TOML-file backed session store
///
/// Every mutation is written through to disk immediately.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    file: SessionFile,
}

impl SessionStore {
    /// Load the store from `path`, starting empty if the file does not exist
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read session file: {:?}", path))?;
            let file: SessionFile = toml::from_str(&content)
                .with_context(|| format!("Failed to parse session file: {:?}", path))?;
            log::info!(
                "Loaded {} session(s) from {:?}",
                file.sessions.len(),
                path
            );
            file
        } else {
            log::info!("No existing session file at {:?}, starting fresh", path);
            SessionFile::default()
        };

        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the record for a session, if one exists
    pub fn record(&self, session: &str) -> Option<&SessionRecord> {
        self.file.sessions.get(session)
    }

    fn update(&mut self, session: &str, f: impl FnOnce(&mut SessionRecord)) -> Result<()> {
        f(self.file.sessions.entry(session.to_string()).or_default());
        self.save()
    }

    fn save(&mut self) -> Result<()> {
        self.file.meta.last_modified = Utc::now();

        let content =
            toml::to_string_pretty(&self.file).context("Failed to serialize session store")?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write session file: {:?}", self.path))?;

        log::debug!("Saved session store to {:?}", self.path);
        Ok(())
    }
}

impl SessionPersistence for SessionStore {
    fn token(&self, session: &str) -> Option<String> {
        self.record(session).and_then(|r| r.token.clone())
    }

    fn store_token(&mut self, session: &str, token: &str) -> Result<()> {
        self.update(session, |r| r.token = Some(token.to_string()))
    }

    fn clear_token(&mut self, session: &str) -> Result<()> {
        if self.token(session).is_none() {
            return Ok(());
        }
        self.update(session, |r| r.token = None)
    }

    fn selected_repositories(&self, session: &str) -> Vec<String> {
        self.record(session)
            .map(|r| r.selected_repositories.clone())
            .unwrap_or_default()
    }

    fn store_selected_repositories(&mut self, session: &str, repos: &[String]) -> Result<()> {
        self.update(session, |r| r.selected_repositories = repos.to_vec())
    }
}

/// In-memory session store for tests and ephemeral runs
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: HashMap<String, SessionRecord>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionPersistence for MemorySessionStore {
    fn token(&self, session: &str) -> Option<String> {
        self.sessions.get(session).and_then(|r| r.token.clone())
    }

    fn store_token(&mut self, session: &str, token: &str) -> Result<()> {
        self.sessions.entry(session.to_string()).or_default().token = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&mut self, session: &str) -> Result<()> {
        if let Some(record) = self.sessions.get_mut(session) {
            record.token = None;
        }
        Ok(())
    }

    fn selected_repositories(&self, session: &str) -> Vec<String> {
        self.sessions
            .get(session)
            .map(|r| r.selected_repositories.clone())
            .unwrap_or_default()
    }

    fn store_selected_repositories(&mut self, session: &str, repos: &[String]) -> Result<()> {
        self.sessions
            .entry(session.to_string())
            .or_default()
            .selected_repositories = repos.to_vec();
        Ok(())
    }
}
