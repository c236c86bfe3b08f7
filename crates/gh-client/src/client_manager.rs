//! Session-scoped GitHub client registry
//!
//! Maps each dashboard session to the API client built from its bearer token.
//! Clients are created on sign-in and evicted when the API rejects the token.

use crate::error::{ClientError, Result};
use crate::types::SessionId;
use crate::{GitHubClient, OctocrabClient, DEFAULT_HOST};
use anyhow::Context;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Resolves the initial GitHub token for a host
///
/// Tries multiple sources in order:
/// 1. Host-specific env var (e.g., `GITHUB_TOKEN_GHE_EXAMPLE_COM`)
/// 2. `gh auth token --hostname {host}` command
/// 3. Generic `GITHUB_TOKEN` or `GH_TOKEN` (github.com only)
#[derive(Debug, Clone)]
pub struct TokenResolver {
    /// Cached default token from GITHUB_TOKEN/GH_TOKEN
    default_token: Option<String>,
}

impl Default for TokenResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenResolver {
    pub fn new() -> Self {
        let default_token = std::env::var("GITHUB_TOKEN")
            .or_else(|_| std::env::var("GH_TOKEN"))
            .ok();

        Self { default_token }
    }

    /// Get a token for the given host (None = github.com)
    pub async fn get_token(&self, host: Option<&str>) -> anyhow::Result<String> {
        let host = host.unwrap_or(DEFAULT_HOST);

        let env_key = host_env_key(host);
        if let Ok(token) = std::env::var(&env_key) {
            debug!("Using token from env var {} for host {}", env_key, host);
            return Ok(token);
        }

        debug!("Trying gh auth token for host {}", host);
        match tokio::process::Command::new("gh")
            .args(["auth", "token", "--hostname", host])
            .output()
            .await
        {
            Ok(output) if output.status.success() => {
                let token = String::from_utf8(output.stdout)
                    .context("Invalid UTF-8 in gh auth token output")?
                    .trim()
                    .to_string();
                if !token.is_empty() {
                    debug!("Using token from gh CLI for host {}", host);
                    return Ok(token);
                }
            }
            Ok(_) => debug!("gh auth token returned no token for {}", host),
            Err(e) => debug!("Failed to run 'gh auth token': {}", e),
        }

        if host == DEFAULT_HOST {
            if let Some(ref token) = self.default_token {
                debug!("Using default token (GITHUB_TOKEN/GH_TOKEN) for github.com");
                return Ok(token.clone());
            }
        }

        Err(anyhow::anyhow!(
            "No token found for host '{}'. \
             Set {} or run 'gh auth login --hostname {}'",
            host,
            env_key,
            host
        ))
    }
}

/// Environment variable holding a host-specific token
fn host_env_key(host: &str) -> String {
    format!(
        "GITHUB_TOKEN_{}",
        host.replace(['.', '-'], "_").to_uppercase()
    )
}

/// Registry of API clients keyed by session
///
/// An explicit object handed to the dashboard service; there is no
/// process-wide client state. Every operation that needs a client looks it
/// up here and fails with [`ClientError::Uninitialized`] if the session has
/// none.
///
/// # Example
///
/// ```rust,ignore
/// use gh_client::{ClientRegistry, SessionId};
///
/// let registry = ClientRegistry::new(None);
/// let session = SessionId::new("tab-1");
/// registry.initialize(&session, "ghp_token")?;
///
/// let client = registry.client(&session)?;
/// ```
pub struct ClientRegistry {
    clients: Mutex<HashMap<SessionId, Arc<dyn GitHubClient>>>,
    host: Option<String>,
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ClientRegistry {
    /// Create an empty registry whose clients target `host` (None = github.com)
    pub fn new(host: Option<String>) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            host,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Arc<dyn GitHubClient>>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create or replace the client bound to `session` from a bearer token
    pub fn initialize(&self, session: &SessionId, token: &str) -> Result<()> {
        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        info!("Creating GitHub client for session {} on {}", session, host);

        let client = OctocrabClient::with_token(token, self.host.as_deref())?;
        self.insert(session, Arc::new(client));
        Ok(())
    }

    /// Bind an already constructed client to `session`, replacing any previous one
    pub fn insert(&self, session: &SessionId, client: Arc<dyn GitHubClient>) {
        if self.lock().insert(session.clone(), client).is_some() {
            debug!("Replaced existing client for session {}", session);
        }
    }

    /// Get the client bound to `session`
    pub fn client(&self, session: &SessionId) -> Result<Arc<dyn GitHubClient>> {
        self.lock()
            .get(session)
            .cloned()
            .ok_or_else(|| ClientError::Uninitialized(session.to_string()))
    }

    /// Check if a client exists for the session
    pub fn has_client(&self, session: &SessionId) -> bool {
        self.lock().contains_key(session)
    }

    /// Remove the client for a session, returning whether one existed
    pub fn evict(&self, session: &SessionId) -> bool {
        let removed = self.lock().remove(session).is_some();
        if removed {
            warn!("Evicted GitHub client for session {}", session);
        }
        removed
    }

    /// Remove the session's client only if it is still `client`
    ///
    /// Returns false when the session has no client or a different one.
    pub fn evict_client(&self, session: &SessionId, client: &Arc<dyn GitHubClient>) -> bool {
        let mut clients = self.lock();
        let is_current = clients
            .get(session)
            .is_some_and(|current| Arc::ptr_eq(current, client));
        if !is_current {
            return false;
        }

        clients.remove(session);
        warn!("Evicted GitHub client for session {}", session);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_env_key_generation() {
        let hosts = [
            ("github.com", "GITHUB_TOKEN_GITHUB_COM"),
            ("ghe.example.com", "GITHUB_TOKEN_GHE_EXAMPLE_COM"),
            (
                "github-enterprise.corp.com",
                "GITHUB_TOKEN_GITHUB_ENTERPRISE_CORP_COM",
            ),
        ];

        for (host, expected_key) in hosts {
            assert_eq!(
                host_env_key(host),
                expected_key,
                "Host '{}' should produce key '{}'",
                host,
                expected_key
            );
        }
    }

    #[test]
    fn test_empty_registry_is_uninitialized() {
        let registry = ClientRegistry::default();
        let session = SessionId::new("s1");

        assert!(!registry.has_client(&session));
        assert_eq!(
            registry.client(&session).err(),
            Some(ClientError::Uninitialized("s1".to_string()))
        );
    }

    #[tokio::test]
    async fn test_initialize_and_evict() {
        let registry = ClientRegistry::default();
        let alice = SessionId::new("alice");
        let bob = SessionId::new("bob");

        registry.initialize(&alice, "token-a").unwrap();
        registry.initialize(&bob, "token-b").unwrap();
        assert!(registry.client(&alice).is_ok());

        assert!(registry.evict(&alice));
        assert!(!registry.evict(&alice));
        assert!(!registry.has_client(&alice));
        assert!(registry.has_client(&bob));
    }

    #[tokio::test]
    async fn test_initialize_replaces_client() {
        let registry = ClientRegistry::new(Some("ghe.example.com".to_string()));
        let session = SessionId::new("s1");

        registry.initialize(&session, "old").unwrap();
        let first = registry.client(&session).unwrap();
        registry.initialize(&session, "new").unwrap();
        let second = registry.client(&session).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_evict_client_ignores_replaced_client() {
        let registry = ClientRegistry::default();
        let session = SessionId::new("s1");

        registry.initialize(&session, "old").unwrap();
        let stale = registry.client(&session).unwrap();
        registry.initialize(&session, "new").unwrap();

        assert!(!registry.evict_client(&session, &stale));
        assert!(registry.has_client(&session));

        let current = registry.client(&session).unwrap();
        assert!(registry.evict_client(&session, &current));
        assert!(!registry.has_client(&session));
        assert!(!registry.evict_client(&session, &current));
    }
}
