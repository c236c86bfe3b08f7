//! Cached dashboard data service
//!
//! Lists repositories, deployments and environments for a session. Each
//! listing checks the session's cache first, walks every upstream page on a
//! miss and stores the complete result under a logical key:
//!
//! | listing | cache key |
//! |---------|-----------|
//! | repositories | `repositories` |
//! | deployments | `deployments-{owner}/{name}` |
//! | environments | `environments-{owner}/{name}` |
//!
//! An HTTP 401 from any call evicts the session's client and drops its cached
//! entries before `AuthRequired` is returned.

use crate::aggregate::{group_by_environment, latest_status};
use crate::client::{CacheMode, GitHubClient};
use crate::client_manager::ClientRegistry;
use crate::error::{ClientError, Result};
use crate::types::{
    Deployment, DeploymentRecord, Environment, GroupedDeployment, RepoOption, RepoRef, SessionId,
};
use futures::future::try_join_all;
use gh_api_cache::ApiCache;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cache key for the repository list
pub const REPOSITORIES_KEY: &str = "repositories";

/// Largest page size the GitHub API accepts
pub const MAX_PAGE_SIZE: u8 = 100;

pub fn deployments_key(full_name: &str) -> String {
    format!("deployments-{}", full_name)
}

pub fn environments_key(full_name: &str) -> String {
    format!("environments-{}", full_name)
}

/// Session-aware service combining the client registry with the cache
///
/// Cloning is cheap: the registry and cache are shared.
///
/// # Example
///
/// ```rust,ignore
/// use gh_client::{ApiCache, ClientRegistry, DashboardService, SessionId};
/// use std::sync::{Arc, Mutex};
///
/// let registry = Arc::new(ClientRegistry::default());
/// let cache = Arc::new(Mutex::new(ApiCache::default()));
/// let service = DashboardService::new(registry.clone(), cache);
///
/// let session = SessionId::new("tab-1");
/// registry.initialize(&session, "ghp_token")?;
///
/// let repos = service.list_repositories(&session).await?;
/// let grouped = service.list_deployments(&session, "acme/widgets").await?;
/// ```
#[derive(Clone)]
pub struct DashboardService {
    registry: Arc<ClientRegistry>,
    cache: Arc<Mutex<ApiCache>>,
    mode: CacheMode,
    per_page: u8,
}

impl DashboardService {
    /// Create a service with full read/write caching and 100-item pages
    pub fn new(registry: Arc<ClientRegistry>, cache: Arc<Mutex<ApiCache>>) -> Self {
        Self {
            registry,
            cache,
            mode: CacheMode::ReadWrite,
            per_page: MAX_PAGE_SIZE,
        }
    }

    /// Use a different page size for paginated listings (clamped to 1..=100)
    pub fn with_page_size(mut self, per_page: u8) -> Self {
        self.per_page = per_page.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Create a service sharing registry and cache but with a different cache mode
    ///
    /// `CacheMode::WriteOnly` gives a "force refresh" service.
    pub fn with_mode(&self, mode: CacheMode) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            cache: Arc::clone(&self.cache),
            mode,
            per_page: self.per_page,
        }
    }

    pub fn cache_mode(&self) -> CacheMode {
        self.mode
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Drop the session's client and every cached entry it owns
    pub fn sign_out(&self, session: &SessionId) {
        self.registry.evict(session);
        self.lock_cache().invalidate_session(session.as_str());
    }

    /// List every repository accessible to the session's user
    ///
    /// Ordered most recently updated first, across all pages.
    pub async fn list_repositories(&self, session: &SessionId) -> Result<Vec<RepoOption>> {
        if let Some(repos) = self.cache_get::<Vec<RepoOption>>(session, REPOSITORIES_KEY) {
            debug!("Cache HIT for repositories of {}: {}", session, repos.len());
            return Ok(repos);
        }

        let client = self.registry.client(session)?;
        let result = fetch_all_repositories(client.as_ref(), self.per_page).await;
        let repos = self.check_auth(session, &client, result)?;

        debug!("Fetched {} repositories for {}", repos.len(), session);
        self.cache_set(session, REPOSITORIES_KEY, &repos);
        Ok(repos)
    }

    /// List a repository's deployments grouped by environment
    ///
    /// Every deployment carries its latest status (`"unknown"` if it has none)
    /// and the tag of the release matching its ref (empty if there is none).
    pub async fn list_deployments(
        &self,
        session: &SessionId,
        full_name: &str,
    ) -> Result<Vec<GroupedDeployment>> {
        let key = deployments_key(full_name);
        if let Some(grouped) = self.cache_get::<Vec<GroupedDeployment>>(session, &key) {
            debug!("Cache HIT for deployments of {}", full_name);
            return Ok(grouped);
        }

        let repo = RepoRef::parse(full_name)?;
        let client = self.registry.client(session)?;
        let result = fetch_all_deployments(client.as_ref(), repo, self.per_page).await;
        let deployments = self.check_auth(session, &client, result)?;

        debug!("Fetched {} deployments for {}", deployments.len(), full_name);
        let grouped = group_by_environment(deployments);
        self.cache_set(session, &key, &grouped);
        Ok(grouped)
    }

    /// List a repository's deployment environments
    pub async fn list_environments(
        &self,
        session: &SessionId,
        full_name: &str,
    ) -> Result<Vec<Environment>> {
        let key = environments_key(full_name);
        if let Some(environments) = self.cache_get::<Vec<Environment>>(session, &key) {
            debug!("Cache HIT for environments of {}", full_name);
            return Ok(environments);
        }

        let repo = RepoRef::parse(full_name)?;
        let client = self.registry.client(session)?;
        let result = client.fetch_environments(repo.owner, repo.repo).await;
        let environments = self.check_auth(session, &client, result)?;

        self.cache_set(session, &key, &environments);
        Ok(environments)
    }

    /// Evict the session on an auth failure, passing the result through
    ///
    /// Only the client that made the request is evicted; a client registered
    /// by a sign-in since then stays, along with the cache.
    fn check_auth<T>(
        &self,
        session: &SessionId,
        client: &Arc<dyn GitHubClient>,
        result: Result<T>,
    ) -> Result<T> {
        if result.as_ref().is_err_and(ClientError::is_auth_required) {
            warn!("Authentication failed for session {}", session);
            if self.registry.evict_client(session, client) {
                self.lock_cache().invalidate_session(session.as_str());
            } else {
                debug!("Session {} signed in again meanwhile, keeping it", session);
            }
        }
        result
    }

    fn lock_cache(&self) -> MutexGuard<'_, ApiCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cache_get<T: DeserializeOwned>(&self, session: &SessionId, key: &str) -> Option<T> {
        if !self.mode.should_read() {
            return None;
        }
        let value = self.lock_cache().get(session.as_str(), key);
        if value.is_none() {
            debug!("Cache MISS for {}:{}", session, key);
        }
        value
    }

    fn cache_set<T: Serialize>(&self, session: &SessionId, key: &str, value: &T) {
        if !self.mode.should_write() {
            return;
        }
        if let Err(e) = self.lock_cache().set(session.as_str(), key, value) {
            debug!("Failed to write to cache: {}", e);
        }
    }
}

/// Walk every repository page, preserving upstream order
async fn fetch_all_repositories(client: &dyn GitHubClient, per_page: u8) -> Result<Vec<RepoOption>> {
    let mut repos = Vec::new();
    let mut page = 1u32;

    loop {
        let chunk = client.fetch_repositories(page, per_page).await?;
        let has_next = chunk.has_next && !chunk.items.is_empty();
        repos.extend(chunk.items);

        if !has_next {
            break;
        }
        page += 1;
    }

    Ok(repos)
}

/// Walk every deployment page, resolving each page's deployments concurrently
async fn fetch_all_deployments(
    client: &dyn GitHubClient,
    repo: RepoRef<'_>,
    per_page: u8,
) -> Result<Vec<Deployment>> {
    let mut deployments = Vec::new();
    let mut page = 1u32;

    loop {
        let chunk = client
            .fetch_deployments(repo.owner, repo.repo, page, per_page)
            .await?;
        let has_next = chunk.has_next && !chunk.items.is_empty();

        let resolved = try_join_all(
            chunk
                .items
                .into_iter()
                .map(|record| resolve_deployment(client, repo, record)),
        )
        .await?;
        deployments.extend(resolved);

        if !has_next {
            break;
        }
        page += 1;
    }

    Ok(deployments)
}

/// Resolve latest status and release tag of one deployment
///
/// Both lookups run concurrently. A failed status lookup fails the
/// deployment; a failed release lookup means the ref has no release.
async fn resolve_deployment(
    client: &dyn GitHubClient,
    repo: RepoRef<'_>,
    record: DeploymentRecord,
) -> Result<Deployment> {
    let (statuses, release) = tokio::join!(
        client.fetch_deployment_statuses(repo.owner, repo.repo, record.id),
        client.fetch_release_tag(repo.owner, repo.repo, &record.git_ref),
    );

    let status = latest_status(&statuses?);
    let release_tag = release.unwrap_or_else(|e| {
        debug!(
            "No release for ref {} in {}/{}: {}",
            record.git_ref, repo.owner, repo.repo, e
        );
        String::new()
    });

    Ok(Deployment::from_record(record, status, release_tag))
}
