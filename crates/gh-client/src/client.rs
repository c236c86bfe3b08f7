//! GitHub client trait and cache mode definitions
//!
//! This module defines the core `GitHubClient` trait that all client
//! implementations must satisfy, as well as the `CacheMode` enum for
//! controlling caching behavior of the dashboard service.

use crate::error::Result;
use crate::types::{DeploymentRecord, DeploymentStatus, Environment, Paged, RepoOption};
use async_trait::async_trait;

/// Cache behavior mode for the dashboard service
///
/// Controls how the service interacts with the cache layer.
/// This is set at construction time, not per-request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// No caching - neither read nor write
    None,

    /// Write-only - skip cache reads, but write responses to cache
    /// Use for "force refresh" to get fresh data while populating cache
    WriteOnly,

    /// Read-only - read from cache, but don't update it
    ReadOnly,

    /// Full caching - read from cache, write to cache
    /// Default behavior for normal operations
    #[default]
    ReadWrite,
}

impl CacheMode {
    /// Should we attempt to read from cache before making API calls?
    pub fn should_read(&self) -> bool {
        matches!(self, CacheMode::ReadOnly | CacheMode::ReadWrite)
    }

    /// Should we write API responses to cache?
    pub fn should_write(&self) -> bool {
        matches!(self, CacheMode::WriteOnly | CacheMode::ReadWrite)
    }
}

/// GitHub API client trait
///
/// Exposes the raw upstream calls the dashboard needs, one request per
/// method. Pagination, caching, fan-out and grouping live in
/// [`DashboardService`](crate::DashboardService) on top of this trait.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow sharing across
/// async tasks and threads.
#[async_trait]
pub trait GitHubClient: Send + Sync {
    /// Fetch one page of repositories accessible to the authenticated user,
    /// most recently updated first
    ///
    /// # Arguments
    ///
    /// * `page` - 1-based page number
    /// * `per_page` - Page size (max 100)
    async fn fetch_repositories(&self, page: u32, per_page: u8) -> Result<Paged<RepoOption>>;

    /// Fetch one page of deployments for a repository
    ///
    /// # Arguments
    ///
    /// * `owner` - Repository owner (user or organization)
    /// * `repo` - Repository name
    /// * `page` - 1-based page number
    /// * `per_page` - Page size (max 100)
    async fn fetch_deployments(
        &self,
        owner: &str,
        repo: &str,
        page: u32,
        per_page: u8,
    ) -> Result<Paged<DeploymentRecord>>;

    /// Fetch the status history of a deployment
    ///
    /// Entries are returned in API order (newest first on github.com).
    async fn fetch_deployment_statuses(
        &self,
        owner: &str,
        repo: &str,
        deployment_id: u64,
    ) -> Result<Vec<DeploymentStatus>>;

    /// Fetch the release whose tag equals `tag` and return its tag name
    ///
    /// Fails when no such release exists; callers are expected to treat
    /// that as "no release" rather than an error.
    async fn fetch_release_tag(&self, owner: &str, repo: &str, tag: &str) -> Result<String>;

    /// Fetch the deployment environments of a repository
    ///
    /// A response without an environments list yields an empty vector.
    async fn fetch_environments(&self, owner: &str, repo: &str) -> Result<Vec<Environment>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_mode_default() {
        assert_eq!(CacheMode::default(), CacheMode::ReadWrite);
    }

    #[test]
    fn test_cache_mode_should_read() {
        assert!(!CacheMode::None.should_read());
        assert!(!CacheMode::WriteOnly.should_read());
        assert!(CacheMode::ReadOnly.should_read());
        assert!(CacheMode::ReadWrite.should_read());
    }

    #[test]
    fn test_cache_mode_should_write() {
        assert!(!CacheMode::None.should_write());
        assert!(CacheMode::WriteOnly.should_write());
        assert!(!CacheMode::ReadOnly.should_write());
        assert!(CacheMode::ReadWrite.should_write());
    }
}
