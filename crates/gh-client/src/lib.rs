//! GitHub deployments client with session registry and caching
//!
//! This crate provides a trait-based GitHub API client and the data
//! orchestration the deployment dashboard is built on: a per-session client
//! registry, a per-session TTL cache, pagination traversal and concurrent
//! resolution of per-deployment sub-resources.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                DashboardService                  │
//! │  - list_repositories()                           │
//! │  - list_deployments()                            │
//! │  - list_environments()                           │
//! └─────────────────────────────────────────────────┘
//!          │                 │                │
//!          ▼                 ▼                ▼
//! ┌────────────────┐ ┌──────────────┐ ┌──────────────┐
//! │ ClientRegistry │ │   ApiCache   │ │  aggregate   │
//! │ session→client │ │ session, key │ │ group / sort │
//! └────────────────┘ └──────────────┘ └──────────────┘
//!          │
//!          ▼
//! ┌─────────────────────────────────────────────────┐
//! │   GitHubClient trait  ◄──  OctocrabClient        │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use gh_client::{ApiCache, ClientRegistry, DashboardService, SessionId};
//! use std::sync::{Arc, Mutex};
//!
//! # async fn example() -> Result<(), gh_client::ClientError> {
//! let registry = Arc::new(ClientRegistry::default());
//! let cache = Arc::new(Mutex::new(ApiCache::default()));
//! let service = DashboardService::new(Arc::clone(&registry), cache);
//!
//! let session = SessionId::new("tab-1");
//! registry.initialize(&session, "ghp_token")?;
//!
//! for group in service.list_deployments(&session, "acme/widgets").await? {
//!     println!("{}: {} deployments", group.environment, group.deployments.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod client;
pub mod client_manager;
pub mod error;
pub mod octocrab_client;
pub mod service;
pub mod types;

pub use gh_deploy_config::DEFAULT_HOST;

pub use client::{CacheMode, GitHubClient};
pub use client_manager::{ClientRegistry, TokenResolver};
pub use error::ClientError;
pub use octocrab_client::OctocrabClient;
pub use service::DashboardService;
pub use types::{
    Creator, Deployment, DeploymentRecord, DeploymentStatus, Environment, GroupedDeployment,
    Paged, RepoOption, RepoRef, SessionId, UNKNOWN_STATUS,
};

// Re-export cache types for convenience
pub use gh_api_cache::ApiCache;
