//! Terminal dashboard for GitHub deployments and environments
//!
//! The [`DashboardController`] signs a session in, restores the repositories
//! it last selected and keeps a [`DashboardState`] with the grouped
//! deployments and environments of each selected repository.

pub mod controller;
pub mod logger;
pub mod render;
pub mod state;

pub use controller::{DashboardController, RefreshOutcome};
pub use state::{DashboardState, RepositoryDashboard};
