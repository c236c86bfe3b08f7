//! Dashboard state
//!
//! The state is only ever replaced as a whole by a completed refresh, so a
//! reader never sees a mix of old and new repository data.

use gh_client::{Environment, GroupedDeployment, RepoOption};
use serde::Serialize;

/// Deployments and environments of one selected repository
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryDashboard {
    pub full_name: String,
    pub deployments: Vec<GroupedDeployment>,
    pub environments: Vec<Environment>,
}

impl RepositoryDashboard {
    /// Total number of deployments across all environments
    pub fn deployment_count(&self) -> usize {
        self.deployments.iter().map(|g| g.deployments.len()).sum()
    }
}

/// Everything the dashboard displays for a session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    /// Repositories the user can choose from
    pub repositories: Vec<RepoOption>,
    /// Full names of the repositories shown in `dashboards`
    pub selected: Vec<String>,
    /// One entry per selected repository, in selection order
    pub dashboards: Vec<RepositoryDashboard>,
    /// Generation of the refresh that produced `dashboards` (0 = none yet)
    pub generation: u64,
    /// Set when the token was rejected and the user must sign in again
    pub auth_required: bool,
}

impl DashboardState {
    pub fn dashboard(&self, full_name: &str) -> Option<&RepositoryDashboard> {
        self.dashboards.iter().find(|d| d.full_name == full_name)
    }

    /// Whether `full_name` is among the listed repositories
    pub fn knows_repository(&self, full_name: &str) -> bool {
        self.repositories.iter().any(|r| r.full_name == full_name)
    }
}
