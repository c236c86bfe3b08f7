//! Plain-text rendering of the dashboard state

use crate::state::{DashboardState, RepositoryDashboard};
use gh_client::Deployment;
use std::fmt;

const SHORT_SHA_LEN: usize = 7;

/// Render the dashboard, optionally preceded by the repository list
pub fn render(state: &DashboardState, with_repositories: bool) -> String {
    DashboardView {
        state,
        with_repositories,
    }
    .to_string()
}

/// Text view over a dashboard state
pub struct DashboardView<'a> {
    pub state: &'a DashboardState,
    pub with_repositories: bool,
}

impl fmt::Display for DashboardView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state;

        if state.auth_required {
            return writeln!(f, "Authentication required: sign in again to continue.");
        }

        if self.with_repositories {
            writeln!(f, "Repositories ({}):", state.repositories.len())?;
            for repo in &state.repositories {
                let kind = if repo.is_organization { "org" } else { "user" };
                let marker = if state.selected.contains(&repo.full_name) {
                    "*"
                } else {
                    " "
                };
                writeln!(f, " {} {} ({})", marker, repo.label, kind)?;
            }
            writeln!(f)?;
        }

        if state.dashboards.is_empty() {
            return writeln!(f, "No repositories selected.");
        }

        for dashboard in &state.dashboards {
            write_repository(f, dashboard)?;
        }
        Ok(())
    }
}

fn write_repository(f: &mut fmt::Formatter<'_>, dashboard: &RepositoryDashboard) -> fmt::Result {
    writeln!(f, "{}", dashboard.full_name)?;

    if !dashboard.environments.is_empty() {
        let names: Vec<&str> = dashboard
            .environments
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        writeln!(f, "  environments: {}", names.join(", "))?;
    }

    if dashboard.deployments.is_empty() {
        writeln!(f, "  no deployments")?;
    }

    for group in &dashboard.deployments {
        writeln!(f, "  [{}]", group.environment)?;
        for deployment in &group.deployments {
            writeln!(f, "    {}", deployment_line(deployment))?;
        }
    }
    writeln!(f)
}

fn deployment_line(deployment: &Deployment) -> String {
    let sha: String = deployment.sha.chars().take(SHORT_SHA_LEN).collect();
    let release = if deployment.release_tag.is_empty() {
        "-"
    } else {
        deployment.release_tag.as_str()
    };
    let creator = deployment
        .creator
        .as_ref()
        .map(|c| c.login.as_str())
        .unwrap_or("-");

    format!(
        "#{:<8} {:<12} {:<12} {:<8} {} {} {}",
        deployment.id,
        deployment.status,
        deployment.git_ref,
        sha,
        release,
        deployment.created_at.format("%Y-%m-%d %H:%M"),
        creator
    )
}
