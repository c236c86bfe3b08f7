//! GitHub API data transfer objects
//!
//! These types represent what the dashboard needs from the GitHub API:
//! repositories the user can pick, deployments with their resolved status
//! and release tag, and deployment environments. They are intentionally
//! separate from octocrab's models so the aggregation logic can be tested
//! against any `GitHubClient` implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ClientError, Result};

/// Status reported for deployments without any status entries
pub const UNKNOWN_STATUS: &str = "unknown";

/// Opaque identifier for one authenticated dashboard session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Owner and name parsed from a `owner/name` full name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoRef<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
}

impl<'a> RepoRef<'a> {
    /// Split a full name on its first `/`
    ///
    /// Both halves must be non-empty and the name part must not contain
    /// another `/`.
    pub fn parse(full_name: &'a str) -> Result<Self> {
        match full_name.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self { owner, repo })
            }
            _ => Err(ClientError::InvalidRepository(full_name.to_string())),
        }
    }
}

/// A repository the user can select on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoOption {
    /// Full repository name (`owner/name`)
    pub full_name: String,
    /// Display label
    pub label: String,
    /// Owner login
    pub owner: String,
    /// Whether the owner is an organization (as opposed to a user)
    pub is_organization: bool,
}

impl RepoOption {
    pub fn new(full_name: impl Into<String>, owner: impl Into<String>, is_organization: bool) -> Self {
        let full_name = full_name.into();
        Self {
            label: full_name.clone(),
            full_name,
            owner: owner.into(),
            is_organization,
        }
    }
}

/// User that created a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub login: String,
    pub avatar_url: String,
}

/// A deployment as listed by the API, before status and release resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: u64,
    pub sha: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub task: String,
    pub environment: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub creator: Option<Creator>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single entry of a deployment's status history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentStatus {
    /// Lifecycle state, e.g. "success", "failure", "pending"
    pub state: String,
    pub created_at: DateTime<Utc>,
}

/// A deployment with its latest status and matching release tag resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: u64,
    pub sha: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub task: String,
    pub environment: String,
    pub description: String,
    pub creator: Option<Creator>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Most recent status state, `"unknown"` when there is none
    pub status: String,
    /// Tag of the release matching `git_ref`, empty when none exists
    pub release_tag: String,
}

impl Deployment {
    pub fn from_record(record: DeploymentRecord, status: String, release_tag: String) -> Self {
        Self {
            id: record.id,
            sha: record.sha,
            git_ref: record.git_ref,
            task: record.task,
            environment: record.environment,
            description: record.description.unwrap_or_default(),
            creator: record.creator,
            created_at: record.created_at,
            updated_at: record.updated_at,
            status,
            release_tag,
        }
    }
}

/// Deployments of one environment, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedDeployment {
    pub environment: String,
    pub deployments: Vec<Deployment>,
}

/// A named deployment environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub id: u64,
    pub name: String,
}

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    /// Whether the API reported a following page
    pub has_next: bool,
}

impl<T> Paged<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            has_next: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_ref_parse() {
        let r = RepoRef::parse("acme/widgets").unwrap();
        assert_eq!(r.owner, "acme");
        assert_eq!(r.repo, "widgets");
    }

    #[test]
    fn test_repo_ref_rejects_malformed_names() {
        for name in ["widgets", "/widgets", "acme/", "acme/widgets/extra", ""] {
            assert_eq!(
                RepoRef::parse(name),
                Err(ClientError::InvalidRepository(name.to_string())),
                "'{}' should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_repo_option_label_defaults_to_full_name() {
        let repo = RepoOption::new("acme/widgets", "acme", true);
        assert_eq!(repo.label, "acme/widgets");
        assert!(repo.is_organization);
    }

    #[test]
    fn test_deployment_record_deserializes_api_shape() {
        let json = r#"{
            "id": 7,
            "sha": "a84d88e",
            "ref": "v1.2.0",
            "task": "deploy",
            "environment": "production",
            "description": null,
            "creator": {"login": "octocat", "avatar_url": "https://example.com/a.png"},
            "created_at": "2024-01-01T10:00:00Z",
            "updated_at": "2024-01-01T10:05:00Z",
            "payload": {}
        }"#;
        let record: DeploymentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.git_ref, "v1.2.0");
        assert_eq!(record.creator.as_ref().unwrap().login, "octocat");

        let deployment =
            Deployment::from_record(record, "success".to_string(), String::new());
        assert_eq!(deployment.description, "");
        assert_eq!(deployment.release_tag, "");
    }

    #[test]
    fn test_deployment_serializes_camel_case() {
        let record = DeploymentRecord {
            id: 1,
            sha: "abc".to_string(),
            git_ref: "main".to_string(),
            task: "deploy".to_string(),
            environment: "prod".to_string(),
            description: Some("first".to_string()),
            creator: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let deployment = Deployment::from_record(record, UNKNOWN_STATUS.to_string(), "v1".to_string());
        let json = serde_json::to_value(&deployment).unwrap();

        assert_eq!(json["releaseTag"], "v1");
        assert_eq!(json["ref"], "main");
        assert_eq!(json["status"], "unknown");
        assert!(json.get("createdAt").is_some());
    }
}
