//! Octocrab-based GitHub API client
//!
//! Direct implementation of the `GitHubClient` trait using the octocrab library.
//! This client makes real API calls without any caching.

use crate::client::GitHubClient;
use crate::error::Result;
use crate::types::{DeploymentRecord, DeploymentStatus, Environment, Paged, RepoOption};
use crate::DEFAULT_HOST;
use async_trait::async_trait;
use log::debug;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Direct GitHub API client using octocrab
///
/// Deployments, statuses and environments are fetched through raw routes
/// and deserialized into this crate's types; octocrab handles auth headers,
/// error mapping and `Link` header pagination.
#[derive(Debug, Clone)]
pub struct OctocrabClient {
    octocrab: Arc<Octocrab>,
}

impl OctocrabClient {
    /// Create a new client with the given octocrab instance
    pub fn new(octocrab: Arc<Octocrab>) -> Self {
        Self { octocrab }
    }

    /// Build a client authenticated with a bearer token
    ///
    /// A host other than github.com is treated as GitHub Enterprise and
    /// addressed at `https://{host}/api/v3`.
    pub fn with_token(token: &str, host: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());

        if let Some(h) = host.filter(|h| !h.is_empty() && *h != DEFAULT_HOST) {
            let uri = format!("https://{}/api/v3", h);
            builder = builder.base_uri(&uri)?;
        }

        Ok(Self::new(Arc::new(builder.build()?)))
    }
}

/// Query parameters for paginated listings
#[derive(Debug, Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    name: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    owner: Option<RawOwner>,
}

#[derive(Debug, Deserialize)]
struct RawOwner {
    login: String,
    #[serde(rename = "type", default)]
    kind: String,
}

/// Page size for the environments listing (the API maximum)
const ENVIRONMENTS_PER_PAGE: u8 = 100;

#[derive(Debug, Deserialize)]
struct RawEnvironments {
    #[serde(default)]
    total_count: Option<u64>,
    #[serde(default)]
    environments: Option<Vec<Environment>>,
}

#[async_trait]
impl GitHubClient for OctocrabClient {
    async fn fetch_repositories(&self, page: u32, per_page: u8) -> Result<Paged<RepoOption>> {
        debug!("Fetching repositories page {}", page);

        let params = PageParams {
            per_page,
            page,
            sort: Some("updated"),
        };
        let response: octocrab::Page<RawRepository> =
            self.octocrab.get("/user/repos", Some(&params)).await?;

        Ok(Paged {
            has_next: response.next.is_some(),
            items: response.items.into_iter().map(convert_repository).collect(),
        })
    }

    async fn fetch_deployments(
        &self,
        owner: &str,
        repo: &str,
        page: u32,
        per_page: u8,
    ) -> Result<Paged<DeploymentRecord>> {
        debug!("Fetching deployments for {}/{} page {}", owner, repo, page);

        let route = format!("/repos/{}/{}/deployments", owner, repo);
        let params = PageParams {
            per_page,
            page,
            sort: None,
        };
        let response: octocrab::Page<DeploymentRecord> =
            self.octocrab.get(route, Some(&params)).await?;

        Ok(Paged {
            has_next: response.next.is_some(),
            items: response.items,
        })
    }

    async fn fetch_deployment_statuses(
        &self,
        owner: &str,
        repo: &str,
        deployment_id: u64,
    ) -> Result<Vec<DeploymentStatus>> {
        debug!(
            "Fetching statuses for deployment {} in {}/{}",
            deployment_id, owner, repo
        );

        let route = format!(
            "/repos/{}/{}/deployments/{}/statuses",
            owner, repo, deployment_id
        );
        let statuses: Vec<DeploymentStatus> = self.octocrab.get(route, None::<&()>).await?;
        Ok(statuses)
    }

    async fn fetch_release_tag(&self, owner: &str, repo: &str, tag: &str) -> Result<String> {
        let release = self
            .octocrab
            .repos(owner, repo)
            .releases()
            .get_by_tag(tag)
            .await?;
        Ok(release.tag_name)
    }

    async fn fetch_environments(&self, owner: &str, repo: &str) -> Result<Vec<Environment>> {
        debug!("Fetching environments for {}/{}", owner, repo);

        let route = format!("/repos/{}/{}/environments", owner, repo);
        let mut environments = Vec::new();
        let mut page = 1u32;

        loop {
            let params = PageParams {
                per_page: ENVIRONMENTS_PER_PAGE,
                page,
                sort: None,
            };
            let response: RawEnvironments = self.octocrab.get(&route, Some(&params)).await?;
            let chunk = response.environments.unwrap_or_default();
            let chunk_len = chunk.len();
            environments.extend(chunk);

            if !has_more_environments(environments.len(), response.total_count, chunk_len) {
                break;
            }
            page += 1;
        }

        Ok(environments)
    }
}

/// Whether another environments page exists after one of `page_len` entries
///
/// The listing reports `total_count` instead of a `Link` header.
fn has_more_environments(fetched: usize, total_count: Option<u64>, page_len: usize) -> bool {
    page_len == ENVIRONMENTS_PER_PAGE as usize
        && total_count.is_some_and(|total| (fetched as u64) < total)
}

/// Convert a raw repository listing entry to a selectable option
fn convert_repository(repo: RawRepository) -> RepoOption {
    let (owner, is_organization) = repo
        .owner
        .map(|o| (o.login, o.kind == "Organization"))
        .unwrap_or_default();

    let full_name = repo
        .full_name
        .unwrap_or_else(|| format!("{}/{}", owner, repo.name));

    RepoOption::new(full_name, owner, is_organization)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_organization_repository() {
        let raw: RawRepository = serde_json::from_str(
            r#"{
                "name": "widgets",
                "full_name": "acme/widgets",
                "owner": {"login": "acme", "type": "Organization"}
            }"#,
        )
        .unwrap();

        let repo = convert_repository(raw);
        assert_eq!(repo.full_name, "acme/widgets");
        assert_eq!(repo.label, "acme/widgets");
        assert_eq!(repo.owner, "acme");
        assert!(repo.is_organization);
    }

    #[test]
    fn test_convert_user_repository_without_full_name() {
        let raw: RawRepository = serde_json::from_str(
            r#"{"name": "dotfiles", "owner": {"login": "octocat", "type": "User"}}"#,
        )
        .unwrap();

        let repo = convert_repository(raw);
        assert_eq!(repo.full_name, "octocat/dotfiles");
        assert!(!repo.is_organization);
    }

    #[test]
    fn test_environments_field_absent_is_empty() {
        let raw: RawEnvironments = serde_json::from_str(r#"{"total_count": 0}"#).unwrap();
        assert!(raw.environments.unwrap_or_default().is_empty());

        let raw: RawEnvironments = serde_json::from_str(
            r#"{"total_count": 1, "environments": [{"id": 5, "name": "production", "url": "x"}]}"#,
        )
        .unwrap();
        assert_eq!(
            raw.environments.unwrap(),
            vec![Environment {
                id: 5,
                name: "production".to_string()
            }]
        );
    }

    #[test]
    fn test_environments_paging_follows_total_count() {
        assert!(has_more_environments(100, Some(150), 100));
        assert!(!has_more_environments(150, Some(150), 50));
        assert!(!has_more_environments(100, Some(100), 100));
        // Without a count, a single page is all there is
        assert!(!has_more_environments(100, None, 100));
        assert!(!has_more_environments(0, Some(3), 0));
    }

    #[test]
    fn test_page_params_query() {
        let params = PageParams {
            per_page: 100,
            page: 2,
            sort: Some("updated"),
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["per_page"], 100);
        assert_eq!(json["page"], 2);
        assert_eq!(json["sort"], "updated");

        let params = PageParams {
            per_page: 30,
            page: 1,
            sort: None,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert!(json.get("sort").is_none());
    }

    #[tokio::test]
    async fn test_with_token_builds_enterprise_client() {
        assert!(OctocrabClient::with_token("token", None).is_ok());
        assert!(OctocrabClient::with_token("token", Some("ghe.example.com")).is_ok());
    }
}
