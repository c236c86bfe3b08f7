//! Deployment status resolution and environment grouping

use crate::types::{Deployment, DeploymentStatus, GroupedDeployment, UNKNOWN_STATUS};
use std::collections::HashMap;

/// State of the most recent status entry, `"unknown"` when there is none
///
/// The entry with the greatest `created_at` wins; on equal timestamps the
/// earlier listed entry is kept, matching the API's newest-first order.
pub fn latest_status(statuses: &[DeploymentStatus]) -> String {
    statuses
        .iter()
        .reduce(|latest, s| {
            if s.created_at > latest.created_at {
                s
            } else {
                latest
            }
        })
        .map(|s| s.state.clone())
        .unwrap_or_else(|| UNKNOWN_STATUS.to_string())
}

/// Group deployments by environment, newest first within each group
///
/// Groups appear in the order their environment is first seen. The sort is
/// stable, so deployments created at the same instant keep their input order.
pub fn group_by_environment(deployments: Vec<Deployment>) -> Vec<GroupedDeployment> {
    let mut groups: Vec<GroupedDeployment> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for deployment in deployments {
        match index.get(&deployment.environment) {
            Some(&i) => groups[i].deployments.push(deployment),
            None => {
                index.insert(deployment.environment.clone(), groups.len());
                groups.push(GroupedDeployment {
                    environment: deployment.environment.clone(),
                    deployments: vec![deployment],
                });
            }
        }
    }

    for group in &mut groups {
        group
            .deployments
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn status(state: &str, secs: i64) -> DeploymentStatus {
        DeploymentStatus {
            state: state.to_string(),
            created_at: at(secs),
        }
    }

    fn deployment(id: u64, environment: &str, secs: i64) -> Deployment {
        Deployment {
            id,
            sha: format!("sha{}", id),
            git_ref: "main".to_string(),
            task: "deploy".to_string(),
            environment: environment.to_string(),
            description: String::new(),
            creator: None,
            created_at: at(secs),
            updated_at: at(secs),
            status: "success".to_string(),
            release_tag: String::new(),
        }
    }

    fn ids(group: &GroupedDeployment) -> Vec<u64> {
        group.deployments.iter().map(|d| d.id).collect()
    }

    #[test]
    fn test_latest_status_defaults_to_unknown() {
        assert_eq!(latest_status(&[]), "unknown");
    }

    #[test]
    fn test_latest_status_picks_newest_entry() {
        let statuses = vec![
            status("in_progress", 10),
            status("success", 30),
            status("queued", 0),
        ];
        assert_eq!(latest_status(&statuses), "success");
    }

    #[test]
    fn test_latest_status_tie_keeps_first_listed() {
        let statuses = vec![status("failure", 10), status("success", 10)];
        assert_eq!(latest_status(&statuses), "failure");
    }

    #[test]
    fn test_group_sorts_newest_first() {
        let groups = group_by_environment(vec![
            deployment(1, "prod", 10),
            deployment(2, "prod", 20),
        ]);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].environment, "prod");
        assert_eq!(ids(&groups[0]), vec![2, 1]);
    }

    #[test]
    fn test_groups_keep_first_appearance_order() {
        let groups = group_by_environment(vec![
            deployment(1, "staging", 5),
            deployment(2, "prod", 50),
            deployment(3, "staging", 40),
            deployment(4, "preview", 1),
            deployment(5, "prod", 60),
        ]);

        let environments: Vec<&str> = groups.iter().map(|g| g.environment.as_str()).collect();
        assert_eq!(environments, vec!["staging", "prod", "preview"]);
        assert_eq!(ids(&groups[0]), vec![3, 1]);
        assert_eq!(ids(&groups[1]), vec![5, 2]);
        assert_eq!(ids(&groups[2]), vec![4]);
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let input = vec![
            deployment(7, "prod", 10),
            deployment(3, "prod", 10),
            deployment(9, "prod", 20),
            deployment(1, "prod", 10),
        ];

        let first = group_by_environment(input.clone());
        let second = group_by_environment(input);

        assert_eq!(ids(&first[0]), vec![9, 7, 3, 1]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_groups_are_non_increasing() {
        let groups = group_by_environment(
            (0..20)
                .map(|i| deployment(i, if i % 3 == 0 { "a" } else { "b" }, (i as i64 * 7) % 11))
                .collect(),
        );

        for group in groups {
            assert!(group
                .deployments
                .windows(2)
                .all(|w| w[0].created_at >= w[1].created_at));
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(group_by_environment(Vec::new()).is_empty());
    }
}
