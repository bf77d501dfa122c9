// Wait-for-jobs init container driven by kubernetes-entrypoint.

use crate::Result;
use k8s_openapi::api::core::v1::{Container, EnvVar};
use serde::{Deserialize, Serialize};

pub const ENTRYPOINT_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin:/";

/// A Job the init container blocks on, as read by kubernetes-entrypoint.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct DependencyJob {
    pub namespace: String,
    pub name: String,
}

impl DependencyJob {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

/// Value of `DEPENDENCY_JOBS_JSON` for the given jobs.
pub fn dependency_jobs_json(jobs: &[DependencyJob]) -> Result<String> {
    Ok(serde_json::to_string(jobs)?)
}

/// The `init` container that holds the pod until every job in `jobs` has completed.
pub fn wait_for_jobs(image: String, jobs: &[DependencyJob]) -> Result<Container> {
    Ok(Container {
        name: "init".to_string(),
        image: Some(image),
        image_pull_policy: Some("IfNotPresent".to_string()),
        env: Some(vec![
            EnvVar {
                name: "PATH".to_string(),
                value: Some(ENTRYPOINT_PATH.to_string()),
                ..Default::default()
            },
            EnvVar {
                name: "DEPENDENCY_JOBS_JSON".to_string(),
                value: Some(dependency_jobs_json(jobs)?),
                ..Default::default()
            },
            EnvVar {
                name: "COMMAND".to_string(),
                value: Some("echo done".to_string()),
                ..Default::default()
            },
        ]),
        command: Some(vec!["kubernetes-entrypoint".to_string()]),
        ..Default::default()
    })
}
