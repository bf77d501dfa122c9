use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tokio::time::error::Elapsed;

pub mod builder;
pub mod config_maps;
pub mod dependencies;
pub mod deployments;
pub mod images;
pub mod jobs;
pub mod payloads;
pub mod pod;
pub mod services;
pub mod stack;

pub use builder::Builder;
pub use stack::Stack;

pub const LABEL_APP: &str = "app";
pub const LABEL_IRONIC_CR: &str = "ironic_cr";
pub const LABEL_COMPONENT: &str = "component";
pub const NODE_SELECTOR_CONTROL_PLANE: &str = "ironic-control-plane";

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("couldn't load bundled file {file}: {source}")]
    ResourceLoadError {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("dependency not found: {0}")]
    DependencyNotFoundError(String),
    #[error("invalid configuration: {0}")]
    ConfigurationError(String),
    #[error("k8s error: {0}")]
    KubeError(#[source] kube::Error),
    #[error("json error: {0}")]
    SerdeJsonError(#[source] serde_json::Error),
    #[error("yaml error: {0}")]
    SerdeYamlError(#[source] serde_yaml::Error),
    #[error("timeout waiting for the API server: {0}")]
    Timeout(#[source] Elapsed),
}

impl From<kube::Error> for Error {
    fn from(v: kube::Error) -> Self {
        Error::KubeError(v)
    }
}

impl From<serde_json::Error> for Error {
    fn from(v: serde_json::Error) -> Self {
        Error::SerdeJsonError(v)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(v: serde_yaml::Error) -> Self {
        Error::SerdeYamlError(v)
    }
}

impl From<Elapsed> for Error {
    fn from(v: Elapsed) -> Self {
        Error::Timeout(v)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct IronicConfig {
    pub enabled: bool,
    /// Name of the conductor Deployment.
    pub name: String,
    /// Name of the NodePort Service in front of the ironic API.
    pub service: String,
    /// Value of the `ironic_cr` label carried by the Jobs and selected by the API Service.
    pub instance: String,
}

impl Default for IronicConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "openstack-ironic".to_string(),
            service: "ironic-api".to_string(),
            instance: "openstack-ironic".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct DhcpConfig {
    pub enabled: bool,
}

impl Default for DhcpConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct DbInitConfig {
    /// Jobs (in the target namespace) the db-init Job waits on before running.
    pub dependencies: Vec<String>,
}

/// Names of every object the builders create or reference.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ResourceNames {
    pub ironic_bin: String,
    pub ironic_etc: String,
    pub dhcp_bin: String,
    pub dhcp_etc: String,
    pub dhcp_server: String,
    pub db_init_job: String,
    pub db_sync_job: String,
    pub db_user_secret: String,
    pub root_db_secret: String,
    pub pxe_settings: String,
    pub dhcp_settings: String,
}

impl Default for ResourceNames {
    fn default() -> Self {
        Self {
            ironic_bin: "ironic-bin".to_string(),
            ironic_etc: "ironic-etc".to_string(),
            dhcp_bin: "dhcp-bin".to_string(),
            dhcp_etc: "dhcp-etc".to_string(),
            dhcp_server: "dhcp-server".to_string(),
            db_init_job: "ironic-db-init".to_string(),
            db_sync_job: "ironic-db-sync".to_string(),
            db_user_secret: "ironic-db-user".to_string(),
            root_db_secret: "mysql-root-credentials".to_string(),
            pxe_settings: "pxe-settings".to_string(),
            dhcp_settings: "dhcp-settings".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Config {
    pub ironic: IronicConfig,
    pub dhcp: DhcpConfig,
    pub db_init: DbInitConfig,
    pub names: ResourceNames,
    /// Container images keyed by component, e.g. `IRONIC_CONDUCTOR`.
    pub images: BTreeMap<String, String>,
    /// Load payloads from this directory instead of the copies compiled into the binary.
    pub files_dir: Option<PathBuf>,
    /// Bound on reading the database Secret; `0` disables it.
    pub secret_timeout_seconds: u64,
    pub field_manager: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ironic: IronicConfig::default(),
            dhcp: DhcpConfig::default(),
            db_init: DbInitConfig::default(),
            names: ResourceNames::default(),
            images: BTreeMap::new(),
            files_dir: None,
            secret_timeout_seconds: 15,
            field_manager: "ironic-stack".to_string(),
        }
    }
}
