use crate::payloads::{self, Payloads};
use crate::{Builder, Error, Result};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const MYSQL_CONNECTION_PLACEHOLDER: &str = "##MYSQL_CONNECTION##";

// ConfigMap key, bundled file
const IRONIC_BIN: &[(&str, &str)] = &[
    ("db-init.py", payloads::DB_INIT),
    ("db-sync.sh", payloads::DB_SYNC),
    ("ironic-standalone.sh", payloads::IRONIC_STANDALONE),
    ("ironic-conductor-init.sh", payloads::IRONIC_CONDUCTOR_INIT),
    ("ironic-conductor-pxe.sh", payloads::IRONIC_CONDUCTOR_PXE),
    ("ironic-conductor-pxe-init.sh", payloads::IRONIC_CONDUCTOR_PXE_INIT),
    ("ironic-conductor-http.sh", payloads::IRONIC_CONDUCTOR_HTTP),
];

const IRONIC_ETC: &[(&str, &str)] = &[
    ("ironic.conf", payloads::IRONIC_CONF),
    ("policy.json", payloads::POLICY_JSON),
    ("tftp-map-file", payloads::TFTP_MAP),
    ("nginx.conf", payloads::NGINX_CONF),
];

const DHCP_BIN: &[(&str, &str)] = &[
    ("dhcp-server-init.sh", payloads::DHCP_SERVER_INIT),
    ("dhcp-server.sh", payloads::DHCP_SERVER),
];

const DHCP_ETC: &[(&str, &str)] = &[("dhcp-config", payloads::DHCP_CONF)];

fn load_all(payloads: &Payloads, files: &[(&str, &str)]) -> Result<BTreeMap<String, String>> {
    files
        .iter()
        .map(|(key, file)| -> Result<(String, String)> {
            Ok((key.to_string(), payloads.load(file)?))
        })
        .collect()
}

fn secret_value(secret: &Secret, key: &str) -> Result<String> {
    let name = secret.metadata.name.as_deref().unwrap_or_default();
    let value = secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .ok_or_else(|| Error::DependencyNotFoundError(format!("secret {} has no key {}", name, key)))?;
    String::from_utf8(value.0.clone()).map_err(|_| {
        Error::ConfigurationError(format!("secret {} key {} is not valid UTF-8", name, key))
    })
}

/// SQLAlchemy URL for the database described by an `ironic-db-user` style Secret.
pub fn mysql_connection(secret: &Secret) -> Result<String> {
    Ok(format!(
        "mysql+pymysql://{}:{}@{}:3306/{}?charset=utf8mb4",
        secret_value(secret, "DB_USER")?,
        secret_value(secret, "DB_PASSWORD")?,
        secret_value(secret, "DB_HOST")?,
        secret_value(secret, "DB_DATABASE")?,
    ))
}

impl Builder {
    /// Scripts run by the ironic conductor pod and the database Jobs.
    pub fn ironic_bin_config_map(&self) -> Result<ConfigMap> {
        debug!("building ConfigMap {}", self.names.ironic_bin);
        Ok(ConfigMap {
            metadata: self.metadata(&self.names.ironic_bin),
            data: Some(load_all(&self.payloads, IRONIC_BIN)?),
            ..Default::default()
        })
    }

    /// Fetches the database user Secret and renders the ironic configuration from it.
    pub async fn ironic_etc_config_map(&self, client: Client) -> Result<ConfigMap> {
        let secrets = Api::<Secret>::namespaced(client, &self.namespace);
        let secret_name = &self.names.db_user_secret;
        info!("reading secret {}/{}", self.namespace, secret_name);
        let secret = match self.secret_timeout {
            Some(limit) => tokio::time::timeout(limit, secrets.get_opt(secret_name)).await??,
            None => secrets.get_opt(secret_name).await?,
        };
        let secret = secret.ok_or_else(|| {
            Error::DependencyNotFoundError(format!("secret {}/{}", self.namespace, secret_name))
        })?;
        self.ironic_etc_config_map_from_secret(&secret)
    }

    /// Configuration files for the ironic services, with the database URL taken from `secret`.
    pub fn ironic_etc_config_map_from_secret(&self, secret: &Secret) -> Result<ConfigMap> {
        debug!("building ConfigMap {}", self.names.ironic_etc);
        let mut data = load_all(&self.payloads, IRONIC_ETC)?;
        let connection = mysql_connection(secret)?;
        if let Some(conf) = data.get_mut("ironic.conf") {
            *conf = conf.replace(MYSQL_CONNECTION_PLACEHOLDER, &connection);
        }
        Ok(ConfigMap {
            metadata: self.metadata(&self.names.ironic_etc),
            data: Some(data),
            ..Default::default()
        })
    }

    pub fn dhcp_bin_config_map(&self) -> Result<ConfigMap> {
        debug!("building ConfigMap {}", self.names.dhcp_bin);
        Ok(ConfigMap {
            metadata: self.metadata(&self.names.dhcp_bin),
            data: Some(load_all(&self.payloads, DHCP_BIN)?),
            ..Default::default()
        })
    }

    pub fn dhcp_etc_config_map(&self) -> Result<ConfigMap> {
        debug!("building ConfigMap {}", self.names.dhcp_etc);
        Ok(ConfigMap {
            metadata: self.metadata(&self.names.dhcp_etc),
            data: Some(load_all(&self.payloads, DHCP_ETC)?),
            ..Default::default()
        })
    }
}
