use crate::images::Images;
use crate::payloads::Payloads;
use crate::{Config, ResourceNames};
use kube::api::ObjectMeta;
use std::time::Duration;

/// Holds everything the resource builders need for one namespace.
///
/// The builder methods live next to the objects they produce: see
/// [`config_maps`](crate::config_maps), [`deployments`](crate::deployments),
/// [`services`](crate::services) and [`jobs`](crate::jobs).
#[derive(Clone, Debug)]
pub struct Builder {
    pub namespace: String,
    pub names: ResourceNames,
    pub images: Images,
    pub payloads: Payloads,
    /// Value of the `ironic_cr` label on Jobs and the API Service selector.
    pub instance: String,
    pub db_init_dependencies: Vec<String>,
    /// Upper bound on the Secret read; `None` waits indefinitely.
    pub secret_timeout: Option<Duration>,
}

impl Builder {
    pub fn new(namespace: &str, config: &Config) -> Self {
        let payloads = match &config.files_dir {
            Some(dir) => Payloads::Directory(dir.clone()),
            None => Payloads::Embedded,
        };
        Self {
            namespace: namespace.to_string(),
            names: config.names.clone(),
            images: Images::new(config.images.clone()),
            payloads,
            instance: config.ironic.instance.clone(),
            db_init_dependencies: config.db_init.dependencies.clone(),
            secret_timeout: match config.secret_timeout_seconds {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }

    pub fn with_payloads(mut self, payloads: Payloads) -> Self {
        self.payloads = payloads;
        self
    }

    pub(crate) fn metadata(&self, name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(self.namespace.clone()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::images;
    use std::collections::BTreeMap;

    pub(crate) fn test_config() -> Config {
        Config {
            images: BTreeMap::from([
                (
                    images::KUBERNETES_ENTRYPOINT.to_string(),
                    "quay.io/airshipit/kubernetes-entrypoint:v1.0.0".to_string(),
                ),
                (
                    images::IRONIC_PXE.to_string(),
                    "quay.io/metal3-io/ironic-pxe:latest".to_string(),
                ),
                (
                    images::IRONIC_CONDUCTOR.to_string(),
                    "quay.io/metal3-io/ironic:latest".to_string(),
                ),
                (images::NGINX.to_string(), "docker.io/nginx:1.25".to_string()),
            ]),
            ..Default::default()
        }
    }

    pub(crate) fn test_builder() -> Builder {
        Builder::new("metal", &test_config())
    }

    #[test]
    fn new_copies_config() {
        let mut config = test_config();
        config.files_dir = Some("/srv/files".into());
        config.secret_timeout_seconds = 2;
        let builder = Builder::new("metal", &config);
        assert_eq!(builder.namespace, "metal");
        assert_eq!(builder.instance, "openstack-ironic");
        assert_eq!(builder.secret_timeout, Some(Duration::from_secs(2)));
        assert!(matches!(builder.payloads, Payloads::Directory(_)));
        assert!(matches!(test_builder().payloads, Payloads::Embedded));
    }

    #[test]
    fn zero_secret_timeout_disables_the_limit() {
        let mut config = test_config();
        config.secret_timeout_seconds = 0;
        assert_eq!(Builder::new("metal", &config).secret_timeout, None);
        assert_eq!(
            test_builder().secret_timeout,
            Some(Duration::from_secs(15))
        );
    }

    #[test]
    fn metadata_is_namespaced() {
        let meta = test_builder().metadata("x");
        assert_eq!(meta.name.as_deref(), Some("x"));
        assert_eq!(meta.namespace.as_deref(), Some("metal"));
    }
}
