use crate::dependencies::{wait_for_jobs, DependencyJob};
use crate::images::{IRONIC_CONDUCTOR, KUBERNETES_ENTRYPOINT};
use crate::pod::{
    config_map_volume, control_plane_selector, empty_dir_volume, file_mount, mount, secret_env,
    EXEC_MODE, READ_MODE,
};
use crate::{Builder, Result, LABEL_APP, LABEL_COMPONENT, LABEL_IRONIC_CR};
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec, Volume};
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use tracing::debug;

const ETC_SERVICE: &str = "etc-service";

impl Builder {
    /// Creates the ironic database and user from the root credentials.
    pub fn db_init_job(&self) -> Result<Job> {
        let root = self.names.root_db_secret.as_str();
        let user = self.names.db_user_secret.as_str();
        let container = Container {
            name: "ironic-db-init-0".to_string(),
            image: Some(self.images.get(IRONIC_CONDUCTOR)?),
            image_pull_policy: Some("IfNotPresent".to_string()),
            env: Some(vec![
                secret_env("ROOT_DB_HOST", root, "ROOT_DB_HOST"),
                secret_env("ROOT_DB_USER", root, "ROOT_DB_USER"),
                secret_env("ROOT_DB_PASSWORD", root, "ROOT_DB_PASSWORD"),
                secret_env("USER_DB_HOST", user, "DB_HOST"),
                secret_env("USER_DB_USER", user, "DB_USER"),
                secret_env("USER_DB_PASSWORD", user, "DB_PASSWORD"),
                secret_env("USER_DB_DATABASE", user, "DB_DATABASE"),
            ]),
            command: Some(vec!["/tmp/db-init.py".to_string()]),
            volume_mounts: Some(vec![
                file_mount("db-init-py", "/tmp/db-init.py", "db-init.py"),
                mount(ETC_SERVICE, "/etc/ironic"),
                file_mount("db-init-conf", "/etc/ironic/ironic.conf", "ironic.conf"),
                file_mount("db-init-conf", "/etc/ironic/logging.conf", "logging.conf"),
            ]),
            ..Default::default()
        };
        let dependencies: Vec<_> = self
            .db_init_dependencies
            .iter()
            .map(|name| DependencyJob::new(&self.namespace, name))
            .collect();
        self.database_job(
            &self.names.db_init_job,
            "db-init",
            &dependencies,
            container,
            vec![
                empty_dir_volume(ETC_SERVICE),
                config_map_volume("db-init-py", &self.names.ironic_bin, EXEC_MODE),
                config_map_volume("db-init-conf", &self.names.ironic_etc, READ_MODE),
            ],
        )
    }

    /// Runs the ironic schema migrations once the database exists.
    pub fn db_sync_job(&self) -> Result<Job> {
        let container = Container {
            name: self.names.db_sync_job.clone(),
            image: Some(self.images.get(IRONIC_CONDUCTOR)?),
            image_pull_policy: Some("IfNotPresent".to_string()),
            command: Some(vec!["/tmp/db-sync.sh".to_string()]),
            volume_mounts: Some(vec![
                file_mount("db-sync-sh", "/tmp/db-sync.sh", "db-sync.sh"),
                mount(ETC_SERVICE, "/etc/ironic"),
                file_mount("db-sync-conf", "/etc/ironic/ironic.conf", "ironic.conf"),
                file_mount("db-sync-conf", "/etc/ironic/logging.conf", "logging.conf"),
            ]),
            ..Default::default()
        };
        self.database_job(
            &self.names.db_sync_job,
            "db-sync",
            &[DependencyJob::new(&self.namespace, &self.names.db_init_job)],
            container,
            vec![
                empty_dir_volume(ETC_SERVICE),
                config_map_volume("db-sync-sh", &self.names.ironic_bin, EXEC_MODE),
                config_map_volume("db-sync-conf", &self.names.ironic_etc, READ_MODE),
            ],
        )
    }

    // Retries are left to the Job controller's defaults.
    fn database_job(
        &self,
        name: &str,
        component: &str,
        dependencies: &[DependencyJob],
        container: Container,
        volumes: Vec<Volume>,
    ) -> Result<Job> {
        debug!("building Job {}", name);
        let labels = BTreeMap::from([
            (LABEL_APP.to_string(), "ironic".to_string()),
            (LABEL_IRONIC_CR.to_string(), self.instance.clone()),
            (LABEL_COMPONENT.to_string(), component.to_string()),
        ]);
        let init = wait_for_jobs(self.images.get(KUBERNETES_ENTRYPOINT)?, dependencies)?;
        Ok(Job {
            metadata: self.metadata(name),
            spec: Some(JobSpec {
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(labels),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        node_selector: Some(control_plane_selector()),
                        restart_policy: Some("OnFailure".to_string()),
                        init_containers: Some(vec![init]),
                        containers: vec![container],
                        volumes: Some(volumes),
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::tests::{test_builder, test_config};
    use crate::Error;

    fn pod_spec(job: &Job) -> &PodSpec {
        job.spec.as_ref().unwrap().template.spec.as_ref().unwrap()
    }

    fn dependencies(job: &Job) -> Vec<DependencyJob> {
        let init = pod_spec(job).init_containers.as_ref().unwrap();
        assert_eq!(init.len(), 1);
        let json = init[0]
            .env
            .as_ref()
            .unwrap()
            .iter()
            .find(|e| e.name == "DEPENDENCY_JOBS_JSON")
            .and_then(|e| e.value.clone())
            .unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn jobs_restart_on_failure() {
        let builder = test_builder();
        for job in [builder.db_init_job().unwrap(), builder.db_sync_job().unwrap()] {
            let pod = pod_spec(&job);
            assert_eq!(pod.restart_policy.as_deref(), Some("OnFailure"));
            assert_eq!(pod.node_selector.as_ref().unwrap()["ironic-control-plane"], "enabled");
            assert_eq!(pod.init_containers.as_ref().unwrap().len(), 1);
            let spec = job.spec.as_ref().unwrap();
            assert_eq!(spec.backoff_limit, None);
        }
    }

    #[test]
    fn db_sync_waits_on_db_init() {
        let job = test_builder().db_sync_job().unwrap();
        assert_eq!(job.metadata.name.as_deref(), Some("ironic-db-sync"));
        assert_eq!(dependencies(&job), vec![DependencyJob::new("metal", "ironic-db-init")]);
        assert_eq!(pod_spec(&job).containers[0].name, "ironic-db-sync");
        let template = job.spec.as_ref().unwrap().template.metadata.as_ref().unwrap();
        assert_eq!(template.labels.as_ref().unwrap()["component"], "db-sync");
    }

    #[test]
    fn db_init_dependencies_are_configurable() {
        assert!(dependencies(&test_builder().db_init_job().unwrap()).is_empty());

        let mut config = test_config();
        config.db_init.dependencies = vec!["mariadb-bootstrap".to_string()];
        let job = Builder::new("metal", &config).db_init_job().unwrap();
        assert_eq!(dependencies(&job), vec![DependencyJob::new("metal", "mariadb-bootstrap")]);
    }

    #[test]
    fn db_init_reads_credentials_from_secrets() {
        let job = test_builder().db_init_job().unwrap();
        assert_eq!(job.metadata.name.as_deref(), Some("ironic-db-init"));
        let container = &pod_spec(&job).containers[0];
        assert_eq!(container.name, "ironic-db-init-0");
        let refs: Vec<_> = container
            .env
            .as_ref()
            .unwrap()
            .iter()
            .map(|e| {
                let r = e.value_from.as_ref().unwrap().secret_key_ref.as_ref().unwrap();
                (e.name.as_str(), r.name.as_deref().unwrap(), r.key.as_str())
            })
            .collect();
        assert_eq!(
            refs,
            vec![
                ("ROOT_DB_HOST", "mysql-root-credentials", "ROOT_DB_HOST"),
                ("ROOT_DB_USER", "mysql-root-credentials", "ROOT_DB_USER"),
                ("ROOT_DB_PASSWORD", "mysql-root-credentials", "ROOT_DB_PASSWORD"),
                ("USER_DB_HOST", "ironic-db-user", "DB_HOST"),
                ("USER_DB_USER", "ironic-db-user", "DB_USER"),
                ("USER_DB_PASSWORD", "ironic-db-user", "DB_PASSWORD"),
                ("USER_DB_DATABASE", "ironic-db-user", "DB_DATABASE"),
            ]
        );
    }

    #[test]
    fn missing_entrypoint_image_is_configuration_error() {
        let mut config = test_config();
        config.images.remove(KUBERNETES_ENTRYPOINT);
        let builder = Builder::new("metal", &config);
        assert!(matches!(builder.db_sync_job(), Err(Error::ConfigurationError(_))));
        assert!(matches!(builder.db_init_job(), Err(Error::ConfigurationError(_))));
    }
}
