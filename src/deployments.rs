use crate::dependencies::{wait_for_jobs, DependencyJob};
use crate::images::{IRONIC_CONDUCTOR, IRONIC_PXE, KUBERNETES_ENTRYPOINT, NGINX};
use crate::pod::{
    config_map_env, config_map_volume, control_plane_selector, empty_dir_volume, file_mount,
    ironic_labels, mount, EXEC_MODE, READ_MODE,
};
use crate::{Builder, Result};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, ContainerPort, ExecAction, KeyToPath, Lifecycle,
    LifecycleHandler, PodSecurityContext, PodSpec, PodTemplateSpec, SecurityContext, Volume,
    VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use tracing::debug;

const POD_DATA: &str = "pod-data";
const POD_SHARED: &str = "pod-shared";
const POD_VAR_CACHE_IRONIC: &str = "pod-var-cache-ironic";
const DHCP_HOSTS: &str = "dhcp-hosts";
const DHCP_ZONES: &str = "dhcp-zones";

fn privileged() -> Option<SecurityContext> {
    Some(SecurityContext {
        privileged: Some(true),
        run_as_user: Some(0),
        ..Default::default()
    })
}

fn port(container_port: i32, host_port: Option<i32>, protocol: Option<&str>) -> ContainerPort {
    ContainerPort {
        container_port,
        host_port,
        protocol: protocol.map(str::to_string),
        ..Default::default()
    }
}

fn deployment(meta: ObjectMeta, labels: BTreeMap<String, String>, spec: PodSpec) -> Deployment {
    Deployment {
        metadata: meta,
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(spec),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

impl Builder {
    /// Conductor, TFTP and HTTP boot servers for the ironic instance `name`.
    ///
    /// The pod starts once both database Jobs have completed.
    pub fn ironic_deployment(&self, name: &str) -> Result<Deployment> {
        debug!("building Deployment {}", name);
        let bin = self.names.ironic_bin.as_str();
        let etc = self.names.ironic_etc.as_str();
        let pxe_nic = config_map_env("PXE_NIC", &self.names.pxe_settings, "PXE_NIC");

        let init = wait_for_jobs(
            self.images.get(KUBERNETES_ENTRYPOINT)?,
            &[
                DependencyJob::new(&self.namespace, &self.names.db_sync_job),
                DependencyJob::new(&self.namespace, &self.names.db_init_job),
            ],
        )?;

        let pxe_init = Container {
            name: "ironic-conductor-pxe-init".to_string(),
            image: Some(self.images.get(IRONIC_PXE)?),
            image_pull_policy: Some("IfNotPresent".to_string()),
            command: Some(vec!["/tmp/ironic-conductor-pxe-init.sh".to_string()]),
            volume_mounts: Some(vec![
                file_mount(
                    bin,
                    "/tmp/ironic-conductor-pxe-init.sh",
                    "ironic-conductor-pxe-init.sh",
                ),
                mount(POD_DATA, "/var/lib/pod_data"),
            ]),
            ..Default::default()
        };

        let conductor_init = Container {
            name: "ironic-conductor-init".to_string(),
            image: Some(self.images.get(IRONIC_CONDUCTOR)?),
            image_pull_policy: Some("IfNotPresent".to_string()),
            env: Some(vec![pxe_nic.clone()]),
            volume_mounts: Some(vec![
                file_mount(bin, "/tmp/ironic-conductor-init.sh", "ironic-conductor-init.sh"),
                mount(POD_SHARED, "/tmp/pod-shared"),
            ]),
            command: Some(vec!["/tmp/ironic-conductor-init.sh".to_string()]),
            ..Default::default()
        };

        let conductor = Container {
            name: "ironic-conductor".to_string(),
            image: Some(self.images.get(IRONIC_CONDUCTOR)?),
            image_pull_policy: Some("IfNotPresent".to_string()),
            security_context: privileged(),
            lifecycle: Some(Lifecycle {
                pre_stop: Some(LifecycleHandler {
                    exec: Some(ExecAction {
                        command: Some(vec![
                            "/tmp/ironic-standalone.sh".to_string(),
                            "stop".to_string(),
                        ]),
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ports: Some(vec![port(6385, None, None)]),
            command: Some(vec!["/tmp/ironic-standalone.sh".to_string()]),
            volume_mounts: Some(vec![
                file_mount(bin, "/tmp/ironic-standalone.sh", "ironic-standalone.sh"),
                mount(POD_SHARED, "/tmp/pod-shared"),
                mount(POD_VAR_CACHE_IRONIC, "/var/cache/ironic"),
                file_mount(etc, "/etc/ironic/ironic.conf", "ironic.conf"),
                file_mount(etc, "/etc/ironic/logging.conf", "logging.conf"),
                file_mount(etc, "/etc/ironic/policy.json", "policy.json"),
                mount(POD_DATA, "/var/lib/pod_data"),
            ]),
            ..Default::default()
        };

        let pxe = Container {
            name: "ironic-conductor-pxe".to_string(),
            image: Some(self.images.get(IRONIC_PXE)?),
            image_pull_policy: Some("IfNotPresent".to_string()),
            security_context: privileged(),
            env: Some(vec![pxe_nic]),
            command: Some(vec!["/tmp/ironic-conductor-pxe.sh".to_string()]),
            volume_mounts: Some(vec![
                file_mount(bin, "/tmp/ironic-conductor-pxe.sh", "ironic-conductor-pxe.sh"),
                file_mount(etc, "/tftp-map-file", "tftp-map-file"),
                mount(POD_DATA, "/var/lib/pod_data"),
            ]),
            ports: Some(vec![port(69, Some(69), Some("UDP"))]),
            ..Default::default()
        };

        let http = Container {
            name: "ironic-conductor-http".to_string(),
            image: Some(self.images.get(NGINX)?),
            image_pull_policy: Some("IfNotPresent".to_string()),
            command: Some(vec!["/tmp/ironic-conductor-http.sh".to_string()]),
            volume_mounts: Some(vec![
                file_mount(bin, "/tmp/ironic-conductor-http.sh", "ironic-conductor-http.sh"),
                file_mount(etc, "/etc/nginx/nginx.conf", "nginx.conf"),
                mount(POD_DATA, "/var/lib/pod_data"),
            ]),
            ports: Some(vec![port(8081, Some(8081), Some("TCP"))]),
            ..Default::default()
        };

        let spec = PodSpec {
            node_selector: Some(control_plane_selector()),
            security_context: Some(PodSecurityContext {
                run_as_user: Some(0),
                ..Default::default()
            }),
            host_network: Some(true),
            host_ipc: Some(true),
            dns_policy: Some("ClusterFirstWithHostNet".to_string()),
            share_process_namespace: Some(true),
            init_containers: Some(vec![init, pxe_init, conductor_init]),
            containers: vec![conductor, pxe, http],
            volumes: Some(vec![
                config_map_volume(bin, bin, EXEC_MODE),
                config_map_volume(etc, etc, READ_MODE),
                empty_dir_volume(POD_SHARED),
                empty_dir_volume(POD_DATA),
                empty_dir_volume(POD_VAR_CACHE_IRONIC),
            ]),
            ..Default::default()
        };

        Ok(deployment(self.metadata(name), ironic_labels(name), spec))
    }

    /// DHCP server handing out addresses on the provisioning network.
    pub fn dhcp_deployment(&self) -> Result<Deployment> {
        let name = self.names.dhcp_server.as_str();
        debug!("building Deployment {}", name);
        let image = self.images.get(IRONIC_PXE)?;
        let bin = self.names.dhcp_bin.as_str();
        let etc = self.names.dhcp_etc.as_str();
        let settings = self.names.dhcp_settings.as_str();

        // selected as `apps`, while the dhcp Service selects `app`
        let labels = BTreeMap::from([("apps".to_string(), name.to_string())]);

        let init = Container {
            name: "init-dhcp".to_string(),
            image: Some(image.clone()),
            image_pull_policy: Some("IfNotPresent".to_string()),
            command: Some(vec!["/tmp/scripts/dhcp-server-init.sh".to_string()]),
            env: Some(vec![
                config_map_env("PXE_NIC", &self.names.pxe_settings, "PXE_NIC"),
                config_map_env("DHCP_HOSTS", settings, "DHCP_HOSTS"),
                config_map_env("CLUSTER_DOMAIN", settings, "CLUSTER_DOMAIN"),
                config_map_env("INITIAL_IP_RANGE", settings, "INITIAL_IP_RANGE"),
                config_map_env("FINAL_IP_RANGE", settings, "FINAL_IP_RANGE"),
            ]),
            volume_mounts: Some(vec![
                VolumeMount {
                    read_only: Some(true),
                    ..mount(bin, "/tmp/scripts/")
                },
                mount(DHCP_HOSTS, "/data/hosts/"),
                mount(DHCP_ZONES, "/data/zones/"),
            ]),
            ..Default::default()
        };

        let server = Container {
            name: name.to_string(),
            image: Some(image),
            image_pull_policy: Some("IfNotPresent".to_string()),
            command: Some(vec!["/tmp/scripts/dhcp-server.sh".to_string()]),
            ports: Some(vec![port(67, Some(67), Some("UDP"))]),
            volume_mounts: Some(vec![
                mount(bin, "/tmp/scripts/"),
                VolumeMount {
                    sub_path: Some("dhcpd.conf".to_string()),
                    ..mount(etc, "/data/dhcpd.conf")
                },
                mount(DHCP_ZONES, "/data/zones/"),
                mount(DHCP_HOSTS, "/data/hosts/"),
            ]),
            ..Default::default()
        };

        let spec = PodSpec {
            host_network: Some(true),
            init_containers: Some(vec![init]),
            containers: vec![server],
            volumes: Some(vec![
                config_map_volume(bin, bin, EXEC_MODE),
                Volume {
                    name: etc.to_string(),
                    config_map: Some(ConfigMapVolumeSource {
                        name: Some(etc.to_string()),
                        default_mode: Some(READ_MODE),
                        items: Some(vec![KeyToPath {
                            key: "dhcp-config".to_string(),
                            path: "dhcpd.conf".to_string(),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                empty_dir_volume(DHCP_HOSTS),
                empty_dir_volume(DHCP_ZONES),
            ]),
            ..Default::default()
        };

        Ok(deployment(self.metadata(name), labels, spec))
    }
}
