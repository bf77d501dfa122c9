use crate::{Builder, LABEL_APP, LABEL_IRONIC_CR};
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;
use tracing::debug;

pub const IRONIC_API_PORT: i32 = 6385;
pub const IRONIC_API_NODE_PORT: i32 = 32733;
pub const DHCP_PORT: i32 = 67;

impl Builder {
    /// NodePort exposing the ironic API of the configured instance.
    pub fn ironic_api_service(&self, name: &str) -> Service {
        debug!("building Service {}", name);
        let selector = BTreeMap::from([
            (LABEL_APP.to_string(), "ironic".to_string()),
            (LABEL_IRONIC_CR.to_string(), self.instance.clone()),
        ]);
        Service {
            metadata: self.metadata(name),
            spec: Some(ServiceSpec {
                type_: Some("NodePort".to_string()),
                selector: Some(selector),
                ports: Some(vec![ServicePort {
                    name: Some("ironic-api".to_string()),
                    protocol: Some("TCP".to_string()),
                    port: IRONIC_API_PORT,
                    node_port: Some(IRONIC_API_NODE_PORT),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn dhcp_service(&self) -> Service {
        let name = self.names.dhcp_server.as_str();
        debug!("building Service {}", name);
        Service {
            metadata: self.metadata(name),
            spec: Some(ServiceSpec {
                type_: Some("ClusterIP".to_string()),
                ports: Some(vec![ServicePort {
                    name: Some("dhcp".to_string()),
                    port: DHCP_PORT,
                    protocol: Some("UDP".to_string()),
                    target_port: Some(IntOrString::Int(DHCP_PORT)),
                    ..Default::default()
                }]),
                selector: Some(BTreeMap::from([(
                    LABEL_APP.to_string(),
                    name.to_string(),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
