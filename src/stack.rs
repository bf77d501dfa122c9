// Renders every enabled object and applies them in the order the pods need them:
// ConfigMaps, then Services, then Jobs, then Deployments.

use crate::{Builder, Config, Error, Result};
use futures::future::try_join_all;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, Secret, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::info;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resources {
    pub config_maps: Vec<ConfigMap>,
    pub services: Vec<Service>,
    pub jobs: Vec<Job>,
    pub deployments: Vec<Deployment>,
}

impl Resources {
    /// Multi-document YAML, one document per object in apply order.
    pub fn to_yaml(&self) -> Result<String> {
        let mut docs = Vec::new();
        for cm in &self.config_maps {
            docs.push(serde_yaml::to_string(cm)?);
        }
        for svc in &self.services {
            docs.push(serde_yaml::to_string(svc)?);
        }
        for job in &self.jobs {
            docs.push(serde_yaml::to_string(job)?);
        }
        for dep in &self.deployments {
            docs.push(serde_yaml::to_string(dep)?);
        }
        Ok(docs
            .iter()
            .map(|doc| format!("---\n{}", doc))
            .collect::<String>())
    }

    pub fn len(&self) -> usize {
        self.config_maps.len() + self.services.len() + self.jobs.len() + self.deployments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct Stack {
    pub config: Config,
    pub builder: Builder,
}

impl Stack {
    pub fn new(namespace: &str, config: Config) -> Self {
        let builder = Builder::new(namespace, &config);
        Self { config, builder }
    }

    /// Builds every enabled object, reading the database Secret through `client`.
    pub async fn render(&self, client: Client) -> Result<Resources> {
        let ironic_etc = if self.config.ironic.enabled {
            Some(self.builder.ironic_etc_config_map(client).await?)
        } else {
            None
        };
        self.assemble(ironic_etc)
    }

    /// Like [`Stack::render`], with the database Secret already in hand.
    pub fn render_with_secret(&self, secret: &Secret) -> Result<Resources> {
        let ironic_etc = if self.config.ironic.enabled {
            Some(self.builder.ironic_etc_config_map_from_secret(secret)?)
        } else {
            None
        };
        self.assemble(ironic_etc)
    }

    fn assemble(&self, ironic_etc: Option<ConfigMap>) -> Result<Resources> {
        let b = &self.builder;
        let mut resources = Resources::default();
        if self.config.ironic.enabled {
            let ironic_etc = ironic_etc.ok_or_else(|| {
                Error::DependencyNotFoundError(format!("configmap {}", b.names.ironic_etc))
            })?;
            resources.config_maps.push(b.ironic_bin_config_map()?);
            resources.config_maps.push(ironic_etc);
            resources
                .services
                .push(b.ironic_api_service(&self.config.ironic.service));
            resources.jobs.push(b.db_init_job()?);
            resources.jobs.push(b.db_sync_job()?);
            resources
                .deployments
                .push(b.ironic_deployment(&self.config.ironic.name)?);
        }
        if self.config.dhcp.enabled {
            resources.config_maps.push(b.dhcp_bin_config_map()?);
            resources.config_maps.push(b.dhcp_etc_config_map()?);
            resources.services.push(b.dhcp_service());
            resources.deployments.push(b.dhcp_deployment()?);
        }
        Ok(resources)
    }

    /// Renders and server-side applies every enabled object.
    pub async fn apply(&self, client: Client) -> Result<Resources> {
        let resources = self.render(client.clone()).await?;
        let params = PatchParams::apply(&self.config.field_manager).force();
        let ns = self.builder.namespace.as_str();

        apply_all(Api::namespaced(client.clone(), ns), &resources.config_maps, &params).await?;
        apply_all(Api::namespaced(client.clone(), ns), &resources.services, &params).await?;
        apply_all(Api::namespaced(client.clone(), ns), &resources.jobs, &params).await?;
        apply_all(Api::namespaced(client, ns), &resources.deployments, &params).await?;

        info!("applied {} objects to namespace {}", resources.len(), ns);
        Ok(resources)
    }
}

async fn apply_all<K>(api: Api<K>, objects: &[K], params: &PatchParams) -> Result<()>
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + Debug + Serialize + DeserializeOwned,
    <K as Resource>::DynamicType: Default,
{
    try_join_all(objects.iter().map(|obj| {
        let api = api.clone();
        let name = obj.name_any();
        async move {
            info!("applying {} {}", K::kind(&Default::default()), name);
            api.patch(&name, params, &Patch::Apply(obj)).await
        }
    }))
    .await?;
    Ok(())
}
