use ironic_stack::{Config, Stack};
use kube::Client;
use std::fs::File;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let client = Client::try_default().await?;

    let config: Config = if let Ok(config_filename) = std::env::var("CONFIG") {
        serde_yaml::from_reader(File::open(config_filename)?)?
    } else {
        Config::default()
    };
    let namespace = std::env::var("NAMESPACE").unwrap_or_else(|_| "default".to_string());

    let stack = Stack::new(&namespace, config);

    if std::env::var("DRY_RUN").is_ok() {
        let resources = stack.render(client).await?;
        print!("{}", resources.to_yaml()?);
        return Ok(());
    }

    let resources = stack.apply(client).await?;
    info!(
        "ironic stack ready in {}: {} ConfigMaps, {} Services, {} Jobs, {} Deployments",
        namespace,
        resources.config_maps.len(),
        resources.services.len(),
        resources.jobs.len(),
        resources.deployments.len()
    );

    Ok(())
}
