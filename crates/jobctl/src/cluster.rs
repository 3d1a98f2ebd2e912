//! Cluster context selection
//!
//! Points kubectl at the cluster a command targets before any job query is
//! issued. Remote clusters are GKE clusters reached with gcloud credentials,
//! local clusters are kind clusters.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    config::{ClusterConfig, ToolsConfig},
    context::{validate_gcloud_value, validate_resource_name, zone_to_region, ExecutionContext},
    executor::CommandExecutor,
    Error, Result,
};

/// Cluster name used for kind clusters when none is configured.
pub const DEFAULT_LOCAL_CLUSTER: &str = "kind";

/// Cluster selection requested on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterTarget {
    pub local: bool,
    pub cluster: Option<String>,
    pub zone: Option<String>,
    pub project: Option<String>,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterResolver: Send + Sync {
    /// Project from the ambient gcloud configuration.
    async fn default_project(&self) -> Result<String>;

    /// Compute zone from the ambient gcloud configuration.
    async fn default_zone(&self) -> Result<String>;

    /// Fetch credentials for a remote cluster and make it the current context.
    async fn select_remote(&self, cluster: &str, zone: &str, project: &str) -> Result<i32>;

    /// Switch kubectl to a local kind cluster.
    async fn select_local(&self, cluster: &str) -> Result<i32>;
}

/// Resolves the target into an [`ExecutionContext`] and switches kubectl to it.
///
/// Local targets only touch the local resolver. Remote targets fill in a
/// missing zone or project from gcloud before selecting the cluster.
pub async fn resolve_context(
    resolver: &dyn ClusterResolver,
    target: &ClusterTarget,
    defaults: &ClusterConfig,
) -> Result<ExecutionContext> {
    let cluster = target.cluster.clone().or_else(|| defaults.cluster.clone());

    if target.local {
        let cluster = cluster.unwrap_or_else(|| DEFAULT_LOCAL_CLUSTER.to_string());
        validate_resource_name("cluster", &cluster)?;
        let code = resolver.select_local(&cluster).await?;
        if code != 0 {
            return Err(Error::ContextResolution {
                step: "set local cluster".to_string(),
                code,
            });
        }
        return Ok(ExecutionContext::Local { cluster });
    }

    let cluster = cluster.ok_or_else(|| {
        Error::Config("cluster name is required; pass --cluster or set JOBCTL_CLUSTER".to_string())
    })?;
    validate_resource_name("cluster", &cluster)?;

    let project = match target.project.clone().or_else(|| defaults.project.clone()) {
        Some(project) => project,
        None => resolver.default_project().await?,
    };
    let zone = match target.zone.clone().or_else(|| defaults.zone.clone()) {
        Some(zone) => zone,
        None => resolver.default_zone().await?,
    };
    validate_gcloud_value("project", &project)?;
    validate_gcloud_value("zone", &zone)?;
    debug!("Using project {} and zone {}", project, zone);

    let code = resolver.select_remote(&cluster, &zone, &project).await?;
    if code != 0 {
        return Err(Error::ContextResolution {
            step: "set cluster".to_string(),
            code,
        });
    }

    Ok(ExecutionContext::Remote {
        cluster,
        zone,
        project,
    })
}

/// [`ClusterResolver`] backed by the gcloud and kubectl binaries.
pub struct KubectlClusterResolver {
    executor: Arc<dyn CommandExecutor>,
    tools: ToolsConfig,
    namespace: String,
}

impl KubectlClusterResolver {
    pub fn new(executor: Arc<dyn CommandExecutor>, tools: ToolsConfig, namespace: String) -> Self {
        Self {
            executor,
            tools,
            namespace,
        }
    }

    async fn gcloud_config_value(&self, property: &str, purpose: &str) -> Result<String> {
        let command = format!("{} config get {}", self.tools.gcloud, property);
        let output = self.executor.run_for_value(&command, purpose).await?;
        if !output.success() {
            return Err(Error::ContextResolution {
                step: purpose.to_string(),
                code: output.code,
            });
        }

        let value = output.stdout.trim();
        if value.is_empty() {
            return Err(Error::ContextResolution {
                step: format!("{}: gcloud property {} is not set", purpose, property),
                code: 1,
            });
        }
        Ok(value.to_string())
    }

    fn set_namespace_command(&self) -> String {
        format!(
            "{} config set-context --current --namespace={}",
            self.tools.kubectl, self.namespace
        )
    }
}

#[async_trait]
impl ClusterResolver for KubectlClusterResolver {
    async fn default_project(&self) -> Result<String> {
        let project = self
            .gcloud_config_value("project", "Get project from gcloud config")
            .await?;
        info!("Working on project {}", project);
        Ok(project)
    }

    async fn default_zone(&self) -> Result<String> {
        let zone = self
            .gcloud_config_value("compute/zone", "Get zone from gcloud config")
            .await?;
        info!("Working on zone {}", zone);
        Ok(zone)
    }

    async fn select_remote(&self, cluster: &str, zone: &str, project: &str) -> Result<i32> {
        let command = format!(
            "{} container clusters get-credentials {} --region={} --project={} && {}",
            self.tools.gcloud,
            cluster,
            zone_to_region(zone),
            project,
            self.set_namespace_command()
        );
        self.executor.run_with_updates(&command, "Set Cluster").await
    }

    async fn select_local(&self, cluster: &str) -> Result<i32> {
        let command = format!(
            "{} config use-context kind-{} && {}",
            self.tools.kubectl,
            cluster,
            self.set_namespace_command()
        );
        self.executor.run_with_updates(&command, "Set Cluster").await
    }
}
