use serde::{Deserialize, Serialize};

/// Binaries used to talk to the cluster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolsConfig {
    pub kjob: String,
    pub kubectl: String,
    pub gcloud: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            kjob: "kubectl-kjob".to_string(),
            kubectl: "kubectl".to_string(),
            gcloud: "gcloud".to_string(),
        }
    }
}

/// Cluster defaults, overridable from the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub tools: ToolsConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    /// Application profile that `job list` is scoped to.
    pub default_profile: String,
    pub namespace: String,
}

impl Config {
    pub fn load() -> crate::Result<Self> {
        // Load environment variables from .env file if it exists
        let _ = dotenvy::dotenv();

        let defaults = Config::default();
        let config = Config {
            tools: ToolsConfig {
                kjob: env_or("JOBCTL_KJOB_BIN", defaults.tools.kjob),
                kubectl: env_or("JOBCTL_KUBECTL_BIN", defaults.tools.kubectl),
                gcloud: env_or("JOBCTL_GCLOUD_BIN", defaults.tools.gcloud),
            },
            cluster: ClusterConfig {
                cluster: env_opt("JOBCTL_CLUSTER"),
                zone: env_opt("JOBCTL_ZONE"),
                project: env_opt("JOBCTL_PROJECT"),
            },
            default_profile: env_or("JOBCTL_DEFAULT_PROFILE", defaults.default_profile),
            namespace: env_or("JOBCTL_NAMESPACE", defaults.namespace),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        let tools = [
            ("JOBCTL_KJOB_BIN", &self.tools.kjob),
            ("JOBCTL_KUBECTL_BIN", &self.tools.kubectl),
            ("JOBCTL_GCLOUD_BIN", &self.tools.gcloud),
            ("JOBCTL_DEFAULT_PROFILE", &self.default_profile),
            ("JOBCTL_NAMESPACE", &self.namespace),
        ];
        for (var, value) in tools {
            if value.trim().is_empty() {
                return Err(crate::Error::Config(format!("{} must not be empty", var)));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tools: ToolsConfig::default(),
            cluster: ClusterConfig::default(),
            default_profile: "xpk-def-app-profile".to_string(),
            namespace: "default".to_string(),
        }
    }
}

fn env_or(var: &str, default: String) -> String {
    std::env::var(var).unwrap_or(default)
}

fn env_opt(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|value| !value.trim().is_empty())
}
