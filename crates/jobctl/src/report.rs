use k8s_openapi::api::core::v1::VolumeMount;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::str::FromStr;

use crate::extract::PodStatus;

/// Runtime details of one job, merged from the describe, listing and pod
/// queries. Field order is the output key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDescription {
    #[serde(rename = "Job name")]
    pub name: String,
    #[serde(rename = "Profile")]
    pub profile: String,
    #[serde(rename = "Labels")]
    pub labels: BTreeMap<String, String>,
    #[serde(rename = "Mounts")]
    pub mounts: Vec<VolumeMount>,
    #[serde(rename = "Pods")]
    pub pods: Vec<PodStatus>,
    #[serde(rename = "Entrypoint environment variables template")]
    pub env_template: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Yaml,
    Json,
}

impl FromStr for ReportFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" => Ok(ReportFormat::Yaml),
            "json" => Ok(ReportFormat::Json),
            other => Err(crate::Error::Config(format!(
                "Invalid output format: {}. Must be 'yaml' or 'json'",
                other
            ))),
        }
    }
}

/// Writes the report in block style, keys in declaration order.
pub fn emit<W: Write>(
    description: &JobDescription,
    format: ReportFormat,
    mut out: W,
) -> crate::Result<()> {
    match format {
        ReportFormat::Yaml => serde_yaml::to_writer(&mut out, description)?,
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut out, description)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}
