use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use crate::{Error, Result};

lazy_static! {
    /// DNS-1123 subdomain: lowercase alphanumerics, `-` and `.`.
    static ref RESOURCE_NAME: Regex =
        Regex::new(r"^[a-z0-9]([-a-z0-9.]*[a-z0-9])?$").unwrap();
    /// gcloud zones and project ids, including domain-scoped `example.com:project`.
    static ref GCLOUD_VALUE: Regex = Regex::new(r"^[a-z0-9][-a-z0-9.:]*$").unwrap();
}

const MAX_RESOURCE_NAME_LEN: usize = 253;

/// Cluster a command runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionContext {
    /// GKE cluster reached through gcloud credentials.
    Remote {
        cluster: String,
        zone: String,
        project: String,
    },
    /// Local kind cluster used for development.
    Local { cluster: String },
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionContext::Remote {
                cluster,
                zone,
                project,
            } => write!(f, "cluster {} (project {}, zone {})", cluster, project, zone),
            ExecutionContext::Local { cluster } => write!(f, "local cluster kind-{}", cluster),
        }
    }
}

/// Region a zone belongs to, e.g. `us-central2-b` -> `us-central2`.
pub fn zone_to_region(zone: &str) -> &str {
    zone.rsplit_once('-').map(|(region, _)| region).unwrap_or(zone)
}

/// Checks that a job or cluster name is a Kubernetes resource name. Names are
/// interpolated into shell command lines, so anything else is rejected.
pub fn validate_resource_name(kind: &str, name: &str) -> Result<()> {
    if name.len() > MAX_RESOURCE_NAME_LEN || !RESOURCE_NAME.is_match(name) {
        return Err(Error::InvalidName {
            kind: kind.to_string(),
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Checks a zone or project id before it is put on a gcloud command line.
pub fn validate_gcloud_value(kind: &str, value: &str) -> Result<()> {
    if !GCLOUD_VALUE.is_match(value) {
        return Err(Error::InvalidName {
            kind: kind.to_string(),
            name: value.to_string(),
        });
    }
    Ok(())
}
