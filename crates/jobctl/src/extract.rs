//! Parsers for the three job query outputs
//!
//! * the free-form `describe` text, scanned for Slurm environment lines
//! * the YAML listing, decoded into a [`JobRecord`] lookup
//! * the `--no-headers` pod table

use k8s_openapi::api::core::v1::{Container, EnvVar, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Name of the container environment variable holding the application profile.
pub const PROFILE_ENV_VAR: &str = "PROFILE";

lazy_static! {
    /// `SLURM_<UPPER_SNAKE>=<rest of line>`
    static ref SLURM_ENV_LINE: Regex = Regex::new(r"SLURM_[A-Z_]*=.*").unwrap();
}

/// Name and phase of one pod backing a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodStatus {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Status")]
    pub status: String,
}

/// One item of `kubectl-kjob list slurm -o yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobRecord {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: Option<JobRecordSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobRecordSpec {
    #[serde(default)]
    pub template: PodTemplateSpec,
}

impl JobRecord {
    /// The first container of the pod template, which carries the job's
    /// environment and mounts.
    pub fn first_container(&self) -> Option<&Container> {
        self.spec
            .as_ref()
            .and_then(|spec| spec.template.spec.as_ref())
            .and_then(|pod| pod.containers.first())
    }
}

#[derive(Debug, Default, Deserialize)]
struct JobRecordList {
    #[serde(default)]
    items: Vec<JobRecord>,
}

/// Result of looking a job up by exact name.
#[derive(Debug, Clone, PartialEq)]
pub enum JobLookup {
    NotFound,
    Found(Box<JobRecord>),
    Ambiguous(Vec<JobRecord>),
}

impl JobLookup {
    pub fn from_records(mut records: Vec<JobRecord>) -> Self {
        match records.len() {
            0 => JobLookup::NotFound,
            1 => JobLookup::Found(Box::new(records.remove(0))),
            _ => JobLookup::Ambiguous(records),
        }
    }

    /// The single matching record. No match and several matches are both
    /// correlation failures.
    pub fn into_record(self, name: &str) -> Result<JobRecord> {
        match self {
            JobLookup::Found(record) => Ok(*record),
            JobLookup::NotFound => Err(Error::NotFound(name.to_string())),
            JobLookup::Ambiguous(records) => Err(Error::Ambiguous {
                name: name.to_string(),
                count: records.len(),
            }),
        }
    }
}

/// All Slurm environment lines in `text`, in order of appearance.
/// Duplicates are kept.
pub fn env_template_lines(text: &str) -> Vec<String> {
    SLURM_ENV_LINE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Parses `kubectl get pods --no-headers` output. Columns are NAME, READY,
/// STATUS, ...; blank lines are skipped.
pub fn parse_pod_table(text: &str) -> Result<Vec<PodStatus>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.as_slice() {
                [name, _, status, ..] => Ok(PodStatus {
                    name: name.to_string(),
                    status: status.to_string(),
                }),
                _ => Err(Error::MalformedPodRow(line.to_string())),
            }
        })
        .collect()
}

/// Value of the first `PROFILE` variable, or an empty string.
pub fn profile_from_env(env: &[EnvVar]) -> String {
    env.iter()
        .find(|var| var.name == PROFILE_ENV_VAR)
        .and_then(|var| var.value.clone())
        .unwrap_or_default()
}

/// Decodes the YAML listing of jobs filtered by name.
pub fn parse_job_lookup(text: &str) -> Result<JobLookup> {
    if text.trim().is_empty() {
        return Ok(JobLookup::NotFound);
    }
    let list: JobRecordList =
        serde_yaml::from_str(text).map_err(|e| Error::MalformedRecord(e.to_string()))?;
    Ok(JobLookup::from_records(list.items))
}
