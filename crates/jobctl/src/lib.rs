pub mod cli;
pub mod cluster;
pub mod config;
pub mod context;
pub mod executor;
pub mod extract;
pub mod jobs;
pub mod report;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Context resolution failed ({step}) with ERROR {code}")]
    ContextResolution { step: String, code: i32 },
    #[error("{purpose} returned ERROR {code}")]
    Query { purpose: String, code: i32 },
    #[error("No job named '{0}' was found")]
    NotFound(String),
    #[error("Job name '{name}' matched {count} records, expected exactly one")]
    Ambiguous { name: String, count: usize },
    #[error("Malformed pod row, expected at least 3 columns: '{0}'")]
    MalformedPodRow(String),
    #[error("Malformed job record: {0}")]
    MalformedRecord(String),
    #[error("Invalid {kind} name '{name}'")]
    InvalidName { kind: String, name: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    /// Process exit code for this failure. Query and context failures carry
    /// the code of the command that failed.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ContextResolution { code, .. } | Error::Query { code, .. } if *code != 0 => {
                *code
            }
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
