//! Command line surface and dispatch
//!
//! `run` is the single place an operation's outcome is decided; `main` turns
//! its result into the process exit code.

use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

use crate::{
    cluster::{resolve_context, ClusterResolver, ClusterTarget},
    config::Config,
    executor::CommandExecutor,
    jobs::JobCommands,
    report::{emit, ReportFormat},
    Error, Result,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Manage Slurm-like kjob jobs on Kubernetes clusters", long_about = None)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Slurm-like job commands
    Job {
        #[command(subcommand)]
        command: JobCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum JobCommand {
    /// Show the runtime details of a job
    Info {
        /// Job name
        name: String,

        #[command(flatten)]
        cluster: ClusterArgs,

        /// Report format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        output: ReportFormat,
    },

    /// List jobs of the default application profile
    List {
        #[command(flatten)]
        cluster: ClusterArgs,
    },

    /// Cancel one or more jobs
    Cancel {
        /// Names of the jobs to cancel
        #[arg(required = true, num_args = 1..)]
        names: Vec<String>,

        #[command(flatten)]
        cluster: ClusterArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ClusterArgs {
    /// Use the local kind cluster instead of a remote one
    #[arg(long, alias = "kind-cluster")]
    pub local: bool,

    /// Cluster name (defaults to JOBCTL_CLUSTER)
    #[arg(long)]
    pub cluster: Option<String>,

    /// Compute zone (defaults to JOBCTL_ZONE, then gcloud config)
    #[arg(long, conflicts_with = "local")]
    pub zone: Option<String>,

    /// Project (defaults to JOBCTL_PROJECT, then gcloud config)
    #[arg(long, conflicts_with = "local")]
    pub project: Option<String>,
}

impl From<ClusterArgs> for ClusterTarget {
    fn from(args: ClusterArgs) -> Self {
        ClusterTarget {
            local: args.local,
            cluster: args.cluster,
            zone: args.zone,
            project: args.project,
        }
    }
}

/// Resolves the cluster context, then runs the requested job operation.
/// Reports are written to `out`.
pub async fn run<W: Write>(
    command: Commands,
    config: Config,
    executor: Arc<dyn CommandExecutor>,
    resolver: &dyn ClusterResolver,
    out: W,
) -> Result<()> {
    let Commands::Job { command } = command;
    let defaults = config.cluster.clone();
    let jobs = JobCommands::new(executor, config);

    match command {
        JobCommand::Info {
            name,
            cluster,
            output,
        } => {
            let target = ClusterTarget::from(cluster);
            let context = resolve_context(resolver, &target, &defaults).await?;
            let description = jobs.describe(&context, &name).await?;
            emit(&description, output, out)
        }
        JobCommand::List { cluster } => {
            let target = ClusterTarget::from(cluster);
            let context = resolve_context(resolver, &target, &defaults).await?;
            jobs.list(&context).await
        }
        JobCommand::Cancel { names, cluster } => {
            info!("Starting job cancel for job: {}", names.join(" "));
            let target = ClusterTarget::from(cluster);
            let context = resolve_context(resolver, &target, &defaults).await?;
            jobs.cancel(&context, &names).await
        }
    }
}

/// Writes the failure diagnostic to `err_out` and returns the exit code.
/// The diagnostic does not depend on the log level.
pub fn report_failure<W: Write>(err: &Error, mut err_out: W) -> i32 {
    // Nothing else can be reported if stderr itself is gone.
    let _ = writeln!(err_out, "Error: {}", err);
    err.exit_code()
}
