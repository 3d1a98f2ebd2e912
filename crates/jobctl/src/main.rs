use clap::Parser;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use jobctl::{
    cli::{self, Cli},
    cluster::KubectlClusterResolver,
    config::Config,
    executor::{CommandExecutor, ShellExecutor},
    Result,
};

async fn execute(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let executor: Arc<dyn CommandExecutor> = Arc::new(ShellExecutor::new());
    let resolver = KubectlClusterResolver::new(
        executor.clone(),
        config.tools.clone(),
        config.namespace.clone(),
    );

    cli::run(cli.command, config, executor, &resolver, std::io::stdout()).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries reports and streamed command output.
    let log_filter = EnvFilter::try_new(format!("jobctl={},warn", cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();

    let code = match execute(cli).await {
        Ok(()) => 0,
        Err(e) => {
            debug!("Command failed: {:?}", e);
            cli::report_failure(&e, std::io::stderr())
        }
    };
    std::process::exit(code);
}
