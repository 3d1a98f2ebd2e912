//! Job operations: info, list and cancel
//!
//! Each operation issues its queries through the [`CommandExecutor`] one at a
//! time and stops at the first failure. Nothing here terminates the process;
//! failures are returned to the dispatcher.

use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    config::Config,
    context::{validate_resource_name, ExecutionContext},
    executor::CommandExecutor,
    extract::{env_template_lines, parse_job_lookup, parse_pod_table, profile_from_env},
    report::JobDescription,
    Error, Result,
};

pub struct JobCommands {
    executor: Arc<dyn CommandExecutor>,
    config: Config,
}

impl JobCommands {
    pub fn new(executor: Arc<dyn CommandExecutor>, config: Config) -> Self {
        Self { executor, config }
    }

    /// Runs a capturing query, turning a non-zero exit into a query failure.
    async fn query(&self, command: &str, purpose: &str, failure: &str) -> Result<String> {
        let output = self.executor.run_for_value(command, purpose).await?;
        if !output.success() {
            return Err(Error::Query {
                purpose: failure.to_string(),
                code: output.code,
            });
        }
        Ok(output.stdout)
    }

    /// Collects the runtime details of one job.
    ///
    /// Queries run in the order describe, listing, pods. The pod query is not
    /// issued unless the listing yields exactly one record.
    pub async fn describe(
        &self,
        context: &ExecutionContext,
        name: &str,
    ) -> Result<JobDescription> {
        validate_resource_name("job", name)?;
        debug!("Describing job {} on {}", name, context);
        let tools = &self.config.tools;

        let desc_text = self
            .query(
                &format!("{} describe slurm {}", tools.kjob, name),
                "Getting job data",
                "Data info request",
            )
            .await?;

        let job_text = self
            .query(
                &format!(
                    "{} list slurm -o yaml --field-selector metadata.name=={}",
                    tools.kjob, name
                ),
                "Getting job info",
                "Job info request",
            )
            .await?;
        let record = parse_job_lookup(&job_text)?.into_record(name)?;

        let pods_text = self
            .query(
                &format!("{} get pods -l=job-name={} --no-headers", tools.kubectl, name),
                "Getting pods list",
                "Pods list request",
            )
            .await?;
        let pods = parse_pod_table(&pods_text)?;

        let container = record.first_container();
        let profile = container
            .and_then(|c| c.env.as_deref())
            .map(profile_from_env)
            .unwrap_or_default();
        let mounts = container
            .and_then(|c| c.volume_mounts.clone())
            .unwrap_or_default();
        let labels = record.metadata.labels.clone().unwrap_or_default();

        debug!("Job {} has {} pods and {} mounts", name, pods.len(), mounts.len());

        Ok(JobDescription {
            name: name.to_string(),
            profile,
            labels,
            mounts,
            pods,
            env_template: env_template_lines(&desc_text),
        })
    }

    /// Lists the jobs of the default application profile, streaming the
    /// listing to the operator.
    pub async fn list(&self, context: &ExecutionContext) -> Result<()> {
        match context {
            ExecutionContext::Remote { project, zone, .. } => {
                info!("Listing jobs for project {} and zone {}:", project, zone)
            }
            ExecutionContext::Local { .. } => info!("Listing jobs:"),
        }

        let command = format!(
            "{} list slurm --profile {}",
            self.config.tools.kjob, self.config.default_profile
        );
        let code = self.executor.run_with_updates(&command, "list jobs").await?;
        if code != 0 {
            return Err(Error::Query {
                purpose: "Listing jobs".to_string(),
                code,
            });
        }
        Ok(())
    }

    /// Deletes all named jobs with a single delete command.
    ///
    /// A failure part way through may leave some jobs deleted.
    pub async fn cancel(&self, context: &ExecutionContext, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Err(Error::Config("at least one job name is required".to_string()));
        }
        for name in names {
            validate_resource_name("job", name)?;
        }
        debug!("Cancelling {} jobs on {}", names.len(), context);

        let command = format!("{} delete slurm {}", self.config.tools.kjob, names.join(" "));
        let code = self.executor.run_with_updates(&command, "delete job").await?;
        if code != 0 {
            return Err(Error::Query {
                purpose: "Delete job request".to_string(),
                code,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{CommandOutput, MockCommandExecutor};
    use mockall::Sequence;

    fn output(code: i32, stdout: &str) -> CommandOutput {
        CommandOutput {
            code,
            stdout: stdout.to_string(),
        }
    }

    fn commands(executor: MockCommandExecutor) -> JobCommands {
        JobCommands::new(Arc::new(executor), Config::default())
    }

    fn local() -> ExecutionContext {
        ExecutionContext::Local {
            cluster: "kind".to_string(),
        }
    }

    const LISTING: &str = "items:\n\
        - metadata:\n    name: job-a\n    labels:\n      team: ml\n  \
        spec:\n    template:\n      spec:\n        containers:\n        \
        - name: main\n          env:\n          - name: PROFILE\n            value: default\n";

    #[tokio::test]
    async fn test_describe_failure_skips_remaining_queries() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run_for_value()
            .withf(|command, _| command == "kubectl-kjob describe slurm job-a")
            .times(1)
            .returning(|_, _| Ok(output(2, "")));

        let err = commands(executor).describe(&local(), "job-a").await.unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "Data info request returned ERROR 2");
    }

    #[tokio::test]
    async fn test_describe_queries_run_in_order() {
        let mut seq = Sequence::new();
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run_for_value()
            .withf(|command, _| command.contains("describe slurm job-a"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(output(0, "SLURM_JOB_ID=42\n")));
        executor
            .expect_run_for_value()
            .withf(|command, _| {
                command == "kubectl-kjob list slurm -o yaml --field-selector metadata.name==job-a"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(output(0, LISTING)));
        executor
            .expect_run_for_value()
            .withf(|command, _| command == "kubectl get pods -l=job-name=job-a --no-headers")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(output(0, "job-a-0   1/1   Running   0   5m\n")));

        let description = commands(executor).describe(&local(), "job-a").await.unwrap();
        assert_eq!(description.profile, "default");
        assert_eq!(description.labels.get("team").map(String::as_str), Some("ml"));
        assert!(description.mounts.is_empty());
        assert_eq!(description.pods.len(), 1);
        assert_eq!(description.env_template, vec!["SLURM_JOB_ID=42"]);
    }

    #[tokio::test]
    async fn test_missing_record_skips_pod_query() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run_for_value()
            .withf(|command, _| command.contains("describe"))
            .times(1)
            .returning(|_, _| Ok(output(0, "")));
        executor
            .expect_run_for_value()
            .withf(|command, _| command.contains("list slurm"))
            .times(1)
            .returning(|_, _| Ok(output(0, "apiVersion: v1\nitems: []\nkind: List\n")));
        executor
            .expect_run_for_value()
            .withf(|command, _| command.contains("get pods"))
            .never();

        let err = commands(executor).describe(&local(), "job-a").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_listing_failure_skips_pod_query() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run_for_value()
            .withf(|command, _| command.contains("describe"))
            .times(1)
            .returning(|_, _| Ok(output(0, "SLURM_JOB_ID=42\n")));
        executor
            .expect_run_for_value()
            .withf(|command, _| command.contains("list slurm"))
            .times(1)
            .returning(|_, _| Ok(output(3, "")));
        executor
            .expect_run_for_value()
            .withf(|command, _| command.contains("get pods"))
            .never();

        let err = commands(executor).describe(&local(), "job-a").await.unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "Job info request returned ERROR 3");
    }

    #[tokio::test]
    async fn test_ambiguous_record_skips_pod_query() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run_for_value()
            .withf(|command, _| command.contains("describe"))
            .times(1)
            .returning(|_, _| Ok(output(0, "")));
        executor
            .expect_run_for_value()
            .withf(|command, _| command.contains("list slurm"))
            .times(1)
            .returning(|_, _| {
                Ok(output(
                    0,
                    "items:\n- metadata:\n    name: job-a\n- metadata:\n    name: job-a\n",
                ))
            });
        executor
            .expect_run_for_value()
            .withf(|command, _| command.contains("get pods"))
            .never();

        let err = commands(executor).describe(&local(), "job-a").await.unwrap_err();
        assert!(matches!(err, Error::Ambiguous { count: 2, .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_describe_rejects_shell_metacharacters() {
        let mut executor = MockCommandExecutor::new();
        executor.expect_run_for_value().never();

        let err = commands(executor).describe(&local(), "job-a;id").await.unwrap_err();
        assert!(matches!(err, Error::InvalidName { ref name, .. } if name == "job-a;id"));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_pod_query_failure_code_is_propagated() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run_for_value()
            .withf(|command, _| !command.contains("get pods"))
            .times(2)
            .returning(|command, _| {
                if command.contains("describe") {
                    Ok(output(0, ""))
                } else {
                    Ok(output(0, LISTING))
                }
            });
        executor
            .expect_run_for_value()
            .withf(|command, _| command.contains("get pods"))
            .times(1)
            .returning(|_, _| Ok(output(5, "")));

        let err = commands(executor).describe(&local(), "job-a").await.unwrap_err();
        assert_eq!(err.exit_code(), 5);
        assert_eq!(err.to_string(), "Pods list request returned ERROR 5");
    }

    #[tokio::test]
    async fn test_list_uses_default_profile() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run_with_updates()
            .withf(|command, purpose| {
                command == "kubectl-kjob list slurm --profile xpk-def-app-profile"
                    && purpose == "list jobs"
            })
            .times(1)
            .returning(|_, _| Ok(0));

        assert!(commands(executor).list(&local()).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_failure() {
        let mut executor = MockCommandExecutor::new();
        executor.expect_run_with_updates().returning(|_, _| Ok(3));

        let err = commands(executor).list(&local()).await.unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "Listing jobs returned ERROR 3");
    }

    #[tokio::test]
    async fn test_cancel_issues_one_batched_delete() {
        let mut executor = MockCommandExecutor::new();
        executor
            .expect_run_with_updates()
            .withf(|command, _| command == "kubectl-kjob delete slurm a b")
            .times(1)
            .returning(|_, _| Ok(4));

        let names = vec!["a".to_string(), "b".to_string()];
        let err = commands(executor).cancel(&local(), &names).await.unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_cancel_without_names_issues_nothing() {
        let mut executor = MockCommandExecutor::new();
        executor.expect_run_with_updates().never();

        let err = commands(executor).cancel(&local(), &[]).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_cancel_rejects_any_invalid_name() {
        let mut executor = MockCommandExecutor::new();
        executor.expect_run_with_updates().never();

        let names = vec!["a".to_string(), "$(reboot)".to_string()];
        let err = commands(executor).cancel(&local(), &names).await.unwrap_err();
        assert!(matches!(err, Error::InvalidName { ref name, .. } if name == "$(reboot)"));
    }
}
