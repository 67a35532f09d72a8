// ABOUTME: Job execution surface - run one named sync job or all of them
// ABOUTME: Job-level errors abort the call; per-target errors ride in outcomes

use std::collections::BTreeMap;

use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::sync::{self, SyncOutcome};

/// The result of executing a single sync job: the source checksum plus one
/// outcome per target.
#[derive(Debug)]
pub struct ExecJobResult {
    pub checksum: String,
    pub outcomes: Vec<SyncOutcome>,
}

impl Config {
    /// Execute a single job by name.
    ///
    /// An unknown name or an unreachable source is the call's error; a
    /// failing target only marks its own outcome.
    pub async fn exec_job(&self, job_name: &str) -> Result<ExecJobResult> {
        let job = self.job(job_name)?;

        tracing::info!(
            "Executing job '{}' against {} targets",
            job_name,
            job.targets.len()
        );

        let (checksum, outcomes) = sync::sync_targets(job).await?;
        Ok(ExecJobResult { checksum, outcomes })
    }

    /// Execute all jobs in the config, sequentially, keyed by job name.
    ///
    /// Every job is attempted; failures land in the error map instead of
    /// short-circuiting the rest.
    pub async fn exec_all_jobs(
        &self,
    ) -> (BTreeMap<String, ExecJobResult>, BTreeMap<String, SyncError>) {
        let mut results = BTreeMap::new();
        let mut errors = BTreeMap::new();

        for job in &self.jobs {
            match self.exec_job(&job.name).await {
                Ok(result) => {
                    results.insert(job.name.clone(), result);
                }
                Err(err) => {
                    tracing::error!("Job '{}' failed: {}", job.name, err);
                    errors.insert(job.name.clone(), err);
                }
            }
        }

        (results, errors)
    }
}
