use async_trait::async_trait;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::WorkflowConfig;
use crate::error::{Result, VidpipeError};
use crate::processor::{PipelineCommand, RUN_ID_ENV};

/// Completed end-to-end workflow run
#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    pub elapsed: Duration,
}

/// Runs the end-to-end workflow for one video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkflowRunner: Send + Sync {
    /// Run to completion. A non-zero exit becomes `WorkflowFailed`
    async fn run(&self, url: &str) -> Result<WorkflowOutcome>;
}

/// Launches the workflow script through its interpreter with the terminal attached
pub struct ScriptRunner {
    config: WorkflowConfig,
    run_id: Uuid,
}

impl ScriptRunner {
    pub fn new(config: WorkflowConfig, run_id: Uuid) -> Self {
        Self { config, run_id }
    }

    pub fn build_command(&self, url: &str) -> PipelineCommand {
        PipelineCommand::new(&self.config.interpreter, "Workflow script")
            .path_arg(&self.config.script)
            .arg(url)
            .env(RUN_ID_ENV, self.run_id.to_string())
    }
}

#[async_trait]
impl WorkflowRunner for ScriptRunner {
    async fn run(&self, url: &str) -> Result<WorkflowOutcome> {
        let script: &Path = &self.config.script;
        if !script.exists() {
            return Err(VidpipeError::FileNotFound(script.display().to_string()));
        }

        info!(run_id = %self.run_id, "Running {} {} {}", self.config.interpreter, script.display(), url);
        let timer = Instant::now();
        let status = self.build_command(url).run_inherited().await?;
        let elapsed = timer.elapsed();

        if status.success() {
            info!("Workflow finished in {:.1}s", elapsed.as_secs_f64());
            Ok(WorkflowOutcome { elapsed })
        } else {
            warn!("Workflow exited with {:?} after {:.1}s", status.code(), elapsed.as_secs_f64());
            Err(VidpipeError::WorkflowFailed { code: status.code() })
        }
    }
}
