use async_trait::async_trait;
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ProcessorConfig;
use crate::error::{Result, VidpipeError};
use super::command::{render_template, stderr_tail, PipelineCommand, RUN_ID_ENV};
use super::{ProcessOutcome, ProcessRequest, VideoProcessor};

/// Processor that runs the configured pipeline program
pub struct ExternalProcessor {
    config: ProcessorConfig,
    run_id: Uuid,
}

impl ExternalProcessor {
    pub fn new(config: ProcessorConfig, run_id: Uuid) -> Self {
        Self { config, run_id }
    }

    /// Build the pipeline command for one request
    pub fn build_command(&self, request: &ProcessRequest) -> PipelineCommand {
        let vars = HashMap::from([
            ("url", request.url.clone()),
            ("watermark", request.watermark.clone()),
            ("quality", request.quality.to_string()),
            ("output_dir", self.config.output_dir.to_string_lossy().to_string()),
        ]);

        let mut command = PipelineCommand::new(&self.config.program, "Video processing")
            .args(self.config.args.iter().map(|arg| render_template(arg, &vars)))
            .env(RUN_ID_ENV, self.run_id.to_string());

        if !request.embed_subtitles {
            command = command.arg("--no-embed-subtitles");
        }
        command
    }

    /// Interpret the reported path relative to the output directory
    fn resolve_output(&self, reported: &str) -> PathBuf {
        let path = Path::new(reported);
        if path.is_absolute() || path.starts_with(&self.config.output_dir) {
            path.to_path_buf()
        } else {
            self.config.output_dir.join(path)
        }
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {wide_msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

#[async_trait]
impl VideoProcessor for ExternalProcessor {
    async fn process_video(&self, request: &ProcessRequest) -> Result<ProcessOutcome> {
        info!(run_id = %self.run_id, "Processing {} (quality {})", request.url, request.quality);

        fs::create_dir_all(&self.config.output_dir).await?;

        let command = self.build_command(request);
        let started_at = Local::now();
        let timer = Instant::now();

        let pb = spinner();
        pb.set_message("starting pipeline...");
        let streamed = command.stream(|line| {
            debug!("│ {}", line);
            if !line.trim().is_empty() {
                pb.set_message(line.trim().to_string());
            }
        }).await;
        pb.finish_and_clear();

        let streamed = streamed?;
        let elapsed = timer.elapsed();

        if !streamed.status.success() {
            warn!("Pipeline failed after {:.1}s", elapsed.as_secs_f64());
            return Err(VidpipeError::ProcessorFailed {
                code: streamed.status.code(),
                stderr: stderr_tail(&streamed.stderr),
            });
        }

        let output = streamed.last_line.as_deref().map(|line| self.resolve_output(line));
        match &output {
            Some(path) => info!("Pipeline produced {} in {:.1}s", path.display(), elapsed.as_secs_f64()),
            None => warn!("Pipeline exited cleanly but reported no output file"),
        }

        Ok(ProcessOutcome {
            output,
            output_dir: self.config.output_dir.clone(),
            started_at,
            elapsed,
        })
    }

    fn output_dir(&self) -> PathBuf {
        self.config.output_dir.clone()
    }

    fn check_availability(&self) -> Result<()> {
        PipelineCommand::new(&self.config.program, "Processor availability check")
            .arg(&self.config.probe_arg)
            .probe()?;
        info!("Processor '{}' is available", self.config.program);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Quality;
    use tempfile::tempdir;

    fn request() -> ProcessRequest {
        ProcessRequest {
            url: "https://www.youtube.com/watch?v=aqz-KE-bpKQ".to_string(),
            watermark: "演示水印".to_string(),
            quality: Quality::P1080,
            embed_subtitles: true,
        }
    }

    fn config_with(program: &str, args: &[&str], output_dir: &Path) -> ProcessorConfig {
        ProcessorConfig {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            output_dir: output_dir.to_path_buf(),
            probe_arg: "-c".to_string(),
            embed_subtitles: true,
        }
    }

    #[test]
    fn test_build_command_substitutes_placeholders() {
        let processor = ExternalProcessor::new(ProcessorConfig::default(), Uuid::nil());
        let command = processor.build_command(&request());

        assert_eq!(command.program, "python3");
        assert_eq!(command.args, vec![
            "video_processor.py",
            "--url", "https://www.youtube.com/watch?v=aqz-KE-bpKQ",
            "--watermark", "演示水印",
            "--quality", "1080p",
            "--output-dir", "output",
        ]);
        assert!(command.envs.contains(&(RUN_ID_ENV.to_string(), Uuid::nil().to_string())));
    }

    #[test]
    fn test_build_command_without_subtitles() {
        let processor = ExternalProcessor::new(ProcessorConfig::default(), Uuid::nil());
        let mut req = request();
        req.embed_subtitles = false;
        let command = processor.build_command(&req);
        assert_eq!(command.args.last().map(String::as_str), Some("--no-embed-subtitles"));
    }

    #[test]
    fn test_build_command_keeps_braces_in_user_values() {
        let config = config_with("proc", &["--url", "{url}", "--watermark", "{watermark}"], Path::new("out"));
        let processor = ExternalProcessor::new(config, Uuid::nil());
        let mut req = request();
        req.url = "https://v/{quality}".to_string();
        req.watermark = "频道{url}".to_string();

        for _ in 0..50 {
            let command = processor.build_command(&req);
            assert_eq!(command.args, vec!["--url", "https://v/{quality}", "--watermark", "频道{url}"]);
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_video_resolves_relative_output() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("output");
        let config = config_with("sh", &["-c", "touch \"$1/$2.mp4\" && echo \"$2.mp4\"", "sh", "{output_dir}", "{quality}"], &out);
        let processor = ExternalProcessor::new(config, Uuid::new_v4());

        let outcome = processor.process_video(&request()).await.unwrap();
        assert_eq!(outcome.output, Some(out.join("1080p.mp4")));
        assert!(out.join("1080p.mp4").exists());
        assert_eq!(outcome.output_dir, out);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_video_without_output_line() {
        let dir = tempdir().unwrap();
        let config = config_with("sh", &["-c", "true"], dir.path());
        let processor = ExternalProcessor::new(config, Uuid::new_v4());

        let outcome = processor.process_video(&request()).await.unwrap();
        assert!(outcome.output.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_video_failure_carries_code_and_stderr() {
        let dir = tempdir().unwrap();
        let config = config_with("sh", &["-c", "echo 'download failed' >&2; exit 2"], dir.path());
        let processor = ExternalProcessor::new(config, Uuid::new_v4());

        match processor.process_video(&request()).await {
            Err(VidpipeError::ProcessorFailed { code, stderr }) => {
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "download failed");
            }
            other => panic!("unexpected result: {:?}", other.map(|o| o.output)),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_check_availability() {
        let dir = tempdir().unwrap();
        let mut config = config_with("true", &[], dir.path());
        assert!(ExternalProcessor::new(config.clone(), Uuid::nil()).check_availability().is_ok());

        config.program = "false".to_string();
        assert!(ExternalProcessor::new(config, Uuid::nil()).check_availability().is_err());
    }
}
