use std::collections::HashMap;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::debug;

use crate::error::{Result, VidpipeError};

/// Environment variable carrying the invocation's run id to child processes
pub const RUN_ID_ENV: &str = "VIDPIPE_RUN_ID";

/// Number of stderr lines kept when a child fails
const STDERR_TAIL_LINES: usize = 20;

/// Subprocess invocation
#[derive(Debug, Clone)]
pub struct PipelineCommand {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
    pub description: String,
}

/// What a streamed child left behind
#[derive(Debug)]
pub struct StreamedOutput {
    pub status: ExitStatus,
    /// Last non-empty stdout line
    pub last_line: Option<String>,
    pub stderr: String,
}

impl PipelineCommand {
    pub fn new<S1: Into<String>, S2: Into<String>>(program: S1, description: S2) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            description: description.into(),
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    pub fn path_arg<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    pub fn env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    fn to_tokio(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, e: std::io::Error) -> VidpipeError {
        VidpipeError::ProcessorUnavailable(format!("{}: failed to start '{}': {}", self.description, self.program, e))
    }

    /// Run to completion with the terminal attached, returning the exit status.
    /// Ctrl-C kills the child and yields `Interrupted`.
    pub async fn run_inherited(&self) -> Result<ExitStatus> {
        debug!("Executing {}: {} {:?}", self.description, self.program, self.args);

        let mut child = self.to_tokio()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        tokio::select! {
            status = child.wait() => Ok(status?),
            _ = tokio::signal::ctrl_c() => {
                kill_quietly(&mut child).await;
                Err(VidpipeError::Interrupted)
            }
        }
    }

    /// Run with stdout and stderr captured. Every stdout line is handed to
    /// `on_line` as it arrives. Ctrl-C kills the child and yields `Interrupted`.
    pub async fn stream<F: FnMut(&str)>(&self, mut on_line: F) -> Result<StreamedOutput> {
        debug!("Executing {}: {} {:?}", self.description, self.program, self.args);

        let mut child = self.to_tokio()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child.stdout.take()
            .ok_or_else(|| VidpipeError::ProcessorUnavailable("child stdout not captured".to_string()))?;
        let mut stderr = child.stderr.take()
            .ok_or_else(|| VidpipeError::ProcessorUnavailable("child stderr not captured".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            stderr.read_to_string(&mut buf).await.map(|_| buf)
        });

        let run = async {
            let mut lines = BufReader::new(stdout).lines();
            let mut last_line = None;
            while let Some(line) = lines.next_line().await? {
                on_line(&line);
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    last_line = Some(trimmed.to_string());
                }
            }
            let status = child.wait().await?;
            Ok::<_, VidpipeError>((status, last_line))
        };

        let (status, last_line) = tokio::select! {
            result = run => result?,
            _ = tokio::signal::ctrl_c() => {
                kill_quietly(&mut child).await;
                return Err(VidpipeError::Interrupted);
            }
        };

        let stderr = stderr_task.await
            .map_err(|e| VidpipeError::Io(std::io::Error::other(e)))??;

        Ok(StreamedOutput { status, last_line, stderr })
    }

    /// Launch once synchronously and report whether it exits cleanly
    pub fn probe(&self) -> Result<()> {
        let output = std::process::Command::new(&self.program)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(VidpipeError::ProcessorUnavailable(format!(
                "{} failed: {}",
                self.description,
                tail_lines(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_LINES)
            )))
        }
    }
}

async fn kill_quietly(child: &mut Child) {
    if let Err(e) = child.kill().await {
        debug!("Failed to kill child process: {}", e);
    }
}

/// Substitute `{name}` placeholders from `vars` in one left-to-right pass.
/// Substituted values are never rescanned; unknown placeholders are kept.
pub fn render_template(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}').and_then(|close| vars.get(&after[..close]).map(|v| (close, v))) {
            Some((close, value)) => {
                rendered.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                rendered.push('{');
                rest = after;
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

/// Last `n` non-empty lines of `text`
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

pub(crate) fn stderr_tail(stderr: &str) -> String {
    tail_lines(stderr, STDERR_TAIL_LINES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template() {
        let vars = HashMap::from([("url", "https://v/1".to_string()), ("quality", "480p".to_string())]);
        assert_eq!(render_template("--url={url}", &vars), "--url=https://v/1");
        assert_eq!(render_template("{quality}-{quality}", &vars), "480p-480p");
        assert_eq!(render_template("{unknown}", &vars), "{unknown}");
        assert_eq!(render_template("{{url}}", &vars), "{https://v/1}");
        assert_eq!(render_template("{url", &vars), "{url");
    }

    #[test]
    fn test_render_template_leaves_values_untouched() {
        let vars = HashMap::from([
            ("url", "https://v/{quality}".to_string()),
            ("watermark", "频道{url}".to_string()),
            ("quality", "480p".to_string()),
        ]);
        for _ in 0..50 {
            assert_eq!(render_template("{url}", &vars), "https://v/{quality}");
            assert_eq!(render_template("--watermark={watermark}", &vars), "--watermark=频道{url}");
            assert_eq!(render_template("{watermark}@{quality}", &vars), "频道{url}@480p");
        }
    }

    #[test]
    fn test_tail_lines_skips_blank() {
        assert_eq!(tail_lines("a\n\nb\nc\n\n", 2), "b\nc");
        assert_eq!(tail_lines("", 3), "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stream_reports_last_line_and_stderr() {
        let mut seen = Vec::new();
        let out = PipelineCommand::new("sh", "test")
            .arg("-c")
            .arg("echo step 1; echo oops >&2; echo out.mp4; echo")
            .stream(|line| seen.push(line.to_string()))
            .await
            .unwrap();

        assert!(out.status.success());
        assert_eq!(out.last_line.as_deref(), Some("out.mp4"));
        assert_eq!(out.stderr.trim(), "oops");
        assert_eq!(seen, vec!["step 1", "out.mp4", ""]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_inherited_returns_exit_code() {
        let status = PipelineCommand::new("sh", "test")
            .args(["-c", "exit 7"])
            .run_inherited()
            .await
            .unwrap();
        assert_eq!(status.code(), Some(7));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_env_reaches_child() {
        let out = PipelineCommand::new("sh", "test")
            .args(["-c", "echo $VIDPIPE_RUN_ID"])
            .env(RUN_ID_ENV, "run-42")
            .stream(|_| {})
            .await
            .unwrap();
        assert_eq!(out.last_line.as_deref(), Some("run-42"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_kill_quietly_stops_long_running_child() {
        let mut child = Command::new("sh")
            .args(["-c", "sleep 30"])
            .kill_on_drop(true)
            .spawn()
            .unwrap();

        kill_quietly(&mut child).await;

        let status = child.try_wait().unwrap().expect("child should have exited");
        assert!(!status.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancelled_stream_does_not_wait_for_child() {
        let started = std::time::Instant::now();
        let result = tokio::time::timeout(
            std::time::Duration::from_millis(300),
            PipelineCommand::new("sh", "test").args(["-c", "sleep 30"]).stream(|_| {}),
        )
        .await;

        assert!(result.is_err());
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_sync_check_passes_env() {
        PipelineCommand::new("sh", "test")
            .args(["-c", "test \"$VIDPIPE_RUN_ID\" = run-7"])
            .env(RUN_ID_ENV, "run-7")
            .probe()
            .unwrap();
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let err = PipelineCommand::new("definitely-not-a-real-program-vidpipe", "test")
            .probe()
            .unwrap_err();
        assert!(matches!(err, VidpipeError::ProcessorUnavailable(_)));
    }
}
