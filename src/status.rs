//! Environment check for the external pipeline.
//!
//! Verifies that the tools the pipeline shells out to can be launched,
//! that the project files are in place, and that the video host answers.

use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{Config, ToolSpec};
use crate::error::Result;
use crate::processor::PipelineCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    fn icon(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "✅",
            CheckStatus::Warn => "⚠️",
            CheckStatus::Fail => "❌",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub category: String,
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub checks: Vec<CheckResult>,
}

impl StatusReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.status != CheckStatus::Fail)
    }

    /// Worst status per category, in first-seen order
    pub fn summary(&self) -> Vec<(String, CheckStatus)> {
        let mut summary: Vec<(String, CheckStatus)> = Vec::new();
        for check in &self.checks {
            match summary.iter_mut().find(|(category, _)| *category == check.category) {
                Some((_, status)) => {
                    if severity(check.status) > severity(*status) {
                        *status = check.status;
                    }
                }
                None => summary.push((check.category.clone(), check.status)),
            }
        }
        summary
    }

    pub fn print<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "=== YouTube视频处理工具 - 状态检查 ===")?;

        let mut current = "";
        for check in &self.checks {
            if check.category != current {
                writeln!(out, "\n检查{}:", check.category)?;
                current = check.category.as_str();
            }
            if check.detail.is_empty() {
                writeln!(out, "{} {}", check.status.icon(), check.name)?;
            } else {
                writeln!(out, "{} {} - {}", check.status.icon(), check.name, check.detail)?;
            }
        }

        writeln!(out, "\n{}", "=".repeat(50))?;
        writeln!(out, "检查总结:")?;
        for (category, status) in self.summary() {
            let label = if status == CheckStatus::Fail { "❌ 失败" } else { "✅ 通过" };
            writeln!(out, "{}: {}", category, label)?;
        }

        writeln!(out, "\n{}", "=".repeat(50))?;
        if self.passed() {
            writeln!(out, "🎉 所有检查通过！项目已准备就绪")?;
            writeln!(out, "\n推荐使用方法:")?;
            writeln!(out, "1. vidpipe demo - 运行演示")?;
            writeln!(out, "2. vidpipe quick - 快速测试")?;
            writeln!(out, "3. vidpipe workflow-test - 完整流程测试")?;
        } else {
            writeln!(out, "⚠️ 有些检查未通过，请解决问题后重试")?;
            writeln!(out, "\n解决方法:")?;
            writeln!(out, "1. 安装缺失的外部工具并确认其在 PATH 中")?;
            writeln!(out, "2. 在项目目录中运行，或在 vidpipe.toml 中配置脚本路径")?;
            writeln!(out, "3. 检查网络连接")?;
        }
        Ok(())
    }
}

fn severity(status: CheckStatus) -> u8 {
    match status {
        CheckStatus::Pass => 0,
        CheckStatus::Warn => 1,
        CheckStatus::Fail => 2,
    }
}

fn check(category: &str, name: &str, status: CheckStatus, detail: impl Into<String>) -> CheckResult {
    CheckResult {
        category: category.to_string(),
        name: name.to_string(),
        status,
        detail: detail.into(),
    }
}

pub fn check_tool(tool: &ToolSpec) -> CheckResult {
    let name = format!("{} ({})", tool.description, tool.program);
    match PipelineCommand::new(&tool.program, &tool.description).arg(&tool.probe_arg).probe() {
        Ok(()) => check("依赖工具", &name, CheckStatus::Pass, ""),
        Err(e) => {
            debug!("Tool check failed for {}: {}", tool.program, e);
            check("依赖工具", &name, CheckStatus::Fail, "未安装或无法运行")
        }
    }
}

pub fn check_file(base: &Path, file: &Path) -> CheckResult {
    let name = file.display().to_string();
    if base.join(file).exists() {
        check("项目文件", &name, CheckStatus::Pass, "")
    } else {
        check("项目文件", &name, CheckStatus::Fail, "文件缺失")
    }
}

pub fn check_output_dir(base: &Path, dir: &Path) -> CheckResult {
    let name = format!("{}目录", dir.display());
    if base.join(dir).is_dir() {
        check("项目文件", &name, CheckStatus::Pass, "")
    } else {
        check("项目文件", &name, CheckStatus::Warn, "将在首次运行时创建")
    }
}

pub async fn check_network(url: &str, timeout: Duration) -> CheckResult {
    let client = match reqwest::Client::builder()
        .user_agent(concat!("vidpipe/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
    {
        Ok(client) => client,
        Err(e) => return check("网络连接", url, CheckStatus::Fail, e.to_string()),
    };

    match client.get(url).send().await {
        Ok(response) if response.status().is_success() || response.status().is_redirection() => {
            check("网络连接", url, CheckStatus::Pass, format!("HTTP {}", response.status().as_u16()))
        }
        Ok(response) => check("网络连接", url, CheckStatus::Warn, format!("HTTP {}", response.status().as_u16())),
        Err(e) => check("网络连接", url, CheckStatus::Fail, e.to_string()),
    }
}

/// Run every configured check relative to `base`
pub async fn run_checks(config: &Config, base: &Path) -> StatusReport {
    info!("Running environment checks in {}", base.display());
    let mut checks = Vec::new();

    checks.extend(config.status.tools.iter().map(check_tool));
    checks.extend(config.status.required_files.iter().map(|file| check_file(base, file)));
    checks.push(check_output_dir(base, &config.processor.output_dir));
    if !config.status.probe_url.is_empty() {
        let timeout = Duration::from_secs(config.status.probe_timeout_secs);
        checks.push(check_network(&config.status.probe_url, timeout).await);
    }

    StatusReport { checks }
}
