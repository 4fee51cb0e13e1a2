// Interactive sessions
//
// Each session prompts, runs one external step and reports the result:
// - Demo: fixed demo video with the full feature list
// - Quick: pick a sample video and a watermark, low quality
// - WorkflowTest: end-to-end workflow script on a known video
//
// Sessions take their input and output streams as parameters so that
// they run the same way against a terminal and against test buffers.

pub mod demo;
pub mod quick;

use std::error::Error as StdError;
use std::io::Write;

pub use demo::run_demo;
pub use quick::run_quick;
pub use workflow_test::run_workflow_test;

use crate::error::{Result, VidpipeError};

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// User declined the confirmation prompt
    Cancelled,
    Completed,
    /// Failure already reported to the user
    Failed { exit_code: i32 },
}

impl SessionOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            SessionOutcome::Cancelled | SessionOutcome::Completed => 0,
            SessionOutcome::Failed { exit_code } => *exit_code,
        }
    }
}

/// Features of the external pipeline, in processing order
pub const FEATURES: &[&str] = &[
    "YouTube视频下载",
    "使用Whisper进行语音识别",
    "简单英中翻译（基于词典）",
    "添加水印",
    "生成带字幕的视频",
    "导出SRT字幕文件",
];

pub fn show_info<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "=== 项目功能说明 ===")?;
    for (i, feature) in FEATURES.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, feature)?;
    }
    writeln!(out)?;
    writeln!(out, "注意：翻译功能使用简单词典，实际项目可集成更好的翻译API")?;
    writeln!(out)?;
    Ok(())
}

/// Print an error with its full cause chain
pub(crate) fn report_error<W: Write>(out: &mut W, headline: &str, err: &VidpipeError) -> Result<()> {
    writeln!(out, "\n❌ {}: {}", headline, err)?;
    let mut source = err.source();
    while let Some(cause) = source {
        writeln!(out, "    caused by: {}", cause)?;
        source = cause.source();
    }
    if let VidpipeError::ProcessorFailed { stderr, .. } = err {
        if !stderr.is_empty() {
            writeln!(out, "--- stderr ---")?;
            writeln!(out, "{}", stderr)?;
        }
    }
    Ok(())
}
