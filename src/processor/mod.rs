// External video pipeline integration
//
// The pipeline itself (download, speech recognition, translation,
// watermarking, subtitle muxing) lives in an external program. This
// module describes a run request, launches the program and interprets
// its result:
// - Command: subprocess builder with placeholder substitution
// - External: processor that runs a configured program

pub mod command;
pub mod external;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

pub use command::*;
pub use external::*;

use crate::config::ProcessorConfig;
use crate::error::{Result, VidpipeError};

/// Download quality requested from the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "best")]
    Best,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::P360 => "360p",
            Quality::P480 => "480p",
            Quality::P720 => "720p",
            Quality::P1080 => "1080p",
            Quality::Best => "best",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = VidpipeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "360p" => Ok(Quality::P360),
            "480p" => Ok(Quality::P480),
            "720p" => Ok(Quality::P720),
            "1080p" => Ok(Quality::P1080),
            "best" => Ok(Quality::Best),
            _ => Err(VidpipeError::InvalidQuality(s.to_string())),
        }
    }
}

/// One pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRequest {
    pub url: String,
    pub watermark: String,
    pub quality: Quality,
    pub embed_subtitles: bool,
}

/// Result of a pipeline run that exited successfully
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// File reported by the pipeline; `None` when it produced nothing
    pub output: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
}

/// Main trait for pipeline runs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoProcessor: Send + Sync {
    /// Download, transcribe, translate and watermark a video
    async fn process_video(&self, request: &ProcessRequest) -> Result<ProcessOutcome>;

    /// Directory the pipeline writes to
    fn output_dir(&self) -> PathBuf;

    /// Check that the pipeline program can be launched
    fn check_availability(&self) -> Result<()>;
}

/// Factory for creating processor instances
pub struct ProcessorFactory;

impl ProcessorFactory {
    /// Create the processor backed by the configured external program
    pub fn create_processor(config: ProcessorConfig, run_id: Uuid) -> Box<dyn VideoProcessor> {
        Box::new(external::ExternalProcessor::new(config, run_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_parsing() {
        assert_eq!("1080p".parse::<Quality>().unwrap(), Quality::P1080);
        assert_eq!(" 480P ".parse::<Quality>().unwrap(), Quality::P480);
        assert_eq!("best".parse::<Quality>().unwrap(), Quality::Best);
        assert!(matches!("4k".parse::<Quality>(), Err(VidpipeError::InvalidQuality(q)) if q == "4k"));
    }

    #[test]
    fn test_quality_display_matches_serde_name() {
        for quality in [Quality::P360, Quality::P480, Quality::P720, Quality::P1080, Quality::Best] {
            let json = serde_json::to_string(&quality).unwrap();
            assert_eq!(json, format!("\"{}\"", quality));
        }
    }
}
