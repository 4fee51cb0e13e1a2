use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, VidpipeError};
use crate::processor::Quality;

/// Config file looked up in the current directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "vidpipe.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub processor: ProcessorConfig,
    pub workflow: WorkflowConfig,
    pub demo: DemoConfig,
    pub quick: QuickConfig,
    pub status: StatusConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Program that runs the video pipeline
    pub program: String,
    /// Argument templates; `{url}`, `{watermark}`, `{quality}` and
    /// `{output_dir}` are substituted per run
    pub args: Vec<String>,
    /// Directory the processor writes its results to
    pub output_dir: PathBuf,
    /// Argument used to probe that the program can be spawned
    pub probe_arg: String,
    /// Whether the processor should burn subtitles into the video
    pub embed_subtitles: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Interpreter used to launch the workflow script
    pub interpreter: String,
    /// Path to the end-to-end workflow script
    pub script: PathBuf,
    /// Default video for the end-to-end test
    pub url: String,
    /// Short description printed before confirmation
    pub description: String,
    /// Rough run time shown to the user, in minutes
    pub estimated_minutes: (u32, u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub url: String,
    pub watermark: String,
    pub quality: Quality,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickConfig {
    /// Sample videos offered in quick-test mode
    pub samples: Vec<String>,
    pub watermark: String,
    pub quality: Quality,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// External tools the pipeline depends on
    pub tools: Vec<ToolSpec>,
    /// Files expected in the project directory
    pub required_files: Vec<PathBuf>,
    /// URL fetched to verify the video host is reachable
    pub probe_url: String,
    pub probe_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub program: String,
    pub probe_arg: String,
    pub description: String,
}

impl ToolSpec {
    fn new(program: &str, probe_arg: &str, description: &str) -> Self {
        Self {
            program: program.to_string(),
            probe_arg: probe_arg.to_string(),
            description: description.to_string(),
        }
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: [
                "video_processor.py",
                "--url", "{url}",
                "--watermark", "{watermark}",
                "--quality", "{quality}",
                "--output-dir", "{output_dir}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            output_dir: PathBuf::from("output"),
            probe_arg: "--version".to_string(),
            embed_subtitles: true,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            script: PathBuf::from("complete_bilibili_workflow.py"),
            url: "https://www.youtube.com/watch?v=YIlL0T2yTss".to_string(),
            description: "Ted Cruz vs Tucker Carlson关于伊朗的争论视频".to_string(),
            estimated_minutes: (10, 15),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            url: "https://www.youtube.com/watch?v=aqz-KE-bpKQ".to_string(),
            watermark: "演示水印".to_string(),
            quality: Quality::P1080,
        }
    }
}

impl Default for QuickConfig {
    fn default() -> Self {
        Self {
            samples: vec![
                "https://www.youtube.com/watch?v=aqz-KE-bpKQ".to_string(),
                "https://www.youtube.com/watch?v=ScMzIvxBSi4".to_string(),
            ],
            watermark: "测试水印".to_string(),
            quality: Quality::P480,
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            tools: vec![
                ToolSpec::new("python3", "--version", "Python解释器"),
                ToolSpec::new("yt-dlp", "--version", "YouTube下载"),
                ToolSpec::new("ffmpeg", "-version", "FFmpeg视频处理"),
                ToolSpec::new("whisper", "--help", "Whisper语音识别"),
            ],
            required_files: vec![
                PathBuf::from("video_processor.py"),
                PathBuf::from("complete_bilibili_workflow.py"),
            ],
            probe_url: "https://www.youtube.com".to_string(),
            probe_timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VidpipeError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| VidpipeError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        std::fs::write(path, content)
            .map_err(|e| VidpipeError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Load the explicit config file, else `vidpipe.toml` from `dir`, else defaults
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let local = dir.join(DEFAULT_CONFIG_FILE);
        if local.exists() {
            tracing::info!("Found {} in {}, loading...", DEFAULT_CONFIG_FILE, dir.display());
            Self::from_file(local)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[demo]\nwatermark = \"我的视频\"\nquality = \"720p\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.demo.watermark, "我的视频");
        assert_eq!(config.demo.quality, Quality::P720);
        assert_eq!(config.demo.url, DemoConfig::default().url);
        assert_eq!(config.workflow.interpreter, "python3");
    }

    #[test]
    fn test_save_then_load_keeps_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        let mut config = Config::default();
        config.processor.program = "/opt/pipeline/run".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = Config::load(None, dir.path()).unwrap();
        assert_eq!(loaded.processor.program, "/opt/pipeline/run");
        assert_eq!(loaded.quick.samples.len(), 2);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config.processor.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_invalid_quality_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[demo]\nquality = \"4k\"\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, VidpipeError::Config(_)));
    }
}
