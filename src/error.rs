use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidpipeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Processor unavailable: {0}")]
    ProcessorUnavailable(String),

    #[error("Processor exited with {}", exit_label(.code))]
    ProcessorFailed { code: Option<i32>, stderr: String },

    #[error("Workflow script exited with {}", exit_label(.code))]
    WorkflowFailed { code: Option<i32> },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported quality '{0}'. Valid values: 360p, 480p, 720p, 1080p, best")]
    InvalidQuality(String),

    #[error("Interrupted by user")]
    Interrupted,
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "a signal".to_string(),
    }
}

impl VidpipeError {
    /// Process exit code to report for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            VidpipeError::WorkflowFailed { code: Some(code) } => *code,
            VidpipeError::Interrupted => 130,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, VidpipeError>;
