//! vidpipe - interactive driver for an external video pipeline
//!
//! Prompts the user, launches the external download/transcribe/translate/
//! watermark pipeline or the end-to-end workflow script as a subprocess,
//! and reports the outcome.

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod processor;
pub mod prompt;
pub mod session;
pub mod status;
pub mod workflow;
