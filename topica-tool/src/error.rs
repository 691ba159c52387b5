use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Config error in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logger error: {0}")]
    Logger(String),

    #[error("Unknown topic '{id}'. Available topics: {available}")]
    UnknownTopic { id: String, available: String },

    #[error("Gemini error: {0}")]
    Gemini(#[from] topica_gemini::GeminiError),
}
