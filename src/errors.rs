use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The in-memory state was updated but the profile could not be written.
    #[error("Profile saved for this session only; persisting it failed: {0:#}")]
    Persist(anyhow::Error),

    #[error("Failed to clear persisted profile: {0:#}")]
    Clear(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No application data to export.")]
    NoApplications,

    #[error("Failed to write export file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("{0} environment variable not set")]
    MissingApiKey(&'static str),

    #[error("No AI provider configured")]
    NoProvider,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model returned empty content")]
    EmptyContent,

    #[error("Match score {0} outside 0-100")]
    ScoreOutOfRange(f64),
}
