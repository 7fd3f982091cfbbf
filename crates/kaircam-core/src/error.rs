//! Error types for Kaircam Core

use thiserror::Error;

/// Result type alias for stream-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stream-client error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Failed to parse stream config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Invalid stream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // Playlist errors
    #[error("Failed to fetch playlist: {url}")]
    PlaylistFetch { url: String, source: reqwest::Error },

    #[error("Failed to parse playlist: {0}")]
    PlaylistParse(String),

    // Decoder errors
    #[error("HLS playback not supported")]
    Unsupported,

    #[error("No source loaded")]
    NoSource,

    #[error("Decoder already destroyed")]
    DecoderGone,

    // Network errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true if this error is recoverable without a full reset
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::PlaylistFetch { .. } | Error::PlaylistParse(_) | Error::Http(_)
        )
    }

    /// Returns the error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::ConfigParse(_) => "CONFIG_PARSE",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::PlaylistFetch { .. } => "PLAYLIST_FETCH",
            Error::PlaylistParse(_) => "PLAYLIST_PARSE",
            Error::Unsupported => "UNSUPPORTED",
            Error::NoSource => "NO_SOURCE",
            Error::DecoderGone => "DECODER_GONE",
            Error::Http(_) => "HTTP",
            Error::Internal(_) => "INTERNAL",
        }
    }
}
