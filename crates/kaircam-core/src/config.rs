//! Page-injected stream configuration
//!
//! The stream page injects a single JSON object at load time describing the
//! stream being watched. It is parsed once at startup and shared read-only
//! (as `Arc<StreamConfig>`) by every component that needs it.

use crate::Result;
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration injected by the stream page
///
/// All fields are optional on the wire; a page without stream context
/// deserializes to the defaults (no URL, not live).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamConfig {
    /// HLS playlist URL for the stream, if one is configured
    pub hls_url: Option<Url>,
    /// Whether the stream is currently broadcasting
    pub is_live: bool,
    /// Whether this is the site's home page (official channel)
    pub is_home: bool,
    /// Display name of the stream/channel
    pub stream_name: String,
}

impl StreamConfig {
    /// Parse the page-injected configuration object
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: StreamConfig = serde_json::from_str(raw)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_injected_object() {
        let config = StreamConfig::from_json(
            r#"{
                "hlsUrl": "https://cdn.example.com/live/stream.m3u8",
                "isLive": true,
                "isHome": false,
                "streamName": "Canal Norte"
            }"#,
        )
        .unwrap();

        assert!(config.is_live);
        assert!(!config.is_home);
        assert_eq!(config.stream_name, "Canal Norte");
        assert_eq!(
            config.hls_url.unwrap().as_str(),
            "https://cdn.example.com/live/stream.m3u8"
        );
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = StreamConfig::from_json("{}").unwrap();
        assert!(config.hls_url.is_none());
        assert!(!config.is_live);
        assert_eq!(config.stream_name, "");
    }

    #[test]
    fn null_url_is_accepted() {
        let config = StreamConfig::from_json(r#"{"hlsUrl": null, "isLive": false}"#).unwrap();
        assert!(config.hls_url.is_none());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(StreamConfig::from_json("{not json").is_err());
    }
}
