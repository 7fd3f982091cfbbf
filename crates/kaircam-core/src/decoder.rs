//! Streaming-decoder abstraction
//!
//! The player drives playback through [`StreamDecoder`], an object-safe view
//! of an HLS decoder: load a source, attach it to a media element, restart
//! the load pipeline, recover from media errors, and release it. Decoders
//! report back on an event channel as either a parsed manifest or a
//! classified fault.

use crate::Result;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;
use uuid::Uuid;

/// Unique identity of a decoder instance
///
/// Recovery timers capture the identity of the instance they were scheduled
/// for, so a delayed action can tell whether the decoder it meant to poke is
/// still the one the player owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecoderId(Uuid);

impl DecoderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DecoderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DecoderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Classification of a decoder fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Playlist/segment delivery failed
    Network,
    /// Decode/buffer pipeline failed
    Media,
    /// Anything else the decoder reports
    Other,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::Network => write!(f, "network"),
            FaultKind::Media => write!(f, "media"),
            FaultKind::Other => write!(f, "other"),
        }
    }
}

/// A fault reported by the decoder
#[derive(Debug, Clone)]
pub struct DecoderFault {
    pub kind: FaultKind,
    /// Fatal faults halt playback and require recovery; non-fatal faults are
    /// informational only
    pub fatal: bool,
    pub detail: String,
}

impl DecoderFault {
    pub fn fatal(kind: FaultKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            fatal: true,
            detail: detail.into(),
        }
    }

    pub fn non_fatal(kind: FaultKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            fatal: false,
            detail: detail.into(),
        }
    }
}

/// Events emitted by a decoder instance
#[derive(Debug, Clone)]
pub enum DecoderEvent {
    /// The stream manifest was fetched and parsed; playback can begin
    ManifestParsed { renditions: usize, is_live: bool },
    /// Something went wrong, classified by [`FaultKind`]
    Fault(DecoderFault),
}

/// Receiving half of a decoder's event channel
pub type DecoderEvents = mpsc::UnboundedReceiver<DecoderEvent>;

/// Decoder tuning, mirroring the live page's low-latency profile
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    pub enable_worker: bool,
    pub low_latency_mode: bool,
    pub live_sync_duration_count: u32,
    pub live_max_latency_duration_count: u32,
    pub max_buffer_length: u32,
    pub max_max_buffer_length: u32,
    pub manifest_loading_max_retry: u32,
    pub manifest_loading_retry_delay: Duration,
    pub level_loading_max_retry: u32,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            enable_worker: true,
            low_latency_mode: true,
            live_sync_duration_count: 3,
            live_max_latency_duration_count: 10,
            max_buffer_length: 30,
            max_max_buffer_length: 60,
            manifest_loading_max_retry: 5,
            manifest_loading_retry_delay: Duration::from_millis(1000),
            level_loading_max_retry: 4,
        }
    }
}

/// Object-safe decoder driven by the player
#[async_trait]
pub trait StreamDecoder: Send + Sync {
    /// Instance identity, stable for the decoder's lifetime
    fn id(&self) -> DecoderId;

    /// Begin loading the given playlist URL
    async fn load_source(&self, url: &Url) -> Result<()>;

    /// Bind the decoder to the page's media element
    async fn attach_media(&self) -> Result<()>;

    /// Restart the load pipeline after a network fault
    async fn start_load(&self) -> Result<()>;

    /// Attempt in-place recovery from a media fault
    async fn recover_media_error(&self) -> Result<()>;

    /// Release all decoder resources; the instance is unusable afterwards
    async fn destroy(&self);
}

/// Capability check and construction of decoder instances
pub trait DecoderFactory: Send + Sync {
    /// Whether this environment can run the decoder at all
    fn is_supported(&self) -> bool;

    /// Construct a fresh decoder and its event channel
    fn create(&self, options: DecoderOptions) -> Result<(Box<dyn StreamDecoder>, DecoderEvents)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_match_live_profile() {
        let options = DecoderOptions::default();
        assert!(options.enable_worker);
        assert!(options.low_latency_mode);
        assert_eq!(options.live_sync_duration_count, 3);
        assert_eq!(options.live_max_latency_duration_count, 10);
        assert_eq!(options.max_buffer_length, 30);
        assert_eq!(options.max_max_buffer_length, 60);
        assert_eq!(options.manifest_loading_max_retry, 5);
        assert_eq!(options.manifest_loading_retry_delay, Duration::from_millis(1000));
        assert_eq!(options.level_loading_max_retry, 4);
    }

    #[test]
    fn decoder_ids_are_unique() {
        assert_ne!(DecoderId::new(), DecoderId::new());
    }
}
