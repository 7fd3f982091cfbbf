//! Kaircam Core - Live-Stream Client Library
//!
//! This crate provides the client-side runtime for a Kaircam stream page:
//! - Page-injected stream configuration
//! - HLS decoder abstraction with fault classification
//! - Player status state machine with automatic fault recovery
//! - Local (in-memory) live-chat management
//! - Stateless navbar/search page controllers
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                     Kaircam Core                       │
//! ├────────────────────────────────────────────────────────┤
//! │                                                        │
//! │  ┌────────────┐   ┌─────────────┐   ┌─────────────┐    │
//! │  │   Stream   │   │   Decoder   │   │    Chat     │    │
//! │  │   Config   │   │  (HLS impl) │   │   Manager   │    │
//! │  └─────┬──────┘   └──────┬──────┘   └──────┬──────┘    │
//! │        │                 │                 │           │
//! │        └────────┬────────┘                 │           │
//! │                 │                          │           │
//! │          ┌──────┴──────┐            ┌──────┴──────┐    │
//! │          │    Video    │            │   Navbar /  │    │
//! │          │    Player   │            │   Search    │    │
//! │          └─────────────┘            └─────────────┘    │
//! └────────────────────────────────────────────────────────┘
//! ```

pub mod chat;
pub mod config;
pub mod decoder;
pub mod error;
pub mod hls;
pub mod player;
pub mod ui;
pub mod util;

pub use chat::{ChatManager, ChatMessage, CharCounter, SendOutcome};
pub use config::StreamConfig;
pub use decoder::{
    DecoderEvent, DecoderEvents, DecoderFactory, DecoderFault, DecoderId, DecoderOptions,
    FaultKind, StreamDecoder,
};
pub use error::{Error, Result};
pub use hls::{HlsDecoder, HlsDecoderFactory};
pub use player::{
    AutoplayBlocked, HeadlessMediaElement, MediaElement, PlayerStatus, StatusOverlay, VideoPlayer,
};
pub use ui::{NavbarController, SearchController};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Kaircam Core initialized");
}
