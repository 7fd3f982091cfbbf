//! Video player - playback lifecycle and fault recovery
//!
//! Owns at most one live decoder instance and a status overlay broadcast to
//! the page over a `watch` channel. Fatal decoder faults drive recovery:
//!
//! ```text
//!            is_live=false
//!  (start) ───────────────► Offline (terminal)
//!     │
//!     │ is_live=true
//!     ▼
//!  Connecting ──manifest parsed──► Hidden (playing)
//!     ▲  │
//!     │  ├── fatal network ──► Reconnecting, start_load() after 2s
//!     │  ├── fatal media ────► Reconnecting, recover_media_error() now
//!     │  └── fatal other ────► Error, destroy + rebuild after 5s ──┐
//!     └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Non-fatal faults are logged and otherwise ignored. Delayed actions carry
//! the generation of the decoder they were scheduled for and become no-ops
//! when the instance has been replaced or torn down in the meantime.

use crate::config::StreamConfig;
use crate::decoder::{
    DecoderEvent, DecoderEvents, DecoderFactory, DecoderFault, DecoderOptions, FaultKind,
};
use crate::{Result, StreamDecoder};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Delay before restarting the load pipeline after a fatal network fault
pub const NETWORK_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Delay before destroying and rebuilding the decoder after an unclassified
/// fatal fault
pub const FULL_RESET_DELAY: Duration = Duration::from_millis(5000);

/// Overlay message: stream is not broadcasting
pub const MSG_OFFLINE: &str = "Transmisión no disponible";
/// Overlay message: initial connection in progress
pub const MSG_CONNECTING: &str = "Conectando al stream...";
/// Overlay message: reconnecting after a network fault
pub const MSG_RECONNECTING: &str = "Reconectando...";
/// Overlay message: recovering from a media fault
pub const MSG_RECOVERING: &str = "Recuperando stream...";
/// Overlay message: unrecovered stream error
pub const MSG_STREAM_ERROR: &str = "Error al cargar el stream";
/// Overlay message: no decoder capability and no native playback
pub const MSG_UNSUPPORTED: &str = "Tu navegador no soporta streaming HLS";

/// Player status shown on the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    /// Stream is not live; terminal
    Offline,
    /// Initial connection
    Connecting,
    /// Recovering from a fatal network/media fault
    Reconnecting,
    /// Unrecovered fault (or no playback capability)
    Error,
    /// Playback is running; overlay not shown
    Hidden,
}

impl PlayerStatus {
    /// Whether the overlay spinner is visible in this status
    pub fn spinner(&self) -> bool {
        matches!(self, PlayerStatus::Connecting | PlayerStatus::Reconnecting)
    }
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerStatus::Offline => write!(f, "offline"),
            PlayerStatus::Connecting => write!(f, "connecting"),
            PlayerStatus::Reconnecting => write!(f, "reconnecting"),
            PlayerStatus::Error => write!(f, "error"),
            PlayerStatus::Hidden => write!(f, "hidden"),
        }
    }
}

/// View-model of the status overlay above the video element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusOverlay {
    pub status: PlayerStatus,
    pub message: String,
}

impl StatusOverlay {
    /// Overlay in its hidden state
    pub fn hidden() -> Self {
        Self {
            status: PlayerStatus::Hidden,
            message: String::new(),
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.status == PlayerStatus::Hidden
    }

    pub fn spinner_visible(&self) -> bool {
        self.status.spinner()
    }
}

/// The page's video element, as far as the player needs it
pub trait MediaElement: Send + Sync {
    /// Whether the element can play HLS without a decoder (Safari)
    fn can_play_hls_natively(&self) -> bool {
        false
    }

    /// Point the element directly at a source URL (native playback path)
    fn set_source(&self, url: &Url);

    /// Attempt to start playback; `Err` means autoplay was blocked and
    /// playback waits for user interaction
    fn play(&self) -> std::result::Result<(), AutoplayBlocked>;
}

/// Autoplay was refused by the environment
#[derive(Debug, Clone, Copy)]
pub struct AutoplayBlocked;

/// A [`MediaElement`] with no rendering backend
///
/// Counts playback attempts; used by headless embeddings and tests.
#[derive(Debug, Default)]
pub struct HeadlessMediaElement {
    play_attempts: AtomicUsize,
    native_hls: bool,
}

impl HeadlessMediaElement {
    pub fn with_native_hls() -> Self {
        Self {
            play_attempts: AtomicUsize::new(0),
            native_hls: true,
        }
    }

    pub fn play_attempts(&self) -> usize {
        self.play_attempts.load(Ordering::SeqCst)
    }
}

impl MediaElement for HeadlessMediaElement {
    fn can_play_hls_natively(&self) -> bool {
        self.native_hls
    }

    fn set_source(&self, url: &Url) {
        debug!(url = %url, "native source set");
    }

    fn play(&self) -> std::result::Result<(), AutoplayBlocked> {
        self.play_attempts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct PlayerInner {
    config: Arc<StreamConfig>,
    factory: Arc<dyn DecoderFactory>,
    media: Arc<dyn MediaElement>,
    /// The single live decoder instance, if any
    decoder: Mutex<Option<Box<dyn StreamDecoder>>>,
    /// Bumped every time the decoder instance changes or the player shuts
    /// down; pending timers compare against it before acting
    generation: AtomicU64,
    overlay_tx: watch::Sender<StatusOverlay>,
}

impl PlayerInner {
    fn set_overlay(&self, status: PlayerStatus, message: &str) {
        debug!(status = %status, message, "overlay updated");
        self.overlay_tx.send_replace(StatusOverlay {
            status,
            message: message.to_string(),
        });
    }

    fn hide_overlay(&self) {
        self.overlay_tx.send_replace(StatusOverlay::hidden());
    }
}

/// Player for the page's live stream
///
/// Construct with [`VideoPlayer::start`]; release with
/// [`VideoPlayer::shutdown`] when the page is left.
pub struct VideoPlayer {
    inner: Arc<PlayerInner>,
}

impl VideoPlayer {
    /// Wire up playback for the given stream configuration
    ///
    /// Without an HLS URL the player stays inert. A non-live stream shows the
    /// offline overlay and never constructs a decoder. Otherwise the decoder
    /// is built and attached, falling back to native playback where the
    /// element supports it, or to a terminal error overlay.
    #[instrument(skip_all, fields(stream = %config.stream_name))]
    pub async fn start(
        config: Arc<StreamConfig>,
        factory: Arc<dyn DecoderFactory>,
        media: Arc<dyn MediaElement>,
    ) -> Result<Self> {
        let (overlay_tx, _) = watch::channel(StatusOverlay::hidden());
        let inner = Arc::new(PlayerInner {
            config: config.clone(),
            factory,
            media,
            decoder: Mutex::new(None),
            generation: AtomicU64::new(0),
            overlay_tx,
        });
        let player = Self {
            inner: inner.clone(),
        };

        let Some(url) = config.hls_url.clone() else {
            return Ok(player);
        };

        if !config.is_live {
            inner.set_overlay(PlayerStatus::Offline, MSG_OFFLINE);
            return Ok(player);
        }

        inner.set_overlay(PlayerStatus::Connecting, MSG_CONNECTING);

        if inner.factory.is_supported() {
            attach_decoder(&inner, &url).await?;
        } else if inner.media.can_play_hls_natively() {
            // Native playback: hand the URL straight to the element
            info!(url = %url, "no decoder support, using native HLS playback");
            inner.media.set_source(&url);
            inner.hide_overlay();
            if inner.media.play().is_err() {
                debug!("autoplay blocked, waiting for user interaction");
            }
        } else {
            warn!("no HLS playback capability in this environment");
            inner.set_overlay(PlayerStatus::Error, MSG_UNSUPPORTED);
        }

        Ok(player)
    }

    /// Subscribe to overlay updates
    pub fn subscribe_overlay(&self) -> watch::Receiver<StatusOverlay> {
        self.inner.overlay_tx.subscribe()
    }

    /// Current overlay state
    pub fn overlay(&self) -> StatusOverlay {
        self.inner.overlay_tx.borrow().clone()
    }

    /// Whether a decoder instance is currently alive
    pub async fn has_decoder(&self) -> bool {
        self.inner.decoder.lock().await.is_some()
    }

    /// Release the active decoder and invalidate pending recovery timers
    #[instrument(skip_all)]
    pub async fn shutdown(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(decoder) = self.inner.decoder.lock().await.take() {
            decoder.destroy().await;
            info!("decoder released");
        }
    }
}

/// Build a fresh decoder, make it the player's single live instance, and
/// spawn its event loop
///
/// Boxed: the future recurses through the event loop's full-reset path
/// (attach -> event loop -> reset -> attach), so it cannot be an opaque
/// `async fn` type.
fn attach_decoder<'a>(
    inner: &'a Arc<PlayerInner>,
    url: &'a Url,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        let (decoder, events) = inner.factory.create(DecoderOptions::default())?;
        let id = decoder.id();
        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        decoder.load_source(url).await?;
        decoder.attach_media().await?;
        *inner.decoder.lock().await = Some(decoder);

        info!(decoder = %id, generation, "decoder attached");

        let loop_inner = inner.clone();
        let source = url.clone();
        tokio::spawn(run_event_loop(loop_inner, events, generation, source));

        Ok(())
    })
}

async fn run_event_loop(
    inner: Arc<PlayerInner>,
    mut events: DecoderEvents,
    generation: u64,
    source: Url,
) {
    while let Some(event) = events.recv().await {
        if inner.generation.load(Ordering::SeqCst) != generation {
            // Instance replaced underneath us; stop listening
            return;
        }
        match event {
            DecoderEvent::ManifestParsed {
                renditions,
                is_live,
            } => {
                info!(renditions, is_live, "manifest parsed");
                inner.hide_overlay();
                if inner.media.play().is_err() {
                    // Playback starts on the next user interaction
                    debug!("autoplay blocked, waiting for user interaction");
                }
            }
            DecoderEvent::Fault(fault) => handle_fault(&inner, fault, generation, &source).await,
        }
    }
}

async fn handle_fault(inner: &Arc<PlayerInner>, fault: DecoderFault, generation: u64, source: &Url) {
    if !fault.fatal {
        debug!(kind = %fault.kind, detail = %fault.detail, "non-fatal decoder fault ignored");
        return;
    }

    error!(kind = %fault.kind, detail = %fault.detail, "fatal decoder fault");

    match fault.kind {
        FaultKind::Network => {
            inner.set_overlay(PlayerStatus::Reconnecting, MSG_RECONNECTING);
            let retry_inner = inner.clone();
            tokio::spawn(async move {
                tokio::time::sleep(NETWORK_RETRY_DELAY).await;
                if retry_inner.generation.load(Ordering::SeqCst) != generation {
                    return;
                }
                let guard = retry_inner.decoder.lock().await;
                if let Some(decoder) = guard.as_ref() {
                    if let Err(err) = decoder.start_load().await {
                        warn!(error = %err, "load restart failed");
                    }
                }
            });
        }
        FaultKind::Media => {
            // Media faults are recovered in place, no delay
            inner.set_overlay(PlayerStatus::Reconnecting, MSG_RECOVERING);
            let guard = inner.decoder.lock().await;
            if let Some(decoder) = guard.as_ref() {
                if let Err(err) = decoder.recover_media_error().await {
                    warn!(error = %err, "media recovery failed");
                }
            }
        }
        FaultKind::Other => {
            inner.set_overlay(PlayerStatus::Error, MSG_STREAM_ERROR);
            let reset_inner = inner.clone();
            let source = source.clone();
            tokio::spawn(async move {
                tokio::time::sleep(FULL_RESET_DELAY).await;
                if reset_inner.generation.load(Ordering::SeqCst) != generation {
                    return;
                }
                reset_decoder(&reset_inner, &source, generation).await;
            });
        }
    }
}

/// Full reset: destroy the current decoder and build a replacement
///
/// `scheduled` is the generation the reset was scheduled for; it is
/// re-checked after the old instance is released, since teardown can run
/// while `destroy()` is in flight and a rebuild after that would leave a
/// decoder nothing ever releases.
async fn reset_decoder(inner: &Arc<PlayerInner>, source: &Url, scheduled: u64) {
    let old = inner.decoder.lock().await.take();
    let Some(old) = old else {
        // Torn down while the reset was pending
        return;
    };
    old.destroy().await;

    if inner.generation.load(Ordering::SeqCst) != scheduled {
        // Torn down while the old instance was being released
        return;
    }

    info!("rebuilding decoder after unrecovered fault");
    inner.set_overlay(PlayerStatus::Connecting, MSG_CONNECTING);
    if let Err(err) = attach_decoder(inner, source).await {
        error!(error = %err, code = err.error_code(), "decoder rebuild failed");
        inner.set_overlay(PlayerStatus::Error, MSG_STREAM_ERROR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_only_while_connecting() {
        assert!(PlayerStatus::Connecting.spinner());
        assert!(PlayerStatus::Reconnecting.spinner());
        assert!(!PlayerStatus::Offline.spinner());
        assert!(!PlayerStatus::Error.spinner());
        assert!(!PlayerStatus::Hidden.spinner());
    }

    #[test]
    fn hidden_overlay_has_no_message() {
        let overlay = StatusOverlay::hidden();
        assert!(overlay.is_hidden());
        assert!(!overlay.spinner_visible());
        assert!(overlay.message.is_empty());
    }
}
