//! Kaircam App - page composition root
//!
//! Builds the page's components once the document is interactive: the navbar
//! and search controllers whenever their targets exist, the notification
//! auto-dismiss, and - only when the page carries stream configuration - the
//! video player and the local chat. A single [`App::shutdown`] call at page
//! exit releases the player's decoder.
//!
//! # Example
//!
//! ```rust,no_run
//! use kaircam_app::{App, PageContext};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let page = PageContext::from_page_json(Some(
//!     r#"{"hlsUrl": "https://cdn.example.com/live.m3u8", "isLive": true,
//!         "isHome": false, "streamName": "Canal Norte"}"#,
//! ))?;
//! let app = App::start(page).await?;
//! // ... page lifetime ...
//! app.shutdown().await;
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use kaircam_core::util::NotificationPanel;
use kaircam_core::{
    ChatManager, DecoderFactory, HeadlessMediaElement, HlsDecoderFactory, MediaElement,
    NavbarController, SearchController, StreamConfig, VideoPlayer,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber (env-filtered, like `RUST_LOG`)
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

/// What the current page offers the app
///
/// Constructed by the embedding front-end once the document is interactive;
/// components whose target is absent are simply never built.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub has_navbar: bool,
    pub has_search: bool,
    pub has_notifications: bool,
    /// Present only on stream pages
    pub stream_config: Option<StreamConfig>,
}

impl Default for PageContext {
    fn default() -> Self {
        Self {
            has_navbar: true,
            has_search: true,
            has_notifications: false,
            stream_config: None,
        }
    }
}

impl PageContext {
    /// Build from the page-injected configuration object, if the page has one
    pub fn from_page_json(raw: Option<&str>) -> Result<Self> {
        let stream_config = match raw {
            Some(raw) => Some(StreamConfig::from_json(raw)?),
            None => None,
        };
        Ok(Self {
            stream_config,
            ..Self::default()
        })
    }
}

/// The running page application
///
/// Owns every component for the page's lifetime; replaces the old
/// module-level singleton with an explicit context handed back to the
/// embedder, which calls [`App::shutdown`] exactly once at page exit.
pub struct App {
    navbar: Option<NavbarController>,
    search: Option<SearchController>,
    notifications: Option<NotificationPanel>,
    player: Option<VideoPlayer>,
    chat: Option<ChatManager>,
}

impl App {
    /// Start with the default HLS decoder factory and a headless media element
    pub async fn start(page: PageContext) -> Result<Self> {
        Self::start_with(
            page,
            Arc::new(HlsDecoderFactory::default()),
            Arc::new(HeadlessMediaElement::default()),
        )
        .await
    }

    /// Start with an explicit decoder factory and media element
    pub async fn start_with(
        page: PageContext,
        factory: Arc<dyn DecoderFactory>,
        media: Arc<dyn MediaElement>,
    ) -> Result<Self> {
        kaircam_core::init();

        let navbar = page.has_navbar.then(NavbarController::new);
        let search = page.has_search.then(SearchController::new);

        let notifications = page.has_notifications.then(NotificationPanel::new);
        if let Some(panel) = &notifications {
            panel.auto_dismiss();
        }

        // Stream-page components only exist when the page injected a config
        let (player, chat) = match page.stream_config {
            Some(config) => {
                let config = Arc::new(config);
                let player = VideoPlayer::start(config.clone(), factory, media).await?;
                let chat = ChatManager::new(config);
                (Some(player), Some(chat))
            }
            None => (None, None),
        };

        info!("Kaircam inicializado correctamente");

        Ok(Self {
            navbar,
            search,
            notifications,
            player,
            chat,
        })
    }

    pub fn navbar(&mut self) -> Option<&mut NavbarController> {
        self.navbar.as_mut()
    }

    pub fn search(&self) -> Option<&SearchController> {
        self.search.as_ref()
    }

    pub fn notifications(&self) -> Option<&NotificationPanel> {
        self.notifications.as_ref()
    }

    pub fn player(&self) -> Option<&VideoPlayer> {
        self.player.as_ref()
    }

    pub fn chat(&self) -> Option<&ChatManager> {
        self.chat.as_ref()
    }

    /// Page-exit teardown: release the player's decoder
    pub async fn shutdown(&self) {
        if let Some(player) = &self.player {
            player.shutdown().await;
        }
        info!("Kaircam app shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaircam_core::PlayerStatus;

    #[tokio::test]
    async fn page_without_stream_config_builds_no_player_or_chat() {
        let app = App::start(PageContext::default()).await.unwrap();

        assert!(app.player().is_none());
        assert!(app.chat().is_none());
        assert!(app.search().is_some());

        app.shutdown().await;
    }

    #[tokio::test]
    async fn offline_stream_page_builds_player_and_chat() {
        let page = PageContext::from_page_json(Some(
            r#"{"hlsUrl": "https://cdn.example.com/live.m3u8",
                "isLive": false, "isHome": false, "streamName": "Canal Norte"}"#,
        ))
        .unwrap();
        let app = App::start(page).await.unwrap();

        let player = app.player().expect("stream page builds a player");
        assert_eq!(player.overlay().status, PlayerStatus::Offline);
        assert!(!player.has_decoder().await);
        assert!(app.chat().is_some());

        app.shutdown().await;
    }

    #[tokio::test]
    async fn malformed_page_config_is_an_error() {
        assert!(PageContext::from_page_json(Some("{broken")).is_err());
    }

    #[tokio::test]
    async fn shutdown_releases_the_decoder() {
        let page = PageContext::from_page_json(Some(
            r#"{"hlsUrl": "https://cdn.example.com/live.m3u8",
                "isLive": true, "isHome": true, "streamName": "Kaircam"}"#,
        ))
        .unwrap();
        let app = App::start(page).await.unwrap();

        let player = app.player().expect("live stream page builds a player");
        assert!(player.has_decoder().await);

        app.shutdown().await;
        assert!(!player.has_decoder().await);
    }
}
