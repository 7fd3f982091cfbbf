//! HLS decoder backed by `reqwest` + `m3u8-rs`
//!
//! [`HlsDecoder`] implements [`StreamDecoder`] over plain playlist fetching:
//! `load_source`/`start_load` run the fetch pipeline in the background and
//! report the outcome on the event channel, `recover_media_error` re-parses
//! the last fetched body, and `destroy` aborts in-flight work. Fetch failures
//! surface as `Network` faults, unparseable playlists as `Media` faults.

use crate::decoder::{
    DecoderEvent, DecoderEvents, DecoderFactory, DecoderFault, DecoderId, DecoderOptions,
    FaultKind, StreamDecoder,
};
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use m3u8_rs::Playlist;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Summary of a parsed playlist
#[derive(Debug, Clone, Copy)]
struct PlaylistInfo {
    renditions: usize,
    is_live: bool,
}

/// HLS decoder instance
pub struct HlsDecoder {
    id: DecoderId,
    options: DecoderOptions,
    client: reqwest::Client,
    events: mpsc::UnboundedSender<DecoderEvent>,
    source: Mutex<Option<Url>>,
    last_body: Arc<Mutex<Option<Bytes>>>,
    attached: AtomicBool,
    destroyed: Arc<AtomicBool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl HlsDecoder {
    fn new(
        options: DecoderOptions,
        client: reqwest::Client,
        events: mpsc::UnboundedSender<DecoderEvent>,
    ) -> Self {
        Self {
            id: DecoderId::new(),
            options,
            client,
            events,
            source: Mutex::new(None),
            last_body: Arc::new(Mutex::new(None)),
            attached: AtomicBool::new(false),
            destroyed: Arc::new(AtomicBool::new(false)),
            tasks: Mutex::new(Vec::new()),
        }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(Error::DecoderGone);
        }
        Ok(())
    }

    /// Run the playlist fetch pipeline in the background
    ///
    /// Transient fetch failures are reported as non-fatal network faults and
    /// retried up to `manifest_loading_max_retry` times; only the final
    /// failure is fatal.
    fn spawn_fetch(&self, url: Url) {
        let client = self.client.clone();
        let events = self.events.clone();
        let last_body = self.last_body.clone();
        let destroyed = self.destroyed.clone();
        let max_retry = self.options.manifest_loading_max_retry;
        let retry_delay = self.options.manifest_loading_retry_delay;

        let handle = tokio::spawn(async move {
            let mut attempt: u32 = 0;
            loop {
                if destroyed.load(Ordering::SeqCst) {
                    return;
                }
                match fetch_playlist(&client, &url).await {
                    Ok(body) => {
                        *lock(&last_body) = Some(body.clone());
                        match parse_playlist(&body) {
                            Ok(info) => {
                                let _ = events.send(DecoderEvent::ManifestParsed {
                                    renditions: info.renditions,
                                    is_live: info.is_live,
                                });
                            }
                            Err(err) => {
                                let _ = events.send(DecoderEvent::Fault(DecoderFault::fatal(
                                    FaultKind::Media,
                                    err.to_string(),
                                )));
                            }
                        }
                        return;
                    }
                    Err(err) => {
                        attempt += 1;
                        if attempt > max_retry {
                            let _ = events.send(DecoderEvent::Fault(DecoderFault::fatal(
                                FaultKind::Network,
                                err.to_string(),
                            )));
                            return;
                        }
                        let _ = events.send(DecoderEvent::Fault(DecoderFault::non_fatal(
                            FaultKind::Network,
                            format!("fetch attempt {attempt} failed: {err}"),
                        )));
                        tokio::time::sleep(retry_delay).await;
                    }
                }
            }
        });
        let mut tasks = lock(&self.tasks);
        // Reap finished pipelines so repeated restarts don't accumulate handles
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }
}

#[async_trait]
impl StreamDecoder for HlsDecoder {
    fn id(&self) -> DecoderId {
        self.id
    }

    async fn load_source(&self, url: &Url) -> Result<()> {
        self.ensure_alive()?;
        debug!(decoder = %self.id, url = %url, "loading source");
        *lock(&self.source) = Some(url.clone());
        self.spawn_fetch(url.clone());
        Ok(())
    }

    async fn attach_media(&self) -> Result<()> {
        self.ensure_alive()?;
        self.attached.store(true, Ordering::SeqCst);
        debug!(decoder = %self.id, "media attached");
        Ok(())
    }

    async fn start_load(&self) -> Result<()> {
        self.ensure_alive()?;
        if !self.attached.load(Ordering::SeqCst) {
            return Err(Error::Internal("media not attached".to_string()));
        }
        let url = lock(&self.source).clone().ok_or(Error::NoSource)?;
        debug!(decoder = %self.id, url = %url, "restarting load pipeline");
        self.spawn_fetch(url);
        Ok(())
    }

    async fn recover_media_error(&self) -> Result<()> {
        self.ensure_alive()?;
        let cached = lock(&self.last_body).clone();
        match cached {
            Some(body) => match parse_playlist(&body) {
                Ok(info) => {
                    debug!(decoder = %self.id, "recovered from cached playlist");
                    let _ = self.events.send(DecoderEvent::ManifestParsed {
                        renditions: info.renditions,
                        is_live: info.is_live,
                    });
                    Ok(())
                }
                Err(err) => {
                    // Cached body is unusable; refetch from the source
                    warn!(decoder = %self.id, error = %err, "cached playlist unusable, refetching");
                    *lock(&self.last_body) = None;
                    self.start_load().await
                }
            },
            None => self.start_load().await,
        }
    }

    async fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        for handle in lock(&self.tasks).drain(..) {
            handle.abort();
        }
        debug!(decoder = %self.id, "hls decoder destroyed");
    }
}

async fn fetch_playlist(client: &reqwest::Client, url: &Url) -> Result<Bytes> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|source| Error::PlaylistFetch {
            url: url.to_string(),
            source,
        })?;

    response.bytes().await.map_err(|source| Error::PlaylistFetch {
        url: url.to_string(),
        source,
    })
}

fn parse_playlist(body: &[u8]) -> Result<PlaylistInfo> {
    match m3u8_rs::parse_playlist(body) {
        Ok((_, Playlist::MasterPlaylist(master))) => Ok(PlaylistInfo {
            renditions: master.variants.len(),
            is_live: true,
        }),
        Ok((_, Playlist::MediaPlaylist(media))) => Ok(PlaylistInfo {
            renditions: 1,
            is_live: !media.end_list,
        }),
        Err(err) => Err(Error::PlaylistParse(format!("{err:?}"))),
    }
}

/// Factory producing [`HlsDecoder`] instances
#[derive(Debug, Clone)]
pub struct HlsDecoderFactory {
    request_timeout: Duration,
}

impl HlsDecoderFactory {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

impl Default for HlsDecoderFactory {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl DecoderFactory for HlsDecoderFactory {
    fn is_supported(&self) -> bool {
        true
    }

    fn create(&self, options: DecoderOptions) -> Result<(Box<dyn StreamDecoder>, DecoderEvents)> {
        let client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let decoder = HlsDecoder::new(options, client, tx);
        debug!(decoder = %decoder.id, "hls decoder created");
        Ok((Box::new(decoder), rx))
    }
}
