//! Live-chat manager
//!
//! Purely client-local: an append-only in-memory message list with no
//! backend, lost on page reload. Author and text are HTML-escaped before
//! they enter the rendered list, and the list stays pinned to the newest
//! message.

use crate::config::StreamConfig;
use crate::util::{escape_html, now_clock_time};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Maximum accepted message length, in characters
pub const CHAT_MAX_LEN: usize = 500;

/// Draft length past which the char counter shows a warning
pub const CHAT_WARN_LEN: usize = 450;

/// Delay before the synthetic welcome message appears
pub const WELCOME_DELAY: Duration = Duration::from_millis(500);

/// Author shown for synthetic system messages
pub const SYSTEM_AUTHOR: &str = "Sistema";

/// Author shown for the local user's own messages
pub const SELF_AUTHOR: &str = "Tú";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A rendered chat message
///
/// `author` and `text` are stored already escaped; `timestamp` is the
/// wall-clock `HH:MM` at insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub author: String,
    pub text: String,
    pub is_admin: bool,
    pub timestamp: String,
}

/// Outcome of a send attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Message appended to the list
    Sent,
    /// Trimmed text was empty; nothing appended
    Empty,
    /// Text exceeded [`CHAT_MAX_LEN`]; nothing appended
    TooLong,
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent)
    }
}

/// Live character count of the draft input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCounter {
    pub length: usize,
    /// Set once the draft passes [`CHAT_WARN_LEN`]
    pub warning: bool,
}

/// What an Enter keypress in the chat input should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatInputAction {
    Send,
    InsertNewline,
}

/// Enter sends; Shift+Enter inserts a newline
pub fn enter_action(shift_held: bool) -> ChatInputAction {
    if shift_held {
        ChatInputAction::InsertNewline
    } else {
        ChatInputAction::Send
    }
}

struct MessageList {
    messages: Vec<ChatMessage>,
    /// Bumped on every insertion; the page scrolls to the newest message
    /// whenever it observes a new revision
    revision: u64,
}

struct ChatInner {
    config: Arc<StreamConfig>,
    list: Mutex<MessageList>,
    draft: Mutex<String>,
}

impl ChatInner {
    fn append(&self, author: &str, text: &str, is_admin: bool) {
        let message = ChatMessage {
            author: escape_html(author),
            text: escape_html(text),
            is_admin,
            timestamp: now_clock_time(),
        };
        let mut list = lock(&self.list);
        list.messages.push(message);
        list.revision += 1;
        debug!(revision = list.revision, "chat message appended");
    }
}

/// Local chat widget state
pub struct ChatManager {
    inner: Arc<ChatInner>,
}

impl ChatManager {
    /// Create the chat and schedule the welcome message
    ///
    /// The welcome appears once, [`WELCOME_DELAY`] after construction: the
    /// official-channel greeting on the home page, otherwise one addressed
    /// to the stream by name.
    pub fn new(config: Arc<StreamConfig>) -> Self {
        let inner = Arc::new(ChatInner {
            config,
            list: Mutex::new(MessageList {
                messages: Vec::new(),
                revision: 0,
            }),
            draft: Mutex::new(String::new()),
        });

        let welcome_inner = inner.clone();
        tokio::spawn(async move {
            sleep(WELCOME_DELAY).await;
            let text = if welcome_inner.config.is_home {
                "¡Bienvenido al chat oficial de Kaircam!".to_string()
            } else {
                format!("¡Bienvenido al chat de {}!", welcome_inner.config.stream_name)
            };
            welcome_inner.append(SYSTEM_AUTHOR, &text, true);
        });

        Self { inner }
    }

    /// Replace the draft input text
    pub fn set_draft(&self, text: &str) {
        *lock(&self.inner.draft) = text.to_string();
    }

    /// Current draft text
    pub fn draft(&self) -> String {
        lock(&self.inner.draft).clone()
    }

    /// Char counter for the current draft
    pub fn char_counter(&self) -> CharCounter {
        let length = lock(&self.inner.draft).chars().count();
        CharCounter {
            length,
            warning: length > CHAT_WARN_LEN,
        }
    }

    /// Send the current draft; clears it when accepted
    pub fn send(&self) -> SendOutcome {
        let draft = self.draft();
        let outcome = self.send_message(&draft);
        if outcome.is_sent() {
            lock(&self.inner.draft).clear();
        }
        outcome
    }

    /// Validate and append a message from the local user
    ///
    /// Empty (after trimming) and oversized messages leave the list
    /// unchanged. The outcome is returned so a front-end may surface the
    /// rejection; the widget itself stays silent.
    pub fn send_message(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Empty;
        }
        if text.chars().count() > CHAT_MAX_LEN {
            debug!(length = text.chars().count(), "oversized chat message rejected");
            return SendOutcome::TooLong;
        }
        self.inner.append(SELF_AUTHOR, text, false);
        SendOutcome::Sent
    }

    /// Handle an Enter keypress in the chat input
    ///
    /// Returns the send outcome when the press sends, `None` when it inserts
    /// a newline.
    pub fn on_enter(&self, shift_held: bool) -> Option<SendOutcome> {
        match enter_action(shift_held) {
            ChatInputAction::Send => Some(self.send()),
            ChatInputAction::InsertNewline => None,
        }
    }

    /// Snapshot of the rendered message list
    pub fn messages(&self) -> Vec<ChatMessage> {
        lock(&self.inner.list).messages.clone()
    }

    /// List revision; bumps on every insertion (the auto-scroll signal)
    pub fn revision(&self) -> u64 {
        lock(&self.inner.list).revision
    }
}
