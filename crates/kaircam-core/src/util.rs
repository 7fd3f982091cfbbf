//! Shared helpers: clock formatting, HTML escaping, notification auto-dismiss

use chrono::{Local, Timelike};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Delay before a notification panel begins fading out
pub const NOTIFICATION_DISMISS_DELAY: Duration = Duration::from_secs(5);

/// Duration of the fade-out transition before removal
pub const NOTIFICATION_FADE: Duration = Duration::from_millis(300);

/// Format a time of day as zero-padded `HH:MM`
pub fn clock_time<T: Timelike>(time: &T) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Current wall-clock time as `HH:MM`
pub fn now_clock_time() -> String {
    clock_time(&Local::now())
}

/// Escape text for insertion into markup
///
/// Applied to every chat author/text before it enters the rendered list, so
/// user-supplied content can never become executable markup.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Lifecycle of a transient notification panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationState {
    /// Fully visible
    Visible,
    /// Fading out (opacity transitioned to zero)
    Fading,
    /// Removed from the page
    Removed,
}

/// A server-rendered notification panel that dismisses itself
///
/// Visible for [`NOTIFICATION_DISMISS_DELAY`], then fades for
/// [`NOTIFICATION_FADE`], then is removed. Pages without a panel simply never
/// construct one.
#[derive(Debug, Clone)]
pub struct NotificationPanel {
    state: Arc<Mutex<NotificationState>>,
}

impl NotificationPanel {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(NotificationState::Visible)),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> NotificationState {
        *self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedule the dismiss/fade/remove sequence
    pub fn auto_dismiss(&self) {
        let state = self.state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(NOTIFICATION_DISMISS_DELAY).await;
            *state.lock().unwrap_or_else(PoisonError::into_inner) = NotificationState::Fading;
            tokio::time::sleep(NOTIFICATION_FADE).await;
            *state.lock().unwrap_or_else(PoisonError::into_inner) = NotificationState::Removed;
            debug!("notification panel removed");
        });
    }
}

impl Default for NotificationPanel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn clock_time_zero_pads() {
        let early = NaiveTime::from_hms_opt(9, 7, 3).unwrap();
        assert_eq!(clock_time(&early), "09:07");

        let late = NaiveTime::from_hms_opt(23, 59, 59).unwrap();
        assert_eq!(clock_time(&late), "23:59");
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("a & b \"c\""), "a &amp; b &quot;c&quot;");
        assert_eq!(escape_html("hola"), "hola");
    }

    #[tokio::test(start_paused = true)]
    async fn notification_fades_then_removes() {
        let panel = NotificationPanel::new();
        panel.auto_dismiss();
        assert_eq!(panel.state(), NotificationState::Visible);

        // Let the dismiss task register its timer before moving the clock
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::advance(NOTIFICATION_DISMISS_DELAY).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(panel.state(), NotificationState::Fading);

        tokio::time::advance(NOTIFICATION_FADE).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(panel.state(), NotificationState::Removed);
    }
}
