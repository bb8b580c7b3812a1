//! Presentation sink: the only way the core talks to whatever renders the conversion.

use crate::types::Event;
use tokio::sync::broadcast;

/// Capability that renders conversion state to the user
///
/// Implementations must be cheap and non-blocking; they are called from the
/// polling task as well as from the session.
pub trait PresentationSink: Send + Sync {
    /// Show progress (0-100) with a status line
    fn report_progress(&self, percent: u8, message: &str);

    /// Show an error message verbatim
    fn report_error(&self, message: &str);

    /// Show a success notice
    fn report_success(&self, message: &str);

    /// Enable or disable the start-conversion action
    fn set_ready(&self, ready: bool);

    /// Show or hide the download action
    fn set_download_available(&self, _available: bool) {}
}

/// Sink that discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl PresentationSink for NoopSink {
    fn report_progress(&self, _percent: u8, _message: &str) {}
    fn report_error(&self, _message: &str) {}
    fn report_success(&self, _message: &str) {}
    fn set_ready(&self, _ready: bool) {}
}

/// Sink that republishes every call as an [`Event`] on a broadcast channel
///
/// Any number of subscribers receive all events independently. Sending with no
/// subscriber attached is not an error.
#[derive(Clone, Debug)]
pub struct EventSink {
    event_tx: broadcast::Sender<Event>,
}

impl EventSink {
    /// Create a sink whose channel buffers up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _rx) = broadcast::channel(capacity.max(1));
        Self { event_tx }
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new(256)
    }
}

impl PresentationSink for EventSink {
    fn report_progress(&self, percent: u8, message: &str) {
        self.emit(Event::Progress {
            percent,
            message: message.to_string(),
        });
    }

    fn report_error(&self, message: &str) {
        self.emit(Event::Error {
            message: message.to_string(),
        });
    }

    fn report_success(&self, message: &str) {
        self.emit(Event::Success {
            message: message.to_string(),
        });
    }

    fn set_ready(&self, ready: bool) {
        self.emit(Event::Ready { ready });
    }

    fn set_download_available(&self, available: bool) {
        self.emit(Event::DownloadAvailable { available });
    }
}
