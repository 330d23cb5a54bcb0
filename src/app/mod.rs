//! The foreground side of the application.
//!
//! One consumer owns [`AppState`] and drains the progress channel; background
//! tasks only ever hold an [`EventProxy`].

pub mod commands;
pub mod events;
pub mod proxy;
pub mod state;
pub mod tasks;
pub mod view_model;

use tokio::sync::mpsc::UnboundedReceiver;

use events::{Operation, UserEvent};
pub use proxy::EventProxy;
pub use state::AppState;

/// A user-facing message produced when an operation ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::Info(message) | Notice::Error(message) => message,
        }
    }
}

/// Where the consumer reports what it observes.
pub trait StatusSink {
    fn progress(&mut self, operation: Operation, percent: u8);
    fn notice(&mut self, notice: &Notice);
}

/// Applies one event to the state. Terminal events produce a [`Notice`].
pub fn handle_user_event(state: &mut AppState, event: UserEvent) -> Option<Notice> {
    match event {
        UserEvent::Progress { operation, percent } => {
            match operation {
                Operation::Scan => state.scan_progress = percent,
                Operation::Extraction => state.extraction_progress = percent,
            }
            None
        }
        UserEvent::ScanComplete(tree) => {
            state.is_scanning = false;
            state.scan_task = None;
            let unreadable = tree.warnings().len();
            let mut message = format!("Scan complete. Found {} items.", tree.len());
            if unreadable > 0 {
                message.push_str(&format!(" {unreadable} directories could not be read."));
            }
            state.tree = Some(*tree);
            state.status_message = message.clone();
            Some(Notice::Info(message))
        }
        UserEvent::ScanFailed(error) => {
            state.is_scanning = false;
            state.scan_task = None;
            state.status_message = format!("Scan failed: {error}");
            Some(Notice::Error(state.status_message.clone()))
        }
        UserEvent::ScanCancelled => {
            state.is_scanning = false;
            state.scan_task = None;
            state.root_path = None;
            state.status_message = "Scan cancelled.".to_string();
            Some(Notice::Info(state.status_message.clone()))
        }
        UserEvent::ExtractionComplete(destination) => {
            state.is_extracting = false;
            state.extraction_task = None;
            state.status_message = format!("Extraction complete: {}", destination.display());
            state.last_output = Some(destination);
            Some(Notice::Info(state.status_message.clone()))
        }
        UserEvent::ExtractionFailed(error) => {
            state.is_extracting = false;
            state.extraction_task = None;
            state.status_message = format!("Extraction failed: {error}");
            Some(Notice::Error(state.status_message.clone()))
        }
        UserEvent::ExtractionCancelled => {
            state.is_extracting = false;
            state.extraction_task = None;
            state.status_message = "Extraction cancelled.".to_string();
            Some(Notice::Info(state.status_message.clone()))
        }
    }
}

/// Reacts to one Ctrl-C. Returns `false` once the consumer should stop waiting.
///
/// The first interrupt raises the cancellation flags of whatever is running;
/// the tasks then report their `Cancelled` events as usual. A second one gives
/// up on them.
pub fn handle_interrupt(state: &mut AppState, interrupts: &mut u32) -> bool {
    *interrupts += 1;
    if *interrupts > 1 {
        tracing::warn!("Interrupted again, not waiting for running operations");
        return false;
    }
    tracing::info!("Interrupted, cancelling running operations");
    state.cancel_current_scan();
    state.cancel_current_extraction();
    true
}

/// Drains events until no operation is running and returns the notices seen.
///
/// Ctrl-C is handled by [`handle_interrupt`].
pub async fn run_until_idle<S: StatusSink>(
    state: &mut AppState,
    events: &mut UnboundedReceiver<UserEvent>,
    sink: &mut S,
) -> Vec<Notice> {
    let mut notices = Vec::new();
    let mut interrupts = 0u32;
    let mut listen_for_interrupt = true;
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    while state.is_busy() {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::warn!("Progress channel closed while an operation was running");
                    break;
                };
                if let UserEvent::Progress { operation, percent } = &event {
                    sink.progress(*operation, *percent);
                }
                if let Some(notice) = handle_user_event(state, event) {
                    sink.notice(&notice);
                    notices.push(notice);
                }
            }
            result = &mut interrupt, if listen_for_interrupt => {
                match result {
                    Ok(()) => {
                        if !handle_interrupt(state, &mut interrupts) {
                            break;
                        }
                        interrupt.set(tokio::signal::ctrl_c());
                    }
                    Err(e) => {
                        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                        listen_for_interrupt = false;
                    }
                }
            }
        }
    }
    notices
}
