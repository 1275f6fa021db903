//! Background analysis for interactive callers.
//!
//! A UI submits one request per image the user picks. Each request runs on its
//! own thread; the extraction itself is never interrupted. When a newer request
//! has been submitted, results of older ones are dropped on arrival, so the
//! event stream only ever reports the latest request.

use crate::analyze::analyze_image_with;
use crate::config::AnalyzerConfig;
use crate::model::ImageResult;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Outcome of one submitted request.
#[derive(Debug)]
pub enum AnalysisEvent {
    Finished { request_id: u64, result: ImageResult },
    Failed { request_id: u64, path: PathBuf, message: String },
}

impl AnalysisEvent {
    pub fn request_id(&self) -> u64 {
        match self {
            AnalysisEvent::Finished { request_id, .. } | AnalysisEvent::Failed { request_id, .. } => {
                *request_id
            }
        }
    }
}

pub struct AnalysisWorker {
    config: AnalyzerConfig,
    latest: Arc<AtomicU64>,
    tx: Sender<AnalysisEvent>,
    rx: Receiver<AnalysisEvent>,
}

impl AnalysisWorker {
    pub fn new(config: AnalyzerConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            config,
            latest: Arc::new(AtomicU64::new(0)),
            tx,
            rx,
        }
    }

    /// Start analyzing `path`, superseding any request still in flight.
    /// Returns the id the resulting event will carry.
    pub fn submit(&self, path: impl Into<PathBuf>) -> u64 {
        let path = path.into();
        let request_id = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.latest);
        let tx = self.tx.clone();
        let config = self.config.clone();

        thread::spawn(move || {
            let event = match analyze_image_with(&path, &config) {
                Ok(result) => AnalysisEvent::Finished { request_id, result },
                Err(e) => AnalysisEvent::Failed {
                    request_id,
                    message: e.user_message(),
                    path,
                },
            };
            if latest.load(Ordering::SeqCst) != request_id {
                debug!(request_id, "discarding superseded analysis");
                return;
            }
            // receiver gone means the worker was dropped
            let _ = tx.send(event);
        });

        request_id
    }

    /// Id of the most recent request, 0 before the first submit
    pub fn latest_request(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Next current event, if one is ready.
    pub fn try_next(&self) -> Option<AnalysisEvent> {
        while let Ok(event) = self.rx.try_recv() {
            if self.is_current(&event) {
                return Some(event);
            }
        }
        None
    }

    /// Wait up to `timeout` for the next current event.
    pub fn next_timeout(&self, timeout: Duration) -> Option<AnalysisEvent> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(event) if self.is_current(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    // an event can be sent just before a newer submit bumps the counter
    fn is_current(&self, event: &AnalysisEvent) -> bool {
        event.request_id() == self.latest_request()
    }
}

impl Default for AnalysisWorker {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}
