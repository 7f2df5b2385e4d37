//! Highlight Session
//!
//! Owns one configured highlighter and runs it at most once per document,
//! when the host says the document is ready. No timers: the host decides
//! when rendering is done and publishes `DocumentReady`.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::HighlighterConfig;
use crate::events::{EventBus, HostEvent};
use crate::highlight::{Highlighter, RunReport};
use dom::DomService;

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub id: String,
    /// Run even when the document URL matches no trigger
    pub force: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            force: false,
        }
    }
}

/// Highlight Session - waits for readiness, runs once
pub struct HighlightSession {
    pub config: SessionConfig,
    pub event_bus: EventBus,

    settings: HighlighterConfig,
    highlighter: Highlighter,
}

impl HighlightSession {
    pub fn new(config: SessionConfig, settings: HighlighterConfig) -> Self {
        let highlighter = Highlighter::with_options(settings.highlight_options());
        Self {
            config,
            event_bus: EventBus::new(),
            settings,
            highlighter,
        }
    }

    pub fn settings(&self) -> &HighlighterConfig {
        &self.settings
    }

    /// Receiver to hand to `run_when_ready`; take it before the host publishes
    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.event_bus.subscribe()
    }

    /// Whether a document at `url` is processed
    pub fn should_run(&self, url: &str) -> bool {
        self.config.force || self.settings.triggers.matches(url)
    }

    /// Apply the configured pattern list right now
    pub fn run(&self, doc: &mut DomService) -> RunReport {
        info!(
            session = %self.config.id,
            mode = ?self.settings.mode,
            patterns = self.settings.patterns.len(),
            "Starting highlight run"
        );

        let report = self
            .highlighter
            .run(doc, &self.settings.patterns, self.settings.mode);
        report.log_summary();
        report
    }

    /// Wait for the first readiness signal, then run exactly once
    ///
    /// Returns `None` without touching the document when the host navigates
    /// away first, the bus closes, or the ready URL matches no trigger.
    pub async fn run_when_ready(
        &self,
        mut events: broadcast::Receiver<HostEvent>,
        doc: &mut DomService,
    ) -> Option<RunReport> {
        loop {
            match events.recv().await {
                Ok(HostEvent::DocumentReady { url }) => {
                    if !self.should_run(&url) {
                        info!(session = %self.config.id, %url, "No trigger matches, skipping");
                        return None;
                    }

                    let report = self.run(doc);
                    self.event_bus.publish(HostEvent::RunCompleted {
                        url,
                        mode: report.mode,
                        total: report.counts.total(),
                    });
                    return Some(report);
                }
                Ok(HostEvent::NavigatedAway { url }) => {
                    debug!(session = %self.config.id, %url, "Navigated away before ready");
                    return None;
                }
                Ok(HostEvent::RunCompleted { .. }) => continue,
                Err(RecvError::Lagged(missed)) => {
                    warn!(session = %self.config.id, missed, "Event receiver lagged");
                    continue;
                }
                Err(RecvError::Closed) => {
                    debug!(session = %self.config.id, "Event bus closed before ready");
                    return None;
                }
            }
        }
    }
}
