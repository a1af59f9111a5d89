//! One recording run against one observed tab.
//!
//! `CaptureSession` is the single writer for the timeline, the transaction
//! tracker and the classifier. Every method completes synchronously so the
//! last-interaction cursor always reflects the most recently processed
//! interaction when a transaction is correlated.

use crate::capture::{InteractionBuilder, ValueNormalizer};
use crate::classifier::{ClassifierState, SessionClassifier};
use crate::config::{CaptureConfig, ConfigError, TrailcapConfig};
use crate::correlator::{Correlator, Placement};
use crate::entries::{NavigationEntry, TimelineEntry};
use crate::error::CaptureError;
use crate::network::{self, BeginOutcome, Outcome, TransactionTracker};
use crate::protocol::{
    InteractionEvent, NavigationEvent, Notification, StartRequest, TabId, TransactionCompleted,
    TransactionFailed, TransactionHeaders, TransactionStart,
};
use crate::timeline::TimelineStore;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordingStatus {
    pub recording: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Everything left once a recording stops.
#[derive(Debug, Clone)]
pub struct FinishedRecording {
    pub tab_id: TabId,
    pub domain: Option<String>,
    pub initial_url: String,
    pub started_at: crate::Timestamp,
    pub entries: Vec<TimelineEntry>,
    /// Transactions that never reached a terminal signal.
    pub unfinished_transactions: usize,
}

#[derive(Debug)]
struct ActiveSession {
    tab_id: TabId,
    domain: Option<String>,
    initial_url: String,
    started_at: crate::Timestamp,
    timeline: TimelineStore,
    tracker: TransactionTracker,
    classifier: SessionClassifier,
}

pub struct CaptureSession {
    capture: CaptureConfig,
    builder: InteractionBuilder,
    correlator: Correlator,
    classifier: SessionClassifier,
    active: Option<ActiveSession>,
}

impl CaptureSession {
    pub fn new(config: &TrailcapConfig) -> Result<Self, ConfigError> {
        let classifier = SessionClassifier::new(&config.classifier)?;
        Ok(Self::with_classifier(config, classifier))
    }

    /// Build a session around a pre-configured classifier.
    pub fn with_classifier(config: &TrailcapConfig, classifier: SessionClassifier) -> Self {
        Self {
            capture: config.capture.clone(),
            builder: InteractionBuilder::new(ValueNormalizer::new(&config.security), &config.capture),
            correlator: Correlator::new(&config.correlation),
            classifier,
            active: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn status(&self) -> RecordingStatus {
        match &self.active {
            Some(active) => RecordingStatus {
                recording: true,
                tab_id: Some(active.tab_id),
                domain: active.domain.clone(),
            },
            None => RecordingStatus {
                recording: false,
                tab_id: None,
                domain: None,
            },
        }
    }

    /// The current timeline; empty while idle.
    pub fn snapshot(&self) -> &[TimelineEntry] {
        self.active
            .as_ref()
            .map(|active| active.timeline.snapshot())
            .unwrap_or_default()
    }

    pub fn classifier_state(&self) -> Option<&ClassifierState> {
        self.active.as_ref().map(|active| active.classifier.state())
    }

    pub fn pending_transactions(&self) -> usize {
        self.active
            .as_ref()
            .map(|active| active.tracker.len())
            .unwrap_or_default()
    }

    pub fn start(&mut self, request: StartRequest) -> Result<(), CaptureError> {
        if self.active.is_some() {
            warn!("Start requested while already recording");
            return Err(CaptureError::DuplicateStart);
        }

        let domain = url::Url::parse(&request.initial_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string));

        let mut classifier = self.classifier.clone();
        classifier.reset();

        let mut timeline = TimelineStore::new();
        timeline.append(TimelineEntry::Navigation(NavigationEntry {
            url: request.initial_url.clone(),
            timestamp: request.timestamp,
        }));

        info!(
            "Start recording tab {} on domain {}",
            request.tab_id,
            domain.as_deref().unwrap_or("<unknown>")
        );

        self.active = Some(ActiveSession {
            tab_id: request.tab_id,
            domain,
            initial_url: request.initial_url,
            started_at: request.timestamp,
            timeline,
            tracker: TransactionTracker::new(),
            classifier,
        });
        Ok(())
    }

    pub fn stop(&mut self) -> Result<FinishedRecording, CaptureError> {
        let active = self.active.take().ok_or(CaptureError::NotRecording)?;
        let unfinished_transactions = active.tracker.len();
        if unfinished_transactions > 0 {
            debug!(
                "Dropping {} unfinished transactions at stop",
                unfinished_transactions
            );
        }
        info!(
            "Stop recording tab {} ({} entries)",
            active.tab_id,
            active.timeline.len()
        );

        Ok(FinishedRecording {
            tab_id: active.tab_id,
            domain: active.domain,
            initial_url: active.initial_url,
            started_at: active.started_at,
            entries: active.timeline.into_entries(),
            unfinished_transactions,
        })
    }

    /// Returns the timeline index of the new interaction.
    pub fn record_interaction(&mut self, event: InteractionEvent) -> Result<usize, CaptureError> {
        let active = target_session(&mut self.active, event.tab_id)?;

        let entry = self.builder.build(&event);
        active
            .classifier
            .observe_interaction(&entry, self.builder.normalizer());
        let index = active
            .timeline
            .append(TimelineEntry::Interaction(Box::new(entry)));
        debug!("{} logged at index {}", event.subtype.as_str(), index);
        Ok(index)
    }

    /// Returns the timeline index of the navigation entry. Milestones it
    /// triggers are appended right after it.
    pub fn record_navigation(&mut self, event: NavigationEvent) -> Result<usize, CaptureError> {
        let active = target_session(&mut self.active, event.tab_id)?;
        info!("URL changed in recorded tab {} to: {}", event.tab_id, event.url);

        let index = active
            .timeline
            .append(TimelineEntry::Navigation(NavigationEntry {
                url: event.url.clone(),
                timestamp: event.timestamp,
            }));

        let milestones =
            active
                .classifier
                .observe_navigation(&event.url, event.timestamp, active.timeline.len());
        for milestone in milestones {
            active.timeline.append(TimelineEntry::Milestone(milestone));
        }
        Ok(index)
    }

    pub fn request_started(&mut self, start: TransactionStart) -> BeginOutcome {
        let Some(active) = self.active.as_mut() else {
            return BeginOutcome::OutOfScope;
        };
        let tab_id = active.tab_id;
        let ignored = &self.capture.ignored_resource_types;

        active.tracker.begin(start, |start| {
            start.tab_id == tab_id && !ignored.iter().any(|kind| kind == &start.resource_type)
        })
    }

    /// Returns false when the request is not being tracked.
    pub fn request_headers(&mut self, update: TransactionHeaders) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        let prefixes = &self.capture.filtered_header_prefixes;
        let headers = update
            .headers
            .into_iter()
            .filter(|header| {
                let name = header.name.to_ascii_lowercase();
                !prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
            })
            .collect();
        active.tracker.attach_headers(&update.request_id, headers)
    }

    pub fn request_completed(
        &mut self,
        completed: TransactionCompleted,
    ) -> Result<Placement, CaptureError> {
        self.finish_request(
            &completed.request_id,
            Outcome::Completed {
                status: completed.status,
                headers: completed.headers,
                end_timestamp: completed.timestamp,
            },
        )
    }

    pub fn request_failed(&mut self, failed: TransactionFailed) -> Result<Placement, CaptureError> {
        info!("Network error for {}: {}", failed.request_id, failed.error);
        self.finish_request(
            &failed.request_id,
            Outcome::Errored {
                error: failed.error,
                end_timestamp: failed.timestamp,
            },
        )
    }

    fn finish_request(
        &mut self,
        request_id: &str,
        outcome: Outcome,
    ) -> Result<Placement, CaptureError> {
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| CaptureError::UnknownTransaction(request_id.to_string()))?;
        let finished = active.tracker.finish(request_id, outcome)?;
        let entry = network::build_entry(finished, &self.capture);
        Ok(self.correlator.correlate(entry, &mut active.timeline))
    }

    /// Route one notification. `Stop` yields the finished recording.
    pub fn apply(
        &mut self,
        notification: Notification,
    ) -> Result<Option<FinishedRecording>, CaptureError> {
        match notification {
            Notification::Start(request) => self.start(request).map(|_| None),
            Notification::Stop => self.stop().map(Some),
            Notification::Interaction(event) => self.record_interaction(event).map(|_| None),
            Notification::Navigation(event) => self.record_navigation(event).map(|_| None),
            Notification::RequestStarted(start) => {
                let request_id = start.request_id.clone();
                match self.request_started(start) {
                    BeginOutcome::Tracking => debug!("Tracking request {}", request_id),
                    outcome => debug!("Request {} not tracked: {:?}", request_id, outcome),
                }
                Ok(None)
            }
            Notification::RequestHeaders(update) => {
                self.request_headers(update);
                Ok(None)
            }
            Notification::RequestCompleted(completed) => {
                self.request_completed(completed).map(|_| None)
            }
            Notification::RequestFailed(failed) => self.request_failed(failed).map(|_| None),
        }
    }
}

fn target_session(
    active: &mut Option<ActiveSession>,
    tab_id: TabId,
) -> Result<&mut ActiveSession, CaptureError> {
    let Some(active) = active.as_mut() else {
        warn!("Received event while not recording");
        return Err(CaptureError::NotRecording);
    };
    if active.tab_id != tab_id {
        warn!(
            "Event from unexpected tab {} (expected {})",
            tab_id, active.tab_id
        );
        return Err(CaptureError::WrongTarget {
            expected: active.tab_id,
            actual: tab_id,
        });
    }
    Ok(active)
}
