//! Session-level milestone detection from weak signals.
//!
//! Two independent concerns share one state value:
//! - email verification: a form submission with an email-like field arms a
//!   one-shot detector that fires on the first verification-looking navigation
//!   inside the TTL;
//! - final URL: profile-looking navigations become candidates when either the
//!   last submitted identity token appears in the URL or the timeline already
//!   shows enough activity.

pub mod patterns;

pub use patterns::PatternSet;

use crate::Timestamp;
use crate::capture::ValueNormalizer;
use crate::config::{ClassifierConfig, ConfigError};
use crate::entries::{InteractionEntry, MilestoneEntry, MilestoneKind};
use crate::protocol::InteractionKind;
use tracing::{debug, info};

pub const DETECTION_EMAIL_PATTERN: &str = "Pattern match after email submission";
pub const DETECTION_IDENTITY_MATCH: &str = "Pattern match (username match in URL)";
pub const DETECTION_WEAK_CORROBORATION: &str = "Pattern match (session activity)";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifierState {
    pub awaiting_email_verification: bool,
    pub email_submission_timestamp: Option<Timestamp>,
    pub last_captured_identity_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionClassifier {
    verification_patterns: PatternSet,
    profile_patterns: PatternSet,
    verification_ttl_ms: u64,
    weak_corroboration_threshold: usize,
    identity_field_hints: Vec<String>,
    min_identity_length: usize,
    state: ClassifierState,
}

impl SessionClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_patterns(
            PatternSet::compile(&config.verification_patterns)?,
            PatternSet::compile(&config.profile_patterns)?,
            config,
        ))
    }

    /// Use pre-built pattern sets instead of the ones named in `config`.
    pub fn with_patterns(
        verification_patterns: PatternSet,
        profile_patterns: PatternSet,
        config: &ClassifierConfig,
    ) -> Self {
        Self {
            verification_patterns,
            profile_patterns,
            verification_ttl_ms: config.verification_ttl_ms,
            weak_corroboration_threshold: config.weak_corroboration_threshold,
            identity_field_hints: config
                .identity_field_hints
                .iter()
                .map(|hint| hint.to_lowercase())
                .collect(),
            min_identity_length: config.min_identity_length,
            state: ClassifierState::default(),
        }
    }

    pub fn state(&self) -> &ClassifierState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = ClassifierState::default();
    }

    /// Feed an interaction that has just been appended to the timeline.
    pub fn observe_interaction(&mut self, entry: &InteractionEntry, normalizer: &ValueNormalizer) {
        if entry.subtype != InteractionKind::FormSubmission {
            return;
        }

        if entry.potential_email_submission {
            self.state.awaiting_email_verification = true;
            self.state.email_submission_timestamp = Some(entry.timestamp);
            info!("Potential email submission detected. Awaiting verification URL.");
        }

        let Some(fields) = &entry.form_data else {
            return;
        };
        // Declaration order decides between several candidate fields.
        let token = fields.iter().find(|field| {
            let name = field.name.to_lowercase();
            self.identity_field_hints
                .iter()
                .any(|hint| name.contains(hint.as_str()))
                && !normalizer.is_placeholder(&field.value)
                && field.value.chars().count() > self.min_identity_length
        });
        if let Some(field) = token {
            debug!("Captured identity token from field {:?}", field.name);
            self.state.last_captured_identity_token = Some(field.value.clone());
        }
    }

    /// Feed a navigation that has just been appended. `timeline_len` counts
    /// entries including that navigation. Returns milestones to append, in order.
    pub fn observe_navigation(
        &mut self,
        url: &str,
        timestamp: Timestamp,
        timeline_len: usize,
    ) -> Vec<MilestoneEntry> {
        let mut milestones = Vec::new();

        if let Some(milestone) = self.check_email_verification(url, timestamp) {
            milestones.push(milestone);
        }

        if let Some(milestone) =
            self.check_final_url(url, timestamp, timeline_len + milestones.len())
        {
            milestones.push(milestone);
        }

        milestones
    }

    fn check_email_verification(&mut self, url: &str, timestamp: Timestamp) -> Option<MilestoneEntry> {
        if !self.state.awaiting_email_verification {
            return None;
        }
        let submitted_at = self.state.email_submission_timestamp?;

        if timestamp.saturating_sub(submitted_at) >= self.verification_ttl_ms {
            debug!("Email verification window expired; no longer awaiting");
            self.state.awaiting_email_verification = false;
            self.state.email_submission_timestamp = None;
            return None;
        }

        let pattern = self.verification_patterns.first_match(url)?.to_string();
        self.state.awaiting_email_verification = false;
        self.state.email_submission_timestamp = None;
        info!("Email verification URL detected: {}", url);

        Some(MilestoneEntry {
            kind: MilestoneKind::EmailVerification,
            url: url.to_string(),
            timestamp,
            detection_method: DETECTION_EMAIL_PATTERN.to_string(),
            matched_pattern: Some(pattern),
            message: "Automatically detected email verification URL.".to_string(),
        })
    }

    fn check_final_url(
        &self,
        url: &str,
        timestamp: Timestamp,
        timeline_len: usize,
    ) -> Option<MilestoneEntry> {
        let pattern = self.profile_patterns.first_match(url)?;

        let lowered = url.to_lowercase();
        let identity_match = self
            .state
            .last_captured_identity_token
            .as_ref()
            .is_some_and(|token| lowered.contains(&token.to_lowercase()));

        let detection_method = if identity_match {
            DETECTION_IDENTITY_MATCH
        } else if timeline_len > self.weak_corroboration_threshold {
            DETECTION_WEAK_CORROBORATION
        } else {
            return None;
        };
        info!("Final URL candidate detected: {}", url);

        Some(MilestoneEntry {
            kind: MilestoneKind::FinalUrlCandidate,
            url: url.to_string(),
            timestamp,
            detection_method: detection_method.to_string(),
            matched_pattern: Some(pattern.to_string()),
            message: "Profile-like page reached; confirm the page context before relying on it."
                .to_string(),
        })
    }
}
