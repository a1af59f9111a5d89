//! In-flight network transactions, assembled from partial lifecycle updates.

use crate::Timestamp;
use crate::error::CaptureError;
use crate::protocol::{Header, RequestBody, TransactionStart};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionPhase {
    Initiated,
    HeadersAttached,
    Completed,
    Errored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedTransaction {
    pub request_id: String,
    pub url: String,
    pub method: String,
    pub resource_type: String,
    pub initiator: Option<String>,
    pub start_timestamp: Timestamp,
    pub request_body: Option<RequestBody>,
    pub request_headers: Vec<Header>,
    pub phase: TransactionPhase,
}

impl TrackedTransaction {
    fn from_start(start: TransactionStart) -> Self {
        Self {
            request_id: start.request_id,
            url: start.url,
            method: start.method,
            resource_type: start.resource_type,
            initiator: start.initiator,
            start_timestamp: start.timestamp,
            request_body: start.request_body,
            request_headers: Vec::new(),
            phase: TransactionPhase::Initiated,
        }
    }
}

/// Terminal signal for a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed {
        status: u16,
        headers: Vec<Header>,
        end_timestamp: Timestamp,
    },
    Errored {
        error: String,
        end_timestamp: Timestamp,
    },
}

impl Outcome {
    pub fn end_timestamp(&self) -> Timestamp {
        match self {
            Outcome::Completed { end_timestamp, .. } | Outcome::Errored { end_timestamp, .. } => {
                *end_timestamp
            }
        }
    }
}

/// A transaction removed from the tracker together with how it ended.
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedTransaction {
    pub transaction: TrackedTransaction,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginOutcome {
    Tracking,
    AlreadyTracked,
    OutOfScope,
}

#[derive(Debug, Default)]
pub struct TransactionTracker {
    pending: HashMap<String, TrackedTransaction>,
}

impl TransactionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `start` unless its id is already known or `in_scope`
    /// rejects it. Duplicate start signals never reset accumulated state.
    pub fn begin<F>(&mut self, start: TransactionStart, in_scope: F) -> BeginOutcome
    where
        F: FnOnce(&TransactionStart) -> bool,
    {
        if self.pending.contains_key(&start.request_id) {
            return BeginOutcome::AlreadyTracked;
        }
        if !in_scope(&start) {
            return BeginOutcome::OutOfScope;
        }
        let tracked = TrackedTransaction::from_start(start);
        self.pending.insert(tracked.request_id.clone(), tracked);
        BeginOutcome::Tracking
    }

    /// Returns false when `request_id` is not tracked (late or irrelevant signal).
    pub fn attach_headers(&mut self, request_id: &str, headers: Vec<Header>) -> bool {
        let Some(tracked) = self.pending.get_mut(request_id) else {
            return false;
        };
        // Merged by name: a later list updates values and adds names, but never
        // drops a header we already hold.
        for header in headers {
            match tracked
                .request_headers
                .iter_mut()
                .find(|held| held.name.eq_ignore_ascii_case(&header.name))
            {
                Some(held) => held.value = header.value,
                None => tracked.request_headers.push(header),
            }
        }
        tracked.phase = TransactionPhase::HeadersAttached;
        true
    }

    /// Remove `request_id` and hand back the assembled transaction.
    pub fn finish(
        &mut self,
        request_id: &str,
        outcome: Outcome,
    ) -> Result<FinishedTransaction, CaptureError> {
        let mut transaction = self
            .pending
            .remove(request_id)
            .ok_or_else(|| CaptureError::UnknownTransaction(request_id.to_string()))?;
        transaction.phase = match outcome {
            Outcome::Completed { .. } => TransactionPhase::Completed,
            Outcome::Errored { .. } => TransactionPhase::Errored,
        };
        Ok(FinishedTransaction {
            transaction,
            outcome,
        })
    }

    pub fn get(&self, request_id: &str) -> Option<&TrackedTransaction> {
        self.pending.get(request_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
