//! Append-only timeline of one recording.

use crate::Timestamp;
use crate::entries::{InteractionEntry, TimelineEntry, TransactionEntry};
use crate::error::CaptureError;

/// Position and time of the most recently appended interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionCursor {
    pub index: usize,
    pub timestamp: Timestamp,
}

/// Returned when a transaction could not be attached; hands the entry back.
#[derive(Debug)]
pub struct AttachRejected {
    pub error: CaptureError,
    pub transaction: Box<TransactionEntry>,
}

#[derive(Debug, Default)]
pub struct TimelineStore {
    entries: Vec<TimelineEntry>,
    last_interaction: Option<InteractionCursor>,
}

impl TimelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry` and return its index. Indices start at 0 and never move.
    pub fn append(&mut self, entry: TimelineEntry) -> usize {
        let index = self.entries.len();
        if let TimelineEntry::Interaction(interaction) = &entry {
            self.last_interaction = Some(InteractionCursor {
                index,
                timestamp: interaction.timestamp,
            });
        }
        self.entries.push(entry);
        index
    }

    pub fn last_interaction_cursor(&self) -> Option<InteractionCursor> {
        self.last_interaction
    }

    pub fn attach_transaction(
        &mut self,
        index: usize,
        transaction: TransactionEntry,
    ) -> Result<(), AttachRejected> {
        match self.interaction_mut(index) {
            Ok(interaction) => {
                interaction.associated_transactions.push(transaction);
                Ok(())
            }
            Err(error) => Err(AttachRejected {
                error,
                transaction: Box::new(transaction),
            }),
        }
    }

    fn interaction_mut(&mut self, index: usize) -> Result<&mut InteractionEntry, CaptureError> {
        match self.entries.get_mut(index) {
            Some(TimelineEntry::Interaction(interaction)) => Ok(&mut **interaction),
            _ => Err(CaptureError::IndexOutOfRange(index)),
        }
    }

    pub fn snapshot(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<TimelineEntry> {
        self.entries
    }
}
