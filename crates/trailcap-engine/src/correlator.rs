//! Time-window correlation of finished transactions with the last interaction.

use crate::config::CorrelationConfig;
use crate::entries::{TimelineEntry, TransactionEntry};
use crate::timeline::TimelineStore;
use tracing::debug;

/// Where a transaction ended up in the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Nested under the interaction at this index.
    Attached(usize),
    /// Appended as its own entry at this index.
    Standalone(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct Correlator {
    window_ms: u64,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new(&CorrelationConfig::default())
    }
}

impl Correlator {
    pub fn new(config: &CorrelationConfig) -> Self {
        Self {
            window_ms: config.window_ms,
        }
    }

    /// Attach `transaction` to the last interaction when it started less than the
    /// window after it, otherwise append it standalone. A transaction that
    /// started before the interaction counts as inside the window.
    pub fn correlate(&self, transaction: TransactionEntry, store: &mut TimelineStore) -> Placement {
        let Some(cursor) = store.last_interaction_cursor() else {
            return Self::standalone(transaction, store);
        };

        let delta = transaction.start_timestamp as i128 - cursor.timestamp as i128;
        if delta >= self.window_ms as i128 {
            return Self::standalone(transaction, store);
        }

        let id = transaction.transaction_id.clone();
        match store.attach_transaction(cursor.index, transaction) {
            Ok(()) => {
                debug!(
                    "Transaction {} associated with interaction at index {}",
                    id, cursor.index
                );
                Placement::Attached(cursor.index)
            }
            Err(rejected) => {
                debug!("{}; logging transaction {} standalone", rejected.error, id);
                Self::standalone(*rejected.transaction, store)
            }
        }
    }

    fn standalone(transaction: TransactionEntry, store: &mut TimelineStore) -> Placement {
        debug!("Transaction {} logged standalone", transaction.transaction_id);
        Placement::Standalone(store.append(TimelineEntry::Transaction(Box::new(transaction))))
    }
}
