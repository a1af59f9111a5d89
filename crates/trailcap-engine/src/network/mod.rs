pub mod serializer;
pub mod tracker;

pub use serializer::reconstruct_command;
pub use tracker::{
    BeginOutcome, FinishedTransaction, Outcome, TrackedTransaction, TransactionPhase,
    TransactionTracker,
};

use crate::config::CaptureConfig;
use crate::entries::{TransactionEntry, TransactionOutcome};

/// Finalize a finished transaction into its timeline form.
pub fn build_entry(finished: FinishedTransaction, config: &CaptureConfig) -> TransactionEntry {
    let reconstructed_command = reconstruct_command(&finished.transaction);
    let is_main_request = config
        .main_request_types
        .iter()
        .any(|t| t == &finished.transaction.resource_type);
    let end_timestamp = finished.outcome.end_timestamp();
    let FinishedTransaction {
        transaction,
        outcome,
    } = finished;

    let (outcome, response_status, response_headers, error, response_body_snippet) = match outcome
    {
        Outcome::Completed {
            status, headers, ..
        } => (
            TransactionOutcome::Completed,
            Some(status),
            headers,
            None,
            Some(config.response_body_stub.clone()),
        ),
        Outcome::Errored { error, .. } => {
            (TransactionOutcome::Errored, None, Vec::new(), Some(error), None)
        }
    };

    TransactionEntry {
        transaction_id: transaction.request_id,
        url: transaction.url,
        method: transaction.method,
        resource_type: transaction.resource_type,
        initiator: transaction.initiator,
        request_headers: transaction.request_headers,
        request_body: transaction.request_body,
        outcome,
        response_status,
        response_headers,
        error,
        start_timestamp: transaction.start_timestamp,
        end_timestamp,
        reconstructed_command,
        response_body_snippet,
        is_main_request,
    }
}
