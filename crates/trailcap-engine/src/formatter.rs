use crate::entries::{MilestoneKind, TimelineEntry, TransactionEntry, TransactionOutcome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimelineCounts {
    pub navigations: usize,
    pub interactions: usize,
    pub attached_transactions: usize,
    pub standalone_transactions: usize,
    pub milestones: usize,
}

pub fn count_entries(entries: &[TimelineEntry]) -> TimelineCounts {
    let mut counts = TimelineCounts::default();
    for entry in entries {
        match entry {
            TimelineEntry::Navigation(_) => counts.navigations += 1,
            TimelineEntry::Interaction(interaction) => {
                counts.interactions += 1;
                counts.attached_transactions += interaction.associated_transactions.len();
            }
            TimelineEntry::Transaction(_) => counts.standalone_transactions += 1,
            TimelineEntry::Milestone(_) => counts.milestones += 1,
        }
    }
    counts
}

/// One line per entry, offsets relative to the first entry. Attached
/// transactions are indented under their interaction.
pub fn format_timeline(entries: &[TimelineEntry]) -> String {
    let counts = count_entries(entries);
    let mut output = format!(
        "{} entries: {} navigations, {} interactions, {} transactions ({} attached), {} milestones",
        entries.len(),
        counts.navigations,
        counts.interactions,
        counts.attached_transactions + counts.standalone_transactions,
        counts.attached_transactions,
        counts.milestones
    );

    let origin = entries.first().map(TimelineEntry::timestamp).unwrap_or(0);
    for (index, entry) in entries.iter().enumerate() {
        let offset = entry.timestamp().saturating_sub(origin);
        output.push_str(&format!("\n[{}] +{}ms ", index, offset));

        match entry {
            TimelineEntry::Navigation(nav) => {
                output.push_str(&format!("navigate {}", nav.url));
            }
            TimelineEntry::Interaction(interaction) => {
                output.push_str(&format!(
                    "{} {}",
                    interaction.subtype.as_str(),
                    interaction.locator
                ));
                if let Some(value) = &interaction.value {
                    output.push_str(&format!(" = {:?}", value));
                }
                if let Some(fields) = &interaction.form_data {
                    output.push_str(&format!(" ({} fields)", fields.len()));
                }
                for txn in &interaction.associated_transactions {
                    output.push_str(&format!("\n      -> {}", format_transaction(txn)));
                }
            }
            TimelineEntry::Transaction(txn) => output.push_str(&format_transaction(txn)),
            TimelineEntry::Milestone(milestone) => {
                let label = match milestone.kind {
                    MilestoneKind::EmailVerification => "EMAIL VERIFICATION",
                    MilestoneKind::FinalUrlCandidate => "FINAL URL CANDIDATE",
                };
                output.push_str(&format!(
                    "{} {} [{}]",
                    label, milestone.url, milestone.detection_method
                ));
            }
        }
    }
    output
}

fn format_transaction(txn: &TransactionEntry) -> String {
    let result = match (txn.outcome, txn.response_status, &txn.error) {
        (TransactionOutcome::Completed, Some(status), _) => status.to_string(),
        (TransactionOutcome::Errored, _, Some(error)) => format!("failed: {}", error),
        (outcome, _, _) => format!("{:?}", outcome).to_lowercase(),
    };
    format!(
        "{} {} {} ({}, {}ms)",
        txn.method,
        txn.url,
        result,
        txn.resource_type,
        txn.end_timestamp.saturating_sub(txn.start_timestamp)
    )
}
