//! Timeline entries as they are exported.

use crate::Timestamp;
use crate::protocol::{Header, InteractionKind, RequestBody};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TimelineEntry {
    Navigation(NavigationEntry),
    Interaction(Box<InteractionEntry>),
    Transaction(Box<TransactionEntry>),
    Milestone(MilestoneEntry),
}

impl TimelineEntry {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            TimelineEntry::Navigation(nav) => nav.timestamp,
            TimelineEntry::Interaction(interaction) => interaction.timestamp,
            TimelineEntry::Transaction(txn) => txn.start_timestamp,
            TimelineEntry::Milestone(milestone) => milestone.timestamp,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            TimelineEntry::Navigation(nav) => &nav.url,
            TimelineEntry::Interaction(interaction) => &interaction.url,
            TimelineEntry::Transaction(txn) => &txn.url,
            TimelineEntry::Milestone(milestone) => &milestone.url,
        }
    }

    pub fn as_interaction(&self) -> Option<&InteractionEntry> {
        match self {
            TimelineEntry::Interaction(interaction) => Some(&**interaction),
            _ => None,
        }
    }

    pub fn as_milestone(&self) -> Option<&MilestoneEntry> {
        match self {
            TimelineEntry::Milestone(milestone) => Some(milestone),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEntry {
    pub url: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEntry {
    pub subtype: InteractionKind,
    pub url: String,
    pub timestamp: Timestamp,
    pub locator: String,
    pub tag_name: String,
    pub element_id: String,
    pub class_names: String,
    pub text_snippet: String,
    pub aria_label: String,
    pub name_attribute: String,
    pub html_snippet: String,
    pub is_sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_data: Option<Vec<FormValue>>,
    #[serde(default)]
    pub potential_email_submission: bool,
    #[serde(default)]
    pub associated_transactions: Vec<TransactionEntry>,
}

/// A normalized form-submission field, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormValue {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionOutcome {
    Completed,
    Errored,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEntry {
    pub transaction_id: String,
    pub url: String,
    pub method: String,
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator: Option<String>,
    #[serde(default)]
    pub request_headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub outcome: TransactionOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<u16>,
    #[serde(default)]
    pub response_headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub start_timestamp: Timestamp,
    pub end_timestamp: Timestamp,
    pub reconstructed_command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body_snippet: Option<String>,
    pub is_main_request: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MilestoneKind {
    EmailVerification,
    FinalUrlCandidate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneEntry {
    pub kind: MilestoneKind,
    pub url: String,
    pub timestamp: Timestamp,
    pub detection_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_pattern: Option<String>,
    pub message: String,
}
