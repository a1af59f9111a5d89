//! Inbound notifications delivered by the page, the network layer and the host.
//!
//! One JSON object per notification, tagged by `kind`. Recorded streams are plain
//! JSON lines of [`Notification`].

use crate::Timestamp;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Browser tab identity. Background requests use negative ids.
pub type TabId = i64;

/// Every notification the capture engine understands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Start(StartRequest),
    Stop,
    Interaction(InteractionEvent),
    Navigation(NavigationEvent),
    RequestStarted(TransactionStart),
    RequestHeaders(TransactionHeaders),
    RequestCompleted(TransactionCompleted),
    RequestFailed(TransactionFailed),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    pub tab_id: TabId,
    pub initial_url: String,
    pub timestamp: Timestamp,
}

/// The four user actions the page reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionKind {
    Click,
    Input,
    SelectChange,
    FormSubmission,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Click => "click",
            InteractionKind::Input => "input",
            InteractionKind::SelectChange => "selectChange",
            InteractionKind::FormSubmission => "formSubmission",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub tab_id: TabId,
    pub subtype: InteractionKind,
    pub url: String,
    pub timestamp: Timestamp,
    pub element: ElementDescription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Visible text of the chosen option (select changes only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<FormSubmission>,
}

/// One level of the element tree as reported by the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDescription {
    pub tag_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Whether the id matches exactly one element in the whole document.
    #[serde(default)]
    pub id_unique: bool,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    /// 1-based position among all element siblings.
    #[serde(default = "default_position")]
    pub sibling_index: usize,
    /// 1-based position among preceding siblings sharing the tag name.
    #[serde(default = "default_position")]
    pub same_tag_index: usize,
    /// Number of element children of the parent, including this node.
    #[serde(default = "default_position")]
    pub sibling_count: usize,
}

fn default_position() -> usize {
    1
}

/// The interaction target plus the context needed to describe it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementDescription {
    #[serde(flatten)]
    pub node: NodeDescription,
    /// Ancestor chain, nearest parent first.
    #[serde(default)]
    pub ancestors: Vec<NodeDescription>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub aria_label: String,
    #[serde(default)]
    pub html: String,
    /// Element carries the explicit sensitivity marker attribute.
    #[serde(default)]
    pub sensitive_marker: bool,
}

impl ElementDescription {
    pub fn field(&self) -> FieldDescription {
        FieldDescription {
            name: self.node.name.clone(),
            id: self.node.id.clone(),
            input_type: self.node.input_type.clone(),
            sensitive_marker: self.sensitive_marker,
        }
    }
}

/// The subset of an element the value normalizer looks at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default)]
    pub sensitive_marker: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormSubmission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Entries in form declaration order.
    #[serde(default)]
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
    /// The form control backing this entry, when the page could resolve one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<FieldDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationEvent {
    pub tab_id: TabId,
    pub url: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Request payload as captured before the request left the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Multipart / urlencoded fields, each possibly repeated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_data: Option<FormData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raw: Vec<RawChunk>,
}

/// Form fields keyed by name, kept in the order the page declared them.
/// Encoded as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData(Vec<(String, Vec<String>)>);

impl FormData {
    /// Append `value` under `name`, after any values already held for it.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values_mut(name.into()).push(value.into());
    }

    fn values_mut(&mut self, name: String) -> &mut Vec<String> {
        let index = match self.0.iter().position(|(existing, _)| *existing == name) {
            Some(index) => index,
            None => {
                self.0.push((name, Vec::new()));
                self.0.len() - 1
            }
        };
        &mut self.0[index].1
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }
}

impl Serialize for FormData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, values) in &self.0 {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FormData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FormDataVisitor;

        impl<'de> Visitor<'de> for FormDataVisitor {
            type Value = FormData;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of field names to value lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FormData, A::Error> {
                let mut form = FormData::default();
                while let Some((name, values)) = access.next_entry::<String, Vec<String>>()? {
                    form.values_mut(name).extend(values);
                }
                Ok(form)
            }
        }

        deserializer.deserialize_map(FormDataVisitor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawChunk {
    /// Base64-encoded bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStart {
    pub tab_id: TabId,
    pub request_id: String,
    pub url: String,
    pub method: String,
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator: Option<String>,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionHeaders {
    pub request_id: String,
    #[serde(default)]
    pub headers: Vec<Header>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionCompleted {
    pub request_id: String,
    pub status: u16,
    #[serde(default)]
    pub headers: Vec<Header>,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionFailed {
    pub request_id: String,
    pub error: String,
    pub timestamp: Timestamp,
}
