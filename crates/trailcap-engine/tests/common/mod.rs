#![allow(dead_code)]

use trailcap_engine::Timestamp;
use trailcap_engine::config::TrailcapConfig;
use trailcap_engine::protocol::{
    ElementDescription, FieldDescription, FormField, FormSubmission, Header, InteractionEvent,
    InteractionKind, NavigationEvent, NodeDescription, StartRequest, TabId, TransactionCompleted,
    TransactionFailed, TransactionStart,
};
use trailcap_engine::session::CaptureSession;

pub const TAB: TabId = 7;
pub const SITE: &str = "https://shop.example/";

pub fn session() -> CaptureSession {
    CaptureSession::new(&TrailcapConfig::default()).unwrap()
}

pub fn start_request(timestamp: Timestamp) -> StartRequest {
    StartRequest {
        tab_id: TAB,
        initial_url: SITE.to_string(),
        timestamp,
    }
}

/// A session already recording `TAB`, started at `timestamp`.
pub fn recording(timestamp: Timestamp) -> CaptureSession {
    let mut session = session();
    session.start(start_request(timestamp)).unwrap();
    session
}

pub fn node(tag: &str) -> NodeDescription {
    NodeDescription {
        tag_name: tag.to_string(),
        sibling_index: 1,
        same_tag_index: 1,
        sibling_count: 1,
        ..Default::default()
    }
}

pub fn element(node: NodeDescription) -> ElementDescription {
    ElementDescription {
        node,
        ..Default::default()
    }
}

pub fn event(
    subtype: InteractionKind,
    timestamp: Timestamp,
    element: ElementDescription,
    value: Option<&str>,
) -> InteractionEvent {
    InteractionEvent {
        tab_id: TAB,
        subtype,
        url: SITE.to_string(),
        timestamp,
        element,
        value: value.map(str::to_string),
        selected_text: None,
        form: None,
    }
}

pub fn click(timestamp: Timestamp) -> InteractionEvent {
    let mut button = node("BUTTON");
    button.id = Some("buy".to_string());
    button.id_unique = true;
    event(InteractionKind::Click, timestamp, element(button), None)
}

/// An `<input>` with the given name and type.
pub fn field_element(name: &str, input_type: &str) -> ElementDescription {
    let mut input = node("INPUT");
    input.name = Some(name.to_string());
    input.input_type = Some(input_type.to_string());
    element(input)
}

pub fn control(name: &str, input_type: &str) -> FieldDescription {
    FieldDescription {
        name: Some(name.to_string()),
        id: None,
        input_type: Some(input_type.to_string()),
        sensitive_marker: false,
    }
}

pub fn form_field(name: &str, input_type: &str, value: &str) -> FormField {
    FormField {
        name: name.to_string(),
        value: value.to_string(),
        control: Some(control(name, input_type)),
    }
}

pub fn submission(timestamp: Timestamp, fields: Vec<FormField>) -> InteractionEvent {
    let mut form = node("FORM");
    form.id = Some("signup".to_string());
    form.id_unique = true;
    InteractionEvent {
        form: Some(FormSubmission {
            action: Some("https://shop.example/signup".to_string()),
            method: Some("post".to_string()),
            fields,
        }),
        ..event(InteractionKind::FormSubmission, timestamp, element(form), None)
    }
}

pub fn navigation(url: &str, timestamp: Timestamp) -> NavigationEvent {
    NavigationEvent {
        tab_id: TAB,
        url: url.to_string(),
        timestamp,
    }
}

pub fn request(id: &str, timestamp: Timestamp) -> TransactionStart {
    TransactionStart {
        tab_id: TAB,
        request_id: id.to_string(),
        url: "https://shop.example/api/cart".to_string(),
        method: "POST".to_string(),
        resource_type: "xmlhttprequest".to_string(),
        initiator: Some("https://shop.example".to_string()),
        timestamp,
        request_body: None,
    }
}

pub fn completed(id: &str, timestamp: Timestamp) -> TransactionCompleted {
    TransactionCompleted {
        request_id: id.to_string(),
        status: 200,
        headers: vec![Header::new("content-type", "application/json")],
        timestamp,
    }
}

pub fn failed(id: &str, timestamp: Timestamp) -> TransactionFailed {
    TransactionFailed {
        request_id: id.to_string(),
        error: "net::ERR_CONNECTION_RESET".to_string(),
        timestamp,
    }
}
