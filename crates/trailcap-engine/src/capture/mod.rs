//! Turning raw interaction notifications into timeline entries.

pub mod locator;
pub mod normalizer;

pub use locator::generate_locator;
pub use normalizer::{Sensitivity, ValueNormalizer};

use crate::config::CaptureConfig;
use crate::entries::{FormValue, InteractionEntry};
use crate::protocol::{FormSubmission, InteractionEvent, InteractionKind};

/// Builds [`InteractionEntry`] values with locators and masked values.
#[derive(Debug, Clone)]
pub struct InteractionBuilder {
    normalizer: ValueNormalizer,
    text_snippet_limit: usize,
    html_snippet_limit: usize,
}

impl InteractionBuilder {
    pub fn new(normalizer: ValueNormalizer, config: &CaptureConfig) -> Self {
        Self {
            normalizer,
            text_snippet_limit: config.text_snippet_limit,
            html_snippet_limit: config.html_snippet_limit,
        }
    }

    pub fn normalizer(&self) -> &ValueNormalizer {
        &self.normalizer
    }

    pub fn build(&self, event: &InteractionEvent) -> InteractionEntry {
        let element = &event.element;
        let field = element.field();
        let sensitivity = self.normalizer.classify_sensitivity(&field);

        let value = event
            .value
            .as_deref()
            .map(|raw| self.normalizer.normalize(&field, raw, event.subtype));

        let mut entry = InteractionEntry {
            subtype: event.subtype,
            url: event.url.clone(),
            timestamp: event.timestamp,
            locator: generate_locator(element),
            tag_name: element.node.tag_name.clone(),
            element_id: element.node.id.clone().unwrap_or_default(),
            class_names: element.node.classes.join(" "),
            text_snippet: truncate(&element.text, self.text_snippet_limit),
            aria_label: element.aria_label.clone(),
            name_attribute: element.node.name.clone().unwrap_or_default(),
            html_snippet: truncate(&element.html, self.html_snippet_limit),
            is_sensitive: sensitivity.masks(event.subtype),
            value,
            selected_text: None,
            form_action: None,
            form_method: None,
            form_data: None,
            potential_email_submission: false,
            associated_transactions: Vec::new(),
        };

        match event.subtype {
            InteractionKind::Click | InteractionKind::Input => {}
            InteractionKind::SelectChange => {
                entry.selected_text = Some(event.selected_text.clone().unwrap_or_default());
            }
            InteractionKind::FormSubmission => {
                if let Some(form) = &event.form {
                    let (values, email_like) = self.normalize_form(form);
                    entry.form_action = form.action.clone();
                    entry.form_method = form.method.clone();
                    entry.form_data = Some(values);
                    entry.potential_email_submission = email_like;
                }
            }
        }

        entry
    }

    /// Normalizes every field as entered text. Returns the values in declaration
    /// order and whether any backing control looked like an email field.
    fn normalize_form(&self, form: &FormSubmission) -> (Vec<FormValue>, bool) {
        let mut email_like = false;
        let values = form
            .fields
            .iter()
            .map(|field| {
                let value = match &field.control {
                    Some(control) => {
                        email_like |= self.normalizer.classify_sensitivity(control).email_like;
                        self.normalizer
                            .normalize(control, &field.value, InteractionKind::Input)
                    }
                    None => field.value.clone(),
                };
                FormValue {
                    name: field.name.clone(),
                    value,
                }
            })
            .collect();
        (values, email_like)
    }
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
