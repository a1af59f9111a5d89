//! Value masking for captured fields.
//!
//! Pattern-based only: a field is sensitive when its type is `password`, it
//! carries the sensitivity marker, or its name/id contains a configured
//! substring. Email-like fields are masked on text entry only.

use crate::config::SecurityConfig;
use crate::protocol::{FieldDescription, InteractionKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sensitivity {
    pub sensitive: bool,
    pub email_like: bool,
}

impl Sensitivity {
    /// Whether a value captured for `subtype` gets replaced.
    pub fn masks(&self, subtype: InteractionKind) -> bool {
        self.sensitive || (self.email_like && subtype == InteractionKind::Input)
    }
}

#[derive(Debug, Clone)]
pub struct ValueNormalizer {
    sensitive_fields: Vec<String>,
    email_fields: Vec<String>,
    password_placeholder: String,
    email_placeholder: String,
}

impl Default for ValueNormalizer {
    fn default() -> Self {
        Self::new(&SecurityConfig::default())
    }
}

impl ValueNormalizer {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            sensitive_fields: lowercase_all(&config.sensitive_fields),
            email_fields: lowercase_all(&config.email_fields),
            password_placeholder: config.password_placeholder.clone(),
            email_placeholder: config.email_placeholder.clone(),
        }
    }

    pub fn classify_sensitivity(&self, field: &FieldDescription) -> Sensitivity {
        let input_type = field.input_type.as_deref().map(str::to_ascii_lowercase);
        let name = field.name.as_deref().unwrap_or_default().to_lowercase();
        let id = field.id.as_deref().unwrap_or_default().to_lowercase();
        let mentions = |needles: &[String]| {
            needles
                .iter()
                .any(|needle| name.contains(needle.as_str()) || id.contains(needle.as_str()))
        };

        let sensitive = input_type.as_deref() == Some("password")
            || field.sensitive_marker
            || mentions(&self.sensitive_fields);
        let email_like = input_type.as_deref() == Some("email") || mentions(&self.email_fields);

        Sensitivity {
            sensitive,
            email_like,
        }
    }

    pub fn normalize(&self, field: &FieldDescription, raw: &str, subtype: InteractionKind) -> String {
        let sensitivity = self.classify_sensitivity(field);
        if sensitivity.sensitive {
            self.password_placeholder.clone()
        } else if sensitivity.email_like && subtype == InteractionKind::Input {
            self.email_placeholder.clone()
        } else {
            raw.to_string()
        }
    }

    /// Placeholders start with `***`; anything masked is never a usable token.
    pub fn is_placeholder(&self, value: &str) -> bool {
        value.starts_with("***")
            || value == self.password_placeholder
            || value == self.email_placeholder
    }
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}
