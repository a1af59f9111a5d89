use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrailcapConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub correlation: CorrelationConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Resource kinds that never enter the transaction tracker.
    #[serde(default = "default_ignored_resource_types")]
    pub ignored_resource_types: Vec<String>,
    /// Resource kinds flagged as main requests in the timeline.
    #[serde(default = "default_main_request_types")]
    pub main_request_types: Vec<String>,
    /// Request headers whose lowercased name starts with any of these are dropped.
    #[serde(default = "default_filtered_header_prefixes")]
    pub filtered_header_prefixes: Vec<String>,
    #[serde(default = "default_text_snippet_limit")]
    pub text_snippet_limit: usize,
    #[serde(default = "default_html_snippet_limit")]
    pub html_snippet_limit: usize,
    #[serde(default = "default_response_body_stub")]
    pub response_body_stub: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            ignored_resource_types: default_ignored_resource_types(),
            main_request_types: default_main_request_types(),
            filtered_header_prefixes: default_filtered_header_prefixes(),
            text_snippet_limit: default_text_snippet_limit(),
            html_snippet_limit: default_html_snippet_limit(),
            response_body_stub: default_response_body_stub(),
        }
    }
}

fn default_ignored_resource_types() -> Vec<String> {
    ["image", "stylesheet", "font", "media", "csp_report"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_main_request_types() -> Vec<String> {
    ["xmlhttprequest", "form_submit", "main_frame", "sub_frame"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_filtered_header_prefixes() -> Vec<String> {
    vec!["sec-ch-ua".to_string()]
}

fn default_text_snippet_limit() -> usize {
    200
}

fn default_html_snippet_limit() -> usize {
    500
}

fn default_response_body_stub() -> String {
    "Response body not captured; only request metadata and response headers are available."
        .to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationConfig {
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
        }
    }
}

fn default_window_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Case-insensitive regexes, checked in order.
    #[serde(default = "default_verification_patterns")]
    pub verification_patterns: Vec<String>,
    #[serde(default = "default_verification_ttl_ms")]
    pub verification_ttl_ms: u64,
    /// Case-insensitive regexes, checked in order.
    #[serde(default = "default_profile_patterns")]
    pub profile_patterns: Vec<String>,
    /// A profile-looking URL is a candidate once the timeline holds more entries than this.
    #[serde(default = "default_weak_corroboration_threshold")]
    pub weak_corroboration_threshold: usize,
    /// Substrings of a form field name that mark it as an identity token.
    #[serde(default = "default_identity_field_hints")]
    pub identity_field_hints: Vec<String>,
    /// Identity tokens must be strictly longer than this.
    #[serde(default = "default_min_identity_length")]
    pub min_identity_length: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            verification_patterns: default_verification_patterns(),
            verification_ttl_ms: default_verification_ttl_ms(),
            profile_patterns: default_profile_patterns(),
            weak_corroboration_threshold: default_weak_corroboration_threshold(),
            identity_field_hints: default_identity_field_hints(),
            min_identity_length: default_min_identity_length(),
        }
    }
}

fn default_verification_patterns() -> Vec<String> {
    [
        "verify",
        "confirm",
        "activate",
        "token=",
        "email_verified=",
        "validation",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_verification_ttl_ms() -> u64 {
    300_000
}

fn default_profile_patterns() -> Vec<String> {
    [
        "profile",
        "user",
        "account",
        "author",
        "dashboard",
        "settings",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_weak_corroboration_threshold() -> usize {
    5
}

fn default_identity_field_hints() -> Vec<String> {
    vec!["user".to_string(), "name".to_string(), "login".to_string()]
}

fn default_min_identity_length() -> usize {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Name/id substrings that make a field sensitive.
    #[serde(default = "default_sensitive_fields")]
    pub sensitive_fields: Vec<String>,
    /// Name/id substrings that make a field email-like.
    #[serde(default = "default_email_fields")]
    pub email_fields: Vec<String>,
    #[serde(default = "default_password_placeholder")]
    pub password_placeholder: String,
    #[serde(default = "default_email_placeholder")]
    pub email_placeholder: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            sensitive_fields: default_sensitive_fields(),
            email_fields: default_email_fields(),
            password_placeholder: default_password_placeholder(),
            email_placeholder: default_email_placeholder(),
        }
    }
}

fn default_sensitive_fields() -> Vec<String> {
    vec!["password".to_string()]
}

fn default_email_fields() -> Vec<String> {
    vec!["email".to_string(), "e-mail".to_string()]
}

fn default_password_placeholder() -> String {
    "***PASSWORD_PLACEHOLDER***".to_string()
}

fn default_email_placeholder() -> String {
    "***EMAIL_PLACEHOLDER***".to_string()
}
