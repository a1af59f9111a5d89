//! Deterministic curl reconstruction of a tracked request.

use super::tracker::TrackedTransaction;
use crate::error::CaptureError;
use crate::protocol::RequestBody;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub const BINARY_PLACEHOLDER: &str = "@[binary_data_not_shown]";

pub fn reconstruct_command(transaction: &TrackedTransaction) -> String {
    let mut command = format!("curl {}", quote(&transaction.url));

    let method = transaction.method.to_ascii_uppercase();
    if !method.is_empty() && method != "GET" {
        command.push_str(&format!(" -X {}", method));
    }

    for header in &transaction.request_headers {
        command.push_str(&format!(
            " -H {}",
            quote(&format!("{}: {}", header.name, header.value))
        ));
    }

    if let Some(body) = &transaction.request_body {
        command.push_str(&body_clause(body));
    }

    command
}

fn body_clause(body: &RequestBody) -> String {
    if let Some(form_data) = &body.form_data {
        let mut clause = String::new();
        for (key, values) in form_data.iter() {
            for value in values {
                clause.push_str(&format!(" --form {}", quote(&format!("{}={}", key, value))));
            }
        }
        return clause;
    }

    match decode_raw_body(body) {
        Ok(Some(text)) => format!(" --data-binary {}", quote(&text)),
        Ok(None) => String::new(),
        Err(e) => {
            tracing::debug!("{}; body replaced by placeholder", e);
            format!(" --data-binary {}", quote(BINARY_PLACEHOLDER))
        }
    }
}

/// Concatenated raw chunks as UTF-8 text; `None` when there are no byte chunks.
pub fn decode_raw_body(body: &RequestBody) -> Result<Option<String>, CaptureError> {
    let mut bytes = Vec::new();
    let mut seen = false;
    for encoded in body.raw.iter().filter_map(|chunk| chunk.bytes.as_deref()) {
        seen = true;
        let decoded = STANDARD
            .decode(encoded)
            .map_err(|_| CaptureError::BodyDecodeFailure)?;
        bytes.extend_from_slice(&decoded);
    }
    if !seen {
        return Ok(None);
    }
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|_| CaptureError::BodyDecodeFailure)
}

/// Single-quote for a POSIX shell.
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}
