//! Structural locators for interaction targets.
//!
//! A locator is a CSS-style path (`form.login > input[name="user"]:nth-child(2)`)
//! built bottom-up from the element description the page reports. A unique id
//! anchors the path and ends the walk; `body`/`html` are the document boundary.

use crate::error::CaptureError;
use crate::protocol::{ElementDescription, NodeDescription};

const BOUNDARY_TAGS: &[&str] = &["body", "html"];
const SEPARATOR: &str = " > ";

enum Level {
    /// Unique id selector; nothing above it is needed.
    Anchored(String),
    Relative(String),
}

/// Build the locator for `element`. Never fails; ids that cannot be used for a
/// direct lookup fall back to an attribute qualifier.
pub fn generate_locator(element: &ElementDescription) -> String {
    let mut path = Vec::with_capacity(element.ancestors.len() + 1);

    let levels = std::iter::once(&element.node).chain(element.ancestors.iter());
    for (depth, node) in levels.enumerate() {
        if depth > 0 && is_boundary(node) {
            break;
        }
        match level_selector(node) {
            Level::Anchored(selector) => {
                path.push(selector);
                break;
            }
            Level::Relative(selector) => path.push(selector),
        }
    }

    path.reverse();
    path.join(SEPARATOR)
}

fn is_boundary(node: &NodeDescription) -> bool {
    BOUNDARY_TAGS
        .iter()
        .any(|tag| node.tag_name.eq_ignore_ascii_case(tag))
}

fn level_selector(node: &NodeDescription) -> Level {
    let tag = node.tag_name.to_ascii_lowercase();
    let mut selector = tag.clone();

    let id = node.id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    if let Some(id) = id {
        match id_selector(id) {
            Ok(anchor) if node.id_unique => return Level::Anchored(anchor),
            Ok(_) => {}
            Err(e) => tracing::debug!("{}; using attribute qualifier", e),
        }
        selector.push_str(&attribute_qualifier("id", id));
    }

    let classes: Vec<&str> = node
        .classes
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    if !classes.is_empty() {
        selector.push('.');
        selector.push_str(&classes.join("."));
    }

    if let Some(name) = &node.name {
        selector.push_str(&attribute_qualifier("name", name));
    }

    if tag == "input"
        && id.is_none()
        && let Some(input_type) = &node.input_type
    {
        selector.push_str(&attribute_qualifier("type", input_type));
    }

    if id.is_none() && (node.same_tag_index > 1 || node.sibling_count > 1) {
        selector.push_str(&format!(":nth-child({})", node.sibling_index));
    }

    Level::Relative(selector)
}

/// `#id` when the id is a plain CSS identifier.
fn id_selector(id: &str) -> Result<String, CaptureError> {
    let mut chars = id.chars();
    let starts_ok = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => true,
        Some('-') => id
            .chars()
            .nth(1)
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_'),
        _ => false,
    };
    let rest_ok = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if starts_ok && rest_ok {
        Ok(format!("#{}", id))
    } else {
        Err(CaptureError::MalformedLocatorInput(id.to_string()))
    }
}

fn attribute_qualifier(attribute: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[{}=\"{}\"]", attribute, escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(tag: &str) -> NodeDescription {
        NodeDescription {
            tag_name: tag.to_string(),
            ..Default::default()
        }
    }

    fn element(node: NodeDescription, ancestors: Vec<NodeDescription>) -> ElementDescription {
        ElementDescription {
            node,
            ancestors,
            ..Default::default()
        }
    }

    #[test]
    fn test_unique_id_anchors_path() {
        let mut form = node("FORM");
        form.id = Some("login".into());
        form.id_unique = true;

        let mut button = node("BUTTON");
        button.classes = vec!["btn".into(), " ".into(), "primary".into()];

        let locator = generate_locator(&element(button, vec![form, node("main"), node("body")]));
        assert_eq!(locator, "#login > button.btn.primary");
    }

    #[test]
    fn test_duplicate_id_becomes_qualifier() {
        let mut div = node("div");
        div.id = Some("card".into());
        div.id_unique = false;
        div.sibling_count = 3;
        div.sibling_index = 2;

        let locator = generate_locator(&element(div, vec![node("body")]));
        // A node with an id never gets a positional qualifier.
        assert_eq!(locator, "div[id=\"card\"]");
    }

    #[test]
    fn test_unsafe_id_degrades_even_when_unique() {
        let mut span = node("span");
        span.id = Some("1st:item".into());
        span.id_unique = true;

        let locator = generate_locator(&element(span, vec![node("section"), node("html")]));
        assert_eq!(locator, "section > span[id=\"1st:item\"]");
    }

    #[test]
    fn test_input_type_and_name() {
        let mut input = node("INPUT");
        input.name = Some("q".into());
        input.input_type = Some("search".into());

        let locator = generate_locator(&element(input, vec![]));
        assert_eq!(locator, "input[name=\"q\"][type=\"search\"]");
    }

    #[test]
    fn test_quotes_in_attributes_are_escaped() {
        let mut input = node("input");
        input.name = Some("a\"b".into());
        assert_eq!(
            generate_locator(&element(input, vec![])),
            "input[name=\"a\\\"b\"]"
        );
    }

    #[test]
    fn test_id_selector_rules() {
        assert!(id_selector("main-nav").is_ok());
        assert!(id_selector("_x").is_ok());
        assert!(id_selector("-a").is_ok());
        assert!(id_selector("9lives").is_err());
        assert!(id_selector("a b").is_err());
        assert!(id_selector("--").is_err());
    }
}
