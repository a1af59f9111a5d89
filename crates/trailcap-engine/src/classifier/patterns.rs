use crate::config::ConfigError;
use regex::{Regex, RegexBuilder};

/// Ordered, case-insensitive URL patterns. The first match wins.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    pub fn compile<S: AsRef<str>>(sources: &[S]) -> Result<Self, ConfigError> {
        let patterns = sources
            .iter()
            .map(|source| {
                let source = source.as_ref();
                RegexBuilder::new(source)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ConfigError::Pattern {
                        pattern: source.to_string(),
                        source: e,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Source text of the first pattern matching `text`.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|pattern| pattern.is_match(text))
            .map(|pattern| pattern.as_str())
    }
}
