//! # Template
//! A template is a string of alternating literal text and named placeholders.
//!
//! ## Placeholder
//! A placeholder is written `{name}` with no nested braces. Its name is the string
//! between the braces.
//!
//! ## Fill and Parse
//! Filling substitutes values for every placeholder and produces a concrete string.
//! Parsing is the inverse: given text that follows the template's literal structure, it
//! recovers the placeholder values by locating each literal segment in turn. The two
//! directions round-trip as long as no substituted value contains a literal segment of
//! the template or another placeholder's bracketed form.

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;

use crate::template::errors::{MissingKeyError, TemplateFormatError, TemplateParseError};

lazy_static! {
    static ref PART_MATCH_RE: Regex = Regex::new(r"(\{[^{}]*\})|([^{}]+)").unwrap();
}

/// Lookup of field values by name, so templates can be filled from either a plain map
/// or a [`Record`](crate::corpus::Record).
pub trait FieldValues {
    fn value_of(&self, key: &str) -> Option<&str>;
}

impl FieldValues for HashMap<String, String> {
    fn value_of(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// One part of a template: either a run of literal text or a named placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Placeholder(String),
}

impl TemplatePart {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, TemplatePart::Placeholder(_))
    }

    /// The original raw form of the part, with braces restored for placeholders.
    pub fn raw(&self) -> String {
        match self {
            TemplatePart::Literal(text) => text.clone(),
            TemplatePart::Placeholder(name) => format!("{{{}}}", name),
        }
    }
}

/// A parsed template. Guaranteed to have at least one part, with literal and placeholder
/// parts strictly alternating. `keys` lists each distinct placeholder name once, in first
/// occurrence order, even when a name repeats in `parts`.
#[derive(Debug, Clone)]
#[readonly::make]
pub struct Template {
    /// The trimmed raw template string, readonly
    pub raw: String,

    /// The alternating parts of the template, readonly
    pub parts: Vec<TemplatePart>,

    /// Distinct placeholder names in first occurrence order, readonly
    pub keys: Vec<String>,
}

impl Template {
    /// Parse a raw template string. The string is trimmed of surrounding whitespace
    /// before tokenization.
    pub fn load(raw: impl Into<String>) -> Result<Self, TemplateFormatError> {
        let raw = raw.into().trim().to_string();
        let parts = Self::tokenize(&raw)?;
        let keys = Self::collect_keys(&parts);
        Ok(Self { raw, parts, keys })
    }

    fn tokenize(raw: &str) -> Result<Vec<TemplatePart>, TemplateFormatError> {
        let mut parts: Vec<TemplatePart> = Vec::new();
        for captures in PART_MATCH_RE.captures_iter(raw) {
            let part = if let Some(key_match) = captures.get(1) {
                let bracketed = key_match.as_str();
                TemplatePart::Placeholder(bracketed[1..bracketed.len() - 1].to_string())
            } else {
                // The alternation guarantees group 2 matched if group 1 did not.
                TemplatePart::Literal(captures.get(2).map_or("", |m| m.as_str()).to_string())
            };
            if let Some(previous) = parts.last() {
                if previous.is_placeholder() == part.is_placeholder() {
                    return Err(TemplateFormatError::new(
                        raw,
                        "placeholders and literal text must alternate within a template",
                    ));
                }
            }
            parts.push(part);
        }
        if parts.is_empty() {
            return Err(TemplateFormatError::new(raw, "template cannot be empty"));
        }
        Ok(parts)
    }

    fn collect_keys(parts: &[TemplatePart]) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut keys = Vec::new();
        for part in parts {
            if let TemplatePart::Placeholder(name) = part {
                if seen.insert(name.as_str()) {
                    keys.push(name.clone());
                }
            }
        }
        keys
    }

    /// Fill the template with values for its keys. A key used at several positions gets
    /// the same value at each occurrence.
    ///
    /// Substitution is plain text replacement over the raw string, so a value that
    /// itself contains another key's bracketed form will be substituted again. That is
    /// an accepted limitation, not silently handled.
    pub fn fill(&self, values: &impl FieldValues) -> Result<String, MissingKeyError> {
        let mut filled = self.raw.clone();
        for key in &self.keys {
            let value = values
                .value_of(key)
                .ok_or_else(|| MissingKeyError::new(key, &self.raw))?;
            filled = filled.replace(&format!("{{{}}}", key), value);
        }
        Ok(filled)
    }

    /// Parse text into a mapping from keys to the values they hold within the text,
    /// assuming the text follows this template's literal structure. The text is trimmed
    /// first. When the same placeholder name occurs more than once, the last occurrence
    /// wins in the result.
    pub fn parse(&self, text: &str) -> Result<HashMap<String, String>, TemplateParseError> {
        let mut parsed: HashMap<String, String> = HashMap::new();
        let mut remaining = text.trim();
        let mut index = 0;

        if let TemplatePart::Literal(leading) = &self.parts[0] {
            remaining = remaining.strip_prefix(leading.as_str()).ok_or_else(|| {
                TemplateParseError::new(format!(
                    "expected '{}' at start of text '{}'",
                    leading, text
                ))
            })?;
            index = 1;
        }

        while index < self.parts.len() {
            // Alternation puts a placeholder at every position reached here.
            let key = match &self.parts[index] {
                TemplatePart::Placeholder(name) => name,
                TemplatePart::Literal(text) => {
                    unreachable!("literal '{}' at a placeholder position", text)
                }
            };

            if index == self.parts.len() - 1 {
                parsed.insert(key.clone(), remaining.to_string());
            } else {
                let following = match &self.parts[index + 1] {
                    TemplatePart::Literal(text) => text,
                    TemplatePart::Placeholder(name) => {
                        unreachable!("placeholder '{}' at a literal position", name)
                    }
                };
                let found = remaining.find(following.as_str()).ok_or_else(|| {
                    TemplateParseError::new(format!(
                        "expected '{}' in text '{}'",
                        following, remaining
                    ))
                })?;
                parsed.insert(key.clone(), remaining[..found].to_string());
                remaining = &remaining[found + following.len()..];
            }

            index += 2;
        }

        Ok(parsed)
    }
}

pub mod errors {
    use std::error::Error;
    use std::fmt;
    use std::fmt::Formatter;

    /// Error when a raw template string is empty or its parts do not alternate between
    /// placeholders and literal text.
    #[derive(Debug, Clone)]
    pub struct TemplateFormatError {
        pub template: String,
        pub reason: String,
    }

    impl TemplateFormatError {
        pub(crate) fn new(template: impl Into<String>, reason: impl Into<String>) -> Self {
            Self {
                template: template.into(),
                reason: reason.into(),
            }
        }
    }

    impl fmt::Display for TemplateFormatError {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "TemplateFormatError: {} (template '{}')",
                self.reason, self.template
            )
        }
    }

    impl Error for TemplateFormatError {}

    /// Error when filling a template and a required key has no value.
    #[derive(Debug, Clone)]
    pub struct MissingKeyError {
        pub key: String,
        pub template: String,
    }

    impl MissingKeyError {
        pub(crate) fn new(key: impl Into<String>, template: impl Into<String>) -> Self {
            Self {
                key: key.into(),
                template: template.into(),
            }
        }
    }

    impl fmt::Display for MissingKeyError {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "MissingKeyError: key '{}' missing from values for template '{}'",
                self.key, self.template
            )
        }
    }

    impl Error for MissingKeyError {}

    /// Error when text does not match the literal structure of the template it is being
    /// parsed against.
    #[derive(Debug, Clone)]
    pub struct TemplateParseError {
        pub message: String,
    }

    impl TemplateParseError {
        pub(crate) fn new(message: impl Into<String>) -> Self {
            Self {
                message: message.into(),
            }
        }
    }

    impl fmt::Display for TemplateParseError {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(f, "TemplateParseError: {}", self.message)
        }
    }

    impl Error for TemplateParseError {}
}
