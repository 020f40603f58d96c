//! Placeholder syntax: `${name[:default[:prompt]]}`.
//!
//! ```text
//! git branch -m ${current_branch} ${new_branch::Enter branch name}
//! ```

use std::sync::LazyLock;

use regex::Regex;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(.*?)\}").expect("placeholder pattern is valid"));

/// One `${...}` span of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Variable name; `_N` for placeholders written without one.
    pub name: String,
    /// Second field, present when the body has two or more parts.
    pub default: Option<String>,
    /// Third field, present when the body has three parts.
    pub prompt: Option<String>,
}

impl Placeholder {
    fn from_body(body: &str, anonymous: &mut usize) -> Self {
        let mut parts = body.splitn(3, ':');
        let name = parts.next().unwrap_or_default();
        let name = if name.is_empty() {
            let synthetic = format!("_{anonymous}");
            *anonymous += 1;
            synthetic
        } else {
            name.to_string()
        };
        Self { name, default: parts.next().map(String::from), prompt: parts.next().map(String::from) }
    }

    /// A `name:default` placeholder falls back to its default without asking.
    #[must_use]
    pub fn has_silent_default(&self) -> bool {
        self.default.is_some() && self.prompt.is_none()
    }

    /// Message shown when asking for this placeholder.
    #[must_use]
    pub fn prompt_message(&self) -> &str {
        match self.prompt.as_deref() {
            Some(prompt) if !prompt.is_empty() => prompt,
            _ => &self.name,
        }
    }

    /// Value pre-filled in the prompt.
    #[must_use]
    pub fn prompt_default(&self) -> &str {
        self.default.as_deref().unwrap_or_default()
    }
}

/// Literal text or a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied through unchanged.
    Literal(String),
    /// A `${...}` span.
    Placeholder(Placeholder),
}

/// A command line split into literal and placeholder segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parses `text`, numbering anonymous placeholders from `*anonymous`.
    ///
    /// The counter is shared so that anonymous placeholders across a batch
    /// of commands get distinct names.
    #[must_use]
    pub fn parse(text: &str, anonymous: &mut usize) -> Self {
        let mut segments = Vec::new();
        let mut last = 0;
        for captures in PLACEHOLDER.captures_iter(text) {
            let (Some(whole), Some(body)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Literal(text[last..whole.start()].to_string()));
            }
            segments.push(Segment::Placeholder(Placeholder::from_body(body.as_str(), anonymous)));
            last = whole.end();
        }
        if last < text.len() {
            segments.push(Segment::Literal(text[last..].to_string()));
        }
        Self { segments }
    }

    /// The parsed segments, in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}
