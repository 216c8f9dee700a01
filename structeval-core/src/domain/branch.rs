use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum InputModality {
    Text,
    NonText,
}

impl InputModality {
    /// A query that embeds a payload marker carries structured/code input.
    pub fn of_query(query: &str, payload_marker: &str) -> Self {
        if !payload_marker.is_empty() && query.contains(payload_marker) {
            InputModality::NonText
        } else {
            InputModality::Text
        }
    }
}

/// The four evaluation categories: input modality crossed with output
/// renderability. Every record falls into exactly one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    TextToRenderable,
    TextToNonRenderable,
    NonTextToRenderable,
    NonTextToNonRenderable,
}

impl Branch {
    pub const ALL: [Branch; 4] = [
        Branch::TextToRenderable,
        Branch::TextToNonRenderable,
        Branch::NonTextToRenderable,
        Branch::NonTextToNonRenderable,
    ];

    pub fn new(modality: InputModality, rendering: bool) -> Self {
        match (modality, rendering) {
            (InputModality::Text, true) => Branch::TextToRenderable,
            (InputModality::Text, false) => Branch::TextToNonRenderable,
            (InputModality::NonText, true) => Branch::NonTextToRenderable,
            (InputModality::NonText, false) => Branch::NonTextToNonRenderable,
        }
    }

    pub fn modality(&self) -> InputModality {
        match self {
            Branch::TextToRenderable | Branch::TextToNonRenderable => InputModality::Text,
            Branch::NonTextToRenderable | Branch::NonTextToNonRenderable => InputModality::NonText,
        }
    }

    pub fn is_renderable(&self) -> bool {
        matches!(self, Branch::TextToRenderable | Branch::NonTextToRenderable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Branch::TextToRenderable => "text_to_renderable",
            Branch::TextToNonRenderable => "text_to_non_renderable",
            Branch::NonTextToRenderable => "non_text_to_renderable",
            Branch::NonTextToNonRenderable => "non_text_to_non_renderable",
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
