use regex::Regex;
use std::sync::LazyLock;
use structeval_core::{CoreError, ExtractionPolicy, FormatType, Result};

static CLOSED_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+.\-]*)[^\n]*\n(.*?)```").expect("valid fence pattern")
});

static OPEN_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+.\-]*)[^\n]*\n(.*)\z").expect("valid fence pattern")
});

/// Pulls the intended payload out of a model response.
#[derive(Debug, Clone, Default)]
pub struct PayloadExtractor {
    policy: ExtractionPolicy,
}

impl PayloadExtractor {
    pub fn new(policy: ExtractionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ExtractionPolicy {
        &self.policy
    }

    pub fn extract(&self, text: &str, format: Option<FormatType>) -> Result<String> {
        extract_payload(text, format, &self.policy)
    }
}

/// Best-effort payload extraction.
///
/// Tried in order:
/// 1. text after the first open marker up to the *last* close marker, or to
///    the end of input when no closer follows;
/// 2. the first fenced block whose info string matches `format`, else the
///    first fenced block of any kind;
/// 3. the trimmed input, unless the policy requires a marker.
pub fn extract_payload(text: &str, format: Option<FormatType>, policy: &ExtractionPolicy) -> Result<String> {
    if let Some(payload) = between_markers(text, &policy.open_marker, &policy.close_marker) {
        return Ok(payload.to_string());
    }

    if let Some(payload) = fenced_block(text, format) {
        return Ok(payload.to_string());
    }

    if policy.require_marker {
        return Err(CoreError::MissingPayload(format!(
            "expected `{}` or a fenced block",
            policy.open_marker
        )));
    }

    Ok(text.trim().to_string())
}

fn between_markers<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    if open.is_empty() {
        return None;
    }

    let start = text.find(open)? + open.len();
    let rest = &text[start..];

    match rest.rfind(close) {
        Some(end) if !close.is_empty() => Some(&rest[..end]),
        _ => Some(rest),
    }
}

fn fenced_block(text: &str, format: Option<FormatType>) -> Option<&str> {
    let blocks: Vec<(&str, &str)> = CLOSED_FENCE
        .captures_iter(text)
        .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .collect();

    if blocks.is_empty() {
        let caps = OPEN_FENCE.captures(text)?;
        return caps.get(2).map(|body| body.as_str());
    }

    if let Some(format) = format {
        let tags = format.fence_tags();
        let matching = blocks
            .iter()
            .find(|(info, _)| tags.iter().any(|tag| info.eq_ignore_ascii_case(tag)));
        if let Some((_, body)) = matching {
            return Some(*body);
        }
    }

    blocks.first().map(|(_, body)| *body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_take_precedence_over_fences() {
        let text = "```json\n{\"a\": 1}\n```\n<code>{\"b\": 2}</code>";
        let payload = extract_payload(text, Some(FormatType::Json), &ExtractionPolicy::default()).unwrap();
        assert_eq!(payload, "{\"b\": 2}");
    }

    #[test]
    fn empty_open_marker_is_ignored() {
        assert_eq!(between_markers("abc", "", "</code>"), None);
    }
}
