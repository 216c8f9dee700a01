use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use structeval_core::{CoreError, MetricCalculator, Result, Structure, ATTRIBUTE_PREFIX};

use super::MetricOutput;

/// Prefix of the root-only table header shortcut.
pub const CSV_HEADER_PREFIX: &str = "csv::";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PathToken {
    Key(String),
    Index(usize),
    Wildcard,
    CsvHeader(String),
}

/// Split a key path into tokens.
///
/// `.` separates tokens; backtick spans are literal (no `.` or `[`
/// splitting); `[n]` is an array index and `[*]` or a bare `*` a wildcard.
/// A leading `csv::<header>` token becomes [`PathToken::CsvHeader`].
pub fn tokenize(path: &str) -> Result<Vec<PathToken>> {
    let mut tokens = Vec::new();
    let mut current = TokenBuffer::default();
    let mut in_literal = false;
    let mut chars = path.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '`' => {
                in_literal = !in_literal;
                current.mark_literal();
            }
            _ if in_literal => current.text.push(ch),
            '.' => current.flush_into(&mut tokens),
            '[' => {
                current.flush_into(&mut tokens);

                let mut inner = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == ']' {
                        closed = true;
                        break;
                    }
                    inner.push(next);
                }
                if !closed {
                    return Err(CoreError::malformed_path(path, "unmatched `[`"));
                }
                tokens.push(bracket_token(path, inner.trim())?);
            }
            ']' => return Err(CoreError::malformed_path(path, "unmatched `]`")),
            _ => current.text.push(ch),
        }
    }

    if in_literal {
        return Err(CoreError::malformed_path(path, "unterminated backtick"));
    }
    current.flush_into(&mut tokens);

    Ok(tokens)
}

#[derive(Default)]
struct TokenBuffer {
    text: String,
    /// Byte offset at which the first backtick span began, if any.
    literal_from: Option<usize>,
}

impl TokenBuffer {
    fn mark_literal(&mut self) {
        if self.literal_from.is_none() {
            self.literal_from = Some(self.text.len());
        }
    }

    fn flush_into(&mut self, tokens: &mut Vec<PathToken>) {
        let text = std::mem::take(&mut self.text);
        let literal_from = self.literal_from.take();

        if text.is_empty() && literal_from.is_none() {
            return;
        }

        let unquoted_prefix = literal_from.unwrap_or(text.len());
        let token = if literal_from.is_none() && text == "*" {
            PathToken::Wildcard
        } else if tokens.is_empty()
            && unquoted_prefix >= CSV_HEADER_PREFIX.len()
            && text.starts_with(CSV_HEADER_PREFIX)
        {
            PathToken::CsvHeader(text[CSV_HEADER_PREFIX.len()..].to_string())
        } else {
            PathToken::Key(text)
        };
        tokens.push(token);
    }
}

fn bracket_token(path: &str, inner: &str) -> Result<PathToken> {
    if inner == "*" {
        return Ok(PathToken::Wildcard);
    }
    if let Ok(index) = inner.parse::<usize>() {
        return Ok(PathToken::Index(index));
    }

    let quoted = ['"', '\''].iter().find_map(|quote| {
        inner
            .strip_prefix(*quote)
            .and_then(|rest| rest.strip_suffix(*quote))
    });
    match quoted {
        Some(key) => Ok(PathToken::Key(key.to_string())),
        None => Err(CoreError::malformed_path(
            path,
            format!("`[{}]` is neither an index nor a wildcard", inner),
        )),
    }
}

/// Whether `path` addresses something inside `structure`.
///
/// A malformed path is reported as absent.
pub fn path_exists(structure: &Structure, path: &str) -> bool {
    match try_path_exists(structure, path) {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!(path, error = %err, "treating malformed path as absent");
            false
        }
    }
}

pub fn try_path_exists(structure: &Structure, path: &str) -> Result<bool> {
    let tokens = tokenize(path)?;
    Ok(tokens_exist(structure, &tokens))
}

/// Convenience for plain nested data.
pub fn value_path_exists(value: &Value, path: &str) -> bool {
    match tokenize(path) {
        Ok(tokens) => walk(value, &tokens),
        Err(err) => {
            tracing::warn!(path, error = %err, "treating malformed path as absent");
            false
        }
    }
}

pub fn tokens_exist(structure: &Structure, tokens: &[PathToken]) -> bool {
    match (tokens.split_first(), structure.headers()) {
        (None, _) => true,
        (Some((PathToken::CsvHeader(header), rest)), Some(headers)) => {
            // Header lookups are terminal.
            rest.is_empty() && headers.iter().any(|name| name == header)
        }
        _ => walk(&structure.as_value(), tokens),
    }
}

fn walk(node: &Value, tokens: &[PathToken]) -> bool {
    let Some((head, rest)) = tokens.split_first() else {
        return true;
    };

    match head {
        PathToken::Wildcard => node
            .as_array()
            .is_some_and(|items| items.iter().any(|item| walk(item, rest))),
        PathToken::Index(index) => node
            .as_array()
            .and_then(|items| items.get(*index))
            .is_some_and(|item| walk(item, rest)),
        PathToken::Key(key) => walk_key(node, key, rest),
        // Against a tree the shortcut is just a key that happens to start with `csv::`.
        PathToken::CsvHeader(header) => walk_key(node, &format!("{CSV_HEADER_PREFIX}{header}"), rest),
    }
}

fn walk_key(node: &Value, key: &str, rest: &[PathToken]) -> bool {
    let Some(map) = node.as_object() else {
        return false;
    };

    if let Some(child) = map.get(key) {
        return walk(child, rest);
    }

    key.strip_prefix(ATTRIBUTE_PREFIX)
        .filter(|bare| !bare.is_empty())
        .and_then(|bare| map.get(bare))
        .is_some_and(|child| walk(child, rest))
}

/// Per-path verdicts plus the fraction that exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathCoverage {
    pub score: f64,
    pub verdicts: Vec<bool>,
}

/// Fraction of `paths` present in `structure`. An empty checklist scores 0.
pub fn path_coverage<S: AsRef<str>>(structure: &Structure, paths: &[S]) -> PathCoverage {
    let verdicts: Vec<bool> = paths
        .iter()
        .map(|path| path_exists(structure, path.as_ref()))
        .collect();

    let score = if verdicts.is_empty() {
        0.0
    } else {
        verdicts.iter().filter(|found| **found).count() as f64 / verdicts.len() as f64
    };

    PathCoverage { score, verdicts }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathValidationInput {
    pub structure: Option<Structure>,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PathValidationCalculator;

impl PathValidationCalculator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetricCalculator for PathValidationCalculator {
    type Input = PathValidationInput;
    type Output = MetricOutput;

    async fn calculate(&self, input: Self::Input) -> Result<Self::Output> {
        let coverage = match &input.structure {
            Some(structure) => path_coverage(structure, &input.paths),
            None => PathCoverage {
                score: 0.0,
                verdicts: vec![false; input.paths.len()],
            },
        };

        Ok(MetricOutput::new(
            coverage.score,
            json!({
                "metric": "path_validation",
                "total_paths": input.paths.len(),
                "verdicts": coverage.verdicts,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_mixed_path() {
        let tokens = tokenize("a.`b.c`[2][*].d").unwrap();
        assert_eq!(
            tokens,
            vec![
                PathToken::Key("a".into()),
                PathToken::Key("b.c".into()),
                PathToken::Index(2),
                PathToken::Wildcard,
                PathToken::Key("d".into()),
            ]
        );
    }

    #[test]
    fn csv_prefix_only_at_root() {
        assert_eq!(
            tokenize("csv::price").unwrap(),
            vec![PathToken::CsvHeader("price".into())]
        );
        assert_eq!(
            tokenize("rows.csv::price").unwrap(),
            vec![PathToken::Key("rows".into()), PathToken::Key("csv::price".into())]
        );
    }
}
