//! Default structured-data loader.
//!
//! Parsers are tried in a fixed cascade and each success carries a fixed
//! confidence, so the same payload always loads the same way. A format hint
//! that names a parser moves that parser to the front of the cascade.

use serde_json::{Map, Number, Value};
use structeval_core::{FormatType, LoadedStructure, StructureLoader, Table, ATTRIBUTE_PREFIX};

pub const JSON_CONFIDENCE: f64 = 1.0;
pub const WEAK_CONFIDENCE: f64 = 0.5;
pub const YAML_CONFIDENCE: f64 = 0.9;
pub const CSV_CONFIDENCE: f64 = 0.9;
pub const CSV_SINGLE_COLUMN_CONFIDENCE: f64 = 0.7;
pub const INI_CONFIDENCE: f64 = 0.9;
pub const INI_EMPTY_CONFIDENCE: f64 = 0.3;
pub const XML_CONFIDENCE: f64 = 0.9;
pub const TOML_CONFIDENCE: f64 = 0.9;
pub const ENV_CONFIDENCE: f64 = 0.8;
pub const TEXT_CONFIDENCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackStructureLoader;

impl FallbackStructureLoader {
    pub fn new() -> Self {
        Self
    }
}

impl StructureLoader for FallbackStructureLoader {
    fn load(&self, text: &str, hint: Option<FormatType>) -> LoadedStructure {
        if text.trim().is_empty() {
            return LoadedStructure::failed();
        }

        if let Some(loaded) = hint.and_then(|format| load_as(text, format)) {
            tracing::debug!(format = %format_label(hint), confidence = loaded.confidence, "loaded with hinted parser");
            return loaded;
        }

        if let Some(loaded) = load_json(text) {
            return loaded;
        }

        // Markup also reads as a YAML string scalar.
        if hint.is_none() && text.trim_start().starts_with('<') {
            if let Some(loaded) = load_xml(text) {
                return loaded;
            }
        }

        match load_yaml(text) {
            YamlOutcome::Parsed(loaded) => return loaded,
            YamlOutcome::NullDocument => return LoadedStructure::failed(),
            YamlOutcome::Invalid => {}
        }

        if matches!(hint, None | Some(FormatType::Csv)) {
            if let Some(loaded) = load_csv(text) {
                return loaded;
            }
        }

        if hint.is_none() {
            if let Some(loaded) = load_ini(text) {
                return loaded;
            }
        }

        if matches!(hint, None | Some(FormatType::Xml)) {
            if let Some(loaded) = load_xml(text) {
                return loaded;
            }
        }

        if matches!(hint, None | Some(FormatType::Toml)) {
            if let Some(loaded) = load_toml(text) {
                return loaded;
            }
        }

        if hint.is_none() {
            if let Some(loaded) = load_env(text) {
                return loaded;
            }
        }

        tracing::debug!(format = %format_label(hint), "no parser matched, keeping raw text");
        LoadedStructure::new(Value::String(text.trim().to_string()), TEXT_CONFIDENCE)
    }
}

fn format_label(hint: Option<FormatType>) -> String {
    hint.map(|format| format.to_string())
        .unwrap_or_else(|| "none".to_string())
}

fn load_as(text: &str, format: FormatType) -> Option<LoadedStructure> {
    match format {
        FormatType::Json => load_json(text),
        FormatType::Yaml => match load_yaml(text) {
            YamlOutcome::Parsed(loaded) => Some(loaded),
            YamlOutcome::NullDocument | YamlOutcome::Invalid => None,
        },
        FormatType::Csv => load_csv(text),
        FormatType::Toml => load_toml(text),
        FormatType::Xml => load_xml(text),
        _ => None,
    }
}

fn is_populated_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

pub fn load_json(text: &str) -> Option<LoadedStructure> {
    let value: Value = serde_json::from_str(text).ok()?;
    let confidence = if is_populated_container(&value) {
        JSON_CONFIDENCE
    } else {
        WEAK_CONFIDENCE
    };
    Some(LoadedStructure::new(value, confidence))
}

enum YamlOutcome {
    Parsed(LoadedStructure),
    NullDocument,
    Invalid,
}

fn load_yaml(text: &str) -> YamlOutcome {
    let Ok(yaml) = serde_yaml::from_str::<serde_yaml::Value>(text) else {
        return YamlOutcome::Invalid;
    };

    let value = yaml_to_json(yaml);
    if value.is_null() {
        return YamlOutcome::NullDocument;
    }

    let confidence = if is_populated_container(&value) {
        YAML_CONFIDENCE
    } else {
        WEAK_CONFIDENCE
    };
    YamlOutcome::Parsed(LoadedStructure::new(value, confidence))
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(flag) => Value::Bool(flag),
        Yaml::Number(number) => yaml_number(&number),
        Yaml::String(text) => Value::String(text),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .map(|(key, value)| (yaml_key(key), yaml_to_json(value)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_number(number: &serde_yaml::Number) -> Value {
    if let Some(int) = number.as_i64() {
        Value::from(int)
    } else if let Some(uint) = number.as_u64() {
        Value::from(uint)
    } else {
        number
            .as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(text) => text,
        Yaml::Bool(flag) => flag.to_string(),
        Yaml::Number(number) => number.to_string(),
        Yaml::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|rendered| rendered.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Minimal RFC 4180 reader: quoted fields, doubled quotes, newlines inside
/// quotes. Blank lines are skipped.
pub fn read_csv_rows(text: &str) -> Option<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.trim().chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            _ if in_quotes => field.push(ch),
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(std::mem::take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    if in_quotes {
        return None;
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    Some(rows)
}

pub fn load_csv(text: &str) -> Option<LoadedStructure> {
    let mut rows = read_csv_rows(text)?;
    if rows.is_empty() {
        return None;
    }

    let confidence = if rows.len() >= 2 {
        if rows.iter().all(|row| row.len() > 1) {
            CSV_CONFIDENCE
        } else {
            CSV_SINGLE_COLUMN_CONFIDENCE
        }
    } else {
        WEAK_CONFIDENCE
    };

    let headers = rows.remove(0);
    Some(LoadedStructure::new(Table::new(headers, rows), confidence))
}

/// INI sections as an object of objects. Keys are lower-cased and
/// `[DEFAULT]` entries are folded into every section.
pub fn load_ini(text: &str) -> Option<LoadedStructure> {
    let mut defaults: Map<String, Value> = Map::new();
    let mut sections: Vec<(String, Map<String, Value>)> = Vec::new();
    let mut current: Option<usize> = None;
    let mut in_defaults = false;
    let mut last_key: Option<String> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            let name = trimmed[1..trimmed.len() - 1].trim().to_string();
            last_key = None;
            if name == "DEFAULT" {
                in_defaults = true;
                current = None;
                continue;
            }
            if sections.iter().any(|(existing, _)| *existing == name) {
                return None;
            }
            in_defaults = false;
            sections.push((name, Map::new()));
            current = Some(sections.len() - 1);
            continue;
        }

        let target = if in_defaults {
            &mut defaults
        } else {
            let index = current?;
            &mut sections[index].1
        };

        let indented = line.starts_with(' ') || line.starts_with('\t');
        if indented {
            if let Some(key) = &last_key {
                if let Some(Value::String(existing)) = target.get_mut(key) {
                    existing.push('\n');
                    existing.push_str(trimmed);
                    continue;
                }
            }
        }

        let split_at = trimmed.find(['=', ':'])?;
        let key = trimmed[..split_at].trim().to_lowercase();
        let value = trimmed[split_at + 1..].trim().to_string();
        if key.is_empty() {
            return None;
        }
        target.insert(key.clone(), Value::String(value));
        last_key = Some(key);
    }

    let mut result = Map::new();
    for (name, mut entries) in sections {
        for (key, value) in &defaults {
            entries.entry(key.clone()).or_insert_with(|| value.clone());
        }
        result.insert(name, Value::Object(entries));
    }

    let confidence = if result.is_empty() {
        INI_EMPTY_CONFIDENCE
    } else {
        INI_CONFIDENCE
    };
    Some(LoadedStructure::new(Value::Object(result), confidence))
}

pub fn load_toml(text: &str) -> Option<LoadedStructure> {
    let table: toml::Table = toml::from_str(text).ok()?;
    Some(LoadedStructure::new(
        toml_to_json(toml::Value::Table(table)),
        TOML_CONFIDENCE,
    ))
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(text) => Value::String(text),
        toml::Value::Integer(int) => Value::from(int),
        toml::Value::Float(float) => Number::from_f64(float)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(flag) => Value::Bool(flag),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

/// XML as `{root_tag: element}`. Attributes become `@name` keys, repeated
/// child tags collapse into an array and a childless element is its text.
pub fn load_xml(text: &str) -> Option<LoadedStructure> {
    let document = roxmltree::Document::parse(text.trim()).ok()?;
    let root = document.root_element();

    let mut tree = Map::new();
    tree.insert(root.tag_name().name().to_string(), xml_element(root));
    Some(LoadedStructure::new(Value::Object(tree), XML_CONFIDENCE))
}

fn xml_element(node: roxmltree::Node<'_, '_>) -> Value {
    let mut map = Map::new();

    for attribute in node.attributes() {
        map.insert(
            format!("{ATTRIBUTE_PREFIX}{}", attribute.name()),
            Value::String(attribute.value().to_string()),
        );
    }

    for child in node.children().filter(|child| child.is_element()) {
        let tag = child.tag_name().name().to_string();
        let value = xml_element(child);
        match map.get_mut(&tag) {
            Some(Value::Array(siblings)) => siblings.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(tag, value);
            }
        }
    }

    if map.is_empty() {
        if let Some(text) = node.text().map(str::trim).filter(|text| !text.is_empty()) {
            return Value::String(text.to_string());
        }
    }

    Value::Object(map)
}

/// `.env` / properties style `KEY=value` lines.
pub fn load_env(text: &str) -> Option<LoadedStructure> {
    let pairs: Map<String, Value> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), Value::String(value.trim().to_string())))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(LoadedStructure::new(Value::Object(pairs), ENV_CONFIDENCE))
    }
}
