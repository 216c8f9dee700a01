use serde::{Deserialize, Serialize};
use std::fmt;

/// The output formats a task can ask for, keyed by the two-digit type code
/// embedded in task ids.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    Text,
    Angular,
    Csv,
    Canvas,
    Html,
    Json,
    Latex,
    Markdown,
    Matplotlib,
    Mermaid,
    Toml,
    React,
    Svg,
    Tikz,
    Typst,
    Vega,
    Vue,
    Xml,
    Yaml,
}

impl FormatType {
    pub const ALL: [FormatType; 19] = [
        FormatType::Text,
        FormatType::Angular,
        FormatType::Csv,
        FormatType::Canvas,
        FormatType::Html,
        FormatType::Json,
        FormatType::Latex,
        FormatType::Markdown,
        FormatType::Matplotlib,
        FormatType::Mermaid,
        FormatType::Toml,
        FormatType::React,
        FormatType::Svg,
        FormatType::Tikz,
        FormatType::Typst,
        FormatType::Vega,
        FormatType::Vue,
        FormatType::Xml,
        FormatType::Yaml,
    ];

    /// Two-digit code used inside task ids.
    pub fn code(&self) -> &'static str {
        match self {
            FormatType::Text => "00",
            FormatType::Angular => "01",
            FormatType::Csv => "02",
            FormatType::Canvas => "03",
            FormatType::Html => "04",
            FormatType::Json => "05",
            FormatType::Latex => "06",
            FormatType::Markdown => "07",
            FormatType::Matplotlib => "08",
            FormatType::Mermaid => "09",
            FormatType::Toml => "10",
            FormatType::React => "11",
            FormatType::Svg => "12",
            FormatType::Tikz => "13",
            FormatType::Typst => "14",
            FormatType::Vega => "15",
            FormatType::Vue => "16",
            FormatType::Xml => "17",
            FormatType::Yaml => "18",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|format| format.code() == code)
    }

    /// Case-insensitive lookup by display name or a common alias.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase();
        let format = match normalized.as_str() {
            "text" | "txt" | "plain" => FormatType::Text,
            "angular" => FormatType::Angular,
            "csv" => FormatType::Csv,
            "canvas" => FormatType::Canvas,
            "html" | "htm" => FormatType::Html,
            "json" => FormatType::Json,
            "latex" | "tex" => FormatType::Latex,
            "markdown" | "md" => FormatType::Markdown,
            "matplotlib" => FormatType::Matplotlib,
            "mermaid" => FormatType::Mermaid,
            "toml" => FormatType::Toml,
            "react" | "jsx" | "tsx" => FormatType::React,
            "svg" => FormatType::Svg,
            "tikz" => FormatType::Tikz,
            "typst" | "typ" => FormatType::Typst,
            "vega" | "vega-lite" | "vegalite" => FormatType::Vega,
            "vue" => FormatType::Vue,
            "xml" => FormatType::Xml,
            "yaml" | "yml" => FormatType::Yaml,
            _ => return None,
        };
        Some(format)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FormatType::Text => "Text",
            FormatType::Angular => "Angular",
            FormatType::Csv => "CSV",
            FormatType::Canvas => "Canvas",
            FormatType::Html => "HTML",
            FormatType::Json => "JSON",
            FormatType::Latex => "LaTeX",
            FormatType::Markdown => "Markdown",
            FormatType::Matplotlib => "Matplotlib",
            FormatType::Mermaid => "Mermaid",
            FormatType::Toml => "TOML",
            FormatType::React => "React",
            FormatType::Svg => "SVG",
            FormatType::Tikz => "Tikz",
            FormatType::Typst => "Typst",
            FormatType::Vega => "Vega",
            FormatType::Vue => "Vue",
            FormatType::Xml => "XML",
            FormatType::Yaml => "YAML",
        }
    }

    /// Formats validated as parsed data rather than screenshots.
    ///
    /// Only a parsing hint: branch selection always reads the record's
    /// `rendering` flag.
    pub fn is_structured_data(&self) -> bool {
        matches!(
            self,
            FormatType::Json | FormatType::Yaml | FormatType::Csv | FormatType::Toml | FormatType::Xml
        )
    }

    /// Info-string tags a fenced block for this format may carry.
    pub fn fence_tags(&self) -> &'static [&'static str] {
        match self {
            FormatType::Text => &["text", "txt", "plain"],
            FormatType::Angular => &["angular", "typescript", "ts"],
            FormatType::Csv => &["csv"],
            FormatType::Canvas => &["canvas", "html", "javascript", "js"],
            FormatType::Html => &["html", "htm"],
            FormatType::Json => &["json"],
            FormatType::Latex => &["latex", "tex"],
            FormatType::Markdown => &["markdown", "md"],
            FormatType::Matplotlib => &["python", "py", "matplotlib"],
            FormatType::Mermaid => &["mermaid"],
            FormatType::Toml => &["toml"],
            FormatType::React => &["jsx", "tsx", "react", "javascript", "js"],
            FormatType::Svg => &["svg", "xml"],
            FormatType::Tikz => &["tikz", "latex", "tex"],
            FormatType::Typst => &["typst", "typ"],
            FormatType::Vega => &["vega", "vega-lite", "json"],
            FormatType::Vue => &["vue", "html"],
            FormatType::Xml => &["xml"],
            FormatType::Yaml => &["yaml", "yml"],
        }
    }
}

impl fmt::Display for FormatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Opaque task identifier.
///
/// Characters `[0, 2)` carry the input type code and `[2, 4)` the output type
/// code. Nothing else about the id is interpreted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn input_code(&self) -> Option<&str> {
        self.0.get(0..2)
    }

    pub fn output_code(&self) -> Option<&str> {
        self.0.get(2..4)
    }

    pub fn input_format(&self) -> Option<FormatType> {
        self.input_code().and_then(FormatType::from_code)
    }

    pub fn output_format(&self) -> Option<FormatType> {
        self.output_code().and_then(FormatType::from_code)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
