use serde::{Deserialize, Serialize};

/// Inline formatting carried by one run of rich text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: String,
}

/// One run of rich text: its plain content, an optional link, and formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    pub plain_text: String,
    pub href: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
}

impl RichText {
    /// An unformatted, unlinked run.
    pub fn plain(text: &str) -> Self {
        Self {
            plain_text: text.to_string(),
            href: None,
            annotations: Annotations {
                color: "default".to_string(),
                ..Annotations::default()
            },
        }
    }
}

/// Concatenates the plain text of every run.
pub fn plain_text(runs: &[RichText]) -> String {
    runs.iter().map(|run| run.plain_text.as_str()).collect()
}
