use serde::Deserialize;

/// Class register entry ("Klassenbucheintrag") about a student, e.g. a late arrival.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClassregEvent {
    #[serde(default)]
    text: String,
    #[serde(default)]
    reason: Option<String>,
}

impl ClassregEvent {
    pub fn new(text: String) -> Self {
        Self { text, reason: None }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}
