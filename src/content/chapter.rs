use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Columns between indent stops. Tabs in chapter content expand to this many
/// spaces, and the Tab key types up to the next stop.
pub const TAB_WIDTH: usize = 4;

/// A named unit of practice content: one code snippet plus metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub language: String,
    pub level: Difficulty,
    pub category: String,
    #[serde(default)]
    pub snippet: String,
    pub content: String,
    #[serde(default)]
    pub order: u32,
}

impl Chapter {
    /// The text a session is typed against.
    ///
    /// Line endings become `\n`, tabs become [`TAB_WIDTH`] spaces, and trailing
    /// whitespace is dropped from every line and from the end.
    pub fn target_text(&self) -> String {
        self.content
            .replace("\r\n", "\n")
            .replace('\t', &" ".repeat(TAB_WIDTH))
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
            .trim_end()
            .to_string()
    }

    pub(crate) fn matches_term(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.category.to_lowercase().contains(&term)
            || self.snippet.to_lowercase().contains(&term)
    }
}
