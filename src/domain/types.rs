use serde::{Deserialize, Serialize};

/// Which translations a poem carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageAvailability {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ur")]
    Urdu,
    Both,
}

impl LanguageAvailability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Urdu => "ur",
            Self::Both => "both",
        }
    }
}

impl Default for LanguageAvailability {
    fn default() -> Self {
        Self::Both
    }
}

/// The three logical datasets the cache manages.
///
/// Each kind has its own durable-store tables, timestamp, and validity
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatasetKind {
    Poems,
    Categories,
    Featured,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 3] = [Self::Poems, Self::Categories, Self::Featured];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Poems => "poems",
            Self::Categories => "categories",
            Self::Featured => "featured",
        }
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
