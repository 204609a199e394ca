use serde::{Deserialize, Serialize};

pub const DEFAULT_FALLBACK: &str = "Miscellaneous";

/// An ordered keyword table mapping descriptions to spending categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTableDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    /// Category used when no keyword matches.
    #[serde(default = "default_fallback")]
    pub fallback: String,
    /// Checked in order; the first category with a matching keyword wins.
    pub categories: Vec<CategoryDef>,
}

/// One category and the substrings that select it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDef {
    pub name: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub note: Option<String>,
}

fn default_fallback() -> String {
    DEFAULT_FALLBACK.to_string()
}
