pub mod rules;
pub mod schema;

use schema::CategoryTableDef;
use std::sync::LazyLock;

static BUILTIN: LazyLock<Categorizer> = LazyLock::new(|| {
    let table = rules::load_preset("default").expect("embedded category table is valid");
    Categorizer::from_table(&table)
});

/// Maps free-text descriptions to a category by ordered keyword matching.
///
/// The first category (in table order) with a keyword contained in the
/// lowercased description wins. Keywords may overlap between categories, so
/// the order of the table decides.
#[derive(Debug, Clone)]
pub struct Categorizer {
    categories: Vec<(String, Vec<String>)>,
    fallback: String,
}

impl Categorizer {
    pub fn from_table(table: &CategoryTableDef) -> Self {
        let categories = table
            .categories
            .iter()
            .map(|c| {
                let keywords = c.keywords.iter().map(|k| k.to_lowercase()).collect();
                (c.name.clone(), keywords)
            })
            .collect();
        Categorizer {
            categories,
            fallback: table.fallback.clone(),
        }
    }

    /// The table shipped with the library.
    pub fn builtin() -> &'static Categorizer {
        &BUILTIN
    }

    pub fn categorize(&self, description: &str) -> &str {
        let lower = description.to_lowercase();
        self.categories
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k.as_str())))
            .map(|(name, _)| name.as_str())
            .unwrap_or(&self.fallback)
    }

    /// Category names in match order, fallback excluded.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        Categorizer::builtin().clone()
    }
}

/// Categorize with the built-in table.
pub fn categorize(description: &str) -> &'static str {
    Categorizer::builtin().categorize(description)
}
