use std::collections::HashSet;
use std::path::Path;

use crate::categorize::schema::CategoryTableDef;
use crate::error::TallyError;

const DEFAULT_CATEGORIES_JSON: &str = include_str!("../../../../rules/categories.json");

/// Built-in category tables.
pub const PRESETS: &[&str] = &["default"];

/// Load a built-in category table by name.
pub fn load_preset(name: &str) -> Result<CategoryTableDef, TallyError> {
    match name {
        "default" => parse_category_table_str(DEFAULT_CATEGORIES_JSON),
        _ => Err(TallyError::CategoryRulesInvalid(format!(
            "unknown preset '{}'. Available: {}",
            name,
            PRESETS.join(", ")
        ))),
    }
}

/// Load a category table from a JSON file.
pub fn load_category_table(path: &Path) -> Result<CategoryTableDef, TallyError> {
    let content = std::fs::read_to_string(path).map_err(|e| TallyError::CategoryRulesLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_category_table(&content, path)
}

/// Parse a category table from a JSON string read from `source`.
pub fn parse_category_table(json: &str, source: &Path) -> Result<CategoryTableDef, TallyError> {
    let table: CategoryTableDef =
        serde_json::from_str(json).map_err(|e| TallyError::CategoryRulesLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_category_table(&table)?;
    Ok(normalize_keywords(table))
}

/// Parse a category table from a JSON string (no file path context).
pub fn parse_category_table_str(json: &str) -> Result<CategoryTableDef, TallyError> {
    let table: CategoryTableDef = serde_json::from_str(json).map_err(TallyError::Json)?;
    validate_category_table(&table)?;
    Ok(normalize_keywords(table))
}

/// Validate that a category table is well-formed.
pub fn validate_category_table(table: &CategoryTableDef) -> Result<(), TallyError> {
    if table.name.trim().is_empty() {
        return Err(TallyError::CategoryRulesInvalid("name must not be empty".into()));
    }

    if table.version.trim().is_empty() {
        return Err(TallyError::CategoryRulesInvalid("version must not be empty".into()));
    }

    if table.fallback.trim().is_empty() {
        return Err(TallyError::CategoryRulesInvalid(
            "fallback category must not be empty".into(),
        ));
    }

    if table.categories.is_empty() {
        return Err(TallyError::CategoryRulesInvalid(
            "categories must not be empty".into(),
        ));
    }

    let mut seen = HashSet::new();
    for category in &table.categories {
        let name = category.name.trim();
        if name.is_empty() {
            return Err(TallyError::CategoryRulesInvalid(
                "category name must not be empty".into(),
            ));
        }

        if !seen.insert(name.to_lowercase()) {
            return Err(TallyError::CategoryRulesInvalid(format!(
                "category '{}' is listed more than once",
                name
            )));
        }

        if category.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(TallyError::CategoryRulesInvalid(format!(
                "category '{}' has no keywords",
                name
            )));
        }
    }

    Ok(())
}

fn normalize_keywords(mut table: CategoryTableDef) -> CategoryTableDef {
    for category in &mut table.categories {
        category.keywords = category
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
    }
    table
}
