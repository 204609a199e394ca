use std::path::Path;
use tally_core::categorize::rules;
use tally_core::error::TallyError;

pub fn list() -> Result<(), TallyError> {
    for name in rules::PRESETS {
        let table = rules::load_preset(name)?;
        println!("{} (v{})", table.name, table.version);
        if let Some(ref desc) = table.description {
            println!("{}", desc);
        }
        println!();

        let max_name = table
            .categories
            .iter()
            .map(|c| c.name.len())
            .max()
            .unwrap_or(10);
        for (i, category) in table.categories.iter().enumerate() {
            println!(
                "  {:>2}. {:<width$}  {}",
                i + 1,
                category.name,
                category.keywords.join(", "),
                width = max_name
            );
        }
        println!();
        println!("  Unmatched descriptions fall back to \"{}\".", table.fallback);
    }
    Ok(())
}

pub fn validate(path: &Path) -> Result<(), TallyError> {
    let table = rules::load_category_table(path)?;
    println!(
        "Category table '{}' (v{}) is valid: {} categories, fallback \"{}\"",
        table.name,
        table.version,
        table.categories.len(),
        table.fallback
    );
    Ok(())
}
