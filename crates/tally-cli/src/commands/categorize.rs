use std::path::Path;
use tally_core::error::TallyError;

use super::load_categorizer;

pub fn run(descriptions: &[String], categories: Option<&Path>) -> Result<(), TallyError> {
    let categorizer = load_categorizer(categories)?;

    let width = descriptions.iter().map(|d| d.len()).max().unwrap_or(0);
    for description in descriptions {
        println!(
            "  {:<width$}  -> {}",
            description,
            categorizer.categorize(description),
            width = width
        );
    }

    Ok(())
}
