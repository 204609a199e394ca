pub mod categories;
pub mod categorize;
pub mod parse;

use std::path::Path;
use tally_core::categorize::{rules, Categorizer};
use tally_core::error::TallyError;

/// The table at `path`, or the built-in one.
fn load_categorizer(path: Option<&Path>) -> Result<Categorizer, TallyError> {
    match path {
        Some(path) => Ok(Categorizer::from_table(&rules::load_category_table(path)?)),
        None => Ok(Categorizer::default()),
    }
}
