use tally_core::error::TallyError;
use tally_core::ParsedStatement;

pub fn print(parsed: &ParsedStatement) -> Result<(), TallyError> {
    let json = serde_json::to_string_pretty(parsed)?;
    println!("{json}");
    Ok(())
}
