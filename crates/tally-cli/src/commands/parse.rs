use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;
use tally_core::error::TallyError;
use tally_core::extraction::pdftotext::PdftotextExtractor;
use tally_core::extraction::text_layer::LopdfExtractor;
use tally_core::extraction::PdfExtractor;
use tally_core::ParsedStatement;

use super::load_categorizer;
use crate::output;

const EMPTY_RESULT_HINT: &str = "No transactions detected. Try a clearer copy of the statement.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Built-in layout-aware reader
    Lopdf,
    /// poppler's pdftotext in layout mode
    Pdftotext,
}

pub struct ParseArgs {
    pub input_file: PathBuf,
    pub output_format: String,
    pub output_file: Option<PathBuf>,
    pub backend: Backend,
    pub timeout: Option<u64>,
    pub categories: Option<PathBuf>,
    pub sanitize: bool,
}

pub fn run(args: ParseArgs) -> Result<(), TallyError> {
    let categorizer = load_categorizer(args.categories.as_deref())?;

    let is_json = args
        .input_file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let mut parsed = if is_json {
        let response = std::fs::read_to_string(&args.input_file)?;
        tally_core::parse_vision_response(&response, &categorizer)?
    } else {
        let pdf_bytes = std::fs::read(&args.input_file)?;
        let extractor = extractor(args.backend, args.timeout);
        tally_core::parse_pdf_with(&pdf_bytes, extractor.as_ref(), &categorizer)?
    };

    if parsed.is_empty() {
        println!("{EMPTY_RESULT_HINT}");
        return Ok(());
    }

    if args.sanitize {
        parsed.statement = parsed.statement.sanitized();
    }

    match args.output_file {
        Some(path) => {
            // Always write JSON when saving to file
            let json = serde_json::to_string_pretty(&parsed)?;
            std::fs::write(&path, json)?;
            eprintln!(
                "Parsed {} transaction(s) via {}, written to {}",
                parsed.statement.transactions.len(),
                parsed.source,
                path.display()
            );
            report_skipped(&parsed);
        }
        None => match args.output_format.as_str() {
            "json" => output::json::print(&parsed)?,
            _ => {
                output::table::print(&parsed);
                report_skipped(&parsed);
            }
        },
    }

    Ok(())
}

fn extractor(backend: Backend, timeout: Option<u64>) -> Box<dyn PdfExtractor> {
    match backend {
        Backend::Lopdf => Box::new(LopdfExtractor::new()),
        Backend::Pdftotext => match timeout {
            Some(secs) => Box::new(PdftotextExtractor::with_timeout(Duration::from_secs(secs))),
            None => Box::new(PdftotextExtractor::new()),
        },
    }
}

fn report_skipped(parsed: &ParsedStatement) {
    if !parsed.trace.skipped_lines.is_empty() {
        eprintln!(
            "  {} line(s) skipped during parsing",
            parsed.trace.skipped_lines.len()
        );
    }
}
