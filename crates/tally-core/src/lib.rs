pub mod aggregate;
pub mod cascade;
pub mod categorize;
pub mod error;
pub mod extraction;
pub mod model;
pub mod parsing;
pub mod trace;
pub mod vision;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use cascade::{Cascade, Extraction, ParseContext, StrategyKind};
use categorize::Categorizer;
use error::TallyError;
use extraction::{PageContent, PdfExtractor};
use model::{Statement, StatementHeader};
use trace::ExtractionTrace;

/// Where the transactions of a [`ParsedStatement`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementSource {
    Table,
    Pattern,
    ColumnHeuristic,
    Narrative,
    SummaryOnly,
    Vision,
    None,
}

impl From<StrategyKind> for StatementSource {
    fn from(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Table => StatementSource::Table,
            StrategyKind::Pattern => StatementSource::Pattern,
            StrategyKind::ColumnHeuristic => StatementSource::ColumnHeuristic,
            StrategyKind::Narrative => StatementSource::Narrative,
        }
    }
}

impl fmt::Display for StatementSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementSource::Table => "table",
            StatementSource::Pattern => "pattern",
            StatementSource::ColumnHeuristic => "column_heuristic",
            StatementSource::Narrative => "narrative",
            StatementSource::SummaryOnly => "summary_only",
            StatementSource::Vision => "vision",
            StatementSource::None => "none",
        };
        write!(f, "{name}")
    }
}

/// A statement plus how it was recovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedStatement {
    pub statement: Statement,
    pub source: StatementSource,
    pub trace: ExtractionTrace,
}

impl ParsedStatement {
    /// No transactions and no summary totals were found. Not an error: the
    /// caller should ask for a clearer copy of the statement.
    pub fn is_empty(&self) -> bool {
        self.source == StatementSource::None
    }
}

/// Main API entry point: parse a PDF statement with the built-in categories.
pub fn parse_pdf(
    pdf_bytes: &[u8],
    extractor: &dyn PdfExtractor,
) -> Result<ParsedStatement, TallyError> {
    parse_pdf_with(pdf_bytes, extractor, Categorizer::builtin())
}

/// Parse a PDF statement with a custom category table.
///
/// Only extraction can fail; once text is available the cascade always
/// returns a result, possibly empty.
pub fn parse_pdf_with(
    pdf_bytes: &[u8],
    extractor: &dyn PdfExtractor,
    categorizer: &Categorizer,
) -> Result<ParsedStatement, TallyError> {
    let pages = extractor.extract_pages(pdf_bytes)?;
    info!(
        backend = extractor.backend_name(),
        pages = pages.len(),
        "extracted text"
    );
    if pages.iter().all(PageContent::is_blank) {
        warn!("document has no text layer");
    }

    Ok(parse_pages(&pages, categorizer))
}

/// Run the strategy cascade over already-extracted pages.
pub fn parse_pages(pages: &[PageContent], categorizer: &Categorizer) -> ParsedStatement {
    let header = pages
        .first()
        .map(|page| parsing::header::parse_header(&page.lines().collect::<Vec<_>>()))
        .unwrap_or_default();

    let ctx = ParseContext { categorizer };
    let outcome = Cascade::standard().run(pages, &ctx);

    let source = match &outcome.extraction {
        Extraction::Itemized { strategy, .. } => StatementSource::from(*strategy),
        Extraction::SummaryOnly(_) => StatementSource::SummaryOnly,
        Extraction::Nothing => StatementSource::None,
    };
    let statement = aggregate::aggregate(outcome.extraction, header);
    info!(
        %source,
        transactions = statement.transactions.len(),
        income = %statement.total_income,
        expense = %statement.total_expense,
        "statement parsed"
    );

    ParsedStatement {
        statement,
        source,
        trace: outcome.trace,
    }
}

/// Parse the JSON produced by the external vision model for image uploads.
pub fn parse_vision_response(
    response: &str,
    categorizer: &Categorizer,
) -> Result<ParsedStatement, TallyError> {
    let extraction = vision::read_vision_response(response, categorizer)?;
    let source = if extraction.transactions.is_empty() {
        StatementSource::None
    } else {
        StatementSource::Vision
    };
    let header = StatementHeader {
        period: extraction.period,
        ..Default::default()
    };
    let statement = aggregate::from_transactions(extraction.transactions, header);
    info!(%source, transactions = statement.transactions.len(), "vision response parsed");

    Ok(ParsedStatement {
        statement,
        source,
        trace: ExtractionTrace::default(),
    })
}
