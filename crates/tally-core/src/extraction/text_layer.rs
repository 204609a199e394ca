use lopdf::{Document, Object, ObjectId};
use tracing::{debug, warn};

use crate::error::TallyError;
use crate::extraction::{PageContent, PdfExtractor};

/// Kerning inside a `TJ` array more negative than this renders as a space
/// (units are thousandths of text space).
const TJ_SPACE_THRESHOLD: f32 = -200.0;

/// Vertical movement smaller than this stays on the same line.
const Y_TOLERANCE: f32 = 0.5;

/// Share of visible characters that may be unprintable before the page is
/// considered undecodable.
const MAX_UNPRINTABLE_RATIO: f64 = 0.3;

/// Layout-aware extraction backend built on `lopdf`.
///
/// Walks each page's content stream in rendering order and starts a new line
/// whenever the vertical text position changes. Fragments placed on the same
/// line by an explicit positioning operator are separated by a two-space gap
/// so column boundaries survive as whitespace gaps.
///
/// When a content stream cannot be decoded, or the decoded text is mostly
/// unprintable (an unsupported font encoding), the whole document is
/// re-extracted in flat mode: all text of a page joined by single spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfExtractor;

impl LopdfExtractor {
    pub fn new() -> Self {
        LopdfExtractor
    }
}

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, TallyError> {
        let doc = Document::load_mem(pdf_bytes)?;

        match extract_layout(&doc) {
            Ok(pages) => Ok(pages),
            Err(reason) => {
                warn!(%reason, "layout-aware extraction failed, falling back to flat text");
                extract_flat(&doc)
            }
        }
    }

    fn backend_name(&self) -> &str {
        "lopdf"
    }
}

#[derive(Debug, thiserror::Error)]
enum LayoutError {
    #[error("page {page}: content stream could not be decoded: {source}")]
    Content {
        page: u32,
        #[source]
        source: lopdf::Error,
    },

    #[error("page {page}: text is mostly unprintable")]
    Undecodable { page: u32 },
}

fn extract_layout(doc: &Document) -> Result<Vec<PageContent>, LayoutError> {
    doc.get_pages()
        .into_iter()
        .map(|(number, page_id)| {
            let text = page_layout_text(doc, number, page_id)?;
            if mostly_unprintable(&text) {
                return Err(LayoutError::Undecodable { page: number });
            }
            debug!(page = number, chars = text.len(), "layout text extracted");
            Ok(PageContent::new(number as usize, text))
        })
        .collect()
}

fn extract_flat(doc: &Document) -> Result<Vec<PageContent>, TallyError> {
    doc.get_pages()
        .into_keys()
        .map(|number| {
            let text = doc
                .extract_text(&[number])
                .map_err(|e| TallyError::Extraction(format!("page {number}: {e}")))?;
            let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
            Ok(PageContent::new(number as usize, joined))
        })
        .collect()
}

#[derive(Debug, Default)]
struct TextCursor {
    line_y: f32,
    leading: f32,
}

fn page_layout_text(doc: &Document, page: u32, page_id: ObjectId) -> Result<String, LayoutError> {
    let content = doc
        .get_and_decode_page_content(page_id)
        .map_err(|source| LayoutError::Content { page, source })?;

    let mut cursor = TextCursor::default();
    let mut text = String::new();
    let mut last_y: Option<f32> = None;
    let mut repositioned = false;

    for op in &content.operations {
        let operands = &op.operands;
        let fragment = match op.operator.as_str() {
            "BT" => {
                cursor.line_y = 0.0;
                None
            }
            "Tm" => {
                if let Some(f) = number(operands, 5) {
                    cursor.line_y = f;
                }
                repositioned = true;
                None
            }
            "Td" => {
                cursor.line_y += number(operands, 1).unwrap_or(0.0);
                repositioned = true;
                None
            }
            "TD" => {
                let ty = number(operands, 1).unwrap_or(0.0);
                cursor.leading = -ty;
                cursor.line_y += ty;
                repositioned = true;
                None
            }
            "TL" => {
                cursor.leading = number(operands, 0).unwrap_or(cursor.leading);
                None
            }
            "T*" => {
                cursor.line_y -= cursor.leading;
                None
            }
            "Tj" => operands.first().map(show_text),
            "'" => {
                cursor.line_y -= cursor.leading;
                operands.first().map(show_text)
            }
            "\"" => {
                cursor.line_y -= cursor.leading;
                operands.get(2).map(show_text)
            }
            "TJ" => operands.first().map(show_array),
            _ => None,
        };

        let Some(fragment) = fragment else { continue };
        if fragment.is_empty() {
            continue;
        }

        match last_y {
            Some(y) if (y - cursor.line_y).abs() > Y_TOLERANCE => text.push('\n'),
            Some(_) if repositioned && !text.ends_with(' ') => text.push_str("  "),
            _ => {}
        }
        text.push_str(&fragment);
        last_y = Some(cursor.line_y);
        repositioned = false;
    }

    Ok(text)
}

fn number(operands: &[Object], idx: usize) -> Option<f32> {
    operands.get(idx)?.as_float().ok()
}

fn show_text(obj: &Object) -> String {
    match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => String::new(),
    }
}

fn show_array(obj: &Object) -> String {
    let Object::Array(items) = obj else {
        return String::new();
    };
    let mut out = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => out.push_str(&decode_pdf_string(bytes)),
            other => {
                if other.as_float().is_ok_and(|k| k < TJ_SPACE_THRESHOLD) && !out.ends_with(' ') {
                    out.push(' ');
                }
            }
        }
    }
    out
}

/// UTF-16BE when the string carries a byte-order mark, Latin-1 otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units = rest
                .chunks(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]));
            char::decode_utf16(units)
                .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
        _ => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn mostly_unprintable(text: &str) -> bool {
    let (visible, bad) = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .fold((0usize, 0usize), |(visible, bad), c| {
            let unprintable = c.is_control() || c == char::REPLACEMENT_CHARACTER;
            (visible + 1, bad + usize::from(unprintable))
        });
    visible > 0 && (bad as f64) > (visible as f64) * MAX_UNPRINTABLE_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream, StringFormat};

    fn int(v: i64) -> Object {
        Object::Integer(v)
    }

    fn lit(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
    }

    fn build_pdf(operations: Vec<Operation>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => int(1),
            "MediaBox" => vec![int(0), int(0), int(595), int(842)],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn text_ops(body: Vec<Operation>) -> Vec<Operation> {
        let mut ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), int(10)]),
        ];
        ops.extend(body);
        ops.push(Operation::new("ET", vec![]));
        ops
    }

    #[test]
    fn test_line_breaks_follow_vertical_moves() {
        let pdf = build_pdf(text_ops(vec![
            Operation::new("Td", vec![int(50), int(700)]),
            Operation::new("Tj", vec![lit("Account Name: ADA OBI")]),
            Operation::new("Td", vec![int(0), int(-14)]),
            Operation::new("Tj", vec![lit("01/02/2024")]),
            Operation::new("Td", vec![int(80), int(0)]),
            Operation::new("Tj", vec![lit("SALARY PAYMENT")]),
        ]));

        let pages = LopdfExtractor.extract_pages(&pdf).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[0].text, "Account Name: ADA OBI\n01/02/2024  SALARY PAYMENT");
    }

    #[test]
    fn test_unpositioned_fragments_concatenate() {
        let pdf = build_pdf(text_ops(vec![
            Operation::new("Td", vec![int(50), int(700)]),
            Operation::new("Tj", vec![lit("Trans")]),
            Operation::new("Tj", vec![lit("fer")]),
        ]));

        let pages = LopdfExtractor.extract_pages(&pdf).unwrap();
        assert_eq!(pages[0].text, "Transfer");
    }

    #[test]
    fn test_tj_kerning_becomes_space() {
        let pdf = build_pdf(text_ops(vec![
            Operation::new("Td", vec![int(50), int(700)]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    lit("SALARY"),
                    int(-400),
                    lit("PAY"),
                    int(-20),
                    lit("MENT"),
                ])],
            ),
        ]));

        let pages = LopdfExtractor.extract_pages(&pdf).unwrap();
        assert_eq!(pages[0].text, "SALARY PAYMENT");
    }

    #[test]
    fn test_leading_operators_start_new_lines() {
        let pdf = build_pdf(text_ops(vec![
            Operation::new("TL", vec![int(12)]),
            Operation::new("Td", vec![int(50), int(700)]),
            Operation::new("Tj", vec![lit("first")]),
            Operation::new("T*", vec![]),
            Operation::new("Tj", vec![lit("second")]),
            Operation::new("'", vec![lit("third")]),
        ]));

        let pages = LopdfExtractor.extract_pages(&pdf).unwrap();
        assert_eq!(pages[0].text, "first\nsecond\nthird");
    }

    #[test]
    fn test_garbage_bytes_are_an_extraction_failure() {
        let err = LopdfExtractor.extract_pages(b"definitely not a pdf").unwrap_err();
        assert!(err.is_extraction_failure());
    }

    #[test]
    fn test_decode_utf16_string() {
        let bytes = [0xFE, 0xFF, 0x00, 0x41, 0x20, 0xA6];
        assert_eq!(decode_pdf_string(&bytes), "A₦");
    }

    #[test]
    fn test_mostly_unprintable() {
        assert!(mostly_unprintable("\u{1}\u{2}\u{3}a"));
        assert!(!mostly_unprintable("01/02/2024  SALARY"));
        assert!(!mostly_unprintable(""));
    }
}
