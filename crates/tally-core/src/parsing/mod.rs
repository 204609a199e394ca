pub mod dates;
pub mod header;
pub mod values;

/// A run of text between whitespace gaps, with character (not byte) offsets
/// into the line it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Split a line into cells at gaps of 2+ whitespace characters or any tab.
pub fn split_cells(line: &str) -> Vec<Cell<'_>> {
    let mut cells = Vec::new();
    // (byte, char) positions of the open cell and the current gap
    let mut cell_start: Option<(usize, usize)> = None;
    let mut gap_start: Option<(usize, usize)> = None;
    let mut gap_len = 0;
    let mut gap_has_tab = false;

    for (char_idx, (byte_idx, c)) in line.char_indices().enumerate() {
        if c.is_whitespace() {
            if gap_start.is_none() {
                gap_start = Some((byte_idx, char_idx));
                gap_len = 0;
                gap_has_tab = false;
            }
            gap_len += 1;
            gap_has_tab |= c == '\t';
            continue;
        }

        if let Some((gap_byte, gap_char)) = gap_start.take() {
            if gap_len >= 2 || gap_has_tab {
                if let Some((s_byte, s_char)) = cell_start.take() {
                    cells.push(Cell {
                        text: &line[s_byte..gap_byte],
                        start: s_char,
                        end: gap_char,
                    });
                }
            }
        }
        if cell_start.is_none() {
            cell_start = Some((byte_idx, char_idx));
        }
    }

    if let Some((s_byte, s_char)) = cell_start {
        let (end_byte, end_char) = gap_start.unwrap_or((line.len(), line.chars().count()));
        cells.push(Cell {
            text: &line[s_byte..end_byte],
            start: s_char,
            end: end_char,
        });
    }

    cells
}

/// Split a line by gaps of 2+ whitespace characters (or tabs).
pub fn split_by_whitespace_gaps(line: &str) -> Vec<&str> {
    split_cells(line).into_iter().map(|cell| cell.text).collect()
}
