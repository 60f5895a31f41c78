//! Table layout for multi-page PDF exports
//!
//! Columns share the usable width equally. Each cell is word-wrapped to an
//! estimated number of characters per line and capped at a fixed number of
//! lines, so row heights depend on the data. Page breaks are decided with the
//! actual height of the next row; every new page repeats the header row.

use std::borrow::Cow;
use textwrap::{Options, WrapAlgorithm};

/// Geometry and limits of a table layout, in PDF points
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub font_size: f32,
    pub header_font_size: f32,
    /// Average glyph width as a fraction of the font size (6pt at 10pt)
    pub char_width_ratio: f32,
    pub line_height: f32,
    /// Vertical padding added to every row
    pub cell_padding: f32,
    pub max_lines_per_cell: usize,
    /// Space kept free above the bottom margin (page footer)
    pub bottom_reserve: f32,
    /// Hard page break after this many rows, whatever the remaining space
    pub max_rows_per_page: usize,
    /// Height of the branding band at the top of each page, if any
    pub banner_height: Option<f32>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            page_width: 612.0,
            page_height: 792.0,
            margin: 40.0,
            font_size: 10.0,
            header_font_size: 11.0,
            char_width_ratio: 0.6,
            line_height: 12.0,
            cell_padding: 6.0,
            max_lines_per_cell: 4,
            bottom_reserve: 20.0,
            max_rows_per_page: 40,
            banner_height: None,
        }
    }
}

/// Gap between the branding band and the table
const BANNER_GAP: f32 = 10.0;

impl LayoutOptions {
    pub fn usable_width(&self) -> f32 {
        self.page_width - self.margin * 2.0
    }

    /// Y coordinate where the table starts on each page
    pub fn content_top(&self) -> f32 {
        let top = self.page_height - self.margin;
        match self.banner_height {
            Some(height) => top - height - BANNER_GAP,
            None => top,
        }
    }

    /// Lowest Y a row may reach
    pub fn content_bottom(&self) -> f32 {
        self.margin + self.bottom_reserve
    }

    /// Height of a row whose tallest cell has `lines` lines
    pub fn row_height(&self, lines: usize) -> f32 {
        lines.max(1) as f32 * self.line_height + self.cell_padding
    }
}

/// A row placed on a page
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRow {
    /// Index of the row in the dataset
    pub index: usize,
    /// Y coordinate of the top edge
    pub top: f32,
    pub height: f32,
    /// Wrapped lines of every cell
    pub cells: Vec<Vec<String>>,
    /// Tinted background
    pub banded: bool,
}

/// One page of the table
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub header_top: f32,
    pub header_height: f32,
    pub rows: Vec<PlacedRow>,
}

/// Complete layout of a table across pages
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub column_width: f32,
    pub header_cells: Vec<Vec<String>>,
    pub pages: Vec<PageLayout>,
}

/// Estimated characters that fit on one line of a column
pub fn chars_per_line(column_width: f32, font_size: f32, char_width_ratio: f32) -> usize {
    let char_width = font_size * char_width_ratio;
    if char_width <= 0.0 {
        return 1;
    }
    ((column_width / char_width).floor() as usize).max(1)
}

/// Greedily pack words into lines of at most `width` characters, keeping at
/// most `max_lines` lines; overflow is dropped
pub fn wrap_cell(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let options = Options::new(width.max(1)).wrap_algorithm(WrapAlgorithm::FirstFit);
    let mut lines: Vec<String> = textwrap::wrap(text, options)
        .into_iter()
        .take(max_lines.max(1))
        .map(Cow::into_owned)
        .collect();

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Lay out `rows` under `headers` across as many pages as needed
pub fn layout_table(headers: &[String], rows: &[Vec<String>], opts: &LayoutOptions) -> TableLayout {
    let columns = headers.len().max(1);
    let column_width = opts.usable_width() / columns as f32;
    let body_chars = chars_per_line(column_width, opts.font_size, opts.char_width_ratio);
    let header_chars = chars_per_line(column_width, opts.header_font_size, opts.char_width_ratio);

    let header_cells: Vec<Vec<String>> = headers
        .iter()
        .map(|h| wrap_cell(h, header_chars, opts.max_lines_per_cell))
        .collect();
    let header_height = opts.row_height(max_lines(&header_cells));

    let new_page = || PageLayout {
        header_top: opts.content_top(),
        header_height,
        rows: Vec::new(),
    };

    let mut pages = vec![new_page()];
    let mut y = opts.content_top() - header_height;

    for (index, row) in rows.iter().enumerate() {
        let cells: Vec<Vec<String>> = (0..headers.len())
            .map(|col| {
                let text = row.get(col).map(String::as_str).unwrap_or_default();
                wrap_cell(text, body_chars, opts.max_lines_per_cell)
            })
            .collect();
        let height = opts.row_height(max_lines(&cells));

        let placed_on_page = pages.last().map(|p| p.rows.len()).unwrap_or_default();
        let page_full = placed_on_page >= opts.max_rows_per_page.max(1);
        let no_room = y - height < opts.content_bottom();

        if placed_on_page > 0 && (page_full || no_room) {
            pages.push(new_page());
            y = opts.content_top() - header_height;
        }

        if let Some(page) = pages.last_mut() {
            page.rows.push(PlacedRow {
                index,
                top: y,
                height,
                cells,
                banded: index % 2 == 0,
            });
        }
        y -= height;
    }

    TableLayout {
        column_width,
        header_cells,
        pages,
    }
}

fn max_lines(cells: &[Vec<String>]) -> usize {
    cells.iter().map(Vec::len).max().unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Col {i}")).collect()
    }

    fn short_rows(n: usize, cols: usize) -> Vec<Vec<String>> {
        (0..n).map(|i| vec![format!("r{i}"); cols]).collect()
    }

    #[test]
    fn test_chars_per_line_estimate() {
        // 6pt per char at 10pt
        assert_eq!(chars_per_line(60.0, 10.0, 0.6), 10);
        assert_eq!(chars_per_line(3.0, 10.0, 0.6), 1);
    }

    #[test]
    fn test_wrap_is_greedy_and_capped() {
        let lines = wrap_cell("uno dos tres cuatro", 8, 4);
        assert_eq!(lines, vec!["uno dos", "tres", "cuatro"]);

        let long = "palabra ".repeat(20);
        let capped = wrap_cell(&long, 8, 4);
        assert_eq!(capped.len(), 4);

        assert_eq!(wrap_cell("", 8, 4), vec![String::new()]);
    }

    #[test]
    fn test_empty_dataset_is_single_header_page() {
        let layout = layout_table(&headers(3), &[], &LayoutOptions::default());
        assert_eq!(layout.pages.len(), 1);
        assert!(layout.pages[0].rows.is_empty());
        assert_eq!(layout.header_cells.len(), 3);
    }

    #[test]
    fn test_equal_column_widths() {
        let opts = LayoutOptions::default();
        let layout = layout_table(&headers(4), &[], &opts);
        assert_eq!(layout.column_width, (612.0 - 80.0) / 4.0);
    }

    #[test]
    fn test_max_rows_per_page_forces_break() {
        let opts = LayoutOptions {
            max_rows_per_page: 5,
            ..LayoutOptions::default()
        };
        let layout = layout_table(&headers(2), &short_rows(12, 2), &opts);
        let counts: Vec<usize> = layout.pages.iter().map(|p| p.rows.len()).collect();
        assert_eq!(counts, vec![5, 5, 2]);
        assert_eq!(layout.pages[1].rows[0].index, 5);
    }

    #[test]
    fn test_break_uses_actual_row_height() {
        let opts = LayoutOptions {
            max_rows_per_page: 1000,
            ..LayoutOptions::default()
        };
        let single = opts.row_height(1);
        let available = opts.content_top() - opts.row_height(1) - opts.content_bottom();
        let fitting = (available / single).floor() as usize;

        // Fill the page with one-line rows, then add a four-line row that
        // would overflow while another one-line row would still fit.
        let mut rows = short_rows(fitting - 1, 2);
        rows.push(vec!["palabra ".repeat(40), "x".into()]);
        let layout = layout_table(&headers(2), &rows, &opts);

        assert_eq!(layout.pages.len(), 2);
        assert_eq!(layout.pages[0].rows.len(), fitting - 1);
        let moved = &layout.pages[1].rows[0];
        assert_eq!(moved.index, fitting - 1);
        assert_eq!(moved.height, opts.row_height(4));
        // The header is redrawn above the moved row
        assert_eq!(moved.top, layout.pages[1].header_top - layout.pages[1].header_height);
    }

    #[test]
    fn test_rows_stay_above_bottom() {
        let opts = LayoutOptions::default();
        let layout = layout_table(&headers(3), &short_rows(200, 3), &opts);
        for page in &layout.pages {
            for row in &page.rows {
                assert!(row.top - row.height >= opts.content_bottom());
            }
        }
        let total: usize = layout.pages.iter().map(|p| p.rows.len()).sum();
        assert_eq!(total, 200);
    }

    #[test]
    fn test_banding_follows_row_index_across_pages() {
        let opts = LayoutOptions {
            max_rows_per_page: 3,
            ..LayoutOptions::default()
        };
        let layout = layout_table(&headers(1), &short_rows(7, 1), &opts);
        for row in layout.pages.iter().flat_map(|p| &p.rows) {
            assert_eq!(row.banded, row.index % 2 == 0);
        }
        assert!(!layout.pages[1].rows[0].banded);
    }

    #[test]
    fn test_banner_lowers_content_top() {
        let plain = LayoutOptions::default();
        let branded = LayoutOptions {
            banner_height: Some(60.0),
            ..LayoutOptions::default()
        };
        assert_eq!(plain.content_top() - branded.content_top(), 70.0);
    }
}
