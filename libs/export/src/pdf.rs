//! PDF document assembly on top of `pdf-writer`
//!
//! [`PdfDocument`] owns object ids, the two standard fonts and the optional
//! logo image. Pages are pushed as finished content streams; the page tree
//! is written once, in [`PdfDocument::finish`].

use chrono::{DateTime, Local};
use flate2::{Compression, write::ZlibEncoder};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};
use std::io::Write;
use tracing::debug;

use crate::error::ExportResult;
use crate::layout::{LayoutOptions, TableLayout};

const BODY_FONT: Name<'static> = Name(b"F1");
const BOLD_FONT: Name<'static> = Name(b"F2");
const LOGO: Name<'static> = Name(b"Im1");

/// RGB colour with components in 0..=1
pub type Rgb = (f32, f32, f32);

const HEADER_FILL: Rgb = (0.85, 0.87, 0.90);
const BAND_FILL: Rgb = (0.96, 0.96, 0.96);
const BORDER: Rgb = (0.65, 0.65, 0.65);
const BANNER_FILL: Rgb = (0.88, 0.92, 0.97);
const TEXT_INSET: f32 = 4.0;

/// Logo embedded as an image XObject
#[derive(Debug, Clone, Copy)]
struct Logo {
    id: Ref,
    width: u32,
    height: u32,
}

/// Branding drawn in the band at the top of every page
#[derive(Debug, Clone)]
pub struct Branding {
    pub title: String,
    pub subtitle: Option<String>,
    pub generated_at: DateTime<Local>,
}

impl Branding {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            generated_at: Local::now(),
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Timestamp line, day first as in the Spanish locale
    pub fn timestamp_line(&self) -> String {
        format!("Generado: {}", self.generated_at.format("%d/%m/%Y, %H:%M:%S"))
    }
}

/// PDF document under construction
pub struct PdfDocument {
    pdf: Pdf,
    catalog_id: Ref,
    pages_id: Ref,
    page_refs: Vec<Ref>,
    next_id: i32,
    font_id: Ref,
    bold_font_id: Ref,
    logo: Option<Logo>,
    page_width: f32,
    page_height: f32,
}

impl PdfDocument {
    pub fn new(page_width: f32, page_height: f32) -> Self {
        let mut pdf = Pdf::new();

        let catalog_id = Ref::new(1);
        let pages_id = Ref::new(2);
        let font_id = Ref::new(3);
        let bold_font_id = Ref::new(4);

        pdf.type1_font(font_id)
            .base_font(Name(b"Helvetica"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
        pdf.type1_font(bold_font_id)
            .base_font(Name(b"Helvetica-Bold"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));

        Self {
            pdf,
            catalog_id,
            pages_id,
            page_refs: Vec::new(),
            next_id: 5,
            font_id,
            bold_font_id,
            logo: None,
            page_width,
            page_height,
        }
    }

    fn fresh_ref(&mut self) -> Ref {
        let id = self.next_id;
        self.next_id += 1;
        Ref::new(id)
    }

    pub fn page_count(&self) -> usize {
        self.page_refs.len()
    }

    pub fn has_logo(&self) -> bool {
        self.logo.is_some()
    }

    /// Decode a PNG/JPEG logo and embed it as a Flate-compressed RGB image
    pub fn embed_logo(&mut self, bytes: &[u8]) -> ExportResult<()> {
        let rgb = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(rgb.as_raw())?;
        let compressed = encoder.finish()?;

        let id = self.fresh_ref();
        let mut image = self.pdf.image_xobject(id, &compressed);
        image.filter(Filter::FlateDecode);
        image.width(width as i32);
        image.height(height as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        drop(image);

        debug!("Embedded {}x{} logo", width, height);
        self.logo = Some(Logo { id, width, height });
        Ok(())
    }

    /// Append a finished page
    pub fn push_page(&mut self, content: Content) {
        let page_id = self.fresh_ref();
        let content_id = self.fresh_ref();
        self.page_refs.push(page_id);

        let mut page = self.pdf.page(page_id);
        page.parent(self.pages_id)
            .media_box(Rect::new(0.0, 0.0, self.page_width, self.page_height))
            .contents(content_id);

        let mut resources = page.resources();
        resources
            .fonts()
            .pair(BODY_FONT, self.font_id)
            .pair(BOLD_FONT, self.bold_font_id);
        if let Some(logo) = self.logo {
            resources.x_objects().pair(LOGO, logo.id);
        }
        drop(resources);
        drop(page);

        self.pdf.stream(content_id, &content.finish());
    }

    /// Write the catalog and page tree and return the file bytes
    pub fn finish(mut self) -> Vec<u8> {
        self.pdf.catalog(self.catalog_id).pages(self.pages_id);
        let mut pages = self.pdf.pages(self.pages_id);
        pages.count(self.page_refs.len() as i32);
        pages.kids(self.page_refs.iter().copied());
        drop(pages);
        self.pdf.finish()
    }

    /// Branding band: tinted box, logo on the left, title block next to it
    pub fn draw_banner(&self, content: &mut Content, branding: &Branding, margin: f32, height: f32) {
        let top = self.page_height - margin;
        let width = self.page_width - margin * 2.0;
        fill_rect(content, margin, top - height, width, height, BANNER_FILL);

        let mut text_x = margin + 12.0;
        if let Some(logo) = self.logo {
            let max_h = height - 10.0;
            let scale = (max_h / logo.height as f32).min(120.0 / logo.width as f32);
            let (w, h) = (logo.width as f32 * scale, logo.height as f32 * scale);
            content.save_state();
            content.transform([w, 0.0, 0.0, h, margin + 6.0, top - 5.0 - h]);
            content.x_object(LOGO);
            content.restore_state();
            text_x = margin + 6.0 + w + 12.0;
        }

        draw_text(content, BOLD_FONT, 16.0, text_x, top - 22.0, &branding.title);
        if let Some(subtitle) = &branding.subtitle {
            draw_text(content, BODY_FONT, 10.0, text_x, top - 37.0, subtitle);
        }
        draw_text(content, BODY_FONT, 8.0, text_x, top - height + 8.0, &branding.timestamp_line());
    }

    /// "Página n de m" centred in the bottom margin
    pub fn draw_page_number(&self, content: &mut Content, margin: f32, page: usize, total: usize) {
        let label = format!("Página {} de {}", page, total);
        let x = self.page_width / 2.0 - label.chars().count() as f32 * 2.2;
        draw_text(content, BODY_FONT, 8.0, x, margin / 2.0, &label);
    }

    /// Render a laid out table, one PDF page per layout page
    pub fn render_table(
        &mut self,
        layout: &TableLayout,
        opts: &LayoutOptions,
        branding: Option<&Branding>,
    ) {
        let total = layout.pages.len();
        let table_width = layout.column_width * layout.header_cells.len().max(1) as f32;

        for (page_idx, page) in layout.pages.iter().enumerate() {
            let mut content = Content::new();

            if let (Some(branding), Some(height)) = (branding, opts.banner_height) {
                self.draw_banner(&mut content, branding, opts.margin, height);
            }

            fill_rect(
                &mut content,
                opts.margin,
                page.header_top - page.header_height,
                table_width,
                page.header_height,
                HEADER_FILL,
            );
            draw_row_cells(
                &mut content,
                BOLD_FONT,
                opts.header_font_size,
                opts,
                layout.column_width,
                page.header_top,
                page.header_height,
                &layout.header_cells,
            );

            for row in &page.rows {
                if row.banded {
                    fill_rect(
                        &mut content,
                        opts.margin,
                        row.top - row.height,
                        table_width,
                        row.height,
                        BAND_FILL,
                    );
                }
                draw_row_cells(
                    &mut content,
                    BODY_FONT,
                    opts.font_size,
                    opts,
                    layout.column_width,
                    row.top,
                    row.height,
                    &row.cells,
                );
            }

            self.draw_page_number(&mut content, opts.margin, page_idx + 1, total);
            self.push_page(content);
        }
    }
}

/// Draw one row of wrapped cells with their borders
#[allow(clippy::too_many_arguments)]
fn draw_row_cells(
    content: &mut Content,
    font: Name,
    font_size: f32,
    opts: &LayoutOptions,
    column_width: f32,
    top: f32,
    height: f32,
    cells: &[Vec<String>],
) {
    let mut x = opts.margin;
    for lines in cells {
        let mut baseline = top - opts.cell_padding / 2.0 - font_size;
        for line in lines {
            draw_text(content, font, font_size, x + TEXT_INSET, baseline, line);
            baseline -= opts.line_height;
        }
        stroke_rect(content, x, top - height, column_width, height, BORDER);
        x += column_width;
    }
}

pub fn draw_text(content: &mut Content, font: Name, size: f32, x: f32, y: f32, text: &str) {
    if text.is_empty() {
        return;
    }
    content.begin_text();
    content.set_font(font, size);
    content.set_text_matrix([1.0, 0.0, 0.0, 1.0, x, y]);
    content.show(Str(&encode_win_ansi(text)));
    content.end_text();
}

pub fn fill_rect(content: &mut Content, x: f32, y: f32, w: f32, h: f32, (r, g, b): Rgb) {
    content.save_state();
    content.set_fill_rgb(r, g, b);
    content.rect(x, y, w, h);
    content.fill_nonzero();
    content.restore_state();
}

fn stroke_rect(content: &mut Content, x: f32, y: f32, w: f32, h: f32, (r, g, b): Rgb) {
    content.save_state();
    content.set_stroke_rgb(r, g, b);
    content.rect(x, y, w, h);
    content.stroke();
    content.restore_state();
}

/// Font names usable with [`draw_text`]
pub fn body_font() -> Name<'static> {
    BODY_FONT
}

pub fn bold_font() -> Name<'static> {
    BOLD_FONT
}

/// Encode text for the standard fonts (WinAnsiEncoding); characters the
/// encoding lacks become `?`
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\t' => b' ',
            c if (c as u32) < 0x20 => b' ',
            c if (c as u32) < 0x7F || (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layout_table;

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("Año"), vec![b'A', 0xF1, b'o']);
        assert_eq!(encode_win_ansi("€ – ok"), vec![0x80, b' ', 0x96, b' ', b'o', b'k']);
        assert_eq!(encode_win_ansi("日"), vec![b'?']);
    }

    #[test]
    fn test_one_pdf_page_per_layout_page() {
        let opts = LayoutOptions {
            max_rows_per_page: 10,
            ..LayoutOptions::default()
        };
        let headers = vec!["A".to_string(), "B".to_string()];
        let rows: Vec<Vec<String>> = (0..25).map(|i| vec![i.to_string(), "x".into()]).collect();
        let layout = layout_table(&headers, &rows, &opts);

        let mut doc = PdfDocument::new(opts.page_width, opts.page_height);
        doc.render_table(&layout, &opts, None);
        assert_eq!(doc.page_count(), 3);

        let bytes = doc.finish();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_invalid_logo_is_an_error() {
        let mut doc = PdfDocument::new(612.0, 792.0);
        assert!(doc.embed_logo(b"not an image").is_err());
        assert!(!doc.has_logo());
    }
}
