//! Printable reports built from backend data
//!
//! The overview report opens with a summary page (KPI boxes plus counts by
//! approval state and by activity type) followed by the detail table of
//! pending hour records. Generic tables go through [`table_pdf`].

use chrono::{DateTime, Local};
use common::models::{HourRecord, HoursAmount, User};
use pdf_writer::Content;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

use crate::error::ExportResult;
use crate::layout::{LayoutOptions, layout_table};
use crate::pdf::{Branding, PdfDocument, body_font, bold_font, draw_text, fill_rect};
use crate::table::{Column, TableRow, text_grid};

pub const OVERVIEW_TITLE: &str = "Informe - Overview";
pub const DETAIL_TITLE: &str = "Detalle - Horas pendientes";
pub const DETAIL_HEADERS: [&str; 7] = ["ID", "Becario", "Sexo", "Actividad", "Horas", "Fecha", "Estado"];

/// Height of the branding band on every report page
pub const BANNER_HEIGHT: f32 = 60.0;

const KPI_BOX_WIDTH: f32 = 150.0;
const KPI_BOX_HEIGHT: f32 = 40.0;
const KPI_BOX_GAP: f32 = 12.0;
const KPI_FILL: (f32, f32, f32) = (0.96, 0.96, 0.96);

/// Layout used by every exported table
pub fn report_layout() -> LayoutOptions {
    LayoutOptions {
        banner_height: Some(BANNER_HEIGHT),
        ..LayoutOptions::default()
    }
}

/// Aggregated content of the overview report
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewReport {
    pub total_users: usize,
    pub total_pending: usize,
    pub total_hours: HoursAmount,
    pub by_state: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub detail_rows: Vec<Vec<String>>,
}

impl OverviewReport {
    pub fn from_data(users: &[User], pending: &[HourRecord]) -> Self {
        let by_id: HashMap<i64, &User> = users.iter().map(|u| (u.id, u)).collect();

        let mut by_state = BTreeMap::new();
        let mut by_type = BTreeMap::new();
        for record in pending {
            *by_state
                .entry(record.estado_aprobacion.label().to_string())
                .or_insert(0) += 1;

            let kind = record
                .actividad_detalle
                .as_ref()
                .map(|a| a.tipo.as_str().to_string())
                .unwrap_or_else(|| "Otros".to_string());
            *by_type.entry(kind).or_insert(0) += 1;
        }

        let detail_rows = pending
            .iter()
            .map(|record| {
                let intern = by_id.get(&record.becario);
                let name = record
                    .becario_nombre
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .or_else(|| intern.map(|u| u.display_name()))
                    .unwrap_or_else(|| record.becario.to_string());
                let activity = record
                    .activity_title()
                    .map(str::to_string)
                    .unwrap_or_default();
                let date = record
                    .fecha_registro
                    .map(|d| d.with_timezone(&Local).format("%d/%m/%Y").to_string())
                    .unwrap_or_default();

                vec![
                    record.id.to_string(),
                    name,
                    intern.map(|u| u.sexo.code()).unwrap_or_default().to_string(),
                    activity,
                    record.horas_reportadas.to_string(),
                    date,
                    record.estado_aprobacion.label().to_string(),
                ]
            })
            .collect();

        OverviewReport {
            total_users: users.len(),
            total_pending: pending.len(),
            total_hours: pending.iter().map(|r| r.horas_reportadas).sum(),
            by_state,
            by_type,
            detail_rows,
        }
    }

    /// Render the report; an unreadable logo is skipped
    pub fn render(&self, logo: Option<&[u8]>, generated_at: DateTime<Local>) -> ExportResult<Vec<u8>> {
        let opts = report_layout();
        let mut doc = PdfDocument::new(opts.page_width, opts.page_height);
        attach_logo(&mut doc, logo);

        let summary = Branding {
            title: OVERVIEW_TITLE.to_string(),
            subtitle: Some("Resumen".to_string()),
            generated_at,
        };
        let mut content = Content::new();
        doc.draw_banner(&mut content, &summary, opts.margin, BANNER_HEIGHT);
        self.draw_summary(&mut content, &opts);
        doc.push_page(content);

        let headers: Vec<String> = DETAIL_HEADERS.iter().map(|h| h.to_string()).collect();
        let layout = layout_table(&headers, &self.detail_rows, &opts);
        let detail = Branding {
            subtitle: Some(DETAIL_TITLE.to_string()),
            ..summary
        };
        doc.render_table(&layout, &opts, Some(&detail));

        info!(
            "Rendered overview report: {} pages, {} pending records",
            doc.page_count(),
            self.total_pending
        );
        Ok(doc.finish())
    }

    fn draw_summary(&self, content: &mut Content, opts: &LayoutOptions) {
        let top = opts.content_top();
        let boxes = [
            ("Usuarios totales", self.total_users.to_string()),
            ("Registros pendientes", self.total_pending.to_string()),
            ("Horas totales", self.total_hours.to_string()),
        ];

        for (i, (label, value)) in boxes.iter().enumerate() {
            let x = opts.margin + i as f32 * (KPI_BOX_WIDTH + KPI_BOX_GAP);
            fill_rect(content, x, top - KPI_BOX_HEIGHT, KPI_BOX_WIDTH, KPI_BOX_HEIGHT, KPI_FILL);
            draw_text(content, body_font(), 9.0, x + 8.0, top - 18.0, label);
            draw_text(content, bold_font(), 12.0, x + 8.0, top - 32.0, value);
        }

        let list_top = top - KPI_BOX_HEIGHT - 30.0;
        draw_counts(content, opts.margin, list_top, "Por estado (conteo):", &self.by_state);
        draw_counts(
            content,
            opts.page_width / 2.0,
            list_top,
            "Por tipo (conteo):",
            &self.by_type,
        );
    }
}

fn draw_counts(content: &mut Content, x: f32, top: f32, title: &str, counts: &BTreeMap<String, usize>) {
    draw_text(content, bold_font(), 11.0, x, top, title);
    let mut y = top - 14.0;
    for (key, count) in counts {
        draw_text(content, body_font(), 10.0, x + 6.0, y, &format!("{}: {}", key, count));
        y -= 12.0;
    }
}

fn attach_logo(doc: &mut PdfDocument, logo: Option<&[u8]>) {
    if let Some(bytes) = logo {
        if let Err(e) = doc.embed_logo(bytes) {
            warn!("Skipping report logo: {}", e);
        }
    }
}

/// Export any table as a branded PDF
pub fn table_pdf<R: TableRow>(
    title: &str,
    columns: &[Column],
    rows: &[R],
    logo: Option<&[u8]>,
    generated_at: DateTime<Local>,
) -> ExportResult<Vec<u8>> {
    let opts = report_layout();
    let (headers, grid) = text_grid(columns, rows);
    let layout = layout_table(&headers, &grid, &opts);

    let mut doc = PdfDocument::new(opts.page_width, opts.page_height);
    attach_logo(&mut doc, logo);

    let branding = Branding {
        title: title.to_string(),
        subtitle: Some(format!("{} registros", rows.len())),
        generated_at,
    };
    doc.render_table(&layout, &opts, Some(&branding));

    info!("Rendered table export '{}': {} pages", title, doc.page_count());
    Ok(doc.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> (Vec<User>, Vec<HourRecord>) {
        let users: Vec<User> = serde_json::from_value(json!([
            {"id": 1, "username": "ana", "email": "ana@x.org", "first_name": "Ana", "last_name": "Ruiz", "sexo": "F"},
            {"id": 2, "username": "luis", "email": "luis@x.org", "sexo": "M"}
        ]))
        .unwrap();
        let pending: Vec<HourRecord> = serde_json::from_value(json!([
            {"id": 5, "becario": 1, "actividad": 3, "horas_reportadas": "2.50", "estado_aprobacion": "P",
             "fecha_registro": "2025-10-12T12:00:00Z",
             "actividad_detalle": {"id": 3, "titulo": "Charla", "tipo": "Chat", "fecha": "2025-10-01",
                                   "duracion_horas": "1.00", "modalidad": "V", "en_catalogo": true}},
            {"id": 6, "becario": 2, "actividad": 4, "horas_reportadas": "1.5", "estado_aprobacion": "P"}
        ]))
        .unwrap();
        (users, pending)
    }

    #[test]
    fn test_overview_aggregates() {
        let (users, pending) = sample();
        let report = OverviewReport::from_data(&users, &pending);

        assert_eq!(report.total_users, 2);
        assert_eq!(report.total_pending, 2);
        assert_eq!(report.total_hours, HoursAmount::new(4.0));
        assert_eq!(report.by_state.get("Pendiente"), Some(&2));
        assert_eq!(report.by_type.get("Chat"), Some(&1));
        assert_eq!(report.by_type.get("Otros"), Some(&1));
    }

    #[test]
    fn test_detail_rows_resolve_interns() {
        let (users, pending) = sample();
        let report = OverviewReport::from_data(&users, &pending);

        let first = &report.detail_rows[0];
        assert_eq!(first[0], "5");
        assert_eq!(first[1], "Ana Ruiz");
        assert_eq!(first[2], "F");
        assert_eq!(first[3], "Charla");
        assert_eq!(first[4], "2.5");
        assert_eq!(first[6], "Pendiente");

        let second = &report.detail_rows[1];
        assert_eq!(second[1], "luis");
        assert_eq!(second[3], "");
        assert_eq!(second[5], "");
    }

    #[test]
    fn test_render_produces_pdf() {
        let (users, pending) = sample();
        let bytes = OverviewReport::from_data(&users, &pending)
            .render(Some(b"garbage"), Local::now())
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }
}
