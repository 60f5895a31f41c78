//! Flat CSV report of users and pending hour records
//!
//! Both datasets share one header; the `section` column tells them apart.
//! Quoting is left to the `csv` crate: fields containing a delimiter, a
//! quote or a line break are wrapped in quotes with inner quotes doubled.

use common::models::{HourRecord, User};
use csv::{QuoteStyle, WriterBuilder};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{ExportError, ExportResult};

pub const REPORT_HEADER: [&str; 10] = [
    "section",
    "id",
    "name",
    "email",
    "sexo",
    "user_id",
    "hours",
    "date",
    "activity_type",
    "estado_aprobacion",
];

pub const USERS_SECTION: &str = "users";
pub const PENDING_SECTION: &str = "pending_hour";

/// Build the report for `users` followed by `pending` records
pub fn build_report_csv(users: &[User], pending: &[HourRecord]) -> ExportResult<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(REPORT_HEADER)?;

    let by_id: HashMap<i64, &User> = users.iter().map(|u| (u.id, u)).collect();

    for user in users {
        let name = if user.first_name.trim().is_empty() {
            user.username.as_str()
        } else {
            user.first_name.as_str()
        };
        let id = user.id.to_string();
        writer.write_record([
            USERS_SECTION,
            id.as_str(),
            name,
            user.email.as_str(),
            user.sexo.code(),
            "",
            "",
            "",
            "",
            "",
        ])?;
    }

    for record in pending {
        let sexo = by_id
            .get(&record.becario)
            .map(|u| u.sexo.code())
            .unwrap_or_default();
        let date = record
            .fecha_registro
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let id = record.id.to_string();
        let user_id = record.becario.to_string();
        let hours = record.horas_reportadas.to_string();
        writer.write_record([
            PENDING_SECTION,
            id.as_str(),
            "",
            "",
            sexo,
            user_id.as_str(),
            hours.as_str(),
            date.as_str(),
            record.activity_title().unwrap_or_default(),
            record.estado_aprobacion.code(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    debug!(
        "Built CSV report with {} users and {} pending records",
        users.len(),
        pending.len()
    );
    Ok(String::from_utf8(bytes)?)
}
