//! Tabular datasets fed to the exporters
//!
//! A table is a list of columns plus rows that can produce a [`CellValue`]
//! for any column accessor. Columns without an accessor (selection boxes,
//! row actions) are skipped by the exporters.

use chrono::{DateTime, NaiveDate, Utc};
use common::models::{Activity, HourRecord, HoursAmount, User};
use serde_json::Value;

/// Value of a single cell before it is turned into text
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl CellValue {
    /// Text drawn for this cell
    ///
    /// Missing values render as an empty string and dates as `YYYY-MM-DD`.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Number(n) => HoursAmount::new(*n).to_string(),
            CellValue::Bool(true) => "Sí".to_string(),
            CellValue::Bool(false) => "No".to_string(),
            CellValue::Date(date) => date.format("%Y-%m-%d").to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d").to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(value: DateTime<Utc>) -> Self {
        CellValue::DateTime(value)
    }
}

impl From<HoursAmount> for CellValue {
    fn from(value: HoursAmount) -> Self {
        CellValue::Number(value.value())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

impl From<&Value> for CellValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Empty,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => n
                .as_i64()
                .map(CellValue::from)
                .unwrap_or_else(|| CellValue::Number(n.as_f64().unwrap_or_default())),
            Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

/// Table column; only columns with an accessor are exported
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub accessor: Option<String>,
    pub header: Option<String>,
}

impl Column {
    pub fn new(accessor: &str, header: &str) -> Self {
        Column {
            accessor: Some(accessor.to_string()),
            header: Some(header.to_string()),
        }
    }

    /// Display-only column (checkbox, action buttons)
    pub fn display(header: &str) -> Self {
        Column {
            accessor: None,
            header: Some(header.to_string()),
        }
    }

    /// Header text, falling back to the accessor key
    pub fn label(&self) -> &str {
        self.header
            .as_deref()
            .or(self.accessor.as_deref())
            .unwrap_or_default()
    }
}

/// Columns that carry data
pub fn accessor_columns(columns: &[Column]) -> Vec<&Column> {
    columns.iter().filter(|c| c.accessor.is_some()).collect()
}

/// A row that can be looked up by column accessor
pub trait TableRow {
    fn cell(&self, accessor: &str) -> CellValue;
}

/// Dotted-path lookup (`actividad_detalle.titulo`) into JSON objects
impl TableRow for Value {
    fn cell(&self, accessor: &str) -> CellValue {
        accessor
            .split('.')
            .try_fold(self, |node, key| node.get(key))
            .map(CellValue::from)
            .unwrap_or(CellValue::Empty)
    }
}

impl TableRow for User {
    fn cell(&self, accessor: &str) -> CellValue {
        match accessor {
            "id" => self.id.into(),
            "username" => self.username.as_str().into(),
            "email" => self.email.as_str().into(),
            "first_name" => self.first_name.as_str().into(),
            "last_name" => self.last_name.as_str().into(),
            "name" => self.display_name().into(),
            "rol" => self.rol.as_str().into(),
            "sexo" => self.sexo.code().into(),
            "fecha_nacimiento" => self.fecha_nacimiento.into(),
            "carrera" => self.carrera.as_str().into(),
            "universidad" => self.universidad.as_str().into(),
            "semestre" => self.semestre.as_str().into(),
            "meta_horas_voluntariado_interno" => self.meta_horas_voluntariado_interno.into(),
            "meta_horas_voluntariado_externo" => self.meta_horas_voluntariado_externo.into(),
            "meta_horas_chat_ingles" => self.meta_horas_chat_ingles.into(),
            "meta_horas_talleres" => self.meta_horas_talleres.into(),
            _ => CellValue::Empty,
        }
    }
}

impl TableRow for Activity {
    fn cell(&self, accessor: &str) -> CellValue {
        match accessor {
            "id" => self.id.into(),
            "titulo" => self.titulo.as_str().into(),
            "descripcion" => self.descripcion.clone().into(),
            "tipo" => self.tipo.as_str().into(),
            "fecha" => self.fecha.into(),
            "duracion_horas" => self.duracion_horas.into(),
            "competencia_desarrollada" => self.competencia_desarrollada.clone().into(),
            "modalidad" => self.modalidad.label().into(),
            "organizacion" => self.organizacion.clone().into(),
            "facilitador" => self.facilitador.clone().into(),
            "creador_nombre" => self.creador_nombre.clone().into(),
            "en_catalogo" => self.en_catalogo.into(),
            "fecha_creacion" => self.fecha_creacion.into(),
            "becarios_asignados" => (self.becarios_asignados.len().max(self.becarios_asignados_info.len())
                as i64)
                .into(),
            _ => CellValue::Empty,
        }
    }
}

impl TableRow for HourRecord {
    fn cell(&self, accessor: &str) -> CellValue {
        match accessor {
            "id" => self.id.into(),
            "becario" => self.becario.into(),
            "becario_nombre" => self.becario_nombre.clone().into(),
            "actividad" => self.actividad.into(),
            "actividad_detalle.titulo" => self.activity_title().map(str::to_string).into(),
            "actividad_detalle.tipo" => self
                .actividad_detalle
                .as_ref()
                .map(|a| a.tipo.as_str())
                .into(),
            "descripcion_manual" => self.descripcion_manual.clone().into(),
            "fecha_registro" => self.fecha_registro.into(),
            "horas_reportadas" => self.horas_reportadas.into(),
            "estado_aprobacion" => self.estado_aprobacion.label().into(),
            "fecha_aprobacion" => self.fecha_aprobacion.into(),
            "administrador_aprobo" => self.administrador_aprobo.into(),
            _ => CellValue::Empty,
        }
    }
}

/// Resolve the header labels and text grid for a dataset
pub fn text_grid<R: TableRow>(columns: &[Column], rows: &[R]) -> (Vec<String>, Vec<Vec<String>>) {
    let data_columns = accessor_columns(columns);
    let headers = data_columns.iter().map(|c| c.label().to_string()).collect();
    let grid = rows
        .iter()
        .map(|row| {
            data_columns
                .iter()
                .map(|c| row.cell(c.accessor.as_deref().unwrap_or_default()).display())
                .collect()
        })
        .collect();
    (headers, grid)
}
