//! CSV and PDF exports for the hours portal

pub mod csv;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod report;
pub mod table;

pub use error::{ExportError, ExportResult};
pub use layout::{LayoutOptions, TableLayout, layout_table};
pub use report::{OverviewReport, table_pdf};
pub use table::{CellValue, Column, TableRow};
