//! Offline utilities over a crawl log: CSV export and a static HTML page.

mod csv_export;
mod site;

pub use csv_export::{
    CsvExporter, ExportError, ExportSummary, PREFERRED_COLUMNS, column_order, flatten_value,
};
pub use site::{SiteError, SiteGenerator, escape_json, generate_html};
