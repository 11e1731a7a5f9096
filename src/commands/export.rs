//! `export`: JSONL log to CSV.

use anyhow::Result;
use cdvl_crawler::CsvExporter;
use tracing::info;

use crate::ProcessExit;
use crate::cli::ExportArgs;

pub(crate) fn run_export_command(args: &ExportArgs) -> Result<ProcessExit> {
    let columns = args
        .columns
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    let summary = CsvExporter::new(&args.input, &args.output)
        .with_columns(columns)
        .export()?;

    info!(
        records = summary.records,
        columns = summary.columns.len(),
        output = %args.output.display(),
        "Export complete"
    );
    Ok(ProcessExit::Success)
}
