//! CSV export of the filtered view.

use super::filter::FilteredView;
use crate::models::SITE_COLUMN;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Default file name offered for exports.
pub const DEFAULT_EXPORT_FILE: &str = "filtered_solar_data.csv";

/// Write the view as CSV: every original column, then `Site`.
///
/// Cells are written with their original text.
pub fn write_csv<W: Write>(view: &FilteredView<'_>, writer: W) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);

    let mut header: Vec<&str> = view.columns.iter().map(String::as_str).collect();
    header.push(SITE_COLUMN);
    writer.write_record(&header)?;

    for row in &view.rows {
        let mut record: Vec<&str> = row.fields.iter().map(String::as_str).collect();
        record.push(row.site.label());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Export the view to a file.
pub fn export_to_file(view: &FilteredView<'_>, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file {}", path.display()))?;

    write_csv(view, file)
        .with_context(|| format!("Failed to write export file {}", path.display()))?;

    info!("Exported {} rows to {}", view.len(), path.display());
    Ok(())
}
