//! CSV and text output.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::WriterBuilder;
use series_types::{PatientRecord, SeriesRecord};
use tracing::info;

use crate::types::ClassifyResult;

/// Cell value written for a column the row does not have.
pub const MISSING_CELL: &str = "None";

/// Writes rows as CSV with the given header, filling missing cells with
/// [`MISSING_CELL`]. Returns the number of data rows written.
pub fn write_rows<W, T, F>(writer: W, header: &[String], rows: &[T], cell: F) -> ClassifyResult<usize>
where
    W: Write,
    F: Fn(&T, &str) -> Option<String>,
{
    let mut csv_writer = WriterBuilder::new().delimiter(b',').from_writer(writer);
    csv_writer.write_record(header)?;
    for row in rows {
        let record: Vec<String> = header
            .iter()
            .map(|column| cell(row, column).unwrap_or_else(|| MISSING_CELL.to_string()))
            .collect();
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(rows.len())
}

/// Writes series records to a CSV file.
pub fn write_series<P: AsRef<Path>>(path: P, header: &[String], records: &[SeriesRecord]) -> ClassifyResult<usize> {
    let path = path.as_ref();
    let written = write_rows(create(path)?, header, records, |record, column| {
        record.get(column).map(str::to_string)
    })?;
    info!(path = %path.display(), rows = written, "series table written");
    Ok(written)
}

/// Writes patient records to a CSV file.
pub fn write_patients<P: AsRef<Path>>(path: P, header: &[String], records: &[PatientRecord]) -> ClassifyResult<usize> {
    let path = path.as_ref();
    let written = write_rows(create(path)?, header, records, |record, column| record.cell(column))?;
    info!(path = %path.display(), rows = written, "patient table written");
    Ok(written)
}

/// Writes one line per item to a text file.
pub fn write_lines<P, I, S>(path: P, lines: I) -> ClassifyResult<usize>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut writer = create(path.as_ref())?;
    let mut count = 0;
    for line in lines {
        writeln!(writer, "{}", line.as_ref())?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Creates a file, and its parent directories if needed.
pub(crate) fn create(path: &Path) -> ClassifyResult<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(BufWriter::new(File::create(path)?))
}
