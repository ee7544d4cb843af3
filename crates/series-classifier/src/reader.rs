//! Streaming CSV row reader.
//!
//! Collection tables, prediction tables and metadata tables are all
//! comma-separated with a header row. Each data row is returned as a
//! column-name to value map.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord};
use series_types::{Metadata, SeriesRecord};

use crate::types::{ClassifyError, ClassifyResult};

/// A streaming reader over the rows of a CSV table.
pub struct RowReader<R: Read> {
    reader: Reader<R>,
    headers: Vec<String>,
    rows_read: usize,
}

impl RowReader<BufReader<File>> {
    /// Opens a table from a file path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or its header cannot
    /// be read.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ClassifyResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ClassifyError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Counts the data rows of a file (for progress reporting).
    pub fn count_rows<P: AsRef<Path>>(path: P) -> ClassifyResult<usize> {
        let file = File::open(path.as_ref())?;
        let count = BufReader::new(file).lines().count();
        // Subtract 1 for header row
        Ok(count.saturating_sub(1))
    }
}

impl<R: Read> RowReader<R> {
    /// Creates a reader over any byte source.
    pub fn from_reader(reader: R) -> ClassifyResult<Self> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::None)
            .from_reader(reader);

        let headers = csv_reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                // Handle UTF-8 BOM at start of file
                if i == 0 {
                    h.trim_start_matches('\u{feff}').to_string()
                } else {
                    h.to_string()
                }
            })
            .collect();

        Ok(Self {
            reader: csv_reader,
            headers,
            rows_read: 0,
        })
    }

    /// Column names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Fails with [`ClassifyError::MissingColumn`] unless every column is
    /// present.
    pub fn require_columns(&self, columns: &[&str]) -> ClassifyResult<()> {
        for column in columns {
            if !self.headers.iter().any(|h| h == column) {
                return Err(ClassifyError::MissingColumn {
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Returns the number of rows read so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Reads all remaining rows into memory.
    pub fn read_all(self) -> ClassifyResult<Vec<Metadata>> {
        self.collect()
    }

    /// Reads all remaining rows as series records.
    pub fn read_records(self) -> ClassifyResult<Vec<SeriesRecord>> {
        self.map(|row| row.map(SeriesRecord::from)).collect()
    }

    fn to_row(&self, record: &StringRecord) -> Metadata {
        self.headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect()
    }
}

impl<R: Read> Iterator for RowReader<R> {
    type Item = ClassifyResult<Metadata>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut record = StringRecord::new();
            match self.reader.read_record(&mut record) {
                Ok(true) => {
                    self.rows_read += 1;

                    // Skip empty records
                    if record.is_empty() || record.iter().all(|f| f.trim().is_empty()) {
                        continue;
                    }

                    return Some(Ok(self.to_row(&record)));
                }
                Ok(false) => return None, // End of file
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}

/// Reads a whole table from a path as series records.
pub fn read_records<P: AsRef<Path>>(path: P) -> ClassifyResult<Vec<SeriesRecord>> {
    RowReader::from_path(path)?.read_records()
}
