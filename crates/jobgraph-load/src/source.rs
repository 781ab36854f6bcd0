//! Streaming CSV record source.
//!
//! A source location is whatever the configuration says; a `file://`
//! prefix is stripped and the rest is opened as a local path. Records are
//! keyed by header name, and rows shorter than the header simply lack the
//! trailing columns.

use std::fs::File;
use std::path::Path;

use jobgraph_core::Record;

use crate::error::SourceError;

/// Header-keyed records streamed from one CSV file.
pub struct CsvSource {
    location: String,
    headers: csv::StringRecord,
    records: csv::StringRecordsIntoIter<File>,
    position: u64,
}

impl CsvSource {
    /// Open `location` and read its header row.
    pub fn open(location: &str) -> Result<Self, SourceError> {
        let file = File::open(resolve_path(location)).map_err(|source| SourceError::Open {
            location: location.to_string(),
            source,
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|source| SourceError::Csv {
                location: location.to_string(),
                source,
            })?
            .clone();

        tracing::debug!(location, columns = headers.len(), "Opened CSV source");

        Ok(Self {
            location: location.to_string(),
            headers,
            records: reader.into_records(),
            position: 0,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

impl Iterator for CsvSource {
    type Item = Result<Record, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.records.next()?;
        self.position += 1;

        let item = match result {
            Ok(row) => {
                let values = self
                    .headers
                    .iter()
                    .zip(row.iter())
                    .map(|(h, v)| (h.to_string(), v.to_string()))
                    .collect();
                Ok(Record::new(self.position, values))
            }
            Err(source) => Err(SourceError::Csv {
                location: self.location.clone(),
                source,
            }),
        };
        Some(item)
    }
}

fn resolve_path(location: &str) -> &Path {
    Path::new(location.strip_prefix("file://").unwrap_or(location))
}
