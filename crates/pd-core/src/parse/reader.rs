//! Streaming CSV reader yielding validated records.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use pd_common::{Error, Record, Result};
use pd_config::{detect_schema, ColumnSchema, DigestConfig};
use tracing::{debug, info};

use super::row::RowParser;

/// Reads one input file row by row.
///
/// The header is consumed on construction and used to pick the column
/// layout. Iteration stops being meaningful after the first error; callers
/// are expected to abort the run.
pub struct RecordReader<R: Read> {
    inner: csv::Reader<R>,
    parser: RowParser,
    row: StringRecord,
}

impl<R: Read> RecordReader<R> {
    pub fn new(source: R, config: &DigestConfig) -> Result<Self> {
        let mut inner = ReaderBuilder::new().has_headers(true).from_reader(source);
        let headers = inner.headers()?.clone();
        let names: Vec<&str> = headers.iter().map(str::trim).collect();
        let schema = detect_schema(&names).map_err(|e| Error::Schema(e.to_string()))?;
        info!(schema = schema.name, columns = names.len(), "detected input layout");

        let parser = RowParser::new(schema, &headers, config)?;
        Ok(Self {
            inner,
            parser,
            row: StringRecord::new(),
        })
    }

    pub fn schema(&self) -> &'static ColumnSchema {
        self.parser.schema()
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.read_record(&mut self.row) {
            Ok(false) => None,
            Ok(true) => {
                let line = self.row.position().map(|p| p.line()).unwrap_or(0);
                let parsed = self.parser.parse(line, &self.row);
                if let Err(err) = &parsed {
                    debug!(line, code = err.code(), "row rejected");
                }
                Some(parsed)
            }
            Err(err) => Some(Err(err.into())),
        }
    }
}
