//! Run manifest: what was read, what was written, and what failed to check out.

use std::path::Path;

use pd_common::{FileVariant, Result, SCHEMA_VERSION};
use serde::Serialize;

use super::tables::TableSummary;
use crate::rolling::DegenerateWindow;
use crate::verify::ConsistencyMismatch;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Contents of `manifest.json`. Carries no timestamps or absolute paths, so
/// identical inputs produce identical manifests.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub schema_version: String,
    /// Input file name, without directories.
    pub input: String,
    pub column_schema: String,
    pub variant: FileVariant,
    pub records: u64,
    pub tables: Vec<TableSummary>,
    pub consistency_mismatches: Vec<ConsistencyMismatch>,
    pub degenerate_windows: Vec<DegenerateWindow>,
}

impl Manifest {
    pub fn new(input: &Path, column_schema: &str, variant: FileVariant, records: u64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            input: input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            column_schema: column_schema.to_string(),
            variant,
            records,
            tables: Vec::new(),
            consistency_mismatches: Vec::new(),
            degenerate_windows: Vec::new(),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.consistency_mismatches.is_empty()
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn input_is_reduced_to_file_name() {
        let path = PathBuf::from("/data/in/corrected_prevalence_region_trend_20220622.csv");
        let manifest = Manifest::new(&path, "utla19", FileVariant::Region, 3);
        assert_eq!(
            manifest.input,
            "corrected_prevalence_region_trend_20220622.csv"
        );
        assert!(manifest.is_consistent());
    }

    #[test]
    fn serializes_without_timestamps() {
        let manifest = Manifest::new(Path::new("a.csv"), "utla19", FileVariant::Age, 0);
        let json = String::from_utf8(manifest.to_bytes().unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["variant"], "age");
        assert_eq!(value["schema_version"], SCHEMA_VERSION);
        assert!(json.ends_with("}\n"));
        assert!(!json.contains("time"));
    }
}
