//! End-to-end processing of one input file.
//!
//! raw rows → validated records → accumulated groupings → rolling windows →
//! consistency checks → tables. A fatal error anywhere before the write step
//! leaves the output directory untouched.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use pd_common::{Error, FileVariant, Result};
use pd_config::{ColumnSchema, DigestConfig};
use tracing::{debug, info, warn};

use crate::accumulate::StrataDigest;
use crate::exit_codes::ExitCode;
use crate::output::{render_all, Manifest, RenderedTable, MANIFEST_FILE};
use crate::parse::RecordReader;
use crate::rolling::RollingTable;
use crate::verify::{verify, ConsistencyMismatch};

/// Everything computed from one input, before anything is written.
#[derive(Debug, Clone)]
pub struct DigestOutcome {
    pub schema: &'static ColumnSchema,
    pub variant: FileVariant,
    pub digest: StrataDigest,
    pub rolling: Vec<RollingTable>,
    pub mismatches: Vec<ConsistencyMismatch>,
}

impl DigestOutcome {
    pub fn degenerate_windows(&self) -> usize {
        self.rolling.iter().map(|t| t.degenerate.len()).sum()
    }
}

/// Run `source` through the digest. Every row is validated before the first
/// one is accumulated; the first fatal row aborts the build.
pub fn build_digest<R: Read>(
    source: R,
    config: &DigestConfig,
    variant: FileVariant,
) -> Result<DigestOutcome> {
    let reader = RecordReader::new(source, config)?;
    let schema = reader.schema();
    let records = reader.collect::<Result<Vec<_>>>()?;
    debug!(records = records.len(), "all rows validated");

    let mut digest = StrataDigest::new();
    for record in &records {
        digest.merge(record)?;
    }
    info!(records = digest.records(), dates = digest.dates().len(), "accumulated records");

    let rolling: Vec<RollingTable> = config
        .sorted_windows()
        .into_iter()
        .map(|window| RollingTable::from_units(&digest.utla, window, config.z_score))
        .collect();
    for table in &rolling {
        debug!(
            window = table.window,
            rows = table.rows.len(),
            degenerate = table.degenerate.len(),
            "rolled unit series"
        );
    }

    let mismatches = verify(&digest, variant, config);

    Ok(DigestOutcome {
        schema,
        variant,
        digest,
        rolling,
        mismatches,
    })
}

/// Summary of one completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub input: PathBuf,
    pub out_dir: PathBuf,
    pub manifest: Manifest,
}

impl RunReport {
    pub fn exit_code(&self) -> ExitCode {
        if self.manifest.is_consistent() {
            ExitCode::Clean
        } else {
            ExitCode::Inconsistent
        }
    }
}

fn file_stem(input: &Path) -> Result<String> {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} has no file name", input.display()),
            ))
        })
}

/// Digest `input` and write its tables to `out_root/<file stem>/`.
///
/// The variant comes from `variant_override` or else from the file name.
pub fn run_file(
    input: &Path,
    out_root: &Path,
    config: &DigestConfig,
    variant_override: Option<FileVariant>,
) -> Result<RunReport> {
    let stem = file_stem(input)?;
    let variant = variant_override.unwrap_or_else(|| config.variant_prefixes.detect(&stem));
    info!(file = %input.display(), %variant, "digesting input");

    let source = BufReader::new(File::open(input)?);
    let outcome = build_digest(source, config, variant)?;
    let tables = render_all(&outcome.digest, &outcome.rolling, config)?;

    let mut manifest = Manifest::new(
        input,
        outcome.schema.name,
        variant,
        outcome.digest.records(),
    );
    manifest.tables = tables.iter().map(RenderedTable::summary).collect();
    manifest.consistency_mismatches = outcome.mismatches;
    manifest.degenerate_windows = outcome
        .rolling
        .into_iter()
        .flat_map(|t| t.degenerate)
        .collect();

    let out_dir = out_root.join(&stem);
    write_outputs(&out_dir, &tables, &manifest)?;

    if manifest.is_consistent() {
        info!(out = %out_dir.display(), tables = tables.len(), "digest written");
    } else {
        warn!(
            out = %out_dir.display(),
            mismatches = manifest.consistency_mismatches.len(),
            "digest written with consistency mismatches"
        );
    }

    Ok(RunReport {
        input: input.to_path_buf(),
        out_dir,
        manifest,
    })
}

fn write_outputs(out_dir: &Path, tables: &[RenderedTable], manifest: &Manifest) -> Result<()> {
    let manifest_bytes = manifest.to_bytes()?;
    fs::create_dir_all(out_dir)?;
    for table in tables {
        fs::write(out_dir.join(&table.name), &table.bytes)?;
    }
    fs::write(out_dir.join(MANIFEST_FILE), manifest_bytes)?;
    Ok(())
}
