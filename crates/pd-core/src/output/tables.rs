//! CSV rendering of the digest tables.
//!
//! Tables are rendered fully in memory and hashed before anything touches
//! the filesystem, so a run either writes every table or none.

use chrono::NaiveDate;
use csv::Writer;
use pd_config::DigestConfig;
use serde::Serialize;
use sha2::{Digest, Sha256};

use pd_common::Result;

use crate::accumulate::{defined_fraction, StrataDigest, ValueTotals, FIELD_NAMES};
use crate::rolling::RollingTable;

/// One rendered table, ready to be written.
#[derive(Debug, Clone)]
pub struct RenderedTable {
    pub name: String,
    pub rows: usize,
    pub bytes: Vec<u8>,
}

/// Per-table entry of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub rows: usize,
    pub sha256: String,
}

impl RenderedTable {
    pub fn summary(&self) -> TableSummary {
        TableSummary {
            name: self.name.clone(),
            rows: self.rows,
            sha256: sha256_hex(&self.bytes),
        }
    }
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Incremental builder for one CSV table.
struct TableBuilder {
    name: String,
    writer: Writer<Vec<u8>>,
    rows: usize,
}

impl TableBuilder {
    fn new(name: impl Into<String>, keys: &[&str], extra: &[&str]) -> Result<Self> {
        let mut writer = Writer::from_writer(Vec::new());
        let header: Vec<&str> = keys
            .iter()
            .chain(FIELD_NAMES.iter())
            .chain(extra.iter())
            .copied()
            .collect();
        writer.write_record(&header)?;
        Ok(Self {
            name: name.into(),
            writer,
            rows: 0,
        })
    }

    fn row<K: AsRef<str>>(
        &mut self,
        keys: &[K],
        totals: &ValueTotals,
        extra: &[String],
    ) -> Result<()> {
        let mut cells: Vec<String> = keys.iter().map(|k| k.as_ref().to_string()).collect();
        cells.extend(totals.cells());
        cells.extend(extra.iter().cloned());
        self.writer.write_record(&cells)?;
        self.rows += 1;
        Ok(())
    }

    fn finish(self) -> Result<RenderedTable> {
        let bytes = self
            .writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(RenderedTable {
            name: self.name,
            rows: self.rows,
            bytes,
        })
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn date_cell(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

const DEFINED_COLUMNS: [&str; 2] = ["defined_population", "defined_population_fraction"];

fn defined_cells(defined: u64, totals: &ValueTotals) -> [String; 2] {
    [
        defined.to_string(),
        optional(defined_fraction(defined, totals.population)),
    ]
}

pub fn region_table(digest: &StrataDigest, config: &DigestConfig) -> Result<RenderedTable> {
    let mut table = TableBuilder::new("region.csv", &["date", "region"], &DEFINED_COLUMNS)?;
    for row in digest.region_rows(config) {
        let date = date_cell(&row.date);
        table.row(
            &[&date, &row.region],
            &row.totals,
            &defined_cells(row.defined_population, &row.totals),
        )?;
    }
    table.finish()
}

pub fn age_table(digest: &StrataDigest) -> Result<RenderedTable> {
    let mut table = TableBuilder::new("age.csv", &["date", "age_group"], &[])?;
    for ((date, age), totals) in digest.age.iter() {
        table.row(&[&date_cell(date), age], totals, &[])?;
    }
    table.finish()
}

pub fn imd_table(digest: &StrataDigest) -> Result<RenderedTable> {
    let mut table = TableBuilder::new("imd.csv", &["date", "imd"], &[])?;
    for ((date, imd), totals) in digest.imd.iter() {
        table.row(&[&date_cell(date), imd], totals, &[])?;
    }
    table.finish()
}

pub fn age_imd_table(digest: &StrataDigest) -> Result<RenderedTable> {
    let mut table = TableBuilder::new("age_imd.csv", &["date", "age_group", "imd"], &[])?;
    for ((date, age, imd), totals) in digest.age_imd.iter() {
        table.row(&[&date_cell(date), age, imd], totals, &[])?;
    }
    table.finish()
}

pub fn utla_table(digest: &StrataDigest) -> Result<RenderedTable> {
    let mut table =
        TableBuilder::new("utla.csv", &["region", "utla", "date"], &DEFINED_COLUMNS)?;
    for ((region, utla, date), totals) in digest.utla.iter() {
        let defined = digest.defined.utla(region, utla, *date).unwrap_or(0);
        table.row(
            &[region, utla, &date_cell(date)],
            totals,
            &defined_cells(defined, totals),
        )?;
    }
    table.finish()
}

pub fn rolling_table(rolling: &RollingTable) -> Result<RenderedTable> {
    let mut table = TableBuilder::new(
        format!("utla_{}d_average.csv", rolling.window),
        &["region", "utla", "date"],
        &["covid_rate", "covid_rate_lower", "covid_rate_upper"],
    )?;
    for row in &rolling.rows {
        table.row(
            &[&row.region, &row.utla, &date_cell(&row.date)],
            &row.averages,
            &[
                optional(row.covid_rate),
                optional(row.interval.map(|ci| ci.lower)),
                optional(row.interval.map(|ci| ci.upper)),
            ],
        )?;
    }
    table.finish()
}

pub fn sub_area_table(digest: &StrataDigest) -> Result<RenderedTable> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(["region", "utla", "district", "imd", "sub_area_count"])?;
    for (key, count) in digest.sub_areas.iter() {
        writer.write_record([
            key.region.as_str(),
            key.utla.as_str(),
            key.district.as_str(),
            key.imd.as_str(),
            count.to_string().as_str(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(RenderedTable {
        name: "sub_areas.csv".to_string(),
        rows: digest.sub_areas.len(),
        bytes,
    })
}

/// Every table of one run, in manifest order.
pub fn render_all(
    digest: &StrataDigest,
    rolling: &[RollingTable],
    config: &DigestConfig,
) -> Result<Vec<RenderedTable>> {
    let mut tables = vec![
        region_table(digest, config)?,
        age_table(digest)?,
        imd_table(digest)?,
        age_imd_table(digest)?,
        utla_table(digest)?,
    ];
    for table in rolling {
        tables.push(rolling_table(table)?);
    }
    tables.push(sub_area_table(digest)?);
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::totals::tests::stratum;
    use pd_common::{Record, StratumKey};
    use pd_math::Z_95;

    fn digest() -> StrataDigest {
        let mut digest = StrataDigest::new();
        for day in 1..=2 {
            let mut values = stratum();
            values.sub_area_count = Some(4);
            digest
                .merge(&Record {
                    line: 2,
                    key: StratumKey {
                        date: NaiveDate::from_ymd_opt(2022, 6, day).unwrap(),
                        region: "London".to_string(),
                        utla: "E09000001".to_string(),
                        district: "E09000001".to_string(),
                        age_group: "0-17".to_string(),
                        imd: "1".to_string(),
                    },
                    values,
                })
                .unwrap();
        }
        digest
    }

    fn text(table: &RenderedTable) -> String {
        String::from_utf8(table.bytes.clone()).unwrap()
    }

    #[test]
    fn region_table_has_synthetic_rows_and_fraction() {
        let table = region_table(&digest(), &DigestConfig::default()).unwrap();
        let body = text(&table);
        let lines: Vec<&str> = body.lines().collect();
        assert!(lines[0].starts_with("date,region,respondent_count,"));
        assert!(lines[0].ends_with(",defined_population,defined_population_fraction"));
        assert_eq!(table.rows, 6);
        assert_eq!(
            lines[1],
            "2022-06-01,London,500,100,100,20,25,1000,60,50,1.5,1.2,40,1000,1"
        );
        assert!(lines[2].starts_with("2022-06-01,England,"));
        assert!(lines[3].starts_with("2022-06-01,UK,"));
    }

    #[test]
    fn rolling_table_renders_bounds() {
        let d = digest();
        let rolling = RollingTable::from_units(&d.utla, 2, Z_95);
        let table = rolling_table(&rolling).unwrap();
        assert_eq!(table.name, "utla_2d_average.csv");
        assert_eq!(table.rows, 1);
        let body = text(&table);
        let row = body.lines().nth(1).unwrap();
        assert!(row.starts_with("London,E09000001,2022-06-02,500,"));
        let cells: Vec<&str> = row.split(',').collect();
        assert_eq!(cells[cells.len() - 3], "0.06");
        assert!(!cells[cells.len() - 1].is_empty());
    }

    #[test]
    fn sub_area_table_lists_static_counts() {
        let table = sub_area_table(&digest()).unwrap();
        assert_eq!(table.rows, 1);
        assert_eq!(
            text(&table).lines().nth(1),
            Some("London,E09000001,E09000001,1,4")
        );
    }

    #[test]
    fn summary_hash_is_stable() {
        let a = region_table(&digest(), &DigestConfig::default()).unwrap();
        let b = region_table(&digest(), &DigestConfig::default()).unwrap();
        assert_eq!(a.summary(), b.summary());
        assert_eq!(a.summary().sha256.len(), 64);
    }

    #[test]
    fn render_all_orders_tables() {
        let d = digest();
        let rolling = vec![RollingTable::from_units(&d.utla, 1, Z_95)];
        let names: Vec<String> = render_all(&d, &rolling, &DigestConfig::default())
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "region.csv",
                "age.csv",
                "imd.csv",
                "age_imd.csv",
                "utla.csv",
                "utla_1d_average.csv",
                "sub_areas.csv"
            ]
        );
    }
}
