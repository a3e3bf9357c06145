//! The full set of groupings built from one input file.

use chrono::NaiveDate;
use pd_common::{Record, Result};
use pd_config::DigestConfig;

use super::defined::DefinedPopulation;
use super::grouping::GroupingAccumulator;
use super::sub_areas::SubAreaCounts;
use super::totals::ValueTotals;

pub type RegionKey = (NaiveDate, String);
pub type AgeKey = (NaiveDate, String);
/// `(region, utla, date)`: unit first so each unit's series is contiguous.
pub type UtlaKey = (String, String, NaiveDate);
pub type ImdKey = (NaiveDate, String);
pub type AgeImdKey = (NaiveDate, String, String);

/// Accumulators for every grouping dimension of one run.
///
/// Created empty per input file; never shared across runs.
#[derive(Debug, Clone, Default)]
pub struct StrataDigest {
    pub region: GroupingAccumulator<RegionKey>,
    pub age: GroupingAccumulator<AgeKey>,
    pub utla: GroupingAccumulator<UtlaKey>,
    pub imd: GroupingAccumulator<ImdKey>,
    pub age_imd: GroupingAccumulator<AgeImdKey>,
    pub defined: DefinedPopulation,
    pub sub_areas: SubAreaCounts,
    records: u64,
}

/// One row of the region table: a leaf region or a synthetic aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRow {
    pub date: NaiveDate,
    pub region: String,
    pub totals: ValueTotals,
    pub defined_population: u64,
    pub synthetic: bool,
}

impl StrataDigest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one validated record into every grouping.
    pub fn merge(&mut self, record: &Record) -> Result<()> {
        let key = &record.key;
        let values = ValueTotals::from(&record.values);

        if let Some(count) = record.values.sub_area_count {
            self.sub_areas.insert(key, count)?;
        }

        self.region.merge((key.date, key.region.clone()), &values);
        self.age.merge((key.date, key.age_group.clone()), &values);
        self.utla
            .merge((key.region.clone(), key.utla.clone(), key.date), &values);
        self.imd.merge((key.date, key.imd.clone()), &values);
        self.age_imd
            .merge((key.date, key.age_group.clone(), key.imd.clone()), &values);
        self.defined.merge(key, &record.values);
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    /// Region rows ordered by date; for each date the leaf regions come first,
    /// then England (all regions except the nations), then the UK (all regions).
    pub fn region_rows(&self, config: &DigestConfig) -> Vec<RegionRow> {
        let mut rows = Vec::with_capacity(self.region.len() + 2 * self.dates().len());
        let mut entries = self.region.iter().peekable();

        while let Some(((date, _), _)) = entries.peek() {
            let date = *date;
            let mut leaves = Vec::new();
            while let Some(((_, region), totals)) = entries.next_if(|((d, _), _)| *d == date) {
                leaves.push((region.as_str(), totals));
            }

            for (region, totals) in &leaves {
                rows.push(RegionRow {
                    date,
                    region: region.to_string(),
                    totals: (*totals).clone(),
                    defined_population: self.defined.region(date, region).unwrap_or(0),
                    synthetic: false,
                });
            }

            let english = leaves
                .iter()
                .filter(|(region, _)| !config.is_nation(region))
                .map(|(_, totals)| *totals);
            // A date with only nations still gets an England row.
            rows.push(RegionRow {
                date,
                region: config.england_label.clone(),
                totals: ValueTotals::merged(english).unwrap_or_else(ValueTotals::zero),
                defined_population: self
                    .defined
                    .regions_on(date, |region| !config.is_nation(region)),
                synthetic: true,
            });

            if let Some(totals) = ValueTotals::merged(leaves.iter().map(|(_, totals)| *totals)) {
                rows.push(RegionRow {
                    date,
                    region: config.uk_label.clone(),
                    totals,
                    defined_population: self.defined.regions_on(date, |_| true),
                    synthetic: true,
                });
            }
        }
        rows
    }

    /// Distinct dates seen, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.region.iter().map(|((date, _), _)| *date).collect();
        dates.dedup();
        dates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::totals::tests::stratum;
    use chrono::Datelike;
    use pd_common::{Error, ScaleFactor, StratumKey};

    fn record(day: u32, region: &str, utla: &str, population: u64) -> Record {
        let mut values = stratum();
        values.population = population;
        Record {
            line: 2,
            key: StratumKey {
                date: NaiveDate::from_ymd_opt(2022, 6, day).unwrap(),
                region: region.to_string(),
                utla: utla.to_string(),
                district: utla.to_string(),
                age_group: "0-17".to_string(),
                imd: "1".to_string(),
            },
            values,
        }
    }

    #[test]
    fn single_record_lands_unchanged_in_every_grouping() {
        let mut digest = StrataDigest::new();
        let rec = record(1, "London", "A", 1000);
        digest.merge(&rec).unwrap();
        let expected = ValueTotals::from(&rec.values);
        let date = rec.key.date;

        assert_eq!(digest.region.get(&(date, "London".into())), Some(&expected));
        assert_eq!(digest.age.get(&(date, "0-17".into())), Some(&expected));
        assert_eq!(
            digest.utla.get(&("London".into(), "A".into(), date)),
            Some(&expected)
        );
        assert_eq!(digest.imd.get(&(date, "1".into())), Some(&expected));
        assert_eq!(
            digest.age_imd.get(&(date, "0-17".into(), "1".into())),
            Some(&expected)
        );
        assert_eq!(digest.records(), 1);
    }

    #[test]
    fn national_rows_follow_leaf_regions() {
        let config = DigestConfig::default();
        let mut digest = StrataDigest::new();
        digest.merge(&record(1, "London", "A", 1000)).unwrap();
        digest.merge(&record(1, "Wales", "W", 3000)).unwrap();
        digest.merge(&record(1, "South East", "S", 2000)).unwrap();
        digest.merge(&record(2, "London", "A", 1000)).unwrap();

        let rows = digest.region_rows(&config);
        let labels: Vec<_> = rows
            .iter()
            .map(|r| (r.date.day0(), r.region.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![
                (0, "London"),
                (0, "South East"),
                (0, "Wales"),
                (0, "England"),
                (0, "UK"),
                (1, "London"),
                (1, "England"),
                (1, "UK"),
            ]
        );
        assert_eq!(rows[3].totals.population, 3000.0);
        assert_eq!(rows[4].totals.population, 6000.0);
        assert_eq!(rows[3].defined_population, 3000);
        assert_eq!(rows[4].defined_population, 6000);
        assert!(rows[3].synthetic && !rows[0].synthetic);
    }

    #[test]
    fn nations_only_date_gets_zero_england_row() {
        let config = DigestConfig::default();
        let mut digest = StrataDigest::new();
        digest.merge(&record(1, "Wales", "W", 3000)).unwrap();

        let rows = digest.region_rows(&config);
        let labels: Vec<_> = rows.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(labels, vec!["Wales", "England", "UK"]);

        let england = &rows[1];
        assert!(england.synthetic);
        assert_eq!(england.totals, ValueTotals::zero());
        assert_eq!(england.totals.scale_factor, ScaleFactor::Undefined);
        assert_eq!(england.defined_population, 0);
        assert_eq!(rows[2].totals.population, 3000.0);
    }

    #[test]
    fn sub_area_conflict_aborts_merge() {
        let mut digest = StrataDigest::new();
        digest.merge(&record(1, "London", "A", 1000)).unwrap();
        let mut changed = record(2, "London", "A", 1000);
        changed.values.sub_area_count = Some(9);
        assert!(matches!(
            digest.merge(&changed),
            Err(Error::SubAreaConflict { .. })
        ));
    }

    #[test]
    fn dates_are_distinct_and_sorted() {
        let mut digest = StrataDigest::new();
        digest.merge(&record(3, "London", "A", 1000)).unwrap();
        digest.merge(&record(1, "London", "A", 1000)).unwrap();
        digest.merge(&record(1, "Wales", "W", 1000)).unwrap();
        assert_eq!(digest.dates().len(), 2);
        assert!(digest.dates()[0] < digest.dates()[1]);
    }
}
