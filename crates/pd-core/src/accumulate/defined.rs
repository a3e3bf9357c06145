//! Population covered by non-degenerate strata.
//!
//! A stratum counts as defined when `unhealthy_unknown_count > 0`; its full
//! population then enters the defined total. Every seen key gets an entry, so
//! a unit with no defined strata reports zero rather than nothing.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use pd_common::{StratumKey, StratumValues};

#[derive(Debug, Clone, Default)]
pub struct DefinedPopulation {
    by_utla: BTreeMap<(String, String, NaiveDate), u64>,
    by_region: BTreeMap<(NaiveDate, String), u64>,
}

impl DefinedPopulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, key: &StratumKey, values: &StratumValues) {
        let defined = if values.is_defined() {
            values.population
        } else {
            0
        };
        *self
            .by_utla
            .entry((key.region.clone(), key.utla.clone(), key.date))
            .or_insert(0) += defined;
        *self
            .by_region
            .entry((key.date, key.region.clone()))
            .or_insert(0) += defined;
    }

    pub fn utla(&self, region: &str, utla: &str, date: NaiveDate) -> Option<u64> {
        self.by_utla
            .get(&(region.to_string(), utla.to_string(), date))
            .copied()
    }

    pub fn region(&self, date: NaiveDate, region: &str) -> Option<u64> {
        self.by_region.get(&(date, region.to_string())).copied()
    }

    /// Sum over the regions of one date accepted by `include`.
    pub fn regions_on<F>(&self, date: NaiveDate, include: F) -> u64
    where
        F: Fn(&str) -> bool,
    {
        self.by_region
            .range((date, String::new())..)
            .take_while(|((d, _), _)| *d == date)
            .filter(|((_, region), _)| include(region))
            .map(|(_, population)| *population)
            .sum()
    }
}

/// Share of population in defined strata. `None` when the population is zero.
pub fn defined_fraction(defined: u64, population: f64) -> Option<f64> {
    if population > 0.0 {
        Some(defined as f64 / population)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::totals::tests::stratum;

    fn key(region: &str, utla: &str) -> StratumKey {
        StratumKey {
            date: NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(),
            region: region.to_string(),
            utla: utla.to_string(),
            district: utla.to_string(),
            age_group: "0-17".to_string(),
            imd: "1".to_string(),
        }
    }

    #[test]
    fn only_defined_strata_contribute() {
        let mut defined = DefinedPopulation::new();
        let mut degenerate = stratum();
        degenerate.unhealthy_unknown_count = 0;

        defined.merge(&key("London", "A"), &stratum());
        defined.merge(&key("London", "A"), &degenerate);
        defined.merge(&key("London", "B"), &degenerate);

        let date = NaiveDate::from_ymd_opt(2022, 6, 1).unwrap();
        assert_eq!(defined.utla("London", "A", date), Some(1000));
        assert_eq!(defined.utla("London", "B", date), Some(0));
        assert_eq!(defined.region(date, "London"), Some(1000));
        assert_eq!(defined.utla("London", "C", date), None);
    }

    #[test]
    fn regions_on_filters_by_date_and_region() {
        let mut defined = DefinedPopulation::new();
        defined.merge(&key("London", "A"), &stratum());
        defined.merge(&key("Wales", "W"), &stratum());
        let mut later = key("London", "A");
        later.date = NaiveDate::from_ymd_opt(2022, 6, 2).unwrap();
        defined.merge(&later, &stratum());

        let date = NaiveDate::from_ymd_opt(2022, 6, 1).unwrap();
        assert_eq!(defined.regions_on(date, |_| true), 2000);
        assert_eq!(defined.regions_on(date, |r| r != "Wales"), 1000);
    }

    #[test]
    fn fraction_undefined_without_population() {
        assert_eq!(defined_fraction(500, 1000.0), Some(0.5));
        assert_eq!(defined_fraction(0, 0.0), None);
    }
}
