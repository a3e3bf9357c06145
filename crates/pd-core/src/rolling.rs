//! Trailing-window averages and Wilson intervals per administrative unit.
//!
//! Windows are positional: the `N` most recent observed dates of a unit,
//! whatever gaps lie between them.

use chrono::NaiveDate;
use pd_math::{wilson_interval, WilsonError, WilsonInterval};
use serde::Serialize;
use tracing::warn;

use crate::accumulate::{GroupingAccumulator, UtlaKey, ValueTotals};

/// Trailing `window`-length averages over a date-ordered series.
///
/// Yields `max(0, len - window + 1)` entries; the entry at position `j` covers
/// `series[j ..= j + window - 1]`.
pub fn trailing_averages(series: &[&ValueTotals], window: usize) -> Vec<ValueTotals> {
    if window == 0 {
        return Vec::new();
    }
    series
        .windows(window)
        .filter_map(|slice| ValueTotals::merged(slice.iter().copied()))
        .map(|sum| sum.divided_by(window as f64))
        .collect()
}

/// Why a window's interval could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateReason {
    /// Averaged respondent count is zero.
    NoRespondents,
    /// Averaged population is zero, so the rate itself is undefined.
    NoPopulation,
    /// Rate fell outside [0, 1].
    RateOutOfRange,
    /// z-score rejected by the interval.
    InvalidZScore,
}

impl From<WilsonError> for DegenerateReason {
    fn from(err: WilsonError) -> Self {
        match err {
            WilsonError::RateOutOfRange => DegenerateReason::RateOutOfRange,
            WilsonError::EmptySample => DegenerateReason::NoRespondents,
            WilsonError::InvalidZ => DegenerateReason::InvalidZScore,
        }
    }
}

/// A window whose statistics were left undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegenerateWindow {
    pub region: String,
    pub utla: String,
    pub date: NaiveDate,
    pub window: usize,
    pub reason: DegenerateReason,
    pub averages: ValueTotals,
}

/// One row of a rolling-average table; `date` is the window's last date.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingRow {
    pub region: String,
    pub utla: String,
    pub date: NaiveDate,
    pub averages: ValueTotals,
    pub covid_rate: Option<f64>,
    pub interval: Option<WilsonInterval>,
}

#[derive(Debug, Clone)]
pub struct RollingTable {
    pub window: usize,
    pub rows: Vec<RollingRow>,
    pub degenerate: Vec<DegenerateWindow>,
}

impl RollingTable {
    /// Roll every (region, utla) series of the accumulator.
    pub fn from_units(units: &GroupingAccumulator<UtlaKey>, window: usize, z: f64) -> Self {
        let mut table = RollingTable {
            window,
            rows: Vec::new(),
            degenerate: Vec::new(),
        };

        let mut entries = units.iter().peekable();
        while let Some(((region, utla, _), _)) = entries.peek() {
            let (region, utla) = (region.clone(), utla.clone());
            let mut dates = Vec::new();
            let mut series = Vec::new();
            while let Some(((_, _, date), totals)) =
                entries.next_if(|((r, u, _), _)| *r == region && *u == utla)
            {
                dates.push(*date);
                series.push(totals);
            }

            let averages = trailing_averages(&series, window);
            let ends = dates.iter().skip(window.saturating_sub(1));
            for (date, averages) in ends.zip(averages) {
                table.push(&region, &utla, *date, averages, z);
            }
        }
        table
    }

    fn push(&mut self, region: &str, utla: &str, date: NaiveDate, averages: ValueTotals, z: f64) {
        let covid_rate = averages.covid_rate();
        let interval = match covid_rate {
            None => Err(DegenerateReason::NoPopulation),
            Some(rate) => wilson_interval(rate, averages.respondent_count, z)
                .map_err(DegenerateReason::from),
        };

        let interval = match interval {
            Ok(ci) => Some(ci),
            Err(reason) => {
                warn!(
                    region,
                    utla,
                    %date,
                    window = self.window,
                    ?reason,
                    "degenerate rolling window"
                );
                self.degenerate.push(DegenerateWindow {
                    region: region.to_string(),
                    utla: utla.to_string(),
                    date,
                    window: self.window,
                    reason,
                    averages: averages.clone(),
                });
                None
            }
        };

        self.rows.push(RollingRow {
            region: region.to_string(),
            utla: utla.to_string(),
            date,
            averages,
            covid_rate,
            interval,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::totals::tests::stratum;
    use pd_common::ScaleFactor;
    use pd_math::Z_95;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 6, d).unwrap()
    }

    fn totals(respondents: f64) -> ValueTotals {
        let mut t = ValueTotals::from(&stratum());
        t.respondent_count = respondents;
        t
    }

    #[test]
    fn output_length_matches_window() {
        let items: Vec<ValueTotals> = (0..5).map(|i| totals(i as f64)).collect();
        let series: Vec<&ValueTotals> = items.iter().collect();
        assert_eq!(trailing_averages(&series, 1).len(), 5);
        assert_eq!(trailing_averages(&series, 3).len(), 3);
        assert_eq!(trailing_averages(&series, 5).len(), 1);
        assert!(trailing_averages(&series, 6).is_empty());
        assert!(trailing_averages(&series, 0).is_empty());
    }

    #[test]
    fn averages_are_positional_means() {
        let items: Vec<ValueTotals> = [10.0, 20.0, 60.0].iter().map(|&r| totals(r)).collect();
        let series: Vec<&ValueTotals> = items.iter().collect();
        let avg = trailing_averages(&series, 2);
        assert_eq!(avg[0].respondent_count, 15.0);
        assert_eq!(avg[1].respondent_count, 40.0);
        assert_eq!(avg[0].population, 1000.0);
    }

    #[test]
    fn scale_factors_are_merged_not_averaged() {
        let a = totals(10.0);
        let mut b = totals(10.0);
        let avg = trailing_averages(&[&a, &a], 2);
        assert_eq!(avg[0].scale_factor, ScaleFactor::Value(1.5));

        b.scale_factor = ScaleFactor::Value(2.0);
        let avg = trailing_averages(&[&a, &b], 2);
        assert_eq!(avg[0].scale_factor, ScaleFactor::Inconsistent);
    }

    #[test]
    fn table_rows_end_on_window_last_date() {
        let mut units = GroupingAccumulator::new();
        for d in 1..=4 {
            units.merge(("London".to_string(), "A".to_string(), day(d)), &totals(500.0));
        }
        units.merge(("London".to_string(), "B".to_string(), day(1)), &totals(500.0));

        let table = RollingTable::from_units(&units, 3, Z_95);
        let dates: Vec<_> = table.rows.iter().map(|r| (r.utla.as_str(), r.date)).collect();
        assert_eq!(dates, vec![("A", day(3)), ("A", day(4))]);
        let row = &table.rows[0];
        assert_eq!(row.covid_rate, Some(0.06));
        assert!(row.interval.unwrap().contains(0.06));
        assert!(table.degenerate.is_empty());
    }

    #[test]
    fn zero_respondents_are_reported_not_defaulted() {
        let mut units = GroupingAccumulator::new();
        units.merge(("London".to_string(), "A".to_string(), day(1)), &totals(0.0));

        let table = RollingTable::from_units(&units, 1, Z_95);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].interval, None);
        assert_eq!(table.degenerate.len(), 1);
        assert_eq!(table.degenerate[0].reason, DegenerateReason::NoRespondents);
    }

    #[test]
    fn rejected_z_score_is_reported_as_such() {
        let mut units = GroupingAccumulator::new();
        units.merge(("London".to_string(), "A".to_string(), day(1)), &totals(500.0));

        let table = RollingTable::from_units(&units, 1, 0.0);
        assert_eq!(table.rows[0].covid_rate, Some(0.06));
        assert_eq!(table.rows[0].interval, None);
        assert_eq!(table.degenerate[0].reason, DegenerateReason::InvalidZScore);
    }

    #[test]
    fn zero_population_leaves_rate_undefined() {
        let mut t = totals(500.0);
        t.population = 0.0;
        let mut units = GroupingAccumulator::new();
        units.merge(("London".to_string(), "A".to_string(), day(1)), &t);

        let table = RollingTable::from_units(&units, 1, Z_95);
        assert_eq!(table.rows[0].covid_rate, None);
        assert_eq!(table.degenerate[0].reason, DegenerateReason::NoPopulation);
    }
}
