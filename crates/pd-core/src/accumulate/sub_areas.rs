//! Static sub-area counts.
//!
//! The count of small areas feeding a (region, utla, district, imd) key is a
//! property of the geography, not of the survey. It must not change between
//! dates, so it is stored once and never summed.

use std::collections::BTreeMap;

use pd_common::{Error, Result, StratumKey};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SubAreaKey {
    pub region: String,
    pub utla: String,
    pub district: String,
    pub imd: String,
}

impl From<&StratumKey> for SubAreaKey {
    fn from(key: &StratumKey) -> Self {
        Self {
            region: key.region.clone(),
            utla: key.utla.clone(),
            district: key.district.clone(),
            imd: key.imd.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubAreaCounts {
    counts: BTreeMap<SubAreaKey, u64>,
}

impl SubAreaCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the count for a stratum. A differing count for a known key is fatal.
    pub fn insert(&mut self, key: &StratumKey, count: u64) -> Result<()> {
        let sub_key = SubAreaKey::from(key);
        match self.counts.get(&sub_key) {
            Some(&existing) if existing != count => Err(Error::SubAreaConflict {
                key: format!(
                    "(region={}, utla={}, district={}, imd={})",
                    sub_key.region, sub_key.utla, sub_key.district, sub_key.imd
                ),
                existing,
                incoming: count,
            }),
            Some(_) => Ok(()),
            None => {
                self.counts.insert(sub_key, count);
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &SubAreaKey) -> Option<u64> {
        self.counts.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SubAreaKey, &u64)> {
        self.counts.iter()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn key(date: u32, age_group: &str) -> StratumKey {
        StratumKey {
            date: NaiveDate::from_ymd_opt(2022, 6, date).unwrap(),
            region: "London".to_string(),
            utla: "E09000001".to_string(),
            district: "E09000001".to_string(),
            age_group: age_group.to_string(),
            imd: "2".to_string(),
        }
    }

    #[test]
    fn same_count_across_dates_and_ages_is_accepted() {
        let mut counts = SubAreaCounts::new();
        counts.insert(&key(1, "0-17"), 6).unwrap();
        counts.insert(&key(2, "0-17"), 6).unwrap();
        counts.insert(&key(2, "18-34"), 6).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get(&SubAreaKey::from(&key(1, "0-17"))), Some(6));
    }

    #[test]
    fn changed_count_is_rejected() {
        let mut counts = SubAreaCounts::new();
        counts.insert(&key(1, "0-17"), 6).unwrap();
        let err = counts.insert(&key(2, "0-17"), 7).unwrap_err();
        match err {
            Error::SubAreaConflict {
                existing, incoming, ..
            } => {
                assert_eq!(existing, 6);
                assert_eq!(incoming, 7);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
