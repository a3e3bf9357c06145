//! Multi-dimensional accumulation of validated records.
//!
//! Additive fields sum; the two scale-factor fields merge by equality and
//! become `Inconsistent` on disagreement.

pub mod defined;
pub mod digest;
pub mod grouping;
pub mod sub_areas;
pub mod totals;

pub use defined::{defined_fraction, DefinedPopulation};
pub use digest::{AgeImdKey, AgeKey, ImdKey, RegionKey, RegionRow, StrataDigest, UtlaKey};
pub use grouping::GroupingAccumulator;
pub use sub_areas::{SubAreaCounts, SubAreaKey};
pub use totals::{ValueTotals, FIELD_NAMES};
