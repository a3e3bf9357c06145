//! Input parsing: header layout detection, typed row parsing, and the
//! per-row invariant checks.

pub mod reader;
pub mod row;

pub use reader::RecordReader;
pub use row::RowParser;
