//! Output tables and the run manifest.

pub mod manifest;
pub mod tables;

pub use manifest::{Manifest, MANIFEST_FILE};
pub use tables::{render_all, RenderedTable, TableSummary};
