//! Feature datasets.
//!
//! Baseline and current windows are loaded into a [`FeatureFrame`], a small
//! column store keyed by name. Files are read by extension:
//! - `.parquet` via arrow record batches
//! - `.json` in pandas `records` or `columns` orientation

mod frame;
mod json;
mod columnar;
mod source;

#[cfg(test)]
mod tests;

pub use frame::{parse_timestamp, Column, FeatureFrame};
pub use json::frame_from_json;
pub use source::{DatasetSource, FileDataset, MemoryDataset};
