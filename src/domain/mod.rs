//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the tracked regions and their keyword vocabularies (`Region`)
//! - case-count records and series (`CaseRecord`, `CaseTable`, `CaseSeries`)
//! - trend tables (`TrendSeries`, `TrendColumn`, `WindowClass`)
//! - analysis outputs (`AwarenessReport`, `MergedSeries`)
//! - run configuration (`PipelineConfig`, `RetryPolicy`)

pub mod types;

pub use types::*;
