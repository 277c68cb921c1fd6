//! Local persistence: CSV tables and the memoized-fetch cache layer.

pub mod cache;
pub mod table;
