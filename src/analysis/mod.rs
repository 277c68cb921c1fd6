//! Statistical signal extraction over assembled case and trend tables.
//!
//! Two-stage keyword filter plus the awareness-lag computation:
//!
//! - `impact` — long-term filter: heavy right skew, negligible pre-onset volume
//! - `spike` — short-term filter: quiet two weeks before the peak, then a
//!   near-saturation surge
//! - `awareness` — mean lag between first confirmed case and peak interest
//! - `merge` — trend-anchored join of case and trend data for rendering

pub mod awareness;
pub mod impact;
pub mod merge;
pub mod spike;
