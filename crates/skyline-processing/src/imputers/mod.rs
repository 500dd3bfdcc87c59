//! Missing-value handling.
//!
//! Mean, median and mode imputation plus dropping incomplete rows, selected
//! through [`MissingStrategy`](crate::config::MissingStrategy).

mod statistical;

pub use statistical::StatisticalImputer;
