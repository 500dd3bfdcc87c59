//! Data quality validation module.
//!
//! This module checks a table against the rules a cleaned buildings table is
//! expected to satisfy: required columns, column types, value ranges,
//! duplicate rows and remaining nulls. Findings are returned as
//! [`ValidationIssue`](crate::types::ValidationIssue)s and never stop the
//! pipeline.

mod validator;

pub use validator::Validator;
