//! Shared utilities for the dynomics crates.
//!
//! This crate bridges Polars containers and the untyped [`RawValue`] cells the
//! column types validate.
//!
//! [`RawValue`]: dynomics_model::RawValue

pub mod polars;

pub use crate::polars::{any_to_raw, column_raw_values, text_column};
