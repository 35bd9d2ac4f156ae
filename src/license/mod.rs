//! License normalization and risk classification.
//!
//! - [`spdx`] — the fixed registry of canonical licenses (SPDX id, name, URL, risk).
//! - [`alias`] — [`AliasTable`](alias::AliasTable) mapping free-text strings to
//!   canonical licenses.
//! - [`normalizer`] — per-dependency normalization, including SPDX expressions.
//! - [`classifier`] — overall risk of a normalized license set.

pub mod alias;
pub mod classifier;
pub mod normalizer;
pub mod spdx;
