//! Riskextract Synthesizer
//!
//! Reduces the validated per-chunk records of one document into a single
//! consolidated record with provenance.
//!
//! Default rules per field type:
//! - `text` / `enum`: majority vote, ties to the earliest chunk
//! - `list`: order-preserving union
//! - `number`: maximum
//! - `count`: sum
//!
//! Any field can be given an explicit [`FieldRule`] in [`ReducerConfig`].
//!
//! # Examples
//!
//! ```
//! use riskextract_domain::{DocumentCategory, ExtractionContract};
//! use riskextract_synthesizer::{Reducer, ReducerConfig};
//!
//! let reducer = Reducer::new(ExtractionContract::risk_profile(), ReducerConfig::default()).unwrap();
//! let record = reducer.reduce("doc", DocumentCategory::Esg, &[], 0);
//!
//! assert!(record.is_fully_unresolved());
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod reducer;

pub use config::{FieldRule, NumberRule, ReducerConfig, TieBreak};
pub use error::ReducerError;
pub use reducer::Reducer;
