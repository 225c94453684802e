//! Riskextract Gatekeeper
//!
//! The parse, validate and repair boundary between untrusted model output
//! and the rest of the pipeline.
//!
//! The Gatekeeper provides:
//! - Lenient JSON envelope handling (surrounding whitespace, code fences)
//! - Per-field type checking against the schema
//! - Controlled-vocabulary enforcement with canonical spelling
//! - Repair: offending fields become `unknown` instead of discarding the record
//!
//! # Examples
//!
//! ```
//! use riskextract_domain::{ChunkId, ExtractionContract, ValidationStatus};
//! use riskextract_gatekeeper::{Gatekeeper, ValidationConfig};
//!
//! let gatekeeper = Gatekeeper::new(ExtractionContract::risk_profile(), ValidationConfig::default());
//! let record = gatekeeper.validate(ChunkId::new("doc", 0), r#"{"region": "Atlantis"}"#);
//!
//! assert_eq!(record.status, ValidationStatus::Rejected);
//! ```

#![warn(missing_docs)]

mod config;
mod envelope;
mod validator;

pub use config::ValidationConfig;
pub use envelope::strip_envelope;
pub use validator::Gatekeeper;
