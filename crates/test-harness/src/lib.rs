//! Test harness for detector geometry work.
//!
//! Provides canned detector layouts, diagnostic assertions, and oracles that
//! check a geometry operation left the assembly physically sensible.
//!
//! # Key Components
//!
//! - [`builders`]: flat and hierarchical detectors, optionally tilted
//! - [`oracle`]: verdicts comparing a detector before and after an operation
//! - [`assertions`]: vector and frame assertions with diagnostic messages

pub mod assertions;
pub mod builders;
pub mod oracle;

pub use assertions::HarnessError;
pub use oracle::OracleVerdict;
