//! The four-stage rule engine plus the advanced cardiovascular and
//! metabolic calculators.
//!
//! Stages run in a fixed order over validated records: severity grading,
//! correlated-pattern detection, composite risk scoring, and contextual
//! adjustment. Each stage is pure; the only shared state is the record
//! slice produced by validation.

pub mod advanced;
pub mod context;
pub mod patterns;
pub mod risk;
pub mod severity;

pub use severity::{deviation_percent, severity_for};
