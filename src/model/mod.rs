//! Configuration model.
//!
//! # Data Flow
//! ```text
//! schedule file (YAML)
//!     → serde (Pattern, CollectionPeriod, Schedule, TraceConfig, ConfigBlock)
//!     → Config (all blocks, unmatched)
//!     → matching (blocks satisfied by a resource, merged)
//!     → fingerprint.rs (content digest of the merged block)
//! ```
//!
//! # Design Decisions
//! - Every entity is immutable once loaded; reloads build a new `Config`
//! - Invalid values (negative periods, ambiguous patterns) fail at load time
//! - Fingerprints are pure functions of content, never of memory layout

pub mod config_block;
pub mod fingerprint;
pub mod metric_config;
pub mod pattern;
pub mod period;
pub mod schedule;
pub mod trace_config;

pub use config_block::{Config, ConfigBlock};
pub use fingerprint::{Fingerprint, FingerprintHasher, Fingerprinted, FINGERPRINT_LEN};
pub use metric_config::MetricConfig;
pub use pattern::Pattern;
pub use period::CollectionPeriod;
pub use schedule::Schedule;
pub use trace_config::{ConstantDecision, Sampler, TraceConfig};

use thiserror::Error;

/// Errors raised while building model values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Period is neither a known name nor a number.
    #[error("fail to parse period {0:?}: not a known period name or a number")]
    InvalidPeriod(String),

    /// Period is a negative number.
    #[error("cannot process negative period: {0}")]
    NegativePeriod(i64),

    /// Period does not fit the 32-bit wire representation.
    #[error("period {0} exceeds the maximum of 2147483647 seconds")]
    PeriodOutOfRange(i64),

    /// Pattern sets both `Equals` and `StartsWith`.
    #[error("only specify StartsWith or Equals, not both (Equals: {equals:?}, StartsWith: {starts_with:?})")]
    AmbiguousPattern { equals: String, starts_with: String },

    /// Pattern sets neither `Equals` nor `StartsWith`.
    #[error("pattern must specify one of StartsWith or Equals")]
    EmptyPattern,

    /// Sampler sets zero or several sampler kinds.
    #[error("trace sampler must specify exactly one of ConstantSampler, ProbabilitySampler or RateLimitingSampler")]
    InvalidSampler,

    /// Sampling probability outside `[0.0, 1.0]`.
    #[error("sampling probability {0} must be within [0.0, 1.0]")]
    InvalidProbability(f64),

    /// Byte string is not a fingerprint.
    #[error("fingerprint must be {expected} bytes, got {actual}")]
    FingerprintLength { expected: usize, actual: usize },
}
