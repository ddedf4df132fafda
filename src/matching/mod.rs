//! Resource matching subsystem.
//!
//! # Data Flow
//! ```text
//! Request resource (ordered key/value attributes)
//!     → resource.rs (normalize each attribute to a "key:value" label)
//!     → matcher.rs (keep blocks whose requirements are all present)
//!     → Return: one merged ConfigBlock
//! ```
//!
//! # Design Decisions
//! - Pure functions: no I/O, no shared state
//! - Blocks merge in their loaded order, so the same inputs always give the same output
//! - Whitespace and double quotes are stripped from both sides before comparing
//! - A resource that satisfies nothing gets an empty block, never an error

pub mod matcher;
pub mod resource;

pub use matcher::{match_resource, merge_all, satisfies};
pub use resource::{normalize_label, AttributeValue, KeyValue, Resource};
