//! Wire protocol subsystem.
//!
//! # Data Flow
//! ```text
//! Client poll:
//!     ConfigRequest { resource, last_known_fingerprint }
//!     → POST /v1/config (JSON)
//!     → ConfigService
//!     → ConfigResponse { fingerprint, metric_config?, trace_config?, suggested_wait_time_seconds }
//!
//! Upstream proxying (client.rs):
//!     RemoteBackend → ConfigClient → upstream POST /v1/config
//! ```
//!
//! # Design Decisions
//! - JSON over HTTP; byte fields are standard base64 strings
//! - Payload types are separate from the model so the file format and the
//!   wire format evolve independently
//! - A response without `metric_config` is a cache hit

pub mod client;
pub mod encoding;
pub mod types;

pub use client::{ClientError, ConfigClient};
pub use types::{
    ConfigRequest, ConfigResponse, DecisionPayload, MetricConfigPayload, PatternPayload,
    SamplerPayload, SchedulePayload, TraceConfigPayload,
};
