//! Core domain types for the webhook gate.
//!
//! Provides the inbound request model, the parsed payload tree, the error
//! taxonomy, security events, and the clock abstraction. Every other crate
//! in the workspace builds on these types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod models;
pub mod payload;
pub mod time;

pub use error::{GateError, Result};
pub use events::{
    MulticastSink, NoOpSink, SecurityCategory, SecurityEvent, SecurityEventSink, Severity,
    TracingSink,
};
pub use models::{InboundBody, InboundRequest};
pub use payload::{PayloadNode, Scalar};
pub use time::{Clock, RealClock, TestClock};
