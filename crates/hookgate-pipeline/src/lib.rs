//! Admission pipeline and event dispatch.
//!
//! `ValidationPipeline` runs the security checks in a fixed order and turns
//! an inbound request into a single verdict. Admitted events are routed by
//! `EventDispatcher` to a per-type handler.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dispatch;
pub mod pipeline;

pub use dispatch::{
    CommitFinding, DispatchContext, DispatchError, EventDispatcher, EventHandler, EventSummary,
};
pub use pipeline::{Admission, PipelineOutcome, PipelineStage, ValidationPipeline, Verdict};
