//! Lifecycle supervision for the camera streaming pipeline.
//!
//! - `interrupt`: SIGINT bridge and the flags it shares with the poll loop.
//! - `engine`: the seam to the pipeline runtime.
//! - `lifecycle`: the Idle → Playing → EosRequested → Terminated loop.
//! - `gst_engine`: GStreamer engine (feature `with-gst`).
//! - `telemetry`: console logging.

pub mod engine;
#[cfg(feature = "with-gst")]
pub mod gst_engine;
pub mod interrupt;
pub mod lifecycle;
pub mod telemetry;

pub use engine::{BusMessage, EngineError, PipelineEngine, PlaybackState, Severity, StageFault};
#[cfg(feature = "with-gst")]
pub use gst_engine::GstEngine;
pub use interrupt::{InterruptError, InterruptFlags, InterruptSource, SigintBridge};
pub use lifecycle::{
    DEFAULT_POLL_INTERVAL, FLOW_ERROR_EXIT_CODE, LifecycleState, Outcome, RunReport,
    Supervisor, SupervisorError,
};
