//! Seam between the supervisor and the pipeline engine runtime.

use std::{fmt, time::Duration};

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Null,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Fault reported by a pipeline stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageFault {
    /// Name of the element that posted the error.
    pub stage: String,
    pub message: String,
    pub debug: Option<String>,
}

impl fmt::Display for StageFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.message)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BusMessage {
    Error(StageFault),
    Eos,
    /// Periodic measurement from a monitoring sink; never terminal.
    Stats { stage: String, text: String },
    /// Anything the bus filter should have kept out.
    Other(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine initialisation failed: {0}")]
    Init(String),
    #[error("failed to construct pipeline: {0}")]
    Construct(String),
    #[error("pipeline has no message bus")]
    MissingBus,
    #[error("state change to {state:?} refused: {reason}")]
    StateChange {
        state: PlaybackState,
        reason: String,
    },
}

/// Pipeline runtime consumed by the supervisor.
///
/// `release` takes the instance by value so it can only happen once.
pub trait PipelineEngine {
    type Instance;

    fn construct(&mut self, description: &str) -> Result<Self::Instance, EngineError>;

    fn set_state(
        &mut self,
        instance: &Self::Instance,
        state: PlaybackState,
    ) -> Result<(), EngineError>;

    /// Inject an end-of-stream event. Returns whether the engine accepted it.
    fn send_eos(&mut self, instance: &Self::Instance) -> bool;

    /// Wait at most `timeout` for the next Error/Eos (or stats) message.
    fn poll_bus(&mut self, instance: &Self::Instance, timeout: Duration) -> Option<BusMessage>;

    fn release(&mut self, instance: Self::Instance);

    /// Mirror a status line into the engine's own debug log.
    fn diagnostic(&mut self, _instance: &Self::Instance, _severity: Severity, _text: &str) {}
}
