//! Deterministic gst-launch description for the camera streaming pipeline.
//!
//! A single V4L2 capture feeds the vision preprocessor `preproc`, which fans
//! out to four resolution branches. Each branch encodes to H.264 and tees the
//! result into an RTP/UDP sink and an fps monitoring sink.
//!
//! - `params`: builder inputs and resource locations.
//! - `stages`: element value objects rendered through `Display`.
//! - `branch`: the four branch layouts.
//! - `graph`: whole-graph composition and [`build`].
//! - `description`: the rendered text and its reference checks.

pub mod branch;
pub mod defaults;
pub mod description;
pub mod graph;
pub mod params;
pub mod stages;

pub use branch::{BranchKind, BranchSpec};
pub use description::{LaunchCommand, PipelineDescription, ReferenceError};
pub use graph::{PREPROC_NAME, PipelineGraph, build};
pub use params::{PipelineParameters, ResourcePaths};
