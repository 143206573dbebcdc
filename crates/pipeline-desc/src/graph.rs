use crate::{
    branch::{BranchKind, BranchSpec},
    defaults,
    description::PipelineDescription,
    params::PipelineParameters,
    stages::{CaptureSpec, Chain, LINK, PreprocSpec, QueueSpec},
};

/// Name of the fan-out point every branch subscribes to.
pub const PREPROC_NAME: &str = "preproc";

/// Structured form of the whole graph, rendered by [`PipelineGraph::render`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineGraph {
    pub capture: CaptureSpec,
    /// Post-capture queue; drops instead of stalling the device.
    pub capture_queue: QueueSpec,
    pub preproc: PreprocSpec,
    pub branches: [BranchSpec; 4],
    pub additional_parameters: String,
}

impl PipelineGraph {
    pub fn from_params(params: &PipelineParameters) -> Self {
        let depth = params.max_buffer_depth.max(1);
        Self {
            capture: CaptureSpec {
                device: params.input_source.clone(),
                width: defaults::CAPTURE_WIDTH,
                height: defaults::CAPTURE_HEIGHT,
                framerate: defaults::CAPTURE_FRAMERATE,
                format: params.video_format.clone(),
            },
            capture_queue: QueueSpec::leaky_downstream(depth),
            preproc: PreprocSpec {
                config_path: params.vision_config_path.clone(),
                name: PREPROC_NAME,
            },
            branches: BranchKind::ALL
                .map(|kind| BranchSpec::standard(kind, &params.resources, depth)),
            additional_parameters: params.additional_parameters.clone(),
        }
    }

    pub fn render(&self) -> PipelineDescription {
        let head = Chain::new()
            .then(self.capture.source())
            .then(self.capture.caps())
            .then(self.capture_queue)
            .then(&self.preproc);

        let mut text = format!("{head} ");
        for branch in &self.branches {
            text.push_str(self.preproc.name);
            text.push('.');
            text.push_str(LINK);
            text.push_str(&branch.to_string());
        }
        text.push_str(&self.additional_parameters);
        PipelineDescription::new(text)
    }
}

/// Render the description for `params`.
pub fn build(params: &PipelineParameters) -> PipelineDescription {
    PipelineGraph::from_params(params).render()
}
