use std::path::{Path, PathBuf};

use crate::defaults;

/// Filesystem roots the pipeline elements load their assets from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourcePaths {
    pub resources_dir: PathBuf,
    pub postprocess_dir: PathBuf,
}

impl Default for ResourcePaths {
    fn default() -> Self {
        Self {
            resources_dir: PathBuf::from(defaults::RESOURCES_DIR),
            postprocess_dir: PathBuf::from(defaults::POSTPROCESS_DIR),
        }
    }
}

impl ResourcePaths {
    pub fn vision_config(&self) -> PathBuf {
        self.resources_dir.join(defaults::VISION_CONFIG_FILE)
    }

    pub fn hef(&self) -> PathBuf {
        self.resources_dir.join(defaults::HEF_FILE)
    }

    pub fn network_config(&self) -> PathBuf {
        self.resources_dir.join(defaults::NETWORK_CONFIG_FILE)
    }

    pub fn postprocess_so(&self) -> PathBuf {
        self.postprocess_dir.join(defaults::POSTPROCESS_SO_FILE)
    }

    /// On-screen display config for a branch, e.g. `configs/osd_fhd.json`.
    pub fn osd_config(&self, suffix: &str) -> PathBuf {
        self.resources_dir
            .join("configs")
            .join(format!("osd_{suffix}.json"))
    }
}

/// Inputs of the description builder. Produced once per run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineParameters {
    /// Capture device or path handed to `v4l2src device=`.
    pub input_source: String,
    pub vision_config_path: PathBuf,
    pub video_format: String,
    /// Depth of every queue in the graph; must be positive.
    pub max_buffer_depth: u32,
    /// Appended verbatim after the last branch.
    pub additional_parameters: String,
    pub resources: ResourcePaths,
}

impl Default for PipelineParameters {
    fn default() -> Self {
        let resources = ResourcePaths::default();
        Self {
            input_source: defaults::DEFAULT_VIDEO_SOURCE.to_string(),
            vision_config_path: resources.vision_config(),
            video_format: defaults::DEFAULT_FORMAT.to_string(),
            max_buffer_depth: defaults::DEFAULT_MAX_BUFFER_SIZE,
            additional_parameters: String::new(),
            resources,
        }
    }
}

impl PipelineParameters {
    pub fn with_input_source(mut self, input_source: impl Into<String>) -> Self {
        self.input_source = input_source.into();
        self
    }

    pub fn with_vision_config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.vision_config_path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_video_format(mut self, format: impl Into<String>) -> Self {
        self.video_format = format.into();
        self
    }

    /// Zero is clamped to one so the graph never contains an unbounded queue.
    pub fn with_max_buffer_depth(mut self, depth: u32) -> Self {
        self.max_buffer_depth = depth.max(1);
        self
    }

    pub fn with_additional_parameters(mut self, fragment: impl Into<String>) -> Self {
        self.additional_parameters = fragment.into();
        self
    }
}
