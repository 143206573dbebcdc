//! Translation of CLI arguments into the launcher configuration.

use anyhow::{Result, bail};
use pipeline_desc::{PipelineParameters, defaults};

use crate::cli::CliArgs;

/// Everything the launcher needs, resolved once from the command line.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub params: PipelineParameters,
    /// Print the gst-launch line and exit instead of running.
    pub print_only: bool,
    /// Report monitoring sink frame rates.
    pub show_fps: bool,
}

impl TryFrom<CliArgs> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self> {
        let mut params = PipelineParameters::default();

        if let Some(source) = args.input_source {
            if source.trim().is_empty() {
                bail!("--input-source must not be empty");
            }
            params = params.with_input_source(source);
        }
        if let Some(path) = args.vision_config_file_path {
            if path.as_os_str().is_empty() {
                bail!("--vision-config-file-path must not be empty");
            }
            params = params.with_vision_config_path(path);
        }

        // The grep suffix is shell syntax; only the printed command carries it.
        // A running pipeline reports fps through the engine bus instead.
        if args.show_fps && args.print_gst_launch {
            params = params.with_additional_parameters(defaults::FPS_LAUNCH_SUFFIX);
        }

        Ok(Self {
            params,
            print_only: args.print_gst_launch,
            show_fps: args.show_fps,
        })
    }
}
