mod cli;
mod config;

use std::{
    io::{self, Write},
    process::ExitCode,
};

use anyhow::{Context, Result};
use pipeline_desc::{LaunchCommand, PipelineDescription};
use supervisor::SigintBridge;
use tracing::{info, warn};

use crate::{cli::Parsed, config::AppConfig};

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    supervisor::telemetry::init();

    let args = match cli::parse_from(std::env::args_os()) {
        Parsed::Args(args) => args,
        Parsed::Exit(code) => return Ok(ExitCode::from(code)),
    };
    if args.show_fps {
        println!("Printing fps");
    }

    let config = AppConfig::try_from(args)?;
    let description = pipeline_desc::build(&config.params);

    if config.print_only {
        print_launch(&mut io::stdout().lock(), &description)
            .context("Failed to write launch command")?;
        return Ok(ExitCode::SUCCESS);
    }

    let bridge = SigintBridge::install().context("Failed to install SIGINT handler")?;
    info!("Created pipeline string");
    launch(&config, &description, &bridge)
}

/// Write the `gst-launch-1.0` line for `description` instead of running it.
fn print_launch(out: &mut impl Write, description: &PipelineDescription) -> io::Result<()> {
    writeln!(out, "{}", LaunchCommand(description))?;
    out.flush()
}

#[cfg(feature = "with-gst")]
fn launch(
    config: &AppConfig,
    description: &PipelineDescription,
    bridge: &SigintBridge,
) -> Result<ExitCode> {
    use pipeline_desc::defaults::MONITOR_SINK_PREFIX;
    use supervisor::{GstEngine, Supervisor};

    let mut engine = GstEngine::init().context("Failed to initialise GStreamer")?;
    if config.show_fps {
        engine = engine.with_fps_reporting(MONITOR_SINK_PREFIX);
    }

    let mut supervisor = Supervisor::new(engine, bridge);
    let report = supervisor
        .run(description.as_str())
        .context("Failed to launch pipeline")?;
    info!(
        outcome = ?report.outcome,
        eos_requests = report.eos_requests,
        "Pipeline finished"
    );
    Ok(ExitCode::from(report.outcome.exit_code()))
}

#[cfg(not(feature = "with-gst"))]
fn launch(
    config: &AppConfig,
    _description: &PipelineDescription,
    _bridge: &SigintBridge,
) -> Result<ExitCode> {
    if config.show_fps {
        warn!("--show-fps needs GStreamer support to report frame rates");
    }
    anyhow::bail!(
        "camstream was built without GStreamer support; rebuild with `--features with-gst` \
         or use --print-gst-launch"
    )
}
