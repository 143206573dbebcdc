use std::{ffi::OsString, path::PathBuf};

use clap::{CommandFactory, Parser, error::ErrorKind};

/// Basic security camera streaming pipeline.
#[derive(Debug, Parser)]
#[command(name = "camstream", disable_version_flag = true)]
pub struct CliArgs {
    /// Print fps
    #[arg(long = "show-fps", action = clap::ArgAction::SetTrue)]
    pub show_fps: bool,
    /// Print the ready gst-launch command without running it
    #[arg(long = "print-gst-launch", action = clap::ArgAction::SetTrue)]
    pub print_gst_launch: bool,
    /// Set the input source (default /dev/video0)
    #[arg(short = 'i', long = "input-source", value_name = "PATH")]
    pub input_source: Option<String>,
    /// Set the vision config file path
    /// (default /home/root/VHT/resources/configs/vision_config.json)
    #[arg(long = "vision-config-file-path", value_name = "PATH")]
    pub vision_config_file_path: Option<PathBuf>,
}

/// Result of argument parsing: run, or exit with the given status.
#[derive(Debug)]
pub enum Parsed {
    Args(CliArgs),
    Exit(u8),
}

pub fn parse_from<I, T>(args: I) -> Parsed
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match CliArgs::try_parse_from(args) {
        Ok(args) => Parsed::Args(args),
        Err(err) => {
            let code = exit_code(err.kind());
            let _ = err.print();
            if code != 0 {
                println!();
                let _ = CliArgs::command().print_help();
            }
            Parsed::Exit(code)
        }
    }
}

fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}
