// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line arguments.

use crate::config::OutputFormat;
use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: nodeshade_sandbox [OPTIONS]

Options:
  --config <FILE>        Load settings from a RON file
  --format <glsl|json>   Output format (overrides the settings file)
  --frames <N>           Frames to simulate (overrides the settings file)
  --write-config <FILE>  Write the effective settings to a RON file and exit
  --list-nodes           List available node types and exit
  -h, --help             Print this help";

/// Parsed command line
#[derive(Debug, Default, PartialEq)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub frames: Option<u32>,
    pub write_config: Option<PathBuf>,
    pub list_nodes: bool,
    pub help: bool,
}

impl Args {
    /// Parse arguments, excluding the program name
    pub fn parse<I>(args: I) -> Result<Self, ArgsError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Args::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| ArgsError::MissingValue(flag.to_string()))
            };
            match arg.as_str() {
                "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
                "--format" => {
                    let format = value("--format")?;
                    parsed.format =
                        Some(OutputFormat::parse(&format).ok_or(ArgsError::InvalidFormat(format))?);
                }
                "--frames" => {
                    let frames = value("--frames")?;
                    parsed.frames = Some(
                        frames
                            .parse()
                            .map_err(|_| ArgsError::InvalidFrames(frames))?,
                    );
                }
                "--write-config" => {
                    parsed.write_config = Some(PathBuf::from(value("--write-config")?));
                }
                "--list-nodes" => parsed.list_nodes = true,
                "-h" | "--help" => parsed.help = true,
                _ => return Err(ArgsError::Unknown(arg)),
            }
        }

        Ok(parsed)
    }
}

/// Error when parsing the command line
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ArgsError {
    #[error("Unknown argument `{0}`")]
    Unknown(String),

    #[error("Missing value for `{0}`")]
    MissingValue(String),

    #[error("Unknown output format `{0}` (expected glsl or json)")]
    InvalidFormat(String),

    #[error("Invalid frame count `{0}`")]
    InvalidFrames(String),
}
