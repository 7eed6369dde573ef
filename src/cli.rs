//! Command-line arguments.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Camera index to use (overrides the configuration file)
    #[arg(long)]
    pub cam: Option<i32>,

    /// Face mesh ONNX model (overrides the configuration file)
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Disable voice command recognition (speech output stays on)
    #[arg(long)]
    pub no_voice: bool,

    /// Track and click without moving the real cursor
    #[arg(long)]
    pub no_cursor: bool,

    /// Write the example configuration to this path and exit
    #[arg(long, value_name = "PATH")]
    pub write_config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(cam) = self.cam {
            config.camera.index = cam;
        }
        if let Some(model) = &self.model {
            config.landmarks.model.clone_from(model);
        }
        if self.no_voice {
            config.voice.enabled = false;
        }
    }
}
