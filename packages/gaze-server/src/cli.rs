use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DeviceKind;

/// Gaze Server - smoothed eye tracking stream and calibration API
#[derive(Parser)]
#[command(name = "gaze-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the server (default)
    Serve {
        /// Port to listen on (overrides GAZE_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (overrides GAZE_BIND_ADDR)
        #[arg(short, long)]
        bind: Option<String>,

        /// Eye tracker backend (overrides GAZE_DEVICE)
        #[arg(short, long, value_enum)]
        device: Option<DeviceKind>,
    },

    /// Print the effective configuration as JSON
    Config,

    /// Run recorded samples through the filters and print each state as JSON
    Replay {
        /// CSV file with columns arrival,left_x,left_y,right_x,right_y
        #[arg(short, long)]
        input: PathBuf,
    },
}
