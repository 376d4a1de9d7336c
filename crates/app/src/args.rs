pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "photolock")]
#[command(about = "Encrypt files to a public key, decrypt them with your own")]
pub struct Args {
    /// Path to the photolock state directory (defaults to ~/.photolock)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
