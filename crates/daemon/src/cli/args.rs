pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "depot")]
#[command(about = "Validate, catalog and store uploaded files")]
#[command(version)]
pub struct Args {
    /// Daemon URL (defaults to http://localhost:<config port>)
    #[arg(long, global = true, env = "DEPOT_REMOTE")]
    pub remote: Option<Url>,

    /// Path to the depot directory (defaults to ~/.depot)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
