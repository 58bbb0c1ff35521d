pub mod config;
pub mod addr;
pub mod record;
pub mod http;
pub mod fetch;
pub mod directory;
pub mod template;

use arg::Args;

#[derive(Debug, Args)]
pub struct ArgParse {
    #[arg(short = "g", long = "gen")]
    /// Generate a config file with default values
    pub gen: bool,
    #[arg(short = "v", long = "verify")]
    /// Verify if specified config file is valid
    pub verify: bool,
    /// Configuration file path
    pub config_file: String
}
