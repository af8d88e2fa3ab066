use clap::Parser;
use std::path::PathBuf;

use computer_agent::config;

#[derive(Parser, Debug)]
#[command(name = "computer-agent")]
#[command(version)]
#[command(about = "Computer-use agent tool: mouse, keyboard and screenshots over stdio", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/computer-agent.toml")]
    pub config: PathBuf,

    /// Verbose logging
    #[arg(short, long, action)]
    pub verbose: bool,

    /// Print the tool descriptor as JSON and exit
    #[arg(long, action)]
    pub describe: bool,
}

impl Args {
    pub fn load_config(&self) -> Result<config::Config, config::ConfigError> {
        config::Config::load(&self.config)
    }
}
