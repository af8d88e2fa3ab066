//! computer-agent - Main entry point
//!
//! Serves the `computer` tool to an agent over MCP on stdio.

mod args;

use args::Args;
use clap::Parser;
use computer_agent::{
    ComputerServer, ComputerTool, Config, CoordinateMapper, DisplaySettings, ShellRunner, ToolDescriptor,
    ToolOptions, XInjector, SCALING_TARGETS,
};
use log::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let config = match args.load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config {:?}: {}, using defaults", args.config, e);
            Config::default()
        }
    };
    config.validate()?;

    // Logs go to stderr; stdout carries the protocol
    let log_level = if args.verbose { "debug" } else { config.logging.level.as_str() };
    env_logger::Builder::new()
        .parse_filters(&std::env::var("COMPUTER_AGENT_LOG").unwrap_or_else(|_| log_level.to_string()))
        .target(env_logger::Target::Stderr)
        .init();

    info!("computer-agent v{}", env!("CARGO_PKG_VERSION"));

    // Display geometry is fixed for the whole session
    let display = DisplaySettings::from_env()?;
    info!(
        "Display {}x{}{}",
        display.size.width,
        display.size.height,
        display.x11_display().map(|d| format!(" on {}", d)).unwrap_or_default()
    );

    if args.describe {
        let mapper = CoordinateMapper::new(display.size, SCALING_TARGETS, config.scaling.enabled);
        let descriptor = ToolDescriptor::new(ToolOptions::new(&mapper, display.display_num));
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
        return Ok(());
    }

    let injector = XInjector::connect(display.x11_display().as_deref())?;
    let runner = ShellRunner::new(config.shell.timeout());
    let tool = ComputerTool::new(display, &config, injector, runner);

    let options = tool.options();
    info!(
        "Advertising {}x{} to the agent",
        options.display_width_px, options.display_height_px
    );

    ComputerServer::new(tool).serve_stdio().await?;
    Ok(())
}
