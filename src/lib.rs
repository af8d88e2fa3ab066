//! computer-agent - computer-use agent tool
//!
//! Validates mouse, keyboard and screenshot actions from an agent, maps
//! coordinates between the advertised and physical resolutions, and drives
//! an X11 display through XTest.

pub mod action;
pub mod config;
pub mod error;
pub mod input;
pub mod result;
pub mod scaling;
pub mod server;
pub mod shell;
pub mod tool;

// Re-exports
pub use action::{Action, ActionKind, ActionRequest};
pub use config::{Config, ConfigError, DisplaySettings};
pub use error::ToolError;
pub use input::{InputBackend, XInjector};
pub use result::{ToolDescriptor, ToolOptions, ToolResult};
pub use scaling::{CoordinateMapper, Resolution, SCALING_TARGETS};
pub use server::ComputerServer;
pub use shell::{CommandRunner, ShellRunner};
pub use tool::ComputerTool;
