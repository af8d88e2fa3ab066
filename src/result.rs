//! Result envelope and advertised tool descriptor.

use serde::{Deserialize, Serialize};

use crate::scaling::CoordinateMapper;
use crate::shell::CommandOutput;

pub const TOOL_NAME: &str = "computer";
pub const TOOL_API_TYPE: &str = "computer_20241022";

/// Uniform result of every action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Base64-encoded PNG
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64_image: Option<String>,
}

impl ToolResult {
    pub fn output(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            ..Default::default()
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Copy of this result with the image replaced
    pub fn with_image(self, base64_image: impl Into<String>) -> Self {
        Self {
            base64_image: Some(base64_image.into()),
            ..self
        }
    }
}

impl From<CommandOutput> for ToolResult {
    /// Empty streams map to `None`
    fn from(out: CommandOutput) -> Self {
        let non_empty = |s: String| (!s.is_empty()).then_some(s);
        Self {
            output: non_empty(out.stdout),
            error: non_empty(out.stderr),
            base64_image: None,
        }
    }
}

/// Display options advertised to the agent, always in scaled space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolOptions {
    pub display_width_px: u32,
    pub display_height_px: u32,
    pub display_number: Option<u32>,
}

impl ToolOptions {
    pub fn new(mapper: &CoordinateMapper, display_number: Option<u32>) -> Self {
        let size = mapper.scaled_size();
        Self {
            display_width_px: size.width,
            display_height_px: size.height,
            display_number,
        }
    }
}

/// Tool definition sent to the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub api_type: &'static str,
    #[serde(flatten)]
    pub options: ToolOptions,
}

impl ToolDescriptor {
    pub fn new(options: ToolOptions) -> Self {
        Self {
            name: TOOL_NAME,
            api_type: TOOL_API_TYPE,
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_fields_are_omitted() {
        let value = serde_json::to_value(ToolResult::output("Performed left_click")).unwrap();
        assert_eq!(value, json!({"output": "Performed left_click"}));
    }

    #[test]
    fn with_image_keeps_text() {
        let result = ToolResult {
            output: Some("out".into()),
            error: Some("err".into()),
            base64_image: None,
        }
        .with_image("aGk=");
        assert_eq!(result.output.as_deref(), Some("out"));
        assert_eq!(result.error.as_deref(), Some("err"));
        assert_eq!(result.base64_image.as_deref(), Some("aGk="));
    }

    #[test]
    fn command_output_passes_streams_through() {
        let result = ToolResult::from(CommandOutput {
            status: Some(1),
            stdout: String::new(),
            stderr: "no display".into(),
        });
        assert_eq!(result, ToolResult::error("no display"));
    }

    #[test]
    fn descriptor_is_flat() {
        let descriptor = ToolDescriptor::new(ToolOptions {
            display_width_px: 1366,
            display_height_px: 768,
            display_number: Some(1),
        });
        assert_eq!(
            serde_json::to_value(descriptor).unwrap(),
            json!({
                "name": "computer",
                "type": "computer_20241022",
                "display_width_px": 1366,
                "display_height_px": 768,
                "display_number": 1,
            })
        );
    }
}
