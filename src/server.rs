//! MCP server exposing the `computer` tool over stdio.
//!
//! One tool is advertised. Its arguments are the wire action request
//! (`action`, optional `text`, optional `coordinate`); results come back as
//! text content plus a PNG image when the action produced a screenshot.

use std::io;
use std::sync::Arc;

use log::{debug, info, warn};
use rmcp::{
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
        PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    transport::stdio,
    ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::action::{ActionKind, ActionRequest};
use crate::input::InputBackend;
use crate::result::{ToolDescriptor, ToolResult, TOOL_NAME};
use crate::shell::CommandRunner;
use crate::tool::ComputerTool;

pub struct ComputerServer<I, R> {
    tool: Arc<Mutex<ComputerTool<I, R>>>,
    definition: Tool,
}

impl<I, R> ComputerServer<I, R>
where
    I: InputBackend + Sync + 'static,
    R: CommandRunner + 'static,
{
    pub fn new(tool: ComputerTool<I, R>) -> Self {
        let definition = tool_definition(&tool.descriptor());
        Self {
            tool: Arc::new(Mutex::new(tool)),
            definition,
        }
    }

    /// Validate and run one `computer` call.
    ///
    /// Arguments that do not deserialize are a protocol error; anything the
    /// tool rejects is reported as an error result the agent can read.
    pub async fn call(&self, arguments: Option<JsonObject>) -> Result<CallToolResult, McpError> {
        let arguments = Value::Object(arguments.unwrap_or_default());
        let request: ActionRequest = serde_json::from_value(arguments)
            .map_err(|e| McpError::invalid_params(format!("Invalid request: {}", e), None))?;

        let mut tool = self.tool.lock().await;
        let result = match tool.invoke(&request).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Action {} failed: {}", request.action, e);
                ToolResult::error(e.to_string())
            }
        };
        Ok(into_call_result(result))
    }

    /// Serve MCP over stdin/stdout until the client disconnects.
    pub async fn serve_stdio(self) -> io::Result<()> {
        info!("Serving {} over MCP stdio", TOOL_NAME);
        let tool = Arc::clone(&self.tool);

        let service = self
            .serve(stdio())
            .await
            .map_err(|e| io::Error::other(e.to_string()))?;
        let reason = service.waiting().await.map_err(io::Error::other)?;
        debug!("MCP session ended: {:?}", reason);

        // No automatic release: whatever the agent left held stays held.
        for held in tool.lock().await.held().iter() {
            warn!("Session ended with {} still held", held);
        }
        Ok(())
    }
}

/// MCP tool definition for the `computer` tool at the advertised geometry
pub fn tool_definition(descriptor: &ToolDescriptor) -> Tool {
    let options = &descriptor.options;
    let display = options
        .display_number
        .map(|n| format!(" on display :{}", n))
        .unwrap_or_default();
    let description = format!(
        "Use a mouse and keyboard to interact with a computer, and take screenshots. \
         The screen is {}x{} pixels{}; coordinates are in that space.",
        options.display_width_px, options.display_height_px, display
    );

    let actions: Vec<&str> = ActionKind::ALL.iter().map(|k| k.as_str()).collect();
    let schema = json!({
        "type": "object",
        "properties": {
            "action": {
                "type": "string",
                "enum": actions,
                "description": "Action to perform",
            },
            "text": {
                "type": "string",
                "description": "Key name for `key`, text for `type`",
            },
            "coordinate": {
                "type": "array",
                "items": { "type": "integer", "minimum": 0 },
                "minItems": 2,
                "maxItems": 2,
                "description": "(x, y) for `mouse_move` and `left_click_drag`",
            },
        },
        "required": ["action"],
    });
    let schema = match schema {
        Value::Object(obj) => obj,
        _ => JsonObject::new(),
    };

    Tool::new(descriptor.name, description, Arc::new(schema))
}

fn into_call_result(result: ToolResult) -> CallToolResult {
    let failed = result.error.is_some();
    let mut content = Vec::new();
    if let Some(output) = result.output {
        content.push(Content::text(output));
    }
    if let Some(error) = result.error {
        content.push(Content::text(error));
    }
    if let Some(image) = result.base64_image {
        content.push(Content::image(image, "image/png"));
    }

    if failed {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

impl<I, R> ServerHandler for ComputerServer<I, R>
where
    I: InputBackend + Sync + 'static,
    R: CommandRunner + 'static,
{
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Computer-use tool. Take a screenshot to see the display, then use mouse \
                 and keyboard actions to interact with it."
                    .into(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(vec![self.definition.clone()]))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        if request.name != TOOL_NAME {
            return Err(McpError::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            ));
        }
        self.call(request.arguments).await
    }
}
