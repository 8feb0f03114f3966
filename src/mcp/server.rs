/// MCP server implementation that handles JSON-RPC communication
///
/// This module implements the actual MCP server that:
/// 1. Reads JSON-RPC requests from stdin, one per line
/// 2. Runs each tool call against the habit lifecycle
/// 3. Sends JSON-RPC responses to stdout
///
/// Requests are handled one at a time, in arrival order.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::lifecycle::LifecycleError;
use crate::mcp::protocol::*;
use crate::tools;
use crate::{HabitTrackerServer, ServerError};

/// MCP server that handles communication with the client
pub struct McpServer {
    /// The underlying habit tracker server
    habit_tracker: HabitTrackerServer,
    /// Whether the client has confirmed initialization
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(habit_tracker: HabitTrackerServer) -> Self {
        Self {
            habit_tracker,
            initialized: false,
        }
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut stdout = tokio::io::stdout();

        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.handle_line(&line).await {
                        let response_str = serde_json::to_string(&response)?;

                        stdout.write_all(response_str.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    return Err(e.into());
                }
            }
        }

        Ok(())
    }

    /// Process a single line of JSON-RPC input
    ///
    /// Returns `None` for blank lines and notifications.
    pub async fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        if request.is_notification() {
            self.handle_notification(&request.method);
            return None;
        }

        Some(self.handle_request(request).await)
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "notifications/initialized" | "initialized" => {
                self.initialized = true;
                info!("MCP client initialized");
            }
            other => debug!("Ignoring notification '{}'", other),
        }
    }

    /// Handle a JSON-RPC request
    async fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone().unwrap_or(Value::Null);

        if request.jsonrpc != "2.0" {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_REQUEST,
                format!("Unsupported JSON-RPC version '{}'", request.jsonrpc),
                None,
            );
        }

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id).await,
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id).await,
            "tools/call" => self.handle_tools_call(id, request.params).await,
            _ => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        }
    }

    /// Handle MCP initialization request
    async fn handle_initialize(&mut self, id: Value) -> JsonRpcResponse {
        info!("MCP client connected");

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: "Habit Tracker".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        respond(id, &result)
    }

    /// Handle tools/list request
    async fn handle_tools_list(&mut self, id: Value) -> JsonRpcResponse {
        respond(id, &json!({ "tools": tool_definitions() }))
    }

    /// Handle tools/call request
    async fn handle_tools_call(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let tool_params: ToolCallParams = match params.map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid parameters: {}", e),
                    None,
                );
            }
            None => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    "Missing parameters".to_string(),
                    None,
                );
            }
        };

        if !self.initialized {
            debug!("Tool call '{}' before initialization", tool_params.name);
        }

        let args = tool_params.arguments;
        let result = match tool_params.name.as_str() {
            "habit_create" => self.call_habit_create(args).await,
            "habit_complete" => self.call_habit_complete(args).await,
            "habit_update" => self.call_habit_update(args).await,
            "habit_delete" => self.call_habit_delete(args).await,
            "habit_list" => self.call_habit_list(args).await,
            "habit_status" => self.call_habit_status(args).await,
            "habit_analytics" => self.call_habit_analytics(args).await,
            "habit_clear" => self.call_habit_clear(args).await,
            _ => ToolCallResult::error(format!("Unknown tool: {}", tool_params.name)),
        };

        respond(id, &result)
    }

    /// Call the habit_create tool
    async fn call_habit_create(&self, args: Map<String, Value>) -> ToolCallResult {
        let lifecycle = self.habit_tracker.lifecycle();
        invoke("habit_create", args, |p| tools::create_habit(lifecycle, p), |r| match &r.habit_id {
            Some(habit_id) => format!("{}\nHabit ID: {}", r.message, habit_id),
            None => r.message.clone(),
        })
    }

    /// Call the habit_complete tool
    async fn call_habit_complete(&self, args: Map<String, Value>) -> ToolCallResult {
        let lifecycle = self.habit_tracker.lifecycle();
        invoke("habit_complete", args, |p| tools::complete_habit(lifecycle, p), |r| r.message.clone())
    }

    /// Call the habit_update tool
    async fn call_habit_update(&self, args: Map<String, Value>) -> ToolCallResult {
        let lifecycle = self.habit_tracker.lifecycle();
        invoke("habit_update", args, |p| tools::update_habit(lifecycle, p), |r| r.message.clone())
    }

    /// Call the habit_delete tool
    async fn call_habit_delete(&self, args: Map<String, Value>) -> ToolCallResult {
        let lifecycle = self.habit_tracker.lifecycle();
        invoke("habit_delete", args, |p| tools::delete_habit(lifecycle, p), |r| r.message.clone())
    }

    /// Call the habit_list tool
    async fn call_habit_list(&self, args: Map<String, Value>) -> ToolCallResult {
        let lifecycle = self.habit_tracker.lifecycle();
        invoke("habit_list", args, |p| tools::list_habits(lifecycle, p), |r| r.message.clone())
    }

    /// Call the habit_status tool
    async fn call_habit_status(&self, args: Map<String, Value>) -> ToolCallResult {
        let lifecycle = self.habit_tracker.lifecycle();
        invoke("habit_status", args, |p| tools::get_habit_status(lifecycle, p), |r| r.message.clone())
    }

    /// Call the habit_analytics tool
    async fn call_habit_analytics(&self, args: Map<String, Value>) -> ToolCallResult {
        let lifecycle = self.habit_tracker.lifecycle();
        let analytics = self.habit_tracker.analytics();
        invoke(
            "habit_analytics",
            args,
            |p| tools::run_analytics(lifecycle, analytics, p),
            |r| r.message.clone(),
        )
    }

    /// Call the habit_clear tool
    async fn call_habit_clear(&self, args: Map<String, Value>) -> ToolCallResult {
        let lifecycle = self.habit_tracker.lifecycle();
        invoke("habit_clear", args, |p| tools::clear_habits(lifecycle, p), |r| r.message.clone())
    }
}

/// Parse a tool's arguments, run it and render the outcome
fn invoke<P, R>(
    tool: &str,
    args: Map<String, Value>,
    op: impl FnOnce(P) -> Result<R, LifecycleError>,
    render: impl FnOnce(&R) -> String,
) -> ToolCallResult
where
    P: DeserializeOwned,
    R: Serialize,
{
    let params: P = match serde_json::from_value(Value::Object(args)) {
        Ok(params) => params,
        Err(e) => {
            warn!("Rejected arguments for {}: {}", tool, e);
            return ToolCallResult::error(format!("Invalid arguments for {}: {}", tool, e));
        }
    };

    match op(params) {
        Ok(response) => {
            let text = render(&response);
            match serde_json::to_value(&response) {
                Ok(value) => ToolCallResult::success(text).with_structured(value),
                Err(e) => {
                    warn!("Could not serialize {} response: {}", tool, e);
                    ToolCallResult::success(text)
                }
            }
        }
        Err(e) => {
            warn!("{} failed: {}", tool, e);
            ToolCallResult::from_lifecycle_error(&e)
        }
    }
}

/// Serialize a result into a response, falling back to an internal error
fn respond<T: Serialize>(id: Value, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string(), None)
        }
    }
}

fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "habit_create".to_string(),
            description: "Create a new daily or weekly habit. Its first task is due by the end of today."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Name of the habit"},
                    "periodicity": {"type": "string", "enum": ["daily", "weekly"], "description": "How often the habit repeats"}
                },
                "required": ["name", "periodicity"]
            }),
        },
        ToolDefinition {
            name: "habit_complete".to_string(),
            description: "Complete the habit's current task, updating its streak and scheduling the next one"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "habit_id": {"type": "string", "description": "ID of the habit to complete"}
                },
                "required": ["habit_id"]
            }),
        },
        ToolDefinition {
            name: "habit_update".to_string(),
            description: "Rename a habit. Periodicity, streaks and due dates cannot be changed."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "habit_id": {"type": "string", "description": "ID of the habit to update"},
                    "name": {"type": "string", "description": "New name"}
                },
                "required": ["habit_id"],
                "additionalProperties": false
            }),
        },
        ToolDefinition {
            name: "habit_delete".to_string(),
            description: "Delete a habit and its task history".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "habit_id": {"type": "string", "description": "ID of the habit to delete"}
                },
                "required": ["habit_id"]
            }),
        },
        ToolDefinition {
            name: "habit_list".to_string(),
            description: "List habits with their streaks and next due date".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "periodicity": {"type": "string", "enum": ["daily", "weekly"], "description": "Only habits with this periodicity (optional)"},
                    "name": {"type": "string", "description": "Only habits with exactly this name (optional)"}
                },
                "required": []
            }),
        },
        ToolDefinition {
            name: "habit_status".to_string(),
            description: "Check habit status, streaks and whether anything is overdue".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "habit_id": {"type": "string", "description": "ID of specific habit (optional - shows all if omitted)"},
                    "include_recent": {"type": "boolean", "description": "Include recent completion history (optional)"}
                },
                "required": []
            }),
        },
        ToolDefinition {
            name: "habit_analytics".to_string(),
            description: "Streak analytics: the longest streak overall, the longest streak of a named habit, or habits by periodicity"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "enum": ["longest_overall", "longest_for_habit", "by_periodicity"]},
                    "name": {"type": "string", "description": "Habit name, for longest_for_habit"},
                    "periodicity": {"type": "string", "enum": ["daily", "weekly"], "description": "For by_periodicity"}
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: "habit_clear".to_string(),
            description: "Delete every habit and all history. Requires confirm: true.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "confirm": {"type": "boolean", "description": "Must be true to delete anything"}
                },
                "required": ["confirm"]
            }),
        },
    ]
}
