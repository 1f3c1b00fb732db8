//! MCP tool definitions.

use serde::Serialize;
use serde_json::json;

#[derive(Debug, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Get all available MCP tools.
pub fn get_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "get_trace".to_string(),
            description: "Fetch a trace by its ID from the Judgment API".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "trace_id": {
                        "type": "string",
                        "description": "The ID of the trace to fetch"
                    }
                },
                "required": ["trace_id"]
            }),
        },
        ToolDefinition {
            name: "delete_trace".to_string(),
            description: "Delete a trace by its ID from the Judgment API".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "trace_id": {
                        "type": "string",
                        "description": "The ID of the trace to delete"
                    }
                },
                "required": ["trace_id"]
            }),
        },
        ToolDefinition {
            name: "run_evaluation".to_string(),
            description: "Run an evaluation via the Judgment API".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "evaluation_data": {
                        "type": "object",
                        "description": "Evaluation run payload, forwarded verbatim"
                    }
                },
                "required": ["evaluation_data"]
            }),
        },
        ToolDefinition {
            name: "get_evaluation_results".to_string(),
            description: "Fetch evaluation results for a project and evaluation run".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "project_name": {
                        "type": "string",
                        "description": "Project name"
                    },
                    "eval_name": {
                        "type": "string",
                        "description": "Evaluation run name"
                    }
                },
                "required": ["project_name", "eval_name"]
            }),
        },
        ToolDefinition {
            name: "get_dataset".to_string(),
            description: "Pull a dataset by alias and project".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "alias": {
                        "type": "string",
                        "description": "Dataset alias"
                    },
                    "project_name": {
                        "type": "string",
                        "description": "Project name"
                    }
                },
                "required": ["alias", "project_name"]
            }),
        },
        ToolDefinition {
            name: "push_dataset".to_string(),
            description: "Push a dataset (examples + traces) to the Judgment API".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "alias": {
                        "type": "string",
                        "description": "Dataset alias"
                    },
                    "project_name": {
                        "type": "string",
                        "description": "Project name"
                    },
                    "examples": {
                        "type": "array",
                        "items": { "type": "object" },
                        "description": "List of example records"
                    },
                    "traces": {
                        "type": "array",
                        "items": { "type": "object" },
                        "description": "Optional trace records"
                    },
                    "overwrite": {
                        "type": "boolean",
                        "description": "Overwrite existing dataset completely",
                        "default": false
                    },
                    "append": {
                        "type": "boolean",
                        "description": "Append to existing dataset",
                        "default": false
                    }
                },
                "required": ["alias", "project_name", "examples"]
            }),
        },
        ToolDefinition {
            name: "delete_dataset".to_string(),
            description: "Delete a dataset by alias and project".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "alias": {
                        "type": "string",
                        "description": "Dataset alias"
                    },
                    "project_name": {
                        "type": "string",
                        "description": "Project name"
                    }
                },
                "required": ["alias", "project_name"]
            }),
        },
        ToolDefinition {
            name: "create_project".to_string(),
            description: "Create a new project in the Judgment API".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "project_name": {
                        "type": "string",
                        "description": "Project name"
                    }
                },
                "required": ["project_name"]
            }),
        },
        ToolDefinition {
            name: "delete_project".to_string(),
            description: "Delete a project and all its data in the Judgment API".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "project_name": {
                        "type": "string",
                        "description": "Project name"
                    }
                },
                "required": ["project_name"]
            }),
        },
    ]
}
