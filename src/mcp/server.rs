//! MCP JSON-RPC 2.0 server over stdio.
//!
//! One request is processed fully before the next line is read. Application
//! failures (remote API errors, malformed example records, missing tool
//! arguments) are reported inside successful envelopes; only transport
//! problems (bad JSON, unknown methods, missing credential) become JSON-RPC
//! error objects.

use crate::client::{Dataset, Example, JudgmentApi, JudgmentClient, Trace};
use crate::config::Config;
use crate::dataset::{classify_project_error, normalize_example, resolve_push_plan, ProjectStatus};
use crate::error::{JudgmentError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP server forwarding Judgment platform tools to AI assistants.
pub struct McpServer {
    /// Absent when no API key could be resolved; every request then gets a
    /// fixed error instead of the process terminating.
    client: Option<Box<dyn JudgmentApi>>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[serde(rename = "jsonrpc")]
    _jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl JsonRpcResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
        }
    }
}

/// Wrap a payload in an MCP text content envelope.
fn text_envelope(text: String) -> Value {
    json!({
        "content": [{
            "type": "text",
            "text": text
        }]
    })
}

fn json_envelope(payload: &Value) -> Value {
    text_envelope(payload.to_string())
}

fn require_str<'a>(args: &'a Value, key: &'static str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or(JudgmentError::MissingArgument(key))
}

/// Create the project if it does not exist yet, classifying benign failures
/// from the error text. Unclassified failures propagate.
async fn ensure_project(api: &dyn JudgmentApi, project_name: &str) -> Result<ProjectStatus> {
    match api.create_project(project_name).await {
        Ok(_) => Ok(ProjectStatus::Created),
        Err(e) => classify_project_error(&e.to_string()).ok_or(e),
    }
}

impl McpServer {
    /// Create a new MCP server from configuration.
    pub fn new(config: &Config) -> Self {
        let client = config.resolve_api_key().map(|key| {
            Box::new(JudgmentClient::from_config(config, key)) as Box<dyn JudgmentApi>
        });

        if client.is_none() {
            tracing::warn!("no Judgment API key configured; all requests will be rejected");
        }

        Self { client }
    }

    /// Create a server over an existing API client.
    pub fn with_client(client: Box<dyn JudgmentApi>) -> Self {
        Self {
            client: Some(client),
        }
    }

    /// Run the MCP server over stdio.
    pub async fn run(&self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        eprintln!("judgeval-mcp server started");

        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Error reading stdin: {}", e);
                    continue;
                }
            };

            let response = match self.process_line(&line).await {
                Some(r) => r,
                None => continue,
            };

            if !Self::write_response(&mut stdout, &response)? {
                break;
            }
        }

        Ok(())
    }

    /// Handle one input line. Blank lines produce no response.
    async fn process_line(&self, line: &str) -> Option<JsonRpcResponse> {
        if line.trim().is_empty() {
            return None;
        }

        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => Some(self.handle_request(request).await),
            Err(e) => Some(JsonRpcResponse::error(
                None,
                -32700,
                format!("Parse error: {}", e),
            )),
        }
    }

    /// Write one response line. Returns false when the client hung up.
    fn write_response(stdout: &mut io::Stdout, response: &JsonRpcResponse) -> Result<bool> {
        let payload = serde_json::to_string(response)?;

        match writeln!(stdout, "{}", payload).and_then(|_| stdout.flush()) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                eprintln!("stdout closed, shutting down");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        // Without a credential every request type gets the same fixed error.
        if self.client.is_none() {
            return JsonRpcResponse::error(request.id, -32000, "No API key provided".to_string());
        }

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(request.params).await,
            "resources/list" => Ok(json!({ "resources": [] })),
            "prompts/list" => Ok(json!({ "prompts": [] })),
            _ => Err(JsonRpcError {
                code: -32601,
                message: format!("Method not found: {}", request.method),
                data: None,
            }),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(error) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id,
                result: None,
                error: Some(error),
            },
        }
    }

    fn api(&self) -> Result<&dyn JudgmentApi> {
        self.client
            .as_deref()
            .ok_or_else(|| JudgmentError::Config("API key not configured".to_string()))
    }

    fn handle_initialize(&self) -> std::result::Result<Value, JsonRpcError> {
        Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "judgeval-mcp",
                "version": env!("CARGO_PKG_VERSION")
            }
        }))
    }

    fn handle_tools_list(&self) -> std::result::Result<Value, JsonRpcError> {
        let tools = super::tools::get_tools();
        Ok(json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, params: Value) -> std::result::Result<Value, JsonRpcError> {
        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| JsonRpcError {
                code: -32602,
                message: "Invalid params: missing tool name".to_string(),
                data: None,
            })?;

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let outcome = match name {
            "get_trace" => self.tool_get_trace(&arguments).await,
            "delete_trace" => self.tool_delete_trace(&arguments).await,
            "run_evaluation" => self.tool_run_evaluation(&arguments).await,
            "get_evaluation_results" => self.tool_get_evaluation_results(&arguments).await,
            "get_dataset" => self.tool_get_dataset(&arguments).await,
            "push_dataset" => self.tool_push_dataset(&arguments).await,
            "delete_dataset" => self.tool_delete_dataset(&arguments).await,
            "create_project" => self.tool_create_project(&arguments).await,
            "delete_project" => self.tool_delete_project(&arguments).await,
            _ => return Ok(text_envelope(format!("Unknown tool: {}", name))),
        };

        Ok(outcome.unwrap_or_else(|e| text_envelope(format!("Error: {}", e))))
    }

    async fn tool_get_trace(&self, args: &Value) -> Result<Value> {
        let trace_id = require_str(args, "trace_id")?;
        let result = self.api()?.fetch_trace(trace_id).await?;
        Ok(json_envelope(&result))
    }

    async fn tool_delete_trace(&self, args: &Value) -> Result<Value> {
        let trace_id = require_str(args, "trace_id")?;
        let result = self.api()?.delete_trace(trace_id).await?;
        Ok(json_envelope(&result))
    }

    async fn tool_run_evaluation(&self, args: &Value) -> Result<Value> {
        let payload = args
            .get("evaluation_data")
            .ok_or(JudgmentError::MissingArgument("evaluation_data"))?;
        let result = self.api()?.run_evaluation(payload).await?;
        Ok(json_envelope(&result))
    }

    async fn tool_get_evaluation_results(&self, args: &Value) -> Result<Value> {
        let project_name = require_str(args, "project_name")?;
        let eval_name = require_str(args, "eval_name")?;
        let result = self
            .api()?
            .fetch_evaluation_results(project_name, eval_name)
            .await?;
        Ok(json_envelope(&result))
    }

    async fn tool_get_dataset(&self, args: &Value) -> Result<Value> {
        let alias = require_str(args, "alias")?;
        let project_name = require_str(args, "project_name")?;

        match self.api()?.pull_dataset(alias, project_name).await {
            Ok(dataset) => {
                let examples: Vec<Value> = dataset
                    .examples
                    .iter()
                    .map(|ex| {
                        json!({
                            "example_id": ex.example_id,
                            "input": ex.input,
                            "expected_output": ex.expected_output,
                            "actual_output": ex.actual_output,
                            "context": ex.context,
                            "name": ex.name,
                            "created_at": ex.created_at.map(|t| t.to_rfc3339()),
                        })
                    })
                    .collect();

                let traces: Vec<Value> = dataset
                    .traces
                    .iter()
                    .map(|t| {
                        json!({
                            "trace_id": t.trace_id,
                            "input": t.input,
                            "output": t.output,
                        })
                    })
                    .collect();

                Ok(json_envelope(&json!({
                    "alias": alias,
                    "project_name": project_name,
                    "examples": examples,
                    "traces": traces,
                })))
            }
            Err(e) => Ok(json_envelope(&json!({
                "error": format!("Failed to get dataset: {}", e)
            }))),
        }
    }

    async fn tool_push_dataset(&self, args: &Value) -> Result<Value> {
        match self.push_dataset_impl(args).await {
            Ok(value) => Ok(value),
            Err(e) => Ok(json_envelope(&json!({
                "status": "error",
                "error": e.to_string(),
                "suggestion": "Verify: 1) Project exists 2) Example format: {input: 'question', expected_output: 'answer'}"
            }))),
        }
    }

    async fn push_dataset_impl(&self, args: &Value) -> Result<Value> {
        let api = self.api()?;
        let alias = require_str(args, "alias")?;
        let project_name = require_str(args, "project_name")?;
        let raw_examples = args
            .get("examples")
            .and_then(|v| v.as_array())
            .ok_or(JudgmentError::MissingArgument("examples"))?;

        let project_status = ensure_project(api, project_name).await?;

        // A missing dataset just means there is nothing to merge with.
        // Existing examples without an input are placeholders and don't count.
        let existing: Vec<Example> = match api.pull_dataset(alias, project_name).await {
            Ok(dataset) => dataset
                .examples
                .into_iter()
                .filter(|ex| ex.input.is_some())
                .collect(),
            Err(e) => {
                tracing::debug!(
                    "no existing dataset {}/{}: {}",
                    project_name,
                    alias,
                    e
                );
                Vec::new()
            }
        };

        let overwrite = args
            .get("overwrite")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let append = args.get("append").and_then(|v| v.as_bool()).unwrap_or(false);

        let plan = resolve_push_plan(overwrite, append, existing.len());

        let mut all_examples = Vec::new();
        if plan.append {
            all_examples.extend(existing.iter().cloned());
        }

        for raw in raw_examples {
            match normalize_example(raw) {
                Ok(ex) => all_examples.push(ex),
                Err(e) => {
                    return Ok(json_envelope(&json!({
                        "status": "error",
                        "error": format!("Failed to create example: {}", e),
                        "example_data": raw,
                        "suggestion": "Check example format"
                    })));
                }
            }
        }

        let traces: Vec<Trace> = match args.get("traces") {
            Some(v) if !v.is_null() => serde_json::from_value(v.clone())?,
            _ => Vec::new(),
        };

        let new_count = raw_examples.len();
        let existing_count = existing.len();
        let total_count = all_examples.len();

        let dataset = Dataset {
            examples: all_examples,
            traces,
        };

        let result = api
            .push_dataset(alias, project_name, &dataset, plan.overwrite)
            .await?;

        Ok(json_envelope(&json!({
            "status": "success",
            "operation": plan.operation,
            "alias": alias,
            "project_name": project_name,
            "new_examples_added": new_count,
            "existing_examples_count": existing_count,
            "total_examples_count": total_count,
            "project_status": project_status.as_str(),
            "append_mode": plan.append,
            "overwrite_mode": plan.overwrite,
            "result": !result.is_null(),
        })))
    }

    async fn tool_delete_dataset(&self, args: &Value) -> Result<Value> {
        let alias = require_str(args, "alias")?;
        let project_name = require_str(args, "project_name")?;
        let result = self.api()?.delete_dataset(alias, project_name).await?;
        Ok(json_envelope(&result))
    }

    async fn tool_create_project(&self, args: &Value) -> Result<Value> {
        let project_name = require_str(args, "project_name")?;

        let payload = match self.api()?.create_project(project_name).await {
            Ok(_) => json!({ "status": "created", "project_name": project_name }),
            Err(e) => {
                let msg = e.to_string();
                match classify_project_error(&msg) {
                    Some(ProjectStatus::AlreadyExists) => json!({
                        "status": "already_exists",
                        "project_name": project_name,
                        "message": "Project already exists"
                    }),
                    Some(ProjectStatus::ApiError) => json!({
                        "status": "error",
                        "project_name": project_name,
                        "error": "HTTP 500: Internal Server Error - Judgment API is experiencing issues",
                        "suggestion": "Try again in a few minutes or check API status"
                    }),
                    _ => json!({
                        "status": "error",
                        "project_name": project_name,
                        "error": msg
                    }),
                }
            }
        };

        Ok(json_envelope(&payload))
    }

    async fn tool_delete_project(&self, args: &Value) -> Result<Value> {
        let project_name = require_str(args, "project_name")?;
        self.api()?.delete_project(project_name).await?;

        Ok(json_envelope(&json!({
            "status": "deleted",
            "project_name": project_name,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockJudgmentApi;
    use crate::error::JudgmentError;

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            _jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params,
        }
    }

    fn server(mock: MockJudgmentApi) -> McpServer {
        McpServer::with_client(Box::new(mock))
    }

    fn envelope_text(value: &Value) -> &str {
        value["content"][0]["text"].as_str().expect("text envelope")
    }

    fn envelope_json(value: &Value) -> Value {
        serde_json::from_str(envelope_text(value)).expect("JSON payload in envelope")
    }

    async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> Value {
        let response = server
            .handle_request(request(
                "tools/call",
                json!({ "name": name, "arguments": arguments }),
            ))
            .await;
        response.result.expect("tool calls return success envelopes")
    }

    #[tokio::test]
    async fn test_missing_api_key_rejects_every_method() {
        let server = McpServer { client: None };

        for method in ["initialize", "tools/list", "tools/call", "resources/list", "whatever"] {
            let response = server.handle_request(request(method, json!({}))).await;
            let error = response.error.expect("degraded mode returns errors");
            assert_eq!(error.code, -32000);
            assert_eq!(error.message, "No API key provided");
        }
    }

    #[tokio::test]
    async fn test_initialize() {
        let server = server(MockJudgmentApi::new());
        let response = server.handle_request(request("initialize", json!({}))).await;
        let result = response.result.unwrap();

        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "judgeval-mcp");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_tools_list() {
        let server = server(MockJudgmentApi::new());
        let response = server.handle_request(request("tools/list", json!({}))).await;
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();

        assert_eq!(tools.len(), 9);
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert!(names.contains(&"push_dataset"));
        assert!(names.contains(&"get_trace"));
    }

    #[tokio::test]
    async fn test_resources_and_prompts_are_empty() {
        let server = server(MockJudgmentApi::new());

        let response = server
            .handle_request(request("resources/list", json!({})))
            .await;
        assert_eq!(response.result.unwrap()["resources"], json!([]));

        let response = server.handle_request(request("prompts/list", json!({}))).await;
        assert_eq!(response.result.unwrap()["prompts"], json!([]));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = server(MockJudgmentApi::new());
        let response = server.handle_request(request("bogus/method", json!({}))).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_tools_call_missing_name() {
        let server = server(MockJudgmentApi::new());
        let response = server.handle_request(request("tools/call", json!({}))).await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_unknown_tool_reported_in_envelope() {
        let server = server(MockJudgmentApi::new());
        let result = call_tool(&server, "nonexistent", json!({})).await;
        assert_eq!(envelope_text(&result), "Unknown tool: nonexistent");
    }

    #[tokio::test]
    async fn test_malformed_line_is_parse_error() {
        let server = server(MockJudgmentApi::new());
        let response = server.process_line("{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, -32700);
    }

    #[tokio::test]
    async fn test_blank_line_produces_no_response() {
        let server = server(MockJudgmentApi::new());
        assert!(server.process_line("   ").await.is_none());
    }

    #[tokio::test]
    async fn test_get_trace_forwards_id() {
        let mut mock = MockJudgmentApi::new();
        mock.expect_fetch_trace()
            .withf(|id| id == "trace-42")
            .times(1)
            .returning(|_| Ok(json!({ "trace_id": "trace-42", "output": "done" })));

        let result = call_tool(&server(mock), "get_trace", json!({ "trace_id": "trace-42" })).await;
        assert_eq!(envelope_json(&result)["trace_id"], "trace-42");
    }

    #[tokio::test]
    async fn test_get_trace_missing_argument() {
        let result = call_tool(&server(MockJudgmentApi::new()), "get_trace", json!({})).await;
        assert_eq!(
            envelope_text(&result),
            "Error: missing required argument: trace_id"
        );
    }

    #[tokio::test]
    async fn test_delete_trace_forwards_id() {
        let mut mock = MockJudgmentApi::new();
        mock.expect_delete_trace()
            .withf(|id| id == "trace-7")
            .times(1)
            .returning(|_| Ok(json!({ "deleted": true })));

        let result = call_tool(&server(mock), "delete_trace", json!({ "trace_id": "trace-7" })).await;
        assert_eq!(envelope_json(&result)["deleted"], true);
    }

    #[tokio::test]
    async fn test_run_evaluation_forwards_payload_verbatim() {
        let payload = json!({ "eval_name": "exp-1", "scorers": ["faithfulness"] });
        let expected = payload.clone();

        let mut mock = MockJudgmentApi::new();
        mock.expect_run_evaluation()
            .withf(move |p| *p == expected)
            .times(1)
            .returning(|_| Ok(json!({ "status": "queued" })));

        let result = call_tool(
            &server(mock),
            "run_evaluation",
            json!({ "evaluation_data": payload }),
        )
        .await;
        assert_eq!(envelope_json(&result)["status"], "queued");
    }

    #[tokio::test]
    async fn test_get_evaluation_results_forwards_both_names() {
        let mut mock = MockJudgmentApi::new();
        mock.expect_fetch_evaluation_results()
            .withf(|project, eval| project == "proj" && eval == "exp-1")
            .times(1)
            .returning(|_, _| Ok(json!([{ "score": 0.9 }])));

        let result = call_tool(
            &server(mock),
            "get_evaluation_results",
            json!({ "project_name": "proj", "eval_name": "exp-1" }),
        )
        .await;
        assert_eq!(envelope_json(&result)[0]["score"], 0.9);
    }

    #[tokio::test]
    async fn test_get_dataset_reshapes_payload() {
        let mut mock = MockJudgmentApi::new();
        mock.expect_pull_dataset()
            .withf(|alias, project| alias == "qa" && project == "proj")
            .times(1)
            .returning(|_, _| {
                Ok(Dataset {
                    examples: vec![Example {
                        example_id: Some("ex-1".to_string()),
                        input: Some("What is 2+2?".to_string()),
                        expected_output: Some("4".to_string()),
                        ..Default::default()
                    }],
                    traces: vec![Trace {
                        trace_id: Some("tr-1".to_string()),
                        input: Some(json!("in")),
                        output: Some(json!("out")),
                    }],
                })
            });

        let result = call_tool(
            &server(mock),
            "get_dataset",
            json!({ "alias": "qa", "project_name": "proj" }),
        )
        .await;

        let payload = envelope_json(&result);
        assert_eq!(payload["alias"], "qa");
        assert_eq!(payload["project_name"], "proj");
        assert_eq!(payload["examples"][0]["input"], "What is 2+2?");
        assert_eq!(payload["examples"][0]["expected_output"], "4");
        assert_eq!(payload["traces"][0]["trace_id"], "tr-1");
    }

    #[tokio::test]
    async fn test_get_dataset_failure_reported_in_payload() {
        let mut mock = MockJudgmentApi::new();
        mock.expect_pull_dataset().returning(|_, _| {
            Err(JudgmentError::Api {
                status: 404,
                message: "dataset not found".to_string(),
            })
        });

        let result = call_tool(
            &server(mock),
            "get_dataset",
            json!({ "alias": "qa", "project_name": "proj" }),
        )
        .await;

        let payload = envelope_json(&result);
        let error = payload["error"].as_str().unwrap();
        assert!(error.starts_with("Failed to get dataset:"));
        assert!(error.contains("dataset not found"));
    }

    #[tokio::test]
    async fn test_push_dataset_fresh_creates() {
        let mut mock = MockJudgmentApi::new();
        mock.expect_create_project().returning(|_| Ok(json!({})));
        mock.expect_pull_dataset().returning(|_, _| {
            Err(JudgmentError::Api {
                status: 404,
                message: "dataset not found".to_string(),
            })
        });
        mock.expect_push_dataset()
            .withf(|alias, project, dataset, overwrite| {
                alias == "qa"
                    && project == "proj"
                    && !*overwrite
                    && dataset.examples.len() == 1
                    && dataset.examples[0].input.as_deref() == Some("new question")
            })
            .times(1)
            .returning(|_, _, _, _| Ok(json!(true)));

        let result = call_tool(
            &server(mock),
            "push_dataset",
            json!({
                "alias": "qa",
                "project_name": "proj",
                "examples": [{ "question": "new question", "answer": "new answer" }]
            }),
        )
        .await;

        let payload = envelope_json(&result);
        assert_eq!(payload["status"], "success");
        assert_eq!(payload["operation"], "created");
        assert_eq!(payload["append_mode"], false);
        assert_eq!(payload["new_examples_added"], 1);
        assert_eq!(payload["existing_examples_count"], 0);
        assert_eq!(payload["total_examples_count"], 1);
        assert_eq!(payload["project_status"], "created");
    }

    #[tokio::test]
    async fn test_push_dataset_silent_append_prepends_existing() {
        let mut mock = MockJudgmentApi::new();
        mock.expect_create_project().returning(|_| {
            Err(JudgmentError::Api {
                status: 400,
                message: "project already exists".to_string(),
            })
        });
        mock.expect_pull_dataset().returning(|_, _| {
            Ok(Dataset {
                examples: vec![
                    Example {
                        input: Some("old".to_string()),
                        ..Default::default()
                    },
                    // placeholder rows without input must not count
                    Example::default(),
                ],
                traces: vec![],
            })
        });
        mock.expect_push_dataset()
            .withf(|_, _, dataset, overwrite| {
                !*overwrite
                    && dataset.examples.len() == 2
                    && dataset.examples[0].input.as_deref() == Some("old")
                    && dataset.examples[1].input.as_deref() == Some("new")
            })
            .times(1)
            .returning(|_, _, _, _| Ok(json!(true)));

        let result = call_tool(
            &server(mock),
            "push_dataset",
            json!({
                "alias": "qa",
                "project_name": "proj",
                "examples": [{ "input": "new" }]
            }),
        )
        .await;

        let payload = envelope_json(&result);
        assert_eq!(payload["operation"], "appended");
        assert_eq!(payload["append_mode"], true);
        assert_eq!(payload["existing_examples_count"], 1);
        assert_eq!(payload["total_examples_count"], 2);
        assert_eq!(payload["project_status"], "already_exists");
    }

    #[tokio::test]
    async fn test_push_dataset_overwrite_discards_existing() {
        let mut mock = MockJudgmentApi::new();
        mock.expect_create_project().returning(|_| Ok(json!({})));
        mock.expect_pull_dataset().returning(|_, _| {
            Ok(Dataset {
                examples: vec![Example {
                    input: Some("old".to_string()),
                    ..Default::default()
                }],
                traces: vec![],
            })
        });
        mock.expect_push_dataset()
            .withf(|_, _, dataset, overwrite| {
                *overwrite
                    && dataset.examples.len() == 1
                    && dataset.examples[0].input.as_deref() == Some("new")
            })
            .times(1)
            .returning(|_, _, _, _| Ok(json!(true)));

        let result = call_tool(
            &server(mock),
            "push_dataset",
            json!({
                "alias": "qa",
                "project_name": "proj",
                "examples": [{ "input": "new" }],
                "overwrite": true
            }),
        )
        .await;

        let payload = envelope_json(&result);
        assert_eq!(payload["operation"], "overwritten");
        assert_eq!(payload["overwrite_mode"], true);
        assert_eq!(payload["append_mode"], false);
    }

    #[tokio::test]
    async fn test_push_dataset_bad_example_aborts_before_push() {
        let mut mock = MockJudgmentApi::new();
        mock.expect_create_project().returning(|_| Ok(json!({})));
        mock.expect_pull_dataset().returning(|_, _| Ok(Dataset::default()));
        // no push_dataset expectation: calling it fails the test

        let result = call_tool(
            &server(mock),
            "push_dataset",
            json!({
                "alias": "qa",
                "project_name": "proj",
                "examples": [{ "input": "fine" }, 42]
            }),
        )
        .await;

        let payload = envelope_json(&result);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["example_data"], 42);
        assert!(payload["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to create example:"));
    }

    #[tokio::test]
    async fn test_push_dataset_forwards_traces() {
        let mut mock = MockJudgmentApi::new();
        mock.expect_create_project().returning(|_| Ok(json!({})));
        mock.expect_pull_dataset().returning(|_, _| Ok(Dataset::default()));
        mock.expect_push_dataset()
            .withf(|_, _, dataset, _| {
                dataset.traces.len() == 1
                    && dataset.traces[0].trace_id.as_deref() == Some("tr-9")
            })
            .times(1)
            .returning(|_, _, _, _| Ok(json!(true)));

        let result = call_tool(
            &server(mock),
            "push_dataset",
            json!({
                "alias": "qa",
                "project_name": "proj",
                "examples": [{ "input": "q" }],
                "traces": [{ "trace_id": "tr-9" }]
            }),
        )
        .await;

        assert_eq!(envelope_json(&result)["status"], "success");
    }

    #[tokio::test]
    async fn test_push_dataset_remote_failure_payload() {
        let mut mock = MockJudgmentApi::new();
        mock.expect_create_project().returning(|_| Ok(json!({})));
        mock.expect_pull_dataset().returning(|_, _| Ok(Dataset::default()));
        mock.expect_push_dataset().returning(|_, _, _, _| {
            Err(JudgmentError::Api {
                status: 403,
                message: "forbidden".to_string(),
            })
        });

        let result = call_tool(
            &server(mock),
            "push_dataset",
            json!({
                "alias": "qa",
                "project_name": "proj",
                "examples": [{ "input": "q" }]
            }),
        )
        .await;

        let payload = envelope_json(&result);
        assert_eq!(payload["status"], "error");
        assert!(payload["error"].as_str().unwrap().contains("forbidden"));
        assert!(payload["suggestion"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_delete_dataset_forwards_args() {
        let mut mock = MockJudgmentApi::new();
        mock.expect_delete_dataset()
            .withf(|alias, project| alias == "qa" && project == "proj")
            .times(1)
            .returning(|_, _| Ok(json!({ "deleted": true })));

        let result = call_tool(
            &server(mock),
            "delete_dataset",
            json!({ "alias": "qa", "project_name": "proj" }),
        )
        .await;
        assert_eq!(envelope_json(&result)["deleted"], true);
    }

    #[tokio::test]
    async fn test_create_project_statuses() {
        let mut mock = MockJudgmentApi::new();
        mock.expect_create_project()
            .withf(|name| name == "fresh")
            .returning(|_| Ok(json!({})));
        mock.expect_create_project()
            .withf(|name| name == "taken")
            .returning(|_| {
                Err(JudgmentError::Api {
                    status: 400,
                    message: "Project already exists".to_string(),
                })
            });
        mock.expect_create_project()
            .withf(|name| name == "broken")
            .returning(|_| {
                Err(JudgmentError::Api {
                    status: 500,
                    message: "internal server error".to_string(),
                })
            });
        let server = server(mock);

        let result = call_tool(&server, "create_project", json!({ "project_name": "fresh" })).await;
        assert_eq!(envelope_json(&result)["status"], "created");

        let result = call_tool(&server, "create_project", json!({ "project_name": "taken" })).await;
        assert_eq!(envelope_json(&result)["status"], "already_exists");

        let result = call_tool(&server, "create_project", json!({ "project_name": "broken" })).await;
        let payload = envelope_json(&result);
        assert_eq!(payload["status"], "error");
        assert!(payload["error"].as_str().unwrap().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_delete_project() {
        let mut mock = MockJudgmentApi::new();
        mock.expect_delete_project()
            .withf(|name| name == "proj")
            .times(1)
            .returning(|_| Ok(json!({})));

        let result = call_tool(&server(mock), "delete_project", json!({ "project_name": "proj" })).await;
        let payload = envelope_json(&result);
        assert_eq!(payload["status"], "deleted");
        assert_eq!(payload["project_name"], "proj");
    }

    #[tokio::test]
    async fn test_remote_error_becomes_envelope_text() {
        let mut mock = MockJudgmentApi::new();
        mock.expect_fetch_trace().returning(|_| {
            Err(JudgmentError::Api {
                status: 401,
                message: "invalid key".to_string(),
            })
        });

        let result = call_tool(&server(mock), "get_trace", json!({ "trace_id": "t" })).await;
        let text = envelope_text(&result);
        assert!(text.starts_with("Error:"));
        assert!(text.contains("invalid key"));
    }
}
