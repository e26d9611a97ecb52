//! MCP (Model Context Protocol) server for editor/agent integration.
//!
//! Exposes the seven sandwich tool operations (spec.md S6): analyze_sandwich,
//! analyze_cheese, check_gate, suggest_refactor, check_budget, get_label,
//! check_degradation. Request dispatch follows the same JSON-RPC 2.0 shape
//! as the teacher's MCP server -- `handle_request` is pure and testable,
//! `run_mcp_server` is the thin stdin/stdout loop around it.

use crate::gate::GateStage;
use crate::ArchetypeTag;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

#[derive(Debug, Deserialize, Serialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,
    pub id: Option<serde_json::Value>,
    pub method: String,
    pub params: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolDef {
    name: String,
    description: String,
    input_schema: InputSchema,
}

#[derive(Debug, Serialize)]
struct InputSchema {
    #[serde(rename = "type")]
    typ: &'static str,
    properties: serde_json::Value,
    required: Vec<&'static str>,
}

/// Handle a single JSON-RPC request and return a response. Extracted from
/// `run_mcp_server` for testability.
pub fn handle_request(req: &JsonRpcRequest) -> JsonRpcResponse {
    let id = req.id.clone();
    let result = match req.method.as_str() {
        "initialize" => Some(serde_json::json!({
            "protocolVersion": "2024-11-05",
            "capabilities": { "tools": { "listChanged": true } },
            "serverInfo": { "name": "sandwich", "version": env!("CARGO_PKG_VERSION") }
        })),
        "tools/list" => Some(serde_json::json!({ "tools": tool_defs() })),
        "tools/call" => Some(dispatch_tool_call(req)),
        _ => None,
    };

    JsonRpcResponse { jsonrpc: "2.0", id, result, error: None }
}

fn tool_defs() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "analyze_sandwich".to_string(),
            description: "Run the full bread/cheese/ham pipeline on a source file and return its triple, label, and recommendations".to_string(),
            input_schema: InputSchema {
                typ: "object",
                properties: serde_json::json!({
                    "file": { "type": "string", "description": "Path to the source file to analyze" }
                }),
                required: vec!["file"],
            },
        },
        ToolDef {
            name: "analyze_cheese".to_string(),
            description: "Run the cheese (cognitive accessibility) analyzer only".to_string(),
            input_schema: InputSchema {
                typ: "object",
                properties: serde_json::json!({
                    "file": { "type": "string", "description": "Path to the source file to analyze" }
                }),
                required: vec!["file"],
            },
        },
        ToolDef {
            name: "check_gate".to_string(),
            description: "Check a file against a release-readiness gate stage (poc, mvp, production)".to_string(),
            input_schema: InputSchema {
                typ: "object",
                properties: serde_json::json!({
                    "file": { "type": "string", "description": "Path to the source file to analyze" },
                    "stage": { "type": "string", "description": "Gate stage: poc, mvp, or production (default mvp)" }
                }),
                required: vec!["file"],
            },
        },
        ToolDef {
            name: "suggest_refactor".to_string(),
            description: "Return the prioritized refactor recommendations for a file, optionally overriding its archetype".to_string(),
            input_schema: InputSchema {
                typ: "object",
                properties: serde_json::json!({
                    "file": { "type": "string", "description": "Path to the source file to analyze" },
                    "archetype": { "type": "string", "description": "Optional archetype override (kebab-case, e.g. api-external)" }
                }),
                required: vec!["file"],
            },
        },
        ToolDef {
            name: "check_budget".to_string(),
            description: "Compare a file's before/after content against its archetype's per-PR budget".to_string(),
            input_schema: InputSchema {
                typ: "object",
                properties: serde_json::json!({
                    "beforeFile": { "type": "string", "description": "Path to the file's content before the change" },
                    "afterFile": { "type": "string", "description": "Path to the file's content after the change" }
                }),
                required: vec!["beforeFile", "afterFile"],
            },
        },
        ToolDef {
            name: "get_label".to_string(),
            description: "Return the dominant-axis label (bread, cheese, ham, balanced) and confidence for a file".to_string(),
            input_schema: InputSchema {
                typ: "object",
                properties: serde_json::json!({
                    "file": { "type": "string", "description": "Path to the source file to analyze" }
                }),
                required: vec!["file"],
            },
        },
        ToolDef {
            name: "check_degradation".to_string(),
            description: "Detect cheese-axis degradation between a file's before and after content".to_string(),
            input_schema: InputSchema {
                typ: "object",
                properties: serde_json::json!({
                    "beforeFile": { "type": "string", "description": "Path to the file's content before the change" },
                    "afterFile": { "type": "string", "description": "Path to the file's content after the change" }
                }),
                required: vec!["beforeFile", "afterFile"],
            },
        },
    ]
}

fn dispatch_tool_call(req: &JsonRpcRequest) -> serde_json::Value {
    let (name, args) = req
        .params
        .as_ref()
        .and_then(|p| p.get("params").or(Some(p)))
        .map(|p| {
            let name = p.get("name").and_then(|n| n.as_str()).unwrap_or("").to_string();
            let args = p.get("arguments").cloned().unwrap_or(serde_json::Value::Null);
            (name, args.as_object().cloned().unwrap_or_default())
        })
        .unwrap_or_default();

    let get = |key: &str| args.get(key).and_then(|v| v.as_str()).map(str::to_string);

    let result = match name.as_str() {
        "analyze_sandwich" => run_analyze_sandwich(&get("file").unwrap_or_default()),
        "analyze_cheese" => run_analyze_cheese(&get("file").unwrap_or_default()),
        "check_gate" => run_check_gate(&get("file").unwrap_or_default(), get("stage").as_deref()),
        "suggest_refactor" => {
            run_suggest_refactor(&get("file").unwrap_or_default(), get("archetype").as_deref())
        }
        "check_budget" => run_check_budget(
            &get("beforeFile").unwrap_or_default(),
            &get("afterFile").unwrap_or_default(),
        ),
        "get_label" => run_get_label(&get("file").unwrap_or_default()),
        "check_degradation" => run_check_degradation(
            &get("beforeFile").unwrap_or_default(),
            &get("afterFile").unwrap_or_default(),
        ),
        _ => Err(anyhow::anyhow!("Unknown tool: {}", name)),
    };

    match result {
        Ok(val) => serde_json::json!({
            "content": [{ "type": "text", "text": serde_json::to_string(&val).unwrap_or_else(|_| "{}".to_string()) }]
        }),
        Err(e) => serde_json::json!({
            "content": [{ "type": "text", "text": format!("Error: {}", e) }],
            "isError": true
        }),
    }
}

fn read_or_fail(file: &str) -> anyhow::Result<(std::path::PathBuf, String)> {
    if file.is_empty() {
        anyhow::bail!("file is required");
    }
    let path = Path::new(file).to_path_buf();
    if !path.exists() {
        anyhow::bail!("File not found: {}", file);
    }
    let source = std::fs::read_to_string(&path)?;
    Ok((path, source))
}

fn run_analyze_sandwich(file: &str) -> anyhow::Result<serde_json::Value> {
    let (path, source) = read_or_fail(file)?;
    let result = crate::analyze_sandwich(&source, &path);
    Ok(serde_json::to_value(result)?)
}

fn run_analyze_cheese(file: &str) -> anyhow::Result<serde_json::Value> {
    let (path, source) = read_or_fail(file)?;
    let report = crate::analyze_cheese(&source, &path);
    Ok(serde_json::to_value(report)?)
}

fn run_check_gate(file: &str, stage: Option<&str>) -> anyhow::Result<serde_json::Value> {
    let (path, source) = read_or_fail(file)?;
    let stage = stage
        .and_then(GateStage::from_str_loose)
        .unwrap_or(GateStage::Mvp);
    let project_root = crate::config::find_project_root(path.parent().unwrap_or(Path::new(".")));
    let verdict = crate::check_gate(&source, stage, &path, project_root.as_deref());
    Ok(serde_json::to_value(verdict)?)
}

fn run_suggest_refactor(file: &str, archetype: Option<&str>) -> anyhow::Result<serde_json::Value> {
    let (path, source) = read_or_fail(file)?;
    let archetype = match archetype {
        Some(a) => Some(parse_archetype(a)?),
        None => None,
    };
    let recs = crate::suggest_refactor(&source, &path, archetype);
    Ok(serde_json::to_value(recs)?)
}

fn run_check_budget(before_file: &str, after_file: &str) -> anyhow::Result<serde_json::Value> {
    let (path, before) = read_or_fail(before_file)?;
    let (_, after) = read_or_fail(after_file)?;
    let verdict = crate::check_budget(&before, &after, &path, None);
    Ok(serde_json::to_value(verdict)?)
}

fn run_get_label(file: &str) -> anyhow::Result<serde_json::Value> {
    let (path, source) = read_or_fail(file)?;
    let (label, confidence, simplex) = crate::get_label(&source, &path);
    Ok(serde_json::json!({ "label": label, "confidence": confidence, "simplex": simplex }))
}

fn run_check_degradation(before_file: &str, after_file: &str) -> anyhow::Result<serde_json::Value> {
    let (path, before) = read_or_fail(before_file)?;
    let (_, after) = read_or_fail(after_file)?;
    let report = crate::check_degradation(&before, &after, &path);
    Ok(serde_json::to_value(report)?)
}

fn parse_archetype(s: &str) -> anyhow::Result<ArchetypeTag> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| anyhow::anyhow!("unknown archetype: {}", s))
}

/// Run the MCP server loop (stdin / stdout).
pub fn run_mcp_server() -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let reader = BufReader::new(stdin.lock());

    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let req: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(_) => continue,
        };

        // JSON-RPC 2.0 notifications (no id) MUST NOT receive a response.
        if req.id.is_none() {
            continue;
        }

        let response = handle_request(&req);
        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        stdout.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_request(method: &str, params: Option<serde_json::Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: Some("2.0".to_string()),
            id: Some(serde_json::json!(1)),
            method: method.to_string(),
            params,
        }
    }

    #[test]
    fn initialize_returns_protocol_version_and_server_info() {
        let req = make_request("initialize", None);
        let resp = handle_request(&req);

        assert_eq!(resp.jsonrpc, "2.0");
        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "sandwich");
    }

    #[test]
    fn tools_list_returns_seven_tools_with_schemas() {
        let req = make_request("tools/list", None);
        let resp = handle_request(&req);

        let result = resp.result.unwrap();
        let tools = result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 7);

        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        for expected in [
            "analyze_sandwich",
            "analyze_cheese",
            "check_gate",
            "suggest_refactor",
            "check_budget",
            "get_label",
            "check_degradation",
        ] {
            assert!(names.contains(&expected), "missing tool: {expected}");
        }

        for tool in tools {
            let schema = &tool["inputSchema"];
            assert_eq!(schema["type"], "object");
            assert!(schema["properties"].is_object());
            assert!(!schema["required"].as_array().unwrap().is_empty());
        }
    }

    #[test]
    fn tools_call_analyze_nonexistent_file_returns_error() {
        let req = make_request(
            "tools/call",
            Some(serde_json::json!({
                "name": "analyze_sandwich",
                "arguments": { "file": "/nonexistent/path/a.ts" }
            })),
        );
        let resp = handle_request(&req);
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
    }

    #[test]
    fn tools_call_unknown_tool_returns_error() {
        let req = make_request(
            "tools/call",
            Some(serde_json::json!({
                "name": "nonexistent_tool",
                "arguments": { "file": "a.ts" }
            })),
        );
        let resp = handle_request(&req);
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Unknown tool"));
    }

    #[test]
    fn tools_call_analyze_sandwich_on_real_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("math.ts");
        std::fs::write(&file, "function add(a, b) { return a + b; }").unwrap();

        let req = make_request(
            "tools/call",
            Some(serde_json::json!({
                "name": "analyze_sandwich",
                "arguments": { "file": file.to_string_lossy() }
            })),
        );
        let resp = handle_request(&req);
        let result = resp.result.unwrap();
        assert!(result.get("isError").is_none());
        let text = result["content"][0]["text"].as_str().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(text).unwrap();
        assert!(parsed.get("filePath").is_some());
        assert!(parsed.get("label").is_some());
    }

    #[test]
    fn tools_call_check_gate_defaults_to_mvp() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("math.ts");
        std::fs::write(&file, "function add(a, b) { return a + b; }").unwrap();

        let req = make_request(
            "tools/call",
            Some(serde_json::json!({
                "name": "check_gate",
                "arguments": { "file": file.to_string_lossy() }
            })),
        );
        let resp = handle_request(&req);
        let result = resp.result.unwrap();
        let text = result["content"][0]["text"].as_str().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["stage"], "mvp");
    }

    #[test]
    fn jsonrpc_request_without_id_is_a_notification() {
        let json = r#"{"jsonrpc":"2.0","method":"initialize"}"#;
        let req: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert!(req.id.is_none());
        let resp = handle_request(&req);
        assert!(resp.id.is_none());
    }

    #[test]
    fn tools_call_with_nested_params_wrapper() {
        let req = make_request(
            "tools/call",
            Some(serde_json::json!({
                "params": {
                    "name": "analyze_sandwich",
                    "arguments": { "file": "/nonexistent/file.ts" }
                }
            })),
        );
        let resp = handle_request(&req);
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
    }

    #[test]
    fn unknown_method_returns_null_result() {
        let req = make_request("nonexistent/method", None);
        let resp = handle_request(&req);
        assert!(resp.result.is_none());
        assert!(resp.error.is_none());
    }
}
