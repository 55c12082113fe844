use crate::fusion::vm::POWER_ACTIONS;
use crate::fusion::FusionClient;
use anyhow::{anyhow, bail, Result};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

#[derive(Serialize, Deserialize, Debug)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Option<Value>,
    pub id: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

pub struct McpServer {
    client: FusionClient,
}

impl McpServer {
    pub fn new(client: FusionClient) -> Self {
        Self { client }
    }

    pub async fn run_stdio(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut reader = stdin.lock();
        let mut line = String::new();

        loop {
            line.clear();
            let bytes = reader.read_line(&mut line)?;
            if bytes == 0 {
                break; // EOF
            }

            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            debug!("Received: {}", input);

            match serde_json::from_str::<JsonRpcRequest>(input) {
                Ok(req) => {
                    let id = req.id.clone();
                    let resp = self.handle_request(req).await;

                    if let Some(req_id) = id {
                        let json_resp = match resp {
                            Ok(result) => JsonRpcResponse {
                                jsonrpc: "2.0".to_string(),
                                id: Some(req_id),
                                result: Some(result),
                                error: None,
                            },
                            Err(e) => JsonRpcResponse {
                                jsonrpc: "2.0".to_string(),
                                id: Some(req_id),
                                result: None,
                                error: Some(JsonRpcError {
                                    code: -32603, // Internal error
                                    message: e.to_string(),
                                    data: None,
                                }),
                            },
                        };

                        let out = serde_json::to_string(&json_resp)?;
                        println!("{}", out);
                        io::stdout().flush()?;
                    } else {
                        // Notification, no response expected
                        if let Err(e) = resp {
                            error!("Error handling notification: {}", e);
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to parse JSON-RPC: {}", e);
                    // Can't recover the request ID, so no parse-error response.
                }
            }
        }

        self.client.close();
        Ok(())
    }

    pub async fn handle_request(&self, req: JsonRpcRequest) -> Result<Value> {
        match req.method.as_str() {
            "initialize" => Ok(json!({
                "protocolVersion": "2024-11-05",
                "serverInfo": {
                    "name": "vmware-fusion-mcp-rs",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "capabilities": {
                    "tools": {}
                }
            })),
            "notifications/initialized" => {
                info!("Client initialized");
                Ok(Value::Null)
            }
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({
                "tools": self.get_tool_definitions()
            })),
            "tools/call" => {
                if let Some(params) = req.params {
                    let name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
                    let args = params.get("arguments").unwrap_or(&Value::Null);
                    Ok(self.call_tool(name, args).await)
                } else {
                    bail!("Missing params for tools/call");
                }
            }
            _ => {
                bail!("Method not found: {}", req.method);
            }
        }
    }

    pub fn get_tool_definitions(&self) -> Vec<Value> {
        vec![
            json!({
                "name": "list_vms",
                "description": "List all VMs in VMware Fusion",
                "inputSchema": {
                    "type": "object",
                    "properties": {},
                    "required": []
                }
            }),
            json!({
                "name": "get_vm_info",
                "description": "Get detailed information about a specific VM",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "vm_id": {
                            "type": "string",
                            "description": "VM ID to get info about"
                        }
                    },
                    "required": ["vm_id"]
                }
            }),
            json!({
                "name": "power_vm",
                "description": "Perform a power action on a VM",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "vm_id": {
                            "type": "string",
                            "description": "The ID of the VM to control"
                        },
                        "action": {
                            "type": "string",
                            "enum": POWER_ACTIONS,
                            "description": "Power action to perform"
                        }
                    },
                    "required": ["vm_id", "action"]
                }
            }),
        ]
    }

    /// Routes one tool call. Never fails: every error, including an unknown
    /// tool name, comes back as a result envelope with `isError: true`.
    pub async fn call_tool(&self, name: &str, args: &Value) -> Value {
        let outcome = match name {
            "list_vms" => self.handle_list_vms().await,
            "get_vm_info" => self.handle_get_vm_info(args).await,
            "power_vm" => self.handle_power_vm(args).await,
            _ => return tool_error(format!("Unknown tool: {}", name)),
        };

        outcome.unwrap_or_else(|e| tool_error(format!("Error: {}", e)))
    }

    async fn handle_list_vms(&self) -> Result<Value> {
        let vms = self.client.list_vms().await?;

        let text = if vms.is_empty() {
            "No VMs found in VMware Fusion.".to_string()
        } else {
            let mut lines = vec!["VMware Fusion VMs:".to_string(), "=".repeat(50)];
            for vm in &vms {
                let vm_id = vm.get("id").and_then(|v| v.as_str()).unwrap_or("Unknown");
                let vm_path = vm.get("path").and_then(|v| v.as_str()).unwrap_or("Unknown");
                lines.push(format!("ID: {}", vm_id));
                lines.push(format!("Path: {}", vm_path));
                lines.push("-".repeat(30));
            }
            lines.join("\n")
        };

        Ok(tool_result(text, json!({ "vms": vms })))
    }

    async fn handle_get_vm_info(&self, args: &Value) -> Result<Value> {
        let vm_id = require_str(args, "vm_id")?;
        let vm_info = self.client.get_vm_info(vm_id).await?;

        let mut lines = vec![format!("VM Information for ID: {}", vm_id), "=".repeat(50)];
        if let Some(map) = vm_info.as_object() {
            for (key, value) in map {
                if let Some(sub) = value.as_object() {
                    lines.push(format!("{}:", title_case(key)));
                    for (sub_key, sub_value) in sub {
                        lines.push(format!("  {}: {}", sub_key, display_value(sub_value)));
                    }
                } else {
                    lines.push(format!("{}: {}", title_case(key), display_value(value)));
                }
            }
        }

        Ok(tool_result(lines.join("\n"), vm_info))
    }

    async fn handle_power_vm(&self, args: &Value) -> Result<Value> {
        let vm_id = require_str(args, "vm_id")?;
        let action = require_str(args, "action")?;
        let result = self.client.power_vm(vm_id, action).await?;

        let mut text = format!("Successfully performed '{}' action on VM {}", action, vm_id);
        if let Some(status) = result.get("status") {
            text.push_str(&format!(" - Status: {}", display_value(status)));
        }

        Ok(tool_result(text, result))
    }
}

fn tool_result(text: String, structured: Value) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": structured,
        "isError": false
    })
}

fn tool_error(text: String) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": true
    })
}

fn require_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    let value = args
        .get(key)
        .ok_or_else(|| anyhow!("Missing required argument: {}", key))?;
    let s = value
        .as_str()
        .ok_or_else(|| anyhow!("Argument '{}' must be a string", key))?;
    if s.is_empty() {
        bail!("Argument '{}' must not be empty", key);
    }
    Ok(s)
}

/// Uppercases the first letter of each alphabetic run and lowercases the
/// rest, so "cpu" -> "Cpu" and "power_state" -> "Power_State".
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut start_of_word = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if start_of_word {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            start_of_word = false;
        } else {
            out.push(c);
            start_of_word = true;
        }
    }
    out
}

/// Strings render unquoted; everything else renders as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod format_tests {
    use super::{display_value, title_case};
    use serde_json::json;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("cpu"), "Cpu");
        assert_eq!(title_case("power_state"), "Power_State");
        assert_eq!(title_case("ID"), "Id");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("poweredOn")), "poweredOn");
        assert_eq!(display_value(&json!(4)), "4");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&json!(null)), "null");
    }
}
