use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value, json};
use survey_bridge_core::{Gateway, HttpTransport, Transport};
use tokio::io::{self, AsyncBufRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::args::ToolError;
use crate::format::error_content;
use crate::framing::{Framing, Incoming, read_message, write_message};
use crate::tools::{ToolDefinition, call_tool, find_tool, tool_definitions};
use crate::{MCP_PROTOCOL_VERSION, MCP_SERVER_NAME};

/// In-flight calls get this long to finish once input stops.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);
const INCOMING_QUEUE: usize = 32;

#[derive(Debug)]
pub(crate) struct RpcError {
    code: i64,
    message: String,
}

impl RpcError {
    fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: message.into(),
        }
    }

    fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
        }
    }

    fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {method}"),
        }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            code: -32603,
            message: message.into(),
        }
    }
}

pub(crate) fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub(crate) fn error_response(id: Value, error: RpcError) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": error.code,
            "message": error.message
        }
    })
}

/// IDs of the requests in `incoming` that expect an answer.
fn request_ids(incoming: &Value) -> Vec<Value> {
    let expects_answer = |item: &Value| {
        let obj = item.as_object()?;
        obj.get("method")?;
        obj.get("id").cloned()
    };
    match incoming {
        Value::Array(items) => items.iter().filter_map(expects_answer).collect(),
        other => expects_answer(other).into_iter().collect(),
    }
}

type Outgoing = mpsc::UnboundedSender<(Value, Framing)>;

pub struct McpServer<T = HttpTransport> {
    gateway: Gateway<T>,
    read_only: bool,
}

impl<T: Transport + 'static> McpServer<T> {
    pub fn with_gateway(gateway: Gateway<T>, read_only: bool) -> Self {
        Self { gateway, read_only }
    }

    pub fn gateway(&self) -> &Gateway<T> {
        &self.gateway
    }

    fn is_visible(&self, tool: &ToolDefinition) -> bool {
        !(self.read_only && tool.access.is_mutating())
    }

    /// Serve MCP on stdin/stdout until EOF or a termination signal.
    pub async fn serve_stdio(self: Arc<Self>) -> Result<(), String> {
        tracing::info!(
            server = MCP_SERVER_NAME,
            version = env!("CARGO_PKG_VERSION"),
            read_only = self.read_only,
            "mcp server listening on stdio"
        );
        self.serve(BufReader::new(io::stdin()), io::stdout(), shutdown_signal())
            .await
    }

    /// Answer messages from `reader` until EOF or `shutdown`, drain in-flight
    /// calls, then release the session key once. A failed release is logged
    /// by the gateway and does not change the outcome.
    async fn serve<R, W, S>(self: Arc<Self>, reader: R, writer: W, shutdown: S) -> Result<(), String>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: tokio::io::AsyncWrite + Unpin + Send + 'static,
        S: Future<Output = ()>,
    {
        let (incoming_tx, mut incoming_rx) = mpsc::channel(INCOMING_QUEUE);
        let read_task = tokio::spawn(read_loop(reader, incoming_tx));
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let write_task = tokio::spawn(write_loop(writer, out_rx));

        let mut tasks = JoinSet::new();
        let mut pending: HashMap<tokio::task::Id, (Vec<Value>, Framing)> = HashMap::new();
        let mut outcome = Ok(());
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("termination signal received, shutting down");
                    break;
                }
                message = incoming_rx.recv() => match message {
                    Some(Ok(Incoming { framing, payload: Ok(payload) })) => {
                        let ids = request_ids(&payload);
                        let server = Arc::clone(&self);
                        let out = out_tx.clone();
                        let handle = tasks.spawn(async move {
                            for response in server.handle_incoming_message(payload).await {
                                let _ = out.send((response, framing));
                            }
                        });
                        pending.insert(handle.id(), (ids, framing));
                    }
                    Some(Ok(Incoming { framing, payload: Err(err) })) => {
                        tracing::warn!(error = %err, "discarding malformed MCP message");
                        let response = error_response(
                            Value::Null,
                            RpcError::parse_error(format!("Parse error: {err}")),
                        );
                        let _ = out_tx.send((response, framing));
                    }
                    Some(Err(err)) => {
                        outcome = Err(format!("Failed to read MCP message: {err}"));
                        break;
                    }
                    None => {
                        tracing::info!("stdin closed, shutting down");
                        break;
                    }
                },
                Some(joined) = tasks.join_next_with_id(), if !tasks.is_empty() => {
                    settle(joined, &mut pending, &out_tx);
                }
            }
        }

        read_task.abort();
        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while let Some(joined) = tasks.join_next_with_id().await {
                settle(joined, &mut pending, &out_tx);
            }
        })
        .await;
        if drained.is_err() {
            tracing::warn!(
                abandoned = tasks.len(),
                timeout_secs = DRAIN_TIMEOUT.as_secs(),
                "in-flight calls did not finish before shutdown"
            );
            tasks.shutdown().await;
        }

        drop(out_tx);
        if let Err(err) = write_task.await {
            tracing::error!(error = %err, "mcp writer task failed");
        }

        if self.gateway.release_token().await {
            tracing::debug!("shutdown release complete");
        }
        outcome
    }

    pub(crate) async fn handle_incoming_message(&self, incoming: Value) -> Vec<Value> {
        let mut responses = Vec::new();

        if let Some(batch) = incoming.as_array() {
            if batch.is_empty() {
                responses.push(error_response(
                    Value::Null,
                    RpcError::invalid_request("Batch request must not be empty"),
                ));
                return responses;
            }
            for item in batch {
                if let Some(response) = self.handle_single_message(item.clone()).await {
                    responses.push(response);
                }
            }
            return responses;
        }

        if let Some(response) = self.handle_single_message(incoming).await {
            responses.push(response);
        }
        responses
    }

    async fn handle_single_message(&self, incoming: Value) -> Option<Value> {
        let Some(obj) = incoming.as_object() else {
            return Some(error_response(
                Value::Null,
                RpcError::invalid_request("Request must be a JSON object"),
            ));
        };

        if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            let id = obj.get("id").cloned().unwrap_or(Value::Null);
            return Some(error_response(
                id,
                RpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        // No method: a client response. This server never issues requests.
        let method = obj.get("method").and_then(Value::as_str)?;

        let params = obj.get("params").cloned().unwrap_or(Value::Null);
        let Some(id) = obj.get("id").cloned() else {
            tracing::debug!(method, "ignoring notification");
            return None;
        };
        Some(match self.handle_request(method, params).await {
            Ok(payload) => success_response(id, payload),
            Err(err) => error_response(id, err),
        })
    }

    async fn handle_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(self.initialize_payload()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.tools_list_payload()),
            "tools/call" => self.handle_tools_call(params).await,
            "resources/list" => Ok(json!({ "resources": [] })),
            "prompts/list" => Ok(json!({ "prompts": [] })),
            _ => Err(RpcError::method_not_found(method)),
        }
    }

    fn initialize_payload(&self) -> Value {
        let mut instructions = String::from(
            "Tools map one-to-one to the survey platform's administrative procedures. \
             Survey, group, question and participant IDs are numeric. \
             Destructive tools require confirm: true.",
        );
        if self.read_only {
            instructions.push_str(" This server is read-only; tools that modify data are not available.");
        }
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "listChanged": false },
                "prompts": { "listChanged": false }
            },
            "serverInfo": {
                "name": MCP_SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": instructions
        })
    }

    fn tools_list_payload(&self) -> Value {
        let tools: Vec<Value> = tool_definitions()
            .iter()
            .filter(|tool| self.is_visible(tool))
            .map(ToolDefinition::to_value)
            .collect();
        json!({ "tools": tools })
    }

    async fn handle_tools_call(&self, params: Value) -> Result<Value, RpcError> {
        let params = params
            .as_object()
            .ok_or_else(|| RpcError::invalid_params("tools/call params must be an object"))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("tools/call requires string field 'name'"))?;

        let args = match params.get("arguments") {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(_) => {
                return Err(RpcError::invalid_params(
                    "tools/call 'arguments' must be an object",
                ));
            }
        };

        let Some(tool) = find_tool(name).filter(|tool| self.is_visible(tool)) else {
            tracing::warn!(tool = name, read_only = self.read_only, "unknown tool requested");
            let err = ToolError::new("unknown_tool", format!("Unknown tool: {name}"))
                .with_field("name");
            return Ok(error_content(&err));
        };

        tracing::info!(tool = name, "tool call started");
        let started = Instant::now();
        let result = call_tool(&self.gateway, tool, &args).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        Ok(match result {
            Ok(output) => {
                tracing::info!(tool = name, elapsed_ms, outcome = "ok", "tool call finished");
                output.into_content()
            }
            Err(err) => {
                tracing::info!(
                    tool = name,
                    elapsed_ms,
                    outcome = "error",
                    code = %err.code,
                    field = err.field.as_deref(),
                    "tool call finished"
                );
                error_content(&err)
            }
        })
    }
}

/// Account for a finished handler task. A panicked handler still owes its
/// callers an answer.
fn settle(
    joined: Result<(tokio::task::Id, ()), tokio::task::JoinError>,
    pending: &mut HashMap<tokio::task::Id, (Vec<Value>, Framing)>,
    out: &Outgoing,
) {
    match joined {
        Ok((id, ())) => {
            pending.remove(&id);
        }
        Err(err) => {
            let Some((ids, framing)) = pending.remove(&err.id()) else {
                return;
            };
            tracing::error!(error = %err, requests = ids.len(), "mcp handler task failed");
            for id in ids {
                let response = error_response(id, RpcError::internal("Internal error"));
                let _ = out.send((response, framing));
            }
        }
    }
}

async fn read_loop<R>(mut reader: R, tx: mpsc::Sender<Result<Incoming, std::io::Error>>)
where
    R: AsyncBufRead + Unpin,
{
    loop {
        match read_message(&mut reader).await {
            Ok(Some(incoming)) => {
                if tx.send(Ok(incoming)).await.is_err() {
                    return;
                }
            }
            Ok(None) => return,
            Err(err) => {
                let _ = tx.send(Err(err)).await;
                return;
            }
        }
    }
}

async fn write_loop<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<(Value, Framing)>)
where
    W: tokio::io::AsyncWrite + Unpin,
{
    while let Some((response, framing)) = rx.recv().await {
        if let Err(err) = write_message(&mut writer, &response, framing).await {
            tracing::error!(error = %err, "failed to write MCP response");
            return;
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use survey_bridge_core::Credentials;
    use survey_bridge_core::testing::{FakeTransport, Reply};

    fn server(transport: FakeTransport, read_only: bool) -> McpServer<FakeTransport> {
        McpServer::with_gateway(
            Gateway::with_transport(transport, Credentials::new("admin", "secret")),
            read_only,
        )
    }

    async fn call(server: &McpServer<FakeTransport>, name: &str, arguments: Value) -> Value {
        let responses = server
            .handle_incoming_message(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": { "name": name, "arguments": arguments }
            }))
            .await;
        assert_eq!(responses.len(), 1);
        responses.into_iter().next().unwrap()
    }

    fn listed_names(payload: &Value) -> Vec<String> {
        payload["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn request_ids_skip_notifications() {
        let batch = json!([
            {"jsonrpc": "2.0", "id": 1, "method": "ping"},
            {"jsonrpc": "2.0", "method": "notifications/initialized"},
            {"jsonrpc": "2.0", "id": "abc", "method": "tools/list"}
        ]);
        assert_eq!(request_ids(&batch), vec![json!(1), json!("abc")]);
    }

    #[tokio::test]
    async fn initialize_reports_protocol_and_server() {
        let server = server(FakeTransport::new(), false);
        let responses = server
            .handle_incoming_message(json!({"jsonrpc": "2.0", "id": 0, "method": "initialize"}))
            .await;
        let result = &responses[0]["result"];
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], MCP_SERVER_NAME);
        assert_eq!(server.gateway().transport().total_calls(), 0);
    }

    #[tokio::test]
    async fn read_only_mode_hides_and_rejects_mutating_tools() {
        let server = server(FakeTransport::new(), true);
        let responses = server
            .handle_incoming_message(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
            .await;
        let names = listed_names(&responses[0]["result"]);
        assert!(names.contains(&"list_surveys".to_string()));
        assert!(!names.contains(&"delete_survey".to_string()));
        assert!(!names.contains(&"add_participants".to_string()));

        let response = call(&server, "activate_survey", json!({"survey_id": 1})).await;
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(
            response["result"]["content"][0]["text"],
            "Unknown tool: activate_survey"
        );
        assert_eq!(server.gateway().transport().total_calls(), 0);
    }

    #[tokio::test]
    async fn full_mode_lists_every_tool() {
        let server = server(FakeTransport::new(), false);
        let responses = server
            .handle_incoming_message(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
            .await;
        assert_eq!(listed_names(&responses[0]["result"]).len(), 39);
    }

    #[tokio::test]
    async fn non_object_arguments_are_invalid_params() {
        let server = server(FakeTransport::new(), false);
        let response = call(&server, "list_surveys", json!(["oops"])).await;
        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn unknown_method_and_bad_version_are_protocol_errors() {
        let server = server(FakeTransport::new(), false);
        let responses = server
            .handle_incoming_message(json!([
                {"jsonrpc": "2.0", "id": 1, "method": "resources/read"},
                {"jsonrpc": "1.0", "id": 2, "method": "ping"},
                {"jsonrpc": "2.0", "method": "notifications/initialized"}
            ]))
            .await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], -32601);
        assert_eq!(responses[1]["error"]["code"], -32600);

        let empty = server.handle_incoming_message(json!([])).await;
        assert_eq!(empty[0]["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn status_only_result_has_no_json_item() {
        let transport =
            FakeTransport::new().reply("activate_survey", Reply::result(json!({"status": "OK"})));
        let server = server(transport, false);

        let response = call(&server, "activate_survey", json!({"survey_id": 12})).await;
        let content = response["result"]["content"].as_array().unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0]["text"], "Activated survey 12: OK");
        assert!(response["result"].get("isError").is_none());
    }

    #[tokio::test]
    async fn list_surveys_returns_summary_and_json() {
        let transport = FakeTransport::new().reply(
            "list_surveys",
            Reply::result(json!([{"sid": 123456, "surveyls_title": "Intake"}])),
        );
        let server = server(transport, false);

        let response = call(&server, "list_surveys", json!({})).await;
        let content = response["result"]["content"].as_array().unwrap();
        assert_eq!(content[0]["text"], "Found 1 survey(s)");
        assert!(content[1]["text"].as_str().unwrap().contains("123456"));
    }

    #[tokio::test]
    async fn gateway_failure_is_an_error_result_not_a_protocol_error() {
        let transport = FakeTransport::new().reply("list_surveys", Reply::Status(502));
        let server = server(transport, false);

        let response = call(&server, "list_surveys", json!({})).await;
        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("502"));
    }

    #[tokio::test]
    async fn serve_answers_in_client_framing_and_releases_on_eof() {
        let server = Arc::new(server(FakeTransport::new(), false));
        let encoded = STANDARD.encode("id,q1\n1,yes\n");
        server
            .gateway()
            .transport()
            .set_reply("export_responses", Reply::result(json!(encoded)));

        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",",
            "\"params\":{\"name\":\"export_responses\",\"arguments\":{\"survey_id\":42}}}\n",
            "{not json}\n"
        );
        let (client, server_side) = tokio::io::duplex(64 * 1024);
        let result = Arc::clone(&server)
            .serve(
                BufReader::new(input.as_bytes()),
                server_side,
                std::future::pending::<()>(),
            )
            .await;
        assert!(result.is_ok());

        let mut output = String::new();
        let mut client = BufReader::new(client);
        tokio::io::AsyncReadExt::read_to_string(&mut client, &mut output)
            .await
            .unwrap();
        let lines: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        let answer = lines.iter().find(|v| v["id"] == 1).unwrap();
        assert!(
            answer["result"]["content"][1]["text"]
                .as_str()
                .unwrap()
                .contains("id,q1")
        );
        assert!(lines.iter().any(|v| v["error"]["code"] == -32700));
        assert!(!server.gateway().has_token());
        assert_eq!(server.gateway().transport().calls("release_token"), 1);
    }

    async fn serve_collect<S>(
        server: &Arc<McpServer<FakeTransport>>,
        input: &'static str,
        shutdown: S,
    ) -> (Result<(), String>, Vec<Value>)
    where
        S: Future<Output = ()>,
    {
        let (client, server_side) = tokio::io::duplex(64 * 1024);
        let result = Arc::clone(server)
            .serve(BufReader::new(input.as_bytes()), server_side, shutdown)
            .await;

        let mut output = String::new();
        let mut client = BufReader::new(client);
        tokio::io::AsyncReadExt::read_to_string(&mut client, &mut output)
            .await
            .unwrap();
        let lines = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        (result, lines)
    }

    #[tokio::test]
    async fn stray_text_line_gets_parse_error_and_serving_continues() {
        let server = Arc::new(server(FakeTransport::new(), false));
        let input = "hello\n\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n";

        let (result, lines) = serve_collect(&server, input, std::future::pending::<()>()).await;

        assert!(result.is_ok());
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().any(|v| v["error"]["code"] == -32700));
        assert!(lines.iter().any(|v| v["id"] == 1 && v["result"] == json!({})));
    }

    #[tokio::test]
    async fn shutdown_releases_the_session_key_once() {
        let server = Arc::new(server(FakeTransport::new(), false));
        server.gateway().get_token().await.unwrap();

        let (result, _) = serve_collect(&server, "", std::future::ready(())).await;

        assert!(result.is_ok());
        assert_eq!(server.gateway().transport().calls("release_token"), 1);
        assert!(!server.gateway().has_token());
    }

    #[tokio::test]
    async fn failed_release_does_not_fail_shutdown() {
        let transport = FakeTransport::new().reply("release_token", Reply::Status(500));
        let server = Arc::new(server(transport, false));
        server.gateway().get_token().await.unwrap();

        let (result, _) = serve_collect(&server, "", std::future::ready(())).await;

        assert!(result.is_ok());
        assert_eq!(server.gateway().transport().calls("release_token"), 1);
        assert!(server.gateway().has_token());
    }
}
