// MCP server: newline-delimited JSON-RPC 2.0 over stdio

use crate::protocol::{
    negotiate_protocol_version, CallToolParams, CallToolResult, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo,
    ToolsCapability, JSONRPC_VERSION,
};
use crate::tools::{InvokeError, ToolRegistry};
use anyhow::{Context, Result};
use bytes::BytesMut;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{Decoder, FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

pub const SERVER_NAME: &str = "wikidata-mcp";

/// Default upper bound on one request line.
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// Responses waiting for the writer before request tasks block.
const RESPONSE_QUEUE: usize = 64;

const INSTRUCTIONS: &str = "Answer questions based on Wikidata. Resolve names to IDs with \
search_entity and search_property before calling get_properties, get_metadata or execute_sparql.";

/// A request line the codec could not hand over as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BadLine {
    TooLong,
    NotUtf8,
}

/// `LinesCodec` that reports bad lines as items instead of failing the stream.
///
/// `FramedRead` stops yielding after a decoder error, so an oversized or non-UTF-8
/// line would otherwise end the session.
struct RequestLineCodec {
    inner: LinesCodec,
}

impl RequestLineCodec {
    fn new(max_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_length),
        }
    }

    fn map(
        decoded: Result<Option<String>, LinesCodecError>,
    ) -> std::io::Result<Option<Result<String, BadLine>>> {
        match decoded {
            Ok(line) => Ok(line.map(Ok)),
            Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(Err(BadLine::TooLong))),
            // LinesCodec only reports Io from decode for invalid UTF-8; the line is already consumed
            Err(LinesCodecError::Io(_)) => Ok(Some(Err(BadLine::NotUtf8))),
        }
    }
}

impl Decoder for RequestLineCodec {
    type Item = Result<String, BadLine>;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Self::map(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Self::map(self.inner.decode_eof(buf))
    }
}

#[derive(Clone)]
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    max_line_bytes: usize,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            max_line_bytes: MAX_LINE_BYTES,
        }
    }

    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Serve requests on stdin/stdout until stdin closes.
    pub async fn start(&self) -> Result<()> {
        if self.registry.is_empty() {
            warn!("No tools registered");
        }
        info!(tools = self.registry.len(), "MCP server listening on stdio");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await?;
        info!("stdin closed, shutting down");
        Ok(())
    }

    /// Serve requests from any line-oriented byte stream.
    ///
    /// Each request runs in its own task; responses are written in completion order by a
    /// single writer. Returns once the input is closed and every in-flight request has
    /// been answered.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = FramedRead::new(reader, RequestLineCodec::new(self.max_line_bytes));
        let mut sink = FramedWrite::new(writer, LinesCodec::new());
        let (tx, mut rx) = mpsc::channel::<JsonRpcResponse>(RESPONSE_QUEUE);

        let read = async move {
            while let Some(line) = lines.next().await {
                let line = match line {
                    Ok(Ok(line)) => line,
                    Ok(Err(bad)) => {
                        warn!(?bad, max_bytes = self.max_line_bytes, "Rejecting request line");
                        let error = match bad {
                            BadLine::TooLong => JsonRpcError::invalid_request(),
                            BadLine::NotUtf8 => JsonRpcError::parse_error(),
                        };
                        if tx.send(JsonRpcResponse::error(serde_json::Value::Null, error)).await.is_err() {
                            break;
                        }
                        continue;
                    }
                    Err(e) => {
                        error!("Failed to read request: {}", e);
                        return Err(e).context("stdin read error");
                    }
                };

                if line.trim().is_empty() {
                    continue;
                }
                debug!(request = %line.trim(), "Received");

                let server = self.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Some(response) = server.handle_line(line.trim()).await {
                        // Receiver is gone only when the writer already failed
                        let _ = tx.send(response).await;
                    }
                });
            }
            Ok::<(), anyhow::Error>(())
        };

        let write = async {
            while let Some(response) = rx.recv().await {
                let json = serde_json::to_string(&response)?;
                debug!(response = %json, "Sending");
                sink.send(json).await.map_err(|e| {
                    error!("Failed to write response: {}", e);
                    anyhow::anyhow!("stdout write error: {}", e)
                })?;
            }
            Ok::<(), anyhow::Error>(())
        };

        tokio::try_join!(read, write)?;
        Ok(())
    }

    /// Handle one raw JSON-RPC message. Notifications yield no response.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unparseable request: {}", e);
                return Some(JsonRpcResponse::error(
                    serde_json::Value::Null,
                    JsonRpcError::parse_error(),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(serde_json::Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                warn!("Invalid request: {}", e);
                return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
        }

        self.handle_request(request).await
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Notification received");
            return None;
        };

        let outcome = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(request.params).await,
            method => {
                warn!(method, "Unknown method");
                Err(JsonRpcError::method_not_found(method))
            }
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn initialize(&self, params: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
        let params: InitializeParams = parse_params(params)?;
        if let Some(client) = &params.client_info {
            info!(client = %client.name, version = %client.version, "Client connected");
        }

        let result = InitializeResult {
            protocol_version: negotiate_protocol_version(&params.protocol_version).to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        };
        to_result(&result)
    }

    fn list_tools(&self) -> Result<serde_json::Value, JsonRpcError> {
        to_result(&ListToolsResult {
            tools: self.registry.list_schemas(),
        })
    }

    async fn call_tool(&self, params: Option<serde_json::Value>) -> Result<serde_json::Value, JsonRpcError> {
        let params: CallToolParams = parse_params(params)?;

        let result = match self.registry.invoke(&params.name, params.arguments).await {
            Ok(result) => result,
            Err(InvokeError::UnknownTool(name)) => {
                return Err(JsonRpcError::invalid_params(format!("Unknown tool: {}", name)));
            }
            Err(InvokeError::Failed(e)) => {
                warn!(tool = %params.name, "Tool call failed: {:#}", e);
                CallToolResult::error(format!("{:#}", e))
            }
        };
        to_result(&result)
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(
    params: Option<serde_json::Value>,
) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
    serde_json::from_value(params).map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))
}

fn to_result<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::FakeHttp;
    use crate::tools::wikidata_registry;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use wikidata_core::{HttpClient, RemoteQuery, WikidataClient, WikidataConfig, WikidataResult};

    fn server_with(http: &Arc<FakeHttp>) -> McpServer {
        McpServer::new(wikidata_registry(http.client()))
    }

    async fn call(server: &McpServer, request: Value) -> Value {
        let response = server
            .handle_line(&request.to_string())
            .await
            .expect("expected a response");
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let server = server_with(&FakeHttp::ok(json!({})));
        let response = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "0.0.1"}
                }
            }),
        )
        .await;

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(response["result"]["serverInfo"]["name"], "wikidata-mcp");
        assert_eq!(response["result"]["capabilities"]["tools"]["listChanged"], false);
    }

    #[tokio::test]
    async fn test_initialize_without_params() {
        let server = server_with(&FakeHttp::ok(json!({})));
        let response = call(&server, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"})).await;
        assert_eq!(response["error"]["code"], JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let server = server_with(&FakeHttp::ok(json!({})));
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_ping() {
        let server = server_with(&FakeHttp::ok(json!({})));
        let response = call(&server, json!({"jsonrpc": "2.0", "id": "p", "method": "ping"})).await;
        assert_eq!(response["id"], "p");
        assert_eq!(response["result"], json!({}));
    }

    #[tokio::test]
    async fn test_tools_list() {
        let server = server_with(&FakeHttp::ok(json!({})));
        let response = call(&server, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;

        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 5);
        assert_eq!(tools[0]["name"], "search_entity");
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["query"]));
        assert_eq!(tools[4]["name"], "get_metadata");
        assert_eq!(
            tools[4]["outputSchema"]["required"],
            json!(["Label", "Descriptions"])
        );
    }

    #[tokio::test]
    async fn test_tools_call_success() {
        let http = FakeHttp::ok(json!({"query": {"search": [{"title": "Property:P57"}]}}));
        let server = server_with(&http);

        let response = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {"name": "search_property", "arguments": {"query": "director"}}
            }),
        )
        .await;

        assert_eq!(response["result"]["content"][0]["text"], "P57");
        assert_eq!(response["result"]["structuredContent"]["result"], "P57");
        assert!(response["result"].get("isError").is_none());
    }

    #[tokio::test]
    async fn test_tools_call_remote_failure_is_tool_error() {
        let server = server_with(&FakeHttp::status(502));

        let response = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": {"name": "get_properties", "arguments": {"entity_id": "Q1"}}
            }),
        )
        .await;

        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("502"));
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool() {
        let server = server_with(&FakeHttp::ok(json!({})));
        let response = call(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "tools/call",
                "params": {"name": "delete_entity", "arguments": {}}
            }),
        )
        .await;

        assert_eq!(response["error"]["code"], JsonRpcError::INVALID_PARAMS);
        assert_eq!(response["error"]["message"], "Unknown tool: delete_entity");
    }

    #[tokio::test]
    async fn test_handle_request_directly() {
        let server = server_with(&FakeHttp::ok(json!({})));
        let response = server
            .handle_request(JsonRpcRequest::new(9, "ping", json!({})))
            .await
            .unwrap();
        assert_eq!(response.id, json!(9));
        assert_eq!(response.result, Some(json!({})));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = server_with(&FakeHttp::ok(json!({})));
        let response = call(&server, json!({"jsonrpc": "2.0", "id": 6, "method": "resources/list"})).await;
        assert_eq!(response["error"]["code"], JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_parse_error() {
        let server = server_with(&FakeHttp::ok(json!({})));
        let response = server.handle_line("{not json").await.unwrap();
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, JsonRpcError::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version() {
        let server = server_with(&FakeHttp::ok(json!({})));
        let response = call(&server, json!({"jsonrpc": "1.0", "id": 8, "method": "ping"})).await;
        assert_eq!(response["id"], 8);
        assert_eq!(response["error"]["code"], JsonRpcError::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_serve_over_streams() {
        let http = FakeHttp::ok(json!({"entities": {"Q1": {"labels": {}, "descriptions": {}}}}));
        let server = server_with(&http);

        let input = [
            json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}).to_string(),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
            String::new(),
            json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "tools/call",
                "params": {"name": "get_metadata", "arguments": {"entity_id": "Q1"}}
            })
            .to_string(),
        ]
        .join("\n")
            + "\n";

        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).await.unwrap();

        let responses: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(responses.len(), 2);
        assert_eq!(by_id(&responses, json!(1))["result"], json!({}));
        assert_eq!(
            by_id(&responses, json!(2))["result"]["structuredContent"],
            json!({"Label": "No label found", "Descriptions": "No label found"})
        );
    }

    async fn serve_bytes(server: &McpServer, input: &[u8]) -> Vec<Value> {
        let mut output = Vec::new();
        server.serve(input, &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn by_id(responses: &[Value], id: Value) -> &Value {
        responses
            .iter()
            .find(|r| r["id"] == id)
            .unwrap_or_else(|| panic!("no response with id {}", id))
    }

    #[tokio::test]
    async fn test_oversized_line_does_not_end_session() {
        let server = server_with(&FakeHttp::ok(json!({}))).with_max_line_bytes(64);

        let mut input = "x".repeat(200);
        input.push('\n');
        input.push_str(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}).to_string());
        input.push('\n');

        let responses = serve_bytes(&server, input.as_bytes()).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(by_id(&responses, Value::Null)["error"]["code"], JsonRpcError::INVALID_REQUEST);
        assert_eq!(by_id(&responses, json!(1))["result"], json!({}));
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_session() {
        let server = server_with(&FakeHttp::ok(json!({})));

        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}).to_string().as_bytes());
        input.push(b'\n');

        let responses = serve_bytes(&server, &input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(by_id(&responses, Value::Null)["error"]["code"], JsonRpcError::PARSE_ERROR);
        assert_eq!(by_id(&responses, json!(1))["result"], json!({}));
    }

    #[tokio::test]
    async fn test_null_id_gets_response() {
        let server = server_with(&FakeHttp::ok(json!({})));
        let response = server
            .handle_line(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)
            .await
            .expect("null id is a request, not a notification");
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.result, Some(json!({})));
    }

    /// Never answers, like a SPARQL query that runs until the service times it out.
    struct StalledHttp;

    #[async_trait::async_trait]
    impl HttpClient for StalledHttp {
        async fn get_json(&self, _query: &RemoteQuery) -> WikidataResult<Value> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_slow_tool_call_does_not_block_other_requests() {
        let client = WikidataClient::new(Arc::new(StalledHttp), WikidataConfig::default());
        let server = McpServer::new(wikidata_registry(client));

        let (mut client_io, server_io) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_io);
        tokio::spawn(async move { server.serve(server_read, server_write).await });

        let call = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": "execute_sparql", "arguments": {"sparql_query": "SELECT * { ?s ?p ?o }"}}
        });
        let ping = json!({"jsonrpc": "2.0", "id": 2, "method": "ping"});
        client_io
            .write_all(format!("{}\n{}\n", call, ping).as_bytes())
            .await
            .unwrap();

        let mut lines = BufReader::new(client_io).lines();
        let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
            .await
            .expect("ping should be answered while the tool call is pending")
            .unwrap()
            .unwrap();

        let response: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(response["id"], 2);
        assert_eq!(response["result"], json!({}));
    }
}
