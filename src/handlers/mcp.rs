//! MCP 协议入口
//!
//! 单个 POST /mcp 端点接收 JSON-RPC 2.0 消息（Streamable HTTP 的无会话形式）

use actix_web::{web, HttpResponse, Result};
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::models::{
    CallToolParams, CallToolResult, JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR,
    INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION, MCP_PROTOCOL_VERSION, METHOD_NOT_FOUND, PARSE_ERROR,
};
use crate::services::StockDataForwarder;
use crate::tools;

pub async fn handle_rpc(
    forwarder: web::Data<StockDataForwarder>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let message: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            let response = JsonRpcResponse::error(Value::Null, PARSE_ERROR, format!("JSON 解析失败: {}", e));
            return Ok(HttpResponse::Ok().json(response));
        }
    };

    if message.is_array() {
        let response = JsonRpcResponse::error(Value::Null, INVALID_REQUEST, "不支持批量请求");
        return Ok(HttpResponse::Ok().json(response));
    }

    let id = message.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(message) {
        Ok(request) => request,
        Err(e) => {
            let response = JsonRpcResponse::error(id, INVALID_REQUEST, format!("无效的请求: {}", e));
            return Ok(HttpResponse::Ok().json(response));
        }
    };
    if request.jsonrpc != JSONRPC_VERSION {
        let response = JsonRpcResponse::error(id, INVALID_REQUEST, "jsonrpc 必须为 \"2.0\"");
        return Ok(HttpResponse::Ok().json(response));
    }

    if request.is_notification() {
        log::debug!("收到通知 {}", request.method);
        return Ok(HttpResponse::Accepted().finish());
    }

    let response = dispatch(&forwarder, request).await;
    Ok(HttpResponse::Ok().json(response))
}

/// 处理带 id 的请求
pub async fn dispatch(forwarder: &StockDataForwarder, request: JsonRpcRequest) -> JsonRpcResponse {
    let id = request.id.unwrap_or(Value::Null);

    match request.method.as_str() {
        "initialize" => JsonRpcResponse::result(
            id,
            json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        ),
        "ping" => JsonRpcResponse::result(id, json!({})),
        "tools/list" => JsonRpcResponse::result(id, json!({ "tools": tools::definitions() })),
        "tools/call" => {
            let params: CallToolParams = match serde_json::from_value(request.params) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(id, INVALID_PARAMS, format!("tools/call 参数无效: {}", e))
                }
            };
            call(forwarder, id, params).await
        }
        method => JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("未知方法: {}", method)),
    }
}

async fn call(forwarder: &StockDataForwarder, id: Value, params: CallToolParams) -> JsonRpcResponse {
    let result = match tools::call_tool(forwarder, &params.name, params.arguments).await {
        Ok(Value::String(text)) => CallToolResult::text(text, false),
        Ok(value) => CallToolResult::text(value.to_string(), false),
        Err(err @ ToolError::UnknownTool(_)) => {
            return JsonRpcResponse::error(id, INVALID_PARAMS, err.to_string());
        }
        Err(err) => {
            log::warn!("工具 {} 调用失败 [{}]: {}", params.name, err.kind(), err);
            CallToolResult::text(err.to_string(), true)
        }
    };

    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::result(id, value),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/mcp", web::post().to(handle_rpc));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;
    use crate::services::source::testing::{bar, FakeSource};
    use actix_web::{http::StatusCode, test, App};
    use std::sync::Arc;

    fn app_data(source: Arc<FakeSource>) -> web::Data<StockDataForwarder> {
        web::Data::new(StockDataForwarder::new(source, ToolsConfig::default()))
    }

    async fn post(source: Arc<FakeSource>, body: &str) -> (StatusCode, Value) {
        let app = test::init_service(App::new().app_data(app_data(source)).configure(config)).await;
        let req = test::TestRequest::post()
            .uri("/mcp")
            .insert_header(("Content-Type", "application/json"))
            .set_payload(body.to_string())
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let bytes = test::read_body(resp).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[actix_web::test]
    async fn test_initialize() {
        let (status, body) = post(
            Arc::new(FakeSource::default()),
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"0"}}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"]["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert!(body["result"]["capabilities"]["tools"].is_object());
    }

    #[actix_web::test]
    async fn test_notification_is_accepted() {
        let (status, body) = post(
            Arc::new(FakeSource::default()),
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body.is_null());
    }

    #[actix_web::test]
    async fn test_tools_list() {
        let (_, body) = post(
            Arc::new(FakeSource::default()),
            r#"{"jsonrpc":"2.0","id":"a","method":"tools/list"}"#,
        )
        .await;
        let tools = body["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 9);
        assert!(tools.iter().all(|t| t["inputSchema"].is_object()));
    }

    #[actix_web::test]
    async fn test_tools_call_success() {
        let source = Arc::new(FakeSource {
            bars: vec![bar("2023-01-03", 14.1)],
            ..Default::default()
        });
        let (_, body) = post(
            source,
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"get_historical_stockprice_data","arguments":{"stock_code":"601688","start_date":"20230101","end_date":"20231001"}}}"#,
        )
        .await;
        assert_eq!(body["result"]["isError"], false);
        let text = body["result"]["content"][0]["text"].as_str().unwrap();
        let records: Value = serde_json::from_str(text).unwrap();
        assert_eq!(records[0]["close"], 14.1);
    }

    #[actix_web::test]
    async fn test_tools_call_failure_sets_is_error() {
        let source = Arc::new(FakeSource::default());
        let (_, body) = post(
            source.clone(),
            r#"{"jsonrpc":"2.0","id":8,"method":"tools/call","params":{"name":"get_historical_stockprice_data","arguments":{"stock_code":"601688","start_date":"20231001","end_date":"20230101"}}}"#,
        )
        .await;
        assert_eq!(body["result"]["isError"], true);
        assert!(body["result"]["content"][0]["text"].as_str().unwrap().contains("参数无效"));
        assert!(source.calls().is_empty());
    }

    #[actix_web::test]
    async fn test_protocol_errors() {
        let source = Arc::new(FakeSource::default());

        let (_, body) = post(source.clone(), "{not json").await;
        assert_eq!(body["error"]["code"], PARSE_ERROR);

        let (_, body) = post(source.clone(), r#"[{"jsonrpc":"2.0","id":1,"method":"ping"}]"#).await;
        assert_eq!(body["error"]["code"], INVALID_REQUEST);

        let (_, body) = post(source.clone(), r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#).await;
        assert_eq!(body["error"]["code"], METHOD_NOT_FOUND);

        let (_, body) = post(
            source.clone(),
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"get_weather"}}"#,
        )
        .await;
        assert_eq!(body["error"]["code"], INVALID_PARAMS);

        let (_, body) = post(source, r#"{"jsonrpc":"1.0","id":4,"method":"ping"}"#).await;
        assert_eq!(body["error"]["code"], INVALID_REQUEST);
        assert_eq!(body["id"], 4);
    }

    #[actix_web::test]
    async fn test_null_id_gets_response() {
        let (status, body) = post(
            Arc::new(FakeSource::default()),
            r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["id"].is_null());
        assert_eq!(body["result"], json!({}));
    }

    #[actix_web::test]
    async fn test_ping() {
        let (_, body) = post(Arc::new(FakeSource::default()), r#"{"jsonrpc":"2.0","id":5,"method":"ping"}"#).await;
        assert_eq!(body["result"], json!({}));
    }
}
