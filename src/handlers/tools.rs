//! REST 形式的工具接口

use actix_web::{http::StatusCode, web, HttpResponse, Result};
use serde_json::Value;

use crate::error::ToolError;
use crate::models::{ApiResponse, ToolDefinition};
use crate::services::StockDataForwarder;
use crate::tools;

pub async fn list_tools() -> Result<HttpResponse> {
    let response = ApiResponse::<Vec<ToolDefinition>>::success(tools::definitions());
    Ok(HttpResponse::Ok().json(response))
}

/// 请求体为工具参数对象，可为空
pub async fn call_tool(
    forwarder: web::Data<StockDataForwarder>,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let name = path.into_inner();

    let arguments = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(e) => {
                let err = ToolError::invalid(format!("请求体不是有效的 JSON: {}", e));
                return Ok(error_response(&err));
            }
        }
    };

    match tools::call_tool(&forwarder, &name, arguments).await {
        Ok(data) => Ok(HttpResponse::Ok().json(ApiResponse::success(data))),
        Err(err) => {
            log::warn!("工具 {} 调用失败 [{}]: {}", name, err.kind(), err);
            Ok(error_response(&err))
        }
    }
}

fn status_for(err: &ToolError) -> StatusCode {
    match err {
        ToolError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        ToolError::UnknownTool(_) => StatusCode::NOT_FOUND,
        ToolError::UpstreamUnavailable(_) | ToolError::UpstreamDataError(_) => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(err: &ToolError) -> HttpResponse {
    HttpResponse::build(status_for(err)).json(ApiResponse::<()>::from_tool_error(err))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tools")
            .route("", web::get().to(list_tools))
            .route("/{name}", web::post().to(call_tool)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;
    use crate::services::source::testing::{code, FakeSource};
    use actix_web::{test, App};
    use serde_json::json;
    use std::sync::Arc;

    async fn call(source: Arc<FakeSource>, req: test::TestRequest) -> (StatusCode, Value) {
        let forwarder = web::Data::new(StockDataForwarder::new(source, ToolsConfig::default()));
        let app = test::init_service(App::new().app_data(forwarder).configure(config)).await;
        let resp = test::call_service(&app, req.to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_web::test]
    async fn test_list_tools() {
        let (status, body) = call(Arc::new(FakeSource::default()), test::TestRequest::get().uri("/tools")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(9));
    }

    #[actix_web::test]
    async fn test_call_tool_success() {
        let source = Arc::new(FakeSource {
            codes: vec![code("华泰证券", "601688")],
            ..Default::default()
        });
        let req = test::TestRequest::post()
            .uri("/tools/get_stock_code")
            .set_json(json!({ "name": "华泰证券" }));
        let (status, body) = call(source, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["stock_code"], "601688");
    }

    #[actix_web::test]
    async fn test_status_mapping() {
        let req = test::TestRequest::post()
            .uri("/tools/get_stock_fhps_detail")
            .set_json(json!({ "stock_code": "12345" }));
        let (status, body) = call(Arc::new(FakeSource::default()), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_kind"], "InvalidArgument");

        let req = test::TestRequest::post().uri("/tools/get_weather");
        let (status, _) = call(Arc::new(FakeSource::default()), req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let source = Arc::new(FakeSource {
            unavailable: true,
            ..Default::default()
        });
        let req = test::TestRequest::post()
            .uri("/tools/get_stock_fhps_detail")
            .set_json(json!({ "stock_code": "600000" }));
        let (status, body) = call(source, req).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error_kind"], "UpstreamUnavailable");
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn test_invalid_json_body() {
        let req = test::TestRequest::post()
            .uri("/tools/get_today_date")
            .set_payload("{oops");
        let (status, _) = call(Arc::new(FakeSource::default()), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
