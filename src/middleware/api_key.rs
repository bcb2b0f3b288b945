//! API Key 认证中间件
//!
//! 支持 `Authorization: Bearer <key>` 或 `X-API-Key: <key>` 两种方式。
//! 未配置 API Key 时不做认证；健康检查接口始终放行

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpResponse,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use serde_json::Value;
use std::rc::Rc;

use crate::models::{ApiResponse, JsonRpcResponse, UNAUTHORIZED};

const UNAUTHORIZED_MESSAGE: &str = "缺少或无效的 API Key";

/// API Key 中间件
pub struct ApiKeyMiddleware {
    api_key: Rc<String>,
}

impl ApiKeyMiddleware {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key: Rc::new(api_key),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = ApiKeyMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ApiKeyMiddlewareService {
            service: Rc::new(service),
            api_key: self.api_key.clone(),
        })
    }
}

pub struct ApiKeyMiddlewareService<S> {
    service: Rc<S>,
    api_key: Rc<String>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let api_key = self.api_key.clone();

        Box::pin(async move {
            if api_key.is_empty() || req.path().ends_with("/health") {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            let headers = req.headers();
            let bearer = headers
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "));
            let header_key = headers.get("X-API-Key").and_then(|v| v.to_str().ok());

            let authorized = [bearer, header_key]
                .into_iter()
                .flatten()
                .any(|key| key.trim() == api_key.as_str());

            if authorized {
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            }

            log::warn!("拒绝未认证请求 {} {}", req.method(), req.path());
            let response = if req.path().starts_with("/mcp") {
                HttpResponse::Unauthorized().json(JsonRpcResponse::error(
                    Value::Null,
                    UNAUTHORIZED,
                    UNAUTHORIZED_MESSAGE,
                ))
            } else {
                HttpResponse::Unauthorized()
                    .json(ApiResponse::<()>::error(UNAUTHORIZED_MESSAGE.to_string()))
            };
            Ok(req.into_response(response).map_into_right_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App};

    async fn ok_handler() -> HttpResponse {
        HttpResponse::Ok().body("ok")
    }

    async fn status_for(api_key: &str, req: test::TestRequest) -> (StatusCode, actix_web::web::Bytes) {
        let app = test::init_service(
            App::new()
                .wrap(ApiKeyMiddleware::new(api_key.to_string()))
                .route("/mcp", web::post().to(ok_handler))
                .route("/api/v1/health", web::get().to(ok_handler))
                .route("/api/v1/tools", web::get().to(ok_handler)),
        )
        .await;
        let resp = test::call_service(&app, req.to_request()).await;
        let status = resp.status();
        (status, test::read_body(resp).await)
    }

    #[actix_web::test]
    async fn test_empty_key_disables_auth() {
        let (status, _) = status_for("", test::TestRequest::get().uri("/api/v1/tools")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_health_is_exempt() {
        let (status, _) = status_for("secret", test::TestRequest::get().uri("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_accepts_bearer_and_header_key() {
        let req = test::TestRequest::get()
            .uri("/api/v1/tools")
            .insert_header(("Authorization", "Bearer secret"));
        assert_eq!(status_for("secret", req).await.0, StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/mcp")
            .insert_header(("X-API-Key", "secret"));
        assert_eq!(status_for("secret", req).await.0, StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_rejection_bodies() {
        let req = test::TestRequest::post()
            .uri("/mcp")
            .insert_header(("Authorization", "Bearer wrong"));
        let (status, body) = status_for("secret", req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], UNAUTHORIZED);

        let (status, body) = status_for("secret", test::TestRequest::get().uri("/api/v1/tools")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], false);
    }
}
