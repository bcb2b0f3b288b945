pub mod health;
pub mod mcp;
pub mod tools;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.configure(mcp::config).service(
        web::scope("/api/v1")
            .configure(health::config)
            .configure(tools::config),
    );
}
