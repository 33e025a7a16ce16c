// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::code::ErrorCode;
use crate::modules::error::handler::error_handler;
use crate::modules::error::OrderResult;
use crate::modules::metrics::endpoint::PrometheusEndpoint;
use crate::modules::settings::config::OrderConfig;
use crate::modules::{settings::cli::SETTINGS, utils::shutdown::shutdown_signal};

use super::error::ApiErrorResponse;
use crate::raise_error;
use api::create_openapi_service;
use poem::listener::TcpListener;
use poem::middleware::{CatchPanic, Tracing};
use poem::{Endpoint, EndpointExt, Route, Server};
use std::time::Duration;
use tracing::info;

pub mod api;

pub type ApiResult<T, E = ApiErrorResponse> = std::result::Result<T, E>;

const DESCRIPTION: &str = r#"
    Triggers the mail order pipeline over HTTP.

    - `POST /api/v1/order` runs one cycle and answers 200 whether an order was sent or the cooldown is still running.
    - Failures answer 500 with an error code and message.
"#;

pub fn create_route(config: OrderConfig) -> impl Endpoint {
    let api_service = create_openapi_service(config)
        .description(DESCRIPTION)
        .summary("Scheduled re-sending of a template order email");

    let swagger = api_service.swagger_ui();
    let spec_json = api_service.spec_endpoint();

    Route::new()
        .nest("/api-docs/swagger", swagger)
        .nest("/api-docs/spec.json", spec_json)
        .nest("/metrics", PrometheusEndpoint)
        .nest_no_strip("/api/v1", api_service.with(Tracing))
        .with(CatchPanic::new())
        .catch_all_error(error_handler)
}

pub async fn start_http_server(config: OrderConfig) -> OrderResult<()> {
    let listener = TcpListener::bind((
        SETTINGS.mailorder_bind_ip.clone(),
        SETTINGS.mailorder_http_port,
    ));

    let server = Server::new(listener)
        .name("MailOrder Trigger Service")
        .idle_timeout(Duration::from_secs(60))
        .run_with_graceful_shutdown(
            create_route(config),
            shutdown_signal(),
            Some(Duration::from_secs(5)),
        );
    info!(
        "MailOrder trigger service is now running on {}:{}.",
        SETTINGS.mailorder_bind_ip, SETTINGS.mailorder_http_port
    );
    server
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::settings::cli::{Encryption, Settings};
    use poem::http::StatusCode;
    use poem::test::TestClient;

    fn unreachable_config() -> OrderConfig {
        let mut settings = Settings::new_for_test();
        settings.imap_addr = Some("127.0.0.1:1".into());
        settings.imap_encryption = Encryption::None;
        OrderConfig::from_settings(&settings).unwrap()
    }

    #[tokio::test]
    async fn failed_run_maps_to_500() {
        let client = TestClient::new(create_route(unreachable_config()));
        let resp = client.post("/api/v1/order").send().await;
        resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let json = resp.json().await;
        json.value()
            .object()
            .get("code")
            .assert_i64(ErrorCode::NetworkError as i64);
    }

    #[tokio::test]
    async fn wrong_method_is_rejected() {
        let client = TestClient::new(create_route(unreachable_config()));
        let resp = client.get("/api/v1/order").send().await;
        resp.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn metrics_are_served() {
        let client = TestClient::new(create_route(unreachable_config()));
        client.get("/metrics").send().await.assert_status_is_ok();
    }
}
