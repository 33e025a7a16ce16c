// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use poem::{
    http::{Method, StatusCode},
    Endpoint, Request, Response, Result,
};
use prometheus::{default_registry, Encoder, TextEncoder};

pub struct PrometheusEndpoint;

impl Endpoint for PrometheusEndpoint {
    type Output = Response;

    async fn call(&self, req: Request) -> Result<Self::Output> {
        if req.method() != Method::GET {
            return Ok(StatusCode::METHOD_NOT_ALLOWED.into());
        }
        let encoder = TextEncoder::new();
        let metric_families = default_registry().gather();
        let mut result = Vec::new();
        match encoder.encode(&metric_families, &mut result) {
            Ok(()) => Ok(Response::builder()
                .content_type(encoder.format_type())
                .body(result)),
            Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::metrics::{MAILORDER_RUNS_TOTAL, METRIC_RUNS_TOTAL, SENT};
    use poem::test::TestClient;

    #[tokio::test]
    async fn exposes_registered_counters() {
        MAILORDER_RUNS_TOTAL.with_label_values(&[SENT]).inc();
        let client = TestClient::new(PrometheusEndpoint);

        let resp = client.get("/").send().await;
        resp.assert_status_is_ok();
        let body = resp.0.into_body().into_string().await.unwrap();
        assert!(body.contains(METRIC_RUNS_TOTAL));

        let resp = client.post("/").send().await;
        resp.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }
}
