// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use poem_openapi::payload::Json;
use poem_openapi::{Object, OpenApi};
use tokio::sync::Mutex;

use crate::modules::order::pipeline::{place_order, OrderOutcome};
use crate::modules::rest::api::ApiTags;
use crate::modules::rest::ApiResult;
use crate::modules::settings::config::OrderConfig;

/// Result of a successful order run.
#[derive(Debug, Clone, PartialEq, Eq, Object)]
pub struct OrderReceipt {
    /// `sent` when an order went out, `skipped` while the cooldown window is still open.
    pub outcome: String,
    /// Message-ID of the order that was sent.
    pub message_id: Option<String>,
    /// Number of envelope recipients (To, Cc and Bcc).
    pub recipients: u32,
}

impl From<OrderOutcome> for OrderReceipt {
    fn from(outcome: OrderOutcome) -> Self {
        match outcome {
            OrderOutcome::Sent {
                message_id,
                recipients,
            } => OrderReceipt {
                outcome: "sent".into(),
                message_id: Some(message_id),
                recipients: recipients as u32,
            },
            OrderOutcome::Skipped => OrderReceipt {
                outcome: "skipped".into(),
                message_id: None,
                recipients: 0,
            },
        }
    }
}

pub struct OrderApi {
    config: OrderConfig,
    // One run at a time, so two triggers cannot both pass the cooldown check.
    running: Mutex<()>,
}

impl OrderApi {
    pub fn new(config: OrderConfig) -> Self {
        Self {
            config,
            running: Mutex::new(()),
        }
    }
}

#[OpenApi(prefix_path = "/api/v1", tag = "ApiTags::Order")]
impl OrderApi {
    /// Runs one order cycle.
    ///
    /// Succeeds both when an order was sent and when the cooldown has not elapsed yet.
    /// Any failure in the cooldown check, draft lookup, composition or transmission is
    /// returned as an error with status 500.
    #[oai(method = "post", path = "/order", operation_id = "place_order")]
    async fn place_order(&self) -> ApiResult<Json<OrderReceipt>> {
        let _guard = self.running.lock().await;
        let outcome = place_order(&self.config).await?;
        Ok(Json(outcome.into()))
    }
}
