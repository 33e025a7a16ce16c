// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Instant;

use chrono::{Local, Utc};
use rand::rngs::StdRng;
use rand::RngCore;
use tracing::{info, warn};

use crate::modules::error::OrderResult;
use crate::modules::imap::store::{ImapMailStore, MailStore};
use crate::modules::metrics::{
    FAILED, MAILORDER_ARCHIVE_FAILURES_TOTAL, MAILORDER_EMAIL_SENT_BYTES,
    MAILORDER_RUNS_TOTAL, MAILORDER_RUN_DURATION_SECONDS, SENT, SKIPPED,
};
use crate::modules::order::archive::save_sent;
use crate::modules::order::composer::MessageComposer;
use crate::modules::order::draft::get_draft;
use crate::modules::order::gate::{can_send, Cooldown};
use crate::modules::order::release;
use crate::modules::settings::config::OrderConfig;
use crate::modules::smtp::transport::{SmtpTransport, Transport};
use crate::modules::smtp::util::MessageIdGenerator;

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    /// The order went out to `recipients` envelope addresses.
    Sent {
        message_id: String,
        recipients: usize,
    },
    /// The cooldown window has not elapsed yet.
    Skipped,
}

pub struct OrderPipeline<M, T, R> {
    config: OrderConfig,
    store: M,
    transport: T,
    composer: MessageComposer<R>,
}

impl OrderPipeline<ImapMailStore, SmtpTransport, StdRng> {
    pub fn new(config: OrderConfig) -> Self {
        let store = ImapMailStore::new(&config);
        let transport = SmtpTransport::new(&config);
        let composer = MessageComposer::new(MessageIdGenerator::from_os_rng(
            config.hostname.clone(),
        ));
        Self::with_parts(config, store, transport, composer)
    }
}

/// Runs one order cycle against the configured IMAP and SMTP servers.
pub async fn place_order(config: &OrderConfig) -> OrderResult<OrderOutcome> {
    OrderPipeline::new(config.clone()).place_order().await
}

impl<M: MailStore, T: Transport, R: RngCore> OrderPipeline<M, T, R> {
    pub(crate) fn with_parts(
        config: OrderConfig,
        store: M,
        transport: T,
        composer: MessageComposer<R>,
    ) -> Self {
        Self {
            config,
            store,
            transport,
            composer,
        }
    }

    pub async fn place_order(&mut self) -> OrderResult<OrderOutcome> {
        let start = Instant::now();
        let result = self.run().await;
        MAILORDER_RUN_DURATION_SECONDS.observe(start.elapsed().as_secs_f64());
        let outcome = match &result {
            Ok(OrderOutcome::Sent { .. }) => SENT,
            Ok(OrderOutcome::Skipped) => SKIPPED,
            Err(_) => FAILED,
        };
        MAILORDER_RUNS_TOTAL.with_label_values(&[outcome]).inc();
        result
    }

    async fn run(&mut self) -> OrderResult<OrderOutcome> {
        let mut sent_session = match can_send(&self.store, &self.config, Utc::now()).await? {
            Cooldown::Active => return Ok(OrderOutcome::Skipped),
            Cooldown::Elapsed(session) => session,
        };
        info!(
            "Cooldown of {} day(s) elapsed, placing order",
            self.config.wait_days
        );
        let result = self.deliver(&mut sent_session).await;
        release(sent_session, "sent").await;
        result
    }

    async fn deliver(&mut self, sent_session: &mut M::Session) -> OrderResult<OrderOutcome> {
        let raw = get_draft(&self.store, &self.config).await?;
        let message = self.composer.create_msg(&raw)?;
        let envelope = message.envelope()?;
        info!(
            "Composed {} from {} for {} recipient(s)",
            message.message_id,
            envelope.sender,
            envelope.recipients.len()
        );

        if let Err(e) = save_sent(
            sent_session,
            &self.config,
            &message,
            Local::now().fixed_offset(),
        )
        .await
        {
            MAILORDER_ARCHIVE_FAILURES_TOTAL.inc();
            if self.config.archive_required {
                return Err(e);
            }
            warn!("Sending without a sent-mailbox copy: {}", e);
        }

        self.transport.transmit(&message).await?;
        MAILORDER_EMAIL_SENT_BYTES.inc_by(message.raw_data.len() as u64);
        info!("Order {} sent", message.message_id);
        Ok(OrderOutcome::Sent {
            message_id: message.message_id,
            recipients: envelope.recipients.len(),
        })
    }
}
