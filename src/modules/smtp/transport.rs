// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use mail_send::smtp::message::{Address, Message};
use tracing::debug;

use crate::modules::error::OrderResult;
use crate::modules::order::{Envelope, OrderMessage};
use crate::modules::settings::config::OrderConfig;
use crate::modules::smtp::client::Sender;
use crate::modules::smtp::manager::SmtpClientManager;

/// Delivers a composed order to every envelope recipient.
pub(crate) trait Transport {
    async fn transmit(&self, message: &OrderMessage) -> OrderResult<()>;
}

pub struct SmtpTransport {
    manager: SmtpClientManager,
}

impl SmtpTransport {
    pub fn new(config: &OrderConfig) -> Self {
        Self {
            manager: SmtpClientManager::new(config),
        }
    }
}

fn build_message<'a>(envelope: &Envelope, body: &'a [u8]) -> Message<'a> {
    let mut message = Message::empty()
        .body(body)
        .from(Address::from(envelope.sender.clone()));
    for recipient in &envelope.recipients {
        message = message.to(Address::from(recipient.clone()));
    }
    message
}

impl Transport for SmtpTransport {
    async fn transmit(&self, message: &OrderMessage) -> OrderResult<()> {
        let envelope = message.envelope()?;
        let mut client = self.manager.connect().await?;
        debug!(
            "MAIL FROM:<{}> with {} recipient(s)",
            envelope.sender,
            envelope.recipients.len()
        );
        client
            .send_email(build_message(&envelope, &message.raw_data))
            .await?;
        client.quit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_carries_envelope_order() {
        let envelope = Envelope {
            sender: "orders@example.com".into(),
            recipients: vec!["a@x.com".into(), "b@x.com".into(), "c@x.com".into()],
        };
        let message = build_message(&envelope, b"Subject: hi\r\n\r\nhello\r\n");
        assert_eq!(message.mail_from.email, "orders@example.com");
        let rcpt: Vec<&str> = message.rcpt_to.iter().map(|a| a.email.as_ref()).collect();
        assert_eq!(rcpt, vec!["a@x.com", "b@x.com", "c@x.com"]);
        assert_eq!(message.body.as_ref(), b"Subject: hi\r\n\r\nhello\r\n");
    }
}
