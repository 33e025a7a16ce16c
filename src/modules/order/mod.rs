// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use tracing::warn;

use crate::modules::common::Addr;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::OrderResult;
use crate::modules::imap::store::MailboxSession;
use crate::modules::metrics::MAILORDER_SESSION_CLOSE_FAILURES_TOTAL;
use crate::raise_error;

pub mod archive;
pub mod composer;
pub mod draft;
pub mod gate;
pub mod pipeline;
pub mod search;

/// A draft rebuilt for sending, alive for a single pipeline run.
///
/// `raw_data` never carries a Bcc header; Bcc recipients live only in `bcc`
/// and reach the transport as envelope recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderMessage {
    pub from: Vec<Addr>,
    pub to: Vec<Addr>,
    pub cc: Vec<Addr>,
    pub bcc: Vec<Addr>,
    pub message_id: String,
    pub raw_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub sender: String,
    pub recipients: Vec<String>,
}

impl OrderMessage {
    /// MAIL FROM is the first `From` entry only; RCPT TO covers To, then Cc, then Bcc.
    pub fn envelope(&self) -> OrderResult<Envelope> {
        let sender = self.from.first().ok_or_else(|| {
            raise_error!(
                "Draft has no From address to send as".into(),
                ErrorCode::MalformedAddress
            )
        })?;
        let recipients: Vec<String> = self
            .to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(|addr| addr.address.clone())
            .collect();
        if recipients.is_empty() {
            return Err(raise_error!(
                "Draft has no To, Cc or Bcc recipients".into(),
                ErrorCode::MalformedAddress
            ));
        }
        Ok(Envelope {
            sender: sender.address.clone(),
            recipients,
        })
    }
}

/// Logs out a mailbox session. Failures are recorded, never returned.
pub(crate) async fn release<S: MailboxSession>(session: S, stage: &str) {
    if let Err(e) = session.close().await {
        MAILORDER_SESSION_CLOSE_FAILURES_TOTAL.inc();
        warn!("Failed to close {} mailbox session: {}", stage, e);
    }
}
