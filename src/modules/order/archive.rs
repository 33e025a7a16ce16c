// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::{DateTime, FixedOffset};

use crate::modules::error::code::ErrorCode;
use crate::modules::error::OrderResult;
use crate::modules::imap::store::MailboxSession;
use crate::modules::order::OrderMessage;
use crate::modules::settings::config::OrderConfig;
use crate::raise_error;

pub const SEEN_FLAG: &str = "\\Seen";

/// Appends the composed order to the sent mailbox, already marked seen.
pub(crate) async fn save_sent<S: MailboxSession>(
    session: &mut S,
    config: &OrderConfig,
    message: &OrderMessage,
    now: DateTime<FixedOffset>,
) -> OrderResult<()> {
    session
        .append(&config.sent_mailbox, &[SEEN_FLAG], now, &message.raw_data)
        .await
        .map_err(|e| {
            raise_error!(
                format!(
                    "Failed to archive {} in '{}': {}",
                    message.message_id, config.sent_mailbox, e
                ),
                ErrorCode::ArchiveFailed
            )
        })
}
