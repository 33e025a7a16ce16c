// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::modules::error::OrderResult;
use crate::modules::imap::store::{MailStore, MailboxSession};
use crate::modules::order::release;
use crate::modules::settings::config::OrderConfig;

/// Result of the cooldown check.
pub(crate) enum Cooldown<S> {
    /// No order inside the window. The sent-mailbox session stays open for archiving.
    Elapsed(S),
    /// An order was sent within the window; the session has already been released.
    Active,
}

pub(crate) async fn can_send<M: MailStore>(
    store: &M,
    config: &OrderConfig,
    now: DateTime<Utc>,
) -> OrderResult<Cooldown<M::Session>> {
    let mut session = store.open().await?;
    match count_recent(&mut session, config, now).await {
        Ok(0) => Ok(Cooldown::Elapsed(session)),
        Ok(recent) => {
            info!(
                "{} order(s) in '{}' within the last {} day(s), nothing to send",
                recent, config.sent_mailbox, config.wait_days
            );
            release(session, "cooldown").await;
            Ok(Cooldown::Active)
        }
        Err(e) => {
            release(session, "cooldown").await;
            Err(e)
        }
    }
}

/// Counts sent messages strictly newer than `now - wait_days`.
async fn count_recent<S: MailboxSession>(
    session: &mut S,
    config: &OrderConfig,
    now: DateTime<Utc>,
) -> OrderResult<usize> {
    session.select(&config.sent_mailbox, false).await?;
    let cutoff = now.checked_sub_signed(config.cooldown()).unwrap_or_else(|| {
        warn!(
            "A cooldown of {} day(s) reaches past the earliest representable date, every sent order counts",
            config.wait_days
        );
        DateTime::<Utc>::MIN_UTC
    });
    // SINCE compares calendar days in the server's zone; widen by a day and filter exactly below.
    // IMAP dates need a four-digit year, so never search before the epoch.
    let since = cutoff
        .date_naive()
        .pred_opt()
        .unwrap_or(cutoff.date_naive())
        .max(NaiveDate::default());
    let candidates = session.search_since(since).await?;
    if candidates.is_empty() {
        return Ok(0);
    }
    let dates = session.fetch_internal_dates(&candidates).await?;
    debug!(
        "{} candidate(s) since {}, filtering against {}",
        candidates.len(),
        since,
        cutoff
    );
    Ok(dates
        .iter()
        .filter(|date| date.is_none_or(|d| d.with_timezone(&Utc) > cutoff))
        .count())
}
