// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use tracing::{debug, info};

use crate::modules::error::code::ErrorCode;
use crate::modules::error::OrderResult;
use crate::modules::imap::store::{MailStore, MailboxSession};
use crate::modules::order::release;
use crate::modules::settings::config::OrderConfig;
use crate::raise_error;

/// Fetches the raw template draft. The session is released before returning.
pub(crate) async fn get_draft<M: MailStore>(store: &M, config: &OrderConfig) -> OrderResult<Vec<u8>> {
    let mut session = store.open().await?;
    let result = locate(&mut session, config).await;
    release(session, "draft").await;
    result
}

async fn locate<S: MailboxSession>(session: &mut S, config: &OrderConfig) -> OrderResult<Vec<u8>> {
    session.select(&config.draft_mailbox, true).await?;
    let uids = session.uid_search(&config.draft_search).await?;
    // Lowest UID is the oldest matching draft.
    let uid = uids.iter().min().copied().ok_or_else(|| {
        raise_error!(
            format!(
                "No draft in '{}' matches '{}'",
                config.draft_mailbox, config.draft_search
            ),
            ErrorCode::NoDraftFound
        )
    })?;
    if uids.len() > 1 {
        info!(
            "{} drafts match '{}', using UID {}",
            uids.len(),
            config.draft_search,
            uid
        );
    }
    let body = session.uid_fetch_body(uid).await?;
    debug!("Fetched draft UID {} ({} bytes)", uid, body.len());
    Ok(body)
}
