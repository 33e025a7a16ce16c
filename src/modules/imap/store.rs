// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::pin::pin;

use async_imap::types::Fetch;
use async_imap::Session as ImapSession;
use chrono::{DateTime, FixedOffset, NaiveDate};
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::modules::error::code::ErrorCode;
use crate::modules::error::OrderResult;
use crate::modules::imap::client::Client;
use crate::modules::imap::session::SessionStream;
use crate::modules::order::search::DraftSearch;
use crate::modules::settings::cli::Encryption;
use crate::modules::settings::config::{OrderConfig, ServerAddr};
use crate::raise_error;

const INTERNALDATE_QUERY: &str = "(INTERNALDATE)";
const BODY_FETCH_COMMAND: &str = "(UID BODY.PEEK[])";

/// Opens authenticated mailbox sessions against the mail store.
pub(crate) trait MailStore {
    type Session: MailboxSession;

    async fn open(&self) -> OrderResult<Self::Session>;
}

/// One logged-in conversation with the mail store.
///
/// Every session handed out by a [`MailStore`] must end with [`MailboxSession::close`],
/// on success and failure paths alike.
pub(crate) trait MailboxSession {
    async fn select(&mut self, mailbox: &str, read_only: bool) -> OrderResult<()>;

    /// Sequence numbers of messages whose internal date falls on or after `day`.
    async fn search_since(&mut self, day: NaiveDate) -> OrderResult<Vec<u32>>;

    /// Internal dates of the given sequence numbers, `None` where the server sent none.
    async fn fetch_internal_dates(
        &mut self,
        sequence_numbers: &[u32],
    ) -> OrderResult<Vec<Option<DateTime<FixedOffset>>>>;

    async fn uid_search(&mut self, search: &DraftSearch) -> OrderResult<Vec<u32>>;

    async fn uid_fetch_body(&mut self, uid: u32) -> OrderResult<Vec<u8>>;

    async fn append(
        &mut self,
        mailbox: &str,
        flags: &[&str],
        internal_date: DateTime<FixedOffset>,
        content: &[u8],
    ) -> OrderResult<()>;

    async fn close(self) -> OrderResult<()>;
}

/// Drains a fetch response stream to the end before reporting its outcome.
///
/// The first error is remembered but the stream is still consumed, so the
/// connection is left positioned after the tagged completion line.
pub(crate) async fn drain_fetch<T, E, S>(stream: S) -> OrderResult<Vec<T>>
where
    S: Stream<Item = Result<T, E>>,
    E: std::fmt::Debug,
{
    let mut stream = pin!(stream);
    let mut items = Vec::new();
    let mut first_error = None;
    while let Some(item) = stream.next().await {
        match item {
            Ok(item) => items.push(item),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    match first_error {
        Some(e) => Err(raise_error!(
            format!("{:#?}", e),
            ErrorCode::ImapCommandFailed
        )),
        None => Ok(items),
    }
}

pub struct ImapMailStore {
    server: ServerAddr,
    encryption: Encryption,
    accept_invalid_certs: bool,
    username: String,
    password: String,
}

impl ImapMailStore {
    pub fn new(config: &OrderConfig) -> Self {
        Self {
            server: config.imap.clone(),
            encryption: config.imap_encryption,
            accept_invalid_certs: config.accept_invalid_certs,
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

impl MailStore for ImapMailStore {
    type Session = ImapMailboxSession;

    async fn open(&self) -> OrderResult<Self::Session> {
        let client = Client::connection(
            &self.server.host,
            self.encryption,
            self.server.port,
            self.accept_invalid_certs,
        )
        .await?;
        let session = client.login(&self.username, &self.password).await?;
        debug!("IMAP session opened to {} as {}", self.server, self.username);
        Ok(ImapMailboxSession { inner: session })
    }
}

pub struct ImapMailboxSession {
    inner: ImapSession<Box<dyn SessionStream>>,
}

impl MailboxSession for ImapMailboxSession {
    async fn select(&mut self, mailbox: &str, read_only: bool) -> OrderResult<()> {
        let result = if read_only {
            self.inner.examine(mailbox).await
        } else {
            self.inner.select(mailbox).await
        };
        let mailbox_state =
            result.map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
        debug!(
            "Selected mailbox '{}' (read_only={}, exists={})",
            mailbox, read_only, mailbox_state.exists
        );
        Ok(())
    }

    async fn search_since(&mut self, day: NaiveDate) -> OrderResult<Vec<u32>> {
        let query = format!("SINCE {}", day.format("%d-%b-%Y"));
        let found = self
            .inner
            .search(&query)
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
        let mut found: Vec<u32> = found.into_iter().collect();
        found.sort_unstable();
        Ok(found)
    }

    async fn fetch_internal_dates(
        &mut self,
        sequence_numbers: &[u32],
    ) -> OrderResult<Vec<Option<DateTime<FixedOffset>>>> {
        if sequence_numbers.is_empty() {
            return Ok(Vec::new());
        }
        let sequence_set = sequence_numbers
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let stream = self
            .inner
            .fetch(&sequence_set, INTERNALDATE_QUERY)
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
        let fetches: Vec<Fetch> = drain_fetch(stream).await?;
        Ok(fetches.iter().map(Fetch::internal_date).collect())
    }

    async fn uid_search(&mut self, search: &DraftSearch) -> OrderResult<Vec<u32>> {
        let query = search.to_string();
        let found = self
            .inner
            .uid_search(&query)
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
        let mut found: Vec<u32> = found.into_iter().collect();
        found.sort_unstable();
        Ok(found)
    }

    async fn uid_fetch_body(&mut self, uid: u32) -> OrderResult<Vec<u8>> {
        let stream = self
            .inner
            .uid_fetch(uid.to_string(), BODY_FETCH_COMMAND)
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))?;
        let fetches: Vec<Fetch> = drain_fetch(stream).await?;
        fetches
            .iter()
            .filter(|fetch| fetch.uid.is_none_or(|u| u == uid))
            .find_map(|fetch| fetch.body().map(<[u8]>::to_vec))
            .ok_or_else(|| {
                raise_error!(
                    format!("Server returned no body for message UID {}", uid),
                    ErrorCode::ImapUnexpectedResult
                )
            })
    }

    async fn append(
        &mut self,
        mailbox: &str,
        flags: &[&str],
        internal_date: DateTime<FixedOffset>,
        content: &[u8],
    ) -> OrderResult<()> {
        let flags = format!("({})", flags.join(" "));
        let internal_date = format!("\"{}\"", internal_date.format("%d-%b-%Y %H:%M:%S %z"));
        self.inner
            .append(mailbox, Some(flags.as_str()), Some(internal_date.as_str()), content)
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))
    }

    async fn close(mut self) -> OrderResult<()> {
        self.inner
            .logout()
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::ImapCommandFailed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn drain_fetch_collects_every_item() {
        let items = drain_fetch(stream::iter(vec![Ok::<_, String>(1), Ok(2), Ok(3)]))
            .await
            .unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn drain_fetch_consumes_stream_before_reporting_error() {
        let mut polled = 0;
        let source = stream::iter(vec![Ok(1), Err("boom"), Ok(2), Err("later")]).inspect(|_| {
            polled += 1;
        });
        let error = drain_fetch(source).await.unwrap_err();
        assert_eq!(polled, 4);
        assert_eq!(error.code(), ErrorCode::ImapCommandFailed);
        assert!(error.to_string().contains("boom"));
    }
}
