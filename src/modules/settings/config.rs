// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use chrono::Duration;
use tracing::warn;

use crate::modules::error::{code::ErrorCode, OrderResult};
use crate::modules::order::search::DraftSearch;
use crate::modules::settings::cli::{Encryption, Settings};
use crate::modules::utils::split_host_port;
use crate::raise_error;

pub const DEFAULT_WAIT_DAYS: u32 = 7;
pub const DEFAULT_IMAP_PORT: u16 = 993;
pub const DEFAULT_SMTP_PORT: u16 = 465;
pub const FALLBACK_HOSTNAME: &str = "email-order";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddr {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for ServerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Everything an order run needs, resolved once at start-up and handed to each stage.
#[derive(Clone)]
pub struct OrderConfig {
    pub imap: ServerAddr,
    pub imap_encryption: Encryption,
    pub smtp: ServerAddr,
    pub username: String,
    pub password: String,
    pub sent_mailbox: String,
    pub draft_mailbox: String,
    pub wait_days: u32,
    pub draft_search: DraftSearch,
    pub accept_invalid_certs: bool,
    pub archive_required: bool,
    /// Used for EHLO and as the right-hand side of generated Message-IDs.
    pub hostname: String,
}

// Keeps the password out of logs.
impl fmt::Debug for OrderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderConfig")
            .field("imap", &self.imap)
            .field("imap_encryption", &self.imap_encryption)
            .field("smtp", &self.smtp)
            .field("username", &self.username)
            .field("sent_mailbox", &self.sent_mailbox)
            .field("draft_mailbox", &self.draft_mailbox)
            .field("wait_days", &self.wait_days)
            .field("draft_search", &self.draft_search.to_string())
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("archive_required", &self.archive_required)
            .field("hostname", &self.hostname)
            .finish()
    }
}

impl OrderConfig {
    pub fn from_settings(settings: &Settings) -> OrderResult<Self> {
        let (imap_host, imap_port) =
            split_host_port(&required(&settings.imap_addr, "IMAP_ADDR")?, DEFAULT_IMAP_PORT)?;
        let (smtp_host, smtp_port) =
            split_host_port(&required(&settings.smtp_addr, "SMTP_ADDR")?, DEFAULT_SMTP_PORT)?;

        if settings.mailorder_accept_invalid_certs {
            warn!("TLS certificate verification is disabled for IMAP and SMTP connections");
        }

        Ok(Self {
            imap: ServerAddr {
                host: imap_host,
                port: imap_port,
            },
            imap_encryption: settings.imap_encryption,
            smtp: ServerAddr {
                host: smtp_host,
                port: smtp_port,
            },
            username: required(&settings.mail_user, "MAIL_USER")?,
            password: required(&settings.mail_pass, "MAIL_PASS")?,
            sent_mailbox: required(&settings.sent_mbox, "SENT_MBOX")?,
            draft_mailbox: required(&settings.draft_mbox, "DRAFT_MBOX")?,
            wait_days: parse_wait_days(settings.wait_days.as_deref()),
            draft_search: DraftSearch::from_config(settings.draft_search.as_deref()),
            accept_invalid_certs: settings.mailorder_accept_invalid_certs,
            archive_required: settings.mailorder_archive_required,
            hostname: local_hostname(),
        })
    }

    pub fn cooldown(&self) -> Duration {
        Duration::days(self.wait_days as i64)
    }
}

fn required(value: &Option<String>, name: &str) -> OrderResult<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| {
            raise_error!(
                format!("Missing required configuration value {}", name),
                ErrorCode::MissingConfiguration
            )
        })
}

pub fn parse_wait_days(value: Option<&str>) -> u32 {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => DEFAULT_WAIT_DAYS,
        Some(raw) => raw.parse::<u32>().unwrap_or_else(|_| {
            warn!(
                "WAIT_DAYS value '{}' is not a number of days, using {}",
                raw, DEFAULT_WAIT_DAYS
            );
            DEFAULT_WAIT_DAYS
        }),
    }
}

pub fn local_hostname() -> String {
    gethostname::gethostname()
        .into_string()
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| FALLBACK_HOSTNAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_test_settings() {
        let config = OrderConfig::from_settings(&Settings::new_for_test()).unwrap();
        assert_eq!(
            config.imap,
            ServerAddr {
                host: "imap.example.com".into(),
                port: 993
            }
        );
        assert_eq!(config.smtp.to_string(), "smtp.example.com:465");
        assert_eq!(config.wait_days, DEFAULT_WAIT_DAYS);
        assert_eq!(config.draft_search, DraftSearch::match_all());
        assert_eq!(config.cooldown(), Duration::days(7));
        assert!(!config.hostname.is_empty());
        assert!(!format!("{:?}", config).contains("secret"));
    }

    #[test]
    fn missing_values_are_reported() {
        let mut settings = Settings::new_for_test();
        settings.sent_mbox = None;
        let error = OrderConfig::from_settings(&settings).unwrap_err();
        assert_eq!(error.code(), ErrorCode::MissingConfiguration);

        let mut settings = Settings::new_for_test();
        settings.smtp_addr = Some("smtp.example.com:port".into());
        let error = OrderConfig::from_settings(&settings).unwrap_err();
        assert_eq!(error.code(), ErrorCode::InvalidParameter);
    }

    #[test]
    fn wait_days_defaults() {
        assert_eq!(parse_wait_days(None), 7);
        assert_eq!(parse_wait_days(Some("")), 7);
        assert_eq!(parse_wait_days(Some("three")), 7);
        assert_eq!(parse_wait_days(Some("-2")), 7);
        assert_eq!(parse_wait_days(Some(" 14 ")), 14);
        assert_eq!(parse_wait_days(Some("0")), 0);
    }

    #[test]
    fn malformed_search_never_fails_configuration() {
        let mut settings = Settings::new_for_test();
        settings.draft_search = Some("SUBJECT".into());
        let config = OrderConfig::from_settings(&settings).unwrap();
        assert_eq!(config.draft_search, DraftSearch::match_all());
    }
}
