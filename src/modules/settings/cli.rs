// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use clap::{builder::ValueParser, Parser, ValueEnum};
use std::{path::PathBuf, sync::LazyLock};

#[cfg(not(test))]
pub static SETTINGS: LazyLock<Settings> = LazyLock::new(Settings::parse);

#[cfg(test)]
pub static SETTINGS: LazyLock<Settings> = LazyLock::new(Settings::new_for_test);

#[derive(Debug, Parser)]
#[clap(
    name = "mailorder",
    about = "Re-sends a template draft as a fresh order email once the cooldown since the last sent order has elapsed.",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Settings {
    /// IMAP server address, `host[:port]` (port defaults to 993)
    #[clap(long, env = "IMAP_ADDR", help = "IMAP server address as host[:port]")]
    pub imap_addr: Option<String>,

    #[clap(
        long,
        env = "IMAP_ENCRYPTION",
        default_value = "ssl",
        help = "Transport security for the IMAP connection (ssl, starttls, none)"
    )]
    pub imap_encryption: Encryption,

    /// SMTP submission server address, `host[:port]` (port defaults to 465)
    #[clap(long, env = "SMTP_ADDR", help = "SMTP server address as host[:port]")]
    pub smtp_addr: Option<String>,

    #[clap(long, env = "MAIL_USER", help = "Account user name for IMAP and SMTP")]
    pub mail_user: Option<String>,

    #[clap(
        long,
        env = "MAIL_PASS",
        hide_env_values = true,
        help = "Account password for IMAP and SMTP"
    )]
    pub mail_pass: Option<String>,

    #[clap(long, env = "SENT_MBOX", help = "Mailbox holding sent orders")]
    pub sent_mbox: Option<String>,

    #[clap(long, env = "DRAFT_MBOX", help = "Mailbox holding the order template draft")]
    pub draft_mbox: Option<String>,

    /// Cooldown in days. Kept as raw text so that an unparseable value falls back to the default
    /// instead of aborting start-up.
    #[clap(
        long,
        env = "WAIT_DAYS",
        help = "Minimum number of days between two orders (default: 7)"
    )]
    pub wait_days: Option<String>,

    /// IMAP search keys selecting the template draft, e.g. `SUBJECT "weekly order"`.
    #[clap(
        long,
        env = "DRAFT_SEARCH",
        help = "IMAP search keys used to find the template draft (default: UID 1:*)"
    )]
    pub draft_search: Option<String>,

    #[clap(
        long,
        default_value = "false",
        env,
        help = "Skip TLS certificate verification for IMAP and SMTP. Only for servers with self-signed certificates"
    )]
    pub mailorder_accept_invalid_certs: bool,

    #[clap(
        long,
        default_value = "false",
        env,
        help = "Abort the order when the copy cannot be stored in the sent mailbox"
    )]
    pub mailorder_archive_required: bool,

    /// mailorder log level (default: "info")
    #[clap(
        long,
        default_value = "info",
        env,
        help = "Set the log level for mailorder"
    )]
    pub mailorder_log_level: String,

    /// Enable ANSI logs (default: true)
    #[clap(long, default_value = "true", env, help = "Enable ANSI formatted logs")]
    pub mailorder_ansi_logs: bool,

    /// Enable JSON logs (default: false)
    #[clap(
        long,
        default_value = "false",
        env,
        help = "Enable JSON formatted logs"
    )]
    pub mailorder_json_logs: bool,

    /// Enable log file output (default: false)
    /// If false, logs will be printed to stdout
    #[clap(
        long,
        default_value = "false",
        env,
        help = "Enable log file output (otherwise logs go to stdout)"
    )]
    pub mailorder_log_to_file: bool,

    #[clap(
        long,
        env,
        help = "Directory for rolling log files, required with --mailorder-log-to-file",
        value_parser = ValueParser::new(|s: &str| {
            let path = PathBuf::from(s);
            if !path.exists() {
                return Err(format!("Log directory {:?} does not exist", path));
            }
            if !path.is_dir() {
                return Err(format!("Log path {:?} is not a directory", path));
            }
            Ok(path)
        })
    )]
    pub mailorder_log_dir: Option<PathBuf>,

    /// Maximum number of log files (default: 5)
    #[clap(
        long,
        default_value = "5",
        env,
        help = "Set the maximum number of log files to keep"
    )]
    pub mailorder_max_log_files: usize,

    #[clap(
        long,
        default_value = "false",
        env,
        help = "Run as an HTTP trigger service instead of placing a single order and exiting"
    )]
    pub mailorder_serve: bool,

    #[clap(
        long,
        env,
        default_value = "0.0.0.0",
        help = "The IPv4 address the HTTP trigger binds to",
        value_parser = ValueParser::new(|s: &str| {
            if s.parse::<std::net::Ipv4Addr>().is_err() {
                return Err("The bind IP address must be a valid IPv4 address.".to_string());
            }
            Ok(s.to_string())
        })
    )]
    pub mailorder_bind_ip: String,

    /// mailorder HTTP port (default: 15640)
    #[clap(
        long,
        default_value = "15640",
        env,
        help = "Set the HTTP port for the trigger service"
    )]
    pub mailorder_http_port: u16,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum Encryption {
    /// SSL/TLS encrypted connection
    #[default]
    #[clap(name = "ssl")]
    Ssl,
    /// StartTLS encryption
    #[clap(name = "starttls")]
    StartTls,
    /// Unencrypted connection
    #[clap(name = "none")]
    None,
}

impl Settings {
    #[cfg(test)]
    pub fn new_for_test() -> Self {
        Self {
            imap_addr: Some("imap.example.com:993".into()),
            imap_encryption: Encryption::Ssl,
            smtp_addr: Some("smtp.example.com:465".into()),
            mail_user: Some("orders@example.com".into()),
            mail_pass: Some("secret".into()),
            sent_mbox: Some("Sent".into()),
            draft_mbox: Some("Drafts".into()),
            wait_days: None,
            draft_search: None,
            mailorder_accept_invalid_certs: false,
            mailorder_archive_required: false,
            mailorder_log_level: "info".to_string(),
            mailorder_ansi_logs: false,
            mailorder_json_logs: false,
            mailorder_log_to_file: false,
            mailorder_log_dir: None,
            mailorder_max_log_files: 5,
            mailorder_serve: false,
            mailorder_bind_ip: "0.0.0.0".into(),
            mailorder_http_port: 15640,
        }
    }
}
