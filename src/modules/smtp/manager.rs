// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::code::ErrorCode;
use crate::modules::error::OrderResult;
use crate::modules::settings::config::{OrderConfig, ServerAddr};
use crate::modules::smtp::client::OrderSmtpClient;
use crate::raise_error;
use mail_send::{Credentials, SmtpClientBuilder};
use std::time::Duration;
use tracing::debug;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds authenticated implicit-TLS submission sessions.
pub struct SmtpClientManager {
    server: ServerAddr,
    username: String,
    password: String,
    helo_host: String,
    accept_invalid_certs: bool,
}

impl SmtpClientManager {
    pub fn new(config: &OrderConfig) -> Self {
        Self {
            server: config.smtp.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            helo_host: config.hostname.clone(),
            accept_invalid_certs: config.accept_invalid_certs,
        }
    }

    pub async fn connect(&self) -> OrderResult<OrderSmtpClient> {
        let credentials = Credentials::new(self.username.clone(), self.password.clone());
        let mut builder = SmtpClientBuilder::new(self.server.host.clone(), self.server.port)
            .implicit_tls(true)
            .credentials(credentials)
            .helo_host(self.helo_host.clone())
            .timeout(SMTP_TIMEOUT);
        if self.accept_invalid_certs {
            builder = builder.allow_invalid_certs();
        }
        let client = builder
            .connect()
            .await
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::SmtpConnectionFailed))?;
        debug!("SMTP session opened to {} as {}", self.server, self.username);
        Ok(OrderSmtpClient(client))
    }
}
