// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use super::error::code::ErrorCode;
use crate::modules::error::OrderResult;
use std::str::FromStr;

pub mod net;
pub mod shutdown;
pub mod tls;

#[macro_export]
macro_rules! mailorder_version {
    () => {
        env!("CARGO_PKG_VERSION")
    };
}

#[macro_export]
macro_rules! raise_error {
    ($msg:expr, $code:expr) => {
        $crate::modules::error::OrderError::Generic {
            message: $msg,
            location: snafu::Location::default(),
            code: $code,
        }
    };
}

#[macro_export]
macro_rules! validate_email {
    ($email:expr) => {{
        $crate::modules::utils::validate_email($email)
    }};
}

pub fn validate_email(email: &str) -> OrderResult<()> {
    let email_address = email_address::EmailAddress::from_str(email).map_err(|_| {
        raise_error!(
            format!("Invalid email format: {}", email),
            ErrorCode::MalformedAddress
        )
    })?;
    if email != email_address.email() {
        return Err(raise_error!(
            format!("Invalid email format: {}", email),
            ErrorCode::MalformedAddress
        ));
    }
    Ok(())
}

/// Splits `host[:port]` into its parts, using `default_port` when no port is given.
pub fn split_host_port(input: &str, default_port: u16) -> OrderResult<(String, u16)> {
    let input = input.trim();
    if input.is_empty() {
        return Err(raise_error!(
            "Server address cannot be empty".into(),
            ErrorCode::InvalidParameter
        ));
    }

    // Bracketed IPv6 literal, e.g. "[::1]:993"
    if let Some(rest) = input.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(|| {
            raise_error!(
                format!("Invalid server address '{}'", input),
                ErrorCode::InvalidParameter
            )
        })?;
        let port = match tail.strip_prefix(':') {
            Some(port) => parse_port(input, port)?,
            None if tail.is_empty() => default_port,
            None => {
                return Err(raise_error!(
                    format!("Invalid server address '{}'", input),
                    ErrorCode::InvalidParameter
                ))
            }
        };
        return Ok((host.to_string(), port));
    }

    match input.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && !host.contains(':') => {
            Ok((host.to_string(), parse_port(input, port)?))
        }
        Some(_) => Err(raise_error!(
            format!("Invalid server address '{}'", input),
            ErrorCode::InvalidParameter
        )),
        None => Ok((input.to_string(), default_port)),
    }
}

fn parse_port(input: &str, port: &str) -> OrderResult<u16> {
    port.parse::<u16>().map_err(|_| {
        raise_error!(
            format!("Invalid port in server address '{}'", input),
            ErrorCode::InvalidParameter
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_host_port_variants() {
        assert_eq!(
            split_host_port("imap.example.com:993", 143).unwrap(),
            ("imap.example.com".to_string(), 993)
        );
        assert_eq!(
            split_host_port("smtp.example.com", 465).unwrap(),
            ("smtp.example.com".to_string(), 465)
        );
        assert_eq!(
            split_host_port("[::1]:1993", 993).unwrap(),
            ("::1".to_string(), 1993)
        );
        assert!(split_host_port("", 993).is_err());
        assert!(split_host_port("host:notaport", 993).is_err());
        assert!(split_host_port(":993", 993).is_err());
    }

    #[test]
    fn validate_email_rejects_garbage() {
        assert!(validate_email!("orders@example.com").is_ok());
        assert!(validate_email!("not an address").is_err());
        assert!(validate_email!("").is_err());
    }
}
