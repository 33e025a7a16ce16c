// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use super::error::code::ErrorCode;
use super::error::OrderError;
use crate::modules::error::OrderResult;
use crate::{raise_error, validate_email};
use mail_parser::{Addr as MimeAddr, Address as MimeAddress};

pub mod rustls;

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Addr {
    /// The optional display name associated with the email address (e.g., "John Doe").
    pub name: Option<String>,
    /// The mailbox itself (e.g., "john.doe@example.com").
    pub address: String,
}

impl Addr {
    pub fn new(name: Option<&str>, address: &str) -> Self {
        Addr {
            name: name.map(String::from),
            address: address.into(),
        }
    }
}

impl std::fmt::Display for Addr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.address),
            None => write!(f, "<{}>", self.address),
        }
    }
}

impl<'x> TryFrom<&MimeAddr<'x>> for Addr {
    type Error = OrderError;

    fn try_from(original: &MimeAddr<'x>) -> OrderResult<Self> {
        let name = original
            .name
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let address = original
            .address
            .as_ref()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                raise_error!(
                    format!(
                        "Address entry '{}' has no mailbox",
                        name.as_deref().unwrap_or_default()
                    ),
                    ErrorCode::MalformedAddress
                )
            })?;
        validate_email!(address)?;
        Ok(Addr::new(name.as_deref(), address))
    }
}

/// Flattens an address header (lists and groups alike) into validated mailboxes.
pub fn collect_addresses(header: Option<&MimeAddress<'_>>) -> OrderResult<Vec<Addr>> {
    let Some(header) = header else {
        return Ok(Vec::new());
    };
    match header {
        MimeAddress::List(addrs) => addrs.iter().map(Addr::try_from).collect(),
        MimeAddress::Group(groups) => groups
            .iter()
            .flat_map(|group| group.addresses.iter().map(Addr::try_from))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mail_parser::MessageParser;

    #[test]
    fn flattens_lists_and_groups() {
        let raw = b"From: Shop <shop@example.com>\r\nTo: a@x.com, \"B\" <b@x.com>\r\nCc: team: c@x.com, d@x.com;\r\n\r\nbody\r\n";
        let message = MessageParser::default().parse(&raw[..]).unwrap();

        let from = collect_addresses(message.from()).unwrap();
        assert_eq!(from, vec![Addr::new(Some("Shop"), "shop@example.com")]);

        let to = collect_addresses(message.to()).unwrap();
        assert_eq!(
            to.iter().map(|a| a.address.as_str()).collect::<Vec<_>>(),
            vec!["a@x.com", "b@x.com"]
        );

        let cc = collect_addresses(message.cc()).unwrap();
        assert_eq!(cc.len(), 2);
        assert!(collect_addresses(message.bcc()).unwrap().is_empty());
    }

    #[test]
    fn rejects_entries_without_valid_mailbox() {
        let raw = b"From: shop@example.com\r\nTo: not-an-address\r\n\r\nbody\r\n";
        let message = MessageParser::default().parse(&raw[..]).unwrap();
        let error = collect_addresses(message.to()).unwrap_err();
        assert_eq!(error.code(), ErrorCode::MalformedAddress);
    }

    #[test]
    fn display_includes_name_when_present() {
        assert_eq!(
            Addr::new(Some("Shop"), "shop@example.com").to_string(),
            "Shop <shop@example.com>"
        );
        assert_eq!(Addr::new(None, "a@x.com").to_string(), "<a@x.com>");
    }
}
