// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use imap_codec::decode::Decoder;
use imap_codec::encode::{Encoder, Fragment};
use imap_codec::imap_types::command::CommandBody;
use imap_codec::CommandCodec;
use tracing::{info, warn};

use crate::modules::error::{code::ErrorCode, OrderError, OrderResult};
use crate::raise_error;

const MATCH_ALL: &str = "UID 1:*";
const SEARCH_PREFIX: &str = "A UID SEARCH ";
const LINE_END: &str = "\r\n";

/// Search predicate that selects the template draft, held in the normalized form the
/// IMAP command codec renders for it. All keys must match (IMAP AND semantics).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftSearch {
    predicate: String,
}

impl DraftSearch {
    /// Every message in the mailbox, addressed by UID.
    pub fn match_all() -> Self {
        Self {
            predicate: MATCH_ALL.into(),
        }
    }

    /// Validates `input` as the criteria of a `UID SEARCH` command (RFC 3501 search keys,
    /// parenthesized lists and an optional `CHARSET`) and normalizes it.
    pub fn parse(input: &str) -> OrderResult<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(malformed("Draft search predicate is empty".into()));
        }
        if input.contains(['\r', '\n']) {
            return Err(malformed(
                "Line breaks are not allowed in a draft search predicate".into(),
            ));
        }

        let codec = CommandCodec::default();
        let line = format!("{SEARCH_PREFIX}{input}{LINE_END}");
        let (remaining, command) = codec.decode(line.as_bytes()).map_err(|e| {
            malformed(format!(
                "'{}' is not a valid search predicate: {:?}",
                input, e
            ))
        })?;
        if !remaining.is_empty() || !matches!(command.body, CommandBody::Search { uid: true, .. })
        {
            return Err(malformed(format!(
                "'{}' is not a single search predicate",
                input
            )));
        }

        let mut encoded = Vec::with_capacity(line.len());
        for fragment in codec.encode(&command) {
            match fragment {
                Fragment::Line { data } => encoded.extend_from_slice(&data),
                Fragment::Literal { .. } => {
                    return Err(malformed(format!(
                        "'{}' needs an IMAP literal, which a draft search cannot carry",
                        input
                    )))
                }
            }
        }
        let predicate = std::str::from_utf8(&encoded)
            .ok()
            .and_then(|line| line.strip_prefix(SEARCH_PREFIX))
            .and_then(|line| line.strip_suffix(LINE_END))
            .ok_or_else(|| malformed(format!("'{}' did not round-trip as UID SEARCH", input)))?;

        Ok(Self {
            predicate: predicate.to_string(),
        })
    }

    /// Resolves the configured predicate. A missing or malformed predicate degrades to
    /// [`DraftSearch::match_all`]; the malformed case is reported loudly because it hides a
    /// configuration mistake.
    pub fn from_config(input: Option<&str>) -> Self {
        match input.map(str::trim).filter(|s| !s.is_empty()) {
            None => {
                info!("No draft search predicate configured, matching every draft");
                Self::match_all()
            }
            Some(raw) => match Self::parse(raw) {
                Ok(search) => search,
                Err(e) => {
                    warn!(
                        "Malformed draft search predicate '{}': {}. Falling back to '{}'",
                        raw,
                        e,
                        Self::match_all()
                    );
                    Self::match_all()
                }
            },
        }
    }
}

fn malformed(message: String) -> OrderError {
    raise_error!(message, ErrorCode::InvalidParameter)
}

impl fmt::Display for DraftSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_common_predicates() {
        let search = DraftSearch::parse(r#"subject "weekly order" draft"#).unwrap();
        assert_eq!(search.to_string(), r#"SUBJECT "weekly order" DRAFT"#);

        let search = DraftSearch::parse("  UNSEEN  ").unwrap();
        assert_eq!(search.to_string(), "UNSEEN");
    }

    #[test]
    fn accepts_parenthesized_lists() {
        let search = DraftSearch::from_config(Some("OR (FROM shop@x.com SUBJECT order) SEEN"));
        assert_ne!(search, DraftSearch::match_all());
        assert_eq!(search.to_string(), "OR (FROM shop@x.com SUBJECT order) SEEN");
    }

    #[test]
    fn accepts_typed_arguments() {
        for input in [
            "OR FROM alice@example.com NOT SEEN",
            "SINCE 1-Feb-2024 LARGER 10",
            r#"HEADER X-Order "yes""#,
            "UID 3:*",
            "NOT (DELETED FLAGGED)",
        ] {
            let search = DraftSearch::parse(input).unwrap();
            assert_ne!(search, DraftSearch::match_all(), "{}", input);
        }
    }

    #[test]
    fn rejects_malformed_predicates() {
        for input in [
            "",
            "SUBJECT",
            "BOGUS",
            "SINCE yesterday",
            "LARGER big",
            "UID abc",
            "OR SEEN",
            "(SEEN",
            r#"SUBJECT "unterminated"#,
            "SEEN\r\nA LOGOUT",
            r#"SUBJECT "Käse""#,
        ] {
            assert!(DraftSearch::parse(input).is_err(), "accepted '{}'", input);
        }
    }

    #[test]
    fn falls_back_to_match_all() {
        assert_eq!(DraftSearch::from_config(None), DraftSearch::match_all());
        assert_eq!(DraftSearch::from_config(Some("  ")), DraftSearch::match_all());
        assert_eq!(
            DraftSearch::from_config(Some("NOT A VALID SEARCH")),
            DraftSearch::match_all()
        );
        assert_eq!(DraftSearch::match_all().to_string(), "UID 1:*");
        assert_eq!(DraftSearch::from_config(Some("seen")).to_string(), "SEEN");
    }
}
