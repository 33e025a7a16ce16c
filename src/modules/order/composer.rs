// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::{DateTime, FixedOffset, Local};
use mail_parser::{Message, MessageParser, MessagePart, MimeHeaders, PartType};
use rand::RngCore;
use tracing::{debug, warn};

use crate::modules::common::collect_addresses;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::OrderResult;
use crate::modules::order::OrderMessage;
use crate::modules::smtp::util::MessageIdGenerator;
use crate::raise_error;

const CRLF: &[u8] = b"\r\n";

/// Turns a stored draft into a freshly dated, freshly identified order.
pub struct MessageComposer<R> {
    ids: MessageIdGenerator<R>,
}

impl<R: RngCore> MessageComposer<R> {
    pub fn new(ids: MessageIdGenerator<R>) -> Self {
        Self { ids }
    }

    pub fn create_msg(&mut self, raw: &[u8]) -> OrderResult<OrderMessage> {
        let message_id = self.ids.generate();
        compose(raw, Local::now().fixed_offset(), message_id)
    }
}

/// Rebuilds `raw` with a new Date and Message-ID and without Bcc.
///
/// Only the top-level header block is touched. Every MIME part below it keeps
/// its headers, order and body bytes.
pub fn compose(
    raw: &[u8],
    date: DateTime<FixedOffset>,
    message_id: String,
) -> OrderResult<OrderMessage> {
    let message = MessageParser::default()
        .parse(raw)
        .filter(|message| !message.parts.is_empty())
        .ok_or_else(|| {
            raise_error!(
                "Draft is not a parseable MIME message".into(),
                ErrorCode::MessageParseError
            )
        })?;

    for (index, part) in message.parts.iter().enumerate() {
        if part.is_encoding_problem {
            warn!(
                "Draft part {} has an unsupported transfer encoding, copied as-is",
                index
            );
        }
    }

    let from = collect_addresses(message.from())?;
    let to = collect_addresses(message.to())?;
    let cc = collect_addresses(message.cc())?;
    let bcc = collect_addresses(message.bcc())?;

    let root = &message.parts[0];
    let header_block = slice(
        raw,
        root.raw_header_offset() as usize,
        root.raw_body_offset() as usize,
    )?;
    let mut raw_data = rewrite_headers(header_block, &date.to_rfc2822(), &message_id);

    match &root.body {
        PartType::Multipart(_) => {
            write_part(&message, raw, 0, &mut raw_data)?;
            raw_data.extend_from_slice(CRLF);
        }
        _ => raw_data.extend_from_slice(slice(raw, root.raw_body_offset() as usize, raw.len())?),
    }

    debug!(
        "Composed {} ({} bytes, {} part(s))",
        message_id,
        raw_data.len(),
        message.parts.len()
    );

    Ok(OrderMessage {
        from,
        to,
        cc,
        bcc,
        message_id,
        raw_data,
    })
}

fn slice(raw: &[u8], start: usize, end: usize) -> OrderResult<&[u8]> {
    raw.get(start..end).ok_or_else(|| {
        raise_error!(
            format!("MIME part offsets {}..{} fall outside the draft", start, end),
            ErrorCode::MessageParseError
        )
    })
}

fn header_name(line: &[u8]) -> Option<&[u8]> {
    let colon = line.iter().position(|b| *b == b':')?;
    Some(line[..colon].trim_ascii())
}

/// Re-emits the top-level fields with CRLF endings: drops Bcc, replaces Date and
/// Message-ID in place (appending them when absent) and ends with the blank separator line.
fn rewrite_headers(block: &[u8], date: &str, message_id: &str) -> Vec<u8> {
    let mut fields: Vec<Vec<&[u8]>> = Vec::new();
    for line in block.split(|b| *b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            break;
        }
        match fields.last_mut() {
            Some(field) if line[0] == b' ' || line[0] == b'\t' => field.push(line),
            _ => fields.push(vec![line]),
        }
    }

    let mut out = Vec::with_capacity(block.len() + 128);
    let mut date_written = false;
    let mut id_written = false;
    for field in fields {
        let name = header_name(field[0]).unwrap_or_default();
        if name.eq_ignore_ascii_case(b"bcc") {
            continue;
        }
        if name.eq_ignore_ascii_case(b"date") {
            if !date_written {
                push_field(&mut out, "Date", date);
                date_written = true;
            }
            continue;
        }
        if name.eq_ignore_ascii_case(b"message-id") {
            if !id_written {
                push_field(&mut out, "Message-ID", message_id);
                id_written = true;
            }
            continue;
        }
        for line in field {
            out.extend_from_slice(line);
            out.extend_from_slice(CRLF);
        }
    }
    if !date_written {
        push_field(&mut out, "Date", date);
    }
    if !id_written {
        push_field(&mut out, "Message-ID", message_id);
    }
    out.extend_from_slice(CRLF);
    out
}

fn push_field(out: &mut Vec<u8>, name: &str, value: &str) {
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(value.as_bytes());
    out.extend_from_slice(CRLF);
}

fn trim_trailing_eol(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| *b != b'\r' && *b != b'\n')
        .map_or(0, |p| p + 1);
    &bytes[..end]
}

fn strip_one_eol(bytes: &[u8]) -> &[u8] {
    bytes
        .strip_suffix(b"\r\n")
        .or_else(|| bytes.strip_suffix(b"\n"))
        .unwrap_or(bytes)
}

/// Body bytes of a part nested inside a multipart, without the line break
/// that belongs to the following boundary delimiter.
fn leaf_content<'a>(raw: &'a [u8], part: &MessagePart<'_>) -> OrderResult<&'a [u8]> {
    let start = part.raw_body_offset() as usize;
    let end = (part.raw_end_offset() as usize).min(raw.len());
    let content = slice(raw, start.min(end), end)?;
    if raw[end..].starts_with(b"--") {
        Ok(strip_one_eol(content))
    } else {
        Ok(content)
    }
}

fn write_part(
    message: &Message<'_>,
    raw: &[u8],
    part_id: usize,
    out: &mut Vec<u8>,
) -> OrderResult<()> {
    let part = message.parts.get(part_id).ok_or_else(|| {
        raise_error!(
            format!("MIME part {} is missing", part_id),
            ErrorCode::MessageParseError
        )
    })?;

    let PartType::Multipart(children) = &part.body else {
        out.extend_from_slice(leaf_content(raw, part)?);
        return Ok(());
    };

    let boundary = part
        .content_type()
        .and_then(|content_type| content_type.attribute("boundary"))
        .ok_or_else(|| {
            raise_error!(
                format!("Multipart part {} declares no boundary", part_id),
                ErrorCode::MessageParseError
            )
        })?;

    for child_id in children {
        let child_id = *child_id as usize;
        let child = message.parts.get(child_id).ok_or_else(|| {
            raise_error!(
                format!("MIME part {} is missing", child_id),
                ErrorCode::MessageParseError
            )
        })?;
        out.extend_from_slice(b"--");
        out.extend_from_slice(boundary.as_bytes());
        out.extend_from_slice(CRLF);

        let headers = trim_trailing_eol(slice(
            raw,
            child.raw_header_offset() as usize,
            child.raw_body_offset() as usize,
        )?);
        if !headers.is_empty() {
            out.extend_from_slice(headers);
            out.extend_from_slice(CRLF);
        }
        out.extend_from_slice(CRLF);

        write_part(message, raw, child_id, out)?;
        out.extend_from_slice(CRLF);
    }
    out.extend_from_slice(b"--");
    out.extend_from_slice(boundary.as_bytes());
    out.extend_from_slice(b"--");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const MESSAGE_ID: &str = "<ABC.DEF@host.example>";

    fn fixed_date() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 19, 9, 30, 0)
            .unwrap()
    }

    fn header_section(raw: &[u8]) -> String {
        let text = String::from_utf8_lossy(raw);
        text.split("\r\n\r\n").next().unwrap_or_default().to_string()
    }

    fn header_lines(raw: &[u8], name: &str) -> Vec<String> {
        let prefix = format!("{}:", name.to_ascii_lowercase());
        header_section(raw)
            .split("\r\n")
            .filter(|line| line.to_ascii_lowercase().starts_with(&prefix))
            .map(String::from)
            .collect()
    }

    const SIMPLE_DRAFT: &str = "From: Shop <orders@example.com>\r\n\
To: a@x.com\r\n\
Cc: b@x.com\r\n\
Bcc: c@x.com\r\n\
Subject: Weekly order\r\n\
Date: Mon, 1 Jan 2024 10:00:00 +0000\r\n\
Message-ID: <old@draft>\r\n\
\r\n\
hello\r\n";

    #[test]
    fn strips_bcc_but_keeps_recipients() {
        let order = compose(SIMPLE_DRAFT.as_bytes(), fixed_date(), MESSAGE_ID.into()).unwrap();
        assert_eq!(order.bcc.len(), 1);
        assert_eq!(order.bcc[0].address, "c@x.com");
        assert!(header_lines(&order.raw_data, "Bcc").is_empty());
        assert!(!String::from_utf8_lossy(&order.raw_data).contains("c@x.com"));
    }

    #[test]
    fn replaces_date_and_message_id() {
        let order = compose(SIMPLE_DRAFT.as_bytes(), fixed_date(), MESSAGE_ID.into()).unwrap();
        assert_eq!(
            header_lines(&order.raw_data, "Date"),
            vec![format!("Date: {}", fixed_date().to_rfc2822())]
        );
        assert_eq!(
            header_lines(&order.raw_data, "Message-ID"),
            vec![format!("Message-ID: {}", MESSAGE_ID)]
        );
        assert_eq!(order.message_id, MESSAGE_ID);

        let reparsed = MessageParser::default().parse(&order.raw_data).unwrap();
        assert_eq!(reparsed.message_id(), Some("ABC.DEF@host.example"));
        assert_eq!(reparsed.subject(), Some("Weekly order"));
        assert_eq!(reparsed.body_text(0).as_deref().map(str::trim_end), Some("hello"));
    }

    #[test]
    fn adds_missing_date_and_message_id() {
        let raw = b"From: orders@example.com\nTo: a@x.com\nSubject: folded\n  subject line\n\nhello\n";
        let order = compose(raw, fixed_date(), MESSAGE_ID.into()).unwrap();
        assert_eq!(header_lines(&order.raw_data, "Date").len(), 1);
        assert_eq!(header_lines(&order.raw_data, "Message-ID").len(), 1);
        assert!(header_section(&order.raw_data).contains("Subject: folded\r\n  subject line"));
        assert!(order.raw_data.ends_with(b"\r\n\r\nhello\n"));
        assert!(order.bcc.is_empty());
    }

    #[test]
    fn keeps_multipart_structure() {
        let raw = "From: orders@example.com\r\n\
To: a@x.com\r\n\
Bcc: hidden@x.com\r\n\
Subject: Order with attachment\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
\r\n\
This is a multi-part message in MIME format.\r\n\
--outer\r\n\
Content-Type: multipart/alternative; boundary=\"inner\"\r\n\
\r\n\
--inner\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Please send 12 boxes.\r\n\
\r\n\
--inner\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>Please send 12 boxes.</p>\r\n\
--inner--\r\n\
--outer\r\n\
Content-Type: application/octet-stream; name=\"order.csv\"\r\n\
Content-Transfer-Encoding: base64\r\n\
Content-Disposition: attachment; filename=\"order.csv\"\r\n\
\r\n\
c2t1LHF0eQpCT1gtMSwxMgo=\r\n\
--outer--\r\n";

        let original = MessageParser::default().parse(raw.as_bytes()).unwrap();
        let order = compose(raw.as_bytes(), fixed_date(), MESSAGE_ID.into()).unwrap();
        let rebuilt = MessageParser::default().parse(&order.raw_data).unwrap();

        assert_eq!(order.bcc.len(), 1);
        assert!(header_lines(&order.raw_data, "Bcc").is_empty());
        assert_eq!(rebuilt.parts.len(), original.parts.len());
        for (before, after) in original.parts.iter().zip(rebuilt.parts.iter()).skip(1) {
            assert_eq!(
                before.content_type().map(|c| (c.ctype(), c.subtype())),
                after.content_type().map(|c| (c.ctype(), c.subtype()))
            );
            if !matches!(before.body, PartType::Multipart(_)) {
                assert_eq!(before.contents(), after.contents());
            }
        }
        assert_eq!(
            rebuilt.attachment(0).and_then(|a| a.attachment_name()),
            Some("order.csv")
        );
        assert_eq!(
            rebuilt.attachment(0).map(|a| a.contents()),
            Some(&b"sku,qty\nBOX-1,12\n"[..])
        );
        let text = String::from_utf8_lossy(&order.raw_data);
        assert!(text.contains("--inner--\r\n--outer\r\n"));
        assert!(text.ends_with("--outer--\r\n"));
    }

    #[test]
    fn tolerates_unknown_transfer_encodings() {
        let raw = b"From: orders@example.com\r\n\
To: a@x.com\r\n\
Content-Transfer-Encoding: x-weird\r\n\
\r\n\
weird payload\r\n";
        let order = compose(raw, fixed_date(), MESSAGE_ID.into()).unwrap();
        assert_eq!(
            header_lines(&order.raw_data, "Content-Transfer-Encoding"),
            vec!["Content-Transfer-Encoding: x-weird".to_string()]
        );
        assert!(order.raw_data.ends_with(b"\r\n\r\nweird payload\r\n"));

        let raw = "From: orders@example.com\r\n\
To: a@x.com\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
\r\n\
--outer\r\n\
Content-Type: text/plain\r\n\
\r\n\
See attachment.\r\n\
--outer\r\n\
Content-Type: application/octet-stream; name=\"broken.bin\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
!!!not base64!!!\r\n\
--outer--\r\n";
        let order = compose(raw.as_bytes(), fixed_date(), MESSAGE_ID.into()).unwrap();
        let text = String::from_utf8_lossy(&order.raw_data);
        assert!(text.contains("See attachment."));
        assert!(text.contains("Content-Transfer-Encoding: base64\r\n\r\n!!!not base64!!!"));
        assert!(text.ends_with("--outer--\r\n"));
        let rebuilt = MessageParser::default().parse(&order.raw_data).unwrap();
        assert_eq!(rebuilt.parts.len(), 3);
    }

    #[test]
    fn rejects_unparseable_draft() {
        let error = compose(b"", fixed_date(), MESSAGE_ID.into()).unwrap_err();
        assert_eq!(error.code(), ErrorCode::MessageParseError);
    }

    #[test]
    fn rejects_malformed_address() {
        let raw = b"From: orders@example.com\r\nTo: Customer Service\r\n\r\nhello\r\n";
        let error = compose(raw, fixed_date(), MESSAGE_ID.into()).unwrap_err();
        assert_eq!(error.code(), ErrorCode::MalformedAddress);
    }

    #[test]
    fn composer_generates_fresh_ids() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let mut composer = MessageComposer::new(MessageIdGenerator::new(
            StdRng::seed_from_u64(5),
            "host.example",
        ));
        let first = composer.create_msg(SIMPLE_DRAFT.as_bytes()).unwrap();
        let second = composer.create_msg(SIMPLE_DRAFT.as_bytes()).unwrap();
        assert_ne!(first.message_id, second.message_id);
        assert!(first.message_id.ends_with("@host.example>"));
    }
}
