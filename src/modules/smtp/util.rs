use chrono::{Local, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

const BASE36_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ENTROPY_BYTES: usize = 64;
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%.3f";

/// Produces `<timestamp.entropy@host>` Message-IDs.
///
/// Uniqueness rests on the 64 random bytes; the timestamp half only makes
/// the value readable in sort order.
pub struct MessageIdGenerator<R> {
    rng: R,
    hostname: String,
}

impl MessageIdGenerator<StdRng> {
    pub fn from_os_rng(hostname: impl Into<String>) -> Self {
        Self::new(StdRng::from_os_rng(), hostname)
    }
}

impl<R: RngCore> MessageIdGenerator<R> {
    pub fn new(rng: R, hostname: impl Into<String>) -> Self {
        Self {
            rng,
            hostname: hostname.into(),
        }
    }

    pub fn generate(&mut self) -> String {
        self.generate_at(Local::now().naive_local())
    }

    pub fn generate_at(&mut self, now: NaiveDateTime) -> String {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let mut entropy = [0u8; ENTROPY_BYTES];
        self.rng.fill_bytes(&mut entropy);
        format!(
            "<{}.{}@{}>",
            base36_encode(timestamp.as_bytes()),
            base36_encode(&entropy),
            self.hostname
        )
    }
}

/// Upper-case base-36 rendering of `bytes` read as one big-endian integer.
pub fn base36_encode(bytes: &[u8]) -> String {
    let mut number: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();
    if number.is_empty() {
        return "0".into();
    }

    let mut digits = Vec::with_capacity(number.len() * 2);
    while !number.is_empty() {
        let mut remainder = 0u32;
        let mut quotient = Vec::with_capacity(number.len());
        for byte in &number {
            let accumulator = (remainder << 8) | *byte as u32;
            let digit = accumulator / 36;
            remainder = accumulator % 36;
            if !quotient.is_empty() || digit != 0 {
                quotient.push(digit as u8);
            }
        }
        digits.push(BASE36_ALPHABET[remainder as usize]);
        number = quotient;
    }

    digits.iter().rev().map(|d| *d as char).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;
    use regex::Regex;
    use std::collections::HashSet;

    #[test]
    fn base36_known_values() {
        assert_eq!(base36_encode(&[]), "0");
        assert_eq!(base36_encode(&[0, 0]), "0");
        assert_eq!(base36_encode(&[35]), "Z");
        assert_eq!(base36_encode(&[36]), "10");
        assert_eq!(base36_encode(&[1, 0]), "74");
        assert_eq!(base36_encode(&[0, 1, 0]), "74");
        assert_eq!(base36_encode(&[0xff, 0xff, 0xff, 0xff]), "1Z141Z3");
    }

    #[test]
    fn message_id_shape() {
        let mut generator = MessageIdGenerator::new(StdRng::seed_from_u64(7), "mx.example.com");
        let re = Regex::new(r"^<[0-9A-Z]+\.[0-9A-Z]+@mx\.example\.com>$").unwrap();
        let id = generator.generate();
        assert!(re.is_match(&id), "unexpected message id {id}");
    }

    #[test]
    fn timestamp_half_encodes_millisecond_clock() {
        let now = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_milli_opt(14, 5, 9, 42)
            .unwrap();
        let mut generator = MessageIdGenerator::new(StdRng::seed_from_u64(1), "host");
        let id = generator.generate_at(now);
        let expected = base36_encode(b"20261019140509.042");
        assert!(id.starts_with(&format!("<{}.", expected)));
    }

    #[test]
    fn seeded_generators_repeat() {
        let now = Local::now().naive_local();
        let mut first = MessageIdGenerator::new(StdRng::seed_from_u64(99), "host");
        let mut second = MessageIdGenerator::new(StdRng::seed_from_u64(99), "host");
        assert_eq!(first.generate_at(now), second.generate_at(now));
    }

    #[test]
    fn ten_thousand_ids_are_unique() {
        let now = Local::now().naive_local();
        let mut generator = MessageIdGenerator::new(StdRng::seed_from_u64(2025), "host");
        let ids: HashSet<String> = (0..10_000).map(|_| generator.generate_at(now)).collect();
        assert_eq!(ids.len(), 10_000);
    }
}
