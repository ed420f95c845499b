//! Custom ID elements
//!
//! An inventory configures its item identifiers as an ordered list of
//! elements. Each element produces one fragment; the composer in
//! [`super::custom_id`] concatenates them.
//!
//! | Type       | Fragment                                   | Example                                |
//! |------------|--------------------------------------------|----------------------------------------|
//! | `fixed`    | `value` verbatim                           | `INV-`                                 |
//! | `random20` | 6 base-36 characters, upper-case           | `K3Z9QA`                               |
//! | `random32` | 8 base-36 characters, upper-case           | `0P7XW2LM`                             |
//! | `random6`  | number in `100000..=999999`                | `480213`                               |
//! | `random9`  | number in `100000000..=999999999`          | `731009482`                            |
//! | `guid`     | v4 UUID                                    | `9b2e...-...`                          |
//! | `datetime` | UTC `YYYYMMDDHHMMSS`                       | `20240131235959`                       |
//! | `sequence` | item count + 1, zero-padded to `format`    | `0010`                                 |
//!
//! The names `random20` and `random32` are not a length contract: they
//! produce 6 and 8 characters, and identifiers already issued depend on
//! those lengths.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Widest zero padding a sequence element may ask for
pub const MAX_PAD_WIDTH: usize = 64;

/// Kind of fragment an element generates
///
/// Serialized as its type name. A name this build does not know is kept in
/// `Unknown` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementKind {
    Fixed,
    Random20,
    Random32,
    Random6,
    Random9,
    Guid,
    Datetime,
    Sequence,
    /// A type name this build does not know; generates nothing
    Unknown(String),
}

impl ElementKind {
    pub const ALL: [ElementKind; 8] = [
        ElementKind::Fixed,
        ElementKind::Random20,
        ElementKind::Random32,
        ElementKind::Random6,
        ElementKind::Random9,
        ElementKind::Guid,
        ElementKind::Datetime,
        ElementKind::Sequence,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ElementKind::Fixed => "fixed",
            ElementKind::Random20 => "random20",
            ElementKind::Random32 => "random32",
            ElementKind::Random6 => "random6",
            ElementKind::Random9 => "random9",
            ElementKind::Guid => "guid",
            ElementKind::Datetime => "datetime",
            ElementKind::Sequence => "sequence",
            ElementKind::Unknown(name) => name,
        }
    }

    /// Parses a type name, keeping anything unrecognized as `Unknown`
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .unwrap_or_else(|| ElementKind::Unknown(s.to_string()))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ElementKind::Unknown(_))
    }

    /// Returns true if the fragment is the same on every call
    pub fn is_deterministic(&self) -> bool {
        matches!(self, ElementKind::Fixed | ElementKind::Unknown(_))
    }
}

impl From<String> for ElementKind {
    fn from(name: String) -> Self {
        ElementKind::parse(&name)
    }
}

impl From<ElementKind> for String {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured fragment of a custom item identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomIdElement {
    #[serde(rename = "type")]
    pub kind: ElementKind,

    /// Literal text for `fixed`
    #[serde(default)]
    pub value: String,

    /// Pad width for `sequence`; accepted but unused for `datetime`
    #[serde(default)]
    pub format: String,

    /// Composition position; ties keep list order
    #[serde(default)]
    pub order: i64,
}

impl CustomIdElement {
    pub fn new(kind: ElementKind, order: i64) -> Self {
        Self {
            kind,
            value: String::new(),
            format: String::new(),
            order,
        }
    }

    pub fn fixed(value: impl Into<String>, order: i64) -> Self {
        Self {
            value: value.into(),
            ..Self::new(ElementKind::Fixed, order)
        }
    }

    pub fn sequence(width: Option<usize>, order: i64) -> Self {
        Self {
            format: width.map(|w| w.to_string()).unwrap_or_default(),
            ..Self::new(ElementKind::Sequence, order)
        }
    }

    /// Width requested by `format`, if it holds an integer
    pub fn requested_width(&self) -> Option<u64> {
        let format = self.format.trim();
        if format.is_empty() {
            return None;
        }
        format.parse().ok()
    }

    /// Zero-pad width for sequences, capped at [`MAX_PAD_WIDTH`]
    pub fn pad_width(&self) -> Option<usize> {
        self.requested_width()
            .map(|w| usize::try_from(w).map_or(MAX_PAD_WIDTH, |w| w.min(MAX_PAD_WIDTH)))
    }

    /// Generates this element's fragment
    ///
    /// Never fails: an unknown kind yields an empty string so that one bad
    /// element cannot abort identifier composition.
    pub fn generate<R: Rng + ?Sized>(&self, ctx: &GenerationContext, rng: &mut R) -> String {
        match self.kind {
            ElementKind::Fixed => self.value.clone(),
            ElementKind::Random20 => base36_token(rng, 6),
            ElementKind::Random32 => base36_token(rng, 8),
            ElementKind::Random6 => rng.gen_range(100_000u32..=999_999).to_string(),
            ElementKind::Random9 => rng.gen_range(100_000_000u32..=999_999_999).to_string(),
            ElementKind::Guid => uuid::Builder::from_random_bytes(rng.gen())
                .into_uuid()
                .to_string(),
            // TODO: honor `format` once the accepted datetime patterns are agreed on
            ElementKind::Datetime => ctx.now.format("%Y%m%d%H%M%S").to_string(),
            ElementKind::Sequence => {
                let seq = ctx.sequence.to_string();
                match self.pad_width() {
                    Some(width) => format!("{:0>width$}", seq, width = width),
                    None => seq,
                }
            }
            ElementKind::Unknown(_) => String::new(),
        }
    }
}

/// Inputs shared by every element of one composition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationContext {
    /// Sequence number this composition may use (1-based)
    pub sequence: u64,

    /// Clock reading for `datetime`
    pub now: DateTime<Utc>,
}

impl GenerationContext {
    /// Context for an inventory that currently holds `count` items
    pub fn from_item_count(count: u64) -> Self {
        Self {
            sequence: count + 1,
            now: Utc::now(),
        }
    }

    /// Context using an already reserved sequence number
    pub fn with_sequence(sequence: u64) -> Self {
        Self {
            sequence,
            now: Utc::now(),
        }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

fn base36_token<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn ctx() -> GenerationContext {
        GenerationContext::from_item_count(0)
    }

    #[test]
    fn fixed_returns_value_verbatim() {
        let el = CustomIdElement::fixed("INV-", 0);
        assert_eq!(el.generate(&ctx(), &mut rng()), "INV-");
    }

    #[test]
    fn random20_is_six_upper_base36_chars() {
        let el = CustomIdElement::new(ElementKind::Random20, 0);
        let mut rng = rng();
        for _ in 0..100 {
            let frag = el.generate(&ctx(), &mut rng);
            assert_eq!(frag.len(), 6);
            assert!(frag.bytes().all(|b| BASE36.contains(&b)), "{frag}");
        }
    }

    #[test]
    fn random32_is_eight_upper_base36_chars() {
        let el = CustomIdElement::new(ElementKind::Random32, 0);
        let frag = el.generate(&ctx(), &mut rng());
        assert_eq!(frag.len(), 8);
        assert_eq!(frag, frag.to_uppercase());
    }

    #[test]
    fn random_numbers_stay_in_range() {
        let six = CustomIdElement::new(ElementKind::Random6, 0);
        let nine = CustomIdElement::new(ElementKind::Random9, 0);
        let mut rng = rng();

        for _ in 0..200 {
            let a: u32 = six.generate(&ctx(), &mut rng).parse().unwrap();
            assert!((100_000..=999_999).contains(&a));

            let b: u32 = nine.generate(&ctx(), &mut rng).parse().unwrap();
            assert!((100_000_000..=999_999_999).contains(&b));
        }
    }

    #[test]
    fn guid_is_canonical_v4() {
        let el = CustomIdElement::new(ElementKind::Guid, 0);
        let frag = el.generate(&ctx(), &mut rng());
        let parsed = uuid::Uuid::parse_str(&frag).unwrap();

        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(frag, parsed.hyphenated().to_string());
    }

    #[test]
    fn datetime_is_fourteen_digits_and_ignores_format() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 58).unwrap();
        let ctx = ctx().at(now);

        let mut el = CustomIdElement::new(ElementKind::Datetime, 0);
        assert_eq!(el.generate(&ctx, &mut rng()), "20240131235958");

        el.format = "YYYY".to_string();
        assert_eq!(el.generate(&ctx, &mut rng()), "20240131235958");
    }

    #[test]
    fn sequence_pads_to_format_width() {
        let el = CustomIdElement::sequence(Some(4), 0);
        let ctx = GenerationContext::from_item_count(9);
        assert_eq!(el.generate(&ctx, &mut rng()), "0010");
    }

    #[test]
    fn sequence_without_format_is_unpadded() {
        let el = CustomIdElement::sequence(None, 0);
        let ctx = GenerationContext::from_item_count(41);
        assert_eq!(el.generate(&ctx, &mut rng()), "42");
    }

    #[test]
    fn sequence_wider_than_format_is_not_truncated() {
        let el = CustomIdElement::sequence(Some(2), 0);
        let ctx = GenerationContext::with_sequence(1234);
        assert_eq!(el.generate(&ctx, &mut rng()), "1234");
    }

    #[test]
    fn sequence_with_garbage_format_is_unpadded() {
        let mut el = CustomIdElement::sequence(None, 0);
        el.format = "wide".to_string();
        assert_eq!(el.pad_width(), None);
        assert_eq!(el.generate(&GenerationContext::with_sequence(3), &mut rng()), "3");
    }

    #[test]
    fn unknown_kind_yields_empty_fragment() {
        let el: CustomIdElement =
            serde_json::from_str(r#"{"type": "barcode", "value": "X"}"#).unwrap();

        assert_eq!(el.kind, ElementKind::Unknown("barcode".to_string()));
        assert_eq!(el.generate(&ctx(), &mut rng()), "");
    }

    #[test]
    fn unknown_kind_keeps_its_name_when_stored_again() {
        let el: CustomIdElement =
            serde_json::from_str(r#"{"type": "barcode", "value": "X"}"#).unwrap();
        let json = serde_json::to_value(&el).unwrap();

        assert_eq!(json["type"], "barcode");
        assert_eq!(json["value"], "X");
    }

    #[test]
    fn known_kinds_serialize_lowercase() {
        let el = CustomIdElement::new(ElementKind::Random9, 2);
        let json = serde_json::to_value(&el).unwrap();
        assert_eq!(json["type"], "random9");

        let back: CustomIdElement = serde_json::from_value(json).unwrap();
        assert_eq!(back, el);
    }

    #[test]
    fn oversized_pad_width_is_capped() {
        let mut el = CustomIdElement::sequence(None, 0);
        el.format = "99999999999999".to_string();
        assert_eq!(el.pad_width(), Some(MAX_PAD_WIDTH));

        let frag = el.generate(&GenerationContext::with_sequence(7), &mut rng());
        assert_eq!(frag.len(), MAX_PAD_WIDTH);
        assert!(frag.ends_with('7'));

        el.format = "99999999999999999999999".to_string();
        assert_eq!(el.pad_width(), None);
    }

    #[test]
    fn deserializes_with_defaults() {
        let el: CustomIdElement = serde_json::from_str(r#"{"type": "sequence"}"#).unwrap();
        assert_eq!(el, CustomIdElement::new(ElementKind::Sequence, 0));
    }

    #[test]
    fn kind_parse_is_case_insensitive() {
        assert_eq!(ElementKind::parse("GUID"), ElementKind::Guid);
        assert_eq!(ElementKind::parse(" random9 "), ElementKind::Random9);
        assert_eq!(ElementKind::parse("other"), ElementKind::Unknown("other".to_string()));
    }
}
