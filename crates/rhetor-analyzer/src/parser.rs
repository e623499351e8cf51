//! Parse model replies into fallacy findings

use crate::error::ParseError;
use rhetor_domain::{FallacyFinding, FallacyKind};
use serde_json::Value;
use tracing::{debug, warn};

/// Characters of the reply kept in a `ParseError` snippet
pub const SNIPPET_CHARS: usize = 120;

/// Openings that count as an explicit "nothing found" statement
const NONE_FOUND_OPENINGS: &[&str] = &[
    "no fallacies",
    "no fallacy",
    "no logical fallacies",
    "no logical fallacy",
    "there are no fallacies",
    "there are no logical fallacies",
    "i found no fallacies",
    "i found no logical fallacies",
];

/// Parse a raw model reply into findings, preserving reply order
///
/// The reply is scanned block by block: every complete JSON array, wrapper
/// object (`{"fallacies": [...]}`) or lone finding object contributes its
/// items, and prose, markdown fences or a truncated tail around them is
/// ignored. Items that don't name a known fallacy are skipped. The reply is
/// an error only when no block yields a usable finding, unless it holds an
/// empty list or opens by stating that there are no fallacies.
pub fn parse_reply(raw: &str) -> Result<Vec<FallacyFinding>, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(parse_error("Empty reply", raw));
    }

    let blocks = scan_blocks(trimmed);

    if blocks.candidates.is_empty() {
        if blocks.saw_empty_list {
            return Ok(Vec::new());
        }
        if says_no_fallacies(trimmed) {
            debug!("Reply states no fallacies without JSON");
            return Ok(Vec::new());
        }
        return Err(parse_error("No JSON findings in reply", raw));
    }

    let mut findings = Vec::with_capacity(blocks.candidates.len());
    for (idx, item) in blocks.candidates.iter().enumerate() {
        match parse_finding(item) {
            Ok(finding) => findings.push(finding),
            Err(reason) => warn!("Skipping finding {}: {}", idx, reason),
        }
    }

    if findings.is_empty() {
        return Err(parse_error(
            format!(
                "No reply item named a known fallacy ({} candidates)",
                blocks.candidates.len()
            ),
            raw,
        ));
    }

    Ok(findings)
}

fn parse_error(reason: impl Into<String>, raw: &str) -> ParseError {
    ParseError {
        reason: reason.into(),
        snippet: raw.chars().take(SNIPPET_CHARS).collect(),
    }
}

#[derive(Debug, Default)]
struct Blocks {
    /// Finding candidates in reply order
    candidates: Vec<Value>,
    /// An empty findings list appeared somewhere in the reply
    saw_empty_list: bool,
}

/// Collect finding candidates from every complete JSON block in `text`
///
/// At each `[` or `{` one JSON value is read. A complete value is consumed
/// whole; an incomplete one (a truncated array, say) is stepped into so the
/// complete objects inside it still count.
fn scan_blocks(text: &str) -> Blocks {
    let mut blocks = Blocks::default();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find(['[', '{']) {
        let start = pos + offset;
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();

        match stream.next() {
            Some(Ok(value)) => {
                blocks.absorb(value);
                pos = start + stream.byte_offset().max(1);
            }
            _ => pos = start + 1,
        }
    }

    blocks
}

impl Blocks {
    fn absorb(&mut self, value: Value) {
        match value {
            Value::Array(items) => self.absorb_list(items),
            Value::Object(mut map) => {
                if let Some(Value::Array(items)) = map.remove("fallacies") {
                    self.absorb_list(items);
                } else if ["type", "kind", "fallacy"].iter().any(|key| map.contains_key(*key)) {
                    self.candidates.push(Value::Object(map));
                }
            }
            _ => {}
        }
    }

    /// Objects and strings are candidates; numbers and the like are prose
    fn absorb_list(&mut self, items: Vec<Value>) {
        if items.is_empty() {
            self.saw_empty_list = true;
            return;
        }
        self.candidates.extend(
            items
                .into_iter()
                .filter(|item| item.is_object() || item.is_string()),
        );
    }
}

fn says_no_fallacies(text: &str) -> bool {
    let lower = text.to_lowercase();
    NONE_FOUND_OPENINGS
        .iter()
        .any(|opening| lower.starts_with(opening))
}

fn parse_finding(item: &Value) -> Result<FallacyFinding, String> {
    // Bare kind name
    if let Value::String(name) = item {
        let kind = FallacyKind::parse(name).ok_or_else(|| format!("Unknown fallacy type '{}'", name))?;
        return Ok(FallacyFinding::new(kind, "", ""));
    }

    let obj = item.as_object().ok_or("Item is not an object")?;

    let name = first_str(obj, &["type", "kind", "fallacy"]).ok_or("Missing 'type' field")?;
    let kind = FallacyKind::parse(name).ok_or_else(|| format!("Unknown fallacy type '{}'", name))?;

    let quote = first_str(obj, &["quote", "quoted_span", "span"]).unwrap_or_default();
    let explanation = first_str(obj, &["explanation", "reason"]).unwrap_or_default();

    let finding = FallacyFinding::new(kind, quote.trim(), explanation.trim());
    Ok(match obj.get("confidence").and_then(Value::as_f64) {
        Some(confidence) => finding.with_confidence(confidence),
        None => finding,
    })
}

fn first_str<'a>(obj: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| obj.get(*key).and_then(Value::as_str))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn kind_strategy() -> impl Strategy<Value = FallacyKind> {
        (0..FallacyKind::ALL.len()).prop_map(|i| FallacyKind::ALL[i])
    }

    proptest! {
        /// Property: findings come back in the order the reply lists them
        #[test]
        fn test_order_preserved(kinds in prop::collection::vec(kind_strategy(), 1..10)) {
            let items: Vec<Value> = kinds
                .iter()
                .map(|k| serde_json::json!({"type": k.as_str(), "quote": "q", "explanation": "e"}))
                .collect();
            let reply = Value::Array(items).to_string();

            let parsed: Vec<_> = parse_reply(&reply).unwrap().into_iter().map(|f| f.kind).collect();
            prop_assert_eq!(parsed, kinds);
        }

        /// Property: the parser never panics on arbitrary input
        #[test]
        fn test_never_panics(raw in "\\PC{0,300}") {
            let _ = parse_reply(&raw);
        }
    }
}
