//! Extraction and validation of ranking lists from free-form model output.
//!
//! The model is told to answer with a bare JSON array, but replies may still
//! arrive wrapped in Markdown fences or surrounded by prose. Extraction tries,
//! in order:
//! 1. the whole (fence-stripped) text as JSON
//! 2. the span from the first `[` to the last `]`
//! 3. the span from the first `{` to the last `}`
//!
//! An object is only accepted when it carries the list under `top_matches` or
//! `results`. Anything else is a rejection; there is no further recovery.

use serde_json::Value;
use thiserror::Error;

/// Reasons kept per ranked entry
pub const MAX_REASONS: usize = 4;

/// Object keys under which a ranking list may be nested
const LIST_KEYS: [&str; 2] = ["top_matches", "results"];

/// Why a model reply could not be turned into a ranking
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("ranker output was empty")]
    Empty,

    #[error("no JSON found in ranker output")]
    NoJson,

    #[error("ranker JSON is not a ranking list")]
    NotAList,

    #[error("no valid entries in ranking list")]
    NoValidEntries,
}

/// A validated entry of the model's ranking
#[derive(Debug, Clone, PartialEq)]
pub struct RankedItem {
    pub id: String,
    pub score: u8,
    pub reasons: Vec<String>,
    /// Fields the model may echo back, used when `id` is not a known candidate
    pub name: Option<String>,
    pub position: Option<String>,
    pub company: Option<String>,
    pub skills: Vec<String>,
}

/// Parse a model reply into at most `max_items` validated entries
///
/// Invalid entries are dropped individually; the reply is only rejected
/// when no entry survives.
pub fn parse_ranking(text: &str, max_items: usize) -> Result<Vec<RankedItem>, ExtractError> {
    if text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }

    let value = extract_json(text).ok_or(ExtractError::NoJson)?;
    let list = ranking_list(&value).ok_or(ExtractError::NotAList)?;

    let total = list.len();
    let items: Vec<RankedItem> = list
        .iter()
        .filter_map(validate_item)
        .take(max_items)
        .collect();

    if items.len() < total.min(max_items) {
        tracing::debug!("Dropped invalid ranking entries: {} of {} kept", items.len(), total);
    }

    if items.is_empty() {
        return Err(ExtractError::NoValidEntries);
    }

    Ok(items)
}

/// Locate the JSON document inside a model reply
pub fn extract_json(text: &str) -> Option<Value> {
    let text = strip_code_fences(text.trim());

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        if value.is_array() || value.is_object() {
            return Some(value);
        }
    }

    [('[', ']'), ('{', '}')]
        .iter()
        .filter_map(|&(open, close)| slice_between(text, open, close))
        .find_map(|slice| serde_json::from_str::<Value>(slice).ok())
}

fn ranking_list(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

/// Validate one entry: non-empty string `id`, numeric `score` in [0, 100],
/// and if present, `reasons` as at most four strings
fn validate_item(item: &Value) -> Option<RankedItem> {
    let obj = item.as_object()?;

    let id = obj.get("id")?.as_str()?.trim();
    if id.is_empty() {
        return None;
    }

    let score = numeric(obj.get("score")?)?;
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return None;
    }

    let reasons = match obj.get("reasons") {
        None => Vec::new(),
        Some(Value::Array(reasons)) if reasons.len() <= MAX_REASONS => reasons
            .iter()
            .map(|r| r.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()?,
        Some(_) => return None,
    };

    let echoed = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

    Some(RankedItem {
        id: id.to_string(),
        score: score.round().clamp(0.0, 100.0) as u8,
        reasons,
        name: echoed("name"),
        position: echoed("position"),
        company: echoed("company"),
        skills: obj
            .get("skills")
            .and_then(Value::as_array)
            .map(|skills| {
                skills
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    })
}

/// Scores may arrive as numbers or numeric strings
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn slice_between(text: &str, open: char, close: char) -> Option<&str> {
    let first = text.find(open)?;
    let last = text.rfind(close)?;
    (last > first).then(|| &text[first..=last])
}

/// Strips ```json ... ``` or ``` ... ``` fences around a reply
fn strip_code_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest).trim_start();
    rest.strip_suffix("```").map(str::trim).unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_array() {
        let items = parse_ranking(r#"[{"id":"a","score":91,"reasons":["shared rust"]}]"#, 10).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "a");
        assert_eq!(items[0].score, 91);
        assert_eq!(items[0].reasons, vec!["shared rust"]);
    }

    #[test]
    fn test_fenced_array() {
        let text = "```json\n[{\"id\":\"a\",\"score\":80}]\n```";
        let items = parse_ranking(text, 10).unwrap();
        assert_eq!(items[0].score, 80);
        assert!(items[0].reasons.is_empty());
    }

    #[test]
    fn test_array_inside_prose() {
        let text = "Sure! Here is the ranking:\n[{\"id\":\"a\",\"score\":70},{\"id\":\"b\",\"score\":60}]\nHope it helps.";
        let items = parse_ranking(text, 10).unwrap();
        assert_eq!(items.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_object_with_known_list_key() {
        let text = r#"{"top_matches":[{"id":"a","score":"88.6"}]}"#;
        let items = parse_ranking(text, 10).unwrap();
        assert_eq!(items[0].score, 89);

        let text = r#"noise {"results":[{"id":"b","score":12}]} noise"#;
        assert_eq!(parse_ranking(text, 10).unwrap()[0].id, "b");
    }

    #[test]
    fn test_object_without_list_is_rejected() {
        assert_eq!(parse_ranking(r#"{"id":"a","score":50}"#, 10), Err(ExtractError::NotAList));
    }

    #[test]
    fn test_rejections() {
        assert_eq!(parse_ranking("   ", 10), Err(ExtractError::Empty));
        assert_eq!(parse_ranking("I cannot help with that.", 10), Err(ExtractError::NoJson));
        assert_eq!(parse_ranking("[not json]", 10), Err(ExtractError::NoJson));
        assert_eq!(
            parse_ranking(r#"[{"id":"","score":50},{"id":"a","score":101}]"#, 10),
            Err(ExtractError::NoValidEntries)
        );
    }

    #[test]
    fn test_malformed_entries_are_dropped_individually() {
        let text = r#"[
            {"id":"ok","score":77,"reasons":["a","b"]},
            {"id":42,"score":90},
            {"id":"high","score":140},
            {"id":"neg","score":-1},
            {"id":"nan","score":"lots"},
            {"id":"many","score":60,"reasons":["1","2","3","4","5"]},
            {"id":"mixed","score":60,"reasons":["1",2]},
            {"id":"null-reasons","score":60,"reasons":null},
            "stray string"
        ]"#;

        let items = parse_ranking(text, 10).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "ok");
    }

    #[test]
    fn test_limit_applies_to_valid_entries() {
        let entries: Vec<String> = (0..15)
            .map(|i| format!(r#"{{"id":"c{}","score":{}}}"#, i, 100 - i))
            .collect();
        let text = format!("[{{\"id\":\"bad\",\"score\":500}},{}]", entries.join(","));

        let items = parse_ranking(&text, 10).unwrap();
        assert_eq!(items.len(), 10);
        assert_eq!(items[0].id, "c0");
    }

    #[test]
    fn test_echoed_fields_are_captured() {
        let text = r#"[{"id":"ghost","score":64,"name":"Grace","company":"Acme","skills":["cobol",7]}]"#;
        let item = &parse_ranking(text, 10).unwrap()[0];
        assert_eq!(item.name.as_deref(), Some("Grace"));
        assert_eq!(item.company.as_deref(), Some("Acme"));
        assert_eq!(item.position, None);
        assert_eq!(item.skills, vec!["cobol"]);
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("[1]"), "[1]");
    }
}
