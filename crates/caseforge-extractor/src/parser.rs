//! Parsing model output into test-case records
//!
//! The model is asked for line-oriented sentinel blocks. Older prompts produced a JSON
//! array, which is still accepted when no start sentinel is present.

use caseforge_domain::TestCaseRecord;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Line opening a test-case block
pub const BLOCK_START: &str = "---TEST CASE START---";

/// Line closing a test-case block
pub const BLOCK_END: &str = "---TEST CASE END---";

const KEY_ID: &str = "TC_ID";
const KEY_REQUIREMENT: &str = "REQ_ID";
const KEY_DESCRIPTION: &str = "DESC";
const KEY_TYPE: &str = "TYPE";
const KEY_PRIORITY: &str = "PRIORITY";
const KEY_STEP: &str = "STEP";
const KEY_EXPECTED: &str = "EXPECTED";
const KEY_RTM: &str = "RTM";
const KEY_CONFIDENCE: &str = "CONFIDENCE";

/// Parse a raw model response into records
///
/// Records without a description are dropped. Unparseable input yields an empty list.
pub fn parse_response(response: &str) -> Vec<TestCaseRecord> {
    if response.contains(BLOCK_START) {
        parse_blocks(response)
    } else {
        parse_json(response)
    }
}

fn parse_blocks(response: &str) -> Vec<TestCaseRecord> {
    let mut records = Vec::new();

    // The text before the first sentinel is never a block
    for fragment in response.split(BLOCK_START).skip(1) {
        let Some(end) = fragment.find(BLOCK_END) else {
            debug!("Dropping block without end sentinel");
            continue;
        };

        match parse_block(&fragment[..end]) {
            Some(record) => records.push(record),
            None => debug!("Dropping block without description"),
        }
    }

    records
}

fn parse_block(body: &str) -> Option<TestCaseRecord> {
    let first = |key: &str| {
        body.lines()
            .find_map(|line| field_value(line, key))
            .unwrap_or_default()
            .to_string()
    };

    let record = TestCaseRecord {
        test_case_id: first(KEY_ID),
        requirement_id: first(KEY_REQUIREMENT),
        description: first(KEY_DESCRIPTION),
        test_type: first(KEY_TYPE),
        priority: first(KEY_PRIORITY),
        steps: body
            .lines()
            .filter_map(|line| field_value(line, KEY_STEP))
            .filter(|step| !step.is_empty())
            .map(str::to_string)
            .collect(),
        expected_result: first(KEY_EXPECTED),
        rtm_compliance_mapping: first(KEY_RTM),
        confidence_score: body
            .lines()
            .find_map(|line| field_value(line, KEY_CONFIDENCE))
            .filter(|value| !value.is_empty())
            .map(str::to_string),
        quality_assessment: None,
    };

    record.has_description().then_some(record)
}

/// Value of a `KEY: value` line, tolerating list markers and bold markup around the key
fn field_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let line = line.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '*' | '#'));
    let rest = line.strip_prefix(key)?.trim_start_matches('*').trim_start();
    let value = rest.strip_prefix(':')?;
    Some(value.trim().trim_start_matches('*').trim())
}

/// Render records in the block format the parser reads
pub fn render_blocks(records: &[TestCaseRecord]) -> String {
    let mut out = String::new();

    for record in records {
        out.push_str(BLOCK_START);
        out.push('\n');
        push_field(&mut out, KEY_ID, &record.test_case_id);
        push_field(&mut out, KEY_REQUIREMENT, &record.requirement_id);
        push_field(&mut out, KEY_DESCRIPTION, &record.description);
        push_field(&mut out, KEY_TYPE, &record.test_type);
        push_field(&mut out, KEY_PRIORITY, &record.priority);
        for step in &record.steps {
            push_field(&mut out, KEY_STEP, step);
        }
        push_field(&mut out, KEY_EXPECTED, &record.expected_result);
        push_field(&mut out, KEY_RTM, &record.rtm_compliance_mapping);
        if let Some(confidence) = &record.confidence_score {
            push_field(&mut out, KEY_CONFIDENCE, confidence);
        }
        out.push_str(BLOCK_END);
        out.push('\n');
    }

    out
}

fn push_field(out: &mut String, key: &str, value: &str) {
    // Values are single-line in the block format
    let value = value.lines().map(str::trim).collect::<Vec<_>>().join(" ");
    out.push_str(key);
    out.push_str(": ");
    out.push_str(&value);
    out.push('\n');
}

/// Legacy JSON array format
fn parse_json(response: &str) -> Vec<TestCaseRecord> {
    let Some(json_str) = extract_json(response) else {
        debug!("Response contains neither blocks nor a JSON array");
        return Vec::new();
    };

    let items = match serde_json::from_str::<Value>(json_str) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!("JSON response is not an array");
            return Vec::new();
        }
        Err(e) => {
            warn!("Failed to parse JSON response: {}", e);
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            let Some(obj) = item.as_object() else {
                warn!("Skipping JSON item {}: not an object", idx);
                return None;
            };
            let record = record_from_json(obj);
            if !record.has_description() {
                debug!("Skipping JSON item {}: no description", idx);
                return None;
            }
            Some(record)
        })
        .collect()
}

/// Extract the JSON array from a response that may wrap it in markdown or prose
fn extract_json(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let body = &text[start + "```json".len()..];
        if let Some(end) = body.find("```") {
            return Some(body[..end].trim());
        }
    }

    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

fn record_from_json(obj: &Map<String, Value>) -> TestCaseRecord {
    let text = |key: &str| obj.get(key).map(json_text).unwrap_or_default();

    TestCaseRecord {
        test_case_id: text("test_case_id"),
        requirement_id: text("requirement_id"),
        description: text("description"),
        test_type: text("test_type"),
        priority: text("priority"),
        steps: obj.get("steps").map(json_steps).unwrap_or_default(),
        expected_result: text("expected_result"),
        rtm_compliance_mapping: obj.get("rtm_compliance_mapping").map(format_rtm).unwrap_or_default(),
        confidence_score: obj
            .get("confidence_score")
            .map(json_text)
            .filter(|value| !value.is_empty()),
        quality_assessment: None,
    }
}

fn json_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn json_steps(value: &Value) -> Vec<String> {
    let steps: Vec<String> = match value {
        Value::Array(items) => items.iter().map(json_text).collect(),
        Value::String(s) => s.lines().map(|line| line.trim().to_string()).collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    };
    steps.into_iter().filter(|step| !step.is_empty()).collect()
}

/// Flatten a compliance mapping the model returned as an object or list
pub fn format_rtm(value: &Value) -> String {
    match value {
        Value::Object(obj) => match obj.get("rule_id") {
            Some(Value::String(rule_id)) => rule_id.clone(),
            _ => value.to_string(),
        },
        Value::Array(items) => items.iter().map(format_rtm).collect::<Vec<_>>().join(", "),
        other => json_text(other),
    }
}
