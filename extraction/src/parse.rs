//! Model response parsing: fence stripping, shape checks and category coercion.

use infobot_core::{Category, ContentSource, InformationItem};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::ParseError;

#[derive(Deserialize)]
struct RawItem {
    title: String,
    description: String,
    #[serde(default)]
    category: Option<Value>,
}

/// Strips a surrounding markdown code fence, with or without a language tag.
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        // ```json[...]``` 写在同一行
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn validate_category(value: Option<&Value>) -> Category {
    let raw = value.and_then(Value::as_str);
    let category = Category::coerce(raw);
    if raw != Some(category.as_str()) {
        warn!(category = ?value, "Category missing or outside taxonomy, using temporary");
    }
    category
}

/// Parses a raw model response into items attributed to `source`.
///
/// Requires a JSON array of objects with string `title` and `description`; `category` is
/// coerced into the taxonomy. An empty array is an error.
pub fn parse_items(raw: &str, source: &ContentSource) -> Result<Vec<InformationItem>, ParseError> {
    let body = strip_code_fence(raw);
    let value: Value =
        serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    let Value::Array(elements) = value else {
        return Err(ParseError::UnexpectedShape(format!(
            "expected array, got {}",
            json_kind(&value)
        )));
    };
    if elements.is_empty() {
        return Err(ParseError::Empty);
    }

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            let raw_item: RawItem = serde_json::from_value(element)
                .map_err(|e| ParseError::UnexpectedShape(format!("item {}: {}", index, e)))?;
            Ok(InformationItem {
                title: raw_item.title,
                description: raw_item.description,
                category: validate_category(raw_item.category.as_ref()),
                source_content: source.source_content().to_string(),
                content_type: source.content_type(),
            })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
