//! Reusable column extractors for backend records.
//!
//! Required-field extractors fail with [`RenderError::MissingField`] when the
//! field is absent or null; optional ones render [`Cell::Empty`] instead.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Number, Value};

use super::{Cell, RenderError};

pub fn required<'a>(record: &'a Value, field: &str) -> Result<&'a Value, RenderError> {
    match record.get(field) {
        Some(Value::Null) | None => Err(RenderError::MissingField {
            field: field.to_string(),
        }),
        Some(value) => Ok(value),
    }
}

fn optional<'a>(record: &'a Value, field: &str) -> Option<&'a Value> {
    match record.get(field) {
        Some(Value::Null) | None => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(value),
    }
}

/// Groups the integer digits with `,` the way an en-US locale would.
pub fn group_digits(value: i64) -> String {
    group_digit_str(&value.unsigned_abs().to_string(), value < 0)
}

// `digits` is a run of ASCII digits without sign.
fn group_digit_str(digits: &str, negative: bool) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_number(number: &Number) -> String {
    if let Some(v) = number.as_i64() {
        return group_digits(v);
    }
    if let Some(v) = number.as_u64() {
        return group_digit_str(&v.to_string(), false);
    }
    let v = number.as_f64().unwrap_or_default();
    let rounded = format!("{:.3}", v.abs());
    let (whole, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');
    let sign = v < 0.0;
    if fraction.is_empty() {
        group_digit_str(whole, sign)
    } else {
        format!("{}.{fraction}", group_digit_str(whole, sign))
    }
}

pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn required_number<'a>(record: &'a Value, field: &str) -> Result<&'a Number, RenderError> {
    match required(record, field)? {
        Value::Number(n) => Ok(n),
        _ => Err(RenderError::UnexpectedType {
            field: field.to_string(),
            expected: "number",
        }),
    }
}

pub fn text(field: &'static str) -> impl Fn(&Value) -> Result<Cell, RenderError> + Send + Sync {
    move |record| Ok(Cell::text(value_text(required(record, field)?)))
}

pub fn optional_text(
    field: &'static str,
) -> impl Fn(&Value) -> Result<Cell, RenderError> + Send + Sync {
    move |record| {
        Ok(optional(record, field)
            .map(|v| Cell::text(value_text(v)))
            .unwrap_or(Cell::Empty))
    }
}

pub fn number(field: &'static str) -> impl Fn(&Value) -> Result<Cell, RenderError> + Send + Sync {
    move |record| Ok(Cell::text(format_number(required_number(record, field)?)))
}

pub fn optional_number(
    field: &'static str,
) -> impl Fn(&Value) -> Result<Cell, RenderError> + Send + Sync {
    move |record| {
        Ok(match optional(record, field) {
            Some(Value::Number(n)) => Cell::text(format_number(n)),
            Some(other) => Cell::text(value_text(other)),
            None => Cell::Empty,
        })
    }
}

/// Anchor labelled `label` pointing at the URL in `href_field`; empty when
/// the record has no URL.
pub fn optional_link(
    href_field: &'static str,
    label: &'static str,
) -> impl Fn(&Value) -> Result<Cell, RenderError> + Send + Sync {
    move |record| {
        Ok(match optional(record, href_field) {
            Some(href) => Cell::Link {
                text: label.to_string(),
                href: value_text(href),
            },
            None => Cell::Empty,
        })
    }
}

/// Required text that becomes a link when `href_field` is set.
pub fn text_with_link(
    text_field: &'static str,
    href_field: &'static str,
) -> impl Fn(&Value) -> Result<Cell, RenderError> + Send + Sync {
    move |record| {
        let text = value_text(required(record, text_field)?);
        Ok(match optional(record, href_field) {
            Some(href) => Cell::Link {
                text,
                href: value_text(href),
            },
            None => Cell::Text { text },
        })
    }
}

/// Multiplied points with the unmultiplied value as a hover tooltip.
pub fn points_with_unmultiplied(
    field: &'static str,
    unmultiplied_field: &'static str,
) -> impl Fn(&Value) -> Result<Cell, RenderError> + Send + Sync {
    move |record| {
        let text = format_number(required_number(record, field)?);
        Ok(match optional(record, unmultiplied_field) {
            Some(Value::Number(n)) => Cell::Tooltip {
                text,
                tooltip: format!("Unmultiplied: {}", format_number(n)),
            },
            _ => Cell::Text { text },
        })
    }
}

/// Resolves an id field into a display name fetched from another collection.
/// Unknown ids fall back to the raw id.
pub fn lookup(
    field: &'static str,
    names: Arc<HashMap<i64, String>>,
) -> impl Fn(&Value) -> Result<Cell, RenderError> + Send + Sync {
    move |record| {
        let Some(id) = optional(record, field) else {
            return Ok(Cell::Empty);
        };
        let name = id.as_i64().and_then(|id| names.get(&id));
        Ok(match name {
            Some(name) => Cell::text(name.clone()),
            None => Cell::text(value_text(id)),
        })
    }
}

/// Builds an id → name index from fetched records, skipping malformed ones.
pub fn name_index(records: &[Value], name_field: &str) -> HashMap<i64, String> {
    records
        .iter()
        .filter_map(|r| {
            let id = r.get("id")?.as_i64()?;
            let name = r.get(name_field).map(value_text)?;
            Some((id, name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn groups_thousands() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(1234567), "1,234,567");
        assert_eq!(group_digits(-45000), "-45,000");
        assert_eq!(group_digits(i64::MIN), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn large_unsigned_counts_are_not_clamped() {
        assert_eq!(format_number(&Number::from(u64::MAX)), "18,446,744,073,709,551,615");
        let record = json!({"points": 12_000_000_000_000_000_000u64});
        assert_eq!(
            number("points")(&record).unwrap(),
            Cell::text("12,000,000,000,000,000,000")
        );
    }

    #[test]
    fn formats_fractional_numbers() {
        let n = Number::from_f64(12345.5).unwrap();
        assert_eq!(format_number(&n), "12,345.5");
        let n = Number::from_f64(1.0).unwrap();
        assert_eq!(format_number(&n), "1");
    }

    #[test]
    fn optional_fields_render_empty() {
        let record = json!({"category": null, "profileLink": ""});
        assert_eq!(optional_text("category")(&record).unwrap(), Cell::Empty);
        assert_eq!(optional_link("profileLink", "Profile")(&record).unwrap(), Cell::Empty);
        assert_eq!(optional_number("units")(&record).unwrap(), Cell::Empty);
    }

    #[test]
    fn required_field_reports_name() {
        let err = number("points")(&json!({})).unwrap_err();
        assert_eq!(
            err,
            RenderError::MissingField {
                field: "points".to_string()
            }
        );
        let err = number("points")(&json!({"points": "lots"})).unwrap_err();
        assert!(matches!(err, RenderError::UnexpectedType { .. }));
    }

    #[test]
    fn points_carry_unmultiplied_tooltip() {
        let record = json!({"multipliedPoints": 2500000, "points": 1250000});
        let cell = points_with_unmultiplied("multipliedPoints", "points")(&record).unwrap();
        assert_eq!(
            cell,
            Cell::Tooltip {
                text: "2,500,000".to_string(),
                tooltip: "Unmultiplied: 1,250,000".to_string(),
            }
        );
    }

    #[test]
    fn linked_text() {
        let record = json!({
            "displayName": "Folder",
            "profileLink": "https://stats.example/donor/1"
        });
        assert_eq!(
            text_with_link("displayName", "profileLink")(&record).unwrap(),
            Cell::Link {
                text: "Folder".to_string(),
                href: "https://stats.example/donor/1".to_string(),
            }
        );
    }

    #[test]
    fn lookup_resolves_ids_through_index() {
        let teams = vec![json!({"id": 4, "teamName": "Bronze Folders"}), json!({"name": "bad"})];
        let index = Arc::new(name_index(&teams, "teamName"));
        assert_eq!(index.len(), 1);
        let extract = lookup("teamId", index);
        assert_eq!(extract(&json!({"teamId": 4})).unwrap(), Cell::text("Bronze Folders"));
        assert_eq!(extract(&json!({"teamId": 9})).unwrap(), Cell::text("9"));
        assert_eq!(extract(&json!({})).unwrap(), Cell::Empty);
    }
}
