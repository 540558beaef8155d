//! Best-effort field extraction from loosely-typed JSON.

use serde_json::Value;

use crate::models::CentreError;

/// First non-null value under any of `keys`.
pub fn field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| value.get(*k))
        .find(|v| !v.is_null())
}

/// Scalar rendered as text; strings are trimmed, blanks dropped.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn text_field(value: &Value, keys: &[&str]) -> Option<String> {
    field(value, keys).and_then(text)
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Applicant text kept verbatim; lists are joined with `, `.
pub fn applicant_label(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(text)
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::String(s)) => s.clone(),
        Some(other) => text(other).unwrap_or_default(),
        None => String::new(),
    }
}

/// Interpret an upstream `error` member. Null, `false` and blanks mean healthy.
pub fn centre_error(value: Option<&Value>) -> Option<CentreError> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some(CentreError {
            code: 0,
            description: "Unknown error".to_string(),
        }),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(CentreError {
            code: 0,
            description: s.trim().to_string(),
        }),
        Value::Number(n) => Some(CentreError {
            code: n.as_i64().unwrap_or_default(),
            description: format!("Upstream error {n}"),
        }),
        Value::Array(items) => items.iter().find_map(|item| centre_error(Some(item))),
        obj @ Value::Object(_) => {
            let code = field(obj, &["code", "status", "status_code", "statusCode"])
                .and_then(integer)
                .unwrap_or_default();
            let description = text_field(obj, &["description", "message", "detail", "error"])
                .unwrap_or_else(|| "Unknown error".to_string());
            Some(CentreError { code, description })
        }
    }
}

/// Upstream keys are often lowercase slugs; title-case those for display.
pub fn display_label(raw: &str) -> String {
    let raw = raw.trim();
    if raw.chars().any(char::is_uppercase) {
        return raw.to_string();
    }
    raw.split(|c: char| c == ' ' || c == '_' || c == '-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_skips_nulls_and_tries_aliases() {
        let v = json!({ "earliestDate": null, "earliest_date": "2025-01-01" });
        assert_eq!(
            text_field(&v, &["earliestDate", "earliest_date"]),
            Some("2025-01-01".to_string())
        );
        assert_eq!(field(&json!("scalar"), &["x"]), None);
    }

    #[test]
    fn applicant_label_is_verbatim() {
        assert_eq!(applicant_label(Some(&json!("1,  2, 3"))), "1,  2, 3");
        assert_eq!(applicant_label(Some(&json!([4, "5"]))), "4, 5");
        assert_eq!(applicant_label(Some(&json!(7))), "7");
        assert_eq!(applicant_label(None), "");
    }

    #[test]
    fn error_shapes() {
        assert_eq!(centre_error(None), None);
        assert_eq!(centre_error(Some(&json!(null))), None);
        assert_eq!(centre_error(Some(&json!(""))), None);

        let e = centre_error(Some(&json!({ "code": "503", "message": "Down" }))).unwrap();
        assert_eq!((e.code, e.description.as_str()), (503, "Down"));

        let e = centre_error(Some(&json!("Blocked"))).unwrap();
        assert_eq!((e.code, e.description.as_str()), (0, "Blocked"));

        let e = centre_error(Some(&json!({}))).unwrap();
        assert_eq!(e.description, "Unknown error");
    }

    #[test]
    fn display_label_title_cases_slugs() {
        assert_eq!(display_label("united_kingdom"), "United Kingdom");
        assert_eq!(display_label("germany"), "Germany");
        assert_eq!(display_label("USA"), "USA");
        assert_eq!(display_label(" New Zealand "), "New Zealand");
    }
}
