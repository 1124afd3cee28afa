// Argument normalization
//
// Validates a loosely-typed argument bag against a catalog entry and
// produces the exact parameter set the bound operation receives. Defaults
// are substituted here, so operations never re-implement them.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{DispatchError, ProviderError};
use crate::tools::catalog::{ParamKind, ToolSpec};

/// Normalized arguments handed to a capability operation
pub type Args = Map<String, Value>;

/// Validate and normalize `arguments` against `spec`.
///
/// `now` is the clock reading used to render dynamic time defaults;
/// the dispatcher passes the current time, tests pass a fixed instant.
pub fn normalize(
    spec: &ToolSpec,
    arguments: &Value,
    now: DateTime<Utc>,
) -> Result<Args, DispatchError> {
    let supplied = match arguments {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            return Err(DispatchError::Validation(format!(
                "arguments must be a JSON object, got {}",
                json_kind(other)
            )))
        }
    };

    // additionalProperties: false holds at runtime too
    for key in supplied.keys() {
        if spec.param(key).is_none() {
            return Err(DispatchError::Validation(format!(
                "unknown parameter '{}' for tool '{}'",
                key, spec.name
            )));
        }
    }

    let mut normalized = Map::new();

    for param in &spec.params {
        let raw = supplied.get(param.name).filter(|v| !v.is_null());

        let value = match raw {
            Some(value) => coerce(spec, param.name, param.kind, value)?,
            None => match &param.default {
                Some(default) => default.render(now),
                None if param.required => {
                    return Err(DispatchError::Validation(format!(
                        "missing required parameter '{}' for tool '{}'",
                        param.name, spec.name
                    )))
                }
                None => continue,
            },
        };

        if let (Some(allowed), Some(s)) = (param.allowed, value.as_str()) {
            if !allowed.contains(&s) {
                return Err(DispatchError::Validation(format!(
                    "parameter '{}' must be one of [{}], got '{}'",
                    param.name,
                    allowed.join(", "),
                    s
                )));
            }
        }

        normalized.insert(param.name.to_string(), value);
    }

    Ok(normalized)
}

/// Coerce a supplied value to the declared primitive kind.
///
/// String-encoded numbers and booleans are accepted, since upstream
/// engines frequently stringify everything.
fn coerce(
    spec: &ToolSpec,
    name: &str,
    kind: ParamKind,
    value: &Value,
) -> Result<Value, DispatchError> {
    let coerced = match (kind, value) {
        (ParamKind::String, Value::String(_)) => Some(value.clone()),
        (ParamKind::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (ParamKind::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
        (ParamKind::Integer, Value::Number(n)) => n.as_i64().map(|i| Value::Number(i.into())),
        (ParamKind::Integer, Value::String(s)) => {
            s.trim().parse::<i64>().ok().map(|i| Value::Number(i.into()))
        }
        (ParamKind::Boolean, Value::Bool(_)) => Some(value.clone()),
        (ParamKind::Boolean, Value::String(s)) => match s.trim() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };

    coerced.ok_or_else(|| {
        DispatchError::Validation(format!(
            "parameter '{}' of tool '{}' expects {}, got {}",
            name,
            spec.name,
            kind.json_name(),
            json_kind(value)
        ))
    })
}

/// Fetch a string parameter the normalizer guarantees to be present.
///
/// A miss means the binding and the catalog disagree about the parameter
/// set, which is a provider bug, so it surfaces as an operation error
/// rather than a panic.
pub fn str_arg<'a>(args: &'a Args, name: &str) -> Result<&'a str, ProviderError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::Operation(format!("missing normalized parameter '{}'", name)))
}

/// Fetch an optional string parameter (no default declared)
pub fn opt_str_arg<'a>(args: &'a Args, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

/// Fetch an integer parameter the normalizer guarantees to be present
pub fn int_arg(args: &Args, name: &str) -> Result<i64, ProviderError> {
    args.get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| ProviderError::Operation(format!("missing normalized parameter '{}'", name)))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::catalog::find;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_create_event_defaults_to_primary_calendar() {
        let spec = find("create_event").unwrap();
        let args = json!({
            "summary": "Sync",
            "start_time": "2024-01-01T10:00:00Z",
            "end_time": "2024-01-01T11:00:00Z"
        });

        let normalized = normalize(spec, &args, fixed_now()).unwrap();
        assert_eq!(normalized["calendar_id"], "primary");
        assert_eq!(normalized["summary"], "Sync");
        // No default and not supplied: simply absent
        assert!(!normalized.contains_key("location"));
    }

    #[test]
    fn test_list_events_defaults_every_parameter() {
        let spec = find("list_events").unwrap();
        let normalized = normalize(spec, &json!({}), fixed_now()).unwrap();

        assert_eq!(normalized["calendar_id"], "primary");
        assert_eq!(normalized["max_results"], 10);
        assert_eq!(normalized["time_min"], "2024-01-01T10:00:00Z");
        assert_eq!(normalized["time_max"], "2024-01-08T10:00:00Z");
    }

    #[test]
    fn test_missing_required_parameter_rejected() {
        let spec = find("create_calendar").unwrap();
        let err = normalize(spec, &json!({}), fixed_now()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("missing required parameter 'summary'"));
        assert!(msg.contains("create_calendar"));
    }

    #[test]
    fn test_enum_violation_rejected() {
        let spec = find("send_email").unwrap();
        let args = json!({
            "to": "a@example.com",
            "subject": "Hi",
            "body": "Hello",
            "content_type": "markdown"
        });
        let err = normalize(spec, &args, fixed_now()).unwrap_err();
        assert!(err.to_string().contains("must be one of [plain, html]"));
    }

    #[test]
    fn test_enum_default_applies() {
        let spec = find("send_email").unwrap();
        let args = json!({"to": "a@example.com", "subject": "Hi", "body": "Hello"});
        let normalized = normalize(spec, &args, fixed_now()).unwrap();
        assert_eq!(normalized["content_type"], "plain");
    }

    #[test]
    fn test_string_encoded_integer_coerced() {
        let spec = find("list_emails").unwrap();
        let normalized = normalize(spec, &json!({"max_results": "5"}), fixed_now()).unwrap();
        assert_eq!(normalized["max_results"], 5);
    }

    #[test]
    fn test_wrong_type_rejected() {
        let spec = find("list_emails").unwrap();
        let err = normalize(spec, &json!({"max_results": [1, 2]}), fixed_now()).unwrap_err();
        assert!(err.to_string().contains("expects integer"));
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let spec = find("read_file").unwrap();
        let args = json!({"file_path": "a.txt", "encoding": "utf-8"});
        let err = normalize(spec, &args, fixed_now()).unwrap_err();
        assert!(err.to_string().contains("unknown parameter 'encoding'"));
    }

    #[test]
    fn test_null_treated_as_absent() {
        let spec = find("list_events").unwrap();
        let normalized = normalize(spec, &json!({"calendar_id": null}), fixed_now()).unwrap();
        assert_eq!(normalized["calendar_id"], "primary");
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let spec = find("list_calendars").unwrap();
        let err = normalize(spec, &json!("nope"), fixed_now()).unwrap_err();
        assert!(err.to_string().contains("must be a JSON object"));
    }
}
