//! Request body validation.
//!
//! Bodies are checked field by field so that every offending field is reported
//! at once, each as `{loc, msg, type}`.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::storage::{WeatherReport, WeatherReportUpdate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    fn new(loc: &[&str], kind: &str, msg: &str) -> Self {
        Self {
            loc: loc.iter().map(|s| s.to_string()).collect(),
            msg: msg.to_string(),
            kind: kind.to_string(),
        }
    }

    fn missing(field: &str) -> Self {
        Self::new(&[field], "missing", "Field required")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} invalid field(s) in request body", .0.len())]
pub struct ValidationErrors(pub Vec<FieldError>);

/// How a string that is not an integer gets reported for a given field.
#[derive(Clone, Copy)]
enum StringRule {
    Number,
    Integer,
}

impl StringRule {
    fn error(self, field: &str) -> FieldError {
        match self {
            StringRule::Number => FieldError::new(
                &[field],
                "float_parsing",
                "Input should be a valid number, unable to parse string as a number",
            ),
            StringRule::Integer => FieldError::new(
                &[field],
                "int_parsing",
                "Input should be a valid integer, unable to parse string as an integer",
            ),
        }
    }
}

fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ValidationErrors> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        ValidationErrors(vec![FieldError::new(
            &[],
            "json_invalid",
            &format!("Invalid JSON: {}", e),
        )])
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ValidationErrors(vec![FieldError::new(
            &[],
            "model_type",
            "Input should be a valid dictionary or object",
        )])),
    }
}

fn float_to_int(field: &str, f: f64) -> Result<i64, FieldError> {
    if f.fract() != 0.0 || !f.is_finite() {
        return Err(FieldError::new(
            &[field],
            "int_from_float",
            "Input should be a valid integer, got a number with a fractional part",
        ));
    }
    if f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return Err(FieldError::new(
            &[field],
            "int_parsing_size",
            "Unable to parse input string as an integer, exceeded maximum size",
        ));
    }
    Ok(f as i64)
}

/// `Ok(None)` when the field is absent.
fn int_field(
    obj: &Map<String, Value>,
    field: &str,
    rule: StringRule,
) -> Result<Option<i64>, FieldError> {
    let value = match obj.get(field) {
        None => return Ok(None),
        Some(v) => v,
    };
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Some(i)),
            None => float_to_int(field, n.as_f64().unwrap_or(f64::NAN)).map(Some),
        },
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Some(i));
            }
            // only number fields take float notation inside strings
            match (rule, s.parse::<f64>()) {
                (StringRule::Number, Ok(f)) => float_to_int(field, f).map(Some),
                _ => Err(rule.error(field)),
            }
        }
        _ => Err(FieldError::new(
            &[field],
            "int_type",
            "Input should be a valid integer",
        )),
    }
}

fn string_field(obj: &Map<String, Value>, field: &str) -> Result<Option<String>, FieldError> {
    match obj.get(field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(FieldError::new(
            &[field],
            "string_type",
            "Input should be a valid string",
        )),
    }
}

fn required<T>(
    field: &str,
    res: Result<Option<T>, FieldError>,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    match res {
        Ok(Some(v)) => Some(v),
        Ok(None) => {
            errors.push(FieldError::missing(field));
            None
        }
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

pub fn parse_report(body: &[u8]) -> Result<WeatherReport, ValidationErrors> {
    let obj = parse_object(body)?;
    let mut errors = Vec::new();

    let temperature = required(
        "temperature",
        int_field(&obj, "temperature", StringRule::Number),
        &mut errors,
    );
    let condition = required("condition", string_field(&obj, "condition"), &mut errors);
    let timestamp = required(
        "timestamp",
        int_field(&obj, "timestamp", StringRule::Integer),
        &mut errors,
    );

    match (temperature, condition, timestamp) {
        (Some(temperature), Some(condition), Some(timestamp)) => Ok(WeatherReport {
            temperature,
            condition,
            timestamp,
        }),
        _ => Err(ValidationErrors(errors)),
    }
}

pub fn parse_update(body: &[u8]) -> Result<WeatherReportUpdate, ValidationErrors> {
    let obj = parse_object(body)?;
    let mut errors = Vec::new();

    let temperature = required(
        "temperature",
        int_field(&obj, "temperature", StringRule::Number),
        &mut errors,
    );
    let condition = required("condition", string_field(&obj, "condition"), &mut errors);
    let timestamp = match obj.get("timestamp") {
        Some(Value::Null) => None,
        _ => match int_field(&obj, "timestamp", StringRule::Integer) {
            Ok(ts) => ts,
            Err(e) => {
                errors.push(e);
                None
            }
        },
    };

    match (temperature, condition) {
        (Some(temperature), Some(condition)) if errors.is_empty() => Ok(WeatherReportUpdate {
            temperature,
            condition,
            timestamp,
        }),
        _ => Err(ValidationErrors(errors)),
    }
}
