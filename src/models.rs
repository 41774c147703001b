use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A customer record stored in the `customers` map under its `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub balance: f64,
}

/// Why a create request body was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("body is not a JSON object")]
    MalformedJson,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` has an unusable value")]
    InvalidField(&'static str),
}

impl Customer {
    pub fn new(id: i64, name: impl Into<String>, balance: f64) -> Self {
        Self {
            id,
            name: name.into(),
            balance,
        }
    }

    /// Decodes a create request body.
    ///
    /// `id` may be a JSON integer, an integral number or a numeric string;
    /// `balance` a finite number or numeric string; `name` must be a string.
    /// Unknown fields are ignored.
    pub fn from_json(body: &[u8]) -> Result<Self, ValidationError> {
        let object: Map<String, Value> =
            serde_json::from_slice(body).map_err(|_| ValidationError::MalformedJson)?;

        let id = required(&object, "id")
            .and_then(|v| to_id(v).ok_or(ValidationError::InvalidField("id")))?;
        let name = required(&object, "name").and_then(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or(ValidationError::InvalidField("name"))
        })?;
        let balance = required(&object, "balance")
            .and_then(|v| to_balance(v).ok_or(ValidationError::InvalidField("balance")))?;

        Ok(Self { id, name, balance })
    }
}

fn required<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Value, ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn to_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn to_balance(value: &Value) -> Option<f64> {
    let balance = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    balance.is_finite().then_some(balance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_well_formed_body() {
        let customer =
            Customer::from_json(br#"{"id": 1, "name": "Alice", "balance": 100.5}"#).unwrap();
        assert_eq!(customer, Customer::new(1, "Alice", 100.5));
    }

    #[test]
    fn converts_numeric_strings_and_integral_floats() {
        let customer =
            Customer::from_json(br#"{"id": "42", "name": "Bob", "balance": "6000"}"#).unwrap();
        assert_eq!(customer, Customer::new(42, "Bob", 6000.0));

        let customer =
            Customer::from_json(br#"{"id": 7.0, "name": "Eve", "balance": 3}"#).unwrap();
        assert_eq!(customer, Customer::new(7, "Eve", 3.0));
    }

    #[test]
    fn reports_which_field_failed() {
        assert_eq!(
            Customer::from_json(br#"{"id": 1, "name": "Alice"}"#),
            Err(ValidationError::MissingField("balance"))
        );
        assert_eq!(
            Customer::from_json(br#"{"id": 1.5, "name": "Alice", "balance": 1}"#),
            Err(ValidationError::InvalidField("id"))
        );
        assert_eq!(
            Customer::from_json(br#"{"id": 1, "name": 5, "balance": 1}"#),
            Err(ValidationError::InvalidField("name"))
        );
        assert_eq!(
            Customer::from_json(br#"{"id": 1, "name": "A", "balance": "lots"}"#),
            Err(ValidationError::InvalidField("balance"))
        );
        assert_eq!(
            Customer::from_json(br#"{"id": null, "name": "A", "balance": 1}"#),
            Err(ValidationError::MissingField("id"))
        );
    }

    #[test]
    fn rejects_non_objects() {
        assert_eq!(Customer::from_json(b""), Err(ValidationError::MalformedJson));
        assert_eq!(Customer::from_json(b"{not json"), Err(ValidationError::MalformedJson));
        assert_eq!(Customer::from_json(b"[1, 2]"), Err(ValidationError::MalformedJson));
    }
}
