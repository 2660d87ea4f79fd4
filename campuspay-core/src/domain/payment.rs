//! Payment and account payloads exchanged with the payment service

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A student PIN
///
/// Opaque to the client: format and policy are enforced server-side. The
/// service may send it back as a number or a string.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin(#[serde(deserialize_with = "deserialize_pin")] String);

impl Pin {
    pub fn new(pin: impl Into<String>) -> Self {
        Self(pin.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Pin {
    fn from(pin: &str) -> Self {
        Self::new(pin)
    }
}

impl From<String> for Pin {
    fn from(pin: String) -> Self {
        Self(pin)
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

/// Deserialize a PIN that can be number or string
fn deserialize_pin<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::String(s) => Ok(s),
        _ => Err(D::Error::custom("expected number or string for pin")),
    }
}

/// Balance and transaction history, as returned by the service
///
/// Both fields are kept verbatim so callers see exactly what the service sent.
/// `None` means the field was absent; an explicit `null` is `Some(Value::Null)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionHistory {
    #[serde(
        default,
        deserialize_with = "keep_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub balance: Option<JsonValue>,
    #[serde(
        default,
        deserialize_with = "keep_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub transactions: Option<JsonValue>,
}

fn keep_present<'de, D>(deserializer: D) -> Result<Option<JsonValue>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}

impl TransactionHistory {
    /// Balance as a decimal amount, when the service sent a number or numeric string
    pub fn balance_amount(&self) -> Option<Decimal> {
        self.balance.as_ref().and_then(json_amount)
    }

    /// Transaction entries when the service sent an array, otherwise empty
    pub fn entries(&self) -> &[JsonValue] {
        match &self.transactions {
            Some(JsonValue::Array(items)) => items,
            _ => &[],
        }
    }
}

/// Read a JSON number or numeric string as a decimal
pub fn json_amount(value: &JsonValue) -> Option<Decimal> {
    match value {
        JsonValue::Number(n) => n.to_string().parse::<Decimal>().ok().or_else(|| {
            n.as_f64().and_then(|f| Decimal::try_from(f).ok())
        }),
        JsonValue::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

/// Body of `POST /transaction`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub vendor_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub pin: Pin,
    pub device_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pin_accepts_number_or_string() {
        let pin: Pin = serde_json::from_value(json!(1234)).unwrap();
        assert_eq!(pin.expose(), "1234");
        let pin: Pin = serde_json::from_value(json!("0042")).unwrap();
        assert_eq!(pin.expose(), "0042");
        assert!(serde_json::from_value::<Pin>(json!(null)).is_err());
    }

    #[test]
    fn test_pin_debug_is_redacted() {
        assert_eq!(format!("{:?}", Pin::new("1234")), "Pin(****)");
    }

    #[test]
    fn test_history_is_kept_verbatim() {
        let body = json!({"balance": 1000, "transactions": [{"id": 1, "amt": 50}]});
        let history: TransactionHistory = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(serde_json::to_value(&history).unwrap(), body);
        assert_eq!(history.balance_amount(), Some(Decimal::new(1000, 0)));
    }

    #[test]
    fn test_history_missing_fields_stay_missing() {
        let history: TransactionHistory = serde_json::from_value(json!({"balance": 5})).unwrap();
        assert_eq!(history.transactions, None);
        assert!(history.entries().is_empty());
        assert_eq!(serde_json::to_value(&history).unwrap(), json!({"balance": 5}));

        let history: TransactionHistory = serde_json::from_value(json!({})).unwrap();
        assert_eq!(history.balance, None);
        assert_eq!(history.balance_amount(), None);
        assert_eq!(serde_json::to_value(&history).unwrap(), json!({}));
    }

    #[test]
    fn test_history_null_and_odd_shapes_pass_through() {
        let body = json!({"balance": null, "transactions": null});
        let history: TransactionHistory = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(history.transactions, Some(JsonValue::Null));
        assert_eq!(serde_json::to_value(&history).unwrap(), body);

        let body = json!({"balance": "n/a", "transactions": {"page": 1}});
        let history: TransactionHistory = serde_json::from_value(body.clone()).unwrap();
        assert!(history.entries().is_empty());
        assert_eq!(serde_json::to_value(&history).unwrap(), body);
    }

    #[test]
    fn test_balance_amount_from_string_and_garbage() {
        assert_eq!(json_amount(&json!("12.50")), Some(Decimal::new(1250, 2)));
        assert_eq!(json_amount(&json!(12.5)), Some(Decimal::new(125, 1)));
        assert_eq!(json_amount(&json!({"x": 1})), None);
        assert_eq!(json_amount(&JsonValue::Null), None);
    }

    #[test]
    fn test_payment_request_wire_shape() {
        let req = PaymentRequest {
            vendor_id: "V1".to_string(),
            amount: Decimal::new(500, 0),
            pin: Pin::new("1234"),
            device_id: "unknown".to_string(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["vendorId"], "V1");
        assert_eq!(value["amount"].as_f64(), Some(500.0));
        assert_eq!(value["pin"], "1234");
        assert_eq!(value["deviceId"], "unknown");
    }
}
