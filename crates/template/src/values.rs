//! Typed order values as handed over by the order system.

use crate::ValidationError;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Printed form of dates on the order form.
pub const DATE_FORMAT: &str = "%d/%m/%Y";
/// Printed form of times on the order form.
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Encoded image bytes (PNG, JPEG), stored as hex in snapshots.
    Image(#[serde(with = "hex_bytes")] Arc<Vec<u8>>),
}

impl FieldValue {
    /// Blank text and empty images count as absent.
    pub fn is_missing(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Image(bytes) => bytes.is_empty(),
            _ => false,
        }
    }

    pub fn image(bytes: Vec<u8>) -> Self {
        FieldValue::Image(Arc::new(bytes))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        FieldValue::Date(d)
    }
}

impl From<NaiveTime> for FieldValue {
    fn from(t: NaiveTime) -> Self {
        FieldValue::Time(t)
    }
}

/// Flat key to value mapping of one order, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderData(BTreeMap<String, FieldValue>);

impl OrderData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.0.remove(key)
    }

    /// The value under `key`, unless it is absent or blank.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key).filter(|v| !v.is_missing())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    /// Builds order data from a flat JSON object.
    ///
    /// Strings, numbers and booleans map to the matching variants and
    /// `null` means absent. Nested values are rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ValidationError> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::new("<order>", "order data must be a JSON object"))?;

        let mut data = OrderData::new();
        for (key, value) in object {
            let value = match value {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) => FieldValue::Text(s.clone()),
                serde_json::Value::Bool(b) => FieldValue::Bool(*b),
                serde_json::Value::Number(n) => FieldValue::Number(
                    n.as_f64()
                        .ok_or_else(|| ValidationError::new(key, "number out of range"))?,
                ),
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                    return Err(ValidationError::new(key, "nested values are not supported"));
                }
            };
            data.insert(key.clone(), value);
        }
        Ok(data)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ValidationError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ValidationError::new("<order>", format!("invalid JSON: {e}")))?;
        Self::from_json(&value)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer, de};
    use std::sync::Arc;

    pub fn serialize<S: Serializer>(bytes: &Arc<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes.as_slice()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Arc<Vec<u8>>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map(Arc::new).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_counts_as_missing() {
        let data = OrderData::new()
            .with("client_name", "   ")
            .with("client_city", "Namur");
        assert!(data.get("client_name").is_none());
        assert_eq!(data.get("client_city"), Some(&FieldValue::from("Namur")));
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn flat_json_maps_to_variants() {
        let data = OrderData::from_json_str(
            r#"{"client_name":"Dupont","passengers_adult":2,"is_paid":true,"retour_date":null}"#,
        )
        .unwrap();
        assert_eq!(data.get("passengers_adult"), Some(&FieldValue::Number(2.0)));
        assert_eq!(data.get("is_paid"), Some(&FieldValue::Bool(true)));
        assert!(data.get("retour_date").is_none());
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn nested_json_names_the_offending_key() {
        let err = OrderData::from_json_str(r#"{"client":{"name":"x"}}"#).unwrap_err();
        assert_eq!(err.field, "client");
    }

    #[test]
    fn images_serialize_as_hex() {
        let data = OrderData::new().with("signature", FieldValue::image(vec![0x89, 0x50]));
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, r#"{"signature":{"image":"8950"}}"#);
        let back: OrderData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn dates_survive_serialization() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        let data = OrderData::new().with("aller_date", date);
        let back: OrderData = serde_json::from_str(&serde_json::to_string(&data).unwrap()).unwrap();
        assert_eq!(back.get("aller_date"), Some(&FieldValue::Date(date)));
    }
}
