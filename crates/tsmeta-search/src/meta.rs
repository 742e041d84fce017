//! Time-series metadata documents.
//!
//! A [`TsMeta`] describes one time series: its TSUID, the metric and tag UIDs
//! it is built from, and free-form annotations. Indexed documents look like:
//!
//! ```json
//! {
//!   "tsuid": "010101",
//!   "metric": { "uid": "01", "type": "METRIC", "name": "sys.cpu.user", ... },
//!   "tags": [
//!     { "uid": "01", "type": "TAGK", "name": "host", ... },
//!     { "uid": "01", "type": "TAGV", "name": "web01", ... }
//!   ],
//!   "description": "",
//!   "displayName": "Testing",
//!   "max": "NaN",
//!   "min": "NaN",
//!   ...
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::SchemaResult;

/// An entity the schema can write to the store.
pub trait Document: Send + Sync {
    /// The stable key the document is stored under.
    fn document_id(&self) -> &str;

    /// Serializes the document into the request payload.
    fn to_bytes(&self) -> SchemaResult<Vec<u8>>;
}

/// Kind of a UID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UniqueIdType {
    /// Metric name.
    Metric,
    /// Tag key.
    Tagk,
    /// Tag value.
    Tagv,
}

/// Metadata attached to a single UID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UidMeta {
    /// Hex-encoded UID.
    pub uid: String,
    /// What the UID names.
    #[serde(rename = "type")]
    pub uid_type: UniqueIdType,
    /// The name mapped to the UID.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Free-form notes.
    pub notes: String,
    /// Creation time (Unix seconds).
    pub created: i64,
    /// User-defined key/value pairs.
    pub custom: Option<HashMap<String, String>>,
    /// Display name.
    pub display_name: String,
}

impl UidMeta {
    /// Creates UID metadata from raw UID bytes.
    pub fn new(uid_type: UniqueIdType, uid: &[u8], name: impl Into<String>) -> Self {
        Self {
            uid: uid.iter().map(|b| format!("{:02X}", b)).collect(),
            uid_type,
            name: name.into(),
            description: String::new(),
            notes: String::new(),
            created: 0,
            custom: None,
            display_name: String::new(),
        }
    }
}

/// Metadata for one time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TsMeta {
    /// Hex-encoded TSUID; the document key.
    pub tsuid: String,
    /// Metric UID metadata.
    pub metric: Option<UidMeta>,
    /// Tag key/value UID metadata, in tag order.
    pub tags: Vec<UidMeta>,
    /// Free-form description.
    pub description: String,
    /// Free-form notes.
    pub notes: String,
    /// Creation time (Unix seconds).
    pub created: i64,
    /// User-defined key/value pairs.
    pub custom: Option<HashMap<String, String>>,
    /// Units of the stored values.
    pub units: String,
    /// Retention in days.
    pub retention: i32,
    /// Maximum expected value.
    #[serde(serialize_with = "serialize_bound")]
    pub max: f64,
    /// Minimum expected value.
    #[serde(serialize_with = "serialize_bound")]
    pub min: f64,
    /// Display name.
    pub display_name: String,
    /// Kind of data stored.
    pub data_type: String,
    /// Last time a data point was written (Unix seconds).
    pub last_received: i64,
    /// Number of data points written.
    pub total_datapoints: i64,
}

impl TsMeta {
    /// Creates an otherwise empty record for `tsuid`.
    pub fn new(tsuid: impl Into<String>) -> Self {
        Self {
            tsuid: tsuid.into(),
            metric: None,
            tags: Vec::new(),
            description: String::new(),
            notes: String::new(),
            created: 0,
            custom: None,
            units: String::new(),
            retention: 0,
            max: f64::NAN,
            min: f64::NAN,
            display_name: String::new(),
            data_type: String::new(),
            last_received: 0,
            total_datapoints: 0,
        }
    }

    /// Sets the metric UID metadata.
    pub fn with_metric(mut self, metric: UidMeta) -> Self {
        self.metric = Some(metric);
        self
    }

    /// Sets the tag UID metadata.
    pub fn with_tags(mut self, tags: Vec<UidMeta>) -> Self {
        self.tags = tags;
        self
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }
}

impl Document for TsMeta {
    fn document_id(&self) -> &str {
        &self.tsuid
    }

    fn to_bytes(&self) -> SchemaResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

// JSON has no NaN; unset bounds go out as the string "NaN".
fn serialize_bound<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_str("NaN")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn sample() -> TsMeta {
        TsMeta::new("010101")
            .with_display_name("Testing")
            .with_metric(UidMeta::new(UniqueIdType::Metric, &[1], "sys.cpu.user"))
            .with_tags(vec![
                UidMeta::new(UniqueIdType::Tagk, &[1], "host"),
                UidMeta::new(UniqueIdType::Tagv, &[1], "web01"),
            ])
    }

    #[test]
    fn test_document_id_is_tsuid() {
        assert_eq!(sample().document_id(), "010101");
    }

    #[test]
    fn test_serialized_layout() {
        let bytes = sample().to_bytes().unwrap();
        let doc: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(doc["tsuid"], "010101");
        assert_eq!(doc["displayName"], "Testing");
        assert_eq!(doc["metric"]["name"], "sys.cpu.user");
        assert_eq!(doc["metric"]["type"], "METRIC");
        assert_eq!(doc["metric"]["uid"], "01");
        assert_eq!(doc["tags"][0]["name"], "host");
        assert_eq!(doc["tags"][0]["type"], "TAGK");
        assert_eq!(doc["tags"][1]["name"], "web01");
        assert_eq!(doc["max"], "NaN");
        assert_eq!(doc["min"], "NaN");
        assert_eq!(doc["totalDatapoints"], 0);
    }

    #[test]
    fn test_finite_bounds_are_numbers() {
        let mut meta = TsMeta::new("02");
        meta.max = 100.0;
        meta.min = 0.5;
        let doc: Value = serde_json::from_slice(&meta.to_bytes().unwrap()).unwrap();
        assert_eq!(doc["max"], 100.0);
        assert_eq!(doc["min"], 0.5);
    }

    #[test]
    fn test_uid_hex_encoding() {
        let uid = UidMeta::new(UniqueIdType::Tagv, &[0, 0x1f, 0xab], "web02");
        assert_eq!(uid.uid, "001FAB");
    }
}
