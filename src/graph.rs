//! Graph entity types for the capture API.
//!
//! Defines the [`Node`] and [`Relationship`] payload shapes accepted by the
//! remote capture endpoints, plus helpers for external ID generation and
//! property serialization.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the SHA-256 digest for external IDs
/// (12 bytes).
const EXTERNAL_ID_LEN: usize = 24;

/// Generates a hash-based external ID from a key, a kind discriminator, and
/// a date.
///
/// The ID is the first 24 hex characters (12 bytes) of
/// `SHA-256("{key}_{kind}_{date}")`, short enough to be readable while still
/// unique across wells, emission types, and dates.
#[must_use]
pub fn external_id(key: &str, kind: &str, date: &str) -> String {
    let combined = format!("{}_{}_{}", key, kind, date);
    let digest = Sha256::digest(combined.as_bytes());
    hex::encode(digest)[..EXTERNAL_ID_LEN].to_string()
}

/// Combines year, month, and day strings into an ISO 8601 date string,
/// zero-padding the components to 4/2/2 digits.
///
/// Returns `None` when any component is blank; a measurement node cannot be
/// keyed without a complete date, so the caller skips such rows.
#[must_use]
pub fn date_string(year: &str, month: &str, day: &str) -> Option<String> {
    let year = year.trim();
    let month = month.trim();
    let day = day.trim();
    if year.is_empty() || month.is_empty() || day.is_empty() {
        return None;
    }
    Some(format!("{:0>4}-{:0>2}-{:0>2}", year, month, day))
}

/// Metadata attached to a measured property value.
///
/// Carries the unit of measure, the source spreadsheet, and verification
/// details the capture API stores alongside the value.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PropertyMetadata {
    /// Free-form metadata; currently just the unit of measure under `units`.
    pub custom_metadata: Value,
    /// Name of the source spreadsheet the value was loaded from.
    pub source: String,
    /// Assurance level reported to the capture API.
    pub assurance_level: u8,
    /// ISO 8601 timestamp of the load run.
    pub verified_time: String,
}

impl PropertyMetadata {
    /// Builds measurement metadata for a unit of measure.
    pub fn for_units(units: &str, source: &str, verified_time: &str) -> Self {
        Self {
            custom_metadata: serde_json::json!({ "units": units }),
            source: source.to_string(),
            assurance_level: 3,
            verified_time: verified_time.to_string(),
        }
    }
}

/// A single property in the capture API's array-of-properties format.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Property {
    /// Property name (the API calls this `type`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Property value; string or number.
    pub value: Value,
    /// Optional measurement metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PropertyMetadata>,
}

impl Property {
    /// A plain string property with no metadata.
    pub fn string(kind: &str, value: &str) -> Self {
        Self {
            kind: kind.to_string(),
            value: Value::String(value.to_string()),
            metadata: None,
        }
    }

    /// A numeric property, optionally carrying metadata.
    pub fn number(kind: &str, value: f64, metadata: Option<PropertyMetadata>) -> Self {
        Self {
            kind: kind.to_string(),
            value: serde_json::json!(value),
            metadata,
        }
    }
}

/// A node payload for `POST /capture/v1/nodes`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Node {
    /// Caller-assigned unique ID (well key or hash-based ID).
    pub external_id: String,
    /// Node type, e.g. `Well`, `Emissions`, `EmissionType`, or an emission
    /// type name for measurement nodes.
    #[serde(rename = "type")]
    pub kind: String,
    /// Extra labels; measurement nodes carry `Emission`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Properties in array format; empty values are omitted at build time.
    pub properties: Vec<Property>,
}

/// One endpoint of a relationship.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NodeRef {
    /// Node type of the endpoint.
    #[serde(rename = "type")]
    pub kind: String,
    /// External ID of the endpoint.
    pub external_id: String,
}

impl NodeRef {
    pub fn new(kind: &str, external_id: &str) -> Self {
        Self {
            kind: kind.to_string(),
            external_id: external_id.to_string(),
        }
    }
}

/// A relationship payload for `POST /capture/v1/relationships`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Relationship {
    /// Source endpoint.
    pub source: NodeRef,
    /// Target endpoint.
    pub target: NodeRef,
    /// Relationship type, e.g. `HAS_EMISSIONS`, `HAS_TYPE`, `HAS_DATA`,
    /// `NEXT_DATE`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl Relationship {
    pub fn new(source: NodeRef, target: NodeRef, kind: &str) -> Self {
        Self {
            source,
            target,
            kind: kind.to_string(),
        }
    }
}
