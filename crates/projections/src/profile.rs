//! Customer profile records from `crm_customer_profiles`.

use chrono::NaiveDate;
use common::DocumentId;
use document_store::{Document, values_equal};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::rfm::RfmSummary;

/// An order reference inside a customer profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerOrder {
    /// Order id as stored; numeric or string depending on the source channel.
    pub order_id: Value,
    #[serde(default)]
    pub order_date: Option<String>,
    /// Numeric, or a numeric string in older exports.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub grand_total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub order_from: Option<i64>,
}

/// A channel identity (Shopee, Lazada, LINE, social) linked to a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSource {
    #[serde(default)]
    pub channel_id: Option<Value>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub wsis_id: Option<Value>,
    #[serde(default, alias = "social_id")]
    pub platform_id: Option<String>,
}

/// A consolidated customer profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    /// Stored either as one name or as a list of known names.
    #[serde(default, deserialize_with = "one_or_many")]
    pub full_name: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub sources: Vec<CustomerSource>,
    #[serde(default)]
    pub rfm: Value,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub orders: Vec<CustomerOrder>,
    /// Fields not modelled above, kept so nothing is lost on the way out.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CustomerProfile {
    /// Reads a profile out of a stored document.
    pub fn from_document(document: Document) -> serde_json::Result<Self> {
        serde_json::from_value(document.into_value())
    }

    /// Returns true if any of the profile's orders has this id.
    ///
    /// Numbers compare numerically, the same way order-id lookups match.
    pub fn has_order(&self, order_id: &Value) -> bool {
        self.orders
            .iter()
            .any(|o| values_equal(&o.order_id, order_id))
    }

    /// Scores the profile's order history as of `snapshot`.
    pub fn rfm_summary(&self, snapshot: NaiveDate) -> Option<RfmSummary> {
        RfmSummary::from_orders(&self.orders, snapshot)
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(name) if name.trim().is_empty() => Vec::new(),
        OneOrMany::One(name) => vec![name],
        OneOrMany::Many(names) => names,
        OneOrMany::Null(()) => Vec::new(),
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(number_of))
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(number_of)
        .filter(|n| n.fract() == 0.0)
        .map(|n| n as i64))
}

/// Reads a JSON number or a numeric string; anything else is treated as absent.
fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}
