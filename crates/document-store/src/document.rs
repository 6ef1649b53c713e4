use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{DocumentId, DocumentStoreError, Result};

/// Name of the identifier field every stored document carries.
pub const ID_FIELD: &str = "_id";

/// A schemaless record: an owned JSON object with dotted-path access.
///
/// Documents are read-only snapshots as far as the query side is concerned;
/// nothing in this crate mutates a document after it has been fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a JSON value into a document.
    ///
    /// Fails with `InvalidDocument` if the value is not an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DocumentStoreError::InvalidDocument(format!(
                "expected a JSON object, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Returns the document id, if present.
    ///
    /// Accepts string and numeric ids as well as extended-JSON object ids
    /// (`{"$oid": "..."}`) as produced by document database exports.
    pub fn id(&self) -> Option<DocumentId> {
        match self.0.get(ID_FIELD)? {
            Value::String(s) => Some(DocumentId::new(s.as_str())),
            Value::Number(n) => Some(DocumentId::new(n.to_string())),
            Value::Object(obj) => obj
                .get("$oid")
                .and_then(Value::as_str)
                .map(DocumentId::new),
            _ => None,
        }
    }

    /// Sets the document id.
    pub fn set_id(&mut self, id: &DocumentId) {
        self.0
            .insert(ID_FIELD.to_string(), Value::String(id.as_str().to_string()));
    }

    /// Returns a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Resolves a dotted path such as `order_line_shopping.shipping_address.address`.
    ///
    /// Numeric segments index into arrays. Returns `None` as soon as a
    /// segment is missing or the value under it cannot be descended into.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let (first, rest) = match path.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (path, None),
        };
        let value = self.0.get(first)?;
        match rest {
            Some(rest) => resolve_path(value, rest),
            None => Some(value),
        }
    }

    /// Returns the first element of the sequence stored at `path`.
    ///
    /// `None` when the field is missing, `null`, not an array, or empty.
    pub fn first_of(&self, path: &str) -> Option<&Value> {
        head(self.get_path(path))
    }

    /// Inserts a top-level field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Returns true if the top-level field exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterates over top-level fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        document.into_value()
    }
}

impl TryFrom<Value> for Document {
    type Error = DocumentStoreError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

/// Resolves a dotted path relative to an arbitrary JSON value.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Optional head of a sequence.
pub fn head(value: Option<&Value>) -> Option<&Value> {
    match value? {
        Value::Array(items) => items.first(),
        _ => None,
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
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
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_value(value).unwrap()
    }

    #[test]
    fn from_value_rejects_non_objects() {
        let err = Document::from_value(json!([1, 2])).unwrap_err();
        assert!(matches!(err, DocumentStoreError::InvalidDocument(_)));
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn get_path_descends_objects_and_arrays() {
        let d = doc(json!({
            "order_line_shopping": {"shipping_address": {"address": "123 Main Rd"}},
            "order_shopee": [{"raw_body": {"buyer_user_id": 42}}]
        }));

        assert_eq!(
            d.get_path("order_line_shopping.shipping_address.address"),
            Some(&json!("123 Main Rd"))
        );
        assert_eq!(d.get_path("order_shopee.0.raw_body.buyer_user_id"), Some(&json!(42)));
        assert_eq!(d.get_path("order_shopee.1.raw_body"), None);
        assert_eq!(d.get_path("order_line_shopping.missing"), None);
    }

    #[test]
    fn get_path_stops_at_scalars() {
        let d = doc(json!({"grand_total": 100}));
        assert_eq!(d.get_path("grand_total.cents"), None);
    }

    #[test]
    fn first_of_handles_missing_empty_and_non_arrays() {
        let d = doc(json!({
            "order_lazada": [{"customer_first_name": "A"}, {"customer_first_name": "Z"}],
            "order_shopee": [],
            "order_line_shopping": null,
            "grand_total": 10
        }));

        assert_eq!(
            d.first_of("order_lazada"),
            Some(&json!({"customer_first_name": "A"}))
        );
        assert_eq!(d.first_of("order_shopee"), None);
        assert_eq!(d.first_of("order_line_shopping"), None);
        assert_eq!(d.first_of("grand_total"), None);
        assert_eq!(d.first_of("nowhere"), None);
    }

    #[test]
    fn id_accepts_string_number_and_oid() {
        assert_eq!(doc(json!({"_id": "cust_1"})).id(), Some(DocumentId::new("cust_1")));
        assert_eq!(doc(json!({"_id": 7})).id(), Some(DocumentId::new("7")));
        assert_eq!(
            doc(json!({"_id": {"$oid": "65f1c0ffee"}})).id(),
            Some(DocumentId::new("65f1c0ffee"))
        );
        assert_eq!(doc(json!({"_id": true})).id(), None);
        assert_eq!(Document::new().id(), None);
    }

    #[test]
    fn set_id_overwrites() {
        let mut d = doc(json!({"_id": "old"}));
        d.set_id(&DocumentId::new("new"));
        assert_eq!(d.id(), Some(DocumentId::new("new")));
    }
}
