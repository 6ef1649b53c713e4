//! Record projector: reshapes raw records into flattened views.

use document_store::Document;
use document_store::document::resolve_path;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::spec::{ExtractionRule, ProjectionSpec};

/// Flattened view of an order record.
///
/// Scalar fields are carried over as-is; marketplace sub-documents appear
/// as the `lazada_info`, `shopee_info` and `line_shopping_info` sub-objects,
/// each of which is `null` when its source data is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectedOrderView(Document);

impl ProjectedOrderView {
    /// Returns an output field. A `null` sub-object is returned as `Some(Null)`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns the named sub-object, or `None` when it is `null` or missing.
    pub fn sub_object(&self, field: &str) -> Option<&Map<String, Value>> {
        self.0.get(field).and_then(Value::as_object)
    }

    pub fn lazada_info(&self) -> Option<&Map<String, Value>> {
        self.sub_object("lazada_info")
    }

    pub fn shopee_info(&self) -> Option<&Map<String, Value>> {
        self.sub_object("shopee_info")
    }

    pub fn line_shopping_info(&self) -> Option<&Map<String, Value>> {
        self.sub_object("line_shopping_info")
    }

    pub fn as_document(&self) -> &Document {
        &self.0
    }

    pub fn into_document(self) -> Document {
        self.0
    }
}

/// Applies a [`ProjectionSpec`] to records.
///
/// Projection is total: missing optional data produces `null` sub-objects
/// or omitted fields, never an error. The input record is only borrowed.
#[derive(Debug, Clone)]
pub struct RecordProjector {
    spec: ProjectionSpec,
}

impl RecordProjector {
    /// Creates a projector for the given spec.
    pub fn new(spec: ProjectionSpec) -> Self {
        Self { spec }
    }

    /// Creates a projector using [`ProjectionSpec::order_view`].
    pub fn for_orders() -> Self {
        Self::new(ProjectionSpec::order_view())
    }

    pub fn spec(&self) -> &ProjectionSpec {
        &self.spec
    }

    /// Projects one record with this projector's spec.
    pub fn project(&self, record: &Document) -> ProjectedOrderView {
        project(record, &self.spec)
    }
}

impl Default for RecordProjector {
    fn default() -> Self {
        Self::for_orders()
    }
}

/// Projects `record` through `spec`, producing only the fields the spec names.
pub fn project(record: &Document, spec: &ProjectionSpec) -> ProjectedOrderView {
    let mut output = Document::new();
    for (name, rule) in spec.rules() {
        if let Some(value) = extract(record, rule) {
            output.insert(name, value);
        }
    }
    ProjectedOrderView(output)
}

fn extract(record: &Document, rule: &ExtractionRule) -> Option<Value> {
    match rule {
        ExtractionRule::Field(path) => record.get_path(path).cloned(),
        ExtractionRule::FirstOf { sequence, fields } => Some(
            record
                .first_of(sequence)
                .map_or(Value::Null, |head| pick(head, fields)),
        ),
        ExtractionRule::SubFields { document, fields } => Some(match record.get_path(document) {
            Some(sub @ Value::Object(_)) => pick(sub, fields),
            _ => Value::Null,
        }),
    }
}

/// Copies the present `(output, path)` fields of `source` into a new object.
fn pick(source: &Value, fields: &[(String, String)]) -> Value {
    let picked: Map<String, Value> = fields
        .iter()
        .filter_map(|(output, path)| {
            resolve_path(source, path).map(|value| (output.clone(), value.clone()))
        })
        .collect();
    Value::Object(picked)
}
