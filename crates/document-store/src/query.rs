use std::cmp::Ordering;

use serde_json::Value;

use crate::document::{Document, resolve_path};

/// A predicate over documents.
///
/// Paths are dotted (`raw_body.buyer_user_id`). Equality treats numbers
/// numerically, so `1` and `1.0` are equal. Range comparisons only match
/// values of the same JSON type.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// Matches every document.
    #[default]
    All,
    /// Field equals value. `Eq(path, null)` also matches a missing field.
    Eq { path: String, value: Value },
    /// Negation of `Eq`; matches documents where the field is missing.
    Ne { path: String, value: Value },
    /// Field is greater than or equal to value.
    Gte { path: String, value: Value },
    /// Field is less than or equal to value.
    Lte { path: String, value: Value },
    /// Some element of the array at `array` has `field` equal to `value`.
    ElemMatch {
        array: String,
        field: String,
        value: Value,
    },
    /// All sub-filters match.
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn ne(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Ne {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn gte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gte {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn lte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lte {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn elem_match(
        array: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self::ElemMatch {
            array: array.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    /// Combines two filters, flattening nested conjunctions.
    pub fn and(self, other: Filter) -> Self {
        let mut parts = match self {
            Filter::All => Vec::new(),
            Filter::And(parts) => parts,
            f => vec![f],
        };
        match other {
            Filter::All => {}
            Filter::And(more) => parts.extend(more),
            f => parts.push(f),
        }
        match parts.len() {
            0 => Filter::All,
            1 => parts.remove(0),
            _ => Filter::And(parts),
        }
    }

    /// Evaluates the filter against a document.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { path, value } => field_equals(document.get_path(path), value),
            Filter::Ne { path, value } => !field_equals(document.get_path(path), value),
            Filter::Gte { path, value } => document
                .get_path(path)
                .and_then(|v| compare_same_type(v, value))
                .is_some_and(Ordering::is_ge),
            Filter::Lte { path, value } => document
                .get_path(path)
                .and_then(|v| compare_same_type(v, value))
                .is_some_and(Ordering::is_le),
            Filter::ElemMatch {
                array,
                field,
                value,
            } => match document.get_path(array) {
                Some(Value::Array(items)) => items
                    .iter()
                    .any(|item| resolve_path(item, field).is_some_and(|v| values_equal(v, value))),
                _ => false,
            },
            Filter::And(filters) => filters.iter().all(|f| f.matches(document)),
        }
    }
}

fn field_equals(field: Option<&Value>, expected: &Value) -> bool {
    match field {
        Some(actual) => values_equal(actual, expected),
        None => expected.is_null(),
    }
}

/// JSON equality with numeric comparison for numbers.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare_same_type(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order used for in-memory sorting: missing/null, numbers, strings,
/// objects, arrays, booleans.
pub(crate) fn compare_for_sort(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Object(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Bool(_)) => 5,
        }
    }

    match (a, b) {
        (Some(x), Some(y)) if rank(a) == rank(b) => {
            compare_same_type(x, y).unwrap_or(Ordering::Equal)
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Sort direction for a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A single sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub path: String,
    pub direction: SortDirection,
}

/// Builder for document queries: filter, ordering, skip and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    /// Predicate documents must satisfy.
    pub filter: Filter,

    /// Sort keys, most significant first.
    pub sort: Vec<SortKey>,

    /// Number of documents to skip.
    pub skip: Option<usize>,

    /// Maximum number of documents to return.
    pub limit: Option<usize>,
}

impl DocumentQuery {
    /// Creates a query matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for documents matching `filter`.
    pub fn matching(filter: Filter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    /// Adds a filter, combined with any existing one.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = std::mem::take(&mut self.filter).and(filter);
        self
    }

    /// Sorts ascending by `path` after any existing keys.
    pub fn sort_asc(mut self, path: impl Into<String>) -> Self {
        self.sort.push(SortKey {
            path: path.into(),
            direction: SortDirection::Ascending,
        });
        self
    }

    /// Sorts descending by `path` after any existing keys.
    pub fn sort_desc(mut self, path: impl Into<String>) -> Self {
        self.sort.push(SortKey {
            path: path.into(),
            direction: SortDirection::Descending,
        });
        self
    }

    /// Skips this many documents before returning results.
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Limits the number of documents returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Orders two documents by this query's sort keys.
    pub(crate) fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for key in &self.sort {
            let ord = compare_for_sort(a.get_path(&key.path), b.get_path(&key.path));
            let ord = match key.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
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
    fn eq_matches_nested_paths_and_numbers() {
        let d = doc(json!({"full_order_code": "WN0303255", "raw": {"total": 10}}));
        assert!(Filter::eq("full_order_code", "WN0303255").matches(&d));
        assert!(!Filter::eq("full_order_code", "WN0000000").matches(&d));
        assert!(Filter::eq("raw.total", 10.0).matches(&d));
    }

    #[test]
    fn eq_null_matches_missing_field() {
        let d = doc(json!({"a": 1}));
        assert!(Filter::eq("b", Value::Null).matches(&d));
        assert!(!Filter::eq("a", Value::Null).matches(&d));
    }

    #[test]
    fn ne_matches_missing_field() {
        let d = doc(json!({"order_status_id": 4}));
        assert!(!Filter::ne("order_status_id", 4).matches(&d));
        assert!(Filter::ne("order_status_id", 4).matches(&doc(json!({}))));
    }

    #[test]
    fn range_filters_compare_same_types_only() {
        let d = doc(json!({"date_created": "2025-08-15 10:00:00", "grand_total": 250}));
        assert!(Filter::gte("date_created", "2025-08-01 00:00:00").matches(&d));
        assert!(Filter::lte("date_created", "2025-08-31 23:59:59").matches(&d));
        assert!(!Filter::lte("date_created", "2025-08-14 23:59:59").matches(&d));
        assert!(Filter::gte("grand_total", 100).matches(&d));
        assert!(!Filter::gte("grand_total", "100").matches(&d));
        assert!(!Filter::gte("missing", 0).matches(&d));
    }

    #[test]
    fn elem_match_checks_every_element() {
        let d = doc(json!({"orders": [{"order_id": 1}, {"order_id": 2}]}));
        assert!(Filter::elem_match("orders", "order_id", 2).matches(&d));
        assert!(!Filter::elem_match("orders", "order_id", 3).matches(&d));
        assert!(!Filter::elem_match("missing", "order_id", 1).matches(&d));
    }

    #[test]
    fn and_flattens() {
        let f = Filter::All
            .and(Filter::eq("a", 1))
            .and(Filter::eq("b", 2).and(Filter::eq("c", 3)));
        match f {
            Filter::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected conjunction, got {other:?}"),
        }
        assert_eq!(Filter::All.and(Filter::eq("a", 1)), Filter::eq("a", 1));
    }

    #[test]
    fn query_builder_chain() {
        let query = DocumentQuery::new()
            .filter(Filter::eq("full_order_code", "WN1"))
            .sort_desc("created_date")
            .skip(5)
            .limit(1);

        assert_eq!(query.filter, Filter::eq("full_order_code", "WN1"));
        assert_eq!(query.sort.len(), 1);
        assert_eq!(query.sort[0].direction, SortDirection::Descending);
        assert_eq!(query.skip, Some(5));
        assert_eq!(query.limit, Some(1));
    }

    #[test]
    fn sort_puts_missing_first_ascending() {
        let query = DocumentQuery::new().sort_asc("created_date");
        let missing = doc(json!({}));
        let present = doc(json!({"created_date": "2025-01-01"}));
        assert_eq!(query.compare(&missing, &present), Ordering::Less);

        let query = DocumentQuery::new().sort_desc("created_date");
        assert_eq!(query.compare(&missing, &present), Ordering::Greater);
    }
}
