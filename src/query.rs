use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::datatype::AttrValue;
use crate::error::Result;
use crate::record::{Document, DocumentAccess};
use crate::registry::AttributeRegistry;

/// Structural containment between JSON values, as PostgreSQL's `@>` on
/// `jsonb`:
/// * an object contains another if every key of the other is present and
///   its value is contained,
/// * an array contains another if every element of the other is contained
///   in some element,
/// * scalars contain only what is equal to them.
///
/// As in PostgreSQL, an array also contains a bare scalar it has as an
/// element, but only at the top level. Nested arrays never match scalars.
pub fn json_contains(document: &Value, fragment: &Value) -> bool {
    match (document, fragment) {
        (Value::Array(doc), scalar) if !scalar.is_array() && !scalar.is_object() => {
            doc.iter().any(|have| contains_value(have, scalar))
        }
        _ => contains_value(document, fragment),
    }
}

// containment below the top level
fn contains_value(document: &Value, fragment: &Value) -> bool {
    match (document, fragment) {
        (Value::Object(doc), Value::Object(frag)) => frag
            .iter()
            .all(|(key, wanted)| doc.get(key).is_some_and(|have| contains_value(have, wanted))),
        (Value::Array(doc), Value::Array(frag)) => frag
            .iter()
            .all(|wanted| doc.iter().any(|have| contains_value(have, wanted))),
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (a, b) => a == b,
    }
}

// integers compare exactly; only a float on either side compares as f64
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if a.is_f64() || b.is_f64() {
        return a.as_f64() == b.as_f64();
    }
    match (a.as_i64(), b.as_i64()) {
        (Some(a), Some(b)) => a == b,
        _ => a.as_u64().is_some() && a.as_u64() == b.as_u64(),
    }
}

/// A filter on a record's document columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches everything. This is what empty criteria build.
    Universal,
    /// Every container's document must contain its fragment.
    Contains(BTreeMap<String, Document>),
}

impl Predicate {
    pub fn is_universal(&self) -> bool {
        matches!(self, Predicate::Universal)
    }
    /// The fragment required of `container`, if any.
    pub fn fragment(&self, container: &str) -> Option<&Document> {
        match self {
            Predicate::Universal => None,
            Predicate::Contains(fragments) => fragments.get(container),
        }
    }
    pub fn containers(&self) -> Vec<&str> {
        match self {
            Predicate::Universal => Vec::new(),
            Predicate::Contains(fragments) => fragments.keys().map(String::as_str).collect(),
        }
    }
    /// Evaluates the predicate against an in-memory record. A top level
    /// key is matched only if it is present, so a `null` in the fragment
    /// never matches a missing key.
    pub fn matches<R: DocumentAccess + ?Sized>(&self, record: &R) -> bool {
        match self {
            Predicate::Universal => true,
            Predicate::Contains(fragments) => fragments.iter().all(|(container, fragment)| {
                fragment.iter().all(|(key, wanted)| {
                    record
                        .read_document_field(container, key)
                        .is_some_and(|have| contains_value(&have, wanted))
                })
            }),
        }
    }
    /// The SQL form for rows of `table`, one `json_contains` call per
    /// container joined with `and`.
    pub fn to_sql(&self, table: &str) -> Result<SqlFilter> {
        match self {
            Predicate::Universal => Ok(SqlFilter::universal()),
            Predicate::Contains(fragments) => {
                let mut filters = Vec::with_capacity(fragments.len());
                for (container, fragment) in fragments {
                    let column = format!("\"{}\".\"{}\"", table, container);
                    filters.push(build_containment_filter(&column, fragment)?);
                }
                Ok(SqlFilter::all(filters))
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Predicate::Universal => write!(f, "true"),
            Predicate::Contains(fragments) => {
                for (i, (container, fragment)) in fragments.iter().enumerate() {
                    if i > 0 {
                        write!(f, " and ")?;
                    }
                    write!(f, "{} @> {}", container, Value::Object(fragment.clone()))?;
                }
                Ok(())
            }
        }
    }
}

/// A where clause with its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFilter {
    pub clause: String,
    pub params: Vec<String>,
}

impl SqlFilter {
    pub fn universal() -> Self {
        Self {
            clause: "1".to_string(),
            params: Vec::new(),
        }
    }
    pub fn all(filters: Vec<SqlFilter>) -> Self {
        if filters.is_empty() {
            return Self::universal();
        }
        let clause = filters
            .iter()
            .map(|f| f.clause.as_str())
            .collect::<Vec<_>>()
            .join(" and ");
        let params = filters.into_iter().flat_map(|f| f.params).collect();
        Self { clause, params }
    }
}

/// "The document in `column_expr` contains `fragment`", for SQLite with the
/// `json_contains` function the persistor registers.
pub fn build_containment_filter(column_expr: &str, fragment: &Map<String, Value>) -> Result<SqlFilter> {
    Ok(SqlFilter {
        clause: format!("json_contains({}, ?)", column_expr),
        params: vec![serde_json::to_string(fragment)?],
    })
}

/// Turns `{attribute name: value}` criteria into a [`Predicate`], encoding
/// each value exactly as a setter would store it.
pub struct ContainmentQueryBuilder<'r> {
    registry: &'r AttributeRegistry,
}

impl<'r> ContainmentQueryBuilder<'r> {
    pub fn new(registry: &'r AttributeRegistry) -> Self {
        Self { registry }
    }
    /// Fails on the first undeclared name or uncastable value; no partial
    /// predicate is produced. Empty criteria build [`Predicate::Universal`].
    pub fn build<I, K, V>(&self, criteria: I) -> Result<Predicate>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        let mut fragments: BTreeMap<String, Document> = BTreeMap::new();
        for (name, raw) in criteria {
            let definition = self.registry.lookup(name.as_ref())?;
            let stored = definition.encode(&raw.into())?;
            fragments
                .entry(definition.container().to_string())
                .or_default()
                .insert(definition.store_key().to_string(), stored);
        }
        let predicate = if fragments.is_empty() {
            Predicate::Universal
        } else {
            Predicate::Contains(fragments)
        };
        debug!(record_type = %self.registry.record_type(), predicate = %predicate, "containment predicate built");
        Ok(predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::RecordType;
    use crate::definition::AttributeOptions;
    use crate::error::DocattrError;
    use crate::record::{DocumentRecord, Record};
    use serde_json::json;
    use std::sync::Arc;

    fn order_type() -> Arc<RecordType> {
        RecordType::builder("Order")
            .attribute("status", "string", AttributeOptions::new())
            .unwrap()
            .attribute("quantity", "integer", AttributeOptions::new().store_key("qty"))
            .unwrap()
            .attribute("tags", "string", AttributeOptions::new().array())
            .unwrap()
            .attribute_in("carrier", "string", "shipping", AttributeOptions::new())
            .unwrap()
            .build()
            .unwrap()
    }

    fn order(status: &str, carrier: &str) -> DocumentRecord {
        let mut record = DocumentRecord::new(order_type());
        record.set_attribute("status", status).unwrap();
        record.set_attribute("carrier", carrier).unwrap();
        record
    }

    #[test]
    fn containment_semantics() {
        let doc = json!({"a": 1, "b": {"c": [1, 2, {"d": true}]}, "e": ["x", "y"]});
        assert!(json_contains(&doc, &json!({})));
        assert!(json_contains(&doc, &json!({"a": 1})));
        assert!(json_contains(&doc, &json!({"a": 1.0})));
        assert!(json_contains(&doc, &json!({"b": {"c": [2, {"d": true}]}})));
        assert!(json_contains(&doc, &json!({"e": ["y"]})));
        assert!(json_contains(&json!(["x", "y"]), &json!("x")));
        assert!(!json_contains(&doc, &json!({"a": 2})));
        assert!(!json_contains(&doc, &json!({"z": null})));
        assert!(!json_contains(&doc, &json!({"b": {"c": [3]}})));
    }

    #[test]
    fn arrays_hold_bare_scalars_only_at_the_top() {
        assert!(json_contains(&json!(["x", "y"]), &json!("x")));
        assert!(!json_contains(&json!(["x", "y"]), &json!("z")));
        assert!(!json_contains(&json!({"e": ["x", "y"]}), &json!({"e": "x"})));
        assert!(!json_contains(&json!([["x"]]), &json!(["x"])));
        assert!(json_contains(&json!([["x"], "y"]), &json!([["x"]])));
    }

    #[test]
    fn large_integers_compare_exactly() {
        let stored = json!({"ext_id": 9007199254740993i64});
        assert!(json_contains(&stored, &json!({"ext_id": 9007199254740993i64})));
        assert!(!json_contains(&stored, &json!({"ext_id": 9007199254740992i64})));
        assert!(!json_contains(&json!({"n": u64::MAX}), &json!({"n": u64::MAX - 1})));
        assert!(!json_contains(&json!({"n": -1}), &json!({"n": u64::MAX})));
        assert!(json_contains(&json!({"n": 2}), &json!({"n": 2.0})));
    }

    #[test]
    fn scalar_criteria_do_not_match_stored_arrays() {
        let tagged = RecordType::builder("Tagged")
            .attribute("tags", "json", AttributeOptions::new())
            .unwrap()
            .build()
            .unwrap();
        let mut record = DocumentRecord::new(Arc::clone(&tagged));
        record.set_attribute("tags", json!(["x", "y"])).unwrap();
        let scalar = tagged.json_attributes_where([("tags", json!("x"))]).unwrap();
        assert!(!scalar.matches(&record));
        let element = tagged.json_attributes_where([("tags", json!(["x"]))]).unwrap();
        assert!(element.matches(&record));
    }

    #[test]
    fn values_are_encoded_like_setters_store_them() {
        let record_type = order_type();
        let predicate = record_type
            .json_attributes_where([("quantity", AttrValue::from("3")), ("tags", vec!["rush"].into())])
            .unwrap();
        assert_eq!(
            predicate.fragment("json_attributes"),
            json!({"qty": 3, "tags": ["rush"]}).as_object()
        );
    }

    #[test]
    fn matches_only_the_active_record() {
        let record_type = order_type();
        let predicate = record_type.json_attributes_where([("status", "active")]).unwrap();
        assert!(predicate.matches(&order("active", "ups")));
        assert!(!predicate.matches(&order("closed", "ups")));
    }

    #[test]
    fn unknown_attribute_builds_nothing() {
        let record_type = order_type();
        let result = record_type.json_attributes_where([("status", "active"), ("colour", "red")]);
        assert!(matches!(result, Err(DocattrError::UnknownAttribute { ref name, .. }) if name == "colour"));
    }

    #[test]
    fn uncastable_value_builds_nothing() {
        let record_type = order_type();
        let result = record_type.json_attributes_where([("quantity", "lots")]);
        assert!(matches!(result, Err(DocattrError::TypeMismatch { .. })));
    }

    #[test]
    fn empty_criteria_is_the_universal_predicate() {
        let record_type = order_type();
        let predicate = record_type
            .json_attributes_where(Vec::<(&str, AttrValue)>::new())
            .unwrap();
        assert!(predicate.is_universal());
        assert!(predicate.matches(&order("closed", "dhl")));
        assert_eq!(predicate.to_sql("orders").unwrap(), SqlFilter::universal());
    }

    #[test]
    fn containers_are_anded() {
        let record_type = order_type();
        let predicate = record_type
            .json_attributes_where([("status", "active"), ("carrier", "ups")])
            .unwrap();
        assert_eq!(predicate.containers(), vec!["json_attributes", "shipping"]);
        assert!(predicate.matches(&order("active", "ups")));
        assert!(!predicate.matches(&order("active", "dhl")));
        assert!(!predicate.matches(&order("closed", "ups")));

        let sql = predicate.to_sql("orders").unwrap();
        assert_eq!(
            sql.clause,
            "json_contains(\"orders\".\"json_attributes\", ?) and json_contains(\"orders\".\"shipping\", ?)"
        );
        assert_eq!(sql.params, vec!["{\"status\":\"active\"}".to_string(), "{\"carrier\":\"ups\"}".to_string()]);
    }

    #[test]
    fn null_criteria_do_not_match_missing_keys() {
        let record_type = order_type();
        let predicate = record_type.json_attributes_where([("status", AttrValue::Null)]).unwrap();
        let mut explicit_null = DocumentRecord::new(Arc::clone(&record_type));
        explicit_null.set_attribute("status", AttrValue::Null).unwrap();
        assert!(predicate.matches(&explicit_null));
        assert!(!predicate.matches(&DocumentRecord::new(record_type)));
    }
}
