// used for the in-memory form of date and datetime attributes
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
// used for decimal numbers
use bigdecimal::{BigDecimal, FromPrimitive, ToPrimitive};
// the document encoding
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Number, Value};

use lazy_static::lazy_static;

// used to print out readable forms of a value
use std::fmt;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{DocattrError, Result};

/// The in-memory form of an attribute value.
///
/// Raw input handed to a setter or a query is an `AttrValue` as well; each
/// [`AttributeType`] casts it into the variant it owns.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Decimal(BigDecimal),
    Text(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    List(Vec<AttrValue>),
    Json(Value),
}

impl AttrValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(f) => Some(*f),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(items) => Some(items),
            _ => None,
        }
    }
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            AttrValue::Json(v) => Some(v),
            _ => None,
        }
    }

    /// A JSON rendering of the value, with dates and decimals as strings.
    /// Non-finite floats cannot be represented and fail.
    pub fn to_json(&self) -> Result<Value> {
        Ok(match self {
            AttrValue::Null => Value::Null,
            AttrValue::Boolean(b) => Value::Bool(*b),
            AttrValue::Integer(i) => Value::from(*i),
            AttrValue::Float(f) => Value::Number(finite_number(*f)?),
            AttrValue::Decimal(d) => Value::String(canonical_decimal(d).to_plain_string()),
            AttrValue::Text(s) => Value::String(s.clone()),
            AttrValue::Date(d) => Value::String(d.to_string()),
            AttrValue::DateTime(dt) => Value::String(format_datetime(dt)),
            AttrValue::List(items) => Value::Array(
                items.iter().map(AttrValue::to_json).collect::<Result<Vec<_>>>()?,
            ),
            AttrValue::Json(v) => v.clone(),
        })
    }

    /// The loosest reading of a document value: scalars map to their natural
    /// variant, arrays to lists and objects stay JSON.
    pub fn from_json(value: &Value) -> AttrValue {
        match value {
            Value::Null => AttrValue::Null,
            Value::Bool(b) => AttrValue::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => AttrValue::Integer(i),
                None => n.as_f64().map(AttrValue::Float).unwrap_or(AttrValue::Null),
            },
            Value::String(s) => AttrValue::Text(s.clone()),
            Value::Array(items) => AttrValue::List(items.iter().map(AttrValue::from_json).collect()),
            Value::Object(_) => AttrValue::Json(value.clone()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttrValue::Null => write!(f, "null"),
            AttrValue::Boolean(b) => write!(f, "{}", b),
            AttrValue::Integer(i) => write!(f, "{}", i),
            AttrValue::Float(x) => write!(f, "{}", x),
            AttrValue::Decimal(d) => write!(f, "{}", d),
            AttrValue::Text(s) => write!(f, "{}", s),
            AttrValue::Date(d) => write!(f, "{}", d),
            AttrValue::DateTime(dt) => write!(f, "{}", format_datetime(dt)),
            AttrValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            AttrValue::Json(v) => write!(f, "{}", v),
        }
    }
}

// Conversions so callers can hand plain Rust values to setters and queries
impl From<bool> for AttrValue {
    fn from(v: bool) -> Self { AttrValue::Boolean(v) }
}
impl From<i64> for AttrValue {
    fn from(v: i64) -> Self { AttrValue::Integer(v) }
}
impl From<i32> for AttrValue {
    fn from(v: i32) -> Self { AttrValue::Integer(v as i64) }
}
impl From<u32> for AttrValue {
    fn from(v: u32) -> Self { AttrValue::Integer(v as i64) }
}
impl From<f64> for AttrValue {
    fn from(v: f64) -> Self { AttrValue::Float(v) }
}
impl From<&str> for AttrValue {
    fn from(v: &str) -> Self { AttrValue::Text(v.to_string()) }
}
impl From<String> for AttrValue {
    fn from(v: String) -> Self { AttrValue::Text(v) }
}
impl From<BigDecimal> for AttrValue {
    fn from(v: BigDecimal) -> Self { AttrValue::Decimal(v) }
}
impl From<NaiveDate> for AttrValue {
    fn from(v: NaiveDate) -> Self { AttrValue::Date(v) }
}
impl From<DateTime<Utc>> for AttrValue {
    fn from(v: DateTime<Utc>) -> Self { AttrValue::DateTime(v) }
}
impl From<Value> for AttrValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => AttrValue::Null,
            other => AttrValue::Json(other),
        }
    }
}
impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(v: Vec<T>) -> Self { AttrValue::List(v.into_iter().map(Into::into).collect()) }
}
impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or(AttrValue::Null) }
}

fn finite_number(f: f64) -> Result<Number> {
    Number::from_f64(f)
        .ok_or_else(|| DocattrError::mismatch(FloatType::DATA_TYPE, format!("{} has no JSON representation", f)))
}

// equal decimals must serialize to equal strings: no trailing zeros and
// never a negative scale
fn canonical_decimal(d: &BigDecimal) -> BigDecimal {
    let d = d.normalized();
    if d.fractional_digit_count() < 0 {
        d.with_scale(0)
    } else {
        d
    }
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// A cast/serialize/deserialize strategy for one logical type.
///
/// Implementations must keep `cast` idempotent and `deserialize` the exact
/// inverse of `serialize` for values `cast` produced. `Null` passes through
/// every built-in type unchanged.
pub trait AttributeType: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &'static str;
    /// Coerces raw input into the in-memory form of this type.
    fn cast(&self, raw: &AttrValue) -> Result<AttrValue>;
    /// Turns a cast value into what is stored inside the document.
    fn serialize(&self, value: &AttrValue) -> Result<Value>;
    /// Reads a stored document value back into the in-memory form.
    fn deserialize(&self, value: &Value) -> Result<AttrValue> {
        self.cast(&AttrValue::from_json(value))
    }
}

// ------------- Data Types --------------
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerType;
impl IntegerType {
    pub const DATA_TYPE: &'static str = "integer";
}
impl AttributeType for IntegerType {
    fn type_name(&self) -> &'static str {
        Self::DATA_TYPE
    }
    fn cast(&self, raw: &AttrValue) -> Result<AttrValue> {
        let truncate = |f: f64| {
            if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Ok(AttrValue::Integer(f.trunc() as i64))
            } else {
                Err(DocattrError::mismatch(Self::DATA_TYPE, format!("{} is out of range", f)))
            }
        };
        match raw {
            AttrValue::Null | AttrValue::Integer(_) => Ok(raw.clone()),
            AttrValue::Boolean(b) => Ok(AttrValue::Integer(*b as i64)),
            AttrValue::Float(f) => truncate(*f),
            AttrValue::Decimal(d) => d
                .with_scale(0)
                .to_i64()
                .map(AttrValue::Integer)
                .ok_or_else(|| DocattrError::mismatch(Self::DATA_TYPE, format!("{} is out of range", d))),
            AttrValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(AttrValue::Null);
                }
                match (s.parse::<i64>(), s.parse::<f64>()) {
                    (Ok(i), _) => Ok(AttrValue::Integer(i)),
                    (_, Ok(f)) => truncate(f),
                    _ => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("'{}' is not a number", s))),
                }
            }
            other => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("cannot cast {}", other))),
        }
    }
    fn serialize(&self, value: &AttrValue) -> Result<Value> {
        match value {
            AttrValue::Null => Ok(Value::Null),
            AttrValue::Integer(i) => Ok(Value::from(*i)),
            other => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("cannot serialize {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FloatType;
impl FloatType {
    pub const DATA_TYPE: &'static str = "float";
}
impl AttributeType for FloatType {
    fn type_name(&self) -> &'static str {
        Self::DATA_TYPE
    }
    fn cast(&self, raw: &AttrValue) -> Result<AttrValue> {
        let finite = |f: f64| {
            if f.is_finite() {
                Ok(AttrValue::Float(f))
            } else {
                Err(DocattrError::mismatch(Self::DATA_TYPE, format!("{} has no JSON representation", f)))
            }
        };
        match raw {
            AttrValue::Null => Ok(AttrValue::Null),
            AttrValue::Float(f) => finite(*f),
            AttrValue::Integer(i) => Ok(AttrValue::Float(*i as f64)),
            AttrValue::Decimal(d) => d
                .to_f64()
                .ok_or_else(|| DocattrError::mismatch(Self::DATA_TYPE, format!("{} is out of range", d)))
                .and_then(finite),
            AttrValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(AttrValue::Null);
                }
                s.parse::<f64>()
                    .map_err(|_| DocattrError::mismatch(Self::DATA_TYPE, format!("'{}' is not a number", s)))
                    .and_then(finite)
            }
            other => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("cannot cast {}", other))),
        }
    }
    fn serialize(&self, value: &AttrValue) -> Result<Value> {
        match value {
            AttrValue::Null => Ok(Value::Null),
            AttrValue::Float(f) => Ok(Value::Number(finite_number(*f)?)),
            other => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("cannot serialize {}", other))),
        }
    }
}

/// Decimals are stored as strings so no precision is lost to JSON numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalType;
impl DecimalType {
    pub const DATA_TYPE: &'static str = "decimal";
}
impl AttributeType for DecimalType {
    fn type_name(&self) -> &'static str {
        Self::DATA_TYPE
    }
    fn cast(&self, raw: &AttrValue) -> Result<AttrValue> {
        match raw {
            AttrValue::Null => Ok(AttrValue::Null),
            AttrValue::Decimal(d) => Ok(AttrValue::Decimal(canonical_decimal(d))),
            AttrValue::Integer(i) => Ok(AttrValue::Decimal(BigDecimal::from(*i))),
            AttrValue::Float(f) => BigDecimal::from_f64(*f)
                .map(|d| AttrValue::Decimal(canonical_decimal(&d)))
                .ok_or_else(|| DocattrError::mismatch(Self::DATA_TYPE, format!("{} is not a decimal", f))),
            AttrValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(AttrValue::Null);
                }
                BigDecimal::from_str(s)
                    .map(|d| AttrValue::Decimal(canonical_decimal(&d)))
                    .map_err(|_| DocattrError::mismatch(Self::DATA_TYPE, format!("'{}' is not a decimal", s)))
            }
            other => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("cannot cast {}", other))),
        }
    }
    fn serialize(&self, value: &AttrValue) -> Result<Value> {
        match value {
            AttrValue::Null => Ok(Value::Null),
            AttrValue::Decimal(d) => Ok(Value::String(canonical_decimal(d).to_plain_string())),
            other => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("cannot serialize {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanType;
impl BooleanType {
    pub const DATA_TYPE: &'static str = "boolean";
}
impl AttributeType for BooleanType {
    fn type_name(&self) -> &'static str {
        Self::DATA_TYPE
    }
    fn cast(&self, raw: &AttrValue) -> Result<AttrValue> {
        match raw {
            AttrValue::Null | AttrValue::Boolean(_) => Ok(raw.clone()),
            AttrValue::Integer(0) => Ok(AttrValue::Boolean(false)),
            AttrValue::Integer(1) => Ok(AttrValue::Boolean(true)),
            AttrValue::Text(s) => match s.trim().to_lowercase().as_str() {
                "" => Ok(AttrValue::Null),
                "true" | "t" | "1" | "yes" | "on" => Ok(AttrValue::Boolean(true)),
                "false" | "f" | "0" | "no" | "off" => Ok(AttrValue::Boolean(false)),
                _ => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("'{}' is not a boolean", s))),
            },
            other => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("cannot cast {}", other))),
        }
    }
    fn serialize(&self, value: &AttrValue) -> Result<Value> {
        match value {
            AttrValue::Null => Ok(Value::Null),
            AttrValue::Boolean(b) => Ok(Value::Bool(*b)),
            other => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("cannot serialize {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StringType;
impl StringType {
    pub const DATA_TYPE: &'static str = "string";
}
impl AttributeType for StringType {
    fn type_name(&self) -> &'static str {
        Self::DATA_TYPE
    }
    fn cast(&self, raw: &AttrValue) -> Result<AttrValue> {
        match raw {
            AttrValue::Null | AttrValue::Text(_) => Ok(raw.clone()),
            AttrValue::List(_) | AttrValue::Json(_) => {
                Err(DocattrError::mismatch(Self::DATA_TYPE, format!("cannot cast {}", raw)))
            }
            scalar => Ok(AttrValue::Text(scalar.to_string())),
        }
    }
    fn serialize(&self, value: &AttrValue) -> Result<Value> {
        match value {
            AttrValue::Null => Ok(Value::Null),
            AttrValue::Text(s) => Ok(Value::String(s.clone())),
            other => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("cannot serialize {}", other))),
        }
    }
}

/// Dates are stored as ISO 8601 strings (`2024-03-01`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DateType;
impl DateType {
    pub const DATA_TYPE: &'static str = "date";
}
impl AttributeType for DateType {
    fn type_name(&self) -> &'static str {
        Self::DATA_TYPE
    }
    fn cast(&self, raw: &AttrValue) -> Result<AttrValue> {
        match raw {
            AttrValue::Null | AttrValue::Date(_) => Ok(raw.clone()),
            AttrValue::DateTime(dt) => Ok(AttrValue::Date(dt.date_naive())),
            AttrValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(AttrValue::Null);
                }
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map(AttrValue::Date)
                    .map_err(|e| DocattrError::mismatch(Self::DATA_TYPE, format!("'{}': {}", s, e)))
            }
            other => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("cannot cast {}", other))),
        }
    }
    fn serialize(&self, value: &AttrValue) -> Result<Value> {
        match value {
            AttrValue::Null => Ok(Value::Null),
            AttrValue::Date(d) => Ok(Value::String(d.to_string())),
            other => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("cannot serialize {}", other))),
        }
    }
}

/// Datetimes are normalized to UTC and stored as RFC 3339 strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeType;
impl DateTimeType {
    pub const DATA_TYPE: &'static str = "datetime";
}
impl AttributeType for DateTimeType {
    fn type_name(&self) -> &'static str {
        Self::DATA_TYPE
    }
    fn cast(&self, raw: &AttrValue) -> Result<AttrValue> {
        match raw {
            AttrValue::Null | AttrValue::DateTime(_) => Ok(raw.clone()),
            AttrValue::Date(d) => d
                .and_hms_opt(0, 0, 0)
                .map(|naive| AttrValue::DateTime(naive.and_utc()))
                .ok_or_else(|| DocattrError::mismatch(Self::DATA_TYPE, format!("cannot cast {}", d))),
            AttrValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(AttrValue::Null);
                }
                if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                    return Ok(AttrValue::DateTime(dt.with_timezone(&Utc)));
                }
                // without an offset the time is taken to be UTC
                ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                    .iter()
                    .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
                    .map(|naive| AttrValue::DateTime(naive.and_utc()))
                    .ok_or_else(|| DocattrError::mismatch(Self::DATA_TYPE, format!("'{}' is not a datetime", s)))
            }
            other => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("cannot cast {}", other))),
        }
    }
    fn serialize(&self, value: &AttrValue) -> Result<Value> {
        match value {
            AttrValue::Null => Ok(Value::Null),
            AttrValue::DateTime(dt) => Ok(Value::String(format_datetime(dt))),
            other => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("cannot serialize {}", other))),
        }
    }
}

/// Free-form JSON, stored as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonType;
impl JsonType {
    pub const DATA_TYPE: &'static str = "json";
}
impl AttributeType for JsonType {
    fn type_name(&self) -> &'static str {
        Self::DATA_TYPE
    }
    fn cast(&self, raw: &AttrValue) -> Result<AttrValue> {
        Ok(AttrValue::from(raw.to_json()?))
    }
    fn serialize(&self, value: &AttrValue) -> Result<Value> {
        value.to_json()
    }
    fn deserialize(&self, value: &Value) -> Result<AttrValue> {
        Ok(AttrValue::from(value.clone()))
    }
}

/// A homogeneous array whose elements are cast through `inner`.
#[derive(Debug, Clone)]
pub struct ArrayOf {
    inner: Arc<dyn AttributeType>,
}
impl ArrayOf {
    pub const DATA_TYPE: &'static str = "array";
    pub fn new(inner: Arc<dyn AttributeType>) -> Self {
        Self { inner }
    }
    pub fn inner(&self) -> &Arc<dyn AttributeType> {
        &self.inner
    }
}
impl AttributeType for ArrayOf {
    fn type_name(&self) -> &'static str {
        Self::DATA_TYPE
    }
    fn cast(&self, raw: &AttrValue) -> Result<AttrValue> {
        match raw {
            AttrValue::Null => Ok(AttrValue::Null),
            AttrValue::List(items) => Ok(AttrValue::List(
                items.iter().map(|item| self.inner.cast(item)).collect::<Result<Vec<_>>>()?,
            )),
            AttrValue::Json(Value::Array(items)) => Ok(AttrValue::List(
                items
                    .iter()
                    .map(|item| self.inner.deserialize(item))
                    .collect::<Result<Vec<_>>>()?,
            )),
            other => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("{} is not an array", other))),
        }
    }
    fn serialize(&self, value: &AttrValue) -> Result<Value> {
        match value {
            AttrValue::Null => Ok(Value::Null),
            AttrValue::List(items) => Ok(Value::Array(
                items.iter().map(|item| self.inner.serialize(item)).collect::<Result<Vec<_>>>()?,
            )),
            other => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("cannot serialize {}", other))),
        }
    }
    fn deserialize(&self, value: &Value) -> Result<AttrValue> {
        match value {
            Value::Null => Ok(AttrValue::Null),
            Value::Array(items) => Ok(AttrValue::List(
                items
                    .iter()
                    .map(|item| self.inner.deserialize(item))
                    .collect::<Result<Vec<_>>>()?,
            )),
            other => Err(DocattrError::mismatch(Self::DATA_TYPE, format!("{} is not an array", other))),
        }
    }
}

/// A custom value object, checked against `T`'s serde shape.
///
/// Casting goes through `T` and back, so the in-memory form is always the
/// canonical JSON that `T` serializes to. Use [`Structured::decode`] to get
/// the `T` itself.
pub struct Structured<T> {
    marker: PhantomData<fn() -> T>,
}
impl<T> Structured<T> {
    pub fn new() -> Self {
        Self { marker: PhantomData }
    }
}
impl<T> Default for Structured<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T> fmt::Debug for Structured<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Structured<{}>", std::any::type_name::<T>())
    }
}
impl<T: Serialize + DeserializeOwned> Structured<T> {
    pub fn decode(value: &AttrValue) -> Result<Option<T>> {
        match value {
            AttrValue::Null => Ok(None),
            other => serde_json::from_value(other.to_json()?)
                .map(Some)
                .map_err(|e| DocattrError::mismatch(std::any::type_name::<T>(), e.to_string())),
        }
    }
    pub fn encode(value: &T) -> Result<AttrValue> {
        Ok(AttrValue::from(serde_json::to_value(value)?))
    }
}
impl<T: Serialize + DeserializeOwned> AttributeType for Structured<T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
    fn cast(&self, raw: &AttrValue) -> Result<AttrValue> {
        match Self::decode(raw)? {
            Some(object) => Self::encode(&object),
            None => Ok(AttrValue::Null),
        }
    }
    fn serialize(&self, value: &AttrValue) -> Result<Value> {
        match value {
            AttrValue::Null => Ok(Value::Null),
            AttrValue::Json(v) => Ok(v.clone()),
            other => Err(DocattrError::mismatch(self.type_name(), format!("cannot serialize {}", other))),
        }
    }
    fn deserialize(&self, value: &Value) -> Result<AttrValue> {
        self.cast(&AttrValue::from(value.clone()))
    }
}

/// Anything a declaration accepts as a type: a built-in type name, an
/// `Arc<dyn AttributeType>`, or a type value.
pub trait IntoAttributeType {
    fn into_attribute_type(self) -> Result<Arc<dyn AttributeType>>;
}
impl IntoAttributeType for &str {
    fn into_attribute_type(self) -> Result<Arc<dyn AttributeType>> {
        lookup_type(self)
    }
}
impl IntoAttributeType for Arc<dyn AttributeType> {
    fn into_attribute_type(self) -> Result<Arc<dyn AttributeType>> {
        Ok(self)
    }
}
impl<T: AttributeType + 'static> IntoAttributeType for T {
    fn into_attribute_type(self) -> Result<Arc<dyn AttributeType>> {
        Ok(Arc::new(self))
    }
}

lazy_static! {
    static ref BUILTIN_TYPES: HashMap<&'static str, Arc<dyn AttributeType>> = {
        let builtins: [Arc<dyn AttributeType>; 8] = [
            Arc::new(IntegerType),
            Arc::new(FloatType),
            Arc::new(DecimalType),
            Arc::new(BooleanType),
            Arc::new(StringType),
            Arc::new(DateType),
            Arc::new(DateTimeType),
            Arc::new(JsonType),
        ];
        builtins.into_iter().map(|t| (t.type_name(), t)).collect()
    };
}

/// Looks up a built-in type by its name (`"integer"`, `"string"`, ...).
pub fn lookup_type(name: &str) -> Result<Arc<dyn AttributeType>> {
    BUILTIN_TYPES
        .get(name)
        .cloned()
        .ok_or_else(|| DocattrError::UnknownType(name.to_string()))
}
